//! In-memory map from chat session to signing wallet.

use solana_sdk::pubkey::Pubkey;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::adapters::solana::WalletManager;

/// Opaque per-chat key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey(pub i64);

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session:{}", self.0)
    }
}

impl From<i64> for SessionKey {
    fn from(id: i64) -> Self {
        SessionKey(id)
    }
}

/// Wallets are shared as `Arc` so a trade in flight keeps its authority
/// even if the session is replaced underneath it.
#[derive(Default)]
pub struct WalletSessionStore {
    sessions: RwLock<HashMap<SessionKey, Arc<WalletManager>>>,
}

impl WalletSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `wallet` for `key`, returning the public key it replaced
    pub async fn insert(&self, key: SessionKey, wallet: WalletManager) -> Option<Pubkey> {
        let pubkey = wallet.pubkey();
        let previous = self.sessions.write().await.insert(key, Arc::new(wallet));

        let replaced = previous.map(|w| w.pubkey());
        match replaced {
            Some(old) => tracing::info!(%key, %old, new = %pubkey, "Session wallet replaced"),
            None => tracing::info!(%key, %pubkey, "Session wallet connected"),
        }
        replaced
    }

    pub async fn get(&self, key: SessionKey) -> Option<Arc<WalletManager>> {
        self.sessions.read().await.get(&key).cloned()
    }

    pub async fn remove(&self, key: SessionKey) -> Option<Arc<WalletManager>> {
        self.sessions.write().await.remove(&key)
    }

    pub async fn contains(&self, key: SessionKey) -> bool {
        self.sessions.read().await.contains_key(&key)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

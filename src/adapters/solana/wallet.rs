use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Failed to load keypair from file: {0}")]
    LoadError(String),
    #[error("Invalid keypair bytes: {0}")]
    InvalidKeypair(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Signing authority for one wallet
pub struct WalletManager {
    keypair: Keypair,
}

impl WalletManager {
    /// Load keypair from a file path (JSON array format). `~` is expanded.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, WalletError> {
        let raw = path.as_ref().to_string_lossy();
        let expanded = shellexpand::tilde(&raw).into_owned();

        let contents = fs::read_to_string(&expanded)
            .map_err(|e| WalletError::LoadError(format!("Failed to read {}: {}", expanded, e)))?;

        let bytes: Vec<u8> = serde_json::from_str(contents.trim())
            .map_err(|e| WalletError::LoadError(format!("Invalid JSON format: {}", e)))?;

        Self::from_bytes(&bytes)
    }

    /// Load keypair from its 64 raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WalletError> {
        let keypair = Keypair::try_from(bytes)
            .map_err(|e| WalletError::InvalidKeypair(e.to_string()))?;

        Ok(Self { keypair })
    }

    /// Load keypair from a base58 secret key string
    pub fn from_base58(encoded: &str) -> Result<Self, WalletError> {
        let bytes = bs58::decode(encoded.trim())
            .into_vec()
            .map_err(|e| WalletError::InvalidKeypair(format!("Invalid base58: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Accept either a JSON byte array or a base58 string
    pub fn from_secret(secret: &str) -> Result<Self, WalletError> {
        let trimmed = secret.trim();
        if trimmed.starts_with('[') {
            let bytes: Vec<u8> = serde_json::from_str(trimmed)
                .map_err(|e| WalletError::InvalidKeypair(format!("Invalid JSON array: {}", e)))?;
            Self::from_bytes(&bytes)
        } else {
            Self::from_base58(trimmed)
        }
    }

    /// Create a new random keypair (for testing)
    pub fn new_random() -> Self {
        Self {
            keypair: Keypair::new(),
        }
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub fn sign_message(&self, message: &[u8]) -> Signature {
        self.keypair.sign_message(message)
    }

    /// Signer handed to the trade engine
    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

impl fmt::Debug for WalletManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletManager")
            .field("pubkey", &self.pubkey())
            .finish_non_exhaustive()
    }
}

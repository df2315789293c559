//! Chain access port: balances, broadcast and confirmation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Unexpected account data: {0}")]
    AccountData(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Confirmation timed out after {0:?}")]
    ConfirmationTimeout(Duration),

    #[error("Task join error: {0}")]
    Join(String),
}

/// An SPL token balance held by a wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHolding {
    pub mint: Pubkey,
    /// Raw amount in base units
    pub amount: u64,
    pub decimals: u8,
}

impl TokenHolding {
    pub fn ui_amount(&self) -> f64 {
        self.amount as f64 / 10_f64.powi(i32::from(self.decimals))
    }
}

#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Raw balance of `mint` held by `owner`, summed across token accounts
    async fn token_balance(&self, owner: &Pubkey, mint: &Pubkey) -> Result<u64, ChainError>;

    /// Native balance in lamports
    async fn sol_balance(&self, owner: &Pubkey) -> Result<u64, ChainError>;

    /// Non-zero SPL holdings of `owner`
    async fn token_holdings(&self, owner: &Pubkey) -> Result<Vec<TokenHolding>, ChainError>;

    async fn token_decimals(&self, mint: &Pubkey) -> Result<u8, ChainError>;

    async fn send_transaction(&self, tx: &VersionedTransaction) -> Result<Signature, ChainError>;

    /// Wait until `signature` reaches the configured commitment
    async fn confirm_transaction(
        &self,
        signature: &Signature,
        timeout: Duration,
    ) -> Result<(), ChainError>;
}

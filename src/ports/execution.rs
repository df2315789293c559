//! Swap routing port
//!
//! Quote and transaction-build calls against an external router. Both
//! payloads are transient and belong to one trade attempt.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("API request failed: {0}")]
    ApiError(String),

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapQuoteRequest {
    pub input_mint: Pubkey,
    pub output_mint: Pubkey,
    pub amount: u64,
    /// Basis points (1 = 0.01%)
    pub slippage_bps: u16,
}

/// A quote as returned by the router.
///
/// The raw body is kept verbatim because the build call must echo it back.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapQuote {
    pub raw: serde_json::Value,
    /// `None` when the router omitted or mangled the field
    pub out_amount: Option<u64>,
    pub price_impact_pct: Option<f64>,
}

/// Protocol fee taken on each swap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformFee {
    pub fee_bps: u16,
    pub fee_destination: Pubkey,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildSwapRequest {
    pub quote: SwapQuote,
    pub user_public_key: Pubkey,
    pub fee: Option<PlatformFee>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuiltSwap {
    /// Base64 bincode-encoded unsigned versioned transaction
    pub swap_transaction: Option<String>,
    pub last_valid_block_height: Option<u64>,
}

#[async_trait]
pub trait SwapRouter: Send + Sync {
    async fn quote(&self, request: &SwapQuoteRequest) -> Result<SwapQuote, ExecutionError>;

    async fn build_swap(&self, request: &BuildSwapRequest) -> Result<BuiltSwap, ExecutionError>;
}

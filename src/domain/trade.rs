//! Trade request and result types for the swap state machine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::signer::Signer;
use std::fmt;
use thiserror::Error;

/// Decimals of native SOL
pub const SOL_DECIMALS: u8 = 9;

/// Which side of the SOL pair the caller is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeDirection {
    /// SOL in, token out
    Buy,
    /// Token in, SOL out
    Sell,
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeDirection::Buy => write!(f, "BUY"),
            TradeDirection::Sell => write!(f, "SELL"),
        }
    }
}

/// A single buy or sell intent.
///
/// The signing authority is borrowed for the duration of one execution and
/// is never stored by the engine.
#[derive(Clone, Copy)]
pub struct TradeRequest<'a> {
    pub mint: Pubkey,
    pub direction: TradeDirection,
    /// Input amount in base units. For sells this is an upper bound that is
    /// clamped to the wallet's holding.
    pub amount: u64,
    pub slippage_bps: u16,
    pub authority: &'a (dyn Signer + Send + Sync),
}

impl<'a> TradeRequest<'a> {
    /// Spend `lamports` of SOL on `mint`
    pub fn buy(
        mint: Pubkey,
        lamports: u64,
        slippage_bps: u16,
        authority: &'a (dyn Signer + Send + Sync),
    ) -> Self {
        Self {
            mint,
            direction: TradeDirection::Buy,
            amount: lamports,
            slippage_bps,
            authority,
        }
    }

    /// Sell the wallet's entire holding of `mint`
    pub fn sell_all(
        mint: Pubkey,
        slippage_bps: u16,
        authority: &'a (dyn Signer + Send + Sync),
    ) -> Self {
        Self {
            mint,
            direction: TradeDirection::Sell,
            amount: u64::MAX,
            slippage_bps,
            authority,
        }
    }

    pub fn owner(&self) -> Pubkey {
        self.authority.pubkey()
    }
}

impl fmt::Debug for TradeRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TradeRequest")
            .field("mint", &self.mint)
            .field("direction", &self.direction)
            .field("amount", &self.amount)
            .field("slippage_bps", &self.slippage_bps)
            .field("authority", &self.authority.pubkey())
            .finish()
    }
}

/// Stages of the swap state machine, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TradeStage {
    QuoteRequested,
    QuoteReceived,
    SwapBuilt,
    Signed,
    Broadcast,
    Confirmed,
}

impl fmt::Display for TradeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TradeStage::QuoteRequested => "QUOTE_REQUESTED",
            TradeStage::QuoteReceived => "QUOTE_RECEIVED",
            TradeStage::SwapBuilt => "SWAP_BUILT",
            TradeStage::Signed => "SIGNED",
            TradeStage::Broadcast => "BROADCAST",
            TradeStage::Confirmed => "CONFIRMED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeOutcome {
    Success,
    Failure,
}

/// Why a trade stopped
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TradeFailureReason {
    #[error("No token balance")]
    NoBalance,

    #[error("Balance lookup failed: {0}")]
    BalanceLookupFailed(String),

    #[error("Quote unavailable: {0}")]
    QuoteUnavailable(String),

    #[error("Quote has no output amount")]
    MissingOutAmount,

    #[error("Swap build failed: {0}")]
    SwapBuildFailed(String),

    #[error("Swap response has no transaction")]
    NoTransactionPayload,

    #[error("Invalid swap transaction: {0}")]
    InvalidTransaction(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Broadcast failed: {0}")]
    BroadcastFailed(String),

    #[error("Confirmation timed out after {0}s")]
    ConfirmationTimeout(u64),

    #[error("Transaction failed on chain: {0}")]
    ConfirmationFailed(String),

    #[error("{stage} step timed out after {secs}s")]
    StepTimedOut { stage: TradeStage, secs: u64 },
}

/// Terminal state of one trade attempt
#[derive(Debug, Clone, PartialEq)]
pub struct TradeResult {
    pub outcome: TradeOutcome,
    /// Present iff the trade succeeded
    pub signature: Option<Signature>,
    /// Quoted output in base units
    pub output_amount: u64,
    pub output_decimals: Option<u8>,
    /// Present iff the trade failed
    pub failure_reason: Option<TradeFailureReason>,
    pub failed_at: Option<TradeStage>,
}

impl TradeResult {
    pub fn success(signature: Signature, output_amount: u64, output_decimals: Option<u8>) -> Self {
        Self {
            outcome: TradeOutcome::Success,
            signature: Some(signature),
            output_amount,
            output_decimals,
            failure_reason: None,
            failed_at: None,
        }
    }

    pub fn failure(stage: TradeStage, reason: TradeFailureReason) -> Self {
        Self {
            outcome: TradeOutcome::Failure,
            signature: None,
            output_amount: 0,
            output_decimals: None,
            failure_reason: Some(reason),
            failed_at: Some(stage),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == TradeOutcome::Success
    }

    /// Output amount scaled by its decimals, when those are known
    pub fn ui_output_amount(&self) -> Option<Decimal> {
        let decimals = u32::from(self.output_decimals?);
        Decimal::try_from_i128_with_scale(i128::from(self.output_amount), decimals)
            .ok()
            .map(|d| d.normalize())
    }
}

impl fmt::Display for TradeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.signature, &self.failure_reason) {
            (Some(sig), _) => write!(f, "SUCCESS {} (out {})", sig, self.output_amount),
            (None, Some(reason)) => match self.failed_at {
                Some(stage) => write!(f, "FAILURE at {}: {}", stage, reason),
                None => write!(f, "FAILURE: {}", reason),
            },
            (None, None) => write!(f, "FAILURE"),
        }
    }
}

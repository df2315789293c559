//! Domain Layer - Core types and pure logic
//!
//! No network access happens here. Adapters normalize external payloads into
//! these types and the application layer drives them.
//!
//! - `token`: canonical `TokenCandidate` record
//! - `scoring`: weighted-signal risk score and tier
//! - `honeypot`: holder-count heuristic for notifications
//! - `seen_tokens`: persisted set of announced mints
//! - `trade`: swap request/result types

pub mod token;
pub mod scoring;
pub mod honeypot;
pub mod seen_tokens;
pub mod trade;

pub use token::{PairSnapshot, SourceTag, TokenAudit, TokenCandidate, TradingStats, WSOL_MINT};
pub use scoring::{score, RiskTier, ScoreResult, ScoredToken, Signal};
pub use honeypot::HoneypotRisk;
pub use seen_tokens::{PersistError, SeenTokenStore, DEFAULT_SEEN_FILE};
pub use trade::{
    TradeDirection, TradeFailureReason, TradeOutcome, TradeRequest, TradeResult, TradeStage,
    SOL_DECIMALS,
};

//! Ports Layer - Trait definitions for external dependencies
//!
//! Following hexagonal architecture, these traits abstract:
//! - Token discovery feeds and pair lookups
//! - Swap routing (quote + transaction build)
//! - Chain access (balances, broadcast, confirmation)
//! - Outbound notifications

pub mod market_data;
pub mod execution;
pub mod chain;
pub mod notifier;
pub mod mocks;

pub use market_data::{PairLookup, SourceError, TokenSource};
pub use execution::{
    BuildSwapRequest, BuiltSwap, ExecutionError, PlatformFee, SwapQuote, SwapQuoteRequest,
    SwapRouter,
};
pub use chain::{ChainError, ChainGateway, TokenHolding};
pub use notifier::{LinkButton, NotificationSink, NotifyError, OutboundMessage};

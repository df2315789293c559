//! Jupiter Adapter
//!
//! `SwapRouter` implementation over the Jupiter V6 quote/swap API, plus the
//! recent-tokens discovery feed.

mod client;
mod quote;
mod swap;
mod recent_tokens;

pub use client::{JupiterClient, JupiterConfig};
pub use quote::{QuoteRequest, QuoteResponse};
pub use swap::{SwapRequest, SwapResponse};
pub use recent_tokens::{parse_recent_tokens, JupiterRecentSource, RecentToken, DEFAULT_RECENT_URL};

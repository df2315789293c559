//! DexScreener Adapter
//!
//! Pair-data feed used both as a secondary discovery source and to fill in
//! price, market cap, liquidity and volume before a notification goes out.

mod client;
mod types;

pub use client::{candidates_from_pairs, DexScreenerClient, DexScreenerConfig, DEFAULT_DEXSCREENER_URL};
pub use types::{DexPair, TokenPairsResponse};

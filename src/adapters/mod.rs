//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Jupiter: recent-tokens feed plus quote and swap-build API
//! - DexScreener: pair data feed and discovery source
//! - Helius: `searchAssets` discovery source
//! - Solana: RPC client and wallet management
//! - Telegram: MarkdownV2 formatting and Bot API sink
//! - CLI: Command-line interface definitions

pub mod cli;
pub mod dexscreener;
pub mod helius;
pub mod jupiter;
pub mod solana;
pub mod telegram;

pub use dexscreener::DexScreenerClient;
pub use helius::HeliusSource;
pub use jupiter::{JupiterClient, JupiterRecentSource};
pub use solana::{SolanaClient, WalletManager};
pub use telegram::TelegramNotifier;

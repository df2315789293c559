//! mint-sniper - Solana new-token scanner and Jupiter swap bot
//!
//! Discovers freshly launched SPL tokens, scores their risk, announces unseen
//! ones to Telegram exactly once and executes buy/sell swaps for connected
//! wallets.
//!
//! # Modules
//!
//! - `domain`: Core types and pure logic (TokenCandidate, scoring, seen set, trades)
//! - `ports`: Trait abstractions (TokenSource, SwapRouter, ChainGateway, NotificationSink)
//! - `adapters`: External implementations (Jupiter, DexScreener, Helius, Solana, Telegram, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Discovery pipeline, trade engine and command layer

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

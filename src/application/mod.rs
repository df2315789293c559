//! Application Layer - Use cases wiring domain logic to ports
//!
//! - Discovery: scan cycle with dedup and notification
//! - Trade engine: swap state machine
//! - Sessions and commands: chat-facing wallet operations

pub mod commands;
pub mod discovery;
pub mod dispatcher;
pub mod sessions;
pub mod trade_engine;

pub use commands::{
    BotCommand, BotService, CommandError, CommandOutcome, CommandSpec, ConnectedWallet, COMMANDS,
};
pub use discovery::{CycleReport, DiscoveryConfig, DiscoveryError, DiscoveryPipeline, PreviewEntry};
pub use dispatcher::NotificationDispatcher;
pub use sessions::{SessionKey, WalletSessionStore};
pub use trade_engine::{TradeEngine, TradeEngineConfig};

//! Telegram Adapter
//!
//! Notification sink over the Bot API plus the MarkdownV2 formatter used for
//! discovery announcements.

mod client;
mod markdown;

pub use client::{TelegramConfig, TelegramNotifier, DEFAULT_TELEGRAM_API};
pub use markdown::{escape_markdown_v2, format_discovery_message, format_usd};

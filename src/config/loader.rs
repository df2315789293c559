//! Configuration Loader
//!
//! Loads and validates configuration from a TOML file. Secrets are never
//! read from the file alone: each one can be supplied (and overridden) by
//! an environment variable.

use serde::Deserialize;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::application::{DiscoveryConfig, TradeEngineConfig};
use crate::ports::execution::PlatformFee;

pub const ENV_TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";
pub const ENV_HELIUS_API_KEY: &str = "HELIUS_API_KEY";
pub const ENV_JUPITER_API_KEY: &str = "JUPITER_API_KEY";
pub const ENV_SOLANA_RPC_URL: &str = "SOLANA_RPC_URL";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub discovery: DiscoverySection,
    #[serde(default)]
    pub sources: SourcesSection,
    #[serde(default)]
    pub jupiter: JupiterSection,
    #[serde(default)]
    pub solana: SolanaSection,
    #[serde(default)]
    pub telegram: TelegramSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Scan loop settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscoverySection {
    /// Seconds between the end of one cycle and the next
    pub interval_secs: u64,
    pub source_timeout_secs: u64,
    pub max_candidates_per_source: usize,
    pub max_notifications_per_cycle: usize,
    pub dispatch_delay_ms: u64,
    /// JSON array of mints already announced
    pub seen_file: String,
    pub enrich_with_pair_data: bool,
}

impl Default for DiscoverySection {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            source_timeout_secs: 10,
            max_candidates_per_source: 15,
            max_notifications_per_cycle: 10,
            dispatch_delay_ms: 1000,
            seen_file: crate::domain::DEFAULT_SEEN_FILE.to_string(),
            enrich_with_pair_data: true,
        }
    }
}

impl DiscoverySection {
    pub fn seen_file_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.seen_file).into_owned())
    }
}

/// Token feeds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesSection {
    pub jupiter_recent_url: String,
    pub dexscreener_enabled: bool,
    pub dexscreener_api_url: String,
    pub dexscreener_query: String,
    pub helius_enabled: bool,
    pub helius_rpc_url: String,
    pub helius_search_limit: u32,
    /// Normally left empty and supplied through `HELIUS_API_KEY`
    pub helius_api_key: Option<String>,
}

impl Default for SourcesSection {
    fn default() -> Self {
        Self {
            jupiter_recent_url: crate::adapters::jupiter::DEFAULT_RECENT_URL.to_string(),
            dexscreener_enabled: true,
            dexscreener_api_url: crate::adapters::dexscreener::DEFAULT_DEXSCREENER_URL.to_string(),
            dexscreener_query: "solana".to_string(),
            helius_enabled: false,
            helius_rpc_url: crate::adapters::helius::DEFAULT_HELIUS_URL.to_string(),
            helius_search_limit: 5,
            helius_api_key: None,
        }
    }
}

impl SourcesSection {
    /// `HELIUS_API_KEY` wins over the file
    pub fn get_helius_api_key(&self) -> Option<String> {
        env_non_empty(ENV_HELIUS_API_KEY).or_else(|| non_empty(self.helius_api_key.as_deref()))
    }
}

/// Jupiter API configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JupiterSection {
    pub api_url: String,
    /// Optional API key for higher rate limits
    pub api_key: Option<String>,
    /// Used when a command gives no slippage
    pub default_slippage_bps: u16,
    /// Protocol fee in basis points; 0 disables it
    pub fee_bps: u16,
    pub fee_destination: String,
    pub timeout_secs: u64,
}

impl Default for JupiterSection {
    fn default() -> Self {
        Self {
            api_url: "https://quote-api.jup.ag/v6".to_string(),
            api_key: None,
            default_slippage_bps: 100,
            fee_bps: 50,
            fee_destination: "33tNJLpWG878xFRQLkNM3aDWz66U1sSwwFUe9AGF1WfA".to_string(),
            timeout_secs: 15,
        }
    }
}

impl JupiterSection {
    /// Config value first, then `JUPITER_API_KEY`
    pub fn get_api_key(&self) -> Option<String> {
        non_empty(self.api_key.as_deref()).or_else(|| env_non_empty(ENV_JUPITER_API_KEY))
    }

    pub fn platform_fee(&self) -> Result<Option<PlatformFee>, ConfigError> {
        if self.fee_bps == 0 {
            return Ok(None);
        }
        let fee_destination = Pubkey::from_str(&self.fee_destination).map_err(|_| {
            ConfigError::ValidationError(format!(
                "fee_destination is not a valid address: {}",
                self.fee_destination
            ))
        })?;
        Ok(Some(PlatformFee {
            fee_bps: self.fee_bps,
            fee_destination,
        }))
    }
}

/// Solana RPC configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SolanaSection {
    pub rpc_url: String,
    /// "processed", "confirmed" or "finalized"
    pub commitment: String,
    pub confirm_timeout_secs: u64,
    /// Bound on each quote/build/broadcast step
    pub step_timeout_secs: u64,
    /// Wallet for the CLI trade commands (never commit this file)
    pub keypair_path: String,
}

impl Default for SolanaSection {
    fn default() -> Self {
        Self {
            rpc_url: "https://api.mainnet-beta.solana.com".to_string(),
            commitment: "confirmed".to_string(),
            confirm_timeout_secs: 60,
            step_timeout_secs: 15,
            keypair_path: "~/.config/solana/id.json".to_string(),
        }
    }
}

impl SolanaSection {
    /// `SOLANA_RPC_URL` wins over the file
    pub fn get_rpc_url(&self) -> String {
        env_non_empty(ENV_SOLANA_RPC_URL).unwrap_or_else(|| self.rpc_url.clone())
    }

    pub fn commitment_config(&self) -> Result<CommitmentConfig, ConfigError> {
        CommitmentConfig::from_str(&self.commitment).map_err(|_| {
            ConfigError::ValidationError(format!(
                "commitment must be processed, confirmed or finalized, got {}",
                self.commitment
            ))
        })
    }

    pub fn keypair_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.keypair_path).into_owned())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramSection {
    pub api_url: String,
    /// Target of the "Go Bot" button; empty disables it
    pub bot_username: String,
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
}

impl Default for TelegramSection {
    fn default() -> Self {
        Self {
            api_url: crate::adapters::telegram::DEFAULT_TELEGRAM_API.to_string(),
            bot_username: "SniperSPLToken_bot".to_string(),
            bot_token: None,
            chat_id: None,
        }
    }
}

impl TelegramSection {
    pub fn get_bot_token(&self) -> Option<String> {
        env_non_empty(ENV_TELEGRAM_BOT_TOKEN).or_else(|| non_empty(self.bot_token.as_deref()))
    }

    pub fn get_chat_id(&self) -> Option<String> {
        env_non_empty(ENV_TELEGRAM_CHAT_ID).or_else(|| non_empty(self.chat_id.as_deref()))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// "trace", "debug", "info", "warn" or "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.discovery;
        if d.interval_secs == 0 {
            return Err(invalid("discovery.interval_secs must be > 0"));
        }
        if d.source_timeout_secs == 0 {
            return Err(invalid("discovery.source_timeout_secs must be > 0"));
        }
        if d.max_candidates_per_source == 0 {
            return Err(invalid("discovery.max_candidates_per_source must be > 0"));
        }
        if d.max_notifications_per_cycle == 0 {
            return Err(invalid("discovery.max_notifications_per_cycle must be > 0"));
        }
        if d.seen_file.trim().is_empty() {
            return Err(invalid("discovery.seen_file cannot be empty"));
        }

        if self.sources.jupiter_recent_url.is_empty() {
            return Err(invalid("sources.jupiter_recent_url cannot be empty"));
        }
        if self.sources.helius_enabled && self.sources.helius_search_limit == 0 {
            return Err(invalid("sources.helius_search_limit must be > 0"));
        }

        let j = &self.jupiter;
        if j.api_url.is_empty() {
            return Err(invalid("jupiter.api_url cannot be empty"));
        }
        if j.default_slippage_bps == 0 || j.default_slippage_bps > 10_000 {
            return Err(ConfigError::ValidationError(format!(
                "jupiter.default_slippage_bps must be 1-10000, got {}",
                j.default_slippage_bps
            )));
        }
        if j.fee_bps > 10_000 {
            return Err(ConfigError::ValidationError(format!(
                "jupiter.fee_bps must be 0-10000, got {}",
                j.fee_bps
            )));
        }
        j.platform_fee()?;
        if j.timeout_secs == 0 {
            return Err(invalid("jupiter.timeout_secs must be > 0"));
        }

        let s = &self.solana;
        if s.rpc_url.is_empty() {
            return Err(invalid("solana.rpc_url cannot be empty"));
        }
        s.commitment_config()?;
        if s.confirm_timeout_secs == 0 || s.step_timeout_secs == 0 {
            return Err(invalid("solana timeouts must be > 0"));
        }

        if self.telegram.api_url.is_empty() {
            return Err(invalid("telegram.api_url cannot be empty"));
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "logging.level is not a level: {}",
                    other
                )))
            }
        }

        Ok(())
    }

    pub fn discovery_config(&self) -> DiscoveryConfig {
        let d = &self.discovery;
        DiscoveryConfig {
            interval: Duration::from_secs(d.interval_secs),
            source_timeout: Duration::from_secs(d.source_timeout_secs),
            max_candidates_per_source: d.max_candidates_per_source,
            max_notifications_per_cycle: d.max_notifications_per_cycle,
            dispatch_delay: Duration::from_millis(d.dispatch_delay_ms),
            enrich: d.enrich_with_pair_data,
        }
    }

    pub fn trade_engine_config(&self) -> Result<TradeEngineConfig, ConfigError> {
        Ok(TradeEngineConfig {
            step_timeout: Duration::from_secs(self.solana.step_timeout_secs),
            confirm_timeout: Duration::from_secs(self.solana.confirm_timeout_secs),
            fee: self.jupiter.platform_fee()?,
        })
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::ValidationError(message.to_string())
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn env_non_empty(key: &str) -> Option<String> {
    non_empty(std::env::var(key).ok().as_deref())
}

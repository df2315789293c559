//! CLI Command Definitions
//!
//! Arguments for the `mint-sniper` binary and its logging setup.

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

/// mint-sniper - new Solana token scanner, notifier and swap executor
#[derive(Parser, Debug)]
#[command(
    name = "mint-sniper",
    version = env!("CARGO_PKG_VERSION"),
    about = "Scan new Solana tokens, score them and trade them through Jupiter",
    long_about = "mint-sniper polls new-token feeds, scores every candidate with a weighted \
                  risk model, announces unseen tokens to Telegram and executes SOL swaps \
                  through the Jupiter aggregator."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Path to configuration file
    #[arg(
        short,
        long,
        global = true,
        value_name = "FILE",
        default_value = "config/mainnet.toml"
    )]
    pub config: PathBuf,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the discovery loop and send Telegram notifications
    Run(RunCmd),

    /// Fetch and rank candidates without notifying or marking them seen
    Preview(PreviewCmd),

    /// Buy a token with SOL
    Buy(BuyCmd),

    /// Sell the whole holding of a token for SOL
    Sell(SellCmd),

    /// List SPL token balances of the wallet
    Tokens(TokensCmd),
}

#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Run a single cycle and exit
    #[arg(long)]
    pub once: bool,
}

#[derive(Parser, Debug)]
pub struct PreviewCmd {
    /// Maximum rows to print
    #[arg(short, long, value_name = "N", default_value = "20")]
    pub limit: usize,
}

#[derive(Parser, Debug)]
pub struct BuyCmd {
    /// Token mint address
    #[arg(value_name = "MINT")]
    pub mint: String,

    /// SOL to spend (default 0.01)
    #[arg(value_name = "AMOUNT_SOL")]
    pub amount_sol: Option<Decimal>,

    /// Slippage in percent (default from config)
    #[arg(short, long, value_name = "PCT")]
    pub slippage: Option<Decimal>,

    /// Override keypair path
    #[arg(long, value_name = "FILE")]
    pub keypair: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct SellCmd {
    /// Token mint address
    #[arg(value_name = "MINT")]
    pub mint: String,

    /// Slippage in percent (default from config)
    #[arg(short, long, value_name = "PCT")]
    pub slippage: Option<Decimal>,

    /// Override keypair path
    #[arg(long, value_name = "FILE")]
    pub keypair: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct TokensCmd {
    /// Override keypair path
    #[arg(long, value_name = "FILE")]
    pub keypair: Option<PathBuf>,
}

/// Filter directive used when `RUST_LOG` is unset
pub fn default_directive(verbose: bool, debug: bool, config_level: &str) -> String {
    if debug {
        "debug".to_string()
    } else if verbose {
        "info".to_string()
    } else {
        config_level.to_lowercase()
    }
}

/// Initialize logging: `RUST_LOG` wins, then the flags, then the config level
pub fn init_logging(verbose: bool, debug: bool, config_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, debug, config_level)));

    fmt().with_env_filter(filter).with_target(false).init();
}

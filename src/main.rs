//! mint-sniper - Solana new-token scanner and Jupiter swap bot

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use mint_sniper::adapters::cli::{init_logging, CliApp, Command, PreviewCmd, RunCmd};
use mint_sniper::adapters::dexscreener::{DexScreenerClient, DexScreenerConfig};
use mint_sniper::adapters::helius::{HeliusConfig, HeliusSource};
use mint_sniper::adapters::jupiter::{JupiterClient, JupiterConfig, JupiterRecentSource};
use mint_sniper::adapters::solana::{SolanaClient, WalletManager};
use mint_sniper::adapters::telegram::{TelegramConfig, TelegramNotifier};
use mint_sniper::application::discovery;
use mint_sniper::application::{
    BotService, DiscoveryPipeline, NotificationDispatcher, SessionKey, TradeEngine,
    WalletSessionStore,
};
use mint_sniper::config::{load_config, Config};
use mint_sniper::domain::{SeenTokenStore, TradeResult};
use mint_sniper::ports::market_data::{PairLookup, TokenSource};

/// The CLI drives a single local wallet
const CLI_SESSION: SessionKey = SessionKey(0);

#[tokio::main]
async fn main() -> Result<()> {
    // Secrets go in .env, not in the config file
    dotenvy::dotenv().ok();

    let app = CliApp::parse();
    let config = load_config(&app.config)
        .with_context(|| format!("Failed to load configuration from {}", app.config.display()))?;
    init_logging(app.verbose, app.debug, &config.logging.level);

    match app.command {
        Command::Run(cmd) => run_command(cmd, &config).await,
        Command::Preview(cmd) => preview_command(cmd, &config).await,
        Command::Buy(cmd) => {
            let service = bot_service(&config, cmd.keypair.as_deref()).await?;
            let result = service
                .buy(CLI_SESSION, &cmd.mint, cmd.amount_sol, cmd.slippage)
                .await
                .context("Buy rejected")?;
            report_trade("Buy", &result)
        }
        Command::Sell(cmd) => {
            let service = bot_service(&config, cmd.keypair.as_deref()).await?;
            let result = service
                .sell(CLI_SESSION, &cmd.mint, cmd.slippage)
                .await
                .context("Sell rejected")?;
            report_trade("Sell", &result)
        }
        Command::Tokens(cmd) => {
            let service = bot_service(&config, cmd.keypair.as_deref()).await?;
            let holdings = service.tokens(CLI_SESSION).await.context("Failed to list tokens")?;
            if holdings.is_empty() {
                println!("No SPL tokens found.");
            }
            for holding in holdings {
                println!("{}  {}", holding.mint, holding.ui_amount());
            }
            Ok(())
        }
    }
}

async fn run_command(cmd: RunCmd, config: &Config) -> Result<()> {
    tracing::info!("Starting mint-sniper discovery...");

    let (sources, pair_lookup) = build_sources(config)?;

    let seen_path = config.discovery.seen_file_path();
    let seen = SeenTokenStore::load(&seen_path)
        .with_context(|| format!("Failed to load seen tokens from {}", seen_path.display()))?;
    tracing::info!("{} tokens already announced", seen.len());

    let bot_token = config
        .telegram
        .get_bot_token()
        .context("TELEGRAM_BOT_TOKEN is not set")?;
    let chat_id = config
        .telegram
        .get_chat_id()
        .context("TELEGRAM_CHAT_ID is not set")?;
    let notifier = TelegramNotifier::new(TelegramConfig {
        api_base_url: config.telegram.api_url.clone(),
        bot_token,
        chat_id,
        timeout: Duration::from_secs(config.discovery.source_timeout_secs),
    })
    .context("Failed to create Telegram notifier")?;

    let dispatcher = NotificationDispatcher::new(Arc::new(notifier))
        .with_bot_username(config.telegram.bot_username.clone());

    let mut pipeline = DiscoveryPipeline::new(sources, seen, dispatcher, config.discovery_config());
    if let Some(lookup) = pair_lookup {
        pipeline = pipeline.with_pair_lookup(lookup);
    }
    let pipeline = Arc::new(pipeline);

    if cmd.once {
        let report = pipeline.run_cycle().await.context("Discovery cycle failed")?;
        println!("{}", report);
        return Ok(());
    }

    // Setup Ctrl+C handler
    let handle = Arc::clone(&pipeline);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutdown signal received");
        handle.stop();
    });

    pipeline.run().await;
    tracing::info!("mint-sniper stopped");
    Ok(())
}

async fn preview_command(cmd: PreviewCmd, config: &Config) -> Result<()> {
    let (sources, _) = build_sources(config)?;
    let seen_path = config.discovery.seen_file_path();
    let seen = SeenTokenStore::load(&seen_path)
        .with_context(|| format!("Failed to load seen tokens from {}", seen_path.display()))?;

    let entries = discovery::preview(&sources, &config.discovery_config(), &seen).await;
    if entries.is_empty() {
        println!("No candidates returned by any source.");
    }

    for entry in entries.iter().take(cmd.limit) {
        let token = &entry.scored.token;
        let result = &entry.scored.result;
        println!(
            "{:>3} {:<9} {:<12} {:<44} {:<15} {}{}",
            result.score,
            result.tier.as_str(),
            token.symbol,
            token.mint,
            token.source,
            result.reason_text(),
            if entry.already_seen { "  [seen]" } else { "" }
        );
    }
    Ok(())
}

type Sources = (Vec<Arc<dyn TokenSource>>, Option<Arc<dyn PairLookup>>);

fn build_sources(config: &Config) -> Result<Sources> {
    let timeout = Duration::from_secs(config.discovery.source_timeout_secs);
    let mut sources: Vec<Arc<dyn TokenSource>> = Vec::new();
    let mut pair_lookup: Option<Arc<dyn PairLookup>> = None;

    let recent = JupiterRecentSource::new(config.sources.jupiter_recent_url.clone(), timeout)
        .context("Failed to create Jupiter recent-tokens source")?;
    sources.push(Arc::new(recent));

    let dexscreener = DexScreenerClient::new(DexScreenerConfig {
        api_base_url: config.sources.dexscreener_api_url.clone(),
        query: config.sources.dexscreener_query.clone(),
        timeout,
    })
    .context("Failed to create DexScreener client")?;
    let dexscreener = Arc::new(dexscreener);
    if config.sources.dexscreener_enabled {
        sources.push(dexscreener.clone());
    }
    if config.discovery.enrich_with_pair_data {
        pair_lookup = Some(dexscreener);
    }

    if config.sources.helius_enabled {
        let helius = HeliusSource::new(HeliusConfig {
            rpc_url: config.sources.helius_rpc_url.clone(),
            api_key: config.sources.get_helius_api_key(),
            limit: config.sources.helius_search_limit,
            timeout,
        })
        .context("Failed to create Helius source")?;
        sources.push(Arc::new(helius));
    }

    tracing::info!(
        "Sources: {}",
        sources
            .iter()
            .map(|s| s.tag().as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok((sources, pair_lookup))
}

/// Wire the trade engine and connect the local wallet to the CLI session
async fn bot_service(config: &Config, keypair: Option<&Path>) -> Result<BotService> {
    let keypair_path = match keypair {
        Some(path) => PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned()),
        None => config.solana.keypair_path(),
    };
    let wallet = load_wallet_with_context(&keypair_path)?;

    let commitment = config.solana.commitment_config()?;
    let chain = Arc::new(SolanaClient::new(config.solana.get_rpc_url(), commitment));

    let jupiter = JupiterClient::with_config(JupiterConfig {
        api_base_url: config.jupiter.api_url.clone(),
        api_key: config.jupiter.get_api_key(),
        timeout: Duration::from_secs(config.jupiter.timeout_secs),
    })
    .context("Failed to create Jupiter client")?;

    let engine = TradeEngine::new(Arc::new(jupiter), chain.clone(), config.trade_engine_config()?);
    let service = BotService::new(
        Arc::new(WalletSessionStore::new()),
        Arc::new(engine),
        chain,
        config.jupiter.default_slippage_bps,
    );

    let connected = service
        .connect(CLI_SESSION, wallet)
        .await
        .context("Failed to connect wallet")?;
    match connected.sol_balance {
        Some(lamports) => println!(
            "Wallet: {} ({:.4} SOL)",
            connected.pubkey,
            lamports as f64 / 1e9
        ),
        None => println!("Wallet: {} (balance unavailable)", connected.pubkey),
    }

    Ok(service)
}

/// Load wallet with helpful error messages
fn load_wallet_with_context(path: &Path) -> Result<WalletManager> {
    if !path.exists() {
        bail!(
            "Wallet file not found: {}\n\n\
             To create a new wallet, run:\n  \
             solana-keygen new --outfile {}\n\n\
             Or pass --keypair, or update 'keypair_path' in your config",
            path.display(),
            path.display()
        );
    }

    WalletManager::from_file(path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to load wallet from '{}': {}\n\n\
             Expected format: JSON array of 64 bytes (e.g., [1,2,3,...])",
            path.display(),
            e
        )
    })
}

fn report_trade(label: &str, result: &TradeResult) -> Result<()> {
    if !result.is_success() {
        bail!("{} failed: {}", label, result);
    }

    let amount = result
        .ui_output_amount()
        .map(|d| d.to_string())
        .unwrap_or_else(|| result.output_amount.to_string());
    if let Some(signature) = result.signature {
        println!("{} successful!", label);
        println!("Received: {}", amount);
        println!("https://solscan.io/tx/{}", signature);
    }
    Ok(())
}

//! Chat command table and handlers.
//!
//! Parsing turns a line such as `/buy <mint> 0.02 2` into a [`BotCommand`];
//! [`BotService`] runs the command against the session's wallet and returns
//! plain data for the caller to render.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

use super::sessions::{SessionKey, WalletSessionStore};
use super::trade_engine::TradeEngine;
use crate::adapters::solana::WalletManager;
use crate::domain::trade::{TradeRequest, TradeResult};
use crate::ports::chain::{ChainGateway, TokenHolding};

pub const DEFAULT_BUY_AMOUNT_SOL: Decimal = dec!(0.01);

const LAMPORTS_PER_SOL: Decimal = dec!(1000000000);

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("No wallet connected for this chat")]
    NoWallet,

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid mint address: {0}")]
    InvalidMint(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Usage: {0}")]
    MissingArgument(&'static str),

    #[error("Chain query failed: {0}")]
    Chain(String),

    #[error("Trade task failed: {0}")]
    TaskFailed(String),
}

/// One row of the command table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub command: &'static str,
    pub name: &'static str,
    pub usage: &'static str,
    pub summary: &'static str,
}

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "/start",
        name: "start",
        usage: "/start",
        summary: "Show the welcome message and quick menu",
    },
    CommandSpec {
        command: "/help",
        name: "help",
        usage: "/help",
        summary: "List every command",
    },
    CommandSpec {
        command: "/connect",
        name: "connect",
        usage: "/connect <private key as JSON array or base58>",
        summary: "Attach a wallet to this chat",
    },
    CommandSpec {
        command: "/tokens",
        name: "tokens",
        usage: "/tokens",
        summary: "Show SPL token balances of the connected wallet",
    },
    CommandSpec {
        command: "/buy",
        name: "buy",
        usage: "/buy <tokenMint> [amountSOL=0.01] [slippage%=1]",
        summary: "Buy a token with SOL",
    },
    CommandSpec {
        command: "/sell",
        name: "sell",
        usage: "/sell <tokenMint> [slippage%=1]",
        summary: "Sell the full holding of a token for SOL",
    },
];

pub fn command_spec(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.name == name)
}

fn usage(name: &str) -> &'static str {
    command_spec(name).map(|spec| spec.usage).unwrap_or("/help")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Help,
    Connect {
        secret: String,
    },
    Tokens,
    Buy {
        mint: String,
        amount_sol: Option<Decimal>,
        slippage_pct: Option<Decimal>,
    },
    Sell {
        mint: String,
        slippage_pct: Option<Decimal>,
    },
}

impl BotCommand {
    /// Parse a chat line. A `@botname` suffix on the command is ignored.
    pub fn parse(text: &str) -> Result<Self, CommandError> {
        let text = text.trim();
        let (head, rest) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
        let name = head
            .strip_prefix('/')
            .ok_or_else(|| CommandError::UnknownCommand(head.to_string()))?;
        let name = name.split('@').next().unwrap_or(name);
        let args: Vec<&str> = rest.split_whitespace().collect();

        match name {
            "start" => Ok(BotCommand::Start),
            "help" => Ok(BotCommand::Help),
            "tokens" => Ok(BotCommand::Tokens),
            "connect" => {
                let secret = rest.trim();
                if secret.is_empty() {
                    return Err(CommandError::MissingArgument(usage("connect")));
                }
                Ok(BotCommand::Connect {
                    secret: secret.to_string(),
                })
            }
            "buy" => {
                let mint = args
                    .first()
                    .ok_or(CommandError::MissingArgument(usage("buy")))?;
                Ok(BotCommand::Buy {
                    mint: mint.to_string(),
                    amount_sol: parse_decimal_arg(args.get(1))?,
                    slippage_pct: parse_decimal_arg(args.get(2))?,
                })
            }
            "sell" => {
                let mint = args
                    .first()
                    .ok_or(CommandError::MissingArgument(usage("sell")))?;
                Ok(BotCommand::Sell {
                    mint: mint.to_string(),
                    slippage_pct: parse_decimal_arg(args.get(1))?,
                })
            }
            other => Err(CommandError::UnknownCommand(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BotCommand::Start => "start",
            BotCommand::Help => "help",
            BotCommand::Connect { .. } => "connect",
            BotCommand::Tokens => "tokens",
            BotCommand::Buy { .. } => "buy",
            BotCommand::Sell { .. } => "sell",
        }
    }
}

fn parse_decimal_arg(arg: Option<&&str>) -> Result<Option<Decimal>, CommandError> {
    arg.map(|raw| Decimal::from_str(raw).map_err(|_| CommandError::InvalidAmount(raw.to_string())))
        .transpose()
}

/// SOL amount to lamports, truncating sub-lamport dust
pub fn sol_to_lamports(amount_sol: Decimal) -> Result<u64, CommandError> {
    if amount_sol <= Decimal::ZERO {
        return Err(CommandError::InvalidAmount(format!("{} SOL", amount_sol)));
    }
    let lamports = (amount_sol * LAMPORTS_PER_SOL)
        .trunc()
        .to_u64()
        .ok_or_else(|| CommandError::InvalidAmount(format!("{} SOL", amount_sol)))?;
    if lamports == 0 {
        return Err(CommandError::InvalidAmount(format!("{} SOL is below one lamport", amount_sol)));
    }
    Ok(lamports)
}

/// Percent to basis points, e.g. 1.5% → 150
pub fn slippage_pct_to_bps(pct: Decimal) -> Result<u16, CommandError> {
    let bps = (pct * dec!(100)).round();
    match bps.to_u16() {
        Some(bps) if (1..=10_000).contains(&bps) => Ok(bps),
        _ => Err(CommandError::InvalidAmount(format!("slippage {}%", pct))),
    }
}

/// Result of a successful `connect`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectedWallet {
    pub pubkey: Pubkey,
    /// Best-effort native balance
    pub sol_balance: Option<u64>,
    /// Key of the wallet this one replaced
    pub replaced: Option<Pubkey>,
}

/// Data returned by [`BotService::handle`]
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Welcome(&'static [CommandSpec]),
    Help(&'static [CommandSpec]),
    Connected(ConnectedWallet),
    Holdings(Vec<TokenHolding>),
    Trade(TradeResult),
}

pub struct BotService {
    sessions: Arc<WalletSessionStore>,
    engine: Arc<TradeEngine>,
    chain: Arc<dyn ChainGateway>,
    default_slippage_bps: u16,
}

impl BotService {
    pub fn new(
        sessions: Arc<WalletSessionStore>,
        engine: Arc<TradeEngine>,
        chain: Arc<dyn ChainGateway>,
        default_slippage_bps: u16,
    ) -> Self {
        Self {
            sessions,
            engine,
            chain,
            default_slippage_bps,
        }
    }

    pub fn sessions(&self) -> &Arc<WalletSessionStore> {
        &self.sessions
    }

    pub async fn handle(
        &self,
        session: SessionKey,
        command: BotCommand,
    ) -> Result<CommandOutcome, CommandError> {
        tracing::debug!(%session, command = command.name(), "Handling command");

        match command {
            BotCommand::Start => Ok(CommandOutcome::Welcome(COMMANDS)),
            BotCommand::Help => Ok(CommandOutcome::Help(COMMANDS)),
            BotCommand::Connect { secret } => {
                let wallet = WalletManager::from_secret(&secret)
                    .map_err(|e| CommandError::InvalidKey(e.to_string()))?;
                self.connect(session, wallet).await.map(CommandOutcome::Connected)
            }
            BotCommand::Tokens => self.tokens(session).await.map(CommandOutcome::Holdings),
            BotCommand::Buy {
                mint,
                amount_sol,
                slippage_pct,
            } => self
                .buy(session, &mint, amount_sol, slippage_pct)
                .await
                .map(CommandOutcome::Trade),
            BotCommand::Sell { mint, slippage_pct } => self
                .sell(session, &mint, slippage_pct)
                .await
                .map(CommandOutcome::Trade),
        }
    }

    /// Store `wallet` for the session and report its SOL balance
    pub async fn connect(
        &self,
        session: SessionKey,
        wallet: WalletManager,
    ) -> Result<ConnectedWallet, CommandError> {
        let pubkey = wallet.pubkey();
        let replaced = self.sessions.insert(session, wallet).await;

        let sol_balance = match self.chain.sol_balance(&pubkey).await {
            Ok(lamports) => Some(lamports),
            Err(e) => {
                tracing::warn!(%pubkey, "SOL balance lookup failed: {}", e);
                None
            }
        };

        Ok(ConnectedWallet {
            pubkey,
            sol_balance,
            replaced,
        })
    }

    pub async fn tokens(&self, session: SessionKey) -> Result<Vec<TokenHolding>, CommandError> {
        let wallet = self.wallet(session).await?;
        let mut holdings = self
            .chain
            .token_holdings(&wallet.pubkey())
            .await
            .map_err(|e| CommandError::Chain(e.to_string()))?;
        holdings.retain(|h| h.amount > 0);
        Ok(holdings)
    }

    pub async fn buy(
        &self,
        session: SessionKey,
        mint: &str,
        amount_sol: Option<Decimal>,
        slippage_pct: Option<Decimal>,
    ) -> Result<TradeResult, CommandError> {
        let wallet = self.wallet(session).await?;
        let mint = parse_mint(mint)?;
        let lamports = sol_to_lamports(amount_sol.unwrap_or(DEFAULT_BUY_AMOUNT_SOL))?;
        let slippage_bps = self.slippage_bps(slippage_pct)?;

        let engine = Arc::clone(&self.engine);
        self.spawn_trade(async move {
            let request = TradeRequest::buy(mint, lamports, slippage_bps, wallet.keypair());
            engine.execute(&request).await
        })
        .await
    }

    pub async fn sell(
        &self,
        session: SessionKey,
        mint: &str,
        slippage_pct: Option<Decimal>,
    ) -> Result<TradeResult, CommandError> {
        let wallet = self.wallet(session).await?;
        let mint = parse_mint(mint)?;
        let slippage_bps = self.slippage_bps(slippage_pct)?;

        let engine = Arc::clone(&self.engine);
        self.spawn_trade(async move {
            let request = TradeRequest::sell_all(mint, slippage_bps, wallet.keypair());
            engine.execute(&request).await
        })
        .await
    }

    async fn wallet(&self, session: SessionKey) -> Result<Arc<WalletManager>, CommandError> {
        self.sessions.get(session).await.ok_or(CommandError::NoWallet)
    }

    fn slippage_bps(&self, pct: Option<Decimal>) -> Result<u16, CommandError> {
        match pct {
            Some(pct) => slippage_pct_to_bps(pct),
            None => Ok(self.default_slippage_bps),
        }
    }

    /// Run a trade in its own task so a panic stays inside it
    async fn spawn_trade<F>(&self, trade: F) -> Result<TradeResult, CommandError>
    where
        F: std::future::Future<Output = TradeResult> + Send + 'static,
    {
        tokio::spawn(trade)
            .await
            .map_err(|e| CommandError::TaskFailed(e.to_string()))
    }
}

fn parse_mint(mint: &str) -> Result<Pubkey, CommandError> {
    Pubkey::from_str(mint.trim()).map_err(|_| CommandError::InvalidMint(mint.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::trade_engine::TradeEngineConfig;
    use crate::domain::trade::{TradeFailureReason, TradeStage};
    use crate::ports::mocks::{FakeChain, RecordingSwapRouter};

    fn service(router: Arc<RecordingSwapRouter>, chain: Arc<FakeChain>) -> BotService {
        let engine = TradeEngine::new(router, chain.clone(), TradeEngineConfig::default());
        BotService::new(
            Arc::new(WalletSessionStore::new()),
            Arc::new(engine),
            chain,
            100,
        )
    }

    #[test]
    fn test_command_table_covers_every_command() {
        let names: Vec<_> = COMMANDS.iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["start", "help", "connect", "tokens", "buy", "sell"]);
        for spec in COMMANDS {
            assert_eq!(spec.command, format!("/{}", spec.name));
            assert!(spec.usage.starts_with(spec.command));
        }
    }

    #[test]
    fn test_parse_buy() {
        let cmd = BotCommand::parse("/buy 9n4nbM75f5Ui33ZbPYXn59EwSgE8CGsHtAeTH5YFeJ9E 0.02 2").unwrap();
        assert_eq!(
            cmd,
            BotCommand::Buy {
                mint: "9n4nbM75f5Ui33ZbPYXn59EwSgE8CGsHtAeTH5YFeJ9E".to_string(),
                amount_sol: Some(dec!(0.02)),
                slippage_pct: Some(dec!(2)),
            }
        );

        let bare = BotCommand::parse("/buy@SniperSPLToken_bot MintX").unwrap();
        assert!(matches!(bare, BotCommand::Buy { amount_sol: None, slippage_pct: None, .. }));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(BotCommand::parse("/buy"), Err(CommandError::MissingArgument(_))));
        assert!(matches!(BotCommand::parse("/sell Mint abc"), Err(CommandError::InvalidAmount(_))));
        assert!(matches!(BotCommand::parse("/moon"), Err(CommandError::UnknownCommand(_))));
        assert!(matches!(BotCommand::parse("hello"), Err(CommandError::UnknownCommand(_))));
        assert_eq!(BotCommand::parse(" /tokens ").unwrap(), BotCommand::Tokens);
    }

    #[test]
    fn test_decimal_conversions() {
        assert_eq!(sol_to_lamports(dec!(0.01)).unwrap(), 10_000_000);
        assert_eq!(sol_to_lamports(dec!(1.5)).unwrap(), 1_500_000_000);
        assert!(sol_to_lamports(dec!(0)).is_err());
        assert!(sol_to_lamports(dec!(-1)).is_err());
        assert!(sol_to_lamports(dec!(0.0000000001)).is_err());

        assert_eq!(slippage_pct_to_bps(dec!(1)).unwrap(), 100);
        assert_eq!(slippage_pct_to_bps(dec!(0.5)).unwrap(), 50);
        assert!(slippage_pct_to_bps(dec!(0)).is_err());
        assert!(slippage_pct_to_bps(dec!(101)).is_err());
    }

    #[tokio::test]
    async fn test_buy_without_wallet() {
        let router = Arc::new(RecordingSwapRouter::new());
        let svc = service(router.clone(), Arc::new(FakeChain::new()));

        let result = svc.buy(SessionKey(1), &Pubkey::new_unique().to_string(), None, None).await;
        assert!(matches!(result, Err(CommandError::NoWallet)));
        assert!(router.quote_calls().is_empty());
    }

    #[tokio::test]
    async fn test_buy_uses_defaults() {
        let router = Arc::new(RecordingSwapRouter::new());
        let svc = service(router.clone(), Arc::new(FakeChain::new().with_sol_balance(5)));

        let connected = svc.connect(SessionKey(1), WalletManager::new_random()).await.unwrap();
        assert_eq!(connected.sol_balance, Some(5));

        let mint = Pubkey::new_unique();
        let result = svc.buy(SessionKey(1), &mint.to_string(), None, None).await.unwrap();
        assert_eq!(result.failed_at, Some(TradeStage::SwapBuilt));

        let quotes = router.quote_calls();
        assert_eq!(quotes[0].amount, 10_000_000);
        assert_eq!(quotes[0].slippage_bps, 100);
        assert_eq!(quotes[0].output_mint, mint);
    }

    #[tokio::test]
    async fn test_invalid_mint_rejected_before_engine() {
        let router = Arc::new(RecordingSwapRouter::new());
        let svc = service(router.clone(), Arc::new(FakeChain::new()));
        svc.connect(SessionKey(2), WalletManager::new_random()).await.unwrap();

        let result = svc.sell(SessionKey(2), "not-a-mint", None).await;
        assert!(matches!(result, Err(CommandError::InvalidMint(_))));
        assert!(router.quote_calls().is_empty());
    }

    #[tokio::test]
    async fn test_sell_with_no_balance() {
        let router = Arc::new(RecordingSwapRouter::new());
        let chain = Arc::new(FakeChain::new().with_token_balance(0));
        let svc = service(router.clone(), chain);
        svc.connect(SessionKey(3), WalletManager::new_random()).await.unwrap();

        let outcome = svc
            .handle(
                SessionKey(3),
                BotCommand::Sell {
                    mint: Pubkey::new_unique().to_string(),
                    slippage_pct: Some(dec!(2)),
                },
            )
            .await
            .unwrap();

        match outcome {
            CommandOutcome::Trade(result) => {
                assert_eq!(result.failure_reason, Some(TradeFailureReason::NoBalance));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(router.quote_calls().is_empty());
    }

    #[tokio::test]
    async fn test_panicking_trade_is_contained() {
        let router = Arc::new(RecordingSwapRouter::new().with_quote_panic());
        let chain = Arc::new(FakeChain::new().with_token_balance(0));
        let svc = service(router.clone(), chain);
        svc.connect(SessionKey(5), WalletManager::new_random()).await.unwrap();
        svc.connect(SessionKey(6), WalletManager::new_random()).await.unwrap();

        let result = svc.buy(SessionKey(5), &Pubkey::new_unique().to_string(), None, None).await;
        assert!(matches!(result, Err(CommandError::TaskFailed(_))));
        assert_eq!(router.quote_calls().len(), 1);

        // Other sessions keep trading through the same service
        let other = svc.sell(SessionKey(6), &Pubkey::new_unique().to_string(), None).await.unwrap();
        assert_eq!(other.failure_reason, Some(TradeFailureReason::NoBalance));
        assert!(svc.sessions().contains(SessionKey(5)).await);
    }

    #[tokio::test]
    async fn test_connect_with_bad_key() {
        let svc = service(Arc::new(RecordingSwapRouter::new()), Arc::new(FakeChain::new()));
        let result = svc
            .handle(SessionKey(4), BotCommand::Connect { secret: "nope".to_string() })
            .await;
        assert!(matches!(result, Err(CommandError::InvalidKey(_))));
        assert!(!svc.sessions().contains(SessionKey(4)).await);
    }
}

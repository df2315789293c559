//! Recording fakes for the ports
//!
//! Each fake records the calls it receives and returns a response configured
//! through builder methods. Used by unit tests and the `tests/` suite.

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::VersionedTransaction;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use super::chain::{ChainError, ChainGateway, TokenHolding};
use super::execution::{
    BuildSwapRequest, BuiltSwap, ExecutionError, SwapQuote, SwapQuoteRequest, SwapRouter,
};
use super::market_data::{PairLookup, SourceError, TokenSource};
use super::notifier::{NotificationSink, NotifyError, OutboundMessage};
use crate::domain::{PairSnapshot, SourceTag, TokenCandidate};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Build a router-shaped quote body with the given `outAmount`
pub fn quote_with_out_amount(out_amount: u64) -> SwapQuote {
    SwapQuote {
        raw: serde_json::json!({
            "inAmount": "10000000",
            "outAmount": out_amount.to_string(),
            "priceImpactPct": "0.1",
            "routePlan": []
        }),
        out_amount: Some(out_amount),
        price_impact_pct: Some(0.1),
    }
}

/// A quote whose body lacks `outAmount`
pub fn quote_without_out_amount() -> SwapQuote {
    SwapQuote {
        raw: serde_json::json!({ "inAmount": "10000000", "routePlan": [] }),
        out_amount: None,
        price_impact_pct: None,
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Token source returning a fixed list, or failing
#[derive(Debug)]
pub struct StaticTokenSource {
    tag: SourceTag,
    candidates: Vec<TokenCandidate>,
    fail: bool,
    panic: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StaticTokenSource {
    pub fn new(tag: SourceTag, candidates: Vec<TokenCandidate>) -> Self {
        Self {
            tag,
            candidates,
            fail: false,
            panic: false,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// A source whose every fetch errors
    pub fn failing(tag: SourceTag) -> Self {
        Self {
            fail: true,
            ..Self::new(tag, Vec::new())
        }
    }

    /// A source whose every fetch panics
    pub fn panicking(tag: SourceTag) -> Self {
        Self {
            panic: true,
            ..Self::new(tag, Vec::new())
        }
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    fn tag(&self) -> SourceTag {
        self.tag
    }

    async fn fetch_candidates(&self) -> Result<Vec<TokenCandidate>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.panic {
            panic!("{} feed returned a malformed payload", self.tag);
        }
        if self.fail {
            return Err(SourceError::Http("connection refused".to_string()));
        }
        Ok(self.candidates.clone())
    }
}

/// Pair lookup backed by a map
#[derive(Debug, Default)]
pub struct StaticPairLookup {
    pairs: HashMap<String, PairSnapshot>,
    calls: Mutex<Vec<String>>,
}

impl StaticPairLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pair(mut self, mint: &str, pair: PairSnapshot) -> Self {
        self.pairs.insert(mint.to_string(), pair);
        self
    }

    pub fn get_calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl PairLookup for StaticPairLookup {
    async fn lookup_pair(&self, mint: &str) -> Result<Option<PairSnapshot>, SourceError> {
        lock(&self.calls).push(mint.to_string());
        Ok(self.pairs.get(mint).cloned())
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Swap router that records every call
#[derive(Debug)]
pub struct RecordingSwapRouter {
    quote_response: Result<SwapQuote, String>,
    build_response: Result<BuiltSwap, String>,
    quote_delay: Option<Duration>,
    quote_panics: bool,
    quote_calls: Mutex<Vec<SwapQuoteRequest>>,
    build_calls: Mutex<Vec<BuildSwapRequest>>,
}

impl Default for RecordingSwapRouter {
    fn default() -> Self {
        Self {
            quote_response: Ok(quote_with_out_amount(1_000_000)),
            build_response: Ok(BuiltSwap::default()),
            quote_delay: None,
            quote_panics: false,
            quote_calls: Mutex::new(Vec::new()),
            build_calls: Mutex::new(Vec::new()),
        }
    }
}

impl RecordingSwapRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quote(mut self, quote: SwapQuote) -> Self {
        self.quote_response = Ok(quote);
        self
    }

    pub fn with_quote_error(mut self, message: &str) -> Self {
        self.quote_response = Err(message.to_string());
        self
    }

    pub fn with_quote_delay(mut self, delay: Duration) -> Self {
        self.quote_delay = Some(delay);
        self
    }

    /// Panic inside `quote` after recording the call
    pub fn with_quote_panic(mut self) -> Self {
        self.quote_panics = true;
        self
    }

    /// Respond to builds with this base64 transaction
    pub fn with_swap_transaction(mut self, encoded: impl Into<String>) -> Self {
        self.build_response = Ok(BuiltSwap {
            swap_transaction: Some(encoded.into()),
            last_valid_block_height: Some(1),
        });
        self
    }

    pub fn with_build_response(mut self, built: BuiltSwap) -> Self {
        self.build_response = Ok(built);
        self
    }

    pub fn with_build_error(mut self, message: &str) -> Self {
        self.build_response = Err(message.to_string());
        self
    }

    pub fn quote_calls(&self) -> Vec<SwapQuoteRequest> {
        lock(&self.quote_calls).clone()
    }

    pub fn build_calls(&self) -> Vec<BuildSwapRequest> {
        lock(&self.build_calls).clone()
    }
}

#[async_trait]
impl SwapRouter for RecordingSwapRouter {
    async fn quote(&self, request: &SwapQuoteRequest) -> Result<SwapQuote, ExecutionError> {
        lock(&self.quote_calls).push(request.clone());
        if self.quote_panics {
            panic!("router quote for {} blew up", request.output_mint);
        }
        if let Some(delay) = self.quote_delay {
            tokio::time::sleep(delay).await;
        }
        self.quote_response.clone().map_err(ExecutionError::ApiError)
    }

    async fn build_swap(&self, request: &BuildSwapRequest) -> Result<BuiltSwap, ExecutionError> {
        lock(&self.build_calls).push(request.clone());
        self.build_response.clone().map_err(ExecutionError::ApiError)
    }
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

/// How the fake chain answers confirmation requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmBehavior {
    Confirm,
    Fail,
    /// Never resolves, whatever timeout is passed in
    Hang,
}

/// In-memory chain that records broadcasts
#[derive(Debug)]
pub struct FakeChain {
    token_balance: Result<u64, String>,
    sol_balance: u64,
    holdings: Vec<TokenHolding>,
    decimals: HashMap<Pubkey, u8>,
    send_error: Option<String>,
    confirm: ConfirmBehavior,
    balance_calls: AtomicUsize,
    sent: Mutex<Vec<VersionedTransaction>>,
}

impl Default for FakeChain {
    fn default() -> Self {
        Self {
            token_balance: Ok(0),
            sol_balance: 0,
            holdings: Vec::new(),
            decimals: HashMap::new(),
            send_error: None,
            confirm: ConfirmBehavior::Confirm,
            balance_calls: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }
}

impl FakeChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token_balance(mut self, amount: u64) -> Self {
        self.token_balance = Ok(amount);
        self
    }

    pub fn with_balance_error(mut self, message: &str) -> Self {
        self.token_balance = Err(message.to_string());
        self
    }

    pub fn with_sol_balance(mut self, lamports: u64) -> Self {
        self.sol_balance = lamports;
        self
    }

    pub fn with_holding(mut self, holding: TokenHolding) -> Self {
        self.decimals.insert(holding.mint, holding.decimals);
        self.holdings.push(holding);
        self
    }

    pub fn with_decimals(mut self, mint: Pubkey, decimals: u8) -> Self {
        self.decimals.insert(mint, decimals);
        self
    }

    pub fn with_send_error(mut self, message: &str) -> Self {
        self.send_error = Some(message.to_string());
        self
    }

    pub fn with_confirm(mut self, behavior: ConfirmBehavior) -> Self {
        self.confirm = behavior;
        self
    }

    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }

    pub fn sent_transactions(&self) -> Vec<VersionedTransaction> {
        lock(&self.sent).clone()
    }
}

#[async_trait]
impl ChainGateway for FakeChain {
    async fn token_balance(&self, _owner: &Pubkey, _mint: &Pubkey) -> Result<u64, ChainError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        self.token_balance.clone().map_err(ChainError::Rpc)
    }

    async fn sol_balance(&self, _owner: &Pubkey) -> Result<u64, ChainError> {
        Ok(self.sol_balance)
    }

    async fn token_holdings(&self, _owner: &Pubkey) -> Result<Vec<TokenHolding>, ChainError> {
        Ok(self.holdings.clone())
    }

    async fn token_decimals(&self, mint: &Pubkey) -> Result<u8, ChainError> {
        self.decimals
            .get(mint)
            .copied()
            .ok_or_else(|| ChainError::AccountData(format!("unknown mint {}", mint)))
    }

    async fn send_transaction(&self, tx: &VersionedTransaction) -> Result<Signature, ChainError> {
        if let Some(message) = &self.send_error {
            return Err(ChainError::Rpc(message.clone()));
        }
        lock(&self.sent).push(tx.clone());
        Ok(tx.signatures.first().copied().unwrap_or_default())
    }

    async fn confirm_transaction(
        &self,
        signature: &Signature,
        _timeout: Duration,
    ) -> Result<(), ChainError> {
        match self.confirm {
            ConfirmBehavior::Confirm => Ok(()),
            ConfirmBehavior::Fail => Err(ChainError::TransactionFailed(format!(
                "{} InstructionError(2, Custom(6001))",
                signature
            ))),
            ConfirmBehavior::Hang => std::future::pending().await,
        }
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// What the recording sink does after storing a message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SinkBehavior {
    #[default]
    Deliver,
    Reject,
    Panic,
    /// Never returns
    Hang,
}

/// Sink that stores every message it is asked to send
#[derive(Debug, Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<OutboundMessage>>,
    behavior: SinkBehavior,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record attempts but report every send as failed
    pub fn failing() -> Self {
        Self::with_behavior(SinkBehavior::Reject)
    }

    pub fn with_behavior(behavior: SinkBehavior) -> Self {
        Self {
            behavior,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<OutboundMessage> {
        lock(&self.sent).clone()
    }

    pub fn count(&self) -> usize {
        lock(&self.sent).len()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, message: &OutboundMessage) -> Result<(), NotifyError> {
        lock(&self.sent).push(message.clone());
        match self.behavior {
            SinkBehavior::Deliver => Ok(()),
            SinkBehavior::Reject => Err(NotifyError::Rejected("Bad Request: chat not found".to_string())),
            SinkBehavior::Panic => panic!("sink crashed while sending"),
            SinkBehavior::Hang => std::future::pending().await,
        }
    }
}

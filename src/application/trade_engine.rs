//! Trade Engine
//!
//! Drives one swap through QUOTE_REQUESTED → QUOTE_RECEIVED → SWAP_BUILT →
//! SIGNED → BROADCAST → CONFIRMED. The first failing stage ends the trade and
//! is reported in the returned `TradeResult`; nothing is thrown past `execute`.

use base64::{engine::general_purpose::STANDARD, Engine};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signer::Signer;
use solana_sdk::transaction::VersionedTransaction;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::trade::{
    TradeDirection, TradeFailureReason, TradeRequest, TradeResult, TradeStage, SOL_DECIMALS,
};
use crate::ports::chain::{ChainError, ChainGateway};
use crate::ports::execution::{BuildSwapRequest, PlatformFee, SwapQuoteRequest, SwapRouter};

#[derive(Debug, Clone)]
pub struct TradeEngineConfig {
    /// Bound on each network step before confirmation
    pub step_timeout: Duration,
    /// Bound on waiting for confirmation
    pub confirm_timeout: Duration,
    /// Protocol fee injected into every swap build
    pub fee: Option<PlatformFee>,
}

impl Default for TradeEngineConfig {
    fn default() -> Self {
        Self {
            step_timeout: Duration::from_secs(15),
            confirm_timeout: Duration::from_secs(60),
            fee: None,
        }
    }
}

pub struct TradeEngine {
    router: Arc<dyn SwapRouter>,
    chain: Arc<dyn ChainGateway>,
    config: TradeEngineConfig,
}

type StepResult<T> = Result<T, (TradeStage, TradeFailureReason)>;

impl TradeEngine {
    pub fn new(
        router: Arc<dyn SwapRouter>,
        chain: Arc<dyn ChainGateway>,
        config: TradeEngineConfig,
    ) -> Self {
        Self {
            router,
            chain,
            config,
        }
    }

    pub fn config(&self) -> &TradeEngineConfig {
        &self.config
    }

    /// Execute a trade to a terminal state
    pub async fn execute(&self, request: &TradeRequest<'_>) -> TradeResult {
        tracing::info!(
            mint = %request.mint,
            direction = %request.direction,
            amount = request.amount,
            slippage_bps = request.slippage_bps,
            "Trade requested"
        );

        match self.run_stages(request).await {
            Ok(result) => {
                tracing::info!(mint = %request.mint, "Trade confirmed: {}", result);
                result
            }
            Err((stage, reason)) => {
                tracing::warn!(mint = %request.mint, stage = ?stage, "Trade failed: {}", reason);
                TradeResult::failure(stage, reason)
            }
        }
    }

    async fn run_stages(&self, request: &TradeRequest<'_>) -> StepResult<TradeResult> {
        let owner = request.owner();
        let wsol = spl_token::native_mint::id();

        let (input_mint, output_mint, amount) = match request.direction {
            TradeDirection::Buy => (wsol, request.mint, request.amount),
            TradeDirection::Sell => {
                let held = self.holding(&owner, &request.mint).await?;
                (request.mint, wsol, request.amount.min(held))
            }
        };

        // QUOTE_REQUESTED
        let quote_request = SwapQuoteRequest {
            input_mint,
            output_mint,
            amount,
            slippage_bps: request.slippage_bps,
        };
        let quote = self
            .within(TradeStage::QuoteRequested, self.router.quote(&quote_request))
            .await?
            .map_err(|e| {
                (
                    TradeStage::QuoteRequested,
                    TradeFailureReason::QuoteUnavailable(e.to_string()),
                )
            })?;

        let out_amount = match quote.out_amount {
            Some(n) if n > 0 => n,
            _ => {
                return Err((TradeStage::QuoteRequested, TradeFailureReason::MissingOutAmount));
            }
        };
        tracing::debug!(stage = %TradeStage::QuoteReceived, out_amount, "Quote accepted");

        // SWAP_BUILT
        let build_request = BuildSwapRequest {
            quote,
            user_public_key: owner,
            fee: self.config.fee.clone(),
        };
        let built = self
            .within(TradeStage::SwapBuilt, self.router.build_swap(&build_request))
            .await?
            .map_err(|e| {
                (
                    TradeStage::SwapBuilt,
                    TradeFailureReason::SwapBuildFailed(e.to_string()),
                )
            })?;
        let payload = built
            .swap_transaction
            .ok_or((TradeStage::SwapBuilt, TradeFailureReason::NoTransactionPayload))?;
        tracing::debug!(stage = %TradeStage::SwapBuilt, "Swap transaction received");

        // SIGNED
        let signed = sign_payload(&payload, request)
            .map_err(|reason| (TradeStage::Signed, reason))?;
        tracing::debug!(stage = %TradeStage::Signed, "Transaction signed");

        // BROADCAST
        let signature = self
            .within(TradeStage::Broadcast, self.chain.send_transaction(&signed))
            .await?
            .map_err(|e| {
                (
                    TradeStage::Broadcast,
                    TradeFailureReason::BroadcastFailed(e.to_string()),
                )
            })?;
        tracing::info!(stage = %TradeStage::Broadcast, signature = %signature, "Transaction sent");

        // CONFIRMED; the bound holds even if the gateway ignores it
        let confirm_timeout = self.config.confirm_timeout;
        tokio::time::timeout(
            confirm_timeout,
            self.chain.confirm_transaction(&signature, confirm_timeout),
        )
        .await
        .map_err(|_| {
            (
                TradeStage::Confirmed,
                TradeFailureReason::ConfirmationTimeout(confirm_timeout.as_secs()),
            )
        })?
        .map_err(|e| {
            let reason = match e {
                ChainError::ConfirmationTimeout(waited) => {
                    TradeFailureReason::ConfirmationTimeout(waited.as_secs())
                }
                other => TradeFailureReason::ConfirmationFailed(other.to_string()),
            };
            (TradeStage::Confirmed, reason)
        })?;

        let decimals = match request.direction {
            TradeDirection::Buy => self.output_decimals(&request.mint).await,
            TradeDirection::Sell => Some(SOL_DECIMALS),
        };

        Ok(TradeResult::success(signature, out_amount, decimals))
    }

    /// Current holding; zero is a typed failure before any quote
    async fn holding(&self, owner: &Pubkey, mint: &Pubkey) -> StepResult<u64> {
        let balance = self
            .within(TradeStage::QuoteRequested, self.chain.token_balance(owner, mint))
            .await?
            .map_err(|e| {
                (
                    TradeStage::QuoteRequested,
                    TradeFailureReason::BalanceLookupFailed(e.to_string()),
                )
            })?;

        if balance == 0 {
            return Err((TradeStage::QuoteRequested, TradeFailureReason::NoBalance));
        }
        Ok(balance)
    }

    async fn output_decimals(&self, mint: &Pubkey) -> Option<u8> {
        match tokio::time::timeout(self.config.step_timeout, self.chain.token_decimals(mint)).await {
            Ok(Ok(decimals)) => Some(decimals),
            Ok(Err(e)) => {
                tracing::debug!(mint = %mint, "Decimals lookup failed: {}", e);
                None
            }
            Err(_) => None,
        }
    }

    async fn within<T>(&self, stage: TradeStage, step: impl Future<Output = T>) -> StepResult<T> {
        tokio::time::timeout(self.config.step_timeout, step)
            .await
            .map_err(|_| {
                (
                    stage,
                    TradeFailureReason::StepTimedOut {
                        stage,
                        secs: self.config.step_timeout.as_secs(),
                    },
                )
            })
    }
}

/// Decode the router's base64 bincode transaction and sign it with the
/// request's authority
fn sign_payload(
    payload: &str,
    request: &TradeRequest<'_>,
) -> Result<VersionedTransaction, TradeFailureReason> {
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| TradeFailureReason::InvalidTransaction(format!("base64: {}", e)))?;

    let unsigned: VersionedTransaction = bincode::deserialize(&bytes)
        .map_err(|e| TradeFailureReason::InvalidTransaction(format!("bincode: {}", e)))?;

    let signers: [&dyn Signer; 1] = [request.authority];
    VersionedTransaction::try_new(unsigned.message, &signers[..])
        .map_err(|e| TradeFailureReason::SigningFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mocks::{FakeChain, RecordingSwapRouter};
    use solana_sdk::message::{Message, VersionedMessage};
    use solana_sdk::signature::{Keypair, Signature};
    use solana_sdk::signer::Signer;

    fn encoded_tx(payer: &Pubkey) -> String {
        let message = VersionedMessage::Legacy(Message::new(&[], Some(payer)));
        let tx = VersionedTransaction {
            signatures: vec![Signature::default()],
            message,
        };
        STANDARD.encode(bincode::serialize(&tx).unwrap())
    }

    #[test]
    fn test_sign_payload_produces_owner_signature() {
        let keypair = Keypair::new();
        let request = TradeRequest::buy(Pubkey::new_unique(), 1_000, 100, &keypair);

        let signed = sign_payload(&encoded_tx(&keypair.pubkey()), &request).unwrap();
        assert_eq!(signed.signatures.len(), 1);
        assert_ne!(signed.signatures[0], Signature::default());
        assert!(signed.verify_with_results().iter().all(|ok| *ok));
    }

    #[test]
    fn test_sign_payload_rejects_wrong_signer() {
        let payer = Keypair::new();
        let intruder = Keypair::new();
        let request = TradeRequest::buy(Pubkey::new_unique(), 1_000, 100, &intruder);

        let result = sign_payload(&encoded_tx(&payer.pubkey()), &request);
        assert!(matches!(result, Err(TradeFailureReason::SigningFailed(_))));
    }

    #[test]
    fn test_sign_payload_rejects_garbage() {
        let keypair = Keypair::new();
        let request = TradeRequest::buy(Pubkey::new_unique(), 1_000, 100, &keypair);

        let not_base64 = sign_payload("%%%", &request);
        assert!(matches!(not_base64, Err(TradeFailureReason::InvalidTransaction(_))));

        let not_tx = sign_payload(&STANDARD.encode([1u8, 2, 3]), &request);
        assert!(matches!(not_tx, Err(TradeFailureReason::InvalidTransaction(_))));
    }

    #[tokio::test]
    async fn test_sell_clamps_to_holding() {
        let keypair = Keypair::new();
        let mint = Pubkey::new_unique();
        let router = Arc::new(RecordingSwapRouter::new());
        let chain = Arc::new(FakeChain::new().with_token_balance(42));

        let engine = TradeEngine::new(router.clone(), chain, TradeEngineConfig::default());
        let result = engine.execute(&TradeRequest::sell_all(mint, 100, &keypair)).await;

        // Default router build response has no payload
        assert_eq!(result.failed_at, Some(TradeStage::SwapBuilt));
        let quotes = router.quote_calls();
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].amount, 42);
        assert_eq!(quotes[0].input_mint, mint);
        assert_eq!(quotes[0].output_mint, spl_token::native_mint::id());
    }
}

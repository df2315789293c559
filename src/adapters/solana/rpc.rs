use async_trait::async_trait;
use solana_client::rpc_client::RpcClient;
use solana_client::rpc_request::TokenAccountsFilter;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    pubkey::Pubkey,
    signature::Signature,
    transaction::VersionedTransaction,
};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::ports::chain::{ChainError, ChainGateway, TokenHolding};

/// Delay between signature status polls
const CONFIRM_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Wrapper around the blocking Solana RPC client with async methods
#[derive(Clone)]
pub struct SolanaClient {
    client: Arc<RpcClient>,
    commitment: CommitmentConfig,
}

impl SolanaClient {
    pub fn new(rpc_url: String, commitment: CommitmentConfig) -> Self {
        let client = Arc::new(RpcClient::new_with_commitment(rpc_url, commitment));
        Self { client, commitment }
    }

    pub fn url(&self) -> String {
        self.client.url()
    }

    /// Run a blocking RPC call on the blocking pool
    async fn blocking<T, F>(&self, call: F) -> Result<T, ChainError>
    where
        T: Send + 'static,
        F: FnOnce(&RpcClient) -> Result<T, ChainError> + Send + 'static,
    {
        let client = Arc::clone(&self.client);
        tokio::task::spawn_blocking(move || call(&client))
            .await
            .map_err(|e| ChainError::Join(e.to_string()))?
    }

    /// `Some(Ok(()))` once confirmed, `Some(Err)` if the transaction failed,
    /// `None` while still pending
    async fn poll_status(&self, signature: Signature) -> Result<Option<Result<(), ChainError>>, ChainError> {
        let commitment = self.commitment;
        self.blocking(move |client| {
            let response = client
                .get_signature_statuses(&[signature])
                .map_err(|e| ChainError::Rpc(e.to_string()))?;

            let Some(Some(status)) = response.value.into_iter().next() else {
                return Ok(None);
            };

            if let Some(err) = &status.err {
                return Ok(Some(Err(ChainError::TransactionFailed(err.to_string()))));
            }

            if status.satisfies_commitment(commitment) {
                Ok(Some(Ok(())))
            } else {
                Ok(None)
            }
        })
        .await
    }
}

/// Read `(mint, amount, decimals)` from a jsonParsed SPL token account
fn parse_token_account(data: &serde_json::Value) -> Result<(Pubkey, u64, u8), ChainError> {
    let info = &data["parsed"]["info"];
    let mint = info["mint"]
        .as_str()
        .ok_or_else(|| ChainError::AccountData("missing mint".to_string()))
        .and_then(|m| Pubkey::from_str(m).map_err(|e| ChainError::AccountData(e.to_string())))?;

    let amount = info["tokenAmount"]["amount"]
        .as_str()
        .ok_or_else(|| ChainError::AccountData("missing tokenAmount.amount".to_string()))?
        .parse::<u64>()
        .map_err(|e| ChainError::AccountData(format!("Parse error: {}", e)))?;

    let decimals = info["tokenAmount"]["decimals"]
        .as_u64()
        .and_then(|d| u8::try_from(d).ok())
        .ok_or_else(|| ChainError::AccountData("missing tokenAmount.decimals".to_string()))?;

    Ok((mint, amount, decimals))
}

fn token_accounts(
    client: &RpcClient,
    owner: &Pubkey,
    filter: TokenAccountsFilter,
) -> Result<Vec<(Pubkey, u64, u8)>, ChainError> {
    let accounts = client
        .get_token_accounts_by_owner(owner, filter)
        .map_err(|e| ChainError::Rpc(e.to_string()))?;

    accounts
        .iter()
        .map(|keyed| {
            let data = serde_json::to_value(&keyed.account.data)
                .map_err(|e| ChainError::AccountData(e.to_string()))?;
            parse_token_account(&data)
        })
        .collect()
}

#[async_trait]
impl ChainGateway for SolanaClient {
    async fn token_balance(&self, owner: &Pubkey, mint: &Pubkey) -> Result<u64, ChainError> {
        let (owner, mint) = (*owner, *mint);
        self.blocking(move |client| {
            let accounts = token_accounts(client, &owner, TokenAccountsFilter::Mint(mint))?;
            Ok(accounts.iter().map(|(_, amount, _)| *amount).sum())
        })
        .await
    }

    async fn sol_balance(&self, owner: &Pubkey) -> Result<u64, ChainError> {
        let owner = *owner;
        self.blocking(move |client| {
            client
                .get_balance(&owner)
                .map_err(|e| ChainError::Rpc(e.to_string()))
        })
        .await
    }

    async fn token_holdings(&self, owner: &Pubkey) -> Result<Vec<TokenHolding>, ChainError> {
        let owner = *owner;
        self.blocking(move |client| {
            let accounts =
                token_accounts(client, &owner, TokenAccountsFilter::ProgramId(spl_token::id()))?;
            Ok(accounts
                .into_iter()
                .filter(|(_, amount, _)| *amount > 0)
                .map(|(mint, amount, decimals)| TokenHolding {
                    mint,
                    amount,
                    decimals,
                })
                .collect())
        })
        .await
    }

    async fn token_decimals(&self, mint: &Pubkey) -> Result<u8, ChainError> {
        let mint = *mint;
        self.blocking(move |client| {
            client
                .get_token_supply(&mint)
                .map(|supply| supply.decimals)
                .map_err(|e| ChainError::Rpc(e.to_string()))
        })
        .await
    }

    async fn send_transaction(&self, tx: &VersionedTransaction) -> Result<Signature, ChainError> {
        let tx = tx.clone();
        self.blocking(move |client| {
            client
                .send_transaction(&tx)
                .map_err(|e| ChainError::Rpc(e.to_string()))
        })
        .await
    }

    async fn confirm_transaction(
        &self,
        signature: &Signature,
        timeout: Duration,
    ) -> Result<(), ChainError> {
        let signature = *signature;
        let polling = async {
            loop {
                match self.poll_status(signature).await {
                    Ok(Some(result)) => return result,
                    Ok(None) => {}
                    Err(e) => tracing::debug!("Status poll failed for {}: {}", signature, e),
                }
                tokio::time::sleep(CONFIRM_POLL_INTERVAL).await;
            }
        };

        tokio::time::timeout(timeout, polling)
            .await
            .map_err(|_| ChainError::ConfirmationTimeout(timeout))?
    }
}

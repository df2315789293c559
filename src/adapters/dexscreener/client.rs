//! DexScreener Client
//!
//! Two uses of `GET /latest/dex/tokens/{query}`:
//! - as a discovery source over a fixed query (default `solana`)
//! - as a per-mint pair lookup, where the first pair is authoritative

use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashSet;
use std::time::Duration;

use super::types::{DexPair, TokenPairsResponse};
use crate::domain::{PairSnapshot, SourceTag, TokenCandidate, WSOL_MINT};
use crate::ports::market_data::{PairLookup, SourceError, TokenSource};

pub const DEFAULT_DEXSCREENER_URL: &str = "https://api.dexscreener.com";

#[derive(Debug, Clone)]
pub struct DexScreenerConfig {
    pub api_base_url: String,
    /// Path segment queried by the discovery source
    pub query: String,
    pub timeout: Duration,
}

impl Default for DexScreenerConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_DEXSCREENER_URL.to_string(),
            query: "solana".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DexScreenerClient {
    config: DexScreenerConfig,
    http: Client,
}

impl DexScreenerClient {
    pub fn new(config: DexScreenerConfig) -> Result<Self, SourceError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SourceError::Http(e.to_string()))?;
        Ok(Self { config, http })
    }

    /// All pairs listed for `query` (a mint or a chain id)
    pub async fn token_pairs(&self, query: &str) -> Result<Vec<DexPair>, SourceError> {
        let url = format!(
            "{}/latest/dex/tokens/{}",
            self.config.api_base_url.trim_end_matches('/'),
            query
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TokenPairsResponse = response
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))?;

        Ok(parsed.pairs.unwrap_or_default())
    }
}

/// Candidates from a pair list: wrapped SOL skipped, one entry per base token
pub fn candidates_from_pairs(pairs: &[DexPair]) -> Vec<TokenCandidate> {
    let mut seen = HashSet::new();
    pairs
        .iter()
        .filter(|pair| pair.base_address().is_some_and(|a| a != WSOL_MINT))
        .filter_map(DexPair::to_candidate)
        .filter(|candidate| seen.insert(candidate.mint.clone()))
        .collect()
}

#[async_trait]
impl TokenSource for DexScreenerClient {
    fn tag(&self) -> SourceTag {
        SourceTag::DexScreener
    }

    async fn fetch_candidates(&self) -> Result<Vec<TokenCandidate>, SourceError> {
        let pairs = self.token_pairs(&self.config.query).await?;
        Ok(candidates_from_pairs(&pairs))
    }
}

#[async_trait]
impl PairLookup for DexScreenerClient {
    async fn lookup_pair(&self, mint: &str) -> Result<Option<PairSnapshot>, SourceError> {
        let pairs = self.token_pairs(mint).await?;
        Ok(pairs.first().map(DexPair::snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::dexscreener::types::BaseToken;

    fn pair(address: &str, symbol: &str) -> DexPair {
        DexPair {
            base_token: Some(BaseToken {
                address: address.to_string(),
                name: Some(format!("{} token", symbol)),
                symbol: Some(symbol.to_string()),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_skips_wsol_and_duplicates() {
        let pairs = vec![
            pair(WSOL_MINT, "SOL"),
            pair("MintA", "A"),
            pair("MintB", "B"),
            pair("MintA", "A"),
        ];

        let candidates = candidates_from_pairs(&pairs);
        let mints: Vec<_> = candidates.iter().map(|c| c.mint.as_str()).collect();
        assert_eq!(mints, vec!["MintA", "MintB"]);
    }

    #[test]
    fn test_default_config() {
        let config = DexScreenerConfig::default();
        assert_eq!(config.query, "solana");
        assert_eq!(config.api_base_url, "https://api.dexscreener.com");
    }
}

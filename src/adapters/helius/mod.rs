//! Helius DAS `searchAssets` discovery source
//!
//! Asks the indexer for the most recently created fungible assets. The API
//! key travels in the query string; without one the source reports
//! `MissingApiKey` and the pipeline skips it.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::domain::{SourceTag, TokenCandidate, WSOL_MINT};
use crate::ports::market_data::{SourceError, TokenSource};

pub const DEFAULT_HELIUS_URL: &str = "https://mainnet.helius-rpc.com";

#[derive(Debug, Clone)]
pub struct HeliusConfig {
    pub rpc_url: String,
    pub api_key: Option<String>,
    pub limit: u32,
    pub timeout: Duration,
}

impl Default for HeliusConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_HELIUS_URL.to_string(),
            api_key: None,
            limit: 5,
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<SearchResult>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResult {
    #[serde(default)]
    items: Vec<Asset>,
}

#[derive(Debug, Deserialize)]
struct Asset {
    #[serde(default)]
    id: String,
    #[serde(default)]
    content: Option<AssetContent>,
}

#[derive(Debug, Deserialize)]
struct AssetContent {
    #[serde(default)]
    metadata: Option<AssetMetadata>,
}

#[derive(Debug, Deserialize)]
struct AssetMetadata {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    symbol: Option<String>,
}

/// Parse a `searchAssets` response body
pub fn parse_search_assets(body: &str) -> Result<Vec<TokenCandidate>, SourceError> {
    let envelope: RpcEnvelope =
        serde_json::from_str(body).map_err(|e| SourceError::Parse(e.to_string()))?;

    if let Some(err) = envelope.error {
        return Err(SourceError::Parse(format!("RPC error {}: {}", err.code, err.message)));
    }

    let items = envelope.result.unwrap_or_default().items;
    Ok(items
        .into_iter()
        .filter(|asset| !asset.id.is_empty() && asset.id != WSOL_MINT)
        .map(|asset| {
            let metadata = asset.content.and_then(|c| c.metadata);
            let (name, symbol) = metadata
                .map(|m| (m.name.unwrap_or_default(), m.symbol.unwrap_or_default()))
                .unwrap_or_default();
            TokenCandidate::new(asset.id, name, symbol, SourceTag::Helius)
        })
        .collect())
}

#[derive(Debug, Clone)]
pub struct HeliusSource {
    config: HeliusConfig,
    http: Client,
}

impl HeliusSource {
    pub fn new(config: HeliusConfig) -> Result<Self, SourceError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SourceError::Http(e.to_string()))?;
        Ok(Self { config, http })
    }

    fn request_body(&self) -> serde_json::Value {
        json!({
            "jsonrpc": "2.0",
            "id": "search-assets",
            "method": "searchAssets",
            "params": {
                "tokenType": "fungible",
                "limit": self.config.limit,
                "page": 1,
                "sortBy": { "sortBy": "created", "sortDirection": "desc" }
            }
        })
    }
}

#[async_trait]
impl TokenSource for HeliusSource {
    fn tag(&self) -> SourceTag {
        SourceTag::Helius
    }

    async fn fetch_candidates(&self) -> Result<Vec<TokenCandidate>, SourceError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(SourceError::MissingApiKey("helius"))?;

        let url = format!("{}/?api-key={}", self.config.rpc_url.trim_end_matches('/'), api_key);

        let response = self
            .http
            .post(&url)
            .json(&self.request_body())
            .send()
            .await
            .map_err(|e| SourceError::Http(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Http(e.without_url().to_string()))?;

        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_search_assets(&body)
    }
}

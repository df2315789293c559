//! Jupiter "recent tokens" discovery feed
//!
//! `GET {url}` returns the newest tokens first, either as a bare array or
//! wrapped as `{ "tokens": [...] }`. Entries that fail to parse are skipped
//! individually so one odd record never empties the whole feed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::domain::{SourceTag, TokenAudit, TokenCandidate, TradingStats};
use crate::ports::market_data::{SourceError, TokenSource};

pub const DEFAULT_RECENT_URL: &str = "https://lite-api.jup.ag/tokens/v2/recent";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecentPayload {
    List(Vec<serde_json::Value>),
    Wrapped { tokens: Vec<serde_json::Value> },
}

impl RecentPayload {
    fn into_entries(self) -> Vec<serde_json::Value> {
        match self {
            RecentPayload::List(entries) => entries,
            RecentPayload::Wrapped { tokens } => tokens,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentToken {
    #[serde(default, alias = "mint")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub usd_price: Option<f64>,
    #[serde(default)]
    pub mcap: Option<f64>,
    #[serde(default)]
    pub liquidity: Option<f64>,
    #[serde(default)]
    pub holder_count: Option<u64>,
    #[serde(default)]
    pub audit: Option<RecentAudit>,
    #[serde(default)]
    pub stats5m: Option<RecentStats>,
    #[serde(default)]
    pub stats24h: Option<RecentStats>,
    #[serde(default)]
    pub first_pool: Option<FirstPool>,
    #[serde(default)]
    pub launchpad: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentAudit {
    #[serde(default)]
    pub mint_authority_disabled: Option<bool>,
    #[serde(default)]
    pub freeze_authority_disabled: Option<bool>,
    #[serde(default)]
    pub is_sus: Option<bool>,
    #[serde(default)]
    pub dev_balance_percentage: Option<f64>,
    #[serde(default)]
    pub top_holders_percentage: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentStats {
    #[serde(default)]
    pub price_change: Option<f64>,
    #[serde(default)]
    pub buy_volume: Option<f64>,
    #[serde(default)]
    pub sell_volume: Option<f64>,
    #[serde(default)]
    pub num_buys: Option<u64>,
    #[serde(default)]
    pub num_sells: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirstPool {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl RecentToken {
    /// Normalize into the canonical record. `None` when the mint is missing.
    pub fn into_candidate(self) -> Option<TokenCandidate> {
        let mint = self.id.filter(|id| !id.trim().is_empty())?;
        let audit = self.audit.unwrap_or_default();
        let stats = self.stats5m.unwrap_or_default();
        let volume_24h = self
            .stats24h
            .map(|s| s.buy_volume.unwrap_or(0.0) + s.sell_volume.unwrap_or(0.0))
            .unwrap_or(0.0);

        let mut candidate = TokenCandidate::new(
            mint,
            self.name.unwrap_or_default(),
            self.symbol.unwrap_or_default(),
            SourceTag::JupiterRecent,
        );
        candidate.created_at = self
            .first_pool
            .and_then(|p| p.created_at)
            .and_then(|ts| parse_timestamp(&ts));
        candidate.price_usd = self.usd_price.unwrap_or(0.0);
        candidate.market_cap_usd = self.mcap.unwrap_or(0.0);
        candidate.liquidity_usd = self.liquidity.unwrap_or(0.0);
        candidate.volume_24h_usd = volume_24h;
        candidate.holder_count = self.holder_count.unwrap_or(0);
        candidate.audit = TokenAudit {
            mint_authority_disabled: audit.mint_authority_disabled.unwrap_or(false),
            freeze_authority_disabled: audit.freeze_authority_disabled.unwrap_or(false),
            is_suspicious: audit.is_sus.unwrap_or(false),
            dev_balance_percent: audit.dev_balance_percentage.unwrap_or(0.0),
            top_holders_percent: audit.top_holders_percentage.unwrap_or(0.0),
        };
        candidate.stats_5m = TradingStats {
            buy_volume: stats.buy_volume.unwrap_or(0.0),
            num_buys: stats.num_buys.unwrap_or(0),
            num_sells: stats.num_sells.unwrap_or(0),
            price_change_percent: stats.price_change.unwrap_or(0.0),
        };
        candidate.launchpad = self.launchpad;

        Some(candidate)
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse a feed body into candidates, in feed order
pub fn parse_recent_tokens(body: &str) -> Result<Vec<TokenCandidate>, SourceError> {
    let payload: RecentPayload =
        serde_json::from_str(body).map_err(|e| SourceError::Parse(e.to_string()))?;

    let candidates = payload
        .into_entries()
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<RecentToken>(entry) {
            Ok(token) => token.into_candidate(),
            Err(e) => {
                tracing::debug!("Skipping malformed recent token: {}", e);
                None
            }
        })
        .collect();

    Ok(candidates)
}

/// Jupiter recent-tokens source
#[derive(Debug, Clone)]
pub struct JupiterRecentSource {
    url: String,
    http: Client,
}

impl JupiterRecentSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Http(e.to_string()))?;
        Ok(Self {
            url: url.into(),
            http,
        })
    }
}

#[async_trait]
impl TokenSource for JupiterRecentSource {
    fn tag(&self) -> SourceTag {
        SourceTag::JupiterRecent
    }

    async fn fetch_candidates(&self) -> Result<Vec<TokenCandidate>, SourceError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_recent_tokens(&body)
    }
}

//! Canonical token record
//!
//! Every discovery source normalizes its payload into a [`TokenCandidate`]
//! before anything else in the crate sees it. Numeric fields default to zero
//! when the upstream feed omits them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mint address of wrapped SOL
pub const WSOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// Which adapter produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceTag {
    JupiterRecent,
    DexScreener,
    Helius,
}

impl SourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::JupiterRecent => "jupiter-recent",
            SourceTag::DexScreener => "dexscreener",
            SourceTag::Helius => "helius",
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// On-chain audit facts reported by the feed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenAudit {
    pub mint_authority_disabled: bool,
    pub freeze_authority_disabled: bool,
    pub is_suspicious: bool,
    /// Share of supply held by the deployer, in percent
    pub dev_balance_percent: f64,
    /// Share of supply held by the top holders, in percent
    pub top_holders_percent: f64,
}

/// Five-minute trading window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradingStats {
    /// Buy volume in USD
    pub buy_volume: f64,
    pub num_buys: u64,
    pub num_sells: u64,
    pub price_change_percent: f64,
}

/// Display-oriented pair snapshot used to fill gaps in a candidate
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairSnapshot {
    pub price_usd: f64,
    pub market_cap_usd: f64,
    pub liquidity_usd: f64,
    pub volume_24h_usd: f64,
}

/// Normalized token record shared by every source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenCandidate {
    pub mint: String,
    pub name: String,
    pub symbol: String,
    pub created_at: Option<DateTime<Utc>>,
    pub price_usd: f64,
    pub liquidity_usd: f64,
    pub market_cap_usd: f64,
    pub volume_24h_usd: f64,
    pub holder_count: u64,
    pub audit: TokenAudit,
    pub stats_5m: TradingStats,
    pub launchpad: Option<String>,
    pub source: SourceTag,
}

impl TokenCandidate {
    /// Create a candidate with every metric at its zero default
    pub fn new(
        mint: impl Into<String>,
        name: impl Into<String>,
        symbol: impl Into<String>,
        source: SourceTag,
    ) -> Self {
        Self {
            mint: mint.into(),
            name: name.into(),
            symbol: symbol.into(),
            created_at: None,
            price_usd: 0.0,
            liquidity_usd: 0.0,
            market_cap_usd: 0.0,
            volume_24h_usd: 0.0,
            holder_count: 0,
            audit: TokenAudit::default(),
            stats_5m: TradingStats::default(),
            launchpad: None,
            source,
        }
    }

    pub fn with_audit(mut self, audit: TokenAudit) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_stats(mut self, stats: TradingStats) -> Self {
        self.stats_5m = stats;
        self
    }

    pub fn with_holders(mut self, holder_count: u64) -> Self {
        self.holder_count = holder_count;
        self
    }

    pub fn with_liquidity(mut self, liquidity_usd: f64) -> Self {
        self.liquidity_usd = liquidity_usd;
        self
    }

    /// True when mint, name and symbol are all present
    pub fn is_complete(&self) -> bool {
        !self.mint.trim().is_empty()
            && !self.name.trim().is_empty()
            && !self.symbol.trim().is_empty()
    }

    /// Fill zero-valued display fields from a pair snapshot.
    ///
    /// Values already reported by the discovery feed are kept.
    pub fn enrich_from_pair(&mut self, pair: &PairSnapshot) {
        fill_if_zero(&mut self.price_usd, pair.price_usd);
        fill_if_zero(&mut self.market_cap_usd, pair.market_cap_usd);
        fill_if_zero(&mut self.liquidity_usd, pair.liquidity_usd);
        fill_if_zero(&mut self.volume_24h_usd, pair.volume_24h_usd);
    }
}

fn fill_if_zero(slot: &mut f64, value: f64) {
    if *slot == 0.0 && value.is_finite() {
        *slot = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_candidate_defaults_to_zero() {
        let token = TokenCandidate::new("Mint111", "Test", "TST", SourceTag::Helius);
        assert_eq!(token.holder_count, 0);
        assert_eq!(token.liquidity_usd, 0.0);
        assert!(!token.audit.mint_authority_disabled);
        assert!(token.created_at.is_none());
        assert!(token.is_complete());
    }

    #[test]
    fn test_incomplete_when_symbol_blank() {
        let token = TokenCandidate::new("Mint111", "Test", "  ", SourceTag::DexScreener);
        assert!(!token.is_complete());
    }

    #[test]
    fn test_enrich_only_fills_gaps() {
        let mut token = TokenCandidate::new("Mint111", "Test", "TST", SourceTag::JupiterRecent)
            .with_liquidity(5_000.0);
        let pair = PairSnapshot {
            price_usd: 0.0012,
            market_cap_usd: 120_000.0,
            liquidity_usd: 9_999.0,
            volume_24h_usd: 42.0,
        };

        token.enrich_from_pair(&pair);

        assert_eq!(token.liquidity_usd, 5_000.0);
        assert_eq!(token.price_usd, 0.0012);
        assert_eq!(token.market_cap_usd, 120_000.0);
        assert_eq!(token.volume_24h_usd, 42.0);
    }

    #[test]
    fn test_source_tag_display() {
        assert_eq!(SourceTag::JupiterRecent.to_string(), "jupiter-recent");
        assert_eq!(SourceTag::Helius.to_string(), "helius");
    }
}

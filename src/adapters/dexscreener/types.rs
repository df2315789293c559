//! DexScreener wire types

use serde::{Deserialize, Serialize};

use crate::domain::{PairSnapshot, SourceTag, TokenCandidate, TradingStats};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TxnCount {
    #[serde(default)]
    pub buys: u64,
    #[serde(default)]
    pub sells: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Txns {
    pub m5: Option<TxnCount>,
    pub h24: Option<TxnCount>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Liquidity {
    pub usd: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Volume {
    pub m5: Option<f64>,
    pub h24: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceChange {
    pub m5: Option<f64>,
    pub h24: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BaseToken {
    #[serde(default)]
    pub address: String,
    pub name: Option<String>,
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DexPair {
    #[serde(default)]
    pub chain_id: Option<String>,
    #[serde(default)]
    pub dex_id: Option<String>,
    #[serde(default)]
    pub pair_address: Option<String>,
    #[serde(default)]
    pub base_token: Option<BaseToken>,
    /// DexScreener sends prices as strings
    #[serde(default)]
    pub price_usd: Option<String>,
    #[serde(default)]
    pub price_change: Option<PriceChange>,
    #[serde(default)]
    pub txns: Option<Txns>,
    #[serde(default)]
    pub volume: Option<Volume>,
    #[serde(default)]
    pub liquidity: Option<Liquidity>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub fdv: Option<f64>,
    /// Milliseconds since epoch
    #[serde(default)]
    pub pair_created_at: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenPairsResponse {
    #[serde(default)]
    pub pairs: Option<Vec<DexPair>>,
}

impl DexPair {
    pub fn base_address(&self) -> Option<&str> {
        self.base_token
            .as_ref()
            .map(|t| t.address.as_str())
            .filter(|a| !a.is_empty())
    }

    pub fn snapshot(&self) -> PairSnapshot {
        PairSnapshot {
            price_usd: self
                .price_usd
                .as_deref()
                .and_then(|p| p.parse().ok())
                .unwrap_or(0.0),
            market_cap_usd: self.market_cap.or(self.fdv).unwrap_or(0.0),
            liquidity_usd: self.liquidity.as_ref().and_then(|l| l.usd).unwrap_or(0.0),
            volume_24h_usd: self.volume.as_ref().and_then(|v| v.h24).unwrap_or(0.0),
        }
    }

    /// Normalize into a candidate. Audit data is unknown here and stays at
    /// its defaults.
    pub fn to_candidate(&self) -> Option<TokenCandidate> {
        let base = self.base_token.as_ref()?;
        if base.address.trim().is_empty() {
            return None;
        }

        let mut candidate = TokenCandidate::new(
            base.address.clone(),
            base.name.clone().unwrap_or_default(),
            base.symbol.clone().unwrap_or_default(),
            SourceTag::DexScreener,
        );

        let snapshot = self.snapshot();
        candidate.price_usd = snapshot.price_usd;
        candidate.market_cap_usd = snapshot.market_cap_usd;
        candidate.liquidity_usd = snapshot.liquidity_usd;
        candidate.volume_24h_usd = snapshot.volume_24h_usd;

        let m5 = self.txns.as_ref().and_then(|t| t.m5.clone()).unwrap_or_default();
        candidate.stats_5m = TradingStats {
            // DexScreener only reports total 5m volume
            buy_volume: self.volume.as_ref().and_then(|v| v.m5).unwrap_or(0.0),
            num_buys: m5.buys,
            num_sells: m5.sells,
            price_change_percent: self
                .price_change
                .as_ref()
                .and_then(|p| p.m5)
                .unwrap_or(0.0),
        };
        candidate.created_at = self
            .pair_created_at
            .and_then(chrono::DateTime::from_timestamp_millis);
        candidate.launchpad = self.dex_id.clone();

        Some(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const PAIRS: &str = r#"{
        "schemaVersion": "1.0.0",
        "pairs": [
            {
                "chainId": "solana",
                "dexId": "raydium",
                "pairAddress": "PairA",
                "baseToken": {"address": "MintA", "name": "Alpha", "symbol": "ALP"},
                "priceUsd": "0.000412",
                "priceChange": {"m5": 4.5, "h24": -10.0},
                "txns": {"m5": {"buys": 7, "sells": 2}},
                "volume": {"m5": 150.5, "h24": 8000.0},
                "liquidity": {"usd": 2500.0},
                "marketCap": 41200.0,
                "pairCreatedAt": 1735689600000
            },
            {
                "chainId": "solana",
                "dexId": "orca",
                "baseToken": {"address": "MintA", "name": "Alpha", "symbol": "ALP"},
                "priceUsd": "0.0005"
            }
        ]
    }"#;

    #[test]
    fn test_snapshot_from_first_pair() {
        let response: TokenPairsResponse = serde_json::from_str(PAIRS).unwrap();
        let pairs = response.pairs.unwrap();
        let snap = pairs[0].snapshot();

        assert_relative_eq!(snap.price_usd, 0.000412);
        assert_relative_eq!(snap.market_cap_usd, 41200.0);
        assert_relative_eq!(snap.liquidity_usd, 2500.0);
        assert_relative_eq!(snap.volume_24h_usd, 8000.0);
    }

    #[test]
    fn test_pair_to_candidate() {
        let response: TokenPairsResponse = serde_json::from_str(PAIRS).unwrap();
        let candidate = response.pairs.unwrap()[0].to_candidate().unwrap();

        assert_eq!(candidate.mint, "MintA");
        assert_eq!(candidate.symbol, "ALP");
        assert_eq!(candidate.stats_5m.num_buys, 7);
        assert_relative_eq!(candidate.stats_5m.buy_volume, 150.5);
        assert_eq!(candidate.source, SourceTag::DexScreener);
        assert_eq!(candidate.launchpad.as_deref(), Some("raydium"));
        assert!(candidate.created_at.is_some());
    }

    #[test]
    fn test_null_pairs() {
        let response: TokenPairsResponse =
            serde_json::from_str(r#"{"schemaVersion": "1.0.0", "pairs": null}"#).unwrap();
        assert!(response.pairs.is_none());
    }

    #[test]
    fn test_pair_without_base_token_is_skipped() {
        let pair = DexPair::default();
        assert!(pair.to_candidate().is_none());
    }
}

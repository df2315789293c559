//! Risk Scoring
//!
//! Deterministic weighted-signal model that turns a [`TokenCandidate`] into a
//! 0-100 score and a risk tier. Higher scores mean fewer red flags.
//!
//! Holder count and developer allocation are banded: at most one band of
//! each applies. Every other signal is independently additive.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::token::TokenCandidate;

/// Upper bound of the score
pub const MAX_SCORE: u8 = 100;

/// Liquidity (USD) above which the liquidity signal fires
pub const LIQUIDITY_THRESHOLD_USD: f64 = 1_000.0;

/// Five-minute buy volume (USD) above which trading counts as active
pub const ACTIVE_BUY_VOLUME_USD: f64 = 100.0;

/// A scoring signal that contributed points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    MintAuthorityDisabled,
    FreezeAuthorityDisabled,
    NotSuspicious,
    Liquidity,
    ActiveTrading,
    /// 10 to 50 holders inclusive
    HealthyHolderCount,
    /// More than 50 holders
    ManyHolders,
    /// Developer holds under 5%
    LowDevAllocation,
    /// Developer holds 5% up to (not including) 10%
    ModerateDevAllocation,
    PriceTrendingUp,
    MoreBuysThanSells,
}

impl Signal {
    pub fn points(&self) -> u8 {
        match self {
            Signal::MintAuthorityDisabled => 10,
            Signal::FreezeAuthorityDisabled => 10,
            Signal::NotSuspicious => 10,
            Signal::Liquidity => 15,
            Signal::ActiveTrading => 10,
            Signal::HealthyHolderCount => 20,
            Signal::ManyHolders => 10,
            Signal::LowDevAllocation => 15,
            Signal::ModerateDevAllocation => 8,
            Signal::PriceTrendingUp => 5,
            Signal::MoreBuysThanSells => 5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Signal::MintAuthorityDisabled => "Mint authority disabled",
            Signal::FreezeAuthorityDisabled => "Freeze authority disabled",
            Signal::NotSuspicious => "Not flagged suspicious",
            Signal::Liquidity => "Liquidity",
            Signal::ActiveTrading => "Active trading",
            Signal::HealthyHolderCount => "Healthy holder count",
            Signal::ManyHolders => "Many holders",
            Signal::LowDevAllocation => "Low dev allocation",
            Signal::ModerateDevAllocation => "Moderate dev allocation",
            Signal::PriceTrendingUp => "Price trending up",
            Signal::MoreBuysThanSells => "More buys than sells",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Risk tier derived from the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskTier {
    pub fn from_score(score: u8) -> Self {
        match score {
            70..=u8::MAX => RiskTier::Low,
            50..=69 => RiskTier::Medium,
            30..=49 => RiskTier::High,
            _ => RiskTier::VeryHigh,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "LOW",
            RiskTier::Medium => "MEDIUM",
            RiskTier::High => "HIGH",
            RiskTier::VeryHigh => "VERY HIGH",
        }
    }

    /// Emoji used in notifications
    pub fn marker(&self) -> &'static str {
        match self {
            RiskTier::Low => "🟢",
            RiskTier::Medium => "🟡",
            RiskTier::High => "🟠",
            RiskTier::VeryHigh => "🔴",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of scoring a candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: u8,
    pub tier: RiskTier,
    /// Triggered signals in table order
    pub reasons: Vec<Signal>,
}

impl ScoreResult {
    /// Comma-separated reason labels, or "no positive signals"
    pub fn reason_text(&self) -> String {
        if self.reasons.is_empty() {
            return "no positive signals".to_string();
        }
        self.reasons
            .iter()
            .map(Signal::label)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A candidate paired with its score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredToken {
    pub token: TokenCandidate,
    pub result: ScoreResult,
}

impl ScoredToken {
    pub fn new(token: TokenCandidate) -> Self {
        let result = score(&token);
        Self { token, result }
    }
}

/// Score a candidate. Total, pure and bounded to `0..=100`.
pub fn score(token: &TokenCandidate) -> ScoreResult {
    let mut reasons = Vec::new();

    if token.audit.mint_authority_disabled {
        reasons.push(Signal::MintAuthorityDisabled);
    }
    if token.audit.freeze_authority_disabled {
        reasons.push(Signal::FreezeAuthorityDisabled);
    }
    if !token.audit.is_suspicious {
        reasons.push(Signal::NotSuspicious);
    }
    if token.liquidity_usd > LIQUIDITY_THRESHOLD_USD {
        reasons.push(Signal::Liquidity);
    }
    if token.stats_5m.buy_volume > ACTIVE_BUY_VOLUME_USD {
        reasons.push(Signal::ActiveTrading);
    }

    if (10..=50).contains(&token.holder_count) {
        reasons.push(Signal::HealthyHolderCount);
    } else if token.holder_count > 50 {
        reasons.push(Signal::ManyHolders);
    }

    // NaN falls through both bands
    let dev = token.audit.dev_balance_percent;
    if dev < 5.0 {
        reasons.push(Signal::LowDevAllocation);
    } else if dev < 10.0 {
        reasons.push(Signal::ModerateDevAllocation);
    }

    if token.stats_5m.price_change_percent > 0.0 {
        reasons.push(Signal::PriceTrendingUp);
    }
    if token.stats_5m.num_buys > token.stats_5m.num_sells {
        reasons.push(Signal::MoreBuysThanSells);
    }

    let total: u32 = reasons.iter().map(|s| u32::from(s.points())).sum();
    let score = total.min(u32::from(MAX_SCORE)) as u8;

    ScoreResult {
        score,
        tier: RiskTier::from_score(score),
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::token::{SourceTag, TokenAudit, TradingStats};

    fn best_case() -> TokenCandidate {
        TokenCandidate::new("MintA", "Alpha", "ALP", SourceTag::JupiterRecent)
            .with_audit(TokenAudit {
                mint_authority_disabled: true,
                freeze_authority_disabled: true,
                is_suspicious: false,
                dev_balance_percent: 2.0,
                top_holders_percent: 20.0,
            })
            .with_liquidity(5_000.0)
            .with_holders(30)
            .with_stats(TradingStats {
                buy_volume: 500.0,
                num_buys: 20,
                num_sells: 5,
                price_change_percent: 12.0,
            })
    }

    fn worst_case() -> TokenCandidate {
        TokenCandidate::new("MintB", "Bravo", "BRV", SourceTag::JupiterRecent)
            .with_audit(TokenAudit {
                mint_authority_disabled: false,
                freeze_authority_disabled: false,
                is_suspicious: true,
                dev_balance_percent: 40.0,
                top_holders_percent: 90.0,
            })
            .with_liquidity(10.0)
            .with_holders(3)
            .with_stats(TradingStats {
                buy_volume: 0.0,
                num_buys: 0,
                num_sells: 4,
                price_change_percent: -30.0,
            })
    }

    #[test]
    fn test_best_case_scores_full_marks() {
        let result = score(&best_case());
        assert_eq!(result.score, 100);
        assert_eq!(result.tier, RiskTier::Low);
        assert_eq!(
            result.reasons,
            vec![
                Signal::MintAuthorityDisabled,
                Signal::FreezeAuthorityDisabled,
                Signal::NotSuspicious,
                Signal::Liquidity,
                Signal::ActiveTrading,
                Signal::HealthyHolderCount,
                Signal::LowDevAllocation,
                Signal::PriceTrendingUp,
                Signal::MoreBuysThanSells,
            ]
        );
    }

    #[test]
    fn test_worst_case_scores_zero() {
        let result = score(&worst_case());
        assert_eq!(result.score, 0);
        assert_eq!(result.tier, RiskTier::VeryHigh);
        assert!(result.reasons.is_empty());
        assert_eq!(result.reason_text(), "no positive signals");
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let token = best_case().with_holders(77);
        assert_eq!(score(&token), score(&token));
    }

    #[test]
    fn test_holder_bands_are_exclusive() {
        for holders in [0u64, 9, 10, 50, 51, 10_000] {
            let result = score(&worst_case().with_holders(holders));
            let bands = result
                .reasons
                .iter()
                .filter(|s| matches!(s, Signal::HealthyHolderCount | Signal::ManyHolders))
                .count();
            assert!(bands <= 1, "holders={holders}");
        }

        assert_eq!(score(&worst_case().with_holders(10)).score, 20);
        assert_eq!(score(&worst_case().with_holders(50)).score, 20);
        assert_eq!(score(&worst_case().with_holders(51)).score, 10);
        assert_eq!(score(&worst_case().with_holders(9)).score, 0);
    }

    #[test]
    fn test_dev_allocation_bands() {
        let with_dev = |pct: f64| {
            let mut token = worst_case();
            token.audit.dev_balance_percent = pct;
            score(&token)
        };

        assert_eq!(with_dev(4.99).reasons, vec![Signal::LowDevAllocation]);
        assert_eq!(with_dev(5.0).reasons, vec![Signal::ModerateDevAllocation]);
        assert_eq!(with_dev(9.99).score, 8);
        assert!(with_dev(10.0).reasons.is_empty());
    }

    #[test]
    fn test_thresholds_are_strict() {
        let mut token = worst_case();
        token.liquidity_usd = 1_000.0;
        token.stats_5m.buy_volume = 100.0;
        assert_eq!(score(&token).score, 0);

        token.liquidity_usd = 1_000.01;
        token.stats_5m.buy_volume = 100.01;
        assert_eq!(score(&token).score, 25);
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(RiskTier::from_score(100), RiskTier::Low);
        assert_eq!(RiskTier::from_score(70), RiskTier::Low);
        assert_eq!(RiskTier::from_score(69), RiskTier::Medium);
        assert_eq!(RiskTier::from_score(50), RiskTier::Medium);
        assert_eq!(RiskTier::from_score(49), RiskTier::High);
        assert_eq!(RiskTier::from_score(30), RiskTier::High);
        assert_eq!(RiskTier::from_score(29), RiskTier::VeryHigh);
        assert_eq!(RiskTier::from_score(0), RiskTier::VeryHigh);
    }

    #[test]
    fn test_reason_text_joins_labels() {
        let mut token = worst_case();
        token.audit.mint_authority_disabled = true;
        token.stats_5m.num_buys = 10;
        let result = score(&token);
        assert_eq!(result.score, 15);
        assert_eq!(
            result.reason_text(),
            "Mint authority disabled, More buys than sells"
        );
    }

    #[test]
    fn test_score_never_exceeds_max() {
        let result = score(&best_case().with_holders(u64::MAX));
        assert!(result.score <= MAX_SCORE);
    }
}

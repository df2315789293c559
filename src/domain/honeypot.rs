//! Holder-count honeypot heuristic shown alongside each notification.
//! Informational only; it never feeds into the score.

use std::fmt;

/// Minimum holders before a token stops looking thin
pub const MIN_HEALTHY_HOLDERS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HoneypotRisk {
    ProbablyOk,
    Suspicious,
    VerySuspicious,
}

impl HoneypotRisk {
    pub fn from_holders(holder_count: u64) -> Self {
        match holder_count {
            0 => HoneypotRisk::VerySuspicious,
            n if n < MIN_HEALTHY_HOLDERS => HoneypotRisk::Suspicious,
            _ => HoneypotRisk::ProbablyOk,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            HoneypotRisk::ProbablyOk => "PROBABLY OK",
            HoneypotRisk::Suspicious => "SUSPICIOUS (few holders)",
            HoneypotRisk::VerySuspicious => "VERY SUSPICIOUS (no holders)",
        }
    }

    pub fn marker(&self) -> &'static str {
        match self {
            HoneypotRisk::ProbablyOk => "✅",
            HoneypotRisk::Suspicious => "⚠️",
            HoneypotRisk::VerySuspicious => "🚨",
        }
    }
}

impl fmt::Display for HoneypotRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.marker(), self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holder_thresholds() {
        assert_eq!(HoneypotRisk::from_holders(0), HoneypotRisk::VerySuspicious);
        assert_eq!(HoneypotRisk::from_holders(1), HoneypotRisk::Suspicious);
        assert_eq!(HoneypotRisk::from_holders(9), HoneypotRisk::Suspicious);
        assert_eq!(HoneypotRisk::from_holders(10), HoneypotRisk::ProbablyOk);
    }

    #[test]
    fn test_display_includes_marker() {
        assert_eq!(HoneypotRisk::ProbablyOk.to_string(), "✅ PROBABLY OK");
    }
}

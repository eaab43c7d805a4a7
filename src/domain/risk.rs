// ============================================================
// Layer 3 — Risk Classifier
// ============================================================
// Maps a predicted pass-probability to an ordinal risk tier:
//
//   P >= 0.80          → Low
//   0.50 <= P < 0.80   → Medium
//   P < 0.50           → High
//
// Total over f64: NaN fails both comparisons and lands in High.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest probability classified as Low risk
pub const LOW_RISK_MIN_PROBABILITY: f64 = 0.80;

/// Lowest probability classified as Medium risk
pub const MEDIUM_RISK_MIN_PROBABILITY: f64 = 0.50;

/// Ordered from least to most at-risk, so `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub fn from_probability(pass_probability: f64) -> Self {
        if pass_probability >= LOW_RISK_MIN_PROBABILITY {
            Self::Low
        } else if pass_probability >= MEDIUM_RISK_MIN_PROBABILITY {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low    => "Low Risk",
            Self::Medium => "Medium Risk",
            Self::High   => "High Risk",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// src/verdict.rs

use serde::Serialize;
use std::fmt;

/// Markup (in percent) above which a quote is flagged.
pub const DEFAULT_RISK_THRESHOLD: i64 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Safe,
    HighRisk,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Safe => f.write_str("SAFE"),
            RiskLevel::HighRisk => f.write_str("HIGH RISK"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Verdict {
    pub markup_percent: i64,
    pub risk_level: RiskLevel,
    /// Quoted minus fair; negative when the quote is below the estimate.
    pub delta: f64,
}

/// Single fixed threshold, strictly greater-than.
#[derive(Debug, Clone, Copy)]
pub struct VerdictPolicy {
    pub high_risk_above: i64,
}

impl Default for VerdictPolicy {
    fn default() -> Self {
        Self {
            high_risk_above: DEFAULT_RISK_THRESHOLD,
        }
    }
}

impl VerdictPolicy {
    pub fn new(high_risk_above: i64) -> Self {
        Self { high_risk_above }
    }

    pub fn classify(&self, quoted: f64, fair: f64) -> Verdict {
        let markup_percent = markup_percent(quoted, fair);
        let risk_level = if markup_percent > self.high_risk_above {
            RiskLevel::HighRisk
        } else {
            RiskLevel::Safe
        };
        Verdict {
            markup_percent,
            risk_level,
            delta: quoted - fair,
        }
    }
}

/// Classify with the default 40% threshold.
pub fn classify(quoted: f64, fair: f64) -> Verdict {
    VerdictPolicy::default().classify(quoted, fair)
}

/// Rounded half away from zero. Multiplying before dividing keeps
/// exact halves like 40.5 exact in binary.
fn markup_percent(quoted: f64, fair: f64) -> i64 {
    if fair <= 0.0 {
        return 0;
    }
    ((quoted - fair) * 100.0 / fair).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_exactly_threshold_is_safe() {
        let v = classify(1400.0, 1000.0);
        assert_eq!(v.markup_percent, 40);
        assert_eq!(v.risk_level, RiskLevel::Safe);
        assert_eq!(v.delta, 400.0);
    }

    #[test]
    fn test_boundary_rounds_down() {
        let v = classify(1401.0, 1000.0);
        assert_eq!(v.markup_percent, 40);
        assert_eq!(v.risk_level, RiskLevel::Safe);

        let v = classify(1404.9, 1000.0);
        assert_eq!(v.markup_percent, 40);
        assert_eq!(v.risk_level, RiskLevel::Safe);
    }

    #[test]
    fn test_boundary_half_rounds_up() {
        let v = classify(1405.0, 1000.0);
        assert_eq!(v.markup_percent, 41);
        assert_eq!(v.risk_level, RiskLevel::HighRisk);
    }

    #[test]
    fn test_below_estimate() {
        let v = classify(875.0, 1000.0);
        assert_eq!(v.markup_percent, -13);
        assert_eq!(v.risk_level, RiskLevel::Safe);
        assert_eq!(v.delta, -125.0);
    }

    #[test]
    fn test_custom_threshold() {
        let policy = VerdictPolicy::new(20);
        assert_eq!(policy.classify(1250.0, 1000.0).risk_level, RiskLevel::HighRisk);
        assert_eq!(policy.classify(1200.0, 1000.0).risk_level, RiskLevel::Safe);
    }

    #[test]
    fn test_non_positive_fair() {
        let v = classify(500.0, 0.0);
        assert_eq!(v.markup_percent, 0);
        assert_eq!(v.risk_level, RiskLevel::Safe);
    }
}

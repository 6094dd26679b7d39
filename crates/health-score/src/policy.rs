//! Scoring policy: reference statistics and weights.
//!
//! The reference `(mean, std)` pairs describe a "typical healthy" company and
//! are fixed constants, never fit to data. Changing any of them changes every
//! score the system has ever published, so they live here as one auditable
//! table rather than inside the aggregation code.

use health_core::AnalysisError;
use serde::{Deserialize, Serialize};

use crate::ratios::RatioKind;

/// Tolerance for "weights sum to 1.0".
const WEIGHT_TOLERANCE: f64 = 1e-9;

/// The five sub-dimensions of financial health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    Liquidity,
    Stability,
    Profitability,
    Efficiency,
    Transparency,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::Liquidity,
        Dimension::Stability,
        Dimension::Profitability,
        Dimension::Efficiency,
        Dimension::Transparency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Liquidity => "Liquidity",
            Dimension::Stability => "Stability",
            Dimension::Profitability => "Profitability",
            Dimension::Efficiency => "Efficiency",
            Dimension::Transparency => "Transparency",
        }
    }

    /// Case-insensitive lookup by name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

/// One ratio's contribution rule within a dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioWeight {
    pub ratio: RatioKind,
    pub mean: f64,
    pub std: f64,
    /// Lower raw values are healthier (leverage, manipulation risk)
    #[serde(default)]
    pub invert: bool,
    pub weight: f64,
}

impl RatioWeight {
    pub const fn new(ratio: RatioKind, mean: f64, std: f64, invert: bool, weight: f64) -> Self {
        Self {
            ratio,
            mean,
            std,
            invert,
            weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionPolicy {
    pub dimension: Dimension,
    /// Weight of this dimension in the overall score
    pub weight: f64,
    pub ratios: Vec<RatioWeight>,
}

/// The complete weighting scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    pub dimensions: Vec<DimensionPolicy>,
}

impl ScoringPolicy {
    /// The published weighting scheme.
    pub fn standard() -> Self {
        use RatioKind::*;

        Self {
            dimensions: vec![
                DimensionPolicy {
                    dimension: Dimension::Liquidity,
                    weight: 0.15,
                    ratios: vec![
                        RatioWeight::new(CurrentRatio, 1.5, 0.75, false, 0.6),
                        RatioWeight::new(QuickRatio, 1.0, 0.5, false, 0.4),
                    ],
                },
                DimensionPolicy {
                    dimension: Dimension::Stability,
                    weight: 0.20,
                    ratios: vec![
                        RatioWeight::new(DebtToEquity, 1.5, 1.0, true, 0.4),
                        RatioWeight::new(InterestCoverage, 4.0, 2.0, false, 0.4),
                        RatioWeight::new(RetainedEarningsRatio, 0.3, 0.15, false, 0.2),
                    ],
                },
                DimensionPolicy {
                    dimension: Dimension::Profitability,
                    weight: 0.25,
                    ratios: vec![
                        RatioWeight::new(ReturnOnAssets, 0.08, 0.05, false, 0.4),
                        RatioWeight::new(ReturnOnEquity, 0.12, 0.08, false, 0.3),
                        RatioWeight::new(NetMargin, 0.10, 0.05, false, 0.3),
                    ],
                },
                DimensionPolicy {
                    dimension: Dimension::Efficiency,
                    weight: 0.20,
                    ratios: vec![
                        RatioWeight::new(AssetTurnover, 1.0, 0.4, false, 0.4),
                        RatioWeight::new(OperatingCashflowRatio, 0.1, 0.08, false, 0.3),
                        RatioWeight::new(RevenueGrowth, 0.1, 0.15, false, 0.3),
                    ],
                },
                DimensionPolicy {
                    dimension: Dimension::Transparency,
                    weight: 0.20,
                    ratios: vec![
                        RatioWeight::new(BeneishMScore, -2.2, 0.4, true, 0.6),
                        RatioWeight::new(AltmanZScore, 3.0, 1.0, false, 0.4),
                    ],
                },
            ],
        }
    }

    pub fn dimension(&self, dimension: Dimension) -> Option<&DimensionPolicy> {
        self.dimensions.iter().find(|d| d.dimension == dimension)
    }

    /// Check the structural invariants: every dimension exactly once, every
    /// weight group summing to 1.0, every reference std strictly positive.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        for dimension in Dimension::ALL {
            let count = self.dimensions.iter().filter(|d| d.dimension == dimension).count();
            if count != 1 {
                return Err(AnalysisError::InvalidPolicy(format!(
                    "{} must appear exactly once, found {}",
                    dimension.as_str(),
                    count
                )));
            }
        }

        let top: f64 = self.dimensions.iter().map(|d| d.weight).sum();
        if (top - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(AnalysisError::InvalidPolicy(format!(
                "dimension weights sum to {}, expected 1.0",
                top
            )));
        }

        for dim in &self.dimensions {
            if dim.ratios.is_empty() {
                return Err(AnalysisError::InvalidPolicy(format!(
                    "{} has no ratios",
                    dim.dimension.as_str()
                )));
            }
            let inner: f64 = dim.ratios.iter().map(|r| r.weight).sum();
            if (inner - 1.0).abs() > WEIGHT_TOLERANCE {
                return Err(AnalysisError::InvalidPolicy(format!(
                    "{} ratio weights sum to {}, expected 1.0",
                    dim.dimension.as_str(),
                    inner
                )));
            }
            if let Some(bad) = dim.ratios.iter().find(|r| !(r.std.is_finite() && r.std > 0.0)) {
                return Err(AnalysisError::InvalidPolicy(format!(
                    "{} has non-positive std {}",
                    bad.ratio.as_str(),
                    bad.std
                )));
            }
        }

        Ok(())
    }
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_standard_policy_is_valid() {
        assert!(ScoringPolicy::standard().validate().is_ok());
    }

    #[test]
    fn test_standard_weights_sum_to_one() {
        let policy = ScoringPolicy::standard();
        let top: f64 = policy.dimensions.iter().map(|d| d.weight).sum();
        assert_relative_eq!(top, 1.0, epsilon = 1e-12);
        for dim in &policy.dimensions {
            let inner: f64 = dim.ratios.iter().map(|r| r.weight).sum();
            assert_relative_eq!(inner, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_standard_policy_covers_every_ratio_once() {
        let policy = ScoringPolicy::standard();
        let mut seen: Vec<RatioKind> = policy
            .dimensions
            .iter()
            .flat_map(|d| d.ratios.iter().map(|r| r.ratio))
            .collect();
        seen.sort();
        assert_eq!(seen, RatioKind::ALL.to_vec());
    }

    #[test]
    fn test_inverted_ratios() {
        let policy = ScoringPolicy::standard();
        let inverted: Vec<RatioKind> = policy
            .dimensions
            .iter()
            .flat_map(|d| d.ratios.iter())
            .filter(|r| r.invert)
            .map(|r| r.ratio)
            .collect();
        assert_eq!(inverted, vec![RatioKind::DebtToEquity, RatioKind::BeneishMScore]);
    }

    #[test]
    fn test_validate_rejects_bad_weights() {
        let mut policy = ScoringPolicy::standard();
        policy.dimensions[0].ratios[0].weight = 0.7;
        assert!(matches!(policy.validate(), Err(AnalysisError::InvalidPolicy(_))));

        let mut policy = ScoringPolicy::standard();
        policy.dimensions[4].weight = 0.3;
        assert!(matches!(policy.validate(), Err(AnalysisError::InvalidPolicy(_))));
    }

    #[test]
    fn test_validate_rejects_bad_std_and_missing_dimension() {
        let mut policy = ScoringPolicy::standard();
        policy.dimensions[1].ratios[2].std = 0.0;
        assert!(policy.validate().is_err());

        let mut policy = ScoringPolicy::standard();
        policy.dimensions.pop();
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_policy_json_roundtrip_is_valid() {
        let json = serde_json::to_string(&ScoringPolicy::standard()).unwrap();
        assert!(json.contains("\"current_ratio\""));
        let parsed: ScoringPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ScoringPolicy::standard());
    }

    #[test]
    fn test_dimension_parse() {
        assert_eq!(Dimension::parse("liquidity"), Some(Dimension::Liquidity));
        assert_eq!(Dimension::parse(" TRANSPARENCY "), Some(Dimension::Transparency));
        assert_eq!(Dimension::parse("momentum"), None);
    }
}

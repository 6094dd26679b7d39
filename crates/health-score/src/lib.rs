//! Financial health scoring engine.
//!
//! Turns a [`FinancialRecord`] into five 0-100 sub-dimension scores and a
//! weighted composite. The pipeline is
//! record → [`extract_inputs`] → [`RatioSet`] → per-ratio [`normalize`] →
//! dimension scores → overall. Nothing here performs I/O or keeps state, so a
//! single [`HealthScorer`] can be shared across threads freely.

pub mod normalize;
pub mod policy;
pub mod ratios;

use health_core::{AnalysisError, FinancialRecord};
use serde::{Deserialize, Serialize};

pub use normalize::{normalize, normalize_with, ClipRange, NEUTRAL_SCORE};
pub use policy::{Dimension, DimensionPolicy, RatioWeight, ScoringPolicy};
pub use ratios::{compute_ratios, extract_inputs, safe_div, RatioKind, RatioSet, RawInputs};

/// Sub-dimension scores plus the composite, each in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubscoreSet {
    #[serde(rename = "Liquidity")]
    pub liquidity: f64,
    #[serde(rename = "Stability")]
    pub stability: f64,
    #[serde(rename = "Profitability")]
    pub profitability: f64,
    #[serde(rename = "Efficiency")]
    pub efficiency: f64,
    #[serde(rename = "Transparency")]
    pub transparency: f64,
    #[serde(rename = "Overall")]
    pub overall: f64,
}

impl SubscoreSet {
    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Liquidity => self.liquidity,
            Dimension::Stability => self.stability,
            Dimension::Profitability => self.profitability,
            Dimension::Efficiency => self.efficiency,
            Dimension::Transparency => self.transparency,
        }
    }

    /// Get the lowest-scoring dimension
    pub fn weakest(&self) -> (Dimension, f64) {
        Dimension::ALL
            .into_iter()
            .map(|d| (d, self.get(d)))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or((Dimension::Liquidity, NEUTRAL_SCORE))
    }

    /// Get the highest-scoring dimension
    pub fn strongest(&self) -> (Dimension, f64) {
        Dimension::ALL
            .into_iter()
            .map(|d| (d, self.get(d)))
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .unwrap_or((Dimension::Liquidity, NEUTRAL_SCORE))
    }
}

/// Coarse classification of an overall score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthGrade {
    Strong,
    Healthy,
    Watch,
    Weak,
    Distressed,
}

impl HealthGrade {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 70.0 => HealthGrade::Strong,
            s if s >= 55.0 => HealthGrade::Healthy,
            s if s >= 40.0 => HealthGrade::Watch,
            s if s >= 25.0 => HealthGrade::Weak,
            _ => HealthGrade::Distressed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthGrade::Strong => "Strong",
            HealthGrade::Healthy => "Healthy",
            HealthGrade::Watch => "Watch",
            HealthGrade::Weak => "Weak",
            HealthGrade::Distressed => "Distressed",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            HealthGrade::Strong => "#00cc88",
            HealthGrade::Healthy => "#66cc33",
            HealthGrade::Watch => "#ffaa00",
            HealthGrade::Weak => "#ff6600",
            HealthGrade::Distressed => "#ff0000",
        }
    }
}

/// How one ratio fed into its dimension score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioContribution {
    pub ratio: RatioKind,
    pub raw: f64,
    pub normalized: f64,
    pub weight: f64,
    /// `weight * normalized`
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionBreakdown {
    pub dimension: Dimension,
    pub score: f64,
    pub weight: f64,
    pub contributions: Vec<RatioContribution>,
}

/// Full explanation of a score: what went in and how it was weighted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub ratios: RatioSet,
    pub subscores: SubscoreSet,
    pub breakdown: Vec<DimensionBreakdown>,
    pub grade: HealthGrade,
}

/// Scores records against a validated [`ScoringPolicy`].
#[derive(Debug, Clone)]
pub struct HealthScorer {
    policy: ScoringPolicy,
}

impl HealthScorer {
    pub fn new(policy: ScoringPolicy) -> Result<Self, AnalysisError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    pub fn compute_subscores(&self, record: &FinancialRecord) -> SubscoreSet {
        let ratios = compute_ratios(record);
        let scores = self.score_ratios(&ratios);
        tracing::debug!(overall = scores.overall, "scored financial record");
        scores
    }

    pub fn score_ratios(&self, ratios: &RatioSet) -> SubscoreSet {
        let breakdown = self.breakdown(ratios);
        Self::assemble(&breakdown)
    }

    /// Score a record and keep every intermediate value.
    pub fn explain(&self, record: &FinancialRecord) -> HealthReport {
        let ratios = compute_ratios(record);
        let breakdown = self.breakdown(&ratios);
        let subscores = Self::assemble(&breakdown);

        HealthReport {
            ratios,
            subscores,
            breakdown,
            grade: HealthGrade::from_score(subscores.overall),
        }
    }

    /// Per-dimension breakdown in canonical dimension order.
    fn breakdown(&self, ratios: &RatioSet) -> Vec<DimensionBreakdown> {
        Dimension::ALL
            .into_iter()
            .filter_map(|dimension| self.policy.dimension(dimension))
            .map(|dim| {
                let contributions: Vec<RatioContribution> = dim
                    .ratios
                    .iter()
                    .map(|rw| {
                        let raw = ratios.get(rw.ratio);
                        let normalized = normalize_with(raw, rw);
                        RatioContribution {
                            ratio: rw.ratio,
                            raw,
                            normalized,
                            weight: rw.weight,
                            contribution: rw.weight * normalized,
                        }
                    })
                    .collect();

                // Left-to-right sum in table order
                let score = contributions.iter().fold(0.0, |acc, c| acc + c.contribution);

                DimensionBreakdown {
                    dimension: dim.dimension,
                    score,
                    weight: dim.weight,
                    contributions,
                }
            })
            .collect()
    }

    fn assemble(breakdown: &[DimensionBreakdown]) -> SubscoreSet {
        let score_of = |dimension: Dimension| {
            breakdown
                .iter()
                .find(|b| b.dimension == dimension)
                .map(|b| b.score)
                .unwrap_or(NEUTRAL_SCORE)
        };
        let overall = breakdown.iter().fold(0.0, |acc, b| acc + b.weight * b.score);

        SubscoreSet {
            liquidity: score_of(Dimension::Liquidity),
            stability: score_of(Dimension::Stability),
            profitability: score_of(Dimension::Profitability),
            efficiency: score_of(Dimension::Efficiency),
            transparency: score_of(Dimension::Transparency),
            overall,
        }
    }
}

impl Default for HealthScorer {
    fn default() -> Self {
        Self {
            policy: ScoringPolicy::standard(),
        }
    }
}

/// Score a record with the standard policy.
pub fn compute_subscores(record: &FinancialRecord) -> SubscoreSet {
    HealthScorer::default().compute_subscores(record)
}

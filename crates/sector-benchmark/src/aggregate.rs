use chrono::{DateTime, Utc};
use health_core::{AnalysisError, FinancialRecord};
use health_score::{Dimension, HealthScorer, SubscoreSet};
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};

/// Peer-group statistics for one sector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorAggregate {
    pub sector: String,
    pub company_count: usize,
    /// Per-dimension means across the peer group
    pub mean: SubscoreSet,
    pub median_overall: f64,
    pub std_overall: f64,
    /// Every peer's overall score, kept for percentile ranking
    pub overall_scores: Vec<f64>,
    pub computed_at: DateTime<Utc>,
}

impl SectorAggregate {
    pub fn from_scores(sector: &str, scores: &[SubscoreSet]) -> Result<Self, AnalysisError> {
        if scores.is_empty() {
            return Err(AnalysisError::InsufficientData(format!(
                "no scored companies for sector {}",
                sector.trim()
            )));
        }

        let mean_of = |f: fn(&SubscoreSet) -> f64| scores.iter().map(f).mean();
        let overall_scores: Vec<f64> = scores.iter().map(|s| s.overall).collect();

        let std_overall = if overall_scores.len() < 2 {
            0.0
        } else {
            overall_scores.iter().std_dev()
        };
        let median_overall = Data::new(overall_scores.clone()).median();

        Ok(Self {
            sector: sector.trim().to_string(),
            company_count: scores.len(),
            mean: SubscoreSet {
                liquidity: mean_of(|s| s.liquidity),
                stability: mean_of(|s| s.stability),
                profitability: mean_of(|s| s.profitability),
                efficiency: mean_of(|s| s.efficiency),
                transparency: mean_of(|s| s.transparency),
                overall: mean_of(|s| s.overall),
            },
            median_overall,
            std_overall,
            overall_scores,
            computed_at: Utc::now(),
        })
    }

    /// Share of peers scoring below `overall`, ties counting half.
    pub fn percentile_of(&self, overall: f64) -> f64 {
        if self.overall_scores.is_empty() {
            return 0.5;
        }
        let (below, tied) = self.overall_scores.iter().fold((0usize, 0usize), |(b, t), &peer| {
            if peer < overall {
                (b + 1, t)
            } else if peer == overall {
                (b, t + 1)
            } else {
                (b, t)
            }
        });
        (below as f64 + 0.5 * tied as f64) / self.overall_scores.len() as f64
    }

    /// Standard deviations `overall` sits from the sector mean; 0 without spread.
    pub fn z_score_of(&self, overall: f64) -> f64 {
        if self.std_overall < f64::EPSILON {
            return 0.0;
        }
        (overall - self.mean.overall) / self.std_overall
    }

    /// Score every peer record and aggregate.
    pub fn from_records(
        sector: &str,
        records: &[FinancialRecord],
        scorer: &HealthScorer,
    ) -> Result<Self, AnalysisError> {
        let scores: Vec<SubscoreSet> = records.iter().map(|r| scorer.compute_subscores(r)).collect();
        Self::from_scores(sector, &scores)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionDelta {
    pub dimension: Dimension,
    pub company: f64,
    pub sector_mean: f64,
    /// company − sector mean
    pub delta: f64,
}

/// One company measured against its sector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorComparison {
    pub sector: String,
    /// Share of peers scoring below the company (0.0 to 1.0)
    pub overall_percentile: f64,
    pub overall_z_score: f64,
    pub overall_delta: f64,
    pub deltas: Vec<DimensionDelta>,
    pub above_sector: bool,
}

pub fn compare(company: &SubscoreSet, aggregate: &SectorAggregate) -> SectorComparison {
    let deltas = Dimension::ALL
        .into_iter()
        .map(|dimension| {
            let value = company.get(dimension);
            let sector_mean = aggregate.mean.get(dimension);
            DimensionDelta {
                dimension,
                company: value,
                sector_mean,
                delta: value - sector_mean,
            }
        })
        .collect();

    SectorComparison {
        sector: aggregate.sector.clone(),
        overall_percentile: aggregate.percentile_of(company.overall),
        overall_z_score: aggregate.z_score_of(company.overall),
        overall_delta: company.overall - aggregate.mean.overall,
        deltas,
        above_sector: company.overall > aggregate.mean.overall,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn flat(score: f64) -> SubscoreSet {
        SubscoreSet {
            liquidity: score,
            stability: score,
            profitability: score,
            efficiency: score,
            transparency: score,
            overall: score,
        }
    }

    #[test]
    fn test_aggregate_statistics() {
        let agg = SectorAggregate::from_scores(" Utilities ", &[flat(40.0), flat(50.0), flat(90.0)]).unwrap();
        assert_eq!(agg.sector, "Utilities");
        assert_eq!(agg.company_count, 3);
        assert_relative_eq!(agg.mean.overall, 60.0, epsilon = 1e-9);
        assert_relative_eq!(agg.mean.liquidity, 60.0, epsilon = 1e-9);
        assert_relative_eq!(agg.median_overall, 50.0);
        assert_relative_eq!(agg.std_overall, 26.457513110645905, epsilon = 1e-9);
    }

    #[test]
    fn test_single_company_has_zero_spread() {
        let agg = SectorAggregate::from_scores("Banks", &[flat(55.0)]).unwrap();
        assert_eq!(agg.std_overall, 0.0);
        assert_relative_eq!(agg.median_overall, 55.0);
    }

    #[test]
    fn test_empty_sector_is_insufficient_data() {
        assert!(matches!(
            SectorAggregate::from_scores("Empty", &[]),
            Err(AnalysisError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_compare_against_sector() {
        let agg = SectorAggregate::from_scores("Tech", &[flat(40.0), flat(50.0), flat(90.0)]).unwrap();
        let mut company = flat(70.0);
        company.liquidity = 30.0;

        let cmp = compare(&company, &agg);
        assert!(cmp.above_sector);
        assert_relative_eq!(cmp.overall_percentile, 2.0 / 3.0, epsilon = 1e-9);
        assert_relative_eq!(cmp.overall_delta, 10.0, epsilon = 1e-9);
        // (70 - 60) / 26.4575...
        assert_relative_eq!(cmp.overall_z_score, 0.3779644730092272, epsilon = 1e-9);
        assert_eq!(cmp.deltas.len(), 5);
        assert_eq!(cmp.deltas[0].dimension, Dimension::Liquidity);
        assert_relative_eq!(cmp.deltas[0].delta, -30.0, epsilon = 1e-9);
    }

    #[test]
    fn test_percentile_counts_ties_half() {
        let peers = [flat(40.0), flat(50.0), flat(50.0), flat(90.0)];
        let agg = SectorAggregate::from_scores("Tech", &peers).unwrap();
        assert_relative_eq!(agg.percentile_of(50.0), 0.5);
        assert_relative_eq!(agg.percentile_of(10.0), 0.0);
        assert_relative_eq!(agg.percentile_of(95.0), 1.0);
    }

    #[test]
    fn test_single_company_has_zero_z_score() {
        let agg = SectorAggregate::from_scores("Banks", &[flat(55.0)]).unwrap();
        assert_eq!(agg.z_score_of(80.0), 0.0);
        assert_relative_eq!(agg.percentile_of(55.0), 0.5);
    }

    #[test]
    fn test_from_records_scores_each_peer() {
        let scorer = HealthScorer::default();
        let records = vec![FinancialRecord::default(), FinancialRecord::default()];
        let agg = SectorAggregate::from_records("Retail", &records, &scorer).unwrap();
        let expected = scorer.compute_subscores(&FinancialRecord::default());
        assert_eq!(agg.company_count, 2);
        assert_relative_eq!(agg.mean.overall, expected.overall, epsilon = 1e-9);
        assert_eq!(agg.std_overall, 0.0);
    }
}

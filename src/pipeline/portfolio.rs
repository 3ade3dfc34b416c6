//! Portfolio batch scoring
//!
//! Series are independent, so each one is assessed on its own rayon task
//! with no coordination. A failing series only affects its own entry.

use std::cmp::Ordering;

use rayon::prelude::*;
use tracing::{info, warn};

use super::{RiskAssessment, RiskPipeline};
use crate::error::Result;
use crate::types::OperationalMetricsSeries;

/// One named startup series to score
#[derive(Debug, Clone)]
pub struct PortfolioEntry {
    pub name: String,
    pub series: OperationalMetricsSeries,
}

/// Outcome for one portfolio entry
#[derive(Debug)]
pub struct PortfolioScore {
    pub name: String,
    pub outcome: Result<RiskAssessment>,
}

impl PortfolioScore {
    pub fn risk_score(&self) -> Option<f64> {
        self.outcome.as_ref().ok().map(|a| a.risk_score)
    }
}

/// Assess every entry in parallel and return them ranked.
pub fn score_portfolio(pipeline: &RiskPipeline, entries: Vec<PortfolioEntry>) -> Vec<PortfolioScore> {
    let total = entries.len();
    let mut scores: Vec<PortfolioScore> = entries
        .into_par_iter()
        .map(|entry| {
            let outcome = pipeline.assess(&entry.series);
            if let Err(ref e) = outcome {
                warn!(startup = %entry.name, error = %e, "Scoring failed");
            }
            PortfolioScore {
                name: entry.name,
                outcome,
            }
        })
        .collect();

    rank_portfolio(&mut scores);
    let failed = scores.iter().filter(|s| s.outcome.is_err()).count();
    info!(total, failed, "Portfolio scored");
    scores
}

/// Highest risk first; failed entries last in their original order.
pub fn rank_portfolio(scores: &mut [PortfolioScore]) {
    scores.sort_by(|a, b| match (a.risk_score(), b.risk_score()) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RiskError;
    use crate::types::DailyMetrics;
    use chrono::NaiveDate;

    fn series(morale_drop: f64) -> OperationalMetricsSeries {
        let start = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let days = (0..14)
            .map(|i| DailyMetrics {
                date: start + chrono::Duration::days(i),
                commit_count: 8,
                tasks_completed: 6,
                tasks_missed: 1,
                avg_response_time_hours: 3.0,
                founder_morale_score: (8.0 - morale_drop * i as f64).max(0.0),
                compute_spend_usd: 150.0,
            })
            .collect();
        OperationalMetricsSeries::new(days).unwrap()
    }

    #[test]
    fn ranks_by_descending_score() {
        let entries = vec![
            PortfolioEntry {
                name: "steady".into(),
                series: series(0.0),
            },
            PortfolioEntry {
                name: "sliding".into(),
                series: series(0.5),
            },
        ];
        let scores = score_portfolio(&RiskPipeline::default(), entries);
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].name, "sliding");
        assert!(scores[0].risk_score().unwrap() >= scores[1].risk_score().unwrap());
    }

    #[test]
    fn failures_sort_last() {
        let ok = |name: &str, score: f64| {
            let mut assessment = RiskPipeline::default().assess(&series(0.0)).unwrap();
            assessment.risk_score = score;
            PortfolioScore {
                name: name.into(),
                outcome: Ok(assessment),
            }
        };
        let mut scores = vec![
            PortfolioScore {
                name: "broken".into(),
                outcome: Err(RiskError::EmptySeries),
            },
            ok("low", 12.0),
            ok("high", 71.0),
        ];
        rank_portfolio(&mut scores);
        let names: Vec<&str> = scores.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["high", "low", "broken"]);
    }
}

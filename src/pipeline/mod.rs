//! Risk Scoring Pipeline
//!
//! ```text
//! series ──▶ Feature Engineer ──▶ Anomaly Detector ──▶ Risk Composer ──▶ score
//!    │                                                                     │
//!    └──▶ Snapshot Replayer (same chain on truncated prefixes) ──▶ causality
//! ```
//!
//! Every call is a pure function of the series and the configuration. No
//! state survives between calls, so one `RiskPipeline` can be shared across
//! threads and used for any number of startups.

mod portfolio;

pub use portfolio::{rank_portfolio, score_portfolio, PortfolioEntry, PortfolioScore};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::anomaly::detect_anomalies;
use crate::config::RiskConfig;
use crate::error::{Result, RiskError};
use crate::features::{engineer_features, feature_summary};
use crate::replay::{causality_markers, replay_snapshots};
use crate::risk::{self, compose_risk, final_risk_score};
use crate::types::{
    CausalityMarkers, FeatureSummary, OperationalMetricsSeries, RiskComponents, RiskRecord, RiskSignal, RiskTrend,
    Severity, Snapshot, TopSignal,
};

/// Full scoring result for one startup series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Final 0-100 score for the latest day
    pub risk_score: f64,
    pub severity: Severity,
    pub components: RiskComponents,
    pub top_signals: Vec<TopSignal>,
    pub critical_signals: Vec<String>,
    /// `None` for a single-day series
    pub trend: Option<RiskTrend>,
    pub feature_summary: FeatureSummary,
    /// Replayed history, oldest first
    pub snapshots: Vec<Snapshot>,
    /// `None` when no replay window had enough history
    pub causality: Option<CausalityMarkers>,
    /// MD5 of the input series, for external caches
    pub fingerprint: String,
    pub records: Vec<RiskRecord>,
}

/// Stateless runner for the full scoring chain
#[derive(Debug, Clone, Default)]
pub struct RiskPipeline {
    config: RiskConfig,
}

impl RiskPipeline {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Run features, anomaly detection and composition once.
    ///
    /// Returns the final score and the per-day risk table.
    pub fn score(&self, series: &OperationalMetricsSeries) -> Result<(f64, Vec<RiskRecord>)> {
        let features = engineer_features(series, &self.config.features)?;
        let annotations = detect_anomalies(&features, &self.config.anomaly)?;
        let records = compose_risk(&features, &annotations, &self.config.scoring)?;
        let score = final_risk_score(&records, &self.config.scoring)?;
        Ok((score, records))
    }

    /// Score the series and attach explainability, replay and causality.
    pub fn assess(&self, series: &OperationalMetricsSeries) -> Result<RiskAssessment> {
        let features = engineer_features(series, &self.config.features)?;
        let summary = feature_summary(&features).ok_or(RiskError::EmptySeries)?;
        let annotations = detect_anomalies(&features, &self.config.anomaly)?;
        let records = compose_risk(&features, &annotations, &self.config.scoring)?;
        let risk_score = final_risk_score(&records, &self.config.scoring)?;
        let severity = Severity::from_score(risk_score)?;

        let scoring = &self.config.scoring;
        let components = risk::risk_components(&records).ok_or(RiskError::EmptySeries)?;
        let top_signals = risk::top_signals(&records, RiskSignal::ALL.len())?;
        let critical_signals = risk::critical_signals(&records, scoring.critical_signal_threshold);
        let trend = risk::risk_trend(&records, scoring.recency_window, scoring.stable_slope);

        let snapshots = replay_snapshots(series, &self.config)?;
        let causality = causality_markers(&snapshots, severity, &self.config.replay);

        info!(
            risk_score,
            severity = %severity,
            days = series.len(),
            snapshots = snapshots.len(),
            "Risk assessment complete"
        );
        debug!(critical = ?critical_signals, "Critical signals");

        Ok(RiskAssessment {
            risk_score,
            severity,
            components,
            top_signals,
            critical_signals,
            trend,
            feature_summary: summary,
            snapshots,
            causality,
            fingerprint: series.fingerprint()?,
            records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DailyMetrics;
    use chrono::NaiveDate;

    fn declining(n: usize) -> OperationalMetricsSeries {
        let start = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        let days = (0..n)
            .map(|i| {
                let t = i as f64 / n as f64;
                DailyMetrics {
                    date: start + chrono::Duration::days(i as i64),
                    commit_count: (20.0 * (1.0 - t)) as u32,
                    tasks_completed: 10 - (8.0 * t) as u32,
                    tasks_missed: (8.0 * t) as u32,
                    avg_response_time_hours: 2.0 + 10.0 * t,
                    founder_morale_score: 9.0 - 7.0 * t,
                    compute_spend_usd: 100.0 * (1.0 + t),
                }
            })
            .collect();
        OperationalMetricsSeries::new(days).unwrap()
    }

    #[test]
    fn assess_matches_score() {
        let series = declining(40);
        let pipeline = RiskPipeline::default();
        let (score, records) = pipeline.score(&series).unwrap();
        let assessment = pipeline.assess(&series).unwrap();
        assert_eq!(assessment.risk_score, score);
        assert_eq!(assessment.records, records);
        assert_eq!(assessment.top_signals.len(), 4);
        assert_eq!(assessment.severity, Severity::from_score(score).unwrap());
        assert_eq!(assessment.feature_summary.latest_date, series.latest().unwrap().date);
    }

    #[test]
    fn live_score_equals_latest_snapshot() {
        let series = declining(35);
        let assessment = RiskPipeline::default().assess(&series).unwrap();
        let latest = assessment.snapshots.last().unwrap();
        assert_eq!(latest.days_ago, 0);
        assert_eq!(latest.risk_score, crate::stats::round_dp(assessment.risk_score, 1));
        assert_eq!(latest.severity, assessment.severity);
        assert_eq!(assessment.causality.unwrap().snapshot_count, assessment.snapshots.len());
    }

    #[test]
    fn short_series_has_no_history() {
        let series = declining(5);
        let assessment = RiskPipeline::default().assess(&series).unwrap();
        assert!(assessment.snapshots.is_empty());
        assert!(assessment.causality.is_none());
        assert!((0.0..=100.0).contains(&assessment.risk_score));
    }
}

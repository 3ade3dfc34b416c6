//! Anomaly Detector
//!
//! Fits a fresh isolation forest per series over five engineered signals and
//! annotates every day with a normalized anomaly score and an outlier flag.
//! Nothing is retained between calls: the same series and seed always give
//! the same annotations.

pub mod isolation_forest;

use tracing::debug;

use crate::config::AnomalyConfig;
use crate::error::{Result, RiskError};
use crate::stats;
use crate::types::{AnomalyAnnotation, FeatureRecord};

pub use isolation_forest::IsolationForest;

/// Columns of the detector's feature matrix, in order.
pub const ANOMALY_FEATURES: [&str; 5] = [
    "commit_rolling_7d",
    "task_miss_rate_7d",
    "morale_trend_7d",
    "response_delay_normalized",
    "spend_change_pct",
];

/// Row-major matrix of the detector inputs, one row per day.
pub fn feature_matrix(features: &[FeatureRecord]) -> Vec<Vec<f64>> {
    features
        .iter()
        .map(|f| {
            vec![
                f.commit_rolling_7d,
                f.task_miss_rate_7d,
                f.morale_trend_7d,
                f.response_delay_normalized,
                f.spend_change_pct,
            ]
        })
        .collect()
}

/// Replace NaN/Inf cells with the mean of the finite values in their column.
///
/// A column with no finite value at all cannot be repaired and fails the fit.
fn repair_non_finite(rows: &mut [Vec<f64>]) -> Result<usize> {
    let mut repaired = 0;
    for (col, name) in ANOMALY_FEATURES.iter().enumerate() {
        if rows.iter().all(|r| r[col].is_finite()) {
            continue;
        }
        let finite: Vec<f64> = rows.iter().map(|r| r[col]).filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return Err(RiskError::AnomalyFit(format!("column '{name}' has no finite values")));
        }
        let mean = finite.iter().sum::<f64>() / finite.len() as f64;
        for row in rows.iter_mut() {
            if !row[col].is_finite() {
                row[col] = mean;
                repaired += 1;
            }
        }
    }
    Ok(repaired)
}

/// Annotate each day with `anomaly_score` (0-1, 1 = most anomalous) and
/// `is_anomaly` (decision score below the contamination threshold).
pub fn detect_anomalies(
    features: &[FeatureRecord],
    config: &AnomalyConfig,
) -> Result<Vec<AnomalyAnnotation>> {
    if features.is_empty() {
        return Err(RiskError::EmptySeries);
    }

    let mut rows = feature_matrix(features);
    let repaired = repair_non_finite(&mut rows)?;

    let forest = IsolationForest::fit(
        &rows,
        config.n_estimators,
        config.max_samples,
        config.contamination,
        config.seed,
    );
    let decision = forest.decision_function(&rows);
    if decision.iter().any(|d| !d.is_finite()) {
        return Err(RiskError::AnomalyFit("non-finite decision score".to_string()));
    }

    // Lower decision = more anomalous, so invert for a higher-is-riskier score
    let scores = stats::min_max_normalize(&decision, true);

    let annotations: Vec<AnomalyAnnotation> = scores
        .iter()
        .zip(&decision)
        .map(|(&anomaly_score, &d)| AnomalyAnnotation {
            anomaly_score,
            is_anomaly: d < 0.0,
        })
        .collect();

    debug!(
        days = annotations.len(),
        flagged = annotations.iter().filter(|a| a.is_anomaly).count(),
        repaired_cells = repaired,
        threshold = forest.threshold(),
        "Anomaly detection complete"
    );

    Ok(annotations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeatureConfig;
    use crate::features::engineer_features;
    use crate::types::{DailyMetrics, OperationalMetricsSeries};
    use chrono::NaiveDate;

    fn series(n: usize, spike_at: Option<usize>) -> OperationalMetricsSeries {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let days = (0..n)
            .map(|i| {
                let spike = spike_at == Some(i);
                DailyMetrics {
                    date: start + chrono::Duration::days(i as i64),
                    commit_count: if spike { 0 } else { 10 + (i % 3) as u32 },
                    tasks_completed: if spike { 0 } else { 8 },
                    tasks_missed: if spike { 9 } else { (i % 2) as u32 },
                    avg_response_time_hours: if spike { 30.0 } else { 2.0 + (i % 4) as f64 * 0.1 },
                    founder_morale_score: if spike { 1.0 } else { 7.0 + (i % 2) as f64 * 0.2 },
                    compute_spend_usd: if spike { 900.0 } else { 100.0 + (i % 5) as f64 },
                }
            })
            .collect();
        OperationalMetricsSeries::new(days).unwrap()
    }

    fn features(s: &OperationalMetricsSeries) -> Vec<FeatureRecord> {
        engineer_features(s, &FeatureConfig::default()).unwrap()
    }

    #[test]
    fn scores_are_normalized_and_deterministic() {
        let f = features(&series(30, Some(20)));
        let a = detect_anomalies(&f, &AnomalyConfig::default()).unwrap();
        let b = detect_anomalies(&f, &AnomalyConfig::default()).unwrap();
        assert_eq!(a, b);
        assert!(a.iter().all(|x| (0.0..=1.0).contains(&x.anomaly_score)));
        assert!(a.iter().any(|x| x.anomaly_score == 1.0));
        assert!(a.iter().any(|x| x.anomaly_score == 0.0));
    }

    #[test]
    fn spike_day_is_flagged() {
        let f = features(&series(30, Some(20)));
        let a = detect_anomalies(&f, &AnomalyConfig::default()).unwrap();
        assert!(a[20].is_anomaly);
        assert!(a[20].anomaly_score > 0.8, "got {}", a[20].anomaly_score);
    }

    #[test]
    fn flat_series_has_no_anomalies() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let days = (0..12)
            .map(|i| DailyMetrics {
                date: start + chrono::Duration::days(i),
                commit_count: 5,
                tasks_completed: 4,
                tasks_missed: 1,
                avg_response_time_hours: 3.0,
                founder_morale_score: 7.0,
                compute_spend_usd: 100.0,
            })
            .collect();
        let f = features(&OperationalMetricsSeries::new(days).unwrap());
        let a = detect_anomalies(&f, &AnomalyConfig::default()).unwrap();
        assert!(a.iter().all(|x| x.anomaly_score == 0.0 && !x.is_anomaly));
    }

    #[test]
    fn non_finite_cells_take_column_mean() {
        let mut rows = vec![vec![1.0, 0.0, 0.0, 0.0, 0.0], vec![3.0, 0.0, 0.0, 0.0, 0.0]];
        rows.push(vec![f64::NAN, 0.0, 0.0, f64::INFINITY, 0.0]);
        let repaired = repair_non_finite(&mut rows).unwrap();
        assert_eq!(repaired, 2);
        assert_eq!(rows[2][0], 2.0);
        assert_eq!(rows[2][3], 0.0);
    }

    #[test]
    fn unrepairable_column_fails() {
        let mut rows = vec![vec![0.0, f64::NAN, 0.0, 0.0, 0.0]; 3];
        assert!(matches!(repair_non_finite(&mut rows), Err(RiskError::AnomalyFit(_))));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            detect_anomalies(&[], &AnomalyConfig::default()),
            Err(RiskError::EmptySeries)
        ));
    }
}

//! Risk Composer
//!
//! Combines engineered features and anomaly annotations into four per-day
//! risk signals (each 0-1) and a weighted 0-100 daily score, then collapses
//! the trailing window into one recency-weighted, trend-escalated score.
//!
//! ```text
//! execution   = 0.6 * (1 - execution_health) + 0.4 * miss_rate_7d
//! team_health = 0.7 * clamp(-morale_trend * 0.5) + 0.3 * clamp(max(0, z_response) / 3)
//! spend       = clamp(|spend_change_pct| / 100)
//! anomaly     = anomaly_score
//! daily       = 100 * (0.35 * execution + 0.25 * team_health + 0.25 * anomaly + 0.15 * spend)
//! ```
//!
//! The escalation bonus only ever raises the score. An improving trend
//! earns no matching discount.

pub mod explain;

pub use explain::{critical_signals, risk_components, risk_trend, top_driver, top_signals};

use tracing::debug;

use crate::config::ScoringConfig;
use crate::error::{Result, RiskError};
use crate::stats::{self, clamp_unit};
use crate::types::{AnomalyAnnotation, FeatureRecord, RiskRecord};

// ============================================================================
// Per-day composition
// ============================================================================

/// Build one `RiskRecord` per day from aligned features and annotations.
pub fn compose_risk(
    features: &[FeatureRecord],
    annotations: &[AnomalyAnnotation],
    config: &ScoringConfig,
) -> Result<Vec<RiskRecord>> {
    if features.is_empty() {
        return Err(RiskError::EmptySeries);
    }
    if features.len() != annotations.len() {
        return Err(RiskError::LengthMismatch {
            features: features.len(),
            annotations: annotations.len(),
        });
    }

    let records = features
        .iter()
        .zip(annotations)
        .map(|(f, a)| compose_day(f, a, config))
        .collect();
    Ok(records)
}

fn compose_day(f: &FeatureRecord, a: &AnomalyAnnotation, config: &ScoringConfig) -> RiskRecord {
    let risk_execution = 1.0 - f.execution_health;
    let risk_task_quality = f.task_miss_rate_7d;
    let execution_risk_signal = clamp_unit(
        config.execution_health_weight * risk_execution + config.task_quality_weight * risk_task_quality,
    );

    let team_health_base = clamp_unit((-f.morale_trend_7d * config.morale_trend_scale).max(0.0));
    let response_component = clamp_unit(f.response_delay_normalized.max(0.0) / config.response_z_cap);
    let team_health_risk_signal =
        config.morale_trend_weight * team_health_base + config.response_weight * response_component;

    let spend_risk_signal = clamp_unit(f.spend_change_pct.abs() / config.spend_change_cap_pct);
    let anomaly_risk_signal = a.anomaly_score;

    let daily_risk_score = (100.0
        * (config.execution_weight * execution_risk_signal
            + config.team_health_weight * team_health_risk_signal
            + config.anomaly_weight * anomaly_risk_signal
            + config.spend_weight * spend_risk_signal))
        .clamp(0.0, 100.0);

    RiskRecord {
        date: f.date(),
        risk_execution,
        risk_task_quality,
        execution_risk_signal,
        team_health_risk_signal,
        spend_risk_signal,
        anomaly_risk_signal,
        is_anomaly: a.is_anomaly,
        daily_risk_score,
    }
}

// ============================================================================
// Final score
// ============================================================================

/// Exponential weights `e^(i / (n - 1))` for `i = 0..n`, normalized to sum 1.
///
/// The newest value gets the largest weight; a single value gets weight 1.
pub fn recency_weights(n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => {
            let step = 1.0 / (n - 1) as f64;
            let raw: Vec<f64> = (0..n).map(|i| (i as f64 * step).exp()).collect();
            let total: f64 = raw.iter().sum();
            raw.into_iter().map(|w| w / total).collect()
        }
    }
}

/// Recency-weighted mean of `window`, oldest first.
pub fn recency_weighted_mean(window: &[f64]) -> f64 {
    recency_weights(window.len())
        .iter()
        .zip(window)
        .map(|(w, v)| w * v)
        .sum()
}

/// Points added for a worsening trend over `window`. Zero for a flat or
/// improving trend, or when the window is too short to fit one.
pub fn escalation_bonus(window: &[f64], config: &ScoringConfig) -> f64 {
    if window.len() < config.escalation_min_points {
        return 0.0;
    }
    let slope = stats::ols_slope(window);
    if slope > 0.0 {
        (slope * config.escalation_multiplier).min(config.escalation_cap)
    } else {
        0.0
    }
}

/// Collapse the per-day scores into the final 0-100 risk score.
pub fn final_risk_score(records: &[RiskRecord], config: &ScoringConfig) -> Result<f64> {
    if records.is_empty() {
        return Err(RiskError::EmptySeries);
    }
    let n = config.recency_window.min(records.len()).max(1);
    let window: Vec<f64> = records[records.len() - n..]
        .iter()
        .map(|r| r.daily_risk_score)
        .collect();

    let weighted = recency_weighted_mean(&window);
    let bonus = escalation_bonus(&window, config);
    let score = (weighted + bonus).clamp(0.0, 100.0);

    debug!(window = n, weighted, bonus, score, "Final risk score");
    Ok(score)
}

//! Explainability views over a per-day risk table
//!
//! All views read the latest day (or a trailing window) and never modify
//! the records.

use crate::error::{Result, RiskError};
use crate::stats::{self, round_dp};
use crate::types::{RiskComponents, RiskRecord, RiskSignal, RiskTrend, Severity, TopSignal, TrendDirection};

/// Latest-day signal breakdown on a 0-100 scale.
pub fn risk_components(records: &[RiskRecord]) -> Option<RiskComponents> {
    let latest = records.last()?;
    Some(RiskComponents {
        execution_risk: round_dp(latest.execution_risk_signal * 100.0, 1),
        team_health_risk: round_dp(latest.team_health_risk_signal * 100.0, 1),
        anomaly_risk: round_dp(latest.anomaly_risk_signal * 100.0, 1),
        spend_risk: round_dp(latest.spend_risk_signal * 100.0, 1),
        is_anomaly_detected: latest.is_anomaly,
    })
}

/// Signal value on the 0-100 scale, rounded to 1 dp as reported.
fn risk_level(record: &RiskRecord, signal: RiskSignal) -> f64 {
    round_dp(record.signal(signal) * 100.0, 1)
}

/// Signals of one day ordered by reported risk level, highest first.
/// Levels that round equal keep the `RiskSignal::ALL` order.
fn ranked(record: &RiskRecord) -> [RiskSignal; 4] {
    let mut signals = RiskSignal::ALL;
    signals.sort_by(|a, b| risk_level(record, *b).total_cmp(&risk_level(record, *a)));
    signals
}

/// The single highest-valued signal of a day.
pub fn top_driver(record: &RiskRecord) -> RiskSignal {
    ranked(record)[0]
}

/// Up to `n` latest-day signals, highest first, with severity labels.
pub fn top_signals(records: &[RiskRecord], n: usize) -> Result<Vec<TopSignal>> {
    let latest = records.last().ok_or(RiskError::EmptySeries)?;
    let mut top = Vec::with_capacity(n.min(RiskSignal::ALL.len()));
    for signal in ranked(latest).into_iter().take(n) {
        let risk_level = risk_level(latest, signal);
        top.push(TopSignal {
            signal,
            signal_name: signal.display_name().to_string(),
            risk_level,
            severity: Severity::from_score(risk_level)?,
            description: signal.description().to_string(),
        });
    }
    Ok(top)
}

/// Names of latest-day components strictly above `threshold` (0-1).
///
/// Execution is split into its velocity and task-completion parts here.
pub fn critical_signals(records: &[RiskRecord], threshold: f64) -> Vec<String> {
    let Some(latest) = records.last() else {
        return Vec::new();
    };
    let checks = [
        ("execution_velocity", latest.risk_execution),
        ("task_completion", latest.risk_task_quality),
        ("team_morale", latest.team_health_risk_signal),
        ("spend_volatility", latest.spend_risk_signal),
        ("operational_anomaly", latest.anomaly_risk_signal),
    ];
    checks
        .into_iter()
        .filter(|(_, level)| *level > threshold)
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Direction and spread of the last `window` daily scores.
///
/// `None` when fewer than two days are available. A slope magnitude below
/// `stable_slope` points/day is stable.
pub fn risk_trend(records: &[RiskRecord], window: usize, stable_slope: f64) -> Option<RiskTrend> {
    let start = records.len().saturating_sub(window);
    let recent: Vec<f64> = records[start..].iter().map(|r| r.daily_risk_score).collect();
    if recent.len() < 2 {
        return None;
    }

    let slope = stats::ols_slope(&recent);
    let trend_direction = if slope.abs() < stable_slope {
        TrendDirection::Stable
    } else if slope > 0.0 {
        TrendDirection::Increasing
    } else {
        TrendDirection::Decreasing
    };

    let min = recent.iter().copied().fold(f64::INFINITY, f64::min);
    let max = recent.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let current = *recent.last()?;

    Some(RiskTrend {
        trend_direction,
        trend_slope: round_dp(slope, 2),
        volatility: round_dp(stats::sample_std(&recent), 2),
        min: round_dp(min, 1),
        max: round_dp(max, 1),
        current: round_dp(current, 1),
        days_analyzed: recent.len(),
    })
}

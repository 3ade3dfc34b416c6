//! Feature Engineer
//!
//! Transforms a raw daily operational series into time-series signals for
//! execution velocity, team health, responsiveness and spend dynamics.
//!
//! ## Signals
//! - Execution velocity: 7-day commit mean and its day-over-day change
//! - Task quality: daily and 7-day miss rate
//! - Team health: morale change, 7-day OLS morale slope and volatility
//! - Responsiveness: response time z-scored against the whole series
//! - Spend: percent change, its acceleration, 7-day mean spend
//! - Composite execution health (0-1)
//!
//! Values undefined at the start of a rolling or difference window are
//! back-filled from the first later defined value; any remainder is 0.

use tracing::debug;

use crate::config::FeatureConfig;
use crate::error::{Result, RiskError};
use crate::stats::{self, back_fill, diff, pct_change, rolling_mean, rolling_slope, rolling_std};
use crate::types::{DailyMetrics, FeatureRecord, FeatureSummary, OperationalMetricsSeries, MAX_MORALE_SCORE};

/// Share of the day's tasks that were missed; 0 when no tasks were touched.
pub fn task_miss_rate(day: &DailyMetrics) -> f64 {
    let total = day.total_tasks();
    if total == 0 {
        0.0
    } else {
        f64::from(day.tasks_missed) / total as f64
    }
}

/// Derive one `FeatureRecord` per input day, in input order.
pub fn engineer_features(
    series: &OperationalMetricsSeries,
    config: &FeatureConfig,
) -> Result<Vec<FeatureRecord>> {
    let days = series.days();
    if days.is_empty() {
        return Err(RiskError::EmptySeries);
    }
    let window = config.window_days;

    let commits: Vec<f64> = days.iter().map(|d| f64::from(d.commit_count)).collect();
    let miss_rate: Vec<f64> = days.iter().map(task_miss_rate).collect();
    let morale: Vec<f64> = days.iter().map(|d| d.founder_morale_score).collect();
    let response: Vec<f64> = days.iter().map(|d| d.avg_response_time_hours).collect();
    let spend: Vec<f64> = days.iter().map(|d| d.compute_spend_usd).collect();

    // Execution velocity
    let commit_rolling = rolling_mean(&commits, window, 1);
    let commit_velocity_change = diff(&commit_rolling);

    // Task quality
    let miss_rate_rolling = rolling_mean(&miss_rate, window, 1);

    // Team health
    let morale_defined: Vec<Option<f64>> = morale.iter().copied().map(Some).collect();
    let morale_change = diff(&morale_defined);
    let morale_trend = rolling_slope(&morale, window, config.morale_trend_min_points);
    let morale_volatility = rolling_std(&morale, window, config.morale_volatility_min_points);

    // Responsiveness
    let response_normalized = stats::z_scores(&response);

    // Spend dynamics
    let spend_change_pct = pct_change(&spend, 100.0);
    let spend_acceleration = diff(&spend_change_pct);
    let spend_rolling = rolling_mean(&spend, window, 1);

    let commit_rolling = back_fill(&commit_rolling);
    let commit_velocity_change = back_fill(&commit_velocity_change);
    let miss_rate_rolling = back_fill(&miss_rate_rolling);
    let morale_change = back_fill(&morale_change);
    let morale_trend = back_fill(&morale_trend);
    let morale_volatility = back_fill(&morale_volatility);
    let spend_change_pct = back_fill(&spend_change_pct);
    let spend_acceleration = back_fill(&spend_acceleration);
    let spend_rolling = back_fill(&spend_rolling);

    // Composite execution health, commit velocity relative to the series peak
    let max_commits = commit_rolling.iter().copied().fold(0.0_f64, f64::max);

    let records: Vec<FeatureRecord> = days
        .iter()
        .enumerate()
        .map(|(i, day)| {
            let commit_score = if max_commits > 0.0 {
                commit_rolling[i] / max_commits
            } else {
                0.0
            };
            let task_score = 1.0 - miss_rate_rolling[i];
            let morale_score = day.founder_morale_score / MAX_MORALE_SCORE;
            let execution_health = config.commit_weight * commit_score
                + config.task_weight * task_score
                + config.morale_weight * morale_score;

            FeatureRecord {
                metrics: day.clone(),
                commit_rolling_7d: commit_rolling[i],
                commit_velocity_change: commit_velocity_change[i],
                task_miss_rate: miss_rate[i],
                task_miss_rate_7d: miss_rate_rolling[i],
                morale_change: morale_change[i],
                morale_trend_7d: morale_trend[i],
                morale_volatility_7d: morale_volatility[i],
                response_delay_normalized: response_normalized[i],
                spend_change_pct: spend_change_pct[i],
                spend_acceleration: spend_acceleration[i],
                spend_rolling_7d: spend_rolling[i],
                execution_health,
            }
        })
        .collect();

    if let Some(last) = records.last() {
        debug!(
            days = records.len(),
            execution_health = last.execution_health,
            morale_trend = last.morale_trend_7d,
            "Engineered features"
        );
    }

    Ok(records)
}

/// Latest-day feature values rounded for display. `None` for no records.
pub fn feature_summary(features: &[FeatureRecord]) -> Option<FeatureSummary> {
    let latest = features.last()?;
    Some(FeatureSummary {
        latest_date: latest.date(),
        commit_velocity_7d: stats::round_dp(latest.commit_rolling_7d, 2),
        task_miss_rate: stats::round_dp(latest.task_miss_rate, 3),
        morale_score: stats::round_dp(latest.metrics.founder_morale_score, 1),
        morale_trend: stats::round_dp(latest.morale_trend_7d, 3),
        execution_health: stats::round_dp(latest.execution_health, 3),
        response_time_hours: stats::round_dp(latest.metrics.avg_response_time_hours, 1),
        daily_spend_usd: stats::round_dp(latest.metrics.compute_spend_usd, 2),
        spend_change_pct: stats::round_dp(latest.spend_change_pct, 1),
    })
}

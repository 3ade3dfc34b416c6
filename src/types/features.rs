//! Engineered per-day signals derived from the raw series

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::DailyMetrics;

/// Derived signals for one day.
///
/// Every field is computed from this day and earlier days only, except
/// `response_delay_normalized` (z-scored against the whole series) and
/// `execution_health` (commit velocity scaled by the series maximum).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// Raw telemetry the features were derived from
    pub metrics: DailyMetrics,

    // === Execution velocity ===
    pub commit_rolling_7d: f64,
    pub commit_velocity_change: f64,

    // === Task execution quality ===
    pub task_miss_rate: f64,
    pub task_miss_rate_7d: f64,

    // === Team health ===
    pub morale_change: f64,
    /// OLS slope of morale over the trailing window (points/day)
    pub morale_trend_7d: f64,
    pub morale_volatility_7d: f64,

    // === Responsiveness ===
    pub response_delay_normalized: f64,

    // === Spend dynamics ===
    pub spend_change_pct: f64,
    pub spend_acceleration: f64,
    pub spend_rolling_7d: f64,

    /// Composite execution health (0-1, higher is healthier)
    pub execution_health: f64,
}

impl FeatureRecord {
    pub fn date(&self) -> NaiveDate {
        self.metrics.date
    }
}

/// Latest-day feature snapshot, rounded for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSummary {
    pub latest_date: NaiveDate,
    pub commit_velocity_7d: f64,
    pub task_miss_rate: f64,
    pub morale_score: f64,
    pub morale_trend: f64,
    pub execution_health: f64,
    pub response_time_hours: f64,
    pub daily_spend_usd: f64,
    pub spend_change_pct: f64,
}

//! Reference model constants.
//!
//! Exposed as functions so they double as `#[serde(default = ...)]` hooks.
//! Grouped by pipeline stage.

// ============================================================================
// Feature Engineering
// ============================================================================

/// Trailing window for rolling features (days).
pub fn window_days() -> usize {
    7
}

/// Minimum observations for the morale slope and volatility.
pub fn morale_min_points() -> usize {
    3
}

pub fn commit_weight() -> f64 {
    0.40
}

pub fn task_weight() -> f64 {
    0.35
}

pub fn morale_weight() -> f64 {
    0.25
}

// ============================================================================
// Anomaly Detection
// ============================================================================

pub fn n_estimators() -> usize {
    100
}

/// Expected outlier fraction (~10% of days).
pub fn contamination() -> f64 {
    0.10
}

pub fn seed() -> u64 {
    42
}

/// Subsample ceiling used when `max_samples` is automatic.
pub const AUTO_MAX_SAMPLES: usize = 256;

// ============================================================================
// Risk Scoring
// ============================================================================

pub fn execution_weight() -> f64 {
    0.35
}

pub fn team_health_weight() -> f64 {
    0.25
}

pub fn anomaly_weight() -> f64 {
    0.25
}

pub fn spend_weight() -> f64 {
    0.15
}

pub fn execution_health_weight() -> f64 {
    0.6
}

pub fn task_quality_weight() -> f64 {
    0.4
}

pub fn morale_trend_weight() -> f64 {
    0.7
}

pub fn response_weight() -> f64 {
    0.3
}

/// A morale decline of 2 points/day saturates the morale component.
pub fn morale_trend_scale() -> f64 {
    0.5
}

pub fn response_z_cap() -> f64 {
    3.0
}

pub fn spend_change_cap_pct() -> f64 {
    100.0
}

pub fn recency_window() -> usize {
    7
}

pub fn escalation_min_points() -> usize {
    3
}

pub fn escalation_multiplier() -> f64 {
    2.0
}

pub fn escalation_cap() -> f64 {
    10.0
}

pub fn stable_slope() -> f64 {
    1.0
}

pub fn critical_signal_threshold() -> f64 {
    0.6
}

// ============================================================================
// Snapshot Replay
// ============================================================================

pub fn min_history_days() -> usize {
    7
}

pub fn elevated_risk_threshold() -> f64 {
    40.0
}

pub fn high_risk_threshold() -> f64 {
    60.0
}

pub fn trajectory_delta() -> f64 {
    10.0
}

//! Replayed historical risk states

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{RiskSignal, Severity};

/// Risk state reconstructed from a truncated prefix of the series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Days excluded from the end of the series
    pub days_ago: usize,
    /// Last day of the truncated prefix
    pub date: NaiveDate,
    /// Final score of the prefix, rounded to 1 dp
    pub risk_score: f64,
    /// Severity of the unrounded score
    pub severity: Severity,
    /// Highest-valued risk signal on the last day of the prefix
    pub top_driver: RiskSignal,
}

/// Overall movement across a snapshot history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trajectory {
    Improving,
    Stable,
    Deteriorating,
    InsufficientHistory,
}

/// Lead-time metadata derived from a snapshot history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CausalityMarkers {
    /// Most recent snapshot whose score exceeded the elevated threshold
    pub first_risk_detected_days_ago: Option<usize>,
    /// Most recent snapshot whose score exceeded the high threshold
    pub high_risk_reached_days_ago: Option<usize>,
    /// Warning lead time, only when the current state is High
    pub lead_time_days: Option<usize>,
    pub trajectory: Trajectory,
    pub snapshot_count: usize,
}

//! Risk model outputs: anomaly annotations, per-day risk records, severity
//! labels and explainability views.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};

/// Scores at or below this are Low severity
pub const LOW_SEVERITY_MAX: f64 = 30.0;
/// Scores at or below this (and above Low) are Medium severity
pub const MEDIUM_SEVERITY_MAX: f64 = 60.0;

/// Per-day output of the anomaly detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyAnnotation {
    /// Normalized anomaly score (0-1, 1 = most anomalous day in the series)
    pub anomaly_score: f64,
    /// Day falls within the expected outlier fraction
    pub is_anomaly: bool,
}

/// Per-day risk signals and composite score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRecord {
    pub date: NaiveDate,
    /// 1 - execution_health
    pub risk_execution: f64,
    /// Rolling task miss rate
    pub risk_task_quality: f64,
    pub execution_risk_signal: f64,
    pub team_health_risk_signal: f64,
    pub spend_risk_signal: f64,
    pub anomaly_risk_signal: f64,
    pub is_anomaly: bool,
    /// Weighted composite (0-100)
    pub daily_risk_score: f64,
}

impl RiskRecord {
    /// Value of one named risk signal (0-1)
    pub fn signal(&self, signal: RiskSignal) -> f64 {
        match signal {
            RiskSignal::Execution => self.execution_risk_signal,
            RiskSignal::TeamHealth => self.team_health_risk_signal,
            RiskSignal::Anomaly => self.anomaly_risk_signal,
            RiskSignal::Spend => self.spend_risk_signal,
        }
    }
}

/// The four risk signals that make up the daily score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskSignal {
    Execution,
    TeamHealth,
    Anomaly,
    Spend,
}

impl RiskSignal {
    /// Explainability order; ties between equal signals resolve in this order.
    pub const ALL: [Self; 4] = [Self::Execution, Self::TeamHealth, Self::Anomaly, Self::Spend];

    /// Investor-facing name
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Execution => "Execution Velocity",
            Self::TeamHealth => "Team Health",
            Self::Anomaly => "Operational Anomaly",
            Self::Spend => "Burn Rate Stability",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Execution => "Development momentum and task completion rate",
            Self::TeamHealth => "Founder morale and team responsiveness",
            Self::Anomaly => "Statistical deviation from normal patterns",
            Self::Spend => "Compute spend volatility and cost control",
        }
    }
}

impl std::fmt::Display for RiskSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Categorical bucket of a 0-100 risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Map a score to its severity.
    ///
    /// Scores outside 0-100 (or NaN) are a contract violation and fail
    /// instead of being clamped.
    pub fn from_score(score: f64) -> Result<Self> {
        if !(0.0..=100.0).contains(&score) {
            return Err(RiskError::ScoreOutOfRange(score));
        }
        Ok(if score <= LOW_SEVERITY_MAX {
            Self::Low
        } else if score <= MEDIUM_SEVERITY_MAX {
            Self::Medium
        } else {
            Self::High
        })
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "Low"),
            Severity::Medium => write!(f, "Medium"),
            Severity::High => write!(f, "High"),
        }
    }
}

/// Latest-day signal breakdown on a 0-100 scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskComponents {
    pub execution_risk: f64,
    pub team_health_risk: f64,
    pub anomaly_risk: f64,
    pub spend_risk: f64,
    pub is_anomaly_detected: bool,
}

/// One ranked contributor to the latest-day risk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopSignal {
    pub signal: RiskSignal,
    pub signal_name: String,
    /// Signal value scaled to 0-100
    pub risk_level: f64,
    pub severity: Severity,
    pub description: String,
}

/// Direction of the recent daily risk trajectory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Stable,
    Increasing,
    Decreasing,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendDirection::Stable => write!(f, "stable"),
            TrendDirection::Increasing => write!(f, "increasing"),
            TrendDirection::Decreasing => write!(f, "decreasing"),
        }
    }
}

/// Trailing-window view of the daily risk score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskTrend {
    pub trend_direction: TrendDirection,
    /// OLS slope of daily_risk_score (points/day)
    pub trend_slope: f64,
    /// Sample standard deviation over the window
    pub volatility: f64,
    pub min: f64,
    pub max: f64,
    pub current: f64,
    pub days_analyzed: usize,
}

//! Raw operational telemetry: one record per startup per day

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RiskError};

/// Upper bound of the founder morale scale
pub const MAX_MORALE_SCORE: f64 = 10.0;

/// Daily operational metrics reported for a single startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetrics {
    pub date: NaiveDate,
    /// Commits pushed that day
    pub commit_count: u32,
    pub tasks_completed: u32,
    pub tasks_missed: u32,
    /// Mean time to respond to investor/customer requests (hours)
    pub avg_response_time_hours: f64,
    /// Self-reported founder morale (0-10)
    pub founder_morale_score: f64,
    /// Daily compute spend (USD)
    pub compute_spend_usd: f64,
}

impl DailyMetrics {
    /// Check value ranges. `row` is only used for error reporting.
    pub fn validate(&self, row: usize) -> Result<()> {
        check_non_negative(row, "avg_response_time_hours", self.avg_response_time_hours)?;
        check_non_negative(row, "founder_morale_score", self.founder_morale_score)?;
        check_non_negative(row, "compute_spend_usd", self.compute_spend_usd)?;

        if self.founder_morale_score > MAX_MORALE_SCORE {
            return Err(RiskError::InvalidField {
                row,
                field: "founder_morale_score",
                reason: format!(
                    "{} exceeds the 0-{MAX_MORALE_SCORE} morale scale",
                    self.founder_morale_score
                ),
            });
        }
        Ok(())
    }

    /// Total tasks touched that day (completed + missed)
    pub fn total_tasks(&self) -> u64 {
        u64::from(self.tasks_completed) + u64::from(self.tasks_missed)
    }
}

fn check_non_negative(row: usize, field: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(RiskError::InvalidField {
            row,
            field,
            reason: format!("{value} is not a finite number"),
        });
    }
    if value < 0.0 {
        return Err(RiskError::InvalidField {
            row,
            field,
            reason: format!("{value} cannot be negative"),
        });
    }
    Ok(())
}

/// Ordered daily series for one startup.
///
/// Records are expected in strictly ascending date order; ordering and
/// duplicate dates are the caller's responsibility. The series is never
/// empty once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<DailyMetrics>", into = "Vec<DailyMetrics>")]
pub struct OperationalMetricsSeries {
    days: Vec<DailyMetrics>,
}

impl OperationalMetricsSeries {
    /// Build a series, rejecting an empty list or out-of-range values.
    pub fn new(days: Vec<DailyMetrics>) -> Result<Self> {
        if days.is_empty() {
            return Err(RiskError::EmptySeries);
        }
        for (row, day) in days.iter().enumerate() {
            day.validate(row)?;
        }
        Ok(Self { days })
    }

    pub fn days(&self) -> &[DailyMetrics] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Most recent day in the series
    pub fn latest(&self) -> Option<&DailyMetrics> {
        self.days.last()
    }

    /// Copy of the first `keep` days, or `None` if that would be empty.
    pub fn prefix(&self, keep: usize) -> Option<Self> {
        if keep == 0 {
            return None;
        }
        let keep = keep.min(self.days.len());
        Some(Self {
            days: self.days[..keep].to_vec(),
        })
    }

    /// MD5 hex digest of the canonical JSON encoding.
    ///
    /// Scoring is a pure function of the series, so external caches can key
    /// precomputed results on this value.
    pub fn fingerprint(&self) -> Result<String> {
        let bytes = serde_json::to_vec(&self.days)?;
        Ok(format!("{:x}", md5::compute(bytes)))
    }
}

impl TryFrom<Vec<DailyMetrics>> for OperationalMetricsSeries {
    type Error = RiskError;

    fn try_from(days: Vec<DailyMetrics>) -> Result<Self> {
        Self::new(days)
    }
}

impl From<OperationalMetricsSeries> for Vec<DailyMetrics> {
    fn from(series: OperationalMetricsSeries) -> Self {
        series.days
    }
}

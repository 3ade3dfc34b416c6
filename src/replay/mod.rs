//! Snapshot Replayer
//!
//! Reconstructs past risk states by re-running the full chain on truncated
//! prefixes of the series. Each replay starts from scratch, so replaying
//! the same prefix twice gives bit-identical snapshots and historical
//! scores come from exactly the same code path as the live score.
//!
//! ## Lookback offsets (days before the latest day)
//!
//! | Series length | Candidate offsets       |
//! |---------------|-------------------------|
//! | >= 60         | 60, 45, 30, 14, 7, 0    |
//! | >= 45         | 45, 30, 14, 7, 0        |
//! | >= 30         | 30, 14, 7, 0            |
//! | otherwise     | 14, 7, 0                |
//!
//! Offsets at or beyond the series length are dropped, and a prefix shorter
//! than the minimum history is skipped rather than scored.

use tracing::debug;

use crate::config::{ReplayConfig, RiskConfig};
use crate::error::Result;
use crate::pipeline::RiskPipeline;
use crate::risk::top_driver;
use crate::stats::round_dp;
use crate::types::{CausalityMarkers, OperationalMetricsSeries, Severity, Snapshot, Trajectory};

/// Candidate lookback offsets for a series of `len` days, oldest first.
pub fn snapshot_windows(len: usize) -> Vec<usize> {
    let candidates: &[usize] = if len >= 60 {
        &[60, 45, 30, 14, 7, 0]
    } else if len >= 45 {
        &[45, 30, 14, 7, 0]
    } else if len >= 30 {
        &[30, 14, 7, 0]
    } else {
        &[14, 7, 0]
    };
    candidates
        .iter()
        .copied()
        .filter(|&offset| offset == 0 || offset < len)
        .collect()
}

/// Replay the pipeline at each lookback offset.
///
/// Snapshots come back oldest first (descending `days_ago`). Offsets whose
/// prefix has fewer than `min_history_days` days are left out.
pub fn replay_snapshots(series: &OperationalMetricsSeries, config: &RiskConfig) -> Result<Vec<Snapshot>> {
    let pipeline = RiskPipeline::new(config.clone());
    let min_history = config.replay.min_history_days;
    let mut snapshots = Vec::new();

    for offset in snapshot_windows(series.len()) {
        let keep = series.len().saturating_sub(offset);
        if keep < min_history {
            debug!(offset, keep, min_history, "Skipping replay window with short history");
            continue;
        }
        let Some(prefix) = series.prefix(keep) else {
            continue;
        };

        let (risk_score, records) = pipeline.score(&prefix)?;
        let Some(last) = records.last() else {
            continue;
        };
        snapshots.push(Snapshot {
            days_ago: offset,
            date: last.date,
            risk_score: round_dp(risk_score, 1),
            severity: Severity::from_score(risk_score)?,
            top_driver: top_driver(last),
        });
    }

    debug!(
        series_days = series.len(),
        snapshots = snapshots.len(),
        "Snapshot replay complete"
    );
    Ok(snapshots)
}

/// Lead-time markers over an oldest-first snapshot history.
///
/// Markers report the most recent (smallest `days_ago`) snapshot above each
/// threshold. Returns `None` for an empty history.
pub fn causality_markers(
    snapshots: &[Snapshot],
    current_severity: Severity,
    config: &ReplayConfig,
) -> Option<CausalityMarkers> {
    let first = snapshots.first()?;
    let last = snapshots.last()?;

    let latest_above = |threshold: f64| {
        snapshots
            .iter()
            .rev()
            .find(|s| s.risk_score > threshold)
            .map(|s| s.days_ago)
    };
    let first_risk_detected_days_ago = latest_above(config.elevated_risk_threshold);
    let high_risk_reached_days_ago = latest_above(config.high_risk_threshold);

    let lead_time_days = if current_severity == Severity::High {
        first_risk_detected_days_ago
    } else {
        None
    };

    let trajectory = if snapshots.len() < 3 {
        Trajectory::InsufficientHistory
    } else if last.risk_score > first.risk_score + config.trajectory_delta {
        Trajectory::Deteriorating
    } else if last.risk_score < first.risk_score - config.trajectory_delta {
        Trajectory::Improving
    } else {
        Trajectory::Stable
    };

    Some(CausalityMarkers {
        first_risk_detected_days_ago,
        high_risk_reached_days_ago,
        lead_time_days,
        trajectory,
        snapshot_count: snapshots.len(),
    })
}

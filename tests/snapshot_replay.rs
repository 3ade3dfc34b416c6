//! Snapshot Replay Tests
//!
//! Checks replay coverage per series length, ordering, and that every
//! snapshot is exactly the live score of its truncated prefix.

use chrono::{Duration, NaiveDate};

use portfolio_risk::config::{ReplayConfig, RiskConfig};
use portfolio_risk::replay::{causality_markers, replay_snapshots, snapshot_windows};
use portfolio_risk::stats::round_dp;
use portfolio_risk::{DailyMetrics, OperationalMetricsSeries, RiskPipeline, Severity};

fn series(n: usize) -> OperationalMetricsSeries {
    let start = NaiveDate::from_ymd_opt(2024, 11, 1).unwrap();
    let days = (0..n)
        .map(|i| {
            let wave = (i as f64 * 0.7).sin();
            let decay = i as f64 / n as f64;
            DailyMetrics {
                date: start + Duration::days(i as i64),
                commit_count: (12.0 + 4.0 * wave - 8.0 * decay).max(0.0) as u32,
                tasks_completed: 6 + (i % 3) as u32,
                tasks_missed: (i % 4) as u32 + (4.0 * decay) as u32,
                avg_response_time_hours: 3.0 + wave + 5.0 * decay,
                founder_morale_score: (8.0 - 5.0 * decay + 0.5 * wave).clamp(0.0, 10.0),
                compute_spend_usd: 200.0 + 40.0 * wave + 150.0 * decay,
            }
        })
        .collect();
    OperationalMetricsSeries::new(days).unwrap()
}

fn offsets(n: usize) -> Vec<usize> {
    replay_snapshots(&series(n), &RiskConfig::default())
        .unwrap()
        .iter()
        .map(|s| s.days_ago)
        .collect()
}

#[test]
fn sixty_days_drop_the_sixty_day_offset() {
    // A 60-day lookback would leave no days, so it is not a candidate
    assert_eq!(offsets(60), vec![45, 30, 14, 7, 0]);
}

#[test]
fn sixty_seven_days_cover_all_six_offsets() {
    assert_eq!(offsets(67), vec![60, 45, 30, 14, 7, 0]);
}

#[test]
fn sixty_six_days_skip_short_oldest_prefix() {
    // Offset 60 leaves 6 days, below the 7-day minimum
    assert_eq!(offsets(66), vec![45, 30, 14, 7, 0]);
}

#[test]
fn short_series_coverage() {
    assert_eq!(offsets(20), vec![7, 0]);
    assert_eq!(offsets(21), vec![14, 7, 0]);
    assert_eq!(offsets(7), vec![0]);
    assert!(offsets(6).is_empty());
}

#[test]
fn candidate_windows_match_length_tiers() {
    assert_eq!(snapshot_windows(100), vec![60, 45, 30, 14, 7, 0]);
    assert_eq!(snapshot_windows(45), vec![30, 14, 7, 0]);
    assert_eq!(snapshot_windows(44), vec![30, 14, 7, 0]);
    assert_eq!(snapshot_windows(29), vec![14, 7, 0]);
}

#[test]
fn snapshots_match_prefix_scores() {
    let full = series(50);
    let config = RiskConfig::default();
    let pipeline = RiskPipeline::new(config.clone());
    let snapshots = replay_snapshots(&full, &config).unwrap();

    assert!(snapshots.windows(2).all(|w| w[0].days_ago > w[1].days_ago));
    assert!(snapshots.windows(2).all(|w| w[0].date < w[1].date));

    for snap in &snapshots {
        let prefix = full.prefix(full.len() - snap.days_ago).unwrap();
        let (score, records) = pipeline.score(&prefix).unwrap();
        assert_eq!(snap.risk_score, round_dp(score, 1));
        assert_eq!(snap.date, records.last().unwrap().date);
        assert_eq!(snap.severity, Severity::from_score(score).unwrap());
        assert_eq!(snap.date, full.days()[full.len() - 1 - snap.days_ago].date);
    }
}

#[test]
fn replay_is_deterministic() {
    let full = series(70);
    let a = replay_snapshots(&full, &RiskConfig::default()).unwrap();
    let b = replay_snapshots(&full, &RiskConfig::default()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn causality_summarizes_history() {
    let full = series(67);
    let snapshots = replay_snapshots(&full, &RiskConfig::default()).unwrap();
    let current = snapshots.last().unwrap().severity;
    let markers = causality_markers(&snapshots, current, &ReplayConfig::default()).unwrap();
    assert_eq!(markers.snapshot_count, 6);
    if let Some(first) = markers.first_risk_detected_days_ago {
        let crossing = snapshots.iter().find(|s| s.days_ago == first).unwrap();
        assert!(crossing.risk_score > 40.0);
        assert!(snapshots
            .iter()
            .filter(|s| s.days_ago < first)
            .all(|s| s.risk_score <= 40.0));
    } else {
        assert!(snapshots.iter().all(|s| s.risk_score <= 40.0));
    }
    if current != Severity::High {
        assert!(markers.lead_time_days.is_none());
    }
}

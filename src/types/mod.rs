//! Shared data structures for portfolio risk intelligence
//!
//! This module defines the core types flowing through the scoring pipeline:
//! - Input: DailyMetrics / OperationalMetricsSeries (raw daily telemetry)
//! - Feature Engineer: FeatureRecord, FeatureSummary
//! - Anomaly Detector: AnomalyAnnotation
//! - Risk Composer: RiskRecord, RiskSignal, Severity and explainability views
//! - Snapshot Replayer: Snapshot, CausalityMarkers

mod metrics;
mod features;
mod risk;
mod snapshot;

pub use metrics::*;
pub use features::*;
pub use risk::*;
pub use snapshot::*;

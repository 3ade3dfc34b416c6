//! Portfolio Risk: Startup Operational Risk Intelligence
//!
//! Turns daily operational telemetry for a startup (commits, task
//! completion, founder morale, response latency, compute spend) into a
//! 0-100 risk score with an explainable breakdown.
//!
//! ## Architecture
//!
//! - **Feature Engineer** (`features`): rolling velocity, miss rate, morale
//!   trend, normalized delay, spend dynamics, composite execution health
//! - **Anomaly Detector** (`anomaly`): per-series isolation forest over the
//!   engineered signals
//! - **Risk Composer** (`risk`): weighted per-day score, recency-weighted
//!   and trend-escalated final score, explainability views
//! - **Snapshot Replayer** (`replay`): the same chain re-run on truncated
//!   prefixes to reconstruct past risk states
//!
//! `pipeline::RiskPipeline` runs the whole chain; `ingest` loads series from
//! JSON or CSV.

pub mod anomaly;
pub mod config;
pub mod error;
pub mod features;
pub mod ingest;
pub mod pipeline;
pub mod replay;
pub mod risk;
pub mod stats;
pub mod types;

// Re-export configuration
pub use config::RiskConfig;

// Re-export errors
pub use error::{Result, RiskError};

// Re-export commonly used types
pub use types::{
    AnomalyAnnotation, CausalityMarkers, DailyMetrics, FeatureRecord, FeatureSummary, OperationalMetricsSeries,
    RiskComponents, RiskRecord, RiskSignal, RiskTrend, Severity, Snapshot, TopSignal, Trajectory, TrendDirection,
};

// Re-export pipeline entry points
pub use pipeline::{score_portfolio, PortfolioEntry, PortfolioScore, RiskAssessment, RiskPipeline};

//! Error taxonomy for the risk-scoring core
//!
//! Input validation failures and internal numeric failures are surfaced as
//! `RiskError`. Defined numeric fallbacks (zero variance, division by zero,
//! short history) are not errors and never reach this type, and neither is
//! a replay window that is too short to score.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RiskError {
    #[error("Operational metrics series is empty")]
    EmptySeries,

    #[error("Missing required field '{field}' in record {row}")]
    MissingField { row: usize, field: &'static str },

    #[error("Invalid value for field '{field}' in record {row}: {reason}")]
    InvalidField {
        row: usize,
        field: &'static str,
        reason: String,
    },

    #[error("Feature/annotation length mismatch: {features} feature records, {annotations} annotations")]
    LengthMismatch { features: usize, annotations: usize },

    #[error("Risk score must be within 0-100, got {0}")]
    ScoreOutOfRange(f64),

    #[error("Anomaly model fit failed: {0}")]
    AnomalyFit(String),

    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RiskError>;

//! Risk Configuration Module
//!
//! Provides model configuration loaded from TOML files, exposing every
//! weight, window and threshold of the scoring pipeline as an
//! operator-tunable value.
//!
//! ## Loading Order
//!
//! 1. `PORTFOLIO_RISK_CONFIG` environment variable (path to TOML file)
//! 2. `risk_config.toml` in the current working directory
//! 3. Built-in defaults (the reference model constants)
//!
//! ## Usage
//!
//! Library entry points take a `&RiskConfig` explicitly. Binaries may also
//! install a process-wide copy:
//!
//! ```ignore
//! // In main():
//! config::init(RiskConfig::load());
//!
//! // Anywhere in the binary:
//! let pipeline = RiskPipeline::new(config::get().clone());
//! ```

mod risk_config;
pub mod defaults;
pub mod validation;

pub use risk_config::*;

use std::sync::OnceLock;

/// Global risk configuration, initialized once at startup.
static RISK_CONFIG: OnceLock<RiskConfig> = OnceLock::new();

/// Initialize the global risk configuration.
///
/// Later calls are ignored with a warning.
pub fn init(config: RiskConfig) {
    if RISK_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// Get the global risk configuration, or the built-in defaults if `init()`
/// was never called.
pub fn get() -> &'static RiskConfig {
    RISK_CONFIG.get_or_init(RiskConfig::default)
}

//! Risk Configuration - model weights and windows as operator-tunable TOML values
//!
//! Each struct implements `Default` with the reference model constants, so
//! scoring without a config file reproduces the reference behaviour exactly.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "PORTFOLIO_RISK_CONFIG";

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "risk_config.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for the risk-scoring pipeline.
///
/// Load with `RiskConfig::load()` which searches:
/// 1. `$PORTFOLIO_RISK_CONFIG` env var
/// 2. `./risk_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Feature engineering windows and execution-health blend
    #[serde(default)]
    pub features: FeatureConfig,

    /// Isolation forest parameters
    #[serde(default)]
    pub anomaly: AnomalyConfig,

    /// Signal weights and final-score adjustments
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Snapshot replay and causality thresholds
    #[serde(default)]
    pub replay: ReplayConfig,
}

impl RiskConfig {
    /// Load configuration using the standard search order.
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded risk config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        // 2. Check ./risk_config.toml
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded risk config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        // 3. Defaults
        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::ParseStr(e) => ConfigError::Parse(path.to_path_buf(), e),
            other => other,
        })
    }

    /// Parse and validate a TOML document. Unknown keys only warn.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents).map_err(ConfigError::ParseStr)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate weights, windows and model parameters for internal consistency.
    ///
    /// Rules:
    /// - Every weight blend must sum to approximately 1.0
    /// - Windows and estimator counts must be positive
    /// - Contamination must lie in (0, 0.5]
    /// - All values must be finite
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let f = &self.features;
        if f.window_days == 0 {
            errors.push("features.window_days must be > 0".to_string());
        }
        if f.morale_trend_min_points < 2 {
            errors.push("features.morale_trend_min_points must be >= 2".to_string());
        }
        if f.morale_volatility_min_points < 2 {
            errors.push("features.morale_volatility_min_points must be >= 2".to_string());
        }
        Self::check_blend(
            &[f.commit_weight, f.task_weight, f.morale_weight],
            "features.{commit,task,morale}_weight",
            &mut errors,
        );

        let a = &self.anomaly;
        if a.n_estimators == 0 {
            errors.push("anomaly.n_estimators must be > 0".to_string());
        }
        if !(a.contamination > 0.0 && a.contamination <= 0.5) {
            errors.push(format!(
                "anomaly.contamination must be in (0, 0.5], got {}",
                a.contamination
            ));
        }
        if a.max_samples == Some(0) {
            errors.push("anomaly.max_samples must be > 0 when set".to_string());
        }

        let s = &self.scoring;
        Self::check_blend(
            &[
                s.execution_weight,
                s.team_health_weight,
                s.anomaly_weight,
                s.spend_weight,
            ],
            "scoring signal weights",
            &mut errors,
        );
        Self::check_blend(
            &[s.execution_health_weight, s.task_quality_weight],
            "scoring.{execution_health,task_quality}_weight",
            &mut errors,
        );
        Self::check_blend(
            &[s.morale_trend_weight, s.response_weight],
            "scoring.{morale_trend,response}_weight",
            &mut errors,
        );
        if s.recency_window == 0 {
            errors.push("scoring.recency_window must be > 0".to_string());
        }
        if s.response_z_cap <= 0.0 {
            errors.push("scoring.response_z_cap must be > 0".to_string());
        }
        if s.spend_change_cap_pct <= 0.0 {
            errors.push("scoring.spend_change_cap_pct must be > 0".to_string());
        }
        if s.escalation_cap < 0.0 {
            errors.push("scoring.escalation_cap cannot be negative".to_string());
        }

        let r = &self.replay;
        if r.min_history_days == 0 {
            errors.push("replay.min_history_days must be > 0".to_string());
        }
        if r.high_risk_threshold < r.elevated_risk_threshold {
            errors.push(format!(
                "replay.high_risk_threshold ({:.1}) must be >= elevated_risk_threshold ({:.1})",
                r.high_risk_threshold, r.elevated_risk_threshold
            ));
        }

        // Reject NaN/Inf in any config value (sweep all f64 fields via serialization)
        if let Ok(s) = toml::to_string(self) {
            if s.contains("nan") || s.contains("inf") {
                errors.push("Config contains NaN or Inf values; all parameters must be finite numbers".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_blend(weights: &[f64], name: &str, errors: &mut Vec<String>) {
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            errors.push(format!("{name}: weights must be finite and non-negative"));
            return;
        }
        let sum: f64 = weights.iter().sum();
        if !(0.99..=1.01).contains(&sum) {
            errors.push(format!("{name} must sum to ~1.0, got {sum:.3}"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    ParseStr(toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::ParseStr(e) => write!(f, "Config parse error: {}", e),
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Feature Engineering
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Trailing window for rolling statistics (days)
    #[serde(default = "defaults::window_days")]
    pub window_days: usize,
    /// Minimum observations before the morale slope is defined
    #[serde(default = "defaults::morale_min_points")]
    pub morale_trend_min_points: usize,
    /// Minimum observations before morale volatility is defined
    #[serde(default = "defaults::morale_min_points")]
    pub morale_volatility_min_points: usize,
    /// Execution health: weight of relative commit velocity
    #[serde(default = "defaults::commit_weight")]
    pub commit_weight: f64,
    /// Execution health: weight of task completion (1 - miss rate)
    #[serde(default = "defaults::task_weight")]
    pub task_weight: f64,
    /// Execution health: weight of founder morale
    #[serde(default = "defaults::morale_weight")]
    pub morale_weight: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            window_days: defaults::window_days(),
            morale_trend_min_points: defaults::morale_min_points(),
            morale_volatility_min_points: defaults::morale_min_points(),
            commit_weight: defaults::commit_weight(),
            task_weight: defaults::task_weight(),
            morale_weight: defaults::morale_weight(),
        }
    }
}

// ============================================================================
// Anomaly Detection
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyConfig {
    /// Number of isolation trees
    #[serde(default = "defaults::n_estimators")]
    pub n_estimators: usize,
    /// Subsample size per tree; `None` means min(256, series length)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_samples: Option<usize>,
    /// Expected fraction of anomalous days
    #[serde(default = "defaults::contamination")]
    pub contamination: f64,
    /// RNG seed for tree construction
    #[serde(default = "defaults::seed")]
    pub seed: u64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            n_estimators: defaults::n_estimators(),
            max_samples: None,
            contamination: defaults::contamination(),
            seed: defaults::seed(),
        }
    }
}

// ============================================================================
// Risk Scoring
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "defaults::execution_weight")]
    pub execution_weight: f64,
    #[serde(default = "defaults::team_health_weight")]
    pub team_health_weight: f64,
    #[serde(default = "defaults::anomaly_weight")]
    pub anomaly_weight: f64,
    #[serde(default = "defaults::spend_weight")]
    pub spend_weight: f64,

    /// Execution signal: weight of (1 - execution_health)
    #[serde(default = "defaults::execution_health_weight")]
    pub execution_health_weight: f64,
    /// Execution signal: weight of rolling task miss rate
    #[serde(default = "defaults::task_quality_weight")]
    pub task_quality_weight: f64,

    /// Team health signal: weight of declining morale
    #[serde(default = "defaults::morale_trend_weight")]
    pub morale_trend_weight: f64,
    /// Team health signal: weight of slow responses
    #[serde(default = "defaults::response_weight")]
    pub response_weight: f64,
    /// Risk per point/day of morale decline
    #[serde(default = "defaults::morale_trend_scale")]
    pub morale_trend_scale: f64,
    /// Response z-score that saturates the response component
    #[serde(default = "defaults::response_z_cap")]
    pub response_z_cap: f64,
    /// Absolute spend change (%) that saturates the spend signal
    #[serde(default = "defaults::spend_change_cap_pct")]
    pub spend_change_cap_pct: f64,

    /// Trailing days collapsed into the final score
    #[serde(default = "defaults::recency_window")]
    pub recency_window: usize,
    /// Minimum trailing days before the trend escalation applies
    #[serde(default = "defaults::escalation_min_points")]
    pub escalation_min_points: usize,
    /// Escalation points per point/day of rising daily risk
    #[serde(default = "defaults::escalation_multiplier")]
    pub escalation_multiplier: f64,
    /// Maximum escalation points
    #[serde(default = "defaults::escalation_cap")]
    pub escalation_cap: f64,

    /// |slope| below this is a stable trend
    #[serde(default = "defaults::stable_slope")]
    pub stable_slope: f64,
    /// Signals above this (0-1) are reported as critical
    #[serde(default = "defaults::critical_signal_threshold")]
    pub critical_signal_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            execution_weight: defaults::execution_weight(),
            team_health_weight: defaults::team_health_weight(),
            anomaly_weight: defaults::anomaly_weight(),
            spend_weight: defaults::spend_weight(),
            execution_health_weight: defaults::execution_health_weight(),
            task_quality_weight: defaults::task_quality_weight(),
            morale_trend_weight: defaults::morale_trend_weight(),
            response_weight: defaults::response_weight(),
            morale_trend_scale: defaults::morale_trend_scale(),
            response_z_cap: defaults::response_z_cap(),
            spend_change_cap_pct: defaults::spend_change_cap_pct(),
            recency_window: defaults::recency_window(),
            escalation_min_points: defaults::escalation_min_points(),
            escalation_multiplier: defaults::escalation_multiplier(),
            escalation_cap: defaults::escalation_cap(),
            stable_slope: defaults::stable_slope(),
            critical_signal_threshold: defaults::critical_signal_threshold(),
        }
    }
}

// ============================================================================
// Snapshot Replay
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayConfig {
    /// Truncations with fewer remaining days are not scored
    #[serde(default = "defaults::min_history_days")]
    pub min_history_days: usize,
    /// Score above which risk counts as first detected
    #[serde(default = "defaults::elevated_risk_threshold")]
    pub elevated_risk_threshold: f64,
    /// Score above which risk counts as high
    #[serde(default = "defaults::high_risk_threshold")]
    pub high_risk_threshold: f64,
    /// Score change between oldest and newest snapshot that counts as movement
    #[serde(default = "defaults::trajectory_delta")]
    pub trajectory_delta: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            min_history_days: defaults::min_history_days(),
            elevated_risk_threshold: defaults::elevated_risk_threshold(),
            high_risk_threshold: defaults::high_risk_threshold(),
            trajectory_delta: defaults::trajectory_delta(),
        }
    }
}


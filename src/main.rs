//! portfolio-risk CLI
//!
//! Scores startup telemetry files from the command line.
//!
//! ```text
//! portfolio-risk score metrics.csv              # full assessment as JSON
//! portfolio-risk score metrics.json --format text
//! portfolio-risk snapshots metrics.csv          # replayed history + causality
//! portfolio-risk portfolio a.csv b.csv c.json   # ranked batch, scored in parallel
//! ```
//!
//! Logs go to stderr (`RUST_LOG`, default `info`); results go to stdout.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use portfolio_risk::config::{self, RiskConfig};
use portfolio_risk::ingest::load_series;
use portfolio_risk::pipeline::{rank_portfolio, score_portfolio, PortfolioEntry, PortfolioScore};
use portfolio_risk::replay::{causality_markers, replay_snapshots};
use portfolio_risk::{CausalityMarkers, RiskAssessment, RiskPipeline, Severity, Snapshot};

#[derive(Parser, Debug)]
#[command(name = "portfolio-risk")]
#[command(about = "Startup operational risk scoring")]
#[command(version)]
struct CliArgs {
    /// Path to a risk_config.toml (overrides PORTFOLIO_RISK_CONFIG and ./risk_config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Score one series and print the full assessment
    Score {
        /// Series file (.json or .csv)
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Replay historical snapshots for one series
    Snapshots {
        /// Series file (.json or .csv)
        file: PathBuf,
    },
    /// Score several series in parallel, highest risk first
    Portfolio {
        /// Series files (.json or .csv)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Serialize)]
struct SnapshotReport {
    snapshots: Vec<Snapshot>,
    causality: Option<CausalityMarkers>,
}

#[derive(Serialize)]
struct PortfolioRow {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    risk_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    severity: Option<Severity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&Path>) -> Result<RiskConfig> {
    match path {
        Some(path) => RiskConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(RiskConfig::load()),
    }
}

fn entry_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_text(name: &str, assessment: &RiskAssessment) {
    println!("{name}: {:.1} ({})", assessment.risk_score, assessment.severity);
    if let Some(trend) = &assessment.trend {
        println!(
            "  trend: {} ({:+.2}/day over {} days)",
            trend.trend_direction, trend.trend_slope, trend.days_analyzed
        );
    }
    for signal in &assessment.top_signals {
        println!("  {:<22} {:>5.1}  {}", signal.signal_name, signal.risk_level, signal.severity);
    }
    if !assessment.critical_signals.is_empty() {
        println!("  critical: {}", assessment.critical_signals.join(", "));
    }
    for snapshot in &assessment.snapshots {
        println!(
            "  {:>2} days ago ({}): {:.1} {} [{}]",
            snapshot.days_ago, snapshot.date, snapshot.risk_score, snapshot.severity, snapshot.top_driver
        );
    }
}

fn run_score(pipeline: &RiskPipeline, file: &Path, format: OutputFormat) -> Result<()> {
    let series = load_series(file).with_context(|| format!("Failed to load {}", file.display()))?;
    let assessment = pipeline
        .assess(&series)
        .with_context(|| format!("Failed to score {}", file.display()))?;
    match format {
        OutputFormat::Json => print_json(&assessment),
        OutputFormat::Text => {
            print_text(&entry_name(file), &assessment);
            Ok(())
        }
    }
}

fn run_snapshots(pipeline: &RiskPipeline, file: &Path) -> Result<()> {
    let series = load_series(file).with_context(|| format!("Failed to load {}", file.display()))?;
    let config = pipeline.config();
    let snapshots = replay_snapshots(&series, config)?;
    let causality = match snapshots.last() {
        Some(latest) => causality_markers(&snapshots, latest.severity, &config.replay),
        None => {
            warn!(days = series.len(), "Series too short for any replay window");
            None
        }
    };
    print_json(&SnapshotReport { snapshots, causality })
}

fn run_portfolio(pipeline: &RiskPipeline, files: &[PathBuf]) -> Result<()> {
    let mut entries = Vec::new();
    let mut failed = Vec::new();
    for file in files {
        let name = entry_name(file);
        match load_series(file) {
            Ok(series) => entries.push(PortfolioEntry { name, series }),
            Err(e) => {
                warn!(file = %file.display(), error = %e, "Skipping unreadable series");
                failed.push(PortfolioScore { name, outcome: Err(e) });
            }
        }
    }

    let mut scores = score_portfolio(pipeline, entries);
    scores.extend(failed);
    rank_portfolio(&mut scores);

    let rows: Vec<PortfolioRow> = scores
        .into_iter()
        .map(|s| match s.outcome {
            Ok(a) => PortfolioRow {
                name: s.name,
                risk_score: Some(a.risk_score),
                severity: Some(a.severity),
                error: None,
            },
            Err(e) => PortfolioRow {
                name: s.name,
                risk_score: None,
                severity: None,
                error: Some(e.to_string()),
            },
        })
        .collect();
    print_json(&rows)
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.log_json);

    config::init(load_config(args.config.as_deref())?);
    let pipeline = RiskPipeline::new(config::get().clone());
    info!(seed = pipeline.config().anomaly.seed, "Risk pipeline ready");

    match &args.command {
        SubCommand::Score { file, format } => run_score(&pipeline, file, *format),
        SubCommand::Snapshots { file } => run_snapshots(&pipeline, file),
        SubCommand::Portfolio { files } => run_portfolio(&pipeline, files),
    }
}

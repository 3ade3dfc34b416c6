//! Series Ingestion
//!
//! Loads a startup's daily telemetry from JSON or CSV into a validated
//! `OperationalMetricsSeries`.
//!
//! ## Accepted Formats
//!
//! - JSON: an array of objects keyed by field name
//! - CSV: a header row naming the columns (any order, extra columns ignored),
//!   quote-aware with `""` escapes
//!
//! Every record must carry the seven fields below; the first absent one (in
//! this order) is reported by name. Records are sorted by date and duplicate
//! dates are rejected, so the series handed to the pipeline is strictly
//! ascending.

use std::collections::HashMap;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::error::{Result, RiskError};
use crate::types::{DailyMetrics, OperationalMetricsSeries};

/// Required input fields, in validation order.
pub const REQUIRED_FIELDS: [&str; 7] = [
    "date",
    "commit_count",
    "tasks_completed",
    "tasks_missed",
    "avg_response_time_hours",
    "founder_morale_score",
    "compute_spend_usd",
];

/// One input record as text cells keyed by field name.
type RawRecord = HashMap<String, String>;

/// Load a series, choosing the parser from the file extension.
pub fn load_series(path: impl AsRef<Path>) -> Result<OperationalMetricsSeries> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let series = match extension.as_str() {
        "json" => parse_json_series(&std::fs::read_to_string(path)?)?,
        "csv" => parse_csv_series(&std::fs::read_to_string(path)?)?,
        other => {
            return Err(RiskError::UnsupportedFormat(if other.is_empty() {
                path.display().to_string()
            } else {
                format!(".{other}")
            }))
        }
    };

    debug!(path = %path.display(), days = series.len(), "Loaded series");
    Ok(series)
}

// ============================================================================
// JSON
// ============================================================================

/// Parse a JSON array of daily records.
pub fn parse_json_series(contents: &str) -> Result<OperationalMetricsSeries> {
    let value: serde_json::Value = serde_json::from_str(contents)?;
    let Some(items) = value.as_array() else {
        return Err(RiskError::InvalidField {
            row: 0,
            field: "date",
            reason: "expected a JSON array of records".to_string(),
        });
    };

    let mut raw = Vec::with_capacity(items.len());
    for (row, item) in items.iter().enumerate() {
        let Some(object) = item.as_object() else {
            return Err(RiskError::InvalidField {
                row,
                field: "date",
                reason: "record is not a JSON object".to_string(),
            });
        };
        let record: RawRecord = object
            .iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    serde_json::Value::Null => return None,
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Some((key.clone(), text))
            })
            .collect();
        raw.push(record);
    }
    build_series(&raw)
}

// ============================================================================
// CSV
// ============================================================================

/// Split one CSV line, honouring double quotes and `""` escapes.
fn csv_split(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

/// Parse CSV text with a header row.
pub fn parse_csv_series(contents: &str) -> Result<OperationalMetricsSeries> {
    let mut lines = contents
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty());

    let header: Vec<String> = match lines.next() {
        Some(line) => csv_split(line)
            .into_iter()
            .map(|c| c.trim().trim_start_matches('\u{feff}').to_string())
            .collect(),
        None => return Err(RiskError::EmptySeries),
    };

    let raw: Vec<RawRecord> = lines
        .map(|line| {
            header
                .iter()
                .cloned()
                .zip(csv_split(line))
                .filter(|(_, cell)| !cell.trim().is_empty())
                .collect()
        })
        .collect();
    build_series(&raw)
}

// ============================================================================
// Field parsing
// ============================================================================

fn build_series(raw: &[RawRecord]) -> Result<OperationalMetricsSeries> {
    if raw.is_empty() {
        return Err(RiskError::EmptySeries);
    }

    let mut days = raw
        .iter()
        .enumerate()
        .map(|(row, record)| parse_record(row, record).map(|day| (row, day)))
        .collect::<Result<Vec<_>>>()?;

    days.sort_by_key(|(_, day)| day.date);
    if let Some(pair) = days.windows(2).find(|w| w[0].1.date == w[1].1.date) {
        return Err(RiskError::InvalidField {
            row: pair[1].0,
            field: "date",
            reason: format!("duplicate date {}", pair[1].1.date),
        });
    }

    OperationalMetricsSeries::new(days.into_iter().map(|(_, day)| day).collect())
}

fn cell<'a>(record: &'a RawRecord, row: usize, field: &'static str) -> Result<&'a str> {
    record
        .get(field)
        .map(|s| s.trim())
        .ok_or(RiskError::MissingField { row, field })
}

fn parse_record(row: usize, record: &RawRecord) -> Result<DailyMetrics> {
    // Fail on the first absent field in declaration order
    for field in REQUIRED_FIELDS {
        cell(record, row, field)?;
    }
    let get = |field| cell(record, row, field);

    Ok(DailyMetrics {
        date: parse_date(row, get("date")?)?,
        commit_count: parse_count(row, "commit_count", get("commit_count")?)?,
        tasks_completed: parse_count(row, "tasks_completed", get("tasks_completed")?)?,
        tasks_missed: parse_count(row, "tasks_missed", get("tasks_missed")?)?,
        avg_response_time_hours: parse_float(row, "avg_response_time_hours", get("avg_response_time_hours")?)?,
        founder_morale_score: parse_float(row, "founder_morale_score", get("founder_morale_score")?)?,
        compute_spend_usd: parse_float(row, "compute_spend_usd", get("compute_spend_usd")?)?,
    })
}

fn invalid(row: usize, field: &'static str, reason: String) -> RiskError {
    RiskError::InvalidField { row, field, reason }
}

/// Calendar date, or the date part of an ISO-style timestamp.
fn parse_date(row: usize, text: &str) -> Result<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(date);
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.date())
        .ok_or_else(|| invalid(row, "date", format!("'{text}' is not a YYYY-MM-DD date")))
}

/// Non-negative integer count. Integral floats such as `12.0` are accepted.
fn parse_count(row: usize, field: &'static str, text: &str) -> Result<u32> {
    if let Ok(n) = text.parse::<u32>() {
        return Ok(n);
    }
    let value: f64 = text
        .parse()
        .map_err(|_| invalid(row, field, format!("'{text}' is not a number")))?;
    if value < 0.0 {
        return Err(invalid(row, field, format!("{value} cannot be negative")));
    }
    if value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return Err(invalid(row, field, format!("{value} is not a whole count")));
    }
    Ok(value as u32)
}

fn parse_float(row: usize, field: &'static str, text: &str) -> Result<f64> {
    text.parse::<f64>()
        .map_err(|_| invalid(row, field, format!("'{text}' is not a number")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "date,commit_count,tasks_completed,tasks_missed,avg_response_time_hours,founder_morale_score,compute_spend_usd";

    #[test]
    fn csv_split_handles_quotes() {
        assert_eq!(csv_split(r#"a,"b,c",d"#), vec!["a", "b,c", "d"]);
        assert_eq!(csv_split(r#""say ""hi""",x"#), vec![r#"say "hi""#, "x"]);
        assert_eq!(csv_split("a,,b"), vec!["a", "", "b"]);
    }

    #[test]
    fn csv_parses_and_sorts_by_date() {
        let csv = format!(
            "{HEADER}\n2025-01-02,4,3,1,2.5,7.0,110.0\n2025-01-01,5,4,0,2.0,7.5,100.0\n"
        );
        let series = parse_csv_series(&csv).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.days()[0].commit_count, 5);
        assert_eq!(series.latest().unwrap().tasks_missed, 1);
    }

    #[test]
    fn csv_columns_can_be_reordered() {
        let csv = "compute_spend_usd,founder_morale_score,avg_response_time_hours,tasks_missed,tasks_completed,commit_count,date,notes\n\
                   99.5,6,1.5,2,3,7,2025-03-10,\"late, but fine\"\n";
        let series = parse_csv_series(csv).unwrap();
        let day = &series.days()[0];
        assert_eq!(day.commit_count, 7);
        assert_eq!(day.compute_spend_usd, 99.5);
    }

    #[test]
    fn missing_column_names_first_field() {
        let csv = "date,commit_count,tasks_completed,avg_response_time_hours,compute_spend_usd\n2025-01-01,1,1,1.0,1.0\n";
        let err = parse_csv_series(csv).unwrap_err();
        assert!(matches!(err, RiskError::MissingField { row: 0, field: "tasks_missed" }));
    }

    #[test]
    fn empty_cell_is_missing() {
        let csv = format!("{HEADER}\n2025-01-01,5,4,0,2.0,7.5,100.0\n2025-01-02,5,4,0,,7.5,100.0\n");
        let err = parse_csv_series(&csv).unwrap_err();
        assert!(matches!(
            err,
            RiskError::MissingField {
                row: 1,
                field: "avg_response_time_hours"
            }
        ));
    }

    #[test]
    fn json_records_parse() {
        let json = r#"[
            {"date": "2025-02-01", "commit_count": 6, "tasks_completed": 5, "tasks_missed": 1,
             "avg_response_time_hours": 3.5, "founder_morale_score": 8, "compute_spend_usd": 210.0},
            {"date": "2025-02-02T00:00:00", "commit_count": 4.0, "tasks_completed": 5, "tasks_missed": 0,
             "avg_response_time_hours": 3.0, "founder_morale_score": 7.5, "compute_spend_usd": 190.0}
        ]"#;
        let series = parse_json_series(json).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.days()[1].commit_count, 4);
        assert_eq!(series.days()[1].date, NaiveDate::from_ymd_opt(2025, 2, 2).unwrap());
    }

    #[test]
    fn json_null_counts_as_missing() {
        let json = r#"[{"date": "2025-02-01", "commit_count": null}]"#;
        assert!(matches!(
            parse_json_series(json),
            Err(RiskError::MissingField { row: 0, field: "commit_count" })
        ));
    }

    #[test]
    fn bad_values_are_invalid() {
        let negative = format!("{HEADER}\n2025-01-01,-3,4,0,2.0,7.5,100.0\n");
        assert!(matches!(
            parse_csv_series(&negative),
            Err(RiskError::InvalidField { field: "commit_count", .. })
        ));
        let fractional = format!("{HEADER}\n2025-01-01,2.5,4,0,2.0,7.5,100.0\n");
        assert!(matches!(
            parse_csv_series(&fractional),
            Err(RiskError::InvalidField { field: "commit_count", .. })
        ));
        let morale = format!("{HEADER}\n2025-01-01,2,4,0,2.0,12,100.0\n");
        assert!(matches!(
            parse_csv_series(&morale),
            Err(RiskError::InvalidField { field: "founder_morale_score", .. })
        ));
        let date = format!("{HEADER}\n01/02/2025,2,4,0,2.0,5,100.0\n");
        assert!(matches!(
            parse_csv_series(&date),
            Err(RiskError::InvalidField { field: "date", .. })
        ));
    }

    #[test]
    fn duplicate_dates_are_rejected() {
        let csv = format!("{HEADER}\n2025-01-01,5,4,0,2.0,7.5,100.0\n2025-01-01,6,4,0,2.0,7.5,100.0\n");
        assert!(matches!(
            parse_csv_series(&csv),
            Err(RiskError::InvalidField { row: 1, field: "date", .. })
        ));
    }

    #[test]
    fn header_only_is_empty() {
        assert!(matches!(parse_csv_series(HEADER), Err(RiskError::EmptySeries)));
        assert!(matches!(parse_json_series("[]"), Err(RiskError::EmptySeries)));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        assert!(matches!(
            load_series("metrics.xlsx"),
            Err(RiskError::UnsupportedFormat(ext)) if ext == ".xlsx"
        ));
    }
}

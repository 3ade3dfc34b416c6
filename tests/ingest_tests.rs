//! Ingest Integration Tests
//!
//! Loads series files from disk in both supported formats and scores them
//! end to end.

use std::io::Write;

use portfolio_risk::ingest::load_series;
use portfolio_risk::{RiskError, RiskPipeline};

const CSV: &str = "\
date,commit_count,tasks_completed,tasks_missed,avg_response_time_hours,founder_morale_score,compute_spend_usd
2025-04-01,12,8,1,2.5,8.0,120.0
2025-04-02,11,8,1,2.7,7.8,125.0
2025-04-03,10,7,2,3.0,7.5,130.0
2025-04-04,10,7,2,3.1,7.4,128.0
2025-04-05,9,6,2,3.6,7.0,140.0
2025-04-06,8,6,3,4.0,6.6,150.0
2025-04-07,7,5,3,4.4,6.1,165.0
2025-04-08,6,5,4,5.0,5.5,180.0
";

fn write_temp(contents: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn csv_as_json(csv: &str) -> String {
    let mut lines = csv.lines();
    let header: Vec<&str> = lines.next().unwrap().split(',').collect();
    let records: Vec<serde_json::Value> = lines
        .map(|line| {
            let mut object = serde_json::Map::new();
            for (key, cell) in header.iter().zip(line.split(',')) {
                let value = if *key == "date" {
                    serde_json::Value::String(cell.to_string())
                } else {
                    serde_json::from_str(cell).unwrap()
                };
                object.insert((*key).to_string(), value);
            }
            serde_json::Value::Object(object)
        })
        .collect();
    serde_json::to_string(&records).unwrap()
}

#[test]
fn csv_file_loads_and_scores() {
    let file = write_temp(CSV, ".csv");
    let series = load_series(file.path()).unwrap();
    assert_eq!(series.len(), 8);

    let assessment = RiskPipeline::default().assess(&series).unwrap();
    assert!((0.0..=100.0).contains(&assessment.risk_score));
    assert_eq!(assessment.snapshots.len(), 1);
    assert_eq!(assessment.snapshots[0].days_ago, 0);
}

#[test]
fn json_and_csv_load_the_same_series() {
    let csv_file = write_temp(CSV, ".csv");
    let json_file = write_temp(&csv_as_json(CSV), ".json");
    let from_csv = load_series(csv_file.path()).unwrap();
    let from_json = load_series(json_file.path()).unwrap();
    assert_eq!(from_csv, from_json);
    assert_eq!(from_csv.fingerprint().unwrap(), from_json.fingerprint().unwrap());
}

#[test]
fn uppercase_extension_is_accepted() {
    let file = write_temp(CSV, ".CSV");
    assert!(load_series(file.path()).is_ok());
}

#[test]
fn missing_column_is_reported_by_name() {
    let without_morale: String = CSV
        .lines()
        .map(|line| {
            let cells: Vec<&str> = line.split(',').collect();
            [&cells[..5], &cells[6..]].concat().join(",")
        })
        .collect::<Vec<_>>()
        .join("\n");
    let file = write_temp(&without_morale, ".csv");
    let err = load_series(file.path()).unwrap_err();
    assert!(matches!(
        err,
        RiskError::MissingField {
            row: 0,
            field: "founder_morale_score"
        }
    ));
    assert!(err.to_string().contains("founder_morale_score"));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        load_series(dir.path().join("absent.csv")),
        Err(RiskError::Io(_))
    ));
}

#[test]
fn malformed_json_is_json_error() {
    let file = write_temp("[{\"date\": ", ".json");
    assert!(matches!(load_series(file.path()), Err(RiskError::Json(_))));
}

// src/history.rs
//! Anomaly history: the anomalous records of the latest live snapshot,
//! narrowed by a free-text keyword.

use crate::charts::EventRow;
use crate::model::PacketRecord;

pub const EMPTY_MESSAGE: &str = "No anomalies found";

/// Anomalous records, most recent first.
pub fn anomaly_rows(records: &[PacketRecord]) -> Vec<EventRow> {
    records
        .iter()
        .rev()
        .filter(|r| r.is_anomaly())
        .map(EventRow::from)
        .collect()
}

fn row_text(row: &EventRow) -> String {
    [
        row.timestamp.as_str(),
        row.source.as_str(),
        row.destination.as_str(),
        row.length.as_str(),
        row.status.as_str(),
    ]
    .join(" ")
    .to_lowercase()
}

/// Case-insensitive substring match over a row's visible text.
pub fn filter_rows<'a>(rows: &'a [EventRow], keyword: &str) -> Vec<&'a EventRow> {
    let needle = keyword.trim().to_lowercase();
    if needle.is_empty() {
        return rows.iter().collect();
    }
    rows.iter().filter(|r| row_text(r).contains(&needle)).collect()
}

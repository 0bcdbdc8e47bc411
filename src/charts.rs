// src/charts.rs
//! Reshaping of poll responses into display-ready shapes.
//!
//! Everything here is a pure function of its inputs, recomputed on every
//! render. `now` is passed in so bucketing is deterministic under test.

use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};

use crate::model::{HourlyBucket, PacketRecord, StatsSnapshot};
use crate::protocol::protocol_name;

pub const RECENT_ROWS: usize = 10;
pub const FLOW_BINS: usize = 10;
pub const HOURS: usize = 24;

const MINUTE_MS: i64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Strictly greater-than on both thresholds: 10 is Medium, 5 is Low.
    pub fn from_percentage(rate: f64) -> Self {
        if rate > 10.0 {
            Severity::High
        } else if rate > 5.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

/// Counter values as shown in the stat cards.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsView {
    pub total: u64,
    pub normal: u64,
    pub anomaly: u64,
    pub rate_label: String,
    pub severity: Severity,
}

impl From<&StatsSnapshot> for StatsView {
    fn from(s: &StatsSnapshot) -> Self {
        StatsView {
            total: s.total_packets,
            normal: s.normal_packets,
            anomaly: s.anomaly_packets,
            rate_label: format!("{:.2}%", s.anomaly_percentage),
            severity: Severity::from_percentage(s.anomaly_percentage),
        }
    }
}

/// One line of the recent-events table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRow {
    pub timestamp: String,
    pub source: String,
    pub destination: String,
    pub protocol: String,
    pub length: String,
    pub status: String,
    pub anomaly: bool,
}

impl From<&PacketRecord> for EventRow {
    fn from(p: &PacketRecord) -> Self {
        let na = || "N/A".to_string();
        EventRow {
            timestamp: p.timestamp.clone().unwrap_or_else(na),
            source: p.source.clone().unwrap_or_else(na),
            destination: p.destination.clone().unwrap_or_else(na),
            protocol: protocol_name(p.protocol).into_owned(),
            length: p.length.map(|l| l.to_string()).unwrap_or_else(na),
            status: p
                .status
                .as_ref()
                .map(|s| s.as_str().to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
            anomaly: p.is_anomaly(),
        }
    }
}

/// Last [`RECENT_ROWS`] records in arrival order, most recent first.
pub fn recent_rows(records: &[PacketRecord]) -> Vec<EventRow> {
    let start = records.len().saturating_sub(RECENT_ROWS);
    records[start..].iter().rev().map(EventRow::from).collect()
}

/// Bin index for a record observed at `at`, or `None` when it falls
/// outside the trailing ten minutes.
pub fn flow_bin(now: NaiveDateTime, at: NaiveDateTime) -> Option<usize> {
    let elapsed = (now - at).num_milliseconds();
    let minutes = elapsed.div_euclid(MINUTE_MS);
    if (0..FLOW_BINS as i64).contains(&minutes) {
        Some(FLOW_BINS - 1 - minutes as usize)
    } else {
        None
    }
}

/// Packets per minute over the ten minutes trailing `now`, oldest first.
pub fn flow_counts(records: &[PacketRecord], now: NaiveDateTime) -> [u64; FLOW_BINS] {
    let mut counts = [0u64; FLOW_BINS];
    for at in records.iter().filter_map(PacketRecord::observed_at) {
        if let Some(bin) = flow_bin(now, at) {
            counts[bin] += 1;
        }
    }
    counts
}

pub fn flow_labels(now: NaiveDateTime) -> Vec<String> {
    (0..FLOW_BINS as i64)
        .rev()
        .map(|i| (now - Duration::minutes(i)).format("%H:%M").to_string())
        .collect()
}

/// Record counts per resolved protocol name in first-seen order.
pub fn protocol_tally(records: &[PacketRecord]) -> Vec<(String, u64)> {
    let mut tally: Vec<(String, u64)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for rec in records {
        let name = protocol_name(rec.protocol);
        match index.get(&*name) {
            Some(&i) => tally[i].1 += 1,
            None => {
                index.insert(name.to_string(), tally.len());
                tally.push((name.into_owned(), 1));
            }
        }
    }
    tally
}

/// Normal and anomaly series indexed by hour of day.
pub fn hourly_series(buckets: &[HourlyBucket]) -> ([u64; HOURS], [u64; HOURS]) {
    let mut normal = [0u64; HOURS];
    let mut anomaly = [0u64; HOURS];
    for b in buckets {
        if (0..HOURS as i64).contains(&b.hour) {
            let h = b.hour as usize;
            normal[h] = b.normal;
            anomaly[h] = b.anomaly;
        }
    }
    (normal, anomaly)
}

pub fn hourly_labels() -> Vec<String> {
    (0..HOURS).map(|h| format!("{}:00", h)).collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: Vec<u64>,
}

/// Labels plus named series for one chart. Updated in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartState {
    pub title: String,
    pub labels: Vec<String>,
    pub series: Vec<Series>,
}

impl ChartState {
    pub fn new(title: &str, labels: Vec<String>, series_names: &[&str]) -> Self {
        let width = labels.len();
        ChartState {
            title: title.to_string(),
            labels,
            series: series_names
                .iter()
                .map(|name| Series {
                    name: name.to_string(),
                    values: vec![0; width],
                })
                .collect(),
        }
    }

    pub fn set_labels(&mut self, labels: Vec<String>) {
        self.labels = labels;
    }

    /// Replaces the values of series `idx`; out-of-range indexes are ignored.
    pub fn set_series(&mut self, idx: usize, values: &[u64]) {
        if let Some(s) = self.series.get_mut(idx) {
            s.values.clear();
            s.values.extend_from_slice(values);
        }
    }

    pub fn values(&self, idx: usize) -> &[u64] {
        self.series.get(idx).map(|s| s.values.as_slice()).unwrap_or(&[])
    }

    pub fn clear(&mut self) {
        self.labels.clear();
        self.series.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn at(offset: Duration) -> PacketRecord {
        PacketRecord {
            timestamp: Some((now() - offset).format(crate::model::TIMESTAMP_FORMAT).to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_severity_thresholds_are_strict() {
        assert_eq!(Severity::from_percentage(0.0), Severity::Low);
        assert_eq!(Severity::from_percentage(5.0), Severity::Low);
        assert_eq!(Severity::from_percentage(5.01), Severity::Medium);
        assert_eq!(Severity::from_percentage(10.0), Severity::Medium);
        assert_eq!(Severity::from_percentage(10.5), Severity::High);
    }

    #[test]
    fn test_stats_view_formats_rate() {
        let view = StatsView::from(&StatsSnapshot {
            total_packets: 200,
            normal_packets: 185,
            anomaly_packets: 15,
            anomaly_percentage: 7.5,
        });
        assert_eq!(view.rate_label, "7.50%");
        assert_eq!(view.severity, Severity::Medium);
        assert_eq!(view.total, 200);
    }

    #[test]
    fn test_recent_rows_last_ten_newest_first() {
        let records: Vec<PacketRecord> = (0..15)
            .map(|i| PacketRecord {
                source: Some(format!("10.0.0.{}", i)),
                ..Default::default()
            })
            .collect();

        let rows = recent_rows(&records);
        assert_eq!(rows.len(), 10);
        let sources: Vec<_> = rows.iter().map(|r| r.source.as_str()).collect();
        assert_eq!(
            sources,
            [
                "10.0.0.14", "10.0.0.13", "10.0.0.12", "10.0.0.11", "10.0.0.10", "10.0.0.9",
                "10.0.0.8", "10.0.0.7", "10.0.0.6", "10.0.0.5"
            ]
        );
    }

    #[test]
    fn test_event_row_fallbacks() {
        let row = EventRow::from(&PacketRecord {
            protocol: Some(999),
            ..Default::default()
        });
        assert_eq!(row.timestamp, "N/A");
        assert_eq!(row.length, "N/A");
        assert_eq!(row.protocol, "Protocol 999");
        assert_eq!(row.status, "Unknown");
        assert!(!row.anomaly);
    }

    #[test]
    fn test_flow_bins_trailing_ten_minutes() {
        assert_eq!(flow_bin(now(), now()), Some(9));
        assert_eq!(flow_bin(now(), now() - Duration::seconds(570)), Some(0));
        assert_eq!(flow_bin(now(), now() - Duration::seconds(630)), None);
        // Clock skew: records from the future are dropped too.
        assert_eq!(flow_bin(now(), now() + Duration::seconds(30)), None);
    }

    #[test]
    fn test_flow_counts() {
        let records = vec![
            at(Duration::seconds(10)),
            at(Duration::seconds(20)),
            at(Duration::seconds(570)),
            at(Duration::seconds(630)),
            PacketRecord::default(),
        ];
        let counts = flow_counts(&records, now());
        assert_eq!(counts, [1, 0, 0, 0, 0, 0, 0, 0, 0, 2]);
    }

    #[test]
    fn test_flow_labels() {
        let labels = flow_labels(now());
        assert_eq!(labels.first().map(String::as_str), Some("11:51"));
        assert_eq!(labels.last().map(String::as_str), Some("12:00"));
    }

    #[test]
    fn test_protocol_tally_first_seen_order() {
        let records: Vec<PacketRecord> = [17, 6, 17, 999, 6, 17]
            .into_iter()
            .map(|p| PacketRecord {
                protocol: Some(p),
                ..Default::default()
            })
            .collect();
        assert_eq!(
            protocol_tally(&records),
            vec![
                ("UDP".to_string(), 3),
                ("TCP".to_string(), 2),
                ("Protocol 999".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_hourly_sparse_fill() {
        let (normal, anomaly) = hourly_series(&[
            HourlyBucket { hour: 3, normal: 5, anomaly: 2 },
            HourlyBucket { hour: 24, normal: 9, anomaly: 9 },
            HourlyBucket { hour: -1, normal: 9, anomaly: 9 },
        ]);
        for h in 0..HOURS {
            if h == 3 {
                assert_eq!((normal[h], anomaly[h]), (5, 2));
            } else {
                assert_eq!((normal[h], anomaly[h]), (0, 0));
            }
        }
    }

    #[test]
    fn test_chart_state_in_place_update() {
        let mut chart = ChartState::new("24-Hour Packet Analysis", hourly_labels(), &["Normal", "Anomaly"]);
        assert_eq!(chart.values(1).len(), 24);
        chart.set_series(1, &[1, 2, 3]);
        chart.set_series(7, &[1]);
        assert_eq!(chart.values(1), &[1, 2, 3]);
        chart.clear();
        assert!(chart.series.is_empty());
    }
}

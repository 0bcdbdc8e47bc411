// src/model.rs
use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::network::ApiError;

/// Timestamp layout the backend writes into `Timestamp`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Treats an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PacketStatus {
    Normal,
    Anomaly,
    Other(String),
}

impl PacketStatus {
    pub fn is_anomaly(&self) -> bool {
        matches!(self, PacketStatus::Anomaly)
    }

    pub fn as_str(&self) -> &str {
        match self {
            PacketStatus::Normal => "Normal",
            PacketStatus::Anomaly => "Anomaly",
            PacketStatus::Other(s) => s,
        }
    }
}

impl From<String> for PacketStatus {
    fn from(s: String) -> Self {
        // Case-sensitive on purpose: "anomaly" is not an anomaly.
        match s.as_str() {
            "Normal" => PacketStatus::Normal,
            "Anomaly" => PacketStatus::Anomaly,
            _ => PacketStatus::Other(s),
        }
    }
}

impl From<PacketStatus> for String {
    fn from(s: PacketStatus) -> Self {
        s.as_str().to_string()
    }
}

/// One classified packet as reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PacketRecord {
    #[serde(rename = "Timestamp", default)]
    pub timestamp: Option<String>,
    #[serde(rename = "Source_IP", default)]
    pub source: Option<String>,
    #[serde(rename = "Dest_IP", default)]
    pub destination: Option<String>,
    #[serde(rename = "Protocol", default)]
    pub protocol: Option<u32>,
    #[serde(rename = "Length", default)]
    pub length: Option<u64>,
    #[serde(rename = "Status", default)]
    pub status: Option<PacketStatus>,
}

impl PacketRecord {
    pub fn is_anomaly(&self) -> bool {
        self.status.as_ref().is_some_and(PacketStatus::is_anomaly)
    }

    /// Parses `Timestamp` as local wall-clock time.
    pub fn observed_at(&self) -> Option<NaiveDateTime> {
        let raw = self.timestamp.as_deref()?.trim();
        NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
            .ok()
            .or_else(|| {
                DateTime::parse_from_rfc3339(raw)
                    .ok()
                    .map(|t| t.with_timezone(&Local).naive_local())
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_packets: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub normal_packets: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub anomaly_packets: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub anomaly_percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyBucket {
    pub hour: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub normal: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub anomaly: u64,
}

/// Envelope shared by every endpoint: `success` plus an optional `error`.
pub trait Envelope: Sized {
    fn success(&self) -> bool;
    fn take_error(&mut self) -> Option<String>;

    /// Turns `success: false` into [`ApiError::Rejected`].
    fn into_result(mut self) -> Result<Self, ApiError> {
        if self.success() {
            Ok(self)
        } else {
            Err(ApiError::Rejected(self.take_error()))
        }
    }
}

macro_rules! envelope {
    ($($ty:ty),* $(,)?) => {
        $(impl Envelope for $ty {
            fn success(&self) -> bool {
                self.success
            }

            fn take_error(&mut self) -> Option<String> {
                self.error.take()
            }
        })*
    };
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiveData {
    #[serde(default)]
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stats: StatsSnapshot,
    #[serde(default)]
    pub recent_data: Option<Vec<PacketRecord>>,
    #[serde(default)]
    pub hourly_stats: Option<Vec<HourlyBucket>>,
    #[serde(default)]
    pub total_packets: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurrentStats {
    #[serde(default)]
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stats: StatsSnapshot,
    #[serde(default, deserialize_with = "null_as_default")]
    pub queue_size: u64,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrainReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueStatus {
    #[serde(default)]
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub queue_size: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub queue_max_size: u64,
    #[serde(default)]
    pub is_full: bool,
    #[serde(default)]
    pub is_empty: bool,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

envelope!(LiveData, CurrentStats, RetrainReply, QueueStatus);

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_live_data() {
        let json = r#"{
            "success": true,
            "stats": {"total_packets": 3, "normal_packets": 2, "anomaly_packets": 1, "anomaly_percentage": 33.3},
            "recent_data": [
                {"Timestamp": "2024-05-01 12:30:00", "Source_IP": "10.0.0.1", "Dest_IP": "10.0.0.2",
                 "Protocol": 6, "Length": 60, "Status": "Anomaly"}
            ],
            "total_packets": 3
        }"#;

        let live: LiveData = serde_json::from_str(json).unwrap();
        let live = live.into_result().unwrap();
        assert_eq!(live.stats.total_packets, 3);
        assert!(live.hourly_stats.is_none());

        let rec = &live.recent_data.unwrap()[0];
        assert_eq!(rec.source.as_deref(), Some("10.0.0.1"));
        assert_eq!(rec.protocol, Some(6));
        assert!(rec.is_anomaly());
        assert_eq!(
            rec.observed_at(),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(12, 30, 0)
        );
    }

    #[test]
    fn test_missing_and_null_counts_default_to_zero() {
        let json = r#"{"success": true, "stats": {"total_packets": null, "anomaly_percentage": null}}"#;
        let live: LiveData = serde_json::from_str(json).unwrap();
        assert_eq!(live.stats, StatsSnapshot::default());
        assert!(live.recent_data.is_none());
    }

    #[test]
    fn test_status_match_is_case_sensitive() {
        let rec: PacketRecord = serde_json::from_str(r#"{"Status": "anomaly"}"#).unwrap();
        assert!(!rec.is_anomaly());
        assert_eq!(rec.status, Some(PacketStatus::Other("anomaly".into())));
    }

    #[test]
    fn test_failed_envelope_keeps_error_message() {
        let json = r#"{"success": false, "error": "Missing required columns: ['Length']"}"#;
        let live: LiveData = serde_json::from_str(json).unwrap();
        match live.into_result() {
            Err(ApiError::Rejected(Some(msg))) => assert!(msg.contains("Length")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unparseable_timestamp() {
        let rec = PacketRecord {
            timestamp: Some("yesterday".into()),
            ..Default::default()
        };
        assert!(rec.observed_at().is_none());
    }
}

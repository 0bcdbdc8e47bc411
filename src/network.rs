// src/network.rs
use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::model::{CurrentStats, Envelope, LiveData, QueueStatus, RetrainReply};

pub const LIVE_DATA_PATH: &str = "/api/live-data/";
pub const CURRENT_STATS_PATH: &str = "/api/current-stats/";
pub const RETRAIN_PATH: &str = "/api/retrain-model/";
pub const QUEUE_STATUS_PATH: &str = "/api/queue-status/";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("backend reported failure: {}", .0.as_deref().unwrap_or("no message"))]
    Rejected(Option<String>),
}

impl ApiError {
    /// Banner text for this failure, `fallback` when the backend gave none.
    pub fn banner_text(&self, fallback: &str) -> String {
        match self {
            ApiError::Rejected(Some(msg)) if !msg.is_empty() => msg.clone(),
            ApiError::Rejected(_) => fallback.to_string(),
            ApiError::Transport(_) | ApiError::Decode(_) => "Network error occurred".to_string(),
        }
    }
}

/// The classification backend as seen by the dashboard.
#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn live_data(&self) -> Result<LiveData, ApiError>;
    async fn current_stats(&self) -> Result<CurrentStats, ApiError>;
    async fn retrain_model(&self) -> Result<RetrainReply, ApiError>;
    async fn queue_status(&self) -> Result<QueueStatus, ApiError>;
}

pub struct HttpApi {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpApi {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let http_client = reqwest::Client::builder().build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned + Envelope>(resp: reqwest::Response) -> Result<T, ApiError> {
        let status = resp.status();
        let body = resp.bytes().await?;
        debug!(%status, bytes = body.len(), "response received");
        let parsed: T = serde_json::from_slice(&body)?;
        parsed.into_result()
    }

    async fn get<T: DeserializeOwned + Envelope>(&self, path: &str) -> Result<T, ApiError> {
        let resp = self.http_client.get(self.url(path)).send().await?;
        Self::decode(resp).await
    }
}

#[async_trait]
impl DashboardApi for HttpApi {
    async fn live_data(&self) -> Result<LiveData, ApiError> {
        self.get(LIVE_DATA_PATH).await
    }

    async fn current_stats(&self) -> Result<CurrentStats, ApiError> {
        self.get(CURRENT_STATS_PATH).await
    }

    async fn retrain_model(&self) -> Result<RetrainReply, ApiError> {
        let resp = self
            .http_client
            .post(self.url(RETRAIN_PATH))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn queue_status(&self) -> Result<QueueStatus, ApiError> {
        self.get(QUEUE_STATUS_PATH).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let api = HttpApi::new("http://127.0.0.1:8000/").unwrap();
        assert_eq!(api.url(LIVE_DATA_PATH), "http://127.0.0.1:8000/api/live-data/");
    }

    #[test]
    fn test_banner_text() {
        let rejected = ApiError::Rejected(Some("No live data available for training".into()));
        assert_eq!(
            rejected.banner_text("Failed to retrain model"),
            "No live data available for training"
        );
        assert_eq!(
            ApiError::Rejected(None).banner_text("Failed to fetch live data"),
            "Failed to fetch live data"
        );

        let bad_json = serde_json::from_str::<LiveData>("<html>").unwrap_err();
        assert_eq!(
            ApiError::from(bad_json).banner_text("Failed to fetch live data"),
            "Network error occurred"
        );
    }
}

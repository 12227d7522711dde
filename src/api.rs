//! Client for the coverage aggregation API.

use crate::filters::ValidatedFilters;
use crate::model::{CriticalPointRow, KpiSummary, ZoneCollection};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to /api/{endpoint} failed: {source}")]
    Request {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("/api/{endpoint} returned status {status}")]
    Status {
        endpoint: &'static str,
        status: u16,
        /// Plain-text body, shown to the user as-is by the export path
        body: String,
    },
    #[error("invalid JSON from /api/{endpoint}: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Raw spreadsheet download
#[derive(Debug, Clone)]
pub struct ExportPayload {
    pub content_disposition: Option<String>,
    pub bytes: Vec<u8>,
}

/// Read side of the aggregation server
#[async_trait]
pub trait DashboardApi: Send + Sync {
    async fn kpis(&self, filters: &ValidatedFilters) -> Result<KpiSummary, ApiError>;
    async fn map_data(&self, filters: &ValidatedFilters) -> Result<ZoneCollection, ApiError>;
    async fn critical_points(
        &self,
        filters: &ValidatedFilters,
    ) -> Result<Vec<CriticalPointRow>, ApiError>;
    async fn export(&self, filters: &ValidatedFilters) -> Result<ExportPayload, ApiError>;
}

pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/api/{}", self.base_url, endpoint)
    }

    async fn send(
        &self,
        endpoint: &'static str,
        query: &[(&'static str, String)],
    ) -> Result<reqwest::Response, ApiError> {
        let response = self
            .http
            .get(self.url(endpoint))
            .query(query)
            .send()
            .await
            .map_err(|source| ApiError::Request { endpoint, source })?;

        let status = response.status();
        debug!(endpoint, status = status.as_u16(), "API response");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        filters: &ValidatedFilters,
    ) -> Result<T, ApiError> {
        let response = self.send(endpoint, &filters.query_pairs()).await?;
        let text = response
            .text()
            .await
            .map_err(|source| ApiError::Request { endpoint, source })?;
        serde_json::from_str(&text).map_err(|source| ApiError::Decode { endpoint, source })
    }
}

#[async_trait]
impl DashboardApi for ApiClient {
    async fn kpis(&self, filters: &ValidatedFilters) -> Result<KpiSummary, ApiError> {
        self.get_json("kpis", filters).await
    }

    async fn map_data(&self, filters: &ValidatedFilters) -> Result<ZoneCollection, ApiError> {
        self.get_json("map_data", filters).await
    }

    async fn critical_points(
        &self,
        filters: &ValidatedFilters,
    ) -> Result<Vec<CriticalPointRow>, ApiError> {
        self.get_json("critical_points", filters).await
    }

    async fn export(&self, filters: &ValidatedFilters) -> Result<ExportPayload, ApiError> {
        let endpoint = "export";
        let response = self.send(endpoint, &filters.export_pairs()).await?;
        let content_disposition = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|source| ApiError::Request { endpoint, source })?;
        Ok(ExportPayload {
            content_disposition,
            bytes: bytes.to_vec(),
        })
    }
}

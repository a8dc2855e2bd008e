use std::time::Duration;

use reqwest::{Client as HttpClient, StatusCode};

use super::sink::DeliveryError;
use crate::parser::{Destination, Record};

const API_KEY_HEADER: &str = "X-Api-Key";

/// HTTP client for the stats collector.
#[derive(Debug, Clone)]
pub struct CollectorClient {
    base_url: String,
    http: HttpClient,
    api_key: String,
}

impl CollectorClient {
    /// Create a client for the collector at `base_url`
    /// (e.g. "http://127.0.0.1:8000").
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DeliveryError> {
        let base_url = base_url.into();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(DeliveryError::InvalidUrl(format!(
                "URL must start with http:// or https://, got: {}",
                base_url
            )));
        }

        let http = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            api_key: api_key.into(),
        })
    }

    pub fn url(&self, destination: Destination) -> String {
        format!("{}{}", self.base_url, destination.path())
    }

    /// POST one record as JSON to the endpoint for its family.
    pub async fn submit(&self, record: &Record) -> Result<StatusCode, DeliveryError> {
        let destination = record.destination();
        let body = record.to_json()?;

        let response = self
            .http
            .post(self.url(destination))
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        tracing::info!("~{} POST {}", destination.path(), status.as_u16());

        if !status.is_success() {
            return Err(DeliveryError::Status {
                status: status.as_u16(),
                path: destination.path(),
            });
        }
        Ok(status)
    }
}

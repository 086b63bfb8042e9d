//! HTTP coordinator client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::BootstrapConfig;
use crate::experience::{parse_experience, ExperienceDescriptor};
use crate::metrics;

use super::{
    CoordinatorClient, CoordinatorError, ReadinessStatus, CONFIGURATION_PATH, SET_READY_PATH,
    STATUS_PATH,
};

/// Coordinator reached over plain HTTP at `http://{serverIp}:{port}`.
pub struct HttpCoordinatorClient {
    client: Client,
    base_url: String,
}

impl HttpCoordinatorClient {
    /// Create a client for the service named in the bootstrap descriptor.
    pub fn new(bootstrap: &BootstrapConfig, timeout: Duration) -> Result<Self, CoordinatorError> {
        Self::with_base_url(bootstrap.base_url(), timeout)
    }

    /// Create a client for an explicit base URL.
    pub fn with_base_url(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CoordinatorError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoordinatorError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` and return the body of a successful response.
    async fn get(&self, path: &str) -> Result<String, CoordinatorError> {
        let url = format!("{}{}", self.base_url, path);
        let started = Instant::now();
        let result = self.send(&url, path).await;

        let status = if result.is_ok() { "success" } else { "error" };
        metrics::COORDINATOR_REQUESTS
            .with_label_values(&[path, status])
            .inc();
        metrics::COORDINATOR_REQUEST_DURATION
            .with_label_values(&[path])
            .observe(started.elapsed().as_secs_f64());

        result
    }

    async fn send(&self, url: &str, path: &str) -> Result<String, CoordinatorError> {
        debug!(url = url, "Coordinator request");

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                CoordinatorError::Timeout(path.to_string())
            } else {
                CoordinatorError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CoordinatorError::Http {
                path: path.to_string(),
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                CoordinatorError::Timeout(path.to_string())
            } else {
                CoordinatorError::Network(e.to_string())
            }
        })
    }
}

#[async_trait]
impl CoordinatorClient for HttpCoordinatorClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_experience(&self) -> Result<ExperienceDescriptor, CoordinatorError> {
        let body = self.get(CONFIGURATION_PATH).await?;
        let experience = parse_experience(&body)?;

        debug!(
            primary = %experience.primary_media_ref,
            overlays = experience.overlays.len(),
            "Fetched experience descriptor"
        );
        Ok(experience)
    }

    async fn announce_ready(&self) -> Result<(), CoordinatorError> {
        self.get(SET_READY_PATH).await.map(|_| ())
    }

    async fn fetch_status(&self) -> Result<ReadinessStatus, CoordinatorError> {
        let body = self.get(STATUS_PATH).await?;
        serde_json::from_str(&body)
            .map_err(|e| CoordinatorError::Parse(format!("status body: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_from_bootstrap() {
        let bootstrap = BootstrapConfig {
            server_ip: "10.1.1.1".to_string(),
            port: "9000".to_string(),
        };
        let client = HttpCoordinatorClient::new(&bootstrap, Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://10.1.1.1:9000");
        assert_eq!(client.name(), "http");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client =
            HttpCoordinatorClient::with_base_url("http://localhost:8080/", Duration::from_secs(1))
                .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_network_error() {
        // Port 9 (discard) on localhost is expected to refuse connections.
        let client =
            HttpCoordinatorClient::with_base_url("http://127.0.0.1:9", Duration::from_secs(2))
                .unwrap();
        let err = client.fetch_status().await.unwrap_err();
        assert!(err.is_network());
    }
}

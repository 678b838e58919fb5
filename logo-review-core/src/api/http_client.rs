//! Robotoff HTTP client with retry and backoff for read requests.

use backoff::{future::retry_notify, ExponentialBackoff};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{LogoReviewError, Result};

/// JSON-over-HTTP client shared by all Robotoff endpoints.
#[derive(Clone)]
pub struct ApiHttpClient {
    client: Client,
    config: ClientConfig,
}

impl ApiHttpClient {
    /// Create a new HTTP client with the given configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .https_only(config.https_only)
            .build()
            .map_err(|e| LogoReviewError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// GET `url` and decode the JSON body, retrying transient failures.
    pub async fn get_json<R>(&self, url: &str, endpoint: &str) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let backoff = self.build_backoff();

        retry_notify(
            backoff,
            || async move { self.get_once::<R>(url, endpoint).await },
            |err: LogoReviewError, duration: Duration| {
                warn!(
                    error = %err,
                    endpoint,
                    retry_after_ms = duration.as_millis() as u64,
                    "Retry scheduled"
                );
            },
        )
        .await
    }

    async fn get_once<R>(
        &self,
        url: &str,
        endpoint: &str,
    ) -> std::result::Result<R, backoff::Error<LogoReviewError>>
    where
        R: DeserializeOwned,
    {
        let start = Instant::now();

        let response = self.client.get(url).send().await.map_err(|e| {
            let latency_ms = start.elapsed().as_millis() as u64;
            if is_transient_error(&e) {
                warn!(error = %e, latency_ms, "Transient error, will retry");
                backoff::Error::transient(LogoReviewError::ApiError(format!(
                    "Transient error (will retry): {e}"
                )))
            } else {
                warn!(error = %e, latency_ms, "Permanent error, aborting");
                backoff::Error::permanent(LogoReviewError::ApiError(format!(
                    "{endpoint} request failed: {e}"
                )))
            }
        })?;

        let status = response.status();
        debug!(status = %status, endpoint, "Received HTTP response");

        if !status.is_success() {
            let latency_ms = start.elapsed().as_millis() as u64;
            let err = LogoReviewError::ApiError(format!("{endpoint} returned status: {status}"));
            return if is_transient_status(status) {
                warn!(status = %status, latency_ms, "Transient HTTP status, will retry");
                Err(backoff::Error::transient(err))
            } else {
                warn!(status = %status, latency_ms, "Permanent HTTP error");
                Err(backoff::Error::permanent(err))
            };
        }

        let parsed: R = response.json().await.map_err(|e| {
            warn!(error = %e, endpoint, "Failed to parse JSON response");
            backoff::Error::permanent(LogoReviewError::ApiError(format!(
                "Failed to parse {endpoint} response: {e}"
            )))
        })?;

        debug!(
            latency_ms = start.elapsed().as_millis() as u64,
            endpoint, "Request completed successfully"
        );

        Ok(parsed)
    }

    /// POST a JSON body once. Writes are never retried.
    pub async fn post_json<B>(&self, url: &str, endpoint: &str, body: &B) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let start = Instant::now();

        let response = self.client.post(url).json(body).send().await.map_err(|e| {
            warn!(error = %e, endpoint, "Request failed");
            LogoReviewError::ApiError(format!("{endpoint} request failed: {e}"))
        })?;

        let status = response.status();
        let latency_ms = start.elapsed().as_millis() as u64;
        if !status.is_success() {
            warn!(status = %status, latency_ms, endpoint, "HTTP error");
            return Err(LogoReviewError::ApiError(format!(
                "{endpoint} returned status: {status}"
            )));
        }

        debug!(status = %status, latency_ms, endpoint, "Request completed successfully");
        Ok(())
    }

    fn build_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.config.initial_interval,
            max_interval: self.config.max_interval,
            max_elapsed_time: Some(self.config.timeout * self.config.max_retries),
            ..Default::default()
        }
    }
}

/// Check if a reqwest error is transient and should be retried.
pub fn is_transient_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect()
}

/// Check if an HTTP status code indicates a transient error.
pub fn is_transient_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
            | StatusCode::BAD_GATEWAY
    )
}

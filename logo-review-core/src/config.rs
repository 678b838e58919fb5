//! Client configuration.
//!
//! Loaded from environment variables with defaults pointing at the public
//! Open Food Facts services.

use std::time::Duration;

use crate::error::{LogoReviewError, Result};
use crate::urls::ImageUrlBuilder;

/// Default Robotoff API root.
pub const DEFAULT_ROBOTOFF_URL: &str = "https://robotoff.openfoodfacts.org/api/v1";

/// Default root of the product image server.
pub const DEFAULT_IMAGES_URL: &str = "https://images.openfoodfacts.org";

/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum number of retry attempts for idempotent requests.
const MAX_RETRIES: u32 = 3;

/// Initial retry interval.
const INITIAL_INTERVAL: Duration = Duration::from_millis(200);

/// Maximum retry interval.
const MAX_INTERVAL: Duration = Duration::from_secs(2);

/// Configuration shared by the HTTP client and the image URL builder.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Robotoff API root, without trailing slash.
    pub robotoff_url: String,
    /// Product image server root, without trailing slash.
    pub images_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Maximum retry attempts for transient errors on read requests.
    pub max_retries: u32,
    /// Initial retry interval.
    pub initial_interval: Duration,
    /// Maximum retry interval.
    pub max_interval: Duration,
    /// Refuse plain-HTTP endpoints.
    pub https_only: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            robotoff_url: DEFAULT_ROBOTOFF_URL.to_string(),
            images_url: DEFAULT_IMAGES_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: MAX_RETRIES,
            initial_interval: INITIAL_INTERVAL,
            max_interval: MAX_INTERVAL,
            https_only: true,
        }
    }
}

impl ClientConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional: `ROBOTOFF_API_URL`, `OFF_IMAGES_URL`,
    /// `LOGO_REVIEW_TIMEOUT_SECS`, `LOGO_REVIEW_MAX_RETRIES`,
    /// `LOGO_REVIEW_ALLOW_HTTP` (`1` or `true` to accept plain HTTP).
    pub fn from_env() -> Result<Self> {
        Self::from_env_unchecked()?.normalized()
    }

    /// Environment values as given, before [`normalized`](Self::normalized).
    ///
    /// Only numeric parsing can fail here; callers layering overrides on
    /// top must normalize afterwards.
    pub fn from_env_unchecked() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("ROBOTOFF_API_URL") {
            config.robotoff_url = url;
        }
        if let Ok(url) = std::env::var("OFF_IMAGES_URL") {
            config.images_url = url;
        }
        if let Ok(secs) = std::env::var("LOGO_REVIEW_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                LogoReviewError::Config(format!("LOGO_REVIEW_TIMEOUT_SECS is not a number: {secs}"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Ok(retries) = std::env::var("LOGO_REVIEW_MAX_RETRIES") {
            config.max_retries = retries.parse().map_err(|_| {
                LogoReviewError::Config(format!(
                    "LOGO_REVIEW_MAX_RETRIES is not a number: {retries}"
                ))
            })?;
        }

        if let Ok(allow) = std::env::var("LOGO_REVIEW_ALLOW_HTTP") {
            config.https_only = !matches!(allow.trim(), "1" | "true");
        }

        Ok(config)
    }

    /// Point the client at a different Robotoff root.
    pub fn with_robotoff_url(self, url: impl Into<String>) -> Self {
        Self {
            robotoff_url: url.into(),
            ..self
        }
    }

    /// Strip trailing slashes and check both roots parse as URLs.
    pub fn normalized(mut self) -> Result<Self> {
        self.robotoff_url = self.robotoff_url.trim_end_matches('/').to_string();
        self.images_url = self.images_url.trim_end_matches('/').to_string();

        for (name, value) in [
            ("robotoff_url", &self.robotoff_url),
            ("images_url", &self.images_url),
        ] {
            let parsed = url::Url::parse(value)
                .map_err(|e| LogoReviewError::Config(format!("{name} is not a valid URL: {e}")))?;
            if self.https_only && parsed.scheme() != "https" {
                return Err(LogoReviewError::Config(format!(
                    "{name} must use https: {value}"
                )));
            }
        }

        Ok(self)
    }

    /// URL builder for full and cropped product images.
    pub fn image_urls(&self) -> ImageUrlBuilder {
        ImageUrlBuilder::new(&self.robotoff_url, &self.images_url)
    }
}

//! Remote services consumed by the logo review core.
//!
//! Robotoff exposes three calls this crate relies on:
//!
//! - **Neighbor search** - ranked visually-near logos for a reference logo
//!   or an embedding index
//! - **Logo images** - source image and bounding box per logo id
//! - **Annotate** - batch annotation of logos
//!
//! ## Quick Start
//!
//! ```no_run
//! use logo_review_core::api::{LogoApi, RobotoffClient};
//! use logo_review_core::ClientConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api = RobotoffClient::new(ClientConfig::from_env()?)?;
//! let neighbors = api.search_neighbors(Some("42"), None, 50).await?;
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "network")]
mod http_client;
mod mock;
#[cfg(feature = "network")]
mod robotoff;

#[cfg(feature = "network")]
pub use http_client::{is_transient_error, is_transient_status, ApiHttpClient};
pub use mock::{MockLogoApi, SearchCall};
#[cfg(feature = "network")]
pub use robotoff::RobotoffClient;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{AnnotationRequest, LogoId, LogoImageMeta, NeighborResult};

/// The logo search and annotation services.
///
/// Implementations must be thread-safe (`Send + Sync`). Read calls may
/// retry internally; `submit_annotations` must not.
#[async_trait]
pub trait LogoApi: Send + Sync {
    /// Nearest neighbors of `logo_id` (or of the whole `index` when no logo
    /// is given), in service order.
    async fn search_neighbors(
        &self,
        logo_id: Option<&str>,
        index: Option<&str>,
        count: u32,
    ) -> Result<Vec<NeighborResult>>;

    /// Image metadata for `ids`. Order of the returned records is not significant.
    async fn fetch_logo_images(&self, ids: &[LogoId]) -> Result<Vec<LogoImageMeta>>;

    /// Store one annotation batch.
    async fn submit_annotations(&self, batch: &[AnnotationRequest]) -> Result<()>;

    /// Which backend answers the calls.
    fn backend(&self) -> ApiBackend;
}

/// Identifies the service behind a [`LogoApi`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ApiBackend {
    /// Robotoff HTTP API
    Robotoff { base_url: String },
    /// In-memory mock for tests and offline runs
    Mock,
}

impl std::fmt::Display for ApiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Robotoff { base_url } => write!(f, "Robotoff ({base_url})"),
            Self::Mock => write!(f, "Mock (offline)"),
        }
    }
}

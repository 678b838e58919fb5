//! Logo Review Core - search, select and bulk-annotate similar logo crops
//!
//! This crate drives the review of logos detected on product photos: find
//! logos visually close to a reference logo, pick the ones showing the same
//! brand or label, and annotate them all in one call.
//!
//! # Features
//!
//! - Two-stage search: neighbor ranking, then image metadata and crop URLs
//! - Selection with a locked reference logo
//! - Capped "load more" that never duplicates a held logo
//! - Query-string form of the search parameters for shareable links
//! - Stale-result protection when searches overlap
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use logo_review_core::{
//!     AnnotationData, AnnotationSubmitter, ClientConfig, LogoReviewSession, LogoSearchClient,
//!     RobotoffClient, SearchParams,
//! };
//!
//! # async fn example() -> logo_review_core::Result<()> {
//! let config = ClientConfig::from_env()?;
//! let api = Arc::new(RobotoffClient::new(config.clone())?);
//! let search = LogoSearchClient::new(api.clone(), config.image_urls());
//! let mut session = LogoReviewSession::new(search, AnnotationSubmitter::new(api));
//!
//! session.search(SearchParams::for_logo(42)).await;
//! let close: Vec<_> = session
//!     .visible_records()
//!     .unwrap_or_default()
//!     .iter()
//!     .filter(|record| record.distance < 0.1)
//!     .map(|record| record.id)
//!     .collect();
//! for id in close {
//!     session.toggle(id);
//! }
//! session.submit(Some(&AnnotationData::new("brand", "nutella"))).await?;
//! # Ok(())
//! # }
//! ```

pub mod annotate;
pub mod api;
pub mod config;
pub mod error;
pub mod model;
pub mod pagination;
pub mod params;
pub mod search;
pub mod selection;
pub mod session;
pub mod urls;

pub use annotate::{AnnotationSubmitter, SubmitMode, SubmitOutcome};
pub use api::{ApiBackend, LogoApi, MockLogoApi};
pub use config::ClientConfig;
pub use error::{LogoReviewError, Result};
pub use model::{
    AnnotationData, AnnotationRequest, BoundingBox, LogoId, LogoImage, LogoImageMeta,
    LogoRecord, NeighborResult,
};
pub use pagination::{PaginationController, LOAD_MORE_STEP, MAX_TOTAL_COUNT};
pub use params::{from_query_string, to_query_string, SearchParams, DEFAULT_COUNT};
pub use search::LogoSearchClient;
pub use selection::SelectionStore;
pub use session::{
    ApplyOutcome, LoadKind, LoadMoreOutcome, LoadState, LoadTicket, LogoReviewSession,
};
pub use urls::ImageUrlBuilder;

#[cfg(feature = "network")]
pub use api::RobotoffClient;

//! Robotoff logo API client.
//!
//! ## Endpoints
//!
//! - `GET  /ann/search/{logo_id}?count=N[&index=I]` - neighbors of a logo
//! - `GET  /ann/search?count=N[&index=I]` - neighbors within an index
//! - `GET  /images/logos?logo_ids=1,2,3` - image metadata per logo
//! - `POST /images/logos/annotate` - batch annotation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use url::Url;

use super::http_client::ApiHttpClient;
use super::{ApiBackend, LogoApi};
use crate::config::ClientConfig;
use crate::error::{LogoReviewError, Result};
use crate::model::{AnnotationRequest, BoundingBox, LogoId, LogoImageMeta, NeighborResult};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<NeighborResult>,
}

#[derive(Debug, Deserialize)]
struct LogosResponse {
    logos: Vec<LogoResponse>,
}

#[derive(Debug, Deserialize)]
struct LogoResponse {
    id: LogoId,
    #[serde(default)]
    bounding_box: Option<BoundingBox>,
    #[serde(default)]
    annotation_type: Option<String>,
    #[serde(default)]
    annotation_value: Option<String>,
    image: LogoImageResponse,
}

#[derive(Debug, Deserialize)]
struct LogoImageResponse {
    source_image: String,
    #[serde(default)]
    bounding_box: Option<BoundingBox>,
}

impl TryFrom<LogoResponse> for LogoImageMeta {
    type Error = LogoReviewError;

    fn try_from(logo: LogoResponse) -> Result<Self> {
        let bounding_box = logo
            .bounding_box
            .or(logo.image.bounding_box)
            .ok_or_else(|| {
                LogoReviewError::ApiError(format!("logo {} has no bounding box", logo.id))
            })?;

        Ok(LogoImageMeta {
            id: logo.id,
            source_image: logo.image.source_image,
            bounding_box,
            annotation_type: logo.annotation_type,
            annotation_value: logo.annotation_value,
        })
    }
}

#[derive(Debug, Serialize)]
struct AnnotateBody<'a> {
    annotations: &'a [AnnotationRequest],
}

/// Robotoff API client.
pub struct RobotoffClient {
    http: ApiHttpClient,
    base_url: Url,
}

impl RobotoffClient {
    /// Create a client for the configured Robotoff root.
    #[instrument(level = "debug", skip_all, fields(robotoff_url = %config.robotoff_url))]
    pub fn new(config: ClientConfig) -> Result<Self> {
        let config = config.normalized()?;
        let base_url = Url::parse(&config.robotoff_url)
            .map_err(|e| LogoReviewError::Config(format!("Invalid Robotoff URL: {e}")))?;

        let http = ApiHttpClient::new(config)?;
        info!("Robotoff client created");
        Ok(Self { http, base_url })
    }

    /// Create a client from environment configuration.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        self.http.config()
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| LogoReviewError::Config("Robotoff URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn search_url(&self, logo_id: Option<&str>, index: Option<&str>, count: u32) -> Result<Url> {
        let mut url = match logo_id {
            Some(id) => self.endpoint(&["ann", "search", id])?,
            None => self.endpoint(&["ann", "search"])?,
        };
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("count", &count.to_string());
            if let Some(index) = index {
                query.append_pair("index", index);
            }
        }
        Ok(url)
    }

    fn logos_url(&self, ids: &[LogoId]) -> Result<Url> {
        let joined = ids
            .iter()
            .map(LogoId::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let mut url = self.endpoint(&["images", "logos"])?;
        url.query_pairs_mut().append_pair("logo_ids", &joined);
        Ok(url)
    }
}

#[async_trait]
impl LogoApi for RobotoffClient {
    #[instrument(level = "info", skip(self), fields(source = "robotoff"))]
    async fn search_neighbors(
        &self,
        logo_id: Option<&str>,
        index: Option<&str>,
        count: u32,
    ) -> Result<Vec<NeighborResult>> {
        let url = self.search_url(logo_id, index, count)?;
        let response: SearchResponse = self.http.get_json(url.as_str(), "ann/search").await?;
        debug!(results = response.results.len(), "Neighbor search completed");
        Ok(response.results)
    }

    #[instrument(level = "info", skip(self, ids), fields(source = "robotoff", ids = ids.len()))]
    async fn fetch_logo_images(&self, ids: &[LogoId]) -> Result<Vec<LogoImageMeta>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let url = self.logos_url(ids)?;
        let response: LogosResponse = self.http.get_json(url.as_str(), "images/logos").await?;
        response
            .logos
            .into_iter()
            .map(LogoImageMeta::try_from)
            .collect()
    }

    #[instrument(level = "info", skip(self, batch), fields(source = "robotoff", annotations = batch.len()))]
    async fn submit_annotations(&self, batch: &[AnnotationRequest]) -> Result<()> {
        let url = self.endpoint(&["images", "logos", "annotate"])?;
        self.http
            .post_json(
                url.as_str(),
                "images/logos/annotate",
                &AnnotateBody { annotations: batch },
            )
            .await
    }

    fn backend(&self) -> ApiBackend {
        ApiBackend::Robotoff {
            base_url: self.http.config().robotoff_url.clone(),
        }
    }
}

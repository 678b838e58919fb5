//! Two-stage logo search: neighbor ranking, then image metadata.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use crate::api::LogoApi;
use crate::error::{LogoReviewError, Result};
use crate::model::{LogoId, LogoImage, LogoImageMeta, LogoRecord, NeighborResult};
use crate::urls::ImageUrlBuilder;

/// Loads ranked logo records from a [`LogoApi`].
#[derive(Clone)]
pub struct LogoSearchClient {
    api: Arc<dyn LogoApi>,
    urls: ImageUrlBuilder,
}

impl LogoSearchClient {
    pub fn new(api: Arc<dyn LogoApi>, urls: ImageUrlBuilder) -> Self {
        Self { api, urls }
    }

    pub fn api(&self) -> &Arc<dyn LogoApi> {
        &self.api
    }

    pub fn urls(&self) -> &ImageUrlBuilder {
        &self.urls
    }

    /// Fetch up to `count` neighbors and turn the ones not in `already_loaded`
    /// into records, in service order.
    ///
    /// When a reference logo is given and the service does not return it as
    /// its own distance-0 neighbor (it may not be indexed yet), it is added
    /// in front. Records come back unselected. Any failure of either call,
    /// or a neighbor without image metadata, is a `SearchFailure`.
    #[instrument(
        level = "info",
        skip(self, already_loaded),
        fields(already_loaded = already_loaded.len())
    )]
    pub async fn load_logos(
        &self,
        target_logo_id: Option<&str>,
        index: Option<&str>,
        count: u32,
        already_loaded: &[LogoId],
    ) -> Result<Vec<LogoRecord>> {
        let start = Instant::now();
        let result = self
            .load_logos_inner(target_logo_id, index, count, already_loaded)
            .await
            .map_err(LogoReviewError::into_search_failure);

        let latency_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(records) => info!(records = records.len(), latency_ms, "Loaded logos"),
            Err(e) => warn!(error = %e, latency_ms, "Logo search failed"),
        }
        result
    }

    async fn load_logos_inner(
        &self,
        target_logo_id: Option<&str>,
        index: Option<&str>,
        count: u32,
        already_loaded: &[LogoId],
    ) -> Result<Vec<LogoRecord>> {
        let target_logo_id = target_logo_id.map(str::trim).filter(|id| !id.is_empty());
        let index = index.map(str::trim).filter(|index| !index.is_empty());
        let target = target_logo_id
            .map(|raw| {
                raw.parse::<LogoId>().map_err(|_| {
                    LogoReviewError::InvalidParams(format!(
                        "logo_id must be an integer, got {raw:?}"
                    ))
                })
            })
            .transpose()?;

        let neighbors = self.api.search_neighbors(target_logo_id, index, count).await?;
        debug!(neighbors = neighbors.len(), "Neighbor search returned");

        let neighbors = drop_seen(include_reference(neighbors, target), already_loaded);
        if neighbors.is_empty() {
            debug!("No new neighbors to load");
            return Ok(Vec::new());
        }

        let ids: Vec<LogoId> = neighbors.iter().map(|n| n.logo_id).collect();
        let images = self.api.fetch_logo_images(&ids).await?;

        join_images(neighbors, images, &self.urls)
    }
}

/// Put `target` in front at distance 0 unless the service already ranked a
/// distance-0 match first.
pub fn include_reference(
    mut results: Vec<NeighborResult>,
    target: Option<LogoId>,
) -> Vec<NeighborResult> {
    if let Some(target) = target {
        let has_self_match = results.first().is_some_and(|first| first.distance == 0.0);
        if !has_self_match {
            debug!(logo_id = target, "Reference logo missing from its own search, adding it");
            results.insert(0, NeighborResult::reference(target));
        }
    }
    results
}

/// Drop neighbors already held, and repeats within the same response.
pub fn drop_seen(results: Vec<NeighborResult>, already_loaded: &[LogoId]) -> Vec<NeighborResult> {
    let mut seen: HashSet<LogoId> = already_loaded.iter().copied().collect();
    results
        .into_iter()
        .filter(|neighbor| seen.insert(neighbor.logo_id))
        .collect()
}

/// Join neighbors with their image metadata. Every neighbor must have a match.
pub fn join_images(
    neighbors: Vec<NeighborResult>,
    images: Vec<LogoImageMeta>,
    urls: &ImageUrlBuilder,
) -> Result<Vec<LogoRecord>> {
    let mut by_id: HashMap<LogoId, LogoImageMeta> =
        images.into_iter().map(|meta| (meta.id, meta)).collect();

    neighbors
        .into_iter()
        .map(|neighbor| {
            let meta = by_id.remove(&neighbor.logo_id).ok_or_else(|| {
                LogoReviewError::SearchFailure(format!(
                    "no image metadata for logo {}",
                    neighbor.logo_id
                ))
            })?;
            let cropped_image_url = urls.crop_for(&meta.source_image, &meta.bounding_box);

            Ok(LogoRecord {
                id: neighbor.logo_id,
                distance: neighbor.distance,
                image: LogoImage {
                    source_image: meta.source_image,
                    bounding_box: meta.bounding_box,
                    cropped_image_url,
                },
                annotation_type: meta.annotation_type,
                annotation_value: meta.annotation_value,
                selected: false,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockLogoApi;
    use crate::config::ClientConfig;

    fn client(api: Arc<MockLogoApi>) -> LogoSearchClient {
        LogoSearchClient::new(api, ClientConfig::default().image_urls())
    }

    fn ids(records: &[LogoRecord]) -> Vec<LogoId> {
        records.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_include_reference_when_missing() {
        let results = vec![NeighborResult::new(3, 0.4), NeighborResult::new(4, 0.5)];
        let fixed = include_reference(results, Some(42));
        assert_eq!(fixed[0], NeighborResult::new(42, 0.0));
        assert_eq!(fixed.len(), 3);
    }

    #[test]
    fn test_include_reference_keeps_existing_self_match() {
        let results = vec![NeighborResult::new(42, 0.0), NeighborResult::new(4, 0.5)];
        assert_eq!(include_reference(results.clone(), Some(42)), results);
    }

    #[test]
    fn test_include_reference_on_empty_results() {
        assert_eq!(
            include_reference(Vec::new(), Some(7)),
            vec![NeighborResult::new(7, 0.0)]
        );
        assert!(include_reference(Vec::new(), None).is_empty());
    }

    #[test]
    fn test_drop_seen_filters_held_and_repeated_ids() {
        let results = vec![
            NeighborResult::new(1, 0.0),
            NeighborResult::new(2, 0.1),
            NeighborResult::new(1, 0.3),
            NeighborResult::new(3, 0.4),
        ];
        let filtered = drop_seen(results, &[2]);
        let ids: Vec<_> = filtered.iter().map(|n| n.logo_id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_join_fails_on_missing_metadata() {
        let urls = ClientConfig::default().image_urls();
        let neighbors = vec![NeighborResult::new(1, 0.0), NeighborResult::new(2, 0.1)];
        let images = vec![MockLogoApi::sample_logo(1)];
        let err = join_images(neighbors, images, &urls).unwrap_err();
        assert!(matches!(err, LogoReviewError::SearchFailure(_)));
        assert!(err.to_string().contains("logo 2"));
    }

    #[tokio::test]
    async fn test_reference_added_when_not_indexed() {
        let api = Arc::new(MockLogoApi::with_catalog(100));
        api.mark_unindexed(42);
        let records = client(api).load_logos(Some("42"), None, 50, &[]).await.unwrap();

        assert_eq!(records.len(), 51);
        assert_eq!(records[0].id, 42);
        assert_eq!(records[0].distance, 0.0);
        assert!(records.iter().all(|r| !r.selected));
    }

    #[tokio::test]
    async fn test_indexed_reference_not_duplicated() {
        let api = Arc::new(MockLogoApi::with_catalog(100));
        let records = client(api).load_logos(Some("42"), None, 50, &[]).await.unwrap();

        assert_eq!(records.len(), 50);
        assert_eq!(records[0].id, 42);
        assert_eq!(records.iter().filter(|r| r.id == 42).count(), 1);
    }

    #[tokio::test]
    async fn test_records_carry_crop_urls() {
        let api = Arc::new(MockLogoApi::with_catalog(3));
        let records = client(api).load_logos(None, Some("clip"), 3, &[]).await.unwrap();

        assert_eq!(ids(&records), vec![1, 2, 3]);
        for record in &records {
            assert!(record
                .image
                .cropped_image_url
                .starts_with("https://robotoff.openfoodfacts.org/api/v1/images/crop?image_url="));
        }
    }

    #[tokio::test]
    async fn test_chained_loads_never_duplicate() {
        let api = Arc::new(MockLogoApi::with_catalog(300));
        let client = client(api);
        let mut loaded: Vec<LogoRecord> = Vec::new();

        for count in [50, 100, 150, 150, 200] {
            let held = ids(&loaded);
            let batch = client.load_logos(Some("120"), None, count, &held).await.unwrap();
            loaded.extend(batch);
        }

        let unique: HashSet<_> = loaded.iter().map(|r| r.id).collect();
        assert_eq!(unique.len(), loaded.len());
        assert_eq!(loaded.len(), 200);
    }

    #[tokio::test]
    async fn test_metadata_not_requested_when_nothing_new() {
        let api = Arc::new(MockLogoApi::with_catalog(10));
        let held: Vec<LogoId> = (1..=10).collect();
        let records = client(api.clone())
            .load_logos(None, None, 10, &held)
            .await
            .unwrap();

        assert!(records.is_empty());
        assert!(api.image_calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_metadata_is_search_failure() {
        let api = Arc::new(MockLogoApi::with_catalog(10));
        api.push_search_response(vec![NeighborResult::new(5, 0.0), NeighborResult::new(99, 0.2)]);
        let err = client(api).load_logos(Some("5"), None, 2, &[]).await.unwrap_err();
        assert!(matches!(err, LogoReviewError::SearchFailure(_)));
    }

    #[tokio::test]
    async fn test_remote_failures_become_search_failures() {
        let api = Arc::new(MockLogoApi::with_catalog(10));
        api.push_search_failure("ann/search returned status: 502 Bad Gateway");
        let err = client(api.clone()).load_logos(None, None, 5, &[]).await.unwrap_err();
        assert!(matches!(err, LogoReviewError::SearchFailure(_)));

        api.set_fail_images(true);
        let err = client(api).load_logos(None, None, 5, &[]).await.unwrap_err();
        assert!(matches!(err, LogoReviewError::SearchFailure(_)));
    }

    #[tokio::test]
    async fn test_non_numeric_logo_id_rejected_before_calling() {
        let api = Arc::new(MockLogoApi::with_catalog(10));
        let err = client(api.clone())
            .load_logos(Some("abc"), None, 5, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, LogoReviewError::SearchFailure(_)));
        assert!(api.search_calls().is_empty());
    }
}

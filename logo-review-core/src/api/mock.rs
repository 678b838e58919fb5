//! In-memory logo API for tests and offline runs.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{ApiBackend, LogoApi};
use crate::error::{LogoReviewError, Result};
use crate::model::{AnnotationRequest, BoundingBox, LogoId, LogoImageMeta, NeighborResult};

/// One recorded neighbor search call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCall {
    pub logo_id: Option<String>,
    pub index: Option<String>,
    pub count: u32,
}

#[derive(Default)]
struct MockState {
    catalog: BTreeMap<LogoId, LogoImageMeta>,
    unindexed: HashSet<LogoId>,
    scripted_searches: VecDeque<Result<Vec<NeighborResult>>>,
    fail_images: bool,
    fail_submit: bool,
    search_calls: Vec<SearchCall>,
    image_calls: Vec<Vec<LogoId>>,
    submitted: Vec<Vec<AnnotationRequest>>,
}

/// Deterministic stand-in for Robotoff.
///
/// Unless a response is scripted, a search around logo `X` ranks the catalog
/// by `|id - X|` and reports that difference as the distance, so `X` finds
/// itself at distance 0 unless it was marked unindexed. Index searches
/// return the catalog in id order.
#[derive(Default)]
pub struct MockLogoApi {
    state: Mutex<MockState>,
}

impl MockLogoApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock whose catalog holds logos `1..=size`.
    pub fn with_catalog(size: u64) -> Self {
        let mock = Self::new();
        for id in 1..=size {
            mock.insert_logo(Self::sample_logo(id));
        }
        mock
    }

    /// Synthetic logo metadata for `id`.
    pub fn sample_logo(id: LogoId) -> LogoImageMeta {
        let barcode = 3_000_000_000_000 + id;
        let offset = (id % 10) as f64 / 100.0;
        LogoImageMeta {
            id,
            source_image: format!("/{barcode}/{}.jpg", id % 7 + 1),
            bounding_box: BoundingBox::new(0.1 + offset, 0.2, 0.4 + offset, 0.6),
            annotation_type: None,
            annotation_value: None,
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn insert_logo(&self, logo: LogoImageMeta) {
        self.state().catalog.insert(logo.id, logo);
    }

    /// Drop `id` from the catalog, leaving any search referring to it dangling.
    pub fn remove_logo(&self, id: LogoId) {
        self.state().catalog.remove(&id);
    }

    /// Keep `id` out of synthesized search results, as if not yet indexed.
    pub fn mark_unindexed(&self, id: LogoId) {
        self.state().unindexed.insert(id);
    }

    /// Answer the next search with `results` verbatim.
    pub fn push_search_response(&self, results: Vec<NeighborResult>) {
        self.state().scripted_searches.push_back(Ok(results));
    }

    /// Fail the next search.
    pub fn push_search_failure(&self, message: impl Into<String>) {
        self.state()
            .scripted_searches
            .push_back(Err(LogoReviewError::ApiError(message.into())));
    }

    pub fn set_fail_images(&self, fail: bool) {
        self.state().fail_images = fail;
    }

    pub fn set_fail_submit(&self, fail: bool) {
        self.state().fail_submit = fail;
    }

    pub fn search_calls(&self) -> Vec<SearchCall> {
        self.state().search_calls.clone()
    }

    pub fn image_calls(&self) -> Vec<Vec<LogoId>> {
        self.state().image_calls.clone()
    }

    /// Every batch received by `submit_annotations`, in order.
    pub fn submitted(&self) -> Vec<Vec<AnnotationRequest>> {
        self.state().submitted.clone()
    }

    fn synthesize(
        state: &MockState,
        logo_id: Option<&str>,
        count: u32,
    ) -> Result<Vec<NeighborResult>> {
        let indexed = state
            .catalog
            .keys()
            .copied()
            .filter(|id| !state.unindexed.contains(id));

        let mut results: Vec<NeighborResult> = match logo_id {
            Some(raw) => {
                let target: LogoId = raw.parse().map_err(|_| {
                    LogoReviewError::ApiError(format!("invalid logo id: {raw}"))
                })?;
                let mut ranked: Vec<NeighborResult> = indexed
                    .map(|id| NeighborResult::new(id, id.abs_diff(target) as f64))
                    .collect();
                ranked.sort_by(|a, b| {
                    a.distance
                        .total_cmp(&b.distance)
                        .then(a.logo_id.cmp(&b.logo_id))
                });
                ranked
            }
            None => indexed
                .enumerate()
                .map(|(rank, id)| NeighborResult::new(id, rank as f64 + 1.0))
                .collect(),
        };

        results.truncate(count as usize);
        Ok(results)
    }
}

#[async_trait]
impl LogoApi for MockLogoApi {
    async fn search_neighbors(
        &self,
        logo_id: Option<&str>,
        index: Option<&str>,
        count: u32,
    ) -> Result<Vec<NeighborResult>> {
        let mut state = self.state();
        state.search_calls.push(SearchCall {
            logo_id: logo_id.map(str::to_owned),
            index: index.map(str::to_owned),
            count,
        });

        match state.scripted_searches.pop_front() {
            Some(scripted) => scripted,
            None => Self::synthesize(&state, logo_id, count),
        }
    }

    async fn fetch_logo_images(&self, ids: &[LogoId]) -> Result<Vec<LogoImageMeta>> {
        let mut state = self.state();
        state.image_calls.push(ids.to_vec());

        if state.fail_images {
            return Err(LogoReviewError::ApiError("images/logos returned status: 503".into()));
        }

        Ok(ids
            .iter()
            .filter_map(|id| state.catalog.get(id).cloned())
            .collect())
    }

    async fn submit_annotations(&self, batch: &[AnnotationRequest]) -> Result<()> {
        let mut state = self.state();
        if state.fail_submit {
            return Err(LogoReviewError::ApiError(
                "images/logos/annotate returned status: 500".into(),
            ));
        }
        state.submitted.push(batch.to_vec());
        Ok(())
    }

    fn backend(&self) -> ApiBackend {
        ApiBackend::Mock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reference_search_finds_itself_first() {
        let api = MockLogoApi::with_catalog(20);
        let results = api.search_neighbors(Some("10"), None, 5).await.unwrap();
        assert_eq!(results.len(), 5);
        assert_eq!(results[0], NeighborResult::new(10, 0.0));
        assert_eq!(results[1], NeighborResult::new(9, 1.0));
        assert_eq!(results[2], NeighborResult::new(11, 1.0));
    }

    #[tokio::test]
    async fn test_unindexed_logo_is_absent() {
        let api = MockLogoApi::with_catalog(20);
        api.mark_unindexed(10);
        let results = api.search_neighbors(Some("10"), None, 5).await.unwrap();
        assert!(results.iter().all(|r| r.logo_id != 10));
        assert!(results[0].distance > 0.0);
    }

    #[tokio::test]
    async fn test_index_search_in_id_order() {
        let api = MockLogoApi::with_catalog(5);
        let results = api.search_neighbors(None, Some("clip"), 3).await.unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.logo_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(
            api.search_calls(),
            vec![SearchCall {
                logo_id: None,
                index: Some("clip".into()),
                count: 3
            }]
        );
    }

    #[tokio::test]
    async fn test_scripted_responses_take_precedence() {
        let api = MockLogoApi::with_catalog(5);
        api.push_search_failure("boom");
        api.push_search_response(vec![NeighborResult::new(4, 2.5)]);
        assert!(api.search_neighbors(Some("1"), None, 5).await.is_err());
        let results = api.search_neighbors(Some("1"), None, 5).await.unwrap();
        assert_eq!(results, vec![NeighborResult::new(4, 2.5)]);
    }

    #[tokio::test]
    async fn test_submit_records_batches() {
        let api = MockLogoApi::new();
        let batch = vec![AnnotationRequest {
            logo_id: 1,
            annotation_type: "brand".into(),
            value: "ferrero".into(),
        }];
        api.submit_annotations(&batch).await.unwrap();
        assert_eq!(api.submitted(), vec![batch]);

        api.set_fail_submit(true);
        assert!(api.submit_annotations(&[]).await.is_err());
        assert_eq!(api.submitted().len(), 1);
    }
}

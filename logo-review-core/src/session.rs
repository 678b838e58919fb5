//! Logo review session: `Idle → Loading → Ready | Failed`.
//!
//! Every fetch starts from a [`LoadTicket`] stamped with the session
//! generation. A new search or a refresh bumps the generation, so results
//! of anything started earlier are recognized as stale and dropped when
//! they come back. "Load more" keeps the generation: it is discarded if a
//! search or refresh started after it, and applied otherwise.

use tracing::{debug, info, warn};

use crate::annotate::{AnnotationSubmitter, SubmitOutcome};
use crate::error::{LogoReviewError, Result};
use crate::model::{AnnotationData, LogoId, LogoRecord};
use crate::pagination::PaginationController;
use crate::params::{from_query_string, to_query_string, SearchParams};
use crate::search::LogoSearchClient;
use crate::selection::SelectionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// No search started yet.
    Idle,
    /// A fetch is in flight; the record list is not readable.
    Loading,
    Ready,
    /// The last full load failed; the view is empty.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    /// Full load for new search parameters.
    Search,
    /// Full load for the current parameters.
    Refresh,
    /// Widened search appended to the held records.
    LoadMore,
}

/// Everything a fetch needs, captured when it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    kind: LoadKind,
    params: SearchParams,
    count: u32,
    exclude: Vec<LogoId>,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn kind(&self) -> LoadKind {
        self.kind
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    /// Neighbor count the fetch asks for.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Run the fetch this ticket describes.
    pub async fn fetch(&self, client: &LogoSearchClient) -> Result<Vec<LogoRecord>> {
        client
            .load_logos(
                self.params.logo_id(),
                self.params.index(),
                self.count,
                &self.exclude,
            )
            .await
    }
}

/// What happened to a fetch result handed back to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Records were installed (full load) or appended (load more).
    Applied { records: usize },
    /// The fetch failed; see [`LoadKind`] for what was kept.
    Failed,
    /// A newer search started meanwhile; the result was dropped.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMoreOutcome {
    /// Not started: still loading, or the request would exceed the cap.
    Rejected,
    Appended { added: usize },
    /// The fetch failed; the held records are untouched.
    Failed,
    Stale,
}

impl From<ApplyOutcome> for LoadMoreOutcome {
    fn from(outcome: ApplyOutcome) -> Self {
        match outcome {
            ApplyOutcome::Applied { records } => LoadMoreOutcome::Appended { added: records },
            ApplyOutcome::Failed => LoadMoreOutcome::Failed,
            ApplyOutcome::Stale => LoadMoreOutcome::Stale,
        }
    }
}

/// State of one review page: search parameters, loaded records, selection.
pub struct LogoReviewSession {
    search: LogoSearchClient,
    submitter: AnnotationSubmitter,
    defaults: SearchParams,
    params: SearchParams,
    state: LoadState,
    generation: u64,
    refreshing: bool,
    store: SelectionStore,
    pagination: PaginationController,
    last_error: Option<LogoReviewError>,
}

impl LogoReviewSession {
    pub fn new(search: LogoSearchClient, submitter: AnnotationSubmitter) -> Self {
        Self::with_defaults(search, submitter, SearchParams::default())
    }

    /// Session whose URL form elides `defaults` instead of the built-in ones.
    pub fn with_defaults(
        search: LogoSearchClient,
        submitter: AnnotationSubmitter,
        defaults: SearchParams,
    ) -> Self {
        Self {
            search,
            submitter,
            params: defaults.clone(),
            pagination: PaginationController::new(defaults.count),
            defaults,
            state: LoadState::Idle,
            generation: 0,
            refreshing: false,
            store: SelectionStore::default(),
            last_error: None,
        }
    }

    pub fn search_client(&self) -> &LogoSearchClient {
        &self.search
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    /// Query string describing the current search.
    pub fn query_string(&self) -> String {
        to_query_string(&self.defaults, &self.params)
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Why the last load failed, until the next one starts.
    pub fn last_error(&self) -> Option<&LogoReviewError> {
        self.last_error.as_ref()
    }

    pub fn take_error(&mut self) -> Option<LogoReviewError> {
        self.last_error.take()
    }

    pub fn pagination(&self) -> &PaginationController {
        &self.pagination
    }

    pub fn store(&self) -> &SelectionStore {
        &self.store
    }

    /// Loaded records, or `None` while a fetch is in flight.
    pub fn visible_records(&self) -> Option<&[LogoRecord]> {
        (!self.is_loading()).then(|| self.store.records())
    }

    // ---------------------------------------------------------------------
    // Loading
    // ---------------------------------------------------------------------

    /// Start a full load for `params`, discarding all held records.
    pub fn begin_search(&mut self, params: SearchParams) -> LoadTicket {
        self.generation += 1;
        self.params = params;
        self.store = SelectionStore::default();
        self.pagination.reset(self.params.count);
        self.state = LoadState::Loading;
        self.refreshing = false;
        self.last_error = None;

        info!(
            generation = self.generation,
            query = %self.query_string(),
            "Starting logo search"
        );
        self.ticket(LoadKind::Search, self.params.count, Vec::new())
    }

    /// Start a full load only if `params` differ from the active search.
    pub fn update_params(&mut self, params: SearchParams) -> Option<LoadTicket> {
        if params == self.params && self.state != LoadState::Idle {
            debug!("Search parameters unchanged");
            return None;
        }
        Some(self.begin_search(params))
    }

    /// Start a full load from a URL query string.
    pub fn update_from_query(&mut self, query: &str) -> Option<LoadTicket> {
        let params = from_query_string(&self.defaults, query);
        self.update_params(params)
    }

    /// Reload the current search. Held records stay readable until the
    /// result arrives.
    pub fn begin_refresh(&mut self) -> LoadTicket {
        self.generation += 1;
        self.refreshing = true;
        self.last_error = None;
        self.pagination.reset(self.params.count);
        if self.state == LoadState::Idle {
            self.state = LoadState::Loading;
        }

        info!(generation = self.generation, "Refreshing logos");
        self.ticket(LoadKind::Refresh, self.params.count, Vec::new())
    }

    /// Widen the current search by `delta`, excluding held records.
    ///
    /// `None` when a fetch is already running or the cap would be exceeded.
    pub fn begin_load_more(&mut self, delta: u32) -> Option<LoadTicket> {
        if self.state != LoadState::Ready || self.refreshing {
            debug!(state = ?self.state, "Load more ignored while not ready");
            return None;
        }
        let Some(count) = self.pagination.request_more(delta) else {
            debug!(
                extra_requested = self.pagination.extra_requested(),
                delta, "Load more rejected by cap"
            );
            return None;
        };
        self.state = LoadState::Loading;
        self.last_error = None;

        info!(generation = self.generation, count, "Loading more logos");
        Some(self.ticket(LoadKind::LoadMore, count, self.store.ids()))
    }

    fn ticket(&self, kind: LoadKind, count: u32, exclude: Vec<LogoId>) -> LoadTicket {
        LoadTicket {
            generation: self.generation,
            kind,
            params: self.params.clone(),
            count,
            exclude,
        }
    }

    /// Hand a fetch result back to the session.
    pub fn apply(&mut self, ticket: LoadTicket, result: Result<Vec<LogoRecord>>) -> ApplyOutcome {
        if ticket.generation != self.generation {
            debug!(
                ticket_generation = ticket.generation,
                generation = self.generation,
                kind = ?ticket.kind,
                "Dropping stale result"
            );
            return ApplyOutcome::Stale;
        }

        match (ticket.kind, result) {
            (LoadKind::Search | LoadKind::Refresh, Ok(records)) => {
                let count = records.len();
                self.store = SelectionStore::pristine(records, self.params.reference_id());
                self.state = LoadState::Ready;
                self.refreshing = false;
                info!(generation = self.generation, records = count, "Logos loaded");
                ApplyOutcome::Applied { records: count }
            }
            (LoadKind::Search | LoadKind::Refresh, Err(e)) => {
                warn!(error = %e, generation = self.generation, "Logo load failed, clearing view");
                self.store = SelectionStore::default();
                self.state = LoadState::Failed;
                self.refreshing = false;
                self.last_error = Some(e);
                ApplyOutcome::Failed
            }
            (LoadKind::LoadMore, Ok(records)) => {
                let added = self.store.append(records);
                self.state = LoadState::Ready;
                info!(generation = self.generation, added, "More logos loaded");
                ApplyOutcome::Applied { records: added }
            }
            (LoadKind::LoadMore, Err(e)) => {
                warn!(error = %e, "Load more failed, keeping loaded logos");
                self.state = LoadState::Ready;
                self.last_error = Some(e);
                ApplyOutcome::Failed
            }
        }
    }

    async fn run(&mut self, ticket: LoadTicket) -> ApplyOutcome {
        let result = ticket.fetch(&self.search).await;
        self.apply(ticket, result)
    }

    /// Load `params` and wait for the result.
    pub async fn search(&mut self, params: SearchParams) -> ApplyOutcome {
        let ticket = self.begin_search(params);
        self.run(ticket).await
    }

    pub async fn refresh(&mut self) -> ApplyOutcome {
        let ticket = self.begin_refresh();
        self.run(ticket).await
    }

    pub async fn load_more(&mut self, delta: u32) -> LoadMoreOutcome {
        match self.begin_load_more(delta) {
            Some(ticket) => self.run(ticket).await.into(),
            None => LoadMoreOutcome::Rejected,
        }
    }

    /// Whether a "load more" of `delta` could start now.
    pub fn can_load_more(&self, delta: u32) -> bool {
        self.state == LoadState::Ready
            && !self.refreshing
            && self.pagination.can_request_more(delta)
    }

    // ---------------------------------------------------------------------
    // Selection
    // ---------------------------------------------------------------------

    pub fn toggle(&mut self, id: LogoId) {
        self.store.toggle(id);
    }

    pub fn select_all(&mut self) {
        self.store.select_all();
    }

    pub fn unselect_all(&mut self) {
        self.store.unselect_all();
    }

    pub fn can_unselect_all(&self) -> bool {
        self.store.can_unselect_all()
    }

    pub fn selected_ids(&self) -> Vec<LogoId> {
        self.store.selected_ids()
    }

    pub fn selected_records(&self) -> Vec<&LogoRecord> {
        self.store.selected_records()
    }

    pub fn reference_logo(&self) -> Option<&LogoRecord> {
        self.store.reference_logo()
    }

    /// Annotation already stored on the reference logo, as form defaults.
    pub fn reference_annotation(&self) -> AnnotationData {
        self.reference_logo()
            .map(|logo| {
                AnnotationData::new(
                    logo.annotation_type.clone().unwrap_or_default(),
                    logo.annotation_value.clone().unwrap_or_default(),
                )
            })
            .unwrap_or_default()
    }

    // ---------------------------------------------------------------------
    // Annotation
    // ---------------------------------------------------------------------

    /// Annotate the current selection; resets it to pristine once sent.
    pub async fn submit(&mut self, data: Option<&AnnotationData>) -> Result<SubmitOutcome> {
        let selected = self.store.selected_ids();
        let outcome = self.submitter.submit(&selected, data).await?;
        if outcome.resets_selection() {
            self.store.unselect_all();
        }
        Ok(outcome)
    }
}

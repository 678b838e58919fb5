//! Batch annotation of the selected logos.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::api::LogoApi;
use crate::error::{LogoReviewError, Result};
use crate::model::{AnnotationData, AnnotationRequest, LogoId};

/// How a batch leaves the submitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitMode {
    /// Send the batch to the annotation endpoint.
    #[default]
    Dispatch,
    /// Log the batch and send nothing (development runs).
    DryRun,
}

/// Result of a submit call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing was sent: no annotation given, or nothing selected.
    Skipped,
    /// The batch was only logged.
    DryRun { annotations: usize },
    /// The batch was accepted by the service.
    Submitted { annotations: usize },
}

impl SubmitOutcome {
    /// Whether the selection should go back to its pristine state.
    pub fn resets_selection(&self) -> bool {
        !matches!(self, SubmitOutcome::Skipped)
    }
}

/// One annotation line per id, all with the same `(type, value)`.
pub fn build_batch(selected_ids: &[LogoId], data: &AnnotationData) -> Vec<AnnotationRequest> {
    selected_ids
        .iter()
        .map(|&logo_id| AnnotationRequest {
            logo_id,
            annotation_type: data.annotation_type.clone(),
            value: data.value.clone(),
        })
        .collect()
}

#[derive(Clone)]
pub struct AnnotationSubmitter {
    api: Arc<dyn LogoApi>,
    mode: SubmitMode,
}

impl AnnotationSubmitter {
    pub fn new(api: Arc<dyn LogoApi>) -> Self {
        Self::with_mode(api, SubmitMode::Dispatch)
    }

    pub fn with_mode(api: Arc<dyn LogoApi>, mode: SubmitMode) -> Self {
        Self { api, mode }
    }

    pub fn mode(&self) -> SubmitMode {
        self.mode
    }

    /// Annotate every id in `selected_ids` with `data` in one call.
    ///
    /// Missing or blank data, or an empty selection, resolves immediately
    /// without a call. Failures are returned as `SubmitFailure` and never
    /// retried here.
    #[instrument(level = "info", skip(self, selected_ids), fields(selected = selected_ids.len(), mode = ?self.mode))]
    pub async fn submit(
        &self,
        selected_ids: &[LogoId],
        data: Option<&AnnotationData>,
    ) -> Result<SubmitOutcome> {
        let Some(data) = data.filter(|d| !d.is_empty()) else {
            info!("No annotation given, nothing to submit");
            return Ok(SubmitOutcome::Skipped);
        };
        if selected_ids.is_empty() {
            info!("No logo selected, nothing to submit");
            return Ok(SubmitOutcome::Skipped);
        }

        let batch = build_batch(selected_ids, data);

        match self.mode {
            SubmitMode::DryRun => {
                let preview = serde_json::to_string(&batch).unwrap_or_default();
                info!(annotations = batch.len(), batch = %preview, "Dry run, annotations not sent");
                Ok(SubmitOutcome::DryRun {
                    annotations: batch.len(),
                })
            }
            SubmitMode::Dispatch => {
                self.api.submit_annotations(&batch).await.map_err(|e| {
                    warn!(error = %e, annotations = batch.len(), "Annotation batch rejected");
                    LogoReviewError::into_submit_failure(e)
                })?;
                info!(annotations = batch.len(), "Annotation batch submitted");
                Ok(SubmitOutcome::Submitted {
                    annotations: batch.len(),
                })
            }
        }
    }
}

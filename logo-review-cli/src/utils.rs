//! Common utility functions shared across CLI commands.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use colored::Colorize;
use logo_review_core::{
    AnnotationSubmitter, ApplyOutcome, ClientConfig, LoadMoreOutcome, LogoApi, LogoRecord,
    LogoReviewSession, LogoSearchClient, MockLogoApi, RobotoffClient, SearchParams, SubmitMode,
    LOAD_MORE_STEP, MAX_TOTAL_COUNT,
};
use tracing::{debug, warn};

/// Number of logos in the `--mock` catalog.
pub const MOCK_CATALOG_SIZE: u64 = 1000;

/// Global flags selecting the logo service.
pub struct ApiOptions {
    pub mock: bool,
    pub robotoff_url: Option<String>,
    pub allow_http: bool,
}

/// Environment configuration with the command-line overrides applied,
/// validated once the overrides are in.
pub fn client_config(options: &ApiOptions) -> Result<ClientConfig> {
    let mut config = ClientConfig::from_env_unchecked().context("Invalid configuration")?;
    if let Some(url) = &options.robotoff_url {
        config.robotoff_url = url.clone();
    }
    if options.allow_http {
        config.https_only = false;
    }
    config.normalized().context("Invalid configuration")
}

/// Review session backed by Robotoff, or by the mock catalog with `--mock`.
pub fn build_session(options: &ApiOptions, dry_run: bool) -> Result<LogoReviewSession> {
    let (api, config) = if options.mock {
        warn!(catalog = MOCK_CATALOG_SIZE, "Using MOCK logo catalog");
        let api: Arc<dyn LogoApi> = Arc::new(MockLogoApi::with_catalog(MOCK_CATALOG_SIZE));
        (api, ClientConfig::default())
    } else {
        let config = client_config(options)?;
        let api: Arc<dyn LogoApi> = Arc::new(
            RobotoffClient::new(config.clone()).context("Failed to create Robotoff client")?,
        );
        (api, config)
    };
    debug!(backend = %api.backend(), "Logo API ready");

    let mode = if dry_run {
        SubmitMode::DryRun
    } else {
        SubmitMode::Dispatch
    };
    let search = LogoSearchClient::new(api.clone(), config.image_urls());
    Ok(LogoReviewSession::new(
        search,
        AnnotationSubmitter::with_mode(api, mode),
    ))
}

/// Run the search, then widen it `more` times.
///
/// A failed first load is an error. Widening stops quietly at the cap and
/// with a warning on failure, keeping what was loaded.
pub async fn load(
    session: &mut LogoReviewSession,
    params: SearchParams,
    more: u32,
    quiet: bool,
) -> Result<()> {
    if session.search(params).await == ApplyOutcome::Failed {
        return Err(session
            .take_error()
            .map(anyhow::Error::from)
            .unwrap_or_else(|| anyhow!("Logo search failed")));
    }

    for step in 1..=more {
        match session.load_more(LOAD_MORE_STEP).await {
            LoadMoreOutcome::Appended { added } => debug!(step, added, "Search widened"),
            LoadMoreOutcome::Rejected => {
                if !quiet {
                    eprintln!(
                        "{}",
                        format!("Reached the limit of {MAX_TOTAL_COUNT} results").yellow()
                    );
                }
                break;
            }
            LoadMoreOutcome::Failed => {
                let reason = session
                    .take_error()
                    .map(|e| e.to_string())
                    .unwrap_or_default();
                warn!(step, error = %reason, "Widening failed");
                if !quiet {
                    eprintln!("{}", format!("Could not load more logos: {reason}").yellow());
                }
                break;
            }
            LoadMoreOutcome::Stale => break,
        }
    }
    Ok(())
}

/// One line per record: selection mark, id, distance, stored annotation, crop.
pub fn format_record(record: &LogoRecord) -> String {
    let mark = if record.selected { "[x]" } else { "[ ]" };
    let annotation = match (&record.annotation_type, &record.annotation_value) {
        (Some(kind), Some(value)) => format!("{kind}={value}"),
        (Some(kind), None) => kind.clone(),
        _ => "-".to_string(),
    };
    format!(
        "{mark} {:>10}  {:>8.4}  {:<24}  {}",
        record.id, record.distance, annotation, record.image.cropped_image_url
    )
}

//! Annotate command implementation.

use std::collections::HashSet;

use anyhow::Result;
use colored::Colorize;
use logo_review_core::{AnnotationData, LogoId, SearchParams, SubmitOutcome};
use tracing::warn;

use crate::utils::{build_session, load, ApiOptions};

/// Everything the annotate command was asked to do.
pub struct AnnotateRequest {
    pub params: SearchParams,
    pub more: u32,
    pub annotation_type: Option<String>,
    pub value: Option<String>,
    pub select: Vec<LogoId>,
    pub all: bool,
    pub dry_run: bool,
}

/// Execute the annotate command.
pub async fn execute(api: &ApiOptions, request: AnnotateRequest, quiet: bool) -> Result<()> {
    request.params.validate()?;

    let mut session = build_session(api, request.dry_run)?;
    load(&mut session, request.params, request.more, quiet).await?;

    if request.all {
        session.select_all();
    }
    let loaded: HashSet<LogoId> = session.store().ids().into_iter().collect();
    let mut seen = HashSet::new();
    for id in request.select {
        if !seen.insert(id) || session.store().locked_id() == Some(id) {
            continue;
        }
        if !loaded.contains(&id) {
            warn!(logo_id = id, "Selected logo not among loaded results");
            if !quiet {
                eprintln!(
                    "{}",
                    format!("Logo {id} is not among the loaded results, ignoring").yellow()
                );
            }
            continue;
        }
        session.toggle(id);
    }

    let defaults = session.reference_annotation();
    let data = AnnotationData::new(
        request.annotation_type.unwrap_or(defaults.annotation_type),
        request.value.unwrap_or(defaults.value),
    );
    let selected = session.selected_ids();

    match session.submit(Some(&data)).await? {
        SubmitOutcome::Skipped => {
            println!(
                "{}",
                "Nothing to submit: annotation type and value are both required, and at least one logo must be selected"
                    .yellow()
            );
        }
        SubmitOutcome::DryRun { annotations } => {
            println!(
                "{}",
                format!("Dry run: {annotations} annotations not sent").yellow().bold()
            );
            if !quiet {
                print_batch(&data, &selected);
            }
        }
        SubmitOutcome::Submitted { annotations } => {
            println!(
                "{}",
                format!(
                    "Annotated {annotations} logos as {}={}",
                    data.annotation_type, data.value
                )
                .green()
                .bold()
            );
            if !quiet {
                print_batch(&data, &selected);
            }
        }
    }

    Ok(())
}

fn print_batch(data: &AnnotationData, ids: &[LogoId]) {
    let ids = ids
        .iter()
        .map(LogoId::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    println!("   {} {}", "Type:".dimmed(), data.annotation_type);
    println!("   {} {}", "Value:".dimmed(), data.value);
    println!("   {} {}", "Logos:".dimmed(), ids);
}

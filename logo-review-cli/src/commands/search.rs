//! Search command implementation.

use anyhow::{Context, Result};
use colored::Colorize;
use logo_review_core::SearchParams;
use tracing::info;

use crate::utils::{build_session, format_record, load, ApiOptions};
use crate::OutputFormat;

/// Execute the search command.
pub async fn execute(
    api: &ApiOptions,
    params: SearchParams,
    more: u32,
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    params.validate()?;

    let mut session = build_session(api, false)?;
    load(&mut session, params, more, quiet).await?;

    let records = session.visible_records().unwrap_or_default();
    info!(records = records.len(), "Search finished");

    match format {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(records).context("Failed to serialize results")?;
            println!("{json}");
        }
        OutputFormat::Text => {
            if !quiet {
                println!();
                println!(
                    "{}",
                    format!("Loaded {} logos", records.len()).green().bold()
                );
                if let Some(reference) = session.reference_logo() {
                    println!("   {} {}", "Reference logo:".dimmed(), reference.id);
                }
                println!("   {} ?{}", "Link:".dimmed(), session.query_string());
                println!();
            }
            for record in records {
                println!("{}", format_record(record));
            }
        }
    }

    Ok(())
}

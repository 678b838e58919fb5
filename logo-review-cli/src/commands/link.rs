//! Review link conversion.

use anyhow::{Context, Result};
use logo_review_core::{from_query_string, to_query_string, SearchParams};

use crate::OutputFormat;

/// Print the query string of `params`, keys at their default left out.
pub fn encode(params: &SearchParams) -> Result<()> {
    println!("{}", to_query_string(&SearchParams::default(), params));
    Ok(())
}

/// Print the search parameters `query` decodes to.
pub fn decode(query: &str, format: OutputFormat) -> Result<()> {
    let params = from_query_string(&SearchParams::default(), query);

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&params)
                .context("Failed to serialize parameters")?;
            println!("{json}");
        }
        OutputFormat::Text => {
            println!("logo_id: {}", params.logo_id().unwrap_or("-"));
            println!("index:   {}", params.index().unwrap_or("-"));
            println!("count:   {}", params.count);
        }
    }
    Ok(())
}

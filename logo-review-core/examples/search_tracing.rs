//! Example showing the tracing output of a live logo search.
//!
//! Run with: cargo run -p logo-review-core --example search_tracing -- 42

use std::sync::Arc;

use logo_review_core::{ClientConfig, LogoSearchClient, RobotoffClient};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::new("logo_review_core=debug,info"))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    let logo_id = std::env::args().nth(1).unwrap_or_else(|| "1".to_string());

    println!("=== Logo Search Tracing Demo ===\n");

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            return;
        }
    };
    println!("Config: {:?}\n", config);

    let api = match RobotoffClient::new(config.clone()) {
        Ok(api) => Arc::new(api),
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };
    let client = LogoSearchClient::new(api, config.image_urls());

    println!("\nSearching neighbors of logo {}...\n", logo_id);

    match client.load_logos(Some(&logo_id), None, 10, &[]).await {
        Ok(records) => {
            println!("\nLoaded {} logos", records.len());
            for record in records {
                println!("   {:>10}  {:.4}  {}", record.id, record.distance, record.image.cropped_image_url);
            }
        }
        Err(e) => {
            println!("\nFailed: {}", e);
        }
    }
}

//! CLI orchestrator - prompt for advertisement URLs, run the extraction
//! pipeline, and append rows to the persisted workbook.

use anyhow::{Context, Result};
use sreality_ingest::extraction::columns::COLUMN_ORDER;
use sreality_ingest::extraction::fetch::{DEFAULT_API_BASE_URL, DEFAULT_USER_AGENT};
use sreality_ingest::extraction::{
    extract_row, listing_id_from_url, salvage, DataSheet, Listing, SrealityClient,
};
use std::env;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env();
    let multi = env::args().any(|arg| arg == "-m");

    let client = SrealityClient::new(&config.api_base_url, &config.user_agent)?;
    let mut sheet = DataSheet::open(&config.workbook_path)?;

    run_prompt_loop(&client, &mut sheet, &config, multi).await;

    // One save per session, also reached on Ctrl-C or EOF.
    sheet.save()?;
    info!("New entries successfully saved");

    Ok(())
}

/// Prompt for URLs until single-shot mode finishes, input ends, or the user
/// interrupts. Per-listing failures are logged and never end the session.
async fn run_prompt_loop(
    client: &SrealityClient,
    sheet: &mut DataSheet,
    config: &Config,
    multi: bool,
) {
    let mut lines: Lines<BufReader<Stdin>> = BufReader::new(tokio::io::stdin()).lines();

    loop {
        println!("Insert the advertisement URL:");

        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Terminated by the user");
                break;
            }
            line = lines.next_line() => match line {
                Ok(line) => line,
                Err(e) => {
                    error!("Failed to read input: {}", e);
                    break;
                }
            },
        };

        let Some(url) = line else { break };
        let url = url.trim().to_string();
        if url.is_empty() {
            break;
        }

        match process_listing(client, sheet, config, &url).await {
            Ok(()) => {}
            Err(e) => error!("Failed to process {}: {:#}", url, e),
        }

        if !multi {
            break;
        }
    }
}

/// Fetch one listing, run every attribute rule, and append the row.
///
/// A fetch error aborts this listing with no partial row. Attribute failures
/// are logged per attribute and trigger one salvage write; the row is still
/// written with whatever attributes succeeded.
async fn process_listing(
    client: &SrealityClient,
    sheet: &mut DataSheet,
    config: &Config,
    url: &str,
) -> Result<()> {
    let id = listing_id_from_url(url);
    let identifier: u64 = id
        .parse()
        .with_context(|| format!("no numeric listing id in URL: {}", url))?;

    let raw = client.fetch(&id).await?;
    let listing = Listing::new(identifier, raw);

    let (cells, failures) = extract_row(&listing);
    for (attr, e) in &failures {
        error!("Exception while processing {}: {}", attr.name(), e);
    }
    if !failures.is_empty() {
        let path = salvage::save_listing(&config.salvage_dir, &listing)?;
        info!("Saved listing for manual follow-up: {:?}", path);
    }

    let row = sheet.append_row(&cells)?;
    info!(
        "Listing {} written to row {} ({}/{} attributes)",
        identifier,
        row,
        cells.len(),
        COLUMN_ORDER.len()
    );

    Ok(())
}

/// Configuration loaded from environment variables
#[derive(Debug, Clone)]
struct Config {
    workbook_path: PathBuf,
    salvage_dir: PathBuf,
    api_base_url: String,
    user_agent: String,
}

impl Config {
    fn from_env() -> Self {
        Config {
            workbook_path: env::var("WORKBOOK_PATH")
                .unwrap_or_else(|_| "workbooks/data.xlsx".to_string())
                .into(),

            salvage_dir: env::var("SALVAGE_DIR")
                .unwrap_or_else(|_| "wrongly_processed_ads".to_string())
                .into(),

            api_base_url: env::var("SREALITY_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string()),

            user_agent: env::var("SREALITY_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
        }
    }
}

//! Salvage store - fallback persistence for listings whose extraction
//! partially failed, kept around for manual reprocessing.

use crate::extraction::listing::Listing;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Serialize the whole listing (identifier + raw payload) to
/// `{dir}/{identifier}.json`. Returns the path written.
pub fn save_listing(dir: &Path, listing: &Listing) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create salvage dir {:?}", dir))?;

    let path = dir.join(format!("{}.json", listing.identifier()));
    let json = serde_json::to_string_pretty(listing)?;
    fs::write(&path, json)
        .with_context(|| format!("failed to write salvage file {:?}", path))?;

    info!("Salvaged listing {} to {:?}", listing.identifier(), path);
    Ok(path)
}

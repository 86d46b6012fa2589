//! Fetch functions - derive the listing identifier and retrieve raw data
//! from the sreality API

use crate::extraction::types::RawListing;
use anyhow::{bail, Result};
use reqwest::header::USER_AGENT;
use reqwest::Client;
use tracing::info;

/// Default endpoint for the listing detail API.
pub const DEFAULT_API_BASE_URL: &str = "https://www.sreality.cz/api/cs/v2/estates";

/// Desktop browser user-agent; the API serves bots an empty shell otherwise.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Extract the listing identifier from an advertisement URL.
///
/// The identifier is the leading run of decimal digits in the final path
/// segment, e.g.
/// `.../praha-zizkov-biskupcova/3890874972#img=0` → `"3890874972"`.
///
/// Total function: a segment with no leading digit yields an empty string;
/// the fetcher rejects that before issuing any request.
pub fn listing_id_from_url(url: &str) -> String {
    let tail = url.rsplit('/').next().unwrap_or(url);
    tail.chars().take_while(|c| c.is_ascii_digit()).collect()
}

/// HTTP client for the listing detail endpoint.
///
/// Base URL and user agent are carried per client instance so the spoofed
/// header stays request-scoped configuration, not process-global state.
pub struct SrealityClient {
    client: Client,
    base_url: String,
    user_agent: String,
}

impl SrealityClient {
    pub fn new(base_url: impl Into<String>, user_agent: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(SrealityClient {
            client,
            base_url: base_url.into(),
            user_agent: user_agent.into(),
        })
    }

    /// Fetch the raw JSON representation of one listing.
    ///
    /// Transport failure, a non-success status, or a non-JSON body all
    /// propagate as errors; there is no retry.
    pub async fn fetch(&self, id: &str) -> Result<RawListing> {
        if id.is_empty() {
            bail!("no listing id found in URL");
        }

        let url = format!("{}/{}?tms=200", self.base_url, id);
        info!("Fetching listing {} from {}", id, url);

        let response = self
            .client
            .get(&url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            bail!("HTTP request failed: {}", status);
        }

        let raw: RawListing = response.json().await?;
        info!("Fetched listing {} ({} items)", id, raw.items.len());

        Ok(raw)
    }
}

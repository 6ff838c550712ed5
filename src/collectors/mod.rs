// Job source adapters: three JSON APIs and a set of HTML scrapers, all
// producing normalized `JobPosting`s behind one trait.

pub mod adzuna;
pub mod jooble;
pub mod jsearch;
pub mod scrape;
pub mod sites;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};

use crate::error::SourceError;
use crate::models::job::JobPosting;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const SCRAPE_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on postings taken from one API response.
pub const API_PAGE_SIZE: usize = 20;

/// Trait that all job sources implement.
/// Each source fetches one page of results for a keyword query and maps
/// them into normalized postings.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Human-readable name used in logs and the sources listing.
    fn name(&self) -> &str;

    /// Fetch one page (zero-based) of postings for `query`.
    async fn fetch(&self, query: &str, page: u32) -> Result<Vec<JobPosting>, SourceError>;
}

/// Run a source and swallow its failure: errors are logged with the source
/// name and turned into an empty list.
pub async fn collect(source: &dyn SourceAdapter, query: &str, page: u32) -> Vec<JobPosting> {
    match source.fetch(query, page).await {
        Ok(jobs) => {
            tracing::info!("[{}] Found {} jobs", source.name(), jobs.len());
            jobs
        }
        Err(SourceError::MissingCredentials) => {
            tracing::debug!("[{}] No credentials configured, skipping", source.name());
            Vec::new()
        }
        Err(e) => {
            tracing::warn!("[{}] {e}", source.name());
            Vec::new()
        }
    }
}

/// Treat an unset or blank credential as missing.
pub(crate) fn credential(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Client for JSON APIs. Per-request timeouts are set by each adapter.
pub fn api_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("jobscout/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Client for HTML scraping with browser-like headers.
pub fn scraper_client() -> reqwest::Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-GB,en-US;q=0.9,en;q=0.8"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(
        "sec-ch-ua",
        HeaderValue::from_static(
            "\"Not_A Brand\";v=\"8\", \"Chromium\";v=\"120\", \"Google Chrome\";v=\"120\"",
        ),
    );
    headers.insert("sec-ch-ua-mobile", HeaderValue::from_static("?0"));
    headers.insert("sec-ch-ua-platform", HeaderValue::from_static("\"Windows\""));
    headers.insert("sec-fetch-dest", HeaderValue::from_static("document"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("none"));
    headers.insert("sec-fetch-user", HeaderValue::from_static("?1"));
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );

    reqwest::Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .default_headers(headers)
        .timeout(SCRAPE_TIMEOUT)
        .build()
}

use std::time::Duration;

use reqwest::redirect::Policy;
use url::Url;

const HEAD_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_REDIRECTS: usize = 5;

/// True when `url` parses as an absolute http(s) URL.
pub fn is_well_formed(url: &str) -> bool {
    Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Best-effort liveness checks for apply links.
#[derive(Clone)]
pub struct UrlValidator {
    client: reqwest::Client,
}

impl UrlValidator {
    pub fn new(user_agent: &str) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(HEAD_TIMEOUT)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(Self { client })
    }

    /// HEAD the URL and report whether it answered 2xx/3xx.
    pub async fn is_reachable(&self, url: &str) -> bool {
        match self.client.head(url).send().await {
            Ok(resp) => resp.status().is_success() || resp.status().is_redirection(),
            Err(e) => {
                tracing::debug!("HEAD {url} failed: {e}");
                false
            }
        }
    }

    /// Decide whether to keep an apply link.
    ///
    /// A failed probe is not proof of a dead link since many boards reject
    /// HEAD, so anything well-formed is kept.
    pub async fn validate(&self, url: &str) -> bool {
        if !is_well_formed(url) {
            return false;
        }
        if !self.is_reachable(url).await {
            tracing::debug!("Keeping {url} although reachability was inconclusive");
        }
        true
    }
}

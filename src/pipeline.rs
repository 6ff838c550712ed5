//! Multi-source job aggregation.
//!
//! A search first consults the result cache. On a miss the API sources are
//! tried one at a time in priority order and the first usable answer wins.
//! Only when none of them produce anything are the HTML scrapers run, every
//! site in turn with a pause between requests. The merged set is filtered
//! to well-formed apply links, deduplicated by URL, replaced by a synthetic
//! list if still empty, and written back to the cache.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::cache::ResultCache;
use crate::collectors::{self, SourceAdapter};
use crate::dedup::dedupe;
use crate::models::job::{AggregationResult, JobPosting, ResultSource};
use crate::validate::{UrlValidator, is_well_formed};

pub const DEFAULT_QUERY: &str = "student job internship";

/// Substring that marks sandbox/demo API answers.
const PLACEHOLDER_MARKER: &str = "example";

/// Upper bound on concurrent HEAD probes when link checking is enabled.
const MAX_CONCURRENT_PROBES: usize = 8;

pub const FALLBACK_SOURCE: &str = "Fallback (synthetic)";

#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    /// Scrape only the named site (case-insensitive).
    pub site: Option<String>,
    pub bypass_cache: bool,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            site: None,
            bypass_cache: false,
        }
    }
}

pub struct Aggregator {
    api_sources: Vec<Arc<dyn SourceAdapter>>,
    scrapers: Vec<Arc<dyn SourceAdapter>>,
    cache: Arc<dyn ResultCache>,
    link_checker: Option<UrlValidator>,
    scrape_delay: Duration,
    pages_per_site: u32,
}

impl Aggregator {
    pub fn new(
        api_sources: Vec<Arc<dyn SourceAdapter>>,
        scrapers: Vec<Arc<dyn SourceAdapter>>,
        cache: Arc<dyn ResultCache>,
    ) -> Self {
        Self {
            api_sources,
            scrapers,
            cache,
            link_checker: None,
            scrape_delay: Duration::from_secs(1),
            pages_per_site: 1,
        }
    }

    pub fn with_scrape_delay(mut self, delay: Duration) -> Self {
        self.scrape_delay = delay;
        self
    }

    pub fn with_pages_per_site(mut self, pages: u32) -> Self {
        self.pages_per_site = pages.max(1);
        self
    }

    /// Probe every apply link with a HEAD request before returning it.
    pub fn with_link_checker(mut self, checker: UrlValidator) -> Self {
        self.link_checker = Some(checker);
        self
    }

    /// Names of the configured scraper sites.
    pub fn site_names(&self) -> Vec<String> {
        self.scrapers.iter().map(|s| s.name().to_string()).collect()
    }

    /// Run a search. Never fails: source errors are logged and absorbed, and
    /// a total failure yields the synthetic fallback list.
    pub async fn aggregate(&self, request: &SearchRequest) -> AggregationResult {
        let query = request.query.trim();
        tracing::info!(
            query,
            site = request.site.as_deref(),
            bypass_cache = request.bypass_cache,
            "Job search"
        );

        if !request.bypass_cache
            && let Some(jobs) = self.cached().await
        {
            tracing::info!("Returning {} cached jobs", jobs.len());
            return AggregationResult::new(jobs, ResultSource::Cache);
        }

        let jobs = match &request.site {
            Some(site) => self.scrape_site(site, query).await,
            None => match self.try_api_sources(query).await {
                Some(jobs) => jobs,
                None => self.try_scrapers(query).await,
            },
        };

        let jobs = self.finalize(jobs).await;
        AggregationResult::new(jobs, ResultSource::Scraper)
    }

    async fn cached(&self) -> Option<Vec<JobPosting>> {
        match self.cache.get().await {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::warn!("Cache read failed: {e}");
                None
            }
        }
    }

    /// First API source whose answer looks real, in priority order.
    async fn try_api_sources(&self, query: &str) -> Option<Vec<JobPosting>> {
        for source in &self.api_sources {
            let jobs: Vec<_> = collectors::collect(source.as_ref(), query, 0)
                .await
                .into_iter()
                .filter(|job| is_well_formed(&job.url))
                .collect();
            if is_usable(&jobs) {
                tracing::info!("{} found {} jobs", source.name(), jobs.len());
                return Some(jobs);
            }
        }
        None
    }

    async fn try_scrapers(&self, query: &str) -> Vec<JobPosting> {
        tracing::info!("APIs unavailable, falling back to site scraping");

        let mut all = Vec::new();
        let mut first_request = true;
        for scraper in &self.scrapers {
            for page in 0..self.pages_per_site {
                if !first_request {
                    tokio::time::sleep(self.scrape_delay).await;
                }
                first_request = false;

                let jobs = collectors::collect(scraper.as_ref(), query, page).await;
                all.extend(jobs.into_iter().filter(|job| is_well_formed(&job.url)));
            }
        }
        all
    }

    async fn scrape_site(&self, site: &str, query: &str) -> Vec<JobPosting> {
        let Some(scraper) = self
            .scrapers
            .iter()
            .find(|s| s.name().eq_ignore_ascii_case(site.trim()))
        else {
            tracing::warn!("Unknown site: {site}");
            return Vec::new();
        };

        collectors::collect(scraper.as_ref(), query, 0)
            .await
            .into_iter()
            .filter(|job| is_well_formed(&job.url))
            .collect()
    }

    async fn finalize(&self, jobs: Vec<JobPosting>) -> Vec<JobPosting> {
        let valid: Vec<_> = jobs
            .into_iter()
            .filter(|job| is_well_formed(&job.url))
            .collect();
        let valid = match &self.link_checker {
            Some(checker) => check_links(checker, valid).await,
            None => valid,
        };

        let mut jobs = dedupe(valid);
        if jobs.is_empty() {
            tracing::warn!("Every source came back empty, using fallback listings");
            jobs = fallback_jobs();
        }

        if let Err(e) = self.cache.put(&jobs).await {
            tracing::warn!("Cache write failed: {e}");
        }

        tracing::info!("Total jobs found: {}", jobs.len());
        jobs
    }
}

/// Run `validate` on every apply link, a bounded number at a time, keeping
/// input order.
async fn check_links(checker: &UrlValidator, jobs: Vec<JobPosting>) -> Vec<JobPosting> {
    let permits = Arc::new(Semaphore::new(MAX_CONCURRENT_PROBES));
    let mut probes = JoinSet::new();
    for (index, job) in jobs.iter().enumerate() {
        let checker = checker.clone();
        let permits = permits.clone();
        let url = job.url.clone();
        probes.spawn(async move {
            let _permit = permits.acquire_owned().await;
            (index, checker.validate(&url).await)
        });
    }

    // A probe that died keeps its link.
    let mut keep = vec![true; jobs.len()];
    while let Some(outcome) = probes.join_next().await {
        match outcome {
            Ok((index, ok)) => keep[index] = ok,
            Err(e) => tracing::warn!("Link probe task failed: {e}"),
        }
    }

    jobs.into_iter()
        .zip(keep)
        .filter_map(|(job, ok)| ok.then_some(job))
        .collect()
}

/// An API answer is accepted when it is non-empty and its first entry has a
/// real-looking link. Only the first entry is inspected; callers pass the
/// answer already filtered to well-formed links.
fn is_usable(jobs: &[JobPosting]) -> bool {
    jobs.first()
        .is_some_and(|first| !first.url.is_empty() && !first.url.contains(PLACEHOLDER_MARKER))
}

/// Illustrative listings returned when every source failed.
pub fn fallback_jobs() -> Vec<JobPosting> {
    let now = Utc::now();
    let entries = [
        (
            "Marketing Intern",
            "TechStart UK",
            "London, UK",
            "£20,000 - £25,000",
            "Join our marketing team to gain hands-on experience in digital marketing, social media, and brand management.",
            "marketing-intern",
        ),
        (
            "Software Development Placement",
            "InnovateTech",
            "Manchester, UK",
            "£22,000 - £28,000",
            "Year-long placement for CS students. Work with React, Node.js, and cloud technologies.",
            "dev-placement",
        ),
        (
            "Data Science Summer Intern",
            "DataDriven Ltd",
            "Remote (UK)",
            "£18,000 - £22,000",
            "Summer internship analyzing datasets and building ML models. Python and SQL required.",
            "data-science-intern",
        ),
        (
            "Business Analyst Apprentice",
            "GlobalFinance",
            "Birmingham, UK",
            "£19,000",
            "Apprenticeship role analyzing business processes and helping improve efficiency.",
            "business-apprentice",
        ),
        (
            "UX Design Intern",
            "CreativeStudio",
            "Bristol, UK",
            "£17,000 - £20,000",
            "Assist in user research, wireframing, and prototyping. Figma experience preferred.",
            "ux-intern",
        ),
    ];

    entries
        .into_iter()
        .enumerate()
        .map(
            |(i, (title, company, location, salary, description, path))| JobPosting {
                id: format!("fallback-{}", i + 1),
                title: title.to_string(),
                company: company.to_string(),
                location: location.to_string(),
                salary: Some(salary.to_string()),
                description: description.to_string(),
                url: format!("https://example.com/jobs/{path}"),
                source: FALLBACK_SOURCE.to_string(),
                posted_date: now,
            },
        )
        .collect()
}

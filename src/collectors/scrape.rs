//! HTML job-board scraping driven by declarative [`SiteConfig`]s.

use async_trait::async_trait;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use rand::distr::{Alphanumeric, SampleString};
use reqwest::StatusCode;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::collectors::SourceAdapter;
use crate::dates::{self, DateStyle};
use crate::error::SourceError;
use crate::models::job::{JobPosting, RawPosting, job_id};

/// CSS selectors for one site's result cards. Field selectors are
/// evaluated inside each `job_list` match.
#[derive(Debug, Clone)]
pub struct Selectors {
    pub job_list: &'static str,
    pub title: &'static str,
    pub company: &'static str,
    pub location: &'static str,
    pub salary: &'static str,
    pub description: &'static str,
    pub apply_link: &'static str,
    pub date: &'static str,
}

/// How a site numbers its result pages.
#[derive(Debug, Clone)]
pub enum Paging {
    /// Zero-based result offset, `page * per_page`.
    Offset { key: &'static str, per_page: u32 },
    /// One-based page number.
    Page { key: &'static str },
}

#[derive(Debug, Clone)]
pub struct SearchParams {
    pub query_key: &'static str,
    pub location_key: &'static str,
    pub location: &'static str,
    pub paging: Paging,
}

impl SearchParams {
    pub fn build(&self, query: &str, page: u32) -> Vec<(&'static str, String)> {
        let paging = match &self.paging {
            Paging::Offset { key, per_page } => (*key, (page * per_page).to_string()),
            Paging::Page { key } => (*key, (page + 1).to_string()),
        };
        vec![
            (self.query_key, query.to_string()),
            (self.location_key, self.location.to_string()),
            paging,
        ]
    }
}

/// How to turn a result card into an absolute apply link.
#[derive(Debug, Clone)]
pub enum LinkStyle {
    /// Read the `data-jk` job key and build `{view_url}?jk=...`; fall back
    /// to the `apply_link` href when no key is present.
    JobKey {
        key_selectors: &'static [&'static str],
        view_url: &'static str,
        suffix: &'static str,
    },
    /// Use the `apply_link` href, resolved against the site's base URL.
    Href,
}

/// Static description of one scraped job board.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub name: &'static str,
    pub base_url: String,
    pub search_url: String,
    pub selectors: Selectors,
    pub params: SearchParams,
    pub link: LinkStyle,
    pub date_style: DateStyle,
}

/// A [`SourceAdapter`] that scrapes one job board's search page.
pub struct SiteScraper {
    config: SiteConfig,
    client: reqwest::Client,
}

impl SiteScraper {
    pub fn new(config: SiteConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl SourceAdapter for SiteScraper {
    fn name(&self) -> &str {
        self.config.name
    }

    async fn fetch(&self, query: &str, page: u32) -> Result<Vec<JobPosting>, SourceError> {
        tracing::debug!("[Scraper] Scraping {} (page {})", self.config.name, page + 1);

        let resp = self
            .client
            .get(&self.config.search_url)
            .query(&self.config.params.build(query, page))
            .send()
            .await?;

        if resp.status() != StatusCode::OK {
            return Err(SourceError::Status(resp.status().as_u16()));
        }

        let body = resp.text().await?;
        parse_listings(&self.config, &body)
    }
}

struct CompiledSelectors {
    job_list: Selector,
    title: Selector,
    company: Selector,
    location: Selector,
    salary: Selector,
    description: Selector,
    apply_link: Selector,
    date: Selector,
}

impl CompiledSelectors {
    fn compile(s: &Selectors) -> Result<Self, SourceError> {
        Ok(Self {
            job_list: selector(s.job_list)?,
            title: selector(s.title)?,
            company: selector(s.company)?,
            location: selector(s.location)?,
            salary: selector(s.salary)?,
            description: selector(s.description)?,
            apply_link: selector(s.apply_link)?,
            date: selector(s.date)?,
        })
    }
}

fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|e| SourceError::Selector(format!("{css}: {e:?}")))
}

/// Extract postings from a search results page.
pub fn parse_listings(config: &SiteConfig, html: &str) -> Result<Vec<JobPosting>, SourceError> {
    let sel = CompiledSelectors::compile(&config.selectors)?;
    let document = Html::parse_document(html);

    Ok(document
        .select(&sel.job_list)
        .filter_map(|card| {
            let raw = RawPosting {
                title: first_text(&card, &sel.title),
                company: first_text(&card, &sel.company),
                location: first_text(&card, &sel.location),
                salary: Some(first_text(&card, &sel.salary)),
                description: first_text(&card, &sel.description),
                url: apply_url(config, &card, &sel.apply_link),
                source: config.name.to_string(),
                posted_date: dates::parse(&first_text(&card, &sel.date), config.date_style),
            };
            raw.normalize(job_id(config.name, &discriminator()))
        })
        .collect())
}

fn first_text(card: &ElementRef, selector: &Selector) -> String {
    card.select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn first_attr(card: &ElementRef, css: &str, attr: &str) -> Option<String> {
    let sel = Selector::parse(css).ok()?;
    card.select(&sel)
        .find_map(|el| el.value().attr(attr))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn apply_url(config: &SiteConfig, card: &ElementRef, link: &Selector) -> String {
    let href = card
        .select(link)
        .find_map(|el| el.value().attr("href"))
        .map(str::trim)
        .unwrap_or("");

    match &config.link {
        LinkStyle::JobKey {
            key_selectors,
            view_url,
            suffix,
        } => {
            let key = key_selectors
                .iter()
                .find_map(|css| first_attr(card, css, "data-jk"));
            match key {
                Some(jk) => format!(
                    "{view_url}?jk={}{suffix}",
                    utf8_percent_encode(&jk, NON_ALPHANUMERIC)
                ),
                None => resolve(&config.base_url, href),
            }
        }
        LinkStyle::Href => resolve(&config.base_url, href),
    }
}

/// Resolve a possibly-relative href against `base`. An empty href stays
/// empty so the posting is later rejected rather than pointing at the
/// site's home page.
fn resolve(base: &str, href: &str) -> String {
    if href.is_empty() {
        return String::new();
    }
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    Url::parse(base)
        .and_then(|b| b.join(href))
        .map(|u| u.to_string())
        .unwrap_or_default()
}

// Random suffix so ids stay unique when several pages are scraped in the
// same millisecond.
fn discriminator() -> String {
    Alphanumeric
        .sample_string(&mut rand::rng(), 9)
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::Router;
    use axum::extract::Query;
    use axum::http::StatusCode as AxumStatus;
    use axum::response::Html as AxumHtml;
    use axum::routing::get;

    use super::*;
    use crate::collectors::sites;
    use crate::collectors::testing::serve;

    const REED_PAGE: &str = r#"
        <html><body>
          <article class="job-card">
            <h2 class="job-card__title">Graduate Marketing Assistant</h2>
            <a class="job-card__link" href="/jobs/graduate-marketing-assistant/123">View</a>
            <div class="job-card__company-name">Acme Ltd</div>
            <div class="job-card__location">Manchester</div>
            <div class="job-card__salary">£24,000 per annum</div>
            <p class="job-card__description">  Support the marketing team.  </p>
            <span class="job-card__posted-date">Posted 2 weeks ago</span>
          </article>
          <article class="job-card">
            <h2 class="job-card__title">   </h2>
            <a class="job-card__link" href="/jobs/blank/456">View</a>
          </article>
          <article class="job-card">
            <h2 class="job-card__title">Sales Intern</h2>
            <a class="job-card__link" href="https://apply.partner.test/789">View</a>
          </article>
        </body></html>
    "#;

    const INDEED_PAGE: &str = r#"
        <ul class="jobsearch-ResultsList">
          <li>
            <h2 class="jobTitle"><a data-jk="a1b2c3">Kitchen Porter</a></h2>
            <span class="companyName">The Ivy</span>
            <div class="companyLocation">London</div>
            <div class="job-snippet">Weekend shifts.</div>
            <span class="date">Posted 5 hours ago</span>
          </li>
          <li>
            <h2 class="jobTitle">Cleaner</h2>
            <a class="jobTitleLink" href="/rc/clk?jk=zzz">Apply</a>
          </li>
        </ul>
    "#;

    #[test]
    fn reed_cards_are_normalized() {
        let jobs = parse_listings(&sites::reed(), REED_PAGE).unwrap();
        assert_eq!(jobs.len(), 2, "untitled card is dropped");

        let first = &jobs[0];
        assert_eq!(first.title, "Graduate Marketing Assistant");
        assert_eq!(first.company, "Acme Ltd");
        assert_eq!(first.location, "Manchester");
        assert_eq!(first.salary.as_deref(), Some("£24,000 per annum"));
        assert_eq!(first.description, "Support the marketing team.");
        assert_eq!(
            first.url,
            "https://www.reed.co.uk/jobs/graduate-marketing-assistant/123"
        );
        assert_eq!(first.source, "Reed");
        assert!(first.id.starts_with("reed-"));

        let second = &jobs[1];
        assert_eq!(second.url, "https://apply.partner.test/789");
        assert_eq!(second.company, "Unknown Company");
        assert_eq!(second.location, "UK");
        assert_eq!(second.salary, None);
    }

    #[test]
    fn indeed_builds_view_links_from_job_keys() {
        let jobs = parse_listings(&sites::indeed_uk(), INDEED_PAGE).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(
            jobs[0].url,
            "https://www.indeed.co.uk/viewjob?jk=a1b2c3&from=serp&vjs=3"
        );
        assert_eq!(jobs[1].url, "https://www.indeed.co.uk/rc/clk?jk=zzz");
        assert!(jobs[0].posted_date < chrono::Utc::now() - chrono::Duration::hours(4));
    }

    #[test]
    fn ids_are_unique_within_a_page() {
        let jobs = parse_listings(&sites::reed(), REED_PAGE).unwrap();
        assert_ne!(jobs[0].id, jobs[1].id);
    }

    #[test]
    fn empty_href_yields_empty_url() {
        assert_eq!(resolve("https://www.reed.co.uk", ""), "");
        assert_eq!(
            resolve("https://www.reed.co.uk", "jobs/1"),
            "https://www.reed.co.uk/jobs/1"
        );
    }

    #[test]
    fn paging_schemes() {
        let indeed = sites::indeed_uk().params.build("chef", 2);
        assert!(indeed.contains(&("start", "20".to_string())));
        assert!(indeed.contains(&("q", "chef".to_string())));

        let reed = sites::reed().params.build("chef", 0);
        assert!(reed.contains(&("page", "1".to_string())));
        assert!(reed.contains(&("location", "United Kingdom".to_string())));
    }

    #[tokio::test]
    async fn fetches_and_parses_search_page() {
        let app = Router::new().route(
            "/jobs",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                if params.get("keywords").map(String::as_str) != Some("nurse") {
                    return AxumHtml(String::new());
                }
                AxumHtml(
                    r#"<div class="job-card">
                         <h3 class="job-title">Student Nurse</h3>
                         <a class="job-card__link" href="/job/55">Go</a>
                         <span class="posted-date">3 days ago</span>
                       </div>"#
                        .to_string(),
                )
            }),
        );
        let base = serve(app).await;

        let mut config = sites::totaljobs();
        config.search_url = format!("{base}/jobs");
        let scraper = SiteScraper::new(config, reqwest::Client::new());

        let jobs = scraper.fetch("nurse", 0).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].url, "https://www.totaljobs.com/job/55");
    }

    #[tokio::test]
    async fn non_200_is_a_source_failure() {
        let app = Router::new().route("/jobs", get(|| async { AxumStatus::SERVICE_UNAVAILABLE }));
        let base = serve(app).await;

        let mut config = sites::cwjobs();
        config.search_url = format!("{base}/jobs");
        let scraper = SiteScraper::new(config, reqwest::Client::new());

        assert!(matches!(
            scraper.fetch("nurse", 0).await,
            Err(SourceError::Status(503))
        ));
    }
}

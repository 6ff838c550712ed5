use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_DESCRIPTION_CHARS: usize = 500;
pub const DEFAULT_COMPANY: &str = "Unknown Company";
pub const DEFAULT_LOCATION: &str = "UK";

/// A normalized job posting, the shape every source is mapped into.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    pub description: String,
    pub url: String,
    pub source: String,
    pub posted_date: DateTime<Utc>,
}

/// Fields pulled out of one upstream record before defaults are applied.
#[derive(Debug, Default, Clone)]
pub struct RawPosting {
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: Option<String>,
    pub description: String,
    pub url: String,
    pub source: String,
    pub posted_date: DateTime<Utc>,
}

impl RawPosting {
    /// Apply defaults and bounds. Records without a title are discarded.
    pub fn normalize(self, id: String) -> Option<JobPosting> {
        let title = self.title.trim();
        if title.is_empty() {
            return None;
        }

        Some(JobPosting {
            id,
            title: title.to_string(),
            company: non_empty_or(self.company, DEFAULT_COMPANY),
            location: non_empty_or(self.location, DEFAULT_LOCATION),
            salary: self
                .salary
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            description: truncate_chars(self.description.trim(), MAX_DESCRIPTION_CHARS),
            url: self.url.trim().to_string(),
            source: self.source,
            posted_date: self.posted_date,
        })
    }
}

fn non_empty_or(value: String, default: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Cut `text` to at most `max` characters without splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

/// Build a posting id as `{source}-{unix millis}-{discriminator}`.
pub fn job_id(source: &str, discriminator: &str) -> String {
    format!(
        "{}-{}-{discriminator}",
        slug(source),
        Utc::now().timestamp_millis()
    )
}

/// Lowercase a source name and replace whitespace with dashes.
pub fn slug(source: &str) -> String {
    source
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Where the postings in an aggregation result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    Cache,
    Scraper,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregationResult {
    pub jobs: Vec<JobPosting>,
    pub source: ResultSource,
    pub count: usize,
}

impl AggregationResult {
    pub fn new(jobs: Vec<JobPosting>, source: ResultSource) -> Self {
        let count = jobs.len();
        Self {
            jobs,
            source,
            count,
        }
    }
}

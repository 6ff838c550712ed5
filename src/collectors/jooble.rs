use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::collectors::{API_PAGE_SIZE, SourceAdapter, credential};
use crate::dates::{self, DateStyle};
use crate::error::SourceError;
use crate::models::job::{JobPosting, RawPosting, job_id};

const ENDPOINT: &str = "https://jooble.org/api/";
const TIMEOUT: Duration = Duration::from_secs(15);
const SOURCE: &str = "Jooble UK";

pub struct Jooble {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
}

impl Jooble {
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            endpoint: ENDPOINT.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl SourceAdapter for Jooble {
    fn name(&self) -> &str {
        "Jooble"
    }

    async fn fetch(&self, query: &str, page: u32) -> Result<Vec<JobPosting>, SourceError> {
        let api_key = credential(&self.api_key).ok_or(SourceError::MissingCredentials)?;

        let resp = self
            .client
            .post(&self.endpoint)
            .header("Api-Key", api_key)
            .json(&json!({
                "keywords": query,
                "location": "United Kingdom",
                "page": page + 1,
            }))
            .timeout(TIMEOUT)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(SourceError::Status(resp.status().as_u16()));
        }

        let data: Value = resp.json().await?;
        parse_results(&data)
    }
}

fn parse_results(data: &Value) -> Result<Vec<JobPosting>, SourceError> {
    let results = data
        .get("jobs")
        .and_then(|v| v.as_array())
        .ok_or_else(|| SourceError::Parse("missing 'jobs' array".to_string()))?;

    Ok(results
        .iter()
        .take(API_PAGE_SIZE)
        .enumerate()
        .filter_map(|(index, raw)| parse_job(raw).normalize(job_id("jooble", &index.to_string())))
        .collect())
}

fn parse_job(raw: &Value) -> RawPosting {
    let text = |key: &str| {
        raw.get(key)
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string()
    };

    let posted = match text("pubDate") {
        date if date.is_empty() => text("updated"),
        date => date,
    };

    RawPosting {
        title: text("title"),
        company: text("company"),
        location: text("location"),
        salary: Some(text("salary")),
        description: text("snippet"),
        url: text("link"),
        source: SOURCE.to_string(),
        posted_date: dates::parse(&posted, DateStyle::Absolute),
    }
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;

    use super::*;
    use crate::collectors::testing::serve;

    #[test]
    fn maps_provider_fields() {
        let data = json!({
            "totalCount": 2,
            "jobs": [{
                "title": "Retail Assistant (Part Time)",
                "company": "Boots",
                "location": "Leeds",
                "salary": "£11.50 per hour",
                "snippet": "<b>Retail</b> role for students",
                "link": "https://jooble.test/desc/123",
                "updated": "2024-02-10T00:00:00.0000000"
            }, {
                "title": "Warehouse Operative",
                "link": "https://jooble.test/desc/456",
                "salary": ""
            }]
        });

        let jobs = parse_results(&data).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].salary.as_deref(), Some("£11.50 per hour"));
        assert_eq!(jobs[0].source, "Jooble UK");
        assert_eq!(jobs[0].posted_date.to_rfc3339(), "2024-02-10T00:00:00+00:00");
        assert_eq!(jobs[1].salary, None);
        assert_eq!(jobs[1].company, "Unknown Company");
        assert_eq!(jobs[1].location, "UK");
    }

    #[test]
    fn caps_results_at_page_size() {
        let jobs: Vec<Value> = (0..30)
            .map(|i| json!({ "title": format!("Job {i}"), "link": format!("https://jooble.test/{i}") }))
            .collect();
        let parsed = parse_results(&json!({ "jobs": jobs })).unwrap();
        assert_eq!(parsed.len(), API_PAGE_SIZE);
    }

    #[tokio::test]
    async fn posts_query_with_api_key() {
        let app = Router::new().route(
            "/api/",
            post(|headers: HeaderMap, axum::Json(body): axum::Json<Value>| async move {
                if headers.get("api-key").and_then(|v| v.to_str().ok()) != Some("secret") {
                    return (StatusCode::FORBIDDEN, axum::Json(json!({})));
                }
                (
                    StatusCode::OK,
                    axum::Json(json!({
                        "jobs": [{
                            "title": format!("{} role", body["keywords"].as_str().unwrap_or("")),
                            "link": "https://jooble.test/desc/1"
                        }]
                    })),
                )
            }),
        );
        let base = serve(app).await;

        let source = Jooble::new(reqwest::Client::new(), Some("secret".to_string()))
            .with_endpoint(format!("{base}/api/"));
        let jobs = source.fetch("barista", 0).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "barista role");

        let wrong_key = Jooble::new(reqwest::Client::new(), Some("nope".to_string()))
            .with_endpoint(format!("{base}/api/"));
        let err = wrong_key.fetch("barista", 0).await.unwrap_err();
        assert!(matches!(err, SourceError::Status(403)));
    }
}

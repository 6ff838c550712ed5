use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::collectors::{API_PAGE_SIZE, SourceAdapter, credential};
use crate::dates::{self, DateStyle};
use crate::error::SourceError;
use crate::models::job::{JobPosting, RawPosting, job_id};

const ENDPOINT: &str = "https://jsearch.p.rapidapi.com/search";
const RAPIDAPI_HOST: &str = "jsearch.p.rapidapi.com";
const TIMEOUT: Duration = Duration::from_secs(20);

/// JSearch (RapidAPI) job search, UK-restricted.
pub struct JSearch {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
}

impl JSearch {
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
impl SourceAdapter for JSearch {
    fn name(&self) -> &str {
        "JSearch"
    }

    async fn fetch(&self, query: &str, page: u32) -> Result<Vec<JobPosting>, SourceError> {
        let api_key = credential(&self.api_key).ok_or(SourceError::MissingCredentials)?;

        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("query", format!("{query} UK")),
                ("num_results", API_PAGE_SIZE.to_string()),
                ("page", (page + 1).to_string()),
                ("country", "gb".to_string()),
                ("language", "en".to_string()),
            ])
            .header("X-RapidAPI-Key", api_key)
            .header("X-RapidAPI-Host", RAPIDAPI_HOST)
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
        .get("data")
        .and_then(|v| v.as_array())
        .ok_or_else(|| SourceError::Parse("missing 'data' array".to_string()))?;

    Ok(results
        .iter()
        .take(API_PAGE_SIZE)
        .enumerate()
        .filter_map(|(index, raw)| parse_job(raw).normalize(job_id("jsearch", &index.to_string())))
        .collect())
}

fn parse_job(raw: &Value) -> RawPosting {
    let text = |key: &str| raw.get(key).and_then(|v| v.as_str()).unwrap_or("").trim();

    let location = match (text("job_city"), text("job_country")) {
        ("", country) => country.to_string(),
        (city, "") => city.to_string(),
        (city, country) => format!("{city}, {country}"),
    };

    let salary = match (text("job_salary_currency"), text("job_salary_period")) {
        ("", _) | (_, "") => None,
        (currency, period) => Some(format!("{currency} {period}")),
    };

    let source = match text("job_publisher") {
        "" => "JSearch".to_string(),
        publisher => publisher.to_string(),
    };

    RawPosting {
        title: text("job_title").to_string(),
        company: text("employer_name").to_string(),
        location,
        salary,
        description: text("job_description").to_string(),
        url: text("job_apply_link").to_string(),
        source,
        posted_date: dates::parse(text("job_posted_at_datetime_utc"), DateStyle::Absolute),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::Router;
    use axum::extract::Query;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use serde_json::json;

    use super::*;
    use crate::collectors::testing::serve;

    #[test]
    fn maps_provider_fields() {
        let data = json!({
            "data": [{
                "job_title": "Graduate Software Engineer",
                "employer_name": "Monzo",
                "job_city": "London",
                "job_country": "GB",
                "job_salary_currency": "GBP",
                "job_salary_period": "YEAR",
                "job_description": "Build things.",
                "job_apply_link": "https://careers.monzo.test/apply/1",
                "job_publisher": "LinkedIn",
                "job_posted_at_datetime_utc": "2024-05-01T09:30:00.000Z"
            }]
        });

        let jobs = parse_results(&data).unwrap();
        assert_eq!(jobs.len(), 1);
        let job = &jobs[0];
        assert!(job.id.starts_with("jsearch-"));
        assert!(job.id.ends_with("-0"));
        assert_eq!(job.location, "London, GB");
        assert_eq!(job.salary.as_deref(), Some("GBP YEAR"));
        assert_eq!(job.source, "LinkedIn");
        assert_eq!(job.posted_date.to_rfc3339(), "2024-05-01T09:30:00+00:00");
    }

    #[test]
    fn sparse_records_get_defaults() {
        let data = json!({
            "data": [
                { "job_title": "Barista", "job_apply_link": "https://cafe.test/jobs/1" },
                { "job_title": "", "job_apply_link": "https://cafe.test/jobs/2" }
            ]
        });

        let jobs = parse_results(&data).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].company, "Unknown Company");
        assert_eq!(jobs[0].location, "UK");
        assert_eq!(jobs[0].salary, None);
        assert_eq!(jobs[0].source, "JSearch");
    }

    #[test]
    fn missing_data_array_is_a_parse_error() {
        let err = parse_results(&json!({ "status": "ERROR" })).unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
    }

    #[tokio::test]
    async fn no_key_means_no_request() {
        let source = JSearch::new(reqwest::Client::new(), None)
            .with_endpoint("http://127.0.0.1:9/unreachable");
        let err = source.fetch("intern", 0).await.unwrap_err();
        assert!(matches!(err, SourceError::MissingCredentials));
    }

    #[tokio::test]
    async fn fetches_with_rapidapi_headers() {
        let app = Router::new().route(
            "/search",
            get(
                |headers: HeaderMap, Query(params): Query<HashMap<String, String>>| async move {
                    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
                    if header("x-rapidapi-key") != Some("secret")
                        || header("x-rapidapi-host") != Some(RAPIDAPI_HOST)
                    {
                        return (StatusCode::FORBIDDEN, axum::Json(json!({})));
                    }
                    (
                        StatusCode::OK,
                        axum::Json(json!({
                            "data": [{
                                "job_title": format!(
                                    "{}|{}|{}|{}",
                                    params["query"], params["page"], params["country"], params["num_results"]
                                ),
                                "job_apply_link": "https://jsearch.test/apply/1"
                            }]
                        })),
                    )
                },
            ),
        );
        let base = serve(app).await;

        let source = JSearch::new(reqwest::Client::new(), Some("secret".to_string()))
            .with_endpoint(format!("{base}/search"));
        let jobs = source.fetch("barista", 1).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "barista UK|2|gb|20");

        let wrong_key = JSearch::new(reqwest::Client::new(), Some("nope".to_string()))
            .with_endpoint(format!("{base}/search"));
        let err = wrong_key.fetch("barista", 0).await.unwrap_err();
        assert!(matches!(err, SourceError::Status(403)));
    }
}

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::collectors::{API_PAGE_SIZE, SourceAdapter, credential};
use crate::dates::{self, DateStyle};
use crate::error::SourceError;
use crate::models::job::{JobPosting, RawPosting, job_id};

const ENDPOINT: &str = "https://api.adzuna.com/v1/api/jobs/gb/search";
const TIMEOUT: Duration = Duration::from_secs(15);
const SOURCE: &str = "Adzuna UK";

pub struct Adzuna {
    client: reqwest::Client,
    app_id: Option<String>,
    app_key: Option<String>,
    endpoint: String,
}

impl Adzuna {
    pub fn new(client: reqwest::Client, app_id: Option<String>, app_key: Option<String>) -> Self {
        Self {
            client,
            app_id,
            app_key,
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
impl SourceAdapter for Adzuna {
    fn name(&self) -> &str {
        "Adzuna"
    }

    async fn fetch(&self, query: &str, page: u32) -> Result<Vec<JobPosting>, SourceError> {
        let (Some(app_id), Some(app_key)) = (credential(&self.app_id), credential(&self.app_key))
        else {
            return Err(SourceError::MissingCredentials);
        };

        let resp = self
            .client
            .get(format!("{}/{}", self.endpoint, page + 1))
            .query(&[
                ("app_id", app_id),
                ("app_key", app_key),
                ("what", query),
                ("where", "United Kingdom"),
                ("results_per_page", "20"),
            ])
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
        .get("results")
        .and_then(|v| v.as_array())
        .ok_or_else(|| SourceError::Parse("missing 'results' array".to_string()))?;

    Ok(results
        .iter()
        .take(API_PAGE_SIZE)
        .enumerate()
        .filter_map(|(index, raw)| parse_job(raw).normalize(job_id("adzuna", &index.to_string())))
        .collect())
}

fn parse_job(raw: &Value) -> RawPosting {
    let text = |v: Option<&Value>| v.and_then(|v| v.as_str()).unwrap_or("").to_string();

    RawPosting {
        title: text(raw.get("title")),
        company: text(raw.pointer("/company/display_name")),
        location: text(raw.pointer("/location/display_name")),
        salary: format_salary(raw),
        description: text(raw.get("description")),
        url: text(raw.get("redirect_url")),
        source: SOURCE.to_string(),
        posted_date: dates::parse(&text(raw.get("created")), DateStyle::Absolute),
    }
}

/// "£min - £max" when both bounds are present, "Competitive" when Adzuna
/// only predicted a salary, otherwise nothing.
fn format_salary(raw: &Value) -> Option<String> {
    let amount = |key: &str| {
        raw.get(key)
            .and_then(|v| v.as_f64())
            .filter(|v| *v > 0.0)
    };

    match (amount("salary_min"), amount("salary_max")) {
        (Some(min), Some(max)) => Some(format!("£{min:.0} - £{max:.0}")),
        _ if is_truthy(raw.get("salary_is_predicted")) => Some("Competitive".to_string()),
        _ => None,
    }
}

// Adzuna sends this flag as "1"/"0", but tolerate numbers and booleans.
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty() && s != "0",
        _ => false,
    }
}

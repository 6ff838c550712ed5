use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::AppError;
use crate::pipeline::{Aggregator, DEFAULT_QUERY, SearchRequest};

#[derive(Debug, Default, Deserialize)]
pub struct JobsQuery {
    pub q: Option<String>,
    pub source: Option<String>,
    pub nocache: Option<String>,
}

impl JobsQuery {
    fn into_request(self) -> SearchRequest {
        let query = self
            .q
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .unwrap_or_else(|| DEFAULT_QUERY.to_string());

        SearchRequest {
            query,
            site: self.source.filter(|s| !s.trim().is_empty()),
            bypass_cache: self.nocache.as_deref() == Some("true"),
        }
    }
}

pub async fn search(
    State(aggregator): State<Arc<Aggregator>>,
    Query(params): Query<JobsQuery>,
) -> Result<Json<Value>, AppError> {
    let request = params.into_request();

    // A panic inside a source surfaces here as a JoinError.
    let result = tokio::spawn(async move { aggregator.aggregate(&request).await })
        .await
        .map_err(|e| AppError::Internal(format!("aggregation task failed: {e}")))?;

    Ok(Json(json!({
        "success": true,
        "source": result.source,
        "count": result.count,
        "data": result.jobs,
    })))
}

pub async fn sources(State(aggregator): State<Arc<Aggregator>>) -> Json<Value> {
    Json(json!({
        "success": true,
        "sources": aggregator.site_names(),
    }))
}

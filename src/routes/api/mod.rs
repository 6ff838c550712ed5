pub mod jobs;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;

use crate::pipeline::Aggregator;

pub fn router(aggregator: Arc<Aggregator>) -> Router {
    let api = Router::new()
        .route("/jobs", get(jobs::search))
        .route("/jobs/sources", get(jobs::sources))
        .with_state(aggregator);

    Router::new().nest("/api", api)
}

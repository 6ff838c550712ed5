mod cache;
mod collectors;
mod config;
mod dates;
mod db;
mod dedup;
mod error;
mod models;
mod pipeline;
mod routes;
mod validate;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::cache::{MemoryCache, PgResultCache, ResultCache};
use crate::collectors::SourceAdapter;
use crate::collectors::adzuna::Adzuna;
use crate::collectors::jooble::Jooble;
use crate::collectors::jsearch::JSearch;
use crate::collectors::scrape::SiteScraper;
use crate::config::{Command, Config, LogFormat};
use crate::pipeline::{Aggregator, SearchRequest};
use crate::validate::UrlValidator;

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("jobscout=info,tower_http=info"));

    match format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

async fn build_cache(config: &Config) -> anyhow::Result<Arc<dyn ResultCache>> {
    let Some(database_url) = config.database_url.as_deref().filter(|u| !u.is_empty()) else {
        tracing::info!("DATABASE_URL not set, caching results in memory");
        return Ok(Arc::new(MemoryCache::new()));
    };

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(database_url).await?;

    if config.run_migrations {
        tracing::info!("Running database migrations...");
        db::run_migrations(&pool).await?;
        tracing::info!("Migrations complete");
    }

    Ok(Arc::new(PgResultCache::new(pool)))
}

async fn build_aggregator(config: &Config) -> anyhow::Result<Aggregator> {
    let api_client = collectors::api_client()?;
    let scraper_client = collectors::scraper_client()?;

    let api_sources: Vec<Arc<dyn SourceAdapter>> = vec![
        Arc::new(JSearch::new(api_client.clone(), config.rapidapi_key.clone())),
        Arc::new(Jooble::new(api_client.clone(), config.jooble_api_key.clone())),
        Arc::new(Adzuna::new(
            api_client,
            config.adzuna_app_id.clone(),
            config.adzuna_app_key.clone(),
        )),
    ];

    let scrapers: Vec<Arc<dyn SourceAdapter>> = collectors::sites::all()
        .into_iter()
        .map(|site| Arc::new(SiteScraper::new(site, scraper_client.clone())) as Arc<dyn SourceAdapter>)
        .collect();

    let mut aggregator = Aggregator::new(api_sources, scrapers, build_cache(config).await?)
        .with_scrape_delay(Duration::from_millis(config.scrape_delay_ms))
        .with_pages_per_site(config.pages_per_site);

    if config.check_apply_urls {
        aggregator = aggregator.with_link_checker(UrlValidator::new(collectors::BROWSER_USER_AGENT)?);
    }

    Ok(aggregator)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::parse();
    init_tracing(config.log_format);

    match config.resolved_command() {
        Command::Serve { listen_addr } => {
            let aggregator = Arc::new(build_aggregator(&config).await?);

            let app = Router::new()
                .route("/healthz", get(healthz))
                .merge(routes::api::router(aggregator))
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive());

            let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
            tracing::info!("Listening on {listen_addr}");
            axum::serve(listener, app).await?;
        }
        Command::Search {
            query,
            site,
            nocache,
        } => {
            let aggregator = build_aggregator(&config).await?;
            let request = SearchRequest {
                site,
                bypass_cache: nocache,
                ..SearchRequest::new(query)
            };
            let result = aggregator.aggregate(&request).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Sources => {
            for site in collectors::sites::all() {
                println!("{}", site.name);
            }
        }
    }

    Ok(())
}

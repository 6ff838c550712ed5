//! Single-slot store for the last successful aggregation.
//!
//! The slot is global, not keyed by query: a hit returns whatever the last
//! aggregation produced. There is no TTL; callers bypass it per request.

use std::sync::RwLock;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;

use crate::error::CacheError;
use crate::models::job::JobPosting;

#[async_trait]
pub trait ResultCache: Send + Sync {
    /// The stored snapshot, or `None` when the slot is empty.
    async fn get(&self) -> Result<Option<Vec<JobPosting>>, CacheError>;

    /// Replace the snapshot.
    async fn put(&self, jobs: &[JobPosting]) -> Result<(), CacheError>;
}

/// Process-local cache.
#[derive(Default)]
pub struct MemoryCache {
    slot: RwLock<Option<Vec<JobPosting>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResultCache for MemoryCache {
    async fn get(&self) -> Result<Option<Vec<JobPosting>>, CacheError> {
        let guard = self.slot.read().map_err(|_| CacheError::Poisoned)?;
        Ok(guard.clone().filter(|jobs| !jobs.is_empty()))
    }

    async fn put(&self, jobs: &[JobPosting]) -> Result<(), CacheError> {
        let mut guard = self.slot.write().map_err(|_| CacheError::Poisoned)?;
        *guard = Some(jobs.to_vec());
        Ok(())
    }
}

/// Postgres-backed cache: one row in `job_cache` holding the snapshot as JSONB.
pub struct PgResultCache {
    pool: PgPool,
}

impl PgResultCache {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResultCache for PgResultCache {
    async fn get(&self) -> Result<Option<Vec<JobPosting>>, CacheError> {
        let row: Option<(Json<Vec<JobPosting>>,)> =
            sqlx::query_as("SELECT jobs FROM job_cache WHERE slot = 1")
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(Json(jobs),)| jobs).filter(|jobs| !jobs.is_empty()))
    }

    async fn put(&self, jobs: &[JobPosting]) -> Result<(), CacheError> {
        sqlx::query(
            "INSERT INTO job_cache (slot, jobs, stored_at) VALUES (1, $1, NOW())
             ON CONFLICT (slot) DO UPDATE SET jobs = EXCLUDED.jobs, stored_at = NOW()",
        )
        .bind(Json(jobs.to_vec()))
        .execute(&self.pool)
        .await?;
        tracing::debug!("Stored {} jobs in job_cache", jobs.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn posting(url: &str) -> JobPosting {
        JobPosting {
            id: url.to_string(),
            title: "Intern".to_string(),
            company: "Acme".to_string(),
            location: "UK".to_string(),
            salary: Some("£20,000".to_string()),
            description: "desc".to_string(),
            url: url.to_string(),
            source: "test".to_string(),
            posted_date: Utc::now(),
        }
    }

    #[tokio::test]
    async fn empty_until_written() {
        let cache = MemoryCache::new();
        assert!(cache.get().await.unwrap().is_none());

        cache.put(&[posting("https://jobs.test/1")]).await.unwrap();
        let jobs = cache.get().await.unwrap().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].url, "https://jobs.test/1");
    }

    #[tokio::test]
    async fn put_replaces_the_single_slot() {
        let cache = MemoryCache::new();
        cache.put(&[posting("https://jobs.test/1")]).await.unwrap();
        cache
            .put(&[posting("https://jobs.test/2"), posting("https://jobs.test/3")])
            .await
            .unwrap();

        let jobs = cache.get().await.unwrap().unwrap();
        let urls: Vec<_> = jobs.iter().map(|j| j.url.as_str()).collect();
        assert_eq!(urls, ["https://jobs.test/2", "https://jobs.test/3"]);
    }

    #[tokio::test]
    async fn empty_snapshot_reads_as_miss() {
        let cache = MemoryCache::new();
        cache.put(&[]).await.unwrap();
        assert!(cache.get().await.unwrap().is_none());
    }
}

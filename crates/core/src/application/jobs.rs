// Job Service - CRUD over the persisted job inventory

use crate::domain::{Job, JobId, JobStatus};
use crate::error::{AppError, Result};
use crate::port::{JobPage, JobSearchFilter, JobStore, StoreStats};
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// Thin application service over the job store: status lifecycle, listing,
/// and bulk cleanup. Validation happens here so every store implementation
/// sees only well-formed input.
pub struct JobService {
    store: Arc<dyn JobStore>,
}

impl JobService {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, id: &JobId) -> Result<Job> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))
    }

    /// Move a job to the status named by `status` ("new", "saved",
    /// "rejected"). Unknown names fail validation before touching the store.
    pub async fn update_status(&self, id: &JobId, status: &str) -> Result<Job> {
        let status = JobStatus::from_str(status)
            .map_err(|e| AppError::Validation(e.to_string()))?;
        self.store.update_status(id, status).await?;
        info!(job_id = %id, status = %status, "job status updated");
        self.get(id).await
    }

    pub async fn delete(&self, id: &JobId) -> Result<()> {
        self.store.delete(id).await?;
        info!(job_id = %id, "job deleted");
        Ok(())
    }

    /// Drop the whole inventory, returning how many rows were removed
    pub async fn clear_all(&self) -> Result<u64> {
        let removed = self.store.clear_all().await?;
        info!(removed, "cleared all jobs");
        Ok(removed)
    }

    /// Paged, filtered listing ordered newest-first
    pub async fn search(&self, filter: &JobSearchFilter) -> Result<JobPage> {
        if filter.limit < 1 || filter.limit > 200 {
            return Err(AppError::Validation(
                "limit must be between 1 and 200".to_string(),
            ));
        }
        if filter.offset < 0 {
            return Err(AppError::Validation("offset must not be negative".to_string()));
        }
        self.store.search(filter).await
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        self.store.stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewJob;
    use crate::port::job_store::mocks::InMemoryJobStore;

    fn job(id: &str, url: &str, fetched_at: i64) -> Job {
        Job::from_candidate(
            NewJob {
                dedup_key: url.to_string(),
                title: "Engineer".to_string(),
                company: "Acme".to_string(),
                location: "Pune".to_string(),
                job_url: url.to_string(),
                description: String::new(),
                is_remote: false,
                date_posted: String::new(),
                source_site: "linkedin".to_string(),
                search_title: "engineer".to_string(),
                search_location: "pune".to_string(),
            },
            id,
            "batch-1",
            fetched_at,
        )
    }

    async fn seeded_service() -> (Arc<InMemoryJobStore>, JobService) {
        let store = Arc::new(InMemoryJobStore::new());
        for i in 0..3 {
            store
                .insert(&job(&format!("id-{i}"), &format!("https://x.test/j/{i}"), i))
                .await
                .unwrap();
        }
        let service = JobService::new(store.clone());
        (store, service)
    }

    #[tokio::test]
    async fn test_update_status_round_trip() {
        let (_, service) = seeded_service().await;
        let job = service.update_status(&"id-0".to_string(), "saved").await.unwrap();
        assert_eq!(job.status, JobStatus::Saved);
        let job = service.get(&"id-0".to_string()).await.unwrap();
        assert_eq!(job.status, JobStatus::Saved);
    }

    #[tokio::test]
    async fn test_update_status_rejects_unknown_name() {
        let (store, service) = seeded_service().await;
        let err = service
            .update_status(&"id-0".to_string(), "archived")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        // Store untouched
        let job = store.find_by_id(&"id-0".to_string()).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::New);
    }

    #[tokio::test]
    async fn test_update_status_unknown_id() {
        let (_, service) = seeded_service().await;
        let err = service
            .update_status(&"missing".to_string(), "saved")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let (store, service) = seeded_service().await;
        service.delete(&"id-1".to_string()).await.unwrap();
        assert_eq!(store.all_jobs().len(), 2);
        assert!(matches!(
            service.delete(&"id-1".to_string()).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert_eq!(service.clear_all().await.unwrap(), 2);
        assert!(store.all_jobs().is_empty());
    }

    #[tokio::test]
    async fn test_search_validates_page_bounds() {
        let (_, service) = seeded_service().await;
        let mut filter = JobSearchFilter::default();
        filter.limit = 0;
        assert!(matches!(
            service.search(&filter).await.unwrap_err(),
            AppError::Validation(_)
        ));
        filter.limit = 201;
        assert!(matches!(
            service.search(&filter).await.unwrap_err(),
            AppError::Validation(_)
        ));
        filter.limit = 2;
        filter.offset = -1;
        assert!(matches!(
            service.search(&filter).await.unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_search_newest_first_with_paging() {
        let (_, service) = seeded_service().await;
        let filter = JobSearchFilter {
            limit: 2,
            ..JobSearchFilter::default()
        };
        let page = service.search(&filter).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.jobs.len(), 2);
        assert_eq!(page.jobs[0].id, "id-2");
        assert_eq!(page.jobs[1].id, "id-1");
    }

    #[tokio::test]
    async fn test_stats() {
        let (_, service) = seeded_service().await;
        service.update_status(&"id-0".to_string(), "saved").await.unwrap();
        service.update_status(&"id-1".to_string(), "rejected").await.unwrap();
        let stats = service.stats().await.unwrap();
        assert_eq!(
            stats,
            StoreStats {
                total: 3,
                new: 1,
                saved: 1,
                rejected: 1
            }
        );
    }
}

// Job Store Port (Interface)

use crate::domain::{Job, JobId, JobStatus};
use crate::error::Result;
use async_trait::async_trait;

/// Filters for paged job listing
#[derive(Debug, Clone)]
pub struct JobSearchFilter {
    pub status: JobStatus,
    pub batch_id: Option<String>,
    pub source_site: Option<String>,
    /// Case-insensitive substring match on location
    pub location: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for JobSearchFilter {
    fn default() -> Self {
        Self {
            status: JobStatus::New,
            batch_id: None,
            source_site: None,
            location: None,
            limit: 50,
            offset: 0,
        }
    }
}

/// One page of search results
#[derive(Debug, Clone)]
pub struct JobPage {
    pub jobs: Vec<Job>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Per-status job counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub total: i64,
    pub new: i64,
    pub saved: i64,
    pub rejected: i64,
}

/// Repository interface for Job persistence.
///
/// The store is the single shared mutable resource across concurrent runs;
/// `insert` must enforce the one-row-per-dedup-key invariant itself (unique
/// constraint) and surface violations as `AppError::Conflict` so racing
/// workers resolve check-then-insert races safely.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new job; `AppError::Conflict` when the dedup key exists
    async fn insert(&self, job: &Job) -> Result<()>;

    /// Find a job by its dedup key (canonical URL)
    async fn find_by_dedup_key(&self, key: &str) -> Result<Option<Job>>;

    /// Find a job by row ID
    async fn find_by_id(&self, id: &JobId) -> Result<Option<Job>>;

    /// Update a job's status; `AppError::NotFound` on unknown ID
    async fn update_status(&self, id: &JobId, status: JobStatus) -> Result<()>;

    /// Delete one job; `AppError::NotFound` on unknown ID
    async fn delete(&self, id: &JobId) -> Result<()>;

    /// Delete every job, returning how many were removed
    async fn clear_all(&self) -> Result<u64>;

    /// Paged, filtered listing ordered newest-first by fetched_at
    async fn search(&self, filter: &JobSearchFilter) -> Result<JobPage>;

    /// Per-status counts
    async fn stats(&self) -> Result<StoreStats>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// In-memory store with the same conflict semantics as the SQLite
    /// implementation. `fail_inserts` forces the persistence-failure path.
    pub struct InMemoryJobStore {
        jobs: Mutex<Vec<Job>>,
        fail_inserts: AtomicBool,
    }

    impl InMemoryJobStore {
        pub fn new() -> Self {
            Self {
                jobs: Mutex::new(Vec::new()),
                fail_inserts: AtomicBool::new(false),
            }
        }

        pub fn set_fail_inserts(&self, fail: bool) {
            self.fail_inserts.store(fail, Ordering::SeqCst);
        }

        pub fn all_jobs(&self) -> Vec<Job> {
            self.jobs.lock().unwrap_or_else(|e| e.into_inner()).clone()
        }

        fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Job>> {
            self.jobs.lock().unwrap_or_else(|e| e.into_inner())
        }
    }

    impl Default for InMemoryJobStore {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl JobStore for InMemoryJobStore {
        async fn insert(&self, job: &Job) -> Result<()> {
            if self.fail_inserts.load(Ordering::SeqCst) {
                return Err(AppError::Database("simulated insert failure".to_string()));
            }
            let mut jobs = self.lock();
            if jobs.iter().any(|j| j.job_url == job.job_url) {
                return Err(AppError::Conflict(format!(
                    "job with url {} already exists",
                    job.job_url
                )));
            }
            jobs.push(job.clone());
            Ok(())
        }

        async fn find_by_dedup_key(&self, key: &str) -> Result<Option<Job>> {
            Ok(self.lock().iter().find(|j| j.job_url == key).cloned())
        }

        async fn find_by_id(&self, id: &JobId) -> Result<Option<Job>> {
            Ok(self.lock().iter().find(|j| &j.id == id).cloned())
        }

        async fn update_status(&self, id: &JobId, status: JobStatus) -> Result<()> {
            let mut jobs = self.lock();
            match jobs.iter_mut().find(|j| &j.id == id) {
                Some(job) => {
                    job.status = status;
                    Ok(())
                }
                None => Err(AppError::NotFound(format!("Job {id} not found"))),
            }
        }

        async fn delete(&self, id: &JobId) -> Result<()> {
            let mut jobs = self.lock();
            let before = jobs.len();
            jobs.retain(|j| &j.id != id);
            if jobs.len() == before {
                return Err(AppError::NotFound(format!("Job {id} not found")));
            }
            Ok(())
        }

        async fn clear_all(&self) -> Result<u64> {
            let mut jobs = self.lock();
            let count = jobs.len() as u64;
            jobs.clear();
            Ok(count)
        }

        async fn search(&self, filter: &JobSearchFilter) -> Result<JobPage> {
            let jobs = self.lock();
            let mut matches: Vec<Job> = jobs
                .iter()
                .filter(|j| j.status == filter.status)
                .filter(|j| {
                    filter
                        .batch_id
                        .as_ref()
                        .map_or(true, |b| &j.batch_id == b)
                })
                .filter(|j| {
                    filter
                        .source_site
                        .as_ref()
                        .map_or(true, |s| &j.source_site == s)
                })
                .filter(|j| {
                    filter.location.as_ref().map_or(true, |l| {
                        j.location.to_lowercase().contains(&l.to_lowercase())
                    })
                })
                .cloned()
                .collect();
            matches.sort_by(|a, b| b.fetched_at.cmp(&a.fetched_at));
            let total = matches.len() as i64;
            let page = matches
                .into_iter()
                .skip(filter.offset.max(0) as usize)
                .take(filter.limit.max(0) as usize)
                .collect();
            Ok(JobPage {
                jobs: page,
                total,
                limit: filter.limit,
                offset: filter.offset,
            })
        }

        async fn stats(&self) -> Result<StoreStats> {
            let jobs = self.lock();
            let count = |status: JobStatus| jobs.iter().filter(|j| j.status == status).count() as i64;
            Ok(StoreStats {
                total: jobs.len() as i64,
                new: count(JobStatus::New),
                saved: count(JobStatus::Saved),
                rejected: count(JobStatus::Rejected),
            })
        }
    }
}

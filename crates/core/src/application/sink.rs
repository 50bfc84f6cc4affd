// Incremental Sink - at-most-one-write-per-identity under streaming persistence

use crate::application::tracker::{stats_object, PipelineRunTracker};
use crate::domain::{BatchId, Job, NewJob, RunId};
use crate::error::AppError;
use crate::port::{IdProvider, JobStore, TimeProvider};
use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{error, warn};

/// Tri-state outcome of offering one job to a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkOutcome {
    /// Persisted as a new row
    Created,
    /// A row with the same dedup key already exists; nothing written
    Duplicate,
    /// Persistence failed; the job is dropped but the run continues
    Failed,
}

/// Where accepted jobs go, one at a time, as the scrape progresses
#[async_trait]
pub trait JobSink: Send + Sync {
    async fn accept(&self, candidate: NewJob) -> SinkOutcome;
}

/// Sink that persists each job immediately and keeps the owning run's
/// counters current so progress is observable while the scrape is in
/// flight.
pub struct StoreSink {
    store: Arc<dyn JobStore>,
    tracker: Arc<PipelineRunTracker>,
    run_id: RunId,
    batch_id: BatchId,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    created: AtomicU64,
    duplicates: AtomicU64,
}

impl StoreSink {
    pub fn new(
        store: Arc<dyn JobStore>,
        tracker: Arc<PipelineRunTracker>,
        run_id: RunId,
        batch_id: BatchId,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            store,
            tracker,
            run_id,
            batch_id,
            id_provider,
            time_provider,
            created: AtomicU64::new(0),
            duplicates: AtomicU64::new(0),
        }
    }

    pub fn created(&self) -> u64 {
        self.created.load(Ordering::SeqCst)
    }

    pub fn duplicates(&self) -> u64 {
        self.duplicates.load(Ordering::SeqCst)
    }

    fn push_counters(&self) {
        self.tracker.update_stats(
            &self.run_id,
            stats_object(json!({
                "batch_id": self.batch_id,
                "new_jobs": self.created(),
                "duplicates": self.duplicates(),
            })),
        );
    }
}

#[async_trait]
impl JobSink for StoreSink {
    async fn accept(&self, candidate: NewJob) -> SinkOutcome {
        match self.store.find_by_dedup_key(&candidate.dedup_key).await {
            Ok(Some(_)) => {
                self.duplicates.fetch_add(1, Ordering::SeqCst);
                self.push_counters();
                return SinkOutcome::Duplicate;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(run_id = %self.run_id, error = %e, "dedup lookup failed");
                return SinkOutcome::Failed;
            }
        }

        let job = Job::from_candidate(
            candidate,
            self.id_provider.generate_id(),
            self.batch_id.clone(),
            self.time_provider.now_millis(),
        );

        match self.store.insert(&job).await {
            Ok(()) => {
                self.created.fetch_add(1, Ordering::SeqCst);
                self.push_counters();
                SinkOutcome::Created
            }
            // Another worker won the race on this dedup key between our
            // lookup and the insert; the unique constraint is the arbiter.
            Err(AppError::Conflict(_)) => {
                self.duplicates.fetch_add(1, Ordering::SeqCst);
                self.push_counters();
                SinkOutcome::Duplicate
            }
            Err(e) => {
                error!(run_id = %self.run_id, error = %e, "failed to save job");
                SinkOutcome::Failed
            }
        }
    }
}

/// Non-incremental variant: gathers accepted candidates in memory
pub struct CollectingSink {
    jobs: Mutex<Vec<NewJob>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self {
            jobs: Mutex::new(Vec::new()),
        }
    }

    pub fn into_jobs(self) -> Vec<NewJob> {
        self.jobs.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    pub fn jobs(&self) -> Vec<NewJob> {
        self.jobs.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Default for CollectingSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobSink for CollectingSink {
    async fn accept(&self, candidate: NewJob) -> SinkOutcome {
        self.jobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(candidate);
        SinkOutcome::Created
    }
}

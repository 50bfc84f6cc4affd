// Scrape Service - starts background scrape runs and answers status polls

use crate::application::orchestrator::{ScrapeConfig, ScrapeObserver, ScrapeOrchestrator};
use crate::application::sink::StoreSink;
use crate::application::tracker::{stats_object, PipelineRunTracker};
use crate::domain::{BatchId, RunId, RunSnapshot, RunState};
use crate::error::{AppError, Result};
use crate::port::{ExternalScraper, IdProvider, JobStore, TimeProvider};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

/// Handle returned to the caller the moment a run is accepted
#[derive(Debug, Clone)]
pub struct StartedRun {
    pub run_id: RunId,
    pub batch_id: BatchId,
}

/// Observer that mirrors orchestrator output into the run's tracker entry
/// and the process log.
struct TrackerObserver {
    tracker: Arc<PipelineRunTracker>,
    run_id: RunId,
}

impl ScrapeObserver for TrackerObserver {
    fn log(&self, msg: String) {
        info!("[{}] {}", self.run_id, msg);
        self.tracker.append_log(&self.run_id, msg);
    }

    fn progress(&self, current_query: usize, total_queries: usize, sites: &str) {
        self.tracker.update_stats(
            &self.run_id,
            stats_object(json!({
                "current_query": current_query,
                "total_queries": total_queries,
                "current_site": sites,
            })),
        );
    }
}

/// Starts scrape pipelines on background tasks and exposes their status.
///
/// Validation happens synchronously before anything is scheduled; once a
/// run id is handed out, the worker owns the run and every failure ends in
/// the `failed` state rather than propagating to the caller.
pub struct ScrapeService {
    tracker: Arc<PipelineRunTracker>,
    scraper: Arc<dyn ExternalScraper>,
    store: Arc<dyn JobStore>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl ScrapeService {
    pub fn new(
        tracker: Arc<PipelineRunTracker>,
        scraper: Arc<dyn ExternalScraper>,
        store: Arc<dyn JobStore>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            tracker,
            scraper,
            store,
            id_provider,
            time_provider,
        }
    }

    /// Validate the config, register a run, and spawn its worker
    pub fn start_scrape_run(&self, config: ScrapeConfig) -> Result<StartedRun> {
        let titles = config.clean_titles();
        let locations = config.clean_locations();
        if titles.is_empty() {
            return Err(AppError::Validation(
                "Titles are empty. Provide at least one title.".to_string(),
            ));
        }
        if locations.is_empty() {
            return Err(AppError::Validation(
                "Locations are empty. Provide at least one location.".to_string(),
            ));
        }

        let run_id = self.tracker.create("scrape");
        let batch_id = self.id_provider.generate_id();
        self.tracker.update_stats(
            &run_id,
            stats_object(json!({
                "batch_id": batch_id,
                "total_queries": titles.len() * locations.len(),
                "current_query": 0,
                "current_site": config.effective_sites().join(", "),
                "new_jobs": 0,
                "duplicates": 0,
                "filtered": 0,
                "started_at": self.time_provider.now_millis(),
            })),
        );
        self.tracker.append_log(&run_id, "Starting job scrape...");

        let worker = Worker {
            tracker: self.tracker.clone(),
            scraper: self.scraper.clone(),
            store: self.store.clone(),
            id_provider: self.id_provider.clone(),
            time_provider: self.time_provider.clone(),
            run_id: run_id.clone(),
            batch_id: batch_id.clone(),
            config,
        };
        let handle = tokio::spawn(worker.run());

        // Supervise the worker task: a panic must still end the run in the
        // failed state instead of leaving it running until TTL eviction.
        let tracker = self.tracker.clone();
        let supervised_run_id = run_id.clone();
        tokio::spawn(async move {
            if let Err(e) = handle.await {
                error!(run_id = %supervised_run_id, error = %e, "scrape worker died");
                tracker.append_log(&supervised_run_id, format!("ERROR: worker died: {e}"));
                tracker.update_state(&supervised_run_id, RunState::Failed);
            }
        });

        Ok(StartedRun { run_id, batch_id })
    }

    /// Snapshot one run; `None` for unknown or expired ids
    pub fn run_status(&self, run_id: &str) -> Option<RunSnapshot> {
        self.tracker.get(run_id)
    }
}

struct Worker {
    tracker: Arc<PipelineRunTracker>,
    scraper: Arc<dyn ExternalScraper>,
    store: Arc<dyn JobStore>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    run_id: RunId,
    batch_id: BatchId,
    config: ScrapeConfig,
}

impl Worker {
    async fn run(self) {
        let observer = TrackerObserver {
            tracker: self.tracker.clone(),
            run_id: self.run_id.clone(),
        };
        let sink = StoreSink::new(
            self.store.clone(),
            self.tracker.clone(),
            self.run_id.clone(),
            self.batch_id.clone(),
            self.id_provider.clone(),
            self.time_provider.clone(),
        );
        let orchestrator = ScrapeOrchestrator::new(self.scraper.clone());

        match orchestrator.run(&self.config, &observer, &sink).await {
            Ok(stats) => {
                self.tracker.update_stats(
                    &self.run_id,
                    stats_object(json!({
                        "total_scraped": stats.raw_total,
                        "filtered": stats.filtered_out,
                        "new_jobs": sink.created(),
                        "duplicates": sink.duplicates(),
                    })),
                );
                self.tracker.append_log(
                    &self.run_id,
                    format!(
                        "Complete. Added {} new jobs ({} duplicates skipped).",
                        sink.created(),
                        sink.duplicates()
                    ),
                );
                self.tracker.update_state(&self.run_id, RunState::Done);
            }
            Err(e) => {
                self.tracker.append_log(&self.run_id, format!("ERROR: {e}"));
                self.tracker.update_state(&self.run_id, RunState::Failed);
            }
        }
    }
}

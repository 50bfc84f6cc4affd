//! End-to-end pipeline tests: scrape runs against a real SQLite store.

use jobscout_core::application::orchestrator::ScrapeConfig;
use jobscout_core::application::{PipelineRunTracker, ScrapeService};
use jobscout_core::domain::{RawJobRecord, RunSnapshot, RunState};
use jobscout_core::port::id_provider::UuidProvider;
use jobscout_core::port::scraper::mocks::ScriptedScraper;
use jobscout_core::port::time_provider::SystemTimeProvider;
use jobscout_core::port::JobStore;
use jobscout_infra_sqlite::{create_pool, run_migrations, SqliteJobStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

struct TempDb {
    path: PathBuf,
}

impl TempDb {
    fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "jobscout-e2e-{name}-{}.db",
            std::process::id()
        ));
        std::fs::remove_file(&path).ok();
        Self { path }
    }

    fn url(&self) -> String {
        format!("sqlite://{}", self.path.display())
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        std::fs::remove_file(&self.path).ok();
        // WAL sidecar files
        for suffix in ["-wal", "-shm"] {
            let mut side = self.path.as_os_str().to_owned();
            side.push(suffix);
            std::fs::remove_file(PathBuf::from(side)).ok();
        }
    }
}

async fn sqlite_store(db: &TempDb) -> Arc<SqliteJobStore> {
    let pool = create_pool(&db.url()).await.unwrap();
    run_migrations(&pool).await.unwrap();
    Arc::new(SqliteJobStore::new(pool))
}

fn service(store: Arc<SqliteJobStore>, scraper: Arc<ScriptedScraper>) -> ScrapeService {
    let time_provider = Arc::new(SystemTimeProvider);
    let id_provider = Arc::new(UuidProvider);
    let tracker = Arc::new(PipelineRunTracker::new(
        time_provider.clone(),
        id_provider.clone(),
    ));
    ScrapeService::new(tracker, scraper, store, id_provider, time_provider)
}

fn record(url: &str, title: &str) -> RawJobRecord {
    RawJobRecord {
        job_url: Some(url.to_string()),
        title: Some(title.to_string()),
        company: Some("Acme".to_string()),
        location: Some("Pune".to_string()),
        source_site: Some("linkedin".to_string()),
        ..RawJobRecord::default()
    }
}

fn config() -> ScrapeConfig {
    ScrapeConfig {
        titles: vec!["Engineer".to_string()],
        locations: vec!["Pune".to_string()],
        ..ScrapeConfig::default()
    }
}

async fn wait_terminal(service: &ScrapeService, run_id: &str) -> RunSnapshot {
    for _ in 0..1000 {
        if let Some(snapshot) = service.run_status(run_id) {
            if snapshot.state.is_terminal() {
                return snapshot;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("run {run_id} never reached a terminal state");
}

#[tokio::test]
async fn test_scrape_persists_deduped_jobs() {
    let db = TempDb::new("dedup");
    let store = sqlite_store(&db).await;
    // Tracking parameters and casing differ; canonical identity does not
    let scraper = Arc::new(ScriptedScraper::new(vec![Ok(vec![
        record("https://jobs.test/role/10", "Engineer"),
        record("HTTPS://Jobs.test/Role/10/?utm_source=feed", "Engineer"),
        record("https://jobs.test/role/11", "Engineer"),
    ])]));
    let service = service(store.clone(), scraper);

    let started = service.start_scrape_run(config()).unwrap();
    let snapshot = wait_terminal(&service, &started.run_id).await;

    assert_eq!(snapshot.state, RunState::Done);
    assert_eq!(snapshot.stats["new_jobs"], serde_json::json!(2));
    assert_eq!(snapshot.stats["total_scraped"], serde_json::json!(3));

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total, 2);
    let row = store
        .find_by_dedup_key("https://jobs.test/role/10")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.batch_id, started.batch_id);
}

#[tokio::test]
async fn test_second_run_reports_duplicates() {
    let db = TempDb::new("rerun");
    let store = sqlite_store(&db).await;

    let scraper = Arc::new(ScriptedScraper::new(vec![
        Ok(vec![record("https://jobs.test/role/20", "Engineer")]),
        Ok(vec![
            record("https://jobs.test/role/20", "Engineer"),
            record("https://jobs.test/role/21", "Engineer"),
        ]),
    ]));
    let service = service(store.clone(), scraper);

    let first = service.start_scrape_run(config()).unwrap();
    let snapshot = wait_terminal(&service, &first.run_id).await;
    assert_eq!(snapshot.stats["new_jobs"], serde_json::json!(1));

    let second = service.start_scrape_run(config()).unwrap();
    let snapshot = wait_terminal(&service, &second.run_id).await;
    assert_eq!(snapshot.stats["new_jobs"], serde_json::json!(1));
    assert_eq!(snapshot.stats["duplicates"], serde_json::json!(1));
    assert!(snapshot
        .logs
        .iter()
        .any(|l| l == "Complete. Added 1 new jobs (1 duplicates skipped)."));

    assert_eq!(store.stats().await.unwrap().total, 2);
}

#[tokio::test]
async fn test_racing_runs_keep_one_row_per_url() {
    let db = TempDb::new("race");
    let store = sqlite_store(&db).await;

    // Both runs see the same posting; the unique index arbitrates
    let scraper = Arc::new(ScriptedScraper::new(vec![
        Ok(vec![record("https://jobs.test/role/30", "Engineer")]),
        Ok(vec![record("https://jobs.test/role/30", "Engineer")]),
    ]));
    let service = service(store.clone(), scraper);

    let a = service.start_scrape_run(config()).unwrap();
    let b = service.start_scrape_run(config()).unwrap();

    let snap_a = wait_terminal(&service, &a.run_id).await;
    let snap_b = wait_terminal(&service, &b.run_id).await;
    assert_eq!(snap_a.state, RunState::Done);
    assert_eq!(snap_b.state, RunState::Done);

    assert_eq!(store.stats().await.unwrap().total, 1);
}

#[tokio::test]
async fn test_validation_failure_is_synchronous() {
    let db = TempDb::new("validation");
    let store = sqlite_store(&db).await;
    let scraper = Arc::new(ScriptedScraper::new(vec![]));
    let service = service(store, scraper.clone());

    assert!(service.start_scrape_run(ScrapeConfig::default()).is_err());
    assert_eq!(scraper.query_count(), 0);
}

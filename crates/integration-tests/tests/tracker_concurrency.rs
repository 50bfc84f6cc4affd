//! Tracker under concurrency: many writers, many readers, one registry.

use jobscout_core::application::tracker::{stats_object, PipelineRunTracker, MAX_RUN_LOGS};
use jobscout_core::domain::RunState;
use jobscout_core::port::id_provider::UuidProvider;
use jobscout_core::port::time_provider::SystemTimeProvider;
use serde_json::json;
use std::sync::Arc;

fn tracker() -> Arc<PipelineRunTracker> {
    Arc::new(PipelineRunTracker::new(
        Arc::new(SystemTimeProvider),
        Arc::new(UuidProvider),
    ))
}

#[tokio::test]
async fn test_parallel_writers_on_distinct_runs() {
    let tracker = tracker();

    let mut handles = Vec::new();
    for worker in 0..8 {
        let tracker = tracker.clone();
        handles.push(tokio::spawn(async move {
            let run_id = tracker.create("scrape");
            for i in 0..200 {
                tracker.append_log(&run_id, format!("worker {worker} msg {i}"));
                tracker.update_stats(&run_id, stats_object(json!({"progress": i})));
            }
            tracker.update_state(&run_id, RunState::Done);
            run_id
        }));
    }

    let mut run_ids = Vec::new();
    for handle in handles {
        run_ids.push(handle.await.unwrap());
    }

    for (worker, run_id) in run_ids.iter().enumerate() {
        let snapshot = tracker.get(run_id).unwrap();
        assert_eq!(snapshot.state, RunState::Done);
        assert_eq!(snapshot.logs.len(), MAX_RUN_LOGS);
        // Only this worker's messages, still in order
        assert_eq!(
            snapshot.logs.last().unwrap(),
            &format!("worker {worker} msg 199")
        );
        assert!(snapshot
            .logs
            .iter()
            .all(|l| l.starts_with(&format!("worker {worker} "))));
        assert_eq!(snapshot.stats["progress"], json!(199));
    }
}

#[tokio::test]
async fn test_readers_see_consistent_snapshots() {
    let tracker = tracker();
    let run_id = tracker.create("scrape");

    let writer = {
        let tracker = tracker.clone();
        let run_id = run_id.clone();
        tokio::spawn(async move {
            for i in 0..500 {
                // new_jobs and duplicates move together in one patch
                tracker.update_stats(
                    &run_id,
                    stats_object(json!({"new_jobs": i, "duplicates": i})),
                );
                if i % 50 == 0 {
                    tokio::task::yield_now().await;
                }
            }
            tracker.update_state(&run_id, RunState::Done);
        })
    };

    let reader = {
        let tracker = tracker.clone();
        let run_id = run_id.clone();
        tokio::spawn(async move {
            loop {
                let snapshot = tracker.get(&run_id).unwrap();
                if let (Some(new_jobs), Some(duplicates)) = (
                    snapshot.stats.get("new_jobs"),
                    snapshot.stats.get("duplicates"),
                ) {
                    // A snapshot never mixes two different patches
                    assert_eq!(new_jobs, duplicates);
                }
                if snapshot.state == RunState::Done {
                    break;
                }
                tokio::task::yield_now().await;
            }
        })
    };

    writer.await.unwrap();
    reader.await.unwrap();
}

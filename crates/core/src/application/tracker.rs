// Pipeline Run Tracker - shared state between workers and status pollers

use crate::domain::{RunId, RunSnapshot, RunState};
use crate::port::{IdProvider, TimeProvider};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

/// A run keeps only its most recent log entries
pub const MAX_RUN_LOGS: usize = 100;

/// Runs become invisible to lookups this long after creation
pub const DEFAULT_RUN_TTL: Duration = Duration::from_secs(3600);

struct RunEntry {
    kind: String,
    state: RunState,
    logs: Vec<String>,
    stats: Map<String, Value>,
    started_at: i64,
}

impl RunEntry {
    fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            kind: self.kind.clone(),
            state: self.state,
            logs: self.logs.clone(),
            stats: self.stats.clone(),
            started_at: self.started_at,
        }
    }
}

/// Thread-safe registry of in-flight and completed pipeline runs.
///
/// Explicitly constructed and shared by handle; one lock acquisition per
/// operation, and snapshots are deep copies so readers never observe
/// partial state. Expired runs are swept whenever a new run is created and
/// are then indistinguishable from runs that never existed.
pub struct PipelineRunTracker {
    runs: Mutex<HashMap<RunId, RunEntry>>,
    ttl_ms: i64,
    time_provider: Arc<dyn TimeProvider>,
    id_provider: Arc<dyn IdProvider>,
}

impl PipelineRunTracker {
    pub fn new(time_provider: Arc<dyn TimeProvider>, id_provider: Arc<dyn IdProvider>) -> Self {
        Self::with_ttl(DEFAULT_RUN_TTL, time_provider, id_provider)
    }

    pub fn with_ttl(
        ttl: Duration,
        time_provider: Arc<dyn TimeProvider>,
        id_provider: Arc<dyn IdProvider>,
    ) -> Self {
        Self {
            runs: Mutex::new(HashMap::new()),
            ttl_ms: ttl.as_millis() as i64,
            time_provider,
            id_provider,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<RunId, RunEntry>> {
        self.runs.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Create a new run in the `running` state, sweeping expired runs first
    pub fn create(&self, kind: &str) -> RunId {
        let now = self.time_provider.now_millis();
        let run_id = self.id_provider.generate_id();
        let mut runs = self.lock();
        runs.retain(|id, entry| {
            let expired = now - entry.started_at > self.ttl_ms;
            if expired {
                debug!(run_id = %id, "evicting expired pipeline run");
            }
            !expired
        });
        runs.insert(
            run_id.clone(),
            RunEntry {
                kind: kind.to_string(),
                state: RunState::Running,
                logs: Vec::new(),
                stats: Map::new(),
                started_at: now,
            },
        );
        run_id
    }

    /// Append a log message, trimming to the most recent [`MAX_RUN_LOGS`].
    /// Unknown IDs are a silent no-op.
    pub fn append_log(&self, run_id: &str, msg: impl Into<String>) {
        let mut runs = self.lock();
        if let Some(entry) = runs.get_mut(run_id) {
            entry.logs.push(msg.into());
            if entry.logs.len() > MAX_RUN_LOGS {
                let excess = entry.logs.len() - MAX_RUN_LOGS;
                entry.logs.drain(..excess);
            }
        }
    }

    /// Shallow-merge keys into the run's stats map (unknown ID: no-op)
    pub fn update_stats(&self, run_id: &str, patch: Map<String, Value>) {
        let mut runs = self.lock();
        if let Some(entry) = runs.get_mut(run_id) {
            for (key, value) in patch {
                entry.stats.insert(key, value);
            }
        }
    }

    /// Transition the run's state. Terminal states are final; attempts to
    /// leave them are ignored.
    pub fn update_state(&self, run_id: &str, state: RunState) {
        let mut runs = self.lock();
        if let Some(entry) = runs.get_mut(run_id) {
            if !entry.state.is_terminal() {
                entry.state = state;
            }
        }
    }

    /// Snapshot one run, or `None` for unknown/expired IDs
    pub fn get(&self, run_id: &str) -> Option<RunSnapshot> {
        self.lock().get(run_id).map(RunEntry::snapshot)
    }
}

/// Convert a `json!({..})` literal into a stats patch map
pub fn stats_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

// Pipeline Run Domain Model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Pipeline run ID (UUID v4)
pub type RunId = String;

/// Run state (monotonic: running -> done | failed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Running,
    Done,
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::Failed)
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Running => write!(f, "running"),
            RunState::Done => write!(f, "done"),
            RunState::Failed => write!(f, "failed"),
        }
    }
}

/// Read-only copy of one run's state, safe to hand to status pollers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub kind: String,
    pub state: RunState,
    pub logs: Vec<String>,
    pub stats: Map<String, Value>,
    /// Epoch ms at creation
    pub started_at: i64,
}

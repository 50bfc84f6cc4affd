// LLM Client Port (Interface)

use crate::error::Result;
use async_trait::async_trait;

/// Outcome of a schema-constrained completion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstrainedOutcome {
    /// Model produced text under the requested schema
    Text(String),
    /// Upstream does not support constrained output for this model
    Unsupported,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Request a completion constrained to the given JSON schema
    async fn complete_constrained(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
    ) -> Result<ConstrainedOutcome>;

    /// Request an unconstrained completion
    async fn complete_freeform(&self, prompt: &str) -> Result<String>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// LLM client replaying scripted responses per call, in order.
    ///
    /// Exhausted scripts answer `Unsupported` (constrained) or an empty
    /// string (freeform) so tests fail loudly on unexpected extra calls.
    pub struct ScriptedLlm {
        constrained: Mutex<VecDeque<Result<ConstrainedOutcome>>>,
        freeform: Mutex<VecDeque<Result<String>>>,
        constrained_calls: AtomicU32,
        freeform_calls: AtomicU32,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        pub fn new(
            constrained: Vec<Result<ConstrainedOutcome>>,
            freeform: Vec<Result<String>>,
        ) -> Self {
            Self {
                constrained: Mutex::new(constrained.into()),
                freeform: Mutex::new(freeform.into()),
                constrained_calls: AtomicU32::new(0),
                freeform_calls: AtomicU32::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn constrained_calls(&self) -> u32 {
            self.constrained_calls.load(Ordering::SeqCst)
        }

        pub fn freeform_calls(&self) -> u32 {
            self.freeform_calls.load(Ordering::SeqCst)
        }

        pub fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap_or_else(|e| e.into_inner()).clone()
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn complete_constrained(
            &self,
            prompt: &str,
            _schema: &serde_json::Value,
        ) -> Result<ConstrainedOutcome> {
            self.constrained_calls.fetch_add(1, Ordering::SeqCst);
            self.prompts
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(prompt.to_string());
            self.constrained
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .pop_front()
                .unwrap_or(Ok(ConstrainedOutcome::Unsupported))
        }

        async fn complete_freeform(&self, prompt: &str) -> Result<String> {
            self.freeform_calls.fetch_add(1, Ordering::SeqCst);
            self.prompts
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(prompt.to_string());
            self.freeform
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .pop_front()
                .unwrap_or(Ok(String::new()))
        }
    }
}

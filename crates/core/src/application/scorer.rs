// AI Scorer - resilient batch scoring of jobs against a candidate profile

use crate::domain::{Job, JobId};
use crate::error::{AppError, Result};
use crate::port::{ConstrainedOutcome, LlmClient};
use regex::Regex;
use serde_json::{json, Value};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::warn;

pub const MIN_BATCH_SIZE: u32 = 3;
pub const MAX_BATCH_SIZE: u32 = 12;

/// How much of each description the prompt carries
pub const DESCRIPTION_SNIPPET_LIMIT: usize = 600;

/// Delay after every batch, successful or not, to stay under upstream
/// rate limits
pub const BATCH_PACING: Duration = Duration::from_secs(1);

/// One scoring invocation: credentials, profile, and the requested batching
#[derive(Debug, Clone)]
pub struct ScoreRequest {
    pub api_key: String,
    pub model: String,
    /// Free-text description of the candidate being matched
    pub profile: String,
    pub batch_size: u32,
}

/// Fit score for one job, already clamped to [0, 100]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreResult {
    pub job_id: JobId,
    pub score: i64,
}

/// Everything one scoring run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreOutcome {
    pub scores: Vec<ScoreResult>,
    /// Upstream requests consumed, fallback retries included
    pub requests_used: u32,
}

pub fn clamp_batch_size(requested: u32) -> usize {
    requested.clamp(MIN_BATCH_SIZE, MAX_BATCH_SIZE) as usize
}

fn array_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // The pattern is a literal; it cannot fail to compile at runtime
    RE.get_or_init(|| Regex::new(r"(?s)\[.*\]").expect("valid regex literal"))
}

/// Extract the JSON array from a raw model response: code-fence markers are
/// stripped, then the first bracketed substring is taken.
fn extract_array(raw: &str) -> Option<String> {
    let cleaned = raw.replace("```json", "").replace("```", "");
    array_pattern()
        .find(&cleaned)
        .map(|m| m.as_str().to_string())
}

/// Parse `[{"idx": n, "score": s}, ..]` into per-index scores. `None` means
/// the text was not a JSON array at all.
fn parse_scores(array_text: &str, batch_len: usize) -> Option<Vec<i64>> {
    let parsed: Value = serde_json::from_str(array_text).ok()?;
    let items = parsed.as_array()?;
    let mut scores = vec![0i64; batch_len];
    for item in items {
        let Some(idx) = item.get("idx").and_then(Value::as_u64) else {
            continue;
        };
        let score = item.get("score").and_then(Value::as_i64).unwrap_or(0);
        if let Some(slot) = scores.get_mut(idx as usize) {
            *slot = score.clamp(0, 100);
        }
    }
    Some(scores)
}

fn response_schema() -> Value {
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "properties": {
                "idx": {"type": "integer"},
                "score": {"type": "integer", "minimum": 0, "maximum": 100}
            },
            "required": ["idx", "score"],
            "additionalProperties": false
        }
    })
}

/// Scores jobs against a candidate profile in sequential batches.
///
/// Every batch first tries a schema-constrained completion and falls back
/// to one unconstrained attempt; an unparseable response zeroes that batch
/// and scoring moves on. Batches never run concurrently.
pub struct AiScorer {
    client: Arc<dyn LlmClient>,
    pacing: Duration,
}

impl AiScorer {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self::with_pacing(client, BATCH_PACING)
    }

    /// Tests inject `Duration::ZERO` here
    pub fn with_pacing(client: Arc<dyn LlmClient>, pacing: Duration) -> Self {
        Self { client, pacing }
    }

    pub async fn score(&self, request: &ScoreRequest, jobs: &[Job]) -> Result<ScoreOutcome> {
        if request.api_key.trim().is_empty() {
            return Err(AppError::Validation("API key is required".to_string()));
        }
        if request.model.trim().is_empty() {
            return Err(AppError::Validation("Model is required".to_string()));
        }
        if request.profile.trim().is_empty() {
            return Err(AppError::Validation(
                "Candidate profile must not be blank".to_string(),
            ));
        }

        let batch_size = clamp_batch_size(request.batch_size);
        let mut scores = Vec::with_capacity(jobs.len());
        let mut requests_used = 0u32;

        for batch in jobs.chunks(batch_size) {
            let prompt = build_prompt(&request.profile, batch);
            let (raw, used) = self.request_batch(&prompt).await;
            requests_used += used;

            let batch_scores = raw
                .as_deref()
                .and_then(extract_array)
                .and_then(|array| parse_scores(&array, batch.len()))
                .unwrap_or_else(|| {
                    warn!(batch_len = batch.len(), "unparseable score response, zeroing batch");
                    vec![0; batch.len()]
                });

            for (job, score) in batch.iter().zip(batch_scores) {
                scores.push(ScoreResult {
                    job_id: job.id.clone(),
                    score,
                });
            }

            if !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
        }

        Ok(ScoreOutcome {
            scores,
            requests_used,
        })
    }

    /// Constrained first; one unconstrained retry when that is unsupported
    /// or fails. Returns the raw text (if any) and how many upstream
    /// requests were consumed.
    async fn request_batch(&self, prompt: &str) -> (Option<String>, u32) {
        match self.client.complete_constrained(prompt, &response_schema()).await {
            Ok(ConstrainedOutcome::Text(text)) => return (Some(text), 1),
            Ok(ConstrainedOutcome::Unsupported) => {}
            Err(e) => {
                warn!(error = %e, "constrained scoring request failed, retrying unconstrained");
            }
        }
        match self.client.complete_freeform(prompt).await {
            Ok(text) => (Some(text), 2),
            Err(e) => {
                warn!(error = %e, "unconstrained scoring request failed");
                (None, 2)
            }
        }
    }
}

fn build_prompt(profile: &str, batch: &[Job]) -> String {
    let compact: Vec<Value> = batch
        .iter()
        .enumerate()
        .map(|(idx, job)| {
            json!({
                "idx": idx,
                "title": job.title,
                "company": job.company,
                "location": job.location,
                "is_remote": job.is_remote,
                "description": job.description.chars().take(DESCRIPTION_SNIPPET_LIMIT).collect::<String>(),
            })
        })
        .collect();
    format!(
        "You are scoring job postings for fit against a candidate profile.\n\
         Candidate profile:\n{profile}\n\n\
         Jobs:\n{jobs}\n\n\
         Score each job 0-100 for fit. Respond with ONLY a JSON array of \
         objects with integer fields \"idx\" and \"score\", no other keys, \
         no surrounding prose.",
        jobs = Value::Array(compact)
    )
}

// OpenAI-compatible Chat Completion Client

use async_trait::async_trait;
use jobscout_core::error::{AppError, Result};
use jobscout_core::port::{ConstrainedOutcome, LlmClient};
use jobscout_core::util::mask_api_key;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Chat completion client for any OpenAI-compatible endpoint.
///
/// Constrained completions use the `response_format: json_schema` contract;
/// endpoints that reject it surface as [`ConstrainedOutcome::Unsupported`]
/// so the caller can fall back to an unconstrained request.
#[derive(Debug)]
pub struct OpenAiChatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiChatClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        let model = model.into();
        if api_key.trim().is_empty() {
            return Err(AppError::Validation("API key is required".to_string()));
        }
        if model.trim().is_empty() {
            return Err(AppError::Validation("Model is required".to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(e.to_string()))?;

        debug!(
            model = %model,
            api_key = %mask_api_key(&api_key),
            "LLM client configured"
        );
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }

    async fn post_chat(&self, body: Value) -> Result<(reqwest::StatusCode, String)> {
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;
        Ok((status, text))
    }
}

fn chat_body(model: &str, prompt: &str) -> Value {
    json!({
        "model": model,
        "messages": [{"role": "user", "content": prompt}],
        "temperature": 0,
    })
}

fn constrained_body(model: &str, prompt: &str, schema: &Value) -> Value {
    let mut body = chat_body(model, prompt);
    body["response_format"] = json!({
        "type": "json_schema",
        "json_schema": {
            "name": "job_scores",
            "strict": true,
            // Object root per the upstream contract; the payload array
            // lives under "scores"
            "schema": {
                "type": "object",
                "properties": {"scores": schema},
                "required": ["scores"],
                "additionalProperties": false
            }
        }
    });
    body
}

/// A 400 complaining about the response format means the endpoint does not
/// do constrained output, not that the request itself is broken.
fn is_constrained_rejection(status: reqwest::StatusCode, body: &str) -> bool {
    status == reqwest::StatusCode::BAD_REQUEST
        && (body.contains("response_format") || body.contains("json_schema"))
}

/// Pull the assistant text out of a chat completion response
fn extract_content(body: &str) -> Result<String> {
    let parsed: Value = serde_json::from_str(body)
        .map_err(|e| AppError::Parsing(format!("malformed completion response: {e}")))?;
    parsed["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| {
            AppError::Parsing("completion response carries no message content".to_string())
        })
}

fn upstream_error(status: reqwest::StatusCode, body: &str) -> AppError {
    let snippet: String = body.chars().take(300).collect();
    AppError::Upstream(format!("chat completion failed ({status}): {snippet}"))
}

#[async_trait]
impl LlmClient for OpenAiChatClient {
    async fn complete_constrained(
        &self,
        prompt: &str,
        schema: &Value,
    ) -> Result<ConstrainedOutcome> {
        let body = constrained_body(&self.model, prompt, schema);
        let (status, text) = self.post_chat(body).await?;

        if is_constrained_rejection(status, &text) {
            debug!(model = %self.model, "constrained output unsupported by endpoint");
            return Ok(ConstrainedOutcome::Unsupported);
        }
        if !status.is_success() {
            return Err(upstream_error(status, &text));
        }
        Ok(ConstrainedOutcome::Text(extract_content(&text)?))
    }

    async fn complete_freeform(&self, prompt: &str) -> Result<String> {
        let (status, text) = self.post_chat(chat_body(&self.model, prompt)).await?;
        if !status.is_success() {
            return Err(upstream_error(status, &text));
        }
        extract_content(&text)
    }
}

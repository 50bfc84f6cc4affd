// External Scraper Port (Interface)
// The per-site scraping transport is an external capability; the core only
// sees this boundary.

use crate::domain::RawJobRecord;
use crate::error::Result;
use async_trait::async_trait;

/// One (title, location) search against all configured sites at once
#[derive(Debug, Clone)]
pub struct ScrapeQuery {
    pub sites: Vec<String>,
    pub title: String,
    pub location: String,
    /// Per-site result cap, already clamped by the orchestrator
    pub max_results: u32,
    /// Maximum posting age in hours, already clamped
    pub max_age_hours: u32,
    /// Normalized country hint (e.g. "usa", "uk", "india")
    pub country: String,
}

#[async_trait]
pub trait ExternalScraper: Send + Sync {
    /// Run one search and return the raw records it produced.
    ///
    /// # Errors
    /// Any failure is isolated to this query by the orchestrator; it never
    /// aborts the run.
    async fn search(&self, query: &ScrapeQuery) -> Result<Vec<RawJobRecord>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scraper that replays a scripted sequence of per-query responses.
    ///
    /// Responses are consumed in call order; once the script is exhausted
    /// every further query returns an empty record list. Queries are
    /// recorded for assertions.
    pub struct ScriptedScraper {
        responses: Mutex<VecDeque<Result<Vec<RawJobRecord>>>>,
        queries: Mutex<Vec<ScrapeQuery>>,
    }

    impl ScriptedScraper {
        pub fn new(responses: Vec<Result<Vec<RawJobRecord>>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                queries: Mutex::new(Vec::new()),
            }
        }

        pub fn recorded_queries(&self) -> Vec<ScrapeQuery> {
            self.queries
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone()
        }

        pub fn query_count(&self) -> usize {
            self.queries.lock().unwrap_or_else(|e| e.into_inner()).len()
        }
    }

    #[async_trait]
    impl ExternalScraper for ScriptedScraper {
        async fn search(&self, query: &ScrapeQuery) -> Result<Vec<RawJobRecord>> {
            self.queries
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(query.clone());
            self.responses
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    /// Scraper whose every query fails, for failure-isolation tests
    pub struct FailingScraper;

    #[async_trait]
    impl ExternalScraper for FailingScraper {
        async fn search(&self, query: &ScrapeQuery) -> Result<Vec<RawJobRecord>> {
            Err(AppError::Scraping(format!(
                "upstream unavailable for '{}' in '{}'",
                query.title, query.location
            )))
        }
    }
}

// Port Layer - Interfaces for external dependencies

pub mod id_provider; // For deterministic testing
pub mod job_store;
pub mod llm_client;
pub mod scraper;
pub mod time_provider;

// Re-exports
pub use id_provider::IdProvider;
pub use job_store::{JobPage, JobSearchFilter, JobStore, StoreStats};
pub use llm_client::{ConstrainedOutcome, LlmClient};
pub use scraper::{ExternalScraper, ScrapeQuery};
pub use time_provider::TimeProvider;

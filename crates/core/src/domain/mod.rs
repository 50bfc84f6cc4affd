// Domain Layer - Pure business logic and entities

pub mod canonical_url;
pub mod error;
pub mod job;
pub mod run;

// Re-exports
pub use canonical_url::canonicalize_url;
pub use error::DomainError;
pub use job::{BatchId, Job, JobId, JobStatus, NewJob, RawJobRecord};
pub use run::{RunId, RunSnapshot, RunState};

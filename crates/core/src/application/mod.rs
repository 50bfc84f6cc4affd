// Application Layer - Use Cases and Business Logic

pub mod jobs;
pub mod normalizer;
pub mod orchestrator;
pub mod scorer;
pub mod scrape;
pub mod sink;
pub mod tracker;

// Re-exports
pub use jobs::JobService;
pub use normalizer::{DataMode, RecordNormalizer, RejectReason};
pub use orchestrator::{ScrapeConfig, ScrapeObserver, ScrapeOrchestrator, ScrapeStats};
pub use scorer::{AiScorer, ScoreOutcome, ScoreRequest, ScoreResult};
pub use scrape::{ScrapeService, StartedRun};
pub use sink::{CollectingSink, JobSink, SinkOutcome, StoreSink};
pub use tracker::PipelineRunTracker;

// Job Domain Model

use serde::{Deserialize, Serialize};

/// Job row ID (UUID v4, assigned at persistence time)
pub type JobId = String;

/// Batch identifier grouping jobs discovered in one scrape run
pub type BatchId = String;

/// Job status lifecycle: new -> saved | rejected (reversible)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    New,
    Saved,
    Rejected,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::New => write!(f, "new"),
            JobStatus::Saved => write!(f, "saved"),
            JobStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = crate::domain::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(JobStatus::New),
            "saved" => Ok(JobStatus::Saved),
            "rejected" => Ok(JobStatus::Rejected),
            other => Err(crate::domain::DomainError::InvalidStatus(other.to_string())),
        }
    }
}

/// One raw record returned by an external scraper.
///
/// Field presence varies per source site, so everything is optional with
/// empty/false defaults applied by the normalizer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawJobRecord {
    #[serde(default)]
    pub job_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_remote: Option<bool>,
    #[serde(default)]
    pub date_posted: Option<String>,
    #[serde(default)]
    pub source_site: Option<String>,
}

/// A normalized job candidate that has passed filtering but is not yet
/// persisted. The sink turns it into a [`Job`] when it is genuinely new.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewJob {
    /// Canonicalized-URL identity used for deduplication
    pub dedup_key: String,
    pub title: String,
    pub company: String,
    pub location: String,
    /// Canonical URL (same value as the dedup key)
    pub job_url: String,
    pub description: String,
    pub is_remote: bool,
    pub date_posted: String,
    pub source_site: String,
    /// Which (title, location) query produced this record
    pub search_title: String,
    pub search_location: String,
}

/// A persisted job posting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub title: String,
    pub company: String,
    pub location: String,
    pub job_url: String,
    pub description: String,
    pub is_remote: bool,
    pub date_posted: String,
    pub source_site: String,
    pub search_title: String,
    pub search_location: String,
    pub status: JobStatus,
    pub batch_id: BatchId,
    /// Creation timestamp in epoch ms (injected, not system time)
    pub fetched_at: i64,
}

impl Job {
    /// Promote an accepted candidate to a persisted row.
    ///
    /// ID and timestamp are injected so persistence stays deterministic in
    /// tests; the status always starts at `new`.
    pub fn from_candidate(
        candidate: NewJob,
        id: impl Into<String>,
        batch_id: impl Into<String>,
        fetched_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            title: candidate.title,
            company: candidate.company,
            location: candidate.location,
            job_url: candidate.job_url,
            description: candidate.description,
            is_remote: candidate.is_remote,
            date_posted: candidate.date_posted,
            source_site: candidate.source_site,
            search_title: candidate.search_title,
            search_location: candidate.search_location,
            status: JobStatus::New,
            batch_id: batch_id.into(),
            fetched_at,
        }
    }

    /// Dedup identity of the persisted row
    pub fn dedup_key(&self) -> &str {
        &self.job_url
    }
}

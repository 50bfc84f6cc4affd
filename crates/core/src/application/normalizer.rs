// Record Normalizer - raw scraper records to typed job candidates

use crate::domain::{canonicalize_url, NewJob, RawJobRecord};

/// Compact mode truncates descriptions to this many characters
pub const COMPACT_DESCRIPTION_LIMIT: usize = 1200;

/// How much of each record to keep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataMode {
    #[default]
    Compact,
    Full,
}

impl DataMode {
    /// Anything other than "full" means compact
    pub fn parse(s: &str) -> Self {
        if s == "full" {
            DataMode::Full
        } else {
            DataMode::Compact
        }
    }
}

/// Why a raw record was not turned into a job candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// URL or title missing/blank
    MissingFields,
    /// An exclude keyword matched (always wins over includes)
    ExcludedKeyword,
    /// Include keywords configured but none matched
    NoIncludeMatch,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::MissingFields => write!(f, "missing url or title"),
            RejectReason::ExcludedKeyword => write!(f, "exclude keyword matched"),
            RejectReason::NoIncludeMatch => write!(f, "no include keyword matched"),
        }
    }
}

/// Converts one raw scraped record into a [`NewJob`] candidate, applying
/// include/exclude keyword filtering. Pure: no network, no persistence.
pub struct RecordNormalizer {
    include: Vec<String>,
    exclude: Vec<String>,
    data_mode: DataMode,
}

impl RecordNormalizer {
    pub fn new(include_keywords: &[String], exclude_keywords: &[String], data_mode: DataMode) -> Self {
        Self {
            include: include_keywords.iter().map(|k| k.to_lowercase()).collect(),
            exclude: exclude_keywords.iter().map(|k| k.to_lowercase()).collect(),
            data_mode,
        }
    }

    /// Normalize one record produced by the (title, location) query.
    ///
    /// Filtering runs on the full description; compact truncation happens
    /// only after a record is accepted.
    pub fn normalize(
        &self,
        record: &RawJobRecord,
        search_title: &str,
        search_location: &str,
    ) -> Result<NewJob, RejectReason> {
        let url = record.job_url.as_deref().unwrap_or("").trim();
        let title = record.title.as_deref().unwrap_or("").trim();
        if url.is_empty() || title.is_empty() {
            return Err(RejectReason::MissingFields);
        }

        let company = record.company.as_deref().unwrap_or("").trim();
        let location = record.location.as_deref().unwrap_or("").trim();
        let description = record.description.as_deref().unwrap_or("");

        let blob = format!("{title} {company} {location} {description}").to_lowercase();

        // Exclusion always wins, even when an include keyword also matches
        if self.exclude.iter().any(|k| blob.contains(k.as_str())) {
            return Err(RejectReason::ExcludedKeyword);
        }
        if !self.include.is_empty() && !self.include.iter().any(|k| blob.contains(k.as_str())) {
            return Err(RejectReason::NoIncludeMatch);
        }

        let description = match self.data_mode {
            DataMode::Compact => description.chars().take(COMPACT_DESCRIPTION_LIMIT).collect(),
            DataMode::Full => description.to_string(),
        };

        let dedup_key = canonicalize_url(url);
        Ok(NewJob {
            job_url: dedup_key.clone(),
            dedup_key,
            title: title.to_string(),
            company: company.to_string(),
            location: location.to_string(),
            description,
            is_remote: record.is_remote.unwrap_or(false),
            date_posted: record.date_posted.as_deref().unwrap_or("").trim().to_string(),
            source_site: record.source_site.as_deref().unwrap_or("").trim().to_string(),
            search_title: search_title.to_string(),
            search_location: search_location.to_string(),
        })
    }
}

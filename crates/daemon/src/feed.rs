// Feed Scraper - file-backed ExternalScraper adapter
//
// Reads per-site JSON feed files ({feed_dir}/{site}.json, each an array of
// raw records) exported by an external collection step. Keeps the daemon
// runnable end to end without a live scraping transport.

use async_trait::async_trait;
use jobscout_core::domain::RawJobRecord;
use jobscout_core::error::{AppError, Result};
use jobscout_core::port::{ExternalScraper, ScrapeQuery};
use std::path::PathBuf;
use tracing::debug;

pub struct FeedScraper {
    feed_dir: PathBuf,
}

impl FeedScraper {
    pub fn new(feed_dir: impl Into<PathBuf>) -> Self {
        Self {
            feed_dir: feed_dir.into(),
        }
    }

    async fn load_site(&self, site: &str) -> Result<Vec<RawJobRecord>> {
        let path = self.feed_dir.join(format!("{site}.json"));
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| AppError::Scraping(format!("cannot read feed {}: {e}", path.display())))?;
        let mut records: Vec<RawJobRecord> = serde_json::from_slice(&bytes)
            .map_err(|e| AppError::Scraping(format!("malformed feed {}: {e}", path.display())))?;
        for record in &mut records {
            if record.source_site.is_none() {
                record.source_site = Some(site.to_string());
            }
        }
        Ok(records)
    }
}

fn matches_query(record: &RawJobRecord, query: &ScrapeQuery) -> bool {
    let title = query.title.to_lowercase();
    let location = query.location.to_lowercase();
    let record_title = record.title.as_deref().unwrap_or("").to_lowercase();
    let record_location = record.location.as_deref().unwrap_or("").to_lowercase();
    record_title.contains(&title)
        && (record_location.contains(&location) || record.is_remote.unwrap_or(false))
}

#[async_trait]
impl ExternalScraper for FeedScraper {
    async fn search(&self, query: &ScrapeQuery) -> Result<Vec<RawJobRecord>> {
        let mut results = Vec::new();
        for site in &query.sites {
            let records = self.load_site(site).await?;
            let matched = records
                .into_iter()
                .filter(|r| matches_query(r, query))
                .take(query.max_results as usize);
            results.extend(matched);
        }
        debug!(
            title = %query.title,
            location = %query.location,
            count = results.len(),
            "feed search"
        );
        Ok(results)
    }
}

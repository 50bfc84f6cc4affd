// Scrape Orchestrator - query planning and streaming normalization

use crate::application::normalizer::{DataMode, RecordNormalizer};
use crate::application::sink::{JobSink, SinkOutcome};
use crate::error::{AppError, Result};
use crate::port::{ExternalScraper, ScrapeQuery};
use std::collections::HashSet;
use std::sync::Arc;

// Hard guardrails on caller-supplied configuration
pub const MIN_RESULTS_PER_SITE: u32 = 5;
pub const MAX_RESULTS_PER_SITE: u32 = 100;
pub const DEFAULT_RESULTS_PER_SITE: u32 = 20;
pub const MIN_HOURS_OLD: u32 = 1;
pub const MAX_HOURS_OLD: u32 = 720; // 30 days
pub const DEFAULT_HOURS_OLD: u32 = 72;
pub const DEFAULT_SITE: &str = "linkedin";

/// Country codes the external scrapers understand
pub const SUPPORTED_COUNTRIES: &[&str] = &["india", "usa", "uk", "canada", "australia"];

/// Collapse common aliases to the canonical country code
pub fn normalize_country(raw: &str) -> String {
    let code = raw.trim().to_lowercase();
    match code.as_str() {
        "us" | "united states" => "usa".to_string(),
        "united kingdom" => "uk".to_string(),
        _ => code,
    }
}

/// Configuration for one scrape run
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub titles: Vec<String>,
    pub locations: Vec<String>,
    pub sites: Vec<String>,
    pub country: String,
    pub include_keywords: Vec<String>,
    pub exclude_keywords: Vec<String>,
    pub results_per_site: u32,
    pub hours_old: u32,
    pub data_mode: DataMode,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            titles: Vec::new(),
            locations: Vec::new(),
            sites: vec![DEFAULT_SITE.to_string()],
            country: "india".to_string(),
            include_keywords: Vec::new(),
            exclude_keywords: Vec::new(),
            results_per_site: DEFAULT_RESULTS_PER_SITE,
            hours_old: DEFAULT_HOURS_OLD,
            data_mode: DataMode::Compact,
        }
    }
}

impl ScrapeConfig {
    /// Titles with blanks trimmed away
    pub fn clean_titles(&self) -> Vec<String> {
        clean_list(&self.titles)
    }

    /// Locations with blanks trimmed away
    pub fn clean_locations(&self) -> Vec<String> {
        clean_list(&self.locations)
    }

    /// Sites, defaulting to linkedin when none are configured
    pub fn effective_sites(&self) -> Vec<String> {
        let sites = clean_list(&self.sites);
        if sites.is_empty() {
            vec![DEFAULT_SITE.to_string()]
        } else {
            sites
        }
    }
}

fn clean_list(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn clamp_or_default(value: u32, default: u32, min: u32, max: u32) -> u32 {
    let value = if value == 0 { default } else { value };
    value.clamp(min, max)
}

/// Aggregate counters for one scrape run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrapeStats {
    /// Records returned by the scraper before any filtering
    pub raw_total: u64,
    /// Records the sink reported as newly created
    pub kept_total: u64,
    /// Records rejected for missing fields or by keyword rules
    pub filtered_out: u64,
}

/// Receives run log lines and per-query progress from the orchestrator
pub trait ScrapeObserver: Send + Sync {
    fn log(&self, msg: String);

    fn progress(&self, _current_query: usize, _total_queries: usize, _sites: &str) {}
}

/// No-op observer for callers that only want the returned stats
pub struct SilentObserver;

impl ScrapeObserver for SilentObserver {
    fn log(&self, _msg: String) {}
}

/// Builds the titles x locations query plan, invokes the external scraper
/// per pair, and streams accepted records into the sink.
pub struct ScrapeOrchestrator {
    scraper: Arc<dyn ExternalScraper>,
}

impl ScrapeOrchestrator {
    pub fn new(scraper: Arc<dyn ExternalScraper>) -> Self {
        Self { scraper }
    }

    /// Execute the full query plan.
    ///
    /// Queries run in fixed titles x locations enumeration order. A failed
    /// query is logged and skipped; it never aborts the run. Validation
    /// failures (empty titles or locations) are returned before any
    /// scraping starts.
    pub async fn run(
        &self,
        config: &ScrapeConfig,
        observer: &dyn ScrapeObserver,
        sink: &dyn JobSink,
    ) -> Result<ScrapeStats> {
        let titles = config.clean_titles();
        let locations = config.clean_locations();
        if titles.is_empty() {
            return Err(AppError::Validation(
                "Titles are empty. Provide at least one title.".to_string(),
            ));
        }
        if locations.is_empty() {
            return Err(AppError::Validation(
                "Locations are empty. Provide at least one location.".to_string(),
            ));
        }

        let sites = config.effective_sites();
        let sites_label = sites.join(", ");
        let results_per_site = clamp_or_default(
            config.results_per_site,
            DEFAULT_RESULTS_PER_SITE,
            MIN_RESULTS_PER_SITE,
            MAX_RESULTS_PER_SITE,
        );
        let hours_old =
            clamp_or_default(config.hours_old, DEFAULT_HOURS_OLD, MIN_HOURS_OLD, MAX_HOURS_OLD);
        let country = normalize_country(&config.country);
        let normalizer = RecordNormalizer::new(
            &config.include_keywords,
            &config.exclude_keywords,
            config.data_mode,
        );

        observer.log(format!(
            "Scrape plan: titles={}, locations={}, sites={}, country={}",
            titles.len(),
            locations.len(),
            sites.len(),
            country
        ));
        observer.log("Scraping...".to_string());

        let total_queries = titles.len() * locations.len();
        let mut current_query = 0usize;
        let mut stats = ScrapeStats::default();
        let mut seen: HashSet<String> = HashSet::new();

        for (t_i, title) in titles.iter().enumerate() {
            for (l_i, location) in locations.iter().enumerate() {
                current_query += 1;
                observer.progress(current_query, total_queries, &sites_label);
                observer.log(format!(
                    "Query {}/{} x {}/{} -> '{}' in '{}' via {}",
                    t_i + 1,
                    titles.len(),
                    l_i + 1,
                    locations.len(),
                    title,
                    location,
                    sites_label
                ));

                let query = ScrapeQuery {
                    sites: sites.clone(),
                    title: title.clone(),
                    location: location.clone(),
                    max_results: results_per_site,
                    max_age_hours: hours_old,
                    country: country.clone(),
                };

                let records = match self.scraper.search(&query).await {
                    Ok(records) => records,
                    Err(e) => {
                        observer.log(format!(
                            "Warning: scrape failed for '{title}' in '{location}': {e}"
                        ));
                        continue;
                    }
                };

                stats.raw_total += records.len() as u64;

                for record in &records {
                    let candidate = match normalizer.normalize(record, title, location) {
                        Ok(candidate) => candidate,
                        Err(_) => {
                            stats.filtered_out += 1;
                            continue;
                        }
                    };

                    // Within one run, repeated identities are skipped
                    // without consulting the sink at all
                    if !seen.insert(candidate.dedup_key.clone()) {
                        continue;
                    }

                    if sink.accept(candidate).await == SinkOutcome::Created {
                        stats.kept_total += 1;
                    }
                }
            }
        }

        observer.log(format!(
            "Scrape done. Raw={}, Kept={}, FilteredOut={}",
            stats.raw_total, stats.kept_total, stats.filtered_out
        ));
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::sink::CollectingSink;
    use crate::domain::RawJobRecord;
    use crate::port::scraper::mocks::ScriptedScraper;
    use std::sync::Mutex;

    fn record(url: &str, title: &str) -> RawJobRecord {
        RawJobRecord {
            job_url: Some(url.to_string()),
            title: Some(title.to_string()),
            ..RawJobRecord::default()
        }
    }

    fn config(titles: &[&str], locations: &[&str]) -> ScrapeConfig {
        ScrapeConfig {
            titles: titles.iter().map(|s| s.to_string()).collect(),
            locations: locations.iter().map(|s| s.to_string()).collect(),
            ..ScrapeConfig::default()
        }
    }

    struct RecordingObserver {
        logs: Mutex<Vec<String>>,
        progress: Mutex<Vec<(usize, usize, String)>>,
    }

    impl RecordingObserver {
        fn new() -> Self {
            Self {
                logs: Mutex::new(Vec::new()),
                progress: Mutex::new(Vec::new()),
            }
        }
    }

    impl ScrapeObserver for RecordingObserver {
        fn log(&self, msg: String) {
            self.logs.lock().unwrap().push(msg);
        }

        fn progress(&self, current: usize, total: usize, sites: &str) {
            self.progress
                .lock()
                .unwrap()
                .push((current, total, sites.to_string()));
        }
    }

    #[tokio::test]
    async fn test_empty_titles_fail_before_scraping() {
        let scraper = Arc::new(ScriptedScraper::new(vec![]));
        let orchestrator = ScrapeOrchestrator::new(scraper.clone());
        let sink = CollectingSink::new();

        let err = orchestrator
            .run(&config(&[], &["Pune"]), &SilentObserver, &sink)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(scraper.query_count(), 0, "no query may run on bad input");

        let err = orchestrator
            .run(&config(&["Engineer"], &["  "]), &SilentObserver, &sink)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_cross_product_query_plan() {
        let scraper = Arc::new(ScriptedScraper::new(vec![]));
        let orchestrator = ScrapeOrchestrator::new(scraper.clone());
        let observer = RecordingObserver::new();
        let sink = CollectingSink::new();

        orchestrator
            .run(
                &config(&["A", "B"], &["X", "Y", "Z"]),
                &observer,
                &sink,
            )
            .await
            .unwrap();

        assert_eq!(scraper.query_count(), 6);
        let queries = scraper.recorded_queries();
        // Fixed enumeration order: titles outer, locations inner
        assert_eq!(queries[0].title, "A");
        assert_eq!(queries[0].location, "X");
        assert_eq!(queries[2].title, "A");
        assert_eq!(queries[2].location, "Z");
        assert_eq!(queries[5].title, "B");
        assert_eq!(queries[5].location, "Z");

        let progress = observer.progress.lock().unwrap();
        assert_eq!(progress.len(), 6);
        assert_eq!(progress[0], (1, 6, "linkedin".to_string()));
        assert_eq!(progress[5], (6, 6, "linkedin".to_string()));
    }

    #[tokio::test]
    async fn test_query_failure_is_isolated() {
        let scraper = Arc::new(ScriptedScraper::new(vec![
            Ok(vec![record("https://x.test/j/1", "Engineer")]),
            Err(AppError::Scraping("boom".to_string())),
            Ok(vec![record("https://x.test/j/2", "Engineer")]),
        ]));
        let orchestrator = ScrapeOrchestrator::new(scraper.clone());
        let observer = RecordingObserver::new();
        let sink = CollectingSink::new();

        let stats = orchestrator
            .run(&config(&["Engineer"], &["X", "Y", "Z"]), &observer, &sink)
            .await
            .unwrap();

        assert_eq!(scraper.query_count(), 3, "failure must not stop later queries");
        assert_eq!(stats.kept_total, 2);
        assert!(observer
            .logs
            .lock()
            .unwrap()
            .iter()
            .any(|l| l.starts_with("Warning: scrape failed")));
    }

    #[tokio::test]
    async fn test_in_run_dedup_skips_repeats() {
        let scraper = Arc::new(ScriptedScraper::new(vec![
            Ok(vec![
                record("https://x.test/j/1", "Engineer"),
                record("https://x.test/j/1/?utm_source=a", "Engineer"),
            ]),
            Ok(vec![record("https://x.test/j/1#frag", "Engineer")]),
        ]));
        let orchestrator = ScrapeOrchestrator::new(scraper);
        let sink = CollectingSink::new();

        let stats = orchestrator
            .run(&config(&["Engineer"], &["X", "Y"]), &SilentObserver, &sink)
            .await
            .unwrap();

        assert_eq!(stats.raw_total, 3);
        assert_eq!(stats.kept_total, 1);
        assert_eq!(stats.filtered_out, 0);
        assert_eq!(sink.jobs().len(), 1);
    }

    #[tokio::test]
    async fn test_rejections_count_as_filtered() {
        let mut missing_url = record("", "Engineer");
        missing_url.job_url = None;
        let scraper = Arc::new(ScriptedScraper::new(vec![Ok(vec![
            missing_url,
            record("https://x.test/j/1", "Engineer Intern"),
            record("https://x.test/j/2", "Engineer"),
        ])]));
        let orchestrator = ScrapeOrchestrator::new(scraper);
        let sink = CollectingSink::new();

        let mut cfg = config(&["Engineer"], &["X"]);
        cfg.exclude_keywords = vec!["intern".to_string()];
        let stats = orchestrator.run(&cfg, &SilentObserver, &sink).await.unwrap();

        assert_eq!(stats.raw_total, 3);
        assert_eq!(stats.filtered_out, 2);
        assert_eq!(stats.kept_total, 1);
    }

    #[tokio::test]
    async fn test_clamps_and_country_hint_reach_the_scraper() {
        let scraper = Arc::new(ScriptedScraper::new(vec![]));
        let orchestrator = ScrapeOrchestrator::new(scraper.clone());
        let sink = CollectingSink::new();

        let mut cfg = config(&["Engineer"], &["X"]);
        cfg.results_per_site = 1000;
        cfg.hours_old = 0;
        cfg.country = "United States".to_string();
        cfg.sites = vec![String::new()];
        orchestrator.run(&cfg, &SilentObserver, &sink).await.unwrap();

        let queries = scraper.recorded_queries();
        assert_eq!(queries[0].max_results, MAX_RESULTS_PER_SITE);
        assert_eq!(queries[0].max_age_hours, DEFAULT_HOURS_OLD);
        assert_eq!(queries[0].country, "usa");
        assert_eq!(queries[0].sites, vec![DEFAULT_SITE.to_string()]);
    }

    #[test]
    fn test_normalize_country_aliases() {
        assert_eq!(normalize_country("US"), "usa");
        assert_eq!(normalize_country("united states"), "usa");
        assert_eq!(normalize_country(" United Kingdom "), "uk");
        assert_eq!(normalize_country("India"), "india");
        assert_eq!(normalize_country("canada"), "canada");
    }

    #[test]
    fn test_clamp_bounds() {
        assert_eq!(clamp_or_default(2, 20, 5, 100), 5);
        assert_eq!(clamp_or_default(1000, 20, 5, 100), 100);
        assert_eq!(clamp_or_default(0, 20, 5, 100), 20);
        assert_eq!(clamp_or_default(0, 72, 1, 720), 72);
        assert_eq!(clamp_or_default(10_000, 72, 1, 720), 720);
    }
}

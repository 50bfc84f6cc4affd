//! JobScout - Main Entry Point
//! Runs one scrape pipeline from environment configuration, then an
//! optional AI scoring pass over the new batch.

mod config;
mod feed;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use jobscout_core::application::scorer::{AiScorer, ScoreRequest};
use jobscout_core::application::{JobService, PipelineRunTracker, ScrapeService};
use jobscout_core::domain::RunState;
use jobscout_core::port::id_provider::UuidProvider;
use jobscout_core::port::time_provider::SystemTimeProvider;
use jobscout_core::port::JobSearchFilter;
use jobscout_infra_llm::OpenAiChatClient;
use jobscout_infra_sqlite::{create_pool, run_migrations, SqliteJobStore};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_FEED_DIR: &str = "~/.jobscout/feeds";

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize logging
    let log_format = std::env::var("JOBSCOUT_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("jobscout=info"))
        .expect("Failed to create env filter");

    match log_format.as_str() {
        "json" => {
            // Production: JSON structured logging
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            // Development: Pretty formatting with colors
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }

    info!("JobScout v{} starting...", VERSION);

    // 2. Load configuration
    let db_path = std::env::var("JOBSCOUT_DB_PATH")
        .unwrap_or_else(|_| shellexpand::tilde(config::DEFAULT_DB_PATH).into_owned());
    let feed_dir = std::env::var("JOBSCOUT_FEED_DIR")
        .unwrap_or_else(|_| shellexpand::tilde(DEFAULT_FEED_DIR).into_owned());

    info!(db_path = %db_path, "Initializing database...");

    // 3. Initialize database
    let pool = create_pool(&db_path)
        .await
        .map_err(|e| anyhow::anyhow!("DB pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    // 4. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let id_provider = Arc::new(UuidProvider);
    let store = Arc::new(SqliteJobStore::new(pool.clone()));
    let tracker = Arc::new(PipelineRunTracker::new(
        time_provider.clone(),
        id_provider.clone(),
    ));
    let scraper = Arc::new(feed::FeedScraper::new(&feed_dir));
    let scrape_service = ScrapeService::new(
        tracker.clone(),
        scraper,
        store.clone(),
        id_provider,
        time_provider,
    );
    let job_service = JobService::new(store.clone());

    // 5. Start one scrape run and follow it to a terminal state
    let scrape_config = config::scrape_config_from_env();
    let started = scrape_service
        .start_scrape_run(scrape_config)
        .map_err(|e| anyhow::anyhow!("Scrape rejected: {}", e))?;
    info!(run_id = %started.run_id, batch_id = %started.batch_id, "Scrape run started");

    let snapshot = loop {
        tokio::time::sleep(Duration::from_millis(250)).await;
        match scrape_service.run_status(&started.run_id) {
            Some(snapshot) if snapshot.state.is_terminal() => break snapshot,
            Some(_) => continue,
            None => anyhow::bail!("Run {} vanished before finishing", started.run_id),
        }
    };

    for line in &snapshot.logs {
        info!("{line}");
    }
    if snapshot.state == RunState::Failed {
        anyhow::bail!("Scrape run {} failed", started.run_id);
    }

    let stats = job_service.stats().await?;
    info!(
        total = stats.total,
        new = stats.new,
        saved = stats.saved,
        rejected = stats.rejected,
        "Inventory after scrape"
    );

    // 6. Optional scoring pass over the fresh batch
    if let Ok(api_key) = std::env::var("JOBSCOUT_OPENAI_API_KEY") {
        let model = std::env::var("JOBSCOUT_OPENAI_MODEL")
            .unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let profile = std::env::var("JOBSCOUT_PROFILE").unwrap_or_default();
        if profile.trim().is_empty() {
            warn!("JOBSCOUT_PROFILE not set, skipping scoring pass");
            return Ok(());
        }

        let page = job_service
            .search(&JobSearchFilter {
                batch_id: Some(started.batch_id.clone()),
                limit: 200,
                ..JobSearchFilter::default()
            })
            .await?;
        if page.jobs.is_empty() {
            info!("No new jobs in this batch to score");
            return Ok(());
        }

        let client = Arc::new(
            OpenAiChatClient::new(api_key.clone(), model.clone())
                .map_err(|e| anyhow::anyhow!("LLM client setup failed: {}", e))?,
        );
        let scorer = AiScorer::new(client);
        let request = ScoreRequest {
            api_key,
            model,
            profile,
            batch_size: 10,
        };
        let outcome = scorer
            .score(&request, &page.jobs)
            .await
            .map_err(|e| anyhow::anyhow!("Scoring failed: {}", e))?;
        info!(
            scored = outcome.scores.len(),
            requests_used = outcome.requests_used,
            "Scoring pass complete"
        );
        for result in &outcome.scores {
            info!(job_id = %result.job_id, score = result.score, "score");
        }
    }

    Ok(())
}

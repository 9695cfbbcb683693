use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use platewatch_common::Config;
use platewatch_engine::{AnalysisPipeline, GeminiAnalyzer, PlaceSearch, ScrapeClient};
use platewatch_store::ReviewStore;

/// Review analysis worker: scrapes reviews for a place, runs AI
/// analysis, and stores the report.
#[derive(Parser, Debug)]
#[command(name = "platewatch-worker")]
struct Args {
    /// Restaurant name + location, or a Google Maps URL.
    query: String,

    /// Cap on reviews carried into analysis.
    #[arg(long)]
    max_reviews: Option<usize>,

    /// User id to attribute the report to.
    #[arg(long)]
    user: Option<String>,

    /// Search for matching places instead of running an analysis.
    #[arg(long)]
    search_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("platewatch=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = Config::from_env();
    config.log_redacted();

    if args.search_only {
        let search = PlaceSearch::new(&config.gosom_url);
        let places = search.search_places(&args.query, 5).await;
        println!("{}", serde_json::to_string_pretty(&places)?);
        return Ok(());
    }

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let store = ReviewStore::new(pool);
    store.migrate().await?;

    let max_reviews = args.max_reviews.unwrap_or(config.max_reviews_to_scrape);
    let pipeline = AnalysisPipeline::new(
        Arc::new(ScrapeClient::from_config(&config)),
        Arc::new(GeminiAnalyzer::from_config(&config)),
        Arc::new(store),
        max_reviews,
    );

    let task_id = uuid::Uuid::new_v4().to_string();
    info!(task_id, query = %args.query, "Worker dispatching analysis job");

    match pipeline.run(&task_id, &args.query, args.user.as_deref()).await {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("Job failed ({}): {e}", e.reason());
            std::process::exit(1);
        }
    }
}

use std::env;

/// Application configuration loaded from environment variables.
///
/// The recency window and batch sizes are deliberately configuration,
/// not constants: deployments disagree on how far back "current"
/// reviews reach.
#[derive(Debug, Clone)]
pub struct Config {
    // Scraping backend
    pub gosom_url: String,

    // AI provider
    pub gemini_api_key: String,
    pub gemini_model: String,

    // Postgres
    pub database_url: String,

    // Pipeline knobs
    pub review_days_limit: i64,
    pub max_reviews_to_scrape: usize,
    pub analysis_batch_size: usize,
    pub scrape_max_wait_secs: u64,
    pub scrape_poll_interval_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            gosom_url: env::var("GOSOM_URL")
                .unwrap_or_else(|_| "http://gosom-scraper:8080".to_string()),
            gemini_api_key: required_env("GEMINI_API_KEY"),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-2.5-flash".to_string()),
            database_url: required_env("DATABASE_URL"),
            review_days_limit: numeric_env("REVIEW_DAYS_LIMIT", 30),
            max_reviews_to_scrape: numeric_env("MAX_REVIEWS_TO_SCRAPE", 100),
            analysis_batch_size: numeric_env("ANALYSIS_BATCH_SIZE", 50),
            scrape_max_wait_secs: numeric_env("SCRAPE_MAX_WAIT_SECS", 900),
            scrape_poll_interval_secs: numeric_env("SCRAPE_POLL_INTERVAL_SECS", 2),
        }
    }

    /// Log the config with secrets redacted.
    pub fn log_redacted(&self) {
        tracing::info!(
            gosom_url = %self.gosom_url,
            gemini_model = %self.gemini_model,
            review_days_limit = self.review_days_limit,
            max_reviews_to_scrape = self.max_reviews_to_scrape,
            analysis_batch_size = self.analysis_batch_size,
            scrape_max_wait_secs = self.scrape_max_wait_secs,
            "Config loaded"
        );
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn numeric_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(v) => v
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a number")),
        Err(_) => default,
    }
}

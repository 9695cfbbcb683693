use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Failures that terminate an analysis job.
///
/// AI-layer failures never appear here: the analyzer absorbs them into
/// a degraded fallback result. Restaurant-creation races are resolved
/// inside the store by re-reading the winning row and never surface.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Scrape timed out after {0}s")]
    ScrapeTimeout(u64),

    #[error("Scrape service error: {0}")]
    ScrapeService(String),

    #[error("No reviews found for: {0}")]
    NoReviewsFound(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl AnalysisError {
    /// Short machine-readable reason for job status reporting.
    pub fn reason(&self) -> &'static str {
        match self {
            AnalysisError::ScrapeTimeout(_) => "scrape_timeout",
            AnalysisError::ScrapeService(_) => "scrape_service",
            AnalysisError::NoReviewsFound(_) => "no_reviews_found",
            AnalysisError::Persistence(_) => "persistence",
        }
    }
}

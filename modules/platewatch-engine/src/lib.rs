pub mod analyzer;
pub mod dates;
pub mod dedup;
pub mod pipeline;
pub mod place_search;
pub mod scraper;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use analyzer::GeminiAnalyzer;
pub use pipeline::{AnalysisJobResult, AnalysisPipeline, JobStage};
pub use place_search::PlaceSearch;
pub use scraper::ScrapeClient;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single customer review as extracted from the scraping backend.
///
/// Ephemeral within one scrape batch; persisted only as part of a
/// [`RawBatch`] document, never row-per-review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReview {
    pub text: String,
    /// Star rating, 0–5. Zero means the source supplied none.
    pub rating: f64,
    pub author: String,
    /// Raw date string from the source: ISO timestamp, `YYYY-MM-DD`,
    /// or a relative phrase like "2 days ago".
    pub date_text: String,
    pub profile_picture_url: String,
    /// Source-provided review ID, or a deterministic hash of the
    /// content signature when the source gave none.
    pub review_id: String,
}

/// Basic place metadata extracted alongside the reviews.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantInfo {
    pub name: String,
    pub rating: f64,
    pub total_reviews: i64,
    pub address: String,
}

impl Default for RestaurantInfo {
    fn default() -> Self {
        Self {
            name: "Unknown".to_string(),
            rating: 0.0,
            total_reviews: 0,
            address: String::new(),
        }
    }
}

/// One complete scrape result, stored verbatim before any AI
/// processing. Append-only: multiple batches may exist for the same
/// query over time, most-recent-wins for read paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBatch {
    pub query: String,
    pub restaurant_info: RestaurantInfo,
    pub reviews: Vec<RawReview>,
    pub total_reviews_collected: usize,
    pub scraped_at: DateTime<Utc>,
}

/// Structured analysis produced once per scrape batch. Immutable once
/// produced. `sentiment_score` is always clamped into [-1, 1] and the
/// list fields are capped at 5 entries regardless of what the model
/// returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub sentiment_score: f64,
    pub summary: String,
    pub complaints: Vec<String>,
    pub praises: Vec<String>,
    pub recommended_actions: Vec<String>,
    pub reviews_analyzed: usize,
}

/// Analysis plus a degradation marker. `degraded` is true when the
/// model call failed or returned unparsable output and the
/// rating-based fallback was used instead. Callers branch on the flag,
/// never on error inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,
    pub degraded: bool,
    /// Raw model response text, kept for diagnostics and future
    /// re-analysis. `None` when the model was never reached.
    pub raw_response: Option<String>,
}

/// Lightweight place record from a search-only scrape (no reviews).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaceSummary {
    pub title: String,
    pub address: String,
    pub rating: f64,
    pub review_count: i64,
    pub category: String,
    pub link: String,
    pub place_id: String,
    pub phone: String,
    pub website: String,
    pub thumbnail: String,
}

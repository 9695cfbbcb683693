// Trait abstractions for pipeline dependencies.
//
// ReviewSource replaces ScrapeClient, ReviewAnalyzer replaces
// GeminiAnalyzer, ReportStore replaces ReviewStore. The pipeline only
// sees these, which makes it testable with in-memory mocks: no
// network, no database, no Docker.

use async_trait::async_trait;
use serde_json::Value;

use platewatch_common::{
    AnalysisOutcome, RawBatch, RawReview, Result, RestaurantInfo,
};
use platewatch_store::ReviewStore;

use crate::analyzer::GeminiAnalyzer;
use crate::scraper::ScrapeClient;

#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// Scrape, dedupe, recency-filter, and cap reviews for a query.
    async fn scrape_reviews(&self, query: &str, max_reviews: usize) -> Result<RawBatch>;
}

#[async_trait]
pub trait ReviewAnalyzer: Send + Sync {
    /// Analyze a review batch. Infallible by contract: model failures
    /// come back as a degraded outcome, never an error.
    async fn analyze(&self, reviews: &[RawReview], subject_name: &str) -> AnalysisOutcome;
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Record the raw scrape batch. Best-effort: returns the row id on
    /// success, `None` on failure (already logged).
    async fn store_raw_batch(&self, batch: &RawBatch) -> Option<i64>;

    /// Resolve a query to its restaurant row id, creating the row on
    /// first sight. Concurrent creation races resolve to one row.
    async fn get_or_create_restaurant(&self, query: &str, info: &RestaurantInfo) -> Result<i64>;

    /// Append an immutable analysis report.
    async fn append_report(
        &self,
        restaurant_id: i64,
        task_id: &str,
        user_id: Option<&str>,
        outcome: &AnalysisOutcome,
        raw_ai_response: Option<&Value>,
    ) -> Result<()>;
}

#[async_trait]
impl ReviewSource for ScrapeClient {
    async fn scrape_reviews(&self, query: &str, max_reviews: usize) -> Result<RawBatch> {
        ScrapeClient::scrape_reviews(self, query, max_reviews).await
    }
}

#[async_trait]
impl ReviewAnalyzer for GeminiAnalyzer {
    async fn analyze(&self, reviews: &[RawReview], subject_name: &str) -> AnalysisOutcome {
        GeminiAnalyzer::analyze(self, reviews, subject_name).await
    }
}

#[async_trait]
impl ReportStore for ReviewStore {
    async fn store_raw_batch(&self, batch: &RawBatch) -> Option<i64> {
        self.insert_raw_batch(batch).await
    }

    async fn get_or_create_restaurant(&self, query: &str, info: &RestaurantInfo) -> Result<i64> {
        let row = ReviewStore::get_or_create_restaurant(self, query, info)
            .await
            .map_err(|e| platewatch_common::AnalysisError::Persistence(e.to_string()))?;
        Ok(row.id)
    }

    async fn append_report(
        &self,
        restaurant_id: i64,
        task_id: &str,
        user_id: Option<&str>,
        outcome: &AnalysisOutcome,
        raw_ai_response: Option<&Value>,
    ) -> Result<()> {
        self.insert_report(
            restaurant_id,
            task_id,
            user_id,
            &outcome.result,
            outcome.degraded,
            raw_ai_response,
        )
        .await
        .map_err(|e| platewatch_common::AnalysisError::Persistence(e.to_string()))?;
        Ok(())
    }
}

//! The analysis pipeline: scrape → store raw → analyze → persist.
//!
//! Each job moves through the stages in order. The raw batch is stored
//! before analysis so a later analyzer version can re-run over it; a
//! failed raw-batch write degrades to a warning because the batch is
//! reproducible. AI failures never fail the job either, they surface
//! as `ai_degraded` on the result. Only scrape and persistence
//! failures are fatal.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use platewatch_common::{AnalysisError, Result};

use crate::traits::{ReportStore, ReviewAnalyzer, ReviewSource};

/// Where a job is in its lifecycle, for status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    Queued,
    Scraping,
    Scraped,
    Analyzing,
    Persisting,
    Complete,
    Failed,
}

/// The envelope a completed job hands back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisJobResult {
    pub task_id: String,
    pub restaurant_id: i64,
    pub restaurant_name: String,
    pub restaurant_rating: f64,
    pub sentiment_score: f64,
    pub summary: String,
    pub complaints: Vec<String>,
    pub praises: Vec<String>,
    pub recommended_actions: Vec<String>,
    pub reviews_analyzed: usize,
    pub ai_degraded: bool,
}

pub struct AnalysisPipeline {
    source: Arc<dyn ReviewSource>,
    analyzer: Arc<dyn ReviewAnalyzer>,
    store: Arc<dyn ReportStore>,
    max_reviews: usize,
}

impl AnalysisPipeline {
    pub fn new(
        source: Arc<dyn ReviewSource>,
        analyzer: Arc<dyn ReviewAnalyzer>,
        store: Arc<dyn ReportStore>,
        max_reviews: usize,
    ) -> Self {
        Self {
            source,
            analyzer,
            store,
            max_reviews,
        }
    }

    /// Run one analysis job end to end.
    pub async fn run(
        &self,
        task_id: &str,
        query: &str,
        user_id: Option<&str>,
    ) -> Result<AnalysisJobResult> {
        info!(task_id, query, stage = ?JobStage::Queued, "Job accepted");
        match self.execute(task_id, query, user_id).await {
            Ok(result) => Ok(result),
            Err(e) => {
                error!(task_id, reason = e.reason(), stage = ?JobStage::Failed, "Job failed");
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        task_id: &str,
        query: &str,
        user_id: Option<&str>,
    ) -> Result<AnalysisJobResult> {
        info!(task_id, query, stage = ?JobStage::Scraping, "Job started");

        let batch = self.source.scrape_reviews(query, self.max_reviews).await?;
        if batch.reviews.is_empty() {
            warn!(task_id, query, "No reviews survived scrape and filtering");
            return Err(AnalysisError::NoReviewsFound(query.to_string()));
        }
        info!(
            task_id,
            restaurant = %batch.restaurant_info.name,
            reviews = batch.reviews.len(),
            stage = ?JobStage::Scraped,
            "Scrape complete"
        );

        // Raw batch first: replayable input for future analyzer runs.
        if self.store.store_raw_batch(&batch).await.is_none() {
            warn!(task_id, query, "Raw batch not recorded, continuing");
        }

        info!(task_id, stage = ?JobStage::Analyzing, "Analyzing reviews");
        let outcome = self
            .analyzer
            .analyze(&batch.reviews, &batch.restaurant_info.name)
            .await;
        if outcome.degraded {
            warn!(task_id, "Analysis degraded to rating-based fallback");
        }

        info!(task_id, stage = ?JobStage::Persisting, "Persisting report");
        let restaurant_id = self
            .store
            .get_or_create_restaurant(query, &batch.restaurant_info)
            .await?;
        // Model output is requested as JSON but stored as-is even when
        // it came back as prose.
        let raw_ai_response = outcome.raw_response.as_deref().map(|text| {
            serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
        });
        self.store
            .append_report(
                restaurant_id,
                task_id,
                user_id,
                &outcome,
                raw_ai_response.as_ref(),
            )
            .await?;

        info!(
            task_id,
            restaurant_id,
            sentiment = outcome.result.sentiment_score,
            stage = ?JobStage::Complete,
            "Job complete"
        );

        Ok(AnalysisJobResult {
            task_id: task_id.to_string(),
            restaurant_id,
            restaurant_name: batch.restaurant_info.name,
            restaurant_rating: batch.restaurant_info.rating,
            sentiment_score: outcome.result.sentiment_score,
            summary: outcome.result.summary,
            complaints: outcome.result.complaints,
            praises: outcome.result.praises,
            recommended_actions: outcome.result.recommended_actions,
            reviews_analyzed: outcome.result.reviews_analyzed,
            ai_degraded: outcome.degraded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryStore, MockAnalyzer, MockSource};
    use platewatch_common::{AnalysisOutcome, AnalysisResult, RawBatch, RawReview, RestaurantInfo};
    use chrono::Utc;

    fn batch(reviews: usize) -> RawBatch {
        RawBatch {
            query: "luigi's pizza brooklyn".to_string(),
            restaurant_info: RestaurantInfo {
                name: "Luigi's".to_string(),
                rating: 4.2,
                total_reviews: 310,
                address: "123 Main St".to_string(),
            },
            reviews: (0..reviews)
                .map(|i| RawReview {
                    text: format!("Review number {i}"),
                    rating: 4.0,
                    author: format!("Author {i}"),
                    date_text: "2 days ago".to_string(),
                    profile_picture_url: String::new(),
                    review_id: format!("r{i}"),
                })
                .collect(),
            total_reviews_collected: reviews,
            scraped_at: Utc::now(),
        }
    }

    fn outcome(score: f64, degraded: bool) -> AnalysisOutcome {
        AnalysisOutcome {
            result: AnalysisResult {
                sentiment_score: score,
                summary: "Mostly positive.".to_string(),
                complaints: vec!["slow weekend service".to_string()],
                praises: vec!["great crust".to_string()],
                recommended_actions: vec!["hire weekend staff".to_string()],
                reviews_analyzed: 3,
            },
            degraded,
            raw_response: if degraded {
                None
            } else {
                Some(r#"{"sentiment_score": 0.6}"#.to_string())
            },
        }
    }

    fn pipeline(
        source: MockSource,
        analyzer: MockAnalyzer,
        store: Arc<MemoryStore>,
    ) -> AnalysisPipeline {
        AnalysisPipeline::new(Arc::new(source), Arc::new(analyzer), store, 100)
    }

    #[tokio::test]
    async fn happy_path_persists_raw_batch_and_report() {
        let store = Arc::new(MemoryStore::default());
        let p = pipeline(
            MockSource::returning(batch(3)),
            MockAnalyzer::returning(outcome(0.6, false)),
            store.clone(),
        );

        let result = p.run("task-1", "luigi's pizza brooklyn", Some("u1")).await.unwrap();
        assert_eq!(result.restaurant_name, "Luigi's");
        assert_eq!(result.sentiment_score, 0.6);
        assert!(!result.ai_degraded);
        assert_eq!(store.raw_batches().len(), 1);
        assert_eq!(store.reports().len(), 1);
        assert_eq!(store.restaurants().len(), 1);
        assert_eq!(store.reports()[0].user_id.as_deref(), Some("u1"));
        assert_eq!(
            store.reports()[0].raw_ai_response,
            Some(serde_json::json!({"sentiment_score": 0.6}))
        );
    }

    #[tokio::test]
    async fn non_json_raw_response_is_stored_as_string() {
        let store = Arc::new(MemoryStore::default());
        let mut degraded_outcome = outcome(0.4, true);
        degraded_outcome.raw_response = Some("I cannot answer that.".to_string());
        let p = pipeline(
            MockSource::returning(batch(2)),
            MockAnalyzer::returning(degraded_outcome),
            store.clone(),
        );

        p.run("task-6", "luigi's pizza brooklyn", None).await.unwrap();
        assert_eq!(
            store.reports()[0].raw_ai_response,
            Some(Value::String("I cannot answer that.".to_string()))
        );
    }

    #[tokio::test]
    async fn zero_reviews_is_no_reviews_found() {
        let store = Arc::new(MemoryStore::default());
        let p = pipeline(
            MockSource::returning(batch(0)),
            MockAnalyzer::returning(outcome(0.0, false)),
            store.clone(),
        );

        let err = p.run("task-2", "ghost diner", None).await.unwrap_err();
        assert!(matches!(err, AnalysisError::NoReviewsFound(_)));
        assert_eq!(err.reason(), "no_reviews_found");
        assert!(store.reports().is_empty());
        assert!(store.restaurants().is_empty());
    }

    #[tokio::test]
    async fn scrape_timeout_propagates() {
        let store = Arc::new(MemoryStore::default());
        let p = pipeline(
            MockSource::failing(AnalysisError::ScrapeTimeout(900)),
            MockAnalyzer::returning(outcome(0.0, false)),
            store.clone(),
        );

        let err = p.run("task-3", "slow place", None).await.unwrap_err();
        assert!(matches!(err, AnalysisError::ScrapeTimeout(900)));
        assert!(store.raw_batches().is_empty());
    }

    #[tokio::test]
    async fn degraded_analysis_still_completes() {
        let store = Arc::new(MemoryStore::default());
        let p = pipeline(
            MockSource::returning(batch(5)),
            MockAnalyzer::returning(outcome(0.4, true)),
            store.clone(),
        );

        let result = p.run("task-4", "luigi's pizza brooklyn", None).await.unwrap();
        assert!(result.ai_degraded);
        assert_eq!(store.reports().len(), 1);
        assert!(store.reports()[0].degraded);
    }

    #[tokio::test]
    async fn raw_batch_write_failure_is_not_fatal() {
        let store = Arc::new(MemoryStore::default().failing_raw_batches());
        let p = pipeline(
            MockSource::returning(batch(2)),
            MockAnalyzer::returning(outcome(0.3, false)),
            store.clone(),
        );

        let result = p.run("task-5", "luigi's pizza brooklyn", None).await;
        assert!(result.is_ok());
        assert!(store.raw_batches().is_empty());
        assert_eq!(store.reports().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_jobs_share_one_restaurant() {
        let store = Arc::new(MemoryStore::default().with_racy_creation());
        let a = Arc::new(pipeline(
            MockSource::returning(batch(2)),
            MockAnalyzer::returning(outcome(0.5, false)),
            store.clone(),
        ));
        let b = Arc::new(pipeline(
            MockSource::returning(batch(2)),
            MockAnalyzer::returning(outcome(0.5, false)),
            store.clone(),
        ));

        let (ra, rb) = tokio::join!(
            {
                let a = a.clone();
                async move { a.run("task-a", "luigi's pizza brooklyn", None).await }
            },
            {
                let b = b.clone();
                async move { b.run("task-b", "luigi's pizza brooklyn", None).await }
            }
        );
        let ra = ra.unwrap();
        let rb = rb.unwrap();

        assert_eq!(ra.restaurant_id, rb.restaurant_id);
        assert_eq!(store.restaurants().len(), 1);
        assert_eq!(store.reports().len(), 2);
    }
}

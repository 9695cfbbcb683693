//! In-memory test doubles for the pipeline traits.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use platewatch_common::{
    AnalysisError, AnalysisOutcome, RawBatch, RawReview, Result, RestaurantInfo,
};

use crate::traits::{ReportStore, ReviewAnalyzer, ReviewSource};

pub struct MockSource {
    response: std::result::Result<RawBatch, AnalysisError>,
}

impl MockSource {
    pub fn returning(batch: RawBatch) -> Self {
        Self {
            response: Ok(batch),
        }
    }

    pub fn failing(err: AnalysisError) -> Self {
        Self { response: Err(err) }
    }
}

#[async_trait]
impl ReviewSource for MockSource {
    async fn scrape_reviews(&self, _query: &str, max_reviews: usize) -> Result<RawBatch> {
        match &self.response {
            Ok(batch) => {
                let mut batch = batch.clone();
                batch.reviews.truncate(max_reviews);
                Ok(batch)
            }
            Err(AnalysisError::ScrapeTimeout(secs)) => Err(AnalysisError::ScrapeTimeout(*secs)),
            Err(AnalysisError::ScrapeService(msg)) => {
                Err(AnalysisError::ScrapeService(msg.clone()))
            }
            Err(AnalysisError::NoReviewsFound(q)) => Err(AnalysisError::NoReviewsFound(q.clone())),
            Err(AnalysisError::Persistence(msg)) => Err(AnalysisError::Persistence(msg.clone())),
        }
    }
}

pub struct MockAnalyzer {
    outcome: AnalysisOutcome,
}

impl MockAnalyzer {
    pub fn returning(outcome: AnalysisOutcome) -> Self {
        Self { outcome }
    }
}

#[async_trait]
impl ReviewAnalyzer for MockAnalyzer {
    async fn analyze(&self, _reviews: &[RawReview], _subject_name: &str) -> AnalysisOutcome {
        self.outcome.clone()
    }
}

#[derive(Debug, Clone)]
pub struct StoredRestaurant {
    pub id: i64,
    pub query: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct StoredReport {
    pub restaurant_id: i64,
    pub task_id: String,
    pub user_id: Option<String>,
    pub sentiment_score: f64,
    pub degraded: bool,
    pub raw_ai_response: Option<Value>,
}

#[derive(Default)]
struct MemoryState {
    restaurants: Vec<StoredRestaurant>,
    reports: Vec<StoredReport>,
    raw_batches: Vec<RawBatch>,
}

/// In-memory [`ReportStore`]. `with_racy_creation` widens the window
/// between the existence check and the insert with a scheduler yield,
/// which lets two concurrent jobs both see "not found" the way two
/// database transactions would before the unique constraint settles
/// the race.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    fail_raw_batches: AtomicBool,
    racy_creation: AtomicBool,
}

impl MemoryStore {
    pub fn failing_raw_batches(self) -> Self {
        self.fail_raw_batches.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_racy_creation(self) -> Self {
        self.racy_creation.store(true, Ordering::SeqCst);
        self
    }

    pub fn restaurants(&self) -> Vec<StoredRestaurant> {
        self.state.lock().unwrap().restaurants.clone()
    }

    pub fn reports(&self) -> Vec<StoredReport> {
        self.state.lock().unwrap().reports.clone()
    }

    pub fn raw_batches(&self) -> Vec<RawBatch> {
        self.state.lock().unwrap().raw_batches.clone()
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn store_raw_batch(&self, batch: &RawBatch) -> Option<i64> {
        if self.fail_raw_batches.load(Ordering::SeqCst) {
            return None;
        }
        let mut state = self.state.lock().unwrap();
        state.raw_batches.push(batch.clone());
        Some(state.raw_batches.len() as i64)
    }

    async fn get_or_create_restaurant(&self, query: &str, info: &RestaurantInfo) -> Result<i64> {
        let existing = {
            let state = self.state.lock().unwrap();
            state
                .restaurants
                .iter()
                .find(|r| r.query == query)
                .map(|r| r.id)
        };
        if let Some(id) = existing {
            return Ok(id);
        }

        if self.racy_creation.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }

        let mut state = self.state.lock().unwrap();
        // Same uniqueness rule the real table enforces: the loser of
        // the race gets the winner's row.
        if let Some(existing) = state.restaurants.iter().find(|r| r.query == query) {
            return Ok(existing.id);
        }
        let id = state.restaurants.len() as i64 + 1;
        state.restaurants.push(StoredRestaurant {
            id,
            query: query.to_string(),
            name: info.name.clone(),
        });
        Ok(id)
    }

    async fn append_report(
        &self,
        restaurant_id: i64,
        task_id: &str,
        user_id: Option<&str>,
        outcome: &AnalysisOutcome,
        raw_ai_response: Option<&Value>,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.reports.push(StoredReport {
            restaurant_id,
            task_id: task_id.to_string(),
            user_id: user_id.map(str::to_string),
            sentiment_score: outcome.result.sentiment_score,
            degraded: outcome.degraded,
            raw_ai_response: raw_ai_response.cloned(),
        });
        Ok(())
    }
}

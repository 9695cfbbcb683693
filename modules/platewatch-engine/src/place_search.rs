//! Place search without review collection.
//!
//! Used by the selection flow before a full analysis: a short, shallow
//! scrape job returning basic place info only. Failures degrade to an
//! empty result list; search is advisory, never fatal.

use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tracing::warn;

use gosom_client::{fields, GosomClient, JobRequest};
use platewatch_common::PlaceSummary;

/// Server-side budget for a search-only job.
const SEARCH_JOB_MAX_TIME_SECS: u64 = 60;
/// Local wait bound. Searches are interactive; give up early.
const SEARCH_MAX_WAIT: Duration = Duration::from_secs(90);
const SEARCH_POLL_INTERVAL: Duration = Duration::from_secs(1);

pub struct PlaceSearch {
    gosom: GosomClient,
}

impl PlaceSearch {
    pub fn new(base_url: &str) -> Self {
        Self {
            gosom: GosomClient::new(base_url),
        }
    }

    /// Search for places matching a query. Returns up to `limit`
    /// lightweight summaries, or an empty list on any backend failure.
    pub async fn search_places(&self, query: &str, limit: u32) -> Vec<PlaceSummary> {
        let job = JobRequest {
            name: format!("search_{}", Utc::now().timestamp()),
            keywords: vec![query.to_string()],
            lang: "en".to_string(),
            depth: limit,
            max_time: SEARCH_JOB_MAX_TIME_SECS,
            fast_mode: false,
            json: true,
            email: false,
            // No reviews for search; much faster.
            extra_reviews: false,
        };

        let records = match self
            .gosom
            .run_job(&job, SEARCH_MAX_WAIT, SEARCH_POLL_INTERVAL)
            .await
        {
            Ok(records) => records,
            Err(e) => {
                warn!(query, error = %e, "Place search failed");
                return vec![];
            }
        };

        records.iter().filter_map(extract_place).collect()
    }
}

fn extract_place(record: &Value) -> Option<PlaceSummary> {
    let title = fields::field_str(record, &["title", "name"])?;
    Some(PlaceSummary {
        title,
        address: fields::field_str(record, &["address", "complete_address"]).unwrap_or_default(),
        rating: fields::field_f64(record, &["review_rating", "totalScore", "rating"])
            .unwrap_or(0.0),
        review_count: fields::field_i64(record, &["review_count", "reviewsCount"]).unwrap_or(0),
        category: fields::field_str(record, &["category"]).unwrap_or_default(),
        link: fields::field_str(record, &["link"]).unwrap_or_default(),
        place_id: fields::field_str(record, &["place_id"]).unwrap_or_default(),
        phone: fields::field_str(record, &["phone"]).unwrap_or_default(),
        website: fields::field_str(record, &["website"]).unwrap_or_default(),
        thumbnail: fields::field_str(record, &["thumbnail"]).unwrap_or_default(),
    })
}

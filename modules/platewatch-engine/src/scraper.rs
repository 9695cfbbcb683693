//! Review scrape orchestration.
//!
//! Submits a full review scrape to the gosom backend, normalizes the
//! heterogeneous place/review records into [`RawBatch`], and applies
//! dedup + recency filtering. Field names vary across backend
//! versions; every logical field is resolved through an ordered
//! candidate-key list.

use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};

use gosom_client::{fields, GosomClient, GosomError, JobRequest};
use platewatch_common::{
    AnalysisError, Config, RawBatch, RawReview, RestaurantInfo, Result,
};

use crate::dates;
use crate::dedup;

/// Server-side time budget for a full review scrape.
const SCRAPE_JOB_MAX_TIME_SECS: u64 = 600;

pub struct ScrapeClient {
    gosom: GosomClient,
    recency_days: i64,
    max_wait: Duration,
    poll_interval: Duration,
}

impl ScrapeClient {
    pub fn new(
        base_url: &str,
        recency_days: i64,
        max_wait: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            gosom: GosomClient::new(base_url),
            recency_days,
            max_wait,
            poll_interval,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.gosom_url,
            config.review_days_limit,
            Duration::from_secs(config.scrape_max_wait_secs),
            Duration::from_secs(config.scrape_poll_interval_secs),
        )
    }

    /// Scrape reviews for a query or map URL. The returned batch is
    /// deduplicated, filtered to the recency window (fail open on
    /// unresolvable dates), sorted newest-first, and truncated to
    /// `max_reviews`.
    pub async fn scrape_reviews(&self, query: &str, max_reviews: usize) -> Result<RawBatch> {
        let job = JobRequest {
            name: format!("scrape_{}", Utc::now().timestamp()),
            keywords: vec![query.to_string()],
            lang: "en".to_string(),
            // Single best-matching place only.
            depth: 1,
            max_time: SCRAPE_JOB_MAX_TIME_SECS,
            // Fast mode requires lat/lon, which a keyword query lacks.
            fast_mode: false,
            json: true,
            email: false,
            extra_reviews: true,
        };

        let records = self
            .gosom
            .run_job(&job, self.max_wait, self.poll_interval)
            .await
            .map_err(map_gosom_error)?;

        let place = match records.first() {
            Some(place) => place,
            None => {
                warn!(query, "Scrape returned no place records");
                return Ok(RawBatch {
                    query: query.to_string(),
                    restaurant_info: RestaurantInfo::default(),
                    reviews: vec![],
                    total_reviews_collected: 0,
                    scraped_at: Utc::now(),
                });
            }
        };

        let restaurant_info = extract_restaurant_info(place);
        let raw_reviews = extract_reviews(place);
        let extracted = raw_reviews.len();

        let deduped = dedup::dedupe(raw_reviews);
        let now = Utc::now();
        let cutoff = now - chrono::Duration::days(self.recency_days);

        let mut recent: Vec<RawReview> = deduped
            .into_iter()
            .filter(|r| {
                let resolved = dates::resolve(&r.date_text, now);
                // Unresolvable dates are included, not silently dropped.
                dates::is_unresolved(resolved) || resolved >= cutoff
            })
            .collect();
        dates::sort_newest_first(&mut recent, now);
        recent.truncate(max_reviews);

        info!(
            query,
            restaurant = %restaurant_info.name,
            extracted,
            kept = recent.len(),
            "Scrape complete"
        );

        let total_reviews_collected = recent.len();
        Ok(RawBatch {
            query: query.to_string(),
            restaurant_info,
            reviews: recent,
            total_reviews_collected,
            scraped_at: now,
        })
    }
}

fn map_gosom_error(err: GosomError) -> AnalysisError {
    match err {
        GosomError::Timeout(secs) => AnalysisError::ScrapeTimeout(secs),
        other => AnalysisError::ScrapeService(other.to_string()),
    }
}

pub(crate) fn extract_restaurant_info(place: &Value) -> RestaurantInfo {
    RestaurantInfo {
        name: fields::field_str(place, &["title", "name"])
            .unwrap_or_else(|| "Unknown".to_string()),
        rating: fields::field_f64(place, &["totalScore", "rating", "review_rating"])
            .unwrap_or(0.0),
        total_reviews: fields::field_i64(
            place,
            &["reviewsCount", "reviews_count", "review_count"],
        )
        .unwrap_or(0),
        address: fields::field_str(place, &["address", "complete_address"])
            .unwrap_or_default(),
    }
}

pub(crate) fn extract_reviews(place: &Value) -> Vec<RawReview> {
    let raw = match fields::field(place, &["reviews", "user_reviews"]) {
        // CSV rows can carry the review list as a JSON-encoded string.
        Some(Value::String(s)) => serde_json::from_str::<Value>(s)
            .ok()
            .and_then(|v| v.as_array().cloned())
            .unwrap_or_default(),
        Some(Value::Array(items)) => items.clone(),
        _ => vec![],
    };

    raw.iter().map(extract_review).collect()
}

fn extract_review(record: &Value) -> RawReview {
    RawReview {
        text: fields::field_str(record, &["text", "caption", "description"])
            .unwrap_or_default(),
        rating: fields::field_f64(record, &["stars", "rating"]).unwrap_or(0.0),
        author: fields::field_str(record, &["reviewerName", "name"])
            .unwrap_or_else(|| "Anonymous".to_string()),
        date_text: fields::field_str(
            record,
            &["publishedAtDate", "relativePublishTimeDescription", "date", "when"],
        )
        .unwrap_or_default(),
        profile_picture_url: fields::field_str(
            record,
            &["reviewerPhotoUrl", "profilePicture", "profile_picture"],
        )
        .unwrap_or_default(),
        // Source id when present; dedup derives one otherwise.
        review_id: fields::field_str(record, &["reviewId", "googleMapsReviewId", "id_review"])
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn restaurant_info_resolves_candidate_keys() {
        let place = json!({
            "title": "Gordon Ramsay Burger",
            "totalScore": 4.3,
            "reviewsCount": 8120,
            "address": "3667 Las Vegas Blvd S"
        });
        let info = extract_restaurant_info(&place);
        assert_eq!(info.name, "Gordon Ramsay Burger");
        assert_eq!(info.rating, 4.3);
        assert_eq!(info.total_reviews, 8120);
        assert_eq!(info.address, "3667 Las Vegas Blvd S");
    }

    #[test]
    fn restaurant_info_tolerates_alternate_convention() {
        let place = json!({
            "Name": "Mario's",
            "review_rating": "4.5",
            "review_count": "120",
            "complete_address": "456 Oak Ave"
        });
        let info = extract_restaurant_info(&place);
        assert_eq!(info.name, "Mario's");
        assert_eq!(info.rating, 4.5);
        assert_eq!(info.total_reviews, 120);
        assert_eq!(info.address, "456 Oak Ave");
    }

    #[test]
    fn missing_fields_get_defaults() {
        let info = extract_restaurant_info(&json!({}));
        assert_eq!(info.name, "Unknown");
        assert_eq!(info.rating, 0.0);
        assert_eq!(info.total_reviews, 0);
        assert_eq!(info.address, "");
    }

    #[test]
    fn reviews_extract_from_array() {
        let place = json!({
            "reviews": [
                {
                    "text": "Great burger",
                    "stars": 5,
                    "reviewerName": "Alice",
                    "publishedAtDate": "2024-06-10T08:00:00Z",
                    "reviewId": "abc123"
                },
                {
                    "caption": "Too salty",
                    "rating": "2",
                    "name": "Bob",
                    "when": "3 days ago"
                }
            ]
        });
        let reviews = extract_reviews(&place);
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[0].text, "Great burger");
        assert_eq!(reviews[0].rating, 5.0);
        assert_eq!(reviews[0].review_id, "abc123");
        assert_eq!(reviews[1].text, "Too salty");
        assert_eq!(reviews[1].rating, 2.0);
        assert_eq!(reviews[1].author, "Bob");
        assert_eq!(reviews[1].date_text, "3 days ago");
    }

    #[test]
    fn reviews_extract_from_json_encoded_string() {
        let place = json!({
            "reviews": "[{\"text\": \"ok\", \"stars\": 3, \"name\": \"Cara\"}]"
        });
        let reviews = extract_reviews(&place);
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].author, "Cara");
    }

    #[test]
    fn anonymous_author_when_missing() {
        let place = json!({"reviews": [{"text": "hi"}]});
        let reviews = extract_reviews(&place);
        assert_eq!(reviews[0].author, "Anonymous");
        assert_eq!(reviews[0].rating, 0.0);
    }
}

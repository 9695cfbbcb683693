// Postgres persistence for restaurants, analysis reports, and raw
// scrape batches.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use tracing::{info, warn};

use platewatch_common::{AnalysisResult, RawBatch, RestaurantInfo};

use crate::error::{Result, StoreError};

#[derive(Clone)]
pub struct ReviewStore {
    pool: PgPool,
}

/// A row from the restaurants table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RestaurantRow {
    pub id: i64,
    pub name: String,
    pub canonical_url: String,
    pub address: Option<String>,
    pub rating: Option<f64>,
    pub total_reviews: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A row from the analysis_reports table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnalysisReportRow {
    pub id: i64,
    pub restaurant_id: i64,
    pub task_id: String,
    pub user_id: Option<String>,
    pub sentiment_score: f64,
    pub summary: String,
    pub complaints: Value,
    pub praises: Value,
    pub recommended_actions: Value,
    pub reviews_analyzed: i32,
    pub degraded: bool,
    pub raw_ai_response: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// A row from the raw_batches table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RawBatchRow {
    pub id: i64,
    pub query: String,
    pub restaurant_info: Value,
    pub reviews: Value,
    pub total_reviews_collected: i32,
    pub scraped_at: DateTime<Utc>,
    pub stored_at: DateTime<Utc>,
}

impl ReviewStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the embedded SQL migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.into()))?;
        Ok(())
    }

    /// Record a raw scrape batch. Logs a warning on failure rather
    /// than propagating: the batch is reproducible by re-running the
    /// scrape and is not authoritative for the analysis.
    pub async fn insert_raw_batch(&self, batch: &RawBatch) -> Option<i64> {
        let restaurant_info = serde_json::to_value(&batch.restaurant_info).ok()?;
        let reviews = serde_json::to_value(&batch.reviews).ok()?;

        let result = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO raw_batches
                (query, restaurant_info, reviews, total_reviews_collected, scraped_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&batch.query)
        .bind(&restaurant_info)
        .bind(&reviews)
        .bind(batch.total_reviews_collected as i32)
        .bind(batch.scraped_at)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(query = %batch.query, error = %e, "Failed to record raw batch");
                None
            }
        }
    }

    /// Most recent raw batch for a query.
    pub async fn latest_raw_batch(&self, query: &str) -> Result<Option<RawBatchRow>> {
        let row = sqlx::query_as::<_, RawBatchRow>(
            r#"
            SELECT * FROM raw_batches
            WHERE query = $1
            ORDER BY scraped_at DESC
            LIMIT 1
            "#,
        )
        .bind(query)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// All batches for a query over time, newest first.
    pub async fn raw_batch_history(&self, query: &str) -> Result<Vec<RawBatchRow>> {
        let rows = sqlx::query_as::<_, RawBatchRow>(
            r#"
            SELECT * FROM raw_batches
            WHERE query = $1
            ORDER BY scraped_at DESC
            "#,
        )
        .bind(query)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn restaurant_by_url(&self, canonical_url: &str) -> Result<Option<RestaurantRow>> {
        let row = sqlx::query_as::<_, RestaurantRow>(
            "SELECT * FROM restaurants WHERE canonical_url = $1",
        )
        .bind(canonical_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn restaurant_by_id(&self, id: i64) -> Result<Option<RestaurantRow>> {
        let row = sqlx::query_as::<_, RestaurantRow>("SELECT * FROM restaurants WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    /// Get the restaurant for this canonical URL, creating it on first
    /// sight. Two concurrent jobs for the same new URL race on the
    /// unique constraint; the loser re-reads the winning row instead
    /// of failing the job.
    pub async fn get_or_create_restaurant(
        &self,
        canonical_url: &str,
        info: &RestaurantInfo,
    ) -> Result<RestaurantRow> {
        if let Some(existing) = self.restaurant_by_url(canonical_url).await? {
            return Ok(existing);
        }

        let inserted = sqlx::query_as::<_, RestaurantRow>(
            r#"
            INSERT INTO restaurants (name, canonical_url, address, rating, total_reviews)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&info.name)
        .bind(canonical_url)
        .bind(&info.address)
        .bind(info.rating)
        .bind(info.total_reviews)
        .fetch_one(&self.pool)
        .await;

        match inserted {
            Ok(row) => {
                info!(restaurant_id = row.id, canonical_url, "Created restaurant");
                Ok(row)
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                info!(canonical_url, "Lost restaurant creation race, re-reading");
                self.restaurant_by_url(canonical_url)
                    .await?
                    .ok_or(StoreError::Database(sqlx::Error::RowNotFound))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Append an immutable analysis report row.
    pub async fn insert_report(
        &self,
        restaurant_id: i64,
        task_id: &str,
        user_id: Option<&str>,
        result: &AnalysisResult,
        degraded: bool,
        raw_ai_response: Option<&Value>,
    ) -> Result<AnalysisReportRow> {
        let row = sqlx::query_as::<_, AnalysisReportRow>(
            r#"
            INSERT INTO analysis_reports
                (restaurant_id, task_id, user_id, sentiment_score, summary,
                 complaints, praises, recommended_actions,
                 reviews_analyzed, degraded, raw_ai_response)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(restaurant_id)
        .bind(task_id)
        .bind(user_id)
        .bind(result.sentiment_score)
        .bind(&result.summary)
        .bind(serde_json::to_value(&result.complaints).unwrap_or(Value::Array(vec![])))
        .bind(serde_json::to_value(&result.praises).unwrap_or(Value::Array(vec![])))
        .bind(serde_json::to_value(&result.recommended_actions).unwrap_or(Value::Array(vec![])))
        .bind(result.reviews_analyzed as i32)
        .bind(degraded)
        .bind(raw_ai_response)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Reports for a restaurant, newest first.
    pub async fn reports_for_restaurant(
        &self,
        restaurant_id: i64,
        limit: i64,
    ) -> Result<Vec<AnalysisReportRow>> {
        let rows = sqlx::query_as::<_, AnalysisReportRow>(
            r#"
            SELECT * FROM analysis_reports
            WHERE restaurant_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(restaurant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Reports submitted by a user, newest first.
    pub async fn reports_for_user(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<AnalysisReportRow>> {
        let rows = sqlx::query_as::<_, AnalysisReportRow>(
            r#"
            SELECT * FROM analysis_reports
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Report by task id, for job-status lookups.
    pub async fn report_by_task(&self, task_id: &str) -> Result<Option<AnalysisReportRow>> {
        let row = sqlx::query_as::<_, AnalysisReportRow>(
            "SELECT * FROM analysis_reports WHERE task_id = $1",
        )
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}

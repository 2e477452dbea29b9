use crate::domain::{
    models::review::{Review, Sentiment, UpsertOutcome},
    ports::ReviewRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

pub struct SqliteReviewRepo {
    pool: SqlitePool,
}

impl SqliteReviewRepo {
    pub fn new(pool: SqlitePool) -> Self { Self { pool } }
}

#[async_trait]
impl ReviewRepository for SqliteReviewRepo {
    async fn upsert(&self, review: &Review) -> Result<UpsertOutcome, AppError> {
        let inserted = sqlx::query_as::<_, Review>(
            "INSERT INTO reviews (id, business_id, external_review_id, author_name, author_photo_url, star_rating, review_text, review_created_at, review_updated_at, sentiment, is_responded, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(external_review_id) DO NOTHING
             RETURNING *"
        )
            .bind(&review.id)
            .bind(&review.business_id)
            .bind(&review.external_review_id)
            .bind(&review.author_name)
            .bind(&review.author_photo_url)
            .bind(review.star_rating)
            .bind(&review.review_text)
            .bind(review.review_created_at)
            .bind(review.review_updated_at)
            .bind(review.sentiment.as_str())
            .bind(review.is_responded)
            .bind(review.created_at)
            .bind(review.updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if let Some(row) = inserted {
            return Ok(UpsertOutcome { review: row, inserted: true });
        }

        // Existing row: refresh upstream fields, keep is_responded, re-derive sentiment only on a rating change.
        let updated = sqlx::query_as::<_, Review>(
            "UPDATE reviews SET
                author_name = ?,
                author_photo_url = ?,
                review_text = ?,
                sentiment = CASE WHEN star_rating <> ? THEN ? ELSE sentiment END,
                star_rating = ?,
                review_created_at = COALESCE(?, review_created_at),
                review_updated_at = ?,
                updated_at = ?
             WHERE external_review_id = ?
             RETURNING *"
        )
            .bind(&review.author_name)
            .bind(&review.author_photo_url)
            .bind(&review.review_text)
            .bind(review.star_rating)
            .bind(review.sentiment.as_str())
            .bind(review.star_rating)
            .bind(review.review_created_at)
            .bind(review.review_updated_at)
            .bind(Utc::now())
            .bind(&review.external_review_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(UpsertOutcome { review: updated, inserted: false })
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Review>, AppError> {
        sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_business(&self, business_id: &str, limit: i64) -> Result<Vec<Review>, AppError> {
        sqlx::query_as::<_, Review>(
            "SELECT * FROM reviews WHERE business_id = ? ORDER BY COALESCE(review_created_at, created_at) DESC LIMIT ?"
        )
            .bind(business_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_by_business_since(&self, business_id: &str, since: DateTime<Utc>) -> Result<Vec<Review>, AppError> {
        sqlx::query_as::<_, Review>(
            "SELECT * FROM reviews WHERE business_id = ? AND created_at >= ? ORDER BY created_at ASC"
        )
            .bind(business_id)
            .bind(since)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn update_sentiment(&self, id: &str, sentiment: Sentiment) -> Result<(), AppError> {
        sqlx::query("UPDATE reviews SET sentiment = ?, updated_at = ? WHERE id = ?")
            .bind(sentiment.as_str())
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(())
    }
}

//! Customer reviews: one per (user, order), editable by the author for a
//! bounded window, moderated by operators.

use async_trait::async_trait;
use deadpool_postgres::Pool;
use model::{NewReview, Review, ReviewStats};
use rust_decimal::Decimal;
use tokio_postgres::Row;
use tokio_postgres::types::Json;

use crate::RepositoryError;

/// Repository interface for customer reviews.
#[async_trait]
pub trait ReviewsRepository: Send + Sync {
    /// Inserts a review for an order the user owns. Answers `NotFound` when
    /// the order does not exist or belongs to someone else, so a caller can
    /// never review another customer's order.
    async fn create(
        &self,
        user_id: i64,
        order_id: i64,
        new: &NewReview,
    ) -> Result<Review, RepositoryError>;

    /// Reviews attached to one order, most recent first.
    async fn find_by_order(&self, order_id: i64) -> Result<Vec<Review>, RepositoryError>;

    /// The user's review of one order, if they have written one.
    async fn find_user_review(
        &self,
        user_id: i64,
        order_id: i64,
    ) -> Result<Option<Review>, RepositoryError>;

    /// Single review by id, restricted to its author.
    async fn find_for_author(
        &self,
        review_id: i64,
        user_id: i64,
    ) -> Result<Review, RepositoryError>;

    /// Rewrites the author-owned fields of a review.
    async fn update(
        &self,
        review_id: i64,
        user_id: i64,
        new: &NewReview,
    ) -> Result<Review, RepositoryError>;

    /// Attaches (or replaces) the operator response on a review.
    async fn add_admin_response(
        &self,
        review_id: i64,
        admin_id: i64,
        text: &str,
    ) -> Result<Review, RepositoryError>;

    /// Removes a review outright.
    async fn delete(&self, review_id: i64) -> Result<(), RepositoryError>;

    /// One page of the moderation listing, optionally filtered to a star
    /// value, with the unfiltered-or-filtered total for pagination.
    async fn list_page(
        &self,
        rating: Option<i32>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Review>, i64), RepositoryError>;

    /// Aggregate rating figures across all reviews.
    async fn stats(&self) -> Result<ReviewStats, RepositoryError>;
}

#[async_trait]
impl<T: ReviewsRepository + ?Sized> ReviewsRepository for std::sync::Arc<T> {
    async fn create(
        &self,
        user_id: i64,
        order_id: i64,
        new: &NewReview,
    ) -> Result<Review, RepositoryError> {
        (**self).create(user_id, order_id, new).await
    }

    async fn find_by_order(&self, order_id: i64) -> Result<Vec<Review>, RepositoryError> {
        (**self).find_by_order(order_id).await
    }

    async fn find_user_review(
        &self,
        user_id: i64,
        order_id: i64,
    ) -> Result<Option<Review>, RepositoryError> {
        (**self).find_user_review(user_id, order_id).await
    }

    async fn find_for_author(
        &self,
        review_id: i64,
        user_id: i64,
    ) -> Result<Review, RepositoryError> {
        (**self).find_for_author(review_id, user_id).await
    }

    async fn update(
        &self,
        review_id: i64,
        user_id: i64,
        new: &NewReview,
    ) -> Result<Review, RepositoryError> {
        (**self).update(review_id, user_id, new).await
    }

    async fn add_admin_response(
        &self,
        review_id: i64,
        admin_id: i64,
        text: &str,
    ) -> Result<Review, RepositoryError> {
        (**self).add_admin_response(review_id, admin_id, text).await
    }

    async fn delete(&self, review_id: i64) -> Result<(), RepositoryError> {
        (**self).delete(review_id).await
    }

    async fn list_page(
        &self,
        rating: Option<i32>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Review>, i64), RepositoryError> {
        (**self).list_page(rating, limit, offset).await
    }

    async fn stats(&self) -> Result<ReviewStats, RepositoryError> {
        (**self).stats().await
    }
}

const REVIEW_COLUMNS: &str = "id, user_id, order_id, rating, comment, images, \
     admin_response_text, admin_responded_by, admin_response_at, created_at";

/// PostgreSQL implementation of [`ReviewsRepository`].
pub struct PgReviewsRepository {
    pool: Pool,
}

impl PgReviewsRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

fn review_from_row(row: &Row) -> Review {
    Review {
        id: row.get("id"),
        user_id: row.get("user_id"),
        order_id: row.get("order_id"),
        rating: row.get("rating"),
        comment: row.get("comment"),
        images: row.get::<_, Json<Vec<String>>>("images").0,
        admin_response_text: row.get("admin_response_text"),
        admin_responded_by: row.get("admin_responded_by"),
        admin_response_at: row.get("admin_response_at"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl ReviewsRepository for PgReviewsRepository {
    async fn create(
        &self,
        user_id: i64,
        order_id: i64,
        new: &NewReview,
    ) -> Result<Review, RepositoryError> {
        let client = self.pool.get().await?;
        // The ownership guard lives in the statement itself: nothing is
        // inserted unless the order exists under this user.
        let query = format!(
            "INSERT INTO reviews (user_id, order_id, rating, comment, images) \
             SELECT $1, $2, $3, $4, $5 \
             WHERE EXISTS (SELECT 1 FROM orders WHERE id = $2 AND user_id = $1) \
             RETURNING {REVIEW_COLUMNS}"
        );
        let row = client
            .query_opt(
                query.as_str(),
                &[
                    &user_id,
                    &order_id,
                    &new.rating,
                    &new.comment,
                    &Json(&new.images),
                ],
            )
            .await?;
        match row {
            Some(row) => Ok(review_from_row(&row)),
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn find_by_order(&self, order_id: i64) -> Result<Vec<Review>, RepositoryError> {
        let client = self.pool.get().await?;
        let query = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE order_id = $1 ORDER BY created_at DESC"
        );
        let rows = client.query(query.as_str(), &[&order_id]).await?;
        Ok(rows.iter().map(review_from_row).collect())
    }

    async fn find_user_review(
        &self,
        user_id: i64,
        order_id: i64,
    ) -> Result<Option<Review>, RepositoryError> {
        let client = self.pool.get().await?;
        let query = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE user_id = $1 AND order_id = $2"
        );
        let row = client.query_opt(query.as_str(), &[&user_id, &order_id]).await?;
        Ok(row.as_ref().map(review_from_row))
    }

    async fn find_for_author(
        &self,
        review_id: i64,
        user_id: i64,
    ) -> Result<Review, RepositoryError> {
        let client = self.pool.get().await?;
        let query = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1 AND user_id = $2"
        );
        let row = client.query_opt(query.as_str(), &[&review_id, &user_id]).await?;
        match row {
            Some(row) => Ok(review_from_row(&row)),
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn update(
        &self,
        review_id: i64,
        user_id: i64,
        new: &NewReview,
    ) -> Result<Review, RepositoryError> {
        let client = self.pool.get().await?;
        let query = format!(
            "UPDATE reviews SET rating = $1, comment = $2, images = $3 \
             WHERE id = $4 AND user_id = $5 \
             RETURNING {REVIEW_COLUMNS}"
        );
        let row = client
            .query_opt(
                query.as_str(),
                &[
                    &new.rating,
                    &new.comment,
                    &Json(&new.images),
                    &review_id,
                    &user_id,
                ],
            )
            .await?;
        match row {
            Some(row) => Ok(review_from_row(&row)),
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn add_admin_response(
        &self,
        review_id: i64,
        admin_id: i64,
        text: &str,
    ) -> Result<Review, RepositoryError> {
        let client = self.pool.get().await?;
        let query = format!(
            "UPDATE reviews SET admin_response_text = $1, admin_responded_by = $2, \
             admin_response_at = now() \
             WHERE id = $3 \
             RETURNING {REVIEW_COLUMNS}"
        );
        let row = client
            .query_opt(query.as_str(), &[&text, &admin_id, &review_id])
            .await?;
        match row {
            Some(row) => Ok(review_from_row(&row)),
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn delete(&self, review_id: i64) -> Result<(), RepositoryError> {
        let client = self.pool.get().await?;
        let deleted = client
            .execute("DELETE FROM reviews WHERE id = $1", &[&review_id])
            .await?;
        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_page(
        &self,
        rating: Option<i32>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Review>, i64), RepositoryError> {
        let client = self.pool.get().await?;
        let (rows, total_row) = match rating {
            Some(rating) => {
                let query = format!(
                    "SELECT {REVIEW_COLUMNS} FROM reviews WHERE rating = $1 \
                     ORDER BY created_at DESC LIMIT $2 OFFSET $3"
                );
                let rows = client
                    .query(query.as_str(), &[&rating, &limit, &offset])
                    .await?;
                let total = client
                    .query_one("SELECT COUNT(*) AS count FROM reviews WHERE rating = $1", &[&rating])
                    .await?;
                (rows, total)
            }
            None => {
                let query = format!(
                    "SELECT {REVIEW_COLUMNS} FROM reviews \
                     ORDER BY created_at DESC LIMIT $1 OFFSET $2"
                );
                let rows = client.query(query.as_str(), &[&limit, &offset]).await?;
                let total = client
                    .query_one("SELECT COUNT(*) AS count FROM reviews", &[])
                    .await?;
                (rows, total)
            }
        };
        Ok((
            rows.iter().map(review_from_row).collect(),
            total_row.get("count"),
        ))
    }

    async fn stats(&self) -> Result<ReviewStats, RepositoryError> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                "SELECT rating, COUNT(*) AS count FROM reviews GROUP BY rating",
                &[],
            )
            .await?;

        let mut stats = ReviewStats::empty();
        let mut weighted: i64 = 0;
        for row in &rows {
            let rating: i32 = row.get("rating");
            let count: i64 = row.get("count");
            if let Ok(star) = u8::try_from(rating) {
                stats.rating_counts.insert(star, count);
            }
            stats.total_reviews += count;
            weighted += i64::from(rating) * count;
        }
        if stats.total_reviews > 0 {
            stats.average_rating =
                (Decimal::from(weighted) / Decimal::from(stats.total_reviews)).round_dp(2);
        }
        Ok(stats)
    }
}

//! Customer reviews: submission, author edits, and moderation.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use model::{NewReview, NewReviewRequest, Review, ReviewPage, ReviewUpdateRequest};
use repository::ReviewsRepository;
use tracing::instrument;

use crate::ServiceError;

/// How long the author may keep editing a posted review.
pub const REVIEW_EDIT_WINDOW_HOURS: i64 = 24;

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

/// Boundary operations for customer reviews.
#[async_trait]
pub trait ReviewService: Send + Sync {
    /// Posts a review of one of the caller's orders. At most one review per
    /// order and caller; the order must exist and belong to the caller.
    async fn submit_review(
        &self,
        user_id: i64,
        order_id: i64,
        req: NewReviewRequest,
    ) -> Result<Review, ServiceError>;

    /// Reviews attached to one order, most recent first.
    async fn order_reviews(&self, order_id: i64) -> Result<Vec<Review>, ServiceError>;

    /// Author edit, allowed within [`REVIEW_EDIT_WINDOW_HOURS`] of posting.
    /// Absent fields keep their current values.
    async fn edit_review(
        &self,
        user_id: i64,
        review_id: i64,
        req: ReviewUpdateRequest,
    ) -> Result<Review, ServiceError>;

    /// Attaches an operator response to a review.
    async fn respond(
        &self,
        review_id: i64,
        admin_id: i64,
        text: &str,
    ) -> Result<Review, ServiceError>;

    /// Removes a review outright (moderation).
    async fn delete_review(&self, review_id: i64) -> Result<(), ServiceError>;

    /// One page of the moderation listing with aggregate rating figures.
    /// `rating` filters to a star value; `page` is 1-based.
    async fn moderation_page(
        &self,
        rating: Option<i32>,
        page: i64,
        per_page: i64,
    ) -> Result<ReviewPage, ServiceError>;
}

/// Implementation of [`ReviewService`] over an injected repository.
pub struct ReviewServiceImpl<R> {
    reviews_repo: R,
}

impl<R: ReviewsRepository> ReviewServiceImpl<R> {
    pub fn new(reviews_repo: R) -> Self {
        Self { reviews_repo }
    }
}

fn validate_rating(rating: Option<i32>) -> Result<i32, ServiceError> {
    match rating {
        Some(r) if (1..=5).contains(&r) => Ok(r),
        _ => Err(ServiceError::Validation {
            fields: vec!["rating".to_string()],
        }),
    }
}

#[async_trait]
impl<R: ReviewsRepository> ReviewService for ReviewServiceImpl<R> {
    #[instrument(skip(self, req))]
    async fn submit_review(
        &self,
        user_id: i64,
        order_id: i64,
        req: NewReviewRequest,
    ) -> Result<Review, ServiceError> {
        let rating = validate_rating(req.rating)?;
        if self
            .reviews_repo
            .find_user_review(user_id, order_id)
            .await?
            .is_some()
        {
            return Err(ServiceError::DuplicateReview);
        }
        let new = NewReview {
            rating,
            comment: req
                .comment
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            images: req.images,
        };
        Ok(self.reviews_repo.create(user_id, order_id, &new).await?)
    }

    #[instrument(skip(self))]
    async fn order_reviews(&self, order_id: i64) -> Result<Vec<Review>, ServiceError> {
        Ok(self.reviews_repo.find_by_order(order_id).await?)
    }

    #[instrument(skip(self, req))]
    async fn edit_review(
        &self,
        user_id: i64,
        review_id: i64,
        req: ReviewUpdateRequest,
    ) -> Result<Review, ServiceError> {
        let existing = self.reviews_repo.find_for_author(review_id, user_id).await?;

        let age = Utc::now() - existing.created_at;
        if age > Duration::hours(REVIEW_EDIT_WINDOW_HOURS) {
            return Err(ServiceError::ReviewEditExpired);
        }

        let merged = NewReview {
            rating: validate_rating(Some(req.rating.unwrap_or(existing.rating)))?,
            comment: req.comment.or(existing.comment),
            images: req.images.unwrap_or(existing.images),
        };
        Ok(self.reviews_repo.update(review_id, user_id, &merged).await?)
    }

    #[instrument(skip(self, text))]
    async fn respond(
        &self,
        review_id: i64,
        admin_id: i64,
        text: &str,
    ) -> Result<Review, ServiceError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ServiceError::Validation {
                fields: vec!["text".to_string()],
            });
        }
        Ok(self
            .reviews_repo
            .add_admin_response(review_id, admin_id, text)
            .await?)
    }

    #[instrument(skip(self))]
    async fn delete_review(&self, review_id: i64) -> Result<(), ServiceError> {
        Ok(self.reviews_repo.delete(review_id).await?)
    }

    #[instrument(skip(self))]
    async fn moderation_page(
        &self,
        rating: Option<i32>,
        page: i64,
        per_page: i64,
    ) -> Result<ReviewPage, ServiceError> {
        let page = page.max(1);
        let per_page = if per_page < 1 {
            DEFAULT_PAGE_SIZE
        } else {
            per_page.min(MAX_PAGE_SIZE)
        };
        let offset = (page - 1) * per_page;

        let (reviews, total) = self.reviews_repo.list_page(rating, per_page, offset).await?;
        let stats = self.reviews_repo.stats().await?;
        Ok(ReviewPage {
            reviews,
            total,
            page,
            total_pages: (total + per_page - 1) / per_page,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::ReviewStats;
    use repository::RepositoryError;
    use rust_decimal::Decimal;
    use std::sync::Arc;
    use std::sync::Mutex;

    /// In-memory stand-in mirroring the Postgres contract, including the
    /// ownership guard on creation.
    struct MemReviewsRepository {
        reviews: Mutex<Vec<Review>>,
        // (user_id, order_id) pairs the store recognizes as owned orders.
        owned_orders: Vec<(i64, i64)>,
    }

    impl MemReviewsRepository {
        fn new(owned_orders: &[(i64, i64)]) -> Self {
            Self {
                reviews: Mutex::new(Vec::new()),
                owned_orders: owned_orders.to_vec(),
            }
        }

        fn backdate(&self, review_id: i64, hours: i64) {
            let mut reviews = self.reviews.lock().unwrap();
            let review = reviews.iter_mut().find(|r| r.id == review_id).unwrap();
            review.created_at -= Duration::hours(hours);
        }
    }

    #[async_trait]
    impl ReviewsRepository for MemReviewsRepository {
        async fn create(
            &self,
            user_id: i64,
            order_id: i64,
            new: &NewReview,
        ) -> Result<Review, RepositoryError> {
            if !self.owned_orders.contains(&(user_id, order_id)) {
                return Err(RepositoryError::NotFound);
            }
            let mut reviews = self.reviews.lock().unwrap();
            let review = Review {
                id: reviews.len() as i64 + 1,
                user_id,
                order_id,
                rating: new.rating,
                comment: new.comment.clone(),
                images: new.images.clone(),
                admin_response_text: None,
                admin_responded_by: None,
                admin_response_at: None,
                created_at: Utc::now(),
            };
            reviews.push(review.clone());
            Ok(review)
        }

        async fn find_by_order(&self, order_id: i64) -> Result<Vec<Review>, RepositoryError> {
            let mut reviews: Vec<Review> = self
                .reviews
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.order_id == order_id)
                .cloned()
                .collect();
            reviews.reverse();
            Ok(reviews)
        }

        async fn find_user_review(
            &self,
            user_id: i64,
            order_id: i64,
        ) -> Result<Option<Review>, RepositoryError> {
            Ok(self
                .reviews
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.user_id == user_id && r.order_id == order_id)
                .cloned())
        }

        async fn find_for_author(
            &self,
            review_id: i64,
            user_id: i64,
        ) -> Result<Review, RepositoryError> {
            self.reviews
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.id == review_id && r.user_id == user_id)
                .cloned()
                .ok_or(RepositoryError::NotFound)
        }

        async fn update(
            &self,
            review_id: i64,
            user_id: i64,
            new: &NewReview,
        ) -> Result<Review, RepositoryError> {
            let mut reviews = self.reviews.lock().unwrap();
            let review = reviews
                .iter_mut()
                .find(|r| r.id == review_id && r.user_id == user_id)
                .ok_or(RepositoryError::NotFound)?;
            review.rating = new.rating;
            review.comment = new.comment.clone();
            review.images = new.images.clone();
            Ok(review.clone())
        }

        async fn add_admin_response(
            &self,
            review_id: i64,
            admin_id: i64,
            text: &str,
        ) -> Result<Review, RepositoryError> {
            let mut reviews = self.reviews.lock().unwrap();
            let review = reviews
                .iter_mut()
                .find(|r| r.id == review_id)
                .ok_or(RepositoryError::NotFound)?;
            review.admin_response_text = Some(text.to_string());
            review.admin_responded_by = Some(admin_id);
            review.admin_response_at = Some(Utc::now());
            Ok(review.clone())
        }

        async fn delete(&self, review_id: i64) -> Result<(), RepositoryError> {
            let mut reviews = self.reviews.lock().unwrap();
            let before = reviews.len();
            reviews.retain(|r| r.id != review_id);
            if reviews.len() == before {
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
            let mut matching: Vec<Review> = self
                .reviews
                .lock()
                .unwrap()
                .iter()
                .filter(|r| rating.is_none_or(|wanted| r.rating == wanted))
                .cloned()
                .collect();
            matching.reverse();
            let total = matching.len() as i64;
            let page = matching
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .collect();
            Ok((page, total))
        }

        async fn stats(&self) -> Result<ReviewStats, RepositoryError> {
            let reviews = self.reviews.lock().unwrap();
            let mut stats = ReviewStats::empty();
            let mut weighted = 0i64;
            for review in reviews.iter() {
                if let Ok(star) = u8::try_from(review.rating) {
                    *stats.rating_counts.entry(star).or_insert(0) += 1;
                }
                stats.total_reviews += 1;
                weighted += i64::from(review.rating);
            }
            if stats.total_reviews > 0 {
                stats.average_rating =
                    (Decimal::from(weighted) / Decimal::from(stats.total_reviews)).round_dp(2);
            }
            Ok(stats)
        }
    }

    fn service_with(
        owned: &[(i64, i64)],
    ) -> (ReviewServiceImpl<Arc<MemReviewsRepository>>, Arc<MemReviewsRepository>) {
        let repo = Arc::new(MemReviewsRepository::new(owned));
        (ReviewServiceImpl::new(repo.clone()), repo)
    }

    fn submission(rating: i32) -> NewReviewRequest {
        NewReviewRequest {
            rating: Some(rating),
            comment: Some("tasty".into()),
            images: vec![],
        }
    }

    #[tokio::test]
    async fn test_submit_review_for_own_order() {
        let (service, _repo) = service_with(&[(1, 10)]);
        let review = service.submit_review(1, 10, submission(5)).await.unwrap();
        assert_eq!(review.rating, 5);
        assert_eq!(review.comment.as_deref(), Some("tasty"));

        let listed = service.order_reviews(10).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_submit_review_rejects_out_of_range_rating() {
        let (service, repo) = service_with(&[(1, 10)]);
        for rating in [None, Some(0), Some(6)] {
            let err = service
                .submit_review(1, 10, NewReviewRequest { rating, ..Default::default() })
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::Validation { ref fields } if fields == &["rating"]));
        }
        assert!(repo.reviews.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_review_for_foreign_order_is_not_found() {
        let (service, _repo) = service_with(&[(1, 10)]);
        let err = service.submit_review(2, 10, submission(4)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));
    }

    #[tokio::test]
    async fn test_second_review_of_same_order_rejected() {
        let (service, _repo) = service_with(&[(1, 10)]);
        service.submit_review(1, 10, submission(5)).await.unwrap();
        let err = service.submit_review(1, 10, submission(2)).await.unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateReview));
    }

    #[tokio::test]
    async fn test_edit_review_merges_absent_fields() {
        let (service, _repo) = service_with(&[(1, 10)]);
        let review = service.submit_review(1, 10, submission(5)).await.unwrap();

        let edited = service
            .edit_review(
                1,
                review.id,
                ReviewUpdateRequest {
                    rating: Some(3),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.rating, 3);
        // The untouched comment survives the edit.
        assert_eq!(edited.comment.as_deref(), Some("tasty"));
    }

    #[tokio::test]
    async fn test_edit_review_window_closes_after_a_day() {
        let (service, repo) = service_with(&[(1, 10)]);
        let review = service.submit_review(1, 10, submission(5)).await.unwrap();
        repo.backdate(review.id, REVIEW_EDIT_WINDOW_HOURS + 1);

        let err = service
            .edit_review(1, review.id, ReviewUpdateRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ReviewEditExpired));
    }

    #[tokio::test]
    async fn test_edit_review_by_non_author_is_not_found() {
        let (service, _repo) = service_with(&[(1, 10)]);
        let review = service.submit_review(1, 10, submission(5)).await.unwrap();
        let err = service
            .edit_review(2, review.id, ReviewUpdateRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));
    }

    #[tokio::test]
    async fn test_respond_requires_text() {
        let (service, _repo) = service_with(&[(1, 10)]);
        let review = service.submit_review(1, 10, submission(2)).await.unwrap();

        let err = service.respond(review.id, 99, "  ").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation { ref fields } if fields == &["text"]));

        let responded = service
            .respond(review.id, 99, "sorry about that")
            .await
            .unwrap();
        assert_eq!(responded.admin_responded_by, Some(99));
        assert_eq!(responded.admin_response_text.as_deref(), Some("sorry about that"));
    }

    #[tokio::test]
    async fn test_delete_review_missing_is_not_found() {
        let (service, _repo) = service_with(&[(1, 10)]);
        let err = service.delete_review(404).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));
    }

    #[tokio::test]
    async fn test_moderation_page_filters_and_paginates() {
        let (service, _repo) = service_with(&[(1, 10), (2, 20), (3, 30)]);
        service.submit_review(1, 10, submission(5)).await.unwrap();
        service.submit_review(2, 20, submission(5)).await.unwrap();
        service.submit_review(3, 30, submission(1)).await.unwrap();

        let page = service.moderation_page(Some(5), 1, 10).await.unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.reviews.len(), 2);
        assert_eq!(page.total_pages, 1);
        // Stats always cover the full set, not the filtered page.
        assert_eq!(page.stats.total_reviews, 3);
        assert_eq!(page.stats.rating_counts[&5], 2);
        assert_eq!(page.stats.rating_counts[&1], 1);

        let second = service.moderation_page(None, 2, 2).await.unwrap();
        assert_eq!(second.total, 3);
        assert_eq!(second.reviews.len(), 1);
        assert_eq!(second.total_pages, 2);
    }
}

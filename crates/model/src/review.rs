//! Customer reviews attached to delivered orders.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A customer review of one order. At most one review per (user, order)
/// pair; the author may edit it within 24 hours of posting, after which
/// only an operator response can be attached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: i64,
    pub user_id: i64,
    pub order_id: i64,
    /// 1 to 5 stars.
    pub rating: i32,
    pub comment: Option<String>,
    /// URLs of photos the customer attached.
    pub images: Vec<String>,
    pub admin_response_text: Option<String>,
    pub admin_responded_by: Option<i64>,
    pub admin_response_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Review submission payload. `rating` is optional at the wire level so
/// validation can report it together with any other offending field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewReviewRequest {
    pub rating: Option<i32>,
    pub comment: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// A review submission that already passed service-level validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub rating: i32,
    pub comment: Option<String>,
    pub images: Vec<String>,
}

/// Partial edit of an existing review; absent fields keep their current
/// values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewUpdateRequest {
    pub rating: Option<i32>,
    pub comment: Option<String>,
    pub images: Option<Vec<String>>,
}

/// Aggregate rating figures shown on the moderation screen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewStats {
    pub average_rating: Decimal,
    pub total_reviews: i64,
    /// Review count per star value; every key 1..=5 is present.
    pub rating_counts: BTreeMap<u8, i64>,
}

impl ReviewStats {
    /// Zero-filled stats for a shop without reviews yet.
    pub fn empty() -> Self {
        Self {
            average_rating: Decimal::ZERO,
            total_reviews: 0,
            rating_counts: (1..=5).map(|r| (r, 0)).collect(),
        }
    }
}

/// One page of the moderation listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewPage {
    pub reviews: Vec<Review>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
    pub stats: ReviewStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_review_submission() {
        let req: NewReviewRequest = serde_json::from_str(
            r#"{ "rating": 4, "comment": "great burger", "images": ["a.jpg"] }"#,
        )
        .unwrap();
        assert_eq!(req.rating, Some(4));
        assert_eq!(req.images, vec!["a.jpg".to_string()]);

        // Bare submission still deserializes; validation reports the rest.
        let req: NewReviewRequest = serde_json::from_str("{}").unwrap();
        assert!(req.rating.is_none());
        assert!(req.images.is_empty());
    }

    #[test]
    fn test_empty_stats_cover_every_star() {
        let stats = ReviewStats::empty();
        assert_eq!(stats.total_reviews, 0);
        assert_eq!(stats.rating_counts.len(), 5);
        assert!(stats.rating_counts.values().all(|&c| c == 0));
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["rating_counts"]["3"], 0);
    }
}

//! Business logic layer.
//!
//! One service per domain area: [`OrderService`] for checkout and the order
//! lifecycle, [`ReviewService`] for customer reviews and moderation, and
//! [`ComboService`] for the combo-deal catalog. Each service is the boundary
//! between external requests and the repositories: it validates incoming
//! payloads before any database work, delegates to the transactional
//! repository operations, and (for orders) emits a fire-and-forget
//! notification event after each successful mutation.
//!
//! # Features
//! - Fail-fast payload validation reporting every missing/invalid field.
//! - Status-transition checks delegated to the single policy in `model`.
//! - Dependency injection over repository traits for testability.
//! - Well-typed error handling via [`ServiceError`].

use async_trait::async_trait;
use model::{OrderEvent, OrderStatus};
use repository::RepositoryError;
use thiserror::Error;

mod combos;
mod orders;
mod reviews;

pub use combos::{ComboService, ComboServiceImpl};
pub use orders::{OrderService, OrderServiceImpl};
pub use reviews::{REVIEW_EDIT_WINDOW_HOURS, ReviewService, ReviewServiceImpl};

/// The main error type for all service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The payload is structurally invalid; `fields` names every offending
    /// field, not just the first one found.
    #[error("Validation failed: {}", fields.join(", "))]
    Validation { fields: Vec<String> },
    /// The requested status string is not part of the enumeration.
    #[error("Unknown order status: {0}")]
    UnknownStatus(String),
    /// The referenced entity does not exist (or belongs to another user).
    #[error("Not found")]
    NotFound,
    /// The requested status change is not reachable from the current status.
    #[error("Invalid status transition: {from} -> {requested}")]
    InvalidTransition {
        from: OrderStatus,
        requested: OrderStatus,
    },
    /// The caller has already reviewed this order.
    #[error("Order already reviewed")]
    DuplicateReview,
    /// The author-edit window on the review has passed.
    #[error("Reviews can only be edited within {REVIEW_EDIT_WINDOW_HOURS} hours of posting")]
    ReviewEditExpired,
    /// An underlying persistence fault; the repository has already rolled
    /// back its transaction.
    #[error("Storage error: {0}")]
    Storage(#[source] RepositoryError),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ServiceError::NotFound,
            RepositoryError::InvalidTransition { from, requested } => {
                ServiceError::InvalidTransition { from, requested }
            }
            RepositoryError::UnknownItem(name) => ServiceError::Validation {
                fields: vec![format!("items: unknown menu item \"{name}\"")],
            },
            other => ServiceError::Storage(other),
        }
    }
}

/// Sink for outbound order notifications. Delivery is at-most-once and
/// best-effort: implementations log failures instead of surfacing them,
/// because the data mutation already stands.
#[async_trait]
pub trait OrderEventSink: Send + Sync {
    async fn publish(&self, event: OrderEvent);
}

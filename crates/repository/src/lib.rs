//! # Data Repository Layer
//!
//! Repository traits and PostgreSQL implementations for orders, the menu
//! catalog, combo deals, and customer reviews. Every mutating operation runs
//! inside its own transaction on a connection borrowed from the shared pool,
//! so a fault at any point rolls the whole unit back before the error
//! propagates.

use deadpool_postgres::PoolError;
use model::OrderStatus;
use thiserror::Error;

mod combos;
mod menu;
mod orders;
mod reviews;

pub use combos::{CombosRepository, PgCombosRepository};
pub use menu::{MenuRepository, PgMenuRepository};
pub use orders::{OrdersRepository, PgOrdersRepository};
pub use reviews::{PgReviewsRepository, ReviewsRepository};

/// Error conditions arising in the data storage layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database-related errors, wrapping the underlying PostgreSQL error.
    /// The triggering transaction has already been rolled back.
    #[error("Database error: {0}")]
    Db(#[from] tokio_postgres::Error),
    /// Failed to obtain a connection from the pool within the bounded wait.
    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),
    /// No matching row (or the row belongs to a different user).
    #[error("Not found")]
    NotFound,
    /// A referenced entry could not be resolved against the menu catalog.
    #[error("Unknown menu item: {0}")]
    UnknownItem(String),
    /// The requested status change is not reachable from the current status.
    #[error("Invalid status transition: {from} -> {requested}")]
    InvalidTransition {
        from: OrderStatus,
        requested: OrderStatus,
    },
    /// A stored enumeration column holds a value outside the enumeration.
    #[error("Corrupt row: {0}")]
    Decode(#[from] model::ParseEnumError),
}

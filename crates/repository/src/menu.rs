//! The menu catalog the storefront browses.

use async_trait::async_trait;
use deadpool_postgres::Pool;
use model::MenuItem;
use tokio_postgres::Row;

use crate::RepositoryError;

/// Repository interface for the menu catalog.
#[async_trait]
pub trait MenuRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<MenuItem>, RepositoryError>;
}

#[async_trait]
impl<T: MenuRepository + ?Sized> MenuRepository for std::sync::Arc<T> {
    async fn list(&self) -> Result<Vec<MenuItem>, RepositoryError> {
        (**self).list().await
    }
}

/// PostgreSQL implementation of [`MenuRepository`].
pub struct PgMenuRepository {
    pool: Pool,
}

impl PgMenuRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

fn menu_item_from_row(row: &Row) -> MenuItem {
    MenuItem {
        id: row.get("id"),
        name: row.get("name"),
        price: row.get("price"),
        category: row.get("category"),
        available: row.get("available"),
    }
}

#[async_trait]
impl MenuRepository for PgMenuRepository {
    async fn list(&self) -> Result<Vec<MenuItem>, RepositoryError> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                "SELECT id, name, price, category, available FROM menu_items ORDER BY category, name",
                &[],
            )
            .await?;
        Ok(rows.iter().map(menu_item_from_row).collect())
    }
}

//! Combo deals: transactional header + bundled-items creation, the same
//! shape as order creation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;
use model::{ComboDeal, ComboDealChanges, ComboDealItem, NewComboDeal};
use tokio_postgres::{GenericClient, Row};

use crate::RepositoryError;

/// Repository interface for combo deals.
#[async_trait]
pub trait CombosRepository: Send + Sync {
    /// Persist a validated deal: header first, then one row per bundled
    /// item, all in one transaction. Every referenced menu item must exist.
    async fn create(&self, new: &NewComboDeal) -> Result<ComboDeal, RepositoryError>;

    /// Every deal with its bundled items, newest first.
    async fn list_all(&self) -> Result<Vec<ComboDeal>, RepositoryError>;

    async fn find_by_id(&self, deal_id: i64) -> Result<ComboDeal, RepositoryError>;

    /// Full replacement of the deal's scalar fields; the bundle is fixed.
    async fn update(
        &self,
        deal_id: i64,
        changes: &ComboDealChanges,
    ) -> Result<ComboDeal, RepositoryError>;

    /// Removes the deal and its bundled-item rows.
    async fn delete(&self, deal_id: i64) -> Result<(), RepositoryError>;
}

#[async_trait]
impl<T: CombosRepository + ?Sized> CombosRepository for std::sync::Arc<T> {
    async fn create(&self, new: &NewComboDeal) -> Result<ComboDeal, RepositoryError> {
        (**self).create(new).await
    }

    async fn list_all(&self) -> Result<Vec<ComboDeal>, RepositoryError> {
        (**self).list_all().await
    }

    async fn find_by_id(&self, deal_id: i64) -> Result<ComboDeal, RepositoryError> {
        (**self).find_by_id(deal_id).await
    }

    async fn update(
        &self,
        deal_id: i64,
        changes: &ComboDealChanges,
    ) -> Result<ComboDeal, RepositoryError> {
        (**self).update(deal_id, changes).await
    }

    async fn delete(&self, deal_id: i64) -> Result<(), RepositoryError> {
        (**self).delete(deal_id).await
    }
}

const DEAL_COLUMNS: &str = "id, name, description, price, available, created_at";

/// PostgreSQL implementation of [`CombosRepository`].
pub struct PgCombosRepository {
    pool: Pool,
}

impl PgCombosRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

fn deal_from_row(row: &Row) -> ComboDeal {
    ComboDeal {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        price: row.get("price"),
        available: row.get("available"),
        items: Vec::new(),
        created_at: row.get("created_at"),
    }
}

/// Loads bundled items for a set of deals in one query, with the current
/// catalog names joined in.
async fn items_by_deal<C: GenericClient>(
    client: &C,
    deal_ids: &[i64],
) -> Result<HashMap<i64, Vec<ComboDealItem>>, RepositoryError> {
    let query = r#"
        SELECT cdi.combo_deal_id, cdi.menu_item_id, mi.name, cdi.quantity
        FROM combo_deal_items cdi
        JOIN menu_items mi ON mi.id = cdi.menu_item_id
        WHERE cdi.combo_deal_id = ANY($1) ORDER BY cdi.id
    "#;
    let rows = client.query(query, &[&deal_ids]).await?;
    let mut grouped: HashMap<i64, Vec<ComboDealItem>> = HashMap::new();
    for row in rows {
        grouped
            .entry(row.get("combo_deal_id"))
            .or_default()
            .push(ComboDealItem {
                menu_item_id: row.get("menu_item_id"),
                name: row.get("name"),
                quantity: row.get("quantity"),
            });
    }
    Ok(grouped)
}

#[async_trait]
impl CombosRepository for PgCombosRepository {
    async fn create(&self, new: &NewComboDeal) -> Result<ComboDeal, RepositoryError> {
        let mut client = self.pool.get().await?;
        // Rollback on drop: a deal either lands with its whole bundle or
        // not at all.
        let tx = client.transaction().await?;

        let row = tx
            .query_one(
                "INSERT INTO combo_deals (name, description, price, available) \
                 VALUES ($1, $2, $3, $4) RETURNING id, created_at",
                &[&new.name, &new.description, &new.price, &new.available],
            )
            .await?;
        let deal_id: i64 = row.get("id");
        let created_at: DateTime<Utc> = row.get("created_at");

        let mut items = Vec::with_capacity(new.items.len());
        for item in &new.items {
            let menu_row = tx
                .query_opt(
                    "SELECT name FROM menu_items WHERE id = $1",
                    &[&item.menu_item_id],
                )
                .await?;
            let name: String = match menu_row {
                Some(r) => r.get("name"),
                None => {
                    return Err(RepositoryError::UnknownItem(format!(
                        "#{}",
                        item.menu_item_id
                    )));
                }
            };
            tx.execute(
                "INSERT INTO combo_deal_items (combo_deal_id, menu_item_id, quantity) \
                 VALUES ($1, $2, $3)",
                &[&deal_id, &item.menu_item_id, &item.quantity],
            )
            .await?;
            items.push(ComboDealItem {
                menu_item_id: item.menu_item_id,
                name,
                quantity: item.quantity,
            });
        }

        tx.commit().await?;

        Ok(ComboDeal {
            id: deal_id,
            name: new.name.clone(),
            description: new.description.clone(),
            price: new.price,
            available: new.available,
            items,
            created_at,
        })
    }

    async fn list_all(&self) -> Result<Vec<ComboDeal>, RepositoryError> {
        let client = self.pool.get().await?;
        let query = format!(
            "SELECT {DEAL_COLUMNS} FROM combo_deals ORDER BY created_at DESC, id DESC"
        );
        let rows = client.query(query.as_str(), &[]).await?;
        let mut deals: Vec<ComboDeal> = rows.iter().map(deal_from_row).collect();
        if deals.is_empty() {
            return Ok(deals);
        }
        let ids: Vec<i64> = deals.iter().map(|d| d.id).collect();
        let mut grouped = items_by_deal(&**client, &ids).await?;
        for deal in &mut deals {
            deal.items = grouped.remove(&deal.id).unwrap_or_default();
        }
        Ok(deals)
    }

    async fn find_by_id(&self, deal_id: i64) -> Result<ComboDeal, RepositoryError> {
        let client = self.pool.get().await?;
        let query = format!("SELECT {DEAL_COLUMNS} FROM combo_deals WHERE id = $1");
        let row = client.query_opt(query.as_str(), &[&deal_id]).await?;
        let mut deal = match row {
            Some(row) => deal_from_row(&row),
            None => return Err(RepositoryError::NotFound),
        };
        let mut grouped = items_by_deal(&**client, &[deal.id]).await?;
        deal.items = grouped.remove(&deal.id).unwrap_or_default();
        Ok(deal)
    }

    async fn update(
        &self,
        deal_id: i64,
        changes: &ComboDealChanges,
    ) -> Result<ComboDeal, RepositoryError> {
        let client = self.pool.get().await?;
        let query = format!(
            "UPDATE combo_deals SET name = $1, description = $2, price = $3, available = $4 \
             WHERE id = $5 RETURNING {DEAL_COLUMNS}"
        );
        let row = client
            .query_opt(
                query.as_str(),
                &[
                    &changes.name,
                    &changes.description,
                    &changes.price,
                    &changes.available,
                    &deal_id,
                ],
            )
            .await?;
        let mut deal = match row {
            Some(row) => deal_from_row(&row),
            None => return Err(RepositoryError::NotFound),
        };
        let mut grouped = items_by_deal(&**client, &[deal.id]).await?;
        deal.items = grouped.remove(&deal.id).unwrap_or_default();
        Ok(deal)
    }

    async fn delete(&self, deal_id: i64) -> Result<(), RepositoryError> {
        let client = self.pool.get().await?;
        // Bundled-item rows go with the deal via ON DELETE CASCADE.
        let deleted = client
            .execute("DELETE FROM combo_deals WHERE id = $1", &[&deal_id])
            .await?;
        if deleted == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

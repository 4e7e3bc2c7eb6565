//! Orders: transactional creation, lifecycle updates, and the dashboard
//! aggregation over the order history.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::Pool;
use model::{
    DailyStat, DashboardStats, NewOrder, Order, OrderItem, OrderStatus, PaymentMethod,
    PaymentStatus, PopularItem,
};
use rust_decimal::Decimal;
use tokio_postgres::{GenericClient, Row};

use crate::RepositoryError;

/// Repository interface for orders and their line items.
///
/// Orders are created atomically with all line items and never physically
/// deleted; after creation only the status fields and cancellation metadata
/// are written.
#[async_trait]
pub trait OrdersRepository: Send + Sync {
    /// Persist a validated order: header first (to obtain the id), then one
    /// line-item row per cart entry, all in one transaction. Each item name
    /// is resolved against the menu catalog inside the same transaction.
    async fn create(&self, user_id: i64, new_order: &NewOrder) -> Result<Order, RepositoryError>;

    /// Every order with line items attached, most recent first.
    async fn list_all(&self) -> Result<Vec<Order>, RepositoryError>;

    /// Orders belonging to one user, most recent first.
    async fn find_by_user(&self, user_id: i64) -> Result<Vec<Order>, RepositoryError>;

    /// Single order by id. When `user_id` is supplied the lookup also
    /// enforces ownership, answering `NotFound` for another user's order.
    async fn find_by_id(
        &self,
        order_id: i64,
        user_id: Option<i64>,
    ) -> Result<Order, RepositoryError>;

    /// Apply a status transition after consulting the transition policy.
    /// Illegal transitions fail with [`RepositoryError::InvalidTransition`]
    /// and write nothing. Landing on `delivered` also applies the
    /// payment-completion policy; landing on `cancelled` stamps the
    /// cancellation metadata with `actor`.
    async fn update_status(
        &self,
        order_id: i64,
        requested: OrderStatus,
        payment_confirmed: bool,
        actor: Option<i64>,
    ) -> Result<Order, RepositoryError>;

    /// Single-column payment-status update, no cross-field validation.
    async fn update_payment_status(
        &self,
        order_id: i64,
        status: PaymentStatus,
    ) -> Result<Order, RepositoryError>;

    /// Payment-provider callback path: mark the payment completed and, when
    /// the transition policy allows it, move a pending order to confirmed.
    async fn complete_payment(&self, order_id: i64) -> Result<Order, RepositoryError>;

    /// Order and revenue aggregates for the admin dashboard; period figures
    /// cover orders created at or after `since`.
    async fn dashboard_stats(
        &self,
        since: DateTime<Utc>,
    ) -> Result<DashboardStats, RepositoryError>;
}

#[async_trait]
impl<T: OrdersRepository + ?Sized> OrdersRepository for std::sync::Arc<T> {
    async fn create(&self, user_id: i64, new_order: &NewOrder) -> Result<Order, RepositoryError> {
        (**self).create(user_id, new_order).await
    }

    async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        (**self).list_all().await
    }

    async fn find_by_user(&self, user_id: i64) -> Result<Vec<Order>, RepositoryError> {
        (**self).find_by_user(user_id).await
    }

    async fn find_by_id(
        &self,
        order_id: i64,
        user_id: Option<i64>,
    ) -> Result<Order, RepositoryError> {
        (**self).find_by_id(order_id, user_id).await
    }

    async fn update_status(
        &self,
        order_id: i64,
        requested: OrderStatus,
        payment_confirmed: bool,
        actor: Option<i64>,
    ) -> Result<Order, RepositoryError> {
        (**self)
            .update_status(order_id, requested, payment_confirmed, actor)
            .await
    }

    async fn update_payment_status(
        &self,
        order_id: i64,
        status: PaymentStatus,
    ) -> Result<Order, RepositoryError> {
        (**self).update_payment_status(order_id, status).await
    }

    async fn complete_payment(&self, order_id: i64) -> Result<Order, RepositoryError> {
        (**self).complete_payment(order_id).await
    }

    async fn dashboard_stats(
        &self,
        since: DateTime<Utc>,
    ) -> Result<DashboardStats, RepositoryError> {
        (**self).dashboard_stats(since).await
    }
}

const ORDER_COLUMNS: &str = "id, user_id, total_amount, delivery_address, payment_method, \
     customer_name, customer_phone, special_instructions, order_status, payment_status, \
     created_at, cancelled_at, cancelled_by";

/// PostgreSQL implementation of [`OrdersRepository`] over a shared pool.
pub struct PgOrdersRepository {
    pool: Pool,
}

impl PgOrdersRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

fn order_from_row(row: &Row) -> Result<Order, RepositoryError> {
    Ok(Order {
        id: row.get("id"),
        user_id: row.get("user_id"),
        items: Vec::new(),
        total_amount: row.get("total_amount"),
        delivery_address: row.get("delivery_address"),
        payment_method: row.get::<_, String>("payment_method").parse()?,
        customer_name: row.get("customer_name"),
        customer_phone: row.get("customer_phone"),
        special_instructions: row.get("special_instructions"),
        status: row.get::<_, String>("order_status").parse()?,
        payment_status: row.get::<_, String>("payment_status").parse()?,
        created_at: row.get("created_at"),
        cancelled_at: row.get("cancelled_at"),
        cancelled_by: row.get("cancelled_by"),
    })
}

/// Loads line items for a set of orders in one query, grouped by order id.
async fn items_by_order<C: GenericClient>(
    client: &C,
    order_ids: &[i64],
) -> Result<HashMap<i64, Vec<OrderItem>>, RepositoryError> {
    let query = r#"
        SELECT order_id, name, quantity, price
        FROM order_items WHERE order_id = ANY($1) ORDER BY id
    "#;
    let rows = client.query(query, &[&order_ids]).await?;
    let mut grouped: HashMap<i64, Vec<OrderItem>> = HashMap::new();
    for row in rows {
        grouped
            .entry(row.get("order_id"))
            .or_default()
            .push(OrderItem {
                name: row.get("name"),
                quantity: row.get("quantity"),
                price: row.get("price"),
            });
    }
    Ok(grouped)
}

/// Attaches line items to each order in place, preserving order ordering.
async fn attach_items<C: GenericClient>(
    client: &C,
    orders: &mut [Order],
) -> Result<(), RepositoryError> {
    if orders.is_empty() {
        return Ok(());
    }
    let ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
    let mut grouped = items_by_order(client, &ids).await?;
    for order in orders {
        order.items = grouped.remove(&order.id).unwrap_or_default();
    }
    Ok(())
}

#[async_trait]
impl OrdersRepository for PgOrdersRepository {
    async fn create(&self, user_id: i64, new_order: &NewOrder) -> Result<Order, RepositoryError> {
        let mut client = self.pool.get().await?;
        // Dropping the transaction on any early return rolls it back, so no
        // partial order is ever visible to readers.
        let tx = client.transaction().await?;

        let header_query = r#"
            INSERT INTO orders (
                user_id, total_amount, delivery_address, payment_method,
                customer_name, customer_phone, special_instructions,
                order_status, payment_status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, created_at
        "#;
        let method = new_order.payment_method.as_str();
        let row = tx
            .query_one(
                header_query,
                &[
                    &user_id,
                    &new_order.total_amount,
                    &new_order.delivery_address,
                    &method,
                    &new_order.customer_name,
                    &new_order.customer_phone,
                    &new_order.special_instructions,
                    &OrderStatus::Pending.as_str(),
                    &PaymentStatus::Pending.as_str(),
                ],
            )
            .await?;
        let order_id: i64 = row.get("id");
        let created_at: DateTime<Utc> = row.get("created_at");

        let item_query = r#"
            INSERT INTO order_items (order_id, menu_item_id, name, quantity, price)
            VALUES ($1, $2, $3, $4, $5)
        "#;
        for item in &new_order.items {
            // Resolve against the live catalog inside the transaction; a
            // stale client-side menu cannot smuggle in an unknown item.
            let menu_row = tx
                .query_opt("SELECT id FROM menu_items WHERE name = $1", &[&item.name])
                .await?;
            let menu_item_id: i64 = match menu_row {
                Some(r) => r.get("id"),
                None => return Err(RepositoryError::UnknownItem(item.name.clone())),
            };
            tx.execute(
                item_query,
                &[&order_id, &menu_item_id, &item.name, &item.quantity, &item.price],
            )
            .await?;
        }

        tx.commit().await?;

        Ok(Order {
            id: order_id,
            user_id,
            items: new_order.items.clone(),
            total_amount: new_order.total_amount,
            delivery_address: new_order.delivery_address.clone(),
            payment_method: new_order.payment_method,
            customer_name: new_order.customer_name.clone(),
            customer_phone: new_order.customer_phone.clone(),
            special_instructions: new_order.special_instructions.clone(),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            created_at,
            cancelled_at: None,
            cancelled_by: None,
        })
    }

    async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
        let client = self.pool.get().await?;
        let query = format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC"
        );
        let rows = client.query(query.as_str(), &[]).await?;
        let mut orders = rows
            .iter()
            .map(order_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        attach_items(&**client, &mut orders).await?;
        Ok(orders)
    }

    async fn find_by_user(&self, user_id: i64) -> Result<Vec<Order>, RepositoryError> {
        let client = self.pool.get().await?;
        let query = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        );
        let rows = client.query(query.as_str(), &[&user_id]).await?;
        let mut orders = rows
            .iter()
            .map(order_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        attach_items(&**client, &mut orders).await?;
        Ok(orders)
    }

    async fn find_by_id(
        &self,
        order_id: i64,
        user_id: Option<i64>,
    ) -> Result<Order, RepositoryError> {
        let client = self.pool.get().await?;
        let row = match user_id {
            Some(uid) => {
                let query = format!(
                    "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2"
                );
                client.query_opt(query.as_str(), &[&order_id, &uid]).await?
            }
            None => {
                let query = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
                client.query_opt(query.as_str(), &[&order_id]).await?
            }
        };
        let mut order = match row {
            Some(row) => order_from_row(&row)?,
            None => return Err(RepositoryError::NotFound),
        };
        let mut grouped = items_by_order(&**client, &[order.id]).await?;
        order.items = grouped.remove(&order.id).unwrap_or_default();
        Ok(order)
    }

    async fn update_status(
        &self,
        order_id: i64,
        requested: OrderStatus,
        payment_confirmed: bool,
        actor: Option<i64>,
    ) -> Result<Order, RepositoryError> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        let row = tx
            .query_opt(
                "SELECT order_status, payment_method, payment_status FROM orders WHERE id = $1",
                &[&order_id],
            )
            .await?
            .ok_or(RepositoryError::NotFound)?;
        let current: OrderStatus = row.get::<_, String>("order_status").parse()?;

        if !current.can_transition_to(requested) {
            // No write has happened; dropping the transaction rolls it back.
            return Err(RepositoryError::InvalidTransition {
                from: current,
                requested,
            });
        }

        tx.execute(
            "UPDATE orders SET order_status = $1 WHERE id = $2",
            &[&requested.as_str(), &order_id],
        )
        .await?;

        if requested == OrderStatus::Cancelled && current != OrderStatus::Cancelled {
            tx.execute(
                "UPDATE orders SET cancelled_at = now(), cancelled_by = $1 WHERE id = $2",
                &[&actor, &order_id],
            )
            .await?;
        }

        if requested == OrderStatus::Delivered {
            let method: PaymentMethod = row.get::<_, String>("payment_method").parse()?;
            let payment: PaymentStatus = row.get::<_, String>("payment_status").parse()?;
            let next = PaymentStatus::on_delivery(method, payment_confirmed, payment);
            if next != payment {
                tx.execute(
                    "UPDATE orders SET payment_status = $1 WHERE id = $2",
                    &[&next.as_str(), &order_id],
                )
                .await?;
            }
        }

        tx.commit().await?;
        drop(client);
        self.find_by_id(order_id, None).await
    }

    async fn update_payment_status(
        &self,
        order_id: i64,
        status: PaymentStatus,
    ) -> Result<Order, RepositoryError> {
        let client = self.pool.get().await?;
        let updated = client
            .execute(
                "UPDATE orders SET payment_status = $1 WHERE id = $2",
                &[&status.as_str(), &order_id],
            )
            .await?;
        if updated == 0 {
            return Err(RepositoryError::NotFound);
        }
        drop(client);
        self.find_by_id(order_id, None).await
    }

    async fn complete_payment(&self, order_id: i64) -> Result<Order, RepositoryError> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        let row = tx
            .query_opt("SELECT order_status FROM orders WHERE id = $1", &[&order_id])
            .await?
            .ok_or(RepositoryError::NotFound)?;
        let current: OrderStatus = row.get::<_, String>("order_status").parse()?;

        tx.execute(
            "UPDATE orders SET payment_status = $1 WHERE id = $2",
            &[&PaymentStatus::Completed.as_str(), &order_id],
        )
        .await?;

        // Confirmation is a side effect of payment only while the order is
        // still pending; later stages are left where the operator put them.
        if current != OrderStatus::Confirmed && current.can_transition_to(OrderStatus::Confirmed) {
            tx.execute(
                "UPDATE orders SET order_status = $1 WHERE id = $2",
                &[&OrderStatus::Confirmed.as_str(), &order_id],
            )
            .await?;
        }

        tx.commit().await?;
        drop(client);
        self.find_by_id(order_id, None).await
    }

    async fn dashboard_stats(
        &self,
        since: DateTime<Utc>,
    ) -> Result<DashboardStats, RepositoryError> {
        let client = self.pool.get().await?;

        let totals = client
            .query_one(
                "SELECT COUNT(*) AS orders, COALESCE(SUM(total_amount), 0) AS revenue FROM orders",
                &[],
            )
            .await?;
        let period = client
            .query_one(
                "SELECT COUNT(*) AS orders, COALESCE(SUM(total_amount), 0) AS revenue \
                 FROM orders WHERE created_at >= $1",
                &[&since],
            )
            .await?;

        let status_rows = client
            .query(
                "SELECT order_status, COUNT(*) AS count FROM orders GROUP BY order_status",
                &[],
            )
            .await?;
        let mut status_counts = BTreeMap::new();
        for row in &status_rows {
            let status: OrderStatus = row.get::<_, String>("order_status").parse()?;
            status_counts.insert(status, row.get::<_, i64>("count"));
        }

        let popular_rows = client
            .query(
                "SELECT oi.name, SUM(oi.quantity) AS count, SUM(oi.price * oi.quantity) AS revenue \
                 FROM order_items oi JOIN orders o ON o.id = oi.order_id \
                 WHERE o.created_at >= $1 \
                 GROUP BY oi.name ORDER BY count DESC, oi.name LIMIT 5",
                &[&since],
            )
            .await?;
        let popular_items = popular_rows
            .iter()
            .map(|row| PopularItem {
                name: row.get("name"),
                count: row.get("count"),
                revenue: row.get("revenue"),
            })
            .collect();

        let daily_rows = client
            .query(
                "SELECT created_at::DATE AS date, COUNT(*) AS orders, SUM(total_amount) AS revenue \
                 FROM orders WHERE created_at >= $1 \
                 GROUP BY created_at::DATE ORDER BY date",
                &[&since],
            )
            .await?;
        let daily = daily_rows
            .iter()
            .map(|row| DailyStat {
                date: row.get("date"),
                orders: row.get("orders"),
                revenue: row.get("revenue"),
            })
            .collect();

        Ok(DashboardStats {
            total_orders: totals.get("orders"),
            period_orders: period.get("orders"),
            total_revenue: totals.get::<_, Decimal>("revenue"),
            period_revenue: period.get::<_, Decimal>("revenue"),
            status_counts,
            popular_items,
            daily,
        })
    }
}

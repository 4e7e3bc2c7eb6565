//! Checkout, order lifecycle, and the admin dashboard aggregation.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use model::{
    DashboardStats, DateRange, MenuItem, NewOrder, NewOrderRequest, Order, OrderEvent,
    OrderStatus, PaymentMethod, PaymentStatus,
};
use repository::{MenuRepository, OrdersRepository};
use rust_decimal::Decimal;
use tracing::{instrument, warn};

use crate::{OrderEventSink, ServiceError};

/// Trait describing the boundary operations of the ordering core.
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Validates the checkout payload and atomically persists the order.
    ///
    /// # Errors
    /// [`ServiceError::Validation`] listing every missing/invalid field,
    /// or [`ServiceError::Storage`] for persistence faults.
    async fn place_order(&self, user_id: i64, req: NewOrderRequest) -> Result<Order, ServiceError>;

    /// Applies a status change requested by an operator.
    ///
    /// Unrecognized status strings are rejected before any repository call.
    /// `payment_confirmed` matters only when the transition lands on
    /// `delivered`; `actor` is recorded when the order is cancelled.
    async fn change_status(
        &self,
        order_id: i64,
        requested: &str,
        payment_confirmed: bool,
        actor: Option<i64>,
    ) -> Result<Order, ServiceError>;

    /// The caller's orders, most recent first.
    async fn my_orders(&self, user_id: i64) -> Result<Vec<Order>, ServiceError>;

    /// One order; with a user id the lookup enforces ownership.
    async fn get_order(&self, order_id: i64, user_id: Option<i64>)
        -> Result<Order, ServiceError>;

    /// Every order, most recent first (administrative view).
    async fn all_orders(&self) -> Result<Vec<Order>, ServiceError>;

    /// Verified payment-provider callback: settle the payment and confirm
    /// the order if it is still pending.
    async fn complete_payment(&self, order_id: i64) -> Result<Order, ServiceError>;

    /// The menu catalog the storefront browses.
    async fn menu(&self) -> Result<Vec<MenuItem>, ServiceError>;

    /// Order and revenue aggregates for the selected reporting window.
    async fn dashboard(&self, range: DateRange) -> Result<DashboardStats, ServiceError>;
}

/// Implementation of [`OrderService`] over injected repositories.
pub struct OrderServiceImpl<R, M> {
    orders_repo: R,
    menu_repo: M,
    events: Option<Arc<dyn OrderEventSink>>,
}

impl<R, M> OrderServiceImpl<R, M>
where
    R: OrdersRepository,
    M: MenuRepository,
{
    /// Constructs the service. `events` is optional so the backend keeps
    /// serving orders when the notification broker is unavailable.
    pub fn new(orders_repo: R, menu_repo: M, events: Option<Arc<dyn OrderEventSink>>) -> Self {
        Self {
            orders_repo,
            menu_repo,
            events,
        }
    }

    async fn emit(&self, event: OrderEvent) {
        if let Some(sink) = &self.events {
            sink.publish(event).await;
        }
    }
}

fn require_text(value: Option<&str>, field: &str, fields: &mut Vec<String>) -> Option<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => {
            fields.push(field.to_string());
            None
        }
    }
}

/// Validates the checkout payload, collecting every offending field before
/// reporting, and normalizes amounts to two fraction digits.
fn validate_new_order(req: &NewOrderRequest) -> Result<NewOrder, ServiceError> {
    let mut fields = Vec::new();

    if req.items.is_empty() {
        fields.push("items".to_string());
    }
    for (i, item) in req.items.iter().enumerate() {
        if item.name.trim().is_empty() {
            fields.push(format!("items[{i}].name"));
        }
        if item.quantity < 1 {
            fields.push(format!("items[{i}].quantity"));
        }
        if item.price < Decimal::ZERO {
            fields.push(format!("items[{i}].price"));
        }
    }

    let total_amount = match req.total_amount {
        Some(total) if total > Decimal::ZERO => Some(total.round_dp(2)),
        _ => {
            fields.push("totalAmount".to_string());
            None
        }
    };

    let delivery_address = require_text(req.delivery_address.as_deref(), "deliveryAddress", &mut fields);
    let customer_name = require_text(req.customer_name.as_deref(), "customerName", &mut fields);
    let customer_phone = require_text(req.customer_phone.as_deref(), "customerPhone", &mut fields);

    let payment_method = match req.payment_method.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => match PaymentMethod::from_str(raw) {
            Ok(method) => Some(method),
            Err(_) => {
                fields.push("paymentMethod".to_string());
                None
            }
        },
        _ => {
            fields.push("paymentMethod".to_string());
            None
        }
    };

    // Every collected value is Some exactly when no field was recorded.
    match (
        total_amount,
        delivery_address,
        customer_name,
        customer_phone,
        payment_method,
    ) {
        (
            Some(total_amount),
            Some(delivery_address),
            Some(customer_name),
            Some(customer_phone),
            Some(payment_method),
        ) if fields.is_empty() => Ok(NewOrder {
            items: req
                .items
                .iter()
                .map(|item| model::OrderItem {
                    name: item.name.trim().to_string(),
                    quantity: item.quantity,
                    price: item.price.round_dp(2),
                })
                .collect(),
            total_amount,
            delivery_address,
            payment_method,
            customer_name,
            customer_phone,
            special_instructions: req
                .special_instructions
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }),
        _ => Err(ServiceError::Validation { fields }),
    }
}

#[async_trait]
impl<R, M> OrderService for OrderServiceImpl<R, M>
where
    R: OrdersRepository,
    M: MenuRepository,
{
    #[instrument(skip(self, req), fields(user_id))]
    async fn place_order(&self, user_id: i64, req: NewOrderRequest) -> Result<Order, ServiceError> {
        let new_order = validate_new_order(&req)?;
        let order = self.orders_repo.create(user_id, &new_order).await?;
        self.emit(OrderEvent::created(order.clone())).await;
        Ok(order)
    }

    #[instrument(skip(self))]
    async fn change_status(
        &self,
        order_id: i64,
        requested: &str,
        payment_confirmed: bool,
        actor: Option<i64>,
    ) -> Result<Order, ServiceError> {
        let requested: OrderStatus = requested
            .parse()
            .map_err(|e: model::ParseEnumError| ServiceError::UnknownStatus(e.value))?;
        let order = self
            .orders_repo
            .update_status(order_id, requested, payment_confirmed, actor)
            .await?;
        self.emit(OrderEvent::status_changed(order.clone())).await;
        Ok(order)
    }

    #[instrument(skip(self))]
    async fn my_orders(&self, user_id: i64) -> Result<Vec<Order>, ServiceError> {
        Ok(self.orders_repo.find_by_user(user_id).await?)
    }

    #[instrument(skip(self))]
    async fn get_order(
        &self,
        order_id: i64,
        user_id: Option<i64>,
    ) -> Result<Order, ServiceError> {
        Ok(self.orders_repo.find_by_id(order_id, user_id).await?)
    }

    #[instrument(skip(self))]
    async fn all_orders(&self) -> Result<Vec<Order>, ServiceError> {
        Ok(self.orders_repo.list_all().await?)
    }

    #[instrument(skip(self))]
    async fn complete_payment(&self, order_id: i64) -> Result<Order, ServiceError> {
        let order = self.orders_repo.complete_payment(order_id).await?;
        if order.payment_status != PaymentStatus::Completed {
            warn!(order_id, "payment completion left payment status unsettled");
        }
        self.emit(OrderEvent::status_changed(order.clone())).await;
        Ok(order)
    }

    #[instrument(skip(self))]
    async fn menu(&self) -> Result<Vec<MenuItem>, ServiceError> {
        Ok(self.menu_repo.list().await?)
    }

    #[instrument(skip(self))]
    async fn dashboard(&self, range: DateRange) -> Result<DashboardStats, ServiceError> {
        let since = range.since(Utc::now());
        Ok(self.orders_repo.dashboard_stats(since).await?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use model::{DailyStat, OrderItem, PopularItem};
    use repository::RepositoryError;
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory stand-in for the Postgres repository, mirroring its
    /// contract: same policy checks, same error kinds.
    pub(crate) struct MemOrdersRepository {
        pub(crate) orders: Mutex<Vec<Order>>,
        known_items: Vec<String>,
        pub(crate) create_calls: AtomicUsize,
        pub(crate) update_calls: AtomicUsize,
    }

    impl MemOrdersRepository {
        pub(crate) fn new(known_items: &[&str]) -> Self {
            Self {
                orders: Mutex::new(Vec::new()),
                known_items: known_items.iter().map(|s| s.to_string()).collect(),
                create_calls: AtomicUsize::new(0),
                update_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl OrdersRepository for MemOrdersRepository {
        async fn create(
            &self,
            user_id: i64,
            new_order: &NewOrder,
        ) -> Result<Order, RepositoryError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            for item in &new_order.items {
                if !self.known_items.contains(&item.name) {
                    return Err(RepositoryError::UnknownItem(item.name.clone()));
                }
            }
            let mut orders = self.orders.lock().unwrap();
            let order = Order {
                id: orders.len() as i64 + 1,
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
                created_at: Utc::now(),
                cancelled_at: None,
                cancelled_by: None,
            };
            orders.push(order.clone());
            Ok(order)
        }

        async fn list_all(&self) -> Result<Vec<Order>, RepositoryError> {
            let mut orders = self.orders.lock().unwrap().clone();
            orders.reverse();
            Ok(orders)
        }

        async fn find_by_user(&self, user_id: i64) -> Result<Vec<Order>, RepositoryError> {
            let mut orders: Vec<Order> = self
                .orders
                .lock()
                .unwrap()
                .iter()
                .filter(|o| o.user_id == user_id)
                .cloned()
                .collect();
            orders.reverse();
            Ok(orders)
        }

        async fn find_by_id(
            &self,
            order_id: i64,
            user_id: Option<i64>,
        ) -> Result<Order, RepositoryError> {
            self.orders
                .lock()
                .unwrap()
                .iter()
                .find(|o| o.id == order_id && user_id.is_none_or(|uid| o.user_id == uid))
                .cloned()
                .ok_or(RepositoryError::NotFound)
        }

        async fn update_status(
            &self,
            order_id: i64,
            requested: OrderStatus,
            payment_confirmed: bool,
            actor: Option<i64>,
        ) -> Result<Order, RepositoryError> {
            self.update_calls.fetch_add(1, Ordering::SeqCst);
            let mut orders = self.orders.lock().unwrap();
            let order = orders
                .iter_mut()
                .find(|o| o.id == order_id)
                .ok_or(RepositoryError::NotFound)?;
            if !order.status.can_transition_to(requested) {
                return Err(RepositoryError::InvalidTransition {
                    from: order.status,
                    requested,
                });
            }
            if requested == OrderStatus::Cancelled && order.status != OrderStatus::Cancelled {
                order.cancelled_at = Some(Utc::now());
                order.cancelled_by = actor;
            }
            order.status = requested;
            if requested == OrderStatus::Delivered {
                order.payment_status = PaymentStatus::on_delivery(
                    order.payment_method,
                    payment_confirmed,
                    order.payment_status,
                );
            }
            Ok(order.clone())
        }

        async fn update_payment_status(
            &self,
            order_id: i64,
            status: PaymentStatus,
        ) -> Result<Order, RepositoryError> {
            let mut orders = self.orders.lock().unwrap();
            let order = orders
                .iter_mut()
                .find(|o| o.id == order_id)
                .ok_or(RepositoryError::NotFound)?;
            order.payment_status = status;
            Ok(order.clone())
        }

        async fn complete_payment(&self, order_id: i64) -> Result<Order, RepositoryError> {
            let mut orders = self.orders.lock().unwrap();
            let order = orders
                .iter_mut()
                .find(|o| o.id == order_id)
                .ok_or(RepositoryError::NotFound)?;
            order.payment_status = PaymentStatus::Completed;
            if order.status != OrderStatus::Confirmed
                && order.status.can_transition_to(OrderStatus::Confirmed)
            {
                order.status = OrderStatus::Confirmed;
            }
            Ok(order.clone())
        }

        async fn dashboard_stats(
            &self,
            since: DateTime<Utc>,
        ) -> Result<DashboardStats, RepositoryError> {
            let orders = self.orders.lock().unwrap();
            let period: Vec<&Order> =
                orders.iter().filter(|o| o.created_at >= since).collect();

            let mut status_counts = BTreeMap::new();
            for order in orders.iter() {
                *status_counts.entry(order.status).or_insert(0) += 1;
            }

            let mut by_name: BTreeMap<String, (i64, Decimal)> = BTreeMap::new();
            for order in &period {
                for item in &order.items {
                    let entry = by_name.entry(item.name.clone()).or_default();
                    entry.0 += i64::from(item.quantity);
                    entry.1 += item.price * Decimal::from(item.quantity);
                }
            }
            let mut popular_items: Vec<PopularItem> = by_name
                .into_iter()
                .map(|(name, (count, revenue))| PopularItem { name, count, revenue })
                .collect();
            popular_items.sort_by(|a, b| b.count.cmp(&a.count));
            popular_items.truncate(5);

            let mut daily: BTreeMap<_, DailyStat> = BTreeMap::new();
            for order in &period {
                let date = order.created_at.date_naive();
                let entry = daily.entry(date).or_insert(DailyStat {
                    date,
                    orders: 0,
                    revenue: Decimal::ZERO,
                });
                entry.orders += 1;
                entry.revenue += order.total_amount;
            }

            Ok(DashboardStats {
                total_orders: orders.len() as i64,
                period_orders: period.len() as i64,
                total_revenue: orders.iter().map(|o| o.total_amount).sum(),
                period_revenue: period.iter().map(|o| o.total_amount).sum(),
                status_counts,
                popular_items,
                daily: daily.into_values().collect(),
            })
        }
    }

    pub(crate) struct MemMenuRepository;

    #[async_trait]
    impl MenuRepository for MemMenuRepository {
        async fn list(&self) -> Result<Vec<MenuItem>, RepositoryError> {
            Ok(vec![MenuItem {
                id: 1,
                name: "Classic Beef Burger".into(),
                price: Decimal::new(19900, 2),
                category: "burgers".into(),
                available: true,
            }])
        }
    }

    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub(crate) events: Mutex<Vec<OrderEvent>>,
    }

    #[async_trait]
    impl OrderEventSink for RecordingSink {
        async fn publish(&self, event: OrderEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    pub(crate) fn checkout_request() -> NewOrderRequest {
        NewOrderRequest {
            items: vec![
                OrderItem {
                    name: "Classic Beef Burger".into(),
                    quantity: 2,
                    price: Decimal::new(19900, 2),
                },
                OrderItem {
                    name: "French Fries".into(),
                    quantity: 1,
                    price: Decimal::new(6000, 2),
                },
            ],
            total_amount: Some(Decimal::new(45800, 2)),
            delivery_address: Some("House 12, Road 5".into()),
            payment_method: Some("cash".into()),
            customer_name: Some("Test Customer".into()),
            customer_phone: Some("+8801700000000".into()),
            special_instructions: None,
        }
    }

    fn service_with(
        repo: MemOrdersRepository,
    ) -> (
        OrderServiceImpl<Arc<MemOrdersRepository>, MemMenuRepository>,
        Arc<MemOrdersRepository>,
        Arc<RecordingSink>,
    ) {
        let repo = Arc::new(repo);
        let sink = Arc::new(RecordingSink::default());
        let service = OrderServiceImpl::new(
            repo.clone(),
            MemMenuRepository,
            Some(sink.clone() as Arc<dyn OrderEventSink>),
        );
        (service, repo, sink)
    }

    fn all_known() -> MemOrdersRepository {
        MemOrdersRepository::new(&["Classic Beef Burger", "French Fries"])
    }

    #[tokio::test]
    async fn test_place_order_persists_and_notifies() {
        let (service, repo, sink) = service_with(all_known());
        let order = service.place_order(7, checkout_request()).await.unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.total_amount, Decimal::new(45800, 2));
        assert_eq!(order.items.len(), 2);
        assert_eq!(repo.create_calls.load(Ordering::SeqCst), 1);

        let events = sink.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, model::OrderEventKind::Created);
        assert_eq!(events[0].order.id, order.id);
    }

    #[tokio::test]
    async fn test_place_order_empty_cart_rejected_before_storage() {
        let (service, repo, sink) = service_with(all_known());
        let mut req = checkout_request();
        req.items.clear();

        let err = service.place_order(1, req).await.unwrap_err();
        match err {
            ServiceError::Validation { fields } => assert!(fields.contains(&"items".to_string())),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(repo.create_calls.load(Ordering::SeqCst), 0);
        assert!(sink.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_place_order_reports_every_missing_field() {
        let (service, _repo, _sink) = service_with(all_known());
        let req = NewOrderRequest {
            items: vec![OrderItem {
                name: "Classic Beef Burger".into(),
                quantity: 0,
                price: Decimal::new(19900, 2),
            }],
            payment_method: Some("bitcoin".into()),
            ..Default::default()
        };

        let err = service.place_order(1, req).await.unwrap_err();
        let ServiceError::Validation { fields } = err else {
            panic!("expected validation error");
        };
        for expected in [
            "items[0].quantity",
            "totalAmount",
            "deliveryAddress",
            "paymentMethod",
            "customerName",
            "customerPhone",
        ] {
            assert!(fields.contains(&expected.to_string()), "missing {expected}: {fields:?}");
        }
    }

    #[tokio::test]
    async fn test_place_order_unknown_item_maps_to_validation() {
        let (service, _repo, sink) = service_with(MemOrdersRepository::new(&["French Fries"]));
        let err = service.place_order(1, checkout_request()).await.unwrap_err();
        let ServiceError::Validation { fields } = err else {
            panic!("expected validation error");
        };
        assert!(fields[0].contains("Classic Beef Burger"));
        assert!(sink.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_change_status_unknown_value_rejected_before_repository() {
        let (service, repo, _sink) = service_with(all_known());
        let err = service
            .change_status(1, "preparing", false, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::UnknownStatus(v) if v == "preparing"));
        assert_eq!(repo.update_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_confirm_then_backwards_transition_rejected() {
        let (service, _repo, _sink) = service_with(all_known());
        let order = service.place_order(1, checkout_request()).await.unwrap();

        let confirmed = service
            .change_status(order.id, "confirmed", false, Some(99))
            .await
            .unwrap();
        assert_eq!(confirmed.status, OrderStatus::Confirmed);

        let err = service
            .change_status(order.id, "pending", false, Some(99))
            .await
            .unwrap_err();
        match err {
            ServiceError::InvalidTransition { from, requested } => {
                assert_eq!(from, OrderStatus::Confirmed);
                assert_eq!(requested, OrderStatus::Pending);
            }
            other => panic!("expected invalid transition, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cash_delivery_without_confirmation_keeps_payment_pending() {
        let (service, _repo, _sink) = service_with(all_known());
        let order = service.place_order(1, checkout_request()).await.unwrap();
        service
            .change_status(order.id, "confirmed", false, None)
            .await
            .unwrap();
        service
            .change_status(order.id, "out_for_delivery", false, None)
            .await
            .unwrap();

        let delivered = service
            .change_status(order.id, "delivered", false, None)
            .await
            .unwrap();
        assert_eq!(delivered.status, OrderStatus::Delivered);
        assert_eq!(delivered.payment_status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_delivery_with_confirmation_completes_payment() {
        let (service, _repo, _sink) = service_with(all_known());
        let order = service.place_order(1, checkout_request()).await.unwrap();
        service
            .change_status(order.id, "confirmed", false, None)
            .await
            .unwrap();
        service
            .change_status(order.id, "out_for_delivery", false, None)
            .await
            .unwrap();

        let delivered = service
            .change_status(order.id, "delivered", true, None)
            .await
            .unwrap();
        assert_eq!(delivered.payment_status, PaymentStatus::Completed);
    }

    #[tokio::test]
    async fn test_cancellation_records_actor() {
        let (service, _repo, sink) = service_with(all_known());
        let order = service.place_order(1, checkout_request()).await.unwrap();

        let cancelled = service
            .change_status(order.id, "cancelled", false, Some(42))
            .await
            .unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(cancelled.cancelled_by, Some(42));
        assert!(cancelled.cancelled_at.is_some());

        let events = sink.events.lock().unwrap();
        assert_eq!(events.last().unwrap().kind, model::OrderEventKind::StatusChanged);
    }

    #[tokio::test]
    async fn test_get_order_enforces_ownership() {
        let (service, _repo, _sink) = service_with(all_known());
        let order = service.place_order(1, checkout_request()).await.unwrap();

        assert!(service.get_order(order.id, Some(1)).await.is_ok());
        let err = service.get_order(order.id, Some(2)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));
        // Administrative lookup without a user id still succeeds.
        assert!(service.get_order(order.id, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_complete_payment_confirms_pending_order_only() {
        let (service, _repo, _sink) = service_with(all_known());
        let order = service.place_order(1, checkout_request()).await.unwrap();

        let paid = service.complete_payment(order.id).await.unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Completed);
        assert_eq!(paid.status, OrderStatus::Confirmed);

        // A second callback is a no-op on the order status.
        let again = service.complete_payment(order.id).await.unwrap();
        assert_eq!(again.status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_change_status_missing_order_is_not_found() {
        let (service, _repo, _sink) = service_with(all_known());
        let err = service
            .change_status(404, "confirmed", false, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));
    }

    #[tokio::test]
    async fn test_menu_lists_catalog() {
        let (service, _repo, _sink) = service_with(all_known());
        let menu = service.menu().await.unwrap();
        assert_eq!(menu.len(), 1);
        assert_eq!(menu[0].name, "Classic Beef Burger");
    }

    #[tokio::test]
    async fn test_dashboard_counts_orders_and_revenue() {
        let (service, _repo, _sink) = service_with(all_known());
        service.place_order(1, checkout_request()).await.unwrap();
        let second = service.place_order(2, checkout_request()).await.unwrap();
        service
            .change_status(second.id, "confirmed", false, None)
            .await
            .unwrap();

        let stats = service.dashboard(DateRange::Today).await.unwrap();
        assert_eq!(stats.total_orders, 2);
        assert_eq!(stats.period_orders, 2);
        assert_eq!(stats.total_revenue, Decimal::new(91600, 2));
        assert_eq!(stats.status_counts.get(&OrderStatus::Pending), Some(&1));
        assert_eq!(stats.status_counts.get(&OrderStatus::Confirmed), Some(&1));
        // Burgers sell two per order, fries one.
        assert_eq!(stats.popular_items[0].name, "Classic Beef Burger");
        assert_eq!(stats.popular_items[0].count, 4);
        assert_eq!(stats.daily.len(), 1);
        assert_eq!(stats.daily[0].orders, 2);
    }
}

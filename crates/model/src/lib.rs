//! Domain types for the restaurant ordering backend.
//!
//! Orders, their line items, the menu catalog, combo deals, customer
//! reviews, and the request/event shapes exchanged with the HTTP layer and
//! the notification topic. The status enumerations and transition policy
//! live in [`status`].

mod combo;
mod review;
mod stats;
mod status;

pub use combo::{
    ComboDeal, ComboDealChanges, ComboDealItem, ComboDealUpdateRequest, NewComboDeal,
    NewComboDealRequest, NewComboItem,
};
pub use review::{NewReview, NewReviewRequest, Review, ReviewPage, ReviewStats, ReviewUpdateRequest};
pub use stats::{DailyStat, DashboardStats, DateRange, PopularItem};
pub use status::{OrderStatus, ParseEnumError, PaymentMethod, PaymentStatus};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order — the main aggregate. Created atomically with all of its line
/// items; after creation only the status fields and the cancellation
/// metadata ever change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: i64,
    #[serde(rename = "user_id")]
    pub user_id: i64,
    pub items: Vec<OrderItem>,
    #[serde(rename = "total_amount")]
    pub total_amount: Decimal,
    #[serde(rename = "delivery_address")]
    pub delivery_address: String,
    #[serde(rename = "payment_method")]
    pub payment_method: PaymentMethod,
    #[serde(rename = "customer_name")]
    pub customer_name: String,
    #[serde(rename = "customer_phone")]
    pub customer_phone: String,
    #[serde(rename = "special_instructions")]
    pub special_instructions: Option<String>,
    pub status: OrderStatus,
    #[serde(rename = "payment_status")]
    pub payment_status: PaymentStatus,
    #[serde(rename = "created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "cancelled_at")]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(rename = "cancelled_by")]
    pub cancelled_by: Option<i64>,
}

/// One priced, quantified line belonging to exactly one order. The name and
/// unit price are denormalized copies taken at order time, so later menu
/// edits never rewrite order history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub name: String,
    pub quantity: i32,
    pub price: Decimal,
}

/// A catalog entry the storefront browses and cart items resolve against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    pub price: Decimal,
    pub category: String,
    pub available: bool,
}

/// Checkout payload as submitted by the storefront.
///
/// Every scalar is optional at the wire level so that validation can report
/// all missing fields in one pass instead of failing on the first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewOrderRequest {
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(rename = "totalAmount")]
    pub total_amount: Option<Decimal>,
    #[serde(rename = "deliveryAddress")]
    pub delivery_address: Option<String>,
    #[serde(rename = "paymentMethod")]
    pub payment_method: Option<String>,
    #[serde(rename = "customerName")]
    pub customer_name: Option<String>,
    #[serde(rename = "customerPhone")]
    pub customer_phone: Option<String>,
    #[serde(rename = "specialInstructions")]
    pub special_instructions: Option<String>,
}

/// A checkout payload that already passed service-level validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub items: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub delivery_address: String,
    pub payment_method: PaymentMethod,
    pub customer_name: String,
    pub customer_phone: String,
    pub special_instructions: Option<String>,
}

/// Outbound notification published after a successful order mutation.
/// At-most-once, fire-and-forget: dashboards subscribed to the topic see it,
/// nobody acknowledges it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    #[serde(rename = "event_id")]
    pub event_id: Uuid,
    pub kind: OrderEventKind,
    #[serde(rename = "occurred_at")]
    pub occurred_at: DateTime<Utc>,
    pub order: Order,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderEventKind {
    Created,
    StatusChanged,
}

impl OrderEvent {
    pub fn created(order: Order) -> Self {
        Self::new(OrderEventKind::Created, order)
    }

    pub fn status_changed(order: Order) -> Self {
        Self::new(OrderEventKind::StatusChanged, order)
    }

    fn new(kind: OrderEventKind, order: Order) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            kind,
            occurred_at: Utc::now(),
            order,
        }
    }
}

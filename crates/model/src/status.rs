//! Order lifecycle enumerations and the transition policy.
//!
//! The transition table here is the single source of truth for the whole
//! system; the admin UI receives the same enumeration instead of keeping
//! its own copy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when a wire string does not name a known enumeration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Lifecycle state of an order.
///
/// Terminal states are `Delivered` and `Cancelled`; the only cycles in the
/// transition graph are self-loops (idempotent no-op updates).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Newly placed, awaiting confirmation.
    Pending,
    /// Accepted by an operator.
    Confirmed,
    /// Dispatched to the customer.
    OutForDelivery,
    /// Fulfilled. Terminal.
    Delivered,
    /// Aborted. Terminal.
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Whether moving from `self` to `requested` is a legal transition.
    ///
    /// Pure and side-effect-free. Self-transitions are always permitted so
    /// that repeated updates to the same status stay idempotent.
    pub fn can_transition_to(self, requested: OrderStatus) -> bool {
        use OrderStatus::*;
        if self == requested {
            return true;
        }
        matches!(
            (self, requested),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, OutForDelivery)
                | (Confirmed, Cancelled)
                | (OutForDelivery, Delivered)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "out_for_delivery" => Ok(OrderStatus::OutForDelivery),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(ParseEnumError {
                kind: "order status",
                value: other.to_string(),
            }),
        }
    }
}

/// Settlement state of an order, orthogonal to [`OrderStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
        }
    }

    /// Payment status implied by a delivery confirmation.
    ///
    /// An explicit operator confirmation settles the payment regardless of
    /// method. Cash on delivery with no confirmation means the cash has not
    /// been collected yet, so the payment goes back to pending. Any other
    /// method without confirmation is left as it was.
    pub fn on_delivery(method: PaymentMethod, payment_confirmed: bool, current: PaymentStatus) -> PaymentStatus {
        if payment_confirmed {
            PaymentStatus::Completed
        } else if method == PaymentMethod::Cash {
            PaymentStatus::Pending
        } else {
            current
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            other => Err(ParseEnumError {
                kind: "payment status",
                value: other.to_string(),
            }),
        }
    }
}

/// How the customer pays. `Cash` is cash on delivery; `Nagad` and `Rocket`
/// are the two mobile wallets accepted by the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Nagad,
    Rocket,
    Card,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Nagad => "nagad",
            PaymentMethod::Rocket => "rocket",
            PaymentMethod::Card => "card",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "nagad" => Ok(PaymentMethod::Nagad),
            "rocket" => Ok(PaymentMethod::Rocket),
            "card" => Ok(PaymentMethod::Card),
            other => Err(ParseEnumError {
                kind: "payment method",
                value: other.to_string(),
            }),
        }
    }
}

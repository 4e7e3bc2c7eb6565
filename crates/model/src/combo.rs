//! Combo deals: a priced bundle of menu items curated by the operators.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A bundle offered at its own price. Items reference the menu catalog by
/// id; their display names are joined in at read time so catalog renames
/// show through immediately.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComboDeal {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub available: bool,
    pub items: Vec<ComboDealItem>,
    pub created_at: DateTime<Utc>,
}

/// One bundled menu item with its quantity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComboDealItem {
    pub menu_item_id: i64,
    pub name: String,
    pub quantity: i32,
}

/// Line of a combo-deal submission, referencing the catalog by id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewComboItem {
    pub menu_item_id: i64,
    pub quantity: i32,
}

/// Combo-deal create payload. Scalars are optional at the wire level so
/// validation can report every offending field in one pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewComboDealRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub available: Option<bool>,
    #[serde(default)]
    pub items: Vec<NewComboItem>,
}

/// A combo-deal submission that already passed service-level validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewComboDeal {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub available: bool,
    pub items: Vec<NewComboItem>,
}

/// Full replacement of a combo deal's scalar fields. The bundled items are
/// fixed at creation; updates only reprice, rename, or toggle the deal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComboDealUpdateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub available: Option<bool>,
}

/// Validated scalar changes applied by an update.
#[derive(Debug, Clone, PartialEq)]
pub struct ComboDealChanges {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub available: bool,
}

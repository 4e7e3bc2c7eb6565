//! Combo-deal catalog management (admin-facing).

use async_trait::async_trait;
use model::{ComboDeal, ComboDealChanges, ComboDealUpdateRequest, NewComboDeal, NewComboDealRequest};
use repository::CombosRepository;
use rust_decimal::Decimal;
use tracing::instrument;

use crate::ServiceError;

/// Boundary operations for combo deals.
#[async_trait]
pub trait ComboService: Send + Sync {
    /// Validates the submission and atomically persists the deal with its
    /// bundled items.
    async fn create_combo(&self, req: NewComboDealRequest) -> Result<ComboDeal, ServiceError>;

    /// Every deal with its bundled items, newest first.
    async fn list_combos(&self) -> Result<Vec<ComboDeal>, ServiceError>;

    /// Replaces the deal's scalar fields; the bundle itself is fixed at
    /// creation.
    async fn update_combo(
        &self,
        deal_id: i64,
        req: ComboDealUpdateRequest,
    ) -> Result<ComboDeal, ServiceError>;

    async fn delete_combo(&self, deal_id: i64) -> Result<(), ServiceError>;
}

/// Implementation of [`ComboService`] over an injected repository.
pub struct ComboServiceImpl<C> {
    combos_repo: C,
}

impl<C: CombosRepository> ComboServiceImpl<C> {
    pub fn new(combos_repo: C) -> Self {
        Self { combos_repo }
    }
}

fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

/// Validates the scalar fields shared by create and update, collecting
/// every offending field.
fn validate_scalars(
    name: Option<&str>,
    price: Option<Decimal>,
    fields: &mut Vec<String>,
) -> (Option<String>, Option<Decimal>) {
    let name = match name.map(str::trim) {
        Some(n) if !n.is_empty() => Some(n.to_string()),
        _ => {
            fields.push("name".to_string());
            None
        }
    };
    let price = match price {
        Some(p) if p > Decimal::ZERO => Some(p.round_dp(2)),
        _ => {
            fields.push("price".to_string());
            None
        }
    };
    (name, price)
}

fn validate_new_deal(req: &NewComboDealRequest) -> Result<NewComboDeal, ServiceError> {
    let mut fields = Vec::new();
    let (name, price) = validate_scalars(req.name.as_deref(), req.price, &mut fields);

    for (i, item) in req.items.iter().enumerate() {
        if item.menu_item_id < 1 {
            fields.push(format!("items[{i}].menu_item_id"));
        }
        if item.quantity < 1 {
            fields.push(format!("items[{i}].quantity"));
        }
    }

    match (name, price) {
        (Some(name), Some(price)) if fields.is_empty() => Ok(NewComboDeal {
            name,
            description: normalize_description(req.description.as_deref()),
            price,
            available: req.available.unwrap_or(true),
            items: req.items.clone(),
        }),
        _ => Err(ServiceError::Validation { fields }),
    }
}

fn validate_changes(req: &ComboDealUpdateRequest) -> Result<ComboDealChanges, ServiceError> {
    let mut fields = Vec::new();
    let (name, price) = validate_scalars(req.name.as_deref(), req.price, &mut fields);
    let available = match req.available {
        Some(available) => Some(available),
        None => {
            fields.push("available".to_string());
            None
        }
    };

    match (name, price, available) {
        (Some(name), Some(price), Some(available)) if fields.is_empty() => Ok(ComboDealChanges {
            name,
            description: normalize_description(req.description.as_deref()),
            price,
            available,
        }),
        _ => Err(ServiceError::Validation { fields }),
    }
}

#[async_trait]
impl<C: CombosRepository> ComboService for ComboServiceImpl<C> {
    #[instrument(skip(self, req))]
    async fn create_combo(&self, req: NewComboDealRequest) -> Result<ComboDeal, ServiceError> {
        let new = validate_new_deal(&req)?;
        Ok(self.combos_repo.create(&new).await?)
    }

    #[instrument(skip(self))]
    async fn list_combos(&self) -> Result<Vec<ComboDeal>, ServiceError> {
        Ok(self.combos_repo.list_all().await?)
    }

    #[instrument(skip(self, req))]
    async fn update_combo(
        &self,
        deal_id: i64,
        req: ComboDealUpdateRequest,
    ) -> Result<ComboDeal, ServiceError> {
        let changes = validate_changes(&req)?;
        Ok(self.combos_repo.update(deal_id, &changes).await?)
    }

    #[instrument(skip(self))]
    async fn delete_combo(&self, deal_id: i64) -> Result<(), ServiceError> {
        Ok(self.combos_repo.delete(deal_id).await?)
    }
}

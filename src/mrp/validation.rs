//! Field validation for records entered by hand or imported

use chrono::Utc;
use thiserror::Error;

use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::store::{RecordStore, RecordStoreExt, StoreError};
use crate::entities::{BomComponent, InventoryItem};

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' is invalid: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Reject an empty or whitespace-only string
pub fn require(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

/// Parse an optional numeric field; blank is `None`, anything unparsable is an error
pub fn parse_number(field: &'static str, raw: Option<&str>) -> Result<Option<f64>, ValidationError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    raw.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(Some)
        .ok_or_else(|| ValidationError::Invalid {
            field,
            reason: format!("'{}' is not a number", raw),
        })
}

/// Parse an optional whole-day count
pub fn parse_days(field: &'static str, raw: Option<&str>) -> Result<Option<u32>, ValidationError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    raw.parse::<u32>().map(Some).map_err(|_| ValidationError::Invalid {
        field,
        reason: format!("'{}' is not a whole number of days", raw),
    })
}

fn non_negative(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value < 0.0 {
        return Err(ValidationError::Invalid {
            field,
            reason: format!("{} is negative", value),
        });
    }
    Ok(value)
}

/// Build a BOM line the way the CSV importer would read it back: trimmed
/// text and a finite, positive quantity. Blank name falls back to the SKU
/// and blank unit to `ea`.
pub fn bom_line(sku: &str, name: &str, quantity: f64, unit: &str) -> Result<BomComponent, ValidationError> {
    let sku = require("sku", sku)?;
    if !(quantity.is_finite() && quantity > 0.0) {
        return Err(ValidationError::Invalid {
            field: "quantity",
            reason: format!("{} is not a positive number", quantity),
        });
    }
    let name = match name.trim() {
        "" => sku.clone(),
        n => n.to_string(),
    };
    let unit = match unit.trim() {
        "" => "ea".to_string(),
        u => u.to_string(),
    };
    Ok(BomComponent::new(sku, name, quantity, unit))
}

/// Form input for a new inventory item
#[derive(Debug, Clone, Default)]
pub struct NewInventoryItem {
    pub sku: String,
    pub name: String,
    pub category: Option<String>,
    pub quantity_on_hand: f64,
    pub reorder_point: f64,
    pub reorder_quantity: f64,
    pub moq: Option<f64>,
    pub unit: Option<String>,
    pub unit_cost: Option<f64>,
    pub vendor_id: Option<EntityId>,
    pub lead_time_days: Option<u32>,
}

impl NewInventoryItem {
    /// Check the form and build the record to insert
    pub fn validate(&self) -> Result<InventoryItem, ValidationError> {
        let sku = require("sku", &self.sku)?;
        let name = require("name", &self.name)?;
        let quantity_on_hand = non_negative("quantity_on_hand", self.quantity_on_hand)?;
        let reorder_point = non_negative("reorder_point", self.reorder_point)?;
        let reorder_quantity = non_negative("reorder_quantity", self.reorder_quantity)?;
        if let Some(moq) = self.moq {
            non_negative("moq", moq)?;
        }
        if let Some(cost) = self.unit_cost {
            non_negative("unit_cost", cost)?;
        }

        let now = Utc::now();
        Ok(InventoryItem {
            id: EntityId::new(EntityPrefix::Inv),
            sku,
            name,
            category: self.category.clone().filter(|c| !c.trim().is_empty()),
            quantity_on_hand,
            reorder_point,
            reorder_quantity,
            moq: self.moq,
            unit: self
                .unit
                .clone()
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| "ea".to_string()),
            unit_cost: self.unit_cost,
            vendor_id: self.vendor_id.clone(),
            lead_time_days: self.lead_time_days,
            seasonal_factors: None,
            created: now,
            updated: now,
        })
    }
}

#[derive(Debug, Error)]
pub enum CreateError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("an item with SKU '{0}' already exists")]
    DuplicateSku(String),
}

/// Validate a form and insert the resulting item. Nothing is written when
/// validation fails.
pub fn create_inventory_item<S: RecordStore + ?Sized>(
    store: &mut S,
    form: &NewInventoryItem,
) -> Result<InventoryItem, CreateError> {
    let item = form.validate()?;

    let existing: Vec<InventoryItem> = store.list()?;
    if existing.iter().any(|i| i.sku.eq_ignore_ascii_case(&item.sku)) {
        return Err(CreateError::DuplicateSku(item.sku));
    }

    store.insert(&item)?;
    tracing::info!(sku = %item.sku, id = %item.id, "created inventory item");
    Ok(item)
}

//! Inventory item - a stocked raw material, packaging item or finished good

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Record;
use crate::core::identity::EntityId;
use crate::core::store::Table;

/// Stock position relative to the reorder point
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    Critical,
    Low,
    Ok,
}

impl StockStatus {
    /// Classify a stock position.
    ///
    /// Nothing on hand is out of stock; at or below half the reorder point is
    /// critical; below the reorder point is low. Items with no reorder point
    /// are only ever out of stock or ok.
    pub fn classify(on_hand: f64, reorder_point: f64) -> Self {
        if on_hand <= 0.0 {
            StockStatus::OutOfStock
        } else if reorder_point > 0.0 && on_hand <= reorder_point / 2.0 {
            StockStatus::Critical
        } else if on_hand < reorder_point {
            StockStatus::Low
        } else {
            StockStatus::Ok
        }
    }

    /// Whether the item needs replenishment at all
    pub fn needs_reorder(&self) -> bool {
        !matches!(self, StockStatus::Ok)
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockStatus::OutOfStock => write!(f, "out_of_stock"),
            StockStatus::Critical => write!(f, "critical"),
            StockStatus::Low => write!(f, "low"),
            StockStatus::Ok => write!(f, "ok"),
        }
    }
}

fn default_unit() -> String {
    "ea".to_string()
}

/// An inventory item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: EntityId,

    /// Stock keeping unit, unique per item
    pub sku: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default)]
    pub quantity_on_hand: f64,

    #[serde(default)]
    pub reorder_point: f64,

    #[serde(default)]
    pub reorder_quantity: f64,

    /// Minimum order quantity accepted by the vendor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moq: Option<f64>,

    #[serde(default = "default_unit")]
    pub unit: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_cost: Option<f64>,

    /// Preferred vendor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<EntityId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_time_days: Option<u32>,

    /// Twelve monthly demand factors (January first), supplied by forecasting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seasonal_factors: Option<Vec<f64>>,

    pub created: DateTime<Utc>,

    pub updated: DateTime<Utc>,
}

impl InventoryItem {
    pub fn stock_status(&self) -> StockStatus {
        StockStatus::classify(self.quantity_on_hand, self.reorder_point)
    }

    /// Value of stock on hand, if a unit cost is known
    pub fn stock_value(&self) -> Option<f64> {
        self.unit_cost.map(|c| c * self.quantity_on_hand.max(0.0))
    }
}

impl Record for InventoryItem {
    const TABLE: Table = Table::InventoryItems;

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn label(&self) -> String {
        format!("{} ({})", self.name, self.sku)
    }
}

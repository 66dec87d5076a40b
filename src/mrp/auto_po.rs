//! Automatic purchase-order drafting from stock levels

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::entity::Record;
use crate::core::identity::EntityId;
use crate::core::store::{RecordStore, RecordStoreExt, StoreError, Table};
use crate::entities::activity::Severity;
use crate::entities::inventory::StockStatus;
use crate::entities::purchase_order::{PoLine, PurchaseOrder};
use crate::entities::InventoryItem;
use crate::mrp::activity;

/// How depleted an item must be before it is drafted onto a PO
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum AutoPoThreshold {
    /// Out of stock or at/below half the reorder point
    Critical,
    /// Below the reorder point
    #[default]
    Low,
    /// At or below the reorder point
    Reorder,
}

impl AutoPoThreshold {
    pub fn selects(&self, item: &InventoryItem) -> bool {
        let status = item.stock_status();
        match self {
            AutoPoThreshold::Critical => {
                matches!(status, StockStatus::OutOfStock | StockStatus::Critical)
            }
            AutoPoThreshold::Low => status.needs_reorder(),
            AutoPoThreshold::Reorder => {
                status.needs_reorder()
                    || (item.reorder_point > 0.0 && item.quantity_on_hand <= item.reorder_point)
            }
        }
    }
}

impl std::fmt::Display for AutoPoThreshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AutoPoThreshold::Critical => write!(f, "critical"),
            AutoPoThreshold::Low => write!(f, "low"),
            AutoPoThreshold::Reorder => write!(f, "reorder"),
        }
    }
}

const SETTINGS_KEY: &str = "auto_po";

/// Persisted auto-PO preferences, one row in `app_settings`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AutoPoSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub threshold: AutoPoThreshold,
}

impl Record for AutoPoSettings {
    const TABLE: Table = Table::AppSettings;

    fn key(&self) -> String {
        SETTINGS_KEY.to_string()
    }

    fn label(&self) -> String {
        "auto-PO settings".to_string()
    }
}

impl AutoPoSettings {
    /// Stored settings, or defaults when none were saved
    pub fn load<S: RecordStore + ?Sized>(store: &S) -> Result<Self, StoreError> {
        Ok(store.get::<Self>(SETTINGS_KEY)?.unwrap_or_default())
    }

    pub fn save<S: RecordStore + ?Sized>(&self, store: &mut S) -> Result<(), StoreError> {
        store.upsert(self)
    }
}

/// Units to order: the larger of the reorder quantity, the vendor minimum,
/// and the shortfall to the reorder point
pub fn order_quantity(item: &InventoryItem) -> f64 {
    let shortfall = (item.reorder_point - item.quantity_on_hand).max(0.0);
    item.reorder_quantity
        .max(item.moq.unwrap_or(0.0))
        .max(shortfall)
}

#[derive(Debug, Clone)]
pub struct DraftPlan {
    pub vendor_id: EntityId,
    pub lines: Vec<PoLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedItem {
    pub sku: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct AutoPoPlan {
    /// One draft per vendor, ordered by vendor id
    pub drafts: Vec<DraftPlan>,
    pub skipped: Vec<SkippedItem>,
}

/// Drop items already on an open order
pub fn excluding_on_order<'a>(
    items: &'a [InventoryItem],
    orders: &[PurchaseOrder],
) -> Vec<&'a InventoryItem> {
    items
        .iter()
        .filter(|item| {
            !orders.iter().filter(|po| po.status.is_open()).any(|po| {
                po.lines
                    .iter()
                    .any(|l| l.sku.eq_ignore_ascii_case(&item.sku))
            })
        })
        .collect()
}

/// Group qualifying items into per-vendor drafts
pub fn plan_drafts<'a>(
    items: impl IntoIterator<Item = &'a InventoryItem>,
    threshold: AutoPoThreshold,
) -> AutoPoPlan {
    let mut by_vendor: BTreeMap<String, DraftPlan> = BTreeMap::new();
    let mut skipped = Vec::new();

    for item in items.into_iter().filter(|i| threshold.selects(i)) {
        let Some(vendor_id) = item.vendor_id.as_ref() else {
            skipped.push(SkippedItem {
                sku: item.sku.clone(),
                reason: "no vendor assigned".to_string(),
            });
            continue;
        };
        let quantity = order_quantity(item);
        if quantity <= 0.0 {
            skipped.push(SkippedItem {
                sku: item.sku.clone(),
                reason: "no reorder quantity configured".to_string(),
            });
            continue;
        }

        by_vendor
            .entry(vendor_id.to_string())
            .or_insert_with(|| DraftPlan {
                vendor_id: vendor_id.clone(),
                lines: Vec::new(),
            })
            .lines
            .push(PoLine {
                sku: item.sku.clone(),
                name: item.name.clone(),
                quantity,
                unit_price: item.unit_cost.unwrap_or(0.0),
            });
    }

    AutoPoPlan {
        drafts: by_vendor.into_values().collect(),
        skipped,
    }
}

/// Insert one draft PO per planned vendor and log each to the activity stream
pub fn create_drafts<S: RecordStore + ?Sized>(
    store: &mut S,
    plan: &AutoPoPlan,
    today: NaiveDate,
) -> Result<Vec<PurchaseOrder>, StoreError> {
    let mut existing: Vec<PurchaseOrder> = store.list()?;
    let mut created = Vec::new();

    for draft in &plan.drafts {
        let number = PurchaseOrder::next_order_number(&existing, today);
        let mut po = PurchaseOrder::new(number, draft.vendor_id.clone());
        po.lines = draft.lines.clone();
        po.auto_generated = true;
        store.insert(&po)?;

        activity::log(
            store,
            "auto-po",
            &format!("drafted {}", po.order_number),
            Some(&format!("{} line(s), total {:.2}", po.lines.len(), po.total())),
            Severity::Info,
        )?;
        existing.push(po.clone());
        created.push(po);
    }

    Ok(created)
}

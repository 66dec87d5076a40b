//! Purchase order entity type

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Record;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::store::Table;

/// Purchase order lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PoStatus {
    #[default]
    Draft,
    Sent,
    Partial,
    Received,
    Cancelled,
}

impl PoStatus {
    /// Allowed forward moves. Received and cancelled orders are closed.
    pub fn can_transition_to(&self, next: PoStatus) -> bool {
        use PoStatus::*;
        matches!(
            (*self, next),
            (Draft, Sent)
                | (Draft, Cancelled)
                | (Sent, Partial)
                | (Sent, Received)
                | (Sent, Cancelled)
                | (Partial, Received)
                | (Partial, Cancelled)
        )
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, PoStatus::Received | PoStatus::Cancelled)
    }
}

impl std::fmt::Display for PoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoStatus::Draft => write!(f, "draft"),
            PoStatus::Sent => write!(f, "sent"),
            PoStatus::Partial => write!(f, "partial"),
            PoStatus::Received => write!(f, "received"),
            PoStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A single ordered SKU
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoLine {
    pub sku: String,

    pub name: String,

    pub quantity: f64,

    #[serde(default)]
    pub unit_price: f64,
}

impl PoLine {
    pub fn total(&self) -> f64 {
        self.quantity * self.unit_price
    }
}

/// A purchase order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: EntityId,

    /// Human-facing number, e.g. PO-2026-0007
    pub order_number: String,

    pub vendor_id: EntityId,

    #[serde(default)]
    pub status: PoStatus,

    #[serde(default)]
    pub lines: Vec<PoLine>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// Drafted by the auto-PO planner rather than a person
    #[serde(default)]
    pub auto_generated: bool,

    pub created: DateTime<Utc>,

    pub updated: DateTime<Utc>,
}

impl PurchaseOrder {
    pub fn new(order_number: String, vendor_id: EntityId) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(EntityPrefix::Po),
            order_number,
            vendor_id,
            status: PoStatus::Draft,
            lines: Vec::new(),
            expected_date: None,
            notes: None,
            auto_generated: false,
            created: now,
            updated: now,
        }
    }

    pub fn total(&self) -> f64 {
        self.lines.iter().map(PoLine::total).sum()
    }

    /// Next sequential order number for the given year, `PO-<year>-<seq>`
    pub fn next_order_number<'a>(existing: impl IntoIterator<Item = &'a PurchaseOrder>, today: NaiveDate) -> String {
        let year_prefix = format!("PO-{}-", today.year());
        let max_seq = existing
            .into_iter()
            .filter_map(|po| po.order_number.strip_prefix(&year_prefix))
            .filter_map(|seq| seq.parse::<u32>().ok())
            .max()
            .unwrap_or(0);
        format!("{}{:04}", year_prefix, max_seq + 1)
    }
}

impl Record for PurchaseOrder {
    const TABLE: Table = Table::PurchaseOrders;

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn label(&self) -> String {
        self.order_number.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn po(number: &str) -> PurchaseOrder {
        PurchaseOrder::new(number.to_string(), EntityId::new(EntityPrefix::Ven))
    }

    #[test]
    fn test_next_order_number_continues_sequence_for_year() {
        let existing = vec![po("PO-2026-0003"), po("PO-2026-0011"), po("PO-2025-0099")];
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(PurchaseOrder::next_order_number(&existing, today), "PO-2026-0012");
    }

    #[test]
    fn test_next_order_number_starts_at_one() {
        let today = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        let none: Vec<PurchaseOrder> = Vec::new();
        assert_eq!(PurchaseOrder::next_order_number(&none, today), "PO-2027-0001");
    }

    #[test]
    fn test_status_transitions() {
        assert!(PoStatus::Draft.can_transition_to(PoStatus::Sent));
        assert!(PoStatus::Sent.can_transition_to(PoStatus::Partial));
        assert!(PoStatus::Partial.can_transition_to(PoStatus::Received));
        assert!(!PoStatus::Received.can_transition_to(PoStatus::Draft));
        assert!(!PoStatus::Cancelled.can_transition_to(PoStatus::Sent));
        assert!(!PoStatus::Draft.can_transition_to(PoStatus::Received));
    }

    #[test]
    fn test_total() {
        let mut order = po("PO-2026-0001");
        order.lines.push(PoLine {
            sku: "A".into(),
            name: "a".into(),
            quantity: 3.0,
            unit_price: 2.5,
        });
        order.lines.push(PoLine {
            sku: "B".into(),
            name: "b".into(),
            quantity: 1.0,
            unit_price: 10.0,
        });
        assert!((order.total() - 17.5).abs() < 1e-9);
    }
}

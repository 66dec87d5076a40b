//! Three-way match records: purchase order vs. vendor invoice vs. goods receipt
//!
//! Match records are computed elsewhere and imported; this crate only reads
//! them and records a human resolution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Record;
use crate::core::store::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancyKind {
    Quantity,
    Price,
    MissingItem,
    ExtraItem,
    Total,
}

impl std::fmt::Display for DiscrepancyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiscrepancyKind::Quantity => write!(f, "quantity"),
            DiscrepancyKind::Price => write!(f, "price"),
            DiscrepancyKind::MissingItem => write!(f, "missing_item"),
            DiscrepancyKind::ExtraItem => write!(f, "extra_item"),
            DiscrepancyKind::Total => write!(f, "total"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discrepancy {
    pub kind: DiscrepancyKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,

    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Matched,
    #[default]
    Discrepancy,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Matched => write!(f, "matched"),
            MatchStatus::Discrepancy => write!(f, "discrepancy"),
        }
    }
}

/// Where a human left the record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    #[default]
    Pending,
    Approved,
    Rejected,
    Backorder,
    Disputed,
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolution::Pending => write!(f, "pending"),
            Resolution::Approved => write!(f, "approved"),
            Resolution::Rejected => write!(f, "rejected"),
            Resolution::Backorder => write!(f, "backorder"),
            Resolution::Disputed => write!(f, "disputed"),
        }
    }
}

/// A precomputed match result for one purchase order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreeWayMatch {
    /// Purchase order this record reconciles; also the row key
    pub po_id: String,

    pub order_total: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_total: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_total: Option<f64>,

    #[serde(default)]
    pub discrepancies: Vec<Discrepancy>,

    #[serde(default)]
    pub match_status: MatchStatus,

    #[serde(default)]
    pub resolution: Resolution,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_at: Option<DateTime<Utc>>,
}

impl ThreeWayMatch {
    /// Invoice minus order; None until an invoice arrives
    pub fn invoice_variance(&self) -> Option<f64> {
        self.invoice_total.map(|t| t - self.order_total)
    }

    /// Receipt minus order; None until goods are received
    pub fn receipt_variance(&self) -> Option<f64> {
        self.receipt_total.map(|t| t - self.order_total)
    }

    pub fn is_resolved(&self) -> bool {
        self.resolution != Resolution::Pending
    }
}

impl Record for ThreeWayMatch {
    const TABLE: Table = Table::PoThreeWayMatches;

    fn key(&self) -> String {
        self.po_id.clone()
    }

    fn label(&self) -> String {
        format!("match for {}", self.po_id)
    }
}

//! Vendor entity type - suppliers of materials

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Record;
use crate::core::identity::EntityId;
use crate::core::store::Table;

/// A vendor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vendor {
    pub id: EntityId,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Typical days from order to receipt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_time_days: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_terms: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub created: DateTime<Utc>,
}

impl Vendor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(crate::core::identity::EntityPrefix::Ven),
            name: name.into(),
            contact_email: None,
            phone: None,
            website: None,
            address: None,
            lead_time_days: None,
            payment_terms: None,
            notes: None,
            created: Utc::now(),
        }
    }
}

impl Record for Vendor {
    const TABLE: Table = Table::Vendors;

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

//! State product registrations (fertilizer / soil amendment licensing)

use chrono::{NaiveDate, DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Record;
use crate::core::identity::EntityId;
use crate::core::store::Table;

/// Registrations expiring within this many days are flagged
pub const EXPIRING_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Active,
    Expiring,
    Expired,
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationStatus::Active => write!(f, "active"),
            RegistrationStatus::Expiring => write!(f, "expiring"),
            RegistrationStatus::Expired => write!(f, "expired"),
        }
    }
}

/// A product's registration in one state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRegistration {
    pub id: EntityId,

    pub product_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bom_id: Option<EntityId>,

    /// Two-letter state code, upper case
    pub state_code: String,

    pub registration_number: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued: Option<NaiveDate>,

    pub expires: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub created: DateTime<Utc>,
}

impl ProductRegistration {
    pub fn status(&self, today: NaiveDate) -> RegistrationStatus {
        let days_left = (self.expires - today).num_days();
        if days_left < 0 {
            RegistrationStatus::Expired
        } else if days_left <= EXPIRING_WINDOW_DAYS {
            RegistrationStatus::Expiring
        } else {
            RegistrationStatus::Active
        }
    }

    pub fn days_until_expiry(&self, today: NaiveDate) -> i64 {
        (self.expires - today).num_days()
    }
}

impl Record for ProductRegistration {
    const TABLE: Table = Table::ProductRegistrations;

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn label(&self) -> String {
        format!("{} [{}] #{}", self.product_name, self.state_code, self.registration_number)
    }
}

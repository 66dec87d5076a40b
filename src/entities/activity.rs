//! Agent activity stream entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Record;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::store::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Something an automated agent (or a person) did
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentActivity {
    pub id: EntityId,

    /// Who acted, e.g. "auto-po" or a user name
    pub agent: String,

    pub action: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    #[serde(default)]
    pub severity: Severity,

    pub created: DateTime<Utc>,
}

impl AgentActivity {
    pub fn new(agent: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Act),
            agent: agent.into(),
            action: action.into(),
            details: None,
            severity: Severity::Info,
            created: Utc::now(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl Record for AgentActivity {
    const TABLE: Table = Table::AgentActivityStream;

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn label(&self) -> String {
        format!("{}: {}", self.agent, self.action)
    }
}

//! Label artwork files and their upload/scan status

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Record;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::store::Table;

/// Per-file progress through upload and label scanning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    #[default]
    Pending,
    Uploading,
    Scanning,
    Completed,
    Failed,
}

impl UploadStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Completed | UploadStatus::Failed)
    }
}

impl std::fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadStatus::Pending => write!(f, "pending"),
            UploadStatus::Uploading => write!(f, "uploading"),
            UploadStatus::Scanning => write!(f, "scanning"),
            UploadStatus::Completed => write!(f, "completed"),
            UploadStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A label artwork file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artwork {
    pub id: EntityId,

    pub file_name: String,

    /// Location of the stored copy, relative to the project root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,

    /// BOM the label belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bom_id: Option<EntityId>,

    #[serde(default)]
    pub status: UploadStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Ingredient list read off the label, in label order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extracted_ingredients: Vec<String>,

    pub created: DateTime<Utc>,
}

impl Artwork {
    pub fn pending(file_name: impl Into<String>, bom_id: Option<EntityId>) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Art),
            file_name: file_name.into(),
            stored_path: None,
            sha256: None,
            bom_id,
            status: UploadStatus::Pending,
            error: None,
            extracted_ingredients: Vec::new(),
            created: Utc::now(),
        }
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = UploadStatus::Failed;
        self.error = Some(message.into());
    }
}

impl Record for Artwork {
    const TABLE: Table = Table::Artworks;

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn label(&self) -> String {
        self.file_name.clone()
    }
}

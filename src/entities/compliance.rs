//! Ingredient compliance status per state, and state strictness ratings

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Record;
use crate::core::store::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceStatus {
    Compliant,
    Restricted,
    Prohibited,
    Conditional,
    Unknown,
}

impl ComplianceStatus {
    pub fn all() -> &'static [ComplianceStatus] {
        &[
            ComplianceStatus::Compliant,
            ComplianceStatus::Restricted,
            ComplianceStatus::Prohibited,
            ComplianceStatus::Conditional,
            ComplianceStatus::Unknown,
        ]
    }
}

impl std::fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComplianceStatus::Compliant => write!(f, "compliant"),
            ComplianceStatus::Restricted => write!(f, "restricted"),
            ComplianceStatus::Prohibited => write!(f, "prohibited"),
            ComplianceStatus::Conditional => write!(f, "conditional"),
            ComplianceStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Whether a safety data sheet is on file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SdsStatus {
    #[default]
    Missing,
    OnFile,
}

impl std::fmt::Display for SdsStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SdsStatus::Missing => write!(f, "missing"),
            SdsStatus::OnFile => write!(f, "on_file"),
        }
    }
}

fn default_concentration_unit() -> String {
    "percent".to_string()
}

/// Compliance of one ingredient in one state. Unique per (SKU, state).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientCompliance {
    pub ingredient_sku: String,

    pub ingredient_name: String,

    pub state_code: String,

    pub status: ComplianceStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cas_number: Option<String>,

    /// banned, limited_use, special_permit, concentration_limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restriction_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restriction_details: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concentration: Option<f64>,

    #[serde(default = "default_concentration_unit")]
    pub concentration_unit: String,

    /// Legal citation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regulation_code: Option<String>,

    #[serde(default)]
    pub sds_status: SdsStatus,

    pub updated: DateTime<Utc>,
}

impl IngredientCompliance {
    pub fn compose_key(sku: &str, state_code: &str) -> String {
        format!("{}:{}", sku.trim().to_uppercase(), state_code.trim().to_uppercase())
    }
}

impl Record for IngredientCompliance {
    const TABLE: Table = Table::IngredientComplianceStatus;

    fn key(&self) -> String {
        Self::compose_key(&self.ingredient_sku, &self.state_code)
    }

    fn label(&self) -> String {
        format!("{} in {}", self.ingredient_name, self.state_code)
    }
}

/// GHS signal word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SignalWord {
    Danger,
    Warning,
}

impl std::fmt::Display for SignalWord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalWord::Danger => write!(f, "Danger"),
            SignalWord::Warning => write!(f, "Warning"),
        }
    }
}

fn default_sds_source() -> String {
    "manual_entry".to_string()
}

/// The primary safety data sheet for an ingredient. One per SKU.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientSds {
    pub ingredient_sku: String,

    pub ingredient_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cas_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,

    /// Where the document itself lives
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,

    /// uploaded, scraped, api, manual_entry
    #[serde(default = "default_sds_source")]
    pub source: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_word: Option<SignalWord>,

    /// GHS hazard codes, e.g. H302
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hazard_codes: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub precautionary_codes: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hazard_statements: Vec<String>,

    pub updated: DateTime<Utc>,
}

impl IngredientSds {
    pub fn has_hazards(&self) -> bool {
        !self.hazard_codes.is_empty()
    }

    pub fn has_hazard_code(&self, code: &str) -> bool {
        self.hazard_codes
            .iter()
            .any(|c| c.trim().eq_ignore_ascii_case(code.trim()))
    }
}

impl Record for IngredientSds {
    const TABLE: Table = Table::IngredientSdsDocuments;

    fn key(&self) -> String {
        self.ingredient_sku.trim().to_uppercase()
    }

    fn label(&self) -> String {
        format!("SDS for {}", self.ingredient_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StrictnessLevel {
    VeryStrict,
    Strict,
    Moderate,
    Lenient,
    VeryLenient,
}

impl StrictnessLevel {
    /// Strictest first
    pub fn all() -> &'static [StrictnessLevel] {
        &[
            StrictnessLevel::VeryStrict,
            StrictnessLevel::Strict,
            StrictnessLevel::Moderate,
            StrictnessLevel::Lenient,
            StrictnessLevel::VeryLenient,
        ]
    }
}

impl std::fmt::Display for StrictnessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrictnessLevel::VeryStrict => write!(f, "Very Strict"),
            StrictnessLevel::Strict => write!(f, "Strict"),
            StrictnessLevel::Moderate => write!(f, "Moderate"),
            StrictnessLevel::Lenient => write!(f, "Lenient"),
            StrictnessLevel::VeryLenient => write!(f, "Very Lenient"),
        }
    }
}

/// How demanding a state's regulators are
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateRating {
    pub state_code: String,

    pub state_name: String,

    pub strictness_level: StrictnessLevel,

    /// Higher is stricter
    pub strictness_score: f64,

    #[serde(default)]
    pub registration_required: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_focus_areas: Vec<String>,
}

impl Record for StateRating {
    const TABLE: Table = Table::StateComplianceRatings;

    fn key(&self) -> String {
        self.state_code.to_uppercase()
    }

    fn label(&self) -> String {
        format!("{} ({})", self.state_name, self.state_code)
    }
}

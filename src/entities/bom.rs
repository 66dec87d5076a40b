//! Bill of materials - the components needed to produce one finished good

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::entity::Record;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::store::Table;

fn default_unit() -> String {
    "ea".to_string()
}

fn default_yield() -> f64 {
    1.0
}

/// One line of a BOM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomComponent {
    /// Line identifier, regenerated on import
    pub id: EntityId,

    pub sku: String,

    pub name: String,

    pub quantity: f64,

    #[serde(default = "default_unit")]
    pub unit: String,
}

impl BomComponent {
    pub fn new(sku: impl Into<String>, name: impl Into<String>, quantity: f64, unit: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Line),
            sku: sku.into(),
            name: name.into(),
            quantity,
            unit: unit.into(),
        }
    }

    /// Same SKU, name, quantity and unit, ignoring the line id
    pub fn same_content(&self, other: &BomComponent) -> bool {
        self.sku == other.sku
            && self.name == other.name
            && self.unit == other.unit
            && (self.quantity - other.quantity).abs() < 1e-9
    }
}

/// A bill of materials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillOfMaterials {
    pub id: EntityId,

    /// SKU of the finished good this BOM produces
    pub finished_sku: String,

    pub name: String,

    #[serde(default)]
    pub components: Vec<BomComponent>,

    /// Finished units produced by one batch of the listed components
    #[serde(default = "default_yield")]
    pub yield_quantity: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub created: DateTime<Utc>,

    pub updated: DateTime<Utc>,
}

impl BillOfMaterials {
    pub fn new(finished_sku: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(EntityPrefix::Bom),
            finished_sku: finished_sku.into(),
            name: name.into(),
            components: Vec::new(),
            yield_quantity: 1.0,
            notes: None,
            created: now,
            updated: now,
        }
    }

    /// SKUs that appear on more than one line (case-insensitive), in first-seen order.
    ///
    /// Duplicates are allowed; callers show these as warnings.
    pub fn duplicate_skus(&self) -> Vec<String> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut order = Vec::new();
        for c in &self.components {
            let key = c.sku.trim().to_lowercase();
            let n = counts.entry(key.clone()).or_insert(0);
            *n += 1;
            if *n == 2 {
                order.push(c.sku.trim().to_string());
            }
        }
        order
    }

    pub fn uses_sku(&self, sku: &str) -> Option<&BomComponent> {
        self.components
            .iter()
            .find(|c| c.sku.eq_ignore_ascii_case(sku.trim()))
    }

    /// Remove a line by SKU or line id; returns the removed line
    pub fn remove_component(&mut self, sku_or_line: &str) -> Option<BomComponent> {
        let pos = self.components.iter().position(|c| {
            c.sku.eq_ignore_ascii_case(sku_or_line) || c.id.to_string() == sku_or_line
        })?;
        Some(self.components.remove(pos))
    }
}

impl Record for BillOfMaterials {
    const TABLE: Table = Table::Boms;

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn label(&self) -> String {
        format!("{} ({})", self.name, self.finished_sku)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_skus_reported_once() {
        let mut bom = BillOfMaterials::new("FG-1", "Bloom Booster");
        bom.components.push(BomComponent::new("KELP", "Kelp meal", 2.0, "kg"));
        bom.components.push(BomComponent::new("kelp ", "Kelp meal", 1.0, "kg"));
        bom.components.push(BomComponent::new("KELP", "Kelp meal", 1.0, "kg"));
        bom.components.push(BomComponent::new("BAT", "Bat guano", 1.0, "kg"));

        assert_eq!(bom.duplicate_skus(), vec!["kelp".to_string()]);
    }

    #[test]
    fn test_no_duplicates() {
        let mut bom = BillOfMaterials::new("FG-1", "Bloom Booster");
        bom.components.push(BomComponent::new("A", "a", 1.0, "kg"));
        bom.components.push(BomComponent::new("B", "b", 1.0, "kg"));
        assert!(bom.duplicate_skus().is_empty());
    }

    #[test]
    fn test_remove_component_by_sku() {
        let mut bom = BillOfMaterials::new("FG-1", "Bloom Booster");
        bom.components.push(BomComponent::new("A", "a", 1.0, "kg"));
        bom.components.push(BomComponent::new("B", "b", 1.0, "kg"));

        let removed = bom.remove_component("a").unwrap();
        assert_eq!(removed.sku, "A");
        assert_eq!(bom.components.len(), 1);
        assert!(bom.remove_component("zzz").is_none());
    }
}

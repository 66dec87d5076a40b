//! Compare ingredients read off a label against a BOM's component list

use serde::Serialize;

use crate::entities::BomComponent;

/// Decides whether a label ingredient and a BOM component are the same thing
pub trait IngredientComparator {
    fn matches(&self, label_ingredient: &str, component: &BomComponent) -> bool;
}

/// Case, whitespace and punctuation insensitive name comparison. A label
/// entry may name either the component or its SKU.
#[derive(Debug, Default, Clone, Copy)]
pub struct NormalizedComparator;

impl NormalizedComparator {
    pub fn normalize(s: &str) -> String {
        s.chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect()
    }
}

impl IngredientComparator for NormalizedComparator {
    fn matches(&self, label_ingredient: &str, component: &BomComponent) -> bool {
        let label = Self::normalize(label_ingredient);
        !label.is_empty()
            && (label == Self::normalize(&component.name) || label == Self::normalize(&component.sku))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedIngredient {
    pub label_name: String,
    pub sku: String,
    pub component_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LabelComparison {
    /// In label order
    pub matched: Vec<MatchedIngredient>,
    pub missing_from_label: Vec<String>,
    pub missing_from_bom: Vec<String>,
    pub order_matches: bool,
}

impl LabelComparison {
    pub fn is_clean(&self) -> bool {
        self.missing_from_label.is_empty() && self.missing_from_bom.is_empty() && self.order_matches
    }
}

/// Pair label entries with BOM lines. Each BOM line pairs with at most one
/// label entry, first match wins.
pub fn compare<C: IngredientComparator + ?Sized>(
    comparator: &C,
    label: &[String],
    components: &[BomComponent],
) -> LabelComparison {
    let mut used = vec![false; components.len()];
    let mut result = LabelComparison::default();
    // BOM index of each matched label entry, in label order
    let mut bom_positions = Vec::new();

    for ingredient in label {
        let found = components
            .iter()
            .enumerate()
            .find(|(i, c)| !used[*i] && comparator.matches(ingredient, c));
        match found {
            Some((i, c)) => {
                used[i] = true;
                bom_positions.push(i);
                result.matched.push(MatchedIngredient {
                    label_name: ingredient.clone(),
                    sku: c.sku.clone(),
                    component_name: c.name.clone(),
                });
            }
            None => result.missing_from_bom.push(ingredient.clone()),
        }
    }

    result.missing_from_label = components
        .iter()
        .zip(&used)
        .filter(|(_, u)| !**u)
        .map(|(c, _)| c.name.clone())
        .collect();

    let in_order = bom_positions.windows(2).all(|w| w[0] < w[1]);
    result.order_matches =
        in_order && result.missing_from_label.is_empty() && result.missing_from_bom.is_empty();

    result
}

//! Ingredient compliance lookups across states

use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;

use crate::core::store::{RecordStore, RecordStoreExt, StoreError};
use crate::entities::compliance::{ComplianceStatus, SdsStatus, StrictnessLevel};
use crate::entities::{BillOfMaterials, IngredientCompliance, IngredientSds, StateRating};

fn normalize_state(code: &str) -> String {
    code.trim().to_uppercase()
}

fn same_sku(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Fields for recording an ingredient's status in one state
#[derive(Debug, Clone)]
pub struct ComplianceUpdate {
    pub ingredient_sku: String,
    pub ingredient_name: String,
    pub state_code: String,
    pub status: ComplianceStatus,
    pub cas_number: Option<String>,
    pub restriction_type: Option<String>,
    pub restriction_details: Option<String>,
    pub max_concentration: Option<f64>,
    pub concentration_unit: Option<String>,
    pub regulation_code: Option<String>,
    pub sds_status: Option<SdsStatus>,
}

/// Insert or replace the record for (SKU, state)
pub fn set_status<S: RecordStore + ?Sized>(
    store: &mut S,
    update: ComplianceUpdate,
) -> Result<IngredientCompliance, StoreError> {
    let record = IngredientCompliance {
        ingredient_sku: update.ingredient_sku.trim().to_string(),
        ingredient_name: update.ingredient_name,
        state_code: normalize_state(&update.state_code),
        status: update.status,
        cas_number: update.cas_number,
        restriction_type: update.restriction_type,
        restriction_details: update.restriction_details,
        max_concentration: update.max_concentration,
        concentration_unit: update
            .concentration_unit
            .unwrap_or_else(|| "percent".to_string()),
        regulation_code: update.regulation_code,
        sds_status: match update.sds_status {
            Some(status) => status,
            None if has_sds(&*store, &update.ingredient_sku)? => SdsStatus::OnFile,
            None => SdsStatus::Missing,
        },
        updated: Utc::now(),
    };
    store.upsert(&record)?;
    tracing::info!(sku = %record.ingredient_sku, state = %record.state_code, status = %record.status, "compliance status set");
    Ok(record)
}

fn has_sds<S: RecordStore + ?Sized>(store: &S, sku: &str) -> Result<bool, StoreError> {
    Ok(store.get::<IngredientSds>(&sku.trim().to_uppercase())?.is_some())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SdsAction {
    Created,
    Updated,
}

impl std::fmt::Display for SdsAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SdsAction::Created => write!(f, "created"),
            SdsAction::Updated => write!(f, "updated"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SdsStored {
    pub action: SdsAction,
    pub has_hazards: bool,
    /// Compliance rows for the SKU now marked on file
    pub states_marked: usize,
    pub document: IngredientSds,
}

/// Store the primary SDS for an ingredient and mark its compliance rows on file
pub fn store_sds<S: RecordStore + ?Sized>(
    store: &mut S,
    mut document: IngredientSds,
) -> Result<SdsStored, StoreError> {
    document.ingredient_sku = document.ingredient_sku.trim().to_string();
    document.hazard_codes = clean_codes(document.hazard_codes);
    document.precautionary_codes = clean_codes(document.precautionary_codes);
    document.updated = Utc::now();

    let action = if has_sds(&*store, &document.ingredient_sku)? {
        SdsAction::Updated
    } else {
        SdsAction::Created
    };
    store.upsert(&document)?;

    let mut states_marked = 0;
    let rows: Vec<IngredientCompliance> = store.list()?;
    for mut row in rows
        .into_iter()
        .filter(|r| same_sku(&r.ingredient_sku, &document.ingredient_sku))
    {
        if row.sds_status != SdsStatus::OnFile {
            row.sds_status = SdsStatus::OnFile;
            row.updated = Utc::now();
            store.update(&row)?;
        }
        states_marked += 1;
    }

    tracing::info!(sku = %document.ingredient_sku, %action, states_marked, "sds stored");
    Ok(SdsStored {
        action,
        has_hazards: document.has_hazards(),
        states_marked,
        document,
    })
}

fn clean_codes(codes: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for code in codes {
        let code = code.trim().to_uppercase();
        if !code.is_empty() && !out.contains(&code) {
            out.push(code);
        }
    }
    out
}

/// Look up SDS documents. Every given filter must match.
pub fn find_sds<S: RecordStore + ?Sized>(
    store: &S,
    sku: Option<&str>,
    cas: Option<&str>,
    hazard: Option<&str>,
) -> Result<Vec<IngredientSds>, StoreError> {
    let mut docs: Vec<IngredientSds> = store.list()?;
    docs.retain(|d| {
        sku.map_or(true, |s| same_sku(&d.ingredient_sku, s))
            && cas.map_or(true, |c| {
                d.cas_number
                    .as_deref()
                    .is_some_and(|n| n.trim().eq_ignore_ascii_case(c.trim()))
            })
            && hazard.map_or(true, |h| d.has_hazard_code(h))
    });
    docs.sort_by(|a, b| a.ingredient_sku.cmp(&b.ingredient_sku));
    Ok(docs)
}

fn records_for<'a>(
    all: &'a [IngredientCompliance],
    sku: &'a str,
    states: &'a [String],
) -> impl Iterator<Item = &'a IngredientCompliance> + 'a {
    all.iter().filter(move |r| {
        same_sku(&r.ingredient_sku, sku)
            && (states.is_empty() || states.iter().any(|s| normalize_state(s) == r.state_code))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    NonCompliant,
    NeedsAttention,
    PendingReview,
    Compliant,
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverallStatus::NonCompliant => write!(f, "non_compliant"),
            OverallStatus::NeedsAttention => write!(f, "needs_attention"),
            OverallStatus::PendingReview => write!(f, "pending_review"),
            OverallStatus::Compliant => write!(f, "compliant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngredientIssue {
    pub sku: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restriction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concentration: Option<f64>,
}

impl IngredientIssue {
    fn bare(sku: &str, name: &str) -> Self {
        Self {
            sku: sku.to_string(),
            name: name.to_string(),
            state: None,
            restriction: None,
            details: None,
            max_concentration: None,
        }
    }

    fn from_record(name: &str, r: &IngredientCompliance) -> Self {
        Self {
            sku: r.ingredient_sku.clone(),
            name: name.to_string(),
            state: Some(r.state_code.clone()),
            restriction: r.restriction_type.clone(),
            details: r.restriction_details.clone(),
            max_concentration: r.max_concentration,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ComplianceIssues {
    pub prohibited: Vec<IngredientIssue>,
    pub restricted: Vec<IngredientIssue>,
    /// One entry per SKU
    pub missing_sds: Vec<IngredientIssue>,
    /// Ingredients with no record in any target state
    pub unknown_status: Vec<IngredientIssue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BomComplianceReport {
    pub bom_id: String,
    pub bom_name: String,
    pub finished_sku: String,
    pub target_states: Vec<String>,
    pub total_ingredients: usize,
    pub overall_status: OverallStatus,
    pub issues: ComplianceIssues,
    pub recommendations: Vec<String>,
}

fn unique_skus(issues: &[IngredientIssue]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for i in issues {
        if !seen.iter().any(|s| same_sku(s, &i.sku)) {
            seen.push(i.sku.clone());
        }
    }
    seen
}

fn recommendations(issues: &ComplianceIssues) -> Vec<String> {
    let mut out = Vec::new();

    if !issues.prohibited.is_empty() {
        let skus = unique_skus(&issues.prohibited);
        out.push(format!(
            "CRITICAL: Remove or replace {} prohibited ingredient(s): {}",
            skus.len(),
            skus.join(", ")
        ));
    }
    if !issues.restricted.is_empty() {
        out.push(format!(
            "Review {} restricted ingredient(s) for concentration limits",
            issues.restricted.len()
        ));
    }
    if !issues.missing_sds.is_empty() {
        let skus = unique_skus(&issues.missing_sds);
        let shown: Vec<&str> = skus.iter().take(5).map(String::as_str).collect();
        out.push(format!(
            "Obtain SDS documents for {} ingredient(s): {}",
            skus.len(),
            shown.join(", ")
        ));
    }
    if !issues.unknown_status.is_empty() {
        out.push(format!(
            "Research compliance status for {} ingredient(s) with unknown status",
            issues.unknown_status.len()
        ));
    }
    if out.is_empty() {
        out.push("All ingredients appear compliant for target states".to_string());
    }
    out
}

/// Check every BOM component against the target states
pub fn check_bom<S: RecordStore + ?Sized>(
    store: &S,
    bom: &BillOfMaterials,
    target_states: &[String],
) -> Result<BomComplianceReport, StoreError> {
    let all: Vec<IngredientCompliance> = store.list()?;
    let states: Vec<String> = target_states.iter().map(|s| normalize_state(s)).collect();
    let mut issues = ComplianceIssues::default();

    for component in &bom.components {
        let records: Vec<_> = records_for(&all, &component.sku, &states).collect();
        if records.is_empty() {
            issues
                .unknown_status
                .push(IngredientIssue::bare(&component.sku, &component.name));
            continue;
        }

        for r in &records {
            match r.status {
                ComplianceStatus::Prohibited => issues
                    .prohibited
                    .push(IngredientIssue::from_record(&component.name, r)),
                ComplianceStatus::Restricted => issues
                    .restricted
                    .push(IngredientIssue::from_record(&component.name, r)),
                _ => {}
            }
        }

        let missing_sds = records.iter().any(|r| r.sds_status == SdsStatus::Missing);
        let already = issues.missing_sds.iter().any(|i| same_sku(&i.sku, &component.sku));
        if missing_sds && !already {
            issues
                .missing_sds
                .push(IngredientIssue::bare(&component.sku, &component.name));
        }
    }

    let overall_status = if !issues.prohibited.is_empty() {
        OverallStatus::NonCompliant
    } else if !issues.restricted.is_empty() {
        OverallStatus::NeedsAttention
    } else if !issues.unknown_status.is_empty() || !issues.missing_sds.is_empty() {
        OverallStatus::PendingReview
    } else {
        OverallStatus::Compliant
    };

    Ok(BomComplianceReport {
        bom_id: bom.id.to_string(),
        bom_name: bom.name.clone(),
        finished_sku: bom.finished_sku.clone(),
        target_states: states,
        total_ingredients: bom.components.len(),
        overall_status,
        recommendations: recommendations(&issues),
        issues,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct IngredientStatusReport {
    pub ingredient_sku: String,
    pub ingredient_name: Option<String>,
    pub cas_number: Option<String>,
    pub total_states_checked: usize,
    pub by_status: BTreeMap<String, Vec<IngredientCompliance>>,
    pub has_issues: bool,
}

/// An ingredient's records grouped by status. Every status key is present.
pub fn ingredient_status<S: RecordStore + ?Sized>(
    store: &S,
    sku: &str,
    states: &[String],
) -> Result<IngredientStatusReport, StoreError> {
    let all: Vec<IngredientCompliance> = store.list()?;
    let mut records: Vec<IngredientCompliance> = records_for(&all, sku, states).cloned().collect();
    records.sort_by(|a, b| a.state_code.cmp(&b.state_code));

    let mut by_status: BTreeMap<String, Vec<IngredientCompliance>> = ComplianceStatus::all()
        .iter()
        .map(|s| (s.to_string(), Vec::new()))
        .collect();
    for r in &records {
        by_status.entry(r.status.to_string()).or_default().push(r.clone());
    }

    let has_issues = records.iter().any(|r| {
        matches!(
            r.status,
            ComplianceStatus::Restricted | ComplianceStatus::Prohibited
        )
    });

    Ok(IngredientStatusReport {
        ingredient_sku: sku.trim().to_string(),
        ingredient_name: records.first().map(|r| r.ingredient_name.clone()),
        cas_number: records.first().and_then(|r| r.cas_number.clone()),
        total_states_checked: records.len(),
        by_status,
        has_issues,
    })
}

/// State ratings grouped by level, strictest level first and highest score
/// first within a level
pub fn state_rankings<S: RecordStore + ?Sized>(
    store: &S,
    level: Option<StrictnessLevel>,
    states: &[String],
) -> Result<Vec<(StrictnessLevel, Vec<StateRating>)>, StoreError> {
    let mut ratings: Vec<StateRating> = store
        .list::<StateRating>()?
        .into_iter()
        .filter(|r| level.map_or(true, |l| r.strictness_level == l))
        .filter(|r| states.is_empty() || states.iter().any(|s| normalize_state(s) == r.state_code.to_uppercase()))
        .collect();
    ratings.sort_by(|a, b| b.strictness_score.total_cmp(&a.strictness_score));

    Ok(StrictnessLevel::all()
        .iter()
        .map(|lvl| {
            let group: Vec<StateRating> = ratings
                .iter()
                .filter(|r| r.strictness_level == *lvl)
                .cloned()
                .collect();
            (*lvl, group)
        })
        .collect())
}

/// Prohibited ingredients in a state, plus restricted and conditional ones
/// when `include_restricted` is set. Ordered by status, then SKU.
pub fn flagged_ingredients<S: RecordStore + ?Sized>(
    store: &S,
    state_code: &str,
    include_restricted: bool,
) -> Result<Vec<IngredientCompliance>, StoreError> {
    let state = normalize_state(state_code);
    let mut flagged: Vec<IngredientCompliance> = store
        .list::<IngredientCompliance>()?
        .into_iter()
        .filter(|r| r.state_code == state)
        .filter(|r| match r.status {
            ComplianceStatus::Prohibited => true,
            ComplianceStatus::Restricted | ComplianceStatus::Conditional => include_restricted,
            _ => false,
        })
        .collect();
    flagged.sort_by(|a, b| {
        a.status
            .to_string()
            .cmp(&b.status.to_string())
            .then_with(|| a.ingredient_sku.cmp(&b.ingredient_sku))
    });
    Ok(flagged)
}

#[derive(Debug, Clone, Serialize)]
pub struct BomUsage {
    pub bom_id: String,
    pub bom_name: String,
    pub finished_sku: String,
    pub quantity_used: f64,
    pub unit: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngredientImpact {
    pub ingredient_sku: String,
    pub boms: Vec<BomUsage>,
    /// Prohibited or restricted records for the ingredient
    pub compliance_issues: Vec<IngredientCompliance>,
}

/// Which BOMs would be affected by a change to an ingredient
pub fn boms_using<S: RecordStore + ?Sized>(store: &S, sku: &str) -> Result<IngredientImpact, StoreError> {
    let boms: Vec<BillOfMaterials> = store.list()?;
    let usages = boms
        .iter()
        .filter_map(|bom| {
            bom.uses_sku(sku).map(|c| BomUsage {
                bom_id: bom.id.to_string(),
                bom_name: bom.name.clone(),
                finished_sku: bom.finished_sku.clone(),
                quantity_used: c.quantity,
                unit: c.unit.clone(),
            })
        })
        .collect();

    let compliance_issues = store
        .list::<IngredientCompliance>()?
        .into_iter()
        .filter(|r| same_sku(&r.ingredient_sku, sku))
        .filter(|r| {
            matches!(
                r.status,
                ComplianceStatus::Prohibited | ComplianceStatus::Restricted
            )
        })
        .collect();

    Ok(IngredientImpact {
        ingredient_sku: sku.trim().to_string(),
        boms: usages,
        compliance_issues,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::SqliteStore;
    use crate::entities::BomComponent;

    fn update(sku: &str, state: &str, status: ComplianceStatus) -> ComplianceUpdate {
        ComplianceUpdate {
            ingredient_sku: sku.to_string(),
            ingredient_name: format!("{} name", sku),
            state_code: state.to_string(),
            status,
            cas_number: None,
            restriction_type: None,
            restriction_details: None,
            max_concentration: None,
            concentration_unit: None,
            regulation_code: None,
            sds_status: None,
        }
    }

    fn sds(sku: &str, cas: Option<&str>, hazards: &[&str]) -> IngredientSds {
        IngredientSds {
            ingredient_sku: sku.to_string(),
            ingredient_name: format!("{} name", sku),
            cas_number: cas.map(str::to_string),
            manufacturer: None,
            file_url: None,
            source: "manual_entry".to_string(),
            revision_date: None,
            expiration_date: None,
            signal_word: None,
            hazard_codes: hazards.iter().map(|h| h.to_string()).collect(),
            precautionary_codes: Vec::new(),
            hazard_statements: Vec::new(),
            updated: Utc::now(),
        }
    }

    fn bom(skus: &[&str]) -> BillOfMaterials {
        let mut bom = BillOfMaterials::new("FERT-1", "Garden Blend");
        for sku in skus {
            bom.components.push(BomComponent::new(*sku, format!("{} name", sku), 1.0, "kg"));
        }
        bom
    }

    fn states(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_set_status_upserts_per_sku_and_state() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let first = set_status(&mut store, update("BORAX", "ca", ComplianceStatus::Unknown)).unwrap();
        assert_eq!(first.sds_status, SdsStatus::Missing);
        assert_eq!(first.concentration_unit, "percent");
        assert_eq!(first.state_code, "CA");

        set_status(&mut store, update("BORAX", "CA", ComplianceStatus::Restricted)).unwrap();
        let all: Vec<IngredientCompliance> = store.list().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].status, ComplianceStatus::Restricted);
    }

    #[test]
    fn test_check_bom_non_compliant() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        set_status(&mut store, update("A", "CA", ComplianceStatus::Prohibited)).unwrap();
        set_status(&mut store, update("A", "OR", ComplianceStatus::Prohibited)).unwrap();
        set_status(&mut store, update("B", "CA", ComplianceStatus::Restricted)).unwrap();

        let report = check_bom(&store, &bom(&["A", "B", "C"]), &states(&["CA", "OR"])).unwrap();

        assert_eq!(report.overall_status, OverallStatus::NonCompliant);
        assert_eq!(report.issues.prohibited.len(), 2);
        assert_eq!(report.issues.unknown_status.len(), 1);
        assert_eq!(report.issues.missing_sds.len(), 2);
        assert_eq!(
            report.recommendations[0],
            "CRITICAL: Remove or replace 1 prohibited ingredient(s): A"
        );
        assert_eq!(report.recommendations.len(), 4);
    }

    #[test]
    fn test_check_bom_status_ladder() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let mut ok = update("A", "CA", ComplianceStatus::Compliant);
        ok.sds_status = Some(SdsStatus::OnFile);
        set_status(&mut store, ok).unwrap();

        let report = check_bom(&store, &bom(&["A"]), &states(&["CA"])).unwrap();
        assert_eq!(report.overall_status, OverallStatus::Compliant);
        assert_eq!(
            report.recommendations,
            vec!["All ingredients appear compliant for target states"]
        );

        let report = check_bom(&store, &bom(&["A", "Z"]), &states(&["CA"])).unwrap();
        assert_eq!(report.overall_status, OverallStatus::PendingReview);

        let mut restricted = update("A", "CA", ComplianceStatus::Restricted);
        restricted.sds_status = Some(SdsStatus::OnFile);
        set_status(&mut store, restricted).unwrap();
        let report = check_bom(&store, &bom(&["A"]), &states(&["CA"])).unwrap();
        assert_eq!(report.overall_status, OverallStatus::NeedsAttention);
    }

    #[test]
    fn test_ingredient_status_groups() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        set_status(&mut store, update("A", "WA", ComplianceStatus::Compliant)).unwrap();
        set_status(&mut store, update("A", "CA", ComplianceStatus::Restricted)).unwrap();

        let report = ingredient_status(&store, "a", &[]).unwrap();
        assert_eq!(report.total_states_checked, 2);
        assert!(report.has_issues);
        assert_eq!(report.by_status.len(), 5);
        assert_eq!(report.by_status["restricted"][0].state_code, "CA");

        let only_wa = ingredient_status(&store, "A", &states(&["wa"])).unwrap();
        assert!(!only_wa.has_issues);
    }

    #[test]
    fn test_state_rankings_order() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        for (code, level, score) in [
            ("TX", StrictnessLevel::Lenient, 3.0),
            ("CA", StrictnessLevel::VeryStrict, 9.5),
            ("OR", StrictnessLevel::VeryStrict, 9.0),
        ] {
            store
                .upsert(&StateRating {
                    state_code: code.into(),
                    state_name: code.into(),
                    strictness_level: level,
                    strictness_score: score,
                    registration_required: true,
                    key_focus_areas: vec![],
                })
                .unwrap();
        }

        let groups = state_rankings(&store, None, &[]).unwrap();
        assert_eq!(groups[0].0, StrictnessLevel::VeryStrict);
        let codes: Vec<_> = groups[0].1.iter().map(|r| r.state_code.as_str()).collect();
        assert_eq!(codes, vec!["CA", "OR"]);

        let lenient = state_rankings(&store, Some(StrictnessLevel::Lenient), &[]).unwrap();
        let total: usize = lenient.iter().map(|(_, g)| g.len()).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn test_flagged_ingredients() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        set_status(&mut store, update("A", "CA", ComplianceStatus::Prohibited)).unwrap();
        set_status(&mut store, update("B", "CA", ComplianceStatus::Conditional)).unwrap();
        set_status(&mut store, update("C", "CA", ComplianceStatus::Compliant)).unwrap();
        set_status(&mut store, update("D", "OR", ComplianceStatus::Prohibited)).unwrap();

        assert_eq!(flagged_ingredients(&store, "ca", false).unwrap().len(), 1);
        assert_eq!(flagged_ingredients(&store, "CA", true).unwrap().len(), 2);
    }

    #[test]
    fn test_boms_using_ingredient() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.insert(&bom(&["A", "B"])).unwrap();
        store.insert(&bom(&["B"])).unwrap();
        set_status(&mut store, update("A", "CA", ComplianceStatus::Restricted)).unwrap();

        let impact = boms_using(&store, "a").unwrap();
        assert_eq!(impact.boms.len(), 1);
        assert_eq!(impact.compliance_issues.len(), 1);
        assert_eq!(boms_using(&store, "B").unwrap().boms.len(), 2);
    }

    #[test]
    fn test_store_sds_marks_every_state_on_file() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        set_status(&mut store, update("BORAX", "CA", ComplianceStatus::Restricted)).unwrap();
        set_status(&mut store, update("borax", "OR", ComplianceStatus::Compliant)).unwrap();
        set_status(&mut store, update("KELP", "CA", ComplianceStatus::Compliant)).unwrap();

        let stored = store_sds(&mut store, sds("Borax", Some("1303-96-4"), &["h360fd", " H360FD"])).unwrap();
        assert_eq!(stored.action, SdsAction::Created);
        assert_eq!(stored.states_marked, 2);
        assert!(stored.has_hazards);
        assert_eq!(stored.document.hazard_codes, vec!["H360FD".to_string()]);

        let rows: Vec<IngredientCompliance> = store.list().unwrap();
        for row in rows {
            let expected = if row.ingredient_sku.eq_ignore_ascii_case("BORAX") {
                SdsStatus::OnFile
            } else {
                SdsStatus::Missing
            };
            assert_eq!(row.sds_status, expected, "{}", row.ingredient_sku);
        }

        let again = store_sds(&mut store, sds("BORAX", None, &[])).unwrap();
        assert_eq!(again.action, SdsAction::Updated);
        assert!(!again.has_hazards);
        let docs: Vec<IngredientSds> = store.list().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].cas_number, None);
    }

    #[test]
    fn test_set_status_after_sds_defaults_on_file() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store_sds(&mut store, sds("BORAX", None, &[])).unwrap();
        let record = set_status(&mut store, update("borax", "WA", ComplianceStatus::Unknown)).unwrap();
        assert_eq!(record.sds_status, SdsStatus::OnFile);

        let other = set_status(&mut store, update("KELP", "WA", ComplianceStatus::Unknown)).unwrap();
        assert_eq!(other.sds_status, SdsStatus::Missing);
    }

    #[test]
    fn test_find_sds_filters() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store_sds(&mut store, sds("BORAX", Some("1303-96-4"), &["H360FD"])).unwrap();
        store_sds(&mut store, sds("UREA", Some("57-13-6"), &[])).unwrap();
        store_sds(&mut store, sds("ACID", None, &["H314", "H290"])).unwrap();

        assert_eq!(find_sds(&store, None, None, None).unwrap().len(), 3);

        let by_sku = find_sds(&store, Some("urea"), None, None).unwrap();
        assert_eq!(by_sku.len(), 1);
        assert_eq!(by_sku[0].ingredient_sku, "UREA");

        let by_cas = find_sds(&store, None, Some("1303-96-4"), None).unwrap();
        assert_eq!(by_cas[0].ingredient_sku, "BORAX");

        let by_hazard = find_sds(&store, None, None, Some("h290")).unwrap();
        assert_eq!(by_hazard.len(), 1);
        assert_eq!(by_hazard[0].ingredient_sku, "ACID");

        assert!(find_sds(&store, Some("BORAX"), None, Some("H314")).unwrap().is_empty());
        assert!(find_sds(&store, None, Some("7732-18-5"), None).unwrap().is_empty());
    }
}

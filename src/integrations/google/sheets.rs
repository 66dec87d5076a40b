//! Google Sheets: raw value access plus inventory export/import

use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;

use super::{check_response, http_client, GoogleAuth, GoogleError};
use crate::core::store::{RecordStore, RecordStoreExt};
use crate::entities::InventoryItem;
use crate::mrp::csv::ImportStats;
use crate::mrp::validation::{parse_days, parse_number, NewInventoryItem};

const SHEETS_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Column layout shared by export and import
pub const INVENTORY_HEADERS: [&str; 9] = [
    "sku",
    "name",
    "category",
    "quantity_on_hand",
    "reorder_point",
    "reorder_quantity",
    "unit",
    "unit_cost",
    "lead_time_days",
];

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedSpreadsheet {
    pub spreadsheet_id: String,
    pub url: String,
}

pub trait SheetsApi {
    /// Cell values in row-major order; trailing empty cells may be absent
    fn read_values(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<String>>, GoogleError>;

    /// Overwrite a range; returns the number of cells updated
    fn write_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<String>],
    ) -> Result<usize, GoogleError>;

    fn create_spreadsheet(&self, title: &str) -> Result<CreatedSpreadsheet, GoogleError>;
}

/// How imported rows combine with existing inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum MergeStrategy {
    /// Delete every existing item, then insert the sheet's rows
    Replace,
    /// Insert rows whose SKU is new; skip the rest
    #[default]
    Append,
    /// Update items with a matching SKU, insert the others
    Update,
}

pub struct HttpSheets {
    client: reqwest::blocking::Client,
    token: String,
}

impl HttpSheets {
    pub fn connect(auth: &GoogleAuth) -> Result<Self, GoogleError> {
        let client = http_client()?;
        let token = auth.access_token(&client)?;
        Ok(Self { client, token })
    }
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateResponse {
    #[serde(default)]
    updated_cells: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpreadsheetResponse {
    spreadsheet_id: String,
    spreadsheet_url: String,
}

fn cell_text(v: serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl SheetsApi for HttpSheets {
    fn read_values(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<String>>, GoogleError> {
        let url = format!(
            "{}/{}/values/{}",
            SHEETS_URL,
            urlencoding::encode(spreadsheet_id),
            urlencoding::encode(range)
        );
        tracing::info!(spreadsheet_id, range, "reading sheet values");
        let resp = self.client.get(url).bearer_auth(&self.token).send()?;
        let body: ValueRange = check_response(resp)?
            .json()
            .map_err(|e| GoogleError::Decode(e.to_string()))?;
        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }

    fn write_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<String>],
    ) -> Result<usize, GoogleError> {
        let url = format!(
            "{}/{}/values/{}?valueInputOption=RAW",
            SHEETS_URL,
            urlencoding::encode(spreadsheet_id),
            urlencoding::encode(range)
        );
        tracing::info!(spreadsheet_id, range, rows = values.len(), "writing sheet values");
        let resp = self
            .client
            .put(url)
            .bearer_auth(&self.token)
            .json(&json!({ "range": range, "majorDimension": "ROWS", "values": values }))
            .send()?;
        let body: UpdateResponse = check_response(resp)?
            .json()
            .map_err(|e| GoogleError::Decode(e.to_string()))?;
        Ok(body.updated_cells)
    }

    fn create_spreadsheet(&self, title: &str) -> Result<CreatedSpreadsheet, GoogleError> {
        tracing::info!(title, "creating spreadsheet");
        let resp = self
            .client
            .post(SHEETS_URL)
            .bearer_auth(&self.token)
            .json(&json!({ "properties": { "title": title } }))
            .send()?;
        let body: SpreadsheetResponse = check_response(resp)?
            .json()
            .map_err(|e| GoogleError::Decode(e.to_string()))?;
        Ok(CreatedSpreadsheet {
            spreadsheet_id: body.spreadsheet_id,
            url: body.spreadsheet_url,
        })
    }
}

fn opt_num(n: Option<f64>) -> String {
    n.map(|v| v.to_string()).unwrap_or_default()
}

/// Header plus one row per item
pub fn inventory_rows(items: &[InventoryItem]) -> Vec<Vec<String>> {
    let mut rows = vec![INVENTORY_HEADERS.iter().map(|h| h.to_string()).collect()];
    for item in items {
        rows.push(vec![
            item.sku.clone(),
            item.name.clone(),
            item.category.clone().unwrap_or_default(),
            item.quantity_on_hand.to_string(),
            item.reorder_point.to_string(),
            item.reorder_quantity.to_string(),
            item.unit.clone(),
            opt_num(item.unit_cost),
            item.lead_time_days.map(|d| d.to_string()).unwrap_or_default(),
        ]);
    }
    rows
}

/// Write all items to `sheet_name`, starting at A1. Returns rows written
/// including the header.
pub fn export_inventory<A: SheetsApi + ?Sized>(
    api: &A,
    spreadsheet_id: &str,
    sheet_name: &str,
    items: &[InventoryItem],
) -> Result<usize, GoogleError> {
    let rows = inventory_rows(items);
    api.write_values(spreadsheet_id, &format!("{}!A1", sheet_name), &rows)?;
    Ok(rows.len())
}

/// A sheet row that could not become an inventory item
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRowError {
    /// 1-based sheet row
    pub row: usize,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct SheetImport {
    pub stats: ImportStats,
    pub errors: Vec<SheetRowError>,
}

fn cell<'a>(header: &[String], row: &'a [String], name: &str) -> Option<&'a str> {
    header
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .and_then(|i| row.get(i))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

fn parse_sheet_row(header: &[String], row: &[String]) -> Result<NewInventoryItem, String> {
    let field = |name: &str| cell(header, row, name);
    let number = |name: &'static str| parse_number(name, field(name)).map_err(|e| e.to_string());

    Ok(NewInventoryItem {
        sku: field("sku").unwrap_or_default().to_string(),
        name: field("name").unwrap_or_default().to_string(),
        category: field("category").map(str::to_string),
        quantity_on_hand: number("quantity_on_hand")?.unwrap_or(0.0),
        reorder_point: number("reorder_point")?.unwrap_or(0.0),
        reorder_quantity: number("reorder_quantity")?.unwrap_or(0.0),
        moq: number("moq")?,
        unit: field("unit").map(str::to_string),
        unit_cost: number("unit_cost")?,
        vendor_id: None,
        lead_time_days: parse_days("lead_time_days", field("lead_time_days"))
            .map_err(|e| e.to_string())?,
    })
}

/// Read `sheet_name` and merge its rows into inventory. Every row is
/// validated before anything is written; invalid rows are reported and left
/// out. With `dry_run` nothing is written.
pub fn import_inventory<A: SheetsApi + ?Sized, S: RecordStore + ?Sized>(
    api: &A,
    store: &mut S,
    spreadsheet_id: &str,
    sheet_name: &str,
    strategy: MergeStrategy,
    dry_run: bool,
) -> Result<SheetImport, GoogleError> {
    let values = api.read_values(spreadsheet_id, sheet_name)?;
    let mut out = SheetImport::default();
    let Some((header, body)) = values.split_first() else {
        return Ok(out);
    };

    let mut valid = Vec::new();
    let mut seen_skus = HashSet::new();
    for (idx, row) in body.iter().enumerate() {
        let row_num = idx + 2;
        if row.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        out.stats.rows_processed += 1;
        let parsed = parse_sheet_row(header, row)
            .and_then(|form| form.validate().map_err(|e| e.to_string()))
            .and_then(|item| {
                if seen_skus.insert(item.sku.to_uppercase()) {
                    Ok(item)
                } else {
                    Err(format!("duplicate SKU in sheet: {}", item.sku))
                }
            });
        match parsed {
            Ok(item) => valid.push(item),
            Err(message) => {
                out.stats.errors += 1;
                out.errors.push(SheetRowError { row: row_num, message });
            }
        }
    }

    // Replace wipes inventory, so it only runs on a fully valid sheet
    if strategy == MergeStrategy::Replace && !dry_run {
        if let Some(first) = out.errors.first() {
            return Err(GoogleError::ReplaceRefused(format!(
                "{} invalid row(s), first at row {}: {}",
                out.errors.len(),
                first.row,
                first.message
            )));
        }
        if valid.is_empty() {
            return Err(GoogleError::ReplaceRefused("the sheet has no inventory rows".to_string()));
        }
    }

    let existing: Vec<InventoryItem> = store.list()?;
    if strategy == MergeStrategy::Replace && !dry_run {
        for item in &existing {
            store.delete::<InventoryItem>(&item.id.to_string())?;
        }
    }

    for item in valid {
        let current = existing
            .iter()
            .find(|e| e.sku.eq_ignore_ascii_case(&item.sku));
        match (strategy, current) {
            (MergeStrategy::Replace, _) | (_, None) => {
                if !dry_run {
                    store.insert(&item)?;
                }
                out.stats.entities_created += 1;
            }
            (MergeStrategy::Append, Some(_)) => out.stats.skipped += 1,
            (MergeStrategy::Update, Some(current)) => {
                let mut merged = current.clone();
                merged.name = item.name;
                merged.category = item.category.or(merged.category);
                merged.quantity_on_hand = item.quantity_on_hand;
                merged.reorder_point = item.reorder_point;
                merged.reorder_quantity = item.reorder_quantity;
                merged.unit = item.unit;
                merged.unit_cost = item.unit_cost.or(merged.unit_cost);
                merged.lead_time_days = item.lead_time_days.or(merged.lead_time_days);
                merged.updated = item.updated;
                if !dry_run {
                    store.update(&merged)?;
                }
                out.stats.entities_updated += 1;
            }
        }
    }

    tracing::info!(
        created = out.stats.entities_created,
        updated = out.stats.entities_updated,
        errors = out.stats.errors,
        "sheet import finished"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::SqliteStore;
    use crate::integrations::google::mock::MockGoogle;
    use crate::mrp::validation::create_inventory_item;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn sheet() -> Vec<Vec<String>> {
        vec![
            row(&["SKU", "Name", "quantity_on_hand", "reorder_point", "lead_time_days"]),
            row(&["KELP-01", "Kelp Meal", "40", "10", "14"]),
            row(&["", "No Sku", "1", "1", ""]),
            row(&["BONE-02", "Bone Meal", "many", "1", ""]),
            row(&["FISH-03", "Fish Bone", "5", "20", ""]),
        ]
    }

    fn seed(store: &mut SqliteStore) {
        create_inventory_item(
            store,
            &NewInventoryItem {
                sku: "KELP-01".into(),
                name: "Old Kelp".into(),
                quantity_on_hand: 1.0,
                unit_cost: Some(2.0),
                ..Default::default()
            },
        )
        .unwrap();
    }

    #[test]
    fn test_export_writes_header_and_rows() {
        let api = MockGoogle::new();
        let mut store = SqliteStore::open_in_memory().unwrap();
        seed(&mut store);
        let items: Vec<InventoryItem> = store.list().unwrap();

        let n = export_inventory(&api, "sheet-1", "Inventory", &items).unwrap();
        assert_eq!(n, 2);
        let written = api.sheet("sheet-1", "Inventory!A1").unwrap();
        assert_eq!(written[0][0], "sku");
        assert_eq!(written[1][0], "KELP-01");
    }

    #[test]
    fn test_append_skips_existing_and_reports_bad_rows() {
        let api = MockGoogle::new();
        api.put_sheet("sheet-1", "Inventory", sheet());
        let mut store = SqliteStore::open_in_memory().unwrap();
        seed(&mut store);

        let result = import_inventory(&api, &mut store, "sheet-1", "Inventory", MergeStrategy::Append, false).unwrap();
        assert_eq!(result.stats.rows_processed, 4);
        assert_eq!(result.stats.entities_created, 1);
        assert_eq!(result.stats.skipped, 1);
        assert_eq!(result.stats.errors, 2);
        assert_eq!(result.errors[0].row, 3);
        assert_eq!(store.list::<InventoryItem>().unwrap().len(), 2);
    }

    #[test]
    fn test_update_merges_by_sku() {
        let api = MockGoogle::new();
        api.put_sheet("sheet-1", "Inventory", sheet());
        let mut store = SqliteStore::open_in_memory().unwrap();
        seed(&mut store);

        import_inventory(&api, &mut store, "sheet-1", "Inventory", MergeStrategy::Update, false).unwrap();
        let items: Vec<InventoryItem> = store.list().unwrap();
        let kelp = items.iter().find(|i| i.sku == "KELP-01").unwrap();
        assert_eq!(kelp.name, "Kelp Meal");
        assert_eq!(kelp.quantity_on_hand, 40.0);
        assert_eq!(kelp.unit_cost, Some(2.0));
        assert_eq!(items.len(), 2);
    }

    fn clean_sheet() -> Vec<Vec<String>> {
        vec![
            row(&["sku", "name", "quantity_on_hand"]),
            row(&["KELP-01", "Kelp Meal", "40"]),
            row(&["FISH-03", "Fish Bone", "5"]),
        ]
    }

    #[test]
    fn test_replace_and_dry_run() {
        let api = MockGoogle::new();
        api.put_sheet("sheet-1", "Inventory", clean_sheet());
        let mut store = SqliteStore::open_in_memory().unwrap();
        seed(&mut store);

        let dry = import_inventory(&api, &mut store, "sheet-1", "Inventory", MergeStrategy::Replace, true).unwrap();
        assert_eq!(dry.stats.entities_created, 2);
        assert_eq!(store.list::<InventoryItem>().unwrap()[0].name, "Old Kelp");

        import_inventory(&api, &mut store, "sheet-1", "Inventory", MergeStrategy::Replace, false).unwrap();
        let items: Vec<InventoryItem> = store.list().unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.name != "Old Kelp"));
    }

    #[test]
    fn test_replace_with_invalid_rows_keeps_inventory() {
        let api = MockGoogle::new();
        api.put_sheet("sheet-1", "Inventory", sheet());
        let mut store = SqliteStore::open_in_memory().unwrap();
        seed(&mut store);

        let err = import_inventory(&api, &mut store, "sheet-1", "Inventory", MergeStrategy::Replace, false)
            .unwrap_err();
        assert!(matches!(err, GoogleError::ReplaceRefused(_)));
        let items: Vec<InventoryItem> = store.list().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Old Kelp");
    }

    #[test]
    fn test_replace_with_only_bad_rows_keeps_inventory() {
        let api = MockGoogle::new();
        api.put_sheet(
            "sheet-1",
            "Inventory",
            vec![row(&["item", "title"]), row(&["KELP-01", "Kelp"]), row(&["BONE-02", "Bone"])],
        );
        let mut store = SqliteStore::open_in_memory().unwrap();
        seed(&mut store);

        assert!(import_inventory(&api, &mut store, "sheet-1", "Inventory", MergeStrategy::Replace, false).is_err());
        assert_eq!(store.list::<InventoryItem>().unwrap().len(), 1);

        api.put_sheet("sheet-1", "Inventory", vec![row(&["sku", "name"])]);
        assert!(import_inventory(&api, &mut store, "sheet-1", "Inventory", MergeStrategy::Replace, false).is_err());
        assert_eq!(store.list::<InventoryItem>().unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_sku_in_sheet_is_rejected() {
        let api = MockGoogle::new();
        api.put_sheet(
            "sheet-1",
            "Inventory",
            vec![
                row(&["sku", "name"]),
                row(&["KELP-01", "Kelp"]),
                row(&["kelp-01", "Kelp again"]),
            ],
        );

        for strategy in [MergeStrategy::Append, MergeStrategy::Update] {
            let mut store = SqliteStore::open_in_memory().unwrap();
            let result = import_inventory(&api, &mut store, "sheet-1", "Inventory", strategy, false).unwrap();
            assert_eq!(result.stats.entities_created, 1);
            assert_eq!(result.stats.errors, 1);
            assert_eq!(result.errors[0].row, 3);
            assert!(result.errors[0].message.contains("duplicate SKU"));
            assert_eq!(store.list::<InventoryItem>().unwrap().len(), 1);
        }

        let mut store = SqliteStore::open_in_memory().unwrap();
        assert!(import_inventory(&api, &mut store, "sheet-1", "Inventory", MergeStrategy::Replace, false).is_err());
        assert!(store.list::<InventoryItem>().unwrap().is_empty());
    }
}

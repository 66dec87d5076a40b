//! Automatic inventory backup to Google Sheets
//!
//! The on/off toggle lives in local storage, so reading it never touches the
//! network.

use chrono::{DateTime, Utc};

use super::sheets::{export_inventory, SheetsApi};
use super::GoogleError;
use crate::core::local_storage::{keys, LocalStorage, LocalStorageError};
use crate::core::store::{RecordStore, RecordStoreExt};
use crate::entities::InventoryItem;

pub const BACKUP_SHEET: &str = "Inventory";

#[derive(Debug, Clone, PartialEq)]
pub enum BackupOutcome {
    Skipped(&'static str),
    Exported { rows: usize, at: DateTime<Utc> },
}

pub fn auto_backup_enabled(storage: &LocalStorage) -> bool {
    storage.get::<bool>(keys::SHEETS_AUTO_BACKUP).unwrap_or(false)
}

pub fn set_auto_backup(storage: &mut LocalStorage, enabled: bool) -> Result<(), LocalStorageError> {
    storage.set(keys::SHEETS_AUTO_BACKUP, &enabled)
}

pub fn last_backup(storage: &LocalStorage) -> Option<DateTime<Utc>> {
    storage.get(keys::SHEETS_LAST_BACKUP)
}

/// Export all inventory when the toggle is on and a target spreadsheet is set
pub fn maybe_backup<A: SheetsApi + ?Sized, S: RecordStore + ?Sized>(
    api: &A,
    store: &S,
    storage: &mut LocalStorage,
    spreadsheet_id: Option<&str>,
) -> Result<BackupOutcome, GoogleError> {
    if !auto_backup_enabled(storage) {
        return Ok(BackupOutcome::Skipped("automatic backup is off"));
    }
    let Some(spreadsheet_id) = spreadsheet_id else {
        return Ok(BackupOutcome::Skipped("no backup spreadsheet configured"));
    };

    let items: Vec<InventoryItem> = store.list()?;
    let rows = export_inventory(api, spreadsheet_id, BACKUP_SHEET, &items)?;
    let at = Utc::now();
    storage.set(keys::SHEETS_LAST_BACKUP, &at)?;
    tracing::info!(spreadsheet_id, rows, "inventory backed up");
    Ok(BackupOutcome::Exported { rows, at })
}

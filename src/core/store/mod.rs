//! SQLite-backed record store
//!
//! Every collection is a table of JSON documents keyed by id. The store offers
//! the same small surface a hosted table client does: insert, update, upsert,
//! delete, get and list against a named table. Typed access goes through
//! [`RecordStoreExt`], which works for any [`RecordStore`] implementation.

mod schema;

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use thiserror::Error;

use crate::core::entity::Record;
use crate::core::project::Project;

/// Current schema version
const SCHEMA_VERSION: i32 = 2;

/// Named tables in the data store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    InventoryItems,
    Vendors,
    Boms,
    PurchaseOrders,
    Artworks,
    ProductRegistrations,
    AgentActivityStream,
    PoThreeWayMatches,
    IngredientComplianceStatus,
    StateComplianceRatings,
    IngredientSdsDocuments,
    AppSettings,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::InventoryItems => "inventory_items",
            Table::Vendors => "vendors",
            Table::Boms => "boms",
            Table::PurchaseOrders => "purchase_orders",
            Table::Artworks => "artworks",
            Table::ProductRegistrations => "product_registrations",
            Table::AgentActivityStream => "agent_activity_stream",
            Table::PoThreeWayMatches => "po_three_way_matches",
            Table::IngredientComplianceStatus => "ingredient_compliance_status",
            Table::StateComplianceRatings => "state_compliance_ratings",
            Table::IngredientSdsDocuments => "ingredient_sds_documents",
            Table::AppSettings => "app_settings",
        }
    }

    pub fn all() -> &'static [Table] {
        &[
            Table::InventoryItems,
            Table::Vendors,
            Table::Boms,
            Table::PurchaseOrders,
            Table::Artworks,
            Table::ProductRegistrations,
            Table::AgentActivityStream,
            Table::PoThreeWayMatches,
            Table::IngredientComplianceStatus,
            Table::StateComplianceRatings,
            Table::IngredientSdsDocuments,
            Table::AppSettings,
        ]
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Errors raised by store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("{table}: a row with id '{key}' already exists")]
    Duplicate { table: Table, key: String },

    #[error("{table}: no row matches '{key}'")]
    NotFound { table: Table, key: String },

    #[error("{table}: '{query}' is ambiguous ({count} matches), use a longer id")]
    Ambiguous {
        table: Table,
        query: String,
        count: usize,
    },

    #[error("{table}: failed to decode row: {message}")]
    Decode { table: Table, message: String },
}

/// Raw document operations against named tables
pub trait RecordStore {
    fn insert_row(&mut self, table: Table, key: &str, data: &Value) -> Result<(), StoreError>;

    /// Replace an existing row; fails with `NotFound` if the key is absent
    fn update_row(&mut self, table: Table, key: &str, data: &Value) -> Result<(), StoreError>;

    fn upsert_row(&mut self, table: Table, key: &str, data: &Value) -> Result<(), StoreError>;

    /// Returns whether a row was removed
    fn delete_row(&mut self, table: Table, key: &str) -> Result<bool, StoreError>;

    fn get_row(&self, table: Table, key: &str) -> Result<Option<Value>, StoreError>;

    /// All rows in insertion order
    fn list_rows(&self, table: Table) -> Result<Vec<Value>, StoreError>;

    /// Keys starting with `prefix` (case-insensitive)
    fn keys_with_prefix(&self, table: Table, prefix: &str) -> Result<Vec<String>, StoreError>;
}

fn encode<R: Record>(record: &R) -> Result<Value, StoreError> {
    serde_json::to_value(record).map_err(|e| StoreError::Decode {
        table: R::TABLE,
        message: e.to_string(),
    })
}

fn decode<R: Record>(value: Value) -> Result<R, StoreError> {
    serde_json::from_value(value).map_err(|e| StoreError::Decode {
        table: R::TABLE,
        message: e.to_string(),
    })
}

/// Typed helpers layered over the raw operations
pub trait RecordStoreExt: RecordStore {
    fn insert<R: Record>(&mut self, record: &R) -> Result<(), StoreError> {
        tracing::debug!(table = %R::TABLE, key = %record.key(), "insert");
        self.insert_row(R::TABLE, &record.key(), &encode(record)?)
    }

    fn update<R: Record>(&mut self, record: &R) -> Result<(), StoreError> {
        tracing::debug!(table = %R::TABLE, key = %record.key(), "update");
        self.update_row(R::TABLE, &record.key(), &encode(record)?)
    }

    fn upsert<R: Record>(&mut self, record: &R) -> Result<(), StoreError> {
        tracing::debug!(table = %R::TABLE, key = %record.key(), "upsert");
        self.upsert_row(R::TABLE, &record.key(), &encode(record)?)
    }

    fn delete<R: Record>(&mut self, key: &str) -> Result<bool, StoreError> {
        tracing::debug!(table = %R::TABLE, key, "delete");
        self.delete_row(R::TABLE, key)
    }

    fn get<R: Record>(&self, key: &str) -> Result<Option<R>, StoreError> {
        self.get_row(R::TABLE, key)?.map(decode::<R>).transpose()
    }

    /// Rows that fail to decode are skipped with a warning
    fn list<R: Record>(&self) -> Result<Vec<R>, StoreError> {
        let rows = self.list_rows(R::TABLE)?;
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            match decode::<R>(row) {
                Ok(r) => records.push(r),
                Err(e) => tracing::warn!(error = %e, "skipping undecodable row"),
            }
        }
        Ok(records)
    }

    /// Resolve an exact key or a unique key prefix
    fn find<R: Record>(&self, query: &str) -> Result<R, StoreError> {
        if let Some(record) = self.get::<R>(query)? {
            return Ok(record);
        }

        let keys = self.keys_with_prefix(R::TABLE, query)?;
        match keys.as_slice() {
            [] => Err(StoreError::NotFound {
                table: R::TABLE,
                key: query.to_string(),
            }),
            [only] => self.get::<R>(only)?.ok_or_else(|| StoreError::NotFound {
                table: R::TABLE,
                key: query.to_string(),
            }),
            many => Err(StoreError::Ambiguous {
                table: R::TABLE,
                query: query.to_string(),
                count: many.len(),
            }),
        }
    }
}

impl<S: RecordStore + ?Sized> RecordStoreExt for S {}

/// The data store backed by a SQLite file
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the store for a project
    pub fn open(project: &Project) -> Result<Self, StoreError> {
        Self::open_path(&project.db_path())
    }

    pub fn open_path(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let store = Self { conn };
        store.prepare()?;
        Ok(store)
    }

    /// Open a private in-memory store
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.prepare()?;
        Ok(store)
    }

    fn prepare(&self) -> Result<(), StoreError> {
        let version = self.schema_version();
        if version != SCHEMA_VERSION {
            tracing::debug!(from = version, to = SCHEMA_VERSION, "initializing store schema");
            self.init_schema()?;
        }
        Ok(())
    }

    /// Row count for a table
    pub fn count(&self, table: Table) -> Result<usize, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.name());
        let n: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

fn parse_row(table: Table, raw: String) -> Result<Value, StoreError> {
    serde_json::from_str(&raw).map_err(|e| StoreError::Decode {
        table,
        message: e.to_string(),
    })
}

impl RecordStore for SqliteStore {
    fn insert_row(&mut self, table: Table, key: &str, data: &Value) -> Result<(), StoreError> {
        let sql = format!(
            "INSERT INTO {} (id, data, updated_at) VALUES (?1, ?2, ?3)",
            table.name()
        );
        match self
            .conn
            .execute(&sql, params![key, data.to_string(), Utc::now().to_rfc3339()])
        {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::Duplicate {
                    table,
                    key: key.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn update_row(&mut self, table: Table, key: &str, data: &Value) -> Result<(), StoreError> {
        let sql = format!(
            "UPDATE {} SET data = ?2, updated_at = ?3 WHERE id = ?1",
            table.name()
        );
        let changed = self
            .conn
            .execute(&sql, params![key, data.to_string(), Utc::now().to_rfc3339()])?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                table,
                key: key.to_string(),
            });
        }
        Ok(())
    }

    fn upsert_row(&mut self, table: Table, key: &str, data: &Value) -> Result<(), StoreError> {
        let sql = format!(
            "INSERT INTO {} (id, data, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
            table.name()
        );
        self.conn
            .execute(&sql, params![key, data.to_string(), Utc::now().to_rfc3339()])?;
        Ok(())
    }

    fn delete_row(&mut self, table: Table, key: &str) -> Result<bool, StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", table.name());
        Ok(self.conn.execute(&sql, params![key])? > 0)
    }

    fn get_row(&self, table: Table, key: &str) -> Result<Option<Value>, StoreError> {
        let sql = format!("SELECT data FROM {} WHERE id = ?1", table.name());
        let raw: Option<String> = self
            .conn
            .query_row(&sql, params![key], |row| row.get(0))
            .optional()?;
        raw.map(|r| parse_row(table, r)).transpose()
    }

    fn list_rows(&self, table: Table) -> Result<Vec<Value>, StoreError> {
        let sql = format!("SELECT data FROM {} ORDER BY rowid", table.name());
        let mut stmt = self.conn.prepare(&sql)?;
        let raws = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        raws.into_iter().map(|r| parse_row(table, r)).collect()
    }

    fn keys_with_prefix(&self, table: Table, prefix: &str) -> Result<Vec<String>, StoreError> {
        // LIKE is case-insensitive for ASCII; escape the wildcard characters
        let escaped = prefix
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let sql = format!(
            "SELECT id FROM {} WHERE id LIKE ?1 ESCAPE '\\' ORDER BY id",
            table.name()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let keys = stmt
            .query_map(params![format!("{}%", escaped)], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory store that counts calls, for asserting what a workflow touched

    use super::*;
    use std::collections::BTreeMap;

    #[derive(Default)]
    pub struct CountingStore {
        pub rows: BTreeMap<(&'static str, String), Value>,
        pub order: Vec<(&'static str, String)>,
        pub inserts: usize,
        pub updates: usize,
    }

    impl RecordStore for CountingStore {
        fn insert_row(&mut self, table: Table, key: &str, data: &Value) -> Result<(), StoreError> {
            self.inserts += 1;
            let k = (table.name(), key.to_string());
            if self.rows.contains_key(&k) {
                return Err(StoreError::Duplicate {
                    table,
                    key: key.to_string(),
                });
            }
            self.order.push(k.clone());
            self.rows.insert(k, data.clone());
            Ok(())
        }

        fn update_row(&mut self, table: Table, key: &str, data: &Value) -> Result<(), StoreError> {
            self.updates += 1;
            let k = (table.name(), key.to_string());
            match self.rows.get_mut(&k) {
                Some(slot) => {
                    *slot = data.clone();
                    Ok(())
                }
                None => Err(StoreError::NotFound {
                    table,
                    key: key.to_string(),
                }),
            }
        }

        fn upsert_row(&mut self, table: Table, key: &str, data: &Value) -> Result<(), StoreError> {
            let k = (table.name(), key.to_string());
            if !self.rows.contains_key(&k) {
                self.order.push(k.clone());
            }
            self.rows.insert(k, data.clone());
            Ok(())
        }

        fn delete_row(&mut self, table: Table, key: &str) -> Result<bool, StoreError> {
            let k = (table.name(), key.to_string());
            self.order.retain(|o| o != &k);
            Ok(self.rows.remove(&k).is_some())
        }

        fn get_row(&self, table: Table, key: &str) -> Result<Option<Value>, StoreError> {
            Ok(self.rows.get(&(table.name(), key.to_string())).cloned())
        }

        fn list_rows(&self, table: Table) -> Result<Vec<Value>, StoreError> {
            Ok(self
                .order
                .iter()
                .filter(|(t, _)| *t == table.name())
                .filter_map(|k| self.rows.get(k).cloned())
                .collect())
        }

        fn keys_with_prefix(&self, table: Table, prefix: &str) -> Result<Vec<String>, StoreError> {
            let lower = prefix.to_lowercase();
            Ok(self
                .rows
                .keys()
                .filter(|(t, k)| *t == table.name() && k.to_lowercase().starts_with(&lower))
                .map(|(_, k)| k.clone())
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Widget {
        id: String,
        name: String,
    }

    impl Record for Widget {
        const TABLE: Table = Table::Vendors;

        fn key(&self) -> String {
            self.id.clone()
        }

        fn label(&self) -> String {
            self.name.clone()
        }
    }

    fn widget(id: &str, name: &str) -> Widget {
        Widget {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_insert_and_get() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.insert(&widget("VEN-A1", "Acme")).unwrap();

        let loaded: Widget = store.get("VEN-A1").unwrap().unwrap();
        assert_eq!(loaded.name, "Acme");
        assert_eq!(store.count(Table::Vendors).unwrap(), 1);
    }

    #[test]
    fn test_older_store_gains_new_tables() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("murp.db");
        {
            let store = SqliteStore::open_path(&path).unwrap();
            store
                .conn
                .execute_batch(
                    "DROP TABLE ingredient_sds_documents;
                     DELETE FROM schema_version;
                     INSERT INTO schema_version (version) VALUES (1);",
                )
                .unwrap();
        }
        let store = SqliteStore::open_path(&path).unwrap();
        assert_eq!(store.schema_version(), SCHEMA_VERSION);
        assert_eq!(store.count(Table::IngredientSdsDocuments).unwrap(), 0);
    }

    #[test]
    fn test_duplicate_insert_fails() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.insert(&widget("VEN-A1", "Acme")).unwrap();
        let err = store.insert(&widget("VEN-A1", "Other")).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));
    }

    #[test]
    fn test_update_replaces_whole_row() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.insert(&widget("VEN-A1", "Acme")).unwrap();
        store.update(&widget("VEN-A1", "Acme Corp")).unwrap();

        let loaded: Widget = store.get("VEN-A1").unwrap().unwrap();
        assert_eq!(loaded.name, "Acme Corp");
    }

    #[test]
    fn test_update_missing_row_fails() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let err = store.update(&widget("VEN-NOPE", "x")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn test_list_preserves_insertion_order_after_upsert() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.insert(&widget("VEN-B", "second")).unwrap();
        store.insert(&widget("VEN-A", "first")).unwrap();
        store.upsert(&widget("VEN-B", "second, renamed")).unwrap();

        let all: Vec<Widget> = store.list().unwrap();
        assert_eq!(all[0].name, "second, renamed");
        assert_eq!(all[1].name, "first");
    }

    #[test]
    fn test_find_by_unique_prefix() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.insert(&widget("VEN-01ABC", "Acme")).unwrap();
        store.insert(&widget("VEN-02XYZ", "Zenith")).unwrap();

        let found: Widget = store.find("ven-02").unwrap();
        assert_eq!(found.name, "Zenith");

        let err = store.find::<Widget>("VEN-0").unwrap_err();
        assert!(matches!(err, StoreError::Ambiguous { count: 2, .. }));

        let err = store.find::<Widget>("VEN-9").unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn test_prefix_search_treats_wildcards_literally() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.insert(&widget("VEN-ABC", "Acme")).unwrap();
        assert!(store.keys_with_prefix(Table::Vendors, "VEN%").unwrap().is_empty());
        assert!(store.keys_with_prefix(Table::Vendors, "VEN_").unwrap().is_empty());
    }

    #[test]
    fn test_delete() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.insert(&widget("VEN-A1", "Acme")).unwrap();
        assert!(store.delete::<Widget>("VEN-A1").unwrap());
        assert!(!store.delete::<Widget>("VEN-A1").unwrap());
        assert!(store.get::<Widget>("VEN-A1").unwrap().is_none());
    }

    #[test]
    fn test_store_reopens_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("murp.db");
        {
            let mut store = SqliteStore::open_path(&path).unwrap();
            store.insert(&widget("VEN-A1", "Acme")).unwrap();
        }
        let store = SqliteStore::open_path(&path).unwrap();
        assert!(store.get::<Widget>("VEN-A1").unwrap().is_some());
    }
}

//! Database schema initialization

use rusqlite::params;

use super::{SqliteStore, StoreError, Table, SCHEMA_VERSION};

impl SqliteStore {
    /// Create the version table and one document table per record collection
    pub(super) fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );
            "#,
        )?;

        for table in Table::all() {
            let sql = format!(
                r#"
                CREATE TABLE IF NOT EXISTS {name} (
                    id TEXT PRIMARY KEY,
                    data TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_{name}_updated ON {name}(updated_at);
                "#,
                name = table.name()
            );
            self.conn.execute_batch(&sql)?;
        }

        self.conn.execute(
            "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
            params![SCHEMA_VERSION],
        )?;

        Ok(())
    }

    /// Read the stored schema version (0 when the database is fresh)
    pub(super) fn schema_version(&self) -> i32 {
        self.conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get::<_, Option<i32>>(0)
            })
            .ok()
            .flatten()
            .unwrap_or(0)
    }
}

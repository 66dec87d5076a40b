//! Record trait - common interface for everything kept in the data store

use serde::{de::DeserializeOwned, Serialize};

use crate::core::store::Table;

/// A flat record that maps to one row of a named data-store table.
///
/// Records are passed by value and replaced whole on save; the store owns
/// the persisted copy.
pub trait Record: Serialize + DeserializeOwned {
    /// The table this record lives in
    const TABLE: Table;

    /// Primary key (a prefixed ULID for most records, a natural key for some)
    fn key(&self) -> String;

    /// Human-readable label used in listings and messages
    fn label(&self) -> String;
}

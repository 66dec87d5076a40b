//! Core module - project layout, configuration, identity and persistence

pub mod config;
pub mod entity;
pub mod identity;
pub mod local_storage;
pub mod logging;
pub mod project;
pub mod store;
pub mod template;

pub use config::Config;
pub use entity::Record;
pub use identity::{EntityId, EntityPrefix, IdParseError};
pub use local_storage::{LocalStorage, LocalStorageError};
pub use project::{Project, ProjectError};
pub use store::{RecordStore, RecordStoreExt, SqliteStore, StoreError, Table};

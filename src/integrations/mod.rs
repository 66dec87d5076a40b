//! External services: Google Workspace and documentation search

pub mod docs_search;
pub mod google;

pub use docs_search::{CachedDocs, DocsError, DocsService, HttpDocsService, LibraryMatch};
pub use google::GoogleError;

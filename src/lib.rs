//! MuRP: materials resource planning for small manufacturers
//!
//! Inventory, vendors, bills of materials and purchase orders kept in a local
//! SQLite store, with state compliance tracking, label checks and Google
//! Workspace integration.

pub mod cli;
pub mod core;
pub mod entities;
pub mod integrations;
pub mod mrp;

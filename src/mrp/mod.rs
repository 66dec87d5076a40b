//! Planning logic that sits between the records and the command line

pub mod activity;
pub mod artwork;
pub mod auto_po;
pub mod compliance;
pub mod csv;
pub mod heatmap;
pub mod label;
pub mod three_way;
pub mod validation;

pub use validation::{create_inventory_item, NewInventoryItem, ValidationError};

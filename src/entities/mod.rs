//! Record type definitions
//!
//! Every record mirrors one row of a data-store table:
//!
//! - [`InventoryItem`] - stocked materials with reorder points
//! - [`Vendor`] - suppliers
//! - [`BillOfMaterials`] - component lists for finished goods
//! - [`PurchaseOrder`] - orders placed with vendors
//! - [`Artwork`] - label artwork files and their scan state
//! - [`ProductRegistration`] - state registrations with expiry dates
//! - [`AgentActivity`] - the activity stream
//! - [`ThreeWayMatch`] - PO / invoice / receipt reconciliation results
//! - [`IngredientCompliance`], [`StateRating`], [`IngredientSds`] - regulatory data

pub mod activity;
pub mod artwork;
pub mod bom;
pub mod compliance;
pub mod inventory;
pub mod purchase_order;
pub mod registration;
pub mod three_way_match;
pub mod vendor;

pub use activity::AgentActivity;
pub use artwork::Artwork;
pub use bom::{BillOfMaterials, BomComponent};
pub use compliance::{IngredientCompliance, IngredientSds, StateRating};
pub use inventory::InventoryItem;
pub use purchase_order::PurchaseOrder;
pub use registration::ProductRegistration;
pub use three_way_match::ThreeWayMatch;
pub use vendor::Vendor;

//! CLI command implementations

pub mod activity;
pub mod artwork;
pub mod bom;
pub mod completions;
pub mod compliance;
pub mod docs;
pub mod google;
pub mod heatmap;
pub mod init;
pub mod inv;
pub mod label;
pub mod matching;
pub mod po;
pub mod reg;
pub mod settings;
pub mod vendor;

//! Lab Inventory Core - library for tracking network lab equipment.
//!
//! Serialized assets (switches, optics, consoles, PDUs) and bulk
//! accessories are kept across four lab locations in two JSON files.
//! The crate can be used without any front end.
//!
//! # Example
//!
//! ```rust,ignore
//! use labinv_core::{DataPaths, Reconciler, RecordStore};
//!
//! fn main() -> labinv_core::Result<()> {
//!     let mut store = RecordStore::open(DataPaths::resolve(None)?);
//!
//!     // Plan an upload, review it, then commit it
//!     let rows = labinv_core::import::read_csv_file("upload.csv".as_ref())?;
//!     let plan = Reconciler::new(&store).plan(rows);
//!     println!("{}", plan.summary_line());
//!     store.apply_import(&plan)?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod identity;
pub mod import;
pub mod models;
pub mod report;
pub mod store;

// Re-export commonly used types
pub use config::{DataPaths, Location};
pub use error::{InventoryError, Result};
pub use import::{ImportPlan, Reconciler, RowAction};
pub use models::{
    Accessory, Asset, AssetCategory, AssetPatch, AssetState, AssetStatus, NewAccessory, NewAsset,
};
pub use report::{AssetFilter, InventorySummary};
pub use store::RecordStore;

//! Record persistence.
//!
//! This module provides:
//! - Atomic JSON file operations with `.bak` backups
//! - The record store owning every asset and accessory

mod atomic;
mod record_store;

pub use atomic::{atomic_write_json, read_json_repaired};
pub use record_store::RecordStore;

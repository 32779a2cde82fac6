//! Data models for the inventory.
//!
//! These types map directly onto the JSON files written by earlier
//! versions of the lab inventory, so existing data loads unchanged.

mod accessory;
mod asset;

pub use accessory::*;
pub use asset::*;

use serde::{Deserialize, Deserializer};

/// Deserialize an optional string, treating blank values as absent.
///
/// Older files store cleared fields as `""`.
pub(crate) fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// Keep a trimmed string only if something is left.
pub(crate) fn non_empty(value: impl AsRef<str>) -> Option<String> {
    let trimmed = value.as_ref().trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

//! Identifier and timestamp synthesis.
//!
//! Identifiers combine a second-resolution timestamp, the microsecond
//! field and a short random suffix, so records created within the same
//! second stay distinct without a central counter.

use crate::config::{IdConfig, ImportConfig, InventoryConfig};
use chrono::{DateTime, Local};
use rand::Rng;

/// Generate a fresh asset ID, e.g. `AST-20240301142233-004512-K7QZ`.
pub fn generate_asset_id() -> String {
    generate_id(IdConfig::ASSET_ID_PREFIX)
}

/// Generate a fresh accessory ID.
pub fn generate_accessory_id() -> String {
    generate_id(IdConfig::ACCESSORY_ID_PREFIX)
}

fn generate_id(prefix: &str) -> String {
    format_id(prefix, Local::now(), &random_suffix())
}

fn format_id(prefix: &str, now: DateTime<Local>, suffix: &str) -> String {
    format!(
        "{}-{}-{:06}-{}",
        prefix,
        now.format("%Y%m%d%H%M%S"),
        now.timestamp_subsec_micros() % 1_000_000,
        suffix
    )
}

fn random_suffix() -> String {
    let charset = IdConfig::RANDOM_SUFFIX_CHARSET;
    let mut rng = rand::thread_rng();
    (0..IdConfig::RANDOM_SUFFIX_LEN)
        .map(|_| charset[rng.gen_range(0..charset.len())] as char)
        .collect()
}

/// Current local time as stored in `date_added` and deployment dates.
pub fn timestamp_now() -> String {
    Local::now()
        .format(InventoryConfig::TIMESTAMP_FORMAT)
        .to_string()
}

/// Today's local date as stored in loan dates.
pub fn date_today() -> String {
    Local::now().format(InventoryConfig::DATE_FORMAT).to_string()
}

/// True if an identity value is missing: blank or a sentinel such as `NaN`.
pub fn is_absent(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || ImportConfig::ABSENT_SENTINELS.contains(&trimmed)
}

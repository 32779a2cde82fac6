//! Centralized configuration for the inventory library.
//!
//! Constants for file names, identifier formats and import parsing, the
//! fixed set of lab locations, and data directory resolution.

use crate::error::{InventoryError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application-level configuration.
pub struct AppConfig;

impl AppConfig {
    pub const DATA_DIR_NAME: &'static str = "labinv";
    pub const DATA_DIR_ENV: &'static str = "LABINV_DATA_DIR";
}

/// Persistence configuration.
pub struct InventoryConfig;

impl InventoryConfig {
    pub const ASSETS_FILE_NAME: &'static str = "inventory_data.json";
    pub const ACCESSORIES_FILE_NAME: &'static str = "accessories_data.json";
    /// Keep a `.bak` copy of the previous file on every save.
    pub const KEEP_BACKUP: bool = true;
    pub const TIMESTAMP_FORMAT: &'static str = "%Y-%m-%d %H:%M";
    pub const DATE_FORMAT: &'static str = "%Y-%m-%d";
    pub const EXPORT_TIMESTAMP_FORMAT: &'static str = "%Y%m%d_%H%M%S";
}

/// CSV import configuration.
pub struct ImportConfig;

impl ImportConfig {
    /// Added to the 0-based data row index so diagnostics match spreadsheet
    /// row numbers (1-based, plus the header row).
    pub const HEADER_ROW_OFFSET: usize = 2;

    /// Cell values treated as "no value".
    pub const ABSENT_SENTINELS: &'static [&'static str] = &[
        "NaN", "nan", "NAN", "None", "null", "NULL", "N/A", "n/a", "NA", "<NA>", "#N/A",
    ];

    /// Accepted input formats for loan dates, tried in order.
    pub const DATE_INPUT_FORMATS: &'static [&'static str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
}

/// Spreadsheet column names shared by import and export.
pub struct Columns;

impl Columns {
    pub const ASSET_ID: &'static str = "Asset ID";
    pub const NAME: &'static str = "Name";
    pub const NETWORK_NAME: &'static str = "Network Name";
    pub const OWNER: &'static str = "Owner";
    pub const TEAM: &'static str = "Team";
    pub const ORDER_NUMBER: &'static str = "Order Number";
    pub const TRACKING_NUMBER: &'static str = "Tracking Number";
    pub const LOCATION: &'static str = "Location";
    pub const CATEGORY: &'static str = "Category";
    pub const STATUS: &'static str = "Status";
    pub const DATE_ADDED: &'static str = "Date Added";
    pub const NOTES: &'static str = "Notes";

    pub const RACK: &'static str = "Rack";
    pub const ROW: &'static str = "Row";
    pub const POSITION: &'static str = "Position";
    pub const DEPLOYMENT_DATE: &'static str = "Deployment Date";

    pub const LOANED_TO: &'static str = "Loaned To";
    pub const LOAN_PURPOSE: &'static str = "Loan Purpose";
    pub const LOAN_DATE: &'static str = "Loan Date";
    pub const EXPECTED_RETURN: &'static str = "Expected Return";
}

/// Dashboard summary configuration.
pub struct ReportConfig;

impl ReportConfig {
    /// Length of every ranked list (owners, racks, loans, recent assets).
    pub const TOP_LIST_LEN: usize = 10;
}

/// Identifier synthesis configuration.
pub struct IdConfig;

impl IdConfig {
    pub const ASSET_ID_PREFIX: &'static str = "AST";
    pub const ACCESSORY_ID_PREFIX: &'static str = "ACC";
    pub const RANDOM_SUFFIX_LEN: usize = 4;
    pub const RANDOM_SUFFIX_CHARSET: &'static [u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
}

/// Lab sites holding inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Location {
    SF,
    SJ,
    RTP,
    BGL,
}

impl Location {
    /// All locations in display order. The first one is the import default.
    pub const ALL: [Location; 4] = [Location::SF, Location::SJ, Location::RTP, Location::BGL];

    pub fn as_str(&self) -> &'static str {
        match self {
            Location::SF => "SF",
            Location::SJ => "SJ",
            Location::RTP => "RTP",
            Location::BGL => "BGL",
        }
    }

    /// Parse a location code, ignoring case and surrounding whitespace.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "SF" => Some(Location::SF),
            "SJ" => Some(Location::SJ),
            "RTP" => Some(Location::RTP),
            "BGL" => Some(Location::BGL),
            _ => None,
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Location::ALL[0]
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// File locations for one inventory data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the data directory.
    ///
    /// An explicit directory wins. Otherwise the platform data directory
    /// (`~/.local/share/labinv` on Linux) is used.
    pub fn resolve(explicit: Option<PathBuf>) -> Result<Self> {
        if let Some(root) = explicit {
            return Ok(Self::new(root));
        }
        let data_dir = dirs::data_dir().ok_or_else(|| InventoryError::Config {
            message: "Could not determine a data directory; pass --data-dir".to_string(),
        })?;
        Ok(Self::new(data_dir.join(AppConfig::DATA_DIR_NAME)))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn assets_file(&self) -> PathBuf {
        self.root.join(InventoryConfig::ASSETS_FILE_NAME)
    }

    pub fn accessories_file(&self) -> PathBuf {
        self.root.join(InventoryConfig::ACCESSORIES_FILE_NAME)
    }
}

//! Error types for the inventory library.
//!
//! Only operations that can lose data return these. Import rows that fail
//! to parse are reported through [`crate::import::RowError`] and never
//! abort a batch.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the inventory library.
#[derive(Debug, Error)]
pub enum InventoryError {
    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("CSV error: {message}")]
    Csv {
        message: String,
        #[source]
        source: Option<csv::Error>,
    },

    // Record errors
    #[error("Asset not found: {asset_id}")]
    AssetNotFound { asset_id: String },

    #[error("Accessory not found: {accessory_id}")]
    AccessoryNotFound { accessory_id: String },

    #[error("Serial number {serial} already used by {existing_id} in category {category}")]
    DuplicateSerial {
        serial: String,
        category: String,
        existing_id: String,
    },

    #[error("Accessory model {model} already exists in category {category} as {existing_id}")]
    DuplicateAccessoryModel {
        model: String,
        category: String,
        existing_id: String,
    },

    #[error("Cannot remove {requested} from {location} for {accessory_id}: only {available} on hand")]
    InsufficientQuantity {
        accessory_id: String,
        location: String,
        available: u32,
        requested: u64,
    },

    #[error("Import plan was computed against an older inventory state; re-run the import")]
    StalePlan,

    // Validation errors
    #[error("Please fill in all required fields: {}", .missing.join(", "))]
    MissingFields { missing: Vec<String> },

    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias for inventory operations.
pub type Result<T> = std::result::Result<T, InventoryError>;

impl From<std::io::Error> for InventoryError {
    fn from(err: std::io::Error) -> Self {
        InventoryError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for InventoryError {
    fn from(err: serde_json::Error) -> Self {
        InventoryError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<csv::Error> for InventoryError {
    fn from(err: csv::Error) -> Self {
        InventoryError::Csv {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl InventoryError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        InventoryError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// True for errors caused by user input rather than the environment.
    ///
    /// The CLI uses this to pick between a short message and a full error
    /// chain.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            InventoryError::AssetNotFound { .. }
                | InventoryError::AccessoryNotFound { .. }
                | InventoryError::DuplicateSerial { .. }
                | InventoryError::DuplicateAccessoryModel { .. }
                | InventoryError::InsufficientQuantity { .. }
                | InventoryError::MissingFields { .. }
                | InventoryError::Validation { .. }
                | InventoryError::StalePlan
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = InventoryError::AssetNotFound {
            asset_id: "AST-1".into(),
        };
        assert_eq!(err.to_string(), "Asset not found: AST-1");
    }

    #[test]
    fn test_missing_fields_lists_every_field() {
        let err = InventoryError::MissingFields {
            missing: vec!["Asset Name".into(), "Model".into()],
        };
        assert_eq!(
            err.to_string(),
            "Please fill in all required fields: Asset Name, Model"
        );
    }

    #[test]
    fn test_user_errors() {
        assert!(InventoryError::AssetNotFound {
            asset_id: "x".into()
        }
        .is_user_error());
        assert!(!InventoryError::Config {
            message: "no home".into()
        }
        .is_user_error());
    }
}

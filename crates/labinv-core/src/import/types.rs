//! Import plan types: per-row actions, diagnostics and counters.

use crate::config::Location;
use crate::models::{Asset, AssetCategory};
use serde::Serialize;
use std::fmt;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// A value was defaulted or a required field was missing; the row was
    /// still processed.
    Warning,
    /// The row could not be processed and was skipped.
    Error,
}

/// A non-fatal message tied to a spreadsheet row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub row: usize,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(row: usize, message: impl Into<String>) -> Self {
        Self {
            row,
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(row: usize, message: impl Into<String>) -> Self {
        Self {
            row,
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

/// Errors name the spreadsheet row explicitly, since the row was dropped
/// and the operator has to find it in the file.
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Warning => write!(f, "Row {}: {}", self.row, self.message),
            Severity::Error => write!(f, "Row {} (Excel row): {}", self.row, self.message),
        }
    }
}

/// A row whose serial number is already held by another record of the
/// same category. Never applied; shown to the operator for review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateConflict {
    pub row: usize,
    pub name: String,
    pub serial: String,
    pub category: AssetCategory,
    pub existing_name: String,
    pub existing_location: Location,
    pub existing_id: String,
}

impl fmt::Display for DuplicateConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Row {}: {} (Serial: {}) already exists as {} in {} (ID: {})",
            self.row, self.name, self.serial, self.existing_name, self.existing_location, self.existing_id
        )
    }
}

/// Why a row was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Every cell was empty.
    EmptyRow,
    /// No usable name.
    MissingName,
    /// The row failed to parse; see the error diagnostic.
    Failed,
}

/// The decision for one input row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowAction {
    New(Asset),
    /// Full replacement of the record with the same `asset_id`.
    Update(Asset),
    Duplicate(DuplicateConflict),
    Skip(SkipReason),
}

/// A decision together with its spreadsheet row number.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRow {
    pub row: usize,
    pub action: RowAction,
}

/// Per-action counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportCounts {
    pub total_rows: usize,
    pub new: usize,
    pub updated: usize,
    pub skipped: usize,
    pub duplicates: usize,
}

/// Result of reconciling one uploaded file against the store.
///
/// Nothing here has touched the store yet. Pass the plan to
/// [`crate::RecordStore::apply_import`] to commit it.
#[derive(Debug, Clone)]
pub struct ImportPlan {
    pub rows: Vec<PlannedRow>,
    pub counts: ImportCounts,
    pub diagnostics: Vec<Diagnostic>,
    /// Store generation the plan was computed against.
    pub(crate) generation: u64,
}

impl ImportPlan {
    pub fn duplicates(&self) -> impl Iterator<Item = &DuplicateConflict> {
        self.rows.iter().filter_map(|r| match &r.action {
            RowAction::Duplicate(conflict) => Some(conflict),
            _ => None,
        })
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    /// True if applying the plan would change the store.
    pub fn has_changes(&self) -> bool {
        self.counts.new > 0 || self.counts.updated > 0
    }

    /// One-line outcome, e.g. `3 new assets imported and 1 existing assets updated`.
    pub fn summary_line(&self) -> String {
        let mut parts = Vec::new();
        if self.counts.new > 0 {
            parts.push(format!("{} new assets imported", self.counts.new));
        }
        if self.counts.updated > 0 {
            parts.push(format!("{} existing assets updated", self.counts.updated));
        }
        if parts.is_empty() {
            format!("No assets were imported from {} rows", self.counts.total_rows)
        } else {
            parts.join(" and ")
        }
    }
}

/// What [`crate::RecordStore::apply_import`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppliedImport {
    pub inserted: usize,
    pub replaced: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_display() {
        assert_eq!(
            Diagnostic::warning(4, "Invalid location 'NYC', using default 'SF'").to_string(),
            "Row 4: Invalid location 'NYC', using default 'SF'"
        );
        assert_eq!(
            Diagnostic::error(7, "No name provided - skipping").to_string(),
            "Row 7 (Excel row): No name provided - skipping"
        );
    }
}

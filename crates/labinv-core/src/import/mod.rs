//! CSV import.
//!
//! Importing is two-phase. [`Reconciler::plan`] decides what every row
//! means without touching the store, so the plan can be shown as a dry
//! run. [`crate::RecordStore::apply_import`] then commits it in one save.

mod reconciler;
mod row;
mod types;

pub use reconciler::Reconciler;
pub use row::{normalize_cell, read_csv, read_csv_file, ImportRow, RowError, SourceRow};
pub use types::{
    AppliedImport, Diagnostic, DuplicateConflict, ImportCounts, ImportPlan, PlannedRow, RowAction,
    Severity, SkipReason,
};

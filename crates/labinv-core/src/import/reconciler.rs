//! Import reconciliation: decide what each uploaded row means for the store.
//!
//! # Decision rules
//!
//! Serial number is checked first, within the row's resolved category:
//!
//! | Serial   | Known serial? | Asset ID            | Action      |
//! |----------|---------------|---------------------|-------------|
//! | present  | yes           | equals holder's id  | `update`    |
//! | present  | yes           | absent or different | `duplicate` |
//! | present  | no            | known id            | `update`    |
//! | present  | no            | unknown or absent   | `new`       |
//! | absent   | -             | known id            | `update`    |
//! | absent   | -             | unknown or absent   | `new`       |
//!
//! `new` keeps the row's asset ID when it has one and synthesizes one
//! otherwise. `update` is a full replacement, not a merge.
//!
//! The reconciler borrows the store immutably, so every row is decided
//! against the same snapshot. Identities claimed by earlier rows in the
//! batch are tracked on top of that snapshot, which keeps serials and ids
//! unique once the plan is applied.

use super::row::{parse_date, ImportRow, SourceRow};
use super::types::{
    Diagnostic, DuplicateConflict, ImportCounts, ImportPlan, PlannedRow, RowAction, SkipReason,
};
use crate::config::{Columns, Location};
use crate::identity::{date_today, generate_asset_id, timestamp_now};
use crate::models::{
    serial_key, Asset, AssetCategory, AssetState, AssetStatus, DeploymentInfo, LoanInfo,
    SERIAL_NUMBER_FIELD,
};
use crate::store::RecordStore;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Plans CSV imports against a read-only view of the store.
pub struct Reconciler<'a> {
    store: &'a RecordStore,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Self { store }
    }

    /// Decide an action for every row, in input order.
    ///
    /// Never fails: rows that cannot be processed become error diagnostics
    /// and count as skipped.
    pub fn plan(&self, rows: impl IntoIterator<Item = SourceRow>) -> ImportPlan {
        let mut index = BatchIndex::from_store(self.store);
        let mut counts = ImportCounts::default();
        let mut diagnostics = Vec::new();
        let mut planned = Vec::new();

        for source in rows {
            let row_no = source.row_number();
            counts.total_rows += 1;

            let action = match source.cells {
                Ok(cells) => plan_row(&mut index, row_no, &cells, &mut diagnostics),
                Err(e) => {
                    debug!("Row {} failed: {}", row_no, e);
                    diagnostics.push(Diagnostic::error(row_no, e.to_string()));
                    RowAction::Skip(SkipReason::Failed)
                }
            };

            match &action {
                RowAction::New(_) => counts.new += 1,
                RowAction::Update(_) => counts.updated += 1,
                RowAction::Duplicate(_) => counts.duplicates += 1,
                RowAction::Skip(_) => counts.skipped += 1,
            }
            planned.push(PlannedRow {
                row: row_no,
                action,
            });
        }

        info!(
            "Import plan: {} rows, {} new, {} updated, {} skipped, {} duplicates",
            counts.total_rows, counts.new, counts.updated, counts.skipped, counts.duplicates
        );

        ImportPlan {
            rows: planned,
            counts,
            diagnostics,
            generation: self.store.generation(),
        }
    }

    /// Plan already-parsed rows. Row numbers follow the iteration order.
    pub fn plan_rows(&self, rows: impl IntoIterator<Item = ImportRow>) -> ImportPlan {
        self.plan(
            rows.into_iter()
                .enumerate()
                .map(|(index, row)| SourceRow::ok(index, row)),
        )
    }
}

/// Who holds a serial or id while the batch is being planned.
#[derive(Debug, Clone)]
struct Holder {
    asset_id: String,
    name: String,
    location: Location,
}

impl Holder {
    fn of(asset: &Asset) -> Self {
        Self {
            asset_id: asset.asset_id.clone(),
            name: asset.name.clone(),
            location: asset.location,
        }
    }
}

type SerialKey = (AssetCategory, String);

/// Serial and id index: the store snapshot plus rows already planned.
#[derive(Debug, Default)]
struct BatchIndex {
    by_serial: HashMap<SerialKey, Holder>,
    serial_of_id: HashMap<String, Option<SerialKey>>,
}

impl BatchIndex {
    fn from_store(store: &RecordStore) -> Self {
        let mut index = Self::default();
        for asset in store.list_all() {
            let key = asset.serial_number().map(|s| (asset.category, serial_key(s)));
            if let Some(key) = &key {
                // Legacy files may hold repeats; the first record wins, as in lookups.
                index
                    .by_serial
                    .entry(key.clone())
                    .or_insert_with(|| Holder::of(asset));
            }
            index
                .serial_of_id
                .entry(asset.asset_id.clone())
                .or_insert(key);
        }
        index
    }

    fn holder_of_serial(&self, category: AssetCategory, serial: &str) -> Option<&Holder> {
        self.by_serial.get(&(category, serial_key(serial)))
    }

    fn contains_id(&self, asset_id: &str) -> bool {
        self.serial_of_id.contains_key(asset_id)
    }

    /// Record that `asset` will exist once the plan is applied.
    fn claim(&mut self, asset: &Asset) {
        let new_key = asset.serial_number().map(|s| (asset.category, serial_key(s)));
        if let Some(Some(old_key)) = self.serial_of_id.get(&asset.asset_id) {
            let held_by_self = self
                .by_serial
                .get(old_key)
                .is_some_and(|h| h.asset_id == asset.asset_id);
            if held_by_self && Some(old_key) != new_key.as_ref() {
                let old_key = old_key.clone();
                self.by_serial.remove(&old_key);
            }
        }
        if let Some(key) = &new_key {
            self.by_serial.insert(key.clone(), Holder::of(asset));
        }
        self.serial_of_id.insert(asset.asset_id.clone(), new_key);
    }
}

/// Which identity a non-duplicate row ends up with.
enum Target {
    New(String),
    Update(String),
}

fn plan_row(
    index: &mut BatchIndex,
    row_no: usize,
    row: &ImportRow,
    diagnostics: &mut Vec<Diagnostic>,
) -> RowAction {
    if row.is_empty() {
        return RowAction::Skip(SkipReason::EmptyRow);
    }

    let csv_asset_id = row.get(Columns::ASSET_ID);

    let Some(name) = row.get(Columns::NAME) else {
        diagnostics.push(Diagnostic::error(row_no, "No name provided - skipping"));
        return RowAction::Skip(SkipReason::MissingName);
    };

    let location = resolve_location(row, row_no, diagnostics);
    let category = resolve_category(row, row_no, diagnostics);
    let status = row
        .get(Columns::STATUS)
        .and_then(AssetStatus::from_str)
        .unwrap_or(AssetStatus::Available);

    let specifications = collect_specifications(row, category, row_no, diagnostics);
    let state = build_state(row, status, row_no, diagnostics);

    let serial = specifications.get(SERIAL_NUMBER_FIELD).cloned();
    let target = match serial.as_deref() {
        Some(serial) => match index.holder_of_serial(category, serial) {
            Some(holder) if csv_asset_id == Some(holder.asset_id.as_str()) => {
                Target::Update(holder.asset_id.clone())
            }
            Some(holder) => {
                return RowAction::Duplicate(DuplicateConflict {
                    row: row_no,
                    name: name.to_string(),
                    serial: serial.to_string(),
                    category,
                    existing_name: holder.name.clone(),
                    existing_location: holder.location,
                    existing_id: holder.asset_id.clone(),
                });
            }
            None => target_by_id(index, csv_asset_id),
        },
        None => target_by_id(index, csv_asset_id),
    };

    let asset_id = match &target {
        Target::New(id) | Target::Update(id) => id.clone(),
    };
    let asset = Asset {
        asset_id,
        name: name.to_string(),
        network_name: optional(row, Columns::NETWORK_NAME),
        location,
        category,
        state,
        specifications,
        owner: optional(row, Columns::OWNER),
        team: optional(row, Columns::TEAM),
        order_number: optional(row, Columns::ORDER_NUMBER),
        tracking_number: optional(row, Columns::TRACKING_NUMBER),
        notes: optional(row, Columns::NOTES),
        date_added: row
            .get(Columns::DATE_ADDED)
            .map(str::to_string)
            .unwrap_or_else(timestamp_now),
    };
    index.claim(&asset);

    match target {
        Target::New(_) => RowAction::New(asset),
        Target::Update(_) => RowAction::Update(asset),
    }
}

fn target_by_id(index: &BatchIndex, csv_asset_id: Option<&str>) -> Target {
    match csv_asset_id {
        Some(id) if index.contains_id(id) => Target::Update(id.to_string()),
        Some(id) => Target::New(id.to_string()),
        None => Target::New(generate_asset_id()),
    }
}

fn resolve_location(row: &ImportRow, row_no: usize, diagnostics: &mut Vec<Diagnostic>) -> Location {
    let default = Location::default();
    match row.get(Columns::LOCATION) {
        None => default,
        Some(raw) => Location::from_str(raw).unwrap_or_else(|| {
            diagnostics.push(Diagnostic::warning(
                row_no,
                format!(
                    "Invalid location '{}', using default '{}'",
                    raw.trim().to_uppercase(),
                    default
                ),
            ));
            default
        }),
    }
}

fn resolve_category(
    row: &ImportRow,
    row_no: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> AssetCategory {
    let default = AssetCategory::default();
    match row.get(Columns::CATEGORY) {
        None => default,
        Some(raw) => AssetCategory::from_str(raw).unwrap_or_else(|| {
            diagnostics.push(Diagnostic::warning(
                row_no,
                format!("Invalid category '{}', using default '{}'", raw, default),
            ));
            default
        }),
    }
}

/// Copy the category's specification fields. Missing required ones are
/// reported in a single warning; the row is still accepted.
fn collect_specifications(
    row: &ImportRow,
    category: AssetCategory,
    row_no: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> BTreeMap<String, String> {
    let mut specifications = BTreeMap::new();
    let mut missing = Vec::new();

    for field in category.required_fields() {
        match row.get(field) {
            Some(value) => {
                specifications.insert(field.to_string(), value.to_string());
            }
            None => missing.push(*field),
        }
    }
    if !missing.is_empty() {
        diagnostics.push(Diagnostic::warning(
            row_no,
            format!(
                "Missing required fields for {}: {}",
                category,
                missing.join(", ")
            ),
        ));
    }

    for field in category.optional_fields() {
        if let Some(value) = row.get(field) {
            specifications.insert(field.to_string(), value.to_string());
        }
    }

    specifications
}

/// Status details for the row's status. Dates that parse are normalized;
/// others are kept as entered with a warning.
fn build_state(
    row: &ImportRow,
    status: AssetStatus,
    row_no: usize,
    diagnostics: &mut Vec<Diagnostic>,
) -> AssetState {
    let text = |column: &str| row.get(column).unwrap_or_default().to_string();
    let mut date = |column: &str| {
        row.get(column).map(|value| {
            parse_date(value).unwrap_or_else(|| {
                diagnostics.push(Diagnostic::warning(
                    row_no,
                    format!("Unrecognized date '{}' in {}, kept as entered", value, column),
                ));
                value.to_string()
            })
        })
    };

    match status {
        AssetStatus::Available => AssetState::Available,
        AssetStatus::Deployed => AssetState::Deployed {
            deployment_info: DeploymentInfo {
                rack: text(Columns::RACK),
                row: text(Columns::ROW),
                position: text(Columns::POSITION),
                deployment_date: row
                    .get(Columns::DEPLOYMENT_DATE)
                    .map(str::to_string)
                    .unwrap_or_else(timestamp_now),
            },
        },
        AssetStatus::Loaned => AssetState::Loaned {
            loan_info: LoanInfo {
                loaned_to: text(Columns::LOANED_TO),
                purpose: text(Columns::LOAN_PURPOSE),
                loan_date: date(Columns::LOAN_DATE).unwrap_or_else(date_today),
                expected_return: date(Columns::EXPECTED_RETURN),
            },
        },
    }
}

fn optional(row: &ImportRow, column: &str) -> Option<String> {
    row.get(column).map(str::to_string)
}

//! CSV export of assets and accessories.
//!
//! Asset exports use the same column names the importer reads, so an
//! exported file can be edited and uploaded again as a batch of updates.

use crate::config::{Columns, InventoryConfig, Location};
use crate::error::{InventoryError, Result};
use crate::models::{Accessory, Asset};
use chrono::{DateTime, Local};
use std::borrow::Borrow;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Columns every asset export starts with.
pub const ASSET_BASE_COLUMNS: [&str; 12] = [
    Columns::ASSET_ID,
    Columns::NAME,
    Columns::NETWORK_NAME,
    Columns::OWNER,
    Columns::TEAM,
    Columns::ORDER_NUMBER,
    Columns::TRACKING_NUMBER,
    Columns::LOCATION,
    Columns::CATEGORY,
    Columns::STATUS,
    Columns::DATE_ADDED,
    Columns::NOTES,
];

const DEPLOYMENT_COLUMNS: [&str; 4] = [
    Columns::RACK,
    Columns::ROW,
    Columns::POSITION,
    Columns::DEPLOYMENT_DATE,
];

const LOAN_COLUMNS: [&str; 4] = [
    Columns::LOANED_TO,
    Columns::LOAN_PURPOSE,
    Columns::LOAN_DATE,
    Columns::EXPECTED_RETURN,
];

pub const ACCESSORY_COLUMNS: [&str; 10] = [
    "Accessory ID",
    "Category",
    "Model",
    "Part Number",
    "Description",
    "Unit Price",
    "Location",
    "Quantity",
    "Date Added",
    "Last Updated",
];

/// Header row for a set of assets: base columns, specification fields in
/// first-seen order, then deployment and loan columns when any asset
/// needs them.
pub fn asset_headers<A: Borrow<Asset>>(assets: &[A]) -> Vec<String> {
    let mut headers: Vec<String> = ASSET_BASE_COLUMNS.iter().map(|c| c.to_string()).collect();

    for asset in assets {
        for field in asset.borrow().specifications.keys() {
            if !headers.iter().any(|h| h == field) {
                headers.push(field.clone());
            }
        }
    }

    if assets.iter().any(|a| a.borrow().deployment_info().is_some()) {
        headers.extend(DEPLOYMENT_COLUMNS.iter().map(|c| c.to_string()));
    }
    if assets.iter().any(|a| a.borrow().loan_info().is_some()) {
        headers.extend(LOAN_COLUMNS.iter().map(|c| c.to_string()));
    }
    headers
}

/// Value of one export column for `asset`. Unknown columns are blank.
fn asset_cell<'a>(asset: &'a Asset, column: &str) -> &'a str {
    let text = |value: &'a Option<String>| value.as_deref().unwrap_or("");
    let deployment = asset.deployment_info();
    let loan = asset.loan_info();

    match column {
        Columns::ASSET_ID => &asset.asset_id,
        Columns::NAME => &asset.name,
        Columns::NETWORK_NAME => text(&asset.network_name),
        Columns::OWNER => text(&asset.owner),
        Columns::TEAM => text(&asset.team),
        Columns::ORDER_NUMBER => text(&asset.order_number),
        Columns::TRACKING_NUMBER => text(&asset.tracking_number),
        Columns::LOCATION => asset.location.as_str(),
        Columns::CATEGORY => asset.category.as_str(),
        Columns::STATUS => asset.status().as_str(),
        Columns::DATE_ADDED => &asset.date_added,
        Columns::NOTES => text(&asset.notes),
        Columns::RACK => deployment.map_or("", |d| d.rack.as_str()),
        Columns::ROW => deployment.map_or("", |d| d.row.as_str()),
        Columns::POSITION => deployment.map_or("", |d| d.position.as_str()),
        Columns::DEPLOYMENT_DATE => deployment.map_or("", |d| d.deployment_date.as_str()),
        Columns::LOANED_TO => loan.map_or("", |l| l.loaned_to.as_str()),
        Columns::LOAN_PURPOSE => loan.map_or("", |l| l.purpose.as_str()),
        Columns::LOAN_DATE => loan.map_or("", |l| l.loan_date.as_str()),
        Columns::EXPECTED_RETURN => loan.map_or("", |l| l.expected_return.as_deref().unwrap_or("")),
        field => asset
            .specifications
            .get(field)
            .map(String::as_str)
            .unwrap_or(""),
    }
}

/// Write assets as CSV with a header row.
pub fn write_assets_csv<W: Write, A: Borrow<Asset>>(writer: W, assets: &[A]) -> Result<()> {
    let headers = asset_headers(assets);
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(&headers)?;
    for asset in assets {
        let asset = asset.borrow();
        csv_writer.write_record(headers.iter().map(|column| asset_cell(asset, column)))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write one row per accessory per location. `location` limits the rows
/// to a single site.
pub fn write_accessories_csv<W: Write, A: Borrow<Accessory>>(
    writer: W,
    accessories: &[A],
    location: Option<Location>,
) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(ACCESSORY_COLUMNS)?;

    let locations: Vec<Location> = match location {
        Some(location) => vec![location],
        None => Location::ALL.to_vec(),
    };
    for accessory in accessories {
        let accessory = accessory.borrow();
        let unit_price = accessory
            .unit_price
            .map(|p| format!("{:.2}", p))
            .unwrap_or_default();
        for location in &locations {
            let quantity = accessory.quantity_at(*location).to_string();
            csv_writer.write_record([
                accessory.accessory_id.as_str(),
                accessory.category.as_str(),
                accessory.model.as_str(),
                accessory.part_number.as_str(),
                accessory.description.as_str(),
                unit_price.as_str(),
                location.as_str(),
                quantity.as_str(),
                accessory.date_added.as_str(),
                accessory.last_updated.as_str(),
            ])?;
        }
    }
    csv_writer.flush()?;
    Ok(())
}

/// `inventory_export_{all|LOC}_{YYYYmmdd_HHMMSS}.csv`
pub fn asset_export_file_name(scope: Option<Location>, now: DateTime<Local>) -> String {
    let scope = scope.map_or("all", |l| l.as_str());
    format!(
        "inventory_export_{}_{}.csv",
        scope,
        now.format(InventoryConfig::EXPORT_TIMESTAMP_FORMAT)
    )
}

/// `accessories_export_{YYYYmmdd_HHMMSS}.csv`
pub fn accessory_export_file_name(now: DateTime<Local>) -> String {
    format!(
        "accessories_export_{}.csv",
        now.format(InventoryConfig::EXPORT_TIMESTAMP_FORMAT)
    )
}

fn create_export_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| InventoryError::io_with_path(e, parent))?;
        }
    }
    File::create(path).map_err(|e| InventoryError::io_with_path(e, path))
}

/// Export assets into `dir` under a timestamped name. Returns the path.
pub fn export_assets_to_dir<A: Borrow<Asset>>(
    dir: &Path,
    assets: &[A],
    scope: Option<Location>,
) -> Result<PathBuf> {
    let path = dir.join(asset_export_file_name(scope, Local::now()));
    write_assets_csv(create_export_file(&path)?, assets)?;
    info!("Exported {} assets to {}", assets.len(), path.display());
    Ok(path)
}

/// Export accessories into `dir` under a timestamped name. Returns the path.
pub fn export_accessories_to_dir<A: Borrow<Accessory>>(
    dir: &Path,
    accessories: &[A],
    location: Option<Location>,
) -> Result<PathBuf> {
    let path = dir.join(accessory_export_file_name(Local::now()));
    write_accessories_csv(create_export_file(&path)?, accessories, location)?;
    info!("Exported {} accessories to {}", accessories.len(), path.display());
    Ok(path)
}

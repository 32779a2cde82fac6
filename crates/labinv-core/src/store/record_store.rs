//! The record store: sole owner of every asset and accessory.
//!
//! Loading never fails. Damaged files are repaired where possible and
//! degrade to an empty collection otherwise, with a warning either way.
//! Every mutation builds the next collection, persists it, and only then
//! replaces the in-memory state, so a failed save leaves that collection
//! as it was. Operations touching both files write assets first and stop
//! at the first failure.

use super::atomic::{atomic_write_json, read_json_repaired};
use crate::config::{DataPaths, InventoryConfig, Location};
use crate::error::{InventoryError, Result};
use crate::identity::{generate_accessory_id, generate_asset_id, is_absent, timestamp_now};
use crate::import::{AppliedImport, ImportPlan, RowAction};
use crate::models::{
    serial_key, Accessory, Asset, AssetCategory, AssetPatch, AssetStatus, NewAccessory,
    NewAsset, ACCESSORY_CATEGORIES,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info, warn};

const DATE_ADDED_FIELD: &str = "date_added";

/// A record kind persisted as a JSON array with a synthesized identity.
trait StoredRecord: Serialize + DeserializeOwned {
    const KIND: &'static str;
    const ID_FIELD: &'static str;

    fn new_id() -> String;
    fn id(&self) -> &str;
    fn id_mut(&mut self) -> &mut String;
    fn date_added(&self) -> &str;
    fn date_added_mut(&mut self) -> &mut String;

    /// Patch a raw record so nulls left by older writers decode.
    fn repair_fields(object: &mut Map<String, Value>);
}

impl StoredRecord for Asset {
    const KIND: &'static str = "asset";
    const ID_FIELD: &'static str = "asset_id";

    fn new_id() -> String {
        generate_asset_id()
    }

    fn id(&self) -> &str {
        &self.asset_id
    }

    fn id_mut(&mut self) -> &mut String {
        &mut self.asset_id
    }

    fn date_added(&self) -> &str {
        &self.date_added
    }

    fn date_added_mut(&mut self) -> &mut String {
        &mut self.date_added
    }

    fn repair_fields(object: &mut Map<String, Value>) {
        ensure_text(object, "name");

        let status_known = object
            .get("status")
            .and_then(Value::as_str)
            .and_then(AssetStatus::from_str)
            .is_some();
        if !status_known {
            object.insert(
                "status".to_string(),
                Value::String(AssetStatus::Available.as_str().to_string()),
            );
        }

        repair_text_map(object, "specifications");
        for info in ["deployment_info", "loan_info"] {
            let keep = match object.get_mut(info) {
                Some(Value::Object(fields)) => {
                    for value in fields.values_mut() {
                        if !value.is_string() {
                            *value = Value::String(text_value(value).unwrap_or_default());
                        }
                    }
                    true
                }
                Some(_) => false,
                None => true,
            };
            if !keep {
                object.remove(info);
            }
        }
    }
}

impl StoredRecord for Accessory {
    const KIND: &'static str = "accessory";
    const ID_FIELD: &'static str = "accessory_id";

    fn new_id() -> String {
        generate_accessory_id()
    }

    fn id(&self) -> &str {
        &self.accessory_id
    }

    fn id_mut(&mut self) -> &mut String {
        &mut self.accessory_id
    }

    fn date_added(&self) -> &str {
        &self.date_added
    }

    fn date_added_mut(&mut self) -> &mut String {
        &mut self.date_added
    }

    fn repair_fields(object: &mut Map<String, Value>) {
        for field in ["category", "model", "part_number", "description", "last_updated"] {
            ensure_text(object, field);
        }
        let keep = match object.get_mut("quantities") {
            Some(Value::Object(counts)) => {
                counts.retain(|_, count| !count.is_null());
                true
            }
            Some(_) => false,
            None => true,
        };
        if !keep {
            object.remove("quantities");
        }
    }
}

/// In-memory inventory backed by two JSON files.
#[derive(Debug)]
pub struct RecordStore {
    paths: DataPaths,
    assets: Vec<Asset>,
    accessories: Vec<Accessory>,
    /// Bumped on every change; import plans remember the value they saw.
    generation: u64,
}

impl RecordStore {
    /// Load both collections from the data directory.
    pub fn open(paths: DataPaths) -> Self {
        let assets: Vec<Asset> = load_records(&paths.assets_file());
        warn_duplicate_serials(&assets);
        let accessories: Vec<Accessory> = load_records(&paths.accessories_file());
        info!(
            "Opened inventory at {}: {} assets, {} accessories",
            paths.root().display(),
            assets.len(),
            accessories.len()
        );
        Self {
            paths,
            assets,
            accessories,
            generation: 0,
        }
    }

    /// Build a store from records already in memory. Nothing is written
    /// until the first mutation or [`RecordStore::save`].
    pub fn from_records(paths: DataPaths, mut assets: Vec<Asset>, mut accessories: Vec<Accessory>) -> Self {
        normalize_identities(&mut assets);
        normalize_identities(&mut accessories);
        Self {
            paths,
            assets,
            accessories,
            generation: 0,
        }
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Discard in-memory state and re-read both files.
    pub fn reload(&mut self) {
        let fresh = Self::open(self.paths.clone());
        self.assets = fresh.assets;
        self.accessories = fresh.accessories;
        self.generation += 1;
    }

    /// Write both collections.
    pub fn save(&mut self) -> Result<()> {
        normalize_identities(&mut self.assets);
        normalize_identities(&mut self.accessories);
        write_records(&self.paths.assets_file(), &self.assets)?;
        write_records(&self.paths.accessories_file(), &self.accessories)?;
        Ok(())
    }

    fn commit_assets(&mut self, mut next: Vec<Asset>) -> Result<()> {
        normalize_identities(&mut next);
        write_records(&self.paths.assets_file(), &next)?;
        self.assets = next;
        self.generation += 1;
        Ok(())
    }

    fn commit_accessories(&mut self, mut next: Vec<Accessory>) -> Result<()> {
        normalize_identities(&mut next);
        write_records(&self.paths.accessories_file(), &next)?;
        self.accessories = next;
        self.generation += 1;
        Ok(())
    }

    // ========================================
    // Asset queries
    // ========================================

    pub fn list_all(&self) -> &[Asset] {
        &self.assets
    }

    pub fn list_by_location(&self, location: Location) -> impl Iterator<Item = &Asset> + '_ {
        self.assets.iter().filter(move |a| a.location == location)
    }

    pub fn find_by_id(&self, asset_id: &str) -> Option<&Asset> {
        let asset_id = asset_id.trim();
        self.assets.iter().find(|a| a.asset_id == asset_id)
    }

    /// Find by serial number, ignoring case and padding. `category`
    /// narrows the search; the first match wins.
    pub fn find_by_serial(&self, serial: &str, category: Option<AssetCategory>) -> Option<&Asset> {
        let key = serial_key(serial);
        if key.is_empty() {
            return None;
        }
        self.assets.iter().find(|a| {
            category.map_or(true, |c| a.category == c)
                && a.serial_number().is_some_and(|s| serial_key(s) == key)
        })
    }

    fn asset_position(&self, asset_id: &str) -> Option<usize> {
        let asset_id = asset_id.trim();
        self.assets.iter().position(|a| a.asset_id == asset_id)
    }

    // ========================================
    // Asset mutations
    // ========================================

    /// Add an asset submitted through the form.
    ///
    /// Unlike import, every required field must be filled in, and a serial
    /// already used in the category is rejected.
    pub fn add_asset(&mut self, new: NewAsset) -> Result<Asset> {
        let missing = new.missing_fields();
        if !missing.is_empty() {
            return Err(InventoryError::MissingFields { missing });
        }

        let asset = new.into_asset(generate_asset_id(), timestamp_now());
        ensure_serial_free(&self.assets, &asset)?;

        let mut next = self.assets.clone();
        next.push(asset.clone());
        self.commit_assets(next)?;
        info!("Added asset {} ({})", asset.asset_id, asset.name);
        Ok(asset)
    }

    /// Merge `patch` into one asset. Returns `false` if the id is unknown.
    pub fn update(&mut self, asset_id: &str, patch: &AssetPatch) -> Result<bool> {
        let Some(pos) = self.asset_position(asset_id) else {
            debug!("Update skipped, no asset {}", asset_id);
            return Ok(false);
        };

        let mut next = self.assets.clone();
        patch_checked(&mut next, pos, patch)?;
        self.commit_assets(next)?;
        debug!("Updated asset {}", asset_id);
        Ok(true)
    }

    /// Apply one patch to many assets and save once. Unknown ids are
    /// ignored. Returns how many assets were changed.
    pub fn bulk_update<I, S>(&mut self, asset_ids: I, patch: &AssetPatch) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut next = self.assets.clone();
        let mut changed = 0;
        for asset_id in asset_ids {
            let asset_id = asset_id.as_ref().trim();
            match next.iter().position(|a| a.asset_id == asset_id) {
                Some(pos) => {
                    patch_checked(&mut next, pos, patch)?;
                    changed += 1;
                }
                None => warn!("Bulk update skipped unknown asset {}", asset_id),
            }
        }

        if changed > 0 {
            self.commit_assets(next)?;
            info!("Bulk updated {} assets", changed);
        }
        Ok(changed)
    }

    /// Remove one asset. Returns `false` if the id is unknown.
    pub fn delete(&mut self, asset_id: &str) -> Result<bool> {
        let Some(pos) = self.asset_position(asset_id) else {
            return Ok(false);
        };
        let mut next = self.assets.clone();
        let removed = next.remove(pos);
        self.commit_assets(next)?;
        info!("Deleted asset {} ({})", removed.asset_id, removed.name);
        Ok(true)
    }

    /// Remove every asset at `location` and zero its accessory counts.
    /// Returns the number of assets removed.
    pub fn clear_location(&mut self, location: Location) -> Result<usize> {
        let next: Vec<Asset> = self
            .assets
            .iter()
            .filter(|a| a.location != location)
            .cloned()
            .collect();
        let removed = self.assets.len() - next.len();

        self.commit_assets(next)?;

        let holds_stock = self
            .accessories
            .iter()
            .any(|a| a.quantities.contains_key(&location));
        if holds_stock {
            let now = timestamp_now();
            let mut accessories = self.accessories.clone();
            for accessory in accessories.iter_mut() {
                if accessory.quantities.remove(&location).is_some() {
                    accessory.last_updated = now.clone();
                }
            }
            self.commit_accessories(accessories)?;
        }

        warn!("Cleared {} assets at {}", removed, location);
        Ok(removed)
    }

    /// Remove every asset and accessory. The previous files survive as
    /// `.bak` copies.
    pub fn clear_all(&mut self) -> Result<usize> {
        let removed = self.assets.len() + self.accessories.len();
        self.commit_assets(Vec::new())?;
        self.commit_accessories(Vec::new())?;
        warn!("Cleared all inventory data ({} records)", removed);
        Ok(removed)
    }

    /// Commit an import plan in row order and save once.
    ///
    /// Fails with [`InventoryError::StalePlan`] if the store changed since
    /// the plan was computed.
    pub fn apply_import(&mut self, plan: &ImportPlan) -> Result<AppliedImport> {
        if plan.generation != self.generation {
            return Err(InventoryError::StalePlan);
        }
        let mut applied = AppliedImport::default();
        if !plan.has_changes() {
            return Ok(applied);
        }

        let mut next = self.assets.clone();
        let mut positions: HashMap<String, usize> = next
            .iter()
            .enumerate()
            .map(|(i, a)| (a.asset_id.clone(), i))
            .collect();

        for planned in &plan.rows {
            let asset = match &planned.action {
                RowAction::New(asset) | RowAction::Update(asset) => asset,
                RowAction::Duplicate(_) | RowAction::Skip(_) => continue,
            };
            match positions.get(&asset.asset_id) {
                Some(&pos) => {
                    next[pos] = asset.clone();
                    applied.replaced += 1;
                }
                None => {
                    positions.insert(asset.asset_id.clone(), next.len());
                    next.push(asset.clone());
                    applied.inserted += 1;
                }
            }
        }

        self.commit_assets(next)?;
        info!(
            "Import applied: {} inserted, {} replaced",
            applied.inserted, applied.replaced
        );
        Ok(applied)
    }

    // ========================================
    // Accessories
    // ========================================

    pub fn list_accessories(&self) -> &[Accessory] {
        &self.accessories
    }

    pub fn find_accessory(&self, accessory_id: &str) -> Option<&Accessory> {
        let accessory_id = accessory_id.trim();
        self.accessories.iter().find(|a| a.accessory_id == accessory_id)
    }

    fn accessory_position(&self, accessory_id: &str) -> Result<usize> {
        let accessory_id = accessory_id.trim();
        self.accessories
            .iter()
            .position(|a| a.accessory_id == accessory_id)
            .ok_or_else(|| InventoryError::AccessoryNotFound {
                accessory_id: accessory_id.to_string(),
            })
    }

    /// Add an accessory. The model must be new within its category.
    pub fn add_accessory(&mut self, new: NewAccessory) -> Result<Accessory> {
        let missing = new.missing_fields();
        if !missing.is_empty() {
            return Err(InventoryError::MissingFields { missing });
        }
        let category = new.category.trim();
        if !ACCESSORY_CATEGORIES.contains(&category) {
            return Err(InventoryError::Validation {
                field: "category".to_string(),
                message: format!(
                    "Unknown accessory category '{}', expected one of: {}",
                    category,
                    ACCESSORY_CATEGORIES.join(", ")
                ),
            });
        }
        if let Some(existing) = self
            .accessories
            .iter()
            .find(|a| a.same_model(category, &new.model))
        {
            return Err(InventoryError::DuplicateAccessoryModel {
                model: new.model.trim().to_string(),
                category: category.to_string(),
                existing_id: existing.accessory_id.clone(),
            });
        }

        let accessory = new.into_accessory(generate_accessory_id(), timestamp_now());
        let mut next = self.accessories.clone();
        next.push(accessory.clone());
        self.commit_accessories(next)?;
        info!("Added accessory {} ({})", accessory.accessory_id, accessory.model);
        Ok(accessory)
    }

    /// Add `delta` (negative to remove) to the count at `location`.
    /// Returns the new count; a result below zero is rejected.
    pub fn adjust_quantity(&mut self, accessory_id: &str, location: Location, delta: i64) -> Result<u32> {
        let pos = self.accessory_position(accessory_id)?;
        let accessory = &self.accessories[pos];
        let available = accessory.quantity_at(location);

        let updated = i64::from(available)
            .checked_add(delta)
            .ok_or_else(|| quantity_out_of_range(delta))?;
        if updated < 0 {
            return Err(InventoryError::InsufficientQuantity {
                accessory_id: accessory.accessory_id.clone(),
                location: location.to_string(),
                available,
                requested: delta.unsigned_abs(),
            });
        }
        let updated = u32::try_from(updated).map_err(|_| quantity_out_of_range(updated))?;

        self.write_quantity(pos, location, updated)?;
        Ok(updated)
    }

    /// Overwrite the count at `location`.
    pub fn set_quantity(&mut self, accessory_id: &str, location: Location, quantity: u32) -> Result<()> {
        let pos = self.accessory_position(accessory_id)?;
        self.write_quantity(pos, location, quantity)
    }

    fn write_quantity(&mut self, pos: usize, location: Location, quantity: u32) -> Result<()> {
        let mut next = self.accessories.clone();
        let accessory = &mut next[pos];
        accessory.quantities.insert(location, quantity);
        accessory.last_updated = timestamp_now();
        debug!(
            "Accessory {} at {} now {}",
            accessory.accessory_id, location, quantity
        );
        self.commit_accessories(next)
    }

    /// Remove one accessory. Returns `false` if the id is unknown.
    pub fn delete_accessory(&mut self, accessory_id: &str) -> Result<bool> {
        let Ok(pos) = self.accessory_position(accessory_id) else {
            return Ok(false);
        };
        let mut next = self.accessories.clone();
        let removed = next.remove(pos);
        self.commit_accessories(next)?;
        info!("Deleted accessory {} ({})", removed.accessory_id, removed.model);
        Ok(true)
    }
}

fn quantity_out_of_range(value: i64) -> InventoryError {
    InventoryError::Validation {
        field: "quantity".to_string(),
        message: format!("{} is outside the supported range", value),
    }
}

/// Apply `patch` to `assets[pos]`, rejecting a serial another record of
/// the same category already uses.
fn patch_checked(assets: &mut [Asset], pos: usize, patch: &AssetPatch) -> Result<()> {
    let before = identity_key(&assets[pos]);
    patch.apply_to(&mut assets[pos]);
    let assets: &[Asset] = assets;
    if identity_key(&assets[pos]) != before {
        ensure_serial_free(assets, &assets[pos])?;
    }
    Ok(())
}

fn identity_key(asset: &Asset) -> (AssetCategory, Option<String>) {
    (asset.category, asset.serial_number().map(serial_key))
}

fn ensure_serial_free(assets: &[Asset], asset: &Asset) -> Result<()> {
    let Some(serial) = asset.serial_number() else {
        return Ok(());
    };
    let key = serial_key(serial);
    let holder = assets.iter().find(|other| {
        other.asset_id != asset.asset_id
            && other.category == asset.category
            && other.serial_number().is_some_and(|s| serial_key(s) == key)
    });
    match holder {
        Some(holder) => Err(InventoryError::DuplicateSerial {
            serial: serial.to_string(),
            category: asset.category.to_string(),
            existing_id: holder.asset_id.clone(),
        }),
        None => Ok(()),
    }
}

fn load_records<T: StoredRecord>(path: &Path) -> Vec<T> {
    let value = match read_json_repaired(path) {
        Ok(Some(value)) => value,
        Ok(None) => {
            debug!("No {} file at {}", T::KIND, path.display());
            return Vec::new();
        }
        Err(e) => {
            warn!("Could not load {} records, starting empty: {}", T::KIND, e);
            return Vec::new();
        }
    };

    let Value::Array(items) = value else {
        warn!(
            "{} does not hold a JSON array, starting with no {} records",
            path.display(),
            T::KIND
        );
        return Vec::new();
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, mut item) in items.into_iter().enumerate() {
        repair_record::<T>(&mut item);
        match serde_json::from_value::<T>(item) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Dropping {} record #{} in {}: {}", T::KIND, index, path.display(), e),
        }
    }

    normalize_identities(&mut records);
    debug!("Loaded {} {} records from {}", records.len(), T::KIND, path.display());
    records
}

/// Fill in a missing id or `date_added` on a raw JSON record, then let the
/// record kind patch its own nulls. Only records that still fail after
/// this are dropped.
fn repair_record<T: StoredRecord>(item: &mut Value) {
    let Some(object) = item.as_object_mut() else {
        return;
    };

    let repairs: [(&str, fn() -> String); 2] = [
        (T::ID_FIELD, T::new_id),
        (DATE_ADDED_FIELD, timestamp_now),
    ];
    for (field, synthesize) in repairs {
        let replacement = match object.get(field) {
            Some(Value::String(s)) if !is_absent(s) => continue,
            Some(Value::Number(n)) => n.to_string(),
            _ => synthesize(),
        };
        warn!("Repaired {} {} as {}", T::KIND, field, replacement);
        object.insert(field.to_string(), Value::String(replacement));
    }
    T::repair_fields(object);
}

/// Scalars as text. `None` for null.
fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Make `field` a string: numbers are kept as text, anything else blank.
fn ensure_text(object: &mut Map<String, Value>, field: &str) {
    let text = match object.get(field) {
        Some(Value::String(_)) => return,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };
    object.insert(field.to_string(), Value::String(text));
}

/// Keep a string map decodable: null entries are dropped, other values
/// become text. A non-object is removed so the default applies.
fn repair_text_map(object: &mut Map<String, Value>, field: &str) {
    let repaired: Option<Map<String, Value>> = match object.get_mut(field) {
        Some(Value::Object(map)) => Some(
            std::mem::take(map)
                .into_iter()
                .filter_map(|(key, value)| text_value(&value).map(|v| (key, Value::String(v))))
                .collect(),
        ),
        Some(_) => None,
        None => return,
    };
    match repaired {
        Some(map) => {
            object.insert(field.to_string(), Value::Object(map));
        }
        None => {
            object.remove(field);
        }
    }
}

/// Give every record a usable, unique id and a `date_added`.
fn normalize_identities<T: StoredRecord>(records: &mut [T]) {
    let mut seen = HashSet::new();
    for record in records.iter_mut() {
        if is_absent(record.id()) {
            *record.id_mut() = T::new_id();
        }
        if is_absent(record.date_added()) {
            *record.date_added_mut() = timestamp_now();
        }
        while !seen.insert(record.id().to_string()) {
            let fresh = T::new_id();
            warn!("Duplicate {} id {} re-keyed as {}", T::KIND, record.id(), fresh);
            *record.id_mut() = fresh;
        }
    }
}

fn warn_duplicate_serials(assets: &[Asset]) {
    let mut seen: HashMap<(AssetCategory, String), &str> = HashMap::new();
    for asset in assets {
        let Some(serial) = asset.serial_number() else {
            continue;
        };
        if let Some(first) = seen.insert((asset.category, serial_key(serial)), &asset.asset_id) {
            warn!(
                "Serial {} ({}) is held by both {} and {}",
                serial, asset.category, first, asset.asset_id
            );
        }
    }
}

fn write_records<T: StoredRecord>(path: &Path, records: &[T]) -> Result<()> {
    atomic_write_json(path, records, InventoryConfig::KEEP_BACKUP)?;
    debug!("Saved {} {} records to {}", records.len(), T::KIND, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::{ImportRow, Reconciler};
    use crate::models::AssetState;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::TempDir;

    fn open_store(temp_dir: &TempDir) -> RecordStore {
        RecordStore::open(DataPaths::new(temp_dir.path()))
    }

    fn new_switch(name: &str, serial: &str) -> NewAsset {
        let mut specifications = BTreeMap::new();
        specifications.insert("Model".to_string(), "MS220".to_string());
        specifications.insert("Serial Number".to_string(), serial.to_string());
        specifications.insert("MAC Address".to_string(), "00:11:22:33:44:55".to_string());
        NewAsset {
            name: name.to_string(),
            location: Location::SJ,
            category: AssetCategory::MerakiSwitch,
            specifications,
            ..Default::default()
        }
    }

    fn new_cable(model: &str) -> NewAccessory {
        NewAccessory {
            category: "Power Cable".to_string(),
            model: model.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_open_without_files_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = open_store(&temp_dir);
        assert!(store.list_all().is_empty());
        assert!(store.list_accessories().is_empty());
    }

    #[test]
    fn test_save_and_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_store(&temp_dir);
        let added = store.add_asset(new_switch("SW1", "Q2XX-1")).unwrap();
        store.add_accessory(new_cable("C13 2m")).unwrap();

        let reopened = open_store(&temp_dir);
        assert_eq!(reopened.list_all(), store.list_all());
        assert_eq!(reopened.list_accessories(), store.list_accessories());
        assert_eq!(reopened.find_by_id(&added.asset_id), Some(&added));
    }

    #[test]
    fn test_load_repairs_identity_and_drops_bad_records() {
        let temp_dir = TempDir::new().unwrap();
        let raw = r#"[
            {"asset_id": NaN, "name": "a", "location": "SF", "category": "SFP", "status": "Available", "date_added": null},
            {"asset_id": "nan", "name": "b", "location": "SJ", "category": "SFP", "status": "Available"},
            {"asset_id": "AST-1", "name": "c", "location": "RTP", "category": "SFP", "status": "Available", "date_added": "2024-01-01 10:00"},
            {"asset_id": "AST-1", "name": "d", "location": "BGL", "category": "SFP", "status": "Available", "date_added": "2024-01-01 10:00"},
            {"asset_id": "AST-2", "name": "e", "location": "NYC", "category": "SFP", "status": "Available"}
        ]"#;
        fs::write(temp_dir.path().join("inventory_data.json"), raw).unwrap();

        let store = open_store(&temp_dir);
        let assets = store.list_all();
        assert_eq!(assets.len(), 4);

        let ids: HashSet<&str> = assets.iter().map(|a| a.asset_id.as_str()).collect();
        assert_eq!(ids.len(), 4);
        assert!(ids.contains("AST-1"));
        assert!(assets[0].asset_id.starts_with("AST-"));
        assert!(assets[1].asset_id.starts_with("AST-"));
        assert!(assets.iter().all(|a| !a.date_added.is_empty()));
        assert_eq!(store.find_by_id("AST-1").unwrap().name, "c");
    }

    #[test]
    fn test_unparseable_file_degrades_to_empty() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("inventory_data.json"), "{not json").unwrap();
        fs::write(temp_dir.path().join("accessories_data.json"), r#"{"a": 1}"#).unwrap();
        let store = open_store(&temp_dir);
        assert!(store.list_all().is_empty());
        assert!(store.list_accessories().is_empty());
    }

    #[test]
    fn test_add_asset_requires_every_field() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_store(&temp_dir);
        let mut new = new_switch("", "S1");
        new.specifications.remove("MAC Address");
        new.state = AssetState::deployed("R1", "", "U4");

        match store.add_asset(new) {
            Err(InventoryError::MissingFields { missing }) => assert_eq!(
                missing,
                vec!["Asset Name", "MAC Address", "Deployment Information"]
            ),
            other => panic!("expected missing fields, got {:?}", other),
        }
        assert!(store.list_all().is_empty());
        assert!(!temp_dir.path().join("inventory_data.json").exists());
    }

    #[test]
    fn test_add_asset_rejects_duplicate_serial_in_category() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_store(&temp_dir);
        let first = store.add_asset(new_switch("SW1", "q2xx-1")).unwrap();

        match store.add_asset(new_switch("SW2", " Q2XX-1 ")) {
            Err(InventoryError::DuplicateSerial { existing_id, .. }) => {
                assert_eq!(existing_id, first.asset_id)
            }
            other => panic!("expected duplicate serial, got {:?}", other),
        }

        let mut hp = new_switch("HP1", "Q2XX-1");
        hp.category = AssetCategory::HpSwitch;
        store.add_asset(hp).unwrap();
        assert_eq!(store.list_all().len(), 2);
    }

    #[test]
    fn test_find_by_serial() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_store(&temp_dir);
        let added = store.add_asset(new_switch("SW1", "Q2XX-1")).unwrap();

        assert_eq!(store.find_by_serial(" q2xx-1", None), Some(&added));
        assert_eq!(
            store.find_by_serial("Q2XX-1", Some(AssetCategory::MerakiSwitch)),
            Some(&added)
        );
        assert_eq!(store.find_by_serial("Q2XX-1", Some(AssetCategory::Sfp)), None);
        assert_eq!(store.find_by_serial("  ", None), None);
    }

    #[test]
    fn test_update_merges_and_persists() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_store(&temp_dir);
        let added = store.add_asset(new_switch("SW1", "S1")).unwrap();

        let patch = AssetPatch {
            owner: Some("dana".to_string()),
            state: Some(AssetState::loaned("kim", "demo", None)),
            ..Default::default()
        };
        assert!(store.update(&added.asset_id, &patch).unwrap());
        assert!(!store.update("AST-missing", &patch).unwrap());

        let reopened = open_store(&temp_dir);
        let asset = reopened.find_by_id(&added.asset_id).unwrap();
        assert_eq!(asset.owner.as_deref(), Some("dana"));
        assert_eq!(asset.name, "SW1");
        assert_eq!(asset.loan_info().unwrap().loaned_to, "kim");
    }

    #[test]
    fn test_update_rejects_serial_collision() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_store(&temp_dir);
        store.add_asset(new_switch("SW1", "S1")).unwrap();
        let second = store.add_asset(new_switch("SW2", "S2")).unwrap();

        let mut patch = AssetPatch::default();
        patch
            .set_specifications
            .insert("Serial Number".to_string(), "s1".to_string());
        assert!(matches!(
            store.update(&second.asset_id, &patch),
            Err(InventoryError::DuplicateSerial { .. })
        ));
        assert_eq!(
            store.find_by_id(&second.asset_id).unwrap().serial_number(),
            Some("S2")
        );
    }

    #[test]
    fn test_bulk_update_and_delete() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_store(&temp_dir);
        let a = store.add_asset(new_switch("SW1", "S1")).unwrap();
        let b = store.add_asset(new_switch("SW2", "S2")).unwrap();

        let patch = AssetPatch {
            team: Some("netops".to_string()),
            location: Some(Location::RTP),
            ..Default::default()
        };
        let changed = store
            .bulk_update([a.asset_id.as_str(), b.asset_id.as_str(), "AST-nope"], &patch)
            .unwrap();
        assert_eq!(changed, 2);
        assert_eq!(store.list_by_location(Location::RTP).count(), 2);

        assert!(store.delete(&a.asset_id).unwrap());
        assert!(!store.delete(&a.asset_id).unwrap());
        assert_eq!(open_store(&temp_dir).list_all().len(), 1);
    }

    #[test]
    fn test_clear_location_and_clear_all() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_store(&temp_dir);
        store.add_asset(new_switch("SW1", "S1")).unwrap();
        let mut sf = new_switch("SW2", "S2");
        sf.location = Location::SF;
        store.add_asset(sf).unwrap();
        let cable = store.add_accessory(new_cable("C13")).unwrap();
        store.set_quantity(&cable.accessory_id, Location::SJ, 5).unwrap();
        store.set_quantity(&cable.accessory_id, Location::SF, 2).unwrap();

        assert_eq!(store.clear_location(Location::SJ).unwrap(), 1);
        assert_eq!(store.list_all().len(), 1);
        let cable = store.find_accessory(&cable.accessory_id).unwrap();
        assert_eq!(cable.quantity_at(Location::SJ), 0);
        assert_eq!(cable.quantity_at(Location::SF), 2);

        assert_eq!(store.clear_all().unwrap(), 2);
        let reopened = open_store(&temp_dir);
        assert!(reopened.list_all().is_empty());
        assert!(reopened.list_accessories().is_empty());
        assert!(temp_dir.path().join("inventory_data.json.bak").exists());
    }

    #[test]
    fn test_apply_import_commits_once_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_store(&temp_dir);
        let existing = store.add_asset(new_switch("SW1", "S1")).unwrap();

        let rows = vec![
            ImportRow::from_pairs([("Name", "fresh"), ("Category", "SFP")]),
            ImportRow::from_pairs([
                ("Asset ID", existing.asset_id.as_str()),
                ("Name", "SW1 moved"),
                ("Location", "BGL"),
                ("Category", "Meraki Switch"),
                ("Serial Number", "S1"),
            ]),
            ImportRow::from_pairs([
                ("Name", "copy"),
                ("Category", "Meraki Switch"),
                ("Serial Number", "s1"),
            ]),
        ];
        let plan = Reconciler::new(&store).plan_rows(rows);
        let applied = store.apply_import(&plan).unwrap();

        assert_eq!(applied, AppliedImport { inserted: 1, replaced: 1 });
        let reopened = open_store(&temp_dir);
        assert_eq!(reopened.list_all().len(), 2);
        let moved = reopened.find_by_id(&existing.asset_id).unwrap();
        assert_eq!(moved.location, Location::BGL);
        assert_eq!(moved.name, "SW1 moved");
    }

    #[test]
    fn test_apply_import_rejects_stale_plan() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_store(&temp_dir);
        let plan =
            Reconciler::new(&store).plan_rows([ImportRow::from_pairs([("Name", "x"), ("Serial Number", "S1")])]);

        store.add_asset(new_switch("SW1", "S1")).unwrap();
        assert!(matches!(
            store.apply_import(&plan),
            Err(InventoryError::StalePlan)
        ));
        assert_eq!(store.list_all().len(), 1);
    }

    #[test]
    fn test_accessory_quantities() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_store(&temp_dir);
        let cable = store.add_accessory(new_cable("C13 2m")).unwrap();
        let id = cable.accessory_id.as_str();

        assert_eq!(store.adjust_quantity(id, Location::SF, 10).unwrap(), 10);
        assert_eq!(store.adjust_quantity(id, Location::SF, -4).unwrap(), 6);
        match store.adjust_quantity(id, Location::SF, -7) {
            Err(InventoryError::InsufficientQuantity {
                available,
                requested,
                ..
            }) => {
                assert_eq!(available, 6);
                assert_eq!(requested, 7);
            }
            other => panic!("expected insufficient quantity, got {:?}", other),
        }
        assert!(matches!(
            store.adjust_quantity("ACC-nope", Location::SF, 1),
            Err(InventoryError::AccessoryNotFound { .. })
        ));

        store.set_quantity(id, Location::BGL, 3).unwrap();
        let reopened = open_store(&temp_dir);
        let saved = reopened.find_accessory(id).unwrap();
        assert_eq!(saved.quantity_at(Location::SF), 6);
        assert_eq!(saved.total_quantity(), 9);
    }

    #[test]
    fn test_add_accessory_validation() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_store(&temp_dir);
        store.add_accessory(new_cable("C13 2m")).unwrap();

        assert!(matches!(
            store.add_accessory(new_cable(" c13 2M ")),
            Err(InventoryError::DuplicateAccessoryModel { .. })
        ));
        let mut odd = new_cable("Widget");
        odd.category = "Gadgets".to_string();
        assert!(matches!(
            store.add_accessory(odd),
            Err(InventoryError::Validation { .. })
        ));
        assert!(matches!(
            store.add_accessory(new_cable("")),
            Err(InventoryError::MissingFields { .. })
        ));

        let mut other_category = new_cable("C13 2m");
        other_category.category = "Other".to_string();
        store.add_accessory(other_category).unwrap();
        assert_eq!(store.list_accessories().len(), 2);
    }

    #[test]
    fn test_delete_accessory() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_store(&temp_dir);
        let cable = store.add_accessory(new_cable("C13")).unwrap();
        assert!(store.delete_accessory(&cable.accessory_id).unwrap());
        assert!(!store.delete_accessory(&cable.accessory_id).unwrap());
        assert!(store.list_accessories().is_empty());
    }

    #[test]
    fn test_load_keeps_records_with_null_fields() {
        let temp_dir = TempDir::new().unwrap();
        let assets = r#"[
            {"asset_id": "AST-1", "name": "SW1", "location": "SF", "category": "Meraki Switch", "status": "Available",
             "specifications": {"Model": "MS220", "Firmware Version": NaN, "Port Count": 48}, "date_added": "2024-01-01 10:00"},
            {"asset_id": "AST-2", "name": "PDU", "location": "SJ", "category": "Raritan PDU", "status": "Deployed",
             "deployment_info": {"rack": NaN, "row": "B", "position": "U1", "deployment_date": "2024-01-02 10:00"},
             "date_added": "2024-01-01 10:00"},
            {"asset_id": "AST-3", "name": NaN, "location": "RTP", "category": "SFP", "status": null, "date_added": "2024-01-01 10:00"},
            {"asset_id": "AST-4", "name": "lost", "location": "NYC", "category": "SFP", "status": "Available"}
        ]"#;
        let accessories = r#"[
            {"accessory_id": "ACC-1", "category": "Power Cable", "model": "C13", "part_number": NaN,
             "quantities": {"SF": 3, "SJ": NaN}, "date_added": "2024-01-01 10:00", "last_updated": NaN}
        ]"#;
        fs::write(temp_dir.path().join("inventory_data.json"), assets).unwrap();
        fs::write(temp_dir.path().join("accessories_data.json"), accessories).unwrap();

        let mut store = open_store(&temp_dir);
        assert_eq!(store.list_all().len(), 3);

        let switch = store.find_by_id("AST-1").unwrap();
        assert!(!switch.specifications.contains_key("Firmware Version"));
        assert_eq!(switch.specifications.get("Port Count").map(String::as_str), Some("48"));
        assert_eq!(store.find_by_id("AST-2").unwrap().deployment_info().unwrap().rack, "");
        let optic = store.find_by_id("AST-3").unwrap();
        assert_eq!(optic.name, "");
        assert_eq!(optic.status(), AssetStatus::Available);

        let cable = store.find_accessory("ACC-1").unwrap();
        assert_eq!(cable.quantity_at(Location::SF), 3);
        assert_eq!(cable.quantity_at(Location::SJ), 0);
        assert_eq!(cable.part_number, "");

        store.save().unwrap();
        let reopened = open_store(&temp_dir);
        assert_eq!(reopened.list_all().len(), 3);
        assert_eq!(reopened.list_accessories().len(), 1);
    }

    #[test]
    fn test_failed_asset_write_leaves_accessories_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let paths = DataPaths::new(temp_dir.path());
        // A directory where the assets file belongs makes the rename fail.
        fs::create_dir(paths.assets_file()).unwrap();

        let asset = new_switch("SW1", "S1").into_asset("AST-1".to_string(), "2024-01-01 10:00".to_string());
        let mut cable = new_cable("C13");
        cable.quantities.insert(Location::SJ, 5);
        let cable = cable.into_accessory("ACC-1".to_string(), "2024-01-01 10:00".to_string());
        let mut store = RecordStore::from_records(paths.clone(), vec![asset], vec![cable]);

        assert!(store.clear_location(Location::SJ).is_err());
        assert!(store.clear_all().is_err());
        assert_eq!(store.list_all().len(), 1);
        assert_eq!(store.list_accessories()[0].quantity_at(Location::SJ), 5);
        assert!(!paths.accessories_file().exists());
    }

    #[test]
    fn test_reload_sees_other_writers_and_stales_plans() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = open_store(&temp_dir);
        let plan = Reconciler::new(&store).plan_rows([ImportRow::from_pairs([("Name", "x")])]);

        let mut other = open_store(&temp_dir);
        other.add_asset(new_switch("SW1", "S1")).unwrap();
        assert!(store.list_all().is_empty());

        store.reload();
        assert_eq!(store.list_all().len(), 1);
        assert!(matches!(
            store.apply_import(&plan),
            Err(InventoryError::StalePlan)
        ));
    }
}

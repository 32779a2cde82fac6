//! Crash-safe JSON persistence.
//!
//! Writes go through a temp file with a PID+TID suffix, are fsynced, and
//! then renamed over the target, so a crash mid-save leaves either the old
//! file or the new one. Reads are lenient: the bare `NaN` tokens older
//! versions wrote are repaired before parsing.

use crate::{InventoryError, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use std::thread;
use tracing::{debug, warn};

/// Read a JSON file, repairing `NaN` tokens.
///
/// Returns `None` if the file doesn't exist.
pub fn read_json_repaired(path: &Path) -> Result<Option<Value>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path).map_err(|e| InventoryError::Io {
        message: format!("Failed to read {}", path.display()),
        path: Some(path.to_path_buf()),
        source: Some(e),
    })?;

    let repaired = repair_nan_tokens(&contents);
    if repaired.len() != contents.len() {
        warn!("Replaced NaN values with null in {}", path.display());
    }

    let value = serde_json::from_str(&repaired).map_err(|e| InventoryError::Json {
        message: format!("Failed to parse {}: {}", path.display(), e),
        source: Some(e),
    })?;

    Ok(Some(value))
}

/// `NaN` is not JSON. Older writers emitted it as a bare value.
fn repair_nan_tokens(contents: &str) -> String {
    contents.replace(": NaN", ": null").replace(":NaN", ":null")
}

/// Write data to a JSON file atomically.
///
/// 1. Serializes `data` pretty-printed
/// 2. Writes it to a unique temp file next to `path` and fsyncs it
/// 3. Copies the current file to `<name>.json.bak` if `keep_backup`
/// 4. Renames the temp file over `path`
pub fn atomic_write_json<T: Serialize + ?Sized>(path: &Path, data: &T, keep_backup: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| InventoryError::Io {
                message: format!("Failed to create directory {}", parent.display()),
                path: Some(parent.to_path_buf()),
                source: Some(e),
            })?;
        }
    }

    let serialized = serde_json::to_string_pretty(data).map_err(|e| InventoryError::Json {
        message: format!("Failed to serialize {}: {}", path.display(), e),
        source: Some(e),
    })?;

    let temp_path = temp_path_for(path);
    if let Err(e) = write_synced(&temp_path, serialized.as_bytes()) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    if keep_backup && path.exists() {
        let backup_path = path.with_extension("json.bak");
        match fs::copy(path, &backup_path) {
            Ok(_) => debug!("Created backup: {}", backup_path.display()),
            // A missing backup never blocks the save.
            Err(e) => warn!("Failed to create backup {}: {}", backup_path.display(), e),
        }
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        InventoryError::Io {
            message: format!("Failed to rename {} to {}", temp_path.display(), path.display()),
            path: Some(path.to_path_buf()),
            source: Some(e),
        }
    })?;

    debug!("Atomically wrote {}", path.display());
    Ok(())
}

fn write_synced(temp_path: &Path, bytes: &[u8]) -> Result<()> {
    let io_err = |message: &str, e: std::io::Error| InventoryError::Io {
        message: format!("{} {}", message, temp_path.display()),
        path: Some(temp_path.to_path_buf()),
        source: Some(e),
    };

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp_path)
        .map_err(|e| io_err("Failed to create temp file", e))?;
    file.write_all(bytes)
        .map_err(|e| io_err("Failed to write temp file", e))?;
    file.sync_all()
        .map_err(|e| io_err("Failed to sync temp file", e))?;
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    path.with_extension(format!("json.{}.{}.tmp", process::id(), thread_id()))
}

/// Numeric identifier for the current thread.
fn thread_id() -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let mut hasher = DefaultHasher::new();
    thread::current().id().hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.json");

        atomic_write_json(&path, &json!([{"a": 1}]), false).unwrap();
        let value = read_json_repaired(&path).unwrap().unwrap();
        assert_eq!(value, json!([{"a": 1}]));
    }

    #[test]
    fn test_read_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.json");
        assert!(read_json_repaired(&path).unwrap().is_none());
    }

    #[test]
    fn test_read_repairs_nan() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nan.json");
        fs::write(&path, r#"[{"asset_id": NaN, "value":NaN, "name": "NaN box"}]"#).unwrap();

        let value = read_json_repaired(&path).unwrap().unwrap();
        assert_eq!(value[0]["asset_id"], Value::Null);
        assert_eq!(value[0]["value"], Value::Null);
        assert_eq!(value[0]["name"], "NaN box");
    }

    #[test]
    fn test_write_keeps_backup_and_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.json");

        atomic_write_json(&path, &json!({"v": 1}), true).unwrap();
        atomic_write_json(&path, &json!({"v": 2}), true).unwrap();

        let backup = read_json_repaired(&path.with_extension("json.bak"))
            .unwrap()
            .unwrap();
        assert_eq!(backup, json!({"v": 1}));
        assert_eq!(read_json_repaired(&path).unwrap().unwrap(), json!({"v": 2}));

        let leftovers = fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_write_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("dir").join("data.json");
        atomic_write_json(&path, &json!([]), false).unwrap();
        assert!(path.exists());
    }
}

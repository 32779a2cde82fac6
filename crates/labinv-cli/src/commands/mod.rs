//! Subcommands, split by area.

mod accessories;
mod assets;
mod data;

use anyhow::Result;
use clap::{Args, Subcommand};
use labinv_core::{AssetCategory, AssetPatch, AssetState, AssetStatus, Location, RecordStore};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List assets, optionally filtered
    List(assets::ListArgs),
    /// Show one asset in full
    Show {
        asset_id: String,
        /// Print the stored JSON record
        #[arg(long)]
        json: bool,
    },
    /// Add an asset; every required field must be given
    Add(assets::AddArgs),
    /// Change fields of one asset
    Edit {
        asset_id: String,
        #[command(flatten)]
        patch: PatchArgs,
    },
    /// Apply the same change to several assets
    BulkEdit {
        #[arg(required = true)]
        asset_ids: Vec<String>,
        #[command(flatten)]
        patch: PatchArgs,
    },
    /// Delete an asset
    Delete {
        asset_id: String,
        /// Actually delete; without it the command only warns
        #[arg(long)]
        confirm: bool,
    },
    /// Import assets from a CSV file
    Import {
        file: PathBuf,
        /// Show what would change without saving
        #[arg(long)]
        dry_run: bool,
    },
    /// Export assets to a timestamped CSV file
    Export {
        #[arg(long, value_parser = parse_location)]
        location: Option<Location>,
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Print the dashboard summary
    Summary {
        #[arg(long)]
        json: bool,
    },
    /// Remove all assets at one location, or everything
    Clear {
        #[arg(long, value_parser = parse_location)]
        location: Option<Location>,
        /// Actually clear; without it the command only warns
        #[arg(long)]
        confirm: bool,
    },
    /// Manage bulk accessories
    #[command(subcommand)]
    Accessory(accessories::AccessoryCommand),
}

pub fn run(command: Command, store: &mut RecordStore) -> Result<()> {
    match command {
        Command::List(args) => assets::list(store, &args),
        Command::Show { asset_id, json } => assets::show(store, &asset_id, json),
        Command::Add(args) => assets::add(store, args),
        Command::Edit { asset_id, patch } => assets::edit(store, &asset_id, patch),
        Command::BulkEdit { asset_ids, patch } => assets::bulk_edit(store, &asset_ids, patch),
        Command::Delete { asset_id, confirm } => assets::delete(store, &asset_id, confirm),
        Command::Import { file, dry_run } => data::import(store, &file, dry_run),
        Command::Export {
            location,
            output_dir,
        } => data::export(store, location, &output_dir),
        Command::Summary { json } => data::summary(store, json),
        Command::Clear { location, confirm } => data::clear(store, location, confirm),
        Command::Accessory(command) => accessories::run(store, command),
    }
}

/// Status and its details, shared by `add` and `edit`.
#[derive(Args, Debug, Default)]
pub struct StateArgs {
    #[arg(long, value_parser = parse_status)]
    status: Option<AssetStatus>,
    #[arg(long)]
    rack: Option<String>,
    #[arg(long)]
    row: Option<String>,
    #[arg(long)]
    position: Option<String>,
    #[arg(long)]
    loaned_to: Option<String>,
    #[arg(long)]
    purpose: Option<String>,
    /// Expected return date (YYYY-MM-DD)
    #[arg(long)]
    expected_return: Option<String>,
}

impl StateArgs {
    /// The state to set, or `None` if no `--status` was given.
    fn into_state(self) -> Option<AssetState> {
        let text = |value: Option<String>| value.unwrap_or_default();
        Some(match self.status? {
            AssetStatus::Available => AssetState::Available,
            AssetStatus::Deployed => AssetState::deployed(
                text(self.rack).trim(),
                text(self.row).trim(),
                text(self.position).trim(),
            ),
            AssetStatus::Loaned => AssetState::loaned(
                text(self.loaned_to).trim(),
                text(self.purpose).trim(),
                self.expected_return,
            ),
        })
    }
}

/// Fields `edit` and `bulk-edit` can change. Pass an empty string to clear
/// an optional field.
#[derive(Args, Debug, Default)]
pub struct PatchArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    network_name: Option<String>,
    #[arg(long, value_parser = parse_location)]
    location: Option<Location>,
    /// Specification field, e.g. --spec "Serial Number=Q2XX-1"
    #[arg(long = "spec", value_parser = parse_key_value)]
    specs: Vec<(String, String)>,
    #[arg(long)]
    owner: Option<String>,
    #[arg(long)]
    team: Option<String>,
    #[arg(long)]
    order_number: Option<String>,
    #[arg(long)]
    tracking_number: Option<String>,
    #[arg(long)]
    notes: Option<String>,
    #[command(flatten)]
    state: StateArgs,
}

impl PatchArgs {
    fn into_patch(self) -> AssetPatch {
        AssetPatch {
            name: self.name,
            network_name: self.network_name,
            location: self.location,
            state: self.state.into_state(),
            specifications: None,
            set_specifications: self.specs.into_iter().collect::<BTreeMap<_, _>>(),
            owner: self.owner,
            team: self.team,
            order_number: self.order_number,
            tracking_number: self.tracking_number,
            notes: self.notes,
        }
    }
}

fn parse_location(s: &str) -> Result<Location, String> {
    Location::from_str(s).ok_or_else(|| {
        let valid: Vec<&str> = Location::ALL.iter().map(|l| l.as_str()).collect();
        format!("unknown location '{}', expected one of: {}", s, valid.join(", "))
    })
}

fn parse_category(s: &str) -> Result<AssetCategory, String> {
    AssetCategory::from_str(s).ok_or_else(|| {
        let valid: Vec<&str> = AssetCategory::ALL.iter().map(|c| c.as_str()).collect();
        format!("unknown category '{}', expected one of: {}", s, valid.join(", "))
    })
}

fn parse_status(s: &str) -> Result<AssetStatus, String> {
    AssetStatus::from_str(s)
        .ok_or_else(|| format!("unknown status '{}', expected Available, Deployed or Loaned", s))
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing field name in '{}'", s));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// `LOC=COUNT`, e.g. `SF=12`.
fn parse_quantity(s: &str) -> Result<(Location, u32), String> {
    let (location, count) = parse_key_value(s)?;
    let location = parse_location(&location)?;
    let count = count
        .parse::<u32>()
        .map_err(|e| format!("invalid quantity '{}': {}", count, e))?;
    Ok((location, count))
}

//! Accessory commands.

use super::{parse_location, parse_quantity};
use anyhow::Result;
use clap::Subcommand;
use labinv_core::export::export_accessories_to_dir;
use labinv_core::models::ACCESSORY_CATEGORIES;
use labinv_core::{InventoryError, Location, NewAccessory, RecordStore};
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum AccessoryCommand {
    /// List accessories with their counts
    List {
        /// Only show counts at this location
        #[arg(long, value_parser = parse_location)]
        location: Option<Location>,
    },
    /// Add an accessory
    Add {
        #[arg(long)]
        category: String,
        #[arg(long)]
        model: String,
        #[arg(long)]
        part_number: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        unit_price: Option<f64>,
        /// Starting count, e.g. --quantity SF=12
        #[arg(long, value_parser = parse_quantity)]
        quantity: Vec<(Location, u32)>,
    },
    /// Add to (or with a negative delta, remove from) the count at a location
    Adjust {
        accessory_id: String,
        #[arg(value_parser = parse_location)]
        location: Location,
        #[arg(allow_hyphen_values = true)]
        delta: i64,
    },
    /// Overwrite the count at a location
    Set {
        accessory_id: String,
        #[arg(value_parser = parse_location)]
        location: Location,
        quantity: u32,
    },
    /// Delete an accessory
    Delete {
        accessory_id: String,
        /// Actually delete; without it the command only warns
        #[arg(long)]
        confirm: bool,
    },
    /// Export accessories to a timestamped CSV file
    Export {
        #[arg(long, value_parser = parse_location)]
        location: Option<Location>,
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
}

fn not_found(accessory_id: &str) -> anyhow::Error {
    InventoryError::AccessoryNotFound {
        accessory_id: accessory_id.to_string(),
    }
    .into()
}

pub fn run(store: &mut RecordStore, command: AccessoryCommand) -> Result<()> {
    match command {
        AccessoryCommand::List { location } => {
            let locations: Vec<Location> = match location {
                Some(location) => vec![location],
                None => Location::ALL.to_vec(),
            };
            for accessory in store.list_accessories() {
                let counts: Vec<String> = locations
                    .iter()
                    .map(|l| format!("{}={}", l, accessory.quantity_at(*l)))
                    .collect();
                println!(
                    "{:<32} {:<16} {:<24} {} (total {})",
                    accessory.accessory_id,
                    accessory.category,
                    accessory.model,
                    counts.join(" "),
                    accessory.total_quantity()
                );
            }
            println!("{} accessories", store.list_accessories().len());
        }
        AccessoryCommand::Add {
            category,
            model,
            part_number,
            description,
            unit_price,
            quantity,
        } => {
            let new = NewAccessory {
                category,
                model,
                part_number,
                description,
                unit_price,
                quantities: quantity.into_iter().collect(),
            };
            let accessory = store.add_accessory(new).map_err(|e| match e {
                InventoryError::Validation { .. } => anyhow::anyhow!(
                    "{} (categories: {})",
                    e,
                    ACCESSORY_CATEGORIES.join(", ")
                ),
                other => other.into(),
            })?;
            println!(
                "Added {} ({} / {}), {} units",
                accessory.accessory_id,
                accessory.category,
                accessory.model,
                accessory.total_quantity()
            );
        }
        AccessoryCommand::Adjust {
            accessory_id,
            location,
            delta,
        } => {
            let count = store.adjust_quantity(&accessory_id, location, delta)?;
            println!("{} at {}: {}", accessory_id, location, count);
        }
        AccessoryCommand::Set {
            accessory_id,
            location,
            quantity,
        } => {
            store.set_quantity(&accessory_id, location, quantity)?;
            println!("{} at {}: {}", accessory_id, location, quantity);
        }
        AccessoryCommand::Delete {
            accessory_id,
            confirm,
        } => {
            let accessory = store
                .find_accessory(&accessory_id)
                .ok_or_else(|| not_found(&accessory_id))?;
            if !confirm {
                println!(
                    "This will delete {} ({}, {} units). Run again with --confirm to proceed.",
                    accessory.accessory_id,
                    accessory.model,
                    accessory.total_quantity()
                );
                return Ok(());
            }
            store.delete_accessory(&accessory_id)?;
            println!("Deleted {}", accessory_id);
        }
        AccessoryCommand::Export {
            location,
            output_dir,
        } => {
            let accessories = store.list_accessories();
            let path = export_accessories_to_dir(&output_dir, accessories, location)?;
            println!(
                "Exported {} accessories to {}",
                accessories.len(),
                path.display()
            );
        }
    }
    Ok(())
}

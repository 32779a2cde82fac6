//! Asset commands: list, show, add, edit, bulk-edit, delete.

use super::{parse_category, parse_key_value, parse_location, parse_status, PatchArgs, StateArgs};
use anyhow::{bail, Result};
use clap::Args;
use labinv_core::{
    Asset, AssetCategory, AssetFilter, AssetStatus, InventoryError, Location, NewAsset,
    RecordStore,
};

#[derive(Args, Debug)]
pub struct ListArgs {
    #[arg(long, value_parser = parse_location)]
    location: Option<Location>,
    #[arg(long, value_parser = parse_status)]
    status: Option<AssetStatus>,
    #[arg(long)]
    owner: Option<String>,
    /// Case-insensitive text to look for in any field
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    #[arg(long)]
    name: String,
    #[arg(long, value_parser = parse_category)]
    category: AssetCategory,
    #[arg(long, value_parser = parse_location, default_value = "SF")]
    location: Location,
    /// Specification field, e.g. --spec "Serial Number=Q2XX-1"
    #[arg(long = "spec", value_parser = parse_key_value)]
    specs: Vec<(String, String)>,
    #[arg(long)]
    network_name: Option<String>,
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

fn not_found(asset_id: &str) -> anyhow::Error {
    InventoryError::AssetNotFound {
        asset_id: asset_id.to_string(),
    }
    .into()
}

pub fn list(store: &RecordStore, args: &ListArgs) -> Result<()> {
    let filter = AssetFilter {
        location: args.location,
        status: args.status,
        owner: args.owner.clone(),
        search: args.search.clone(),
    };
    let hits = filter.apply(store.list_all());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    for asset in &hits {
        println!(
            "{:<32} {:<4} {:<20} {:<10} {} (SN: {})",
            asset.asset_id,
            asset.location.as_str(),
            asset.category.as_str(),
            asset.status().as_str(),
            asset.name,
            asset.serial_number().unwrap_or("N/A")
        );
    }
    println!("{} of {} assets", hits.len(), store.list_all().len());
    Ok(())
}

pub fn show(store: &RecordStore, asset_id: &str, json: bool) -> Result<()> {
    let asset = store.find_by_id(asset_id).ok_or_else(|| not_found(asset_id))?;
    if json {
        println!("{}", serde_json::to_string_pretty(asset)?);
    } else {
        print_asset(asset);
    }
    Ok(())
}

fn print_asset(asset: &Asset) {
    println!("{}", asset.asset_id);
    println!("  Name:            {}", asset.name);
    println!("  Location:        {}", asset.location);
    println!("  Category:        {}", asset.category);
    println!("  Status:          {}", asset.status());

    let optional = [
        ("Network Name", &asset.network_name),
        ("Owner", &asset.owner),
        ("Team", &asset.team),
        ("Order Number", &asset.order_number),
        ("Tracking Number", &asset.tracking_number),
    ];
    for (label, value) in optional {
        if let Some(value) = value {
            println!("  {:<16} {}", format!("{}:", label), value);
        }
    }

    if !asset.specifications.is_empty() {
        println!("  Specifications:");
        for (field, value) in &asset.specifications {
            println!("    {}: {}", field, value);
        }
    }
    let missing = asset.missing_required_fields();
    if !missing.is_empty() {
        println!("  Missing:         {}", missing.join(", "));
    }

    if let Some(info) = asset.deployment_info() {
        println!(
            "  Deployed:        rack {} row {} position {} since {}",
            info.rack, info.row, info.position, info.deployment_date
        );
    }
    if let Some(loan) = asset.loan_info() {
        println!(
            "  Loaned to:       {} ({}) since {}",
            loan.loaned_to, loan.purpose, loan.loan_date
        );
        if let Some(expected) = &loan.expected_return {
            println!("  Expected return: {}", expected);
        }
    }

    println!("  Added:           {}", asset.date_added);
    if let Some(notes) = &asset.notes {
        println!("  Notes:           {}", notes);
    }
}

pub fn add(store: &mut RecordStore, args: AddArgs) -> Result<()> {
    let new = NewAsset {
        name: args.name,
        network_name: args.network_name,
        location: args.location,
        category: args.category,
        state: args.state.into_state().unwrap_or_default(),
        specifications: args.specs.into_iter().collect(),
        owner: args.owner,
        team: args.team,
        order_number: args.order_number,
        tracking_number: args.tracking_number,
        notes: args.notes,
    };
    let asset = store.add_asset(new)?;
    println!("Added {} ({}) to {}", asset.asset_id, asset.name, asset.location);
    Ok(())
}

pub fn edit(store: &mut RecordStore, asset_id: &str, args: PatchArgs) -> Result<()> {
    let patch = args.into_patch();
    if patch.is_empty() {
        bail!("Nothing to change; pass at least one field option");
    }
    if !store.update(asset_id, &patch)? {
        return Err(not_found(asset_id));
    }
    println!("Updated {}", asset_id);
    Ok(())
}

pub fn bulk_edit(store: &mut RecordStore, asset_ids: &[String], args: PatchArgs) -> Result<()> {
    let patch = args.into_patch();
    if patch.is_empty() {
        bail!("Nothing to change; pass at least one field option");
    }
    let changed = store.bulk_update(asset_ids, &patch)?;
    println!("Updated {} of {} assets", changed, asset_ids.len());
    Ok(())
}

pub fn delete(store: &mut RecordStore, asset_id: &str, confirm: bool) -> Result<()> {
    let asset = store.find_by_id(asset_id).ok_or_else(|| not_found(asset_id))?;
    if !confirm {
        println!(
            "This will delete {} ({}) at {}. Run again with --confirm to proceed.",
            asset.asset_id, asset.name, asset.location
        );
        return Ok(());
    }

    let label = format!("{} ({})", asset.asset_id, asset.name);
    store.delete(asset_id)?;
    println!("Deleted {}", label);
    Ok(())
}

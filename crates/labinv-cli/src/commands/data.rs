//! Data management commands: import, export, summary, clear.

use anyhow::{Context, Result};
use labinv_core::export::export_assets_to_dir;
use labinv_core::import::{read_csv_file, ImportPlan};
use labinv_core::{Asset, InventorySummary, Location, Reconciler, RecordStore};
use std::path::Path;
use tracing::info;

pub fn import(store: &mut RecordStore, file: &Path, dry_run: bool) -> Result<()> {
    let rows = read_csv_file(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let plan = Reconciler::new(store).plan(rows);
    print_plan(&plan);

    if dry_run {
        println!("Dry run: nothing was saved");
        return Ok(());
    }
    if plan.has_changes() {
        store.apply_import(&plan)?;
    }
    println!("{}", plan.summary_line());
    Ok(())
}

fn print_plan(plan: &ImportPlan) {
    let counts = &plan.counts;
    println!(
        "Rows: {}  New: {}  Updated: {}  Skipped: {}  Duplicates: {}",
        counts.total_rows, counts.new, counts.updated, counts.skipped, counts.duplicates
    );

    let duplicates: Vec<_> = plan.duplicates().collect();
    if !duplicates.is_empty() {
        println!();
        println!("Duplicate serial numbers (not imported):");
        for conflict in duplicates {
            println!("  {}", conflict);
        }
    }

    let warnings: Vec<_> = plan.warnings().collect();
    if !warnings.is_empty() {
        println!();
        println!("Warnings ({}):", warnings.len());
        for warning in warnings {
            println!("  {}", warning);
        }
    }

    let errors: Vec<_> = plan.errors().collect();
    if !errors.is_empty() {
        println!();
        println!("Errors ({}):", errors.len());
        for error in errors {
            println!("  {}", error);
        }
    }
}

pub fn export(store: &RecordStore, location: Option<Location>, output_dir: &Path) -> Result<()> {
    let assets: Vec<&Asset> = match location {
        Some(location) => store.list_by_location(location).collect(),
        None => store.list_all().iter().collect(),
    };
    let path = export_assets_to_dir(output_dir, &assets, location)?;
    println!("Exported {} assets to {}", assets.len(), path.display());
    Ok(())
}

pub fn summary(store: &RecordStore, json: bool) -> Result<()> {
    let summary = InventorySummary::build(store.list_all(), store.list_accessories());
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let totals = &summary.totals;
    println!(
        "Total: {}  Available: {}  Deployed: {}  Loaned: {}  Utilization: {}",
        totals.total,
        totals.available,
        totals.deployed,
        totals.loaned,
        totals.utilization_label()
    );

    println!();
    println!("By location:");
    for entry in &summary.by_location {
        println!(
            "  {:<4} {} assets ({} utilized)",
            entry.location.as_str(),
            entry.counts.total,
            entry.counts.utilization_label()
        );
    }

    println!();
    println!("By owner:");
    for (owner, count) in &summary.top_owners {
        println!("  {}: {} assets", owner, count);
    }
    println!("  Unassigned: {} assets", summary.unassigned);

    if !summary.active_loans.is_empty() {
        println!();
        println!("Active loans:");
        for loan in &summary.active_loans {
            print!(
                "  {} -> {} [{}] since {}",
                loan.name, loan.loaned_to, loan.location, loan.loan_date
            );
            match &loan.expected_return {
                Some(expected) => println!(", expected back {}", expected),
                None => println!(),
            }
        }
    }

    println!();
    println!("By category:");
    for (category, count) in &summary.by_category {
        println!("  {}: {}", category, count);
    }

    if !summary.top_racks.is_empty() {
        println!();
        println!("Top racks:");
        for (rack, count) in &summary.top_racks {
            println!("  {}: {} assets", rack, count);
        }
    }

    println!();
    println!("Recently added:");
    for asset in &summary.recent {
        println!(
            "  [{}] {} - {} (SN: {}) {} - Added: {}",
            asset.location,
            asset.category,
            asset.name,
            asset.serial_number.as_deref().unwrap_or("N/A"),
            asset.status,
            asset.date_added
        );
    }

    println!();
    println!("Accessory units:");
    for (location, units) in &summary.accessory_totals {
        println!("  {:<4} {}", location.as_str(), units);
    }
    Ok(())
}

pub fn clear(store: &mut RecordStore, location: Option<Location>, confirm: bool) -> Result<()> {
    let scope = location.map_or_else(|| "ALL".to_string(), |l| l.to_string());
    if !confirm {
        let assets = match location {
            Some(location) => store.list_by_location(location).count(),
            None => store.list_all().len(),
        };
        println!(
            "This will delete {} assets in {} inventory data. Run again with --confirm to proceed.",
            assets, scope
        );
        return Ok(());
    }

    let removed = match location {
        Some(location) => store.clear_location(location)?,
        None => store.clear_all()?,
    };
    info!("Cleared {} inventory data", scope);
    println!("Cleared {} data ({} records removed)", scope, removed);
    Ok(())
}

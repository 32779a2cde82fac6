//! Filtering and dashboard summaries over the store's records.

use crate::config::{Location, ReportConfig};
use crate::models::{Accessory, Asset, AssetCategory, AssetStatus};
use serde::Serialize;
use std::collections::HashMap;

/// Narrow a list of assets. Every set criterion must match.
#[derive(Debug, Clone, Default)]
pub struct AssetFilter {
    pub location: Option<Location>,
    pub status: Option<AssetStatus>,
    /// Exact owner name.
    pub owner: Option<String>,
    /// Case-insensitive substring over ids, names, metadata and
    /// specification values.
    pub search: Option<String>,
}

impl AssetFilter {
    pub fn matches(&self, asset: &Asset) -> bool {
        if self.location.is_some_and(|l| asset.location != l) {
            return false;
        }
        if self.status.is_some_and(|s| asset.status() != s) {
            return false;
        }
        if let Some(owner) = &self.owner {
            if asset.owner.as_deref() != Some(owner.trim()) {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => search_matches(asset, &term.to_lowercase()),
            _ => true,
        }
    }

    pub fn apply<'a>(&self, assets: &'a [Asset]) -> Vec<&'a Asset> {
        assets.iter().filter(|a| self.matches(a)).collect()
    }
}

fn search_matches(asset: &Asset, needle: &str) -> bool {
    let optional = [
        &asset.network_name,
        &asset.owner,
        &asset.team,
        &asset.order_number,
        &asset.tracking_number,
        &asset.notes,
    ];
    [asset.asset_id.as_str(), asset.name.as_str(), asset.category.as_str()]
        .into_iter()
        .chain(optional.into_iter().filter_map(|v| v.as_deref()))
        .chain(asset.specifications.values().map(String::as_str))
        .any(|haystack| haystack.to_lowercase().contains(needle))
}

/// Asset counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub available: usize,
    pub deployed: usize,
    pub loaned: usize,
}

impl StatusCounts {
    pub fn tally<'a>(assets: impl IntoIterator<Item = &'a Asset>) -> Self {
        let mut counts = Self::default();
        for asset in assets {
            counts.total += 1;
            match asset.status() {
                AssetStatus::Available => counts.available += 1,
                AssetStatus::Deployed => counts.deployed += 1,
                AssetStatus::Loaned => counts.loaned += 1,
            }
        }
        counts
    }

    pub fn in_use(&self) -> usize {
        self.deployed + self.loaned
    }

    /// Share of assets deployed or loaned, as a percentage.
    pub fn utilization(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.in_use() as f64 * 100.0 / self.total as f64
        }
    }

    /// Utilization with one decimal, `0%` for an empty inventory.
    pub fn utilization_label(&self) -> String {
        if self.total == 0 {
            "0%".to_string()
        } else {
            format!("{:.1}%", self.utilization())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationSummary {
    pub location: Location,
    pub counts: StatusCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoanEntry {
    pub asset_id: String,
    pub name: String,
    pub location: Location,
    pub loaned_to: String,
    pub loan_date: String,
    pub expected_return: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentAsset {
    pub asset_id: String,
    pub name: String,
    pub location: Location,
    pub category: AssetCategory,
    pub status: AssetStatus,
    pub serial_number: Option<String>,
    pub date_added: String,
}

/// Everything the dashboard shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventorySummary {
    pub totals: StatusCounts,
    pub by_location: Vec<LocationSummary>,
    /// Most common owners, largest first.
    pub top_owners: Vec<(String, usize)>,
    /// Assets with no owner.
    pub unassigned: usize,
    /// Most recent loans by loan date.
    pub active_loans: Vec<LoanEntry>,
    pub by_category: Vec<(AssetCategory, usize)>,
    /// Busiest racks as `LOC - rack`.
    pub top_racks: Vec<(String, usize)>,
    /// Most recently added assets.
    pub recent: Vec<RecentAsset>,
    /// Accessory units on hand per location.
    pub accessory_totals: Vec<(Location, u64)>,
}

impl InventorySummary {
    pub fn build(assets: &[Asset], accessories: &[Accessory]) -> Self {
        let limit = ReportConfig::TOP_LIST_LEN;

        let by_location = Location::ALL
            .into_iter()
            .map(|location| LocationSummary {
                location,
                counts: StatusCounts::tally(assets.iter().filter(|a| a.location == location)),
            })
            .collect();

        let mut owners: HashMap<&str, usize> = HashMap::new();
        let mut unassigned = 0;
        for asset in assets {
            match asset.owner.as_deref() {
                Some(owner) => *owners.entry(owner).or_default() += 1,
                None => unassigned += 1,
            }
        }

        let mut loans: Vec<LoanEntry> = assets
            .iter()
            .filter_map(|asset| {
                asset.loan_info().map(|loan| LoanEntry {
                    asset_id: asset.asset_id.clone(),
                    name: asset.name.clone(),
                    location: asset.location,
                    loaned_to: loan.loaned_to.clone(),
                    loan_date: loan.loan_date.clone(),
                    expected_return: loan.expected_return.clone(),
                })
            })
            .collect();
        loans.sort_by(|a, b| b.loan_date.cmp(&a.loan_date));
        loans.truncate(limit);

        let by_category = AssetCategory::ALL
            .into_iter()
            .map(|category| (category, assets.iter().filter(|a| a.category == category).count()))
            .filter(|(_, count)| *count > 0)
            .collect();

        let mut racks: HashMap<String, usize> = HashMap::new();
        for asset in assets {
            if let Some(deployment) = asset.deployment_info() {
                *racks
                    .entry(format!("{} - {}", asset.location, deployment.rack))
                    .or_default() += 1;
            }
        }

        let mut recent: Vec<&Asset> = assets.iter().collect();
        recent.sort_by(|a, b| b.date_added.cmp(&a.date_added));
        let recent = recent
            .into_iter()
            .take(limit)
            .map(|asset| RecentAsset {
                asset_id: asset.asset_id.clone(),
                name: asset.name.clone(),
                location: asset.location,
                category: asset.category,
                status: asset.status(),
                serial_number: asset.serial_number().map(str::to_string),
                date_added: asset.date_added.clone(),
            })
            .collect();

        let accessory_totals = Location::ALL
            .into_iter()
            .map(|location| {
                let units = accessories
                    .iter()
                    .map(|a| u64::from(a.quantity_at(location)))
                    .sum();
                (location, units)
            })
            .collect();

        Self {
            totals: StatusCounts::tally(assets),
            by_location,
            top_owners: ranked(owners.into_iter().map(|(k, v)| (k.to_string(), v)), limit),
            unassigned,
            active_loans: loans,
            by_category,
            top_racks: ranked(racks, limit),
            recent,
            accessory_totals,
        }
    }
}

/// Largest counts first, ties by name, cut to `limit`.
fn ranked(counts: impl IntoIterator<Item = (String, usize)>, limit: usize) -> Vec<(String, usize)> {
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssetState, DeploymentInfo};
    use std::collections::BTreeMap;

    fn asset(id: &str, location: Location, owner: Option<&str>, state: AssetState) -> Asset {
        let mut specifications = BTreeMap::new();
        specifications.insert("Serial Number".to_string(), format!("SN-{}", id));
        Asset {
            asset_id: id.to_string(),
            name: format!("Switch {}", id),
            network_name: None,
            location,
            category: AssetCategory::CiscoSwitch,
            state,
            specifications,
            owner: owner.map(str::to_string),
            team: None,
            order_number: Some("PO-77".to_string()),
            tracking_number: None,
            notes: None,
            date_added: format!("2024-01-0{} 10:00", id.len()),
        }
    }

    fn deployed(rack: &str) -> AssetState {
        AssetState::Deployed {
            deployment_info: DeploymentInfo {
                rack: rack.to_string(),
                ..Default::default()
            },
        }
    }

    fn sample() -> Vec<Asset> {
        vec![
            asset("A", Location::SF, Some("dana"), deployed("R1")),
            asset("BB", Location::SF, Some("dana"), deployed("R1")),
            asset("CCC", Location::SJ, Some("lee"), AssetState::loaned("kim", "demo", None)),
            asset("DDDD", Location::SJ, None, AssetState::Available),
        ]
    }

    #[test]
    fn test_filter_criteria_combine() {
        let assets = sample();
        let filter = AssetFilter {
            location: Some(Location::SF),
            owner: Some("dana".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.apply(&assets).len(), 2);

        let filter = AssetFilter {
            status: Some(AssetStatus::Loaned),
            ..Default::default()
        };
        let hits = filter.apply(&assets);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].asset_id, "CCC");
    }

    #[test]
    fn test_search_is_case_insensitive_over_fields() {
        let assets = sample();
        let search = |term: &str| {
            AssetFilter {
                search: Some(term.to_string()),
                ..Default::default()
            }
            .apply(&assets)
            .len()
        };
        assert_eq!(search("sn-ccc"), 1);
        assert_eq!(search("po-77"), 4);
        assert_eq!(search("cisco"), 4);
        assert_eq!(search("switch bb"), 1);
        assert_eq!(search("   "), 4);
        assert_eq!(search("nothing"), 0);
    }

    #[test]
    fn test_utilization() {
        let counts = StatusCounts::tally(&sample());
        assert_eq!(counts.in_use(), 3);
        assert_eq!(counts.utilization_label(), "75.0%");
        assert_eq!(StatusCounts::default().utilization_label(), "0%");
    }

    #[test]
    fn test_summary() {
        let mut quantities = BTreeMap::new();
        quantities.insert(Location::SJ, 7);
        let accessories = vec![Accessory {
            accessory_id: "ACC-1".into(),
            category: "Other".into(),
            model: "Velcro".into(),
            part_number: String::new(),
            description: String::new(),
            unit_price: None,
            quantities,
            date_added: String::new(),
            last_updated: String::new(),
        }];

        let summary = InventorySummary::build(&sample(), &accessories);
        assert_eq!(summary.totals.total, 4);
        assert_eq!(summary.by_location[0].counts.deployed, 2);
        assert_eq!(summary.by_location[1].counts.total, 2);
        assert_eq!(
            summary.top_owners,
            vec![("dana".to_string(), 2), ("lee".to_string(), 1)]
        );
        assert_eq!(summary.unassigned, 1);
        assert_eq!(summary.active_loans.len(), 1);
        assert_eq!(summary.active_loans[0].loaned_to, "kim");
        assert_eq!(summary.by_category, vec![(AssetCategory::CiscoSwitch, 4)]);
        assert_eq!(summary.top_racks, vec![("SF - R1".to_string(), 2)]);
        assert_eq!(summary.recent[0].asset_id, "DDDD");
        assert_eq!(summary.recent[0].serial_number.as_deref(), Some("SN-DDDD"));
        assert_eq!(summary.accessory_totals[1], (Location::SJ, 7));
    }
}

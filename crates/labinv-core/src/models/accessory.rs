//! Bulk accessories tracked by quantity per location.

use super::non_empty;
use crate::config::Location;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Accessory categories offered by the add form.
pub const ACCESSORY_CATEGORIES: &[&str] = &[
    "Power Cable",
    "Console Cable",
    "Ethernet Cable",
    "Fiber Cable",
    "Rack Hardware",
    "Other",
];

/// A non-serialized item. Only aggregate counts per location are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accessory {
    pub accessory_id: String,
    pub category: String,
    pub model: String,
    #[serde(default)]
    pub part_number: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(default)]
    pub quantities: BTreeMap<Location, u32>,
    #[serde(default)]
    pub date_added: String,
    #[serde(default)]
    pub last_updated: String,
}

impl Accessory {
    pub fn quantity_at(&self, location: Location) -> u32 {
        self.quantities.get(&location).copied().unwrap_or(0)
    }

    pub fn total_quantity(&self) -> u64 {
        self.quantities.values().map(|&q| u64::from(q)).sum()
    }

    /// Same category and same model, ignoring case and padding.
    pub fn same_model(&self, category: &str, model: &str) -> bool {
        self.category == category && self.model.trim().eq_ignore_ascii_case(model.trim())
    }
}

/// An accessory submitted through the add form.
#[derive(Debug, Clone, Default)]
pub struct NewAccessory {
    pub category: String,
    pub model: String,
    pub part_number: Option<String>,
    pub description: Option<String>,
    pub unit_price: Option<f64>,
    pub quantities: BTreeMap<Location, u32>,
}

impl NewAccessory {
    pub fn missing_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.category.trim().is_empty() {
            missing.push("Category".to_string());
        }
        if self.model.trim().is_empty() {
            missing.push("Model".to_string());
        }
        missing
    }

    pub(crate) fn into_accessory(self, accessory_id: String, now: String) -> Accessory {
        Accessory {
            accessory_id,
            category: self.category.trim().to_string(),
            model: self.model.trim().to_string(),
            part_number: self.part_number.and_then(non_empty).unwrap_or_default(),
            description: self.description.and_then(non_empty).unwrap_or_default(),
            unit_price: self.unit_price,
            quantities: self.quantities,
            date_added: now.clone(),
            last_updated: now,
        }
    }
}

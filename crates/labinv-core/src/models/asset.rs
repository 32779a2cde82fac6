//! Serialized asset records.

use super::{empty_as_none, non_empty};
use crate::config::Location;
use crate::identity::{date_today, timestamp_now};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Specification field holding the natural key.
pub const SERIAL_NUMBER_FIELD: &str = "Serial Number";

/// Equipment categories and their specification fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AssetCategory {
    #[serde(rename = "Meraki Switch")]
    MerakiSwitch,
    #[serde(rename = "Cisco Switch")]
    CiscoSwitch,
    #[serde(rename = "Cisco Network Module")]
    CiscoNetworkModule,
    #[serde(rename = "SFP")]
    Sfp,
    #[serde(rename = "Stack Cable")]
    StackCable,
    #[serde(rename = "Lantronix Console")]
    LantronixConsole,
    #[serde(rename = "HP Switch")]
    HpSwitch,
    #[serde(rename = "Raritan PDU")]
    RaritanPdu,
}

impl AssetCategory {
    /// All categories in definition order. The first one is the import default.
    pub const ALL: [AssetCategory; 8] = [
        AssetCategory::MerakiSwitch,
        AssetCategory::CiscoSwitch,
        AssetCategory::CiscoNetworkModule,
        AssetCategory::Sfp,
        AssetCategory::StackCable,
        AssetCategory::LantronixConsole,
        AssetCategory::HpSwitch,
        AssetCategory::RaritanPdu,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetCategory::MerakiSwitch => "Meraki Switch",
            AssetCategory::CiscoSwitch => "Cisco Switch",
            AssetCategory::CiscoNetworkModule => "Cisco Network Module",
            AssetCategory::Sfp => "SFP",
            AssetCategory::StackCable => "Stack Cable",
            AssetCategory::LantronixConsole => "Lantronix Console",
            AssetCategory::HpSwitch => "HP Switch",
            AssetCategory::RaritanPdu => "Raritan PDU",
        }
    }

    /// Exact match on the category name. Surrounding whitespace is ignored,
    /// case is not.
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }

    /// Specification fields a complete record must carry.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            AssetCategory::MerakiSwitch | AssetCategory::CiscoSwitch | AssetCategory::HpSwitch => {
                &["Model", "Serial Number", "MAC Address"]
            }
            AssetCategory::CiscoNetworkModule => {
                &["Model", "Part Number", "Serial Number", "Compatible With"]
            }
            AssetCategory::Sfp => &["Type", "Speed", "Wavelength", "Serial Number"],
            AssetCategory::StackCable => &["Length", "Type", "Part Number", "Serial Number"],
            AssetCategory::LantronixConsole => &["Model", "Serial Number", "IP Address", "Port Count"],
            AssetCategory::RaritanPdu => &["Model", "Serial Number", "IP Address", "Outlet Count"],
        }
    }

    pub fn optional_fields(&self) -> &'static [&'static str] {
        match self {
            AssetCategory::MerakiSwitch | AssetCategory::HpSwitch => &["Firmware Version"],
            AssetCategory::CiscoSwitch => &["IOS Version"],
            _ => &[],
        }
    }

    /// Required fields followed by optional ones.
    pub fn all_fields(&self) -> impl Iterator<Item = &'static str> {
        self.required_fields()
            .iter()
            .chain(self.optional_fields().iter())
            .copied()
    }
}

impl Default for AssetCategory {
    fn default() -> Self {
        AssetCategory::ALL[0]
    }
}

impl std::fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Asset status without its attached details. Used for filtering and parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetStatus {
    Available,
    Deployed,
    Loaned,
}

impl AssetStatus {
    pub const ALL: [AssetStatus; 3] = [
        AssetStatus::Available,
        AssetStatus::Deployed,
        AssetStatus::Loaned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetStatus::Available => "Available",
            AssetStatus::Deployed => "Deployed",
            AssetStatus::Loaned => "Loaned",
        }
    }

    /// Exact match on the status name.
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL.into_iter().find(|st| st.as_str() == s)
    }
}

impl std::fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a deployed asset is racked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentInfo {
    #[serde(default)]
    pub rack: String,
    #[serde(default)]
    pub row: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub deployment_date: String,
}

/// Who holds a loaned asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanInfo {
    #[serde(default)]
    pub loaned_to: String,
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub loan_date: String,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub expected_return: Option<String>,
}

/// Status together with the details only that status carries.
///
/// Serialized flat into the asset object as `"status"` plus an optional
/// `"deployment_info"` or `"loan_info"` object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum AssetState {
    Available,
    Deployed {
        #[serde(default)]
        deployment_info: DeploymentInfo,
    },
    Loaned {
        #[serde(default)]
        loan_info: LoanInfo,
    },
}

impl AssetState {
    /// Deployed now at the given rack position.
    pub fn deployed(rack: impl Into<String>, row: impl Into<String>, position: impl Into<String>) -> Self {
        AssetState::Deployed {
            deployment_info: DeploymentInfo {
                rack: rack.into(),
                row: row.into(),
                position: position.into(),
                deployment_date: timestamp_now(),
            },
        }
    }

    /// Loaned out today.
    pub fn loaned(
        loaned_to: impl Into<String>,
        purpose: impl Into<String>,
        expected_return: Option<String>,
    ) -> Self {
        AssetState::Loaned {
            loan_info: LoanInfo {
                loaned_to: loaned_to.into(),
                purpose: purpose.into(),
                loan_date: date_today(),
                expected_return: expected_return.and_then(non_empty),
            },
        }
    }

    pub fn status(&self) -> AssetStatus {
        match self {
            AssetState::Available => AssetStatus::Available,
            AssetState::Deployed { .. } => AssetStatus::Deployed,
            AssetState::Loaned { .. } => AssetStatus::Loaned,
        }
    }
}

impl Default for AssetState {
    fn default() -> Self {
        AssetState::Available
    }
}

/// A serialized piece of equipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub asset_id: String,
    pub name: String,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub network_name: Option<String>,
    pub location: Location,
    pub category: AssetCategory,
    #[serde(flatten)]
    pub state: AssetState,
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub owner: Option<String>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub team: Option<String>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub order_number: Option<String>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub tracking_number: Option<String>,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<String>,
    #[serde(default)]
    pub date_added: String,
}

impl Asset {
    pub fn status(&self) -> AssetStatus {
        self.state.status()
    }

    /// The serial number, if the record has a non-blank one.
    pub fn serial_number(&self) -> Option<&str> {
        self.specifications
            .get(SERIAL_NUMBER_FIELD)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    pub fn deployment_info(&self) -> Option<&DeploymentInfo> {
        match &self.state {
            AssetState::Deployed { deployment_info } => Some(deployment_info),
            _ => None,
        }
    }

    pub fn loan_info(&self) -> Option<&LoanInfo> {
        match &self.state {
            AssetState::Loaned { loan_info } => Some(loan_info),
            _ => None,
        }
    }

    /// Required specification fields that are absent or blank.
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        self.category
            .required_fields()
            .iter()
            .copied()
            .filter(|field| {
                self.specifications
                    .get(*field)
                    .map_or(true, |v| v.trim().is_empty())
            })
            .collect()
    }
}

/// Normalized form of a serial number used for uniqueness checks.
pub fn serial_key(serial: &str) -> String {
    serial.trim().to_uppercase()
}

/// An asset submitted through the add form. Validated strictly before it
/// enters the store.
#[derive(Debug, Clone, Default)]
pub struct NewAsset {
    pub name: String,
    pub network_name: Option<String>,
    pub location: Location,
    pub category: AssetCategory,
    pub state: AssetState,
    pub specifications: BTreeMap<String, String>,
    pub owner: Option<String>,
    pub team: Option<String>,
    pub order_number: Option<String>,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
}

impl NewAsset {
    /// Labels of every field the form would flag as missing.
    pub fn missing_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("Asset Name".to_string());
        }
        for field in self.category.required_fields() {
            let filled = self
                .specifications
                .get(*field)
                .is_some_and(|v| !v.trim().is_empty());
            if !filled {
                missing.push(field.to_string());
            }
        }
        match &self.state {
            AssetState::Available => {}
            AssetState::Deployed { deployment_info } => {
                let info = deployment_info;
                if [&info.rack, &info.row, &info.position]
                    .iter()
                    .any(|v| v.trim().is_empty())
                {
                    missing.push("Deployment Information".to_string());
                }
            }
            AssetState::Loaned { loan_info } => {
                if loan_info.loaned_to.trim().is_empty() {
                    missing.push("Loaned To".to_string());
                }
                if loan_info.purpose.trim().is_empty() {
                    missing.push("Purpose".to_string());
                }
            }
        }
        missing
    }

    /// Build the stored record. Specification values are trimmed and blank
    /// ones dropped; unknown field names are kept.
    pub(crate) fn into_asset(self, asset_id: String, date_added: String) -> Asset {
        let specifications = self
            .specifications
            .into_iter()
            .filter_map(|(k, v)| non_empty(&v).map(|v| (k.trim().to_string(), v)))
            .collect();
        Asset {
            asset_id,
            name: self.name.trim().to_string(),
            network_name: self.network_name.and_then(non_empty),
            location: self.location,
            category: self.category,
            state: self.state,
            specifications,
            owner: self.owner.and_then(non_empty),
            team: self.team.and_then(non_empty),
            order_number: self.order_number.and_then(non_empty),
            tracking_number: self.tracking_number.and_then(non_empty),
            notes: self.notes.and_then(non_empty),
            date_added,
        }
    }
}

/// Partial update merged into an existing asset.
///
/// `None` leaves a field alone. For optional text fields `Some("")` clears
/// the value.
#[derive(Debug, Clone, Default)]
pub struct AssetPatch {
    pub name: Option<String>,
    pub network_name: Option<String>,
    pub location: Option<Location>,
    pub state: Option<AssetState>,
    /// Replaces the whole specification map.
    pub specifications: Option<BTreeMap<String, String>>,
    /// Set or clear individual specification fields.
    pub set_specifications: BTreeMap<String, String>,
    pub owner: Option<String>,
    pub team: Option<String>,
    pub order_number: Option<String>,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
}

impl AssetPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.network_name.is_none()
            && self.location.is_none()
            && self.state.is_none()
            && self.specifications.is_none()
            && self.set_specifications.is_empty()
            && self.owner.is_none()
            && self.team.is_none()
            && self.order_number.is_none()
            && self.tracking_number.is_none()
            && self.notes.is_none()
    }

    /// Merge into `asset`.
    pub(crate) fn apply_to(&self, asset: &mut Asset) {
        if let Some(name) = &self.name {
            asset.name = name.trim().to_string();
        }
        if let Some(location) = self.location {
            asset.location = location;
        }
        if let Some(state) = &self.state {
            asset.state = state.clone();
        }
        if let Some(specs) = &self.specifications {
            asset.specifications = specs
                .iter()
                .filter_map(|(k, v)| non_empty(v).map(|v| (k.clone(), v)))
                .collect();
        }
        for (field, value) in &self.set_specifications {
            match non_empty(value) {
                Some(v) => {
                    asset.specifications.insert(field.clone(), v);
                }
                None => {
                    asset.specifications.remove(field);
                }
            }
        }

        let text_fields = [
            (&self.network_name, &mut asset.network_name),
            (&self.owner, &mut asset.owner),
            (&self.team, &mut asset.team),
            (&self.order_number, &mut asset.order_number),
            (&self.tracking_number, &mut asset.tracking_number),
            (&self.notes, &mut asset.notes),
        ];
        for (patch, target) in text_fields {
            if let Some(value) = patch {
                *target = non_empty(value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_asset(state: AssetState) -> Asset {
        let mut specifications = BTreeMap::new();
        specifications.insert("Model".to_string(), "MS220".to_string());
        specifications.insert("Serial Number".to_string(), " q2xx-1 ".to_string());
        Asset {
            asset_id: "AST-1".to_string(),
            name: "SW1".to_string(),
            network_name: None,
            location: Location::SJ,
            category: AssetCategory::MerakiSwitch,
            state,
            specifications,
            owner: Some("dana".to_string()),
            team: None,
            order_number: None,
            tracking_number: None,
            notes: None,
            date_added: "2024-01-01 10:00".to_string(),
        }
    }

    #[test]
    fn test_category_lookup_is_exact() {
        assert_eq!(
            AssetCategory::from_str("Raritan PDU"),
            Some(AssetCategory::RaritanPdu)
        );
        assert_eq!(AssetCategory::from_str("raritan pdu"), None);
        assert_eq!(AssetCategory::default(), AssetCategory::MerakiSwitch);
    }

    #[test]
    fn test_all_fields_order() {
        let fields: Vec<_> = AssetCategory::CiscoSwitch.all_fields().collect();
        assert_eq!(fields, vec!["Model", "Serial Number", "MAC Address", "IOS Version"]);
    }

    #[test]
    fn test_serial_number_is_trimmed() {
        let asset = sample_asset(AssetState::Available);
        assert_eq!(asset.serial_number(), Some("q2xx-1"));
        assert_eq!(serial_key(" q2xx-1 "), "Q2XX-1");
    }

    #[test]
    fn test_missing_required_fields() {
        let asset = sample_asset(AssetState::Available);
        assert_eq!(asset.missing_required_fields(), vec!["MAC Address"]);
    }

    #[test]
    fn test_state_serializes_flat() {
        let asset = sample_asset(AssetState::Deployed {
            deployment_info: DeploymentInfo {
                rack: "R1".into(),
                row: "A".into(),
                position: "U1-U2".into(),
                deployment_date: "2024-02-01 09:00".into(),
            },
        });
        let value = serde_json::to_value(&asset).unwrap();
        assert_eq!(value["status"], "Deployed");
        assert_eq!(value["deployment_info"]["rack"], "R1");
        assert_eq!(value["location"], "SJ");
        assert_eq!(value["category"], "Meraki Switch");
        assert!(value.get("loan_info").is_none());
        assert!(value.get("team").is_none());

        let back: Asset = serde_json::from_value(value).unwrap();
        assert_eq!(back, asset);
    }

    #[test]
    fn test_legacy_record_with_empty_info_objects() {
        let json = r#"{
            "asset_id": "AST-9",
            "name": "PDU 1",
            "network_name": "",
            "location": "RTP",
            "category": "Raritan PDU",
            "status": "Available",
            "specifications": {"Model": "PX3"},
            "deployment_info": {},
            "loan_info": {},
            "notes": "",
            "date_added": "2024-03-03 12:00"
        }"#;
        let asset: Asset = serde_json::from_str(json).unwrap();
        assert_eq!(asset.state, AssetState::Available);
        assert_eq!(asset.network_name, None);
        assert_eq!(asset.notes, None);
    }

    #[test]
    fn test_loaned_record_with_blank_expected_return() {
        let json = r#"{
            "asset_id": "AST-10",
            "name": "Console",
            "location": "BGL",
            "category": "Lantronix Console",
            "status": "Loaned",
            "specifications": {},
            "deployment_info": {},
            "loan_info": {"loaned_to": "kim", "purpose": "demo", "loan_date": "2024-04-01", "expected_return": ""},
            "date_added": "2024-03-03 12:00"
        }"#;
        let asset: Asset = serde_json::from_str(json).unwrap();
        let loan = asset.loan_info().unwrap();
        assert_eq!(loan.loaned_to, "kim");
        assert_eq!(loan.expected_return, None);
    }

    #[test]
    fn test_new_asset_missing_fields() {
        let new = NewAsset {
            name: " ".to_string(),
            category: AssetCategory::Sfp,
            state: AssetState::loaned("", "lab test", None),
            ..Default::default()
        };
        assert_eq!(
            new.missing_fields(),
            vec!["Asset Name", "Type", "Speed", "Wavelength", "Serial Number", "Loaned To"]
        );
    }

    #[test]
    fn test_patch_clears_optional_text() {
        let mut asset = sample_asset(AssetState::Available);
        let mut patch = AssetPatch {
            owner: Some(String::new()),
            team: Some("netops".to_string()),
            ..Default::default()
        };
        patch
            .set_specifications
            .insert("Firmware Version".to_string(), "15.1".to_string());
        patch.set_specifications.insert("Model".to_string(), String::new());
        patch.apply_to(&mut asset);

        assert_eq!(asset.owner, None);
        assert_eq!(asset.team.as_deref(), Some("netops"));
        assert_eq!(
            asset.specifications.get("Firmware Version").map(String::as_str),
            Some("15.1")
        );
        assert!(!asset.specifications.contains_key("Model"));
    }
}

// Facility and bed-asset records used to locate a bed's monitor
use serde::{Deserialize, Serialize};

pub const MONITOR_ASSET_TYPE: &str = "HL7MONITOR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Hostname of the facility-local gateway bridging devices to the stream.
    #[serde(default)]
    pub middleware_address: Option<String>,
}

impl Facility {
    pub fn middleware_hostname(&self) -> Option<&str> {
        self.middleware_address
            .as_deref()
            .map(str::trim)
            .filter(|host| !host.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetBed {
    #[serde(default)]
    pub id: Option<String>,
    pub asset_object: Asset,
    #[serde(default)]
    pub bed_object: Option<super::patient::BedRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub meta: Option<AssetMeta>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetMeta {
    #[serde(default)]
    pub asset_type: Option<String>,
    #[serde(default)]
    pub local_ip_address: Option<String>,
}

impl Asset {
    pub fn is_monitor(&self) -> bool {
        self.meta
            .as_ref()
            .and_then(|m| m.asset_type.as_deref())
            == Some(MONITOR_ASSET_TYPE)
    }

    pub fn device_address(&self) -> Option<&str> {
        self.meta
            .as_ref()?
            .local_ip_address
            .as_deref()
            .map(str::trim)
            .filter(|addr| !addr.is_empty())
    }
}

/// First monitor linked to the bed, if any.
pub fn first_monitor(asset_beds: &[AssetBed]) -> Option<&Asset> {
    asset_beds
        .iter()
        .map(|link| &link.asset_object)
        .find(|asset| asset.is_monitor())
}

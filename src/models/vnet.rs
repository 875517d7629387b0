//! Azure Virtual Network (VNet) data model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Address space of a virtual network.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddressSpace {
    pub address_prefixes: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetworkProperties {
    pub address_space: AddressSpace,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

/// Represents an Azure Virtual Network.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNetwork {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Name of the virtual network.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Azure region location.
    pub location: String,
    pub properties: VirtualNetworkProperties,
}

impl VirtualNetwork {
    /// Create parameters for a VNet spanning `prefixes`.
    pub fn new(location: &str, prefixes: &[&str]) -> Self {
        VirtualNetwork {
            location: location.to_string(),
            properties: VirtualNetworkProperties {
                address_space: AddressSpace {
                    address_prefixes: prefixes.iter().map(|p| p.to_string()).collect(),
                },
                provisioning_state: None,
            },
            ..Default::default()
        }
    }
}

impl fmt::Display for VirtualNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] ({})",
            self.name.as_deref().unwrap_or("?"),
            self.properties.address_space.address_prefixes.join(", "),
            self.location
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vnet_body() {
        let body = serde_json::to_value(VirtualNetwork::new("westus", &["10.0.0.0/16"])).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "location": "westus",
                "properties": {"addressSpace": {"addressPrefixes": ["10.0.0.0/16"]}}
            })
        );
    }

    #[test]
    fn test_vnet_display() {
        let mut vnet = VirtualNetwork::new("westus", &["10.0.0.0/16", "10.1.0.0/16"]);
        vnet.name = Some("vNet".to_string());
        assert_eq!(vnet.to_string(), "vNet [10.0.0.0/16, 10.1.0.0/16] (westus)");
    }
}

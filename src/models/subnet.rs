//! Azure subnet data model.

use serde::{Deserialize, Serialize};

/// Reference to another ARM resource by ID.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct SubResource {
    pub id: String,
}

impl SubResource {
    pub fn new(id: &str) -> Self {
        SubResource { id: id.to_string() }
    }
}

/// Represents an Azure subnet inside the sample's virtual network.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
    /// Resource ID, known once the subnet exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Name of the subnet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: SubnetProperties,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubnetProperties {
    /// CIDR block of the subnet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

impl Subnet {
    /// Create parameters for a subnet covering `address_prefix`.
    pub fn with_prefix(address_prefix: &str) -> Self {
        Subnet {
            properties: SubnetProperties {
                address_prefix: Some(address_prefix.to_string()),
                provisioning_state: None,
            },
            ..Default::default()
        }
    }
}

//! Resource group and storage account models.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Administrative container scoping the sample's resources.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
}

impl ResourceGroup {
    pub fn new(location: &str) -> Self {
        ResourceGroup {
            location: location.to_string(),
            ..Default::default()
        }
    }
}

/// Pricing tier of a resource.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Sku {
    pub name: String,
}

/// Storage account backing the VM disk images.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StorageAccount {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub location: String,
    pub sku: Sku,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

impl StorageAccount {
    /// Create parameters for a locally redundant general purpose account.
    pub fn standard_lrs(location: &str) -> Self {
        StorageAccount {
            id: None,
            name: None,
            location: location.to_string(),
            sku: Sku {
                name: "Standard_LRS".to_string(),
            },
            kind: Some("StorageV2".to_string()),
            properties: serde_json::Map::new(),
        }
    }
}

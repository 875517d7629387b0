//! Public IP address and network interface models.

use super::{Sku, SubResource};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicIpDnsSettings {
    pub domain_name_label: String,
    /// Assigned by Azure from the label and region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicIpAddressProperties {
    #[serde(rename = "publicIPAllocationMethod")]
    pub allocation_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_settings: Option<PublicIpDnsSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

/// Externally reachable endpoint of one VM.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicIpAddress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<Sku>,
    pub properties: PublicIpAddressProperties,
}

impl PublicIpAddress {
    /// Create parameters for a static Standard SKU address with a DNS label.
    pub fn with_dns_label(location: &str, label: &str) -> Self {
        PublicIpAddress {
            location: location.to_string(),
            sku: Some(Sku {
                name: "Standard".to_string(),
            }),
            properties: PublicIpAddressProperties {
                allocation_method: "Static".to_string(),
                dns_settings: Some(PublicIpDnsSettings {
                    domain_name_label: label.to_string(),
                    fqdn: None,
                }),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Fully qualified DNS name, once Azure has assigned one.
    pub fn fqdn(&self) -> Option<&str> {
        self.properties
            .dns_settings
            .as_ref()
            .and_then(|d| d.fqdn.as_deref())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IpConfigurationProperties {
    #[serde(rename = "privateIPAllocationMethod")]
    pub private_allocation_method: String,
    pub subnet: SubResource,
    #[serde(
        rename = "publicIPAddress",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub public_ip_address: Option<SubResource>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct IpConfiguration {
    pub name: String,
    pub properties: IpConfigurationProperties,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterfaceProperties {
    pub ip_configurations: Vec<IpConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
}

/// Binds a VM to the subnet and its public address.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInterface {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub location: String,
    pub properties: NetworkInterfaceProperties,
}

impl NetworkInterface {
    /// Create parameters for a NIC with one dynamic IP configuration.
    pub fn new(location: &str, ip_config_name: &str, subnet_id: &str, public_ip_id: &str) -> Self {
        NetworkInterface {
            location: location.to_string(),
            properties: NetworkInterfaceProperties {
                ip_configurations: vec![IpConfiguration {
                    name: ip_config_name.to_string(),
                    properties: IpConfigurationProperties {
                        private_allocation_method: "Dynamic".to_string(),
                        subnet: SubResource::new(subnet_id),
                        public_ip_address: Some(SubResource::new(public_ip_id)),
                    },
                }],
                provisioning_state: None,
            },
            ..Default::default()
        }
    }
}

//! Azure virtual machine data model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a disk is populated when it is attached.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiskCreateOption {
    #[default]
    FromImage,
    Empty,
    Attach,
    #[serde(other)]
    Other,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VirtualHardDisk {
    pub uri: String,
}

/// Source image of a VM: marketplace coordinates, or the `id` of a custom
/// or shared-gallery image.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ImageReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ImageReference {
    pub fn latest(publisher: &str, offer: &str, sku: &str) -> Self {
        ImageReference {
            id: None,
            publisher: Some(publisher.to_string()),
            offer: Some(offer.to_string()),
            sku: Some(sku.to_string()),
            version: Some("latest".to_string()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OsDisk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vhd: Option<VirtualHardDisk>,
    #[serde(default)]
    pub create_option: DiskCreateOption,
    #[serde(
        rename = "diskSizeGB",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub disk_size_gb: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_type: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DataDisk {
    pub lun: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vhd: Option<VirtualHardDisk>,
    pub create_option: DiskCreateOption,
    #[serde(
        rename = "diskSizeGB",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub disk_size_gb: Option<i32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StorageProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_reference: Option<ImageReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_disk: Option<OsDisk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_disks: Option<Vec<DataDisk>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HardwareProfile {
    pub vm_size: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OsProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_username: Option<String>,
    /// Write-only; never returned by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct NicReferenceProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NetworkInterfaceReference {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<NicReferenceProperties>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NetworkProfile {
    #[serde(default)]
    pub network_interfaces: Vec<NetworkInterfaceReference>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstanceStatus {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_status: Option<String>,
}

/// Runtime status, returned when the VM is read with `$expand=instanceView`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct InstanceView {
    #[serde(default)]
    pub statuses: Vec<InstanceStatus>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VmProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_profile: Option<HardwareProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_profile: Option<StorageProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_profile: Option<OsProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_profile: Option<NetworkProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_view: Option<InstanceView>,
}

/// The compute instance as sent to and returned by ARM.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub properties: VmProperties,
}

impl VirtualMachine {
    pub fn os_disk_size_gb(&self) -> Option<i32> {
        self.properties
            .storage_profile
            .as_ref()
            .and_then(|sp| sp.os_disk.as_ref())
            .and_then(|d| d.disk_size_gb)
    }

    pub fn data_disks(&self) -> &[DataDisk] {
        self.properties
            .storage_profile
            .as_ref()
            .and_then(|sp| sp.data_disks.as_deref())
            .unwrap_or(&[])
    }

    /// Power state from the instance view, e.g. `running` or `deallocated`.
    pub fn power_state(&self) -> Option<&str> {
        self.properties
            .instance_view
            .as_ref()?
            .statuses
            .iter()
            .find_map(|s| s.code.strip_prefix("PowerState/"))
    }

    /// IDs of the attached network interfaces.
    pub fn nic_ids(&self) -> Vec<&str> {
        self.properties
            .network_profile
            .as_ref()
            .map(|np| np.network_interfaces.iter().map(|n| n.id.as_str()).collect())
            .unwrap_or_default()
    }

    /// Apply a partial update the way the service merges a `PATCH` body:
    /// fields present in `update` replace the stored ones, the rest stay.
    pub fn apply(&mut self, update: &VmUpdate) {
        if let Some(tags) = &update.tags {
            self.tags = Some(tags.clone());
        }
        let Some(sp_update) = update
            .properties
            .as_ref()
            .and_then(|p| p.storage_profile.as_ref())
        else {
            return;
        };
        let sp = self
            .properties
            .storage_profile
            .get_or_insert_with(StorageProfile::default);
        if let Some(disks) = &sp_update.data_disks {
            sp.data_disks = Some(disks.clone());
        }
        if let Some(size) = sp_update.os_disk.as_ref().and_then(|d| d.disk_size_gb) {
            sp.os_disk.get_or_insert_with(OsDisk::default).disk_size_gb = Some(size);
        }
    }
}

/// `PATCH` body for a virtual machine. Only the fields that are `Some` are
/// sent, so a tag update cannot clobber a concurrent disk change.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VmUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<VmUpdateProperties>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VmUpdateProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_profile: Option<StorageProfileUpdate>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StorageProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_disk: Option<OsDiskUpdate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_disks: Option<Vec<DataDisk>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct OsDiskUpdate {
    #[serde(
        rename = "diskSizeGB",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub disk_size_gb: Option<i32>,
}

impl VmUpdate {
    pub fn tags<I, K, V>(tags: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        VmUpdate {
            tags: Some(
                tags.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
            properties: None,
        }
    }

    /// Replace the data disk list. An empty list detaches every disk.
    pub fn data_disks(disks: Vec<DataDisk>) -> Self {
        VmUpdate::storage(StorageProfileUpdate {
            os_disk: None,
            data_disks: Some(disks),
        })
    }

    pub fn os_disk_size(size_gb: i32) -> Self {
        VmUpdate::storage(StorageProfileUpdate {
            os_disk: Some(OsDiskUpdate {
                disk_size_gb: Some(size_gb),
            }),
            data_disks: None,
        })
    }

    fn storage(storage_profile: StorageProfileUpdate) -> Self {
        VmUpdate {
            tags: None,
            properties: Some(VmUpdateProperties {
                storage_profile: Some(storage_profile),
            }),
        }
    }

    /// New OS disk size carried by this update, if any.
    pub fn os_disk_size_gb(&self) -> Option<i32> {
        self.properties
            .as_ref()
            .and_then(|p| p.storage_profile.as_ref())
            .and_then(|sp| sp.os_disk.as_ref())
            .and_then(|d| d.disk_size_gb)
    }
}

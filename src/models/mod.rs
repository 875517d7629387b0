//! Domain models for the Azure VM sample.
//!
//! Transient mirrors of the ARM request/response bodies this program sends
//! and receives:
//! - [`ResourceGroup`] and [`StorageAccount`] - shared containers
//! - [`VirtualNetwork`], [`Subnet`], [`PublicIpAddress`], [`NetworkInterface`] - networking
//! - [`VirtualMachine`] and [`VmUpdate`] - the compute instance and its partial updates
//! - [`VmSpec`] - one entry of the caller-supplied VM list

mod list;
mod nic;
mod resource_group;
mod subnet;
mod vm;
mod vm_spec;
mod vnet;

// Re-export public types
pub use list::ArmList;
pub use nic::{
    IpConfiguration, IpConfigurationProperties, NetworkInterface, NetworkInterfaceProperties,
    PublicIpAddress, PublicIpAddressProperties, PublicIpDnsSettings,
};
pub use resource_group::{ResourceGroup, Sku, StorageAccount};
pub use subnet::{SubResource, Subnet, SubnetProperties};
pub use vm::{
    DataDisk, DiskCreateOption, HardwareProfile, ImageReference, InstanceStatus, InstanceView,
    NetworkInterfaceReference, NetworkProfile, NicReferenceProperties, OsDisk, OsDiskUpdate,
    OsProfile, StorageProfile, StorageProfileUpdate, VirtualHardDisk, VirtualMachine,
    VmProperties, VmUpdate, VmUpdateProperties,
};
pub use vm_spec::VmSpec;
pub use vnet::{AddressSpace, VirtualNetwork, VirtualNetworkProperties};

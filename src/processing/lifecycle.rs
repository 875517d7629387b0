//! Per-VM lifecycle: network, creation and the operation battery.

use crate::azure::ManagementApi;
use crate::config::{FailurePolicy, Settings};
use crate::models::{
    DataDisk, DiskCreateOption, HardwareProfile, NetworkInterface, NetworkInterfaceReference,
    NetworkProfile, NicReferenceProperties, OsDisk, OsProfile, PublicIpAddress, StorageProfile,
    VirtualHardDisk, VirtualMachine, VmProperties, VmSpec, VmUpdate,
};
use crate::output::{connect_hint, print_error, print_vm};
use crate::BoxError;

pub const VM_SIZE: &str = "Standard_DS1_v2";
/// Size assumed for an OS disk whose size the service did not report.
pub const DEFAULT_OS_DISK_SIZE_GB: i32 = 256;
pub const OS_DISK_SIZE_INCREMENT_GB: i32 = 10;

const OS_DISK_NAME: &str = "osDisk";
const DATA_DISK_NAME: &str = "dataDisk";
const DATA_DISK_SIZE_GB: i32 = 1;

/// Size the OS disk grows to: the current size (or the default when unset
/// or non-positive) plus the increment.
pub fn next_os_disk_size(current: Option<i32>) -> i32 {
    let base = match current {
        Some(size) if size > 0 => size,
        _ => DEFAULT_OS_DISK_SIZE_GB,
    };
    base + OS_DISK_SIZE_INCREMENT_GB
}

/// Create the public IP address and the network interface for `spec`.
///
/// # Returns
/// * `Ok(NetworkInterface)` - The NIC as created, with its resource ID
pub async fn create_pip_and_nic(
    api: &dyn ManagementApi,
    settings: &Settings,
    spec: &VmSpec,
    subnet_id: &str,
) -> Result<NetworkInterface, BoxError> {
    let group = &settings.group_name;
    let pip_name = spec.public_ip_name();
    let label = spec.dns_label()?;

    println!("\tCreate public IP address '{pip_name}'...");
    let pip = api
        .create_public_ip(
            group,
            &pip_name,
            &PublicIpAddress::with_dns_label(&settings.location, &label),
        )
        .await
        .map_err(|e| format!("Failed to create public IP '{pip_name}': {e}"))?;
    let pip_id = pip
        .id
        .ok_or_else(|| format!("Public IP '{pip_name}' has no resource ID"))?;

    let nic_name = spec.nic_name();
    println!("\tCreate NIC '{nic_name}'...");
    let nic = api
        .create_network_interface(
            group,
            &nic_name,
            &NetworkInterface::new(&settings.location, &spec.ip_config_name(), subnet_id, &pip_id),
        )
        .await
        .map_err(|e| format!("Failed to create NIC '{nic_name}': {e}"))?;
    log::debug!("NIC '{}' created, state {:?}", nic_name, nic.properties.provisioning_state);

    println!("\tGet NIC info...");
    let nic = api
        .get_network_interface(group, &nic_name)
        .await
        .map_err(|e| format!("Failed to get NIC '{nic_name}': {e}"))?;
    if nic.id.is_none() {
        return Err(format!("NIC '{nic_name}' has no resource ID").into());
    }
    Ok(nic)
}

/// Create parameters for the VM described by `spec`, attached to `nic_id`.
pub fn vm_parameters(settings: &Settings, spec: &VmSpec, nic_id: &str) -> VirtualMachine {
    VirtualMachine {
        location: settings.location.clone(),
        properties: VmProperties {
            hardware_profile: Some(HardwareProfile {
                vm_size: VM_SIZE.to_string(),
            }),
            storage_profile: Some(StorageProfile {
                image_reference: Some(spec.image.clone()),
                os_disk: Some(OsDisk {
                    name: Some(OS_DISK_NAME.to_string()),
                    vhd: Some(VirtualHardDisk {
                        uri: settings.vhd_uri(&spec.name),
                    }),
                    create_option: DiskCreateOption::FromImage,
                    ..Default::default()
                }),
                data_disks: None,
            }),
            os_profile: Some(OsProfile {
                computer_name: Some(spec.name.clone()),
                admin_username: Some(settings.admin_user.clone()),
                admin_password: Some(settings.admin_password.clone()),
            }),
            network_profile: Some(NetworkProfile {
                network_interfaces: vec![NetworkInterfaceReference {
                    id: nic_id.to_string(),
                    properties: Some(NicReferenceProperties {
                        primary: Some(true),
                    }),
                }],
            }),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Create the network resources and the VM for `spec`, then print how to
/// connect to it.
pub async fn create_vm(
    api: &dyn ManagementApi,
    settings: &Settings,
    spec: &VmSpec,
    subnet_id: &str,
) -> Result<VirtualMachine, BoxError> {
    println!("Create '{}' VM...", spec.name);
    let nic = create_pip_and_nic(api, settings, spec, subnet_id).await?;
    let nic_id = nic.id.as_deref().unwrap_or_default();

    println!("\tCreate VM '{}'...", spec.name);
    let vm = api
        .create_or_update_vm(
            &settings.group_name,
            &spec.name,
            &vm_parameters(settings, spec, nic_id),
        )
        .await
        .map_err(|e| format!("Failed to create VM '{}': {e}", spec.name))?;

    let pip = api
        .get_public_ip(&settings.group_name, &spec.public_ip_name())
        .await
        .map_err(|e| format!("Failed to get public IP '{}': {e}", spec.public_ip_name()))?;
    let address = pip
        .fqdn()
        .or(pip.properties.ip_address.as_deref())
        .unwrap_or("<pending>");
    println!(
        "{}",
        connect_hint(&spec.name, &settings.admin_user, address, &settings.admin_password)
    );
    Ok(vm)
}

/// Re-read the VM, deallocate it and grow its OS disk.
///
/// # Returns
/// * `Ok(i32)` - The size requested for the OS disk
pub async fn update_os_disk_size(
    api: &dyn ManagementApi,
    group: &str,
    vm_name: &str,
) -> Result<i32, BoxError> {
    let vm = api.get_vm(group, vm_name).await?;
    let new_size = next_os_disk_size(vm.os_disk_size_gb());

    api.deallocate_vm(group, vm_name).await?;
    let updated = api
        .update_vm(group, vm_name, &VmUpdate::os_disk_size(new_size))
        .await?;
    log::info!(
        "VM '{}' OS disk {:?} -> {:?} GB",
        vm_name,
        vm.os_disk_size_gb(),
        updated.os_disk_size_gb()
    );
    Ok(new_size)
}

/// Record the outcome of one battery step. Under [`FailurePolicy::Abort`] an
/// error ends the battery; under `Continue` it is printed and remembered.
fn step_result<T>(
    policy: FailurePolicy,
    vm_name: &str,
    step: &str,
    result: Result<T, BoxError>,
    failed: &mut Vec<String>,
) -> Result<Option<T>, BoxError> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(e) => match policy {
            FailurePolicy::Abort => Err(format!("{step} failed for VM '{vm_name}': {e}").into()),
            FailurePolicy::Continue => {
                log::warn!("{step} failed for VM '{vm_name}', continuing: {e}");
                print_error(&e);
                failed.push(step.to_string());
                Ok(None)
            }
        },
    }
}

/// Run the fixed operation battery against one VM: inspect, tag, attach a
/// data disk, detach data disks, grow the OS disk, start, restart, stop.
///
/// # Returns
/// * `Ok(Vec<String>)` - The steps that failed (only ever non-empty under
///   [`FailurePolicy::Continue`])
pub async fn vm_operations(
    api: &dyn ManagementApi,
    settings: &Settings,
    spec: &VmSpec,
) -> Result<Vec<String>, BoxError> {
    let group = &settings.group_name;
    let name = &spec.name;
    let policy = settings.failure_policy;
    let mut failed = Vec::new();

    println!("Performing various operations on '{name}' VM");

    println!("\tGet VM '{name}' by name...");
    let res = api.get_vm(group, name).await.map_err(BoxError::from);
    if let Some(vm) = step_result(policy, name, "Get VM", res, &mut failed)? {
        print_vm(&vm);
    }

    println!("\tTag VM '{name}'...");
    let res = api
        .update_vm(
            group,
            name,
            &VmUpdate::tags([("who rocks", "rust"), ("where", "on azure")]),
        )
        .await
        .map_err(BoxError::from);
    step_result(policy, name, "Tag VM", res, &mut failed)?;

    println!("\tAttach data disk to VM '{name}'...");
    let disk = DataDisk {
        lun: 0,
        name: Some(DATA_DISK_NAME.to_string()),
        vhd: Some(VirtualHardDisk {
            uri: settings.vhd_uri(&format!("dataDisks-{name}")),
        }),
        create_option: DiskCreateOption::Empty,
        disk_size_gb: Some(DATA_DISK_SIZE_GB),
    };
    let res = api
        .update_vm(group, name, &VmUpdate::data_disks(vec![disk]))
        .await
        .map_err(BoxError::from);
    step_result(policy, name, "Attach data disk", res, &mut failed)?;

    println!("\tDetach data disks from VM '{name}'...");
    let res = api
        .update_vm(group, name, &VmUpdate::data_disks(Vec::new()))
        .await
        .map_err(BoxError::from);
    step_result(policy, name, "Detach data disks", res, &mut failed)?;

    println!("\tUpdate OS disk size for VM '{name}' (deallocate, then resize)...");
    let res = update_os_disk_size(api, group, name).await;
    if let Some(size) = step_result(policy, name, "Update OS disk size", res, &mut failed)? {
        println!("\tOS disk of '{name}' is now {size} GB");
    }

    println!("\tStart VM '{name}'...");
    let res = api.start_vm(group, name).await.map_err(BoxError::from);
    step_result(policy, name, "Start VM", res, &mut failed)?;

    println!("\tRestart VM '{name}'...");
    let res = api.restart_vm(group, name).await.map_err(BoxError::from);
    step_result(policy, name, "Restart VM", res, &mut failed)?;

    println!("\tStop VM '{name}'...");
    let res = api.power_off_vm(group, name).await.map_err(BoxError::from);
    step_result(policy, name, "Stop VM", res, &mut failed)?;

    if !failed.is_empty() {
        log::warn!("VM '{}': {} step(s) failed: {:?}", name, failed.len(), failed);
    }
    Ok(failed)
}

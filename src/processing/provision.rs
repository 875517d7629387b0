//! Shared resources every VM of a run depends on.

use crate::azure::ManagementApi;
use crate::config::Settings;
use crate::models::{ResourceGroup, StorageAccount, Subnet, VirtualNetwork};
use crate::BoxError;

pub const VNET_ADDRESS_PREFIX: &str = "10.0.0.0/16";
pub const SUBNET_ADDRESS_PREFIX: &str = "10.0.0.0/24";

/// Create the resource group, storage account, virtual network and subnet,
/// in that order, stopping at the first failure.
///
/// # Arguments
/// * `api` - The management client
/// * `settings` - Names and region of the run
///
/// # Returns
/// * `Ok(Subnet)` - The subnet as re-read from the service, with its ID resolved
pub async fn create_needed_resources(
    api: &dyn ManagementApi,
    settings: &Settings,
) -> Result<Subnet, BoxError> {
    let group = &settings.group_name;
    let location = &settings.location;

    println!("Create needed resources");
    println!("\tCreate resource group '{group}'...");
    api.create_resource_group(group, &ResourceGroup::new(location))
        .await
        .map_err(|e| format!("Failed to create resource group '{group}': {e}"))?;

    println!("\tCreate storage account '{}'...", settings.storage_account);
    api.create_storage_account(
        group,
        &settings.storage_account,
        &StorageAccount::standard_lrs(location),
    )
    .await
    .map_err(|e| {
        format!(
            "Failed to create storage account '{}': {e}",
            settings.storage_account
        )
    })?;

    println!("\tCreate virtual network '{}'...", settings.vnet_name);
    let vnet = api
        .create_virtual_network(
            group,
            &settings.vnet_name,
            &VirtualNetwork::new(location, &[VNET_ADDRESS_PREFIX]),
        )
        .await
        .map_err(|e| format!("Failed to create virtual network '{}': {e}", settings.vnet_name))?;
    log::info!("Created VNET: {}", vnet);

    println!("\tCreate subnet '{}'...", settings.subnet_name);
    api.create_subnet(
        group,
        &settings.vnet_name,
        &settings.subnet_name,
        &Subnet::with_prefix(SUBNET_ADDRESS_PREFIX),
    )
    .await
    .map_err(|e| format!("Failed to create subnet '{}': {e}", settings.subnet_name))?;

    let subnet = api
        .get_subnet(group, &settings.vnet_name, &settings.subnet_name)
        .await
        .map_err(|e| format!("Failed to get subnet '{}': {e}", settings.subnet_name))?;
    if subnet.id.is_none() {
        return Err(format!("Subnet '{}' has no resource ID", settings.subnet_name).into());
    }
    log::info!("Subnet ready: {:?}", subnet.id);
    Ok(subnet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::azure::{Operation, SimulatedApi};

    #[tokio::test]
    async fn test_creates_in_dependency_order() {
        let api = SimulatedApi::default();
        let subnet = create_needed_resources(&api, &Settings::default())
            .await
            .unwrap();
        assert!(subnet.id.unwrap().ends_with("/virtualNetworks/vNet/subnets/subnet"));

        let ops: Vec<Operation> = api.calls().into_iter().map(|c| c.op).collect();
        assert_eq!(
            ops,
            vec![
                Operation::CreateResourceGroup,
                Operation::CreateStorageAccount,
                Operation::CreateVirtualNetwork,
                Operation::CreateSubnet,
                Operation::GetSubnet,
            ]
        );
    }

    #[tokio::test]
    async fn test_aborts_on_first_failure() {
        let api = SimulatedApi::default();
        let settings = Settings::default();
        api.fail_on(Operation::CreateStorageAccount, &settings.storage_account);

        let err = create_needed_resources(&api, &settings).await.unwrap_err();
        assert!(err.to_string().contains("storage account"));
        assert_eq!(api.calls().len(), 2);
    }
}

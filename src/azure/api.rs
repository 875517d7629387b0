//! The management operations the sample needs, behind one trait.
//!
//! [`ArmApi`] talks to Azure over REST. The orchestration code only sees
//! `&dyn ManagementApi`, so the same pipeline runs against the simulated
//! control plane in dry runs and tests.

use super::client::ArmClient;
use super::error::ArmResult;
use crate::config::{
    API_VERSION_COMPUTE, API_VERSION_NETWORK, API_VERSION_RESOURCES, API_VERSION_STORAGE,
};
use crate::models::{
    NetworkInterface, PublicIpAddress, ResourceGroup, StorageAccount, Subnet, VirtualMachine,
    VirtualNetwork, VmUpdate,
};
use async_trait::async_trait;

#[async_trait]
pub trait ManagementApi: Send + Sync {
    async fn create_resource_group(&self, name: &str, params: &ResourceGroup)
        -> ArmResult<ResourceGroup>;
    async fn delete_resource_group(&self, name: &str) -> ArmResult<()>;

    async fn create_storage_account(
        &self,
        group: &str,
        name: &str,
        params: &StorageAccount,
    ) -> ArmResult<StorageAccount>;

    async fn create_virtual_network(
        &self,
        group: &str,
        name: &str,
        params: &VirtualNetwork,
    ) -> ArmResult<VirtualNetwork>;
    async fn create_subnet(
        &self,
        group: &str,
        vnet: &str,
        name: &str,
        params: &Subnet,
    ) -> ArmResult<Subnet>;
    async fn get_subnet(&self, group: &str, vnet: &str, name: &str) -> ArmResult<Subnet>;

    async fn create_public_ip(
        &self,
        group: &str,
        name: &str,
        params: &PublicIpAddress,
    ) -> ArmResult<PublicIpAddress>;
    async fn get_public_ip(&self, group: &str, name: &str) -> ArmResult<PublicIpAddress>;

    async fn create_network_interface(
        &self,
        group: &str,
        name: &str,
        params: &NetworkInterface,
    ) -> ArmResult<NetworkInterface>;
    async fn get_network_interface(&self, group: &str, name: &str) -> ArmResult<NetworkInterface>;

    async fn create_or_update_vm(
        &self,
        group: &str,
        name: &str,
        params: &VirtualMachine,
    ) -> ArmResult<VirtualMachine>;
    /// Read a VM including its instance view.
    async fn get_vm(&self, group: &str, name: &str) -> ArmResult<VirtualMachine>;
    /// Apply a partial update; fields absent from `update` are left alone.
    async fn update_vm(&self, group: &str, name: &str, update: &VmUpdate)
        -> ArmResult<VirtualMachine>;
    async fn deallocate_vm(&self, group: &str, name: &str) -> ArmResult<()>;
    async fn start_vm(&self, group: &str, name: &str) -> ArmResult<()>;
    async fn restart_vm(&self, group: &str, name: &str) -> ArmResult<()>;
    async fn power_off_vm(&self, group: &str, name: &str) -> ArmResult<()>;
    async fn delete_vm(&self, group: &str, name: &str) -> ArmResult<()>;
    /// Every VM visible in the subscription, across all groups.
    async fn list_all_vms(&self) -> ArmResult<Vec<VirtualMachine>>;
}

/// [`ManagementApi`] over the ARM REST endpoints.
pub struct ArmApi {
    client: ArmClient,
}

impl ArmApi {
    pub fn new(client: ArmClient) -> Self {
        ArmApi { client }
    }

    fn storage_url(&self, group: &str, name: &str) -> String {
        self.client.resource_group_url(
            group,
            &format!("/providers/Microsoft.Storage/storageAccounts/{name}"),
            API_VERSION_STORAGE,
        )
    }

    fn network_url(&self, group: &str, path: &str) -> String {
        self.client.resource_group_url(
            group,
            &format!("/providers/Microsoft.Network/{path}"),
            API_VERSION_NETWORK,
        )
    }

    fn vm_url(&self, group: &str, name: &str, action: Option<&str>) -> String {
        let action = action.map(|a| format!("/{a}")).unwrap_or_default();
        self.client.resource_group_url(
            group,
            &format!("/providers/Microsoft.Compute/virtualMachines/{name}{action}"),
            API_VERSION_COMPUTE,
        )
    }

    async fn vm_action(&self, group: &str, name: &str, action: &str) -> ArmResult<()> {
        let url = self.vm_url(group, name, Some(action));
        log::debug!("{action}_vm({group}/{name})");
        self.client.post_action(&url).await
    }
}

#[async_trait]
impl ManagementApi for ArmApi {
    async fn create_resource_group(
        &self,
        name: &str,
        params: &ResourceGroup,
    ) -> ArmResult<ResourceGroup> {
        let url = self.client.subscription_url(
            &format!("/resourcegroups/{name}"),
            API_VERSION_RESOURCES,
        );
        self.client.put_json(&url, params).await
    }

    async fn delete_resource_group(&self, name: &str) -> ArmResult<()> {
        let url = self.client.subscription_url(
            &format!("/resourcegroups/{name}"),
            API_VERSION_RESOURCES,
        );
        self.client.delete(&url).await
    }

    async fn create_storage_account(
        &self,
        group: &str,
        name: &str,
        params: &StorageAccount,
    ) -> ArmResult<StorageAccount> {
        self.client
            .put_json(&self.storage_url(group, name), params)
            .await
    }

    async fn create_virtual_network(
        &self,
        group: &str,
        name: &str,
        params: &VirtualNetwork,
    ) -> ArmResult<VirtualNetwork> {
        let url = self.network_url(group, &format!("virtualNetworks/{name}"));
        self.client.put_json(&url, params).await
    }

    async fn create_subnet(
        &self,
        group: &str,
        vnet: &str,
        name: &str,
        params: &Subnet,
    ) -> ArmResult<Subnet> {
        let url = self.network_url(group, &format!("virtualNetworks/{vnet}/subnets/{name}"));
        self.client.put_json(&url, params).await
    }

    async fn get_subnet(&self, group: &str, vnet: &str, name: &str) -> ArmResult<Subnet> {
        let url = self.network_url(group, &format!("virtualNetworks/{vnet}/subnets/{name}"));
        self.client.get_json(&url).await
    }

    async fn create_public_ip(
        &self,
        group: &str,
        name: &str,
        params: &PublicIpAddress,
    ) -> ArmResult<PublicIpAddress> {
        let url = self.network_url(group, &format!("publicIPAddresses/{name}"));
        self.client.put_json(&url, params).await
    }

    async fn get_public_ip(&self, group: &str, name: &str) -> ArmResult<PublicIpAddress> {
        let url = self.network_url(group, &format!("publicIPAddresses/{name}"));
        self.client.get_json(&url).await
    }

    async fn create_network_interface(
        &self,
        group: &str,
        name: &str,
        params: &NetworkInterface,
    ) -> ArmResult<NetworkInterface> {
        let url = self.network_url(group, &format!("networkInterfaces/{name}"));
        self.client.put_json(&url, params).await
    }

    async fn get_network_interface(&self, group: &str, name: &str) -> ArmResult<NetworkInterface> {
        let url = self.network_url(group, &format!("networkInterfaces/{name}"));
        self.client.get_json(&url).await
    }

    async fn create_or_update_vm(
        &self,
        group: &str,
        name: &str,
        params: &VirtualMachine,
    ) -> ArmResult<VirtualMachine> {
        self.client
            .put_json(&self.vm_url(group, name, None), params)
            .await
    }

    async fn get_vm(&self, group: &str, name: &str) -> ArmResult<VirtualMachine> {
        let url = format!("{}&$expand=instanceView", self.vm_url(group, name, None));
        self.client.get_json(&url).await
    }

    async fn update_vm(
        &self,
        group: &str,
        name: &str,
        update: &VmUpdate,
    ) -> ArmResult<VirtualMachine> {
        self.client
            .patch_json(&self.vm_url(group, name, None), update)
            .await
    }

    async fn deallocate_vm(&self, group: &str, name: &str) -> ArmResult<()> {
        self.vm_action(group, name, "deallocate").await
    }

    async fn start_vm(&self, group: &str, name: &str) -> ArmResult<()> {
        self.vm_action(group, name, "start").await
    }

    async fn restart_vm(&self, group: &str, name: &str) -> ArmResult<()> {
        self.vm_action(group, name, "restart").await
    }

    async fn power_off_vm(&self, group: &str, name: &str) -> ArmResult<()> {
        self.vm_action(group, name, "powerOff").await
    }

    async fn delete_vm(&self, group: &str, name: &str) -> ArmResult<()> {
        self.client.delete(&self.vm_url(group, name, None)).await
    }

    async fn list_all_vms(&self) -> ArmResult<Vec<VirtualMachine>> {
        let url = self.client.subscription_url(
            "/providers/Microsoft.Compute/virtualMachines",
            API_VERSION_COMPUTE,
        );
        self.client.get_all_pages(&url).await
    }
}

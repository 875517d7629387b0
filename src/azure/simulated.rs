//! In-memory stand-in for the management plane.
//!
//! Keeps the resources of one fake subscription and enforces the ordering
//! rules the real service enforces: resources live in an existing group, a
//! NIC references an existing subnet and address, a VM references an existing
//! NIC, the OS disk is only resized while the VM is deallocated, and deleting
//! a group removes its contents. Every call is recorded, and a failure can be
//! injected on a chosen call.

use super::api::ManagementApi;
use super::error::{ArmError, ArmResult};
use crate::models::{
    InstanceStatus, InstanceView, NetworkInterface, PublicIpAddress, ResourceGroup,
    StorageAccount, Subnet, VirtualMachine, VirtualNetwork, VmUpdate,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

const DEFAULT_SUBSCRIPTION: &str = "00000000-0000-0000-0000-000000000000";

/// Kind of management call, as recorded by [`SimulatedApi`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateResourceGroup,
    DeleteResourceGroup,
    CreateStorageAccount,
    CreateVirtualNetwork,
    CreateSubnet,
    GetSubnet,
    CreatePublicIp,
    GetPublicIp,
    CreateNetworkInterface,
    GetNetworkInterface,
    CreateVm,
    GetVm,
    UpdateVm,
    DeallocateVm,
    StartVm,
    RestartVm,
    PowerOffVm,
    DeleteVm,
    ListVms,
}

/// One recorded call: the operation and the name of the resource it targeted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCall {
    pub op: Operation,
    pub target: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PowerState {
    Running,
    Stopped,
    Deallocated,
}

impl PowerState {
    fn code(self) -> &'static str {
        match self {
            PowerState::Running => "running",
            PowerState::Stopped => "stopped",
            PowerState::Deallocated => "deallocated",
        }
    }
}

#[derive(Debug, Clone)]
struct SimVm {
    vm: VirtualMachine,
    power: PowerState,
}

type Key = (String, String);

#[derive(Default)]
struct State {
    groups: BTreeMap<String, ResourceGroup>,
    storage: BTreeMap<Key, StorageAccount>,
    vnets: BTreeMap<Key, VirtualNetwork>,
    subnets: BTreeMap<(String, String, String), Subnet>,
    public_ips: BTreeMap<Key, PublicIpAddress>,
    nics: BTreeMap<Key, NetworkInterface>,
    vms: BTreeMap<Key, SimVm>,
    calls: Vec<ApiCall>,
    fail_on: Option<(Operation, String)>,
    next_ip: u8,
}

pub struct SimulatedApi {
    subscription_id: String,
    state: Mutex<State>,
}

impl Default for SimulatedApi {
    fn default() -> Self {
        SimulatedApi::new(DEFAULT_SUBSCRIPTION)
    }
}

fn key(group: &str, name: &str) -> Key {
    (group.to_lowercase(), name.to_lowercase())
}

fn not_found(method: &str, kind: &str, name: &str) -> ArmError {
    ArmError::status(
        method,
        name,
        404,
        "ResourceNotFound",
        &format!("The {kind} '{name}' was not found."),
    )
}

impl SimulatedApi {
    pub fn new(subscription_id: &str) -> Self {
        SimulatedApi {
            subscription_id: subscription_id.to_string(),
            state: Mutex::new(State::default()),
        }
    }

    /// Make the next call of `op` against `target` fail with a 500.
    pub fn fail_on(&self, op: Operation, target: &str) {
        self.state().fail_on = Some((op, target.to_string()));
    }

    /// Add a VM that exists outside this run, e.g. in another group.
    pub fn with_existing_vm(self, group: &str, vm: VirtualMachine) -> Self {
        {
            let mut state = self.state();
            let name = vm.name.clone().unwrap_or_default();
            state.vms.insert(
                key(group, &name),
                SimVm {
                    vm,
                    power: PowerState::Running,
                },
            );
        }
        self
    }

    /// Calls recorded so far, in order.
    pub fn calls(&self) -> Vec<ApiCall> {
        self.state().calls.clone()
    }

    /// Current state of a VM, as `get_vm` would return it.
    pub fn vm(&self, group: &str, name: &str) -> Option<VirtualMachine> {
        self.state().vms.get(&key(group, name)).map(with_instance_view)
    }

    pub fn has_resource_group(&self, name: &str) -> bool {
        self.state().groups.contains_key(&name.to_lowercase())
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn id(&self, group: &str, provider_path: &str) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/{}",
            self.subscription_id, group, provider_path
        )
    }

    /// Record the call, yield so concurrent pipelines interleave, then check
    /// for an injected failure.
    async fn record(&self, op: Operation, target: &str) -> ArmResult<()> {
        self.state().calls.push(ApiCall {
            op,
            target: target.to_string(),
        });
        tokio::task::yield_now().await;

        let mut state = self.state();
        let hit = matches!(&state.fail_on, Some((fail_op, fail_target)) if *fail_op == op && fail_target == target);
        if hit {
            state.fail_on = None;
            log::warn!("injected failure for {:?} on '{}'", op, target);
            return Err(ArmError::status(
                &format!("{op:?}"),
                target,
                500,
                "InternalServerError",
                "injected failure",
            ));
        }
        Ok(())
    }
}

fn require_group(state: &State, group: &str) -> ArmResult<()> {
    if state.groups.contains_key(&group.to_lowercase()) {
        Ok(())
    } else {
        Err(ArmError::status(
            "PUT",
            group,
            404,
            "ResourceGroupNotFound",
            &format!("Resource group '{group}' could not be found."),
        ))
    }
}

fn with_instance_view(sim: &SimVm) -> VirtualMachine {
    let mut vm = sim.vm.clone();
    vm.properties.instance_view = Some(InstanceView {
        statuses: vec![
            InstanceStatus {
                code: "ProvisioningState/succeeded".to_string(),
                display_status: Some("Provisioning succeeded".to_string()),
            },
            InstanceStatus {
                code: format!("PowerState/{}", sim.power.code()),
                display_status: None,
            },
        ],
    });
    vm
}

#[async_trait]
impl ManagementApi for SimulatedApi {
    async fn create_resource_group(
        &self,
        name: &str,
        params: &ResourceGroup,
    ) -> ArmResult<ResourceGroup> {
        self.record(Operation::CreateResourceGroup, name).await?;
        let group = ResourceGroup {
            id: Some(format!(
                "/subscriptions/{}/resourceGroups/{}",
                self.subscription_id, name
            )),
            name: Some(name.to_string()),
            ..params.clone()
        };
        self.state()
            .groups
            .insert(name.to_lowercase(), group.clone());
        Ok(group)
    }

    async fn delete_resource_group(&self, name: &str) -> ArmResult<()> {
        self.record(Operation::DeleteResourceGroup, name).await?;
        let mut state = self.state();
        let g = name.to_lowercase();
        state.groups.remove(&g);
        state.storage.retain(|(group, _), _| *group != g);
        state.vnets.retain(|(group, _), _| *group != g);
        state.subnets.retain(|(group, _, _), _| *group != g);
        state.public_ips.retain(|(group, _), _| *group != g);
        state.nics.retain(|(group, _), _| *group != g);
        state.vms.retain(|(group, _), _| *group != g);
        Ok(())
    }

    async fn create_storage_account(
        &self,
        group: &str,
        name: &str,
        params: &StorageAccount,
    ) -> ArmResult<StorageAccount> {
        self.record(Operation::CreateStorageAccount, name).await?;
        let mut state = self.state();
        require_group(&state, group)?;
        let account = StorageAccount {
            id: Some(self.id(group, &format!("Microsoft.Storage/storageAccounts/{name}"))),
            name: Some(name.to_string()),
            ..params.clone()
        };
        state.storage.insert(key(group, name), account.clone());
        Ok(account)
    }

    async fn create_virtual_network(
        &self,
        group: &str,
        name: &str,
        params: &VirtualNetwork,
    ) -> ArmResult<VirtualNetwork> {
        self.record(Operation::CreateVirtualNetwork, name).await?;
        let mut state = self.state();
        require_group(&state, group)?;
        let vnet = VirtualNetwork {
            id: Some(self.id(group, &format!("Microsoft.Network/virtualNetworks/{name}"))),
            name: Some(name.to_string()),
            ..params.clone()
        };
        state.vnets.insert(key(group, name), vnet.clone());
        Ok(vnet)
    }

    async fn create_subnet(
        &self,
        group: &str,
        vnet: &str,
        name: &str,
        params: &Subnet,
    ) -> ArmResult<Subnet> {
        self.record(Operation::CreateSubnet, name).await?;
        let mut state = self.state();
        require_group(&state, group)?;
        if !state.vnets.contains_key(&key(group, vnet)) {
            return Err(not_found("PUT", "virtual network", vnet));
        }
        let subnet = Subnet {
            id: Some(self.id(
                group,
                &format!("Microsoft.Network/virtualNetworks/{vnet}/subnets/{name}"),
            )),
            name: Some(name.to_string()),
            ..params.clone()
        };
        let (g, v) = key(group, vnet);
        state
            .subnets
            .insert((g, v, name.to_lowercase()), subnet.clone());
        Ok(subnet)
    }

    async fn get_subnet(&self, group: &str, vnet: &str, name: &str) -> ArmResult<Subnet> {
        self.record(Operation::GetSubnet, name).await?;
        let (g, v) = key(group, vnet);
        self.state()
            .subnets
            .get(&(g, v, name.to_lowercase()))
            .cloned()
            .ok_or_else(|| not_found("GET", "subnet", name))
    }

    async fn create_public_ip(
        &self,
        group: &str,
        name: &str,
        params: &PublicIpAddress,
    ) -> ArmResult<PublicIpAddress> {
        self.record(Operation::CreatePublicIp, name).await?;
        let mut state = self.state();
        require_group(&state, group)?;
        state.next_ip = state.next_ip.wrapping_add(1);
        let mut pip = PublicIpAddress {
            id: Some(self.id(group, &format!("Microsoft.Network/publicIPAddresses/{name}"))),
            name: Some(name.to_string()),
            ..params.clone()
        };
        pip.properties.ip_address = Some(format!("20.0.0.{}", state.next_ip));
        pip.properties.provisioning_state = Some("Succeeded".to_string());
        let location = pip.location.clone();
        if let Some(dns) = pip.properties.dns_settings.as_mut() {
            dns.fqdn = Some(format!(
                "{}.{}.cloudapp.azure.com",
                dns.domain_name_label, location
            ));
        }
        state.public_ips.insert(key(group, name), pip.clone());
        Ok(pip)
    }

    async fn get_public_ip(&self, group: &str, name: &str) -> ArmResult<PublicIpAddress> {
        self.record(Operation::GetPublicIp, name).await?;
        self.state()
            .public_ips
            .get(&key(group, name))
            .cloned()
            .ok_or_else(|| not_found("GET", "public IP address", name))
    }

    async fn create_network_interface(
        &self,
        group: &str,
        name: &str,
        params: &NetworkInterface,
    ) -> ArmResult<NetworkInterface> {
        self.record(Operation::CreateNetworkInterface, name).await?;
        let mut state = self.state();
        require_group(&state, group)?;
        for cfg in &params.properties.ip_configurations {
            let subnet_id = &cfg.properties.subnet.id;
            if !state.subnets.values().any(|s| s.id.as_ref() == Some(subnet_id)) {
                return Err(not_found("PUT", "subnet", subnet_id));
            }
            if let Some(pip) = &cfg.properties.public_ip_address {
                if !state.public_ips.values().any(|p| p.id.as_ref() == Some(&pip.id)) {
                    return Err(not_found("PUT", "public IP address", &pip.id));
                }
            }
        }
        let nic = NetworkInterface {
            id: Some(self.id(group, &format!("Microsoft.Network/networkInterfaces/{name}"))),
            name: Some(name.to_string()),
            ..params.clone()
        };
        state.nics.insert(key(group, name), nic.clone());
        Ok(nic)
    }

    async fn get_network_interface(&self, group: &str, name: &str) -> ArmResult<NetworkInterface> {
        self.record(Operation::GetNetworkInterface, name).await?;
        self.state()
            .nics
            .get(&key(group, name))
            .cloned()
            .ok_or_else(|| not_found("GET", "network interface", name))
    }

    async fn create_or_update_vm(
        &self,
        group: &str,
        name: &str,
        params: &VirtualMachine,
    ) -> ArmResult<VirtualMachine> {
        self.record(Operation::CreateVm, name).await?;
        let mut state = self.state();
        require_group(&state, group)?;
        let nic_ids = params.nic_ids();
        if nic_ids.is_empty() {
            return Err(ArmError::status(
                "PUT",
                name,
                400,
                "InvalidParameter",
                "At least one network interface is required.",
            ));
        }
        for nic_id in nic_ids {
            if !state.nics.values().any(|n| n.id.as_deref() == Some(nic_id)) {
                return Err(not_found("PUT", "network interface", nic_id));
            }
        }
        let mut vm = params.clone();
        vm.id = Some(self.id(group, &format!("Microsoft.Compute/virtualMachines/{name}")));
        vm.name = Some(name.to_string());
        vm.resource_type = Some("Microsoft.Compute/virtualMachines".to_string());
        vm.properties.provisioning_state = Some("Succeeded".to_string());
        if let Some(os) = vm.properties.os_profile.as_mut() {
            os.admin_password = None;
        }
        let power = state
            .vms
            .get(&key(group, name))
            .map(|s| s.power)
            .unwrap_or(PowerState::Running);
        state.vms.insert(key(group, name), SimVm { vm: vm.clone(), power });
        Ok(vm)
    }

    async fn get_vm(&self, group: &str, name: &str) -> ArmResult<VirtualMachine> {
        self.record(Operation::GetVm, name).await?;
        self.state()
            .vms
            .get(&key(group, name))
            .map(with_instance_view)
            .ok_or_else(|| not_found("GET", "virtual machine", name))
    }

    async fn update_vm(
        &self,
        group: &str,
        name: &str,
        update: &VmUpdate,
    ) -> ArmResult<VirtualMachine> {
        self.record(Operation::UpdateVm, name).await?;
        let mut state = self.state();
        let sim = state
            .vms
            .get_mut(&key(group, name))
            .ok_or_else(|| not_found("PATCH", "virtual machine", name))?;
        if update.os_disk_size_gb().is_some() && sim.power != PowerState::Deallocated {
            return Err(ArmError::status(
                "PATCH",
                name,
                409,
                "OperationNotAllowed",
                "Disk resizing is allowed only when the VM is deallocated.",
            ));
        }
        sim.vm.apply(update);
        Ok(sim.vm.clone())
    }

    async fn deallocate_vm(&self, group: &str, name: &str) -> ArmResult<()> {
        self.record(Operation::DeallocateVm, name).await?;
        self.set_power(group, name, PowerState::Deallocated)
    }

    async fn start_vm(&self, group: &str, name: &str) -> ArmResult<()> {
        self.record(Operation::StartVm, name).await?;
        self.set_power(group, name, PowerState::Running)
    }

    async fn restart_vm(&self, group: &str, name: &str) -> ArmResult<()> {
        self.record(Operation::RestartVm, name).await?;
        let mut state = self.state();
        let sim = state
            .vms
            .get_mut(&key(group, name))
            .ok_or_else(|| not_found("POST", "virtual machine", name))?;
        if sim.power != PowerState::Running {
            return Err(ArmError::status(
                "POST",
                name,
                409,
                "OperationNotAllowed",
                "Cannot restart a VM that is not running.",
            ));
        }
        Ok(())
    }

    async fn power_off_vm(&self, group: &str, name: &str) -> ArmResult<()> {
        self.record(Operation::PowerOffVm, name).await?;
        self.set_power(group, name, PowerState::Stopped)
    }

    async fn delete_vm(&self, group: &str, name: &str) -> ArmResult<()> {
        self.record(Operation::DeleteVm, name).await?;
        self.state().vms.remove(&key(group, name));
        Ok(())
    }

    async fn list_all_vms(&self) -> ArmResult<Vec<VirtualMachine>> {
        self.record(Operation::ListVms, &self.subscription_id).await?;
        Ok(self.state().vms.values().map(|s| s.vm.clone()).collect())
    }
}

impl SimulatedApi {
    fn set_power(&self, group: &str, name: &str, power: PowerState) -> ArmResult<()> {
        let mut state = self.state();
        let sim = state
            .vms
            .get_mut(&key(group, name))
            .ok_or_else(|| not_found("POST", "virtual machine", name))?;
        sim.power = power;
        Ok(())
    }
}

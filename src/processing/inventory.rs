//! Listing every VM in the subscription.

use crate::azure::ManagementApi;
use crate::models::VirtualMachine;
use crate::output::print_vm;
use crate::BoxError;

pub const NO_VMS_MESSAGE: &str = "There are no VMs in this subscription";

/// List and print all VMs visible in the subscription, not only the ones
/// this run created.
pub async fn list_vms(api: &dyn ManagementApi) -> Result<Vec<VirtualMachine>, BoxError> {
    println!("List VMs in subscription...");
    let vms = api
        .list_all_vms()
        .await
        .map_err(|e| format!("Failed to list VMs: {e}"))?;
    log::info!("got {} VM(s) in subscription", vms.len());

    if vms.is_empty() {
        println!("{NO_VMS_MESSAGE}");
    }
    for vm in &vms {
        print_vm(vm);
    }
    Ok(vms)
}

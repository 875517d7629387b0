//! The whole run, from shared resources to teardown.

use super::inventory::list_vms;
use super::lifecycle::{create_vm, vm_operations};
use super::pool::for_each_vm;
use super::provision::create_needed_resources;
use super::teardown::{confirm_teardown, delete_resource_group, delete_vm};
use crate::azure::ManagementApi;
use crate::config::Settings;
use crate::output::print_phase;
use crate::BoxError;
use std::collections::BTreeMap;
use tokio::io::AsyncBufRead;

/// What a completed run did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// VMs created, in list order.
    pub created: Vec<String>,
    /// Battery steps that failed, per VM. Empty unless the failure policy
    /// is `Continue`.
    pub failed_steps: BTreeMap<String, Vec<String>>,
    /// Number of VMs seen in the subscription listing.
    pub listed: usize,
}

/// Run the pipeline: provision shared resources, create every VM, run the
/// operation battery on each, list the subscription, then delete the VMs and
/// the resource group.
///
/// Each VM phase goes through the worker pool and completes for every VM
/// before the next phase starts. `input` is read for the teardown
/// confirmation when it is enabled.
pub async fn run_pipeline<R>(
    api: &dyn ManagementApi,
    settings: &Settings,
    input: &mut R,
) -> Result<RunReport, BoxError>
where
    R: AsyncBufRead + Unpin,
{
    let specs = settings.vm_specs.as_slice();
    let width = settings.parallel;
    log::info!(
        "#Start run_pipeline() group='{}' vms={} parallel={} policy={:?}",
        settings.group_name,
        specs.len(),
        width,
        settings.failure_policy
    );

    print_phase("Provision");
    let subnet = create_needed_resources(api, settings).await?;
    let subnet_id = subnet.id.as_deref().unwrap_or_default();

    print_phase("Create VMs");
    let vms = for_each_vm(specs, width, |spec| create_vm(api, settings, spec, subnet_id)).await?;
    let created: Vec<String> = specs.iter().map(|s| s.name.clone()).collect();
    log::info!("created {} VM(s)", vms.len());

    print_phase("VM operations");
    let failures = for_each_vm(specs, width, |spec| vm_operations(api, settings, spec)).await?;
    let failed_steps: BTreeMap<String, Vec<String>> = specs
        .iter()
        .map(|s| s.name.clone())
        .zip(failures)
        .filter(|(_, steps)| !steps.is_empty())
        .collect();

    print_phase("Inventory");
    let listed = list_vms(api).await?.len();

    print_phase("Teardown");
    if settings.confirm_teardown {
        confirm_teardown(input).await?;
    }
    let group = settings.group_name.as_str();
    for_each_vm(specs, width, |spec| delete_vm(api, group, spec)).await?;
    delete_resource_group(api, group).await?;

    log::info!("#End run_pipeline()");
    Ok(RunReport {
        created,
        failed_steps,
        listed,
    })
}

//! Integration tests for azure-vm-sample
//!
//! These tests run the whole pipeline against the simulated control plane
//! and check the order of the calls it records.

use azure_vm_sample::azure::{ApiCall, Operation, SimulatedApi};
use azure_vm_sample::config::{FailurePolicy, Settings};
use azure_vm_sample::models::{ImageReference, VirtualMachine, VmSpec};
use azure_vm_sample::processing::run_pipeline;

fn settings(parallel: usize) -> Settings {
    Settings {
        parallel,
        confirm_teardown: false,
        ..Settings::default()
    }
}

fn position(calls: &[ApiCall], op: Operation, target: &str) -> usize {
    calls
        .iter()
        .position(|c| c.op == op && c.target == target)
        .unwrap_or_else(|| panic!("no {op:?} call for '{target}'"))
}

fn positions(calls: &[ApiCall], op: Operation) -> Vec<usize> {
    calls
        .iter()
        .enumerate()
        .filter(|(_, c)| c.op == op)
        .map(|(i, _)| i)
        .collect()
}

#[tokio::test]
async fn test_full_pipeline_parallel() {
    let api = SimulatedApi::default();
    let settings = settings(2);
    let mut input: &[u8] = b"";

    let report = run_pipeline(&api, &settings, &mut input)
        .await
        .expect("pipeline should succeed");

    assert_eq!(report.created, vec!["linuxVM", "windowsVM"]);
    assert!(report.failed_steps.is_empty());
    assert_eq!(report.listed, 2);
    assert!(!api.has_resource_group(&settings.group_name));

    let calls = api.calls();
    let ops: Vec<Operation> = calls.iter().take(5).map(|c| c.op).collect();
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

    for vm in ["linuxVM", "windowsVM"] {
        let pip = position(&calls, Operation::CreatePublicIp, &format!("pip-{vm}"));
        let nic = position(&calls, Operation::CreateNetworkInterface, &format!("nic-{vm}"));
        let create = position(&calls, Operation::CreateVm, vm);
        let delete = position(&calls, Operation::DeleteVm, vm);
        assert!(pip < nic && nic < create, "network before VM for {vm}");
        assert!(create < delete, "delete before create for {vm}");

        let deallocate = position(&calls, Operation::DeallocateVm, vm);
        let updates: Vec<usize> = calls
            .iter()
            .enumerate()
            .filter(|(_, c)| c.op == Operation::UpdateVm && c.target == vm)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(updates.len(), 4, "tag, attach, detach, resize for {vm}");
        assert!(deallocate < updates[3], "deallocate before resize for {vm}");
    }

    // join barriers
    let last_create = *positions(&calls, Operation::CreateVm).last().unwrap();
    let first_get = positions(&calls, Operation::GetVm)[0];
    assert!(last_create < first_get, "every VM created before operations start");

    let last_power_off = *positions(&calls, Operation::PowerOffVm).last().unwrap();
    let first_delete = positions(&calls, Operation::DeleteVm)[0];
    assert!(last_power_off < first_delete, "battery finished before teardown");

    let last_delete = *positions(&calls, Operation::DeleteVm).last().unwrap();
    let group_delete = position(&calls, Operation::DeleteResourceGroup, &settings.group_name);
    assert!(last_delete < group_delete);
    assert_eq!(group_delete, calls.len() - 1);
}

#[tokio::test]
async fn test_vm_pipelines_interleave_when_parallel() {
    let api = SimulatedApi::default();
    let mut input: &[u8] = b"";
    run_pipeline(&api, &settings(2), &mut input).await.unwrap();

    let calls = api.calls();
    let windows_pip = position(&calls, Operation::CreatePublicIp, "pip-windowsVM");
    let linux_vm = position(&calls, Operation::CreateVm, "linuxVM");
    assert!(windows_pip < linux_vm);
}

#[tokio::test]
async fn test_sequential_pool_runs_one_vm_at_a_time() {
    let api = SimulatedApi::default();
    let mut input: &[u8] = b"";
    run_pipeline(&api, &settings(1), &mut input).await.unwrap();

    let calls = api.calls();
    let linux_vm = position(&calls, Operation::CreateVm, "linuxVM");
    let windows_pip = position(&calls, Operation::CreatePublicIp, "pip-windowsVM");
    assert!(linux_vm < windows_pip);

    let linux_stop = position(&calls, Operation::PowerOffVm, "linuxVM");
    let windows_get = position(&calls, Operation::GetVm, "windowsVM");
    assert!(linux_stop < windows_get);
}

#[tokio::test]
async fn test_demo_vm_disk_grows_from_default() {
    let api = SimulatedApi::default();
    let settings = Settings {
        vm_specs: vec![VmSpec::new(
            "demoVM",
            ImageReference::latest("Canonical", "UbuntuServer", "16.04.0-LTS"),
        )],
        ..settings(1)
    };
    // keep the VM around to inspect it: fail the teardown on purpose
    api.fail_on(Operation::DeleteVm, "demoVM");
    let mut input: &[u8] = b"";

    let err = run_pipeline(&api, &settings, &mut input).await.unwrap_err();
    assert!(err.to_string().contains("demoVM"));

    let vm = api.vm(&settings.group_name, "demoVM").expect("VM still exists");
    assert_eq!(vm.os_disk_size_gb(), Some(266));
    assert_eq!(vm.power_state(), Some("stopped"));
    assert!(vm.data_disks().is_empty());
    assert!(api.has_resource_group(&settings.group_name));
}

#[tokio::test]
async fn test_abort_policy_stops_the_run() {
    let api = SimulatedApi::default();
    api.fail_on(Operation::UpdateVm, "linuxVM");
    let mut input: &[u8] = b"";

    let err = run_pipeline(&api, &settings(1), &mut input)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Tag VM"));

    let calls = api.calls();
    assert!(positions(&calls, Operation::ListVms).is_empty());
    assert!(positions(&calls, Operation::DeleteVm).is_empty());
    assert!(positions(&calls, Operation::DeallocateVm).is_empty());
}

#[tokio::test]
async fn test_continue_policy_finishes_the_run() {
    let api = SimulatedApi::default();
    api.fail_on(Operation::UpdateVm, "linuxVM");
    let settings = Settings {
        failure_policy: FailurePolicy::Continue,
        ..settings(2)
    };
    let mut input: &[u8] = b"";

    let report = run_pipeline(&api, &settings, &mut input)
        .await
        .expect("battery errors are not fatal");
    assert_eq!(
        report.failed_steps.get("linuxVM"),
        Some(&vec!["Tag VM".to_string()])
    );
    assert!(!report.failed_steps.contains_key("windowsVM"));
    assert!(!api.has_resource_group(&settings.group_name));
}

#[tokio::test]
async fn test_setup_errors_are_fatal_under_continue() {
    let api = SimulatedApi::default();
    api.fail_on(Operation::CreateNetworkInterface, "nic-windowsVM");
    let settings = Settings {
        failure_policy: FailurePolicy::Continue,
        ..settings(2)
    };
    let mut input: &[u8] = b"";

    let err = run_pipeline(&api, &settings, &mut input).await.unwrap_err();
    assert!(err.to_string().contains("nic-windowsVM"));
    assert!(positions(&api.calls(), Operation::GetVm).is_empty());
}

#[tokio::test]
async fn test_listing_includes_other_groups() {
    let api = SimulatedApi::default().with_existing_vm(
        "another-group",
        VirtualMachine {
            name: Some("legacyVM".to_string()),
            location: "eastus".to_string(),
            ..Default::default()
        },
    );
    let mut input: &[u8] = b"";

    let report = run_pipeline(&api, &settings(2), &mut input).await.unwrap();
    assert_eq!(report.listed, 3);
    assert!(api.vm("another-group", "legacyVM").is_some());
}

#[tokio::test]
async fn test_teardown_waits_for_confirmation_line() {
    let api = SimulatedApi::default();
    let settings = Settings {
        confirm_teardown: true,
        ..settings(2)
    };
    let mut input: &[u8] = b"\n";

    run_pipeline(&api, &settings, &mut input).await.unwrap();
    assert!(input.is_empty());
    assert!(!api.has_resource_group(&settings.group_name));
}

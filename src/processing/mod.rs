//! Orchestration of the remote calls.
//!
//! This module contains the fixed sequence the sample runs:
//! - [`provision`] - Resource group, storage account, network and subnet
//! - [`lifecycle`] - Per-VM creation and the operation battery
//! - [`pool`] - Bounded worker pool with a join barrier per phase
//! - [`inventory`] - Subscription-wide VM listing
//! - [`teardown`] - Confirmation and deletion
//! - [`pipeline`] - All of the above, in order

pub mod inventory;
pub mod lifecycle;
pub mod pipeline;
pub mod pool;
pub mod provision;
pub mod teardown;

// Re-export public functions
pub use inventory::list_vms;
pub use lifecycle::{
    create_pip_and_nic, create_vm, next_os_disk_size, update_os_disk_size, vm_operations,
    vm_parameters,
};
pub use pipeline::{run_pipeline, RunReport};
pub use pool::for_each_vm;
pub use provision::create_needed_resources;
pub use teardown::{confirm_teardown, delete_resource_group, delete_vm};

//! Terminal output.
//!
//! Formatting is kept separate from printing so the text can be tested;
//! colour is only added by the `print_*` helpers.

use crate::models::VirtualMachine;
use colored::Colorize;
use itertools::Itertools;
use std::fmt::Display;

/// Multi-line summary of a VM: ID, type, location and tags.
pub fn format_vm(vm: &VirtualMachine) -> String {
    let tags = match &vm.tags {
        Some(tags) if !tags.is_empty() => tags
            .iter()
            .map(|(k, v)| format!("\t\t{k} = {v}"))
            .join("\n"),
        _ => "\t\tNo tags yet".to_string(),
    };
    format!(
        "Virtual machine '{name}'\n\tID: {id}\n\tType: {kind}\n\tLocation: {location}\n\tTags:\n{tags}",
        name = vm.name.as_deref().unwrap_or("?"),
        id = vm.id.as_deref().unwrap_or("?"),
        kind = vm.resource_type.as_deref().unwrap_or("?"),
        location = vm.location,
    )
}

pub fn print_vm(vm: &VirtualMachine) {
    println!("{}", format_vm(vm));
}

pub fn connect_hint(vm_name: &str, user: &str, address: &str, password: &str) -> String {
    format!("Now you can connect to '{vm_name}' VM via 'ssh {user}@{address}' with password '{password}'")
}

/// Plain `Error: <message>` line, without colour so it can be grepped.
pub fn format_error<E: Display + ?Sized>(err: &E) -> String {
    format!("Error: {err}")
}

pub fn print_error<E: Display + ?Sized>(err: &E) {
    println!("{}", format_error(err));
}

/// Banner at the start of a pipeline phase.
pub fn print_phase(title: &str) {
    println!("#{}# {}", "PHASE".on_blue(), title);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn vm() -> VirtualMachine {
        VirtualMachine {
            id: Some("/subscriptions/s/resourceGroups/g/providers/Microsoft.Compute/virtualMachines/demoVM".to_string()),
            name: Some("demoVM".to_string()),
            resource_type: Some("Microsoft.Compute/virtualMachines".to_string()),
            location: "westus".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_format_vm_without_tags() {
        let text = format_vm(&vm());
        assert!(text.starts_with("Virtual machine 'demoVM'"));
        assert!(text.contains("\tType: Microsoft.Compute/virtualMachines"));
        assert!(text.contains("\tLocation: westus"));
        assert!(text.ends_with("No tags yet"));
    }

    #[test]
    fn test_format_vm_with_tags_sorted() {
        let mut vm = vm();
        vm.tags = Some(BTreeMap::from([
            ("who rocks".to_string(), "rust".to_string()),
            ("where".to_string(), "on azure".to_string()),
        ]));
        let text = format_vm(&vm);
        assert!(text.ends_with("\t\twhere = on azure\n\t\twho rocks = rust"));
    }

    #[test]
    fn test_connect_hint() {
        assert_eq!(
            connect_hint("linuxVM", "notadmin", "azuresample-linux.westus.cloudapp.azure.com", "pw"),
            "Now you can connect to 'linuxVM' VM via 'ssh notadmin@azuresample-linux.westus.cloudapp.azure.com' with password 'pw'"
        );
    }

    #[test]
    fn test_format_error_is_plain() {
        let err: crate::BoxError = "Start VM failed for VM 'linuxVM'".into();
        assert_eq!(format_error(&err), "Error: Start VM failed for VM 'linuxVM'");
        assert!(!format_error("boom").contains('\u{1b}'));
    }
}

//! Deleting what the run created.

use crate::azure::ManagementApi;
use crate::models::VmSpec;
use crate::BoxError;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

pub const CONFIRM_PROMPT: &str =
    "Press enter to delete the VMs and other resources created in this sample...";

/// Print the prompt and block until one line (or end of input) is read.
pub async fn confirm_teardown<R>(input: &mut R) -> Result<(), BoxError>
where
    R: AsyncBufRead + Unpin,
{
    println!("{CONFIRM_PROMPT}");
    let mut line = String::new();
    let n = input.read_line(&mut line).await?;
    log::debug!("confirm_teardown: read {} byte(s)", n);
    Ok(())
}

pub async fn delete_vm(api: &dyn ManagementApi, group: &str, spec: &VmSpec) -> Result<(), BoxError> {
    println!("Delete VM '{}'...", spec.name);
    api.delete_vm(group, &spec.name)
        .await
        .map_err(|e| format!("Failed to delete VM '{}': {e}", spec.name))?;
    Ok(())
}

/// Delete the resource group and with it every resource inside.
pub async fn delete_resource_group(api: &dyn ManagementApi, group: &str) -> Result<(), BoxError> {
    println!("Delete resource group '{group}'...");
    api.delete_resource_group(group)
        .await
        .map_err(|e| format!("Failed to delete resource group '{group}': {e}"))?;
    log::info!("Resource group '{}' deleted", group);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::azure::SimulatedApi;
    use crate::models::ResourceGroup;

    #[tokio::test]
    async fn test_confirm_consumes_one_line() {
        let mut input: &[u8] = b"\nleft over\n";
        confirm_teardown(&mut input).await.unwrap();
        assert_eq!(input, &b"left over\n"[..]);
    }

    #[tokio::test]
    async fn test_confirm_accepts_eof() {
        let mut input: &[u8] = b"";
        assert!(confirm_teardown(&mut input).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_group() {
        let api = SimulatedApi::default();
        api.create_resource_group("g", &ResourceGroup::new("westus"))
            .await
            .unwrap();
        delete_resource_group(&api, "g").await.unwrap();
        assert!(!api.has_resource_group("g"));
    }
}

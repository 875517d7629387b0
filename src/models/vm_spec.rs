//! Caller-supplied description of one VM to run through the pipeline.

use super::ImageReference;
use crate::config::ConfigError;

/// Number of leading VM-name characters used in the public DNS label.
const DNS_LABEL_PREFIX_LEN: usize = 5;

/// One VM the pipeline creates, exercises and deletes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmSpec {
    pub name: String,
    pub image: ImageReference,
}

impl VmSpec {
    pub fn new(name: &str, image: ImageReference) -> Self {
        VmSpec {
            name: name.to_string(),
            image,
        }
    }

    /// The Linux and Windows machines the sample runs by default.
    pub fn defaults() -> Vec<VmSpec> {
        vec![
            VmSpec::new(
                "linuxVM",
                ImageReference::latest("Canonical", "UbuntuServer", "16.04.0-LTS"),
            ),
            VmSpec::new(
                "windowsVM",
                ImageReference::latest("MicrosoftWindowsServer", "WindowsServer", "2016-Datacenter"),
            ),
        ]
    }

    pub fn public_ip_name(&self) -> String {
        format!("pip-{}", self.name)
    }

    pub fn nic_name(&self) -> String {
        format!("nic-{}", self.name)
    }

    pub fn ip_config_name(&self) -> String {
        format!("IPconfig-{}", self.name)
    }

    /// DNS label of the public address: `azuresample-` plus the first five
    /// characters of the VM name, lowercased.
    pub fn dns_label(&self) -> Result<String, ConfigError> {
        if self.name.chars().count() < DNS_LABEL_PREFIX_LEN {
            return Err(ConfigError::invalid(
                "vm name",
                &self.name,
                "must be at least 5 characters to derive a DNS label",
            ));
        }
        let prefix: String = self
            .name
            .chars()
            .take(DNS_LABEL_PREFIX_LEN)
            .collect::<String>()
            .to_lowercase();
        Ok(format!("azuresample-{prefix}"))
    }
}

//! Runtime configuration.
//!
//! Constants for the ARM endpoints and api-versions, plus [`Settings`] which
//! holds the names and knobs of a run. Every setting has a default and can be
//! overridden from the environment (a `.env` file is loaded by `main`).

use crate::models::VmSpec;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Azure Resource Manager endpoint (public cloud).
pub const ARM_ENDPOINT: &str = "https://management.azure.com";
/// Azure AD authority host (public cloud).
pub const AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
/// OAuth scope for the management plane.
pub const MANAGEMENT_SCOPE: &str = "https://management.azure.com/.default";

pub const API_VERSION_RESOURCES: &str = "2021-04-01";
pub const API_VERSION_STORAGE: &str = "2023-01-01";
pub const API_VERSION_NETWORK: &str = "2023-09-01";
pub const API_VERSION_COMPUTE: &str = "2023-09-01";

/// Default wait between polls of a long-running operation.
pub const SLEEP_MSEC: u64 = 1000;
/// Per-request HTTP timeout.
pub const HTTP_TIMEOUT_SECS: u64 = 60;

const DEFAULT_LOCATION: &str = "westus";
const DEFAULT_GROUP_NAME: &str = "rust-vm-sample-group";
const DEFAULT_STORAGE_ACCOUNT: &str = "rustvmsamplestore";
const DEFAULT_VNET_NAME: &str = "vNet";
const DEFAULT_SUBNET_NAME: &str = "subnet";
const DEFAULT_VHD_CONTAINER: &str = "rustcontainer";
const DEFAULT_ADMIN_USER: &str = "notadmin";
const DEFAULT_ADMIN_PASSWORD: &str = "Pa$$w0rd1975";
const DEFAULT_PARALLEL: usize = 2;

/// Configuration problems detected before any remote call is made.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing environment variables {0:?}")]
    MissingVars(Vec<String>),
    #[error("Invalid value '{value}' for {name}: {reason}")]
    Invalid {
        name: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub fn invalid(name: &str, value: &str, reason: &str) -> Self {
        ConfigError::Invalid {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// What to do when one step of the per-VM operation battery fails.
///
/// Setup (provisioning, VM creation) and teardown failures are always fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort the whole run on the first error.
    #[default]
    Abort,
    /// Print the error and carry on with the next step.
    Continue,
}

impl std::str::FromStr for FailurePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(FailurePolicy::Abort),
            "continue" => Ok(FailurePolicy::Continue),
            _ => Err(ConfigError::invalid(
                "VM_SAMPLE_FAILURE_POLICY",
                s,
                "expected 'abort' or 'continue'",
            )),
        }
    }
}

/// Names and knobs of one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub location: String,
    pub group_name: String,
    pub storage_account: String,
    pub vnet_name: String,
    pub subnet_name: String,
    pub vhd_container: String,
    pub admin_user: String,
    pub admin_password: String,
    /// Width of the VM worker pool. 1 runs the VMs one after another.
    pub parallel: usize,
    pub failure_policy: FailurePolicy,
    pub confirm_teardown: bool,
    pub dry_run: bool,
    pub vm_specs: Vec<VmSpec>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            location: DEFAULT_LOCATION.to_string(),
            group_name: DEFAULT_GROUP_NAME.to_string(),
            storage_account: DEFAULT_STORAGE_ACCOUNT.to_string(),
            vnet_name: DEFAULT_VNET_NAME.to_string(),
            subnet_name: DEFAULT_SUBNET_NAME.to_string(),
            vhd_container: DEFAULT_VHD_CONTAINER.to_string(),
            admin_user: DEFAULT_ADMIN_USER.to_string(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            parallel: DEFAULT_PARALLEL,
            failure_policy: FailurePolicy::Abort,
            confirm_teardown: true,
            dry_run: false,
            vm_specs: VmSpec::defaults(),
        }
    }
}

fn storage_account_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9]{3,24}$").expect("Invalid Regex"))
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Settings, ConfigError> {
        Settings::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`, falling back to defaults for unset or
    /// empty values.
    pub fn from_lookup<F>(lookup: F) -> Result<Settings, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut settings = Settings::default();

        if let Some(v) = get("AZURE_LOCATION") {
            settings.location = v;
        }
        if let Some(v) = get("VM_SAMPLE_GROUP") {
            settings.group_name = v;
        }
        if let Some(v) = get("VM_SAMPLE_STORAGE_ACCOUNT") {
            if !storage_account_regex().is_match(&v) {
                return Err(ConfigError::invalid(
                    "VM_SAMPLE_STORAGE_ACCOUNT",
                    &v,
                    "must be 3-24 lowercase letters or digits",
                ));
            }
            settings.storage_account = v;
        }
        if let Some(v) = get("VM_SAMPLE_ADMIN_USER") {
            settings.admin_user = v;
        }
        if let Some(v) = get("VM_SAMPLE_ADMIN_PASSWORD") {
            settings.admin_password = v;
        }
        if let Some(v) = get("VM_SAMPLE_PARALLEL") {
            settings.parallel = match v.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::invalid(
                        "VM_SAMPLE_PARALLEL",
                        &v,
                        "expected a positive integer",
                    ))
                }
            };
        }
        if let Some(v) = get("VM_SAMPLE_FAILURE_POLICY") {
            settings.failure_policy = v.parse()?;
        }
        if let Some(v) = get("VM_SAMPLE_CONFIRM_TEARDOWN") {
            settings.confirm_teardown = parse_bool("VM_SAMPLE_CONFIRM_TEARDOWN", &v)?;
        }
        if let Some(v) = get("VM_SAMPLE_DRY_RUN") {
            settings.dry_run = parse_bool("VM_SAMPLE_DRY_RUN", &v)?;
        }

        log::debug!(
            "settings: group='{}' storage='{}' parallel={} policy={:?} confirm={} dry_run={}",
            settings.group_name,
            settings.storage_account,
            settings.parallel,
            settings.failure_policy,
            settings.confirm_teardown,
            settings.dry_run
        );
        Ok(settings)
    }

    /// VHD blob URI for a disk named `name` in the run's storage account.
    pub fn vhd_uri(&self, name: &str) -> String {
        format!(
            "https://{account}.blob.core.windows.net/{container}/{name}.vhd",
            account = self.storage_account,
            container = self.vhd_container,
        )
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(name, value, "expected true or false")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let s = Settings::from_lookup(|_| None).expect("defaults should load");
        assert_eq!(s.location, "westus");
        assert_eq!(s.parallel, 2);
        assert_eq!(s.failure_policy, FailurePolicy::Abort);
        assert!(s.confirm_teardown);
        assert!(!s.dry_run);
        assert_eq!(s.vm_specs.len(), 2);
    }

    #[test]
    fn test_overrides() {
        let s = Settings::from_lookup(lookup_from(&[
            ("AZURE_LOCATION", "eastus"),
            ("VM_SAMPLE_PARALLEL", "1"),
            ("VM_SAMPLE_FAILURE_POLICY", "Continue"),
            ("VM_SAMPLE_CONFIRM_TEARDOWN", "no"),
            ("VM_SAMPLE_DRY_RUN", "1"),
        ]))
        .expect("overrides should load");
        assert_eq!(s.location, "eastus");
        assert_eq!(s.parallel, 1);
        assert_eq!(s.failure_policy, FailurePolicy::Continue);
        assert!(!s.confirm_teardown);
        assert!(s.dry_run);
    }

    #[test]
    fn test_empty_value_keeps_default() {
        let s = Settings::from_lookup(lookup_from(&[("VM_SAMPLE_GROUP", "  ")])).unwrap();
        assert_eq!(s.group_name, "rust-vm-sample-group");
    }

    #[test]
    fn test_bad_parallel_rejected() {
        let err = Settings::from_lookup(lookup_from(&[("VM_SAMPLE_PARALLEL", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_bad_storage_account_rejected() {
        let err = Settings::from_lookup(lookup_from(&[(
            "VM_SAMPLE_STORAGE_ACCOUNT",
            "Not-Valid",
        )]))
        .unwrap_err();
        assert!(err.to_string().contains("VM_SAMPLE_STORAGE_ACCOUNT"));
    }

    #[test]
    fn test_vhd_uri() {
        let s = Settings::default();
        assert_eq!(
            s.vhd_uri("linuxVM"),
            "https://rustvmsamplestore.blob.core.windows.net/rustcontainer/linuxVM.vhd"
        );
    }
}

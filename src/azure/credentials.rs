//! Service-principal identity read from the environment.

use crate::config::ConfigError;
use std::fmt;

pub const TENANT_ID_VAR: &str = "AZURE_TENANT_ID";
pub const CLIENT_ID_VAR: &str = "AZURE_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "AZURE_CLIENT_SECRET";
pub const SUBSCRIPTION_ID_VAR: &str = "AZURE_SUBSCRIPTION_ID";

/// The four variables that must be set before anything talks to Azure.
pub const REQUIRED_VARS: [&str; 4] = [
    TENANT_ID_VAR,
    CLIENT_ID_VAR,
    CLIENT_SECRET_VAR,
    SUBSCRIPTION_ID_VAR,
];

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub subscription_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("subscription_id", &self.subscription_id)
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Result<Credentials, ConfigError> {
        Credentials::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the identity through `lookup`. Every empty or unset variable is
    /// reported, in [`REQUIRED_VARS`] order.
    pub fn from_lookup<F>(lookup: F) -> Result<Credentials, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let values: Vec<Option<String>> = REQUIRED_VARS
            .iter()
            .map(|name| lookup(name).filter(|v| !v.trim().is_empty()))
            .collect();

        let missing: Vec<String> = REQUIRED_VARS
            .iter()
            .zip(&values)
            .filter(|(_, v)| v.is_none())
            .map(|(name, _)| name.to_string())
            .collect();
        if !missing.is_empty() {
            log::error!("Missing environment variables {:?}", missing);
            return Err(ConfigError::MissingVars(missing));
        }

        let mut values = values.into_iter().flatten();
        let mut next = || values.next().unwrap_or_default();
        Ok(Credentials {
            tenant_id: next(),
            client_id: next(),
            client_secret: next(),
            subscription_id: next(),
        })
    }
}

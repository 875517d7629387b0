//! Bearer tokens for the management plane.
//!
//! Production runs use a service principal through `azure_identity`, which
//! caches the token and renews it on expiry. Tests and dry runs use a fixed
//! token.

use super::credentials::Credentials;
use super::error::{ArmError, ArmResult};
use crate::config::{AUTHORITY_HOST, MANAGEMENT_SCOPE};
use async_trait::async_trait;
use azure_core::auth::TokenCredential;
use azure_identity::{ClientSecretCredential, TokenCredentialOptions};
use std::sync::Arc;
use url::Url;

/// Source of bearer tokens for ARM requests.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self) -> ArmResult<String>;
}

/// Client-credentials flow for a service principal.
pub struct ServicePrincipal {
    credential: ClientSecretCredential,
}

impl ServicePrincipal {
    pub fn new(creds: &Credentials) -> ArmResult<Self> {
        let authority = Url::parse(AUTHORITY_HOST)
            .map_err(|e| ArmError::Auth(format!("invalid authority host {AUTHORITY_HOST}: {e}")))?;
        let mut options = TokenCredentialOptions::default();
        options.set_authority_host(authority);
        let credential = ClientSecretCredential::new(
            azure_core::new_http_client(),
            creds.tenant_id.clone(),
            creds.client_id.clone(),
            creds.client_secret.clone(),
            options,
        );
        Ok(ServicePrincipal { credential })
    }
}

#[async_trait]
impl TokenProvider for ServicePrincipal {
    async fn token(&self) -> ArmResult<String> {
        let token = self
            .credential
            .get_token(&[MANAGEMENT_SCOPE])
            .await
            .map_err(|e| ArmError::Auth(e.to_string()))?;
        Ok(token.token.secret().to_string())
    }
}

/// A token that never changes.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: &str) -> Self {
        StaticToken(token.to_string())
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> ArmResult<String> {
        if self.0.is_empty() {
            return Err(ArmError::Auth("empty token".to_string()));
        }
        Ok(self.0.clone())
    }
}

/// Exchange the service-principal identity for a token provider. One token
/// is fetched up front so a bad identity fails before any resource call.
pub async fn authenticate(creds: &Credentials) -> ArmResult<Arc<dyn TokenProvider>> {
    log::info!(
        "Authenticating client '{}' in tenant '{}'",
        creds.client_id,
        creds.tenant_id
    );
    let provider = ServicePrincipal::new(creds)?;
    provider.token().await?;
    log::info!("Got management token");
    Ok(Arc::new(provider))
}

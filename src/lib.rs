//! Azure VM sample: provision, exercise and tear down virtual machines
//! through the Azure Resource Manager API.
//!
//! The run is one pipeline ([`processing::run_pipeline`]) over a list of
//! [`models::VmSpec`]s, talking to Azure through the
//! [`azure::ManagementApi`] trait so it can also run against an in-memory
//! control plane.

pub mod azure;
pub mod config;
pub mod models;
pub mod output;
pub mod processing;

use azure::{authenticate, ArmApi, ArmClient, Credentials, ManagementApi, SimulatedApi};
use config::Settings;
use processing::{run_pipeline, RunReport};
use std::sync::Arc;
use tokio::io::BufReader;

/// Error type of the orchestration layer.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Build the management client: the simulated control plane for a dry run,
/// otherwise an authenticated ARM client.
pub async fn connect(
    creds: &Credentials,
    settings: &Settings,
) -> Result<Arc<dyn ManagementApi>, BoxError> {
    if settings.dry_run {
        log::warn!("Dry run: using the simulated control plane, nothing is created in Azure");
        return Ok(Arc::new(SimulatedApi::new(&creds.subscription_id)));
    }
    let tokens = authenticate(creds).await?;
    let client = ArmClient::new(&creds.subscription_id, tokens)?;
    Ok(Arc::new(ArmApi::new(client)))
}

/// Load the identity and settings, connect, and run the pipeline with the
/// teardown confirmation read from stdin.
pub async fn run() -> Result<RunReport, BoxError> {
    // identity first: nothing may talk to Azure without all four values
    let creds = Credentials::from_env()?;
    let settings = Settings::from_env()?;
    log::info!(
        "subscription='{}' location='{}' dry_run={}",
        creds.subscription_id,
        settings.location,
        settings.dry_run
    );

    let api = connect(&creds, &settings).await?;
    let mut stdin = BufReader::new(tokio::io::stdin());
    let report = run_pipeline(api.as_ref(), &settings, &mut stdin).await?;
    log::info!("run finished: {:?}", report);
    Ok(report)
}

//! Azure Resource Manager interaction.
//!
//! This module handles all Azure-related operations:
//! - [`credentials`] - Service-principal identity from the environment
//! - [`auth`] - Bearer tokens for the management plane
//! - [`client`] - REST transport, long-running operations and paging
//! - [`api`] - The [`ManagementApi`] seam and its ARM implementation
//! - [`simulated`] - In-memory control plane for dry runs and tests

pub mod api;
pub mod auth;
pub mod client;
pub mod credentials;
pub mod error;
pub mod simulated;

// Re-export public types and functions
pub use api::{ArmApi, ManagementApi};
pub use auth::{authenticate, StaticToken, TokenProvider};
pub use client::ArmClient;
pub use credentials::Credentials;
pub use error::{ArmError, ArmResult};
pub use simulated::{ApiCall, Operation, SimulatedApi};

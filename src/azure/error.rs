//! Errors returned by calls against the management plane.

use serde::Deserialize;
use thiserror::Error;

/// Result of a management-plane call.
pub type ArmResult<T> = Result<T, ArmError>;

#[derive(Debug, Error)]
pub enum ArmError {
    /// The service answered with a non-success status.
    #[error("{method} {target} failed with status {status}: {code}: {message}")]
    Status {
        method: String,
        target: String,
        status: u16,
        code: String,
        message: String,
    },
    /// A long-running operation finished in `Failed` or `Canceled`.
    #[error("operation for {target} ended with status '{status}': {message}")]
    Operation {
        target: String,
        status: String,
        message: String,
    },
    #[error("request to {target} failed: {source}")]
    Transport {
        target: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Error parsing response from {target}: path={path} error={message}")]
    Decode {
        target: String,
        path: String,
        message: String,
    },
    #[error("Error serializing request body: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("authentication failed: {0}")]
    Auth(String),
}

/// ARM error envelope: `{"error": {"code": "...", "message": "..."}}`.
#[derive(Deserialize, Debug, Default)]
pub(crate) struct ErrorEnvelope {
    #[serde(default)]
    pub error: Option<ErrorBody>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}

impl ArmError {
    pub fn status(method: &str, target: &str, status: u16, code: &str, message: &str) -> Self {
        ArmError::Status {
            method: method.to_string(),
            target: target.to_string(),
            status,
            code: code.to_string(),
            message: message.to_string(),
        }
    }

    /// Build a status error from a failed response body, using the ARM
    /// error envelope when the body carries one.
    pub fn from_response(method: &str, target: &str, status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .and_then(|e| e.error)
        {
            Some(err) => ArmError::status(method, target, status, &err.code, &err.message),
            None => ArmError::status(method, target, status, "Unknown", body.trim()),
        }
    }

    /// HTTP status of a `Status` error.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ArmError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

use thiserror::Error;

use crate::form::ValidationResult;
use crate::integrations::ProviderId;

/// Errors surfaced by the connection and submission state machines.
///
/// None of these are fatal; every variant leaves the session usable.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SessionError {
    #[error("contact form has invalid fields: {}", .0.summary())]
    ValidationFailed(ValidationResult),

    #[error("no CRM connected. Connect a CRM first")]
    NotConnected,

    #[error("connection to {0} was cancelled")]
    ConnectionCancelled(ProviderId),

    #[error("connection to {provider} failed: {message}")]
    ConnectionFailed { provider: ProviderId, message: String },

    #[error("a connection attempt to {0} is already in progress")]
    ConnectionInProgress(ProviderId),

    #[error("a submission is already in progress")]
    SubmissionInProgress,

    #[error("{0}")]
    RemoteFlowError(String),

    #[error("run result carries no run identifier")]
    MalformedResult,
}

/// Failures reported by a gateway implementation.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("failed to parse gateway response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Remote(String),
}

impl GatewayError {
    /// The message shown to the user, without transport framing for remote errors.
    pub fn user_message(&self) -> String {
        match self {
            Self::Server { message, .. } if !message.is_empty() => message.clone(),
            Self::Remote(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("workspace key is not configured")]
    MissingWorkspaceKey,

    #[error("workspace secret is not configured")]
    MissingWorkspaceSecret,

    #[error("unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("invalid signing key: {0}")]
    InvalidKey(#[source] jsonwebtoken::errors::Error),

    #[error("token lifetime of {0}s is out of range")]
    TtlOutOfRange(u64),

    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no platform config directory available")]
    NoConfigDir,
}

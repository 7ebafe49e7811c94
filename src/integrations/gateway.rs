use async_trait::async_trait;

use super::{ProviderId, RunResult};
use crate::error::GatewayError;
use crate::form::ContactInput;

/// How an authorization attempt ended when it did not error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationOutcome {
    Authorized,
    Cancelled,
}

/// The two operations the session needs from the hosted integration gateway.
///
/// Implementations never retry; retrying is left to the caller.
#[async_trait]
pub trait GatewayClient: Send + Sync {
    /// Run the provider's authorization flow and wait until the user finishes or dismisses it.
    async fn authorize_connection(
        &self,
        provider: ProviderId,
    ) -> Result<AuthorizationOutcome, GatewayError>;

    /// Execute `flow_name` on the provider's active connection with `input`.
    async fn run_flow(
        &self,
        provider: ProviderId,
        flow_name: &str,
        input: &ContactInput,
    ) -> Result<RunResult, GatewayError>;
}

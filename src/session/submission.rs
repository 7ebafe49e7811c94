use parking_lot::Mutex;
use std::sync::Arc;

use super::connection::ConnectionManager;
use crate::error::SessionError;
use crate::form::{validator, ContactInput, RawFormFields};
use crate::integrations::gateway::GatewayClient;
use crate::integrations::{ProviderId, RunResult, CREATE_CONTACT_FLOW};

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionState {
    Idle,
    InFlight,
    Succeeded(RunResult),
    Failed(String),
}

impl SubmissionState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::InFlight)
    }
}

struct Inner {
    state: SubmissionState,
    form: RawFormFields,
}

/// Validates the form draft and relays it to the connected CRM through the gateway.
pub struct SubmissionController {
    gateway: Arc<dyn GatewayClient>,
    connection: Arc<ConnectionManager>,
    inner: Mutex<Inner>,
}

impl SubmissionController {
    pub fn new(gateway: Arc<dyn GatewayClient>, connection: Arc<ConnectionManager>) -> Self {
        Self {
            gateway,
            connection,
            inner: Mutex::new(Inner {
                state: SubmissionState::Idle,
                form: RawFormFields::default(),
            }),
        }
    }

    pub fn state(&self) -> SubmissionState {
        self.inner.lock().state.clone()
    }

    /// Current draft as last entered by the user.
    pub fn form(&self) -> RawFormFields {
        self.inner.lock().form.clone()
    }

    pub fn update_form(&self, raw: RawFormFields) {
        self.inner.lock().form = raw;
    }

    /// Drop the last outcome so the shell shows a fresh form. Ignored while in flight.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        if !inner.state.is_in_flight() {
            inner.state = SubmissionState::Idle;
        }
    }

    /// Checks guards in order (in flight, connected, valid) and moves to `InFlight`.
    fn begin(&self, raw: RawFormFields) -> Result<(ProviderId, ContactInput), SessionError> {
        let mut inner = self.inner.lock();
        if inner.state.is_in_flight() {
            log::warn!("Rejecting submission: another one is in flight");
            return Err(SessionError::SubmissionInProgress);
        }
        inner.form = raw;

        let provider = self.connection.connected_provider().ok_or_else(|| {
            log::warn!("Rejecting submission: no CRM connected");
            SessionError::NotConnected
        })?;

        let contact = validator::parse(&inner.form).map_err(|errors| {
            log::warn!("Rejecting submission: {}", errors.summary());
            SessionError::ValidationFailed(errors)
        })?;

        inner.state = SubmissionState::InFlight;
        Ok((provider, contact))
    }

    /// Submit `raw` as a new contact.
    ///
    /// Guard failures leave the previous outcome untouched and never reach the
    /// gateway. A gateway failure is recorded as `Failed` and the draft is kept
    /// so the user can retry; success clears the draft.
    pub async fn submit(&self, raw: RawFormFields) -> Result<RunResult, SessionError> {
        let (provider, contact) = self.begin(raw)?;

        log::info!("Sending contact to {}", provider.display_name());
        let outcome = self
            .gateway
            .run_flow(provider, CREATE_CONTACT_FLOW, &contact)
            .await;

        let mut inner = self.inner.lock();
        match outcome {
            Ok(result) => {
                log::info!("Contact created in {}", provider.display_name());
                inner.state = SubmissionState::Succeeded(result.clone());
                inner.form.clear();
                Ok(result)
            }
            Err(e) => {
                let reason = e.user_message();
                log::error!("Sending contact to {} failed: {}", provider.display_name(), e);
                inner.state = SubmissionState::Failed(reason.clone());
                Err(SessionError::RemoteFlowError(reason))
            }
        }
    }
}

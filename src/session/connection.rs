use parking_lot::Mutex;
use std::sync::Arc;

use crate::error::SessionError;
use crate::integrations::gateway::{AuthorizationOutcome, GatewayClient};
use crate::integrations::ProviderId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting(ProviderId),
    Connected(ProviderId),
}

impl ConnectionState {
    pub fn connected_provider(&self) -> Option<ProviderId> {
        match self {
            Self::Connected(p) => Some(*p),
            _ => None,
        }
    }
}

/// Owns provider selection and drives authorization through the gateway.
pub struct ConnectionManager {
    gateway: Arc<dyn GatewayClient>,
    state: Mutex<ConnectionState>,
}

impl ConnectionManager {
    pub fn new(gateway: Arc<dyn GatewayClient>) -> Self {
        Self {
            gateway,
            state: Mutex::new(ConnectionState::Disconnected),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    pub fn connected_provider(&self) -> Option<ProviderId> {
        self.state.lock().connected_provider()
    }

    /// Authorize `provider`, replacing whatever connection was selected before.
    ///
    /// A dismissed or failed attempt leaves the session disconnected; nothing is retried.
    pub async fn connect(&self, provider: ProviderId) -> Result<ProviderId, SessionError> {
        {
            let mut state = self.state.lock();
            if let ConnectionState::Connecting(pending) = *state {
                log::warn!("Rejecting connect to {}: {} still connecting", provider, pending);
                return Err(SessionError::ConnectionInProgress(pending));
            }
            *state = ConnectionState::Connecting(provider);
        }

        log::info!("Connecting to {}", provider.display_name());
        let outcome = self.gateway.authorize_connection(provider).await;

        let mut state = self.state.lock();
        match outcome {
            Ok(AuthorizationOutcome::Authorized) => {
                *state = ConnectionState::Connected(provider);
                log::info!("Connected to {}", provider.display_name());
                Ok(provider)
            }
            Ok(AuthorizationOutcome::Cancelled) => {
                *state = ConnectionState::Disconnected;
                log::info!("Connection to {} dismissed by user", provider.display_name());
                Err(SessionError::ConnectionCancelled(provider))
            }
            Err(e) => {
                *state = ConnectionState::Disconnected;
                log::error!("Connection to {} failed: {}", provider.display_name(), e);
                Err(SessionError::ConnectionFailed {
                    provider,
                    message: e.user_message(),
                })
            }
        }
    }

    /// Forget the selected provider. Has no effect while an attempt is pending.
    pub fn disconnect(&self) -> ConnectionState {
        let mut state = self.state.lock();
        if let ConnectionState::Connected(provider) = *state {
            log::info!("Disconnected from {}", provider.display_name());
            *state = ConnectionState::Disconnected;
        }
        *state
    }
}

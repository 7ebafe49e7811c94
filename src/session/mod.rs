pub mod connection;
pub mod submission;

use std::sync::Arc;

pub use connection::{ConnectionManager, ConnectionState};
pub use submission::{SubmissionController, SubmissionState};

use crate::config::AppConfig;
use crate::error::SessionError;
use crate::form::RawFormFields;
use crate::integrations::gateway::GatewayClient;
use crate::integrations::http::{ConnectPrompt, HttpGateway};
use crate::integrations::token::{demo_user_id, TokenIssuer};
use crate::integrations::{ProviderId, RunResult};
use crate::presenter::Outcome;

/// One user's connect/submit session. Owns both state machines.
pub struct Session {
    pub id: String,
    pub started_at: String,
    connection: Arc<ConnectionManager>,
    submission: SubmissionController,
}

impl Session {
    pub fn new(gateway: Arc<dyn GatewayClient>) -> Self {
        let connection = Arc::new(ConnectionManager::new(gateway.clone()));
        let submission = SubmissionController::new(gateway, connection.clone());

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            started_at: chrono::Utc::now().to_rfc3339(),
            connection,
            submission,
        }
    }

    /// Issue the session's gateway token and wire up the HTTP gateway.
    pub fn bootstrap(config: &AppConfig, prompt: Arc<dyn ConnectPrompt>) -> anyhow::Result<Self> {
        let issuer = TokenIssuer::from_config(config)?;
        let user_id = demo_user_id();
        let token = issuer.issue(&user_id, &config.user_name)?;
        let gateway = HttpGateway::new(config, token, prompt)?;

        let session = Self::new(Arc::new(gateway));
        log::info!("Session {} started for {}", session.id, user_id);
        Ok(session)
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn submission_state(&self) -> SubmissionState {
        self.submission.state()
    }

    pub fn form(&self) -> RawFormFields {
        self.submission.form()
    }

    pub fn update_form(&self, raw: RawFormFields) {
        self.submission.update_form(raw);
    }

    pub async fn connect(&self, provider: ProviderId) -> Result<ProviderId, SessionError> {
        self.connection.connect(provider).await
    }

    pub fn disconnect(&self) -> ConnectionState {
        self.connection.disconnect()
    }

    pub async fn submit(&self, raw: RawFormFields) -> Result<RunResult, SessionError> {
        self.submission.submit(raw).await
    }

    /// Start a new entry: forget the last outcome, keep the connection.
    pub fn reset_submission(&self) {
        self.submission.reset();
    }

    pub fn outcome(&self) -> Option<Outcome> {
        Outcome::from_state(&self.submission.state())
    }
}

//! Scripted gateway for driving a session without the hosted service.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;

use crm_relay::{AuthorizationOutcome, ContactInput, GatewayClient, GatewayError, ProviderId, RunResult};

#[derive(Debug, Clone)]
pub enum AuthorizeScript {
    Authorize,
    Dismiss,
    Fail(String),
}

#[derive(Debug, Clone)]
pub enum RunScript {
    Return(Value),
    Fail(String),
}

#[derive(Debug, Clone)]
pub struct RunCall {
    pub provider: ProviderId,
    pub flow_name: String,
    pub input: ContactInput,
}

#[derive(Default)]
pub struct MockGateway {
    authorize_script: Mutex<VecDeque<AuthorizeScript>>,
    run_script: Mutex<VecDeque<RunScript>>,
    authorize_calls: AtomicUsize,
    run_calls: Mutex<Vec<RunCall>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn authorize(self, step: AuthorizeScript) -> Self {
        self.authorize_script.lock().push_back(step);
        self
    }

    pub fn run(self, step: RunScript) -> Self {
        self.run_script.lock().push_back(step);
        self
    }

    /// Hold every gateway call until the returned handle is notified.
    pub fn gated(self) -> (Self, Arc<Notify>) {
        let notify = Arc::new(Notify::new());
        *self.gate.lock() = Some(notify.clone());
        (self, notify)
    }

    pub fn authorize_count(&self) -> usize {
        self.authorize_calls.load(Ordering::SeqCst)
    }

    pub fn run_count(&self) -> usize {
        self.run_calls.lock().len()
    }

    pub fn run_calls(&self) -> Vec<RunCall> {
        self.run_calls.lock().clone()
    }

    async fn wait_for_gate(&self) {
        let gate = self.gate.lock().clone();
        if let Some(notify) = gate {
            notify.notified().await;
        }
    }
}

#[async_trait]
impl GatewayClient for MockGateway {
    async fn authorize_connection(
        &self,
        _provider: ProviderId,
    ) -> Result<AuthorizationOutcome, GatewayError> {
        self.authorize_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_for_gate().await;

        let step = self
            .authorize_script
            .lock()
            .pop_front()
            .unwrap_or(AuthorizeScript::Authorize);
        match step {
            AuthorizeScript::Authorize => Ok(AuthorizationOutcome::Authorized),
            AuthorizeScript::Dismiss => Ok(AuthorizationOutcome::Cancelled),
            AuthorizeScript::Fail(message) => Err(GatewayError::Remote(message)),
        }
    }

    async fn run_flow(
        &self,
        provider: ProviderId,
        flow_name: &str,
        input: &ContactInput,
    ) -> Result<RunResult, GatewayError> {
        self.run_calls.lock().push(RunCall {
            provider,
            flow_name: flow_name.to_string(),
            input: input.clone(),
        });
        self.wait_for_gate().await;

        let step = self
            .run_script
            .lock()
            .pop_front()
            .unwrap_or_else(|| RunScript::Return(serde_json::json!({ "runId": "run_default" })));
        match step {
            RunScript::Return(value) => RunResult::from_value(value)
                .ok_or_else(|| GatewayError::Remote("scripted result is not an object".into())),
            RunScript::Fail(message) => Err(GatewayError::Remote(message)),
        }
    }
}

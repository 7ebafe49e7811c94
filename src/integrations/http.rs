use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use super::gateway::{AuthorizationOutcome, GatewayClient};
use super::{ProviderId, RunResult};
use crate::config::AppConfig;
use crate::error::GatewayError;
use crate::form::ContactInput;

/// Shows the hosted authorization page to the user and waits for them to finish.
#[async_trait]
pub trait ConnectPrompt: Send + Sync {
    /// Returns `false` when the user dismissed the authorization.
    async fn confirm(&self, provider: ProviderId, connect_url: &str) -> bool;
}

/// Terminal prompt: prints the URL and reads a y/n answer from stdin.
pub struct StdinPrompt;

#[async_trait]
impl ConnectPrompt for StdinPrompt {
    async fn confirm(&self, provider: ProviderId, connect_url: &str) -> bool {
        let mut stdout = tokio::io::stdout();
        let banner = format!(
            "Open this link to connect {}:\n  {}\nFinished authorizing? [y/N] ",
            provider.display_name(),
            connect_url
        );
        if stdout.write_all(banner.as_bytes()).await.is_err() || stdout.flush().await.is_err() {
            return false;
        }

        let mut line = String::new();
        let mut reader = BufReader::new(tokio::io::stdin());
        match reader.read_line(&mut line).await {
            Ok(_) => matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(e) => {
                log::warn!("Failed to read authorization answer: {}", e);
                false
            }
        }
    }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ConnectionsPage {
    #[serde(default)]
    items: Vec<ConnectionRecord>,
}

#[derive(Debug, Deserialize)]
struct ConnectionRecord {
    integration: Option<IntegrationRef>,
    #[serde(rename = "integrationKey")]
    integration_key: Option<String>,
    #[serde(default)]
    disconnected: bool,
}

#[derive(Debug, Deserialize)]
struct IntegrationRef {
    key: String,
}

impl ConnectionRecord {
    fn is_active_for(&self, provider: ProviderId) -> bool {
        let key = self
            .integration
            .as_ref()
            .map(|i| i.key.as_str())
            .or(self.integration_key.as_deref());
        !self.disconnected && key == Some(provider.key())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| body.trim().to_string())
}

// ─── Gateway ─────────────────────────────────────────────────────────────────

/// Talks to the hosted integration gateway over its REST API.
pub struct HttpGateway {
    client: Client,
    api_base_url: String,
    ui_base_url: String,
    token: String,
    prompt: Arc<dyn ConnectPrompt>,
}

impl HttpGateway {
    pub fn new(
        config: &AppConfig,
        token: String,
        prompt: Arc<dyn ConnectPrompt>,
    ) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            ui_base_url: config.ui_base_url.trim_end_matches('/').to_string(),
            token,
            prompt,
        })
    }

    pub fn connect_url(&self, provider: ProviderId) -> Result<String, GatewayError> {
        let base = format!("{}/connect/{}", self.ui_base_url, provider.key());
        let url = Url::parse_with_params(&base, &[("token", self.token.as_str())])
            .map_err(|e| GatewayError::Remote(format!("invalid connect URL {}: {}", base, e)))?;
        Ok(url.into())
    }

    fn run_url(&self, provider: ProviderId, flow_name: &str) -> String {
        format!(
            "{}/connections/{}/flows/{}/run",
            self.api_base_url,
            provider.key(),
            flow_name
        )
    }

    async fn has_active_connection(&self, provider: ProviderId) -> Result<bool, GatewayError> {
        let url = format!("{}/connections", self.api_base_url);
        log::debug!("GET {}", url);

        let response = self.client.get(&url).bearer_auth(&self.token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Server {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let page: ConnectionsPage = response.json().await?;
        Ok(page.items.iter().any(|c| c.is_active_for(provider)))
    }
}

#[async_trait]
impl GatewayClient for HttpGateway {
    async fn authorize_connection(
        &self,
        provider: ProviderId,
    ) -> Result<AuthorizationOutcome, GatewayError> {
        let connect_url = self.connect_url(provider)?;

        if !self.prompt.confirm(provider, &connect_url).await {
            return Ok(AuthorizationOutcome::Cancelled);
        }

        if self.has_active_connection(provider).await? {
            Ok(AuthorizationOutcome::Authorized)
        } else {
            Err(GatewayError::Remote(format!(
                "no active {} connection found after authorization",
                provider.display_name()
            )))
        }
    }

    async fn run_flow(
        &self,
        provider: ProviderId,
        flow_name: &str,
        input: &ContactInput,
    ) -> Result<RunResult, GatewayError> {
        let url = self.run_url(provider, flow_name);
        log::debug!("POST {}", url);

        let body = serde_json::json!({ "input": input });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Server {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        // The run completed; an unexpected body only costs us the displayed facts.
        let body = response.text().await?;
        Ok(RunResult::from_body(&body))
    }
}

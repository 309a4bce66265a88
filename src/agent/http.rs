//! HTTP agent client

use super::AgentError;
use crate::runtime::{AgentClient, UserContext};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

/// Sends user text to the agent backend and returns the raw envelope body
///
/// Retry policy is the backend's business; every failure is surfaced as-is.
pub struct HttpAgentClient {
    client: Client,
    endpoint: String,
}

#[derive(Serialize)]
struct AgentRequest<'a> {
    message: &'a str,
    context: &'a UserContext,
}

impl HttpAgentClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, AgentError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AgentError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl AgentClient for HttpAgentClient {
    async fn send_message(&self, text: &str, context: &UserContext) -> Result<String, AgentError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&AgentRequest {
                message: text,
                context,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AgentError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    AgentError::network(format!("Connection failed: {e}"))
                } else {
                    AgentError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            // The status is the failure; the body is only detail
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
            return Err(AgentError::server(
                status.as_u16(),
                format!("HTTP {status}: {body}"),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| AgentError::network(format!("Failed to read response: {e}")))
    }
}

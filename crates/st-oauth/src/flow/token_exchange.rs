//! Authorization code exchange against the provider token endpoint

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

use crate::config::OAuthConfig;
use crate::errors::{FlowError, FlowResult};

/// Request body for the token endpoint
#[derive(Debug, Serialize)]
struct ExchangeRequest<'a> {
    code: &'a str,
    code_verifier: &'a str,
    code_challenge_method: &'a str,
}

/// Success response from the token endpoint
#[derive(Debug, Deserialize)]
struct ExchangeResponse {
    /// The long-lived API key
    key: String,
}

/// Failure response body; every field is optional on the wire
#[derive(Debug, Deserialize)]
struct ExchangeErrorBody {
    #[serde(default)]
    error: Option<ExchangeErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ExchangeErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

/// Seam between the orchestrator and the provider's token endpoint
///
/// Injected so the flow's failure paths are testable without a network.
#[async_trait]
pub trait CodeExchanger: Send + Sync {
    /// Exchange a single-use authorization code for the credential
    async fn exchange(&self, code: &str, code_verifier: &str) -> FlowResult<String>;
}

/// Token exchanger backed by the provider's HTTP endpoint
pub struct TokenExchanger {
    client: Client,
    token_endpoint: String,
    timeout: Duration,
}

impl TokenExchanger {
    /// Create a new token exchanger for the configured endpoint
    pub fn new(config: &OAuthConfig) -> Self {
        Self {
            client: Client::new(),
            token_endpoint: config.token_endpoint.clone(),
            timeout: Duration::from_secs(config.exchange_timeout_secs),
        }
    }
}

#[async_trait]
impl CodeExchanger for TokenExchanger {
    async fn exchange(&self, code: &str, code_verifier: &str) -> FlowResult<String> {
        let body = ExchangeRequest {
            code,
            code_verifier,
            code_challenge_method: "S256",
        };

        // A hung round trip must fail the attempt, not park the state
        // machine in Exchanging forever.
        let request = self.client.post(&self.token_endpoint).json(&body).send();
        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| {
                FlowError::Network(format!(
                    "Token exchange timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| FlowError::Network(format!("Failed to send token request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ExchangeErrorBody>(&body)
                .ok()
                .and_then(|parsed| parsed.error)
                .and_then(|detail| detail.message)
                .unwrap_or_else(|| format!("OAuth error: {}", status));
            error!("Token exchange failed with status {}: {}", status, message);
            return Err(FlowError::Exchange(message));
        }

        let parsed: ExchangeResponse = response
            .json()
            .await
            .map_err(|e| FlowError::Exchange(format!("Failed to parse token response: {}", e)))?;

        info!("Token exchange successful");

        Ok(parsed.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exchange_request_serialization() {
        let body = ExchangeRequest {
            code: "abc123",
            code_verifier: "verifier",
            code_challenge_method: "S256",
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["code"], "abc123");
        assert_eq!(json["code_verifier"], "verifier");
        assert_eq!(json["code_challenge_method"], "S256");
    }

    #[test]
    fn test_success_response_deserialization() {
        let json = r#"{"key": "sk-or-v1-abc"}"#;
        let response: ExchangeResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.key, "sk-or-v1-abc");
    }

    #[test]
    fn test_error_body_with_message() {
        let json = r#"{"error": {"message": "Invalid code"}}"#;
        let body: ExchangeErrorBody = serde_json::from_str(json).unwrap();
        assert_eq!(
            body.error.and_then(|e| e.message),
            Some("Invalid code".to_string())
        );
    }

    #[test]
    fn test_error_body_empty() {
        let body: ExchangeErrorBody = serde_json::from_str("{}").unwrap();
        assert!(body.error.is_none());

        let body: ExchangeErrorBody = serde_json::from_str(r#"{"error": {}}"#).unwrap();
        assert!(body.error.unwrap().message.is_none());
    }
}

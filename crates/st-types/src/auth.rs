//! OAuth flow data model shared between the storage layer, the flow core,
//! and the panel client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable record of one in-flight authorization attempt.
///
/// At most one `FlowState` exists per install. It is written only when a
/// flow starts and deleted when the flow resolves (success and failure both
/// clear it) or is explicitly cancelled. Its presence is what makes a flow
/// "pending" from the panel's perspective, including across a restart of
/// the background process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowState {
    /// Random high-entropy secret, kept local until token exchange
    pub code_verifier: String,

    /// BASE64URL(SHA256(code_verifier)), sent to the authorization page
    pub code_challenge: String,

    /// Exact URL prefix the navigation watcher matches the callback against
    pub callback_url: String,

    /// When the flow was started
    pub started_at: DateTime<Utc>,
}

impl FlowState {
    /// Create a flow state stamped with the current time
    pub fn new(code_verifier: String, code_challenge: String, callback_url: String) -> Self {
        Self {
            code_verifier,
            code_challenge,
            callback_url,
            started_at: Utc::now(),
        }
    }
}

/// Resolution message broadcast from the background flow core to whatever
/// panel is currently listening.
///
/// Delivery is fire-and-forget: a panel that was not mounted when the
/// message fired recovers by checking `FlowState` presence on mount
/// instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum AuthNotification {
    /// Flow completed; carries the exchanged API key
    #[serde(rename = "OAUTH_COMPLETE")]
    Complete {
        #[serde(rename = "apiKey")]
        api_key: String,
    },

    /// Flow failed; carries the provider's message when available
    #[serde(rename = "OAUTH_ERROR")]
    Error { error: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_wire_format_complete() {
        let msg = AuthNotification::Complete {
            api_key: "sk-or-v1-test".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"OAUTH_COMPLETE""#));
        assert!(json.contains(r#""apiKey":"sk-or-v1-test""#));

        let parsed: AuthNotification = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_notification_wire_format_error() {
        let msg = AuthNotification::Error {
            error: "Invalid code".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"OAUTH_ERROR""#));
        assert!(json.contains(r#""error":"Invalid code""#));
    }

    #[test]
    fn test_flow_state_roundtrip() {
        let state = FlowState::new(
            "verifier".to_string(),
            "challenge".to_string(),
            "http://localhost:3000/auth/callback".to_string(),
        );

        let json = serde_json::to_string(&state).unwrap();
        let parsed: FlowState = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.code_verifier, "verifier");
        assert_eq!(parsed.code_challenge, "challenge");
        assert_eq!(parsed.callback_url, "http://localhost:3000/auth/callback");
    }
}

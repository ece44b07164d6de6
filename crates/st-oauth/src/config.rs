//! OAuth flow configuration

use serde::{Deserialize, Serialize};

/// Configuration for the OAuth authorization flow
///
/// Every field has a working default pointing at the hosted provider, so a
/// missing or partial config section still yields a usable flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    /// Authorization endpoint opened in the foreground tab
    #[serde(default = "default_auth_endpoint")]
    pub auth_endpoint: String,

    /// Token endpoint the authorization code is exchanged against
    #[serde(default = "default_token_endpoint")]
    pub token_endpoint: String,

    /// Callback URL the navigation watcher matches as an exact prefix
    #[serde(default = "default_callback_url")]
    pub callback_url: String,

    /// Upper bound on the token exchange round trip, in seconds
    #[serde(default = "default_exchange_timeout_secs")]
    pub exchange_timeout_secs: u64,
}

fn default_auth_endpoint() -> String {
    "https://openrouter.ai/auth".to_string()
}

fn default_token_endpoint() -> String {
    "https://openrouter.ai/api/v1/auth/keys".to_string()
}

fn default_callback_url() -> String {
    "http://localhost:3000/auth/callback".to_string()
}

fn default_exchange_timeout_secs() -> u64 {
    30
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            auth_endpoint: default_auth_endpoint(),
            token_endpoint: default_token_endpoint(),
            callback_url: default_callback_url(),
            exchange_timeout_secs: default_exchange_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_config() {
        let config: OAuthConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.auth_endpoint, "https://openrouter.ai/auth");
        assert_eq!(config.callback_url, "http://localhost:3000/auth/callback");
        assert_eq!(config.exchange_timeout_secs, 30);
    }

    #[test]
    fn test_partial_override() {
        let config: OAuthConfig =
            serde_json::from_str(r#"{"callback_url": "http://localhost:8080/cb"}"#).unwrap();
        assert_eq!(config.callback_url, "http://localhost:8080/cb");
        assert_eq!(
            config.token_endpoint,
            "https://openrouter.ai/api/v1/auth/keys"
        );
    }
}

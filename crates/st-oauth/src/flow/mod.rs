//! OAuth 2.0 authorization code flow with PKCE
//!
//! The flow spans three independently scheduled contexts: the background
//! process running the orchestrator, the foreground authorization tab, and
//! the side panel awaiting the result. They share no memory; coordination
//! happens through the durable flow-state slot, the host's navigation
//! events, and a best-effort broadcast channel.
//!
//! # Usage Example
//! ```ignore
//! use st_oauth::{OAuthConfig, OAuthOrchestrator, TokenExchanger};
//!
//! let config = OAuthConfig::default();
//! let exchanger = Arc::new(TokenExchanger::new(&config));
//! let orchestrator = Arc::new(OAuthOrchestrator::new(
//!     config, store, credentials, host, exchanger,
//! ));
//! // Subscribe the watcher once for the life of the process
//! tokio::spawn(Arc::clone(&orchestrator).run(navigation_rx));
//! // Start a flow from the panel
//! orchestrator.start_flow().await?;
//! ```

mod host;
mod notifications;
mod orchestrator;
mod pkce;
mod token_exchange;

// Re-export public API
pub use host::{LoadStatus, NavigationEvent, TabHost, TabId};
pub use notifications::AuthNotifier;
pub use orchestrator::{FlowPhase, OAuthOrchestrator};
pub use pkce::{
    build_authorization_url, extract_authorization_code, generate_code_challenge,
    generate_code_verifier, generate_pkce_pair, PkcePair,
};
pub use token_exchange::{CodeExchanger, TokenExchanger};

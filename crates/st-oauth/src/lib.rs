//! OAuth PKCE authorization flow core for SideTab

pub mod config;
pub mod errors;
pub mod flow;

// Re-export flow public API
pub use config::OAuthConfig;
pub use errors::{FlowError, FlowResult};
pub use flow::{
    build_authorization_url, extract_authorization_code, generate_code_challenge,
    generate_code_verifier, generate_pkce_pair, AuthNotifier, CodeExchanger, FlowPhase,
    LoadStatus, NavigationEvent, OAuthOrchestrator, PkcePair, TabHost, TabId, TokenExchanger,
};

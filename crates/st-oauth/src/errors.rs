//! Flow error taxonomy

use st_types::AppError;
use thiserror::Error;

/// Errors terminating an authorization attempt
///
/// None of these are retried automatically: authorization codes are
/// single-use, so a failed attempt is cleared and a manual retry starts
/// over with fresh PKCE material.
#[derive(Error, Debug)]
pub enum FlowError {
    /// Tab creation or state persistence failed; the flow never started
    #[error("Failed to start authentication: {0}")]
    Start(String),

    /// A callback arrived with no matching pending flow, e.g. after a
    /// restart lost the state or a navigation was replayed
    #[error("No pending authentication flow for this callback")]
    OrphanedCallback,

    /// The provider rejected the authorization code
    #[error("{0}")]
    Exchange(String),

    /// Transport failure or timeout during the exchange round trip
    #[error("Network error during authentication: {0}")]
    Network(String),

    /// The persistence layer is unavailable
    #[error("Storage error during authentication: {0}")]
    Storage(String),
}

impl From<AppError> for FlowError {
    fn from(err: AppError) -> Self {
        FlowError::Storage(err.to_string())
    }
}

pub type FlowResult<T> = Result<T, FlowError>;

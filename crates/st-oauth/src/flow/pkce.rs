//! PKCE (Proof Key for Code Exchange) utilities for OAuth 2.0
//!
//! Implements PKCE as defined in RFC 7636 with the S256 (SHA-256) challenge
//! method exclusively; the weaker "plain" method is never used.

use anyhow::anyhow;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};

use st_types::{AppError, AppResult};

/// Verifier entropy in bytes, before base64url encoding
const VERIFIER_BYTES: usize = 32;

/// PKCE pair binding an authorization request to its token exchange
#[derive(Debug, Clone)]
pub struct PkcePair {
    /// Code verifier, kept local until the exchange step
    pub code_verifier: String,

    /// Code challenge (BASE64URL(SHA256(code_verifier))), sent to the
    /// authorization page
    pub code_challenge: String,
}

/// Generate a cryptographically secure code verifier
///
/// Returns the URL-safe base64 encoding (no padding) of 32 random bytes
/// from the system CSPRNG; 43 characters, within RFC 7636's 43-128 limit.
/// A randomness failure is an error, never a fallback to a weaker source.
pub fn generate_code_verifier() -> AppResult<String> {
    let rng = SystemRandom::new();
    let mut bytes = [0u8; VERIFIER_BYTES];
    rng.fill(&mut bytes)
        .map_err(|_| AppError::Crypto(anyhow!("Failed to generate random bytes")))?;

    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Derive the code challenge from a verifier
///
/// BASE64URL(SHA256(ASCII(code_verifier))), per RFC 7636. Deterministic:
/// the same verifier always yields the same challenge.
pub fn generate_code_challenge(code_verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code_verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Generate a verifier and its matching challenge
pub fn generate_pkce_pair() -> AppResult<PkcePair> {
    let code_verifier = generate_code_verifier()?;
    let code_challenge = generate_code_challenge(&code_verifier);

    Ok(PkcePair {
        code_verifier,
        code_challenge,
    })
}

/// Build the provider authorization URL
///
/// All parameter values are percent-encoded. The challenge method is always
/// S256.
pub fn build_authorization_url(
    auth_endpoint: &str,
    callback_url: &str,
    code_challenge: &str,
) -> String {
    format!(
        "{}?callback_url={}&code_challenge={}&code_challenge_method=S256",
        auth_endpoint,
        urlencoding::encode(callback_url),
        urlencoding::encode(code_challenge),
    )
}

/// Extract the authorization code from a callback URL
///
/// Returns `None` for a missing or empty `code` parameter and for URLs that
/// do not parse; never fails.
pub fn extract_authorization_code(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, value)| key == "code" && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

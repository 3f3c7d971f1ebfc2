//! CSRF state generation and authorization URL construction
//!
//! The state value is an opaque random token the caller generates before
//! sending the user to the authorize endpoint. Twitch echoes it back on the
//! redirect, and the manager compares the two before trusting the code.

use rand::RngExt;

use crate::config::ClientConfig;
use crate::constants::STATE_BYTES;

/// Generate a random CSRF state: 16 random bytes, hex-encoded (32 chars).
pub fn generate_state() -> String {
    let mut bytes = [0u8; STATE_BYTES];
    rand::rng().fill(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Build the authorize URL for the authorization-code flow.
///
/// `redirect_uri` and the space-joined scope list are percent-encoded; the
/// client id and state are passed through as-is.
pub fn build_authorize_url(authorize_endpoint: &str, config: &ClientConfig, state: &str) -> String {
    let params = [
        format!("client_id={}", config.client_id),
        format!("redirect_uri={}", urlencoding::encode(&config.redirect_uri)),
        "response_type=code".to_string(),
        format!("scope={}", urlencoding::encode(&config.scope_string())),
        format!("state={state}"),
    ];
    format!("{authorize_endpoint}?{}", params.join("&"))
}

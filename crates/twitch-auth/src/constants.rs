//! Twitch OAuth endpoints and timing constants
//!
//! The identity provider is fixed: every flow talks to `id.twitch.tv`. Only
//! the client application's own values (client id, secret, redirect URI,
//! scopes) vary per deployment and arrive through `ClientConfig`.

use std::time::Duration;

/// Base URL of the Twitch OAuth 2.0 service
pub const OAUTH2_BASE_URL: &str = "https://id.twitch.tv/oauth2";

/// Seconds subtracted from the provider's `expires_in` when computing the
/// refresh deadline, so a token never expires in the middle of a request.
pub const SAFETY_MARGIN_SECS: i64 = 60;

/// Per-request timeout applied by `TwitchOAuth::new`.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Number of random bytes in a generated CSRF state (hex-encoded to 32 chars)
pub const STATE_BYTES: usize = 16;

/// Resolved URLs of the provider endpoints the manager talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub authorize: String,
    pub token: String,
    pub validate: String,
    pub revoke: String,
}

impl Endpoints {
    /// Endpoints rooted at an arbitrary OAuth base URL (a mock server or
    /// proxy in front of `id.twitch.tv`).
    pub fn from_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            authorize: format!("{base}/authorize"),
            token: format!("{base}/token"),
            validate: format!("{base}/validate"),
            revoke: format!("{base}/revoke"),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::from_base(OAUTH2_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoints_point_at_twitch() {
        let endpoints = Endpoints::default();
        assert_eq!(endpoints.authorize, "https://id.twitch.tv/oauth2/authorize");
        assert_eq!(endpoints.token, "https://id.twitch.tv/oauth2/token");
        assert_eq!(endpoints.validate, "https://id.twitch.tv/oauth2/validate");
        assert_eq!(endpoints.revoke, "https://id.twitch.tv/oauth2/revoke");
    }

    #[test]
    fn from_base_strips_trailing_slash() {
        let endpoints = Endpoints::from_base("http://127.0.0.1:9000/");
        assert_eq!(endpoints.token, "http://127.0.0.1:9000/token");
    }
}

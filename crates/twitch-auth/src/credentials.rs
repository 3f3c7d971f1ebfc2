//! In-memory OAuth credential state
//!
//! A `Credential` starts empty and is filled in by the first successful token
//! exchange. Later refreshes overwrite it in place. Nothing here is persisted;
//! the credential lives exactly as long as the manager that owns it.

use std::fmt;

use crate::constants::SAFETY_MARGIN_SECS;
use crate::token::TokenResponse;

/// Grant type that produced the current credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    AuthorizationCode,
    RefreshToken,
    ClientCredentials,
}

impl Grant {
    /// Wire value of the `grant_type` parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Grant::AuthorizationCode => "authorization_code",
            Grant::RefreshToken => "refresh_token",
            Grant::ClientCredentials => "client_credentials",
        }
    }
}

/// Current authentication state.
///
/// `expires_time` is an absolute unix timestamp in seconds, set
/// `SAFETY_MARGIN_SECS` before the provider's real expiry. It is the refresh
/// trigger, not the provider's literal deadline.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential {
    pub access_token: String,
    /// Absent until an authorization-code exchange; never issued for
    /// client-credentials grants.
    pub refresh_token: Option<String>,
    /// Seconds granted by the provider at issuance
    pub expires_in: u64,
    /// Unix seconds at which the tokens were committed
    pub issued_at: i64,
    /// Unix seconds after which the token is considered stale
    pub expires_time: i64,
    pub grant: Option<Grant>,
}

impl Credential {
    /// Overwrite this credential with a fresh token response.
    ///
    /// Tokens are committed first, then the expiry is derived from `now`. A
    /// response without a refresh token keeps the one already held.
    pub(crate) fn apply(&mut self, response: TokenResponse, grant: Grant, now: i64) {
        self.access_token = response.access_token;
        if let Some(refresh) = response.refresh_token {
            self.refresh_token = Some(refresh);
        }
        self.expires_in = response.expires_in;
        self.grant = Some(grant);

        // Provider-supplied lifetime; clamp instead of wrapping
        let lifetime = i64::try_from(self.expires_in).unwrap_or(i64::MAX);
        self.issued_at = now;
        self.expires_time = now
            .saturating_add(lifetime)
            .saturating_sub(SAFETY_MARGIN_SECS);
    }

    /// Whether `now` is past the refresh deadline.
    pub fn is_stale(&self, now: i64) -> bool {
        now > self.expires_time
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("expires_in", &self.expires_in)
            .field("issued_at", &self.issued_at)
            .field("expires_time", &self.expires_time)
            .field("grant", &self.grant)
            .finish()
    }
}

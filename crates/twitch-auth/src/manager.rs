//! Token lifecycle manager
//!
//! `TwitchOAuth` owns one client configuration, one CSRF state and one
//! in-memory credential. It builds the authorize URL, verifies the state
//! returned on the redirect, performs the token exchanges, and wraps resource
//! calls so that a stale token is refreshed before it is used.
//!
//! All methods take `&self`; share the manager between tasks with `Arc`.
//! Credential writes go through an `RwLock`. Refreshes are single-flight: a
//! dedicated mutex serializes them and staleness is re-checked once the mutex
//! is held, so concurrent callers that all observe a stale token cause only
//! one refresh request.

use std::sync::Arc;

use reqwest::Method;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::ClientConfig;
use crate::constants::{DEFAULT_REQUEST_TIMEOUT, Endpoints};
use crate::credentials::{Credential, Grant};
use crate::endpoint::{self, ApiResponse, RequestBody};
use crate::error::{Error, Result};
use crate::state::build_authorize_url;
use crate::token::{self, TokenResponse};

/// OAuth token lifecycle manager for a single Twitch application and user.
pub struct TwitchOAuth {
    config: ClientConfig,
    state: String,
    endpoints: Endpoints,
    http_client: reqwest::Client,
    clock: Arc<dyn Clock>,
    credential: RwLock<Credential>,
    refresh_lock: Mutex<()>,
}

impl TwitchOAuth {
    /// Create a manager with a default HTTP client (30 s request timeout).
    ///
    /// `state` is the caller's CSRF token, typically from
    /// `state::generate_state()`. It stays fixed for the manager's lifetime.
    pub fn new(config: ClientConfig, state: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Http(format!("building HTTP client: {e}")))?;
        Ok(Self::with_client(config, state, http_client))
    }

    /// Create a manager using a caller-built HTTP client.
    ///
    /// The client should carry a request timeout; the manager adds none of
    /// its own.
    pub fn with_client(
        config: ClientConfig,
        state: impl Into<String>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            config,
            state: state.into(),
            endpoints: Endpoints::default(),
            http_client,
            clock: Arc::new(SystemClock),
            credential: RwLock::new(Credential::default()),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Replace the time source used for expiry decisions.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Point the manager at different provider endpoints.
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// URL to send the user's browser to. Opening it is the caller's job.
    pub fn authorize_url(&self) -> String {
        build_authorize_url(&self.endpoints.authorize, &self.config, &self.state)
    }

    /// Verify the `state` echoed back on the redirect.
    ///
    /// Must succeed before `fetch_token` is called with the code from the same
    /// redirect. Fails closed on any difference.
    pub fn confirm_state(&self, received: &str) -> Result<()> {
        if received != self.state {
            warn!("authorization state mismatch");
            return Err(Error::CsrfMismatch {
                expected: self.state.clone(),
                received: received.to_owned(),
            });
        }
        Ok(())
    }

    /// Exchange an authorization code for tokens and store them.
    ///
    /// On failure the current credential is left untouched.
    pub async fn fetch_token(&self, code: &str) -> Result<Credential> {
        let response =
            token::exchange_code(&self.http_client, &self.endpoints.token, &self.config, code)
                .await?;
        let credential = self.commit(response, Grant::AuthorizationCode).await;
        info!(expires_time = credential.expires_time, "authorization code exchanged");
        Ok(credential)
    }

    /// Obtain and store an app access token (client-credentials grant).
    pub async fn token(&self) -> Result<Credential> {
        let response =
            token::client_credentials(&self.http_client, &self.endpoints.token, &self.config)
                .await?;
        let credential = self.commit(response, Grant::ClientCredentials).await;
        info!(expires_time = credential.expires_time, "app access token issued");
        Ok(credential)
    }

    /// Refresh the access token using the stored refresh token.
    ///
    /// Fails without a network call if no refresh token has been issued yet.
    pub async fn fetch_refresh_token(&self) -> Result<Credential> {
        let refresh = self
            .credential
            .read()
            .await
            .refresh_token
            .clone()
            .ok_or_else(|| Error::token_exchange(None, "no refresh token available"))?;

        let response =
            token::refresh_token(&self.http_client, &self.endpoints.token, &self.config, &refresh)
                .await?;
        let credential = self.commit(response, Grant::RefreshToken).await;
        info!(expires_time = credential.expires_time, "access token refreshed");
        Ok(credential)
    }

    /// Refresh the token if the clock is past its refresh deadline.
    ///
    /// Returns `Some` with the new credential when a refresh happened and
    /// `None` when the current token is still fresh (no network call).
    /// App access tokens carry no refresh token and are re-requested instead.
    pub async fn refresh_token_if_needed(&self) -> Result<Option<Credential>> {
        if !self.is_stale().await {
            return Ok(None);
        }

        let _guard = self.refresh_lock.lock().await;
        // Another caller may have refreshed while we waited for the lock
        if !self.is_stale().await {
            debug!("token refreshed by concurrent caller");
            return Ok(None);
        }

        let grant = self.credential.read().await.grant;
        debug!(?grant, "access token stale, refreshing");
        let credential = match grant {
            Some(Grant::ClientCredentials) => self.token().await?,
            _ => self.fetch_refresh_token().await?,
        };
        Ok(Some(credential))
    }

    /// Call a resource endpoint with bearer credentials, refreshing first if
    /// the token is stale.
    pub async fn fetch_endpoint(
        &self,
        method: Method,
        url: &str,
        body: Option<RequestBody>,
    ) -> Result<ApiResponse> {
        self.refresh_token_if_needed().await?;

        let access_token = self.credential.read().await.access_token.clone();
        let headers = endpoint::bearer_headers(&self.config.client_id, &access_token)?;
        endpoint::send(&self.http_client, method, url, headers, body).await
    }

    pub async fn get_endpoint(&self, url: &str) -> Result<ApiResponse> {
        self.fetch_endpoint(Method::GET, url, None).await
    }

    pub async fn post_endpoint(&self, url: &str, body: impl Into<RequestBody>) -> Result<ApiResponse> {
        self.fetch_endpoint(Method::POST, url, Some(body.into())).await
    }

    pub async fn put_endpoint(&self, url: &str, body: impl Into<RequestBody>) -> Result<ApiResponse> {
        self.fetch_endpoint(Method::PUT, url, Some(body.into())).await
    }

    pub async fn patch_endpoint(&self, url: &str, body: impl Into<RequestBody>) -> Result<ApiResponse> {
        self.fetch_endpoint(Method::PATCH, url, Some(body.into())).await
    }

    pub async fn delete_endpoint(&self, url: &str) -> Result<ApiResponse> {
        self.fetch_endpoint(Method::DELETE, url, None).await
    }

    /// Validate the current access token. Does not modify the credential.
    pub async fn validate(&self) -> Result<bool> {
        let access_token = self.credential.read().await.access_token.clone();
        self.validate_token(&access_token).await
    }

    /// Validate an arbitrary access token.
    pub async fn validate_token(&self, access_token: &str) -> Result<bool> {
        token::validate_token(&self.http_client, &self.endpoints.validate, access_token).await
    }

    /// Revoke the current access token.
    ///
    /// The local credential is kept; call `clear_credential` to drop it.
    pub async fn revoke(&self) -> Result<bool> {
        let access_token = self.credential.read().await.access_token.clone();
        self.revoke_token(&access_token).await
    }

    /// Revoke an arbitrary access token issued to this client.
    pub async fn revoke_token(&self, access_token: &str) -> Result<bool> {
        token::revoke_token(
            &self.http_client,
            &self.endpoints.revoke,
            &self.config.client_id,
            access_token,
        )
        .await
    }

    /// Snapshot of the current credential.
    pub async fn credential(&self) -> Credential {
        self.credential.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        !self.credential.read().await.is_empty()
    }

    /// Reset the credential to its initial empty state.
    pub async fn clear_credential(&self) {
        *self.credential.write().await = Credential::default();
        info!("credential cleared");
    }

    async fn is_stale(&self) -> bool {
        let now = self.clock.now_secs();
        self.credential.read().await.is_stale(now)
    }

    /// Store a token response. The clock is read after the write lock is
    /// taken so `issued_at` never predates the commit.
    async fn commit(&self, response: TokenResponse, grant: Grant) -> Credential {
        let mut credential = self.credential.write().await;
        credential.apply(response, grant, self.clock.now_secs());
        credential.clone()
    }
}

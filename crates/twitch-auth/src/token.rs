//! Token endpoint interactions
//!
//! Stateless helpers for the three grants Twitch's `/token` endpoint accepts,
//! plus token validation and revocation. None of these touch a manager's
//! credential; `TwitchOAuth` calls them and commits the result itself.
//!
//! Authorization-code and refresh requests are Basic-authenticated with a
//! form body. Client-credentials and revoke requests carry their parameters in
//! the query string, matching what the provider documents for app access.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::credentials::Grant;
use crate::error::{Error, Result};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Response from the token endpoint for every grant type.
///
/// `expires_in` is a delta in seconds from the response time. Twitch omits
/// `refresh_token` for client-credentials grants.
#[derive(Debug, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires_in: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

/// `Basic base64(client_id:client_secret)` for token endpoint calls.
pub fn basic_auth_header(client_id: &str, client_secret: &str) -> String {
    format!(
        "Basic {}",
        STANDARD.encode(format!("{client_id}:{client_secret}"))
    )
}

/// Exchange an authorization code for tokens.
pub async fn exchange_code(
    client: &reqwest::Client,
    token_endpoint: &str,
    config: &ClientConfig,
    code: &str,
) -> Result<TokenResponse> {
    let secret = config.client_secret.expose();
    let request = client
        .post(token_endpoint)
        .header(AUTHORIZATION, basic_auth_header(&config.client_id, secret))
        .form(&[
            ("client_id", config.client_id.as_str()),
            ("client_secret", secret.as_str()),
            ("code", code),
            ("grant_type", Grant::AuthorizationCode.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
        ]);

    send_token_request(request, Grant::AuthorizationCode).await
}

/// Obtain a new access token from a refresh token.
///
/// Does not store anything; callers decide what to do with the response.
pub async fn refresh_token(
    client: &reqwest::Client,
    token_endpoint: &str,
    config: &ClientConfig,
    refresh: &str,
) -> Result<TokenResponse> {
    let secret = config.client_secret.expose();
    let request = client
        .post(token_endpoint)
        .header(AUTHORIZATION, basic_auth_header(&config.client_id, secret))
        .form(&[
            ("client_id", config.client_id.as_str()),
            ("client_secret", secret.as_str()),
            ("grant_type", Grant::RefreshToken.as_str()),
            ("refresh_token", refresh),
        ]);

    send_token_request(request, Grant::RefreshToken).await
}

/// Request an app access token (client-credentials grant).
pub async fn client_credentials(
    client: &reqwest::Client,
    token_endpoint: &str,
    config: &ClientConfig,
) -> Result<TokenResponse> {
    let request = client
        .post(token_endpoint)
        .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
        .query(&[
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.expose().as_str()),
            ("grant_type", Grant::ClientCredentials.as_str()),
        ]);

    send_token_request(request, Grant::ClientCredentials).await
}

/// Check a token against the validate endpoint.
///
/// Uses the `OAuth` authorization scheme rather than `Bearer`. Returns true
/// only for an exact 200.
pub async fn validate_token(
    client: &reqwest::Client,
    validate_endpoint: &str,
    access_token: &str,
) -> Result<bool> {
    let response = client
        .get(validate_endpoint)
        .header(AUTHORIZATION, format!("OAuth {access_token}"))
        .send()
        .await
        .map_err(|e| Error::Http(format!("validate request failed: {e}")))?;

    let status = response.status();
    debug!(status = status.as_u16(), "token validation response");
    Ok(status == reqwest::StatusCode::OK)
}

/// Revoke a token. Returns true only for an exact 200.
pub async fn revoke_token(
    client: &reqwest::Client,
    revoke_endpoint: &str,
    client_id: &str,
    access_token: &str,
) -> Result<bool> {
    let response = client
        .post(revoke_endpoint)
        .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
        .query(&[("client_id", client_id), ("token", access_token)])
        .send()
        .await
        .map_err(|e| Error::Http(format!("revoke request failed: {e}")))?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        warn!(status = status.as_u16(), "token revocation rejected");
    }
    Ok(status == reqwest::StatusCode::OK)
}

/// Send a prepared token request and parse the JSON body.
///
/// Any non-2xx status is a `TokenExchange` error carrying the status and body
/// text. No retries.
async fn send_token_request(request: reqwest::RequestBuilder, grant: Grant) -> Result<TokenResponse> {
    let response = request.send().await.map_err(|e| {
        record_token_request(grant, "transport_error");
        Error::Http(format!("{} request failed: {e}", grant.as_str()))
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        record_token_request(grant, "rejected");
        return Err(Error::token_exchange(
            Some(status.as_u16()),
            format!("token endpoint returned {status}: {body}"),
        ));
    }

    let token = response.json::<TokenResponse>().await.map_err(|e| {
        record_token_request(grant, "invalid_response");
        Error::token_exchange(Some(status.as_u16()), format!("invalid token response: {e}"))
    })?;

    record_token_request(grant, "success");
    Ok(token)
}

fn record_token_request(grant: Grant, outcome: &'static str) {
    metrics::counter!(
        "twitch_oauth_token_requests_total",
        "grant" => grant.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

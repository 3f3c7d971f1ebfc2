//! Bearer-authenticated resource API calls
//!
//! Sends an arbitrary request to a resource URL with the Twitch bearer
//! headers and turns the response into an `ApiResponse` by content
//! negotiation: JSON when the server says so, raw text otherwise.

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

use crate::error::{Error, Result};

/// Header Twitch uses to identify the calling application.
pub const CLIENT_ID_HEADER: HeaderName = HeaderName::from_static("client-id");

/// Outgoing request body.
///
/// Text is sent verbatim; JSON values are serialized first.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Text(String),
    Json(serde_json::Value),
}

impl RequestBody {
    fn into_string(self) -> String {
        match self {
            RequestBody::Text(text) => text,
            RequestBody::Json(value) => value.to_string(),
        }
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Text(text)
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        RequestBody::Text(text.to_owned())
    }
}

impl From<serde_json::Value> for RequestBody {
    fn from(value: serde_json::Value) -> Self {
        RequestBody::Json(value)
    }
}

/// Parsed response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Json(serde_json::Value),
    Text(String),
}

impl ApiResponse {
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ApiResponse::Json(value) => Some(value),
            ApiResponse::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ApiResponse::Text(text) => Some(text),
            ApiResponse::Json(_) => None,
        }
    }
}

/// Headers for resource calls: bearer token, client id, JSON content type.
pub fn bearer_headers(client_id: &str, access_token: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let bearer = HeaderValue::from_str(&format!("Bearer {access_token}"))
        .map_err(|e| Error::InvalidHeader(format!("access token: {e}")))?;
    let client_id = HeaderValue::from_str(client_id)
        .map_err(|e| Error::InvalidHeader(format!("client id: {e}")))?;

    headers.insert(AUTHORIZATION, bearer);
    headers.insert(CLIENT_ID_HEADER, client_id);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

/// Send a bearer-authenticated request and parse the response.
///
/// Does not refresh anything; the manager runs its staleness check first.
pub async fn send(
    client: &reqwest::Client,
    method: Method,
    url: &str,
    headers: HeaderMap,
    body: Option<RequestBody>,
) -> Result<ApiResponse> {
    let method_label = method.to_string();
    let mut request = client.request(method, url).headers(headers);
    if let Some(body) = body {
        request = request.body(body.into_string());
    }

    let response = request.send().await.map_err(|e| {
        record_endpoint_request(&method_label, "transport_error");
        Error::Http(format!("{method_label} {url} failed: {e}"))
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let reason = status.canonical_reason().unwrap_or("unknown status");
        record_endpoint_request(&method_label, "rejected");
        return Err(Error::Endpoint {
            status: status.as_u16(),
            message: if body.is_empty() {
                reason.to_string()
            } else {
                format!("{reason}: {body}")
            },
        });
    }

    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));

    let parsed = if is_json {
        let value = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| Error::Endpoint {
                status: status.as_u16(),
                message: format!("invalid JSON body: {e}"),
            })?;
        ApiResponse::Json(value)
    } else {
        let text = response
            .text()
            .await
            .map_err(|e| Error::Http(format!("reading response body failed: {e}")))?;
        ApiResponse::Text(text)
    };

    debug!(method = %method_label, url, status = status.as_u16(), "endpoint call succeeded");
    record_endpoint_request(&method_label, "success");
    Ok(parsed)
}

fn record_endpoint_request(method: &str, outcome: &'static str) {
    metrics::counter!(
        "twitch_oauth_endpoint_requests_total",
        "method" => method.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

//! HTTP routes driving the OAuth flow
//!
//! Routes:
//! - GET  /              : link to start authorization
//! - GET  /authorize     : redirect to Twitch's authorize URL
//! - GET  /auth-callback : verify state, exchange code, redirect to /home or /failed
//! - GET  /home          : links to the example API calls
//! - GET  /failed        : authorization failure page
//! - GET  /user          : Helix users call through the token manager
//! - GET  /validate      : validate the current access token
//! - POST /revoke        : revoke the current token and clear local state
//! - GET  /health, /metrics

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use tracing::{info, warn};
use twitch_auth::{ApiResponse, TwitchOAuth};

use crate::metrics::record_callback;

/// Helix endpoint returning the authenticated user
pub const HELIX_USERS_URL: &str = "https://api.twitch.tv/helix/users";

/// Shared state accessible from all handlers
#[derive(Clone)]
pub struct AppState {
    pub oauth: Arc<TwitchOAuth>,
    pub prometheus: PrometheusHandle,
    pub started_at: Instant,
    pub users_url: String,
}

impl AppState {
    pub fn new(oauth: Arc<TwitchOAuth>, prometheus: PrometheusHandle) -> Self {
        Self {
            oauth,
            prometheus,
            started_at: Instant::now(),
            users_url: HELIX_USERS_URL.to_string(),
        }
    }
}

/// Build the axum router with all routes and shared state.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/authorize", get(authorize))
        .route("/auth-callback", get(auth_callback))
        .route("/home", get(home))
        .route("/failed", get(failed))
        .route("/user", get(user))
        .route("/validate", get(validate))
        .route("/revoke", post(revoke))
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Query parameters Twitch appends to the redirect URI.
///
/// On consent: `code`, `scope`, `state`. On denial: `error`,
/// `error_description`, `state`.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

async fn index() -> Html<&'static str> {
    Html(r#"<a href="/authorize">Authorize</a>"#)
}

async fn authorize(State(state): State<AppState>) -> Redirect {
    Redirect::to(&state.oauth.authorize_url())
}

/// GET /auth-callback: confirm state, then exchange.
///
/// Any failure (provider error, missing parameters, state mismatch, exchange
/// failure) redirects to /failed. The code is never exchanged unless the
/// state matched.
async fn auth_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    if let Some(error) = params.error {
        warn!(error = %error, description = ?params.error_description, "authorization denied by provider");
        record_callback("denied");
        return Redirect::to("/failed");
    }

    let (Some(code), Some(received_state)) = (params.code, params.state) else {
        warn!("callback missing code or state");
        record_callback("missing_params");
        return Redirect::to("/failed");
    };

    if state.oauth.confirm_state(&received_state).is_err() {
        warn!("callback state mismatch, rejecting code");
        record_callback("state_mismatch");
        return Redirect::to("/failed");
    }

    match state.oauth.fetch_token(&code).await {
        Ok(_) => {
            info!("authorization complete");
            record_callback("success");
            Redirect::to("/home")
        }
        Err(e) => {
            warn!(error = %e, "token exchange failed");
            record_callback("exchange_failed");
            Redirect::to("/failed")
        }
    }
}

async fn home() -> Html<&'static str> {
    Html(
        r#"<a href="/user">Current user (GET request)</a><br />
<a href="/validate">Validate token</a><br />
<form method="post" action="/revoke"><button>Revoke token</button></form>"#,
    )
}

async fn failed() -> (StatusCode, Html<&'static str>) {
    (
        StatusCode::UNAUTHORIZED,
        Html(r#"Authorization failed. <a href="/authorize">Try again</a>"#),
    )
}

/// GET /user: relay the Helix users response.
async fn user(State(state): State<AppState>) -> Response {
    match state.oauth.get_endpoint(&state.users_url).await {
        Ok(ApiResponse::Json(value)) => axum::Json(value).into_response(),
        Ok(ApiResponse::Text(text)) => text.into_response(),
        Err(e) => upstream_error(e),
    }
}

async fn validate(State(state): State<AppState>) -> Response {
    match state.oauth.validate().await {
        Ok(valid) => axum::Json(serde_json::json!({ "valid": valid })).into_response(),
        Err(e) => upstream_error(e),
    }
}

/// POST /revoke: revoke remotely, then drop the local credential.
async fn revoke(State(state): State<AppState>) -> Response {
    match state.oauth.revoke().await {
        Ok(revoked) => {
            if revoked {
                state.oauth.clear_credential().await;
            }
            axum::Json(serde_json::json!({ "revoked": revoked })).into_response()
        }
        Err(e) => upstream_error(e),
    }
}

/// Health endpoint: status, whether a token is held, and uptime.
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "healthy",
        "authenticated": state.oauth.is_authenticated().await,
        "uptime_seconds": state.started_at.elapsed().as_secs(),
    }))
}

/// Prometheus metrics endpoint: returns metrics in text exposition format.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.prometheus.render(),
    )
}

/// Map a library error to a 502 JSON response.
fn upstream_error(error: twitch_auth::Error) -> Response {
    warn!(error = %error, "twitch request failed");
    (
        StatusCode::BAD_GATEWAY,
        axum::Json(serde_json::json!({ "error": error.to_string() })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, header};
    use tower::ServiceExt;
    use twitch_auth::{ClientConfig, Endpoints};
    use wiremock::matchers::{body_string_contains, header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const STATE: &str = "0123456789abcdef0123456789abcdef";

    fn test_state() -> AppState {
        let config = ClientConfig::new(
            "client-abc",
            "secret-xyz",
            "http://localhost:4000/auth-callback",
            vec!["user:read:email".into()],
        );
        let oauth = Arc::new(TwitchOAuth::new(config, STATE).unwrap());
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        AppState::new(oauth, recorder.handle())
    }

    /// App state whose manager and Helix URL point at a mock server.
    fn mocked_state(server: &MockServer) -> AppState {
        let mut state = test_state();
        let config = state.oauth.config().clone();
        state.oauth = Arc::new(
            TwitchOAuth::new(config, STATE)
                .unwrap()
                .with_endpoints(Endpoints::from_base(&server.uri())),
        );
        state.users_url = format!("{}/helix/users", server.uri());
        state
    }

    async fn send_get(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    fn location(response: &Response) -> &str {
        response.headers()[header::LOCATION].to_str().unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn index_links_to_authorize() {
        let response = send_get(build_router(test_state()), "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("/authorize"));
    }

    #[tokio::test]
    async fn authorize_redirects_to_twitch() {
        let state = test_state();
        let expected = state.oauth.authorize_url();
        let response = send_get(build_router(state), "/authorize").await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), expected);
        assert!(expected.contains(&format!("state={STATE}")));
    }

    #[tokio::test]
    async fn callback_with_wrong_state_never_exchanges() {
        let state = test_state();
        let oauth = state.oauth.clone();
        let response = send_get(
            build_router(state),
            "/auth-callback?code=abc&scope=user%3Aread%3Aemail&state=forged",
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/failed");
        assert!(!oauth.is_authenticated().await);
    }

    #[tokio::test]
    async fn callback_with_provider_error_fails() {
        let response = send_get(
            build_router(test_state()),
            &format!("/auth-callback?error=access_denied&error_description=The+user+denied+you+access&state={STATE}"),
        )
        .await;
        assert_eq!(location(&response), "/failed");
    }

    #[tokio::test]
    async fn callback_missing_state_fails() {
        let response = send_get(build_router(test_state()), "/auth-callback?code=abc").await;
        assert_eq!(location(&response), "/failed");
    }

    #[tokio::test]
    async fn callback_exchanges_code_and_user_relays_helix() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at_demo",
                "refresh_token": "rt_demo",
                "expires_in": 14000,
                "scope": ["user:read:email"],
                "token_type": "bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/helix/users"))
            .and(header_eq("authorization", "Bearer at_demo"))
            .and(header_eq("client-id", "client-abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "id": "141981764", "login": "twitchdev" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let state = mocked_state(&server);
        let response = send_get(
            build_router(state.clone()),
            &format!("/auth-callback?code=abc&scope=user%3Aread%3Aemail&state={STATE}"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/home");
        assert!(state.oauth.is_authenticated().await);

        let response = send_get(build_router(state), "/user").await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"][0]["login"], "twitchdev");
    }

    #[tokio::test]
    async fn callback_with_rejected_code_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("Invalid authorization code"))
            .expect(1)
            .mount(&server)
            .await;

        let state = mocked_state(&server);
        let response = send_get(
            build_router(state.clone()),
            &format!("/auth-callback?code=stale&state={STATE}"),
        )
        .await;
        assert_eq!(location(&response), "/failed");
        assert!(!state.oauth.is_authenticated().await);
    }

    #[tokio::test]
    async fn failed_page_is_unauthorized() {
        let response = send_get(build_router(test_state()), "/failed").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn health_reports_unauthenticated_at_start() {
        let response = send_get(build_router(test_state()), "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["authenticated"], false);
    }

    #[tokio::test]
    async fn user_without_credential_is_bad_gateway() {
        // Stale and no refresh token: fails before any network call
        let response = send_get(build_router(test_state()), "/user").await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(response).await;
        assert!(
            json["error"].as_str().unwrap().contains("no refresh token"),
            "got: {json}"
        );
    }

    #[tokio::test]
    async fn metrics_endpoint_serves_text_format() {
        let response = send_get(build_router(test_state()), "/metrics").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response.headers()[header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/plain")
        );
    }

    #[tokio::test]
    async fn revoke_requires_post() {
        let response = send_get(build_router(test_state()), "/revoke").await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}

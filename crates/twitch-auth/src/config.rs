//! Client application configuration

use common::Secret;

/// Registered application values supplied by the caller at construction.
///
/// The secret is wrapped in `Secret` so it never shows up in Debug output
/// or logs.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
}

impl ClientConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: Secret::new(client_secret.into()),
            redirect_uri: redirect_uri.into(),
            scopes,
        }
    }

    /// Scopes joined with a single space, as the authorize endpoint expects.
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scopes_join_with_single_space() {
        let config = ClientConfig::new(
            "id",
            "secret",
            "http://localhost/cb",
            vec!["user:edit:broadcast".into(), "moderation:read".into()],
        );
        assert_eq!(config.scope_string(), "user:edit:broadcast moderation:read");
    }

    #[test]
    fn debug_redacts_secret() {
        let config = ClientConfig::new("id", "super-secret", "http://localhost/cb", vec![]);
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"), "got: {debug}");
        assert!(debug.contains("[REDACTED]"));
    }
}

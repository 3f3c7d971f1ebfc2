//! Configuration types and loading
//!
//! Config precedence: CLI `--config` path > `CONFIG_PATH` env var > default
//! file name. The client secret is loaded from `TWITCH_CLIENT_SECRET` or
//! `client_secret_file`, never stored in the TOML directly.

use common::Secret;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use twitch_auth::ClientConfig;

/// Env var holding the Twitch client secret
pub const CLIENT_SECRET_ENV: &str = "TWITCH_CLIENT_SECRET";

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub twitch: TwitchConfig,
    pub server: ServerConfig,
}

/// Registered Twitch application values
#[derive(Debug, Deserialize)]
pub struct TwitchConfig {
    pub client_id: String,
    pub redirect_uri: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Path to a file containing the client secret (alternative to the env var)
    #[serde(default)]
    pub client_secret_file: Option<PathBuf>,
    #[serde(skip)]
    client_secret: Option<Secret<String>>,
}

/// HTTP listener settings
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    /// Timeout applied to every outbound request to Twitch
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from a TOML file, then resolve the client secret.
    ///
    /// Secret resolution order:
    /// 1. TWITCH_CLIENT_SECRET env var
    /// 2. client_secret_file path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if config.twitch.client_id.trim().is_empty() {
            return Err(common::Error::Config("client_id must not be empty".into()));
        }

        if !config.twitch.redirect_uri.starts_with("http://")
            && !config.twitch.redirect_uri.starts_with("https://")
        {
            return Err(common::Error::Config(format!(
                "redirect_uri must start with http:// or https://, got: {}",
                config.twitch.redirect_uri
            )));
        }

        if config.server.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if let Ok(secret) = std::env::var(CLIENT_SECRET_ENV) {
            config.twitch.client_secret = Some(Secret::new(secret));
        } else if let Some(ref secret_file) = config.twitch.client_secret_file {
            let secret = std::fs::read_to_string(secret_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read client_secret_file {}: {e}",
                    secret_file.display()
                ))
            })?;
            config.twitch.client_secret = Some(Secret::new(secret.trim().to_owned()));
        }

        if config
            .twitch
            .client_secret
            .as_ref()
            .is_none_or(|s| s.expose().is_empty())
        {
            return Err(common::Error::Config(format!(
                "client secret missing: set {CLIENT_SECRET_ENV} or client_secret_file"
            )));
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("twitch-oauth-demo.toml")
    }

    /// Client configuration handed to the token lifecycle manager.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(
            self.twitch.client_id.clone(),
            self.twitch
                .client_secret
                .as_ref()
                .map(|s| s.expose().clone())
                .unwrap_or_default(),
            self.twitch.redirect_uri.clone(),
            self.twitch.scopes.clone(),
        )
    }
}

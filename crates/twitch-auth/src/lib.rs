//! Twitch OAuth token lifecycle library
//!
//! Manages the tokens of one Twitch application acting for one user (or for
//! itself, with client credentials): authorize URL construction, CSRF state
//! verification, code exchange, refresh-before-use, and bearer-authenticated
//! resource calls. Credentials live in memory only.
//!
//! Authorization-code flow:
//! 1. Caller generates a state with `state::generate_state()`
//! 2. Caller builds `TwitchOAuth::new(config, state)` and sends the user to
//!    `authorize_url()`
//! 3. On the redirect, caller runs `confirm_state(state)` then `fetch_token(code)`
//! 4. Resource calls go through `get_endpoint` / `post_endpoint` / ..., which
//!    refresh the token first whenever it is past its refresh deadline
//!
//! App access uses `token()` instead of steps 1-3.

pub mod clock;
pub mod config;
pub mod constants;
pub mod credentials;
pub mod endpoint;
pub mod error;
pub mod manager;
pub mod state;
pub mod token;

pub use clock::{Clock, SystemClock};
pub use config::ClientConfig;
pub use constants::*;
pub use credentials::{Credential, Grant};
pub use endpoint::{ApiResponse, RequestBody};
pub use error::{Error, Result};
pub use manager::TwitchOAuth;
pub use state::{build_authorize_url, generate_state};
pub use token::TokenResponse;

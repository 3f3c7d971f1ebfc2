//! Shared types for the Twitch OAuth workspace
//!
//! `Secret` keeps client secrets out of Debug output and logs; `Error` covers
//! configuration loading for the binaries.

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;

//! Track polling error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication error: {0}")]
    Auth(#[from] prism_auth::AuthError),

    #[error("Unexpected response status: {0}")]
    Status(u16),

    #[error("Malformed response body: {0}")]
    Body(#[from] serde_json::Error),
}

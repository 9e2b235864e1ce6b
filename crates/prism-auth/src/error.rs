//! Authentication error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider rejected the request: {0}")]
    Provider(String),

    #[error("Token response missing {0}")]
    MalformedToken(&'static str),

    #[error("No refresh token available")]
    MissingRefreshToken,

    #[error("Authorization redirect carried no code")]
    NoCode,

    #[error("Timed out waiting for the authorization redirect")]
    ListenerTimeout,

    #[error("Redirect listener error: {0}")]
    Listener(#[from] std::io::Error),

    #[error("Failed to open browser: {0}")]
    Browser(std::io::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Settings store error: {0}")]
    Store(#[from] prism_store::StoreError),

    #[error("Not signed in")]
    NotAuthenticated,
}

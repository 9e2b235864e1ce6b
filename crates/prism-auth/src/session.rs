//! Session data structure

use prism_color::ColorMode;
use prism_store::SessionSettings;

/// Authentication state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated,
    /// A refresh request is in flight
    Refreshing,
}

impl AuthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthState::Unauthenticated => "unauthenticated",
            AuthState::Authenticated => "authenticated",
            AuthState::Refreshing => "refreshing",
        }
    }
}

impl std::fmt::Display for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// In-memory session owned by the authenticator. Mirrors the `session`
/// section of the settings document and is written back after every
/// mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Unix seconds; meaningful only while `access_token` is present.
    pub expires_at: i64,
    pub mode: ColorMode,
}

impl Session {
    pub fn from_settings(settings: &SessionSettings) -> Self {
        Self {
            access_token: settings.access_token.clone(),
            refresh_token: settings.refresh_token.clone(),
            expires_at: settings.expires_at,
            mode: settings.mode,
        }
    }

    pub fn to_settings(&self) -> SessionSettings {
        SessionSettings {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            expires_at: self.expires_at,
            mode: self.mode,
        }
    }

    /// Both tokens are present, regardless of expiry.
    pub fn has_token_material(&self) -> bool {
        self.access_token.is_some() && self.refresh_token.is_some()
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at <= now
    }
}

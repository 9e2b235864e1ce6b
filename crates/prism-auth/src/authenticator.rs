//! OAuth session lifecycle
//!
//! State machine over {Unauthenticated, Authenticated, Refreshing}:
//! - An unexpired token authenticates with zero network calls
//! - An expired token triggers at most one refresh per check
//! - Interactive authorization is a no-op while already authenticated
//! - Every token mutation persists synchronously to the settings store

use std::time::Duration;

use chrono::Utc;
use prism_color::ColorMode;
use prism_store::SettingsStore;
use serde::Deserialize;
use url::Url;

use crate::listener;
use crate::session::{AuthState, Session};
use crate::{AuthError, Result};

/// Scopes requested during authorization.
const SCOPE: &str = "user-read-currently-playing user-read-email";

/// Upper bound on the wait for the browser redirect.
const AUTHORIZE_TIMEOUT: Duration = Duration::from_secs(120);

/// Provider endpoints and client credentials, fixed for the process
/// lifetime.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
}

/// Outcome of `check_session`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCheck {
    /// Token present and unexpired; no network traffic happened
    Valid,
    /// Token was expired and a refresh succeeded
    Refreshed,
    /// No token material; interactive sign-in required
    NoTokens,
    /// Token expired and the refresh failed
    Expired,
}

impl SessionCheck {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionCheck::Valid | SessionCheck::Refreshed)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    error: Option<String>,
}

pub struct SessionAuthenticator {
    http: reqwest::Client,
    provider: ProviderConfig,
    store: SettingsStore,
    session: Session,
    state: AuthState,
}

impl SessionAuthenticator {
    /// Build an authenticator around the settings store; the session section
    /// is loaded into memory and owned from here on.
    pub fn new(provider: ProviderConfig, store: SettingsStore) -> Self {
        let session = Session::from_settings(&store.settings().session);

        Self {
            http: reqwest::Client::new(),
            provider,
            store,
            session,
            state: AuthState::Unauthenticated,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn mode(&self) -> ColorMode {
        self.session.mode
    }

    pub fn access_token(&self) -> Option<&str> {
        self.session.access_token.as_deref()
    }

    /// Authenticated with a token that is still unexpired right now.
    pub fn token_usable(&self) -> bool {
        self.state == AuthState::Authenticated
            && self.session.access_token.is_some()
            && !self.session.is_expired(Utc::now().timestamp())
    }

    /// Drop back to Unauthenticated, e.g. after the provider rejected a
    /// request. Token material is kept for a later refresh.
    pub fn mark_unauthenticated(&mut self) {
        if self.state != AuthState::Unauthenticated {
            tracing::debug!(from = %self.state, "Authentication state cleared");
            self.state = AuthState::Unauthenticated;
        }
    }

    /// Persist a mode preference change.
    pub fn set_mode(&mut self, mode: ColorMode) -> Result<()> {
        self.session.mode = mode;
        self.persist_session()
    }

    /// Decide the authentication state. An unexpired token is trusted
    /// without network traffic; an expired one is refreshed exactly once.
    pub async fn check_session(&mut self) -> Result<SessionCheck> {
        if !self.session.has_token_material() {
            self.state = AuthState::Unauthenticated;
            return Ok(SessionCheck::NoTokens);
        }

        if !self.session.is_expired(Utc::now().timestamp()) {
            self.state = AuthState::Authenticated;
            return Ok(SessionCheck::Valid);
        }

        match self.refresh().await {
            Ok(()) => Ok(SessionCheck::Refreshed),
            // A persistence failure is not an authentication verdict.
            Err(AuthError::Store(e)) => Err(AuthError::Store(e)),
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed");
                self.state = AuthState::Unauthenticated;
                Ok(SessionCheck::Expired)
            }
        }
    }

    /// Run the authorization-code flow: open the browser, wait for the
    /// redirect, exchange the code. A no-op when already authenticated.
    pub async fn authorize(&mut self) -> Result<()> {
        if self.state == AuthState::Authenticated {
            tracing::debug!("Already authenticated; skipping authorization");
            return Ok(());
        }

        let auth_url = self.authorization_url()?;
        let port = self.redirect_port()?;

        tracing::info!(url = %auth_url, "Opening browser for authorization");
        webbrowser::open(auth_url.as_str()).map_err(AuthError::Browser)?;

        let code = match listener::wait_for_code(port, AUTHORIZE_TIMEOUT).await {
            Ok(code) => code,
            Err(e) => {
                self.state = AuthState::Unauthenticated;
                return Err(e);
            }
        };

        let response: TokenResponse = self
            .http
            .post(&self.provider.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code.as_str()),
                ("redirect_uri", self.provider.redirect_uri.as_str()),
                ("client_id", self.provider.client_id.as_str()),
                ("client_secret", self.provider.client_secret.as_str()),
            ])
            .send()
            .await?
            .json()
            .await?;

        if let Some(error) = response.error {
            self.state = AuthState::Unauthenticated;
            return Err(AuthError::Provider(error));
        }

        self.session.access_token = Some(
            response
                .access_token
                .ok_or(AuthError::MalformedToken("access_token"))?,
        );
        self.session.refresh_token = Some(
            response
                .refresh_token
                .ok_or(AuthError::MalformedToken("refresh_token"))?,
        );
        let expires_in = response
            .expires_in
            .ok_or(AuthError::MalformedToken("expires_in"))?;
        self.session.expires_at = Utc::now().timestamp() + expires_in;

        self.persist_session()?;
        self.state = AuthState::Authenticated;
        tracing::info!("Authorization complete");

        Ok(())
    }

    /// Exchange the refresh token for a new access token. The refresh token
    /// itself is not rotated; a provider error mutates nothing.
    pub async fn refresh(&mut self) -> Result<()> {
        let refresh_token = self
            .session
            .refresh_token
            .clone()
            .ok_or(AuthError::MissingRefreshToken)?;

        self.state = AuthState::Refreshing;

        match self.request_refresh(&refresh_token).await {
            Ok((access_token, expires_in)) => {
                self.session.access_token = Some(access_token);
                self.session.expires_at = Utc::now().timestamp() + expires_in;
                self.persist_session()?;
                self.state = AuthState::Authenticated;
                tracing::info!("Access token refreshed");
                Ok(())
            }
            Err(e) => {
                self.state = AuthState::Unauthenticated;
                Err(e)
            }
        }
    }

    async fn request_refresh(&self, refresh_token: &str) -> Result<(String, i64)> {
        let response: TokenResponse = self
            .http
            .post(&self.provider.token_url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.provider.client_id.as_str()),
                ("client_secret", self.provider.client_secret.as_str()),
            ])
            .send()
            .await?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(AuthError::Provider(error));
        }

        let access_token = response
            .access_token
            .ok_or(AuthError::MalformedToken("access_token"))?;
        let expires_in = response
            .expires_in
            .ok_or(AuthError::MalformedToken("expires_in"))?;

        Ok((access_token, expires_in))
    }

    fn persist_session(&mut self) -> Result<()> {
        let snapshot = self.session.to_settings();
        self.store.update(|settings| settings.session = snapshot)?;
        Ok(())
    }

    fn authorization_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.provider.auth_url)?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.provider.client_id)
            .append_pair("response_type", "code")
            .append_pair("scope", SCOPE)
            .append_pair("redirect_uri", &self.provider.redirect_uri);
        Ok(url)
    }

    fn redirect_port(&self) -> Result<u16> {
        let url = Url::parse(&self.provider.redirect_uri)?;
        Ok(url.port().unwrap_or(80))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// token_url pointing at a port nothing listens on; any request fails.
    const DEAD_TOKEN_URL: &str = "http://127.0.0.1:1/token";

    fn provider(token_url: &str) -> ProviderConfig {
        ProviderConfig {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "http://localhost:5000/callback".to_string(),
            auth_url: "https://auth.example/authorize".to_string(),
            token_url: token_url.to_string(),
        }
    }

    fn store_with_tokens(
        dir: &TempDir,
        access: Option<&str>,
        refresh: Option<&str>,
        expires_at: i64,
    ) -> SettingsStore {
        let mut store = SettingsStore::load_or_init(dir.path().join("settings.json")).unwrap();
        store
            .update(|settings| {
                settings.session.access_token = access.map(String::from);
                settings.session.refresh_token = refresh.map(String::from);
                settings.session.expires_at = expires_at;
            })
            .unwrap();
        store
    }

    fn far_future() -> i64 {
        Utc::now().timestamp() + 3600
    }

    /// Serve each canned (status, body) pair to one connection, in order,
    /// counting requests.
    fn spawn_token_server(responses: Vec<(&'static str, &'static str)>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let thread_hits = Arc::clone(&hits);

        std::thread::spawn(move || {
            for (status, body) in responses {
                let Ok((mut stream, _)) = listener.accept() else {
                    return;
                };
                read_full_request(&mut stream);
                thread_hits.fetch_add(1, Ordering::SeqCst);
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });

        (format!("http://{addr}/token"), hits)
    }

    fn read_full_request(stream: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let Ok(read) = stream.read(&mut chunk) else {
                return;
            };
            if read == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..read]);

            let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let headers = String::from_utf8_lossy(&buf[..end]);
            let content_length = headers
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    if name.eq_ignore_ascii_case("content-length") {
                        value.trim().parse::<usize>().ok()
                    } else {
                        None
                    }
                })
                .unwrap_or(0);
            if buf.len() >= end + 4 + content_length {
                return;
            }
        }
    }

    #[tokio::test]
    async fn test_check_session_without_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_tokens(&dir, None, None, 0);
        let mut auth = SessionAuthenticator::new(provider(DEAD_TOKEN_URL), store);

        assert_eq!(auth.check_session().await.unwrap(), SessionCheck::NoTokens);
        assert_eq!(auth.state(), AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_check_session_valid_token_makes_no_request() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_tokens(&dir, Some("access"), Some("refresh"), far_future());
        // Any network attempt would fail against the dead endpoint, turning
        // the outcome into Expired; Valid proves nothing was sent.
        let mut auth = SessionAuthenticator::new(provider(DEAD_TOKEN_URL), store);

        assert_eq!(auth.check_session().await.unwrap(), SessionCheck::Valid);
        assert_eq!(auth.state(), AuthState::Authenticated);
        assert_eq!(auth.access_token(), Some("access"));
    }

    #[tokio::test]
    async fn test_check_session_refreshes_expired_token_exactly_once() {
        let (token_url, hits) = spawn_token_server(vec![(
            "200 OK",
            r#"{"access_token":"fresh","expires_in":3600}"#,
        )]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = store_with_tokens(&dir, Some("stale"), Some("refresh"), 100);
        let mut auth = SessionAuthenticator::new(provider(&token_url), store);

        assert_eq!(auth.check_session().await.unwrap(), SessionCheck::Refreshed);
        assert_eq!(auth.state(), AuthState::Authenticated);
        assert_eq!(auth.access_token(), Some("fresh"));
        assert!(auth.session().expires_at > Utc::now().timestamp());
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // The refresh token is not rotated, and the mutation was persisted.
        let reopened = SettingsStore::load_or_init(&path).unwrap();
        assert_eq!(reopened.settings().session.access_token.as_deref(), Some("fresh"));
        assert_eq!(reopened.settings().session.refresh_token.as_deref(), Some("refresh"));
    }

    #[tokio::test]
    async fn test_check_session_refresh_error_mutates_nothing() {
        let (token_url, hits) =
            spawn_token_server(vec![("200 OK", r#"{"error":"invalid_grant"}"#)]);
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_tokens(&dir, Some("stale"), Some("refresh"), 100);
        let mut auth = SessionAuthenticator::new(provider(&token_url), store);

        assert_eq!(auth.check_session().await.unwrap(), SessionCheck::Expired);
        assert_eq!(auth.state(), AuthState::Unauthenticated);
        assert_eq!(auth.access_token(), Some("stale"));
        assert_eq!(auth.session().expires_at, 100);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_authorize_is_idempotent_when_authenticated() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_tokens(&dir, Some("access"), Some("refresh"), far_future());
        let mut auth = SessionAuthenticator::new(provider(DEAD_TOKEN_URL), store);
        auth.check_session().await.unwrap();

        // No browser launch, no listener, no token request.
        auth.authorize().await.unwrap();
        assert_eq!(auth.state(), AuthState::Authenticated);
        assert_eq!(auth.access_token(), Some("access"));
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_tokens(&dir, Some("access"), None, 100);
        let mut auth = SessionAuthenticator::new(provider(DEAD_TOKEN_URL), store);

        let result = auth.refresh().await;
        assert!(matches!(result, Err(AuthError::MissingRefreshToken)));
    }

    #[test]
    fn test_authorization_url_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_with_tokens(&dir, None, None, 0);
        let auth = SessionAuthenticator::new(provider(DEAD_TOKEN_URL), store);

        let url = auth.authorization_url().unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert!(pairs.contains(&("client_id".to_string(), "client".to_string())));
        assert!(pairs.contains(&("response_type".to_string(), "code".to_string())));
        assert!(pairs.contains(&(
            "redirect_uri".to_string(),
            "http://localhost:5000/callback".to_string()
        )));
        assert_eq!(auth.redirect_port().unwrap(), 5000);
    }
}

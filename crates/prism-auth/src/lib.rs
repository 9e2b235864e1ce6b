//! Prism Session Authentication
//!
//! Owns the OAuth authorization-code flow and the session lifecycle:
//! - Tokens load from the settings store and persist on every mutation
//! - An unexpired token is trusted without touching the network
//! - An expired token is refreshed at most once per check
//! - Interactive sign-in opens the system browser and waits on a one-shot
//!   localhost redirect listener, bounded by a timeout

mod authenticator;
mod error;
mod listener;
mod session;

pub use authenticator::{ProviderConfig, SessionAuthenticator, SessionCheck};
pub use error::AuthError;
pub use session::{AuthState, Session};

pub type Result<T> = std::result::Result<T, AuthError>;

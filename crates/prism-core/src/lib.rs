//! Prism Core
//!
//! Orchestration for the artwork-to-bulb sync: validated runtime
//! configuration, the sync-loop state machine, the user-facing status log,
//! and the shared error type.

mod config;
mod error;
mod status;
mod sync;

pub use config::Config;
pub use error::CoreError;
pub use status::{NullSink, StatusSink, SEPARATOR};
pub use sync::{SyncEvent, SyncLoop, SyncState};

// Re-export core components
pub use prism_auth::{
    AuthError, AuthState, ProviderConfig, Session, SessionAuthenticator, SessionCheck,
};
pub use prism_bulb::{BulbController, BulbError};
pub use prism_color::{extract, ColorError, ColorMode, ColorSample};
pub use prism_player::{PlayerError, PollOutcome, TrackPoller};
pub use prism_store::{Constants, SessionSettings, Settings, SettingsStore, StoreError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Diagnostics go to stderr; stdout belongs to the status log.
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

//! Prism Settings Store
//!
//! Durable configuration and session state:
//! - One JSON document with a `constants` and a `session` section
//! - Loaded (or initialized with defaults) once at startup
//! - Fully rewritten on every update, never patched in place

mod error;
mod schema;
mod store;

pub use error::StoreError;
pub use schema::{
    Constants, SessionSettings, Settings, PLACEHOLDER_BULB_ADDR, PLACEHOLDER_CREDENTIAL,
};
pub use store::SettingsStore;

pub type Result<T> = std::result::Result<T, StoreError>;

//! Prism Bulb Control
//!
//! Pushes RGB + brightness to a LEDENET-style wifi bulb over TCP.

mod controller;
mod error;

pub use controller::BulbController;
pub use error::BulbError;

pub type Result<T> = std::result::Result<T, BulbError>;

//! Bulb control error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BulbError {
    #[error("Bulb connection error: {0}")]
    Connection(#[from] std::io::Error),

    #[error("Bulb connection timed out")]
    Timeout,

    #[error("Not connected to the bulb")]
    NotConnected,
}

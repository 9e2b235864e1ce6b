//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Settings store error: {0}")]
    Store(#[from] prism_store::StoreError),

    #[error("Authentication error: {0}")]
    Auth(#[from] prism_auth::AuthError),

    #[error("Player error: {0}")]
    Player(#[from] prism_player::PlayerError),

    #[error("Color extraction error: {0}")]
    Color(#[from] prism_color::ColorError),

    #[error("Bulb error: {0}")]
    Bulb(#[from] prism_bulb::BulbError),

    #[error("Configuration error: {0}")]
    Config(String),
}

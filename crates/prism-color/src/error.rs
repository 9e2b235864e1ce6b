//! Color extraction error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ColorError {
    #[error("Failed to decode artwork: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Artwork contains no pixels")]
    EmptyImage,
}

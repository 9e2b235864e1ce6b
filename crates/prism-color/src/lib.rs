//! Prism Color Extraction
//!
//! Turns raw artwork bytes into a single representative color:
//! - Prominent mode quantizes the image palette and keeps the most
//!   populated cluster
//! - Average mode collapses the image to the mean of all pixels
//! - Both modes derive a 0-100 brightness from the mean channel value

mod error;
mod extract;
mod mode;

pub use error::ColorError;
pub use extract::{extract, ColorSample};
pub use mode::ColorMode;

pub type Result<T> = std::result::Result<T, ColorError>;

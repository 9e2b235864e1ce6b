//! Prism Track Polling
//!
//! Client for the provider's "currently playing" endpoint:
//! - Detects track changes against the previously seen track name
//! - Resolves the lowest-resolution artwork image for new tracks
//! - Handles 401 with a single refresh-and-retry, never more
//! - Fetches artwork bytes for the color extractor

mod error;
mod poller;
mod track;

pub use error::PlayerError;
pub use poller::{PollOutcome, TrackPoller};
pub use track::{Album, ArtworkImage, CurrentlyPlaying, Track};

pub type Result<T> = std::result::Result<T, PlayerError>;

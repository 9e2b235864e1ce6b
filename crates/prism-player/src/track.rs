//! Currently-playing response shapes

use serde::Deserialize;

/// Body of a 200 response from the currently-playing endpoint. `item` is
/// null between tracks.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentlyPlaying {
    #[serde(default)]
    pub item: Option<Track>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Track {
    pub name: String,
    pub album: Album,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Album {
    #[serde(default)]
    pub images: Vec<ArtworkImage>,
}

/// One artwork rendition. The provider lists these largest-first; the size
/// fields are not always populated.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtworkImage {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Pick the smallest rendition by explicit dimensions, falling back to the
/// last list entry when any size field is missing.
pub(crate) fn select_artwork(images: &[ArtworkImage]) -> Option<&ArtworkImage> {
    if images.is_empty() {
        return None;
    }

    if images.iter().all(|image| image.width.is_some() && image.height.is_some()) {
        images.iter().min_by_key(|image| {
            image.width.unwrap_or(0) as u64 * image.height.unwrap_or(0) as u64
        })
    } else {
        images.last()
    }
}

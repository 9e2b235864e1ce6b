//! Currently-playing poller

use prism_auth::{AuthError, SessionAuthenticator};

use crate::track::{select_artwork, CurrentlyPlaying};
use crate::{PlayerError, Result};

const CURRENTLY_PLAYING_PATH: &str = "me/player/currently-playing";

/// What one poll cycle observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// A different track started; artwork may still be absent
    Changed {
        track: String,
        artwork_url: Option<String>,
    },
    /// Same track as the previous poll
    Unchanged,
    /// Nothing is playing, or the session is not usable
    NotPlaying,
}

/// Polls the currently-playing endpoint and tracks what it saw last.
pub struct TrackPoller {
    http: reqwest::Client,
    endpoint: String,
    previous_track: Option<String>,
    artwork_url: Option<String>,
}

impl TrackPoller {
    pub fn new(api_base_url: &str) -> Self {
        let mut endpoint = api_base_url.to_string();
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }
        endpoint.push_str(CURRENTLY_PLAYING_PATH);

        Self {
            http: reqwest::Client::new(),
            endpoint,
            previous_track: None,
            artwork_url: None,
        }
    }

    pub fn previous_track(&self) -> Option<&str> {
        self.previous_track.as_deref()
    }

    /// Artwork reference of the most recently seen track.
    pub fn artwork_url(&self) -> Option<&str> {
        self.artwork_url.as_deref()
    }

    /// Query the currently-playing endpoint once. A 401 triggers a single
    /// refresh-and-retry; everything else maps straight to an outcome.
    pub async fn poll(&mut self, auth: &mut SessionAuthenticator) -> Result<PollOutcome> {
        if !auth.token_usable() {
            return Ok(PollOutcome::NotPlaying);
        }

        let mut retried = false;
        loop {
            let token = auth.access_token().unwrap_or_default().to_string();
            let response = self.http.get(&self.endpoint).bearer_auth(token).send().await?;

            match response.status().as_u16() {
                200 => {
                    let body = response.text().await?;
                    let playing = if body.trim().is_empty() {
                        None
                    } else {
                        Some(serde_json::from_str::<CurrentlyPlaying>(&body)?)
                    };
                    return Ok(self.interpret(playing));
                }
                204 => {
                    self.clear();
                    return Ok(PollOutcome::NotPlaying);
                }
                401 => {
                    auth.mark_unauthenticated();
                    if retried {
                        return Err(PlayerError::Auth(AuthError::NotAuthenticated));
                    }
                    auth.refresh().await.map_err(PlayerError::Auth)?;
                    retried = true;
                    tracing::debug!("Retrying poll after token refresh");
                }
                other => return Err(PlayerError::Status(other)),
            }
        }
    }

    /// Download artwork bytes for the color extractor.
    pub async fn fetch_artwork(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    fn interpret(&mut self, playing: Option<CurrentlyPlaying>) -> PollOutcome {
        let track = match playing.and_then(|p| p.item) {
            Some(track) => track,
            None => {
                self.clear();
                return PollOutcome::NotPlaying;
            }
        };

        if self.previous_track.as_deref() == Some(track.name.as_str()) {
            return PollOutcome::Unchanged;
        }

        let artwork_url = select_artwork(&track.album.images).map(|image| image.url.clone());
        self.previous_track = Some(track.name.clone());
        self.artwork_url = artwork_url.clone();
        tracing::info!(track = %track.name, "Track changed");

        PollOutcome::Changed {
            track: track.name,
            artwork_url,
        }
    }

    fn clear(&mut self) {
        self.previous_track = None;
        self.artwork_url = None;
    }
}

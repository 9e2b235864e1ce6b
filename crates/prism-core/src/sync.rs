//! Sync loop state machine
//!
//! ```text
//! AwaitingBulb
//!   | tick
//! Connecting
//!   | bulb connected        | bulb failed
//! Active                    Degraded (terminal)
//! ```
//!
//! One cooperative timer drives the loop; a tick performs at most one poll
//! cycle and the next tick is only scheduled after it completes.

use std::time::Duration;

use prism_auth::{SessionAuthenticator, SessionCheck};
use prism_bulb::BulbController;
use prism_color::ColorMode;
use prism_player::{PlayerError, PollOutcome, TrackPoller};

use crate::config::Config;
use crate::status::StatusSink;
use crate::Result;

const CONNECT_TICK: Duration = Duration::from_millis(200);
const ACTIVE_TICK: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// First tick pending; lets the front end render its banner first
    AwaitingBulb,
    /// One bulb connection attempt in progress
    Connecting,
    /// Bulb unreachable; nothing further is scheduled
    Degraded,
    /// Steady-state polling
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    Tick,
    BulbConnected,
    BulbFailed,
}

impl SyncState {
    /// Pure transition function; Degraded absorbs everything.
    pub fn next(self, event: SyncEvent) -> SyncState {
        match (self, event) {
            (SyncState::AwaitingBulb, SyncEvent::Tick) => SyncState::Connecting,
            (SyncState::Connecting, SyncEvent::BulbConnected) => SyncState::Active,
            (SyncState::Connecting, SyncEvent::BulbFailed) => SyncState::Degraded,
            (SyncState::Degraded, _) => SyncState::Degraded,
            (state, _) => state,
        }
    }

    /// Delay before the next tick; `None` stops the schedule.
    pub fn tick_interval(&self) -> Option<Duration> {
        match self {
            SyncState::AwaitingBulb | SyncState::Connecting => Some(CONNECT_TICK),
            SyncState::Active => Some(ACTIVE_TICK),
            SyncState::Degraded => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncState::AwaitingBulb => "awaiting-bulb",
            SyncState::Connecting => "connecting",
            SyncState::Degraded => "degraded",
            SyncState::Active => "active",
        }
    }
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The orchestrator: drives poll, extract and apply from a single timer,
/// reporting transitions through the status sink.
pub struct SyncLoop<S: StatusSink> {
    auth: SessionAuthenticator,
    poller: TrackPoller,
    bulb: BulbController,
    sink: S,
    state: SyncState,
    /// Bytes of the most recently fetched artwork, kept for mode changes.
    last_artwork: Option<Vec<u8>>,
}

impl<S: StatusSink> SyncLoop<S> {
    pub fn new(config: &Config, auth: SessionAuthenticator, sink: S) -> Self {
        Self {
            auth,
            poller: TrackPoller::new(&config.api_base_url),
            bulb: BulbController::new(&config.bulb_addr, config.min_brightness),
            sink,
            state: SyncState::AwaitingBulb,
            last_artwork: None,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn tick_interval(&self) -> Option<Duration> {
        self.state.tick_interval()
    }

    pub fn mode(&self) -> ColorMode {
        self.auth.mode()
    }

    /// Run one scheduled tick for the current state.
    pub async fn tick(&mut self) -> Result<()> {
        match self.state {
            SyncState::AwaitingBulb => {
                self.sink.publish(
                    "Attempting to connect to bulb, the application may freeze for a moment.",
                );
                self.state = self.state.next(SyncEvent::Tick);
                Ok(())
            }
            SyncState::Connecting => self.connect_bulb().await,
            SyncState::Active => self.run_cycle().await,
            SyncState::Degraded => Ok(()),
        }
    }

    /// Check the session and, when required, run interactive sign-in.
    pub async fn sign_in(&mut self) -> Result<()> {
        let check = self.auth.check_session().await?;
        let entry = match check {
            SessionCheck::Valid => "Token still valid, you are signed in.",
            SessionCheck::Refreshed => "Token refreshed, you are signed in.",
            SessionCheck::NoTokens => "No access token found, please sign in.",
            SessionCheck::Expired => "Token expired, please sign in.",
        };
        self.sink.publish(entry);

        if !check.is_authenticated() {
            match self.auth.authorize().await {
                Ok(()) => {
                    self.sink
                        .publish("Authorization successful, you are now signed in.");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Authorization failed");
                    self.sink.publish("Authorization failed, please try again.");
                }
            }
        }

        Ok(())
    }

    /// Switch extraction mode, persist it, and re-apply the most recent
    /// artwork immediately, independent of the timer.
    pub async fn set_mode(&mut self, mode: ColorMode) -> Result<()> {
        self.auth.set_mode(mode)?;
        self.sink
            .publish(&format!("Mode set to {}", mode.display_name()));
        self.apply_color().await
    }

    async fn connect_bulb(&mut self) -> Result<()> {
        match self.bulb.connect().await {
            Ok(()) => {
                self.state = self.state.next(SyncEvent::BulbConnected);
                self.sink.publish("Connected to bulb");
                self.sign_in().await
            }
            Err(e) => {
                tracing::warn!(error = %e, "Bulb connection failed");
                self.state = self.state.next(SyncEvent::BulbFailed);
                self.sink.publish(
                    "Failed to connect to bulb. Check the bulb address in the settings file and restart.",
                );
                Ok(())
            }
        }
    }

    /// One steady-state cycle: consult the session, poll, and on a track
    /// change fetch artwork and push its color.
    async fn run_cycle(&mut self) -> Result<()> {
        let check = self.auth.check_session().await?;
        if !check.is_authenticated() {
            return Ok(());
        }

        match self.poller.poll(&mut self.auth).await {
            Ok(PollOutcome::Changed { track, artwork_url }) => {
                let Some(url) = artwork_url else {
                    tracing::debug!(%track, "Track carries no artwork");
                    return Ok(());
                };
                match self.poller.fetch_artwork(&url).await {
                    Ok(bytes) => {
                        self.last_artwork = Some(bytes);
                        self.apply_color().await?;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Artwork fetch failed");
                        self.sink.publish(&format!("Error: {e}"));
                    }
                }
            }
            Ok(PollOutcome::Unchanged) | Ok(PollOutcome::NotPlaying) => {}
            Err(PlayerError::Auth(e)) => {
                tracing::warn!(error = %e, "Poll hit an authentication error");
                self.sink
                    .publish("Error: failed to refresh token, please sign in again.");
            }
            Err(e) => {
                // Transient; skip this cycle and keep the schedule.
                tracing::warn!(error = %e, "Poll failed");
                self.sink.publish(&format!("Error: {e}"));
            }
        }

        Ok(())
    }

    /// Extract a color from the most recent artwork and push it to the bulb.
    async fn apply_color(&mut self) -> Result<()> {
        let Some(bytes) = self.last_artwork.as_deref() else {
            return Ok(());
        };

        let mode = self.auth.mode();
        let sample = match prism_color::extract(bytes, mode) {
            Ok(sample) => sample,
            Err(e) => {
                tracing::warn!(error = %e, "Artwork decode failed");
                self.sink.publish(&format!("Error: {e}"));
                return Ok(());
            }
        };

        match self.bulb.set_color(sample.rgb, sample.brightness).await {
            Ok(()) => {
                let song = self
                    .poller
                    .previous_track()
                    .unwrap_or("(unknown)")
                    .to_string();
                let (r, g, b) = sample.rgb;
                self.sink.publish(&format!(
                    "Song: {song}\nColor: {r}, {g}, {b} Brightness: {}\nMode: {}",
                    sample.brightness,
                    mode.display_name()
                ));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Bulb update failed");
                self.sink.publish(&format!("Error: {e}"));
            }
        }

        Ok(())
    }
}

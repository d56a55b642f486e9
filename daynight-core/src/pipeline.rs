//! One locate → fetch → forward run per "ready" signal.

use chrono::TimeZone;
use tracing::{debug, warn};

use crate::{
    error::{Stage, SyncError},
    fetcher::SunTimeFetcher,
    forwarder::{MessageChannel, forward},
    location::{LocationProvider, PositionOptions, locate},
    model::OutboundMessage,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceState {
    Idle,
    AwaitingLocation,
    AwaitingSunData,
    Forwarding,
    Done,
    Failed(Stage),
}

impl SequenceState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SequenceState::Done | SequenceState::Failed(_))
    }
}

/// Result of a single run. `message` is only present when `state` is `Done`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceReport {
    pub state: SequenceState,
    pub message: Option<OutboundMessage>,
    pub error: Option<SyncError>,
}

impl SequenceReport {
    fn done(message: OutboundMessage) -> Self {
        Self { state: SequenceState::Done, message: Some(message), error: None }
    }

    fn failed(error: SyncError) -> Self {
        Self { state: SequenceState::Failed(error.stage()), message: None, error: Some(error) }
    }

    pub fn is_done(&self) -> bool {
        self.state == SequenceState::Done
    }
}

/// Owns the three stage adapters. Runs share nothing but these.
#[derive(Debug)]
pub struct Companion {
    location: Box<dyn LocationProvider>,
    fetcher: SunTimeFetcher,
    channel: Box<dyn MessageChannel>,
    options: PositionOptions,
}

impl Companion {
    pub fn new(
        location: Box<dyn LocationProvider>,
        fetcher: SunTimeFetcher,
        channel: Box<dyn MessageChannel>,
        options: PositionOptions,
    ) -> Self {
        Self { location, fetcher, channel, options }
    }

    /// Handle a "ready" signal, converting sun times to the wall clock of `tz`.
    pub async fn on_ready<Tz: TimeZone>(&self, tz: &Tz) -> SequenceReport {
        match self.run(tz).await {
            Ok(message) => SequenceReport::done(message),
            Err(err) => {
                debug!(stage = %err.stage(), "sequence failed");
                SequenceReport::failed(err)
            }
        }
    }

    async fn run<Tz: TimeZone>(&self, tz: &Tz) -> Result<OutboundMessage, SyncError> {
        let mut state = SequenceState::Idle;

        transition(&mut state, SequenceState::AwaitingLocation);
        let position = locate(self.location.as_ref(), &self.options).await.map_err(|e| {
            warn!(error = %e, "Error requesting location!");
            SyncError::from(e)
        })?;
        debug!(coords = %position.coords, "location acquired");

        transition(&mut state, SequenceState::AwaitingSunData);
        let times = self.fetcher.fetch(&position.coords, tz).await?;

        transition(&mut state, SequenceState::Forwarding);
        let message = forward(self.channel.as_ref(), times).await?;

        transition(&mut state, SequenceState::Done);
        Ok(message)
    }
}

fn transition(state: &mut SequenceState, next: SequenceState) {
    debug!(from = ?state, to = ?next, "sequence transition");
    *state = next;
}

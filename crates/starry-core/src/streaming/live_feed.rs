//! State machine for the live log feed.
//!
//! `Disconnected -> Connecting -> Connected -> Disconnected`. Reconnecting is
//! always an explicit operator action. Every socket gets a generation number
//! and signals from a superseded socket are ignored.

use std::fmt;

use crate::models::LogEvent;
use crate::store::LogList;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for FeedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        })
    }
}

/// What the socket task reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    Opened,
    Message(String),
    Closed,
    Error(String),
}

/// A [`FeedEvent`] tagged with the socket it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSignal {
    pub generation: u64,
    pub event: FeedEvent,
}

/// Result of applying one signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedOutcome {
    /// Signal belonged to an older socket
    Stale,
    /// State moved (or stayed) here
    State(FeedState),
    /// Connection failed or broke
    Failed(String),
    /// One row was prepended to the log list
    Prepended,
    /// Payload was not a log event; nothing changed
    Malformed,
}

#[derive(Debug, Default)]
pub struct LiveFeed {
    state: FeedState,
    generation: u64,
    received: u64,
}

impl LiveFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> FeedState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Messages prepended since the feed was created
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Begin a new connection. Returns the generation the socket task must
    /// tag its signals with, or `None` while a socket is already opening or open.
    pub fn connect(&mut self) -> Option<u64> {
        if self.state != FeedState::Disconnected {
            tracing::debug!(state = %self.state, "live feed connect ignored");
            return None;
        }
        self.generation += 1;
        self.state = FeedState::Connecting;
        Some(self.generation)
    }

    fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    pub fn on_open(&mut self, generation: u64) -> FeedOutcome {
        if !self.is_current(generation) {
            return FeedOutcome::Stale;
        }
        if self.state == FeedState::Connecting {
            self.state = FeedState::Connected;
            tracing::info!(generation, "live log feed open");
        }
        FeedOutcome::State(self.state)
    }

    pub fn on_close(&mut self, generation: u64) -> FeedOutcome {
        if !self.is_current(generation) {
            return FeedOutcome::Stale;
        }
        self.state = FeedState::Disconnected;
        tracing::info!(generation, "live log feed closed");
        FeedOutcome::State(self.state)
    }

    pub fn on_error(&mut self, generation: u64, message: String) -> FeedOutcome {
        if !self.is_current(generation) {
            return FeedOutcome::Stale;
        }
        self.state = FeedState::Disconnected;
        tracing::warn!(generation, error = %message, "live log feed failed");
        FeedOutcome::Failed(message)
    }

    /// Parse one pushed payload and prepend it to `logs`. Malformed payloads
    /// are dropped and the feed stays connected.
    pub fn on_message(&mut self, generation: u64, raw: &str, logs: &mut LogList) -> FeedOutcome {
        if !self.is_current(generation) || self.state != FeedState::Connected {
            return FeedOutcome::Stale;
        }
        match LogEvent::from_push(raw) {
            Ok(event) => {
                logs.prepend(event);
                self.received += 1;
                FeedOutcome::Prepended
            }
            Err(err) => {
                tracing::debug!(error = %err, "dropping push payload");
                FeedOutcome::Malformed
            }
        }
    }

    pub fn apply(&mut self, signal: FeedSignal, logs: &mut LogList) -> FeedOutcome {
        let FeedSignal { generation, event } = signal;
        match event {
            FeedEvent::Opened => self.on_open(generation),
            FeedEvent::Message(raw) => self.on_message(generation, &raw, logs),
            FeedEvent::Closed => self.on_close(generation),
            FeedEvent::Error(message) => self.on_error(generation, message),
        }
    }
}

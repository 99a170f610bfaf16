//! # Session Recorder
//!
//! Two-state machine driving session recording:
//!
//! ```text
//!          start()                stop()
//!   Idle ───────────▶ Recording ───────────▶ Idle
//!    │ stop() → InvalidState      │ start() → InvalidState
//! ```
//!
//! Completed sessions are kept newest first. Ids come from a counter that
//! only moves forward, so an id is never handed out twice, even after the
//! session carrying it has been deleted or the store cleared.

use std::collections::{HashSet, VecDeque};
use std::mem;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::{Session, SessionId};
use crate::error::{Result, TelemetryError};
use crate::telemetry::SharedSampler;

/// Externally visible recorder state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecorderStatus {
    Idle,
    Recording,
}

impl std::fmt::Display for RecorderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecorderStatus::Idle => f.write_str("idle"),
            RecorderStatus::Recording => f.write_str("recording"),
        }
    }
}

#[derive(Debug)]
enum RecorderState {
    Idle,
    Recording(Session),
}

/// Tracks the in-progress session and the store of completed ones.
#[derive(Debug)]
pub struct SessionRecorder {
    sampler: SharedSampler,
    state: RecorderState,
    store: VecDeque<Session>,
    next_id: u32,
}

impl SessionRecorder {
    /// Creates an idle recorder with an empty store.
    pub fn new(sampler: SharedSampler) -> Self {
        Self {
            sampler,
            state: RecorderState::Idle,
            store: VecDeque::new(),
            next_id: 1,
        }
    }

    /// Creates an idle recorder holding previously completed sessions.
    ///
    /// `sessions` are stored newest first; new ids continue after the
    /// highest id among them.
    ///
    /// # Errors
    ///
    /// `InvalidHistory` if a session is still open or an id appears twice;
    /// no recorder is built.
    pub fn with_history(sampler: SharedSampler, mut sessions: Vec<Session>) -> Result<Self> {
        let mut seen = HashSet::new();
        for session in &sessions {
            if session.is_recording() {
                return Err(TelemetryError::InvalidHistory {
                    id: session.id,
                    reason: "session was never stopped",
                });
            }
            if !seen.insert(session.id) {
                return Err(TelemetryError::InvalidHistory {
                    id: session.id,
                    reason: "duplicate id",
                });
            }
        }

        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        let next_id = sessions.iter().map(|s| s.id.0).max().map_or(1, |max| max + 1);
        info!("Restored {} sessions, next id {}", sessions.len(), next_id);

        Ok(Self {
            sampler,
            state: RecorderState::Idle,
            store: sessions.into(),
            next_id,
        })
    }

    /// Starts recording now. See [`start_at`](Self::start_at).
    pub fn start(&mut self, name: Option<&str>) -> Result<SessionId> {
        self.start_at(name, Utc::now())
    }

    /// Starts a session at `now`.
    ///
    /// The session is named `Session <id>` when no name, or a blank one,
    /// is given. The sampler's session window is restarted.
    ///
    /// # Errors
    ///
    /// `InvalidState` if a session is already recording; nothing changes.
    pub fn start_at(&mut self, name: Option<&str>, now: DateTime<Utc>) -> Result<SessionId> {
        if let RecorderState::Recording(current) = &self.state {
            warn!("Start requested while session {} is recording", current.id);
            return Err(TelemetryError::InvalidState {
                action: "start",
                state: RecorderStatus::Recording,
            });
        }

        let id = SessionId(self.next_id);
        self.next_id += 1;

        let name = match name.filter(|name| !name.trim().is_empty()) {
            Some(name) => name.to_string(),
            None => format!("Session {}", id),
        };

        self.sampler.borrow_mut().begin_window();
        info!("Recording session {} ({})", id, name);

        self.state = RecorderState::Recording(Session {
            id,
            name,
            started_at: now,
            ended_at: None,
            duration_secs: 0,
            distance: 0.0,
            max_speed: 0.0,
            max_g: 0.0,
            avg_speed: 0.0,
            peaks: Default::default(),
            sample_count: 0,
        });

        Ok(id)
    }

    /// Stops recording now. See [`stop_at`](Self::stop_at).
    pub fn stop(&mut self) -> Result<Session> {
        self.stop_at(Utc::now())
    }

    /// Finalizes the recording session at `now`.
    ///
    /// Duration is the whole seconds elapsed since start, floored and never
    /// negative. Speed, distance and G statistics come from the sampler's
    /// session window. The session is stored at the front of the list.
    ///
    /// # Errors
    ///
    /// `InvalidState` if no session is recording.
    pub fn stop_at(&mut self, now: DateTime<Utc>) -> Result<Session> {
        let mut session = match mem::replace(&mut self.state, RecorderState::Idle) {
            RecorderState::Recording(session) => session,
            RecorderState::Idle => {
                return Err(TelemetryError::InvalidState {
                    action: "stop",
                    state: RecorderStatus::Idle,
                })
            }
        };

        let stats = self.sampler.borrow_mut().end_window();

        session.ended_at = Some(now);
        session.duration_secs = (now - session.started_at).num_seconds().max(0) as u64;
        session.distance = stats.distance;
        session.max_speed = stats.max_speed;
        session.max_g = stats.max_g;
        session.avg_speed = stats.average_speed();
        session.peaks = stats.peaks;
        session.sample_count = stats.sample_count();

        info!(
            "Session {} finished: {} over {:.1} mi, max {:.0} mph, max {:.2}g",
            session.id,
            session.duration_display(),
            session.distance,
            session.max_speed,
            session.max_g
        );

        self.store.push_front(session.clone());
        Ok(session)
    }

    /// Removes a completed session. Returns whether anything was removed.
    pub fn delete(&mut self, id: SessionId) -> bool {
        match self.store.iter().position(|s| s.id == id) {
            Some(index) => {
                self.store.remove(index);
                info!("Deleted session {}", id);
                true
            }
            None => false,
        }
    }

    /// Looks up a completed session.
    ///
    /// # Errors
    ///
    /// `NotFound` if no stored session has this id.
    pub fn get(&self, id: SessionId) -> Result<&Session> {
        self.store
            .iter()
            .find(|s| s.id == id)
            .ok_or(TelemetryError::NotFound(id))
    }

    /// Snapshot of completed sessions, newest first.
    #[must_use]
    pub fn list(&self) -> Vec<Session> {
        self.store.iter().cloned().collect()
    }

    /// Drops every completed session. The id counter is not rewound.
    pub fn clear(&mut self) {
        info!("Clearing {} stored sessions", self.store.len());
        self.store.clear();
    }

    /// The session currently recording, if any.
    #[must_use]
    pub fn current(&self) -> Option<&Session> {
        match &self.state {
            RecorderState::Recording(session) => Some(session),
            RecorderState::Idle => None,
        }
    }

    #[must_use]
    pub fn status(&self) -> RecorderStatus {
        match self.state {
            RecorderState::Idle => RecorderStatus::Idle,
            RecorderState::Recording(_) => RecorderStatus::Recording,
        }
    }

    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.status() == RecorderStatus::Recording
    }

    /// Number of completed sessions stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

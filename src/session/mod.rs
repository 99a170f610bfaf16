//! # Session Module
//!
//! Recording sessions and their summary statistics.
//!
//! This module handles:
//! - Session identity and summary records
//! - Duration formatting for session lists
//! - The Idle/Recording state machine and the newest-first session store

pub mod recorder;

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::telemetry::sample::GForcePeaks;

/// Recorder handle shared by the presenter and the binary
pub type SharedRecorder = Rc<RefCell<recorder::SessionRecorder>>;

/// Unique, monotonically assigned session identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(pub u32);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A bounded recording interval with summary statistics.
///
/// While recording, `ended_at` is `None` and the statistics are zero; they
/// are filled in once when the session is stopped and never change after.
///
/// Stored values are imperial; the presenter hands the back end converted
/// copies (see [`Units::convert_session`](crate::presenter::units::Units::convert_session)).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub id: SessionId,
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Whole seconds between start and stop
    pub duration_secs: u64,
    /// Miles
    pub distance: f64,
    /// mph
    pub max_speed: f64,
    /// Highest combined horizontal G
    pub max_g: f64,
    /// mph
    pub avg_speed: f64,
    pub peaks: GForcePeaks,
    pub sample_count: u64,
}

impl Session {
    /// True until the session has been stopped.
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Duration as `m:ss`.
    #[must_use]
    pub fn duration_display(&self) -> String {
        format_duration(self.duration_secs)
    }
}

/// Formats whole seconds as `m:ss`; minutes are not wrapped into hours.
///
/// # Examples
///
/// ```
/// use pony_telemetry::session::format_duration;
///
/// assert_eq!(format_duration(0), "0:00");
/// assert_eq!(format_duration(30), "0:30");
/// assert_eq!(format_duration(1542), "25:42");
/// ```
#[must_use]
pub fn format_duration(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

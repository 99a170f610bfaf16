//! # Error Types
//!
//! Custom error types for Pony Telemetry using `thiserror`.

use thiserror::Error;

use crate::presenter::backend::View;
use crate::session::recorder::RecorderStatus;
use crate::session::SessionId;

/// Main error type for Pony Telemetry
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Session start/stop called out of order. Nothing was changed.
    #[error("Invalid state: cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: RecorderStatus,
    },

    /// No session with this id is stored
    #[error("Session {0} not found")]
    NotFound(SessionId),

    /// Restored session history would break the store invariants
    #[error("Cannot restore session {id}: {reason}")]
    InvalidHistory {
        id: SessionId,
        reason: &'static str,
    },

    /// The rendering back end cannot draw this view right now
    #[error("Render back end unavailable for {0} view")]
    BackendUnavailable(View),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Render stream serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for Pony Telemetry
pub type Result<T> = std::result::Result<T, TelemetryError>;

//! Session events emitted by the state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events emitted by the state machine during transitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Hotkey pressed, a recording session began
    RecordingStarted { at: DateTime<Utc> },

    /// Hotkey released (or hook lost), the recording session ended
    RecordingStopped {
        at: DateTime<Utc>,
        /// How long the session was active
        duration_ms: u64,
    },

    /// The OS refused the hotkey hook; the user must grant permission
    PermissionRequired { at: DateTime<Utc> },
}

impl SessionEvent {
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            SessionEvent::RecordingStarted { at }
            | SessionEvent::RecordingStopped { at, .. }
            | SessionEvent::PermissionRequired { at } => *at,
        }
    }
}

impl std::fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionEvent::RecordingStarted { .. } => write!(f, "RECORDING_STARTED"),
            SessionEvent::RecordingStopped { duration_ms, .. } => {
                write!(f, "RECORDING_STOPPED ({}ms)", duration_ms)
            }
            SessionEvent::PermissionRequired { .. } => write!(f, "PERMISSION_REQUIRED"),
        }
    }
}

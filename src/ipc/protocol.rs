//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian length.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::events::SessionEvent;
use crate::state::State;

/// Largest accepted message body
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Current operating mode of the daemon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// No active session, waiting for hotkey
    #[default]
    Idle,
    /// Hotkey held, recording
    Recording,
    /// Accessibility permission must be granted before the hotkey works
    PermissionRequired,
}

/// Requests from UI to daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Request current daemon status
    GetStatus,

    /// Ping to check connectivity
    Ping,

    /// Subscribe to session event notifications
    Subscribe,
}

/// Responses from daemon to UI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Current daemon status
    Status(DaemonStatus),

    /// Pong response to ping
    Pong,

    /// Subscription confirmed
    Subscribed,

    /// Error response
    Error { code: String, message: String },
}

/// Push notification from daemon to UI (for subscribed clients)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// Session event occurred
    Session { event: SessionEvent },
}

/// Full daemon status snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonStatus {
    /// Daemon version
    pub version: String,

    /// Configured hotkey, e.g. "Control+Option"
    pub hotkey: String,

    /// Current mode
    pub mode: Mode,

    /// Whether the hotkey hook is registered
    pub hotkey_registered: bool,

    /// When the last session event happened
    pub last_event_at: Option<DateTime<Utc>>,

    /// Uptime in seconds
    pub uptime_secs: u64,
}

impl Default for DaemonStatus {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            hotkey: String::new(),
            mode: Mode::default(),
            hotkey_registered: false,
            last_event_at: None,
            uptime_secs: 0,
        }
    }
}

/// Convert internal State to IPC Mode
impl From<State> for Mode {
    fn from(state: State) -> Self {
        match state {
            State::Idle => Mode::Idle,
            State::Recording { .. } => Mode::Recording,
            State::PermissionRequired => Mode::PermissionRequired,
        }
    }
}

/// Mode the daemon is in right after the given event
impl From<&SessionEvent> for Mode {
    fn from(event: &SessionEvent) -> Self {
        match event {
            SessionEvent::RecordingStarted { .. } => Mode::Recording,
            SessionEvent::RecordingStopped { .. } => Mode::Idle,
            SessionEvent::PermissionRequired { .. } => Mode::PermissionRequired,
        }
    }
}

/// Read one length-prefixed message body
///
/// Returns `None` when the peer closed the connection between messages.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        bail!("message too large: {} bytes", len);
    }

    let mut msg_buf = vec![0u8; len];
    reader.read_exact(&mut msg_buf).await?;
    Ok(Some(msg_buf))
}

/// Send a length-prefixed JSON message
pub async fn write_frame<W, T>(writer: &mut W, msg: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let msg_bytes = serde_json::to_vec(msg)?;
    let msg_len = (msg_bytes.len() as u32).to_le_bytes();

    writer.write_all(&msg_len).await?;
    writer.write_all(&msg_bytes).await?;
    writer.flush().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_request_serialization() {
        let json = serde_json::to_string(&Request::GetStatus).unwrap();
        assert_eq!(json, r#"{"type":"get_status"}"#);
    }

    #[test]
    fn test_response_serialization() {
        let resp = Response::Status(DaemonStatus::default());
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains(r#""type":"status""#));
        assert!(json.contains(r#""mode":"idle""#));
    }

    #[test]
    fn test_notification_nests_event() {
        let notification = Notification::Session {
            event: SessionEvent::PermissionRequired {
                at: DateTime::<Utc>::from_timestamp_millis(0).unwrap(),
            },
        };
        let json = serde_json::to_string(&notification).unwrap();
        assert!(json.starts_with(r#"{"type":"session","event":{"type":"permission_required""#));
    }

    #[test]
    fn test_mode_from_state() {
        let started_at = Utc::now();
        assert_eq!(Mode::from(State::Recording { started_at }), Mode::Recording);
        assert_eq!(Mode::from(State::PermissionRequired), Mode::PermissionRequired);
    }

    #[tokio::test]
    async fn test_frame_exchange() {
        let (mut client, mut server) = tokio::io::duplex(1024);

        assert_ok!(write_frame(&mut client, &Request::Ping).await);
        let frame = read_frame(&mut server).await.unwrap().unwrap();
        let request: Request = serde_json::from_slice(&frame).unwrap();
        assert!(matches!(request, Request::Ping));

        drop(client);
        assert!(read_frame(&mut server).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let (mut client, mut server) = tokio::io::duplex(64);

        let len = (MAX_FRAME_LEN as u32 + 1).to_le_bytes();
        client.write_all(&len).await.unwrap();
        assert_err!(read_frame(&mut server).await);
    }
}

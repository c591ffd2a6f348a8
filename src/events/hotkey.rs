//! Immutable hotkey event records
//!
//! Each record carries only the instant at which the OS reported the
//! condition. Records of different kinds are distinct types and only meet
//! inside [`HotkeyEvent`], where subscribers dispatch on the variant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Errors raised when building an event record from raw input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(not(test), allow(dead_code))]
pub enum EventError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

macro_rules! hotkey_record {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name {
            at: DateTime<Utc>,
        }

        impl $name {
            /// Create the event for the given instant
            pub fn new(at: DateTime<Utc>) -> Self {
                Self { at }
            }

            /// Create the event from milliseconds since the Unix epoch
            #[cfg_attr(not(test), allow(dead_code))]
            pub fn from_unix_millis(millis: i64) -> Result<Self, EventError> {
                DateTime::<Utc>::from_timestamp_millis(millis)
                    .map(Self::new)
                    .ok_or_else(|| {
                        EventError::InvalidArgument(format!(
                            "timestamp {}ms is out of range",
                            millis
                        ))
                    })
            }

            /// The instant the event occurred
            pub fn at(&self) -> DateTime<Utc> {
                self.at
            }
        }
    };
}

hotkey_record!(
    /// Hotkey registration was refused by the OS for lack of permission
    /// (Accessibility on macOS)
    HotkeyPermissionDeniedEvent
);

hotkey_record!(
    /// The monitored hotkey went from released to pressed
    HotkeyPressedEvent
);

hotkey_record!(
    /// The monitored hotkey went from pressed to released
    HotkeyReleasedEvent
);

/// Events sent from the hotkey listener to its subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HotkeyEvent {
    PermissionDenied(HotkeyPermissionDeniedEvent),
    Pressed(HotkeyPressedEvent),
    Released(HotkeyReleasedEvent),
}

impl HotkeyEvent {
    /// The instant carried by the wrapped record
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            HotkeyEvent::PermissionDenied(e) => e.at(),
            HotkeyEvent::Pressed(e) => e.at(),
            HotkeyEvent::Released(e) => e.at(),
        }
    }
}

impl From<HotkeyPermissionDeniedEvent> for HotkeyEvent {
    fn from(event: HotkeyPermissionDeniedEvent) -> Self {
        HotkeyEvent::PermissionDenied(event)
    }
}

impl From<HotkeyPressedEvent> for HotkeyEvent {
    fn from(event: HotkeyPressedEvent) -> Self {
        HotkeyEvent::Pressed(event)
    }
}

impl From<HotkeyReleasedEvent> for HotkeyEvent {
    fn from(event: HotkeyReleasedEvent) -> Self {
        HotkeyEvent::Released(event)
    }
}

impl std::fmt::Display for HotkeyEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HotkeyEvent::PermissionDenied(e) => {
                write!(f, "HOTKEY_PERMISSION_DENIED ({})", e.at().to_rfc3339())
            }
            HotkeyEvent::Pressed(e) => write!(f, "HOTKEY_PRESSED ({})", e.at().to_rfc3339()),
            HotkeyEvent::Released(e) => write!(f, "HOTKEY_RELEASED ({})", e.at().to_rfc3339()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 5).unwrap() + chrono::Duration::milliseconds(123)
    }

    #[test]
    fn test_permission_denied_keeps_timestamp() {
        let t = instant();
        assert_eq!(HotkeyPermissionDeniedEvent::new(t).at(), t);
    }

    #[test]
    fn test_released_keeps_timestamp() {
        let t = instant();
        assert_eq!(HotkeyReleasedEvent::new(t).at(), t);
    }

    #[test]
    fn test_equal_timestamps_are_equal() {
        let t = instant();
        assert_eq!(HotkeyReleasedEvent::new(t), HotkeyReleasedEvent::new(t));
        assert_eq!(
            HotkeyPermissionDeniedEvent::new(t),
            HotkeyPermissionDeniedEvent::new(t)
        );
        assert_ne!(
            HotkeyReleasedEvent::new(t),
            HotkeyReleasedEvent::new(t + chrono::Duration::milliseconds(1))
        );
    }

    #[test]
    fn test_different_kinds_never_equal() {
        let t = instant();
        let denied = HotkeyEvent::from(HotkeyPermissionDeniedEvent::new(t));
        let released = HotkeyEvent::from(HotkeyReleasedEvent::new(t));
        let pressed = HotkeyEvent::from(HotkeyPressedEvent::new(t));

        assert_ne!(denied, released);
        assert_ne!(pressed, released);
        assert_eq!(denied.at(), released.at());
    }

    #[test]
    fn test_from_unix_millis() {
        let event = HotkeyReleasedEvent::from_unix_millis(1_700_000_000_123).unwrap();
        assert_eq!(event.at().timestamp_millis(), 1_700_000_000_123);
    }

    #[test]
    fn test_from_unix_millis_out_of_range() {
        let err = HotkeyPermissionDeniedEvent::from_unix_millis(i64::MAX).unwrap_err();
        assert!(matches!(err, EventError::InvalidArgument(_)));
    }

    #[test]
    fn test_event_serialization() {
        let event = HotkeyEvent::from(HotkeyReleasedEvent::new(instant()));
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"released""#));
        assert!(json.contains("2024-03-09T14:30:05.123Z"));
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"type":"permission_denied","at":"2024-03-09T14:30:05.123Z"}"#;
        let event: HotkeyEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, HotkeyEvent::from(HotkeyPermissionDeniedEvent::new(instant())));
    }

    #[test]
    fn test_missing_timestamp_rejected() {
        assert!(serde_json::from_str::<HotkeyReleasedEvent>("{}").is_err());
        assert!(serde_json::from_str::<HotkeyEvent>(r#"{"type":"released"}"#).is_err());
        assert!(serde_json::from_str::<HotkeyReleasedEvent>(r#"{"at":null}"#).is_err());
    }

    #[test]
    fn test_display() {
        let event = HotkeyEvent::from(HotkeyPressedEvent::new(instant()));
        assert!(event.to_string().starts_with("HOTKEY_PRESSED"));
    }
}

//! Events module
//!
//! Hotkey events are immutable records published by the hotkey listener.
//! Session events are emitted by the state machine when it reacts to them.

mod hotkey;
mod session;

pub use hotkey::{
    HotkeyEvent, HotkeyPermissionDeniedEvent, HotkeyPressedEvent, HotkeyReleasedEvent,
};
pub use session::SessionEvent;

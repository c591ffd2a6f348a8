//! Stub backend for platforms without a global hotkey hook

use std::sync::atomic::AtomicBool;

use super::keys::Hotkey;
use super::listener::HotkeyError;
use super::publisher::Publisher;

pub fn check_permission() -> Result<(), HotkeyError> {
    Err(HotkeyError::Unsupported)
}

pub fn run_event_loop(
    _hotkey: Hotkey,
    _publisher: &Publisher,
    _running: &AtomicBool,
) -> Result<(), HotkeyError> {
    Err(HotkeyError::Unsupported)
}

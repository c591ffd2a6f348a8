//! Hotkey module for global keyboard event listening
//!
//! Watches modifier keys system-wide, turns the configured hotkey's
//! press/release edges into [`HotkeyEvent`](crate::events::HotkeyEvent)s and
//! reports permission refusals the same way. Uses CGEventTap on macOS.

#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
mod detector;
mod keys;
mod listener;
mod publisher;

#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "macos")]
use macos as platform;

#[cfg(not(target_os = "macos"))]
mod unsupported;
#[cfg(not(target_os = "macos"))]
use unsupported as platform;

pub use keys::Hotkey;
pub use listener::{HotkeyError, HotkeyListener};

//! Publishes timestamped hotkey events to subscribers
//!
//! Called from the hook thread, so sends block instead of awaiting. The
//! `try_` variant is for callers already inside the async runtime.

use tokio::sync::mpsc;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::events::{
    HotkeyEvent, HotkeyPermissionDeniedEvent, HotkeyPressedEvent, HotkeyReleasedEvent,
};

use super::detector::Edge;
use super::listener::HotkeyError;

/// Stamps hotkey events with the current instant and sends them on
#[derive(Debug, Clone)]
pub struct Publisher<C: Clock = SystemClock> {
    event_tx: mpsc::Sender<HotkeyEvent>,
    clock: C,
}

impl Publisher<SystemClock> {
    pub fn new(event_tx: mpsc::Sender<HotkeyEvent>) -> Self {
        Self::with_clock(event_tx, SystemClock)
    }
}

impl<C: Clock> Publisher<C> {
    pub fn with_clock(event_tx: mpsc::Sender<HotkeyEvent>, clock: C) -> Self {
        Self { event_tx, clock }
    }

    /// Hook registration was refused by the OS
    pub fn permission_denied(&self) -> Result<(), HotkeyError> {
        self.send(HotkeyPermissionDeniedEvent::new(self.clock.now()).into())
    }

    /// Non-blocking variant of [`Publisher::permission_denied`]
    pub fn try_permission_denied(&self) -> Result<(), HotkeyError> {
        let event: HotkeyEvent = HotkeyPermissionDeniedEvent::new(self.clock.now()).into();
        debug!(%event, "publishing hotkey event");
        self.event_tx
            .try_send(event)
            .map_err(|_| HotkeyError::ChannelSend)
    }

    #[cfg_attr(not(target_os = "macos"), allow(dead_code))]
    pub fn pressed(&self) -> Result<(), HotkeyError> {
        self.send(HotkeyPressedEvent::new(self.clock.now()).into())
    }

    #[cfg_attr(not(target_os = "macos"), allow(dead_code))]
    pub fn released(&self) -> Result<(), HotkeyError> {
        self.send(HotkeyReleasedEvent::new(self.clock.now()).into())
    }

    /// Publish the event matching a detector edge
    #[cfg_attr(not(target_os = "macos"), allow(dead_code))]
    pub fn edge(&self, edge: Edge) -> Result<(), HotkeyError> {
        match edge {
            Edge::Pressed => self.pressed(),
            Edge::Released => self.released(),
        }
    }

    fn send(&self, event: HotkeyEvent) -> Result<(), HotkeyError> {
        debug!(%event, "publishing hotkey event");
        self.event_tx
            .blocking_send(event)
            .map_err(|_| HotkeyError::ChannelSend)
    }
}

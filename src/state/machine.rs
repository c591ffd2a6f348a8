//! Core state machine implementation
//!
//! Handles transitions between Idle, Recording and PermissionRequired
//! based on the hotkey events published by the listener.

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::events::{
    HotkeyEvent, HotkeyPermissionDeniedEvent, HotkeyPressedEvent, HotkeyReleasedEvent,
    SessionEvent,
};

/// The possible states of the daemon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    /// No active session, waiting for hotkey
    #[default]
    Idle,
    /// Hotkey is held, a session is recording
    Recording { started_at: DateTime<Utc> },
    /// Hotkey hook was refused by the OS
    PermissionRequired,
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            State::Idle => write!(f, "Idle"),
            State::Recording { .. } => write!(f, "Recording"),
            State::PermissionRequired => write!(f, "PermissionRequired"),
        }
    }
}

/// The state machine that manages recording sessions
pub struct StateMachine {
    /// Current state
    state: State,
    /// Channel for emitting session events
    event_tx: broadcast::Sender<SessionEvent>,
}

impl StateMachine {
    /// Create a new state machine
    pub fn new(event_tx: broadcast::Sender<SessionEvent>) -> Self {
        Self {
            state: State::Idle,
            event_tx,
        }
    }

    /// Get the current state
    pub fn state(&self) -> State {
        self.state
    }

    /// Run the state machine, processing hotkey events in the order they
    /// were published
    pub async fn run(&mut self, mut hotkey_rx: mpsc::Receiver<HotkeyEvent>) {
        info!("state machine started in Idle state");

        while let Some(event) = hotkey_rx.recv().await {
            self.handle_event(event);
        }

        info!(state = %self.state(), "state machine stopped");
    }

    /// Dispatch a hotkey event on its kind
    fn handle_event(&mut self, event: HotkeyEvent) {
        debug!(
            %event,
            at = %event.at().to_rfc3339(),
            state = %self.state,
            "hotkey event received"
        );

        match event {
            HotkeyEvent::Pressed(pressed) => self.on_pressed(pressed),
            HotkeyEvent::Released(released) => self.on_released(released),
            HotkeyEvent::PermissionDenied(denied) => self.on_permission_denied(denied),
        }
    }

    fn on_pressed(&mut self, event: HotkeyPressedEvent) {
        match self.state {
            State::Idle | State::PermissionRequired => {
                let at = event.at();
                self.transition_to(State::Recording { started_at: at });
                self.emit(SessionEvent::RecordingStarted { at });
            }
            State::Recording { .. } => {
                debug!("hotkey pressed while already recording, ignoring");
            }
        }
    }

    fn on_released(&mut self, event: HotkeyReleasedEvent) {
        match self.state {
            State::Recording { started_at } => {
                self.stop_recording(started_at, event.at());
                self.transition_to(State::Idle);
            }
            State::Idle | State::PermissionRequired => {
                debug!("hotkey released without a session, ignoring");
            }
        }
    }

    fn on_permission_denied(&mut self, event: HotkeyPermissionDeniedEvent) {
        let at = event.at();
        warn!(at = %at.to_rfc3339(), "hotkey permission denied");

        if let State::Recording { started_at } = self.state {
            self.stop_recording(started_at, at);
        }

        if self.state != State::PermissionRequired {
            self.transition_to(State::PermissionRequired);
        }
        self.emit(SessionEvent::PermissionRequired { at });
    }

    /// Emit the end of a session; the duration is clamped at zero when the
    /// clock went backwards
    fn stop_recording(&self, started_at: DateTime<Utc>, at: DateTime<Utc>) {
        let duration_ms = (at - started_at).num_milliseconds().max(0) as u64;
        self.emit(SessionEvent::RecordingStopped { at, duration_ms });
    }

    /// Perform a state transition
    fn transition_to(&mut self, new_state: State) {
        info!(from = %self.state, to = %new_state, "state transition");
        self.state = new_state;
    }

    fn emit(&self, event: SessionEvent) {
        debug!(?event, "emitting session event");
        let _ = self.event_tx.send(event);
    }
}

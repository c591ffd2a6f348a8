//! Global hotkey listener
//!
//! Runs the platform hook on a dedicated thread and publishes hotkey
//! events to the state machine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::events::HotkeyEvent;

use super::keys::Hotkey;
use super::publisher::Publisher;

/// Checks whether the process may install the keyboard hook
type PermissionCheck = fn() -> Result<(), HotkeyError>;

/// Global hotkey listener that publishes press, release and permission events
pub struct HotkeyListener {
    hotkey: Hotkey,
    publisher: Publisher,
    running: Arc<AtomicBool>,
    check_permission: PermissionCheck,
}

impl HotkeyListener {
    /// Create a new hotkey listener
    pub fn new(hotkey: Hotkey, event_tx: mpsc::Sender<HotkeyEvent>) -> Self {
        Self {
            hotkey,
            publisher: Publisher::new(event_tx),
            running: Arc::new(AtomicBool::new(false)),
            check_permission: super::platform::check_permission,
        }
    }

    /// Start the hotkey listener
    ///
    /// Checks hook permission up front so a refusal is both published as a
    /// [`HotkeyEvent::PermissionDenied`] and returned to the caller. On
    /// success a dedicated thread runs the platform event loop until
    /// `stop()` is called or the program exits.
    pub fn start(&self) -> Result<(), HotkeyError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(HotkeyError::AlreadyRunning);
        }

        if let Err(e) = (self.check_permission)() {
            self.running.store(false, Ordering::SeqCst);
            if matches!(e, HotkeyError::PermissionDenied) {
                if let Err(send_err) = self.publisher.try_permission_denied() {
                    warn!(?send_err, "failed to publish permission denied");
                }
            }
            return Err(e);
        }

        let hotkey = self.hotkey;
        let publisher = self.publisher.clone();
        let running = Arc::clone(&self.running);

        thread::Builder::new()
            .name("hotkey-listener".to_string())
            .spawn(move || {
                info!(%hotkey, "hotkey listener thread started");

                if let Err(e) = super::platform::run_event_loop(hotkey, &publisher, &running) {
                    error!(?e, "hotkey listener error");
                    if matches!(e, HotkeyError::PermissionDenied | HotkeyError::EventTapCreation) {
                        if let Err(send_err) = publisher.permission_denied() {
                            warn!(?send_err, "failed to publish permission denied");
                        }
                    }
                }

                running.store(false, Ordering::SeqCst);
                info!("hotkey listener thread stopped");
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                HotkeyError::ThreadSpawn(e.to_string())
            })?;

        Ok(())
    }

    /// Stop the hotkey listener
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check if the listener is currently running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for HotkeyListener {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Errors that can occur in the hotkey listener
#[derive(Debug, thiserror::Error)]
pub enum HotkeyError {
    #[error("hotkey listener is already running")]
    AlreadyRunning,

    #[cfg_attr(not(target_os = "macos"), allow(dead_code))]
    #[error("permission to monitor the keyboard was denied - grant Accessibility access")]
    PermissionDenied,

    #[cfg_attr(not(target_os = "macos"), allow(dead_code))]
    #[error("failed to create event tap - check Accessibility permissions")]
    EventTapCreation,

    #[error("failed to spawn listener thread: {0}")]
    ThreadSpawn(String),

    #[error("failed to send event to channel")]
    ChannelSend,

    #[cfg_attr(target_os = "macos", allow(dead_code))]
    #[error("global hotkeys are not supported on this platform")]
    Unsupported,
}

//! macOS backend using CGEventTap
//!
//! Monitors system-wide FlagsChanged events on a dedicated thread with its
//! own CFRunLoop. Requires the Accessibility permission.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use core_foundation::runloop::{kCFRunLoopCommonModes, kCFRunLoopDefaultMode, CFRunLoop};
use core_graphics::event::{
    CGEvent, CGEventFlags, CGEventTap, CGEventTapLocation, CGEventTapOptions,
    CGEventTapPlacement, CGEventType,
};
use tracing::{debug, error, info, warn};

use super::detector::HotkeyDetector;
use super::keys::{Hotkey, ModifierState};
use super::listener::HotkeyError;
use super::publisher::Publisher;

#[link(name = "ApplicationServices", kind = "framework")]
extern "C" {
    fn AXIsProcessTrusted() -> u8;
}

/// Messages forwarded from the tap callback to the run loop
enum TapMessage {
    Flags(CGEventFlags),
    Disabled,
}

/// Check whether this process is trusted for Accessibility
pub fn check_permission() -> Result<(), HotkeyError> {
    // SAFETY: AXIsProcessTrusted takes no arguments and only reads process state.
    let trusted = unsafe { AXIsProcessTrusted() } != 0;
    if trusted {
        Ok(())
    } else {
        warn!("process is not trusted for Accessibility");
        Err(HotkeyError::PermissionDenied)
    }
}

/// Run the CFRunLoop with the event tap
pub fn run_event_loop(
    hotkey: Hotkey,
    publisher: &Publisher,
    running: &AtomicBool,
) -> Result<(), HotkeyError> {
    let mut detector = HotkeyDetector::new(hotkey);
    let mut last_state = ModifierState::default();

    let (callback_tx, callback_rx) = std::sync::mpsc::channel::<TapMessage>();

    // CGEventTap callback - must be fast and non-blocking
    let callback = move |_proxy: core_graphics::event::CGEventTapProxy,
                         event_type: CGEventType,
                         event: &CGEvent|
                         -> Option<CGEvent> {
        match event_type {
            CGEventType::FlagsChanged => {
                let _ = callback_tx.send(TapMessage::Flags(event.get_flags()));
            }
            CGEventType::TapDisabledByTimeout | CGEventType::TapDisabledByUserInput => {
                let _ = callback_tx.send(TapMessage::Disabled);
            }
            _ => {}
        }
        Some(event.clone())
    };

    let tap = CGEventTap::new(
        CGEventTapLocation::Session,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::ListenOnly,
        vec![CGEventType::FlagsChanged],
        callback,
    )
    .map_err(|_| {
        error!("failed to create event tap - is Accessibility permission granted?");
        HotkeyError::EventTapCreation
    })?;

    tap.enable();

    let run_loop_source = tap
        .mach_port
        .create_runloop_source(0)
        .map_err(|_| HotkeyError::EventTapCreation)?;
    let run_loop = CFRunLoop::get_current();

    unsafe {
        run_loop.add_source(&run_loop_source, kCFRunLoopCommonModes);
    }

    info!(%hotkey, "event tap created and enabled");

    while running.load(Ordering::SeqCst) {
        // Run the loop for a short interval, then drain the callback channel
        CFRunLoop::run_in_mode(
            unsafe { kCFRunLoopDefaultMode },
            Duration::from_millis(100),
            true,
        );

        while let Ok(message) = callback_rx.try_recv() {
            match message {
                TapMessage::Flags(flags) => {
                    let state = ModifierState::from_flags(flags);
                    if state == last_state {
                        continue;
                    }
                    debug!(?last_state, ?state, "modifier state changed");
                    last_state = state;

                    if let Some(edge) = detector.update(&state) {
                        publisher.edge(edge)?;
                    }
                }
                TapMessage::Disabled => {
                    warn!("event tap disabled by the system, re-enabling");
                    tap.enable();
                }
            }
        }
    }

    Ok(())
}

//! hotkey-daemon: Background daemon publishing global hotkey events
//!
//! This daemon runs as a LaunchAgent and provides:
//! - Global hotkey detection via CGEventTap, published as immutable
//!   pressed/released/permission-denied events
//! - A state machine that turns those events into recording sessions
//! - IPC server for menu bar app communication
//!
//! Delivery guarantees: hotkey events reach the state machine over a bounded
//! FIFO channel in publication order. Session events are broadcast; each IPC
//! subscriber sees them in order, and a lagging subscriber skips the oldest.

mod clock;
mod config;
mod events;
mod hotkey;
mod ipc;
mod lifecycle;
mod state;

use anyhow::{Context, Result};
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::events::{HotkeyEvent, SessionEvent};
use crate::hotkey::{HotkeyError, HotkeyListener};
use crate::ipc::Server;
use crate::lifecycle::ShutdownSignal;
use crate::state::StateMachine;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "hotkey-daemon starting");

    let config = Config::load()?;
    config.ensure_dirs()?;
    info!(?config.socket_path, hotkey = %config.hotkey, "configuration loaded");

    let mut shutdown = ShutdownSignal::register().context("failed to register signal handlers")?;

    // Hotkey listener -> State machine
    let (hotkey_tx, hotkey_rx) = mpsc::channel::<HotkeyEvent>(32);
    // State machine -> IPC server and its subscribers
    let (event_tx, _event_rx) = broadcast::channel::<SessionEvent>(64);

    let mut state_machine = StateMachine::new(event_tx.clone());

    let server = Server::new(&config.socket_path, event_tx.clone())?;
    let mut ipc_event_rx = event_tx.subscribe();

    // Runs on a dedicated thread; a permission refusal is also published
    // to the state machine as a PermissionDenied event
    let hotkey_listener = HotkeyListener::new(config.hotkey, hotkey_tx);
    match hotkey_listener.start() {
        Ok(()) => {
            info!("hotkey listener started");
        }
        Err(HotkeyError::PermissionDenied) => {
            warn!("continuing without hotkey support - grant Accessibility permission and restart");
        }
        Err(e) => {
            error!(?e, "failed to start hotkey listener");
            warn!("continuing without hotkey support");
        }
    }
    server
        .set_hotkey(&config.hotkey, hotkey_listener.is_running())
        .await;

    info!("daemon initialized, entering main loop");

    tokio::select! {
        _ = state_machine.run(hotkey_rx) => {
            info!("state machine exited");
        }

        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        // Keep the IPC status snapshot in sync with session events
        _ = async {
            loop {
                match ipc_event_rx.recv().await {
                    Ok(event) => {
                        info!(%event, "session event");
                        server.apply_event(&event).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "session event receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        } => {
            info!("session event handler exited");
        }

        _ = shutdown.wait() => {
            info!("shutdown signal received");
        }
    }

    info!("shutting down...");

    hotkey_listener.stop();
    server.shutdown().await;

    info!("hotkey-daemon stopped");

    Ok(())
}

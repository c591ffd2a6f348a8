//! Unix domain socket server for IPC
//!
//! Provides request-response communication and push notifications for
//! session events to subscribed clients.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::events::SessionEvent;
use crate::hotkey::Hotkey;

use super::protocol::{
    read_frame, write_frame, DaemonStatus, Mode, Notification, Request, Response,
};

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: UnixListener,
    state: Arc<RwLock<ServerState>>,
    shutdown_tx: broadcast::Sender<()>,
    /// Session events forwarded to subscribed clients
    events: broadcast::Sender<SessionEvent>,
}

/// Shared server state
struct ServerState {
    status: DaemonStatus,
    start_time: std::time::Instant,
}

impl Server {
    /// Create a new IPC server
    pub fn new(socket_path: &Path, events: broadcast::Sender<SessionEvent>) -> Result<Self> {
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // Set socket permissions to owner-only (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))
                .context("failed to set socket permissions")?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        let state = Arc::new(RwLock::new(ServerState {
            status: DaemonStatus::default(),
            start_time: std::time::Instant::now(),
        }));

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener,
            state,
            shutdown_tx,
            events,
        })
    }

    /// Record the configured hotkey and whether its hook is registered
    pub async fn set_hotkey(&self, hotkey: &Hotkey, registered: bool) {
        let mut state = self.state.write().await;
        state.status.hotkey = hotkey.to_string();
        state.status.hotkey_registered = registered;
    }

    /// Update the status snapshot from a session event
    pub async fn apply_event(&self, event: &SessionEvent) {
        let mut state = self.state.write().await;
        let old_mode = state.status.mode;
        let new_mode = Mode::from(event);

        state.status.mode = new_mode;
        state.status.last_event_at = Some(event.at());
        state.status.hotkey_registered = new_mode != Mode::PermissionRequired;

        if old_mode != new_mode {
            info!(from = ?old_mode, to = ?new_mode, "IPC server: mode updated");
        }
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let state = Arc::clone(&self.state);
                    let events = self.events.clone();
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = Self::handle_client(stream, state, events) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Handle a single client connection
    ///
    /// Frames are read on a separate task so a subscribed client can receive
    /// notifications while no request is pending.
    async fn handle_client(
        stream: UnixStream,
        state: Arc<RwLock<ServerState>>,
        events: broadcast::Sender<SessionEvent>,
    ) -> Result<()> {
        let (mut reader, mut writer) = stream.into_split();
        let (frame_tx, mut frame_rx) = mpsc::channel::<Vec<u8>>(8);

        let _reader = AbortOnDrop(tokio::spawn(async move {
            loop {
                match read_frame(&mut reader).await {
                    Ok(Some(frame)) => {
                        if frame_tx.send(frame).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        debug!("client disconnected");
                        break;
                    }
                    Err(e) => {
                        warn!(?e, "failed to read frame, disconnecting");
                        break;
                    }
                }
            }
        }));

        let mut subscription: Option<broadcast::Receiver<SessionEvent>> = None;

        loop {
            tokio::select! {
                frame = frame_rx.recv() => {
                    let Some(frame) = frame else {
                        break Ok(());
                    };

                    let response = match serde_json::from_slice::<Request>(&frame) {
                        Ok(request) => {
                            debug!(?request, "received request");
                            let (response, subscribe) = Self::process_request(request, &state).await;
                            if subscribe && subscription.is_none() {
                                subscription = Some(events.subscribe());
                                debug!("client subscribed to notifications");
                            }
                            response
                        }
                        Err(e) => Response::Error {
                            code: "bad_request".to_string(),
                            message: e.to_string(),
                        },
                    };

                    if let Err(e) = write_frame(&mut writer, &response).await {
                        break Err(e);
                    }
                }

                event = next_event(&mut subscription) => {
                    match event {
                        Ok(event) => {
                            let notification = Notification::Session { event };
                            if let Err(e) = write_frame(&mut writer, &notification).await {
                                break Err(e);
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!(skipped = n, "client notification receiver lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            subscription = None;
                        }
                    }
                }
            }
        }
    }

    /// Process a request and return a response
    /// Returns (Response, should_subscribe)
    async fn process_request(
        request: Request,
        state: &Arc<RwLock<ServerState>>,
    ) -> (Response, bool) {
        match request {
            Request::Ping => (Response::Pong, false),

            Request::GetStatus => {
                let mut state = state.write().await;
                state.status.uptime_secs = state.start_time.elapsed().as_secs();
                (Response::Status(state.status.clone()), false)
            }

            Request::Subscribe => (Response::Subscribed, true),
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}

/// Aborts the wrapped task when dropped, including when the client handler
/// is cancelled by shutdown
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Wait for the next session event, or forever when not subscribed
async fn next_event(
    subscription: &mut Option<broadcast::Receiver<SessionEvent>>,
) -> Result<SessionEvent, broadcast::error::RecvError> {
    match subscription {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::AsyncWriteExt;

    static NEXT_SOCKET: AtomicUsize = AtomicUsize::new(0);

    fn socket_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!(
                "hotkey-daemon-test-{}-{}",
                std::process::id(),
                NEXT_SOCKET.fetch_add(1, Ordering::SeqCst)
            ))
            .join("daemon.sock")
    }

    async fn start_server() -> (Arc<Server>, broadcast::Sender<SessionEvent>, UnixStream) {
        let (events, _) = broadcast::channel(16);
        let path = socket_path();
        let server = Arc::new(Server::new(&path, events.clone()).unwrap());

        let running = Arc::clone(&server);
        tokio::spawn(async move { running.run().await });

        let client = UnixStream::connect(&path).await.unwrap();
        (server, events, client)
    }

    async fn request(client: &mut UnixStream, request: &Request) -> serde_json::Value {
        write_frame(client, request).await.unwrap();
        receive(client).await
    }

    async fn receive(client: &mut UnixStream) -> serde_json::Value {
        let frame = read_frame(client).await.unwrap().unwrap();
        serde_json::from_slice(&frame).unwrap()
    }

    #[tokio::test]
    async fn test_ping() {
        let (server, _events, mut client) = start_server().await;

        let reply = request(&mut client, &Request::Ping).await;
        assert_eq!(reply["type"], "pong");

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_status_reflects_events() {
        let (server, _events, mut client) = start_server().await;

        server.set_hotkey(&Hotkey::default(), true).await;
        let at = DateTime::<Utc>::from_timestamp_millis(1_000).unwrap();
        server.apply_event(&SessionEvent::RecordingStarted { at }).await;

        let reply = request(&mut client, &Request::GetStatus).await;
        assert_eq!(reply["type"], "status");
        assert_eq!(reply["hotkey"], "Control+Option");
        assert_eq!(reply["mode"], "recording");
        assert_eq!(reply["hotkey_registered"], true);

        server.apply_event(&SessionEvent::PermissionRequired { at }).await;
        let reply = request(&mut client, &Request::GetStatus).await;
        assert_eq!(reply["mode"], "permission_required");
        assert_eq!(reply["hotkey_registered"], false);

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_subscriber_receives_notifications_in_order() {
        let (server, events, mut client) = start_server().await;

        let reply = request(&mut client, &Request::Subscribe).await;
        assert_eq!(reply["type"], "subscribed");

        let at = DateTime::<Utc>::from_timestamp_millis(2_000).unwrap();
        events.send(SessionEvent::RecordingStarted { at }).unwrap();
        events
            .send(SessionEvent::RecordingStopped { at, duration_ms: 0 })
            .unwrap();

        let first = receive(&mut client).await;
        assert_eq!(first["type"], "session");
        assert_eq!(first["event"]["type"], "recording_started");

        let second = receive(&mut client).await;
        assert_eq!(second["event"]["type"], "recording_stopped");

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_malformed_request_keeps_connection() {
        let (server, _events, mut client) = start_server().await;

        let body = b"not json";
        client
            .write_all(&(body.len() as u32).to_le_bytes())
            .await
            .unwrap();
        client.write_all(body).await.unwrap();

        let reply = receive(&mut client).await;
        assert_eq!(reply["type"], "error");
        assert_eq!(reply["code"], "bad_request");

        let reply = request(&mut client, &Request::Ping).await;
        assert_eq!(reply["type"], "pong");

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_reader_task_aborted_when_handler_dropped() {
        let (held_tx, held_rx) = tokio::sync::oneshot::channel::<()>();
        let reader = AbortOnDrop(tokio::spawn(async move {
            let _held = held_tx;
            std::future::pending::<()>().await;
        }));

        drop(reader);
        assert!(held_rx.await.is_err());
    }

    #[tokio::test]
    async fn test_shutdown_removes_socket() {
        let (events, _) = broadcast::channel(1);
        let path = socket_path();
        let server = Server::new(&path, events).unwrap();
        assert!(path.exists());

        server.shutdown().await;
        assert!(!path.exists());
    }
}

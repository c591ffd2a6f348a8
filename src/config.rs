//! Configuration loading and management

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::hotkey::Hotkey;

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the Unix domain socket for IPC
    pub socket_path: PathBuf,

    /// Directory for runtime data
    pub data_dir: PathBuf,

    /// Hotkey that starts and stops a recording session
    pub hotkey: Hotkey,
}

impl Config {
    /// Load configuration from environment and defaults
    ///
    /// - `HOTKEY_DAEMON_DATA_DIR` (default `$HOME/.local/share/hotkey-daemon`)
    /// - `HOTKEY_DAEMON_SOCKET` (default `<data_dir>/daemon.sock`)
    /// - `HOTKEY_DAEMON_HOTKEY` (default `Control+Option`)
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let data_dir = match lookup("HOTKEY_DAEMON_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => {
                let home = lookup("HOME").context("HOME is not set")?;
                PathBuf::from(home)
                    .join(".local")
                    .join("share")
                    .join("hotkey-daemon")
            }
        };

        let socket_path = lookup("HOTKEY_DAEMON_SOCKET")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("daemon.sock"));

        let hotkey = match lookup("HOTKEY_DAEMON_HOTKEY") {
            Some(s) => s
                .parse::<Hotkey>()
                .with_context(|| format!("invalid HOTKEY_DAEMON_HOTKEY {:?}", s))?,
            None => Hotkey::default(),
        };

        Ok(Self {
            socket_path,
            data_dir,
            hotkey,
        })
    }

    /// Ensure data directory exists
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("failed to create {}", self.data_dir.display()))?;
        Ok(())
    }
}

//! Single-instance enforcement
//!
//! The first instance listens on a local socket. Later launches connect,
//! forward their arguments as one JSON line and then step aside.

use std::io::{BufRead, BufReader, Write};
use std::thread;

use interprocess::local_socket::{
    GenericFilePath, ListenerOptions, ToFsName, traits::ListenerExt,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::Result;

/// Argument vectors forwarded by later launches
pub type SecondInstanceReceiver = mpsc::UnboundedReceiver<Vec<String>>;

/// Result of asking for the lock
#[derive(Debug)]
pub enum LockOutcome {
    /// This process is the primary instance
    Primary(SecondInstanceReceiver),
    /// Another process already holds the lock and has been signalled
    Secondary,
}

pub trait InstanceLock: Send + Sync {
    fn acquire(&self, argv: &[String]) -> Result<LockOutcome>;

    fn release(&self) {}
}

/// Lock that always succeeds. Each process is its own primary.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInstanceLock;

impl InstanceLock for NoopInstanceLock {
    fn acquire(&self, _argv: &[String]) -> Result<LockOutcome> {
        let (_tx, rx) = mpsc::unbounded_channel();
        Ok(LockOutcome::Primary(rx))
    }
}

/// Lock backed by an `interprocess` local socket
#[derive(Debug, Clone)]
pub struct SocketInstanceLock {
    socket_path: String,
}

impl SocketInstanceLock {
    pub fn new(socket_path: impl Into<String>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    /// Per-application socket in the runtime directory
    pub fn for_app(app_name: &str) -> Self {
        Self::new(default_socket_path(&format!("{app_name}.sock")))
    }

    pub fn socket_path(&self) -> &str {
        &self.socket_path
    }

    fn signal_existing(&self, argv: &[String]) -> bool {
        use interprocess::local_socket::{Stream, traits::Stream as _};

        let Ok(name) = self.socket_path.as_str().to_fs_name::<GenericFilePath>() else {
            return false;
        };

        match Stream::connect(name) {
            Ok(mut stream) => {
                let mut line = serde_json::to_string(argv).unwrap_or_else(|_| "[]".to_string());
                line.push('\n');
                stream.write_all(line.as_bytes()).is_ok()
            }
            Err(_) => false,
        }
    }

    fn listen(&self) -> Result<SecondInstanceReceiver> {
        #[cfg(not(target_os = "windows"))]
        {
            let _ = std::fs::remove_file(&self.socket_path);
        }

        let name = self
            .socket_path
            .as_str()
            .to_fs_name::<GenericFilePath>()?;
        let listener = ListenerOptions::new().name(name).create_sync()?;

        let (tx, rx) = mpsc::unbounded_channel();
        thread::spawn(move || {
            for conn in listener.incoming().filter_map(|c| c.ok()) {
                let tx = tx.clone();
                thread::spawn(move || {
                    let reader = BufReader::new(conn);
                    for line in reader.lines().map_while(std::result::Result::ok) {
                        match serde_json::from_str::<Vec<String>>(line.trim()) {
                            Ok(argv) => {
                                let _ = tx.send(argv);
                            }
                            Err(e) => debug!(error = %e, "ignoring malformed instance message"),
                        }
                    }
                });
            }
        });

        info!(socket = %self.socket_path, "single instance listener started");
        Ok(rx)
    }
}

impl InstanceLock for SocketInstanceLock {
    fn acquire(&self, argv: &[String]) -> Result<LockOutcome> {
        if self.signal_existing(argv) {
            return Ok(LockOutcome::Secondary);
        }

        match self.listen() {
            Ok(rx) => Ok(LockOutcome::Primary(rx)),
            Err(e) => {
                // Lost a race with another launch
                if self.signal_existing(argv) {
                    Ok(LockOutcome::Secondary)
                } else {
                    warn!(error = %e, "could not acquire single-instance lock");
                    Err(e)
                }
            }
        }
    }

    fn release(&self) {
        #[cfg(not(target_os = "windows"))]
        {
            let _ = std::fs::remove_file(&self.socket_path);
        }
    }
}

fn default_socket_path(file_name: &str) -> String {
    #[cfg(target_os = "windows")]
    {
        format!("@{file_name}")
    }
    #[cfg(not(target_os = "windows"))]
    {
        dirs::runtime_dir()
            .or_else(dirs::cache_dir)
            .unwrap_or_else(std::env::temp_dir)
            .join(file_name)
            .to_string_lossy()
            .into_owned()
    }
}

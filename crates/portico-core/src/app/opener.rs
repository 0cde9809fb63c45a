//! Opening URLs in the user's default handler

use std::process::{Command, Stdio};

use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

/// Hands URLs to something outside the application
pub trait ExternalOpener: Send + Sync {
    fn open(&self, url: &Url) -> Result<()>;
}

/// Opens URLs with the platform launcher
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemOpener;

impl ExternalOpener for SystemOpener {
    fn open(&self, url: &Url) -> Result<()> {
        let mut command = launcher(url.as_str());
        debug!(url = %url, "opening externally");
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Other(format!("Failed to open {}: {}", url, e)))?;
        Ok(())
    }
}

#[cfg(target_os = "windows")]
fn launcher(target: &str) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", "", target]);
    command
}

#[cfg(target_os = "macos")]
fn launcher(target: &str) -> Command {
    let mut command = Command::new("open");
    command.arg(target);
    command
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn launcher(target: &str) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(target);
    command
}

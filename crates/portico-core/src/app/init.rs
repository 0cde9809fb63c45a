//! Where the renderer and preload come from

use std::path::{Path, PathBuf};

use url::Url;

use super::window::PreloadScript;
use crate::error::{Error, Result};

/// `development` selects the dev server when one is configured
pub const MODE_ENV: &str = "PORTICO_MODE";
pub const DEV_SERVER_URL_ENV: &str = "PORTICO_DEV_SERVER_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RendererSource {
    /// A running dev server
    DevServer(Url),
    /// A built entry point on disk
    Bundle(PathBuf),
}

impl RendererSource {
    pub fn is_dev_server(&self) -> bool {
        matches!(self, Self::DevServer(_))
    }

    /// Origin of the dev server, if any
    pub fn origin(&self) -> Option<String> {
        match self {
            Self::DevServer(url) => Some(url.origin().ascii_serialization()),
            Self::Bundle(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInitConfig {
    pub renderer: RendererSource,
    pub preload: PreloadScript,
}

impl AppInitConfig {
    /// Read `PORTICO_MODE` and `PORTICO_DEV_SERVER_URL`
    pub fn from_env(base_dir: &Path) -> Result<Self> {
        let mode = std::env::var(MODE_ENV).ok();
        let dev_url = std::env::var(DEV_SERVER_URL_ENV).ok();
        Self::resolve(mode.as_deref(), dev_url.as_deref(), base_dir)
    }

    /// Dev server in development mode when a URL is given, else the bundle
    /// at `base_dir/renderer/dist/index.html`
    pub fn resolve(mode: Option<&str>, dev_url: Option<&str>, base_dir: &Path) -> Result<Self> {
        let renderer = match (mode, dev_url) {
            (Some("development"), Some(url)) if !url.trim().is_empty() => {
                let url = Url::parse(url.trim()).map_err(|e| {
                    Error::ConfigError(format!("invalid {DEV_SERVER_URL_ENV} '{url}': {e}"))
                })?;
                RendererSource::DevServer(url)
            }
            _ => RendererSource::Bundle(default_bundle(base_dir)),
        };

        Ok(Self {
            renderer,
            preload: PreloadScript::Builtin,
        })
    }
}

pub fn default_bundle(base_dir: &Path) -> PathBuf {
    base_dir.join("renderer").join("dist").join("index.html")
}

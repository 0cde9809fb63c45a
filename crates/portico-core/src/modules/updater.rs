//! Release feed check

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::app::AppEvent;
use crate::error::{Error, Result};
use crate::runner::{Enablement, ModuleContext, StartupModule};

/// Newest release published on a channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseInfo {
    pub version: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Where releases are published
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Latest release on `channel`; `None` when nothing was ever published
    async fn latest(&self, channel: &str) -> Result<Option<ReleaseInfo>>;
}

/// Feed served as `{feed_url}/{channel}.json`
#[derive(Debug, Clone)]
pub struct HttpUpdateSource {
    http_client: HttpClient,
    feed_url: Url,
}

impl HttpUpdateSource {
    pub fn new(feed_url: Url) -> Self {
        Self {
            http_client: HttpClient::new(),
            feed_url,
        }
    }

    pub fn parse(feed_url: &str) -> Result<Self> {
        let url = Url::parse(feed_url)
            .map_err(|e| Error::ConfigError(format!("invalid update feed '{feed_url}': {e}")))?;
        Ok(Self::new(url))
    }

    pub fn channel_url(&self, channel: &str) -> Result<Url> {
        let mut base = self.feed_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(&format!("{channel}.json"))
            .map_err(|e| Error::UpdateFailed(format!("bad channel '{channel}': {e}")))
    }
}

#[async_trait]
impl UpdateSource for HttpUpdateSource {
    async fn latest(&self, channel: &str) -> Result<Option<ReleaseInfo>> {
        let url = self.channel_url(channel)?;
        debug!(url = %url, "checking for updates");

        let response = self.http_client.get(url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::UpdateFailed(format!("feed returned {status}: {body}")));
        }

        let release = response
            .json::<ReleaseInfo>()
            .await
            .map_err(|e| Error::UpdateFailed(format!("malformed release info: {e}")))?;
        Ok(Some(release))
    }
}

/// Compare dotted numeric versions; a leading `v` and pre-release suffixes
/// are ignored
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    fn parts(v: &str) -> Vec<u64> {
        v.trim()
            .trim_start_matches('v')
            .split(['-', '+'])
            .next()
            .unwrap_or_default()
            .split('.')
            .map(|p| p.parse().unwrap_or(0))
            .collect()
    }

    let (a, b) = (parts(a), parts(b));
    let len = a.len().max(b.len());
    for i in 0..len {
        let ord = a.get(i).unwrap_or(&0).cmp(b.get(i).unwrap_or(&0));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Checks the release feed once the app is ready
///
/// Without a source the module does nothing.
#[derive(Clone)]
pub struct AutoUpdater {
    source: Option<Arc<dyn UpdateSource>>,
    channel: String,
}

impl std::fmt::Debug for AutoUpdater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoUpdater")
            .field("enabled", &self.source.is_some())
            .field("channel", &self.channel)
            .finish()
    }
}

impl AutoUpdater {
    pub fn new(source: Arc<dyn UpdateSource>, channel: impl Into<String>) -> Self {
        Self {
            source: Some(source),
            channel: channel.into(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            source: None,
            channel: "latest".to_string(),
        }
    }
}

impl StartupModule for AutoUpdater {
    fn name(&self) -> &str {
        "auto-updater"
    }

    fn enable(&self, ctx: &ModuleContext) -> Enablement {
        let Some(source) = self.source.clone() else {
            debug!("no update feed configured");
            return Enablement::done();
        };
        let app = Arc::clone(ctx.app());
        let channel = self.channel.clone();

        Enablement::pending(async move {
            app.when_ready().await;
            if app.is_quitting() {
                return Ok(());
            }
            match source.latest(&channel).await? {
                None => info!(channel = %channel, "no published versions"),
                Some(release) if compare_versions(&release.version, app.version()).is_gt() => {
                    info!(current = app.version(), available = %release.version, "update available");
                    app.emit(AppEvent::UpdateAvailable {
                        version: release.version,
                    });
                }
                Some(release) => {
                    debug!(current = app.version(), latest = %release.version, "up to date")
                }
            }
            Ok(())
        })
    }
}

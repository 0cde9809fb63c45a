//! UI-side discovery of the capabilities a preload step installed

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::{Value, json};
use tracing::{debug, warn};

use super::capability::Capability;
use super::exposed::EXPOSED_NAMES;
use super::key::encode_key;
use super::namespace::UiGlobals;
use crate::app::{AppInfo, MessageBoxResult};
use crate::error::Result;

/// Capabilities available to UI code, keyed by plain name.
///
/// Every entry may be absent; the typed accessors return `None` in that case.
#[derive(Debug, Clone, Default)]
pub struct UiApi {
    entries: BTreeMap<String, Capability>,
}

/// Re-derive the expected keys and collect whichever are bound in `globals`.
///
/// Never fails. A namespace without any binding yields an empty api.
pub fn attach_api_from_globals(globals: &UiGlobals) -> UiApi {
    let mut entries = BTreeMap::new();

    for name in EXPOSED_NAMES {
        let key = encode_key(name);
        match globals.binding(&key) {
            Some(capability) => {
                entries.insert(name.to_string(), capability.clone());
            }
            None => debug!(name, key = %key, "capability not installed"),
        }
    }

    if entries.is_empty() {
        warn!("no bridge capabilities found; running in degraded mode");
    }

    UiApi { entries }
}

impl UiApi {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Capability> {
        self.entries.get(name)
    }

    async fn call(&self, name: &str, args: Vec<Value>) -> Option<Result<Value>> {
        let capability = self.entries.get(name)?;
        Some(capability.call(name, args).await)
    }

    /// Invoke an arbitrary host channel
    pub async fn send(&self, channel: &str, message: Value) -> Option<Result<Value>> {
        self.call("send", vec![json!(channel), message]).await
    }

    /// Record an error entry in the host's error log
    pub async fn log_error(&self, kind: &str, data: Value) -> Option<Result<bool>> {
        let outcome = self.call("logError", vec![json!(kind), data]).await?;
        Some(outcome.map(|v| v.as_bool().unwrap_or(false)))
    }

    pub async fn get_log_path(&self) -> Option<Result<PathBuf>> {
        let outcome = self.call("getLogPath", Vec::new()).await?;
        Some(outcome.and_then(|v| Ok(serde_json::from_value(v)?)))
    }

    pub async fn show_message(&self, message: &str) -> Option<Result<MessageBoxResult>> {
        let outcome = self.call("showMessage", vec![json!(message)]).await?;
        Some(outcome.and_then(|v| Ok(serde_json::from_value(v)?)))
    }

    pub async fn get_app_info(&self) -> Option<Result<AppInfo>> {
        let outcome = self.call("getAppInfo", Vec::new()).await?;
        Some(outcome.and_then(|v| Ok(serde_json::from_value(v)?)))
    }

    pub async fn sha256sum(&self, data: &str) -> Option<Result<String>> {
        let outcome = self.call("sha256sum", vec![json!(data)]).await?;
        Some(outcome.and_then(|v| Ok(serde_json::from_value(v)?)))
    }

    pub fn versions(&self) -> Option<BTreeMap<String, String>> {
        self.entries
            .get("versions")
            .and_then(Capability::as_value)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

//! UI-side health checks over the capability bridge

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::bridge::UiApi;

/// SHA-256 of the empty input
const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Default period of the runtime monitor
pub const DEFAULT_MONITOR_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthChecks {
    /// At least one capability is installed
    pub bridge: bool,
    /// `getLogPath` round-trips through the host
    pub ipc: bool,
    /// `sha256sum` answers correctly
    pub crypto: bool,
    pub versions: bool,
}

impl HealthChecks {
    pub fn all_passed(&self) -> bool {
        self.bridge && self.ipc && self.crypto && self.versions
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResult {
    pub success: bool,
    pub checks: HealthChecks,
    pub errors: Vec<String>,
    pub timestamp: String,
}

/// Runs checks and reports their outcome to the host
#[derive(Debug, Default)]
pub struct HealthChecker {
    last: Mutex<Option<HealthCheckResult>>,
}

async fn check_ipc(api: &UiApi) -> Result<(), String> {
    match api.get_log_path().await {
        Some(Ok(_)) => Ok(()),
        Some(Err(e)) => Err(format!("IPC check failed: {e}")),
        None => Err("getLogPath not available".to_string()),
    }
}

async fn check_crypto(api: &UiApi) -> Result<(), String> {
    match api.sha256sum("").await {
        Some(Ok(hash)) if hash == EMPTY_SHA256 => Ok(()),
        Some(Ok(hash)) => Err(format!("sha256sum returned unexpected digest {hash}")),
        Some(Err(e)) => Err(format!("sha256sum check failed: {e}")),
        None => Err("sha256sum not available".to_string()),
    }
}

impl HealthChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every check, remember the result and report it
    pub async fn perform_health_check(&self, api: &UiApi) -> HealthCheckResult {
        let mut errors = Vec::new();
        let mut checks = HealthChecks {
            bridge: !api.is_empty(),
            ..HealthChecks::default()
        };
        if !checks.bridge {
            errors.push("Bridge API not available".to_string());
        }

        match check_ipc(api).await {
            Ok(()) => checks.ipc = true,
            Err(e) => errors.push(e),
        }
        match check_crypto(api).await {
            Ok(()) => checks.crypto = true,
            Err(e) => errors.push(e),
        }
        checks.versions = api.versions().is_some_and(|v| !v.is_empty());
        if !checks.versions {
            errors.push("versions not available".to_string());
        }

        let result = HealthCheckResult {
            success: errors.is_empty(),
            checks,
            errors,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(result.clone());
        self.report(api, &result).await;
        result
    }

    async fn report(&self, api: &UiApi, result: &HealthCheckResult) {
        let data = json!({
            "type": "health-check",
            "result": result,
            "timestamp": result.timestamp,
        });
        if let Some(Err(e)) = api.log_error("health-check", data).await {
            warn!(error = %e, "failed to report health check");
        }

        if result.success {
            info!(checks = ?result.checks, "health check passed");
        } else {
            error!(errors = ?result.errors, "health check failed");
        }
    }

    pub fn last_check_result(&self) -> Option<HealthCheckResult> {
        self.last
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Forward an uncaught error or rejection to the host error log
    pub async fn report_runtime_error(&self, api: &UiApi, kind: &str, details: Value) {
        let data = json!({
            "kind": kind,
            "details": details,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        match api.log_error("runtime-error", data).await {
            Some(Ok(_)) => {}
            Some(Err(e)) => warn!(kind, error = %e, "failed to report runtime error"),
            None => warn!(kind, "runtime error not reported; logError unavailable"),
        }
    }

    /// IPC and crypto only
    pub async fn perform_quick_check(&self, api: &UiApi) -> HealthChecks {
        HealthChecks {
            bridge: !api.is_empty(),
            ipc: check_ipc(api).await.is_ok(),
            crypto: check_crypto(api).await.is_ok(),
            versions: api.versions().is_some(),
        }
    }

    /// Run a quick check every `interval` until `cancel` fires
    pub fn start_runtime_monitoring(
        self: &Arc<Self>,
        api: UiApi,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let checker = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // first tick fires immediately
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let checks = checker.perform_quick_check(&api).await;
                if checks.all_passed() {
                    continue;
                }
                warn!(?checks, "quick health check detected issues");
                let data = json!({
                    "checks": checks,
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                });
                if let Some(Err(e)) = api.log_error("runtime-health-issue", data).await {
                    warn!(error = %e, "failed to report health issue");
                }
            }
        })
    }
}

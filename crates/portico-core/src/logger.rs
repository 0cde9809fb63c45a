//! Host logger
//!
//! Persists JSON lines under `userData/logs` and serves the logging related
//! IPC channels.
//!
//! ```text
//! logs/
//! ├── app.log     {"timestamp","level","message","data"}
//! └── error.log   {"timestamp","type","errorData","processInfo"}
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::time::{Duration, SystemTime};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

use crate::app::{AppInfo, HostApp, MessageBoxOptions};
use crate::error::{Error, Result};
use crate::ipc::{IpcMain, arg_str, arg_value, channels};

pub const APP_LOG: &str = "app.log";
pub const ERROR_LOG: &str = "error.log";

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => f.write_str("INFO"),
            Self::Warn => f.write_str("WARN"),
            Self::Error => f.write_str("ERROR"),
        }
    }
}

/// One line of `app.log`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessInfo {
    pub platform: String,
    pub arch: String,
    pub runtime_version: String,
    pub app_version: String,
}

/// One line of `error.log`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEntry {
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub error_data: Value,
    pub process_info: ProcessInfo,
}

#[derive(Debug)]
pub struct Logger {
    app_name: String,
    app_version: String,
    log_dir: PathBuf,
    log_file: PathBuf,
    error_log_file: PathBuf,
    export_dir: PathBuf,
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl Logger {
    /// Logger writing into `log_dir`; nothing is touched on disk yet
    pub fn new(
        app_name: impl Into<String>,
        app_version: impl Into<String>,
        log_dir: PathBuf,
        export_dir: PathBuf,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            app_version: app_version.into(),
            log_file: log_dir.join(APP_LOG),
            error_log_file: log_dir.join(ERROR_LOG),
            log_dir,
            export_dir,
        }
    }

    /// Logger for `app`'s log directory, without IPC handlers
    pub fn for_app(app: &HostApp) -> Self {
        Self::new(
            app.name(),
            app.version(),
            app.paths().logs.clone(),
            app.paths().desktop.clone(),
        )
    }

    /// Create the log directory, register IPC handlers and record startup
    ///
    /// Failures are logged, never returned.
    pub async fn initialize(app: &Arc<HostApp>) -> Arc<Self> {
        let logger = Arc::new(Self::for_app(app));

        if let Err(e) = fs::create_dir_all(&logger.log_dir).await {
            error!(dir = %logger.log_dir.display(), error = %e, "failed to initialize logger");
            return logger;
        }

        if let Err(e) = logger.register_ipc_handlers(app) {
            error!(error = %e, "failed to register logger ipc handlers");
        }

        logger
            .log(
                LogLevel::Info,
                "Application started",
                Some(json!({
                    "version": app.version(),
                    "platform": std::env::consts::OS,
                    "arch": std::env::consts::ARCH,
                    "runtimeVersion": env!("CARGO_PKG_VERSION"),
                    "timestamp": now(),
                })),
            )
            .await;
        logger
    }

    fn register_ipc_handlers(self: &Arc<Self>, app: &Arc<HostApp>) -> Result<()> {
        let ipc: &IpcMain = app.ipc();

        let logger = Arc::clone(self);
        ipc.handle(channels::LOG_ERROR, move |_event, args| {
            let logger = Arc::clone(&logger);
            async move {
                let kind = arg_str(channels::LOG_ERROR, &args, 0)?;
                logger.log_error(&kind, arg_value(&args, 1)).await;
                Ok(json!(true))
            }
        })?;

        let log_dir = self.log_dir.clone();
        ipc.handle(channels::GET_LOG_PATH, move |_event, _args| {
            let log_dir = log_dir.clone();
            async move { Ok(json!(log_dir)) }
        })?;

        let weak: Weak<HostApp> = Arc::downgrade(app);
        ipc.handle(channels::SHOW_MESSAGE, move |_event, args| {
            let app = weak.upgrade();
            async move {
                let app = app.ok_or_else(|| Error::Other("application has shut down".to_string()))?;
                let message = arg_str(channels::SHOW_MESSAGE, &args, 0)?;
                let result = app
                    .show_message_box(MessageBoxOptions::info("Message", message))
                    .await?;
                Ok(serde_json::to_value(result)?)
            }
        })?;

        let weak: Weak<HostApp> = Arc::downgrade(app);
        ipc.handle(channels::GET_APP_INFO, move |_event, _args| {
            let app = weak.upgrade();
            async move {
                let app = app.ok_or_else(|| Error::Other("application has shut down".to_string()))?;
                Ok(serde_json::to_value(AppInfo::collect(&app))?)
            }
        })?;

        debug!("logger ipc handlers registered");
        Ok(())
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    pub fn error_log_file(&self) -> &Path {
        &self.error_log_file
    }

    async fn append(path: &Path, line: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.write_all(b"\n").await?;
        file.flush().await?;
        Ok(())
    }

    /// Append an entry to `app.log` and mirror it to tracing
    pub async fn log(&self, level: LogLevel, message: &str, data: Option<Value>) {
        let entry = LogEntry {
            timestamp: now(),
            level,
            message: message.to_string(),
            data,
        };

        let written = match serde_json::to_string(&entry) {
            Ok(line) => Self::append(&self.log_file, &line).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = written {
            error!(file = %self.log_file.display(), error = %e, "failed to write to log file");
            return;
        }

        let data = entry.data.as_ref().map(Value::to_string).unwrap_or_default();
        match level {
            LogLevel::Info => info!(target: "portico::app", "{message} {data}"),
            LogLevel::Warn => warn!(target: "portico::app", "{message} {data}"),
            LogLevel::Error => error!(target: "portico::app", "{message} {data}"),
        }
    }

    /// Record an error report in `error.log` and `app.log`
    pub async fn log_error(&self, kind: &str, error_data: Value) {
        let entry = ErrorEntry {
            timestamp: now(),
            kind: kind.to_string(),
            error_data: error_data.clone(),
            process_info: ProcessInfo {
                platform: std::env::consts::OS.to_string(),
                arch: std::env::consts::ARCH.to_string(),
                runtime_version: env!("CARGO_PKG_VERSION").to_string(),
                app_version: self.app_version.clone(),
            },
        };

        let written = match serde_json::to_string(&entry) {
            Ok(line) => Self::append(&self.error_log_file, &line).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = written {
            error!(error = %e, "failed to write error log");
            return;
        }

        self.log(
            LogLevel::Error,
            &format!("{kind} error occurred"),
            Some(error_data),
        )
        .await;
    }

    /// Delete `.log` files not modified for `days_to_keep` days
    ///
    /// A retention too long to represent keeps everything.
    pub async fn cleanup_old_logs(&self, days_to_keep: u64) -> Result<usize> {
        let Some(max_age) = days_to_keep
            .checked_mul(SECONDS_PER_DAY)
            .map(Duration::from_secs)
        else {
            debug!(days_to_keep, "retention exceeds representable age; nothing to clean");
            return Ok(0);
        };
        let now = SystemTime::now();
        let mut removed = Vec::new();

        if !fs::try_exists(&self.log_dir).await.unwrap_or(false) {
            return Ok(0);
        }
        let mut entries = fs::read_dir(&self.log_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "log") {
                continue;
            }
            let modified = entry.metadata().await?.modified()?;
            let age = now.duration_since(modified).unwrap_or_default();
            if age > max_age {
                fs::remove_file(&path).await?;
                removed.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        for file in &removed {
            self.log(LogLevel::Info, &format!("Cleaned up old log file: {file}"), None)
                .await;
        }
        Ok(removed.len())
    }

    /// Last `limit` error entries, newest first. A `limit` of 0 means all.
    ///
    /// Lines that fail to parse are dropped after the limit is applied.
    pub async fn recent_errors(&self, limit: usize) -> Result<Vec<Value>> {
        if !fs::try_exists(&self.error_log_file).await.unwrap_or(false) {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.error_log_file).await?;
        let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
        let start = match limit {
            0 => 0,
            limit => lines.len().saturating_sub(limit),
        };

        let mut errors: Vec<Value> = lines[start..]
            .iter()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect();
        errors.reverse();
        Ok(errors)
    }

    /// Write both logs into `app-logs-<timestamp>.txt` under `dest`
    /// (the desktop when `None`)
    pub async fn export_logs(&self, dest: Option<&Path>) -> Result<PathBuf> {
        let dest = dest.unwrap_or(&self.export_dir);
        fs::create_dir_all(dest).await?;

        let generated = now();
        let stamp = generated.replace([':', '.'], "-");
        let export_path = dest.join(format!("app-logs-{stamp}.txt"));

        let mut content = String::from("Application Logs Export\n");
        content.push_str(&format!("Generated: {generated}\n"));
        content.push_str(&format!("Application: {}\n", self.app_name));
        content.push_str(&format!("App Version: {}\n", self.app_version));
        content.push_str(&format!(
            "Platform: {} {}\n",
            std::env::consts::OS,
            std::env::consts::ARCH
        ));
        content.push_str(&format!("Runtime: portico {}\n", env!("CARGO_PKG_VERSION")));
        content.push_str(&format!("\n{}\n\n", "=".repeat(50)));

        if fs::try_exists(&self.log_file).await.unwrap_or(false) {
            let general = fs::read_to_string(&self.log_file).await?;
            content.push_str(&format!("GENERAL LOGS:\n{general}\n\n"));
        }
        if fs::try_exists(&self.error_log_file).await.unwrap_or(false) {
            let errors = fs::read_to_string(&self.error_log_file).await?;
            content.push_str(&format!("ERROR LOGS:\n{errors}\n"));
        }

        fs::write(&export_path, content).await.map_err(|e| {
            error!(path = %export_path.display(), error = %e, "failed to export logs");
            Error::Io(e)
        })?;
        info!(path = %export_path.display(), "logs exported");
        Ok(export_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{AppPaths, WebPreferences};
    use crate::bridge::attach_api_from_globals;
    use std::fs::File;

    fn app(dir: &Path) -> Arc<HostApp> {
        HostApp::builder("logger-test")
            .version("3.1.4")
            .paths(AppPaths::under(dir))
            .build()
    }

    fn lines(path: &Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_initialize_records_startup() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let logger = Logger::initialize(&app).await;

        assert!(logger.log_dir().is_dir());
        let entries = lines(logger.log_file());
        assert_eq!(entries[0]["message"], "Application started");
        assert_eq!(entries[0]["level"], "info");
        assert_eq!(entries[0]["data"]["version"], "3.1.4");

        assert_eq!(
            app.ipc().channels(),
            vec!["get-app-info", "get-log-path", "log-error", "show-message"]
        );
    }

    #[tokio::test]
    async fn test_log_error_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::for_app(&app(dir.path()));
        std::fs::create_dir_all(logger.log_dir()).unwrap();

        logger.log_error("render", json!({"message": "boom"})).await;

        let errors = lines(logger.error_log_file());
        assert_eq!(errors[0]["type"], "render");
        assert_eq!(errors[0]["errorData"]["message"], "boom");
        assert_eq!(errors[0]["processInfo"]["appVersion"], "3.1.4");

        let general = lines(logger.log_file());
        assert_eq!(general[0]["level"], "error");
        assert_eq!(general[0]["message"], "render error occurred");
    }

    #[tokio::test]
    async fn test_recent_errors_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::for_app(&app(dir.path()));
        assert!(logger.recent_errors(10).await.unwrap().is_empty());

        std::fs::create_dir_all(logger.log_dir()).unwrap();
        for i in 0..5 {
            logger.log_error("e", json!(i)).await;
        }
        std::fs::OpenOptions::new()
            .append(true)
            .open(logger.error_log_file())
            .and_then(|mut f| std::io::Write::write_all(&mut f, b"not json\n"))
            .unwrap();

        let recent = logger.recent_errors(3).await.unwrap();
        let data: Vec<_> = recent.iter().map(|e| e["errorData"].clone()).collect();
        assert_eq!(data, vec![json!(4), json!(3)]);
    }

    #[tokio::test]
    async fn test_cleanup_removes_only_old_logs() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::for_app(&app(dir.path()));
        std::fs::create_dir_all(logger.log_dir()).unwrap();

        let old = logger.log_dir().join("old.log");
        let keep = logger.log_dir().join("notes.txt");
        std::fs::write(&old, "x").unwrap();
        std::fs::write(&keep, "x").unwrap();
        let ten_days_ago = SystemTime::now() - Duration::from_secs(10 * 24 * 3600);
        File::options()
            .write(true)
            .open(&old)
            .unwrap()
            .set_modified(ten_days_ago)
            .unwrap();
        File::options()
            .write(true)
            .open(&keep)
            .unwrap()
            .set_modified(ten_days_ago)
            .unwrap();

        assert_eq!(logger.cleanup_old_logs(7).await.unwrap(), 1);
        assert!(!old.exists());
        assert!(keep.exists());
        // the cleanup note itself is fresh
        assert!(logger.log_file().exists());
    }

    #[tokio::test]
    async fn test_cleanup_with_huge_retention_keeps_everything() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::for_app(&app(dir.path()));
        std::fs::create_dir_all(logger.log_dir()).unwrap();

        let old = logger.log_dir().join("old.log");
        std::fs::write(&old, "x").unwrap();
        File::options()
            .write(true)
            .open(&old)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(400 * 24 * 3600))
            .unwrap();

        let days = u64::MAX / SECONDS_PER_DAY + 1;
        assert_eq!(logger.cleanup_old_logs(days).await.unwrap(), 0);
        assert_eq!(logger.cleanup_old_logs(u64::MAX).await.unwrap(), 0);
        assert!(old.exists());
    }

    #[tokio::test]
    async fn test_recent_errors_zero_limit_returns_all() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::for_app(&app(dir.path()));
        std::fs::create_dir_all(logger.log_dir()).unwrap();
        for i in 0..3 {
            logger.log_error("e", json!(i)).await;
        }

        let all = logger.recent_errors(0).await.unwrap();
        let data: Vec<_> = all.iter().map(|e| e["errorData"].clone()).collect();
        assert_eq!(data, vec![json!(2), json!(1), json!(0)]);
    }

    #[tokio::test]
    async fn test_export_contains_both_sections() {
        let dir = tempfile::tempdir().unwrap();
        let logger = Logger::for_app(&app(dir.path()));
        std::fs::create_dir_all(logger.log_dir()).unwrap();
        logger.log(LogLevel::Info, "hello", None).await;
        logger.log_error("crash", json!("stack")).await;

        let path = logger.export_logs(None).await.unwrap();
        assert!(path.starts_with(dir.path().join("desktop")));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("app-logs-") && name.ends_with(".txt"));
        assert!(!name.contains(':'));

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Application Logs Export\n"));
        assert!(content.contains("App Version: 3.1.4"));
        assert!(content.contains("GENERAL LOGS:"));
        assert!(content.contains("ERROR LOGS:"));
        assert!(content.contains("\"hello\""));
    }

    #[tokio::test]
    async fn test_ipc_handlers_through_bridge() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let logger = Logger::initialize(&app).await;

        let index = dir.path().join("index.html");
        std::fs::write(&index, "<html></html>").unwrap();
        let window = app.create_window(WebPreferences::default());
        window.load_file(&index).await.unwrap();
        let api = attach_api_from_globals(&window.globals().unwrap());

        let log_path = api.get_log_path().await.unwrap().unwrap();
        assert_eq!(log_path, logger.log_dir());

        let info = api.get_app_info().await.unwrap().unwrap();
        assert_eq!(info.name, "logger-test");
        assert_eq!(info.log_path, logger.log_dir());

        let shown = api.show_message("hi").await.unwrap().unwrap();
        assert_eq!(shown.response, 0);

        assert!(api.log_error("ui", json!({"x": 1})).await.unwrap().unwrap());
        let recent = logger.recent_errors(1).await.unwrap();
        assert_eq!(recent[0]["type"], "ui");
    }
}

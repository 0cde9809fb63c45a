//! Portico CLI - run the desktop host and inspect its state

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use portico_core::Error;
use portico_core::app::{
    AppInitConfig, HostApp, PreloadScript, RendererSource, SocketInstanceLock, WebPreferences,
};
use portico_core::bootstrap::init_app;
use portico_core::bridge::{EXPOSED_NAMES, encode_key, exposed_capabilities};
use portico_core::config::Config;
use portico_core::health::{DEFAULT_MONITOR_INTERVAL, HealthCheckResult, HealthChecker};
use portico_core::ipc;
use portico_core::logger::Logger;
use serde_json::json;
use tracing::{error, info, warn};
use url::Url;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "portico")]
#[command(author, version, about = "Desktop application host", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the host and run until quit
    Run {
        /// Load the UI from a dev server
        #[arg(long, conflicts_with = "renderer_file")]
        renderer_url: Option<Url>,
        /// Load the UI from a bundled entry point
        #[arg(long)]
        renderer_file: Option<PathBuf>,
        /// Preload artifact to require before installing the bridge
        #[arg(long)]
        preload: Option<PathBuf>,
    },

    /// List the capabilities exposed to UI code
    Capabilities,

    /// Run health check
    Doctor,

    /// Inspect host logs
    Logs {
        #[command(subcommand)]
        action: LogsAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum LogsAction {
    /// Show the log directory
    Path,
    /// Show the most recent error entries, newest first
    Recent {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Write both logs into a single text file
    Export {
        /// Destination directory (defaults to the desktop)
        #[arg(short, long)]
        dest: Option<PathBuf>,
    },
    /// Delete log files older than the retention period
    Cleanup {
        #[arg(short, long)]
        days: Option<u64>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("portico=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            renderer_url,
            renderer_file,
            preload,
        } => cmd_run(renderer_url, renderer_file, preload, cli.quiet).await,

        Commands::Capabilities => cmd_capabilities(cli.format),

        Commands::Doctor => cmd_doctor(cli.format, cli.quiet).await,

        Commands::Logs { action } => cmd_logs(action, cli.format, cli.quiet).await,

        Commands::Config { action } => cmd_config(action, cli.format, cli.quiet),
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

fn resolve_init(
    renderer_url: Option<Url>,
    renderer_file: Option<PathBuf>,
    preload: Option<PathBuf>,
) -> anyhow::Result<AppInitConfig> {
    let base_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));

    let mut init = match (renderer_url, renderer_file) {
        (Some(url), _) => AppInitConfig {
            renderer: RendererSource::DevServer(url),
            preload: PreloadScript::Builtin,
        },
        (None, Some(path)) => AppInitConfig {
            renderer: RendererSource::Bundle(path),
            preload: PreloadScript::Builtin,
        },
        (None, None) => AppInitConfig::from_env(&base_dir)?,
    };
    if let Some(path) = preload {
        init.preload = PreloadScript::File(path);
    }
    Ok(init)
}

async fn cmd_run(
    renderer_url: Option<Url>,
    renderer_file: Option<PathBuf>,
    preload: Option<PathBuf>,
    quiet: bool,
) -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;
    let init = resolve_init(renderer_url, renderer_file, preload)?;

    let app = HostApp::builder(config.app.name.clone())
        .instance_lock(Arc::new(SocketInstanceLock::for_app(&config.app.name)))
        .build();

    let logger = match init_app(Arc::clone(&app), init, &config).await {
        Ok(logger) => logger,
        Err(Error::InstanceLocked) => {
            if !quiet {
                println!("Another instance is already running; forwarded arguments to it.");
            }
            return Ok(());
        }
        Err(e) => {
            error!(code = e.code(), error = %e, "startup failed");
            eprintln!("Error [{}]: {}", e.code(), e);
            if let Some(suggestion) = e.suggestion() {
                eprintln!("  {}", suggestion);
            }
            app.quit();
            std::process::exit(1);
        }
    };

    match logger.cleanup_old_logs(config.logging.retention_days).await {
        Ok(0) => {}
        Ok(removed) => info!(removed, "removed old log files"),
        Err(e) => warn!(error = %e, "log cleanup failed"),
    }

    let shutdown = app.shutdown_token();
    let checker = Arc::new(HealthChecker::new());
    for window in app.all_windows() {
        let api = window.ui_api();
        checker.perform_health_check(&api).await;
        checker.start_runtime_monitoring(api, DEFAULT_MONITOR_INTERVAL, shutdown.clone());
    }

    if !quiet {
        println!("{} {} running. Press Ctrl-C to quit.", app.name(), app.version());
    }

    tokio::select! {
        _ = shutdown.cancelled() => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "failed to listen for Ctrl-C");
            }
            app.quit();
        }
    }

    logger
        .log(portico_core::logger::LogLevel::Info, "Application stopped", None)
        .await;
    Ok(())
}

fn cmd_capabilities(format: OutputFormat) -> anyhow::Result<()> {
    let (renderer, _receiver) = ipc::channel(Uuid::nil());
    let table = exposed_capabilities(renderer)?;

    let rows: Vec<(&str, String, &str)> = EXPOSED_NAMES
        .iter()
        .map(|name| {
            let kind = match table.get(name) {
                Some(cap) if cap.is_callable() => "function",
                Some(_) => "value",
                None => "missing",
            };
            (*name, encode_key(name), kind)
        })
        .collect();

    match format {
        OutputFormat::Json => {
            let items: Vec<_> = rows
                .iter()
                .map(|(name, key, kind)| json!({"name": name, "key": key, "kind": kind}))
                .collect();
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
        OutputFormat::Text => {
            for (name, key, kind) in rows {
                println!("{:<12} {:<20} {}", name, key, kind);
            }
        }
    }
    Ok(())
}

async fn cmd_doctor(format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    let text = format == OutputFormat::Text && !quiet;
    if text {
        println!("Portico Health Check");
        println!("====================");
        println!();
    }

    let mut all_ok = true;

    let config = match Config::load().and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => {
            if text {
                println!("[OK] Configuration: Valid");
            }
            config
        }
        Err(e) => {
            all_ok = false;
            if text {
                println!("[!!] Configuration: Error - {}", e);
                println!("     Falling back to defaults");
            }
            Config::default()
        }
    };

    if text {
        match Config::config_path() {
            Ok(path) if path.exists() => println!("[OK] Config file: {}", path.display()),
            Ok(path) => println!("[--] Config file: {} (using defaults)", path.display()),
            Err(e) => println!("[!!] Config file: {}", e),
        }
    }

    let app = HostApp::builder(config.app.name.clone()).build();
    let logger = Logger::initialize(&app).await;
    if text {
        println!("[OK] Log directory: {}", logger.log_dir().display());
    }

    let window = app.create_window(WebPreferences::default());
    let blank = Url::parse("about:blank")?;
    let result: Option<HealthCheckResult> = match window.load_url(&blank).await {
        Ok(()) => Some(HealthChecker::new().perform_health_check(&window.ui_api()).await),
        Err(e) => {
            all_ok = false;
            if text {
                println!("[!!] Window: {}", e);
            }
            None
        }
    };
    app.close_window(window.id());
    app.quit();

    if let Some(result) = &result {
        all_ok &= result.success;
        if text {
            let checks = [
                ("Bridge", result.checks.bridge),
                ("IPC", result.checks.ipc),
                ("Crypto", result.checks.crypto),
                ("Versions", result.checks.versions),
            ];
            for (label, ok) in checks {
                println!("[{}] {}", if ok { "OK" } else { "!!" }, label);
            }
            for err in &result.errors {
                println!("     {}", err);
            }
        }
    }

    match format {
        OutputFormat::Json => {
            let output = json!({
                "ok": all_ok,
                "logDir": logger.log_dir(),
                "healthCheck": result,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text if !quiet => {
            println!();
            if all_ok {
                println!("All checks passed.");
            } else {
                println!("Some checks failed.");
            }
        }
        OutputFormat::Text => {}
    }

    if !all_ok {
        std::process::exit(1);
    }
    Ok(())
}

fn load_logger(config: &Config) -> Logger {
    let app = HostApp::builder(config.app.name.clone()).build();
    Logger::for_app(&app)
}

async fn cmd_logs(action: LogsAction, format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let logger = load_logger(&config);

    match action {
        LogsAction::Path => match format {
            OutputFormat::Json => println!("{}", json!({"logDir": logger.log_dir()})),
            OutputFormat::Text => println!("{}", logger.log_dir().display()),
        },
        LogsAction::Recent { limit } => {
            let limit = limit.unwrap_or(config.logging.recent_errors_limit);
            let errors = logger.recent_errors(limit).await?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&errors)?),
                OutputFormat::Text if errors.is_empty() => {
                    if !quiet {
                        println!("No errors recorded.");
                    }
                }
                OutputFormat::Text => {
                    for entry in errors {
                        println!("{}", serde_json::to_string(&entry)?);
                    }
                }
            }
        }
        LogsAction::Export { dest } => {
            let path = logger.export_logs(dest.as_deref()).await?;
            match format {
                OutputFormat::Json => println!("{}", json!({"exported": path})),
                OutputFormat::Text if quiet => println!("{}", path.display()),
                OutputFormat::Text => println!("Logs exported to {}", path.display()),
            }
        }
        LogsAction::Cleanup { days } => {
            let days = days.unwrap_or(config.logging.retention_days);
            let removed = logger.cleanup_old_logs(days).await?;
            match format {
                OutputFormat::Json => println!("{}", json!({"removed": removed})),
                OutputFormat::Text => {
                    if !quiet {
                        println!("Removed {} log file(s) older than {} day(s).", removed, days);
                    }
                }
            }
        }
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let items = config.list()?;
            match format {
                OutputFormat::Json => {
                    let map: serde_json::Map<String, serde_json::Value> = items
                        .into_iter()
                        .map(|(key, value)| (key, serde_json::Value::String(value)))
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&map)?);
                }
                OutputFormat::Text => {
                    for (key, value) in items {
                        println!("{} = {}", key, value);
                    }
                }
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Longest log retention accepted, in days
pub const MAX_RETENTION_DAYS: u64 = 36_500;

/// Portico configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub app: AppConfig,
    pub window: WindowConfig,
    pub security: SecurityConfig,
    pub logging: LoggingConfig,
    pub updates: UpdateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    pub hardware_acceleration: bool,
    pub devtools_extension: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub open_devtools: bool,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Origins that may be opened in the system browser during development
    pub external_urls: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub retention_days: u64,
    pub recent_errors_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    pub enabled: bool,
    pub feed_url: Option<String>,
    pub channel: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: AppConfig::default(),
            window: WindowConfig::default(),
            security: SecurityConfig::default(),
            logging: LoggingConfig::default(),
            updates: UpdateConfig::default(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "portico".to_string(),
            hardware_acceleration: false,
            devtools_extension: Some("REACT_DEVELOPER_TOOLS".to_string()),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            open_devtools: false,
            width: 1024,
            height: 768,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            external_urls: vec![
                "https://vite.dev".to_string(),
                "https://developer.mozilla.org".to_string(),
                "https://react.dev".to_string(),
                "https://www.typescriptlang.org".to_string(),
                "https://zustand-demo.pmnd.rs".to_string(),
            ],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            retention_days: 7,
            recent_errors_limit: 50,
        }
    }
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            feed_url: None,
            channel: "latest".to_string(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("PORTICO_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("portico")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or create default if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.app.name.trim().is_empty() {
            return Err(anyhow!("app.name must not be empty"));
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(anyhow!("Window dimensions must be greater than zero"));
        }
        for origin in &self.security.external_urls {
            url::Url::parse(origin)
                .with_context(|| format!("Invalid external URL: {}", origin))?;
        }
        if let Some(feed) = &self.updates.feed_url {
            url::Url::parse(feed).with_context(|| format!("Invalid update feed URL: {}", feed))?;
        }
        if self.logging.retention_days > MAX_RETENTION_DAYS {
            return Err(anyhow!(
                "logging.retention_days must be at most {}",
                MAX_RETENTION_DAYS
            ));
        }
        if self.updates.channel.trim().is_empty() {
            return Err(anyhow!("updates.channel must not be empty"));
        }
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "app.name" => Ok(self.app.name.clone()),
            "app.hardware_acceleration" => Ok(self.app.hardware_acceleration.to_string()),
            "app.devtools_extension" => Ok(self
                .app
                .devtools_extension
                .clone()
                .unwrap_or_else(|| "(none)".to_string())),

            "window.open_devtools" => Ok(self.window.open_devtools.to_string()),
            "window.width" => Ok(self.window.width.to_string()),
            "window.height" => Ok(self.window.height.to_string()),

            "security.external_urls" => Ok(self.security.external_urls.join(", ")),

            "logging.retention_days" => Ok(self.logging.retention_days.to_string()),
            "logging.recent_errors_limit" => Ok(self.logging.recent_errors_limit.to_string()),

            "updates.enabled" => Ok(self.updates.enabled.to_string()),
            "updates.feed_url" => Ok(self
                .updates
                .feed_url
                .clone()
                .unwrap_or_else(|| "(not set)".to_string())),
            "updates.channel" => Ok(self.updates.channel.clone()),

            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `portico config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "app.name" => {
                if value.trim().is_empty() {
                    return Err(anyhow!("app.name must not be empty"));
                }
                self.app.name = value.to_string();
            }
            "app.hardware_acceleration" => {
                self.app.hardware_acceleration = parse_bool(key, value)?;
            }
            "app.devtools_extension" => {
                self.app.devtools_extension = match value {
                    "" | "none" => None,
                    "REACT_DEVELOPER_TOOLS" => Some(value.to_string()),
                    other => {
                        return Err(anyhow!(
                            "Unknown devtools extension: {}. Valid options: REACT_DEVELOPER_TOOLS, none",
                            other
                        ));
                    }
                };
            }

            "window.open_devtools" => {
                self.window.open_devtools = parse_bool(key, value)?;
            }
            "window.width" | "window.height" => {
                let size: u32 = value
                    .parse()
                    .with_context(|| format!("Invalid {} value: {}", key, value))?;
                if size == 0 {
                    return Err(anyhow!("Window dimensions must be greater than zero"));
                }
                if key == "window.width" {
                    self.window.width = size;
                } else {
                    self.window.height = size;
                }
            }

            "security.external_urls" => {
                let urls: Vec<String> = value
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                for origin in &urls {
                    url::Url::parse(origin)
                        .with_context(|| format!("Invalid external URL: {}", origin))?;
                }
                self.security.external_urls = urls;
            }

            "logging.retention_days" => {
                let days: u64 = value
                    .parse()
                    .with_context(|| format!("Invalid retention_days value: {}", value))?;
                if days > MAX_RETENTION_DAYS {
                    return Err(anyhow!(
                        "logging.retention_days must be at most {}",
                        MAX_RETENTION_DAYS
                    ));
                }
                self.logging.retention_days = days;
            }
            "logging.recent_errors_limit" => {
                self.logging.recent_errors_limit = value
                    .parse()
                    .with_context(|| format!("Invalid recent_errors_limit value: {}", value))?;
            }

            "updates.enabled" => {
                self.updates.enabled = parse_bool(key, value)?;
            }
            "updates.feed_url" => {
                if value.is_empty() {
                    self.updates.feed_url = None;
                } else {
                    url::Url::parse(value)
                        .with_context(|| format!("Invalid update feed URL: {}", value))?;
                    self.updates.feed_url = Some(value.to_string());
                }
            }
            "updates.channel" => {
                if value.trim().is_empty() {
                    return Err(anyhow!("updates.channel must not be empty"));
                }
                self.updates.channel = value.to_string();
            }

            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `portico config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys = vec![
            "app.name",
            "app.hardware_acceleration",
            "app.devtools_extension",
            "window.open_devtools",
            "window.width",
            "window.height",
            "security.external_urls",
            "logging.retention_days",
            "logging.recent_errors_limit",
            "updates.enabled",
            "updates.feed_url",
            "updates.channel",
        ];

        keys.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> anyhow::Result<bool> {
    match value {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(anyhow!("Invalid boolean for {}: {}", key, value)),
    }
}

//! Error types for Portico

use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using Portico's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Portico error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Module errors (E001-E099)
    #[error("Module '{module}' failed to enable: {message}")]
    ModuleFailed { module: String, message: String },

    #[error("Module '{0}' panicked during bring-up")]
    ModulePanicked(String),

    #[error("Module '{0}' returned pending work but no async runtime is running")]
    NoRuntime(String),

    // Bridge errors (E100-E199)
    #[error("Capability key '{0}' is not a valid encoded name")]
    InvalidCapabilityKey(String),

    #[error("Capability '{0}' is already exposed in this context")]
    DuplicateCapability(String),

    #[error("Capability '{0}' is a value and cannot be invoked")]
    NotCallable(String),

    // IPC errors (E200-E299)
    #[error("No handler registered for '{0}'")]
    NoHandler(String),

    #[error("Attempted to register a second handler for '{0}'")]
    HandlerAlreadyRegistered(String),

    #[error("Error invoking remote method '{channel}': {message}")]
    RemoteCall { channel: String, message: String },

    #[error("IPC transport closed")]
    TransportClosed,

    #[error("Invalid argument {index} for '{channel}': expected {expected}")]
    InvalidArgument {
        channel: String,
        index: usize,
        expected: &'static str,
    },

    // Window errors (E300-E399)
    #[error("Window {0} has been destroyed")]
    WindowDestroyed(Uuid),

    #[error("Renderer entry point not found: {0}. Build the renderer first.")]
    RendererNotFound(PathBuf),

    #[error("Navigation to '{0}' blocked: origin is not allowed")]
    NavigationBlocked(String),

    // Lifecycle errors (E400-E499)
    #[error("Another instance is already running")]
    InstanceLocked,

    // Update errors (E500-E599)
    #[error("Update check failed: {0}")]
    UpdateFailed(String),

    #[error("Network error: {0}. Check your internet connection.")]
    NetworkError(#[from] reqwest::Error),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Input errors (E800-E899)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Generic errors
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::ModuleFailed { .. } => "E001",
            Self::ModulePanicked(_) => "E002",
            Self::NoRuntime(_) => "E003",
            Self::InvalidCapabilityKey(_) => "E100",
            Self::DuplicateCapability(_) => "E101",
            Self::NotCallable(_) => "E102",
            Self::NoHandler(_) => "E200",
            Self::HandlerAlreadyRegistered(_) => "E201",
            Self::RemoteCall { .. } => "E202",
            Self::TransportClosed => "E203",
            Self::InvalidArgument { .. } => "E204",
            Self::WindowDestroyed(_) => "E300",
            Self::RendererNotFound(_) => "E301",
            Self::NavigationBlocked(_) => "E302",
            Self::InstanceLocked => "E400",
            Self::UpdateFailed(_) | Self::NetworkError(_) => "E500",
            Self::ConfigError(_) => "E600",
            Self::InvalidInput(_) => "E800",
            Self::Other(_) | Self::Json(_) | Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::RendererNotFound(_) => Some("Build the renderer bundle or pass --renderer-url".to_string()),
            Self::NetworkError(_) => Some("Check internet connection".to_string()),
            Self::UpdateFailed(_) => Some("portico config get updates.feed_url".to_string()),
            Self::ConfigError(_) => Some("portico config list".to_string()),
            Self::InstanceLocked => Some("Close the running instance first".to_string()),
            _ => None,
        }
    }

    /// Wrap any displayable failure as a module failure
    pub fn module(module: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::ModuleFailed {
            module: module.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_failed_error() {
        let error = Error::module("window-manager", "no display");
        assert_eq!(error.code(), "E001");
        assert_eq!(error.suggestion(), None);
        assert!(error.to_string().contains("window-manager"));
        assert!(error.to_string().contains("no display"));
    }

    #[test]
    fn test_remote_call_error() {
        let error = Error::RemoteCall {
            channel: "get-app-info".to_string(),
            message: "boom".to_string(),
        };
        assert_eq!(error.code(), "E202");
        assert!(error.to_string().contains("get-app-info"));
    }

    #[test]
    fn test_renderer_not_found_error() {
        let error = Error::RendererNotFound(PathBuf::from("/tmp/missing/index.html"));
        assert_eq!(error.code(), "E301");
        assert!(error.suggestion().is_some());
        assert!(error.to_string().contains("index.html"));
    }

    #[test]
    fn test_instance_locked_error() {
        let error = Error::InstanceLocked;
        assert_eq!(error.code(), "E400");
        assert_eq!(
            error.suggestion(),
            Some("Close the running instance first".to_string())
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error: Error = io.into();
        assert_eq!(error.code(), "E9999");
        assert!(error.to_string().contains("gone"));
    }
}

//! Portico Core Library
//!
//! Host side of a desktop application shell:
//! - Application handle and windows
//! - Startup module runner
//! - Capability bridge into sandboxed UI contexts
//! - Request/response IPC between UI contexts and the host
//! - Host logger and UI-side health checks
//! - Configuration

pub mod app;
pub mod bootstrap;
pub mod bridge;
pub mod config;
pub mod error;
pub mod health;
pub mod ipc;
pub mod logger;
pub mod modules;
pub mod runner;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{AppInitConfig, HostApp};
    pub use crate::bridge::{Capability, CapabilityTable, UiApi};
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::runner::{Enablement, ModuleContext, ModuleRunner, StartupModule};
}

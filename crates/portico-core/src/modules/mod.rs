//! Built-in startup modules
//!
//! Registered by [`crate::bootstrap::init_app`] in this order:
//!
//! 1. [`WindowManager`]
//! 2. [`SingleInstanceApp`]
//! 3. [`ApplicationTerminatorOnLastWindowClose`]
//! 4. [`HardwareAcceleration`]
//! 5. [`AutoUpdater`]
//! 6. [`ChromeDevToolsExtension`]
//! 7. [`BlockNotAllowedOrigins`]
//! 8. [`ExternalUrls`]

mod devtools;
mod lifecycle;
mod security;
mod single_instance;
mod updater;
mod window_manager;

pub use devtools::{ChromeDevToolsExtension, DevToolsExtension};
pub use lifecycle::{ApplicationTerminatorOnLastWindowClose, HardwareAcceleration};
pub use security::{BlockNotAllowedOrigins, ExternalUrls};
pub use single_instance::SingleInstanceApp;
pub use updater::{AutoUpdater, HttpUpdateSource, ReleaseInfo, UpdateSource, compare_versions};
pub use window_manager::WindowManager;

//! Refuse to run twice

use tracing::info;

use crate::error::Error;
use crate::runner::{Enablement, ModuleContext, StartupModule};

/// Quits when another instance already holds the lock
///
/// Fails with [`Error::InstanceLocked`]; callers treat that as a clean exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleInstanceApp;

impl StartupModule for SingleInstanceApp {
    fn name(&self) -> &str {
        "single-instance"
    }

    fn enable(&self, ctx: &ModuleContext) -> Enablement {
        let app = ctx.app();
        if app.request_single_instance_lock() {
            return Enablement::done();
        }
        info!("another instance is running; quitting");
        app.quit();
        Enablement::failed(Error::InstanceLocked)
    }
}

//! Small lifecycle switches

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::broadcast::error::RecvError;
use tracing::info;

use crate::app::AppEvent;
use crate::error::Error;
use crate::runner::{Enablement, ModuleContext, StartupModule};

/// Quit when the last window closes
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplicationTerminatorOnLastWindowClose;

impl StartupModule for ApplicationTerminatorOnLastWindowClose {
    fn name(&self) -> &str {
        "terminate-on-last-window-close"
    }

    fn enable(&self, ctx: &ModuleContext) -> Enablement {
        let app = Arc::clone(ctx.app());
        let mut events = app.subscribe();
        let quit = app.shutdown_token();

        let Ok(handle) = Handle::try_current() else {
            return Enablement::failed(Error::NoRuntime(self.name().to_string()));
        };
        handle.spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = quit.cancelled() => break,
                    event = events.recv() => event,
                };
                match event {
                    Ok(AppEvent::WindowAllClosed) => {
                        info!("last window closed");
                        app.quit();
                        break;
                    }
                    Ok(_) | Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => break,
                }
            }
        });
        Enablement::done()
    }
}

/// GPU acceleration switch; only acts when `enable` is false
#[derive(Debug, Clone, Copy, Default)]
pub struct HardwareAcceleration {
    pub enable: bool,
}

impl StartupModule for HardwareAcceleration {
    fn name(&self) -> &str {
        "hardware-acceleration"
    }

    fn enable(&self, ctx: &ModuleContext) -> Enablement {
        if !self.enable {
            ctx.app().disable_hardware_acceleration();
        }
        Enablement::done()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{AppPaths, HostApp, WebPreferences};
    use crate::runner::create_module_runner;
    use std::time::Duration;

    fn test_app() -> Arc<HostApp> {
        HostApp::builder("lifecycle-test")
            .paths(AppPaths::under(&std::env::temp_dir().join("portico-lifecycle-test")))
            .build()
    }

    #[tokio::test]
    async fn test_quits_after_last_window() {
        let app = test_app();
        create_module_runner(Arc::clone(&app))
            .init(ApplicationTerminatorOnLastWindowClose)
            .run()
            .await
            .unwrap();

        let window = app.create_window(WebPreferences::default());
        assert!(!app.is_quitting());
        app.close_window(window.id());

        tokio::time::timeout(Duration::from_secs(1), app.shutdown_token().cancelled())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_hardware_acceleration_switch() {
        let app = test_app();
        create_module_runner(Arc::clone(&app))
            .init(HardwareAcceleration { enable: true })
            .run()
            .await
            .unwrap();
        assert!(app.hardware_acceleration_enabled());

        let other = test_app();
        create_module_runner(Arc::clone(&other))
            .init(HardwareAcceleration { enable: false })
            .run()
            .await
            .unwrap();
        assert!(!other.hardware_acceleration_enabled());
    }
}

//! Main window lifecycle

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::app::{AppEvent, AppInitConfig, HostApp, RendererSource, WebPreferences, Window};
use crate::error::Result;
use crate::runner::{Enablement, ModuleContext, StartupModule};

/// Shows the main window once the app is ready and brings it back on
/// second launch or activation
#[derive(Debug, Clone)]
pub struct WindowManager {
    init: AppInitConfig,
    open_devtools: bool,
    size: Option<(u32, u32)>,
}

impl WindowManager {
    pub fn new(init: AppInitConfig, open_devtools: bool) -> Self {
        Self {
            init,
            open_devtools,
            size: None,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Some((width, height));
        self
    }

    async fn create_window(&self, app: &Arc<HostApp>) -> Result<Arc<Window>> {
        let window = app.create_window(WebPreferences::isolated(Some(self.init.preload.clone())));
        if let Some((width, height)) = self.size {
            window.set_size(width, height)?;
        }
        let loaded = match &self.init.renderer {
            RendererSource::DevServer(url) => window.load_url(url).await,
            RendererSource::Bundle(path) => window.load_file(path).await,
        };
        if let Err(e) = loaded {
            app.close_window(window.id());
            return Err(e);
        }
        Ok(window)
    }

    /// Reuse the first live window or create one; optionally bring it up
    pub async fn restore_or_create_window(
        &self,
        app: &Arc<HostApp>,
        show: bool,
    ) -> Result<Arc<Window>> {
        let existing = app.all_windows().into_iter().find(|w| !w.is_destroyed());
        let window = match existing {
            Some(window) => window,
            None => self.create_window(app).await?,
        };

        if !show {
            return Ok(window);
        }

        if window.is_minimized() {
            window.restore()?;
        }
        window.show()?;
        if self.open_devtools {
            window.open_devtools()?;
        }
        window.focus()?;
        Ok(window)
    }
}

impl StartupModule for WindowManager {
    fn name(&self) -> &str {
        "window-manager"
    }

    fn enable(&self, ctx: &ModuleContext) -> Enablement {
        let app = Arc::clone(ctx.app());
        let manager = self.clone();
        // Subscribe now so no relaunch between ready and the first window is lost
        let mut events = app.subscribe();

        Enablement::pending(async move {
            app.when_ready().await;
            if app.is_quitting() {
                debug!("quitting before ready; no main window");
                return Ok(());
            }
            manager.restore_or_create_window(&app, true).await?;

            let quit = app.shutdown_token();
            tokio::spawn(async move {
                loop {
                    let event = tokio::select! {
                        _ = quit.cancelled() => break,
                        event = events.recv() => event,
                    };
                    match event {
                        Ok(AppEvent::SecondInstance { .. } | AppEvent::Activate) => {
                            if let Err(e) = manager.restore_or_create_window(&app, true).await {
                                warn!(error = %e, "failed to restore main window");
                            }
                        }
                        Ok(_) => {}
                        Err(RecvError::Lagged(n)) => debug!(skipped = n, "window manager lagged"),
                        Err(RecvError::Closed) => break,
                    }
                }
            });
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{AppPaths, PreloadScript};
    use crate::runner::create_module_runner;
    use std::time::Duration;

    fn setup() -> (Arc<HostApp>, AppInitConfig, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let index = dir.path().join("index.html");
        std::fs::write(&index, "<html></html>").unwrap();
        let app = HostApp::builder("wm-test")
            .paths(AppPaths::under(dir.path()))
            .build();
        let init = AppInitConfig {
            renderer: RendererSource::Bundle(index),
            preload: PreloadScript::Builtin,
        };
        (app, init, dir)
    }

    #[tokio::test]
    async fn test_window_shown_after_ready() {
        let (app, init, _dir) = setup();
        let runner = create_module_runner(Arc::clone(&app))
            .init(WindowManager::new(init, false).with_size(800, 600));
        assert!(app.all_windows().is_empty());

        app.mark_ready();
        runner.run().await.unwrap();

        let windows = app.all_windows();
        assert_eq!(windows.len(), 1);
        assert!(windows[0].is_visible());
        assert!(windows[0].is_focused());
        assert!(!windows[0].is_devtools_open());
        assert_eq!(windows[0].size(), (800, 600));
        assert_eq!(windows[0].ui_api().len(), 7);
    }

    #[tokio::test]
    async fn test_second_instance_restores_existing_window() {
        let (app, init, _dir) = setup();
        app.mark_ready();
        create_module_runner(Arc::clone(&app))
            .init(WindowManager::new(init, true))
            .run()
            .await
            .unwrap();

        let window = app.all_windows()[0].clone();
        assert!(window.is_devtools_open());
        window.minimize().unwrap();

        app.emit(AppEvent::SecondInstance { argv: Vec::new() });
        for _ in 0..50 {
            if !window.is_minimized() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!window.is_minimized());
        assert_eq!(app.all_windows().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_bundle_fails_module() {
        let (app, mut init, dir) = setup();
        init.renderer = RendererSource::Bundle(dir.path().join("nope.html"));
        app.mark_ready();

        let err = create_module_runner(Arc::clone(&app))
            .init(WindowManager::new(init, false))
            .run()
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E301");
        assert!(app.all_windows().is_empty());
    }
}

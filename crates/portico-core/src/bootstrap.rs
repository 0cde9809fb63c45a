//! Host bring-up: logger, startup modules, ready

use std::sync::Arc;

use tracing::{info, warn};

use crate::app::{AppInitConfig, HostApp};
use crate::config::Config;
use crate::error::Result;
use crate::logger::Logger;
use crate::modules::{
    ApplicationTerminatorOnLastWindowClose, AutoUpdater, BlockNotAllowedOrigins,
    ChromeDevToolsExtension, DevToolsExtension, ExternalUrls, HardwareAcceleration,
    HttpUpdateSource, SingleInstanceApp, WindowManager,
};
use crate::runner::{ModuleRunner, create_module_runner};

/// Register the built-in modules in their fixed order
pub fn build_runner(app: Arc<HostApp>, init: &AppInitConfig, config: &Config) -> ModuleRunner {
    let dev_origin = init.renderer.origin();
    let is_dev = dev_origin.is_some();

    let updater = match (&config.updates.feed_url, config.updates.enabled) {
        (Some(feed), true) => match HttpUpdateSource::parse(feed) {
            Ok(source) => AutoUpdater::new(Arc::new(source), config.updates.channel.clone()),
            Err(e) => {
                warn!(error = %e, "auto update disabled");
                AutoUpdater::disabled()
            }
        },
        _ => AutoUpdater::disabled(),
    };

    let extension = config
        .app
        .devtools_extension
        .as_deref()
        .and_then(|name| match name.parse::<DevToolsExtension>() {
            Ok(ext) => Some(ext),
            Err(e) => {
                warn!(error = %e, "skipping devtools extension");
                None
            }
        });

    let external = if is_dev {
        config.security.external_urls.clone()
    } else {
        Vec::new()
    };

    let runner = create_module_runner(app)
        .init(
            WindowManager::new(init.clone(), config.window.open_devtools)
                .with_size(config.window.width, config.window.height),
        )
        .init(SingleInstanceApp)
        .init(ApplicationTerminatorOnLastWindowClose)
        .init(HardwareAcceleration {
            enable: config.app.hardware_acceleration,
        })
        .init(updater);

    let runner = match extension {
        Some(extension) => runner.init(ChromeDevToolsExtension { extension }),
        None => runner,
    };

    runner
        .init(BlockNotAllowedOrigins::new(dev_origin))
        .init(ExternalUrls::new(external))
}

/// Bring up the host
///
/// Returns once every startup module has settled. The caller decides what
/// a failure means for the process.
pub async fn init_app(app: Arc<HostApp>, init: AppInitConfig, config: &Config) -> Result<Arc<Logger>> {
    let logger = Logger::initialize(&app).await;
    let runner = build_runner(Arc::clone(&app), &init, config);
    info!(modules = ?runner.module_names(), "startup modules registered");

    app.mark_ready();
    runner.await?;
    Ok(logger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{AppPaths, InstanceLock, LockOutcome, PreloadScript, RendererSource};
    use url::Url;

    struct HeldElsewhere;

    impl InstanceLock for HeldElsewhere {
        fn acquire(&self, _argv: &[String]) -> Result<LockOutcome> {
            Ok(LockOutcome::Secondary)
        }
    }

    fn app(dir: &std::path::Path) -> Arc<HostApp> {
        HostApp::builder("bootstrap-test")
            .paths(AppPaths::under(dir))
            .build()
    }

    #[tokio::test]
    async fn test_module_order() {
        let dir = tempfile::tempdir().unwrap();
        let init = AppInitConfig {
            renderer: RendererSource::Bundle(dir.path().join("index.html")),
            preload: PreloadScript::Builtin,
        };
        let runner = build_runner(app(dir.path()), &init, &Config::default());
        assert_eq!(
            runner.module_names(),
            vec![
                "window-manager",
                "single-instance",
                "terminate-on-last-window-close",
                "hardware-acceleration",
                "auto-updater",
                "chrome-devtools-extension",
                "block-not-allowed-origins",
                "external-urls",
            ]
        );
    }

    #[tokio::test]
    async fn test_init_app_with_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let index = dir.path().join("index.html");
        std::fs::write(&index, "<html></html>").unwrap();
        let app = app(dir.path());
        let init = AppInitConfig {
            renderer: RendererSource::Bundle(index),
            preload: PreloadScript::Builtin,
        };

        let logger = init_app(Arc::clone(&app), init, &Config::default()).await.unwrap();
        assert!(logger.log_file().exists());
        assert!(app.is_ready());
        assert!(!app.hardware_acceleration_enabled());
        assert_eq!(app.all_windows().len(), 1);
        assert_eq!(app.installed_extensions().len(), 1);

        // production: nothing is navigable or opened externally
        let docs = Url::parse("https://react.dev/").unwrap();
        assert!(!app.navigation_allowed(&docs));
    }

    #[tokio::test]
    async fn test_init_app_dev_server_policies() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let init = AppInitConfig {
            renderer: RendererSource::DevServer(Url::parse("http://localhost:5173/").unwrap()),
            preload: PreloadScript::Builtin,
        };

        init_app(Arc::clone(&app), init, &Config::default()).await.unwrap();
        assert!(app.navigation_allowed(&Url::parse("http://localhost:5173/x").unwrap()));
        assert!(!app.navigation_allowed(&Url::parse("https://react.dev/").unwrap()));
    }

    #[tokio::test]
    async fn test_missing_bundle_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let init = AppInitConfig {
            renderer: RendererSource::Bundle(dir.path().join("missing.html")),
            preload: PreloadScript::Builtin,
        };

        let err = init_app(Arc::clone(&app), init, &Config::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E301");
        // later modules still ran
        assert!(!app.hardware_acceleration_enabled());
    }

    #[tokio::test]
    async fn test_secondary_instance_exits_without_ui() {
        let dir = tempfile::tempdir().unwrap();
        let index = dir.path().join("index.html");
        std::fs::write(&index, "<html></html>").unwrap();

        for bundle in [index, dir.path().join("missing.html")] {
            let app = HostApp::builder("bootstrap-test")
                .paths(AppPaths::under(dir.path()))
                .instance_lock(Arc::new(HeldElsewhere))
                .build();
            let init = AppInitConfig {
                renderer: RendererSource::Bundle(bundle),
                preload: PreloadScript::Builtin,
            };

            let err = init_app(Arc::clone(&app), init, &Config::default())
                .await
                .unwrap_err();
            assert_eq!(err.code(), "E400");
            assert!(app.is_quitting());
            assert!(app.all_windows().is_empty());
            assert!(app.installed_extensions().is_empty());
        }
    }
}

//! Startup module sequencing
//!
//! Modules are enabled in registration order. Asynchronous work a module
//! returns is started immediately and chained; [`ModuleRunner::run`]
//! settles once every link has settled and reports the first failure in
//! registration order.
//!
//! ```text
//! init(A) -> init(B) -> init(C) -> run()
//!   |          |          |          |
//!   A.enable   B.enable   C.enable   await A, then B, then C
//!   spawn(a)   spawn(b)   (sync)     first Err wins
//! ```

use std::future::{Future, IntoFuture};
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::app::HostApp;
use crate::error::{Error, Result};

/// What a module's `enable` hands back
pub enum Enablement {
    /// Finished synchronously
    Ready(Result<()>),
    /// Work still in flight
    Pending(BoxFuture<'static, Result<()>>),
}

impl Enablement {
    pub fn done() -> Self {
        Self::Ready(Ok(()))
    }

    pub fn failed(error: Error) -> Self {
        Self::Ready(Err(error))
    }

    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        Self::Pending(future.boxed())
    }
}

impl From<Result<()>> for Enablement {
    fn from(result: Result<()>) -> Self {
        Self::Ready(result)
    }
}

impl std::fmt::Debug for Enablement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(r) => f.debug_tuple("Ready").field(r).finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

/// A unit of host-side initialization
pub trait StartupModule: Send + Sync {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    /// Called exactly once by the runner
    fn enable(&self, ctx: &ModuleContext) -> Enablement;
}

/// Handle given to every module of one runner
#[derive(Debug, Clone)]
pub struct ModuleContext {
    app: Arc<HostApp>,
}

impl ModuleContext {
    pub fn app(&self) -> &Arc<HostApp> {
        &self.app
    }
}

enum Link {
    Settled(Result<()>),
    Pending(JoinHandle<Result<()>>),
}

struct ChainEntry {
    module: String,
    link: Link,
}

/// Sequencer and failure aggregator for startup modules
pub struct ModuleRunner {
    context: ModuleContext,
    modules: Vec<Box<dyn StartupModule>>,
    chain: Vec<ChainEntry>,
}

impl std::fmt::Debug for ModuleRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRunner")
            .field("modules", &self.module_names())
            .finish()
    }
}

/// Create a runner whose modules all see `app`
pub fn create_module_runner(app: Arc<HostApp>) -> ModuleRunner {
    ModuleRunner::new(app)
}

impl ModuleRunner {
    pub fn new(app: Arc<HostApp>) -> Self {
        Self {
            context: ModuleContext { app },
            modules: Vec::new(),
            chain: Vec::new(),
        }
    }

    pub fn context(&self) -> &ModuleContext {
        &self.context
    }

    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Register `module` and enable it right away
    ///
    /// A failure, synchronous or not, never stops later registrations; it
    /// surfaces from [`ModuleRunner::run`].
    pub fn init(mut self, module: impl StartupModule + 'static) -> Self {
        let name = module.name().to_string();
        debug!(module = %name, "enabling module");

        let link = match module.enable(&self.context) {
            Enablement::Ready(Ok(())) => {
                debug!(module = %name, "module enabled");
                Link::Settled(Ok(()))
            }
            Enablement::Ready(Err(e)) => {
                warn!(module = %name, code = e.code(), error = %e, "module failed");
                Link::Settled(Err(e))
            }
            Enablement::Pending(work) => match Handle::try_current() {
                Ok(handle) => {
                    let module = name.clone();
                    Link::Pending(handle.spawn(async move {
                        let result = work.await;
                        match &result {
                            Ok(()) => debug!(module = %module, "module enabled"),
                            Err(e) => {
                                warn!(module = %module, code = e.code(), error = %e, "module failed")
                            }
                        }
                        result
                    }))
                }
                Err(_) => {
                    warn!(module = %name, "no async runtime for pending module");
                    Link::Settled(Err(Error::NoRuntime(name.clone())))
                }
            },
        };

        self.chain.push(ChainEntry { module: name, link });
        self.modules.push(Box::new(module));
        self
    }

    /// Wait for every module in registration order
    ///
    /// Returns the first failure in that order. Links after a failure keep
    /// running in the background.
    pub async fn run(self) -> Result<()> {
        let total = self.chain.len();
        for entry in self.chain {
            let result = match entry.link {
                Link::Settled(result) => result,
                Link::Pending(task) => match task.await {
                    Ok(result) => result,
                    Err(e) if e.is_panic() => Err(Error::ModulePanicked(entry.module)),
                    Err(e) => Err(Error::module(entry.module, e)),
                },
            };
            result?;
        }
        info!(modules = total, "all startup modules enabled");
        Ok(())
    }
}

impl IntoFuture for ModuleRunner {
    type Output = Result<()>;
    type IntoFuture = BoxFuture<'static, Result<()>>;

    fn into_future(self) -> Self::IntoFuture {
        self.run().boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppPaths;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    type Log = Arc<Mutex<Vec<String>>>;

    enum Behavior {
        Sync,
        SyncFail,
        Async(Duration),
        AsyncFail(Duration),
        Panic,
    }

    struct Probe {
        name: &'static str,
        log: Log,
        behavior: Behavior,
        calls: Arc<AtomicUsize>,
    }

    impl Probe {
        fn new(name: &'static str, log: &Log, behavior: Behavior) -> Self {
            Self {
                name,
                log: Arc::clone(log),
                behavior,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl StartupModule for Probe {
        fn name(&self) -> &str {
            self.name
        }

        fn enable(&self, _ctx: &ModuleContext) -> Enablement {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.log.lock().unwrap().push(self.name.to_string());
            let name = self.name;
            match self.behavior {
                Behavior::Sync => Enablement::done(),
                Behavior::SyncFail => Enablement::failed(Error::module(name, "sync failure")),
                Behavior::Async(delay) => Enablement::pending(async move {
                    tokio::time::sleep(delay).await;
                    Ok(())
                }),
                Behavior::AsyncFail(delay) => Enablement::pending(async move {
                    tokio::time::sleep(delay).await;
                    Err(Error::module(name, "async failure"))
                }),
                Behavior::Panic => Enablement::pending(async move {
                    if true {
                        panic!("module exploded");
                    }
                    Ok(())
                }),
            }
        }
    }

    fn test_app() -> Arc<HostApp> {
        HostApp::builder("runner-test")
            .paths(AppPaths::under(&std::env::temp_dir().join("portico-runner-test")))
            .build()
    }

    fn log() -> Log {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn failed_module(err: &Error) -> &str {
        match err {
            Error::ModuleFailed { module, .. } => module,
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_enable_order_matches_registration() {
        let log = log();
        let runner = create_module_runner(test_app())
            .init(Probe::new("a", &log, Behavior::Async(Duration::from_millis(30))))
            .init(Probe::new("b", &log, Behavior::Sync))
            .init(Probe::new("c", &log, Behavior::Async(Duration::from_millis(1))))
            .init(Probe::new("d", &log, Behavior::Sync));

        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c", "d"]);
        assert_eq!(runner.module_names(), vec!["a", "b", "c", "d"]);
        runner.run().await.unwrap();
    }

    #[tokio::test]
    async fn test_async_rejection_fails_run() {
        let log = log();
        let err = create_module_runner(test_app())
            .init(Probe::new("first", &log, Behavior::Sync))
            .init(Probe::new("second", &log, Behavior::AsyncFail(Duration::from_millis(5))))
            .init(Probe::new("third", &log, Behavior::Async(Duration::from_millis(5))))
            .run()
            .await
            .unwrap_err();

        assert_eq!(failed_module(&err), "second");
        // later modules still started
        assert_eq!(log.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_sync_failure_is_recorded_not_raised() {
        let log = log();
        let runner = create_module_runner(test_app())
            .init(Probe::new("broken", &log, Behavior::SyncFail))
            .init(Probe::new("after", &log, Behavior::Sync));

        assert_eq!(*log.lock().unwrap(), vec!["broken", "after"]);
        let err = runner.await.unwrap_err();
        assert_eq!(failed_module(&err), "broken");
    }

    #[tokio::test]
    async fn test_first_failure_in_registration_order_wins() {
        let log = log();
        let err = create_module_runner(test_app())
            .init(Probe::new("slow", &log, Behavior::AsyncFail(Duration::from_millis(50))))
            .init(Probe::new("fast", &log, Behavior::SyncFail))
            .run()
            .await
            .unwrap_err();
        assert_eq!(failed_module(&err), "slow");
    }

    #[tokio::test]
    async fn test_panicking_module_is_reported() {
        let log = log();
        let err = create_module_runner(test_app())
            .init(Probe::new("boom", &log, Behavior::Panic))
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ModulePanicked(ref m) if m == "boom"));
    }

    #[tokio::test]
    async fn test_enable_called_once_and_context_shared() {
        struct SeesApp(Arc<Mutex<Vec<usize>>>);

        impl StartupModule for SeesApp {
            fn name(&self) -> &str {
                "sees-app"
            }

            fn enable(&self, ctx: &ModuleContext) -> Enablement {
                self.0
                    .lock()
                    .unwrap()
                    .push(Arc::as_ptr(ctx.app()) as usize);
                Enablement::done()
            }
        }

        let app = test_app();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = log();
        let probe = Probe::new("once", &log, Behavior::Sync);
        let calls = Arc::clone(&probe.calls);

        create_module_runner(Arc::clone(&app))
            .init(SeesApp(Arc::clone(&seen)))
            .init(probe)
            .init(SeesApp(Arc::clone(&seen)))
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|p| *p == Arc::as_ptr(&app) as usize));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_runner_resolves() {
        let runner = create_module_runner(test_app());
        assert!(runner.is_empty());
        runner.run().await.unwrap();
    }

    #[test]
    fn test_pending_module_without_runtime() {
        let log = log();
        let runner = create_module_runner(test_app()).init(Probe::new(
            "needs-runtime",
            &log,
            Behavior::Async(Duration::from_millis(1)),
        ));

        let rt = tokio::runtime::Runtime::new().unwrap();
        let err = rt.block_on(runner.run()).unwrap_err();
        assert!(matches!(err, Error::NoRuntime(ref m) if m == "needs-runtime"));
    }
}

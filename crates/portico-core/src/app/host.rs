//! The application handle shared by every startup module

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use super::dialog::{DialogProvider, LogDialog, MessageBoxOptions, MessageBoxResult};
use super::events::AppEvent;
use super::instance::{InstanceLock, LockOutcome, NoopInstanceLock};
use super::opener::{ExternalOpener, SystemOpener};
use super::paths::AppPaths;
use super::window::{WebPreferences, Window, WindowOpenAction};
use crate::error::Result;
use crate::ipc::{self, IpcMain};

/// Capacity of the lifecycle event channel
const EVENT_CAPACITY: usize = 64;

/// Origin policies installed by the security modules. `None` means no
/// policy has been installed yet.
#[derive(Debug, Default)]
struct Policies {
    internal_origins: Option<BTreeSet<String>>,
    external_origins: Option<BTreeSet<String>>,
}

/// Host application handle
///
/// One per process. Owns lifecycle state, the window registry and the host
/// side of IPC.
pub struct HostApp {
    name: String,
    version: String,
    paths: AppPaths,
    ready: watch::Sender<bool>,
    quit: CancellationToken,
    events: broadcast::Sender<AppEvent>,
    windows: RwLock<Vec<Arc<Window>>>,
    ipc: Arc<IpcMain>,
    instance_lock: Arc<dyn InstanceLock>,
    has_instance_lock: AtomicBool,
    hardware_acceleration: AtomicBool,
    dialogs: Arc<dyn DialogProvider>,
    opener: Arc<dyn ExternalOpener>,
    policies: RwLock<Policies>,
    extensions: Mutex<Vec<String>>,
}

impl std::fmt::Debug for HostApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostApp")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("ready", &self.is_ready())
            .field("quitting", &self.is_quitting())
            .field("windows", &self.all_windows().len())
            .finish()
    }
}

/// Builder for [`HostApp`]
pub struct HostAppBuilder {
    name: String,
    version: String,
    paths: Option<AppPaths>,
    instance_lock: Arc<dyn InstanceLock>,
    dialogs: Arc<dyn DialogProvider>,
    opener: Arc<dyn ExternalOpener>,
}

impl HostAppBuilder {
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn paths(mut self, paths: AppPaths) -> Self {
        self.paths = Some(paths);
        self
    }

    pub fn instance_lock(mut self, lock: Arc<dyn InstanceLock>) -> Self {
        self.instance_lock = lock;
        self
    }

    pub fn dialogs(mut self, dialogs: Arc<dyn DialogProvider>) -> Self {
        self.dialogs = dialogs;
        self
    }

    pub fn opener(mut self, opener: Arc<dyn ExternalOpener>) -> Self {
        self.opener = opener;
        self
    }

    pub fn build(self) -> Arc<HostApp> {
        let paths = self.paths.unwrap_or_else(|| AppPaths::resolve(&self.name));
        let (ready, _) = watch::channel(false);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Arc::new(HostApp {
            name: self.name,
            version: self.version,
            paths,
            ready,
            quit: CancellationToken::new(),
            events,
            windows: RwLock::new(Vec::new()),
            ipc: Arc::new(IpcMain::new()),
            instance_lock: self.instance_lock,
            has_instance_lock: AtomicBool::new(false),
            hardware_acceleration: AtomicBool::new(true),
            dialogs: self.dialogs,
            opener: self.opener,
            policies: RwLock::new(Policies::default()),
            extensions: Mutex::new(Vec::new()),
        })
    }
}

impl HostApp {
    pub fn builder(name: impl Into<String>) -> HostAppBuilder {
        HostAppBuilder {
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            paths: None,
            instance_lock: Arc::new(NoopInstanceLock),
            dialogs: Arc::new(LogDialog),
            opener: Arc::new(SystemOpener),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    /// Host side of IPC
    pub fn ipc(&self) -> &Arc<IpcMain> {
        &self.ipc
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Resolves once [`HostApp::mark_ready`] has been called
    pub async fn when_ready(&self) {
        let mut rx = self.ready.subscribe();
        let _ = rx.wait_for(|ready| *ready).await;
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Flip to ready and emit [`AppEvent::Ready`]. Later calls are no-ops.
    pub fn mark_ready(&self) {
        let changed = self.ready.send_if_modified(|ready| {
            let was = *ready;
            *ready = true;
            !was
        });
        if changed {
            info!(app = %self.name, "application ready");
            self.emit(AppEvent::Ready);
        }
    }

    /// Request shutdown. Emits [`AppEvent::WillQuit`] the first time.
    pub fn quit(&self) {
        if self.quit.is_cancelled() {
            return;
        }
        info!(app = %self.name, "quit requested");
        self.emit(AppEvent::WillQuit);
        self.quit.cancel();
        if self.has_instance_lock.swap(false, Ordering::SeqCst) {
            self.instance_lock.release();
        }
    }

    pub fn is_quitting(&self) -> bool {
        self.quit.is_cancelled()
    }

    /// Token cancelled when the application quits
    pub fn shutdown_token(&self) -> CancellationToken {
        self.quit.clone()
    }

    // ---------------------------------------------------------------------
    // Events
    // ---------------------------------------------------------------------

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.events.subscribe()
    }

    pub fn emit(&self, event: AppEvent) {
        debug!(event = event.name(), "emit");
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    // ---------------------------------------------------------------------
    // Single instance
    // ---------------------------------------------------------------------

    /// Try to become the primary instance
    ///
    /// Returns `false` when another process holds the lock; that process has
    /// already been sent this process's arguments. Lock failures other than
    /// contention are logged and treated as acquired.
    pub fn request_single_instance_lock(&self) -> bool {
        if self.has_instance_lock.load(Ordering::SeqCst) {
            return true;
        }

        let argv: Vec<String> = std::env::args().collect();
        match self.instance_lock.acquire(&argv) {
            Ok(LockOutcome::Primary(mut rx)) => {
                self.has_instance_lock.store(true, Ordering::SeqCst);
                if let Ok(handle) = Handle::try_current() {
                    let events = self.events.clone();
                    let quit = self.quit.clone();
                    handle.spawn(async move {
                        loop {
                            tokio::select! {
                                _ = quit.cancelled() => break,
                                argv = rx.recv() => match argv {
                                    Some(argv) => {
                                        let _ = events.send(AppEvent::SecondInstance { argv });
                                    }
                                    None => break,
                                },
                            }
                        }
                    });
                }
                true
            }
            Ok(LockOutcome::Secondary) => false,
            Err(e) => {
                warn!(error = %e, "single-instance lock unavailable; continuing");
                true
            }
        }
    }

    pub fn has_single_instance_lock(&self) -> bool {
        self.has_instance_lock.load(Ordering::SeqCst)
    }

    // ---------------------------------------------------------------------
    // Windows
    // ---------------------------------------------------------------------

    /// Live windows in creation order
    pub fn all_windows(&self) -> Vec<Arc<Window>> {
        self.windows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn window(&self, id: Uuid) -> Option<Arc<Window>> {
        self.all_windows().into_iter().find(|w| w.id() == id)
    }

    /// Create a hidden window and start serving its IPC requests
    pub fn create_window(self: &Arc<Self>, preferences: WebPreferences) -> Arc<Window> {
        let id = Uuid::new_v4();
        let (renderer, receiver) = ipc::channel(id);
        if Handle::try_current().is_ok() {
            self.ipc.serve(receiver);
        } else {
            warn!(window = %id, "no runtime; window IPC will not be served");
        }

        let window = Arc::new(Window::new(id, preferences, renderer, Arc::downgrade(self)));
        self.windows
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::clone(&window));

        debug!(window = %id, "window created");
        self.emit(AppEvent::WindowCreated { id });
        window
    }

    /// Destroy a window. Emits [`AppEvent::WindowAllClosed`] when it was the last.
    pub fn close_window(&self, id: Uuid) -> bool {
        let (removed, remaining) = {
            let mut windows = self.windows.write().unwrap_or_else(PoisonError::into_inner);
            let before = windows.len();
            windows.retain(|w| {
                if w.id() == id {
                    w.destroy();
                    false
                } else {
                    true
                }
            });
            (before != windows.len(), windows.len())
        };

        if removed {
            debug!(window = %id, remaining, "window closed");
            if remaining == 0 {
                self.emit(AppEvent::WindowAllClosed);
            }
        }
        removed
    }

    // ---------------------------------------------------------------------
    // Switches
    // ---------------------------------------------------------------------

    /// Disable GPU acceleration. Only honoured before the app is ready.
    pub fn disable_hardware_acceleration(&self) {
        if self.is_ready() {
            warn!("hardware acceleration can only be disabled before ready; ignoring");
            return;
        }
        self.hardware_acceleration.store(false, Ordering::SeqCst);
        info!("hardware acceleration disabled");
    }

    pub fn hardware_acceleration_enabled(&self) -> bool {
        self.hardware_acceleration.load(Ordering::SeqCst)
    }

    /// Record a devtools extension as installed
    pub fn install_extension(&self, name: &str) {
        let mut extensions = self.extensions.lock().unwrap_or_else(PoisonError::into_inner);
        if !extensions.iter().any(|e| e == name) {
            extensions.push(name.to_string());
            info!(extension = name, "devtools extension installed");
        }
    }

    pub fn installed_extensions(&self) -> Vec<String> {
        self.extensions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // ---------------------------------------------------------------------
    // Dialogs and external URLs
    // ---------------------------------------------------------------------

    pub async fn show_message_box(&self, options: MessageBoxOptions) -> Result<MessageBoxResult> {
        self.dialogs.show_message_box(options).await
    }

    pub fn open_external(&self, url: &Url) -> Result<()> {
        self.opener.open(url)
    }

    // ---------------------------------------------------------------------
    // Origin policies
    // ---------------------------------------------------------------------

    /// Only these origins may be navigated to inside a window
    pub fn set_allowed_origins(&self, origins: BTreeSet<String>) {
        self.policies
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .internal_origins = Some(origins);
    }

    /// URLs with these origins are opened externally on window-open requests
    pub fn set_external_url_allow_list(&self, origins: BTreeSet<String>) {
        self.policies
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .external_origins = Some(origins);
    }

    pub fn navigation_allowed(&self, url: &Url) -> bool {
        let policies = self.policies.read().unwrap_or_else(PoisonError::into_inner);
        match &policies.internal_origins {
            Some(allowed) => allowed.contains(&origin_of(url)),
            None => true,
        }
    }

    /// Decide a window-open request. New windows are never created.
    pub fn handle_window_open(&self, url: &Url) -> Result<WindowOpenAction> {
        let allowed = {
            let policies = self.policies.read().unwrap_or_else(PoisonError::into_inner);
            policies
                .external_origins
                .as_ref()
                .is_some_and(|allowed| allowed.contains(&origin_of(url)))
        };

        if !allowed {
            warn!(url = %url, "blocked window-open request");
            return Ok(WindowOpenAction::Denied);
        }
        self.open_external(url)?;
        Ok(WindowOpenAction::OpenedExternally)
    }
}

/// ASCII serialization of a URL's origin, e.g. `https://react.dev`
pub fn origin_of(url: &Url) -> String {
    url.origin().ascii_serialization()
}

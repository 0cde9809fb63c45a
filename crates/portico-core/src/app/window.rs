//! Application windows and their UI contexts

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use super::host::HostApp;
use crate::bridge::{UiApi, UiGlobals, attach_api_from_globals, exposed_capabilities, install};
use crate::error::{Error, Result};
use crate::ipc::IpcRenderer;

/// Script run in the isolated context before any UI code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "lowercase")]
pub enum PreloadScript {
    /// The bridge compiled into the host
    Builtin,
    /// A preload artifact on disk; installed only if it exists
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebPreferences {
    pub node_integration: bool,
    pub context_isolation: bool,
    pub sandbox: bool,
    pub webview_tag: bool,
    pub preload: Option<PreloadScript>,
}

impl WebPreferences {
    /// Isolated context with the given preload and no host primitives
    pub fn isolated(preload: Option<PreloadScript>) -> Self {
        Self {
            node_integration: false,
            context_isolation: true,
            sandbox: false,
            webview_tag: false,
            preload,
        }
    }
}

impl Default for WebPreferences {
    fn default() -> Self {
        Self::isolated(Some(PreloadScript::Builtin))
    }
}

/// What a window currently displays
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "location", rename_all = "lowercase")]
pub enum WindowContent {
    Url(Url),
    File(PathBuf),
}

/// Result of a window-open request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowOpenAction {
    /// Handed to the system opener; no window was created
    OpenedExternally,
    Denied,
}

/// Default window size in logical pixels
pub const DEFAULT_SIZE: (u32, u32) = (1024, 768);

#[derive(Debug)]
struct WindowState {
    size: (u32, u32),
    visible: bool,
    minimized: bool,
    focused: bool,
    destroyed: bool,
    devtools_open: bool,
    content: Option<WindowContent>,
    globals: Option<Arc<UiGlobals>>,
}

/// A top-level window
///
/// Created hidden by [`HostApp::create_window`]. Every mutating call fails
/// with [`Error::WindowDestroyed`] once the window is closed.
#[derive(Debug)]
pub struct Window {
    id: Uuid,
    preferences: WebPreferences,
    ipc: IpcRenderer,
    app: Weak<HostApp>,
    state: Mutex<WindowState>,
}

impl Window {
    pub(crate) fn new(
        id: Uuid,
        preferences: WebPreferences,
        ipc: IpcRenderer,
        app: Weak<HostApp>,
    ) -> Self {
        Self {
            id,
            preferences,
            ipc,
            app,
            state: Mutex::new(WindowState {
                size: DEFAULT_SIZE,
                visible: false,
                minimized: false,
                focused: false,
                destroyed: false,
                devtools_open: false,
                content: None,
                globals: None,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn preferences(&self) -> &WebPreferences {
        &self.preferences
    }

    /// IPC client of this window's UI context
    pub fn ipc(&self) -> &IpcRenderer {
        &self.ipc
    }

    fn state(&self) -> MutexGuard<'_, WindowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn live_state(&self) -> Result<MutexGuard<'_, WindowState>> {
        let state = self.state();
        if state.destroyed {
            return Err(Error::WindowDestroyed(self.id));
        }
        Ok(state)
    }

    /// Load a remote or dev-server URL
    pub async fn load_url(&self, url: &Url) -> Result<()> {
        self.live_state()?;
        let globals = self.run_preload().await;
        let mut state = self.live_state()?;
        state.content = Some(WindowContent::Url(url.clone()));
        state.globals = Some(globals);
        info!(window = %self.id, url = %url, "loaded url");
        Ok(())
    }

    /// Load a bundled entry point from disk
    pub async fn load_file(&self, path: &Path) -> Result<()> {
        self.live_state()?;
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(Error::RendererNotFound(path.to_path_buf()));
        }
        let globals = self.run_preload().await;
        let mut state = self.live_state()?;
        state.content = Some(WindowContent::File(path.to_path_buf()));
        state.globals = Some(globals);
        info!(window = %self.id, path = %path.display(), "loaded file");
        Ok(())
    }

    /// Build the UI namespace for a fresh page load
    async fn run_preload(&self) -> Arc<UiGlobals> {
        let Some(preload) = &self.preferences.preload else {
            warn!(window = %self.id, "no preload configured; capabilities unavailable");
            return UiGlobals::empty();
        };

        if !self.preferences.context_isolation {
            warn!(window = %self.id, "context isolation is off; refusing to install bridge");
            return UiGlobals::empty();
        }

        if let PreloadScript::File(path) = preload {
            let exists = tokio::fs::try_exists(path).await.unwrap_or(false);
            debug!(path = %path.display(), exists, "preload check");
            if !exists {
                warn!(window = %self.id, path = %path.display(), "preload script missing");
                return UiGlobals::empty();
            }
        }

        match exposed_capabilities(self.ipc.clone()).and_then(install) {
            Ok(globals) => {
                debug!(window = %self.id, bindings = globals.binding_count(), "bridge installed");
                globals
            }
            Err(e) => {
                warn!(window = %self.id, error = %e, "bridge installation failed");
                UiGlobals::empty()
            }
        }
    }

    /// Sealed UI namespace of the current page, if anything is loaded
    pub fn globals(&self) -> Option<Arc<UiGlobals>> {
        self.state().globals.clone()
    }

    /// Capability object as UI code of the current page sees it
    pub fn ui_api(&self) -> UiApi {
        match self.globals() {
            Some(globals) => attach_api_from_globals(&globals),
            None => attach_api_from_globals(&UiGlobals::empty()),
        }
    }

    pub fn content(&self) -> Option<WindowContent> {
        self.state().content.clone()
    }

    pub fn size(&self) -> (u32, u32) {
        self.state().size
    }

    pub fn set_size(&self, width: u32, height: u32) -> Result<()> {
        let mut state = self.live_state()?;
        state.size = (width.max(1), height.max(1));
        Ok(())
    }

    pub fn show(&self) -> Result<()> {
        let mut state = self.live_state()?;
        state.visible = true;
        Ok(())
    }

    pub fn hide(&self) -> Result<()> {
        let mut state = self.live_state()?;
        state.visible = false;
        state.focused = false;
        Ok(())
    }

    pub fn minimize(&self) -> Result<()> {
        let mut state = self.live_state()?;
        state.minimized = true;
        state.focused = false;
        Ok(())
    }

    pub fn restore(&self) -> Result<()> {
        let mut state = self.live_state()?;
        state.minimized = false;
        state.visible = true;
        Ok(())
    }

    pub fn focus(&self) -> Result<()> {
        let mut state = self.live_state()?;
        state.focused = true;
        Ok(())
    }

    pub fn open_devtools(&self) -> Result<()> {
        let mut state = self.live_state()?;
        state.devtools_open = true;
        Ok(())
    }

    pub fn is_visible(&self) -> bool {
        self.state().visible
    }

    pub fn is_minimized(&self) -> bool {
        self.state().minimized
    }

    pub fn is_focused(&self) -> bool {
        self.state().focused
    }

    pub fn is_destroyed(&self) -> bool {
        self.state().destroyed
    }

    pub fn is_devtools_open(&self) -> bool {
        self.state().devtools_open
    }

    pub(crate) fn destroy(&self) {
        let mut state = self.state();
        state.destroyed = true;
        state.visible = false;
        state.focused = false;
        state.globals = None;
    }

    /// In-page navigation, subject to the application's origin policy
    pub fn navigate(&self, url: &Url) -> Result<()> {
        self.live_state()?;
        let allowed = self
            .app
            .upgrade()
            .is_none_or(|app| app.navigation_allowed(url));
        if !allowed {
            warn!(window = %self.id, url = %url, "blocked navigation");
            return Err(Error::NavigationBlocked(url.to_string()));
        }
        self.live_state()?.content = Some(WindowContent::Url(url.clone()));
        Ok(())
    }

    /// A page asked for a new window (link with target, `window.open`)
    pub fn request_open(&self, url: &Url) -> Result<WindowOpenAction> {
        self.live_state()?;
        match self.app.upgrade() {
            Some(app) => app.handle_window_open(url),
            None => Ok(WindowOpenAction::Denied),
        }
    }
}

//! Host application handle and windows

mod dialog;
mod events;
mod host;
mod info;
mod init;
mod instance;
mod opener;
mod paths;
mod window;

pub use dialog::{DialogProvider, LogDialog, MessageBoxKind, MessageBoxOptions, MessageBoxResult};
pub use events::AppEvent;
pub use host::{HostApp, HostAppBuilder, origin_of};
pub use info::AppInfo;
pub use init::{AppInitConfig, DEV_SERVER_URL_ENV, MODE_ENV, RendererSource, default_bundle};
pub use instance::{
    InstanceLock, LockOutcome, NoopInstanceLock, SecondInstanceReceiver, SocketInstanceLock,
};
pub use opener::{ExternalOpener, SystemOpener};
pub use paths::{AppPaths, USER_DATA_ENV};
pub use window::{PreloadScript, WebPreferences, Window, WindowContent, WindowOpenAction};

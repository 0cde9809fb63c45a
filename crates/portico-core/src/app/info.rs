//! Application description returned to UI code

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::host::HostApp;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInfo {
    pub name: String,
    pub version: String,
    pub platform: String,
    pub arch: String,
    /// Version of the portico host runtime
    pub runtime_version: String,
    pub user_data_path: PathBuf,
    pub log_path: PathBuf,
}

impl AppInfo {
    pub fn collect(app: &HostApp) -> Self {
        Self {
            name: app.name().to_string(),
            version: app.version().to_string(),
            platform: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            runtime_version: env!("CARGO_PKG_VERSION").to_string(),
            user_data_path: app.paths().user_data.clone(),
            log_path: app.paths().logs.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppPaths;

    #[test]
    fn test_wire_names_are_camel_case() {
        let app = HostApp::builder("demo")
            .version("2.0.0")
            .paths(AppPaths::under(std::path::Path::new("/data/demo")))
            .build();
        let json = serde_json::to_value(AppInfo::collect(&app)).unwrap();

        assert_eq!(json["name"], "demo");
        assert_eq!(json["version"], "2.0.0");
        assert_eq!(json["userDataPath"], "/data/demo");
        assert_eq!(json["logPath"], "/data/demo/logs");
        assert!(json.get("runtimeVersion").is_some());
    }
}

//! Well-known directories of the host application

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Environment variable overriding the user data directory
pub const USER_DATA_ENV: &str = "PORTICO_USER_DATA_DIR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppPaths {
    pub user_data: PathBuf,
    pub logs: PathBuf,
    pub desktop: PathBuf,
    pub temp: PathBuf,
}

impl AppPaths {
    /// Resolve paths for an application called `app_name`
    ///
    /// `PORTICO_USER_DATA_DIR` wins over the platform data directory.
    pub fn resolve(app_name: &str) -> Self {
        let user_data = std::env::var_os(USER_DATA_ENV)
            .map(PathBuf::from)
            .or_else(|| dirs::data_dir().map(|d| d.join(app_name)))
            .unwrap_or_else(|| PathBuf::from(".").join(format!(".{app_name}")));

        let desktop = dirs::desktop_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| user_data.clone());

        Self {
            logs: user_data.join("logs"),
            desktop,
            temp: std::env::temp_dir(),
            user_data,
        }
    }

    /// Every path rooted under `root`. Used for sandboxes and tests.
    pub fn under(root: &Path) -> Self {
        Self {
            user_data: root.to_path_buf(),
            logs: root.join("logs"),
            desktop: root.join("desktop"),
            temp: root.join("tmp"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_under_root() {
        let paths = AppPaths::under(Path::new("/srv/app"));
        assert_eq!(paths.logs, PathBuf::from("/srv/app/logs"));
        assert_eq!(paths.desktop, PathBuf::from("/srv/app/desktop"));
    }

    #[test]
    fn test_logs_live_in_user_data() {
        let paths = AppPaths::resolve("portico-test");
        assert_eq!(paths.logs, paths.user_data.join("logs"));
    }
}

//! Devtools extensions installed after ready

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::runner::{Enablement, ModuleContext, StartupModule};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevToolsExtension {
    ReactDeveloperTools,
}

impl DevToolsExtension {
    /// Web store id of the extension
    pub fn id(&self) -> &'static str {
        match self {
            Self::ReactDeveloperTools => "fmkadmapgofadopljbjfkapdkoienihi",
        }
    }
}

impl fmt::Display for DevToolsExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReactDeveloperTools => f.write_str("REACT_DEVELOPER_TOOLS"),
        }
    }
}

impl FromStr for DevToolsExtension {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "REACT_DEVELOPER_TOOLS" | "REACT" => Ok(Self::ReactDeveloperTools),
            other => Err(Error::InvalidInput(format!(
                "unknown devtools extension '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChromeDevToolsExtension {
    pub extension: DevToolsExtension,
}

impl Default for ChromeDevToolsExtension {
    fn default() -> Self {
        Self {
            extension: DevToolsExtension::ReactDeveloperTools,
        }
    }
}

impl StartupModule for ChromeDevToolsExtension {
    fn name(&self) -> &str {
        "chrome-devtools-extension"
    }

    fn enable(&self, ctx: &ModuleContext) -> Enablement {
        let app = Arc::clone(ctx.app());
        let extension = self.extension;
        Enablement::pending(async move {
            app.when_ready().await;
            if app.is_quitting() {
                return Ok(());
            }
            app.install_extension(&format!("{extension} ({})", extension.id()));
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{AppPaths, HostApp};
    use crate::runner::create_module_runner;

    #[test]
    fn test_parse_extension_names() {
        assert_eq!(
            "REACT_DEVELOPER_TOOLS".parse::<DevToolsExtension>().unwrap(),
            DevToolsExtension::ReactDeveloperTools
        );
        assert_eq!(
            "react-developer-tools".parse::<DevToolsExtension>().unwrap(),
            DevToolsExtension::ReactDeveloperTools
        );
        assert!("vue".parse::<DevToolsExtension>().is_err());
    }

    #[tokio::test]
    async fn test_installs_after_ready() {
        let app = HostApp::builder("devtools-test")
            .paths(AppPaths::under(&std::env::temp_dir().join("portico-devtools-test")))
            .build();
        let runner = create_module_runner(Arc::clone(&app)).init(ChromeDevToolsExtension::default());
        tokio::task::yield_now().await;
        assert!(app.installed_extensions().is_empty());

        app.mark_ready();
        runner.run().await.unwrap();
        assert_eq!(app.installed_extensions().len(), 1);
        assert!(app.installed_extensions()[0].starts_with("REACT_DEVELOPER_TOOLS"));
    }
}

//! Navigation and window-open policies

use std::collections::BTreeSet;

use tracing::debug;

use crate::runner::{Enablement, ModuleContext, StartupModule};

/// Windows may only navigate to these origins
#[derive(Debug, Clone, Default)]
pub struct BlockNotAllowedOrigins {
    allowed: BTreeSet<String>,
}

impl BlockNotAllowedOrigins {
    pub fn new(allowed: impl IntoIterator<Item = String>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }
}

impl StartupModule for BlockNotAllowedOrigins {
    fn name(&self) -> &str {
        "block-not-allowed-origins"
    }

    fn enable(&self, ctx: &ModuleContext) -> Enablement {
        debug!(origins = ?self.allowed, "installing navigation policy");
        ctx.app().set_allowed_origins(self.allowed.clone());
        Enablement::done()
    }
}

/// Window-open requests for these origins go to the system browser;
/// everything else is denied
#[derive(Debug, Clone, Default)]
pub struct ExternalUrls {
    allowed: BTreeSet<String>,
}

impl ExternalUrls {
    pub fn new(allowed: impl IntoIterator<Item = String>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }
}

impl StartupModule for ExternalUrls {
    fn name(&self) -> &str {
        "external-urls"
    }

    fn enable(&self, ctx: &ModuleContext) -> Enablement {
        debug!(origins = ?self.allowed, "installing external url policy");
        ctx.app().set_external_url_allow_list(self.allowed.clone());
        Enablement::done()
    }
}

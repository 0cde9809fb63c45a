//! The UI context's global namespace and the privileged installer that fills it

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde_json::Value;
use tracing::debug;

use super::capability::{Capability, CapabilityTable};
use super::key::encode_key;
use crate::error::{Error, Result};

/// Global scope seen by UI code.
///
/// Bridge bindings are fixed when the namespace is sealed. UI code may add
/// its own globals but can neither replace nor remove a binding.
#[derive(Debug, Default)]
pub struct UiGlobals {
    bindings: HashMap<String, Capability>,
    script: RwLock<HashMap<String, Value>>,
}

impl UiGlobals {
    /// A namespace no bridge ever ran for
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Look up a bridge binding by key
    pub fn binding(&self, key: &str) -> Option<&Capability> {
        self.bindings.get(key)
    }

    pub fn has_binding(&self, key: &str) -> bool {
        self.bindings.contains_key(key)
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Set a UI-authored global
    pub fn set_global(&self, key: &str, value: Value) -> Result<()> {
        if self.bindings.contains_key(key) {
            return Err(Error::InvalidInput(format!(
                "'{key}' is a bridge binding and is read-only"
            )));
        }
        self.script
            .write()
            .map_err(|_| Error::Other("UI namespace poisoned".to_string()))?
            .insert(key.to_string(), value);
        Ok(())
    }

    /// Read a UI-authored global
    pub fn global(&self, key: &str) -> Option<Value> {
        self.script.read().ok().and_then(|g| g.get(key).cloned())
    }
}

/// Installer available only to the isolated preload step.
///
/// Consumed by [`ContextBridge::seal`]; once sealed the bindings can no
/// longer change.
#[derive(Debug, Default)]
pub struct ContextBridge {
    bindings: HashMap<String, Capability>,
}

impl ContextBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `capability` under `key` in the UI namespace being prepared
    pub fn expose_in_main_world(&mut self, key: &str, capability: Capability) -> Result<()> {
        if self.bindings.contains_key(key) {
            return Err(Error::DuplicateCapability(key.to_string()));
        }
        self.bindings.insert(key.to_string(), capability);
        Ok(())
    }

    pub fn seal(self) -> Arc<UiGlobals> {
        Arc::new(UiGlobals {
            bindings: self.bindings,
            script: RwLock::new(HashMap::new()),
        })
    }
}

/// Bind every entry of `table` under its encoded key and seal the result
pub fn install(table: CapabilityTable) -> Result<Arc<UiGlobals>> {
    let mut bridge = ContextBridge::new();
    for (name, capability) in table {
        let key = encode_key(name);
        debug!(name, key = %key, "exposing capability");
        bridge.expose_in_main_world(&key, capability)?;
    }
    Ok(bridge.seal())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_install_binds_encoded_keys_only() {
        let table = CapabilityTable::new()
            .declare("versions", Capability::value(json!({"portico": "0.1.0"})))
            .unwrap();
        let globals = install(table).unwrap();

        assert_eq!(globals.binding_count(), 1);
        assert!(globals.has_binding("dmVyc2lvbnM="));
        assert!(!globals.has_binding("versions"));
    }

    #[test]
    fn test_ui_cannot_overwrite_binding() {
        let table = CapabilityTable::new()
            .declare("send", Capability::value(json!(null)))
            .unwrap();
        let globals = install(table).unwrap();

        assert!(globals.set_global("c2VuZA==", json!("hijack")).is_err());
        assert!(globals.binding("c2VuZA==").is_some());

        globals.set_global("theme", json!("dark")).unwrap();
        assert_eq!(globals.global("theme"), Some(json!("dark")));
    }

    #[test]
    fn test_duplicate_key_is_rejected() {
        let mut bridge = ContextBridge::new();
        bridge
            .expose_in_main_world("k", Capability::value(json!(1)))
            .unwrap();
        assert!(bridge
            .expose_in_main_world("k", Capability::value(json!(2)))
            .is_err());
    }

    #[test]
    fn test_empty_namespace_has_no_bindings() {
        let globals = UiGlobals::empty();
        assert_eq!(globals.binding_count(), 0);
    }
}

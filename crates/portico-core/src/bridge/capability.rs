//! Capabilities and the static table that declares them

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::error::{Error, Result};

type CapabilityFn = Arc<dyn Fn(Vec<Value>) -> BoxFuture<'static, Result<Value>> + Send + Sync>;

/// A host operation or value made available to a UI context
#[derive(Clone)]
pub enum Capability {
    /// Plain data, read directly by UI code
    Value(Value),
    /// An asynchronous operation returning one result
    Function(CapabilityFn),
}

impl Capability {
    pub fn value(value: Value) -> Self {
        Self::Value(value)
    }

    pub fn function<F, Fut>(f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        Self::Function(Arc::new(move |args| f(args).boxed()))
    }

    /// Invoke a function capability. `name` is only used for the error.
    pub async fn call(&self, name: &str, args: Vec<Value>) -> Result<Value> {
        match self {
            Self::Function(f) => f(args).await,
            Self::Value(_) => Err(Error::NotCallable(name.to_string())),
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            Self::Function(_) => None,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Self::Function(_))
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// Ordered, explicitly declared set of capabilities.
///
/// This table is the whole exposed surface: nothing outside it is ever bound
/// into a UI namespace.
#[derive(Debug, Clone, Default)]
pub struct CapabilityTable {
    entries: Vec<(&'static str, Capability)>,
}

impl CapabilityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a capability. Names are unique within a table.
    pub fn declare(mut self, name: &'static str, capability: Capability) -> Result<Self> {
        if self.contains(name) {
            return Err(Error::DuplicateCapability(name.to_string()));
        }
        self.entries.push((name, capability));
        Ok(self)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| *n == name)
    }

    pub fn get(&self, name: &str) -> Option<&Capability> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, c)| c)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(n, _)| *n).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Capability)> {
        self.entries.iter().map(|(n, c)| (*n, c))
    }
}

impl IntoIterator for CapabilityTable {
    type Item = (&'static str, Capability);
    type IntoIter = std::vec::IntoIter<(&'static str, Capability)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_function_capability_call() {
        let cap = Capability::function(|args| async move { Ok(json!(args.len())) });
        assert!(cap.is_callable());
        assert_eq!(cap.call("count", vec![json!(1), json!(2)]).await.unwrap(), json!(2));
    }

    #[tokio::test]
    async fn test_value_capability_is_not_callable() {
        let cap = Capability::value(json!({"a": 1}));
        assert_eq!(cap.as_value(), Some(&json!({"a": 1})));
        let err = cap.call("versions", vec![]).await.unwrap_err();
        assert!(matches!(err, Error::NotCallable(ref n) if n == "versions"));
    }

    #[test]
    fn test_table_rejects_duplicates_and_keeps_order() {
        let table = CapabilityTable::new()
            .declare("b", Capability::value(json!(1)))
            .unwrap()
            .declare("a", Capability::value(json!(2)))
            .unwrap();
        assert_eq!(table.names(), vec!["b", "a"]);

        let err = table
            .clone()
            .declare("a", Capability::value(json!(3)))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateCapability(_)));
        assert_eq!(table.len(), 2);
    }
}

//! Reload a scope of namespaces, then run user callbacks.

use std::fmt;

use tracing::debug;

use super::watcher::Reloader;
use crate::config::{self, ReloadScope};
use crate::errors::{CallbackError, ConfigurationError, Result};

pub type ReloadCallback = Box<dyn FnMut() -> Result<(), CallbackError> + Send>;

/// Resets every proxy in `scope`, then runs the registered callbacks in
/// the order they were first added.
pub struct ReloadCallbackChain {
    scope: ReloadScope,
    callbacks: Vec<(String, ReloadCallback)>,
}

impl ReloadCallbackChain {
    pub fn new(scope: ReloadScope) -> Self {
        Self {
            scope,
            callbacks: Vec::new(),
        }
    }

    /// A chain over every namespace.
    pub fn all() -> Self {
        Self::new(ReloadScope::All)
    }

    pub fn for_namespace(name: impl Into<String>) -> Self {
        Self::new(ReloadScope::namespace(name))
    }

    pub fn scope(&self) -> &ReloadScope {
        &self.scope
    }

    /// Add a callback. An existing `id` keeps its position and gets the new callback.
    pub fn add<F>(&mut self, id: impl Into<String>, callback: F)
    where
        F: FnMut() -> Result<(), CallbackError> + Send + 'static,
    {
        let id = id.into();
        let callback: ReloadCallback = Box::new(callback);
        match self.callbacks.iter_mut().find(|(existing, _)| *existing == id) {
            Some((_, slot)) => *slot = callback,
            None => self.callbacks.push((id, callback)),
        }
    }

    pub fn remove(&mut self, id: &str) -> Result<()> {
        let index = self
            .callbacks
            .iter()
            .position(|(existing, _)| existing == id)
            .ok_or_else(|| ConfigurationError::UnknownCallback(id.to_string()))?;
        drop(self.callbacks.remove(index));
        Ok(())
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.callbacks.iter().map(|(id, _)| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl Default for ReloadCallbackChain {
    fn default() -> Self {
        Self::new(ReloadScope::default())
    }
}

impl fmt::Debug for ReloadCallbackChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReloadCallbackChain")
            .field("scope", &self.scope)
            .field("callbacks", &self.ids().collect::<Vec<_>>())
            .finish()
    }
}

impl Reloader for ReloadCallbackChain {
    /// Stops at the first failing callback; later callbacks do not run.
    fn reload(&mut self) -> Result<()> {
        config::reload(&self.scope);
        for (id, callback) in &mut self.callbacks {
            debug!(callback = %id, "Running reload callback");
            callback().map_err(|source| ConfigurationError::Callback {
                id: id.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessors::NamespaceGetters;
    use std::sync::{Arc, Mutex};

    fn recorder(
        log: &Arc<Mutex<Vec<String>>>,
        name: &str,
    ) -> impl FnMut() -> Result<(), CallbackError> + Send + 'static {
        let log = Arc::clone(log);
        let name = name.to_string();
        move || {
            log.lock().unwrap().push(name.clone());
            Ok(())
        }
    }

    #[test]
    fn test_callbacks_run_in_insertion_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = ReloadCallbackChain::for_namespace("chain_order");
        chain.add("first", recorder(&log, "first"));
        chain.add("second", recorder(&log, "second"));
        chain.add("first", recorder(&log, "first-replaced"));
        assert_eq!(chain.ids().collect::<Vec<_>>(), ["first", "second"]);

        chain.reload().unwrap();
        assert_eq!(*log.lock().unwrap(), ["first-replaced", "second"]);
    }

    #[test]
    fn test_remove_unknown_callback() {
        let mut chain = ReloadCallbackChain::all();
        chain.add("only", || Ok(()));
        chain.remove("only").unwrap();
        assert!(chain.is_empty());
        assert!(matches!(
            chain.remove("only"),
            Err(ConfigurationError::UnknownCallback(id)) if id == "only"
        ));
    }

    #[test]
    fn test_remove_keeps_remaining_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = ReloadCallbackChain::for_namespace("chain_remove_order");
        chain.add("a", recorder(&log, "a"));
        chain.add("b", recorder(&log, "b"));
        chain.add("c", recorder(&log, "c"));
        chain.remove("b").unwrap();
        assert_eq!(chain.ids().collect::<Vec<_>>(), ["a", "c"]);

        chain.reload().unwrap();
        assert_eq!(*log.lock().unwrap(), ["a", "c"]);
    }

    #[test]
    fn test_failing_callback_stops_chain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut chain = ReloadCallbackChain::for_namespace("chain_failure");
        chain.add("ok", recorder(&log, "ok"));
        chain.add("broken", || Err("boom".into()));
        chain.add("skipped", recorder(&log, "skipped"));

        let err = chain.reload().unwrap_err();
        assert!(matches!(&err, ConfigurationError::Callback { id, .. } if id == "broken"));
        assert!(err.to_string().contains("boom"));
        assert_eq!(*log.lock().unwrap(), ["ok"]);
    }

    #[test]
    fn test_reload_resets_only_its_scope() {
        let ours = NamespaceGetters::new("chain_scope_ours").get_int("n").build();
        let theirs = NamespaceGetters::new("chain_scope_theirs").get_int("n").build();
        ours.namespace().set("n", serde_json::json!(1));
        theirs.namespace().set("n", serde_json::json!(1));
        assert_eq!(ours, 1);
        assert_eq!(theirs, 1);

        ours.namespace().set("n", serde_json::json!(2));
        theirs.namespace().set("n", serde_json::json!(2));
        ReloadCallbackChain::for_namespace("chain_scope_ours")
            .reload()
            .unwrap();
        assert_eq!(ours, 2);
        assert_eq!(theirs, 1);
    }
}

//! Process-wide mapping of namespace names to namespaces.
//!
//! The global registry is created on first use with an empty `DEFAULT`
//! namespace and lives for the rest of the process. The only way to wipe it
//! is [`reset`], which is compiled into test builds (or with the `testing`
//! feature) and nowhere else.

use std::sync::{Arc, LazyLock};

use dashmap::DashMap;
use tracing::debug;

use super::help::ConfigHelp;
use super::namespace::Namespace;
use crate::errors::Result;
use crate::proxy::ProxyFactory;

/// Name of the namespace used when none is given.
pub const DEFAULT: &str = "DEFAULT";

/// Which namespaces a reload or validation pass covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReloadScope {
    All,
    Namespace(String),
}

impl ReloadScope {
    pub fn namespace(name: impl Into<String>) -> Self {
        Self::Namespace(name.into())
    }
}

impl Default for ReloadScope {
    fn default() -> Self {
        Self::Namespace(DEFAULT.to_string())
    }
}

pub struct NamespaceRegistry {
    namespaces: DashMap<String, Arc<Namespace>>,
    help: ConfigHelp,
    factory: ProxyFactory,
}

impl NamespaceRegistry {
    pub fn new() -> Self {
        let namespaces = DashMap::new();
        namespaces.insert(DEFAULT.to_string(), Arc::new(Namespace::new(DEFAULT)));
        Self {
            namespaces,
            help: ConfigHelp::default(),
            factory: ProxyFactory::default(),
        }
    }

    /// Get the namespace called `name`, creating an empty one if needed.
    pub fn get_namespace(&self, name: &str) -> Arc<Namespace> {
        if let Some(ns) = self.namespaces.get(name) {
            return Arc::clone(ns.value());
        }
        let entry = self
            .namespaces
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Namespace::new(name)));
        Arc::clone(entry.value())
    }

    /// Names of every namespace created so far, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.namespaces.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    fn in_scope(&self, scope: &ReloadScope) -> Vec<Arc<Namespace>> {
        match scope {
            ReloadScope::All => self
                .namespaces
                .iter()
                .map(|e| Arc::clone(e.value()))
                .collect(),
            ReloadScope::Namespace(name) => vec![self.get_namespace(name)],
        }
    }

    /// Reset every proxy in scope so its next access re-reads the namespace.
    pub fn reload(&self, scope: &ReloadScope) {
        for namespace in self.in_scope(scope) {
            let proxies = namespace.proxies();
            debug!(namespace = %namespace.name(), proxies = proxies.len(), "Resetting value proxies");
            for proxy in proxies {
                proxy.reset();
            }
        }
    }

    /// Resolve every proxy in scope, failing on the first missing or invalid value.
    pub fn validate(&self, scope: &ReloadScope) -> Result<()> {
        for namespace in self.in_scope(scope) {
            for proxy in namespace.proxies() {
                proxy.check()?;
            }
        }
        Ok(())
    }

    pub fn help(&self) -> &ConfigHelp {
        &self.help
    }

    pub(crate) fn factory(&self) -> &ProxyFactory {
        &self.factory
    }

    /// Clear every namespace's values and proxy registrations, and the help text.
    pub fn reset(&self) {
        for entry in self.namespaces.iter() {
            entry.value().reset();
        }
        self.help.clear();
        self.factory.clear();
    }
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static REGISTRY: LazyLock<NamespaceRegistry> = LazyLock::new(NamespaceRegistry::new);

/// The process-wide registry.
pub fn registry() -> &'static NamespaceRegistry {
    &REGISTRY
}

pub fn get_namespace(name: &str) -> Arc<Namespace> {
    REGISTRY.get_namespace(name)
}

pub fn namespace_names() -> Vec<String> {
    REGISTRY.names()
}

pub fn reload(scope: &ReloadScope) {
    REGISTRY.reload(scope)
}

pub fn reload_namespace(name: &str) {
    REGISTRY.reload(&ReloadScope::namespace(name))
}

pub fn reload_all() {
    REGISTRY.reload(&ReloadScope::All)
}

pub fn validate(scope: &ReloadScope) -> Result<()> {
    REGISTRY.validate(scope)
}

/// Help text for every key declared through getters or schemas.
pub fn view_help() -> String {
    REGISTRY.help().view_help()
}

/// Wipe the global registry. Test suites only.
#[cfg(any(test, feature = "testing"))]
pub fn reset() {
    REGISTRY.reset()
}

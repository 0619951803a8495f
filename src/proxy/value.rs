//! The deferred, cached handle to one configuration key.

use std::fmt;
use std::sync::{Arc, Weak};

use arc_swap::ArcSwapOption;
use serde_json::Value;
use tracing::debug;

use crate::config::{Namespace, ProxyHandle};
use crate::errors::{ConfigurationError, Result};
use crate::validation::Validator;

/// Read `key` from `namespace` (falling back to `default`) and validate it.
pub(crate) fn extract_value<T>(
    namespace: &Namespace,
    key: &str,
    default: Option<&Value>,
    validator: &Validator<T>,
) -> Result<T> {
    let raw = namespace
        .get(key, default)
        .ok_or_else(|| ConfigurationError::MissingValue {
            namespace: namespace.name().to_string(),
            key: key.to_string(),
        })?;
    validator
        .validate(&raw)
        .map_err(|source| ConfigurationError::InvalidValue {
            namespace: namespace.name().to_string(),
            key: key.to_string(),
            value: raw.to_string(),
            source,
        })
}

struct ProxyState<T> {
    namespace: Arc<Namespace>,
    key: String,
    validator: Validator<T>,
    default: Option<Value>,
    cache: ArcSwapOption<T>,
}

impl<T> ProxyState<T> {
    fn resolve(&self) -> Result<Arc<T>> {
        if let Some(value) = self.cache.load_full() {
            return Ok(value);
        }
        let value = Arc::new(extract_value(
            &self.namespace,
            &self.key,
            self.default.as_ref(),
            &self.validator,
        )?);
        debug!(namespace = %self.namespace.name(), key = %self.key, "Resolved value proxy");
        self.cache.store(Some(Arc::clone(&value)));
        Ok(value)
    }
}

impl<T: Send + Sync> ProxyHandle for ProxyState<T> {
    fn config_key(&self) -> &str {
        &self.key
    }

    fn reset(&self) {
        self.cache.store(None);
    }

    fn check(&self) -> Result<()> {
        self.resolve().map(|_| ())
    }
}

/// A lazily resolved, cached view of one key in one namespace.
///
/// Proxies can be created before any configuration is loaded. The first
/// access reads the raw value, runs the validator and caches the result;
/// later accesses return the cache until [`ValueProxy::reset`] (normally
/// via a namespace reload) clears it.
///
/// Clones share the same cache.
pub struct ValueProxy<T> {
    state: Arc<ProxyState<T>>,
}

impl<T> Clone for ValueProxy<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: Send + Sync + 'static> ValueProxy<T> {
    /// Create an unregistered proxy. `default: None` means the key is required.
    pub fn new(
        validator: Validator<T>,
        namespace: Arc<Namespace>,
        key: impl Into<String>,
        default: Option<Value>,
    ) -> Self {
        Self {
            state: Arc::new(ProxyState {
                namespace,
                key: key.into(),
                validator,
                default,
                cache: ArcSwapOption::empty(),
            }),
        }
    }

    /// Register with the bound namespace so reloads reach this proxy.
    pub fn register(&self) {
        self.state.namespace.register_proxy(self.downgrade());
    }

    pub(crate) fn downgrade(&self) -> Weak<dyn ProxyHandle> {
        let weak: Weak<ProxyState<T>> = Arc::downgrade(&self.state);
        weak
    }

    pub(crate) fn handle(&self) -> Arc<dyn ProxyHandle> {
        let handle: Arc<ProxyState<T>> = Arc::clone(&self.state);
        handle
    }

    /// The typed value, resolving it on first use.
    pub fn resolve(&self) -> Result<Arc<T>> {
        self.state.resolve()
    }

    /// Forget the cached value. The namespace is left untouched.
    pub fn reset(&self) {
        self.state.reset();
    }

    pub fn is_resolved(&self) -> bool {
        self.state.cache.load().is_some()
    }

    /// The typed value.
    ///
    /// # Panics
    ///
    /// Panics with the [`ConfigurationError`] message when the value is
    /// missing or invalid. Use [`ValueProxy::resolve`] to handle that case.
    pub fn value(&self) -> Arc<T> {
        match self.resolve() {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }

    /// Run `f` against the typed value.
    ///
    /// # Panics
    ///
    /// As [`ValueProxy::value`].
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value())
    }

    pub fn try_with<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R> {
        self.resolve().map(|value| f(&value))
    }

    pub fn namespace(&self) -> &Arc<Namespace> {
        &self.state.namespace
    }

    pub fn key(&self) -> &str {
        &self.state.key
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.state.default.as_ref()
    }

    pub fn validator(&self) -> &Validator<T> {
        &self.state.validator
    }

    /// Whether two handles share one cache.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl<T: Clone + Send + Sync + 'static> ValueProxy<T> {
    /// An owned copy of the typed value.
    ///
    /// # Panics
    ///
    /// As [`ValueProxy::value`].
    pub fn get(&self) -> T {
        T::clone(&self.value())
    }

    pub fn try_get(&self) -> Result<T> {
        self.resolve().map(|value| T::clone(&value))
    }
}

impl<T: fmt::Debug> fmt::Debug for ValueProxy<T> {
    /// Shows the cached value if there is one; never triggers resolution.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cached = self.state.cache.load_full();
        f.debug_struct("ValueProxy")
            .field("namespace", &self.state.namespace.name())
            .field("key", &self.state.key)
            .field("value", &cached)
            .finish()
    }
}

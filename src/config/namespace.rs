//! A named bucket of flat configuration values.
//!
//! The namespace owns its values. Proxies bound to it are only tracked
//! weakly: the namespace can enumerate the ones still alive (for reload,
//! validation and unknown-key detection) but never keeps one alive.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tracing::info;

use crate::errors::{ConfigurationError, Result};

/// Flat mapping of dotted keys to raw values.
pub type ConfigData = BTreeMap<String, Value>;

/// What a namespace needs from a proxy bound to it.
pub trait ProxyHandle: Send + Sync {
    /// The dotted key this proxy reads.
    fn config_key(&self) -> &str;

    /// Drop the cached value so the next access re-reads the namespace.
    fn reset(&self);

    /// Resolve (and cache) the value, reporting missing or invalid data.
    fn check(&self) -> Result<()>;
}

pub struct Namespace {
    name: String,
    values: RwLock<ConfigData>,
    proxies: Mutex<Vec<Weak<dyn ProxyHandle>>>,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: RwLock::new(ConfigData::new()),
            proxies: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Track `proxy` without owning it. Registering the same proxy twice is a no-op.
    pub fn register_proxy(&self, proxy: Weak<dyn ProxyHandle>) {
        let mut proxies = self.proxies.lock();
        proxies.retain(|p| p.strong_count() > 0);
        if !proxies.iter().any(|p| p.ptr_eq(&proxy)) {
            proxies.push(proxy);
        }
    }

    /// Proxies bound to this namespace that are still alive.
    pub fn proxies(&self) -> Vec<Arc<dyn ProxyHandle>> {
        let mut proxies = self.proxies.lock();
        proxies.retain(|p| p.strong_count() > 0);
        proxies.iter().filter_map(Weak::upgrade).collect()
    }

    /// Keys that at least one live proxy expects.
    pub fn known_keys(&self) -> BTreeSet<String> {
        self.proxies()
            .iter()
            .map(|p| p.config_key().to_string())
            .collect()
    }

    /// Check `data` for unknown and duplicate keys, then merge it in.
    ///
    /// With `error_on_unknown` (resp. `error_on_duplicate`) unset, the
    /// offending keys are only logged and the merge goes ahead; new values
    /// win over existing ones.
    pub fn apply(
        &self,
        data: ConfigData,
        error_on_unknown: bool,
        error_on_duplicate: bool,
    ) -> Result<()> {
        self.validate_keys(&data, error_on_unknown)?;
        self.check_duplicate_keys(&data, error_on_duplicate)?;
        self.values.write().extend(data);
        Ok(())
    }

    fn validate_keys(&self, data: &ConfigData, error_on_unknown: bool) -> Result<()> {
        let known = self.known_keys();
        let unknown: Vec<String> = data
            .keys()
            .filter(|key| !known.contains(*key))
            .cloned()
            .collect();
        if unknown.is_empty() {
            return Ok(());
        }
        if error_on_unknown {
            return Err(ConfigurationError::UnknownKeys {
                namespace: self.name.clone(),
                keys: unknown,
            });
        }
        info!(namespace = %self.name, keys = ?unknown, "Unexpected value in configuration");
        Ok(())
    }

    fn check_duplicate_keys(&self, data: &ConfigData, error_on_duplicate: bool) -> Result<()> {
        let duplicates: Vec<String> = {
            let values = self.values.read();
            data.keys()
                .filter(|key| values.contains_key(*key))
                .cloned()
                .collect()
        };
        if duplicates.is_empty() {
            return Ok(());
        }
        if error_on_duplicate {
            return Err(ConfigurationError::DuplicateKeys {
                namespace: self.name.clone(),
                keys: duplicates,
            });
        }
        info!(namespace = %self.name, keys = ?duplicates, "Duplicate keys in configuration");
        Ok(())
    }

    /// Raw value for `key`, or `default` when absent. No validation.
    pub fn get(&self, key: &str, default: Option<&Value>) -> Option<Value> {
        self.values
            .read()
            .get(key)
            .or(default)
            .cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.values.write().insert(key.into(), value);
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }

    /// Snapshot of the current values.
    pub fn values(&self) -> ConfigData {
        self.values.read().clone()
    }

    /// Swap in a whole new value mapping, bypassing key checks.
    pub fn replace_values(&self, data: ConfigData) -> ConfigData {
        std::mem::replace(&mut *self.values.write(), data)
    }

    /// Empty the values; proxy registrations are kept.
    pub fn clear(&self) {
        self.values.write().clear();
    }

    /// Forget values and proxies alike.
    pub(crate) fn reset(&self) {
        self.clear();
        self.proxies.lock().clear();
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("name", &self.name)
            .field("values", &self.values.read().len())
            .field("proxies", &self.proxies.lock().len())
            .finish()
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Namespace({})", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubProxy {
        key: String,
        resets: AtomicUsize,
    }

    impl StubProxy {
        fn new(key: &str) -> Arc<Self> {
            Arc::new(Self {
                key: key.to_string(),
                resets: AtomicUsize::new(0),
            })
        }
    }

    impl ProxyHandle for StubProxy {
        fn config_key(&self) -> &str {
            &self.key
        }

        fn reset(&self) {
            self.resets.fetch_add(1, Ordering::SeqCst);
        }

        fn check(&self) -> Result<()> {
            Ok(())
        }
    }

    fn data(pairs: &[(&str, Value)]) -> ConfigData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_apply_merges_flat_keys() {
        let ns = Namespace::new("merge");
        ns.apply(data(&[("a.b", json!(1)), ("a.c", json!(2))]), false, false)
            .unwrap();
        assert_eq!(ns.get("a.b", None), Some(json!(1)));
        assert_eq!(ns.get("a.c", None), Some(json!(2)));
        assert_eq!(ns.len(), 2);
    }

    #[test]
    fn test_apply_duplicate_strict() {
        let ns = Namespace::new("dupes");
        ns.apply(data(&[("a.b", json!(1)), ("a.c", json!(2))]), false, false)
            .unwrap();
        let err = ns
            .apply(data(&[("a.b", json!(5))]), false, true)
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateKeys { .. }));
        assert!(err.to_string().contains("a.b"));
        // Rejected merge leaves the old value in place.
        assert_eq!(ns.get("a.b", None), Some(json!(1)));
    }

    #[test]
    fn test_apply_duplicate_lenient_new_value_wins() {
        let ns = Namespace::new("dupes_lenient");
        ns.apply(data(&[("a", json!(1))]), false, false).unwrap();
        ns.apply(data(&[("a", json!(2))]), false, false).unwrap();
        assert_eq!(ns.get("a", None), Some(json!(2)));
    }

    #[test]
    fn test_apply_unknown_keys() {
        let ns = Namespace::new("unknown");
        let proxy = StubProxy::new("known");
        let weak: Weak<dyn ProxyHandle> = Arc::downgrade(&proxy) as Weak<dyn ProxyHandle>;
        ns.register_proxy(weak);

        ns.apply(data(&[("known", json!(1))]), true, false).unwrap();

        let err = ns
            .apply(data(&[("stranger", json!(1))]), true, false)
            .unwrap_err();
        match err {
            ConfigurationError::UnknownKeys { namespace, keys } => {
                assert_eq!(namespace, "unknown");
                assert_eq!(keys, vec!["stranger".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }

        // Lenient mode only logs.
        ns.apply(data(&[("stranger", json!(1))]), false, false).unwrap();
        assert!(ns.contains_key("stranger"));
    }

    #[test]
    fn test_get_default_and_clear() {
        let ns = Namespace::new("defaults");
        assert_eq!(ns.get("missing", Some(&json!("fallback"))), Some(json!("fallback")));
        assert_eq!(ns.get("missing", None), None);
        ns.set("present", json!(true));
        assert_eq!(ns.get("present", Some(&json!(false))), Some(json!(true)));

        let proxy = StubProxy::new("present");
        ns.register_proxy(Arc::downgrade(&proxy) as Weak<dyn ProxyHandle>);
        ns.clear();
        assert!(ns.is_empty());
        assert_eq!(ns.proxies().len(), 1);
    }

    #[test]
    fn test_proxies_are_weak() {
        let ns = Namespace::new("weak");
        let kept = StubProxy::new("kept");
        ns.register_proxy(Arc::downgrade(&kept) as Weak<dyn ProxyHandle>);
        ns.register_proxy(Arc::downgrade(&kept) as Weak<dyn ProxyHandle>);
        {
            let dropped = StubProxy::new("dropped");
            ns.register_proxy(Arc::downgrade(&dropped) as Weak<dyn ProxyHandle>);
            assert_eq!(ns.known_keys().len(), 2);
        }
        assert_eq!(ns.proxies().len(), 1);
        assert_eq!(ns.known_keys().into_iter().collect::<Vec<_>>(), vec!["kept"]);
    }

    #[test]
    fn test_reset_forgets_everything() {
        let ns = Namespace::new("reset");
        let proxy = StubProxy::new("a");
        ns.register_proxy(Arc::downgrade(&proxy) as Weak<dyn ProxyHandle>);
        ns.set("a", json!(1));
        ns.reset();
        assert!(ns.is_empty());
        assert!(ns.proxies().is_empty());
    }
}

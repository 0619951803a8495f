//! Deduplicating proxy construction.

use std::any::Any;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;

use super::value::ValueProxy;
use crate::config::{KeyDescription, Namespace, NamespaceRegistry};
use crate::validation::Validator;

/// Hands out one proxy per (namespace, validator, key, default).
///
/// Deduping is an optimization: two proxies with the same identity would
/// resolve to the same value anyway. The factory does keep its proxies
/// alive, so reloads always reach them.
#[derive(Default)]
pub struct ProxyFactory {
    proxies: DashMap<String, Arc<dyn Any + Send + Sync>>,
}

fn identity(namespace: &str, validator: &str, key: &str, default: Option<&Value>) -> String {
    match default {
        Some(value) => format!("{namespace}\u{0}{validator}\u{0}{key}\u{0}{value}"),
        None => format!("{namespace}\u{0}{validator}\u{0}{key}"),
    }
}

impl ProxyFactory {
    /// Return the existing proxy for this identity, or build, register and remember a new one.
    pub fn build<T: Send + Sync + 'static>(
        &self,
        registry: &NamespaceRegistry,
        validator: Validator<T>,
        namespace: Arc<Namespace>,
        key: &str,
        default: Option<Value>,
        help: Option<String>,
    ) -> ValueProxy<T> {
        let id = identity(namespace.name(), validator.name(), key, default.as_ref());
        if let Some(existing) = self.proxies.get(&id) {
            if let Some(proxy) = existing.value().downcast_ref::<ValueProxy<T>>() {
                return proxy.clone();
            }
        }

        let proxy = ValueProxy::new(validator, namespace, key, default);
        register_value_proxy(registry, &proxy, help);
        self.proxies.insert(id, Arc::new(proxy.clone()));
        proxy
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    pub(crate) fn clear(&self) {
        self.proxies.clear();
    }
}

/// Register `proxy` with its namespace and record its help text.
pub fn register_value_proxy<T: Send + Sync + 'static>(
    registry: &NamespaceRegistry,
    proxy: &ValueProxy<T>,
    help: Option<String>,
) {
    proxy.register();
    registry.help().add(
        proxy.namespace().name(),
        KeyDescription {
            name: proxy.key().to_string(),
            type_name: proxy.validator().type_name().to_string(),
            default: proxy.default_value().cloned(),
            help,
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation;
    use serde_json::json;

    #[test]
    fn test_build_dedupes_by_identity() {
        let registry = NamespaceRegistry::new();
        let ns = registry.get_namespace("factory");
        let factory = ProxyFactory::default();

        let a = factory.build(&registry, validation::int(), Arc::clone(&ns), "k", None, None);
        let b = factory.build(&registry, validation::int(), Arc::clone(&ns), "k", None, None);
        assert!(a.ptr_eq(&b));

        let with_default =
            factory.build(&registry, validation::int(), Arc::clone(&ns), "k", Some(json!(1)), None);
        assert!(!a.ptr_eq(&with_default));

        let as_string = factory.build(&registry, validation::string(), Arc::clone(&ns), "k", None, None);
        assert_eq!(as_string.key(), "k");

        assert_eq!(factory.len(), 3);
        assert_eq!(ns.proxies().len(), 3);
        assert!(registry.help().view_help().contains("k (Type: int, Default: 1)"));
    }
}

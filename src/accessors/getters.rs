//! Getters return value proxies, so they can be called before any
//! configuration is loaded.
//!
//! ```
//! use staticconf::accessors::getters::{self, NamespaceGetters};
//!
//! // A proxy into the DEFAULT namespace, usable later as an i64.
//! let max_cycles = getters::get_int("max_cycles").default(10).build();
//!
//! let special = NamespaceGetters::new("special");
//! let ratio = special.get_float("ratio").help("share of traffic").build();
//! # let _ = (max_cycles, ratio);
//! ```

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;

use crate::config::{registry, NamespaceRegistry, DEFAULT};
use crate::proxy::ValueProxy;
use crate::validation::{self, Validator};

/// Getters bound to one namespace.
#[derive(Clone, Copy)]
pub struct NamespaceGetters<'r> {
    namespace: &'r str,
    registry: &'r NamespaceRegistry,
}

impl<'r> NamespaceGetters<'r> {
    /// Getters over the process-wide registry.
    pub fn new(namespace: &'r str) -> Self {
        Self::with_registry(registry(), namespace)
    }

    pub fn with_registry(registry: &'r NamespaceRegistry, namespace: &'r str) -> Self {
        Self {
            namespace,
            registry,
        }
    }

    pub fn namespace(&self) -> &str {
        self.namespace
    }

    /// Getter for an arbitrary validator.
    pub fn get_with<T>(&self, validator: Validator<T>, key: &str) -> GetterBuilder<'r, T> {
        GetterBuilder {
            registry: self.registry,
            namespace: self.namespace.to_string(),
            validator,
            key: key.to_string(),
            default: None,
            help: None,
        }
    }
}

/// Options for one getter call; finish with [`GetterBuilder::build`].
#[must_use = "call build() to obtain the proxy"]
pub struct GetterBuilder<'r, T> {
    registry: &'r NamespaceRegistry,
    namespace: String,
    validator: Validator<T>,
    key: String,
    default: Option<Value>,
    help: Option<String>,
}

impl<T: Send + Sync + 'static> GetterBuilder<'_, T> {
    /// Raw value used (and validated) when the key is absent.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.help = Some(text.into());
        self
    }

    /// Read from `name` instead of the getters' namespace.
    pub fn namespace(mut self, name: impl Into<String>) -> Self {
        self.namespace = name.into();
        self
    }

    pub fn build(self) -> ValueProxy<T> {
        let namespace = self.registry.get_namespace(&self.namespace);
        self.registry.factory().build(
            self.registry,
            self.validator,
            namespace,
            &self.key,
            self.default,
            self.help,
        )
    }
}

macro_rules! getters {
    ($($method:ident: $ty:ty = $validator:expr;)*) => {
        impl<'r> NamespaceGetters<'r> {
            $(
                pub fn $method(&self, key: &str) -> GetterBuilder<'r, $ty> {
                    self.get_with($validator, key)
                }
            )*
        }

        $(
            /// Getter in the `DEFAULT` namespace.
            pub fn $method(key: &str) -> GetterBuilder<'static, $ty> {
                NamespaceGetters::new(DEFAULT).$method(key)
            }
        )*
    };
}

getters! {
    get: Value = validation::any();
    get_string: String = validation::string();
    get_bool: bool = validation::boolean();
    get_int: i64 = validation::int();
    get_float: f64 = validation::float();
    get_date: NaiveDate = validation::date();
    get_datetime: NaiveDateTime = validation::datetime();
    get_time: NaiveTime = validation::time();
    get_list: Vec<Value> = validation::list();
    get_regex: regex::Regex = validation::regex();
    get_log_level: tracing::Level = validation::log_level();
    get_list_of_string: Vec<String> = validation::list_of(validation::string());
    get_list_of_bool: Vec<bool> = validation::list_of(validation::boolean());
    get_list_of_int: Vec<i64> = validation::list_of(validation::int());
    get_list_of_float: Vec<f64> = validation::list_of(validation::float());
    get_set_of_string: BTreeSet<String> = validation::set_of(validation::string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReloadScope;
    use serde_json::json;

    #[test]
    fn test_getter_default_then_reload() {
        let registry = NamespaceRegistry::new();
        let getters = NamespaceGetters::with_registry(&registry, "getters_reload");
        let limit = getters.get_int("limit").default(10).build();
        assert_eq!(limit, 10);

        let ns = registry.get_namespace("getters_reload");
        ns.apply([("limit".to_string(), json!("42"))].into(), false, false)
            .unwrap();
        assert_eq!(limit, 10);

        registry.reload(&ReloadScope::namespace("getters_reload"));
        assert_eq!(limit, 42);
    }

    #[test]
    fn test_getters_share_proxies() {
        let registry = NamespaceRegistry::new();
        let getters = NamespaceGetters::with_registry(&registry, "getters_shared");
        let a = getters.get_string("name").build();
        let b = getters.get_string("name").build();
        assert!(a.ptr_eq(&b));
        let other = getters.get_string("name").namespace("elsewhere").build();
        assert!(!a.ptr_eq(&other));
        assert_eq!(other.namespace().name(), "elsewhere");
    }

    #[test]
    fn test_getter_registers_known_keys_and_help() {
        let registry = NamespaceRegistry::new();
        let getters = NamespaceGetters::with_registry(&registry, "getters_help");
        let _ratio = getters.get_float("ratio").default(0.5).help("share").build();
        let _hosts = getters.get_list_of_string("hosts").build();

        let ns = registry.get_namespace("getters_help");
        assert_eq!(
            ns.known_keys().into_iter().collect::<Vec<_>>(),
            vec!["hosts".to_string(), "ratio".to_string()]
        );
        let help = registry.help().view_help();
        assert!(help.contains("ratio (Type: float, Default: 0.5)\nshare"));
        assert!(help.contains("hosts (Type: list_of_string, Default: <Undefined>)"));
    }

    #[test]
    fn test_default_namespace_getter() {
        let proxy = get_bool("getters.default_namespace.flag").default(true).build();
        assert_eq!(proxy.namespace().name(), DEFAULT);
        assert_eq!(proxy, true);
    }
}

//! Readers validate and return the current value on every call. Nothing is
//! cached and nothing is registered, so a reader never shows up in help
//! output or in a namespace's known keys.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;

use crate::config::{registry, NamespaceRegistry, DEFAULT};
use crate::errors::Result;
use crate::proxy::extract_value;
use crate::validation::{self, Validator};

/// Readers bound to one namespace.
#[derive(Clone, Copy)]
pub struct NamespaceReaders<'r> {
    namespace: &'r str,
    registry: &'r NamespaceRegistry,
}

impl<'r> NamespaceReaders<'r> {
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

    /// Read `key` with an arbitrary validator.
    pub fn read_with<T>(
        &self,
        validator: &Validator<T>,
        key: &str,
        default: Option<&Value>,
    ) -> Result<T> {
        let namespace = self.registry.get_namespace(self.namespace);
        extract_value(&namespace, key, default, validator)
    }
}

macro_rules! readers {
    ($($method:ident / $method_or:ident: $ty:ty = $validator:expr;)*) => {
        impl NamespaceReaders<'_> {
            $(
                pub fn $method(&self, key: &str) -> Result<$ty> {
                    self.read_with(&$validator, key, None)
                }

                pub fn $method_or(&self, key: &str, default: impl Into<Value>) -> Result<$ty> {
                    self.read_with(&$validator, key, Some(&default.into()))
                }
            )*
        }

        $(
            /// Read from the `DEFAULT` namespace.
            pub fn $method(key: &str) -> Result<$ty> {
                NamespaceReaders::new(DEFAULT).$method(key)
            }
        )*
    };
}

readers! {
    read / read_or: Value = validation::any();
    read_string / read_string_or: String = validation::string();
    read_bool / read_bool_or: bool = validation::boolean();
    read_int / read_int_or: i64 = validation::int();
    read_float / read_float_or: f64 = validation::float();
    read_date / read_date_or: NaiveDate = validation::date();
    read_datetime / read_datetime_or: NaiveDateTime = validation::datetime();
    read_time / read_time_or: NaiveTime = validation::time();
    read_list / read_list_or: Vec<Value> = validation::list();
    read_regex / read_regex_or: regex::Regex = validation::regex();
    read_log_level / read_log_level_or: tracing::Level = validation::log_level();
    read_list_of_string / read_list_of_string_or: Vec<String> = validation::list_of(validation::string());
    read_list_of_bool / read_list_of_bool_or: Vec<bool> = validation::list_of(validation::boolean());
    read_list_of_int / read_list_of_int_or: Vec<i64> = validation::list_of(validation::int());
    read_list_of_float / read_list_of_float_or: Vec<f64> = validation::list_of(validation::float());
    read_set_of_string / read_set_of_string_or: BTreeSet<String> = validation::set_of(validation::string());
}

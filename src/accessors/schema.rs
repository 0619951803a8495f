//! Declarative groups of value proxies.
//!
//! A schema binds a set of named fields to one namespace, optionally under
//! a common key prefix:
//!
//! ```
//! use staticconf::accessors::schema::{SchemaBuilder, ValueTypeDefinition};
//! use staticconf::validation;
//!
//! let mut builder = SchemaBuilder::new("schema_doc").config_path("db");
//! let host = builder.field(
//!     "host",
//!     ValueTypeDefinition::new(validation::string()).default("localhost"),
//! );
//! let port = builder.field(
//!     "port",
//!     ValueTypeDefinition::new(validation::int()).config_key("port_number"),
//! );
//! let schema = builder.build();
//!
//! assert_eq!(host.key(), "db.host");
//! assert_eq!(port.key(), "db.port_number");
//! assert_eq!(schema.names().collect::<Vec<_>>(), ["host", "port"]);
//! ```

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::config::{registry, Namespace, NamespaceRegistry, ProxyHandle};
use crate::errors::{ConfigurationError, Result};
use crate::proxy::{register_value_proxy, ValueProxy};
use crate::validation::Validator;

/// Type, key and default for one schema field.
pub struct ValueTypeDefinition<T> {
    validator: Validator<T>,
    config_key: Option<String>,
    default: Option<Value>,
    help: Option<String>,
}

impl<T> ValueTypeDefinition<T> {
    pub fn new(validator: Validator<T>) -> Self {
        Self {
            validator,
            config_key: None,
            default: None,
            help: None,
        }
    }

    /// Key to read instead of the field name.
    pub fn config_key(mut self, key: impl Into<String>) -> Self {
        self.config_key = Some(key.into());
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.help = Some(text.into());
        self
    }
}

impl<T> From<Validator<T>> for ValueTypeDefinition<T> {
    fn from(validator: Validator<T>) -> Self {
        Self::new(validator)
    }
}

struct SchemaField {
    proxy: Arc<dyn Any + Send + Sync>,
    handle: Arc<dyn ProxyHandle>,
}

pub struct SchemaBuilder<'r> {
    registry: &'r NamespaceRegistry,
    namespace: Arc<Namespace>,
    config_path: Option<String>,
    fields: BTreeMap<String, SchemaField>,
}

impl SchemaBuilder<'static> {
    pub fn new(namespace: &str) -> Self {
        Self::with_registry(registry(), namespace)
    }
}

impl<'r> SchemaBuilder<'r> {
    pub fn with_registry(registry: &'r NamespaceRegistry, namespace: &str) -> Self {
        Self {
            registry,
            namespace: registry.get_namespace(namespace),
            config_path: None,
            fields: BTreeMap::new(),
        }
    }

    /// Prefix joined with `.` to every field's key.
    pub fn config_path(mut self, path: impl Into<String>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    fn full_key(&self, key: &str) -> String {
        match &self.config_path {
            Some(path) if !path.is_empty() => format!("{path}.{key}"),
            _ => key.to_string(),
        }
    }

    /// Declare a field. Redeclaring a name replaces the earlier field.
    pub fn field<T: Send + Sync + 'static>(
        &mut self,
        name: &str,
        definition: impl Into<ValueTypeDefinition<T>>,
    ) -> ValueProxy<T> {
        let definition = definition.into();
        let key = self.full_key(definition.config_key.as_deref().unwrap_or(name));
        let proxy = ValueProxy::new(
            definition.validator,
            Arc::clone(&self.namespace),
            key,
            definition.default,
        );
        if let Some(previous) = self.fields.get(name) {
            self.registry
                .help()
                .remove(self.namespace.name(), previous.handle.config_key());
        }
        register_value_proxy(self.registry, &proxy, definition.help);
        self.fields.insert(
            name.to_string(),
            SchemaField {
                proxy: Arc::new(proxy.clone()),
                handle: proxy.handle(),
            },
        );
        proxy
    }

    pub fn build(self) -> Schema {
        Schema {
            namespace: self.namespace,
            fields: self.fields,
        }
    }
}

/// A built schema: named proxies sharing one namespace.
pub struct Schema {
    namespace: Arc<Namespace>,
    fields: BTreeMap<String, SchemaField>,
}

impl Schema {
    pub fn namespace(&self) -> &Arc<Namespace> {
        &self.namespace
    }

    /// The proxy declared as `name`. Fails if no such field exists or it
    /// was declared with a different type.
    pub fn field<T: Send + Sync + 'static>(&self, name: &str) -> Result<ValueProxy<T>> {
        self.fields
            .get(name)
            .and_then(|field| field.proxy.downcast_ref::<ValueProxy<T>>())
            .cloned()
            .ok_or_else(|| ConfigurationError::UnknownAccessor(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Clear the cached value of every field.
    pub fn reset(&self) {
        for field in self.fields.values() {
            field.handle.reset();
        }
    }

    /// Resolve every field, failing on the first missing or invalid value.
    pub fn validate(&self) -> Result<()> {
        self.fields.values().try_for_each(|field| field.handle.check())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReloadScope;
    use crate::validation;
    use serde_json::json;

    fn db_schema(registry: &NamespaceRegistry, namespace: &str) -> Schema {
        let mut builder = SchemaBuilder::with_registry(registry, namespace).config_path("db");
        builder.field(
            "host",
            ValueTypeDefinition::new(validation::string()).default("localhost"),
        );
        builder.field("port", validation::int());
        builder.field(
            "replicas",
            ValueTypeDefinition::new(validation::list_of(validation::string()))
                .config_key("replica_hosts")
                .default(json!([]))
                .help("read replicas"),
        );
        builder.build()
    }

    #[test]
    fn test_schema_fields_read_prefixed_keys() {
        let registry = NamespaceRegistry::new();
        let schema = db_schema(&registry, "schema_prefixed");
        let ns = Arc::clone(schema.namespace());
        ns.apply(
            [
                ("db.port".to_string(), json!(5432)),
                ("db.replica_hosts".to_string(), json!(["r1"])),
            ]
            .into(),
            true,
            false,
        )
        .unwrap();

        assert_eq!(schema.field::<String>("host").unwrap(), "localhost");
        assert_eq!(schema.field::<i64>("port").unwrap(), 5432);
        assert_eq!(
            *schema.field::<Vec<String>>("replicas").unwrap().value(),
            vec!["r1".to_string()]
        );
        assert!(schema.validate().is_ok());
        assert!(registry
            .help()
            .view_help()
            .contains("db.replica_hosts (Type: list_of_string, Default: [])\nread replicas"));
    }

    #[test]
    fn test_schema_redeclared_field_described_once() {
        let registry = NamespaceRegistry::new();
        let mut builder =
            SchemaBuilder::with_registry(&registry, "schema_redeclare").config_path("db");
        builder.field("port", validation::int());
        builder.field(
            "port",
            ValueTypeDefinition::new(validation::int())
                .default(5432)
                .help("listen port"),
        );
        let schema = builder.build();

        let text = registry.help().view_help();
        assert_eq!(text.matches("db.port (Type").count(), 1);
        assert!(text.contains("db.port (Type: int, Default: 5432)\nlisten port"));
        assert_eq!(schema.field::<i64>("port").unwrap(), 5432);
    }

    #[test]
    fn test_schema_unknown_accessor() {
        let registry = NamespaceRegistry::new();
        let schema = db_schema(&registry, "schema_unknown");
        assert!(matches!(
            schema.field::<i64>("missing"),
            Err(ConfigurationError::UnknownAccessor(name)) if name == "missing"
        ));
        // Declared as an i64.
        assert!(schema.field::<String>("port").is_err());
    }

    #[test]
    fn test_schema_validate_reports_missing_field() {
        let registry = NamespaceRegistry::new();
        let schema = db_schema(&registry, "schema_missing");
        let err = schema.validate().unwrap_err();
        assert!(err.to_string().contains("db.port"));
    }

    #[test]
    fn test_schema_follows_reload() {
        let registry = NamespaceRegistry::new();
        let schema = db_schema(&registry, "schema_reload");
        let port = schema.field::<i64>("port").unwrap();
        schema.namespace().set("db.port", json!(1));
        assert_eq!(port, 1);

        schema.namespace().set("db.port", json!(2));
        schema.reset();
        assert_eq!(port, 2);

        schema.namespace().set("db.port", json!(3));
        registry.reload(&ReloadScope::namespace("schema_reload"));
        assert_eq!(port, 3);
    }
}

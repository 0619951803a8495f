//! Turning configuration sources into namespace data.
//!
//! # Data Flow
//! ```text
//! source (file, map, list)
//!     → formats.rs (parse into a nested serde_json::Value)
//!     → load_config_data() (optional sources degrade to an empty map)
//!     → flatten() (nested objects become dotted keys)
//!     → Namespace::apply() for LoaderOptions.namespace
//! ```
//!
//! Every format loader returns the flat data it applied, which is also what
//! a [`crate::reload::ConfigurationWatcher`] loader is expected to return.

pub mod formats;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::config::{get_namespace, ConfigData, DEFAULT};
use crate::errors::Result;

pub use formats::{
    auto_configuration, dict_configuration, json_configuration, list_configuration,
    loader_for_path, properties_configuration, toml_configuration, yaml_configuration, FileLoader,
};

/// Where and how loaded data is merged.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoaderOptions {
    /// Target namespace.
    pub namespace: String,

    /// Fail on keys no proxy has been declared for.
    pub error_on_unknown: bool,

    /// Fail on keys the namespace already holds.
    pub error_on_duplicate: bool,

    /// Treat a failing source as empty.
    pub optional: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            namespace: DEFAULT.to_string(),
            error_on_unknown: false,
            error_on_duplicate: false,
            optional: false,
        }
    }
}

impl LoaderOptions {
    pub fn for_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn strict(mut self) -> Self {
        self.error_on_unknown = true;
        self.error_on_duplicate = true;
        self
    }
}

/// Object key marking a [`ConfigMap`] once serialized.
pub const CONFIG_MAP_TAG: &str = "__config_map__";

/// A mapping that loaders keep whole instead of flattening, so it can be
/// read back with [`crate::validation::map_of`].
///
/// ```
/// use serde_json::json;
/// use staticconf::loader::ConfigMap;
///
/// let limits = ConfigMap::new(json!({"reads": 10}).as_object().cloned().unwrap_or_default());
/// assert_eq!(json!({"limits": limits}), json!({"limits": {"__config_map__": {"reads": 10}}}));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ConfigMap {
    #[serde(rename = "__config_map__")]
    pub values: Map<String, Value>,
}

impl ConfigMap {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    /// The wrapped mapping when `value` is a serialized `ConfigMap`.
    pub fn unwrap_tagged(value: &Map<String, Value>) -> Option<&Map<String, Value>> {
        match value.get(CONFIG_MAP_TAG) {
            Some(Value::Object(inner)) if value.len() == 1 => Some(inner),
            _ => None,
        }
    }
}

impl From<ConfigMap> for Value {
    fn from(map: ConfigMap) -> Self {
        let mut tagged = Map::new();
        tagged.insert(CONFIG_MAP_TAG.to_string(), Value::Object(map.values));
        Value::Object(tagged)
    }
}

/// Flatten nested objects into dotted keys.
///
/// Arrays, scalars and [`ConfigMap`]s are leaves; a `ConfigMap` is stored
/// as its plain inner object. A root that is not an object yields an
/// empty map.
pub fn flatten(nested: &Value) -> ConfigData {
    let mut flat = ConfigData::new();
    if let Value::Object(map) = nested {
        flatten_into(&mut flat, None, map);
    }
    flat
}

fn flatten_into(flat: &mut ConfigData, prefix: Option<&str>, map: &Map<String, Value>) {
    for (key, value) in map {
        let full_key = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.clone(),
        };
        match value {
            Value::Object(child) => match ConfigMap::unwrap_tagged(child) {
                Some(inner) => {
                    flat.insert(full_key, Value::Object(inner.clone()));
                }
                None => flatten_into(flat, Some(&full_key), child),
            },
            leaf => {
                flat.insert(full_key, leaf.clone());
            }
        }
    }
}

/// Run `producer`. When the source is optional a failure is logged and an
/// empty object is returned instead.
pub fn load_config_data<F>(options: &LoaderOptions, producer: F) -> Result<Value>
where
    F: FnOnce() -> Result<Value>,
{
    match producer() {
        Ok(value) => Ok(value),
        Err(e) if options.optional => {
            info!(namespace = %options.namespace, error = %e, "Optional configuration failed");
            Ok(Value::Object(Map::new()))
        }
        Err(e) => Err(e),
    }
}

/// Flatten `nested` and merge it into the target namespace.
pub fn apply_loaded(nested: &Value, options: &LoaderOptions) -> Result<ConfigData> {
    let data = flatten(nested);
    get_namespace(&options.namespace).apply(
        data.clone(),
        options.error_on_unknown,
        options.error_on_duplicate,
    )?;
    Ok(data)
}

/// [`load_config_data`] followed by [`apply_loaded`]; the building block of
/// every format loader.
pub fn load_with<F>(options: &LoaderOptions, producer: F) -> Result<ConfigData>
where
    F: FnOnce() -> Result<Value>,
{
    let nested = load_config_data(options, producer)?;
    apply_loaded(&nested, options)
}

type BoxedLoader = Box<dyn FnMut() -> Result<ConfigData> + Send>;

/// An ordered list of loaders that are always run together.
///
/// ```no_run
/// use std::path::Path;
/// use staticconf::loader::{self, CompositeConfiguration, LoaderOptions};
///
/// let mut composite = CompositeConfiguration::new();
/// composite.append(|| loader::yaml_configuration(Path::new("base.yaml"), &LoaderOptions::default()));
/// composite.append(|| {
///     loader::yaml_configuration(Path::new("local.yaml"), &LoaderOptions::default().optional(true))
/// });
/// let merged = composite.load()?;
/// # Ok::<(), staticconf::ConfigurationError>(())
/// ```
#[derive(Default)]
pub struct CompositeConfiguration {
    loaders: Vec<BoxedLoader>,
}

impl CompositeConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append<F>(&mut self, loader: F)
    where
        F: FnMut() -> Result<ConfigData> + Send + 'static,
    {
        self.loaders.push(Box::new(loader));
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }

    /// Run every loader in order and merge what they return, later wins.
    pub fn load(&mut self) -> Result<ConfigData> {
        let mut merged = ConfigData::new();
        for loader in &mut self.loaders {
            merged.extend(loader()?);
        }
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ConfigurationError;
    use serde_json::json;

    #[test]
    fn test_flatten_nested_objects() {
        let flat = flatten(&json!({
            "a": {"b": {"c": 1}, "d": [1, {"e": 2}]},
            "f": null,
        }));
        assert_eq!(flat.len(), 3);
        assert_eq!(flat["a.b.c"], json!(1));
        assert_eq!(flat["a.d"], json!([1, {"e": 2}]));
        assert_eq!(flat["f"], Value::Null);

        assert!(flatten(&json!([1, 2])).is_empty());
        assert!(flatten(&Value::Null).is_empty());
    }

    #[test]
    fn test_flatten_keeps_config_map_whole() {
        let mut values = Map::new();
        values.insert("reads".to_string(), json!(10));
        values.insert("nested".to_string(), json!({"x": 1}));
        let limits = ConfigMap::new(values);
        let flat = flatten(&json!({
            "svc": {"limits": limits, "name": "api"},
            "plain": {"__config_map__": {"a": 1}, "other": 2},
        }));
        assert_eq!(flat["svc.limits"], json!({"reads": 10, "nested": {"x": 1}}));
        assert_eq!(flat["svc.name"], json!("api"));
        // Only a lone tag marks a ConfigMap.
        assert_eq!(flat["plain.__config_map__.a"], json!(1));
        assert_eq!(flat["plain.other"], json!(2));
    }

    #[test]
    fn test_config_map_resolves_with_map_of() {
        let mut values = Map::new();
        values.insert("reads".to_string(), json!(10));
        values.insert("writes".to_string(), json!("5"));
        formats::dict_configuration(
            &json!({"quota": ConfigMap::new(values)}),
            &LoaderOptions::for_namespace("loader_config_map"),
        )
        .unwrap();

        let quota = crate::accessors::NamespaceGetters::new("loader_config_map")
            .get_with(crate::validation::map_of(crate::validation::int()), "quota")
            .build();
        let expected: std::collections::BTreeMap<String, i64> =
            [("reads".to_string(), 10), ("writes".to_string(), 5)].into();
        assert_eq!(*quota.value(), expected);
    }

    #[test]
    fn test_optional_source_degrades_to_empty() {
        let options = LoaderOptions::for_namespace("loader_optional").optional(true);
        let data = load_with(&options, || Err(ConfigurationError::Load("gone".into()))).unwrap();
        assert!(data.is_empty());

        let required = LoaderOptions::for_namespace("loader_optional");
        let err = load_with(&required, || Err(ConfigurationError::Load("gone".into())));
        assert!(matches!(err, Err(ConfigurationError::Load(_))));
    }

    #[test]
    fn test_apply_loaded_merges_into_namespace() {
        let options = LoaderOptions::for_namespace("loader_apply");
        let data = apply_loaded(&json!({"db": {"port": 5432}}), &options).unwrap();
        assert_eq!(data["db.port"], json!(5432));
        assert_eq!(
            get_namespace("loader_apply").get("db.port", None),
            Some(json!(5432))
        );

        let strict = LoaderOptions::for_namespace("loader_apply").strict();
        let err = apply_loaded(&json!({"db": {"port": 1}}), &strict).unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownKeys { .. }));
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: LoaderOptions = toml::from_str("namespace = \"billing\"").unwrap();
        assert_eq!(options.namespace, "billing");
        assert!(!options.optional);
        let options: LoaderOptions = toml::from_str("").unwrap();
        assert_eq!(options, LoaderOptions::default());
    }

    #[test]
    fn test_composite_later_wins() {
        let mut composite = CompositeConfiguration::new();
        composite.append(|| Ok([("a".to_string(), json!(1)), ("b".to_string(), json!(1))].into()));
        composite.append(|| Ok([("b".to_string(), json!(2))].into()));
        assert_eq!(composite.len(), 2);

        let merged = composite.load().unwrap();
        assert_eq!(merged["a"], json!(1));
        assert_eq!(merged["b"], json!(2));
    }
}

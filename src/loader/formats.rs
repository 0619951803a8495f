//! Format loaders. Each parses one kind of source into a nested value and
//! hands it to [`load_with`].

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use super::{load_with, LoaderOptions};
use crate::config::ConfigData;
use crate::errors::{ConfigurationError, Result};

/// Signature shared by all file based loaders.
pub type FileLoader = fn(&Path, &LoaderOptions) -> Result<ConfigData>;

/// Files tried by [`auto_configuration`], in order.
const AUTO_CONFIGURATIONS: &[(&str, FileLoader)] = &[
    ("config.yaml", yaml_configuration),
    ("config.json", json_configuration),
    ("config.toml", toml_configuration),
    ("config.properties", properties_configuration),
];

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| ConfigurationError::io(path, e))
}

fn parse_json(path: &Path) -> Result<Value> {
    let content = read_source(path)?;
    serde_json::from_str(&content).map_err(|e| ConfigurationError::parse(path, e))
}

fn parse_toml(path: &Path) -> Result<Value> {
    let content = read_source(path)?;
    toml::from_str(&content).map_err(|e| ConfigurationError::parse(path, e))
}

fn parse_yaml(path: &Path) -> Result<Value> {
    let content = read_source(path)?;
    let value: Value =
        serde_yaml::from_str(&content).map_err(|e| ConfigurationError::parse(path, e))?;
    // An empty document is an empty configuration.
    Ok(match value {
        Value::Null => Value::Object(Map::new()),
        other => other,
    })
}

fn parse_properties(path: &Path) -> Result<Value> {
    let content = read_source(path)?;
    let mut map = Map::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = line
            .split_once(['=', ':'])
            .ok_or_else(|| ConfigurationError::parse(path, format!("Invalid properties line: {line}")))?;
        map.insert(key.trim().to_string(), Value::String(value.trim().to_string()));
    }
    Ok(Value::Object(map))
}

pub fn json_configuration(path: &Path, options: &LoaderOptions) -> Result<ConfigData> {
    load_with(options, || parse_json(path))
}

pub fn toml_configuration(path: &Path, options: &LoaderOptions) -> Result<ConfigData> {
    load_with(options, || parse_toml(path))
}

pub fn yaml_configuration(path: &Path, options: &LoaderOptions) -> Result<ConfigData> {
    load_with(options, || parse_yaml(path))
}

/// `key=value` or `key: value` lines; `#` starts a comment line. Values
/// stay strings.
pub fn properties_configuration(path: &Path, options: &LoaderOptions) -> Result<ConfigData> {
    load_with(options, || parse_properties(path))
}

/// Load from an in-memory (possibly nested) object.
pub fn dict_configuration(data: &Value, options: &LoaderOptions) -> Result<ConfigData> {
    load_with(options, || Ok(data.clone()))
}

/// Load from `key=value` strings, as given on a command line.
pub fn list_configuration<S: AsRef<str>>(
    items: &[S],
    options: &LoaderOptions,
) -> Result<ConfigData> {
    load_with(options, || {
        items
            .iter()
            .map(|item| {
                let item = item.as_ref();
                item.split_once('=')
                    .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
                    .ok_or_else(|| ConfigurationError::Load(format!("Invalid list item: {item}")))
            })
            .collect::<Result<Map<_, _>>>()
            .map(Value::Object)
    })
}

/// Load the first of `config.yaml`, `config.json`, `config.toml` and
/// `config.properties` found in `base_dir`.
pub fn auto_configuration(base_dir: &Path, options: &LoaderOptions) -> Result<ConfigData> {
    let found = AUTO_CONFIGURATIONS
        .iter()
        .map(|(name, loader)| (base_dir.join(name), *loader))
        .find(|(path, _)| path.is_file());
    match found {
        Some((path, loader)) => loader(&path, options),
        None => load_with(options, || {
            Err(ConfigurationError::Load(
                "Failed to auto-load configuration. No configuration files found.".to_string(),
            ))
        }),
    }
}

/// Pick a file loader from the path's extension.
pub fn loader_for_path(path: &Path) -> Option<FileLoader> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let loader: FileLoader = match extension.as_str() {
        "json" => json_configuration,
        "toml" => toml_configuration,
        "yaml" | "yml" => yaml_configuration,
        "properties" => properties_configuration,
        _ => return None,
    };
    Some(loader)
}

//! Help text for declared configuration keys.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use serde_json::Value;

use super::registry::DEFAULT;

/// One declared key, as recorded by the accessor factories.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyDescription {
    pub name: String,
    pub type_name: String,
    pub default: Option<Value>,
    pub help: Option<String>,
}

impl KeyDescription {
    fn render(&self) -> String {
        let default = match &self.default {
            Some(value) => value.to_string(),
            None => "<Undefined>".to_string(),
        };
        format!(
            "{} (Type: {}, Default: {})\n{}",
            self.name,
            self.type_name,
            default,
            self.help.as_deref().unwrap_or("")
        )
    }
}

#[derive(Debug, Default)]
pub struct ConfigHelp {
    descriptions: Mutex<BTreeMap<String, Vec<KeyDescription>>>,
}

impl ConfigHelp {
    pub fn add(&self, namespace: &str, description: KeyDescription) {
        self.descriptions
            .lock()
            .entry(namespace.to_string())
            .or_default()
            .push(description);
    }

    /// Forget every description of `key` in `namespace`.
    pub fn remove(&self, namespace: &str, key: &str) {
        if let Some(entries) = self.descriptions.lock().get_mut(namespace) {
            entries.retain(|description| description.name != key);
        }
    }

    /// Every described key grouped by namespace, `DEFAULT` first.
    pub fn view_help(&self) -> String {
        let descriptions = self.descriptions.lock();
        let mut namespaces: Vec<&String> = descriptions.keys().collect();
        // Keys come out of the map sorted; the stable sort only lifts DEFAULT.
        namespaces.sort_by_key(|name| name.as_str() != DEFAULT);

        namespaces
            .into_iter()
            .map(|name| {
                let mut entries: Vec<String> =
                    descriptions[name].iter().map(KeyDescription::render).collect();
                entries.sort();
                format!("\nNamespace: {}\n{}", name, entries.join("\n"))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn clear(&self) {
        self.descriptions.lock().clear();
    }
}

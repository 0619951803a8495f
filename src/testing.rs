//! Helpers for testing code that reads configuration.
//!
//! ```
//! use serde_json::json;
//! use staticconf::accessors::NamespaceGetters;
//! use staticconf::testing::MockConfiguration;
//!
//! let threads = NamespaceGetters::new("mock_doc").get_int("pool.threads").build();
//! {
//!     let _mock = MockConfiguration::new("mock_doc", json!({"pool": {"threads": 4}})).setup();
//!     assert_eq!(threads, 4);
//! }
//! assert!(threads.resolve().is_err());
//! ```

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::config::{get_namespace, reload_namespace, ConfigData, Namespace};
use crate::loader::flatten;

/// Mock values for one namespace.
#[derive(Debug, Clone)]
pub struct MockConfiguration {
    namespace: Arc<Namespace>,
    data: ConfigData,
}

impl MockConfiguration {
    /// `data` may be nested; it is flattened like loaded configuration.
    pub fn new(namespace: &str, data: Value) -> Self {
        Self {
            namespace: get_namespace(namespace),
            data: flatten(&data),
        }
    }

    /// Swap the mock values in and reload the namespace. The previous
    /// values come back when the guard is dropped.
    #[must_use = "the mock values are removed when the guard is dropped"]
    pub fn setup(&self) -> MockGuard {
        let previous = self.namespace.replace_values(self.data.clone());
        reload_namespace(self.namespace.name());
        debug!(namespace = %self.namespace.name(), "Mock configuration installed");
        MockGuard {
            namespace: Arc::clone(&self.namespace),
            previous,
        }
    }
}

/// Restores a namespace's values on drop.
#[derive(Debug)]
pub struct MockGuard {
    namespace: Arc<Namespace>,
    previous: ConfigData,
}

impl Drop for MockGuard {
    fn drop(&mut self) {
        self.namespace.replace_values(std::mem::take(&mut self.previous));
        reload_namespace(self.namespace.name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessors::NamespaceGetters;
    use serde_json::json;

    #[test]
    fn test_mock_configuration_restores_values() {
        let ns = get_namespace("testing_restore");
        ns.set("mode", json!("real"));
        let mode = NamespaceGetters::new("testing_restore").get_string("mode").build();
        assert_eq!(mode, "real");

        let mock = MockConfiguration::new("testing_restore", json!({"mode": "mocked", "extra": {"a": 1}}));
        {
            let _guard = mock.setup();
            assert_eq!(mode, "mocked");
            assert_eq!(ns.get("extra.a", None), Some(json!(1)));
        }
        assert_eq!(mode, "real");
        assert!(!ns.contains_key("extra.a"));
    }
}

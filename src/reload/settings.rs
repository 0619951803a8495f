//! Watch settings, for embedding in a host application's config file.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::comparator::ComparatorKind;

/// How a [`super::ConfigFacade`] polls its file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchSettings {
    /// Minimum seconds between two looks at the file.
    pub min_interval_secs: u64,

    /// Change detectors, consulted in order.
    pub comparators: Vec<ComparatorKind>,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            min_interval_secs: 0,
            comparators: vec![ComparatorKind::Mtime],
        }
    }
}

impl WatchSettings {
    pub fn min_interval(&self) -> Duration {
        Duration::from_secs(self.min_interval_secs)
    }
}

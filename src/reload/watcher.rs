//! Throttled polling of configuration files.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::chain::ReloadCallbackChain;
use super::comparator::{Comparator, ComparatorKind, MTimeComparator};
use crate::config::ConfigData;
use crate::errors::{ConfigurationError, Result};

/// Re-reads the configuration sources and returns the flat data they applied.
pub type ConfigLoader = Box<dyn FnMut() -> Result<ConfigData> + Send>;

/// Invoked after the loader on every reload.
pub trait Reloader: Send {
    fn reload(&mut self) -> Result<()>;
}

impl Reloader for Box<dyn FnMut() -> Result<()> + Send> {
    fn reload(&mut self) -> Result<()> {
        self()
    }
}

/// Watches a set of files and reloads when any of them changes.
///
/// Nothing runs in the background: the host calls
/// [`ConfigurationWatcher::reload_if_changed`] from its own loop, and
/// `min_interval` limits how often that call actually looks at the files.
pub struct ConfigurationWatcher<R: Reloader = ReloadCallbackChain> {
    loader: ConfigLoader,
    filenames: Vec<PathBuf>,
    min_interval: Duration,
    last_check: Instant,
    comparators: Vec<Box<dyn Comparator>>,
    reloader: R,
}

impl ConfigurationWatcher<ReloadCallbackChain> {
    /// Watch `paths` with a modification time comparator and a reloader
    /// over every namespace.
    pub fn new<F, P>(
        loader: F,
        paths: impl IntoIterator<Item = P>,
        min_interval: Duration,
    ) -> Result<Self>
    where
        F: FnMut() -> Result<ConfigData> + Send + 'static,
        P: AsRef<Path>,
    {
        let filenames = normalize_paths(paths)?;
        let comparators: Vec<Box<dyn Comparator>> =
            vec![Box::new(MTimeComparator::new(&filenames))];
        Ok(Self {
            loader: Box::new(loader),
            filenames,
            min_interval,
            last_check: Instant::now(),
            comparators,
            reloader: ReloadCallbackChain::all(),
        })
    }
}

fn normalize_paths<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>) -> Result<Vec<PathBuf>> {
    let mut filenames = paths
        .into_iter()
        .map(|path| {
            let path = path.as_ref();
            std::path::absolute(path).map_err(|e| ConfigurationError::io(path, e))
        })
        .collect::<Result<Vec<_>>>()?;
    filenames.sort();
    filenames.dedup();
    if filenames.is_empty() {
        return Err(ConfigurationError::NoFilesToWatch);
    }
    Ok(filenames)
}

impl<R: Reloader> ConfigurationWatcher<R> {
    pub fn with_reloader<R2: Reloader>(self, reloader: R2) -> ConfigurationWatcher<R2> {
        ConfigurationWatcher {
            loader: self.loader,
            filenames: self.filenames,
            min_interval: self.min_interval,
            last_check: self.last_check,
            comparators: self.comparators,
            reloader,
        }
    }

    /// Replace the comparators with freshly built ones of the given kinds.
    /// An empty list means modification time.
    pub fn with_comparators(mut self, kinds: &[ComparatorKind]) -> Self {
        let kinds = if kinds.is_empty() {
            &[ComparatorKind::Mtime][..]
        } else {
            kinds
        };
        self.comparators = kinds.iter().map(|kind| kind.build(&self.filenames)).collect();
        self
    }

    /// Add a comparator after the existing ones.
    pub fn with_comparator(mut self, comparator: Box<dyn Comparator>) -> Self {
        self.comparators.push(comparator);
        self
    }

    pub fn should_check(&self) -> bool {
        Instant::now() >= self.last_check + self.min_interval
    }

    /// Reload if a check is due (or `force` is set) and a file changed.
    /// Returns the loaded data, or `None` when nothing was reloaded.
    pub fn reload_if_changed(&mut self, force: bool) -> Result<Option<ConfigData>> {
        if (force || self.should_check()) && self.file_modified() {
            return self.reload().map(Some);
        }
        Ok(None)
    }

    /// Ask the comparators, in order, whether anything changed. Stops at
    /// the first one that says so.
    pub fn file_modified(&mut self) -> bool {
        self.last_check = Instant::now();
        self.comparators.iter_mut().any(|comparator| comparator.has_changed())
    }

    /// Run the loader, then the reloader.
    pub fn reload(&mut self) -> Result<ConfigData> {
        let data = (self.loader)()?;
        self.reloader.reload()?;
        info!(files = ?self.filenames, keys = data.len(), "Configuration reloaded");
        Ok(data)
    }

    /// Run the loader only.
    pub fn load_config(&mut self) -> Result<ConfigData> {
        let data = (self.loader)()?;
        debug!(files = ?self.filenames, keys = data.len(), "Configuration loaded");
        Ok(data)
    }

    pub fn filenames(&self) -> &[PathBuf] {
        &self.filenames
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn reloader(&self) -> &R {
        &self.reloader
    }

    pub fn reloader_mut(&mut self) -> &mut R {
        &mut self.reloader
    }
}

impl<R: Reloader> fmt::Debug for ConfigurationWatcher<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationWatcher")
            .field("filenames", &self.filenames)
            .field("min_interval", &self.min_interval)
            .field("comparators", &self.comparators.len())
            .finish_non_exhaustive()
    }
}

//! One file, one namespace, one watcher.

use std::path::{Path, PathBuf};

use super::chain::ReloadCallbackChain;
use super::settings::WatchSettings;
use super::watcher::ConfigurationWatcher;
use crate::config::{get_namespace, ConfigData};
use crate::errors::{CallbackError, Result};
use crate::loader::LoaderOptions;

/// Build a loader that clears `namespace` and then loads `path` into it, so
/// keys removed from the file disappear on reload.
pub fn build_loader_callable<F>(
    loader_func: F,
    path: PathBuf,
    namespace: String,
) -> impl FnMut() -> Result<ConfigData> + Send + 'static
where
    F: Fn(&Path, &LoaderOptions) -> Result<ConfigData> + Send + 'static,
{
    let options = LoaderOptions::for_namespace(namespace);
    move || {
        get_namespace(&options.namespace).clear();
        loader_func(&path, &options)
    }
}

/// Convenience wrapper around a [`ConfigurationWatcher`] whose reloader is
/// a [`ReloadCallbackChain`] scoped to the loaded namespace.
///
/// ```no_run
/// use std::path::Path;
/// use staticconf::loader;
/// use staticconf::reload::{ConfigFacade, WatchSettings};
///
/// let mut facade = ConfigFacade::load(
///     Path::new("service.yaml"),
///     "service",
///     loader::yaml_configuration,
///     &WatchSettings::default(),
/// )?;
/// facade.add_callback("log", || {
///     tracing::info!("service config reloaded");
///     Ok(())
/// });
/// // Somewhere in the service's main loop:
/// facade.reload_if_changed(false)?;
/// # Ok::<(), staticconf::ConfigurationError>(())
/// ```
#[derive(Debug)]
pub struct ConfigFacade {
    watcher: ConfigurationWatcher<ReloadCallbackChain>,
}

impl ConfigFacade {
    /// Load `path` into `namespace` with `loader_func` and start watching it.
    pub fn load<F>(
        path: &Path,
        namespace: &str,
        loader_func: F,
        settings: &WatchSettings,
    ) -> Result<Self>
    where
        F: Fn(&Path, &LoaderOptions) -> Result<ConfigData> + Send + 'static,
    {
        let loader = build_loader_callable(loader_func, path.to_path_buf(), namespace.to_string());
        let mut watcher = ConfigurationWatcher::new(loader, [path], settings.min_interval())?
            .with_reloader(ReloadCallbackChain::for_namespace(namespace))
            .with_comparators(&settings.comparators);
        watcher.load_config()?;
        Ok(Self { watcher })
    }

    pub fn add_callback<F>(&mut self, id: impl Into<String>, callback: F)
    where
        F: FnMut() -> Result<(), CallbackError> + Send + 'static,
    {
        self.watcher.reloader_mut().add(id, callback);
    }

    pub fn remove_callback(&mut self, id: &str) -> Result<()> {
        self.watcher.reloader_mut().remove(id)
    }

    pub fn reload_if_changed(&mut self, force: bool) -> Result<Option<ConfigData>> {
        self.watcher.reload_if_changed(force)
    }

    pub fn watcher(&self) -> &ConfigurationWatcher<ReloadCallbackChain> {
        &self.watcher
    }

    pub fn watcher_mut(&mut self) -> &mut ConfigurationWatcher<ReloadCallbackChain> {
        &mut self.watcher
    }
}

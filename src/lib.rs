//! Lazily validated, hot-reloadable static configuration.
//!
//! Configuration values are declared up front as typed [`ValueProxy`]s and
//! resolved on first use from a named [`config::Namespace`]. Loaders merge
//! flat, dotted-key data into namespaces; a [`reload::ConfigurationWatcher`]
//! polls the source files and, when they change, reloads them and resets
//! every proxy in scope so the next access sees the new values.
//!
//! ```
//! use serde_json::json;
//! use staticconf::accessors::NamespaceGetters;
//! use staticconf::loader::{self, LoaderOptions};
//!
//! let getters = NamespaceGetters::new("crate_doc");
//! let max_workers = getters.get_int("pool.max_workers").default(4).build();
//! assert_eq!(max_workers, 4);
//!
//! loader::dict_configuration(
//!     &json!({"pool": {"max_workers": "16"}}),
//!     &LoaderOptions::for_namespace("crate_doc"),
//! )?;
//! staticconf::config::reload_namespace("crate_doc");
//! assert_eq!(max_workers + 1, 17);
//! # Ok::<(), staticconf::ConfigurationError>(())
//! ```

pub mod accessors;
pub mod config;
pub mod errors;
pub mod loader;
pub mod observability;
pub mod proxy;
pub mod reload;
pub mod testing;
pub mod validation;

pub use config::{ConfigData, ReloadScope, DEFAULT};
pub use errors::{ConfigurationError, Result, ValidationError};
pub use proxy::ValueProxy;
pub use validation::Validator;

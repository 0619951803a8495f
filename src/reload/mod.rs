//! Detecting changed configuration files and reloading them.
//!
//! # Data Flow
//! ```text
//! host loop → watcher.rs reload_if_changed(force)
//!     → should_check() (min_interval throttle)
//!     → comparator.rs has_changed() (mtime / inode / md5, first hit wins)
//!     → loader (clears and refills the namespace)
//!     → chain.rs (reset proxies in scope, then user callbacks in order)
//! ```
//!
//! # Design Decisions
//! - Polling, not OS file events: the host decides when checks happen
//! - A failing loader leaves proxies untouched; a failing callback stops
//!   the chain and is returned to the caller

pub mod chain;
pub mod comparator;
pub mod facade;
pub mod settings;
pub mod watcher;

pub use chain::{ReloadCallback, ReloadCallbackChain};
pub use comparator::{
    build_compare_func, CompareFunc, CompareValue, Comparator, ComparatorKind, InodeComparator,
    MTimeComparator, Md5Comparator,
};
pub use facade::{build_loader_callable, ConfigFacade};
pub use settings::WatchSettings;
pub use watcher::{ConfigLoader, ConfigurationWatcher, Reloader};

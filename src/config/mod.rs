//! Namespaces and the process-wide namespace registry.
//!
//! # Data Flow
//! ```text
//! loader (flat dotted keys)
//!     → registry.rs (get-or-create namespace by name)
//!     → namespace.rs apply() (unknown / duplicate key checks, merge)
//!     → value proxies bound to the namespace read lazily
//!
//! On reload:
//!     registry.rs reload(scope)
//!     → reset() on every live proxy in scope
//!     → next access re-reads the namespace
//! ```
//!
//! # Design Decisions
//! - Namespaces own their values; proxies are tracked weakly
//! - A namespace is created on first reference and never dropped
//! - Merging never resolves proxies; only reload invalidates them

pub mod help;
pub mod namespace;
pub mod registry;

pub use help::{ConfigHelp, KeyDescription};
pub use namespace::{ConfigData, Namespace, ProxyHandle};
pub use registry::{
    get_namespace, namespace_names, registry, reload, reload_all, reload_namespace, validate,
    view_help, NamespaceRegistry, ReloadScope, DEFAULT,
};

#[cfg(any(test, feature = "testing"))]
pub use registry::reset;

//! Deferred value proxies.
//!
//! # Lifecycle
//! ```text
//! declared (getter / schema field)   → unresolved, registered weakly
//! first access                       → namespace lookup + validator → cached
//! later accesses                     → cached value, no lookup
//! reload of its namespace            → reset() → unresolved again
//! ```
//!
//! # Design Decisions
//! - `resolve()` is the fallible entry point; operator and formatting
//!   traits panic on a missing or invalid value because their signatures
//!   can not return one
//! - The cache is an `ArcSwapOption`, so a reset never blocks a reader
//! - Clones share state; the namespace only holds a `Weak`

pub mod factory;
pub mod ops;
pub mod value;

pub use factory::{register_value_proxy, ProxyFactory};
pub use ops::{Collection, Numeric, Truthy};
pub use value::ValueProxy;

pub(crate) use value::extract_value;

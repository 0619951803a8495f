//! Ways for application code to read configuration.
//!
//! - [`getters`]: deferred, cached proxies created at declaration time
//! - [`readers`]: immediate reads, validated on every call
//! - [`schema`]: named groups of proxies under one key prefix

pub mod getters;
pub mod readers;
pub mod schema;

pub use getters::{GetterBuilder, NamespaceGetters};
pub use readers::NamespaceReaders;
pub use schema::{Schema, SchemaBuilder, ValueTypeDefinition};

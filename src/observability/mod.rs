//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! namespace merges, proxy resolution, comparators, reloads
//!     → tracing events with structured fields (namespace, key, files)
//!     → logging.rs subscriber (installed by binaries only)
//! ```

pub mod logging;

pub use logging::init_logging;

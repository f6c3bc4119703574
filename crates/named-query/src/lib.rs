//! Named SQL statement registry.
//!
//! Statements live in TOML resource files under a configured root directory,
//! one file per entity or group. The registry is built in a single pass at
//! startup and is read-only afterwards, so it can be shared behind an `Arc`
//! without locking.

pub mod config;
pub mod error;
pub mod registry;

pub use config::NamedQueryConfig;
pub use error::{LoadError, RegistryError, Result};
pub use registry::{QueryFile, QueryRegistry};

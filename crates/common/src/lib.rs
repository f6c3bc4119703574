//! Value model shared by the registry, the pagination engine and the executors.

pub mod types;

pub use types::{SqlType, SqlValue};

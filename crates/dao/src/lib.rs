//! Named-statement execution with count-then-window pagination.
//!
//! This crate provides:
//! - `ParameterSource` for named `:placeholder` bindings, with overlay merging
//! - `PageRequest` / `PageResult` and the pagination engine (`PageFetcher`)
//! - `StatementExecutor`, `RowMapper` and `ResultExtractor`, the seams to the database
//! - `PgExecutor` for PostgreSQL and `InMemoryExecutor` for tests
//! - `BaseDao` / `EntityDao`, which tie executors to the named-query registry

pub mod dao;
pub mod error;
pub mod executor;
pub mod memory;
pub mod named;
pub mod page;
pub mod pagination;
pub mod params;
pub mod postgres;

pub use common::{SqlType, SqlValue};
pub use dao::{BaseDao, EntityDao};
pub use error::{DaoError, Result};
pub use executor::{
    FirstRowExtractor, ResultExtractor, RowMapper, StatementExecutor, StatementExecutorExt,
};
pub use memory::{InMemoryExecutor, MemoryRow, RecordedStatement};
pub use named_query::{NamedQueryConfig, QueryRegistry, RegistryError};
pub use page::{Direction, Order, PageRequest, PageResult};
pub use pagination::{END_ROW, PageFetcher, START_ROW};
pub use params::{Parameter, ParameterSource, ToParameters};
pub use postgres::{FromRowMapper, PgExecutor};

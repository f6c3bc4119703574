use std::sync::Arc;

use async_trait::async_trait;

use crate::{DaoError, ParameterSource, Result};

/// Core trait for anything that can run named-parameter SQL.
///
/// Statements use `:name` placeholders that are resolved against the
/// supplied [`ParameterSource`]. Implementations must be thread-safe
/// (Send + Sync); the pagination engine issues its statements sequentially
/// and never shares mutable state between calls.
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    /// The raw row type handed to row mappers.
    type Row: Send + Sync + 'static;

    /// Runs a query and returns the first column of its first row.
    ///
    /// Returns `None` when the query produced no row or the value was NULL.
    async fn query_scalar(&self, sql: &str, params: &ParameterSource) -> Result<Option<i64>>;

    /// Runs a query and returns every row in result order.
    async fn query(&self, sql: &str, params: &ParameterSource) -> Result<Vec<Self::Row>>;

    /// Runs a data-modifying statement and returns the affected row count.
    async fn update(&self, sql: &str, params: &ParameterSource) -> Result<u64>;

    /// Runs an insert and returns the generated value of `key_column`.
    ///
    /// Fails with `NoRowsAffected` when the insert produced no row.
    async fn insert_returning_key(
        &self,
        sql: &str,
        params: &ParameterSource,
        key_column: &str,
    ) -> Result<i64>;

    /// Runs the same statement once per parameter source.
    ///
    /// Returns one affected-row count per source, in order. Stops at the
    /// first failure.
    async fn batch_update(&self, sql: &str, batch: &[ParameterSource]) -> Result<Vec<u64>> {
        let mut counts = Vec::with_capacity(batch.len());
        for params in batch {
            counts.push(self.update(sql, params).await?);
        }
        Ok(counts)
    }
}

/// Turns one result row into a typed value.
pub trait RowMapper<R, T>: Send + Sync {
    fn map_row(&self, row: &R) -> Result<T>;
}

impl<R, T, F> RowMapper<R, T> for F
where
    F: Fn(&R) -> Result<T> + Send + Sync,
{
    fn map_row(&self, row: &R) -> Result<T> {
        self(row)
    }
}

/// Maps every row, stopping at the first failure.
pub fn map_rows<R, T>(rows: &[R], mapper: &dyn RowMapper<R, T>) -> Result<Vec<T>> {
    rows.iter().map(|row| mapper.map_row(row)).collect()
}

/// Folds a whole result set into one value, e.g. a parent with its children
/// from a one-to-many join.
pub trait ResultExtractor<R, T>: Send + Sync {
    fn extract(&self, rows: &[R]) -> Result<T>;
}

impl<R, T, F> ResultExtractor<R, T> for F
where
    F: Fn(&[R]) -> Result<T> + Send + Sync,
{
    fn extract(&self, rows: &[R]) -> Result<T> {
        self(rows)
    }
}

/// Default extractor: maps the first row and ignores the rest.
///
/// An empty result fails with `UnexpectedRowCount`.
pub struct FirstRowExtractor<R, T> {
    mapper: Arc<dyn RowMapper<R, T>>,
}

impl<R, T> FirstRowExtractor<R, T> {
    pub fn new(mapper: Arc<dyn RowMapper<R, T>>) -> Self {
        Self { mapper }
    }
}

impl<R, T> ResultExtractor<R, T> for FirstRowExtractor<R, T> {
    fn extract(&self, rows: &[R]) -> Result<T> {
        match rows.first() {
            Some(row) => self.mapper.map_row(row),
            None => Err(DaoError::UnexpectedRowCount {
                expected: 1,
                actual: 0,
            }),
        }
    }
}

/// Extension trait providing mapped-query conveniences for executors.
#[async_trait]
pub trait StatementExecutorExt: StatementExecutor {
    /// Runs a query that must return exactly one row and maps it.
    async fn query_for_object<T: Send>(
        &self,
        sql: &str,
        params: &ParameterSource,
        mapper: &dyn RowMapper<Self::Row, T>,
    ) -> Result<T> {
        let rows = self.query(sql, params).await?;
        match rows.as_slice() {
            [row] => mapper.map_row(row),
            _ => Err(DaoError::UnexpectedRowCount {
                expected: 1,
                actual: rows.len(),
            }),
        }
    }

    /// Runs a query and maps every row.
    async fn query_for_list<T: Send>(
        &self,
        sql: &str,
        params: &ParameterSource,
        mapper: &dyn RowMapper<Self::Row, T>,
    ) -> Result<Vec<T>> {
        let rows = self.query(sql, params).await?;
        map_rows(&rows, mapper)
    }

    /// Runs a query and hands the whole result set to `extractor`.
    async fn query_with<T: Send>(
        &self,
        sql: &str,
        params: &ParameterSource,
        extractor: &dyn ResultExtractor<Self::Row, T>,
    ) -> Result<T> {
        let rows = self.query(sql, params).await?;
        extractor.extract(&rows)
    }
}

// Blanket implementation for all StatementExecutor implementations
impl<E: StatementExecutor + ?Sized> StatementExecutorExt for E {}

use std::sync::Arc;

use async_trait::async_trait;
use common::SqlValue;
use tokio::sync::RwLock;

use crate::{
    DaoError, ParameterSource, Result,
    executor::StatementExecutor,
    pagination::{END_ROW, START_ROW},
};

/// A result row held in memory: ordered `(column, value)` pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryRow {
    columns: Vec<(String, SqlValue)>,
}

impl MemoryRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.columns.push((column.into(), value.into()));
        self
    }

    /// Looks a column up by name.
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }
}

/// A statement seen by the executor, with the parameters it ran under.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStatement {
    pub sql: String,
    pub params: ParameterSource,
}

/// In-memory executor for testing.
///
/// Serves one fixed result set in place of a database: scalar queries answer
/// with the row count, and row queries return either the whole set or, when
/// `startRow`/`endRow` are bound, the 1-based inclusive slice between them.
/// Every statement is recorded for later inspection.
#[derive(Clone, Default)]
pub struct InMemoryExecutor {
    rows: Arc<Vec<MemoryRow>>,
    statements: Arc<RwLock<Vec<RecordedStatement>>>,
    failure: Option<Arc<str>>,
}

impl InMemoryExecutor {
    /// Creates an executor serving `rows`.
    pub fn new(rows: Vec<MemoryRow>) -> Self {
        Self {
            rows: Arc::new(rows),
            ..Default::default()
        }
    }

    /// Creates an executor whose every statement fails with `message`.
    pub fn failing(message: impl Into<Arc<str>>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Default::default()
        }
    }

    /// Returns the statements executed so far, oldest first.
    pub async fn statements(&self) -> Vec<RecordedStatement> {
        self.statements.read().await.clone()
    }

    /// Clears the recorded statements.
    pub async fn clear(&self) {
        self.statements.write().await.clear();
    }

    async fn record(&self, sql: &str, params: &ParameterSource) -> Result<()> {
        self.statements.write().await.push(RecordedStatement {
            sql: sql.to_string(),
            params: params.clone(),
        });
        metrics::counter!("dao_statements_total").increment(1);
        match &self.failure {
            Some(message) => Err(DaoError::QueryExecutionFailed(sqlx::Error::Protocol(
                message.to_string(),
            ))),
            None => Ok(()),
        }
    }

    fn window(&self, params: &ParameterSource) -> Option<(i64, i64)> {
        let start = params.value(START_ROW).ok()?.as_i64()?;
        let end = params.value(END_ROW).ok()?.as_i64()?;
        Some((start, end))
    }
}

#[async_trait]
impl StatementExecutor for InMemoryExecutor {
    type Row = MemoryRow;

    async fn query_scalar(&self, sql: &str, params: &ParameterSource) -> Result<Option<i64>> {
        self.record(sql, params).await?;
        Ok(Some(self.rows.len() as i64))
    }

    async fn query(&self, sql: &str, params: &ParameterSource) -> Result<Vec<MemoryRow>> {
        self.record(sql, params).await?;

        let Some((start, end)) = self.window(params) else {
            return Ok(self.rows.as_ref().clone());
        };
        let rows = self
            .rows
            .iter()
            .enumerate()
            .filter(|(index, _)| {
                let row_number = *index as i64 + 1;
                row_number >= start && row_number <= end
            })
            .map(|(_, row)| row.clone())
            .collect();
        Ok(rows)
    }

    async fn update(&self, sql: &str, params: &ParameterSource) -> Result<u64> {
        self.record(sql, params).await?;
        Ok(1)
    }

    async fn insert_returning_key(
        &self,
        sql: &str,
        params: &ParameterSource,
        _key_column: &str,
    ) -> Result<i64> {
        self.record(sql, params).await?;
        Ok(self.rows.len() as i64 + 1)
    }
}

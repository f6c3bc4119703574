use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{SqlType, SqlValue};
use sqlx::{
    PgPool, Postgres, Row,
    postgres::{PgArguments, PgRow},
    query::Query,
};
use uuid::Uuid;

use crate::{
    DaoError, ParameterSource, Result,
    dao::{BaseDao, EntityDao},
    executor::{RowMapper, StatementExecutor},
    named::{self, ParsedSql},
    params::{Parameter, ToParameters},
};

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// PostgreSQL-backed statement executor.
///
/// Named placeholders are rewritten to `$n` before each statement is sent,
/// and every referenced name must be bound in the parameter source.
#[derive(Clone)]
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    /// Creates a new PostgreSQL executor.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Binds every placeholder of `parsed`, in position order.
fn prepare<'q>(parsed: &'q ParsedSql, params: &ParameterSource) -> Result<PgQuery<'q>> {
    let mut query = sqlx::query(&parsed.sql);
    for (name, parameter) in parsed.bind(params)? {
        query = bind_parameter(query, name, parameter)?;
    }
    Ok(query)
}

fn bind_parameter<'q>(
    query: PgQuery<'q>,
    name: &str,
    parameter: &Parameter,
) -> Result<PgQuery<'q>> {
    let query = match (&parameter.value, parameter.sql_type) {
        (SqlValue::Null, hint) => bind_null(query, hint.unwrap_or(SqlType::Text)),
        (SqlValue::Int(v), Some(SqlType::Integer)) => {
            let v = i32::try_from(*v).map_err(|_| DaoError::ValueOutOfRange {
                name: name.to_string(),
                sql_type: SqlType::Integer,
            })?;
            query.bind(v)
        }
        (SqlValue::Int(v), Some(SqlType::Double)) => query.bind(*v as f64),
        (SqlValue::Bool(v), _) => query.bind(*v),
        (SqlValue::Int(v), _) => query.bind(*v),
        (SqlValue::Float(v), _) => query.bind(*v),
        (SqlValue::Text(v), _) => query.bind(v.clone()),
        (SqlValue::Bytes(v), _) => query.bind(v.clone()),
        (SqlValue::Uuid(v), _) => query.bind(*v),
        (SqlValue::Timestamp(v), _) => query.bind(*v),
        (SqlValue::Json(v), _) => query.bind(v.clone()),
    };
    Ok(query)
}

fn bind_null(query: PgQuery<'_>, sql_type: SqlType) -> PgQuery<'_> {
    match sql_type {
        SqlType::Boolean => query.bind(None::<bool>),
        SqlType::Integer => query.bind(None::<i32>),
        SqlType::BigInt => query.bind(None::<i64>),
        SqlType::Double => query.bind(None::<f64>),
        SqlType::Text => query.bind(None::<String>),
        SqlType::Bytea => query.bind(None::<Vec<u8>>),
        SqlType::Uuid => query.bind(None::<Uuid>),
        SqlType::Timestamp => query.bind(None::<DateTime<Utc>>),
        SqlType::Json => query.bind(None::<serde_json::Value>),
    }
}

#[async_trait]
impl StatementExecutor for PgExecutor {
    type Row = PgRow;

    async fn query_scalar(&self, sql: &str, params: &ParameterSource) -> Result<Option<i64>> {
        metrics::counter!("dao_statements_total").increment(1);
        let parsed = named::parse(sql);
        let row = prepare(&parsed, params)?.fetch_optional(&self.pool).await?;
        match row {
            Some(row) => Ok(row.try_get::<Option<i64>, _>(0)?),
            None => Ok(None),
        }
    }

    async fn query(&self, sql: &str, params: &ParameterSource) -> Result<Vec<PgRow>> {
        metrics::counter!("dao_statements_total").increment(1);
        let parsed = named::parse(sql);
        Ok(prepare(&parsed, params)?.fetch_all(&self.pool).await?)
    }

    async fn update(&self, sql: &str, params: &ParameterSource) -> Result<u64> {
        metrics::counter!("dao_statements_total").increment(1);
        let parsed = named::parse(sql);
        let result = prepare(&parsed, params)?.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn insert_returning_key(
        &self,
        sql: &str,
        params: &ParameterSource,
        key_column: &str,
    ) -> Result<i64> {
        metrics::counter!("dao_statements_total").increment(1);
        let parsed = named::parse(&format!(
            "{} returning {key_column}",
            sql.trim_end().trim_end_matches(';')
        ));
        let row = prepare(&parsed, params)?
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DaoError::NoRowsAffected)?;
        Ok(row.try_get::<i64, _>(0)?)
    }
}

/// Default row mapper for any type deriving [`sqlx::FromRow`].
pub struct FromRowMapper<T>(PhantomData<fn() -> T>);

impl<T> FromRowMapper<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for FromRowMapper<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RowMapper<PgRow, T> for FromRowMapper<T>
where
    T: for<'r> sqlx::FromRow<'r, PgRow>,
{
    fn map_row(&self, row: &PgRow) -> Result<T> {
        T::from_row(row).map_err(|e| DaoError::RowMapping(e.to_string()))
    }
}

impl<T> EntityDao<PgExecutor, T>
where
    T: for<'r> sqlx::FromRow<'r, PgRow> + ToParameters + Send + 'static,
{
    /// Binds `base` to [`FromRowMapper`], the default for `FromRow` types.
    pub fn with_default_mapper(base: BaseDao<PgExecutor>) -> Self {
        tracing::info!(
            entity = std::any::type_name::<T>(),
            "no row mapper supplied, using FromRow mapping"
        );
        Self::new(base, FromRowMapper::<T>::new())
    }
}

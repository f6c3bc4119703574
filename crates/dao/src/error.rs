use named_query::RegistryError;
use thiserror::Error;

/// Errors that can occur when executing statements through a DAO.
#[derive(Debug, Error)]
pub enum DaoError {
    /// Statement lookup failed, or named-query files are disabled.
    #[error("Named query error: {0}")]
    Registry(#[from] RegistryError),

    /// A `:name` placeholder had no value in any parameter source.
    #[error("No value supplied for the SQL parameter '{0}'")]
    ParameterNotBound(String),

    /// The database rejected or failed to run a statement.
    #[error("Query execution failed: {0}")]
    QueryExecutionFailed(#[from] sqlx::Error),

    /// A `COUNT(*)` query returned no row or a NULL count.
    #[error("Count query returned no value: {sql}")]
    MissingCount { sql: String },

    /// Page size must be greater than zero.
    #[error("Page size must be greater than zero")]
    InvalidPageSize,

    /// Sort column is not a plain or qualified identifier.
    #[error("Invalid sort column: '{0}'")]
    InvalidSortColumn(String),

    /// The query text was empty after trimming.
    #[error("Query text is empty")]
    EmptyQuery,

    /// A single-row query matched a different number of rows.
    #[error("Incorrect result size: expected {expected}, actual {actual}")]
    UnexpectedRowCount { expected: usize, actual: usize },

    /// An insert that should have produced a generated key affected no rows.
    #[error("Could not insert row into database")]
    NoRowsAffected,

    /// A parameter value does not fit the type its hint asks for.
    #[error("Value of parameter '{name}' is out of range for {sql_type}")]
    ValueOutOfRange {
        name: String,
        sql_type: common::SqlType,
    },

    /// A row mapper could not build a value from a row.
    #[error("Row mapping failed: {0}")]
    RowMapping(String),
}

/// Result type for DAO operations.
pub type Result<T> = std::result::Result<T, DaoError>;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type hint attached to a bound parameter.
///
/// Executors use the hint to pick the database type of a value whose Rust
/// representation is ambiguous, most notably `NULL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlType {
    Boolean,
    Integer,
    BigInt,
    Double,
    Text,
    Bytea,
    Uuid,
    Timestamp,
    Json,
}

impl std::fmt::Display for SqlType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SqlType::Boolean => "BOOLEAN",
            SqlType::Integer => "INTEGER",
            SqlType::BigInt => "BIGINT",
            SqlType::Double => "DOUBLE PRECISION",
            SqlType::Text => "TEXT",
            SqlType::Bytea => "BYTEA",
            SqlType::Uuid => "UUID",
            SqlType::Timestamp => "TIMESTAMPTZ",
            SqlType::Json => "JSONB",
        };
        f.write_str(name)
    }
}

/// A single value bound to a named SQL parameter or read from a result row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Json(serde_json::Value),
}

impl SqlValue {
    /// Returns true for `NULL`.
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// The type this value binds as when no explicit hint is given.
    ///
    /// `NULL` carries no type of its own and returns `None`.
    pub fn natural_type(&self) -> Option<SqlType> {
        match self {
            SqlValue::Null => None,
            SqlValue::Bool(_) => Some(SqlType::Boolean),
            SqlValue::Int(_) => Some(SqlType::BigInt),
            SqlValue::Float(_) => Some(SqlType::Double),
            SqlValue::Text(_) => Some(SqlType::Text),
            SqlValue::Bytes(_) => Some(SqlType::Bytea),
            SqlValue::Uuid(_) => Some(SqlType::Uuid),
            SqlValue::Timestamp(_) => Some(SqlType::Timestamp),
            SqlValue::Json(_) => Some(SqlType::Json),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl std::fmt::Display for SqlValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Bool(v) => write!(f, "{v}"),
            SqlValue::Int(v) => write!(f, "{v}"),
            SqlValue::Float(v) => write!(f, "{v}"),
            SqlValue::Text(v) => write!(f, "'{v}'"),
            SqlValue::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            SqlValue::Uuid(v) => write!(f, "{v}"),
            SqlValue::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
            SqlValue::Json(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(i64::from(value))
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<u32> for SqlValue {
    fn from(value: u32) -> Self {
        SqlValue::Int(i64::from(value))
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        SqlValue::Bytes(value)
    }
}

impl From<Uuid> for SqlValue {
    fn from(value: Uuid) -> Self {
        SqlValue::Uuid(value)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(value: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(value)
    }
}

impl From<serde_json::Value> for SqlValue {
    fn from(value: serde_json::Value) -> Self {
        SqlValue::Json(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_has_no_natural_type() {
        assert!(SqlValue::Null.is_null());
        assert_eq!(SqlValue::Null.natural_type(), None);
    }

    #[test]
    fn integers_widen_to_bigint() {
        assert_eq!(SqlValue::from(7_i32), SqlValue::Int(7));
        assert_eq!(SqlValue::from(7_u32), SqlValue::Int(7));
        assert_eq!(SqlValue::from(7_i32).natural_type(), Some(SqlType::BigInt));
    }

    #[test]
    fn option_maps_none_to_null() {
        let missing: Option<String> = None;
        assert_eq!(SqlValue::from(missing), SqlValue::Null);
        assert_eq!(SqlValue::from(Some("x")), SqlValue::Text("x".to_string()));
    }

    #[test]
    fn accessors_match_variant() {
        assert_eq!(SqlValue::Int(3).as_i64(), Some(3));
        assert_eq!(SqlValue::Text("3".into()).as_i64(), None);
        assert_eq!(SqlValue::Text("a".into()).as_str(), Some("a"));
    }

    #[test]
    fn sql_type_display_uses_postgres_names() {
        assert_eq!(SqlType::Timestamp.to_string(), "TIMESTAMPTZ");
        assert_eq!(SqlType::Json.to_string(), "JSONB");
    }

    #[test]
    fn value_serialization_is_tagged() {
        let json = serde_json::to_value(SqlValue::Int(5)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "int", "value": 5}));
    }
}

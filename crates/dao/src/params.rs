use std::collections::HashMap;

use common::{SqlType, SqlValue};

use crate::{DaoError, Result};

/// A bound value together with its optional type hint.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub value: SqlValue,
    pub sql_type: Option<SqlType>,
}

impl Parameter {
    /// The hint if one was given, else the value's natural type.
    pub fn effective_type(&self) -> Option<SqlType> {
        self.sql_type.or_else(|| self.value.natural_type())
    }
}

/// Named parameters for a SQL statement.
///
/// Names are matched against `:name` placeholders in the statement text.
/// Adding a name twice overwrites the earlier binding.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSource {
    values: HashMap<String, Parameter>,
}

impl ParameterSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `value`.
    pub fn add_value(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.insert(name, value.into(), None);
        self
    }

    /// Binds `name` to `value` with an explicit type hint.
    pub fn add_typed_value(
        mut self,
        name: impl Into<String>,
        value: impl Into<SqlValue>,
        sql_type: SqlType,
    ) -> Self {
        self.insert(name, value.into(), Some(sql_type));
        self
    }

    /// Binds every `(name, value)` pair.
    pub fn add_values<I, K, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<SqlValue>,
    {
        for (name, value) in values {
            self.insert(name, value.into(), None);
        }
        self
    }

    /// In-place form of [`ParameterSource::add_value`].
    pub fn insert(&mut self, name: impl Into<String>, value: SqlValue, sql_type: Option<SqlType>) {
        self.values
            .insert(name.into(), Parameter { value, sql_type });
    }

    pub fn has_value(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Returns the bound value, or `ParameterNotBound`.
    pub fn value(&self, name: &str) -> Result<&SqlValue> {
        self.parameter(name).map(|p| &p.value)
    }

    /// Returns the full binding, or `ParameterNotBound`.
    pub fn parameter(&self, name: &str) -> Result<&Parameter> {
        self.values
            .get(name)
            .ok_or_else(|| DaoError::ParameterNotBound(name.to_string()))
    }

    /// Type hint or natural type of a bound value.
    pub fn sql_type(&self, name: &str) -> Option<SqlType> {
        self.values.get(name).and_then(Parameter::effective_type)
    }

    /// Iterates bound names in unspecified order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Combines two sources into a new one; `overlay` wins on name collisions.
    ///
    /// Neither input is modified, so callers' parameters stay untouched when
    /// engine-owned values are layered on top.
    pub fn merge(base: &ParameterSource, overlay: &ParameterSource) -> ParameterSource {
        let mut values = base.values.clone();
        values.extend(
            overlay
                .values
                .iter()
                .map(|(name, parameter)| (name.clone(), parameter.clone())),
        );
        ParameterSource { values }
    }
}

impl<K: Into<String>, V: Into<SqlValue>> FromIterator<(K, V)> for ParameterSource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        ParameterSource::new().add_values(iter)
    }
}

/// Explicit mapping from an entity to the parameters of its statements.
///
/// Implement this per entity type, binding one parameter per field that the
/// entity's insert/update statements reference.
pub trait ToParameters {
    fn to_parameters(&self) -> ParameterSource;
}

/// One parameter source per entity, in order. Used for batch updates.
pub fn batch_parameters<T: ToParameters>(entities: &[T]) -> Vec<ParameterSource> {
    entities.iter().map(ToParameters::to_parameters).collect()
}

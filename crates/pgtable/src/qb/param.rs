//! Ordered statement parameters.

use tokio_postgres::types::ToSql;

use crate::value::ScalarValue;

/// Parameters in placeholder order; indices are 1-based to match `$n`.
///
/// Holding [`ScalarValue`]s rather than opaque `ToSql` objects keeps the
/// list renderable, which is what lets the executor trace fully bound
/// statements.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamList {
    values: Vec<ScalarValue>,
}

impl ParamList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter and return its 1-based index.
    pub fn push(&mut self, value: impl Into<ScalarValue>) -> usize {
        self.values.push(value.into());
        self.values.len()
    }

    /// Look up a parameter by its 1-based index.
    pub fn get(&self, index: usize) -> Option<&ScalarValue> {
        index.checked_sub(1).and_then(|i| self.values.get(i))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScalarValue> {
        self.values.iter()
    }

    /// References in driver form.
    pub fn as_sql(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.values
            .iter()
            .map(|v| v as &(dyn ToSql + Sync))
            .collect()
    }
}

impl From<Vec<ScalarValue>> for ParamList {
    fn from(values: Vec<ScalarValue>) -> Self {
        Self { values }
    }
}

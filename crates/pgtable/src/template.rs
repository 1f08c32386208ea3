//! Equality-filter templates.

use crate::error::{TableError, TableResult};
use crate::qb::Predicate;
use crate::value::ScalarValue;

/// An ordered equality filter: column name → required value.
///
/// An empty template matches every row. A `Null` value renders as
/// `column = NULL`, which matches no rows; this layer has no IS NULL form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Template {
    fields: Vec<(String, ScalarValue)>,
}

impl Template {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, column: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        self.set(column, value);
        self
    }

    /// Add an equality term, replacing in place if the column is present.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<ScalarValue>) {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(c, _)| *c == column) {
            Some((_, v)) => *v = value,
            None => self.fields.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&ScalarValue> {
        self.fields
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScalarValue)> {
        self.fields.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build a template from a JSON object of equality terms.
    pub fn from_json(value: &serde_json::Value) -> TableResult<Self> {
        let object = value.as_object().ok_or_else(|| {
            TableError::validation(format!("expected a JSON object, got {value}"))
        })?;
        let mut template = Self::new();
        for (column, v) in object {
            template.set(column.clone(), ScalarValue::from_json(v));
        }
        Ok(template)
    }

    /// Zip a primary-key descriptor with its values into an equality
    /// template. Arity must match exactly.
    pub(crate) fn from_key(
        table: &str,
        key_columns: &[String],
        key_values: &[ScalarValue],
    ) -> TableResult<Self> {
        if key_columns.len() != key_values.len() {
            return Err(TableError::KeyMismatch {
                table: table.to_string(),
                expected: key_columns.len(),
                got: key_values.len(),
            });
        }
        let fields = key_columns
            .iter()
            .cloned()
            .zip(key_values.iter().cloned())
            .collect();
        Ok(Self { fields })
    }

    /// Equality predicate tree in template iteration order.
    pub fn to_predicate(&self) -> Predicate {
        if self.fields.is_empty() {
            return Predicate::All;
        }
        Predicate::And(
            self.fields
                .iter()
                .map(|(c, v)| Predicate::eq(c.clone(), v.clone()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_term_order() {
        let t = Template::new().with("last", "doe").with("first", "jane");
        let cols: Vec<&str> = t.iter().map(|(c, _)| c).collect();
        assert_eq!(cols, ["last", "first"]);
    }

    #[test]
    fn set_replaces_in_place() {
        let mut t = Template::new();
        t.set("a", 1);
        t.set("a", 2);
        assert_eq!(t.len(), 1);
        assert_eq!(t.get("a"), Some(&ScalarValue::Int(2)));
    }

    #[test]
    fn empty_template_is_match_all() {
        let t = Template::new();
        assert!(t.is_empty());
        assert!(matches!(t.to_predicate(), Predicate::All));
    }

    #[test]
    fn from_key_zips_positionally() {
        let cols = vec!["last".to_string(), "first".to_string()];
        let vals = vec![ScalarValue::from("doe"), ScalarValue::from("jane")];
        let t = Template::from_key("people", &cols, &vals).unwrap();
        assert_eq!(t.get("last"), Some(&ScalarValue::Text("doe".into())));
        assert_eq!(t.get("first"), Some(&ScalarValue::Text("jane".into())));
    }

    #[test]
    fn from_key_rejects_arity_mismatch() {
        let cols = vec!["a".to_string(), "b".to_string()];
        let vals = vec![ScalarValue::Int(1)];
        let err = Template::from_key("people", &cols, &vals).unwrap_err();
        assert!(matches!(
            err,
            TableError::KeyMismatch {
                expected: 2,
                got: 1,
                ..
            }
        ));
    }

    #[test]
    fn from_json_builds_terms() {
        let t = Template::from_json(&serde_json::json!({"status": "active", "age": 30})).unwrap();
        assert_eq!(t.get("status"), Some(&ScalarValue::Text("active".into())));
        assert_eq!(t.get("age"), Some(&ScalarValue::Int(30)));
        assert!(Template::from_json(&serde_json::json!(7)).is_err());
    }
}

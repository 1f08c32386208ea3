//! Records and row sets.
//!
//! A [`Record`] is one row as an insertion-ordered column/value mapping;
//! a [`RowSet`] is the named, immutable collection of records every read
//! operation returns. Records double as write payloads: insert and update
//! derive their column and value lists from the record in iteration order.

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use tokio_postgres::Row;

use crate::error::{TableError, TableResult};
use crate::value::{ScalarValue, decode_column};

/// An insertion-ordered mapping from column name to [`ScalarValue`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, ScalarValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, column: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        self.set(column, value);
        self
    }

    /// Insert a column value, replacing in place if the column is present.
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

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(c, _)| c.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &ScalarValue> {
        self.fields.iter().map(|(_, v)| v)
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

    /// Decode a full result row, column by column.
    pub fn from_row(row: &Row) -> TableResult<Self> {
        let mut fields = Vec::with_capacity(row.len());
        for idx in 0..row.len() {
            let name = row.columns()[idx].name().to_string();
            fields.push((name, decode_column(row, idx)?));
        }
        Ok(Self { fields })
    }

    /// Build a record from a JSON object, mapping each value through
    /// [`ScalarValue::from_json`].
    pub fn from_json(value: &serde_json::Value) -> TableResult<Self> {
        let object = value.as_object().ok_or_else(|| {
            TableError::validation(format!("expected a JSON object, got {value}"))
        })?;
        let mut record = Self::new();
        for (column, v) in object {
            record.set(column.clone(), ScalarValue::from_json(v));
        }
        Ok(record)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (c, v) in &self.fields {
            map.insert(c.clone(), v.to_json());
        }
        serde_json::Value::Object(map)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (c, v) in &self.fields {
            map.serialize_entry(c, v)?;
        }
        map.end()
    }
}

impl IntoIterator for Record {
    type Item = (String, ScalarValue);
    type IntoIter = std::vec::IntoIter<(String, ScalarValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// A named, immutable collection of result records.
///
/// Read operations name their result `SELECT(<table>)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowSet {
    name: String,
    rows: Vec<Record>,
}

impl RowSet {
    pub(crate) fn new(name: impl Into<String>, rows: Vec<Record>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Record> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.rows.iter()
    }

    /// JSON array of the rows, without the name.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.rows.iter().map(Record::to_json).collect())
    }
}

impl<'a> IntoIterator for &'a RowSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_keeps_insertion_order() {
        let mut r = Record::new();
        r.set("b", 1);
        r.set("a", 2);
        r.set("c", 3);
        let cols: Vec<&str> = r.columns().collect();
        assert_eq!(cols, ["b", "a", "c"]);
    }

    #[test]
    fn set_replaces_in_place() {
        let mut r = Record::new();
        r.set("a", 1);
        r.set("b", 2);
        r.set("a", 9);
        let cols: Vec<&str> = r.columns().collect();
        assert_eq!(cols, ["a", "b"]);
        assert_eq!(r.get("a"), Some(&ScalarValue::Int(9)));
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn builder_and_get() {
        let r = Record::new().with("name", "ada").with("age", 36);
        assert_eq!(r.get("name"), Some(&ScalarValue::Text("ada".into())));
        assert_eq!(r.get("age"), Some(&ScalarValue::Int(36)));
        assert_eq!(r.get("missing"), None);
    }

    #[test]
    fn json_object_round_trip() {
        let json = serde_json::json!({"name": "ada", "age": 36, "note": null});
        let r = Record::from_json(&json).unwrap();
        assert_eq!(r.get("age"), Some(&ScalarValue::Int(36)));
        assert_eq!(r.get("note"), Some(&ScalarValue::Null));
        assert_eq!(r.to_json(), json);
    }

    #[test]
    fn from_json_rejects_non_objects() {
        assert!(Record::from_json(&serde_json::json!([1, 2])).is_err());
        assert!(Record::from_json(&serde_json::json!("x")).is_err());
    }

    #[test]
    fn serialize_preserves_field_order() {
        let r = Record::new().with("z", 1).with("a", 2);
        assert_eq!(serde_json::to_string(&r).unwrap(), r#"{"z":1,"a":2}"#);
    }

    #[test]
    fn rowset_accessors() {
        let rows = vec![
            Record::new().with("id", 1),
            Record::new().with("id", 2),
        ];
        let rs = RowSet::new("SELECT(people)", rows);
        assert_eq!(rs.name(), "SELECT(people)");
        assert_eq!(rs.len(), 2);
        assert!(!rs.is_empty());
        let ids: Vec<_> = rs.iter().map(|r| r.get("id").cloned()).collect();
        assert_eq!(
            ids,
            [Some(ScalarValue::Int(1)), Some(ScalarValue::Int(2))]
        );
        assert_eq!(rs.to_json(), serde_json::json!([{"id": 1}, {"id": 2}]));
    }
}

//! The scalar value variant carried by records and templates.
//!
//! Provides [`ScalarValue`], a closed set of column value shapes for the
//! loosely-typed layer: callers build templates and write payloads from it,
//! the executor decodes result rows into it, and the query builders bind it
//! as statement parameters. Values always travel the parameter-binding path;
//! the SQL-literal rendering here exists for the debug trace only.

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Serialize, Serializer};
use std::error::Error;
use std::fmt;
use tokio_postgres::Row;
use tokio_postgres::types::{IsNull, ToSql, Type};
use uuid::Uuid;

use crate::error::{TableError, TableResult};

/// A single column value.
///
/// Integers are widened to `i64` and floats to `f64` on the way in; binding
/// narrows them back to the column's wire type with a range check.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Uuid(Uuid),
    Json(serde_json::Value),
}

impl ScalarValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short name of the variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Date(_) => "date",
            Self::Timestamp(_) => "timestamp",
            Self::Uuid(_) => "uuid",
            Self::Json(_) => "json",
        }
    }

    /// Map a JSON scalar into the variant.
    ///
    /// Strings stay text (the column's type drives any further coercion at
    /// bind time); arrays and objects become [`ScalarValue::Json`].
    pub fn from_json(value: &serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => Self::Json(value.clone()),
        }
    }

    /// Convert into a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            Self::Null => Value::Null,
            Self::Bool(v) => Value::Bool(*v),
            Self::Int(v) => Value::from(*v),
            Self::Float(v) => serde_json::Number::from_f64(*v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::Text(v) => Value::String(v.clone()),
            Self::Bytes(v) => {
                let mut out = String::with_capacity(2 + v.len() * 2);
                out.push_str("\\x");
                write_hex(v, &mut out);
                Value::String(out)
            }
            Self::Date(v) => Value::String(v.to_string()),
            Self::Timestamp(v) => Value::String(v.to_rfc3339()),
            Self::Uuid(v) => Value::String(v.to_string()),
            Self::Json(v) => v.clone(),
        }
    }

    /// Render as a SQL literal into `out`.
    ///
    /// Used only to build the traced statement text; never executed.
    pub(crate) fn write_literal(&self, out: &mut String) {
        match self {
            Self::Null => out.push_str("NULL"),
            Self::Bool(true) => out.push_str("TRUE"),
            Self::Bool(false) => out.push_str("FALSE"),
            Self::Int(v) => {
                use fmt::Write;
                let _ = write!(out, "{v}");
            }
            Self::Float(v) => {
                use fmt::Write;
                let _ = write!(out, "{v}");
            }
            Self::Text(v) => write_quoted(v, out),
            Self::Bytes(v) => {
                out.push_str("'\\x");
                write_hex(v, out);
                out.push('\'');
            }
            Self::Date(v) => write_quoted(&v.to_string(), out),
            Self::Timestamp(v) => write_quoted(&v.to_rfc3339(), out),
            Self::Uuid(v) => write_quoted(&v.to_string(), out),
            Self::Json(v) => write_quoted(&v.to_string(), out),
        }
    }
}

fn write_quoted(s: &str, out: &mut String) {
    out.push('\'');
    for ch in s.chars() {
        if ch == '\'' {
            out.push('\'');
            out.push('\'');
        } else {
            out.push(ch);
        }
    }
    out.push('\'');
}

fn write_hex(bytes: &[u8], out: &mut String) {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    for b in bytes {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0x0f) as usize] as char);
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_literal(&mut out);
        f.write_str(&out)
    }
}

impl Serialize for ScalarValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::Text(v) => serializer.serialize_str(v),
            Self::Bytes(v) => serializer.serialize_bytes(v),
            Self::Date(v) => v.serialize(serializer),
            Self::Timestamp(v) => v.serialize(serializer),
            Self::Uuid(v) => v.serialize(serializer),
            Self::Json(v) => v.serialize(serializer),
        }
    }
}

impl From<bool> for ScalarValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i16> for ScalarValue {
    fn from(v: i16) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i32> for ScalarValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for ScalarValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f32> for ScalarValue {
    fn from(v: f32) -> Self {
        Self::Float(v as f64)
    }
}

impl From<f64> for ScalarValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for ScalarValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<u8>> for ScalarValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<&[u8]> for ScalarValue {
    fn from(v: &[u8]) -> Self {
        Self::Bytes(v.to_vec())
    }
}

impl From<NaiveDate> for ScalarValue {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<DateTime<Utc>> for ScalarValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl From<NaiveDateTime> for ScalarValue {
    fn from(v: NaiveDateTime) -> Self {
        Self::Timestamp(v.and_utc())
    }
}

impl From<Uuid> for ScalarValue {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl From<serde_json::Value> for ScalarValue {
    fn from(v: serde_json::Value) -> Self {
        Self::Json(v)
    }
}

impl<T: Into<ScalarValue>> From<Option<T>> for ScalarValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

impl ToSql for ScalarValue {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            ScalarValue::Null => Ok(IsNull::Yes),
            ScalarValue::Bool(v) => v.to_sql_checked(ty, out),
            ScalarValue::Int(v) => match *ty {
                Type::INT2 => i16::try_from(*v)?.to_sql_checked(ty, out),
                Type::INT4 => i32::try_from(*v)?.to_sql_checked(ty, out),
                Type::FLOAT4 => (*v as f32).to_sql_checked(ty, out),
                Type::FLOAT8 => (*v as f64).to_sql_checked(ty, out),
                _ if is_text(ty) => v.to_string().to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            ScalarValue::Float(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            ScalarValue::Text(v) => match *ty {
                // Values arriving through JSON have no native date/uuid
                // shape, so text is parsed when the column demands one.
                Type::DATE => NaiveDate::parse_from_str(v, "%Y-%m-%d")?.to_sql_checked(ty, out),
                Type::TIMESTAMP => DateTime::parse_from_rfc3339(v)?
                    .naive_utc()
                    .to_sql_checked(ty, out),
                Type::TIMESTAMPTZ => DateTime::parse_from_rfc3339(v)?
                    .with_timezone(&Utc)
                    .to_sql_checked(ty, out),
                Type::UUID => Uuid::parse_str(v)?.to_sql_checked(ty, out),
                Type::JSON | Type::JSONB => {
                    serde_json::from_str::<serde_json::Value>(v)?.to_sql_checked(ty, out)
                }
                _ => v.to_sql_checked(ty, out),
            },
            ScalarValue::Bytes(v) => v.to_sql_checked(ty, out),
            ScalarValue::Date(v) => v.to_sql_checked(ty, out),
            ScalarValue::Timestamp(v) => match *ty {
                Type::TIMESTAMP => v.naive_utc().to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            ScalarValue::Uuid(v) => match *ty {
                _ if is_text(ty) => v.to_string().to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            ScalarValue::Json(v) => v.to_sql_checked(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        // The variant is runtime-typed; mismatches surface from the
        // delegated `to_sql_checked` call with the column's type name.
        true
    }

    tokio_postgres::types::to_sql_checked!();
}

fn is_text(ty: &Type) -> bool {
    matches!(
        *ty,
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN
    )
}

/// Decode one column of a result row into a [`ScalarValue`].
///
/// SQL NULL maps to [`ScalarValue::Null`] for every supported type; a column
/// type outside the variant is a decode error naming the type.
pub(crate) fn decode_column(row: &Row, idx: usize) -> TableResult<ScalarValue> {
    let column = &row.columns()[idx];
    let name = column.name();
    let ty = column.type_();

    let value = match *ty {
        Type::BOOL => get::<bool>(row, idx, name)?.map(ScalarValue::Bool),
        Type::INT2 => get::<i16>(row, idx, name)?.map(|v| ScalarValue::Int(v as i64)),
        Type::INT4 => get::<i32>(row, idx, name)?.map(|v| ScalarValue::Int(v as i64)),
        Type::INT8 => get::<i64>(row, idx, name)?.map(ScalarValue::Int),
        Type::FLOAT4 => get::<f32>(row, idx, name)?.map(|v| ScalarValue::Float(v as f64)),
        Type::FLOAT8 => get::<f64>(row, idx, name)?.map(ScalarValue::Float),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
            get::<String>(row, idx, name)?.map(ScalarValue::Text)
        }
        Type::BYTEA => get::<Vec<u8>>(row, idx, name)?.map(ScalarValue::Bytes),
        Type::DATE => get::<NaiveDate>(row, idx, name)?.map(ScalarValue::Date),
        Type::TIMESTAMP => {
            get::<NaiveDateTime>(row, idx, name)?.map(|v| ScalarValue::Timestamp(v.and_utc()))
        }
        Type::TIMESTAMPTZ => get::<DateTime<Utc>>(row, idx, name)?.map(ScalarValue::Timestamp),
        Type::UUID => get::<Uuid>(row, idx, name)?.map(ScalarValue::Uuid),
        Type::JSON | Type::JSONB => get::<serde_json::Value>(row, idx, name)?.map(ScalarValue::Json),
        _ => {
            return Err(TableError::decode(
                name,
                format!("unsupported column type '{ty}'"),
            ));
        }
    };

    Ok(value.unwrap_or(ScalarValue::Null))
}

fn get<'a, T>(row: &'a Row, idx: usize, name: &str) -> TableResult<Option<T>>
where
    T: tokio_postgres::types::FromSql<'a>,
{
    row.try_get::<_, Option<T>>(idx)
        .map_err(|e| TableError::decode(name, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_widen() {
        assert_eq!(ScalarValue::from(7i16), ScalarValue::Int(7));
        assert_eq!(ScalarValue::from(7i32), ScalarValue::Int(7));
        assert_eq!(ScalarValue::from(1.5f32), ScalarValue::Float(1.5));
        assert_eq!(ScalarValue::from("abc"), ScalarValue::Text("abc".into()));
        assert_eq!(ScalarValue::from(None::<i32>), ScalarValue::Null);
        assert_eq!(ScalarValue::from(Some(2i64)), ScalarValue::Int(2));
    }

    #[test]
    fn literal_rendering() {
        assert_eq!(ScalarValue::Null.to_string(), "NULL");
        assert_eq!(ScalarValue::Bool(true).to_string(), "TRUE");
        assert_eq!(ScalarValue::Int(-42).to_string(), "-42");
        assert_eq!(ScalarValue::Float(1.5).to_string(), "1.5");
        assert_eq!(
            ScalarValue::Text("O'Brien".into()).to_string(),
            "'O''Brien'"
        );
        assert_eq!(
            ScalarValue::Bytes(vec![0xde, 0xad]).to_string(),
            "'\\xdead'"
        );
    }

    #[test]
    fn literal_rendering_escapes_injection_payload() {
        let v = ScalarValue::Text("a' OR '1'='1".into());
        assert_eq!(v.to_string(), "'a'' OR ''1''=''1'");
    }

    #[test]
    fn date_literal() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(ScalarValue::Date(d).to_string(), "'2024-03-09'");
    }

    #[test]
    fn json_round_trip() {
        let v = ScalarValue::from_json(&serde_json::json!(12));
        assert_eq!(v, ScalarValue::Int(12));
        assert_eq!(v.to_json(), serde_json::json!(12));

        let v = ScalarValue::from_json(&serde_json::json!("hello"));
        assert_eq!(v, ScalarValue::Text("hello".into()));

        let v = ScalarValue::from_json(&serde_json::json!({"a": 1}));
        assert!(matches!(v, ScalarValue::Json(_)));
        assert_eq!(v.to_json(), serde_json::json!({"a": 1}));

        assert_eq!(ScalarValue::from_json(&serde_json::Value::Null), ScalarValue::Null);
    }

    #[test]
    fn type_names() {
        assert_eq!(ScalarValue::Null.type_name(), "null");
        assert_eq!(ScalarValue::Int(1).type_name(), "int");
        assert_eq!(ScalarValue::Text(String::new()).type_name(), "text");
    }

    #[test]
    fn serialize_to_json_string() {
        let v = ScalarValue::Text("x".into());
        assert_eq!(serde_json::to_string(&v).unwrap(), "\"x\"");
        let v = ScalarValue::Null;
        assert_eq!(serde_json::to_string(&v).unwrap(), "null");
        let v = ScalarValue::Int(3);
        assert_eq!(serde_json::to_string(&v).unwrap(), "3");
    }
}

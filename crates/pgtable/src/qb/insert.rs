//! INSERT builder.

use std::fmt::Write;

use crate::error::{TableError, TableResult};
use crate::ident;
use crate::qb::param::ParamList;
use crate::qb::BuiltStatement;
use crate::record::Record;
use crate::value::ScalarValue;

/// INSERT builder with one placeholder per value.
///
/// Named mode pairs each value with a column; positional mode omits the
/// column list and relies on the table's declared column order. With no
/// values at all the statement becomes `DEFAULT VALUES`.
#[derive(Clone, Debug)]
pub struct InsertQuery {
    table: String,
    columns: Vec<String>,
    values: Vec<ScalarValue>,
}

impl InsertQuery {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Add a named column value.
    pub fn value(mut self, column: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        self.columns.push(column.into());
        self.values.push(value.into());
        self
    }

    /// Add a positional value (no column name).
    pub fn positional(mut self, value: impl Into<ScalarValue>) -> Self {
        self.values.push(value.into());
        self
    }

    /// Add every field of a record, in the record's iteration order.
    pub fn record(mut self, record: &Record) -> Self {
        for (column, value) in record.iter() {
            self.columns.push(column.to_string());
            self.values.push(value.clone());
        }
        self
    }

    pub fn build(&self) -> TableResult<BuiltStatement> {
        ident::check_table(&self.table)?;

        if !self.columns.is_empty() && self.columns.len() != self.values.len() {
            return Err(TableError::validation(format!(
                "INSERT has {} columns but {} values",
                self.columns.len(),
                self.values.len()
            )));
        }

        let mut sql = String::from("INSERT INTO ");
        sql.push_str(&self.table);

        if self.values.is_empty() {
            sql.push_str(" DEFAULT VALUES");
            return Ok(BuiltStatement::new(sql, ParamList::new()));
        }

        if !self.columns.is_empty() {
            sql.push_str(" (");
            for (i, col) in self.columns.iter().enumerate() {
                ident::check_column(col)?;
                if i > 0 {
                    sql.push_str(", ");
                }
                sql.push_str(col);
            }
            sql.push(')');
        }

        sql.push_str(" VALUES (");
        let mut params = ParamList::new();
        for (i, value) in self.values.iter().enumerate() {
            let idx = params.push(value.clone());
            if i > 0 {
                sql.push_str(", ");
            }
            let _ = write!(sql, "${idx}");
        }
        sql.push(')');

        Ok(BuiltStatement::new(sql, params))
    }
}

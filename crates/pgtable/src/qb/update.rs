//! UPDATE builder.

use std::fmt::Write;

use crate::error::{TableError, TableResult};
use crate::ident;
use crate::qb::param::ParamList;
use crate::qb::predicate::Predicate;
use crate::qb::BuiltStatement;
use crate::record::Record;
use crate::value::ScalarValue;

/// UPDATE builder.
///
/// Parameters bind SET values first, then WHERE values, matching the
/// statement's left-to-right placeholder order. An empty predicate updates
/// the whole table.
#[derive(Clone, Debug)]
pub struct UpdateQuery {
    table: String,
    set: Vec<(String, ScalarValue)>,
    filter: Predicate,
}

impl UpdateQuery {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            set: Vec::new(),
            filter: Predicate::All,
        }
    }

    /// Add a SET column.
    pub fn set(mut self, column: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        self.set.push((column.into(), value.into()));
        self
    }

    /// Add every field of a record as SET columns, in iteration order.
    pub fn record(mut self, record: &Record) -> Self {
        for (column, value) in record.iter() {
            self.set.push((column.to_string(), value.clone()));
        }
        self
    }

    /// Set the row-matching predicate, replacing any previous one.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filter = predicate;
        self
    }

    /// Add `column = value` to the predicate.
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        let term = Predicate::eq(column, value);
        self.filter = match self.filter {
            Predicate::All => term,
            Predicate::And(mut children) => {
                children.push(term);
                Predicate::And(children)
            }
            other => Predicate::And(vec![other, term]),
        };
        self
    }

    pub fn build(&self) -> TableResult<BuiltStatement> {
        ident::check_table(&self.table)?;

        if self.set.is_empty() {
            return Err(TableError::validation(
                "UPDATE requires at least one SET column",
            ));
        }

        let mut sql = String::from("UPDATE ");
        sql.push_str(&self.table);
        sql.push_str(" SET ");

        let mut params = ParamList::new();
        for (i, (column, value)) in self.set.iter().enumerate() {
            ident::check_column(column)?;
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(column);
            let idx = params.push(value.clone());
            let _ = write!(sql, " = ${idx}");
        }

        if !self.filter.is_empty() {
            sql.push_str(" WHERE ");
            self.filter.render(&mut sql, &mut params)?;
        }

        Ok(BuiltStatement::new(sql, params))
    }
}

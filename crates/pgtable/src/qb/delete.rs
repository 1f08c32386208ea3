//! DELETE builder.

use crate::error::TableResult;
use crate::ident;
use crate::qb::param::ParamList;
use crate::qb::predicate::Predicate;
use crate::qb::BuiltStatement;
use crate::value::ScalarValue;

/// DELETE builder.
///
/// An empty predicate renders a bare `DELETE FROM`, which removes every
/// row. That is part of this layer's contract; guard rails belong to the
/// caller.
#[derive(Clone, Debug)]
pub struct DeleteQuery {
    table: String,
    filter: Predicate,
}

impl DeleteQuery {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            filter: Predicate::All,
        }
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

        let mut sql = String::from("DELETE FROM ");
        sql.push_str(&self.table);

        let mut params = ParamList::new();
        if !self.filter.is_empty() {
            sql.push_str(" WHERE ");
            self.filter.render(&mut sql, &mut params)?;
        }

        Ok(BuiltStatement::new(sql, params))
    }
}

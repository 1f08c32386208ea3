//! SELECT builder.

use std::fmt::Write;

use crate::error::TableResult;
use crate::ident;
use crate::qb::param::ParamList;
use crate::qb::predicate::{OrderBy, Predicate};
use crate::qb::BuiltStatement;

/// SELECT builder: projection, predicate, ordering, pagination.
#[derive(Clone, Debug)]
pub struct SelectQuery {
    table: String,
    /// Projected columns; empty means `*`.
    columns: Vec<String>,
    filter: Predicate,
    order: Vec<OrderBy>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl SelectQuery {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: Vec::new(),
            filter: Predicate::All,
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Set the projected columns, replacing any previous projection.
    pub fn columns<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = cols.into_iter().map(Into::into).collect();
        self
    }

    /// Append one projected column.
    pub fn column(mut self, col: impl Into<String>) -> Self {
        self.columns.push(col.into());
        self
    }

    /// Set the row-matching predicate, replacing any previous one.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filter = predicate;
        self
    }

    /// Add `column = value` to the predicate.
    pub fn eq(
        mut self,
        column: impl Into<String>,
        value: impl Into<crate::value::ScalarValue>,
    ) -> Self {
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

    /// Append an ORDER BY term.
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order.push(order);
        self
    }

    pub fn limit(mut self, n: i64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn offset(mut self, n: i64) -> Self {
        self.offset = Some(n);
        self
    }

    /// Render the SELECT statement.
    ///
    /// Clause order is fixed: WHERE, ORDER BY, LIMIT, OFFSET.
    pub fn build(&self) -> TableResult<BuiltStatement> {
        ident::check_table(&self.table)?;

        let mut sql = String::from("SELECT ");
        if self.columns.is_empty() {
            sql.push('*');
        } else {
            for (i, col) in self.columns.iter().enumerate() {
                ident::check_column(col)?;
                if i > 0 {
                    sql.push_str(", ");
                }
                sql.push_str(col);
            }
        }
        sql.push_str(" FROM ");
        sql.push_str(&self.table);

        let mut params = ParamList::new();
        if !self.filter.is_empty() {
            sql.push_str(" WHERE ");
            self.filter.render(&mut sql, &mut params)?;
        }

        for (i, order) in self.order.iter().enumerate() {
            sql.push_str(if i == 0 { " ORDER BY " } else { ", " });
            order.render(&mut sql)?;
        }

        if let Some(limit) = self.limit {
            let _ = write!(sql, " LIMIT {limit}");
        }
        if let Some(offset) = self.offset {
            let _ = write!(sql, " OFFSET {offset}");
        }

        Ok(BuiltStatement::new(sql, params))
    }

    /// Render `SELECT COUNT(*)` under the same predicate.
    ///
    /// Projection, ordering, and pagination do not apply to the count.
    pub fn build_count(&self) -> TableResult<BuiltStatement> {
        ident::check_table(&self.table)?;

        let mut sql = String::from("SELECT COUNT(*) FROM ");
        sql.push_str(&self.table);

        let mut params = ParamList::new();
        if !self.filter.is_empty() {
            sql.push_str(" WHERE ");
            self.filter.render(&mut sql, &mut params)?;
        }

        Ok(BuiltStatement::new(sql, params))
    }
}

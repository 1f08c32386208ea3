//! Statement builders.
//!
//! The four builders here are the only place SQL text is produced: they
//! validate every identifier, number placeholders positionally while pushing
//! parameters, and hand back a [`BuiltStatement`] ready for the executor.
//! Nothing caller-influenced is ever spliced into the text except validated
//! identifiers; values travel as bound parameters.
//!
//! # Usage
//!
//! ```ignore
//! use pgtable::qb::{self, OrderBy};
//!
//! // SELECT name, age FROM people WHERE last_name = $1 ORDER BY age DESC LIMIT 10
//! let stmt = qb::select("people")
//!     .columns(["name", "age"])
//!     .eq("last_name", "doe")
//!     .order_by(OrderBy::desc("age"))
//!     .limit(10)
//!     .build()?;
//!
//! // INSERT INTO people (first, last) VALUES ($1, $2)
//! let stmt = qb::insert("people")
//!     .value("first", "jane")
//!     .value("last", "doe")
//!     .build()?;
//! ```

mod delete;
mod insert;
mod param;
mod predicate;
mod select;
mod update;

pub use delete::DeleteQuery;
pub use insert::InsertQuery;
pub use param::ParamList;
pub use predicate::{Direction, OrderBy, Predicate};
pub use select::SelectQuery;
pub use update::UpdateQuery;

/// Create a SELECT builder for the given table.
pub fn select(table: &str) -> SelectQuery {
    SelectQuery::new(table)
}

/// Create an INSERT builder for the given table.
pub fn insert(table: &str) -> InsertQuery {
    InsertQuery::new(table)
}

/// Create an UPDATE builder for the given table.
pub fn update(table: &str) -> UpdateQuery {
    UpdateQuery::new(table)
}

/// Create a DELETE builder for the given table.
///
/// An empty filter deletes every row; whether that is intended is the
/// caller's call to make.
pub fn delete(table: &str) -> DeleteQuery {
    DeleteQuery::new(table)
}

/// A rendered statement: SQL text with `$n` placeholders and its parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct BuiltStatement {
    sql: String,
    params: ParamList,
}

impl BuiltStatement {
    /// Wrap hand-written SQL with its parameters.
    ///
    /// Escape hatch for statements the builders cannot express; the text is
    /// taken as-is.
    pub fn new(sql: impl Into<String>, params: ParamList) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &ParamList {
        &self.params
    }

    /// Splice the parameters into the text as SQL literals.
    ///
    /// This is the traced/logged form of the statement; it is never sent to
    /// the server. Placeholders without a matching parameter are left as-is,
    /// and a `$` that continues an identifier (the charset admits names like
    /// `my_var$1`) is not treated as a placeholder.
    pub fn render_bound(&self) -> String {
        let mut result = String::with_capacity(self.sql.len());
        let mut chars = self.sql.chars().peekable();
        let mut prev = None;

        while let Some(ch) = chars.next() {
            if ch == '$' && !prev.is_some_and(is_ident_char) {
                let mut num_str = String::new();
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_digit() {
                        num_str.push(chars.next().unwrap());
                    } else {
                        break;
                    }
                }
                match num_str.parse::<usize>().ok().and_then(|n| self.params.get(n)) {
                    Some(value) => value.write_literal(&mut result),
                    None => {
                        result.push('$');
                        result.push_str(&num_str);
                    }
                }
                prev = num_str.chars().last().or(Some('$'));
            } else {
                result.push(ch);
                prev = Some(ch);
            }
        }

        result
    }
}

fn is_ident_char(c: char) -> bool {
    c == '_' || c == '$' || c.is_ascii_alphanumeric()
}

//! Row-matching predicates and ordering terms.

use std::fmt::Write;

use crate::error::{TableError, TableResult};
use crate::ident;
use crate::qb::param::ParamList;
use crate::value::ScalarValue;

/// A row-matching predicate tree.
///
/// Only conjunction and equality exist in this layer: templates are
/// AND-joined equality filters, so the tree stays flat in practice.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches every row; renders no WHERE clause.
    All,
    /// `column = value`, bound as a parameter.
    Eq { column: String, value: ScalarValue },
    /// Conjunction of child predicates.
    And(Vec<Predicate>),
}

impl Predicate {
    pub fn eq(column: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        Self::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn and(predicates: Vec<Predicate>) -> Self {
        Self::And(predicates)
    }

    /// True when the predicate matches every row and renders nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::All => true,
            Self::Eq { .. } => false,
            Self::And(children) => children.iter().all(Predicate::is_empty),
        }
    }

    /// Render into `out`, pushing parameters in emission order so the
    /// placeholder numbers always equal the parameter positions.
    pub(crate) fn render(&self, out: &mut String, params: &mut ParamList) -> TableResult<()> {
        match self {
            Self::All => Ok(()),
            Self::Eq { column, value } => {
                ident::check_column(column)?;
                out.push_str(column);
                let idx = params.push(value.clone());
                let _ = write!(out, " = ${idx}");
                Ok(())
            }
            Self::And(children) => {
                let mut first = true;
                for child in children.iter().filter(|c| !c.is_empty()) {
                    if !first {
                        out.push_str(" AND ");
                    }
                    first = false;
                    child.render(out, params)?;
                }
                Ok(())
            }
        }
    }
}

/// Sort direction for an ORDER BY term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One ORDER BY term: a validated column and a closed direction.
///
/// This is the only path ordering input takes into SQL text, so a hostile
/// `order_by` string has nowhere to hide: the column must be a plain
/// identifier and the direction is an enum.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    column: String,
    direction: Direction,
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: Direction::Desc,
        }
    }

    /// Parse `"col"`, `"col asc"` or `"col desc"` (direction is
    /// case-insensitive). Anything else is rejected.
    pub fn parse(s: &str) -> TableResult<Self> {
        let mut parts = s.split_whitespace();
        let column = parts
            .next()
            .ok_or_else(|| TableError::identifier("empty order-by term"))?;
        let direction = match parts.next() {
            None => Direction::Asc,
            Some(d) if d.eq_ignore_ascii_case("asc") => Direction::Asc,
            Some(d) if d.eq_ignore_ascii_case("desc") => Direction::Desc,
            Some(other) => {
                return Err(TableError::identifier(format!(
                    "bad order-by direction '{other}'"
                )));
            }
        };
        if let Some(extra) = parts.next() {
            return Err(TableError::identifier(format!(
                "trailing order-by token '{extra}'"
            )));
        }
        ident::check_column(column)?;
        Ok(Self {
            column: column.to_string(),
            direction,
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub(crate) fn render(&self, out: &mut String) -> TableResult<()> {
        ident::check_column(&self.column)?;
        out.push_str(&self.column);
        out.push(' ');
        out.push_str(self.direction.as_sql());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_by_parse_forms() {
        assert_eq!(OrderBy::parse("id").unwrap(), OrderBy::asc("id"));
        assert_eq!(OrderBy::parse("id ASC").unwrap(), OrderBy::asc("id"));
        assert_eq!(OrderBy::parse("id desc").unwrap(), OrderBy::desc("id"));
    }

    #[test]
    fn order_by_rejects_hostile_input() {
        assert!(OrderBy::parse("").is_err());
        assert!(OrderBy::parse("id; DROP TABLE people").is_err());
        assert!(OrderBy::parse("id desc, name").is_err());
        assert!(OrderBy::parse("id descending").is_err());
        assert!(OrderBy::parse("1col").is_err());
    }

    #[test]
    fn predicate_emptiness() {
        assert!(Predicate::All.is_empty());
        assert!(Predicate::And(vec![]).is_empty());
        assert!(Predicate::And(vec![Predicate::All]).is_empty());
        assert!(!Predicate::eq("a", 1).is_empty());
        assert!(!Predicate::And(vec![Predicate::All, Predicate::eq("a", 1)]).is_empty());
    }
}

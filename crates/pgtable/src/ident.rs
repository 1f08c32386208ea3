//! Validation for SQL identifiers spliced into statement text.
//!
//! Column and table names arrive from callers (ultimately from a REST layer)
//! and are written into SQL text verbatim, so every one of them passes
//! through here first. Accepted parts match `[A-Za-z_][A-Za-z0-9_$]*`;
//! quoted identifiers are rejected rather than unquoted.

use crate::error::{TableError, TableResult};

/// Validate a bare column name (single segment, no dots).
pub(crate) fn check_column(name: &str) -> TableResult<()> {
    check_part(name, name)
}

/// Validate a table name, allowing an optional `schema.` qualifier.
pub(crate) fn check_table(name: &str) -> TableResult<()> {
    let mut segments = 0;
    for part in name.split('.') {
        segments += 1;
        if segments > 2 {
            return Err(TableError::identifier(format!(
                "too many segments in table name '{name}'"
            )));
        }
        check_part(part, name)?;
    }
    Ok(())
}

fn check_part(part: &str, whole: &str) -> TableResult<()> {
    let mut chars = part.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        Some(c) => {
            return Err(TableError::identifier(format!(
                "'{whole}' starts a segment with '{c}'"
            )));
        }
        None => {
            return Err(TableError::identifier(format!(
                "empty segment in identifier '{whole}'"
            )));
        }
    }
    for c in chars {
        if c != '_' && c != '$' && !c.is_ascii_alphanumeric() {
            return Err(TableError::identifier(format!(
                "'{whole}' contains '{c}'"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_names() {
        assert!(check_column("users").is_ok());
        assert!(check_column("_hidden").is_ok());
        assert!(check_column("my_var$1").is_ok());
        assert!(check_column("Col9").is_ok());
    }

    #[test]
    fn accepts_schema_qualified_table() {
        assert!(check_table("public.people").is_ok());
        assert!(check_table("people").is_ok());
    }

    #[test]
    fn rejects_empty() {
        assert!(check_column("").is_err());
        assert!(check_table("").is_err());
    }

    #[test]
    fn rejects_digit_start() {
        assert!(check_column("1col").is_err());
    }

    #[test]
    fn rejects_whitespace_and_aliases() {
        assert!(check_column("my col").is_err());
        assert!(check_table("users u").is_err());
        assert!(check_column("id DESC").is_err());
    }

    #[test]
    fn rejects_metacharacters() {
        assert!(check_column("name;drop table people").is_err());
        assert!(check_column("name'--").is_err());
        assert!(check_column("a\"b").is_err());
        assert!(check_column("col()").is_err());
    }

    #[test]
    fn rejects_dots_in_columns() {
        assert!(check_column("t.col").is_err());
    }

    #[test]
    fn rejects_malformed_table_paths() {
        assert!(check_table("a.b.c").is_err());
        assert!(check_table("schema..table").is_err());
        assert!(check_table("schema.").is_err());
        assert!(check_table(".table").is_err());
    }
}

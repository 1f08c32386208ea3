//! Convenient imports for typical `pgtable` usage.
//!
//! Small on purpose; it covers the table-facing API so callers can start
//! with:
//!
//! ```ignore
//! use pgtable::prelude::*;
//! ```

pub use crate::{
    ConnectOptions, FindOptions, OrderBy, Record, RowSet, ScalarValue, TableError, TableRegistry,
    TableResult, TableService, Template, create_pool, create_pool_with_config,
};

//! Per-table data access.
//!
//! [`TableService`] is the primary entry point: it pairs a validated table
//! name with an [`Executor`] and implements the template and primary-key
//! operations on top of the `qb` builders. The service owns no connection;
//! every operation borrows one from the pool for a single transaction.
//!
//! The primary-key descriptor is introspected from `pg_catalog` on first use
//! and cached for the service's lifetime. A descriptor supplied at
//! construction is used verbatim and introspection never runs.

use tokio::sync::OnceCell;

use crate::error::{TableError, TableResult};
use crate::executor::Executor;
use crate::ident;
use crate::qb::{self, BuiltStatement, OrderBy, ParamList};
use crate::record::{Record, RowSet};
use crate::template::Template;
use crate::value::ScalarValue;

/// Primary-key columns of a table, in key order. Composite keys come back
/// in index-column order, which is what key values zip against.
const PRIMARY_KEY_SQL: &str = r#"
SELECT a.attname
FROM pg_catalog.pg_index i
JOIN pg_catalog.pg_attribute a
  ON a.attrelid = i.indrelid AND a.attnum = ANY(i.indkey)
WHERE i.indrelid = $1::text::regclass
  AND i.indisprimary
ORDER BY array_position(i.indkey, a.attnum)
"#;

/// Options for template reads: projection, ordering and pagination.
///
/// All parts are optional; the default selects every column of every
/// matching row in database order.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    columns: Option<Vec<String>>,
    order_by: Vec<OrderBy>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict output to these columns, in this order.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Append an ordering term.
    pub fn order_by(mut self, term: OrderBy) -> Self {
        self.order_by.push(term);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Template and key operations over one table.
///
/// Shareable across tasks; operations borrow a pooled connection each and
/// hold no other state than the cached key descriptor.
#[derive(Debug)]
pub struct TableService {
    table: String,
    executor: Executor,
    key: OnceCell<Vec<String>>,
}

impl TableService {
    /// Create a service for `table`, introspecting the primary key on first
    /// key-based operation. The table name is validated here.
    pub fn new(executor: Executor, table: impl Into<String>) -> TableResult<Self> {
        let table = table.into();
        ident::check_table(&table)?;
        Ok(Self {
            table,
            executor,
            key: OnceCell::new(),
        })
    }

    /// Create a service with an explicit primary-key descriptor.
    ///
    /// The given columns are taken as the key, in order; introspection is
    /// skipped. An empty descriptor marks the table keyless, which makes
    /// every key-based operation fail with [`TableError::NoPrimaryKey`].
    pub fn with_key_columns(
        executor: Executor,
        table: impl Into<String>,
        key_columns: Vec<String>,
    ) -> TableResult<Self> {
        let table = table.into();
        ident::check_table(&table)?;
        for column in &key_columns {
            ident::check_column(column)?;
        }
        Ok(Self {
            table,
            executor,
            key: OnceCell::new_with(Some(key_columns)),
        })
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Rows matching the template, wrapped in a row set named
    /// `SELECT(<table>)`.
    ///
    /// An empty template matches the whole table, subject to the options'
    /// limit and offset.
    pub async fn find_by_template(
        &self,
        template: &Template,
        options: FindOptions,
    ) -> TableResult<RowSet> {
        let mut query = qb::select(&self.table).filter(template.to_predicate());
        if let Some(columns) = options.columns {
            query = query.columns(columns);
        }
        for term in options.order_by {
            query = query.order_by(term);
        }
        if let Some(limit) = options.limit {
            query = query.limit(limit);
        }
        if let Some(offset) = options.offset {
            query = query.offset(offset);
        }
        let stmt = query.build()?;
        let records = self.executor.fetch(&stmt).await?;
        Ok(RowSet::new(format!("SELECT({})", self.table), records))
    }

    /// The row whose primary key equals `key`, or `None`.
    ///
    /// `key` zips positionally against the key descriptor; the arity must
    /// match exactly. If the key is not actually unique the first matching
    /// row is returned.
    pub async fn find_by_primary_key<K, V>(&self, key: K) -> TableResult<Option<Record>>
    where
        K: IntoIterator<Item = V>,
        V: Into<ScalarValue>,
    {
        self.find_by_primary_key_with(key, FindOptions::new()).await
    }

    /// [`find_by_primary_key`](Self::find_by_primary_key) with projection
    /// and the other find options applied.
    pub async fn find_by_primary_key_with<K, V>(
        &self,
        key: K,
        options: FindOptions,
    ) -> TableResult<Option<Record>>
    where
        K: IntoIterator<Item = V>,
        V: Into<ScalarValue>,
    {
        let template = self.key_template(key).await?;
        let set = self.find_by_template(&template, options).await?;
        Ok(Self::first_row(set))
    }

    /// Insert one record; columns and values come from the record in its
    /// iteration order. An empty record inserts `DEFAULT VALUES`.
    pub async fn insert(&self, record: &Record) -> TableResult<u64> {
        let stmt = qb::insert(&self.table).record(record).build()?;
        self.executor.execute(&stmt).await
    }

    /// Update rows matching the template with the record's values.
    ///
    /// An empty template updates the whole table.
    pub async fn update_by_template(
        &self,
        template: &Template,
        new_values: &Record,
    ) -> TableResult<u64> {
        let stmt = qb::update(&self.table)
            .record(new_values)
            .filter(template.to_predicate())
            .build()?;
        self.executor.execute(&stmt).await
    }

    /// Update the row addressed by primary key.
    pub async fn update_by_key<K, V>(&self, key: K, new_values: &Record) -> TableResult<u64>
    where
        K: IntoIterator<Item = V>,
        V: Into<ScalarValue>,
    {
        let template = self.key_template(key).await?;
        self.update_by_template(&template, new_values).await
    }

    /// Delete rows matching the template.
    ///
    /// An empty template deletes every row in the table.
    pub async fn delete_by_template(&self, template: &Template) -> TableResult<u64> {
        let stmt = qb::delete(&self.table)
            .filter(template.to_predicate())
            .build()?;
        self.executor.execute(&stmt).await
    }

    /// Delete the row addressed by primary key.
    pub async fn delete_by_key<K, V>(&self, key: K) -> TableResult<u64>
    where
        K: IntoIterator<Item = V>,
        V: Into<ScalarValue>,
    {
        let template = self.key_template(key).await?;
        self.delete_by_template(&template).await
    }

    /// `SELECT COUNT(*)` under the template's predicate.
    pub async fn count(&self, template: &Template) -> TableResult<i64> {
        let stmt = qb::select(&self.table)
            .filter(template.to_predicate())
            .build_count()?;
        let records = self.executor.fetch(&stmt).await?;
        let record = records
            .first()
            .ok_or_else(|| TableError::decode("count", "COUNT(*) returned no rows"))?;
        match record.get("count") {
            Some(ScalarValue::Int(n)) => Ok(*n),
            other => Err(TableError::decode(
                "count",
                format!("unexpected COUNT(*) result: {other:?}"),
            )),
        }
    }

    /// The primary-key columns, introspecting and caching them on first
    /// call. Empty for a keyless table.
    pub async fn key_columns(&self) -> TableResult<&[String]> {
        let columns = self
            .key
            .get_or_try_init(|| self.introspect_key())
            .await?;
        Ok(columns)
    }

    async fn introspect_key(&self) -> TableResult<Vec<String>> {
        let mut params = ParamList::new();
        params.push(self.table.clone());
        let stmt = BuiltStatement::new(PRIMARY_KEY_SQL.trim(), params);
        let records = self.executor.fetch(&stmt).await?;

        let mut columns = Vec::with_capacity(records.len());
        for record in &records {
            match record.get("attname") {
                Some(ScalarValue::Text(name)) => columns.push(name.clone()),
                other => {
                    return Err(TableError::decode(
                        "attname",
                        format!("unexpected key introspection result: {other:?}"),
                    ));
                }
            }
        }
        Ok(columns)
    }

    async fn key_template<K, V>(&self, key: K) -> TableResult<Template>
    where
        K: IntoIterator<Item = V>,
        V: Into<ScalarValue>,
    {
        let values: Vec<ScalarValue> = key.into_iter().map(Into::into).collect();
        let columns = self.key_columns().await?;
        if columns.is_empty() {
            return Err(TableError::NoPrimaryKey(self.table.clone()));
        }
        Template::from_key(&self.table, columns, &values)
    }

    /// Collapse a key lookup's rows to the first one, if any.
    fn first_row(set: RowSet) -> Option<Record> {
        set.into_rows().into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectOptions;

    fn test_executor() -> Executor {
        Executor::new(ConnectOptions::default().pool().unwrap())
    }

    #[test]
    fn table_name_is_validated_at_construction() {
        assert!(TableService::new(test_executor(), "people").is_ok());
        assert!(TableService::new(test_executor(), "public.people").is_ok());
        assert!(TableService::new(test_executor(), "people; DROP TABLE people").is_err());
        assert!(TableService::with_key_columns(test_executor(), "people", vec!["id; --".into()]).is_err());
    }

    #[tokio::test]
    async fn explicit_key_columns_skip_introspection() {
        let svc =
            TableService::with_key_columns(test_executor(), "people", vec!["id".into()]).unwrap();
        assert_eq!(svc.key_columns().await.unwrap(), ["id"]);
    }

    #[tokio::test]
    async fn wrong_key_arity_is_rejected() {
        let svc = TableService::with_key_columns(
            test_executor(),
            "people",
            vec!["last".into(), "first".into()],
        )
        .unwrap();
        let err = svc.find_by_primary_key(["doe"]).await.unwrap_err();
        assert!(matches!(
            err,
            TableError::KeyMismatch {
                expected: 2,
                got: 1,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn keyless_table_rejects_key_operations() {
        let svc = TableService::with_key_columns(test_executor(), "log_lines", vec![]).unwrap();
        let err = svc.delete_by_key([1]).await.unwrap_err();
        assert!(matches!(err, TableError::NoPrimaryKey(_)));
    }

    #[test]
    fn primary_key_lookup_collapses_to_first_row() {
        assert_eq!(
            TableService::first_row(RowSet::new("SELECT(people)", Vec::new())),
            None
        );

        let rows = vec![Record::new().with("id", 1), Record::new().with("id", 2)];
        let first = TableService::first_row(RowSet::new("SELECT(people)", rows)).unwrap();
        assert_eq!(first.get("id"), Some(&ScalarValue::Int(1)));
    }
}

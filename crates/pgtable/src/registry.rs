//! Table registry.
//!
//! [`TableRegistry`] maps table names to shared [`TableService`] instances,
//! so callers addressing the same table reuse one service and its cached
//! key descriptor. The registry is an explicit object. Hand it (or an `Arc`
//! of it) to whatever routes table names; there is no process-global state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use deadpool_postgres::Pool;

use crate::error::TableResult;
use crate::executor::Executor;
use crate::table::TableService;

#[derive(Debug)]
pub struct TableRegistry {
    executor: Executor,
    tables: Mutex<HashMap<String, Arc<TableService>>>,
}

impl TableRegistry {
    pub fn new(pool: Pool) -> Self {
        Self::with_executor(Executor::new(pool))
    }

    /// Build on a preconfigured executor; every service shares it.
    pub fn with_executor(executor: Executor) -> Self {
        Self {
            executor,
            tables: Mutex::new(HashMap::new()),
        }
    }

    /// The shared service for `table`, created on first use.
    pub fn table(&self, table: &str) -> TableResult<Arc<TableService>> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(service) = tables.get(table) {
            return Ok(Arc::clone(service));
        }
        let service = Arc::new(TableService::new(self.executor.clone(), table)?);
        tables.insert(table.to_string(), Arc::clone(&service));
        Ok(service)
    }

    /// Register `table` with an explicit primary-key descriptor, replacing
    /// any cached service for that name.
    ///
    /// Registering with an empty descriptor marks the table keyless.
    pub fn register(
        &self,
        table: &str,
        key_columns: Vec<String>,
    ) -> TableResult<Arc<TableService>> {
        let service = Arc::new(TableService::with_key_columns(
            self.executor.clone(),
            table,
            key_columns,
        )?);
        self.tables
            .lock()
            .unwrap()
            .insert(table.to_string(), Arc::clone(&service));
        Ok(service)
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectOptions;

    fn test_registry() -> TableRegistry {
        TableRegistry::new(ConnectOptions::default().pool().unwrap())
    }

    #[test]
    fn same_name_returns_shared_instance() {
        let registry = test_registry();
        let a = registry.table("people").unwrap();
        let b = registry.table("people").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.table_name(), "people");
    }

    #[test]
    fn different_names_are_distinct() {
        let registry = test_registry();
        let a = registry.table("people").unwrap();
        let b = registry.table("orders").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn bad_table_name_is_rejected() {
        let registry = test_registry();
        assert!(registry.table("people; DROP TABLE people").is_err());
    }

    #[tokio::test]
    async fn register_pins_explicit_key() {
        let registry = test_registry();
        let registered = registry
            .register("people", vec!["last".into(), "first".into()])
            .unwrap();
        let fetched = registry.table("people").unwrap();
        assert!(Arc::ptr_eq(&registered, &fetched));
        assert_eq!(fetched.key_columns().await.unwrap(), ["last", "first"]);
    }
}

//! Compile-only checks of the public API.
//!
//! The async closures verify types and signatures; they are never run and
//! nothing here touches a database.

#![allow(dead_code)]

use std::time::Duration;

use pgtable::prelude::*;
use pgtable::{Executor, ExecutorConfig, qb};

#[test]
fn compile_service_operations() {
    let _ = |registry: TableRegistry| async move {
        let people = registry.table("people")?;

        let template = Template::new().with("status", "active");
        let options = FindOptions::new()
            .columns(["id", "name"])
            .order_by(OrderBy::asc("name"))
            .limit(10)
            .offset(20);
        let set: RowSet = people.find_by_template(&template, options).await?;
        let _rows: &[Record] = set.rows();

        let _one: Option<Record> = people.find_by_primary_key([7]).await?;
        let _one: Option<Record> = people
            .find_by_primary_key([ScalarValue::from("doe"), ScalarValue::from("jane")])
            .await?;
        let _one: Option<Record> = people
            .find_by_primary_key_with([7], FindOptions::new().columns(["name"]))
            .await?;

        let patch = Record::new().with("status", "retired");
        let _n: u64 = people.insert(&Record::new().with("name", "jane")).await?;
        let _n: u64 = people.update_by_key([7], &patch).await?;
        let _n: u64 = people.update_by_template(&template, &patch).await?;
        let _n: u64 = people.delete_by_key([7]).await?;
        let _n: u64 = people.delete_by_template(&template).await?;
        let _c: i64 = people.count(&template).await?;
        let _k: &[String] = people.key_columns().await?;

        let _pinned = registry.register("log_lines", vec!["id".to_string()])?;
        TableResult::Ok(())
    };
}

#[test]
fn compile_executor_configuration() {
    let _ = || -> TableResult<()> {
        let pool = ConnectOptions::new()
            .host("db.internal")
            .port(5433)
            .user("svc")
            .password("secret")
            .dbname("app")
            .pool_size(4)
            .pool()?;
        let _ = Executor::with_config(
            pool,
            ExecutorConfig {
                trace_sql: false,
                statement_timeout: Some(Duration::from_secs(5)),
            },
        );
        Ok(())
    };
}

#[test]
fn one_off_statements_through_qb() {
    let stmt = qb::select("people").eq("age", 30).build().unwrap();
    assert_eq!(stmt.sql(), "SELECT * FROM people WHERE age = $1");

    let _ = |executor: Executor| async move {
        let stmt = qb::update("people").set("age", 31).eq("id", 1).build()?;
        let _count: u64 = executor.execute(&stmt).await?;
        let _rows: Vec<Record> = executor.fetch(&qb::select("people").build()?).await?;
        TableResult::Ok(())
    };
}

#[test]
fn json_interop_round_trips() {
    let record = Record::from_json(&serde_json::json!({"name": "jane", "age": 30})).unwrap();
    assert_eq!(record.get("name"), Some(&ScalarValue::Text("jane".into())));
    assert_eq!(record.get("age"), Some(&ScalarValue::Int(30)));

    let template = Template::from_json(&serde_json::json!({"status": "active"})).unwrap();
    assert_eq!(
        template.get("status"),
        Some(&ScalarValue::Text("active".into()))
    );

    let json = record.to_json();
    assert_eq!(json["name"], serde_json::json!("jane"));
}

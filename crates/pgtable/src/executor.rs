//! Statement execution.
//!
//! [`Executor`] borrows a client from the pool, runs one statement inside its
//! own transaction and returns the client. Row-returning statements decode
//! every row before the commit, so a row that fails to decode rolls the
//! statement back instead of committing half-read work.
//!
//! A configured statement timeout is enforced client-side: expiry surfaces a
//! typed error at once, cancels the statement server-side and leaves the
//! transaction to roll back as its connection frees.
//!
//! With tracing enabled (the default), every statement is emitted at debug
//! level under the `pgtable.sql` target with its parameters bound as
//! literals, which is the text you would paste into psql to reproduce it.

use std::future::Future;
use std::time::Duration;

use deadpool_postgres::{Pool, Transaction};
use tokio_postgres::{CancelToken, NoTls};

use crate::error::{TableError, TableResult};
use crate::qb::BuiltStatement;
use crate::record::Record;

/// Execution knobs, applied to every statement the executor runs.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Emit each statement under the `pgtable.sql` target before it runs.
    pub trace_sql: bool,
    /// Abort a statement that has not finished within this duration. Expiry
    /// cancels the statement server-side over a separate connection and
    /// drops the transaction, which queues its rollback.
    pub statement_timeout: Option<Duration>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            trace_sql: true,
            statement_timeout: None,
        }
    }
}

/// Runs built statements against a connection pool.
///
/// Each call borrows one pooled client for exactly one transaction. The
/// executor is cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct Executor {
    pool: Pool,
    config: ExecutorConfig,
}

impl Executor {
    pub fn new(pool: Pool) -> Self {
        Self::with_config(pool, ExecutorConfig::default())
    }

    pub fn with_config(pool: Pool, config: ExecutorConfig) -> Self {
        Self { pool, config }
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run a row-returning statement and decode the rows.
    ///
    /// Commits only after every row has decoded; a decode failure rolls the
    /// transaction back and surfaces as [`TableError::Decode`].
    pub async fn fetch(&self, stmt: &BuiltStatement) -> TableResult<Vec<Record>> {
        let mut client = self.pool.get().await?;
        let cancel = client.cancel_token();
        let tx = client
            .transaction()
            .await
            .map_err(|e| TableError::statement("BEGIN", e))?;
        self.trace(stmt);

        let params = stmt.params().as_sql();
        let rows = match self.guard(tx.query(stmt.sql(), &params)).await {
            Ok(Ok(rows)) => rows,
            Ok(Err(e)) => {
                return Err(Self::fail(tx, stmt, TableError::statement(stmt.sql(), e)).await);
            }
            Err(timed_out) => return Err(Self::abandon(cancel, tx, stmt, timed_out)),
        };

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            match Record::from_row(row) {
                Ok(record) => records.push(record),
                Err(e) => return Err(Self::fail(tx, stmt, e).await),
            }
        }

        tx.commit()
            .await
            .map_err(|e| TableError::statement("COMMIT", e))?;
        Ok(records)
    }

    /// Run a statement for its side effect and return the affected-row count.
    pub async fn execute(&self, stmt: &BuiltStatement) -> TableResult<u64> {
        let mut client = self.pool.get().await?;
        let cancel = client.cancel_token();
        let tx = client
            .transaction()
            .await
            .map_err(|e| TableError::statement("BEGIN", e))?;
        self.trace(stmt);

        let params = stmt.params().as_sql();
        let count = match self.guard(tx.execute(stmt.sql(), &params)).await {
            Ok(Ok(count)) => count,
            Ok(Err(e)) => {
                return Err(Self::fail(tx, stmt, TableError::statement(stmt.sql(), e)).await);
            }
            Err(timed_out) => return Err(Self::abandon(cancel, tx, stmt, timed_out)),
        };

        tx.commit()
            .await
            .map_err(|e| TableError::statement("COMMIT", e))?;
        Ok(count)
    }

    fn trace(&self, stmt: &BuiltStatement) {
        if self.config.trace_sql {
            tracing::debug!(
                target: "pgtable.sql",
                params = stmt.params().len(),
                "{}",
                stmt.render_bound(),
            );
        }
    }

    /// Apply the configured statement timeout to a database future.
    ///
    /// The outer error is the timeout; the inner result is the statement's
    /// own outcome.
    async fn guard<T, F>(&self, fut: F) -> TableResult<Result<T, tokio_postgres::Error>>
    where
        F: Future<Output = Result<T, tokio_postgres::Error>>,
    {
        match self.config.statement_timeout {
            Some(limit) => match tokio::time::timeout(limit, fut).await {
                Ok(result) => Ok(result),
                Err(_) => Err(TableError::Timeout(limit)),
            },
            None => Ok(fut.await),
        }
    }

    /// Roll back after a failure and hand the error back to the caller.
    ///
    /// A rollback that itself fails is folded into the returned error; the
    /// connection is recycled by the pool either way.
    async fn fail(tx: Transaction<'_>, stmt: &BuiltStatement, error: TableError) -> TableError {
        tracing::error!(
            target: "pgtable.sql",
            statement = stmt.sql(),
            "statement failed: {error}",
        );
        match tx.rollback().await {
            Ok(()) => error,
            Err(rollback_err) => {
                TableError::Connection(format!("{error} (rollback failed: {rollback_err})"))
            }
        }
    }

    /// Abandon a statement that is still running server-side after its
    /// timeout expired.
    ///
    /// The cancel request goes out on its own connection, so nothing here
    /// waits on the busy session: an explicit ROLLBACK would queue behind
    /// the statement, while dropping the transaction schedules one for when
    /// the connection frees.
    fn abandon(
        cancel: CancelToken,
        tx: Transaction<'_>,
        stmt: &BuiltStatement,
        error: TableError,
    ) -> TableError {
        tracing::error!(
            target: "pgtable.sql",
            statement = stmt.sql(),
            "statement failed: {error}",
        );
        tokio::spawn(async move {
            let _ = cancel.cancel_query(NoTls).await;
        });
        drop(tx);
        error
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectOptions;
    use std::future;

    fn test_executor(config: ExecutorConfig) -> Executor {
        Executor::with_config(ConnectOptions::default().pool().unwrap(), config)
    }

    #[test]
    fn default_config_traces_without_timeout() {
        let config = ExecutorConfig::default();
        assert!(config.trace_sql);
        assert!(config.statement_timeout.is_none());
    }

    #[tokio::test]
    async fn guard_passes_statement_outcome_through() {
        let executor = test_executor(ExecutorConfig::default());
        let out = executor
            .guard(future::ready(Ok::<_, tokio_postgres::Error>(5)))
            .await;
        assert!(matches!(out, Ok(Ok(5))));
    }

    #[tokio::test]
    async fn guard_times_out_stuck_statement() {
        let executor = test_executor(ExecutorConfig {
            trace_sql: false,
            statement_timeout: Some(Duration::from_millis(10)),
        });
        let err = executor
            .guard(future::pending::<Result<(), tokio_postgres::Error>>())
            .await
            .unwrap_err();
        assert!(matches!(err, TableError::Timeout(d) if d == Duration::from_millis(10)));
    }
}

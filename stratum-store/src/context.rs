use async_trait::async_trait;
use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::error::Result;

#[cfg(feature = "memory")]
mod memory;
#[cfg(any(feature = "pg", feature = "sqlite", feature = "mysql"))]
mod sql;

#[cfg(feature = "memory")]
pub use memory::*;
#[cfg(any(feature = "pg", feature = "sqlite", feature = "mysql"))]
pub use sql::*;

/// Isolation requested when a context opens a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IsolationLevel {
    #[default]
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    pub fn as_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }
}

/// Owner of one database connection and at most one open transaction.
///
/// Constructed closed. `prepare` opens the connection and begins a
/// transaction, `persist` commits it, `rollback` aborts it, `dispose`
/// releases the connection on every exit path. Statements issued between
/// `prepare` and `persist` run inside the open transaction.
#[async_trait]
pub trait Context: Send {
    /// Opens the connection if closed and begins a transaction.
    async fn prepare(&mut self) -> Result<()>;

    /// Opens the connection if closed without beginning a transaction.
    async fn open(&mut self) -> Result<()>;

    /// Commits the open transaction.
    async fn persist(&mut self) -> Result<()>;

    /// Aborts the open transaction.
    async fn rollback(&mut self) -> Result<()>;

    /// Executes a parameterized statement, returning affected rows.
    async fn execute(&mut self, sql: &str, params: Vec<Value>) -> Result<u64>;

    /// First column of the first row, if any.
    async fn query_scalar(&mut self, sql: &str, params: Vec<Value>) -> Result<Option<String>>;

    /// First column of every row.
    async fn query_column(&mut self, sql: &str, params: Vec<Value>) -> Result<Vec<String>>;

    /// Every row, values stringified, `None` for SQL NULL.
    async fn query_rows(&mut self, sql: &str, params: Vec<Value>)
        -> Result<Vec<Vec<Option<String>>>>;

    /// Rolls back any open transaction and releases the connection.
    /// Idempotent; the context is unusable afterwards.
    async fn dispose(&mut self) -> Result<()>;

    fn in_transaction(&self) -> bool;
}

/// Supplies a freshly scoped [`Context`] per unit of work.
pub trait ContextProvider: Send + Sync {
    fn create(&self) -> Box<dyn Context>;
}

/// Runs `action` inside a prepared context scope: `prepare`, the action,
/// then `persist` on success or `rollback` before the error propagates.
///
/// With `open_transaction` false the connection is still opened but the
/// work runs outside a transaction, for statements the target engine
/// refuses to run transactionally.
pub async fn run<T, F>(context: &mut dyn Context, open_transaction: bool, action: F) -> Result<T>
where
    T: Send,
    F: for<'c> FnOnce(&'c mut dyn Context) -> BoxFuture<'c, Result<T>> + Send,
{
    if open_transaction {
        context.prepare().await?;
    } else {
        context.open().await?;
    }

    match action(context).await {
        Ok(value) => {
            if open_transaction {
                context.persist().await?;
            }

            Ok(value)
        }
        Err(err) => {
            if open_transaction {
                if let Err(rollback_err) = context.rollback().await {
                    tracing::error!(error = %rollback_err, "rollback failed after aborted unit of work");
                }
            }

            Err(err)
        }
    }
}

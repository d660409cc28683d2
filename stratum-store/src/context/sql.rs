use std::sync::{Arc, Once};

use async_trait::async_trait;
use serde_json::Value;
use sqlx::any::{AnyArguments, AnyConnection};
use sqlx::query::Query;
use sqlx::{Any, Connection, Row};

use crate::context::{Context, ContextProvider, IsolationLevel};
use crate::dialect::Dialect;
use crate::error::{Result, StoreError};

static DRIVERS: Once = Once::new();

/// [`Context`] over a single `sqlx` `Any` connection.
///
/// Constructed closed; the connection is opened lazily by `prepare` or
/// `open`. Transaction control is issued as explicit statements so the
/// open transaction can span multiple calls on the same connection.
pub struct SqlContext {
    url: String,
    dialect: Arc<dyn Dialect>,
    isolation: IsolationLevel,
    connection: Option<AnyConnection>,
    in_transaction: bool,
    disposed: bool,
}

impl SqlContext {
    pub fn new(url: impl Into<String>, dialect: Arc<dyn Dialect>) -> Self {
        Self::with_isolation(url, dialect, IsolationLevel::default())
    }

    pub fn with_isolation(
        url: impl Into<String>,
        dialect: Arc<dyn Dialect>,
        isolation: IsolationLevel,
    ) -> Self {
        Self {
            url: url.into(),
            dialect,
            isolation,
            connection: None,
            in_transaction: false,
            disposed: false,
        }
    }

    async fn connection(&mut self) -> Result<&mut AnyConnection> {
        if self.disposed {
            return Err(StoreError::Disposed);
        }

        if self.connection.is_none() {
            DRIVERS.call_once(sqlx::any::install_default_drivers);
            let connection = AnyConnection::connect(&self.url).await?;
            self.connection = Some(connection);
        }

        match self.connection.as_mut() {
            Some(connection) => Ok(connection),
            None => Err(StoreError::NotPrepared),
        }
    }
}

fn bind_params(sql: &str, params: Vec<Value>) -> Query<'_, Any, AnyArguments<'_>> {
    let mut query = sqlx::query(sql);

    for param in params {
        query = match param {
            Value::Null => query.bind(None::<String>),
            Value::Bool(value) => query.bind(value),
            Value::Number(value) => query.bind(value.as_i64().unwrap_or_default()),
            Value::String(value) => query.bind(value),
            other => query.bind(other.to_string()),
        };
    }

    query
}

#[async_trait]
impl Context for SqlContext {
    async fn prepare(&mut self) -> Result<()> {
        if self.in_transaction {
            return Err(StoreError::TransactionAlreadyOpen);
        }

        let statements = self.dialect.begin_statements(self.isolation);
        let connection = self.connection().await?;

        for statement in statements {
            sqlx::query(statement.as_str()).execute(&mut *connection).await?;
        }

        self.in_transaction = true;

        Ok(())
    }

    async fn open(&mut self) -> Result<()> {
        self.connection().await?;

        Ok(())
    }

    async fn persist(&mut self) -> Result<()> {
        if !self.in_transaction {
            return Err(StoreError::NoOpenTransaction);
        }

        let connection = self.connection().await?;
        sqlx::query("COMMIT").execute(&mut *connection).await?;
        self.in_transaction = false;

        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        if !self.in_transaction {
            return Err(StoreError::NoOpenTransaction);
        }

        let connection = self.connection().await?;
        sqlx::query("ROLLBACK").execute(&mut *connection).await?;
        self.in_transaction = false;

        Ok(())
    }

    async fn execute(&mut self, sql: &str, params: Vec<Value>) -> Result<u64> {
        let connection = self.connection().await?;
        let result = bind_params(sql, params).execute(&mut *connection).await?;

        Ok(result.rows_affected())
    }

    async fn query_scalar(&mut self, sql: &str, params: Vec<Value>) -> Result<Option<String>> {
        let connection = self.connection().await?;
        let row = bind_params(sql, params).fetch_optional(&mut *connection).await?;

        match row {
            Some(row) => Ok(row.try_get::<Option<String>, _>(0)?),
            None => Ok(None),
        }
    }

    async fn query_column(&mut self, sql: &str, params: Vec<Value>) -> Result<Vec<String>> {
        let connection = self.connection().await?;
        let rows = bind_params(sql, params).fetch_all(&mut *connection).await?;

        let mut values = Vec::with_capacity(rows.len());

        for row in rows {
            values.push(row.try_get::<String, _>(0)?);
        }

        Ok(values)
    }

    async fn query_rows(
        &mut self,
        sql: &str,
        params: Vec<Value>,
    ) -> Result<Vec<Vec<Option<String>>>> {
        let connection = self.connection().await?;
        let rows = bind_params(sql, params).fetch_all(&mut *connection).await?;

        let mut result = Vec::with_capacity(rows.len());

        for row in rows {
            let mut values = Vec::with_capacity(row.len());

            for index in 0..row.len() {
                values.push(row.try_get::<Option<String>, _>(index)?);
            }

            result.push(values);
        }

        Ok(result)
    }

    async fn dispose(&mut self) -> Result<()> {
        if self.disposed {
            return Ok(());
        }

        if let Some(mut connection) = self.connection.take() {
            if self.in_transaction {
                if let Err(err) = sqlx::query("ROLLBACK").execute(&mut connection).await {
                    tracing::warn!(error = %err, "rollback on dispose failed");
                }

                self.in_transaction = false;
            }

            connection.close().await?;
        }

        self.disposed = true;

        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.in_transaction
    }
}

/// Creates a fresh closed [`SqlContext`] per unit of work.
#[derive(Clone)]
pub struct SqlContextProvider {
    url: String,
    dialect: Arc<dyn Dialect>,
    isolation: IsolationLevel,
}

impl SqlContextProvider {
    pub fn new(url: impl Into<String>, dialect: Arc<dyn Dialect>) -> Self {
        Self {
            url: url.into(),
            dialect,
            isolation: IsolationLevel::default(),
        }
    }

    pub fn isolation(mut self, isolation: IsolationLevel) -> Self {
        self.isolation = isolation;
        self
    }
}

impl ContextProvider for SqlContextProvider {
    fn create(&self) -> Box<dyn Context> {
        Box::new(SqlContext::with_isolation(
            self.url.clone(),
            self.dialect.clone(),
            self.isolation,
        ))
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use serde_json::Value;

use crate::context::{run, Context};
use crate::dialect::Dialect;
use crate::engine::Engine;
use crate::error::{Result, StoreError};
use crate::record::HistoryRecord;

/// History engine executing per-dialect SQL through one execution
/// context. The context's connection is opened on first use and reused
/// across operations, one transaction per operation.
pub struct SqlEngine {
    context: Box<dyn Context>,
    dialect: Arc<dyn Dialect>,
    prefix: Option<String>,
}

impl SqlEngine {
    pub fn new(context: Box<dyn Context>, dialect: Arc<dyn Dialect>) -> Self {
        Self {
            context,
            dialect,
            prefix: None,
        }
    }

    pub fn with_prefix(
        context: Box<dyn Context>,
        dialect: Arc<dyn Dialect>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            context,
            dialect,
            prefix: Some(prefix.into()),
        }
    }

    pub fn table(&self) -> String {
        format!("{}_history", self.prefix.as_deref().unwrap_or("st"))
    }
}

fn record_from_row(row: Vec<Option<String>>) -> Result<HistoryRecord> {
    let mut columns = row.into_iter();

    let context_name = columns
        .next()
        .flatten()
        .ok_or(StoreError::MissingColumn("context_name"))?;
    let migration_id = columns
        .next()
        .flatten()
        .ok_or(StoreError::MissingColumn("migration_id"))?;
    let class_name = columns
        .next()
        .flatten()
        .ok_or(StoreError::MissingColumn("class_name"))?;
    let description = columns.next().flatten();
    let applied_on = columns
        .next()
        .flatten()
        .ok_or(StoreError::MissingColumn("applied_on"))?;

    Ok(HistoryRecord {
        context_name,
        migration_id,
        class_name,
        description,
        applied_on: DateTime::parse_from_rfc3339(&applied_on)?.with_timezone(&Utc),
    })
}

#[async_trait]
impl Engine for SqlEngine {
    async fn prepare(&mut self) -> Result<()> {
        let exists = self.dialect.table_exists(&self.table());
        let create = self.dialect.create_table(&self.table());

        run(self.context.as_mut(), true, move |ctx| {
            async move {
                if ctx.query_scalar(&exists, Vec::new()).await?.is_none() {
                    ctx.execute(&create, Vec::new()).await?;
                }

                Ok(())
            }
            .boxed()
        })
        .await
    }

    async fn add(&mut self, record: HistoryRecord) -> Result<()> {
        let most_recent = self.dialect.select_most_recent_id(&self.table());
        let insert = self.dialect.insert(&self.table());

        run(self.context.as_mut(), true, move |ctx| {
            async move {
                let current = ctx
                    .query_scalar(&most_recent, vec![Value::String(record.context_name.clone())])
                    .await?;

                if let Some(current) = current {
                    if record.migration_id.as_str() <= current.as_str() {
                        return Err(StoreError::OutOfOrderMigration {
                            id: record.migration_id,
                            most_recent: current,
                        });
                    }
                }

                ctx.execute(
                    &insert,
                    vec![
                        Value::String(record.context_name),
                        Value::String(record.migration_id),
                        Value::String(record.class_name),
                        record.description.map(Value::String).unwrap_or(Value::Null),
                        Value::String(record.applied_on.to_rfc3339()),
                    ],
                )
                .await?;

                Ok(())
            }
            .boxed()
        })
        .await
    }

    async fn ids(&mut self, context_name: &str) -> Result<Vec<String>> {
        let select = self.dialect.select_all_ids(&self.table());
        let context_name = context_name.to_owned();

        run(self.context.as_mut(), true, move |ctx| {
            async move { ctx.query_column(&select, vec![Value::String(context_name)]).await }
                .boxed()
        })
        .await
    }

    async fn most_recent_id(&mut self, context_name: &str) -> Result<Option<String>> {
        let select = self.dialect.select_most_recent_id(&self.table());
        let context_name = context_name.to_owned();

        run(self.context.as_mut(), true, move |ctx| {
            async move { ctx.query_scalar(&select, vec![Value::String(context_name)]).await }
                .boxed()
        })
        .await
    }

    async fn remove_most_recent(&mut self, context_name: &str) -> Result<bool> {
        let most_recent = self.dialect.select_most_recent_id(&self.table());
        let delete = self.dialect.delete(&self.table());
        let context_name = context_name.to_owned();

        run(self.context.as_mut(), true, move |ctx| {
            async move {
                let current = ctx
                    .query_scalar(&most_recent, vec![Value::String(context_name.clone())])
                    .await?;

                let Some(current) = current else {
                    return Ok(false);
                };

                ctx.execute(
                    &delete,
                    vec![Value::String(context_name), Value::String(current)],
                )
                .await?;

                Ok(true)
            }
            .boxed()
        })
        .await
    }

    async fn records(&mut self, context_name: &str) -> Result<Vec<HistoryRecord>> {
        let select = self.dialect.select_records(&self.table());
        let context_name = context_name.to_owned();

        let rows = run(self.context.as_mut(), true, move |ctx| {
            async move { ctx.query_rows(&select, vec![Value::String(context_name)]).await }
                .boxed()
        })
        .await?;

        let mut records = Vec::with_capacity(rows.len());

        for row in rows {
            records.push(record_from_row(row)?);
        }

        Ok(records)
    }
}

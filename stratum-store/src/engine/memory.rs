use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::engine::Engine;
use crate::error::{Result, StoreError};
use crate::record::HistoryRecord;

/// In-memory history engine. Clones share state, so tests and embedded
/// callers can inspect history from outside the store that owns it.
#[derive(Debug, Clone, Default)]
pub struct MemoryEngine(Arc<RwLock<Vec<HistoryRecord>>>);

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<HistoryRecord> {
        self.0.read().clone()
    }
}

#[async_trait]
impl Engine for MemoryEngine {
    async fn prepare(&mut self) -> Result<()> {
        Ok(())
    }

    async fn add(&mut self, record: HistoryRecord) -> Result<()> {
        let mut records = self.0.write();

        let most_recent = records
            .iter()
            .filter(|r| r.context_name == record.context_name)
            .map(|r| r.migration_id.as_str())
            .max()
            .map(ToOwned::to_owned);

        if let Some(most_recent) = most_recent {
            if record.migration_id <= most_recent {
                return Err(StoreError::OutOfOrderMigration {
                    id: record.migration_id,
                    most_recent,
                });
            }
        }

        records.push(record);

        Ok(())
    }

    async fn ids(&mut self, context_name: &str) -> Result<Vec<String>> {
        Ok(self
            .0
            .read()
            .iter()
            .filter(|r| r.context_name == context_name)
            .map(|r| r.migration_id.clone())
            .collect())
    }

    async fn most_recent_id(&mut self, context_name: &str) -> Result<Option<String>> {
        Ok(self
            .0
            .read()
            .iter()
            .filter(|r| r.context_name == context_name)
            .map(|r| r.migration_id.clone())
            .max())
    }

    async fn remove_most_recent(&mut self, context_name: &str) -> Result<bool> {
        let mut records = self.0.write();

        let most_recent = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.context_name == context_name)
            .max_by(|(_, a), (_, b)| a.migration_id.cmp(&b.migration_id))
            .map(|(index, _)| index);

        match most_recent {
            Some(index) => {
                records.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn records(&mut self, context_name: &str) -> Result<Vec<HistoryRecord>> {
        let mut records: Vec<HistoryRecord> = self
            .0
            .read()
            .iter()
            .filter(|r| r.context_name == context_name)
            .cloned()
            .collect();

        records.sort_by(|a, b| a.migration_id.cmp(&b.migration_id));

        Ok(records)
    }
}

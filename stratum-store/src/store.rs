use chrono::Utc;

use crate::engine::Engine;
use crate::error::{Result, StoreError};
use crate::normalizer::Normalizer;
use crate::record::HistoryRecord;

/// CRUD over the persisted collection of applied-migration records.
///
/// Identifier arguments are normalized with the configured policy before
/// they reach the storage engine; ordering checks are ordinal.
pub struct HistoryStore {
    engine: Box<dyn Engine>,
    normalizer: Normalizer,
    context_name: String,
}

impl HistoryStore {
    pub fn new<E: Engine + 'static>(engine: E) -> Self {
        Self {
            engine: Box::new(engine),
            normalizer: Normalizer::default(),
            context_name: "main".to_owned(),
        }
    }

    pub fn context_name(mut self, context_name: impl Into<String>) -> Self {
        self.context_name = context_name.into();
        self
    }

    pub fn normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Creates the history table when missing. Safe to call on every run.
    pub async fn prepare_database(&mut self) -> Result<()> {
        self.engine.prepare().await
    }

    /// Records one applied migration.
    ///
    /// The identifier must sort strictly after the most recent recorded
    /// one; anything else would corrupt the "most recent = highest id"
    /// invariant the runner resumes from.
    pub async fn add_migration(
        &mut self,
        migration_id: &str,
        class_name: &str,
        description: Option<&str>,
    ) -> Result<()> {
        let migration_id = self.required(migration_id, "migration_id")?;
        let class_name = self.required(class_name, "class_name")?;

        let record = HistoryRecord {
            context_name: self.context_name.clone(),
            migration_id,
            class_name,
            description: description.map(ToOwned::to_owned),
            applied_on: Utc::now(),
        };

        self.engine.add(record).await
    }

    /// Every recorded identifier, unordered.
    pub async fn get_all_migrations(&mut self) -> Result<Vec<String>> {
        self.engine.ids(&self.context_name).await
    }

    pub async fn get_most_recent_migration_id(&mut self) -> Result<Option<String>> {
        self.engine.most_recent_id(&self.context_name).await
    }

    /// Deletes the most recent record. Returns `false` when history is
    /// empty.
    pub async fn remove_most_recent_migration(&mut self) -> Result<bool> {
        self.engine.remove_most_recent(&self.context_name).await
    }

    /// Full history rows, ordered by identifier.
    pub async fn records(&mut self) -> Result<Vec<HistoryRecord>> {
        self.engine.records(&self.context_name).await
    }

    fn required(&self, raw: &str, name: &'static str) -> Result<String> {
        let value = self.normalizer.normalize(raw);

        if value.is_empty() {
            return Err(StoreError::BlankArgument(name));
        }

        Ok(value)
    }
}

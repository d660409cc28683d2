use std::collections::BTreeMap;

use futures_util::FutureExt;
use stratum_store::{run, ContextProvider, HistoryStore, Normalizer};

use crate::error::{Result, RunnerError};
use crate::migration::{Migration, MigrationEntry};

/// Outcome of an apply run: the identifiers applied, in order. Empty when
/// the run was a no-op (everything already applied, or nothing
/// registered).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub applied: Vec<String>,
}

/// Builder for [`Runner`]. The registered set is normalized, sorted and
/// validated on `build`.
pub struct RunnerBuilder {
    migrations: Vec<Box<dyn Migration>>,
    store: HistoryStore,
    contexts: Box<dyn ContextProvider>,
    normalizer: Normalizer,
    description: Option<String>,
}

impl RunnerBuilder {
    pub fn normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Free-text description recorded with every history row.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// A duplicate normalized identifier is a fatal configuration error,
    /// never silently resolved.
    pub fn build(self) -> Result<Runner> {
        let mut entries = BTreeMap::new();

        for unit in self.migrations {
            let id = self.normalizer.normalize(unit.id());

            if id.is_empty() {
                return Err(RunnerError::BlankArgument("migration id"));
            }

            let class_name = self.normalizer.normalize(unit.name());
            let entry = MigrationEntry::new(id.clone(), class_name, unit);

            if entries.insert(id.clone(), entry).is_some() {
                return Err(RunnerError::DuplicateId(id));
            }
        }

        Ok(Runner {
            entries,
            store: self.store.normalizer(self.normalizer),
            contexts: self.contexts,
            normalizer: self.normalizer,
            description: self.description,
        })
    }
}

/// Orders the registered migration set, reconciles it against persisted
/// history and applies what is missing, one execution scope per unit.
pub struct Runner {
    entries: BTreeMap<String, MigrationEntry>,
    store: HistoryStore,
    contexts: Box<dyn ContextProvider>,
    normalizer: Normalizer,
    description: Option<String>,
}

impl Runner {
    pub fn builder(
        migrations: Vec<Box<dyn Migration>>,
        store: HistoryStore,
        contexts: Box<dyn ContextProvider>,
    ) -> RunnerBuilder {
        RunnerBuilder {
            migrations,
            store,
            contexts,
            normalizer: Normalizer::default(),
            description: None,
        }
    }

    /// Registered migrations in ascending identifier order.
    pub fn migrations(&self) -> impl Iterator<Item = &MigrationEntry> {
        self.entries.values()
    }

    /// Applies every registered migration that is not yet recorded.
    pub async fn apply_all(&mut self) -> Result<ApplyReport> {
        let Some(last) = self.entries.keys().next_back().cloned() else {
            tracing::info!("no migrations registered, nothing to apply");
            return Ok(ApplyReport::default());
        };

        self.apply_to(&last).await
    }

    /// Applies registered migrations, in ascending order, up to and
    /// including `target`.
    ///
    /// History already recorded for migrations after a failure point is
    /// kept; the failing unit's own transaction is rolled back and the
    /// error propagates unmodified.
    pub async fn apply_to(&mut self, target: &str) -> Result<ApplyReport> {
        let target = self.target_id(target)?;

        self.store.prepare_database().await?;

        let applied = self.reconcile().await?;

        if applied.iter().any(|id| id == &target) {
            tracing::info!(target_id = %target, "target migration already applied, nothing to do");
            return Ok(ApplyReport::default());
        }

        let start = applied.len();
        tracing::info!(target_id = %target, start, "applying migrations");

        let Runner {
            entries,
            store,
            contexts,
            description,
            ..
        } = self;

        let to_apply: Vec<&MigrationEntry> = entries
            .values()
            .skip(start)
            .take_while(|entry| entry.id() <= target.as_str())
            .collect();

        let mut report = ApplyReport::default();

        for entry in to_apply {
            let unit = entry.unit.clone();
            let requires_transaction = unit.requires_transaction();
            let mut context = contexts.create();

            tracing::debug!(migration_id = %entry.id(), requires_transaction, "applying migration");

            let outcome = run(context.as_mut(), requires_transaction, move |ctx| {
                async move { unit.apply(ctx).await }.boxed()
            })
            .await;

            if let Err(err) = context.dispose().await {
                tracing::warn!(migration_id = %entry.id(), error = %err, "failed to release migration context");
            }

            outcome?;

            store
                .add_migration(entry.id(), entry.class_name(), description.as_deref())
                .await?;

            tracing::info!(migration_id = %entry.id(), "migration applied");
            report.applied.push(entry.id().to_owned());
        }

        Ok(report)
    }

    /// Identifiers an apply-all run would execute, without running
    /// anything. The history table is created if missing.
    pub async fn pending(&mut self) -> Result<Vec<String>> {
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }

        self.store.prepare_database().await?;

        let applied = self.reconcile().await?;

        Ok(self.entries.keys().skip(applied.len()).cloned().collect())
    }

    /// The most recent recorded identifier, or `None` on empty history.
    pub async fn most_recent_applied(&mut self) -> Result<Option<String>> {
        self.store.prepare_database().await?;

        Ok(self.store.get_most_recent_migration_id().await?)
    }

    /// Reverts the most recently applied migration and removes its
    /// history record. Returns the reverted identifier, or `None` when
    /// history is empty.
    pub async fn revert_most_recent(&mut self) -> Result<Option<String>> {
        self.store.prepare_database().await?;

        let Some(most_recent) = self.store.get_most_recent_migration_id().await? else {
            tracing::info!("history is empty, nothing to revert");
            return Ok(None);
        };

        let id = self.normalizer.normalize(&most_recent);

        let Some(entry) = self.entries.get(&id) else {
            return Err(RunnerError::UnknownApplied(id));
        };

        let unit = entry.unit.clone();
        let requires_transaction = unit.requires_transaction();
        let mut context = self.contexts.create();

        let reverted = run(context.as_mut(), requires_transaction, move |ctx| {
            async move { unit.rollback(ctx).await }.boxed()
        })
        .await;

        if let Err(err) = context.dispose().await {
            tracing::warn!(migration_id = %id, error = %err, "failed to release revert context");
        }

        reverted?;

        self.store.remove_most_recent_migration().await?;
        tracing::info!(migration_id = %id, "migration reverted");

        Ok(Some(id))
    }

    /// Validates persisted history as a gapless prefix of the registered
    /// set and returns it, normalized and ascending.
    async fn reconcile(&mut self) -> Result<Vec<String>> {
        tracing::debug!(
            registered = self.entries.len(),
            "reconciling history against registered migrations"
        );

        let recorded = self.store.get_all_migrations().await?;

        let mut applied: Vec<String> = recorded
            .iter()
            .map(|id| self.normalizer.normalize(id))
            .collect();
        applied.sort_unstable();

        if applied.len() > self.entries.len() {
            tracing::warn!(
                applied = applied.len(),
                registered = self.entries.len(),
                "database history is ahead of the registered set"
            );

            return Err(RunnerError::HistoryAheadOfCode {
                applied: applied.len(),
                registered: self.entries.len(),
            });
        }

        for (index, (registered, recorded)) in self.entries.keys().zip(applied.iter()).enumerate() {
            if registered != recorded {
                tracing::warn!(index, applied = %recorded, registered = %registered, "history mismatch");

                return Err(RunnerError::HistoryMismatch {
                    index,
                    applied: recorded.clone(),
                    registered: registered.clone(),
                });
            }
        }

        Ok(applied)
    }

    fn target_id(&self, raw: &str) -> Result<String> {
        let target = self.normalizer.normalize(raw);

        if target.is_empty() {
            return Err(RunnerError::BlankArgument("target migration id"));
        }

        if !self.entries.contains_key(&target) {
            return Err(RunnerError::UnknownTarget(target));
        }

        Ok(target)
    }
}

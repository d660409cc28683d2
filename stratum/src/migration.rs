use std::sync::Arc;

use async_trait::async_trait;
use stratum_store::Context;

/// One versioned unit of schema work.
///
/// Identifiers are compared byte-wise after normalization; timestamp or
/// zero-padded prefixes keep lexicographic order aligned with intended
/// application order.
#[async_trait]
pub trait Migration: Send + Sync {
    /// Stable identifier, unique within the registered set.
    fn id(&self) -> &str;

    /// Implementation name recorded in history for audit. Defaults to the
    /// identifier.
    fn name(&self) -> &str {
        self.id()
    }

    /// Whether `apply`/`rollback` must run inside a transaction. Units
    /// whose statements the target engine refuses to run transactionally
    /// opt out and accept partial effects on failure.
    fn requires_transaction(&self) -> bool {
        true
    }

    /// Applies the unit's effects through the given context.
    async fn apply(&self, context: &mut dyn Context) -> stratum_store::Result<()>;

    /// Reverts the unit's effects.
    async fn rollback(&self, context: &mut dyn Context) -> stratum_store::Result<()>;
}

/// Immutable registration of one migration: normalized identifier,
/// normalized implementation name and the executable unit. Built once at
/// runner construction, never mutated.
pub struct MigrationEntry {
    pub(crate) id: String,
    pub(crate) class_name: String,
    pub(crate) unit: Arc<dyn Migration>,
}

impl MigrationEntry {
    pub(crate) fn new(id: String, class_name: String, unit: Box<dyn Migration>) -> Self {
        Self {
            id,
            class_name,
            unit: Arc::from(unit),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of persisted migration history.
///
/// Created when a migration successfully applies, never mutated, deleted
/// only by the remove-most-recent operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub context_name: String,
    pub migration_id: String,
    pub class_name: String,
    pub description: Option<String>,
    pub applied_on: DateTime<Utc>,
}

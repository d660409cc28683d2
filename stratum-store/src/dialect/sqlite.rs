use crate::context::IsolationLevel;
use crate::dialect::Dialect;

/// SQLite history dialect. `TEXT` collates `BINARY` by default, which is
/// exactly ordinal identifier ordering. The engine fixes its own
/// isolation, the requested level is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn begin_statements(&self, _isolation: IsolationLevel) -> Vec<String> {
        vec!["BEGIN".to_owned()]
    }

    fn table_exists(&self, table: &str) -> String {
        format!("SELECT name FROM sqlite_master WHERE type = 'table' AND name = '{table}'")
    }

    fn create_table(&self, table: &str) -> String {
        format!(
            "CREATE TABLE {table} (\
             context_name TEXT NOT NULL, \
             migration_id TEXT NOT NULL, \
             class_name TEXT NOT NULL, \
             description TEXT, \
             applied_on TEXT NOT NULL, \
             PRIMARY KEY (context_name, migration_id))"
        )
    }

    fn insert(&self, table: &str) -> String {
        format!(
            "INSERT INTO {table} (context_name, migration_id, class_name, description, applied_on) \
             VALUES (?, ?, ?, ?, ?)"
        )
    }

    fn select_all_ids(&self, table: &str) -> String {
        format!("SELECT migration_id FROM {table} WHERE context_name = ?")
    }

    fn select_most_recent_id(&self, table: &str) -> String {
        format!(
            "SELECT migration_id FROM {table} WHERE context_name = ? \
             ORDER BY migration_id DESC LIMIT 1"
        )
    }

    fn select_records(&self, table: &str) -> String {
        format!(
            "SELECT context_name, migration_id, class_name, description, applied_on \
             FROM {table} WHERE context_name = ? ORDER BY migration_id"
        )
    }

    fn delete(&self, table: &str) -> String {
        format!("DELETE FROM {table} WHERE context_name = ? AND migration_id = ?")
    }
}

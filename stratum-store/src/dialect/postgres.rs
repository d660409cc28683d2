use crate::context::IsolationLevel;
use crate::dialect::Dialect;

/// PostgreSQL history dialect. Identifier ordering is forced to the `C`
/// collation so it stays byte-wise under any database locale.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn begin_statements(&self, isolation: IsolationLevel) -> Vec<String> {
        vec![format!("BEGIN ISOLATION LEVEL {}", isolation.as_sql())]
    }

    fn table_exists(&self, table: &str) -> String {
        format!(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_name = '{table}'"
        )
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
             VALUES ($1, $2, $3, $4, $5)"
        )
    }

    fn select_all_ids(&self, table: &str) -> String {
        format!("SELECT migration_id FROM {table} WHERE context_name = $1")
    }

    fn select_most_recent_id(&self, table: &str) -> String {
        format!(
            "SELECT migration_id FROM {table} WHERE context_name = $1 \
             ORDER BY migration_id COLLATE \"C\" DESC LIMIT 1"
        )
    }

    fn select_records(&self, table: &str) -> String {
        format!(
            "SELECT context_name, migration_id, class_name, description, applied_on \
             FROM {table} WHERE context_name = $1 ORDER BY migration_id COLLATE \"C\""
        )
    }

    fn delete(&self, table: &str) -> String {
        format!("DELETE FROM {table} WHERE context_name = $1 AND migration_id = $2")
    }
}

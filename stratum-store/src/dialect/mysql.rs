use crate::context::IsolationLevel;
use crate::dialect::Dialect;

/// MySQL history dialect. Key columns are bounded `VARCHAR` with a binary
/// collation so primary keys work and identifier ordering stays byte-wise.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn begin_statements(&self, isolation: IsolationLevel) -> Vec<String> {
        vec![
            format!("SET TRANSACTION ISOLATION LEVEL {}", isolation.as_sql()),
            "START TRANSACTION".to_owned(),
        ]
    }

    fn table_exists(&self, table: &str) -> String {
        format!(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = DATABASE() AND table_name = '{table}'"
        )
    }

    fn create_table(&self, table: &str) -> String {
        format!(
            "CREATE TABLE {table} (\
             context_name VARCHAR(128) NOT NULL, \
             migration_id VARCHAR(255) NOT NULL, \
             class_name VARCHAR(255) NOT NULL, \
             description VARCHAR(1024), \
             applied_on VARCHAR(64) NOT NULL, \
             PRIMARY KEY (context_name, migration_id)) \
             CHARACTER SET utf8mb4 COLLATE utf8mb4_bin"
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

use crate::context::IsolationLevel;

#[cfg(feature = "mysql")]
mod mysql;
#[cfg(feature = "pg")]
mod postgres;
#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "mysql")]
pub use mysql::*;
#[cfg(feature = "pg")]
pub use postgres::*;
#[cfg(feature = "sqlite")]
pub use sqlite::*;

/// Engine-specific SQL for the history table and transaction control.
///
/// Each query is a single parameterized statement; placeholder syntax and
/// byte-wise collation of `migration_id` are the dialect's responsibility.
pub trait Dialect: Send + Sync {
    /// Statements opening a transaction at the given isolation level.
    fn begin_statements(&self, isolation: IsolationLevel) -> Vec<String>;

    /// Query returning a row when the history table exists. Binds nothing.
    fn table_exists(&self, table: &str) -> String;

    /// Statement creating the history table.
    fn create_table(&self, table: &str) -> String;

    /// Statement inserting one history row. Binds context_name,
    /// migration_id, class_name, description, applied_on.
    fn insert(&self, table: &str) -> String;

    /// Query returning every recorded identifier. Binds context_name.
    fn select_all_ids(&self, table: &str) -> String;

    /// Query returning the byte-wise greatest identifier. Binds
    /// context_name.
    fn select_most_recent_id(&self, table: &str) -> String;

    /// Query returning full rows ordered by identifier. Binds
    /// context_name.
    fn select_records(&self, table: &str) -> String;

    /// Statement deleting one row. Binds context_name, migration_id.
    fn delete(&self, table: &str) -> String;
}

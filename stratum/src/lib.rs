#![forbid(unsafe_code)]

mod error;
mod migration;
mod runner;

pub use error::*;
pub use migration::*;
pub use runner::*;

pub use stratum_store::{
    run, Context, ContextProvider, Dialect, Engine, HistoryRecord, HistoryStore, IsolationLevel,
    Normalizer, Result as StoreResult, StoreError,
};

#[cfg(feature = "memory")]
pub use stratum_store::{MemoryContext, MemoryContextProvider, MemoryEngine, MemoryJournal};

#[cfg(any(feature = "pg", feature = "sqlite", feature = "mysql"))]
pub use stratum_store::{SqlContext, SqlContextProvider, SqlEngine};

#[cfg(feature = "mysql")]
pub use stratum_store::MySqlDialect;

#[cfg(feature = "pg")]
pub use stratum_store::PostgresDialect;

#[cfg(feature = "sqlite")]
pub use stratum_store::SqliteDialect;

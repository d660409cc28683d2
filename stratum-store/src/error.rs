#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("execution context used after dispose")]
    Disposed,

    #[error("no open transaction, `prepare` must be called first")]
    NoOpenTransaction,

    #[error("a transaction is already open on this context")]
    TransactionAlreadyOpen,

    #[error("connection is not open, `prepare` must be called first")]
    NotPrepared,

    #[error("{0} must not be blank")]
    BlankArgument(&'static str),

    #[error("migration `{id}` does not sort after most recent `{most_recent}`")]
    OutOfOrderMigration { id: String, most_recent: String },

    #[error("history row missing column `{0}`")]
    MissingColumn(&'static str),

    #[cfg(any(feature = "pg", feature = "sqlite", feature = "mysql"))]
    #[error("sqlx `{0}`")]
    Sqlx(#[from] sqlx::Error),

    #[error("chrono `{0}`")]
    Chrono(#[from] chrono::ParseError),

    #[error("{0}")]
    Any(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

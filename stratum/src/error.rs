use stratum_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("duplicate migration id `{0}` in registered set")]
    DuplicateId(String),

    #[error("no migration registered with id `{0}`")]
    UnknownTarget(String),

    #[error("{0} must not be blank")]
    BlankArgument(&'static str),

    #[error("database history has {applied} applied migrations, only {registered} registered")]
    HistoryAheadOfCode { applied: usize, registered: usize },

    #[error("history mismatch at position {index}: applied `{applied}`, registered `{registered}`")]
    HistoryMismatch {
        index: usize,
        applied: String,
        registered: String,
    },

    #[error("most recent applied migration `{0}` is not registered, cannot revert")]
    UnknownApplied(String),

    #[error("store `{0}`")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, RunnerError>;

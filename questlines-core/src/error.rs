/// Failures surfaced by the questline repository.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The input aggregate is unusable as given (e.g. an empty quest id).
    #[error("{0}")]
    Validation(String),

    /// No questline with the given id exists.
    #[error("questline {0} not found")]
    NotFound(String),

    /// Any failure reported by SQLite: connectivity, constraints, conversions.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("database connection lock poisoned")]
    LockPoisoned,
}

pub type StoreResult<T> = Result<T, StoreError>;

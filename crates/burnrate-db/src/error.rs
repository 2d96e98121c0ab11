//! Error types for the persistence layer.
//!
//! Raw [`sqlx`] failures are classified into the kinds the action
//! processor and tick engine key their recovery on: uniqueness conflicts
//! surface immediately, transaction conflicts and transient failures are
//! retry candidates, everything else is terminal.

/// Errors that can occur in the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// No row matched.
    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint was violated.
    #[error("unique constraint violated: {0}")]
    UniqueConflict(String),

    /// A serializable transaction lost; the caller may retry.
    #[error("transaction conflict")]
    TransactionConflict,

    /// A connection or I/O level failure; retry with backoff.
    #[error("transient storage failure: {0}")]
    Transient(String),

    /// A migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A JSON aggregate failed to (de)serialize.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A configuration error (bad URL, missing settings).
    #[error("configuration error: {0}")]
    Config(String),

    /// Any other database failure.
    #[error("database error: {0}")]
    Other(String),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        classify(&err)
    }
}

/// PostgreSQL SQLSTATE for unique violations.
const UNIQUE_VIOLATION: &str = "23505";

/// PostgreSQL SQLSTATEs that signal a retryable transaction conflict.
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

/// Map an sqlx error onto the stable error kinds.
fn classify(err: &sqlx::Error) -> DbError {
    match err {
        sqlx::Error::RowNotFound => DbError::NotFound("row".to_owned()),
        sqlx::Error::Database(db) => {
            let code = db.code().map(|c| c.to_string()).unwrap_or_default();
            match code.as_str() {
                UNIQUE_VIOLATION => DbError::UniqueConflict(db.message().to_owned()),
                SERIALIZATION_FAILURE | DEADLOCK_DETECTED => DbError::TransactionConflict,
                _ => DbError::Other(db.message().to_owned()),
            }
        }
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            DbError::Transient(err.to_string())
        }
        other => DbError::Other(other.to_string()),
    }
}

impl DbError {
    /// Whether a bounded retry is warranted.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::TransactionConflict | Self::Transient(_))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::NotFound(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn pool_timeouts_are_transient() {
        let err: DbError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, DbError::Transient(_)));
        assert!(err.is_retryable());
    }
}

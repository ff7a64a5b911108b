use lectern_model::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LecternError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Token expired")]
    TokenExpired,

    /// Store-level abort (serialization conflict, deadlock, lock timeout).
    /// Nothing was applied; the caller may retry.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[cfg(feature = "database")]
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LecternError {
    pub fn not_found(kind: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{kind} {id}"))
    }

    /// Whether retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LecternError::TransactionFailed(_))
    }
}

impl From<ModelError> for LecternError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Validation(msg) => LecternError::Validation(msg),
            ModelError::Parse(msg) | ModelError::InvalidPage(msg) => {
                LecternError::InvalidArgument(msg)
            }
        }
    }
}

#[cfg(feature = "database")]
impl From<sqlx::Error> for LecternError {
    fn from(err: sqlx::Error) -> Self {
        let classified = err.as_database_error().and_then(|db_err| {
            let code = db_err.code()?;
            match code.as_ref() {
                // unique_violation
                "23505" => Some(LecternError::Conflict(
                    db_err
                        .constraint()
                        .map(|name| format!("duplicate value violates {name}"))
                        .unwrap_or_else(|| db_err.message().to_string()),
                )),
                // serialization_failure, deadlock_detected, lock_not_available
                "40001" | "40P01" | "55P03" => Some(
                    LecternError::TransactionFailed(db_err.message().to_string()),
                ),
                _ => None,
            }
        });

        classified.unwrap_or(LecternError::Database(err))
    }
}

pub type Result<T> = std::result::Result<T, LecternError>;

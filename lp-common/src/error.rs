//! Common error types for the language portal

use thiserror::Error;

/// Common result type for portal operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the portal crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found or soft-deleted
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Uniqueness or lifecycle constraint violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Seed corpus missing or malformed
    #[error("Seed error: {0}")]
    Seed(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Caller-facing classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    NotFound,
    Conflict,
    Internal,
}

impl Error {
    /// Classify into one of the four caller-facing kinds
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInput(_) => ErrorKind::BadRequest,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::Database(sqlx::Error::RowNotFound) => ErrorKind::NotFound,
            Error::Database(sqlx::Error::Database(db_err)) => {
                if db_err.is_unique_violation() {
                    ErrorKind::Conflict
                } else if db_err.is_foreign_key_violation() {
                    ErrorKind::NotFound
                } else {
                    ErrorKind::Internal
                }
            }
            _ => ErrorKind::Internal,
        }
    }

    /// SQLite reported that another connection holds the write lock
    ///
    /// Matches `SQLITE_BUSY` and `SQLITE_LOCKED` with their extended codes.
    pub fn is_lock_contention(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::Database(db_err)) => {
                let primary = db_err
                    .code()
                    .and_then(|code| code.parse::<i32>().ok())
                    .map(|code| code & 0xff);
                matches!(primary, Some(5) | Some(6))
                    || db_err.message().contains("database is locked")
            }
            _ => false,
        }
    }

    /// Message safe to show to API clients
    ///
    /// Storage errors never leak driver text; they collapse to a short
    /// description of their kind.
    pub fn public_message(&self) -> String {
        match self {
            Error::InvalidInput(msg) | Error::NotFound(msg) | Error::Conflict(msg) => msg.clone(),
            _ => match self.kind() {
                ErrorKind::BadRequest => "Invalid request".to_string(),
                ErrorKind::NotFound => "Referenced resource not found".to_string(),
                ErrorKind::Conflict => "Resource already exists".to_string(),
                ErrorKind::Internal => "Internal server error".to_string(),
            },
        }
    }
}

/// Map a constraint failure on insert/update to the caller-facing error
///
/// Unique violations become [`Error::Conflict`] with `conflict_msg`; foreign
/// key violations become [`Error::NotFound`] with `missing_msg`.
pub(crate) fn classify_write(err: sqlx::Error, conflict_msg: &str, missing_msg: &str) -> Error {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return Error::Conflict(conflict_msg.to_string());
        }
        if db_err.is_foreign_key_violation() {
            return Error::NotFound(missing_msg.to_string());
        }
    }
    Error::Database(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_for_domain_variants() {
        assert_eq!(Error::InvalidInput("x".into()).kind(), ErrorKind::BadRequest);
        assert_eq!(Error::NotFound("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(Error::Conflict("x".into()).kind(), ErrorKind::Conflict);
        assert_eq!(Error::Seed("x".into()).kind(), ErrorKind::Internal);
        assert_eq!(Error::Config("x".into()).kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_row_not_found_is_not_found() {
        assert_eq!(Error::Database(sqlx::Error::RowNotFound).kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_domain_errors_are_not_lock_contention() {
        assert!(!Error::Internal("database is locked".into()).is_lock_contention());
        assert!(!Error::Database(sqlx::Error::RowNotFound).is_lock_contention());
    }

    #[test]
    fn test_public_message_hides_storage_details() {
        let err = Error::Database(sqlx::Error::PoolTimedOut);
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.public_message(), "Internal server error");

        let err = Error::NotFound("Word 7 not found".into());
        assert_eq!(err.public_message(), "Word 7 not found");
    }
}

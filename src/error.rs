use thiserror::Error;

/// Application-wide error types.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Replace server-side failures with a static, client-safe message.
    ///
    /// Client errors (not found, bad request, auth, ...) pass through unchanged.
    /// Database, storage and internal failures are logged and collapsed into
    /// `Internal(public_message)` so that driver details never reach the client.
    pub fn or_internal(self, public_message: &str) -> Self {
        match self {
            AppError::Database(_) | AppError::Storage(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "{public_message}");
                AppError::Internal(public_message.to_string())
            }
            other => other,
        }
    }
}

/// Server error code for a unique index violation.
const DUPLICATE_KEY: i32 = 11000;

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};

    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        if is_duplicate_key(&err) {
            tracing::warn!(error = %err, "Unique index violation");
            return AppError::Conflict("A record with the same key already exists".into());
        }
        AppError::Database(err.to_string())
    }
}

impl From<bson::ser::Error> for AppError {
    fn from(err: bson::ser::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

/// Helper conversion from anyhow::Error
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_internal_hides_database_details() {
        let err = AppError::Database("connection refused on 10.0.0.3".into())
            .or_internal("Failed to fetch companies");
        match err {
            AppError::Internal(msg) => assert_eq!(msg, "Failed to fetch companies"),
            other => panic!("Expected Internal error, got: {:?}", other),
        }
    }

    #[test]
    fn test_or_internal_keeps_not_found() {
        let err = AppError::NotFound("Company not found".into()).or_internal("Failed to fetch company");
        match err {
            AppError::NotFound(msg) => assert_eq!(msg, "Company not found"),
            other => panic!("Expected NotFound error, got: {:?}", other),
        }
    }
}

//! Crate-level error type

use thiserror::Error;

use crate::repository::RepositoryError;

/// Result type alias using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors outside individual repository operations
///
/// Large error variants are boxed to reduce stack size
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Repository operation failed
    #[error("{0}")]
    Repository(#[from] RepositoryError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::RepositoryOperation;

    #[test]
    fn test_repository_error_passes_through() {
        let error: Error = RepositoryError::invalid_argument(
            RepositoryOperation::FindCount,
            "example is required",
        )
        .into();
        assert_eq!(
            error.to_string(),
            "Repository invalid_argument error during find_count: example is required"
        );
    }

    #[test]
    fn test_figment_error_is_boxed() {
        let error: Error = figment::Error::from("bad value".to_string()).into();
        assert!(matches!(error, Error::Config(_)));
        assert!(error.to_string().starts_with("Configuration error"));
    }
}

//! Repository error types
//!
//! Every fatal condition raised by a repository or the example matcher is a
//! [`RepositoryError`] carrying the operation, a category and, where known,
//! the entity involved. Non-fatal anomalies (lookup misses, empty count
//! projections, unresolvable deletes) are logged instead and never show up
//! here.
//!
//! # Example
//!
//! ```rust
//! use persistence_core::repository::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
//!
//! let error = RepositoryError::not_found("Customer");
//! assert!(matches!(error.kind, RepositoryErrorKind::NotFound));
//! assert_eq!(error.operation, RepositoryOperation::FindUnique);
//! ```

use std::fmt;

use crate::metadata::AccessorError;

/// Operation being performed when the repository error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOperation {
    /// Identifier lookup from an example
    Get,
    /// Reloading a tracked entity
    Refresh,
    /// Finding entities by example or named query
    Find,
    /// Counting entities by example or named query
    FindCount,
    /// Single-result retrieval with uniqueness check
    FindUnique,
    /// Inserting or deferring an update
    Save,
    /// Reattaching a detached entity
    Merge,
    /// Removing an entity
    Delete,
    /// Building a predicate from an example
    Match,
}

impl fmt::Display for RepositoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "get"),
            Self::Refresh => write!(f, "refresh"),
            Self::Find => write!(f, "find"),
            Self::FindCount => write!(f, "find_count"),
            Self::FindUnique => write!(f, "find_unique"),
            Self::Save => write!(f, "save"),
            Self::Merge => write!(f, "merge"),
            Self::Delete => write!(f, "delete"),
            Self::Match => write!(f, "match"),
        }
    }
}

/// Category of repository error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryErrorKind {
    /// A required argument was missing or malformed
    InvalidArgument,
    /// A unique result was required but nothing matched
    NotFound,
    /// A unique result was required but more than one matched
    NonUniqueResult,
    /// An attribute could not be read through the metadata table
    AccessorFailure,
    /// The execution engine reported a failure
    EngineFailure,
}

impl fmt::Display for RepositoryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "invalid_argument"),
            Self::NotFound => write!(f, "not_found"),
            Self::NonUniqueResult => write!(f, "non_unique_result"),
            Self::AccessorFailure => write!(f, "accessor_failure"),
            Self::EngineFailure => write!(f, "engine_failure"),
        }
    }
}

/// Structured repository error with operation context
///
/// # Example
///
/// ```rust
/// use persistence_core::repository::{RepositoryError, RepositoryOperation};
///
/// let error = RepositoryError::invalid_argument(RepositoryOperation::FindCount, "example is required");
/// assert_eq!(
///     error.to_string(),
///     "Repository invalid_argument error during find_count: example is required"
/// );
/// assert!(error.is_contract_violation());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryError {
    /// The operation being performed when the error occurred
    pub operation: RepositoryOperation,
    /// The category of error
    pub kind: RepositoryErrorKind,
    /// Human-readable error message
    pub message: String,
    /// Name of the entity type involved (e.g. "Customer")
    pub entity_type: Option<String>,
    /// Identifier of the entity involved
    pub entity_id: Option<String>,
}

impl RepositoryError {
    pub fn new(
        operation: RepositoryOperation,
        kind: RepositoryErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_type: None,
            entity_id: None,
        }
    }

    pub fn invalid_argument(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::InvalidArgument, message)
    }

    /// No entity matched where exactly one was required
    pub fn not_found(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: Some(entity_type.into()),
            ..Self::new(
                RepositoryOperation::FindUnique,
                RepositoryErrorKind::NotFound,
                "No entity matched the search",
            )
        }
    }

    /// More than one entity matched where at most one was allowed
    pub fn non_unique_result(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: Some(entity_type.into()),
            ..Self::new(
                RepositoryOperation::FindUnique,
                RepositoryErrorKind::NonUniqueResult,
                "More than one entity matched the search",
            )
        }
    }

    /// An attribute of `entity_type` could not be read
    pub fn accessor_failure(entity_type: impl Into<String>, source: &AccessorError) -> Self {
        Self {
            entity_type: Some(entity_type.into()),
            ..Self::new(
                RepositoryOperation::Match,
                RepositoryErrorKind::AccessorFailure,
                source.to_string(),
            )
        }
    }

    /// Failure reported by the execution engine
    pub fn engine_failure(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::EngineFailure, message)
    }

    /// Add entity context to an existing error
    #[must_use]
    pub fn with_entity(
        mut self,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Set the operation that caused the error
    #[must_use]
    pub fn with_operation(mut self, operation: RepositoryOperation) -> Self {
        self.operation = operation;
        self
    }

    /// Whether the error points at a caller or metadata bug rather than at
    /// the state of the data
    #[must_use]
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self.kind,
            RepositoryErrorKind::InvalidArgument | RepositoryErrorKind::AccessorFailure
        )
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Repository {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        match (&self.entity_type, &self.entity_id) {
            (Some(entity_type), Some(entity_id)) => write!(f, " [{entity_type}: {entity_id}]"),
            (Some(entity_type), None) => write!(f, " [{entity_type}]"),
            _ => Ok(()),
        }
    }
}

impl std::error::Error for RepositoryError {}

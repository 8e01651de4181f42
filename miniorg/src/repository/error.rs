//! Repository error types
//!
//! Structured errors for storage operations: what was being done, what went
//! wrong and, when known, which entity was involved.
//!
//! # Example
//!
//! ```rust
//! use miniorg::repository::{RepositoryError, RepositoryErrorKind};
//!
//! let error = RepositoryError::not_found("Customer", 42);
//! assert!(matches!(error.kind, RepositoryErrorKind::NotFound));
//! assert_eq!(error.to_string(), "Repository not_found error during find_by_id: Entity not found [Customer: 42]");
//! ```

use std::fmt;

/// Operation being performed when the repository error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOperation {
    /// Finding a single entity by ID
    FindById,
    /// Finding entities, optionally filtered
    FindAll,
    /// Checking if one or more entities exist
    Exists,
    /// Creating an entity (and its edges)
    Create,
    /// Updating an entity or re-pointing a relation
    Update,
    /// Deleting an entity or an edge
    Delete,
    /// Beginning or committing a transaction
    Transaction,
}

impl fmt::Display for RepositoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FindById => write!(f, "find_by_id"),
            Self::FindAll => write!(f, "find_all"),
            Self::Exists => write!(f, "exists"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
            Self::Transaction => write!(f, "transaction"),
        }
    }
}

/// Category of repository error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryErrorKind {
    /// No row matched
    NotFound,
    /// A write matched no rows
    NoRowsAffected,
    /// Foreign key, unique or check constraint failed
    ConstraintViolation,
    /// Could not get a connection
    ConnectionFailed,
    /// Any other database failure
    DatabaseError,
}

impl fmt::Display for RepositoryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::NoRowsAffected => write!(f, "no_rows_affected"),
            Self::ConstraintViolation => write!(f, "constraint_violation"),
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::DatabaseError => write!(f, "database_error"),
        }
    }
}

/// Structured repository error with operation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryError {
    /// The operation being performed when the error occurred
    pub operation: RepositoryOperation,
    /// The category of error
    pub kind: RepositoryErrorKind,
    /// Human-readable error message (internal, never sent to clients)
    pub message: String,
    /// The type of entity involved (e.g. "Department")
    pub entity_type: Option<String>,
    /// The ID of the entity involved
    pub entity_id: Option<String>,
}

impl RepositoryError {
    pub fn new(operation: RepositoryOperation, kind: RepositoryErrorKind, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_type: None,
            entity_id: None,
        }
    }

    /// A lookup by id matched no row
    pub fn not_found(entity_type: impl Into<String>, entity_id: impl fmt::Display) -> Self {
        Self::new(RepositoryOperation::FindById, RepositoryErrorKind::NotFound, "Entity not found")
            .with_entity(entity_type, entity_id)
    }

    /// A write that should have touched a row touched none
    pub fn no_rows_affected(
        operation: RepositoryOperation,
        entity_type: impl Into<String>,
        entity_id: impl fmt::Display,
    ) -> Self {
        Self::new(operation, RepositoryErrorKind::NoRowsAffected, "No rows affected")
            .with_entity(entity_type, entity_id)
    }

    /// Classify an sqlx error raised during `operation`
    pub fn from_sqlx(operation: RepositoryOperation, err: sqlx::Error) -> Self {
        use sqlx::Error as E;

        let kind = match &err {
            E::RowNotFound => RepositoryErrorKind::NotFound,
            E::PoolTimedOut | E::PoolClosed | E::Io(_) => RepositoryErrorKind::ConnectionFailed,
            E::Database(db_err)
                if db_err.is_foreign_key_violation()
                    || db_err.is_unique_violation()
                    || db_err.is_check_violation() =>
            {
                RepositoryErrorKind::ConstraintViolation
            }
            _ => RepositoryErrorKind::DatabaseError,
        };

        Self::new(operation, kind, err.to_string())
    }

    /// Add entity context to an existing error
    #[must_use]
    pub fn with_entity(mut self, entity_type: impl Into<String>, entity_id: impl fmt::Display) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.to_string());
        self
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Repository {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let (Some(entity_type), Some(entity_id)) = (&self.entity_type, &self.entity_id) {
            write!(f, " [{}: {}]", entity_type, entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for RepositoryError {}

/// Attach the repository operation to an sqlx result
pub(crate) trait SqlxResultExt<T> {
    fn during(self, operation: RepositoryOperation) -> Result<T, RepositoryError>;
}

impl<T> SqlxResultExt<T> for Result<T, sqlx::Error> {
    fn during(self, operation: RepositoryOperation) -> Result<T, RepositoryError> {
        self.map_err(|e| RepositoryError::from_sqlx(operation, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_display() {
        assert_eq!(RepositoryOperation::FindById.to_string(), "find_by_id");
        assert_eq!(RepositoryOperation::FindAll.to_string(), "find_all");
        assert_eq!(RepositoryOperation::Transaction.to_string(), "transaction");
    }

    #[test]
    fn test_not_found_display() {
        let err = RepositoryError::not_found("Department", 9);
        assert_eq!(err.entity_type.as_deref(), Some("Department"));
        assert_eq!(err.entity_id.as_deref(), Some("9"));
        assert_eq!(
            err.to_string(),
            "Repository not_found error during find_by_id: Entity not found [Department: 9]"
        );
    }

    #[test]
    fn test_no_rows_affected() {
        let err = RepositoryError::no_rows_affected(RepositoryOperation::Delete, "Manager", 3);
        assert_eq!(err.kind, RepositoryErrorKind::NoRowsAffected);
        assert_eq!(err.operation, RepositoryOperation::Delete);
    }

    #[test]
    fn test_from_sqlx_classifies() {
        let err = RepositoryError::from_sqlx(RepositoryOperation::FindById, sqlx::Error::RowNotFound);
        assert_eq!(err.kind, RepositoryErrorKind::NotFound);

        let err = RepositoryError::from_sqlx(RepositoryOperation::Create, sqlx::Error::PoolTimedOut);
        assert_eq!(err.kind, RepositoryErrorKind::ConnectionFailed);

        let err: Result<(), _> = Err(sqlx::Error::ColumnNotFound("rating".into()));
        let err = err.during(RepositoryOperation::FindAll).unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::DatabaseError);
        assert_eq!(err.operation, RepositoryOperation::FindAll);
    }
}

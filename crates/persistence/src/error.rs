// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::result::DatabaseErrorKind;
use incident_registry_domain::EntityKind;

/// Errors that can occur during persistence operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// A database error occurred.
    DatabaseError(String),
    /// Database connection failed.
    DatabaseConnectionFailed(String),
    /// Database migration failed.
    MigrationFailed(String),
    /// Query execution failed.
    QueryFailed(String),
    /// Initialization error.
    InitializationError(String),
    /// Foreign key enforcement is not enabled.
    ForeignKeyEnforcementNotEnabled,
    /// A record cannot be removed while other records reference it.
    Referenced {
        /// The kind of record being removed.
        entity: EntityKind,
        /// The record identifier.
        id: i64,
        /// The kind of the referencing records.
        referenced_by: EntityKind,
        /// How many references exist.
        count: usize,
    },
    /// A foreign key constraint rejected the write.
    ForeignKeyViolation(String),
    /// A unique constraint rejected the write.
    UniqueViolation(String),
    /// The requested record was not found.
    NotFound {
        /// The kind of record.
        entity: EntityKind,
        /// The identifier that failed to resolve.
        id: i64,
    },
    /// Stored rows could not be turned back into domain values.
    InvalidStoredData(String),
    /// A general error occurred.
    Other(String),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::DatabaseConnectionFailed(msg) => {
                write!(f, "Database connection failed: {msg}")
            }
            Self::MigrationFailed(msg) => write!(f, "Migration failed: {msg}"),
            Self::QueryFailed(msg) => write!(f, "Query failed: {msg}"),
            Self::InitializationError(msg) => write!(f, "Initialization error: {msg}"),
            Self::ForeignKeyEnforcementNotEnabled => {
                write!(f, "Foreign key enforcement is not enabled")
            }
            Self::Referenced {
                entity,
                id,
                referenced_by,
                count,
            } => write!(
                f,
                "{entity} {id} cannot be deleted: referenced by {count} {referenced_by} record(s)"
            ),
            Self::ForeignKeyViolation(msg) => write!(f, "Foreign key violation: {msg}"),
            Self::UniqueViolation(msg) => write!(f, "Unique constraint violation: {msg}"),
            Self::NotFound { entity, id } => write!(f, "{entity} {id} not found"),
            Self::InvalidStoredData(msg) => write!(f, "Invalid stored data: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<diesel::result::Error> for PersistenceError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                Self::ForeignKeyViolation(info.message().to_string())
            }
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                Self::UniqueViolation(info.message().to_string())
            }
            _ => Self::DatabaseError(err.to_string()),
        }
    }
}

impl From<diesel::ConnectionError> for PersistenceError {
    fn from(err: diesel::ConnectionError) -> Self {
        Self::DatabaseConnectionFailed(err.to_string())
    }
}

/// Maps a zero row count to `NotFound`.
pub(crate) const fn expect_rows(
    rows: usize,
    entity: EntityKind,
    id: i64,
) -> Result<(), PersistenceError> {
    if rows == 0 {
        Err(PersistenceError::NotFound { entity, id })
    } else {
        Ok(())
    }
}

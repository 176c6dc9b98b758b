// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use crate::password_policy::PasswordPolicyError;
use incident_registry::CoreError;
use incident_registry_domain::DomainError;
use incident_registry_persistence::PersistenceError;
use serde::{Deserialize, Serialize};
use tracing::error;

/// Authentication and authorization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No session could be established.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// The session's role does not permit the action.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
        }
    }
}

impl std::error::Error for AuthError {}

/// Category of a failed operation, as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    MissingField,
    InvalidField,
    InconsistentPath,
    InvalidLineItem,
    DuplicateName,
    DuplicateItem,
    ReferentialIntegrity,
    NotFound,
    Unauthorized,
    PasswordPolicy,
    Unexpected,
}

/// The structured failure result returned for every rejected operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionFailure {
    /// Always `false`.
    pub success: bool,
    /// The failure category.
    pub kind: FailureKind,
    /// A human-readable message.
    pub error: String,
    /// The form field the failure is attributed to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// API-level errors.
///
/// These are distinct from domain/core errors and represent the API contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// A required field is absent or blank.
    MissingField {
        /// The form field name.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// A field holds an unusable value.
    InvalidField {
        /// The form field name.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// A selected node does not belong to the selected parent.
    InconsistentPath {
        /// The form field of the first inconsistent level.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// A line entry failed validation.
    InvalidLineItem {
        /// The offending field, as `items[index].part`.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// A name is already taken.
    DuplicateName {
        /// The form field name.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// An item with the same name already exists on the same path.
    DuplicateItem {
        /// A human-readable description of the error.
        message: String,
    },
    /// A delete was refused because other records still reference the target.
    ReferentialIntegrity {
        /// A human-readable description of the error.
        message: String,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// No session could be established.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// The session's role does not permit the action.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
    /// A new password does not satisfy the policy.
    PasswordPolicyViolation {
        /// A human-readable description of the policy violation.
        message: String,
    },
    /// Anything else, typically from the database.
    Unexpected {
        /// A description of the error.
        message: String,
    },
}

impl ApiError {
    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::MissingField { .. } => FailureKind::MissingField,
            Self::InvalidField { .. } => FailureKind::InvalidField,
            Self::InconsistentPath { .. } => FailureKind::InconsistentPath,
            Self::InvalidLineItem { .. } => FailureKind::InvalidLineItem,
            Self::DuplicateName { .. } => FailureKind::DuplicateName,
            Self::DuplicateItem { .. } => FailureKind::DuplicateItem,
            Self::ReferentialIntegrity { .. } => FailureKind::ReferentialIntegrity,
            Self::ResourceNotFound { .. } => FailureKind::NotFound,
            Self::AuthenticationFailed { .. } | Self::Unauthorized { .. } => {
                FailureKind::Unauthorized
            }
            Self::PasswordPolicyViolation { .. } => FailureKind::PasswordPolicy,
            Self::Unexpected { .. } => FailureKind::Unexpected,
        }
    }

    /// Returns the form field the error is attributed to, if any.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingField { field, .. }
            | Self::InvalidField { field, .. }
            | Self::InconsistentPath { field, .. }
            | Self::InvalidLineItem { field, .. }
            | Self::DuplicateName { field, .. } => Some(field),
            Self::DuplicateItem { .. } => Some("productName"),
            Self::PasswordPolicyViolation { .. } => Some("password"),
            Self::ReferentialIntegrity { .. }
            | Self::ResourceNotFound { .. }
            | Self::AuthenticationFailed { .. }
            | Self::Unauthorized { .. }
            | Self::Unexpected { .. } => None,
        }
    }

    /// Builds the structured failure result.
    #[must_use]
    pub fn to_failure(&self) -> ActionFailure {
        let error: String = match self {
            Self::MissingField { message, .. }
            | Self::InvalidField { message, .. }
            | Self::InconsistentPath { message, .. }
            | Self::InvalidLineItem { message, .. }
            | Self::DuplicateName { message, .. }
            | Self::DuplicateItem { message }
            | Self::ReferentialIntegrity { message }
            | Self::ResourceNotFound { message, .. }
            | Self::PasswordPolicyViolation { message }
            | Self::Unexpected { message } => message.clone(),
            Self::AuthenticationFailed { .. } | Self::Unauthorized { .. } => self.to_string(),
        };
        ActionFailure {
            success: false,
            kind: self.kind(),
            error,
            field: self.field().map(str::to_string),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField { field, message }
            | Self::InvalidField { field, message }
            | Self::InconsistentPath { field, message }
            | Self::InvalidLineItem { field, message }
            | Self::DuplicateName { field, message } => write!(f, "{field}: {message}"),
            Self::DuplicateItem { message } | Self::ReferentialIntegrity { message } => {
                write!(f, "{message}")
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => write!(f, "{resource_type} not found: {message}"),
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
            Self::PasswordPolicyViolation { message } => {
                write!(f, "Password policy violation: {message}")
            }
            Self::Unexpected { message } => write!(f, "Unexpected error: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AuthenticationFailed { reason } => Self::AuthenticationFailed { reason },
            AuthError::Unauthorized {
                action,
                required_role,
            } => Self::Unauthorized {
                action,
                required_role,
            },
        }
    }
}

impl From<PasswordPolicyError> for ApiError {
    fn from(err: PasswordPolicyError) -> Self {
        Self::PasswordPolicyViolation {
            message: err.to_string(),
        }
    }
}

/// Translates a domain error into an API error.
///
/// The message is the domain error's own; the field comes from
/// [`DomainError::field`].
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    let message: String = err.to_string();
    let field: String = err.field().unwrap_or_default();
    match err {
        DomainError::MissingField { .. } => ApiError::MissingField { field, message },
        DomainError::InvalidField { .. }
        | DomainError::InvalidLevel(_)
        | DomainError::InvalidRole(_) => ApiError::InvalidField { field, message },
        DomainError::InconsistentPath { .. } => ApiError::InconsistentPath { field, message },
        DomainError::InvalidLineItem { .. } => ApiError::InvalidLineItem { field, message },
        DomainError::DuplicateName { .. } => ApiError::DuplicateName { field, message },
        DomainError::DuplicateItem { .. } => ApiError::DuplicateItem { message },
        DomainError::ReferentialIntegrity { .. } => ApiError::ReferentialIntegrity { message },
        DomainError::NotFound { entity, .. } => ApiError::ResourceNotFound {
            resource_type: entity.to_string(),
            message,
        },
    }
}

/// Translates a core error into an API error.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
    }
}

/// Translates a persistence error into an API error.
///
/// Foreign key violations become `ReferentialIntegrity` and unique
/// violations become `DuplicateName`. Anything else is unexpected and
/// logged.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::Referenced { .. } => ApiError::ReferentialIntegrity {
            message: err.to_string(),
        },
        PersistenceError::ForeignKeyViolation(detail) => {
            error!(detail, "Foreign key violation reached the API boundary");
            ApiError::ReferentialIntegrity {
                message: String::from(
                    "The record references, or is referenced by, records that do not allow this change",
                ),
            }
        }
        PersistenceError::UniqueViolation(detail) => {
            error!(detail, "Unique violation reached the API boundary");
            ApiError::DuplicateName {
                field: String::from("name"),
                message: String::from("A record with this name already exists"),
            }
        }
        PersistenceError::NotFound { entity, .. } => ApiError::ResourceNotFound {
            resource_type: entity.to_string(),
            message: err.to_string(),
        },
        other => {
            error!(error = %other, "Unexpected persistence error");
            ApiError::Unexpected {
                message: other.to_string(),
            }
        }
    }
}

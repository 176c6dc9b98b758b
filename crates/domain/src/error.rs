// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::types::{EntityKind, Level};

/// Which part of an incident line entry failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineItemFault {
    /// The item is missing or does not exist.
    Item,
    /// The quantity is not a finite number greater than zero.
    Quantity,
    /// The unit measure is missing or not permitted for the item.
    UnitMeasure,
    /// The line entry identifier does not belong to the incident.
    Ownership,
}

impl LineItemFault {
    /// Form field name of the offending value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Item => "item",
            Self::Quantity => "quantityUsed",
            Self::UnitMeasure => "unitMeasure",
            Self::Ownership => "id",
        }
    }
}

impl std::fmt::Display for LineItemFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A required field is absent or blank.
    MissingField {
        /// The form field name.
        field: &'static str,
    },
    /// A field holds a value outside its allowed range.
    InvalidField {
        /// The form field name.
        field: &'static str,
        /// What is wrong with the value.
        reason: String,
    },
    /// The node at `level` does not belong to the selected parent.
    InconsistentPath {
        /// The first level whose value does not fit the path above it.
        level: Level,
    },
    /// A line entry failed validation.
    InvalidLineItem {
        /// Zero-based position of the line entry.
        index: usize,
        /// The offending part of the line entry.
        reason: LineItemFault,
    },
    /// A sibling with the same name already exists.
    DuplicateName {
        /// The kind of record.
        entity: EntityKind,
        /// The conflicting name.
        name: String,
    },
    /// An item with the same product name already exists on the same path.
    DuplicateItem {
        /// The conflicting product name.
        product_name: String,
    },
    /// A record cannot be removed while other records reference it.
    ReferentialIntegrity {
        /// The kind of record being removed.
        entity: EntityKind,
        /// The record identifier.
        id: i64,
        /// The kind of the referencing records.
        referenced_by: EntityKind,
        /// How many references exist.
        count: usize,
    },
    /// A referenced record does not exist.
    NotFound {
        /// The kind of record.
        entity: EntityKind,
        /// The identifier that failed to resolve.
        id: i64,
    },
    /// A level name could not be parsed.
    InvalidLevel(String),
    /// A role name could not be parsed.
    InvalidRole(String),
}

impl DomainError {
    /// Returns the form field the error should be attributed to, if any.
    #[must_use]
    pub fn field(&self) -> Option<String> {
        match self {
            Self::MissingField { field } | Self::InvalidField { field, .. } => {
                Some((*field).to_string())
            }
            Self::InconsistentPath { level } => Some(level.field_name().to_string()),
            Self::InvalidLineItem { index, reason } => {
                Some(format!("items[{index}].{}", reason.as_str()))
            }
            Self::DuplicateName { .. } => Some(String::from("name")),
            Self::InvalidLevel(_) => Some(String::from("level")),
            Self::DuplicateItem { .. } => Some(String::from("productName")),
            Self::InvalidRole(_) => Some(String::from("role")),
            Self::ReferentialIntegrity { .. } | Self::NotFound { .. } => None,
        }
    }
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField { field } => write!(f, "Field '{field}' is required"),
            Self::InvalidField { field, reason } => {
                write!(f, "Field '{field}' is invalid: {reason}")
            }
            Self::InconsistentPath { level } => {
                write!(f, "Selected {level} does not belong to the selected parent")
            }
            Self::InvalidLineItem { index, reason } => match reason {
                LineItemFault::Item => write!(f, "Line item {index}: item is missing or unknown"),
                LineItemFault::Quantity => {
                    write!(f, "Line item {index}: quantity must be greater than 0")
                }
                LineItemFault::UnitMeasure => write!(
                    f,
                    "Line item {index}: unit measure is missing or not permitted for the item"
                ),
                LineItemFault::Ownership => write!(
                    f,
                    "Line item {index}: entry does not belong to this incident"
                ),
            },
            Self::DuplicateName { entity, name } => {
                write!(f, "A {entity} named '{name}' already exists")
            }
            Self::DuplicateItem { product_name } => write!(
                f,
                "An item named '{product_name}' already exists on the same taxonomy path"
            ),
            Self::ReferentialIntegrity {
                entity,
                id,
                referenced_by,
                count,
            } => write!(
                f,
                "Cannot delete {entity} {id}: referenced by {count} {referenced_by} record(s)"
            ),
            Self::NotFound { entity, id } => write!(f, "{entity} {id} not found"),
            Self::InvalidLevel(level) => write!(f, "Invalid level: {level}"),
            Self::InvalidRole(role) => write!(f, "Invalid role: {role}"),
        }
    }
}

impl std::error::Error for DomainError {}

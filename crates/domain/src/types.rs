// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A level of one of the two hierarchies the registry classifies by.
///
/// The taxonomy chain is Variable → Category → Subcategory →
/// `SecondSubcategory`; the geography chain is Province → Municipality.
/// Declaration order is root-first within each chain.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// Root of the taxonomy.
    Variable,
    /// Child of a variable.
    Category,
    /// Child of a category.
    Subcategory,
    /// Optional leaf below a subcategory.
    SecondSubcategory,
    /// Root of the geography.
    Province,
    /// Child of a province.
    Municipality,
}

impl Level {
    /// Every level, root-first per chain.
    pub const ALL: [Self; 6] = [
        Self::Variable,
        Self::Category,
        Self::Subcategory,
        Self::SecondSubcategory,
        Self::Province,
        Self::Municipality,
    ];

    /// Returns the level directly above this one, if any.
    #[must_use]
    pub const fn parent(self) -> Option<Self> {
        match self {
            Self::Variable | Self::Province => None,
            Self::Category => Some(Self::Variable),
            Self::Subcategory => Some(Self::Category),
            Self::SecondSubcategory => Some(Self::Subcategory),
            Self::Municipality => Some(Self::Province),
        }
    }

    /// Returns the level directly below this one, if any.
    #[must_use]
    pub const fn child(self) -> Option<Self> {
        match self {
            Self::Variable => Some(Self::Category),
            Self::Category => Some(Self::Subcategory),
            Self::Subcategory => Some(Self::SecondSubcategory),
            Self::Province => Some(Self::Municipality),
            Self::SecondSubcategory | Self::Municipality => None,
        }
    }

    /// Returns whether nodes at this level have no parent.
    #[must_use]
    pub const fn is_root(self) -> bool {
        self.parent().is_none()
    }

    /// Snake-case identifier used in URLs and storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Variable => "variable",
            Self::Category => "category",
            Self::Subcategory => "subcategory",
            Self::SecondSubcategory => "second_subcategory",
            Self::Province => "province",
            Self::Municipality => "municipality",
        }
    }

    /// Form field name used when attributing an error to an input.
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::Variable => "variable",
            Self::Category => "category",
            Self::Subcategory => "subcategory",
            Self::SecondSubcategory => "secondSubcategory",
            Self::Province => "province",
            Self::Municipality => "municipality",
        }
    }
}

impl FromStr for Level {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "variable" | "variables" => Ok(Self::Variable),
            "category" | "categories" => Ok(Self::Category),
            "subcategory" | "subcategories" => Ok(Self::Subcategory),
            "second_subcategory" | "second_subcategories" | "secondSubcategory" => {
                Ok(Self::SecondSubcategory)
            }
            "province" | "provinces" => Ok(Self::Province),
            "municipality" | "municipalities" => Ok(Self::Municipality),
            _ => Err(DomainError::InvalidLevel(s.to_string())),
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.field_name())
    }
}


/// The kind of record an error or reference count talks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A taxonomy or geography node.
    Node(Level),
    /// A unit measure.
    UnitMeasure,
    /// A catalog item.
    Item,
    /// An incident.
    Incident,
    /// A line entry owned by an incident.
    IncidentItem,
    /// A user account.
    User,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Node(level) => write!(f, "{level}"),
            Self::UnitMeasure => write!(f, "unitMeasure"),
            Self::Item => write!(f, "item"),
            Self::Incident => write!(f, "incident"),
            Self::IncidentItem => write!(f, "incidentItem"),
            Self::User => write!(f, "user"),
        }
    }
}

/// A node of the taxonomy or geography tree.
///
/// Root nodes (variables, provinces) carry no parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyNode {
    /// The identifier assigned by the database.
    pub id: i64,
    /// The display name.
    pub name: String,
    /// The parent node identifier, one level up.
    pub parent_id: Option<i64>,
}

impl TaxonomyNode {
    /// Creates a new node.
    #[must_use]
    pub const fn new(id: i64, name: String, parent_id: Option<i64>) -> Self {
        Self {
            id,
            name,
            parent_id,
        }
    }
}

/// A level-qualified node reference, as returned by lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRef {
    /// The level of the node.
    pub level: Level,
    /// The node identifier.
    pub id: i64,
    /// The node name.
    pub name: String,
}

/// A unit in which item quantities are measured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitMeasure {
    /// The identifier assigned by the database.
    pub id: i64,
    /// The globally unique name.
    pub name: String,
}

/// The full taxonomy classification of an item or incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaxonomyPath {
    /// The variable.
    pub variable_id: i64,
    /// The category, which must belong to the variable.
    pub category_id: i64,
    /// The optional subcategory, which must belong to the category.
    pub subcategory_id: Option<i64>,
    /// The optional second subcategory, which must belong to the subcategory.
    pub second_subcategory_id: Option<i64>,
}

impl TaxonomyPath {
    /// Returns every `(level, id)` pair set on this path, root-first.
    #[must_use]
    pub fn nodes(&self) -> Vec<(Level, i64)> {
        let mut nodes: Vec<(Level, i64)> = vec![
            (Level::Variable, self.variable_id),
            (Level::Category, self.category_id),
        ];
        if let Some(id) = self.subcategory_id {
            nodes.push((Level::Subcategory, id));
        }
        if let Some(id) = self.second_subcategory_id {
            nodes.push((Level::SecondSubcategory, id));
        }
        nodes
    }

    /// Returns whether this path passes through the given node.
    #[must_use]
    pub fn contains(&self, level: Level, id: i64) -> bool {
        self.nodes().contains(&(level, id))
    }
}

/// The geography placement of an incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeographyPath {
    /// The province.
    pub province_id: i64,
    /// The municipality, which must belong to the province.
    pub municipality_id: i64,
}

/// Roles a user may hold.
///
/// Variants are ordered by privilege: `Simple < Advanced < Admin`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Records and edits incidents.
    Simple,
    /// Additionally curates items and unit measures.
    Advanced,
    /// Full administrative authority.
    Admin,
}

impl UserRole {
    /// Stored representation of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "SIMPLE",
            Self::Advanced => "ADVANCED",
            Self::Admin => "ADMIN",
        }
    }

    /// Returns whether this role grants at least the privileges of `required`.
    #[must_use]
    pub fn includes(self, required: Self) -> bool {
        self >= required
    }
}

impl FromStr for UserRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SIMPLE" => Ok(Self::Simple),
            "ADVANCED" => Ok(Self::Advanced),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(DomainError::InvalidRole(s.to_string())),
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trims a user-supplied name.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim().to_string()
}

/// Comparison key for names: trimmed and case-insensitive.
#[must_use]
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

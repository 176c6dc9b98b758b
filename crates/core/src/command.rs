// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use incident_registry_domain::{IncidentDraft, IncidentRecord, ItemDraft, Level};

/// A command represents user or system intent as data only.
///
/// Commands carry unvalidated input. [`crate::apply`] validates them
/// against a [`crate::RegistryContext`] and turns them into a
/// [`crate::Mutation`] for the persistence layer to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Create a taxonomy or geography node.
    CreateNode {
        /// The level of the new node.
        level: Level,
        /// The node name.
        name: String,
        /// The parent node, one level up. `None` for root levels.
        parent_id: Option<i64>,
    },
    /// Rename a node, keeping its parent.
    RenameNode {
        /// The level of the node.
        level: Level,
        /// The node identifier.
        id: i64,
        /// The new name.
        name: String,
    },
    /// Delete a node that nothing references.
    DeleteNode {
        /// The level of the node.
        level: Level,
        /// The node identifier.
        id: i64,
    },
    /// Create a unit measure.
    CreateUnitMeasure {
        /// The globally unique name.
        name: String,
    },
    /// Rename a unit measure.
    RenameUnitMeasure {
        /// The unit measure identifier.
        id: i64,
        /// The new name.
        name: String,
    },
    /// Delete a unit measure that nothing references.
    DeleteUnitMeasure {
        /// The unit measure identifier.
        id: i64,
    },
    /// Create a catalog item.
    CreateItem {
        /// The submitted values.
        draft: ItemDraft,
    },
    /// Replace a catalog item's values.
    UpdateItem {
        /// The item identifier.
        item_id: i64,
        /// The submitted values.
        draft: ItemDraft,
    },
    /// Delete an item no incident uses.
    DeleteItem {
        /// The item identifier.
        item_id: i64,
    },
    /// Record a new incident.
    CreateIncident {
        /// The submitted form values.
        draft: IncidentDraft,
    },
    /// Edit an incident and reconcile its line entries.
    UpdateIncident {
        /// The incident as currently stored.
        existing: IncidentRecord,
        /// The submitted form values.
        draft: IncidentDraft,
    },
    /// Delete an incident and its line entries.
    DeleteIncident {
        /// The incident identifier.
        incident_id: i64,
    },
}

impl Command {
    /// Short name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CreateNode { .. } => "CreateNode",
            Self::RenameNode { .. } => "RenameNode",
            Self::DeleteNode { .. } => "DeleteNode",
            Self::CreateUnitMeasure { .. } => "CreateUnitMeasure",
            Self::RenameUnitMeasure { .. } => "RenameUnitMeasure",
            Self::DeleteUnitMeasure { .. } => "DeleteUnitMeasure",
            Self::CreateItem { .. } => "CreateItem",
            Self::UpdateItem { .. } => "UpdateItem",
            Self::DeleteItem { .. } => "DeleteItem",
            Self::CreateIncident { .. } => "CreateIncident",
            Self::UpdateIncident { .. } => "UpdateIncident",
            Self::DeleteIncident { .. } => "DeleteIncident",
        }
    }
}

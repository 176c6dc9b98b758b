// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::diff::LineItemDiff;
use incident_registry_domain::{Incident, Item, Level, UnitMeasureWarning};

/// A validated write, ready for the persistence layer.
///
/// Every variant has passed domain validation. Persistence executes each
/// mutation in a single transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Insert a node.
    CreateNode {
        /// The level of the node.
        level: Level,
        /// The trimmed name.
        name: String,
        /// The parent, `None` for root levels.
        parent_id: Option<i64>,
    },
    /// Rename a node.
    RenameNode {
        /// The level of the node.
        level: Level,
        /// The node identifier.
        id: i64,
        /// The trimmed name.
        name: String,
    },
    /// Delete a node after checking incident references.
    DeleteNode {
        /// The level of the node.
        level: Level,
        /// The node identifier.
        id: i64,
    },
    /// Insert a unit measure.
    CreateUnitMeasure {
        /// The trimmed name.
        name: String,
    },
    /// Rename a unit measure.
    RenameUnitMeasure {
        /// The unit measure identifier.
        id: i64,
        /// The trimmed name.
        name: String,
    },
    /// Delete a unit measure.
    DeleteUnitMeasure {
        /// The unit measure identifier.
        id: i64,
    },
    /// Insert an item and its permitted unit measures.
    CreateItem {
        /// The validated item.
        item: Item,
    },
    /// Replace an item and its permitted unit measures.
    UpdateItem {
        /// The item identifier.
        item_id: i64,
        /// The validated item.
        item: Item,
    },
    /// Delete an item.
    DeleteItem {
        /// The item identifier.
        item_id: i64,
    },
    /// Insert an incident and its line entries.
    CreateIncident {
        /// The validated incident.
        incident: Incident,
    },
    /// Update an incident row and apply the line entry diff.
    UpdateIncident {
        /// The incident identifier.
        incident_id: i64,
        /// The validated incident.
        incident: Incident,
        /// Row operations for the line entries.
        diff: LineItemDiff,
    },
    /// Delete an incident and its line entries.
    DeleteIncident {
        /// The incident identifier.
        incident_id: i64,
    },
}

/// The result of applying a command.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyResult {
    /// The write to execute.
    pub mutation: Mutation,
    /// Non-fatal notices about the write.
    pub warnings: Vec<UnitMeasureWarning>,
}

impl ApplyResult {
    pub(crate) const fn new(mutation: Mutation) -> Self {
        Self {
            mutation,
            warnings: Vec::new(),
        }
    }
}

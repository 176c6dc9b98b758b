// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! State-changing operations.
//!
//! Every public function here either runs inside a transaction opened by
//! the caller or opens its own. Multi-row writes never leave partial state
//! behind.
//!
//! ## Module Organization
//!
//! - `taxonomy`: Node inserts, renames and reference-checked deletes
//! - `catalog`: Unit measures and items with their permitted units
//! - `incidents`: Incident rows and line entry diffs
//! - `users`: User accounts

pub mod catalog;
pub mod incidents;
pub mod sessions;
pub mod taxonomy;
pub mod users;

use incident_registry::Mutation;

/// Short name of a mutation for logging.
#[must_use]
pub const fn describe(mutation: &Mutation) -> &'static str {
    match mutation {
        Mutation::CreateNode { .. } => "create_node",
        Mutation::RenameNode { .. } => "rename_node",
        Mutation::DeleteNode { .. } => "delete_node",
        Mutation::CreateUnitMeasure { .. } => "create_unit_measure",
        Mutation::RenameUnitMeasure { .. } => "rename_unit_measure",
        Mutation::DeleteUnitMeasure { .. } => "delete_unit_measure",
        Mutation::CreateItem { .. } => "create_item",
        Mutation::UpdateItem { .. } => "update_item",
        Mutation::DeleteItem { .. } => "delete_item",
        Mutation::CreateIncident { .. } => "create_incident",
        Mutation::UpdateIncident { .. } => "update_incident",
        Mutation::DeleteIncident { .. } => "delete_incident",
    }
}

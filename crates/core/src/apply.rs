// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::command::Command;
use crate::context::RegistryContext;
use crate::diff::{LineItemDiff, compute_line_item_diff};
use crate::error::CoreError;
use crate::mutation::{ApplyResult, Mutation};
use incident_registry_domain::{
    DomainError, EntityKind, Incident, Item, Level, TaxonomyNode, UnitMeasureWarning,
    normalize_name, unit_measure_warnings, validate_incident, validate_item,
};
use tracing::{debug, warn};

/// Applies a command to the registry context, producing a validated mutation.
///
/// This function is pure: it reads the context and never writes. The
/// caller executes the returned mutation.
///
/// # Arguments
///
/// * `context` - The current reference data (immutable)
/// * `command` - The command to apply
///
/// # Returns
///
/// * `Ok(ApplyResult)` containing the mutation and any warnings
/// * `Err(CoreError)` if the command is invalid
///
/// # Errors
///
/// Returns an error if the command violates a domain rule.
pub fn apply(context: &RegistryContext, command: Command) -> Result<ApplyResult, CoreError> {
    debug!(command = command.name(), "Applying command");
    match command {
        Command::CreateNode {
            level,
            name,
            parent_id,
        } => {
            check_parent(context, level, parent_id)?;
            context
                .taxonomy
                .ensure_name_available(level, parent_id, &name, None)?;
            Ok(ApplyResult::new(Mutation::CreateNode {
                level,
                name: normalize_name(&name),
                parent_id,
            }))
        }
        Command::RenameNode { level, id, name } => {
            let node: &TaxonomyNode = context.taxonomy.require(level, id)?;
            context
                .taxonomy
                .ensure_name_available(level, node.parent_id, &name, Some(id))?;
            Ok(ApplyResult::new(Mutation::RenameNode {
                level,
                id,
                name: normalize_name(&name),
            }))
        }
        Command::DeleteNode { level, id } => {
            context.taxonomy.ensure_deletable(level, id)?;
            let items: usize = context.catalog.items_on_node(level, id);
            if items > 0 {
                return Err(DomainError::ReferentialIntegrity {
                    entity: EntityKind::Node(level),
                    id,
                    referenced_by: EntityKind::Item,
                    count: items,
                }
                .into());
            }
            Ok(ApplyResult::new(Mutation::DeleteNode { level, id }))
        }
        Command::CreateUnitMeasure { name } => {
            context.catalog.ensure_unit_name_available(&name, None)?;
            Ok(ApplyResult::new(Mutation::CreateUnitMeasure {
                name: normalize_name(&name),
            }))
        }
        Command::RenameUnitMeasure { id, name } => {
            require_unit_measure(context, id)?;
            context.catalog.ensure_unit_name_available(&name, Some(id))?;
            Ok(ApplyResult::new(Mutation::RenameUnitMeasure {
                id,
                name: normalize_name(&name),
            }))
        }
        Command::DeleteUnitMeasure { id } => {
            require_unit_measure(context, id)?;
            let items: usize = context.catalog.items_using_unit(id);
            if items > 0 {
                return Err(referenced(EntityKind::UnitMeasure, id, EntityKind::Item, items));
            }
            let lines: usize = context.line_items_for_unit(id);
            if lines > 0 {
                return Err(referenced(
                    EntityKind::UnitMeasure,
                    id,
                    EntityKind::IncidentItem,
                    lines,
                ));
            }
            Ok(ApplyResult::new(Mutation::DeleteUnitMeasure { id }))
        }
        Command::CreateItem { draft } => {
            let item: Item = validate_item(&context.taxonomy, &context.catalog, &draft, None)?;
            Ok(ApplyResult::new(Mutation::CreateItem { item }))
        }
        Command::UpdateItem { item_id, draft } => {
            let item: Item =
                validate_item(&context.taxonomy, &context.catalog, &draft, Some(item_id))?;
            let warnings: Vec<UnitMeasureWarning> = context
                .catalog
                .item(item_id)
                .map(|previous| unit_measure_warnings(previous, &item, &context.unit_usage))
                .unwrap_or_default();
            for warning in &warnings {
                warn!(
                    item_id = warning.item_id,
                    unit_measure_id = warning.unit_measure_id,
                    line_item_count = warning.line_item_count,
                    "Unit measure removed from item while still in use"
                );
            }
            Ok(ApplyResult {
                mutation: Mutation::UpdateItem { item_id, item },
                warnings,
            })
        }
        Command::DeleteItem { item_id } => {
            if context.catalog.item(item_id).is_none() {
                return Err(DomainError::NotFound {
                    entity: EntityKind::Item,
                    id: item_id,
                }
                .into());
            }
            let lines: usize = context.line_items_for_item(item_id);
            if lines > 0 {
                return Err(referenced(
                    EntityKind::Item,
                    item_id,
                    EntityKind::IncidentItem,
                    lines,
                ));
            }
            Ok(ApplyResult::new(Mutation::DeleteItem { item_id }))
        }
        Command::CreateIncident { draft } => {
            let incident: Incident =
                validate_incident(&context.taxonomy, &context.catalog, &draft)?;
            Ok(ApplyResult::new(Mutation::CreateIncident { incident }))
        }
        Command::UpdateIncident { existing, draft } => {
            let incident: Incident =
                validate_incident(&context.taxonomy, &context.catalog, &draft)?;
            let diff: LineItemDiff = compute_line_item_diff(&existing.items, incident.items())?;
            debug!(
                incident_id = existing.incident_id,
                delete = diff.delete.len(),
                update = diff.update.len(),
                insert = diff.insert.len(),
                "Computed line item diff"
            );
            Ok(ApplyResult::new(Mutation::UpdateIncident {
                incident_id: existing.incident_id,
                incident,
                diff,
            }))
        }
        Command::DeleteIncident { incident_id } => {
            Ok(ApplyResult::new(Mutation::DeleteIncident { incident_id }))
        }
    }
}

fn check_parent(
    context: &RegistryContext,
    level: Level,
    parent_id: Option<i64>,
) -> Result<(), DomainError> {
    match (level.parent(), parent_id) {
        (None, None) => Ok(()),
        (None, Some(_)) => Err(DomainError::InvalidField {
            field: "parentId",
            reason: format!("a {level} has no parent"),
        }),
        (Some(_), None) => Err(DomainError::MissingField { field: "parentId" }),
        (Some(parent_level), Some(id)) => context.taxonomy.require(parent_level, id).map(|_| ()),
    }
}

fn require_unit_measure(context: &RegistryContext, id: i64) -> Result<(), DomainError> {
    context
        .catalog
        .unit_measure(id)
        .map(|_| ())
        .ok_or(DomainError::NotFound {
            entity: EntityKind::UnitMeasure,
            id,
        })
}

const fn referenced(
    entity: EntityKind,
    id: i64,
    referenced_by: EntityKind,
    count: usize,
) -> CoreError {
    CoreError::DomainViolation(DomainError::ReferentialIntegrity {
        entity,
        id,
        referenced_by,
        count,
    })
}

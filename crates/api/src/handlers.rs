// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API handler functions for state-changing and read-only operations.
//!
//! Every handler asks the [`AuthGate`] for a session before touching
//! storage. Writes follow one path: load the registry context, apply the
//! command, then execute the resulting mutation in a transaction.

use incident_registry::{ApplyResult, Command, RegistryContext, apply};
use incident_registry_domain::{
    CascadeResolution, IncidentDraft, IncidentItem, IncidentRecord, Item, ItemDraft, Level,
    LineItemDraft, NodeRef, PartialPath, TaxonomyNode, UnitMeasure, UnitMeasureWarning, UserRole,
    name_key, resolve_options,
};
use incident_registry_persistence::{
    IncidentPage, IncidentQuery, IncidentSort, Persistence, UserData,
};
use std::str::FromStr;
use time::Date;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use tracing::{debug, info};

use crate::auth::{
    Action, AuthGate, AuthenticationService, AuthorizationService, IssuedSession, Session,
};
use crate::error::{
    ApiError, translate_core_error, translate_domain_error, translate_persistence_error,
};
use crate::password_policy::PasswordPolicy;
use crate::request_response::{
    ActionSuccess, ChangePasswordRequest, CreateNodeRequest, CreateUnitMeasureRequest,
    CreateUserRequest, IncidentInfo, IncidentRequest, ItemInfo, ItemRequest, LineItemInfo,
    ListIncidentsRequest, ListIncidentsResponse, ListItemsRequest, ListItemsResponse,
    ListNodesResponse, ListUsersResponse, LoginRequest, LoginResponse, NodeInfo, RenameRequest,
    ResolveCascadeRequest, ResolveCascadeResponse, SaveIncidentResponse, SaveItemResponse,
    SelectionDto, UnitMeasureInfo, UnitMeasureWarningInfo, UpdateUserRoleRequest, UserInfo,
};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

// ============================================================================
// Shared plumbing
// ============================================================================

/// Loads the context, applies a command and executes its mutation.
///
/// Returns the identifier of the affected row and any warnings.
fn execute(
    persistence: &mut Persistence,
    command: Command,
) -> Result<(i64, Vec<UnitMeasureWarning>), ApiError> {
    let context: RegistryContext = persistence
        .load_context()
        .map_err(translate_persistence_error)?;
    let result: ApplyResult = apply(&context, command).map_err(translate_core_error)?;
    let id: i64 = persistence
        .apply_mutation(&result.mutation)
        .map_err(translate_persistence_error)?;
    Ok((id, result.warnings))
}

fn load_context(persistence: &mut Persistence) -> Result<RegistryContext, ApiError> {
    persistence
        .load_context()
        .map_err(translate_persistence_error)
}

fn parse_level(value: &str) -> Result<Level, ApiError> {
    Level::from_str(value.trim()).map_err(translate_domain_error)
}

fn parse_role(value: &str) -> Result<UserRole, ApiError> {
    UserRole::from_str(value.trim()).map_err(translate_domain_error)
}

/// Parses an optional `YYYY-MM-DD` value. Blank counts as absent.
fn parse_date(value: Option<&str>, field: &str) -> Result<Option<Date>, ApiError> {
    let Some(raw) = value.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };
    Date::parse(raw, DATE_FORMAT)
        .map(Some)
        .map_err(|_| ApiError::InvalidField {
            field: field.to_string(),
            message: format!("Field '{field}' is invalid: expected a date as YYYY-MM-DD, got '{raw}'"),
        })
}

fn format_date(date: Date) -> Result<String, ApiError> {
    date.format(DATE_FORMAT).map_err(|e| ApiError::Unexpected {
        message: format!("Failed to format date: {e}"),
    })
}

fn node_info(level: Level, node: &TaxonomyNode) -> NodeInfo {
    NodeInfo {
        level: level.as_str().to_string(),
        id: node.id,
        name: node.name.clone(),
        parent_id: node.parent_id,
    }
}

fn node_ref_info(node: NodeRef, parent_id: Option<i64>) -> NodeInfo {
    NodeInfo {
        level: node.level.as_str().to_string(),
        id: node.id,
        name: node.name,
        parent_id,
    }
}

fn item_info(item: &Item) -> Result<ItemInfo, ApiError> {
    let id: i64 = item.item_id.ok_or_else(|| ApiError::Unexpected {
        message: format!("Item '{}' has no identifier", item.product_name),
    })?;
    Ok(ItemInfo {
        id,
        product_name: item.product_name.clone(),
        variable_id: item.path.variable_id,
        category_id: item.path.category_id,
        subcategory_id: item.path.subcategory_id,
        second_subcategory_id: item.path.second_subcategory_id,
        unit_measure_ids: item.unit_measure_ids.iter().copied().collect(),
    })
}

fn incident_info(record: IncidentRecord) -> Result<IncidentInfo, ApiError> {
    let items: Vec<LineItemInfo> = record
        .items
        .iter()
        .map(|line: &IncidentItem| {
            line.incident_item_id
                .map(|id| LineItemInfo {
                    id,
                    item_id: line.item_id,
                    quantity_used: line.quantity_used,
                    unit_measure_id: line.unit_measure_id,
                })
                .ok_or_else(|| ApiError::Unexpected {
                    message: format!("Incident {} has an unsaved line item", record.incident_id),
                })
        })
        .collect::<Result<_, _>>()?;
    Ok(IncidentInfo {
        id: record.incident_id,
        date: format_date(record.date)?,
        title: record.title,
        description: record.description,
        province_id: record.geography.province_id,
        municipality_id: record.geography.municipality_id,
        variable_id: record.taxonomy.variable_id,
        category_id: record.taxonomy.category_id,
        subcategory_id: record.taxonomy.subcategory_id,
        second_subcategory_id: record.taxonomy.second_subcategory_id,
        number_of_people: record.number_of_people,
        amount: record.amount,
        items,
    })
}

fn user_info(user: UserData) -> UserInfo {
    UserInfo {
        id: user.user_id,
        name: user.name,
        role: user.role.as_str().to_string(),
    }
}

fn incident_draft(request: &IncidentRequest) -> Result<IncidentDraft, ApiError> {
    Ok(IncidentDraft {
        date: parse_date(request.date.as_deref(), "date")?,
        title: request.title.clone(),
        description: request.description.clone(),
        province_id: request.province_id,
        municipality_id: request.municipality_id,
        variable_id: request.variable_id,
        category_id: request.category_id,
        subcategory_id: request.subcategory_id,
        second_subcategory_id: request.second_subcategory_id,
        number_of_people: request.number_of_people.unwrap_or(0),
        amount: request.amount,
        items: request
            .items
            .iter()
            .map(|line| LineItemDraft {
                incident_item_id: line.id,
                item_id: line.item_id,
                quantity_used: line.quantity_used.unwrap_or(0.0),
                unit_measure_id: line.unit_measure_id,
            })
            .collect(),
    })
}

fn item_draft(request: ItemRequest) -> ItemDraft {
    ItemDraft {
        product_name: request.product_name,
        variable_id: request.variable_id,
        category_id: request.category_id,
        subcategory_id: request.subcategory_id,
        second_subcategory_id: request.second_subcategory_id,
        unit_measure_ids: request.unit_measure_ids,
    }
}

fn selection_to_path(selection: &SelectionDto) -> PartialPath {
    let mut path: PartialPath = PartialPath::new();
    path.set(Level::Variable, selection.variable_id);
    path.set(Level::Category, selection.category_id);
    path.set(Level::Subcategory, selection.subcategory_id);
    path.set(Level::SecondSubcategory, selection.second_subcategory_id);
    path.set(Level::Province, selection.province_id);
    path.set(Level::Municipality, selection.municipality_id);
    path
}

fn path_to_selection(path: &PartialPath) -> SelectionDto {
    SelectionDto {
        variable_id: path.get(Level::Variable),
        category_id: path.get(Level::Category),
        subcategory_id: path.get(Level::Subcategory),
        second_subcategory_id: path.get(Level::SecondSubcategory),
        province_id: path.get(Level::Province),
        municipality_id: path.get(Level::Municipality),
    }
}

fn user_not_found(user_id: i64) -> ApiError {
    ApiError::ResourceNotFound {
        resource_type: String::from("user"),
        message: format!("user {user_id} not found"),
    }
}

fn require_user(persistence: &mut Persistence, user_id: i64) -> Result<UserData, ApiError> {
    persistence
        .get_user_by_id(user_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| user_not_found(user_id))
}

/// Refuses a change that would leave no ADMIN account.
fn ensure_other_admin_exists(persistence: &mut Persistence, user: &UserData) -> Result<(), ApiError> {
    if user.role != UserRole::Admin {
        return Ok(());
    }
    let admins: i64 = persistence
        .count_users_with_role(UserRole::Admin)
        .map_err(translate_persistence_error)?;
    if admins <= 1 {
        return Err(ApiError::InvalidField {
            field: String::from("role"),
            message: format!("'{}' is the last ADMIN and must keep that role", user.name),
        });
    }
    Ok(())
}

// ============================================================================
// Taxonomy and geography
// ============================================================================

/// Creates a taxonomy or geography node.
///
/// Only ADMIN sessions may change the taxonomy.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `gate` - Supplies the caller's session
/// * `request` - The level, name and parent of the node
///
/// # Errors
///
/// Returns an error if:
/// - The caller is not an ADMIN
/// - The level is unknown or the parent is missing or unknown
/// - The name is blank or taken by a sibling
pub fn create_node<G: AuthGate + ?Sized>(
    persistence: &mut Persistence,
    gate: &G,
    request: &CreateNodeRequest,
) -> Result<ActionSuccess, ApiError> {
    AuthorizationService::require(gate, Action::ManageTaxonomy)?;
    let level: Level = parse_level(&request.level)?;

    let (id, _): (i64, _) = execute(
        persistence,
        Command::CreateNode {
            level,
            name: request.name.clone(),
            parent_id: request.parent_id,
        },
    )?;

    info!(level = level.as_str(), id, "Created node");
    Ok(ActionSuccess::new(
        id,
        format!("Created {level} '{}'", request.name.trim()),
    ))
}

/// Renames a node, keeping its parent.
///
/// # Errors
///
/// Returns an error if the caller is not an ADMIN, the node does not exist,
/// or the name is blank or taken by a sibling.
pub fn rename_node<G: AuthGate + ?Sized>(
    persistence: &mut Persistence,
    gate: &G,
    level: &str,
    id: i64,
    request: &RenameRequest,
) -> Result<ActionSuccess, ApiError> {
    AuthorizationService::require(gate, Action::ManageTaxonomy)?;
    let level: Level = parse_level(level)?;

    execute(
        persistence,
        Command::RenameNode {
            level,
            id,
            name: request.name.clone(),
        },
    )?;

    info!(level = level.as_str(), id, "Renamed node");
    Ok(ActionSuccess::new(
        id,
        format!("Renamed {level} {id} to '{}'", request.name.trim()),
    ))
}

/// Deletes a node that has no children, items or incidents.
///
/// # Errors
///
/// Returns `ReferentialIntegrity` while anything references the node.
pub fn delete_node<G: AuthGate + ?Sized>(
    persistence: &mut Persistence,
    gate: &G,
    level: &str,
    id: i64,
) -> Result<ActionSuccess, ApiError> {
    AuthorizationService::require(gate, Action::ManageTaxonomy)?;
    let level: Level = parse_level(level)?;

    execute(persistence, Command::DeleteNode { level, id })?;

    info!(level = level.as_str(), id, "Deleted node");
    Ok(ActionSuccess::new(id, format!("Deleted {level} {id}")))
}

/// Lists the nodes at a level, ordered by name then identifier.
///
/// With `parent_id`, only the children of that parent are returned. A
/// non-root level without a parent lists every node at the level.
///
/// # Errors
///
/// Returns an error if there is no session or the level is unknown.
pub fn list_nodes<G: AuthGate + ?Sized>(
    persistence: &mut Persistence,
    gate: &G,
    level: &str,
    parent_id: Option<i64>,
) -> Result<ListNodesResponse, ApiError> {
    AuthorizationService::require(gate, Action::Read)?;
    let level: Level = parse_level(level)?;

    let nodes: Vec<NodeInfo> = if parent_id.is_none() && !level.is_root() {
        let mut nodes: Vec<TaxonomyNode> = persistence
            .list_nodes(level)
            .map_err(translate_persistence_error)?;
        nodes.sort_by(|a, b| name_key(&a.name).cmp(&name_key(&b.name)).then(a.id.cmp(&b.id)));
        nodes.iter().map(|node| node_info(level, node)).collect()
    } else {
        let context: RegistryContext = load_context(persistence)?;
        let parent: Option<i64> = if level.is_root() { None } else { parent_id };
        context
            .taxonomy
            .children(level, parent)
            .into_iter()
            .map(|node| node_info(level, node))
            .collect()
    };

    debug!(level = level.as_str(), count = nodes.len(), "Listed nodes");
    Ok(ListNodesResponse { nodes })
}

/// Resolves a selector change on either chain.
///
/// Clears deeper selections that no longer fit and returns the options for
/// the level below the changed one.
///
/// # Errors
///
/// Returns `InconsistentPath` if the new value does not belong to its parent.
pub fn resolve_cascade<G: AuthGate + ?Sized>(
    persistence: &mut Persistence,
    gate: &G,
    request: &ResolveCascadeRequest,
) -> Result<ResolveCascadeResponse, ApiError> {
    AuthorizationService::require(gate, Action::Read)?;
    let changed: Level = parse_level(&request.changed)?;
    let context: RegistryContext = load_context(persistence)?;

    let selection: PartialPath = selection_to_path(&request.selection);
    let resolution: CascadeResolution =
        resolve_options(&context.taxonomy, &selection, changed).map_err(translate_domain_error)?;

    let parent_id: Option<i64> = selection.get(changed);
    Ok(ResolveCascadeResponse {
        selection: path_to_selection(&resolution.selection),
        next_level: resolution.next_level.map(|level| level.as_str().to_string()),
        options: resolution
            .options
            .into_iter()
            .map(|node| node_ref_info(node, parent_id))
            .collect(),
        invalidated: resolution
            .invalidated
            .iter()
            .map(|level| level.as_str().to_string())
            .collect(),
    })
}

// ============================================================================
// Unit measures
// ============================================================================

/// Creates a unit measure.
///
/// # Errors
///
/// Returns an error if the caller is below ADVANCED or the name is blank or
/// taken.
pub fn create_unit_measure<G: AuthGate + ?Sized>(
    persistence: &mut Persistence,
    gate: &G,
    request: &CreateUnitMeasureRequest,
) -> Result<ActionSuccess, ApiError> {
    AuthorizationService::require(gate, Action::ManageCatalog)?;
    let (id, _): (i64, _) = execute(
        persistence,
        Command::CreateUnitMeasure {
            name: request.name.clone(),
        },
    )?;
    info!(id, "Created unit measure");
    Ok(ActionSuccess::new(
        id,
        format!("Created unit measure '{}'", request.name.trim()),
    ))
}

/// Renames a unit measure.
///
/// # Errors
///
/// Returns an error if the unit measure does not exist or the name is taken.
pub fn rename_unit_measure<G: AuthGate + ?Sized>(
    persistence: &mut Persistence,
    gate: &G,
    id: i64,
    request: &RenameRequest,
) -> Result<ActionSuccess, ApiError> {
    AuthorizationService::require(gate, Action::ManageCatalog)?;
    execute(
        persistence,
        Command::RenameUnitMeasure {
            id,
            name: request.name.clone(),
        },
    )?;
    info!(id, "Renamed unit measure");
    Ok(ActionSuccess::new(
        id,
        format!("Renamed unit measure {id} to '{}'", request.name.trim()),
    ))
}

/// Deletes a unit measure no item permits and no line entry records.
///
/// # Errors
///
/// Returns `ReferentialIntegrity` while the unit measure is referenced.
pub fn delete_unit_measure<G: AuthGate + ?Sized>(
    persistence: &mut Persistence,
    gate: &G,
    id: i64,
) -> Result<ActionSuccess, ApiError> {
    AuthorizationService::require(gate, Action::ManageCatalog)?;
    execute(persistence, Command::DeleteUnitMeasure { id })?;
    info!(id, "Deleted unit measure");
    Ok(ActionSuccess::new(id, format!("Deleted unit measure {id}")))
}

/// Lists unit measures ordered by name.
///
/// # Errors
///
/// Returns an error if there is no session or the query fails.
pub fn list_unit_measures<G: AuthGate + ?Sized>(
    persistence: &mut Persistence,
    gate: &G,
) -> Result<Vec<UnitMeasureInfo>, ApiError> {
    AuthorizationService::require(gate, Action::Read)?;
    let units: Vec<UnitMeasure> = persistence
        .list_unit_measures()
        .map_err(translate_persistence_error)?;
    Ok(units
        .into_iter()
        .map(|unit| UnitMeasureInfo {
            id: unit.id,
            name: unit.name,
        })
        .collect())
}

// ============================================================================
// Items
// ============================================================================

/// Creates a catalog item.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `gate` - Supplies the caller's session
/// * `request` - Product name, taxonomy path and permitted unit measures
///
/// # Errors
///
/// Returns an error if:
/// - The caller is below ADVANCED
/// - A required field is missing or the taxonomy path is inconsistent
/// - A unit measure does not exist
/// - Another item has the same name on the same path
pub fn create_item<G: AuthGate + ?Sized>(
    persistence: &mut Persistence,
    gate: &G,
    request: ItemRequest,
) -> Result<SaveItemResponse, ApiError> {
    AuthorizationService::require(gate, Action::ManageCatalog)?;
    let (item_id, _): (i64, _) = execute(
        persistence,
        Command::CreateItem {
            draft: item_draft(request),
        },
    )?;
    info!(item_id, "Created item");
    Ok(SaveItemResponse {
        success: true,
        item_id,
        warnings: Vec::new(),
    })
}

/// Replaces a catalog item's values.
///
/// Removing a unit measure that stored line entries still use succeeds but
/// is reported in `warnings`. Those line entries keep their unit.
///
/// # Errors
///
/// Returns the same errors as [`create_item`], plus `NotFound` for an
/// unknown item.
pub fn update_item<G: AuthGate + ?Sized>(
    persistence: &mut Persistence,
    gate: &G,
    item_id: i64,
    request: ItemRequest,
) -> Result<SaveItemResponse, ApiError> {
    AuthorizationService::require(gate, Action::ManageCatalog)?;
    let (item_id, warnings): (i64, Vec<UnitMeasureWarning>) = execute(
        persistence,
        Command::UpdateItem {
            item_id,
            draft: item_draft(request),
        },
    )?;
    info!(item_id, warnings = warnings.len(), "Updated item");
    Ok(SaveItemResponse {
        success: true,
        item_id,
        warnings: warnings
            .iter()
            .map(|warning| UnitMeasureWarningInfo {
                unit_measure_id: warning.unit_measure_id,
                line_item_count: warning.line_item_count,
                message: warning.to_string(),
            })
            .collect(),
    })
}

/// Deletes an item no incident uses.
///
/// # Errors
///
/// Returns `ReferentialIntegrity` while line entries record the item.
pub fn delete_item<G: AuthGate + ?Sized>(
    persistence: &mut Persistence,
    gate: &G,
    item_id: i64,
) -> Result<ActionSuccess, ApiError> {
    AuthorizationService::require(gate, Action::ManageCatalog)?;
    execute(persistence, Command::DeleteItem { item_id })?;
    info!(item_id, "Deleted item");
    Ok(ActionSuccess::new(item_id, format!("Deleted item {item_id}")))
}

/// Retrieves one item.
///
/// # Errors
///
/// Returns `NotFound` for an unknown item.
pub fn get_item<G: AuthGate + ?Sized>(
    persistence: &mut Persistence,
    gate: &G,
    item_id: i64,
) -> Result<ItemInfo, ApiError> {
    AuthorizationService::require(gate, Action::Read)?;
    let item: Item = persistence
        .get_item(item_id)
        .map_err(translate_persistence_error)?
        .ok_or_else(|| ApiError::ResourceNotFound {
            resource_type: String::from("item"),
            message: format!("item {item_id} not found"),
        })?;
    item_info(&item)
}

/// Lists items on a (possibly partial) taxonomy path.
///
/// An incident form uses this to offer the items of its chosen path.
///
/// # Errors
///
/// Returns an error if there is no session or the query fails.
pub fn list_items<G: AuthGate + ?Sized>(
    persistence: &mut Persistence,
    gate: &G,
    request: &ListItemsRequest,
) -> Result<ListItemsResponse, ApiError> {
    AuthorizationService::require(gate, Action::Read)?;
    let context: RegistryContext = load_context(persistence)?;

    let mut filter: PartialPath = PartialPath::new();
    filter.set(Level::Variable, request.variable_id);
    filter.set(Level::Category, request.category_id);
    filter.set(Level::Subcategory, request.subcategory_id);
    filter.set(Level::SecondSubcategory, request.second_subcategory_id);

    let items: Vec<ItemInfo> = context
        .catalog
        .items_matching(&filter)
        .into_iter()
        .map(item_info)
        .collect::<Result<_, _>>()?;
    Ok(ListItemsResponse { items })
}

// ============================================================================
// Incidents
// ============================================================================

/// Records a new incident with its line entries.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `gate` - Supplies the caller's session
/// * `request` - The incident form values
///
/// # Errors
///
/// Returns an error if:
/// - There is no session
/// - A required field is missing or out of range
/// - Either path is inconsistent
/// - A line entry names an unknown item, a non-positive quantity or a unit
///   the item does not permit
pub fn create_incident<G: AuthGate + ?Sized>(
    persistence: &mut Persistence,
    gate: &G,
    request: &IncidentRequest,
) -> Result<SaveIncidentResponse, ApiError> {
    let session: Session = AuthorizationService::require(gate, Action::EditIncident)?;
    let draft: IncidentDraft = incident_draft(request)?;

    let (incident_id, _): (i64, _) = execute(persistence, Command::CreateIncident { draft })?;

    info!(incident_id, user_id = session.user_id, "Created incident");
    Ok(SaveIncidentResponse {
        success: true,
        incident_id,
    })
}

/// Replaces an incident's values and reconciles its line entries.
///
/// Entries with an `id` are updated in place, entries without one are
/// inserted, and stored entries missing from the request are deleted. The
/// incident row and all entry changes commit together.
///
/// # Errors
///
/// Returns the same errors as [`create_incident`], plus `NotFound` for an
/// unknown incident and `InvalidLineItem` for an entry `id` owned by another
/// incident.
pub fn update_incident<G: AuthGate + ?Sized>(
    persistence: &mut Persistence,
    gate: &G,
    incident_id: i64,
    request: &IncidentRequest,
) -> Result<SaveIncidentResponse, ApiError> {
    let session: Session = AuthorizationService::require(gate, Action::EditIncident)?;
    let draft: IncidentDraft = incident_draft(request)?;
    let existing: IncidentRecord = persistence
        .get_incident(incident_id)
        .map_err(translate_persistence_error)?;

    execute(persistence, Command::UpdateIncident { existing, draft })?;

    info!(incident_id, user_id = session.user_id, "Updated incident");
    Ok(SaveIncidentResponse {
        success: true,
        incident_id,
    })
}

/// Deletes an incident and its line entries.
///
/// # Errors
///
/// Returns an error if the caller is below ADVANCED or the incident does
/// not exist.
pub fn delete_incident<G: AuthGate + ?Sized>(
    persistence: &mut Persistence,
    gate: &G,
    incident_id: i64,
) -> Result<ActionSuccess, ApiError> {
    let session: Session = AuthorizationService::require(gate, Action::DeleteIncident)?;
    execute(persistence, Command::DeleteIncident { incident_id })?;
    info!(incident_id, user_id = session.user_id, "Deleted incident");
    Ok(ActionSuccess::new(
        incident_id,
        format!("Deleted incident {incident_id}"),
    ))
}

/// Retrieves an incident with its line entries in display order.
///
/// # Errors
///
/// Returns `NotFound` for an unknown incident.
pub fn get_incident<G: AuthGate + ?Sized>(
    persistence: &mut Persistence,
    gate: &G,
    incident_id: i64,
) -> Result<IncidentInfo, ApiError> {
    AuthorizationService::require(gate, Action::Read)?;
    let record: IncidentRecord = persistence
        .get_incident(incident_id)
        .map_err(translate_persistence_error)?;
    incident_info(record)
}

/// Lists incidents with search, filters, sorting and paging.
///
/// Defaults to newest first, 20 per page.
///
/// # Errors
///
/// Returns `InvalidField` for a malformed date, sort column or order.
pub fn list_incidents<G: AuthGate + ?Sized>(
    persistence: &mut Persistence,
    gate: &G,
    request: &ListIncidentsRequest,
) -> Result<ListIncidentsResponse, ApiError> {
    AuthorizationService::require(gate, Action::Read)?;

    let defaults: IncidentQuery = IncidentQuery::default();
    let sort: IncidentSort = match request.sort.as_deref().map(str::trim) {
        None | Some("" | "date") => IncidentSort::Date,
        Some("title") => IncidentSort::Title,
        Some("id") => IncidentSort::Id,
        Some(other) => {
            return Err(ApiError::InvalidField {
                field: String::from("sort"),
                message: format!("Unknown sort column '{other}'"),
            });
        }
    };
    let descending: bool = match request.order.as_deref().map(str::trim) {
        None | Some("") => defaults.descending,
        Some(order) if order.eq_ignore_ascii_case("desc") => true,
        Some(order) if order.eq_ignore_ascii_case("asc") => false,
        Some(other) => {
            return Err(ApiError::InvalidField {
                field: String::from("order"),
                message: format!("Unknown sort order '{other}'"),
            });
        }
    };

    let query: IncidentQuery = IncidentQuery {
        search: request
            .search
            .as_deref()
            .map(str::trim)
            .filter(|search| !search.is_empty())
            .map(str::to_string),
        variable_id: request.variable_id,
        province_id: request.province_id,
        date_from: parse_date(request.date_from.as_deref(), "dateFrom")?,
        date_to: parse_date(request.date_to.as_deref(), "dateTo")?,
        sort,
        descending,
        page: request.page.unwrap_or(defaults.page).max(1),
        page_size: request
            .page_size
            .unwrap_or(defaults.page_size)
            .clamp(1, IncidentQuery::MAX_PAGE_SIZE),
    };

    let page: IncidentPage = persistence
        .list_incidents(&query)
        .map_err(translate_persistence_error)?;
    let incidents: Vec<IncidentInfo> = page
        .incidents
        .into_iter()
        .map(incident_info)
        .collect::<Result<_, _>>()?;

    Ok(ListIncidentsResponse {
        incidents,
        total: page.total,
        page: page.page,
        page_size: page.page_size,
    })
}

// ============================================================================
// Users
// ============================================================================

/// Creates a user account.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `gate` - Supplies the caller's session
/// * `request` - Name, password, confirmation and role
///
/// # Errors
///
/// Returns an error if:
/// - The caller is not an ADMIN
/// - The name is blank or already taken
/// - The role is unknown
/// - The password breaks the policy
pub fn create_user<G: AuthGate + ?Sized>(
    persistence: &mut Persistence,
    gate: &G,
    request: &CreateUserRequest,
) -> Result<UserInfo, ApiError> {
    AuthorizationService::require(gate, Action::ManageUsers)?;
    insert_user(persistence, request)
}

/// Creates the first ADMIN account of an empty installation.
///
/// No session is needed, but the call is refused once any user exists.
///
/// # Errors
///
/// Returns `Unauthorized` when users already exist, otherwise the same
/// errors as [`create_user`].
pub fn bootstrap_admin(
    persistence: &mut Persistence,
    request: &CreateUserRequest,
) -> Result<UserInfo, ApiError> {
    let existing: Vec<UserData> = persistence
        .list_users()
        .map_err(translate_persistence_error)?;
    if !existing.is_empty() {
        return Err(ApiError::Unauthorized {
            action: String::from("bootstrap_admin"),
            required_role: UserRole::Admin.as_str().to_string(),
        });
    }
    if parse_role(&request.role)? != UserRole::Admin {
        return Err(ApiError::InvalidField {
            field: String::from("role"),
            message: String::from("The first user must be an ADMIN"),
        });
    }
    insert_user(persistence, request)
}

fn insert_user(
    persistence: &mut Persistence,
    request: &CreateUserRequest,
) -> Result<UserInfo, ApiError> {
    let name: &str = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::MissingField {
            field: String::from("name"),
            message: String::from("Field 'name' is required"),
        });
    }
    let role: UserRole = parse_role(&request.role)?;
    PasswordPolicy::default().validate(
        &request.password,
        &request.password_confirmation,
        name,
    )?;

    if persistence
        .get_user_by_name(name)
        .map_err(translate_persistence_error)?
        .is_some()
    {
        return Err(ApiError::DuplicateName {
            field: String::from("name"),
            message: format!("A user named '{name}' already exists"),
        });
    }

    let user_id: i64 = persistence
        .create_user(name, &request.password, role)
        .map_err(translate_persistence_error)?;
    info!(user_id, role = role.as_str(), "Created user");
    Ok(UserInfo {
        id: user_id,
        name: name.to_string(),
        role: role.as_str().to_string(),
    })
}

/// Changes a user's role.
///
/// # Errors
///
/// Returns `InvalidField` when the change would demote the last ADMIN.
pub fn update_user_role<G: AuthGate + ?Sized>(
    persistence: &mut Persistence,
    gate: &G,
    user_id: i64,
    request: &UpdateUserRoleRequest,
) -> Result<UserInfo, ApiError> {
    AuthorizationService::require(gate, Action::ManageUsers)?;
    let role: UserRole = parse_role(&request.role)?;
    let user: UserData = require_user(persistence, user_id)?;

    if role != UserRole::Admin {
        ensure_other_admin_exists(persistence, &user)?;
    }
    persistence
        .update_user_role(user_id, role)
        .map_err(translate_persistence_error)?;

    info!(user_id, role = role.as_str(), "Changed user role");
    Ok(UserInfo {
        id: user_id,
        name: user.name,
        role: role.as_str().to_string(),
    })
}

/// Deletes a user account.
///
/// # Errors
///
/// Returns `InvalidField` when the user is the last ADMIN.
pub fn delete_user<G: AuthGate + ?Sized>(
    persistence: &mut Persistence,
    gate: &G,
    user_id: i64,
) -> Result<ActionSuccess, ApiError> {
    AuthorizationService::require(gate, Action::ManageUsers)?;
    let user: UserData = require_user(persistence, user_id)?;
    ensure_other_admin_exists(persistence, &user)?;

    persistence
        .delete_user(user_id)
        .map_err(translate_persistence_error)?;

    info!(user_id, "Deleted user");
    Ok(ActionSuccess::new(
        user_id,
        format!("Deleted user '{}'", user.name),
    ))
}

/// Sets a user's password and ends every session of that user.
///
/// Users may change their own password; changing someone else's requires
/// ADMIN.
///
/// # Errors
///
/// Returns `PasswordPolicy` if the new password breaks the policy.
pub fn change_password<G: AuthGate + ?Sized>(
    persistence: &mut Persistence,
    gate: &G,
    user_id: i64,
    request: &ChangePasswordRequest,
) -> Result<ActionSuccess, ApiError> {
    let session: Session = gate.require_session()?;
    if session.user_id != user_id {
        AuthorizationService::authorize(&session, Action::ManageUsers)?;
    }
    let user: UserData = require_user(persistence, user_id)?;

    PasswordPolicy::default().validate(
        &request.password,
        &request.password_confirmation,
        &user.name,
    )?;
    persistence
        .update_user_password(user_id, &request.password)
        .map_err(translate_persistence_error)?;
    let revoked: usize = persistence
        .delete_sessions_for_user(user_id)
        .map_err(translate_persistence_error)?;

    info!(
        user_id,
        changed_by = session.user_id,
        revoked, "Changed password"
    );
    Ok(ActionSuccess::new(
        user_id,
        format!("Password changed for '{}'", user.name),
    ))
}

/// Lists user accounts ordered by name.
///
/// # Errors
///
/// Returns an error if the caller is not an ADMIN.
pub fn list_users<G: AuthGate + ?Sized>(
    persistence: &mut Persistence,
    gate: &G,
) -> Result<ListUsersResponse, ApiError> {
    AuthorizationService::require(gate, Action::ManageUsers)?;
    let users: Vec<UserData> = persistence
        .list_users()
        .map_err(translate_persistence_error)?;
    Ok(ListUsersResponse {
        users: users.into_iter().map(user_info).collect(),
    })
}

/// Checks a name and password and issues a session token.
///
/// # Errors
///
/// Returns `Unauthorized` for an unknown name or a wrong password.
pub fn login(
    persistence: &mut Persistence,
    request: &LoginRequest,
) -> Result<LoginResponse, ApiError> {
    let issued: IssuedSession =
        AuthenticationService::login(persistence, &request.name, &request.password)?;
    info!(user_id = issued.session.user_id, "User logged in");
    Ok(LoginResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        user: UserInfo {
            id: issued.session.user_id,
            name: issued.session.name,
            role: issued.session.role.as_str().to_string(),
        },
    })
}

/// Ends the session identified by `token`.
///
/// # Errors
///
/// Returns `Unauthorized` if the gate holds no session.
pub fn logout<G: AuthGate + ?Sized>(
    persistence: &mut Persistence,
    gate: &G,
    token: &str,
) -> Result<ActionSuccess, ApiError> {
    let session: Session = gate.require_session()?;
    AuthenticationService::logout(persistence, token)?;
    info!(user_id = session.user_id, "User logged out");
    Ok(ActionSuccess::new(
        session.user_id,
        format!("Logged out '{}'", session.name),
    ))
}

/// Returns the caller's account.
///
/// # Errors
///
/// Returns `Unauthorized` if there is no session.
pub fn whoami<G: AuthGate + ?Sized>(gate: &G) -> Result<UserInfo, ApiError> {
    let session: Session = gate.require_session()?;
    Ok(UserInfo {
        id: session.user_id,
        name: session.name,
        role: session.role.as_str().to_string(),
    })
}

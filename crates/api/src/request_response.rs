// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.
//!
//! Field names are camelCase on the wire. Dates travel as `YYYY-MM-DD`
//! strings and are parsed by the handlers, so a malformed date is reported
//! against its field.

use serde::{Deserialize, Serialize};

// ============================================================================
// Taxonomy and geography
// ============================================================================

/// API request to create a taxonomy or geography node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNodeRequest {
    /// The level, e.g. `category` or `municipality`.
    pub level: String,
    /// The node name.
    pub name: String,
    /// The parent node, required below the root levels.
    #[serde(default)]
    pub parent_id: Option<i64>,
}

/// API request to rename a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameRequest {
    /// The new name.
    pub name: String,
}

/// A taxonomy or geography node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    /// The level, in snake case.
    pub level: String,
    /// The node identifier.
    pub id: i64,
    /// The node name.
    pub name: String,
    /// The parent node, `None` at the root levels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

/// API response listing nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNodesResponse {
    /// The nodes, ordered by name then identifier.
    pub nodes: Vec<NodeInfo>,
}

/// Selector values for both chains. Absent means "nothing selected".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_subcategory_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub province_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub municipality_id: Option<i64>,
}

/// API request describing a selector change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveCascadeRequest {
    /// The selection with the new value already applied.
    pub selection: SelectionDto,
    /// The level the user changed.
    pub changed: String,
}

/// API response for a selector change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveCascadeResponse {
    /// The selection with invalidated values cleared.
    pub selection: SelectionDto,
    /// The level the options belong to.
    pub next_level: Option<String>,
    /// The options for `next_level`.
    pub options: Vec<NodeInfo>,
    /// Levels whose value was cleared.
    pub invalidated: Vec<String>,
}

// ============================================================================
// Catalog
// ============================================================================

/// API request to create a unit measure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUnitMeasureRequest {
    /// The unit name.
    pub name: String,
}

/// A unit measure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitMeasureInfo {
    pub id: i64,
    pub name: String,
}

/// API request to create or replace an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequest {
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub variable_id: Option<i64>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub subcategory_id: Option<i64>,
    #[serde(default)]
    pub second_subcategory_id: Option<i64>,
    /// Unit measures the item may be recorded in.
    #[serde(default)]
    pub unit_measure_ids: Vec<i64>,
}

/// An item with its permitted unit measures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemInfo {
    pub id: i64,
    pub product_name: String,
    pub variable_id: i64,
    pub category_id: i64,
    pub subcategory_id: Option<i64>,
    pub second_subcategory_id: Option<i64>,
    pub unit_measure_ids: Vec<i64>,
}

/// API request to list items on a (partial) taxonomy path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItemsRequest {
    #[serde(default)]
    pub variable_id: Option<i64>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub subcategory_id: Option<i64>,
    #[serde(default)]
    pub second_subcategory_id: Option<i64>,
}

/// API response listing items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItemsResponse {
    pub items: Vec<ItemInfo>,
}

/// A unit measure removed from an item while line entries still use it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitMeasureWarningInfo {
    pub unit_measure_id: i64,
    pub line_item_count: usize,
    pub message: String,
}

/// API response for a saved item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveItemResponse {
    /// Always `true`.
    pub success: bool,
    pub item_id: i64,
    /// Non-fatal notices about the save.
    pub warnings: Vec<UnitMeasureWarningInfo>,
}

// ============================================================================
// Incidents
// ============================================================================

/// One line entry of an incident form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemRequest {
    /// The stored line entry, absent for new entries.
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub item_id: Option<i64>,
    #[serde(default)]
    pub quantity_used: Option<f64>,
    #[serde(default)]
    pub unit_measure_id: Option<i64>,
}

/// API request to create or replace an incident.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentRequest {
    /// Incident date as `YYYY-MM-DD`.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub province_id: Option<i64>,
    #[serde(default)]
    pub municipality_id: Option<i64>,
    #[serde(default)]
    pub variable_id: Option<i64>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub subcategory_id: Option<i64>,
    #[serde(default)]
    pub second_subcategory_id: Option<i64>,
    /// Defaults to zero.
    #[serde(default)]
    pub number_of_people: Option<i64>,
    #[serde(default)]
    pub amount: Option<f64>,
    /// Line entries in display order.
    #[serde(default)]
    pub items: Vec<LineItemRequest>,
}

/// A stored line entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemInfo {
    pub id: i64,
    pub item_id: i64,
    pub quantity_used: f64,
    pub unit_measure_id: i64,
}

/// A stored incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentInfo {
    pub id: i64,
    /// `YYYY-MM-DD`.
    pub date: String,
    pub title: String,
    pub description: String,
    pub province_id: i64,
    pub municipality_id: i64,
    pub variable_id: i64,
    pub category_id: i64,
    pub subcategory_id: Option<i64>,
    pub second_subcategory_id: Option<i64>,
    pub number_of_people: u32,
    pub amount: Option<f64>,
    pub items: Vec<LineItemInfo>,
}

/// API response for a saved incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveIncidentResponse {
    /// Always `true`.
    pub success: bool,
    pub incident_id: i64,
}

/// API request to list incidents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListIncidentsRequest {
    /// Substring matched against title and description.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub variable_id: Option<i64>,
    #[serde(default)]
    pub province_id: Option<i64>,
    /// Earliest date, `YYYY-MM-DD`.
    #[serde(default)]
    pub date_from: Option<String>,
    /// Latest date, `YYYY-MM-DD`.
    #[serde(default)]
    pub date_to: Option<String>,
    /// `date`, `title` or `id`.
    #[serde(default)]
    pub sort: Option<String>,
    /// `asc` or `desc`.
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

/// API response listing incidents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListIncidentsResponse {
    pub incidents: Vec<IncidentInfo>,
    /// Matches across all pages.
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

// ============================================================================
// Users
// ============================================================================

/// API request to create a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: String,
    pub password: String,
    pub password_confirmation: String,
    /// `SIMPLE`, `ADVANCED` or `ADMIN`.
    pub role: String,
}

/// API request to change a user's role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRoleRequest {
    pub role: String,
}

/// API request to set a user's password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub password: String,
    pub password_confirmation: String,
}

/// API request to check credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub name: String,
    pub password: String,
}

/// API response for a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Bearer token for the `Authorization` header.
    pub token: String,
    /// RFC 3339 expiry timestamp.
    pub expires_at: String,
    pub user: UserInfo,
}

/// A user account. The password hash is never exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: i64,
    pub name: String,
    pub role: String,
}

/// API response listing users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersResponse {
    pub users: Vec<UserInfo>,
}

// ============================================================================
// Generic
// ============================================================================

/// API response for a create, rename or delete that only reports an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionSuccess {
    /// Always `true`.
    pub success: bool,
    /// The row created, changed or removed.
    pub id: i64,
    pub message: String,
}

impl ActionSuccess {
    /// Creates a success result.
    #[must_use]
    pub const fn new(id: i64, message: String) -> Self {
        Self {
            success: true,
            id,
            message,
        }
    }
}

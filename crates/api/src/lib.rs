// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API boundary for the Incident Registry.
//!
//! Handlers accept request DTOs, check the caller through an [`AuthGate`],
//! run commands through the core and persistence layers, and return either
//! a response DTO or an [`ApiError`]. Every failure converts to the
//! structured [`ActionFailure`] shape via [`ApiError::to_failure`].

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod auth;
mod error;
mod handlers;
mod password_policy;
mod request_response;

#[cfg(test)]
mod tests;

pub use auth::{
    Action, AuthGate, AuthenticationService, AuthorizationService, IssuedSession, ResolvedGate,
    SESSION_LIFETIME, Session,
};
pub use error::{
    ActionFailure, ApiError, AuthError, FailureKind, translate_core_error, translate_domain_error,
    translate_persistence_error,
};
pub use handlers::{
    bootstrap_admin, change_password, create_incident, create_item, create_node,
    create_unit_measure, create_user, delete_incident, delete_item, delete_node,
    delete_unit_measure, delete_user, get_incident, get_item, list_incidents, list_items,
    list_nodes, list_unit_measures, list_users, login, logout, rename_node, rename_unit_measure,
    resolve_cascade, update_incident, update_item, update_user_role, whoami,
};
pub use password_policy::{PasswordPolicy, PasswordPolicyError};
pub use request_response::{
    ActionSuccess, ChangePasswordRequest, CreateNodeRequest, CreateUnitMeasureRequest,
    CreateUserRequest, IncidentInfo, IncidentRequest, ItemInfo, ItemRequest, LineItemInfo,
    LineItemRequest, ListIncidentsRequest, ListIncidentsResponse, ListItemsRequest,
    ListItemsResponse, ListNodesResponse, ListUsersResponse, LoginRequest, LoginResponse, NodeInfo,
    RenameRequest, ResolveCascadeRequest, ResolveCascadeResponse, SaveIncidentResponse,
    SaveItemResponse, SelectionDto, UnitMeasureInfo, UnitMeasureWarningInfo,
    UpdateUserRoleRequest, UserInfo,
};

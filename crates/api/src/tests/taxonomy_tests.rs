// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Taxonomy and geography management tests.

use crate::{
    ActionSuccess, ApiError, CreateNodeRequest, ListNodesResponse, RenameRequest, create_node,
    delete_node, list_nodes, rename_node,
};

use super::helpers::{Registry, add_node, admin_gate, setup_registry, setup_test_persistence};
use incident_registry_persistence::Persistence;

fn category_names(registry: &mut Registry) -> Vec<String> {
    let listed: ListNodesResponse = list_nodes(
        &mut registry.persistence,
        &admin_gate(),
        "category",
        Some(registry.variable),
    )
    .unwrap();
    listed.nodes.into_iter().map(|node| node.name).collect()
}

#[test]
fn test_duplicate_category_under_same_variable_is_rejected() {
    let mut registry: Registry = setup_registry();

    let result: Result<ActionSuccess, ApiError> = create_node(
        &mut registry.persistence,
        &admin_gate(),
        &CreateNodeRequest {
            level: String::from("category"),
            name: String::from("  transporte "),
            parent_id: Some(registry.variable),
        },
    );

    match result {
        Err(ApiError::DuplicateName { field, .. }) => assert_eq!(field, "name"),
        other => panic!("Expected DuplicateName, got {other:?}"),
    }
    assert_eq!(category_names(&mut registry), vec!["Transporte"]);
}

#[test]
fn test_same_category_name_under_other_variable_is_allowed() {
    let mut registry: Registry = setup_registry();

    let result: Result<ActionSuccess, ApiError> = create_node(
        &mut registry.persistence,
        &admin_gate(),
        &CreateNodeRequest {
            level: String::from("category"),
            name: String::from("Transporte"),
            parent_id: Some(registry.other_variable),
        },
    );

    assert!(result.is_ok());
}

#[test]
fn test_create_node_trims_name() {
    let mut registry: Registry = setup_registry();
    add_node(
        &mut registry.persistence,
        "category",
        "  Seguridad  ",
        Some(registry.variable),
    );

    assert_eq!(
        category_names(&mut registry),
        vec!["Seguridad", "Transporte"]
    );
}

#[test]
fn test_child_level_requires_parent() {
    let mut persistence: Persistence = setup_test_persistence();

    let result: Result<ActionSuccess, ApiError> = create_node(
        &mut persistence,
        &admin_gate(),
        &CreateNodeRequest {
            level: String::from("municipality"),
            name: String::from("Playa"),
            parent_id: None,
        },
    );

    assert!(matches!(
        result,
        Err(ApiError::MissingField { ref field, .. }) if field == "parentId"
    ));
}

#[test]
fn test_root_level_rejects_parent() {
    let mut registry: Registry = setup_registry();

    let result: Result<ActionSuccess, ApiError> = create_node(
        &mut registry.persistence,
        &admin_gate(),
        &CreateNodeRequest {
            level: String::from("province"),
            name: String::from("Holguin"),
            parent_id: Some(registry.province),
        },
    );

    assert!(matches!(
        result,
        Err(ApiError::InvalidField { ref field, .. }) if field == "parentId"
    ));
}

#[test]
fn test_unknown_parent_is_not_found() {
    let mut persistence: Persistence = setup_test_persistence();

    let result: Result<ActionSuccess, ApiError> = create_node(
        &mut persistence,
        &admin_gate(),
        &CreateNodeRequest {
            level: String::from("category"),
            name: String::from("Transporte"),
            parent_id: Some(77),
        },
    );

    assert!(matches!(result, Err(ApiError::ResourceNotFound { .. })));
}

#[test]
fn test_blank_name_is_missing() {
    let mut persistence: Persistence = setup_test_persistence();

    let result: Result<ActionSuccess, ApiError> = create_node(
        &mut persistence,
        &admin_gate(),
        &CreateNodeRequest {
            level: String::from("variable"),
            name: String::from("   "),
            parent_id: None,
        },
    );

    assert!(matches!(
        result,
        Err(ApiError::MissingField { ref field, .. }) if field == "name"
    ));
}

#[test]
fn test_rename_node() {
    let mut registry: Registry = setup_registry();

    rename_node(
        &mut registry.persistence,
        &admin_gate(),
        "category",
        registry.category,
        &RenameRequest {
            name: String::from("Transporte Publico"),
        },
    )
    .unwrap();

    assert_eq!(category_names(&mut registry), vec!["Transporte Publico"]);
}

#[test]
fn test_rename_to_sibling_name_is_rejected() {
    let mut registry: Registry = setup_registry();
    let sibling: i64 = add_node(
        &mut registry.persistence,
        "category",
        "Vivienda",
        Some(registry.variable),
    );

    let result: Result<ActionSuccess, ApiError> = rename_node(
        &mut registry.persistence,
        &admin_gate(),
        "category",
        sibling,
        &RenameRequest {
            name: String::from("TRANSPORTE"),
        },
    );

    assert!(matches!(result, Err(ApiError::DuplicateName { .. })));
}

#[test]
fn test_rename_keeping_own_name_with_new_case() {
    let mut registry: Registry = setup_registry();

    let result: Result<ActionSuccess, ApiError> = rename_node(
        &mut registry.persistence,
        &admin_gate(),
        "category",
        registry.category,
        &RenameRequest {
            name: String::from("TRANSPORTE"),
        },
    );

    assert!(result.is_ok());
    assert_eq!(category_names(&mut registry), vec!["TRANSPORTE"]);
}

#[test]
fn test_delete_node_with_children_is_refused() {
    let mut registry: Registry = setup_registry();

    let result: Result<ActionSuccess, ApiError> = delete_node(
        &mut registry.persistence,
        &admin_gate(),
        "province",
        registry.province,
    );

    assert!(matches!(result, Err(ApiError::ReferentialIntegrity { .. })));
}

#[test]
fn test_delete_node_used_by_item_is_refused() {
    let mut registry: Registry = setup_registry();

    let result: Result<ActionSuccess, ApiError> = delete_node(
        &mut registry.persistence,
        &admin_gate(),
        "subcategory",
        registry.subcategory,
    );

    match result {
        Err(ApiError::ReferentialIntegrity { message }) => assert!(message.contains("item")),
        other => panic!("Expected ReferentialIntegrity, got {other:?}"),
    }
}

#[test]
fn test_delete_leaf_node() {
    let mut registry: Registry = setup_registry();
    let leaf: i64 = add_node(
        &mut registry.persistence,
        "category",
        "Vivienda",
        Some(registry.variable),
    );

    let deleted: ActionSuccess =
        delete_node(&mut registry.persistence, &admin_gate(), "category", leaf).unwrap();

    assert_eq!(deleted.id, leaf);
    assert_eq!(category_names(&mut registry), vec!["Transporte"]);
}

#[test]
fn test_delete_missing_node_is_not_found() {
    let mut registry: Registry = setup_registry();

    let result: Result<ActionSuccess, ApiError> =
        delete_node(&mut registry.persistence, &admin_gate(), "category", 999);

    assert!(matches!(result, Err(ApiError::ResourceNotFound { .. })));
}

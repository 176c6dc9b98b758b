// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Item and unit measure tests.

use crate::{
    ActionSuccess, ApiError, CreateUnitMeasureRequest, ItemInfo, ItemRequest, ListItemsRequest,
    ListItemsResponse, RenameRequest, SaveItemResponse, UnitMeasureInfo, create_incident,
    create_item, create_unit_measure, delete_item, delete_unit_measure, get_incident, get_item,
    list_items, list_unit_measures, rename_unit_measure, update_item,
};

use super::helpers::{
    Registry, advanced_gate, incident_request, item_request, line, setup_registry, simple_gate,
};

#[test]
fn test_item_round_trip() {
    let mut registry: Registry = setup_registry();

    let item: ItemInfo =
        get_item(&mut registry.persistence, &simple_gate(), registry.item).unwrap();

    assert_eq!(item.product_name, "Pasaje");
    assert_eq!(item.variable_id, registry.variable);
    assert_eq!(item.category_id, registry.category);
    assert_eq!(item.subcategory_id, Some(registry.subcategory));
    let mut expected: Vec<i64> = vec![registry.unit, registry.hour];
    expected.sort_unstable();
    assert_eq!(item.unit_measure_ids, expected);
}

#[test]
fn test_item_requires_unit_measures() {
    let mut registry: Registry = setup_registry();

    let result: Result<SaveItemResponse, ApiError> = create_item(
        &mut registry.persistence,
        &advanced_gate(),
        item_request("Boleto", registry.variable, registry.category, None, Vec::new()),
    );

    assert!(matches!(
        result,
        Err(ApiError::MissingField { ref field, .. }) if field == "unitMeasures"
    ));
}

#[test]
fn test_item_requires_product_name() {
    let mut registry: Registry = setup_registry();
    let request: ItemRequest = ItemRequest {
        product_name: None,
        ..item_request("", registry.variable, registry.category, None, vec![registry.unit])
    };

    let result: Result<SaveItemResponse, ApiError> =
        create_item(&mut registry.persistence, &advanced_gate(), request);

    assert!(matches!(
        result,
        Err(ApiError::MissingField { ref field, .. }) if field == "productName"
    ));
}

#[test]
fn test_duplicate_item_on_same_path_is_rejected() {
    let mut registry: Registry = setup_registry();

    let result: Result<SaveItemResponse, ApiError> = create_item(
        &mut registry.persistence,
        &advanced_gate(),
        item_request(
            "PASAJE",
            registry.variable,
            registry.category,
            Some(registry.subcategory),
            vec![registry.unit],
        ),
    );

    match result {
        Err(err @ ApiError::DuplicateItem { .. }) => {
            assert_eq!(err.field(), Some("productName"));
        }
        other => panic!("Expected DuplicateItem, got {other:?}"),
    }
}

#[test]
fn test_same_item_name_on_shorter_path_is_allowed() {
    let mut registry: Registry = setup_registry();

    let result: Result<SaveItemResponse, ApiError> = create_item(
        &mut registry.persistence,
        &advanced_gate(),
        item_request(
            "Pasaje",
            registry.variable,
            registry.category,
            None,
            vec![registry.unit],
        ),
    );

    assert!(result.is_ok());
}

#[test]
fn test_item_with_inconsistent_path_is_rejected() {
    let mut registry: Registry = setup_registry();

    let result: Result<SaveItemResponse, ApiError> = create_item(
        &mut registry.persistence,
        &advanced_gate(),
        item_request(
            "Cable",
            registry.variable,
            registry.other_category,
            None,
            vec![registry.unit],
        ),
    );

    assert!(matches!(
        result,
        Err(ApiError::InconsistentPath { ref field, .. }) if field == "category"
    ));
}

#[test]
fn test_update_item_warns_about_used_unit() {
    let mut registry: Registry = setup_registry();
    let incident = incident_request(&registry, vec![line(None, registry.item, 3.0, registry.hour)]);
    let incident_id: i64 = create_incident(&mut registry.persistence, &simple_gate(), &incident)
        .unwrap()
        .incident_id;

    let saved: SaveItemResponse = update_item(
        &mut registry.persistence,
        &advanced_gate(),
        registry.item,
        item_request(
            "Pasaje",
            registry.variable,
            registry.category,
            Some(registry.subcategory),
            vec![registry.unit],
        ),
    )
    .unwrap();

    assert_eq!(saved.warnings.len(), 1);
    assert_eq!(saved.warnings[0].unit_measure_id, registry.hour);
    assert_eq!(saved.warnings[0].line_item_count, 1);

    // Stored line entries keep the unit they were recorded in.
    let stored = get_incident(&mut registry.persistence, &simple_gate(), incident_id).unwrap();
    assert_eq!(stored.items[0].unit_measure_id, registry.hour);
}

#[test]
fn test_update_item_without_usage_has_no_warnings() {
    let mut registry: Registry = setup_registry();

    let saved: SaveItemResponse = update_item(
        &mut registry.persistence,
        &advanced_gate(),
        registry.item,
        item_request(
            "Pasaje urbano",
            registry.variable,
            registry.category,
            Some(registry.subcategory),
            vec![registry.liter],
        ),
    )
    .unwrap();

    assert!(saved.warnings.is_empty());
    let item: ItemInfo =
        get_item(&mut registry.persistence, &simple_gate(), registry.item).unwrap();
    assert_eq!(item.product_name, "Pasaje urbano");
    assert_eq!(item.unit_measure_ids, vec![registry.liter]);
}

#[test]
fn test_update_missing_item_is_not_found() {
    let mut registry: Registry = setup_registry();

    let result: Result<SaveItemResponse, ApiError> = update_item(
        &mut registry.persistence,
        &advanced_gate(),
        4040,
        item_request("Pasaje", registry.variable, registry.category, None, vec![registry.unit]),
    );

    assert!(matches!(result, Err(ApiError::ResourceNotFound { .. })));
}

#[test]
fn test_delete_item_used_by_incident_is_refused() {
    let mut registry: Registry = setup_registry();
    let incident = incident_request(&registry, vec![line(None, registry.item, 1.0, registry.unit)]);
    create_incident(&mut registry.persistence, &simple_gate(), &incident).unwrap();

    let result: Result<ActionSuccess, ApiError> =
        delete_item(&mut registry.persistence, &advanced_gate(), registry.item);

    assert!(matches!(result, Err(ApiError::ReferentialIntegrity { .. })));
    assert!(get_item(&mut registry.persistence, &simple_gate(), registry.item).is_ok());
}

#[test]
fn test_delete_unused_item() {
    let mut registry: Registry = setup_registry();

    delete_item(&mut registry.persistence, &advanced_gate(), registry.item).unwrap();

    let result: Result<ItemInfo, ApiError> =
        get_item(&mut registry.persistence, &simple_gate(), registry.item);
    assert!(matches!(result, Err(ApiError::ResourceNotFound { .. })));
}

#[test]
fn test_list_items_by_partial_path() {
    let mut registry: Registry = setup_registry();
    create_item(
        &mut registry.persistence,
        &advanced_gate(),
        item_request(
            "Bombillo",
            registry.other_variable,
            registry.other_category,
            None,
            vec![registry.unit],
        ),
    )
    .unwrap();

    let everything: ListItemsResponse = list_items(
        &mut registry.persistence,
        &simple_gate(),
        &ListItemsRequest::default(),
    )
    .unwrap();
    let names: Vec<&str> = everything
        .items
        .iter()
        .map(|item| item.product_name.as_str())
        .collect();
    assert_eq!(names, vec!["Bombillo", "Pasaje"]);

    let on_path: ListItemsResponse = list_items(
        &mut registry.persistence,
        &simple_gate(),
        &ListItemsRequest {
            variable_id: Some(registry.variable),
            category_id: Some(registry.category),
            ..ListItemsRequest::default()
        },
    )
    .unwrap();
    assert_eq!(on_path.items.len(), 1);
    assert_eq!(on_path.items[0].id, registry.item);
}

#[test]
fn test_unit_measure_lifecycle() {
    let mut registry: Registry = setup_registry();

    let created: ActionSuccess = create_unit_measure(
        &mut registry.persistence,
        &advanced_gate(),
        &CreateUnitMeasureRequest {
            name: String::from("Metro"),
        },
    )
    .unwrap();
    rename_unit_measure(
        &mut registry.persistence,
        &advanced_gate(),
        created.id,
        &RenameRequest {
            name: String::from("Kilometro"),
        },
    )
    .unwrap();

    let units: Vec<UnitMeasureInfo> =
        list_unit_measures(&mut registry.persistence, &simple_gate()).unwrap();
    let names: Vec<&str> = units.iter().map(|unit| unit.name.as_str()).collect();
    assert_eq!(names, vec!["Hora", "Kilometro", "Litro", "Unidad"]);

    delete_unit_measure(&mut registry.persistence, &advanced_gate(), created.id).unwrap();
    let units: Vec<UnitMeasureInfo> =
        list_unit_measures(&mut registry.persistence, &simple_gate()).unwrap();
    assert_eq!(units.len(), 3);
}

#[test]
fn test_duplicate_unit_measure_name_is_rejected() {
    let mut registry: Registry = setup_registry();

    let result: Result<ActionSuccess, ApiError> = create_unit_measure(
        &mut registry.persistence,
        &advanced_gate(),
        &CreateUnitMeasureRequest {
            name: String::from(" litro "),
        },
    );

    assert!(matches!(result, Err(ApiError::DuplicateName { .. })));
}

#[test]
fn test_delete_unit_measure_permitted_by_item_is_refused() {
    let mut registry: Registry = setup_registry();

    let result: Result<ActionSuccess, ApiError> =
        delete_unit_measure(&mut registry.persistence, &advanced_gate(), registry.unit);

    assert!(matches!(result, Err(ApiError::ReferentialIntegrity { .. })));
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::tests::fixtures::{
    ASPHALT, CEMENT, GAUZE, HEALTH, HOSPITALS, INFRASTRUCTURE, KG, LITER, PAINT, PAVING, ROADS,
    SIGNAGE, UNIT, create_test_catalog, create_test_taxonomy,
};
use crate::{
    DomainError, EntityKind, Item, ItemCatalog, ItemDraft, Level, PartialPath, Taxonomy,
    UnitMeasureWarning, unit_measure_warnings, validate_item,
};
use std::collections::{BTreeMap, BTreeSet};

fn valid_draft() -> ItemDraft {
    ItemDraft {
        product_name: Some(String::from("Gravel")),
        variable_id: Some(INFRASTRUCTURE),
        category_id: Some(ROADS),
        subcategory_id: Some(PAVING),
        second_subcategory_id: Some(ASPHALT),
        unit_measure_ids: vec![KG, KG, UNIT],
    }
}

#[test]
fn test_validate_item_accepts_valid_draft() {
    let taxonomy: Taxonomy = create_test_taxonomy();
    let catalog: ItemCatalog = create_test_catalog();

    let item: Item = validate_item(&taxonomy, &catalog, &valid_draft(), None).unwrap();

    assert_eq!(item.item_id, None);
    assert_eq!(item.product_name, "Gravel");
    assert_eq!(item.path.second_subcategory_id, Some(ASPHALT));
    assert_eq!(item.unit_measure_ids, BTreeSet::from([KG, UNIT]));
}

#[test]
fn test_validate_item_requires_product_name() {
    let taxonomy: Taxonomy = create_test_taxonomy();
    let catalog: ItemCatalog = create_test_catalog();
    let mut draft: ItemDraft = valid_draft();
    draft.product_name = Some(String::from("   "));

    assert_eq!(
        validate_item(&taxonomy, &catalog, &draft, None),
        Err(DomainError::MissingField {
            field: "productName"
        })
    );
}

#[test]
fn test_validate_item_requires_unit_measures() {
    let taxonomy: Taxonomy = create_test_taxonomy();
    let catalog: ItemCatalog = create_test_catalog();
    let mut draft: ItemDraft = valid_draft();
    draft.unit_measure_ids.clear();

    assert_eq!(
        validate_item(&taxonomy, &catalog, &draft, None),
        Err(DomainError::MissingField {
            field: "unitMeasures"
        })
    );
}

#[test]
fn test_validate_item_rejects_unknown_unit_measure() {
    let taxonomy: Taxonomy = create_test_taxonomy();
    let catalog: ItemCatalog = create_test_catalog();
    let mut draft: ItemDraft = valid_draft();
    draft.unit_measure_ids = vec![KG, 77];

    assert_eq!(
        validate_item(&taxonomy, &catalog, &draft, None),
        Err(DomainError::NotFound {
            entity: EntityKind::UnitMeasure,
            id: 77
        })
    );
}

#[test]
fn test_validate_item_rejects_inconsistent_path() {
    let taxonomy: Taxonomy = create_test_taxonomy();
    let catalog: ItemCatalog = create_test_catalog();
    let mut draft: ItemDraft = valid_draft();
    draft.category_id = Some(HOSPITALS);

    assert_eq!(
        validate_item(&taxonomy, &catalog, &draft, None),
        Err(DomainError::InconsistentPath {
            level: Level::Category
        })
    );
}

#[test]
fn test_validate_item_rejects_duplicate_on_same_path() {
    let taxonomy: Taxonomy = create_test_taxonomy();
    let catalog: ItemCatalog = create_test_catalog();
    let draft: ItemDraft = ItemDraft {
        product_name: Some(String::from("cement")),
        variable_id: Some(INFRASTRUCTURE),
        category_id: Some(ROADS),
        subcategory_id: Some(PAVING),
        second_subcategory_id: None,
        unit_measure_ids: vec![KG],
    };

    assert_eq!(
        validate_item(&taxonomy, &catalog, &draft, None),
        Err(DomainError::DuplicateItem {
            product_name: String::from("cement")
        })
    );
    // Updating the item itself keeps its own name.
    assert!(validate_item(&taxonomy, &catalog, &draft, Some(CEMENT)).is_ok());
}

#[test]
fn test_same_product_name_on_other_path_is_allowed() {
    let taxonomy: Taxonomy = create_test_taxonomy();
    let catalog: ItemCatalog = create_test_catalog();
    let draft: ItemDraft = ItemDraft {
        product_name: Some(String::from("Cement")),
        variable_id: Some(HEALTH),
        category_id: Some(HOSPITALS),
        subcategory_id: None,
        second_subcategory_id: None,
        unit_measure_ids: vec![KG],
    };

    assert!(validate_item(&taxonomy, &catalog, &draft, None).is_ok());
}

#[test]
fn test_validate_item_update_of_unknown_item_fails() {
    let taxonomy: Taxonomy = create_test_taxonomy();
    let catalog: ItemCatalog = create_test_catalog();

    assert_eq!(
        validate_item(&taxonomy, &catalog, &valid_draft(), Some(404)),
        Err(DomainError::NotFound {
            entity: EntityKind::Item,
            id: 404
        })
    );
}

#[test]
fn test_unit_measure_warnings_report_removed_units_still_in_use() {
    let catalog: ItemCatalog = create_test_catalog();
    let previous: Item = catalog.item(CEMENT).unwrap().clone();
    let mut updated: Item = previous.clone();
    updated.unit_measure_ids = BTreeSet::from([LITER]);
    let usage: BTreeMap<(i64, i64), usize> = BTreeMap::from([((CEMENT, KG), 3), ((PAINT, LITER), 9)]);

    let warnings: Vec<UnitMeasureWarning> = unit_measure_warnings(&previous, &updated, &usage);

    assert_eq!(
        warnings,
        vec![UnitMeasureWarning {
            item_id: CEMENT,
            unit_measure_id: KG,
            line_item_count: 3,
        }]
    );
}

#[test]
fn test_catalog_lookups() {
    let catalog: ItemCatalog = create_test_catalog();

    assert!(catalog.permits(CEMENT, KG));
    assert!(!catalog.permits(CEMENT, LITER));
    assert!(!catalog.permits(404, KG));
    assert_eq!(catalog.items_using_unit(UNIT), 2);
    assert_eq!(catalog.items_on_node(Level::Category, ROADS), 2);
    assert_eq!(catalog.items_on_node(Level::Subcategory, SIGNAGE), 1);

    let units: Vec<&str> = catalog
        .unit_measures()
        .iter()
        .map(|unit| unit.name.as_str())
        .collect();
    assert_eq!(units, vec!["kg", "liter", "unit"]);
}

#[test]
fn test_items_matching_partial_path() {
    let catalog: ItemCatalog = create_test_catalog();

    let all: Vec<Option<i64>> = catalog
        .items_matching(&PartialPath::new())
        .iter()
        .map(|item| item.item_id)
        .collect();
    assert_eq!(all, vec![Some(CEMENT), Some(GAUZE), Some(PAINT)]);

    let filter: PartialPath = PartialPath::new()
        .with(Level::Variable, INFRASTRUCTURE)
        .with(Level::Subcategory, SIGNAGE);
    let matching: Vec<Option<i64>> = catalog
        .items_matching(&filter)
        .iter()
        .map(|item| item.item_id)
        .collect();
    assert_eq!(matching, vec![Some(PAINT)]);
}

#[test]
fn test_unit_name_uniqueness() {
    let catalog: ItemCatalog = create_test_catalog();

    assert_eq!(
        catalog.ensure_unit_name_available(" KG ", None),
        Err(DomainError::DuplicateName {
            entity: EntityKind::UnitMeasure,
            name: String::from("KG"),
        })
    );
    assert!(catalog.ensure_unit_name_available("kg", Some(KG)).is_ok());
    assert!(catalog.ensure_unit_name_available("box", None).is_ok());
}

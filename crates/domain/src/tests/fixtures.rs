// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{
    IncidentDraft, Item, ItemCatalog, Level, LineItemDraft, Taxonomy, TaxonomyNode, TaxonomyPath,
    UnitMeasure,
};
use std::collections::BTreeSet;
use time::macros::date;

pub const INFRASTRUCTURE: i64 = 1;
pub const HEALTH: i64 = 2;
pub const ROADS: i64 = 10;
pub const BRIDGES: i64 = 11;
pub const HOSPITALS: i64 = 20;
pub const PAVING: i64 = 100;
pub const SIGNAGE: i64 = 101;
pub const CABLES: i64 = 110;
pub const ASPHALT: i64 = 1000;
pub const CONCRETE: i64 = 1001;

pub const HAVANA: i64 = 1;
pub const MATANZAS: i64 = 2;
pub const PLAYA: i64 = 10;
pub const CENTRO: i64 = 11;
pub const CARDENAS: i64 = 20;

pub const KG: i64 = 1;
pub const LITER: i64 = 2;
pub const UNIT: i64 = 3;

pub const CEMENT: i64 = 1;
pub const PAINT: i64 = 2;
pub const GAUZE: i64 = 3;

fn node(id: i64, name: &str, parent_id: Option<i64>) -> TaxonomyNode {
    TaxonomyNode::new(id, String::from(name), parent_id)
}

pub fn create_test_taxonomy() -> Taxonomy {
    let mut taxonomy: Taxonomy = Taxonomy::new();
    taxonomy
        .insert(Level::Variable, node(INFRASTRUCTURE, "Infrastructure", None))
        .unwrap();
    taxonomy
        .insert(Level::Variable, node(HEALTH, "Health", None))
        .unwrap();
    taxonomy
        .insert(Level::Category, node(ROADS, "Roads", Some(INFRASTRUCTURE)))
        .unwrap();
    taxonomy
        .insert(Level::Category, node(BRIDGES, "Bridges", Some(INFRASTRUCTURE)))
        .unwrap();
    taxonomy
        .insert(Level::Category, node(HOSPITALS, "Hospitals", Some(HEALTH)))
        .unwrap();
    taxonomy
        .insert(Level::Subcategory, node(PAVING, "Paving", Some(ROADS)))
        .unwrap();
    taxonomy
        .insert(Level::Subcategory, node(SIGNAGE, "Signage", Some(ROADS)))
        .unwrap();
    taxonomy
        .insert(Level::Subcategory, node(CABLES, "Cables", Some(BRIDGES)))
        .unwrap();
    taxonomy
        .insert(Level::SecondSubcategory, node(ASPHALT, "Asphalt", Some(PAVING)))
        .unwrap();
    taxonomy
        .insert(
            Level::SecondSubcategory,
            node(CONCRETE, "Concrete", Some(PAVING)),
        )
        .unwrap();
    taxonomy
        .insert(Level::Province, node(HAVANA, "Havana", None))
        .unwrap();
    taxonomy
        .insert(Level::Province, node(MATANZAS, "Matanzas", None))
        .unwrap();
    taxonomy
        .insert(Level::Municipality, node(PLAYA, "Playa", Some(HAVANA)))
        .unwrap();
    taxonomy
        .insert(Level::Municipality, node(CENTRO, "Centro", Some(HAVANA)))
        .unwrap();
    taxonomy
        .insert(
            Level::Municipality,
            node(CARDENAS, "Cardenas", Some(MATANZAS)),
        )
        .unwrap();
    taxonomy
}

pub fn create_test_catalog() -> ItemCatalog {
    let mut catalog: ItemCatalog = ItemCatalog::new();
    for (id, name) in [(KG, "kg"), (LITER, "liter"), (UNIT, "unit")] {
        catalog.insert_unit_measure(UnitMeasure {
            id,
            name: String::from(name),
        });
    }
    catalog.insert_item(
        CEMENT,
        Item {
            item_id: None,
            product_name: String::from("Cement"),
            path: TaxonomyPath {
                variable_id: INFRASTRUCTURE,
                category_id: ROADS,
                subcategory_id: Some(PAVING),
                second_subcategory_id: None,
            },
            unit_measure_ids: BTreeSet::from([KG, UNIT]),
        },
    );
    catalog.insert_item(
        PAINT,
        Item {
            item_id: None,
            product_name: String::from("Paint"),
            path: TaxonomyPath {
                variable_id: INFRASTRUCTURE,
                category_id: ROADS,
                subcategory_id: Some(SIGNAGE),
                second_subcategory_id: None,
            },
            unit_measure_ids: BTreeSet::from([LITER]),
        },
    );
    catalog.insert_item(
        GAUZE,
        Item {
            item_id: None,
            product_name: String::from("Gauze"),
            path: TaxonomyPath {
                variable_id: HEALTH,
                category_id: HOSPITALS,
                subcategory_id: None,
                second_subcategory_id: None,
            },
            unit_measure_ids: BTreeSet::from([UNIT]),
        },
    );
    catalog
}

pub fn create_test_draft() -> IncidentDraft {
    IncidentDraft {
        date: Some(date!(2024 - 03 - 15)),
        title: Some(String::from("Pothole repair")),
        description: Some(String::from("Emergency repair on main avenue")),
        province_id: Some(HAVANA),
        municipality_id: Some(PLAYA),
        variable_id: Some(INFRASTRUCTURE),
        category_id: Some(ROADS),
        subcategory_id: Some(PAVING),
        second_subcategory_id: Some(ASPHALT),
        number_of_people: 4,
        amount: Some(1250.5),
        items: vec![LineItemDraft {
            incident_item_id: None,
            item_id: Some(CEMENT),
            quantity_used: 12.0,
            unit_measure_id: Some(KG),
        }],
    }
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::RegistryContext;
use incident_registry_domain::{
    GeographyPath, IncidentDraft, IncidentItem, IncidentRecord, Item, ItemCatalog, Level,
    LineItemDraft, Taxonomy, TaxonomyNode, TaxonomyPath, UnitMeasure,
};
use std::collections::{BTreeMap, BTreeSet};
use time::macros::date;

pub const WATER: i64 = 1;
pub const ENERGY: i64 = 2;
pub const PIPES: i64 = 10;
pub const GRID: i64 = 20;
pub const LEAKS: i64 = 100;
pub const MAIN_LINE: i64 = 1000;
pub const HAVANA: i64 = 1;
pub const PLAYA: i64 = 10;

pub const KG: i64 = 1;
pub const METER: i64 = 2;
pub const LITER: i64 = 3;

pub const CLAMP: i64 = 1;
pub const TUBE: i64 = 2;
pub const SEALANT: i64 = 3;
pub const CABLE: i64 = 4;

fn add(taxonomy: &mut Taxonomy, level: Level, id: i64, name: &str, parent_id: Option<i64>) {
    taxonomy
        .insert(level, TaxonomyNode::new(id, String::from(name), parent_id))
        .unwrap();
}

fn item(name: &str, path: TaxonomyPath, units: &[i64]) -> Item {
    Item {
        item_id: None,
        product_name: String::from(name),
        path,
        unit_measure_ids: units.iter().copied().collect::<BTreeSet<i64>>(),
    }
}

pub const fn leak_path() -> TaxonomyPath {
    TaxonomyPath {
        variable_id: WATER,
        category_id: PIPES,
        subcategory_id: Some(LEAKS),
        second_subcategory_id: None,
    }
}

pub fn create_test_context() -> RegistryContext {
    let mut taxonomy: Taxonomy = Taxonomy::new();
    add(&mut taxonomy, Level::Variable, WATER, "Water", None);
    add(&mut taxonomy, Level::Variable, ENERGY, "Energy", None);
    add(&mut taxonomy, Level::Category, PIPES, "Pipes", Some(WATER));
    add(&mut taxonomy, Level::Category, GRID, "Grid", Some(ENERGY));
    add(&mut taxonomy, Level::Subcategory, LEAKS, "Leaks", Some(PIPES));
    add(
        &mut taxonomy,
        Level::SecondSubcategory,
        MAIN_LINE,
        "Main line",
        Some(LEAKS),
    );
    add(&mut taxonomy, Level::Province, HAVANA, "Havana", None);
    add(&mut taxonomy, Level::Municipality, PLAYA, "Playa", Some(HAVANA));

    let mut catalog: ItemCatalog = ItemCatalog::new();
    for (id, name) in [(KG, "kg"), (METER, "meter"), (LITER, "liter")] {
        catalog.insert_unit_measure(UnitMeasure {
            id,
            name: String::from(name),
        });
    }
    catalog.insert_item(CLAMP, item("Clamp", leak_path(), &[KG]));
    catalog.insert_item(TUBE, item("Tube", leak_path(), &[KG, METER]));
    catalog.insert_item(SEALANT, item("Sealant", leak_path(), &[LITER]));
    catalog.insert_item(
        CABLE,
        item(
            "Cable",
            TaxonomyPath {
                variable_id: ENERGY,
                category_id: GRID,
                subcategory_id: None,
                second_subcategory_id: None,
            },
            &[METER],
        ),
    );

    let unit_usage: BTreeMap<(i64, i64), usize> = BTreeMap::from([((TUBE, KG), 2)]);

    RegistryContext::new(taxonomy, catalog, unit_usage)
}

pub fn line(
    incident_item_id: Option<i64>,
    item_id: i64,
    quantity_used: f64,
    unit_measure_id: i64,
) -> LineItemDraft {
    LineItemDraft {
        incident_item_id,
        item_id: Some(item_id),
        quantity_used,
        unit_measure_id: Some(unit_measure_id),
    }
}

pub fn stored(incident_item_id: i64, item_id: i64, quantity_used: f64, unit_measure_id: i64) -> IncidentItem {
    IncidentItem {
        incident_item_id: Some(incident_item_id),
        item_id,
        quantity_used,
        unit_measure_id,
    }
}

pub fn create_test_draft(items: Vec<LineItemDraft>) -> IncidentDraft {
    IncidentDraft {
        date: Some(date!(2025 - 06 - 01)),
        title: Some(String::from("Burst main")),
        description: Some(String::from("Water main burst near the market")),
        province_id: Some(HAVANA),
        municipality_id: Some(PLAYA),
        variable_id: Some(WATER),
        category_id: Some(PIPES),
        subcategory_id: Some(LEAKS),
        second_subcategory_id: Some(MAIN_LINE),
        number_of_people: 30,
        amount: None,
        items,
    }
}

pub fn create_test_record(items: Vec<IncidentItem>) -> IncidentRecord {
    IncidentRecord {
        incident_id: 7,
        date: date!(2025 - 06 - 01),
        title: String::from("Burst main"),
        description: String::from("Water main burst near the market"),
        geography: GeographyPath {
            province_id: HAVANA,
            municipality_id: PLAYA,
        },
        taxonomy: TaxonomyPath {
            variable_id: WATER,
            category_id: PIPES,
            subcategory_id: Some(LEAKS),
            second_subcategory_id: Some(MAIN_LINE),
        },
        number_of_people: 30,
        amount: None,
        items,
    }
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod initialization_tests;

use crate::Persistence;
use incident_registry::{ApplyResult, Command, RegistryContext, apply};
use incident_registry_domain::{IncidentDraft, ItemDraft, Level, LineItemDraft};
use time::macros::date;

/// Identifiers of the rows created by [`seed`].
pub struct Seeded {
    pub water: i64,
    pub energy: i64,
    pub pipes: i64,
    pub grid: i64,
    pub leaks: i64,
    pub havana: i64,
    pub playa: i64,
    pub kg: i64,
    pub meter: i64,
    pub clamp: i64,
    pub tube: i64,
}

/// Validates a command against the stored reference data and executes it.
pub fn execute(persistence: &mut Persistence, command: Command) -> i64 {
    let context: RegistryContext = persistence.load_context().unwrap();
    let result: ApplyResult = apply(&context, command).unwrap();
    persistence.apply_mutation(&result.mutation).unwrap()
}

pub fn create_node(
    persistence: &mut Persistence,
    level: Level,
    name: &str,
    parent_id: Option<i64>,
) -> i64 {
    execute(
        persistence,
        Command::CreateNode {
            level,
            name: String::from(name),
            parent_id,
        },
    )
}

pub fn item_draft(name: &str, path: (i64, i64, Option<i64>), units: &[i64]) -> ItemDraft {
    ItemDraft {
        product_name: Some(String::from(name)),
        variable_id: Some(path.0),
        category_id: Some(path.1),
        subcategory_id: path.2,
        second_subcategory_id: None,
        unit_measure_ids: units.to_vec(),
    }
}

pub fn seed(persistence: &mut Persistence) -> Seeded {
    let water: i64 = create_node(persistence, Level::Variable, "Water", None);
    let energy: i64 = create_node(persistence, Level::Variable, "Energy", None);
    let pipes: i64 = create_node(persistence, Level::Category, "Pipes", Some(water));
    let grid: i64 = create_node(persistence, Level::Category, "Grid", Some(energy));
    let leaks: i64 = create_node(persistence, Level::Subcategory, "Leaks", Some(pipes));
    let havana: i64 = create_node(persistence, Level::Province, "Havana", None);
    let playa: i64 = create_node(persistence, Level::Municipality, "Playa", Some(havana));
    let kg: i64 = execute(
        persistence,
        Command::CreateUnitMeasure {
            name: String::from("kg"),
        },
    );
    let meter: i64 = execute(
        persistence,
        Command::CreateUnitMeasure {
            name: String::from("meter"),
        },
    );
    let clamp: i64 = execute(
        persistence,
        Command::CreateItem {
            draft: item_draft("Clamp", (water, pipes, None), &[kg]),
        },
    );
    let tube: i64 = execute(
        persistence,
        Command::CreateItem {
            draft: item_draft("Tube", (water, pipes, Some(leaks)), &[kg, meter]),
        },
    );

    Seeded {
        water,
        energy,
        pipes,
        grid,
        leaks,
        havana,
        playa,
        kg,
        meter,
        clamp,
        tube,
    }
}

pub const fn line(
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

pub fn incident_draft(seeded: &Seeded, title: &str, items: Vec<LineItemDraft>) -> IncidentDraft {
    IncidentDraft {
        date: Some(date!(2024 - 03 - 15)),
        title: Some(String::from(title)),
        description: Some(String::from("Burst main near the market")),
        province_id: Some(seeded.havana),
        municipality_id: Some(seeded.playa),
        variable_id: Some(seeded.water),
        category_id: Some(seeded.pipes),
        subcategory_id: Some(seeded.leaks),
        second_subcategory_id: None,
        number_of_people: 3,
        amount: Some(120.5),
        items,
    }
}

pub fn create_test_persistence() -> (Persistence, Seeded) {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let seeded: Seeded = seed(&mut persistence);
    (persistence, seeded)
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use incident_registry_domain::UserRole;
use incident_registry_persistence::Persistence;

use crate::{
    ActionSuccess, AuthError, CreateNodeRequest, CreateUnitMeasureRequest, IncidentRequest,
    ItemRequest, LineItemRequest, ResolvedGate, SaveItemResponse, Session, create_item,
    create_node, create_unit_measure,
};

pub const VALID_PASSWORD: &str = "Harbor-42x";

/// Reference data shared by most tests.
///
/// Taxonomy: Reclamos Sociales > Transporte > Retraso, plus
/// Servicios > Electricidad. Geography: La Habana > Centro Habana and
/// Matanzas > Cardenas. The item "Pasaje" sits on the full Retraso path
/// and may be recorded in "Unidad" or "Hora" but not "Litro".
pub struct Registry {
    pub persistence: Persistence,
    pub variable: i64,
    pub category: i64,
    pub subcategory: i64,
    pub other_variable: i64,
    pub other_category: i64,
    pub province: i64,
    pub municipality: i64,
    pub other_province: i64,
    pub other_municipality: i64,
    pub unit: i64,
    pub hour: i64,
    pub liter: i64,
    pub item: i64,
}

pub fn gate(user_id: i64, name: &str, role: UserRole) -> ResolvedGate {
    ResolvedGate::authenticated(Session {
        user_id,
        name: name.to_string(),
        role,
    })
}

pub fn admin_gate() -> ResolvedGate {
    gate(1, "admin", UserRole::Admin)
}

pub fn advanced_gate() -> ResolvedGate {
    gate(2, "curator", UserRole::Advanced)
}

pub fn simple_gate() -> ResolvedGate {
    gate(3, "clerk", UserRole::Simple)
}

pub fn anonymous_gate() -> ResolvedGate {
    ResolvedGate::rejected(AuthError::AuthenticationFailed {
        reason: String::from("No user identity supplied"),
    })
}

pub fn setup_test_persistence() -> Persistence {
    Persistence::new_in_memory().expect("Failed to create in-memory persistence")
}

pub fn add_node(
    persistence: &mut Persistence,
    level: &str,
    name: &str,
    parent_id: Option<i64>,
) -> i64 {
    let result: ActionSuccess = create_node(
        persistence,
        &admin_gate(),
        &CreateNodeRequest {
            level: level.to_string(),
            name: name.to_string(),
            parent_id,
        },
    )
    .expect("Failed to create node");
    result.id
}

pub fn add_unit(persistence: &mut Persistence, name: &str) -> i64 {
    let result: ActionSuccess = create_unit_measure(
        persistence,
        &admin_gate(),
        &CreateUnitMeasureRequest {
            name: name.to_string(),
        },
    )
    .expect("Failed to create unit measure");
    result.id
}

pub fn item_request(
    name: &str,
    variable_id: i64,
    category_id: i64,
    subcategory_id: Option<i64>,
    unit_measure_ids: Vec<i64>,
) -> ItemRequest {
    ItemRequest {
        product_name: Some(name.to_string()),
        variable_id: Some(variable_id),
        category_id: Some(category_id),
        subcategory_id,
        second_subcategory_id: None,
        unit_measure_ids,
    }
}

pub fn setup_registry() -> Registry {
    let mut persistence: Persistence = setup_test_persistence();

    let variable: i64 = add_node(&mut persistence, "variable", "Reclamos Sociales", None);
    let category: i64 = add_node(&mut persistence, "category", "Transporte", Some(variable));
    let subcategory: i64 = add_node(&mut persistence, "subcategory", "Retraso", Some(category));
    let other_variable: i64 = add_node(&mut persistence, "variable", "Servicios", None);
    let other_category: i64 = add_node(
        &mut persistence,
        "category",
        "Electricidad",
        Some(other_variable),
    );

    let province: i64 = add_node(&mut persistence, "province", "La Habana", None);
    let municipality: i64 = add_node(
        &mut persistence,
        "municipality",
        "Centro Habana",
        Some(province),
    );
    let other_province: i64 = add_node(&mut persistence, "province", "Matanzas", None);
    let other_municipality: i64 = add_node(
        &mut persistence,
        "municipality",
        "Cardenas",
        Some(other_province),
    );

    let unit: i64 = add_unit(&mut persistence, "Unidad");
    let hour: i64 = add_unit(&mut persistence, "Hora");
    let liter: i64 = add_unit(&mut persistence, "Litro");

    let saved: SaveItemResponse = create_item(
        &mut persistence,
        &admin_gate(),
        item_request(
            "Pasaje",
            variable,
            category,
            Some(subcategory),
            vec![unit, hour],
        ),
    )
    .expect("Failed to create item");

    Registry {
        persistence,
        variable,
        category,
        subcategory,
        other_variable,
        other_category,
        province,
        municipality,
        other_province,
        other_municipality,
        unit,
        hour,
        liter,
        item: saved.item_id,
    }
}

pub const fn line(id: Option<i64>, item_id: i64, quantity: f64, unit_id: i64) -> LineItemRequest {
    LineItemRequest {
        id,
        item_id: Some(item_id),
        quantity_used: Some(quantity),
        unit_measure_id: Some(unit_id),
    }
}

/// A complete, valid incident on the Retraso path in Centro Habana.
pub fn incident_request(registry: &Registry, items: Vec<LineItemRequest>) -> IncidentRequest {
    IncidentRequest {
        date: Some(String::from("2024-05-02")),
        title: Some(String::from("Bus delayed")),
        description: Some(String::from("Route 27 ran two hours late")),
        province_id: Some(registry.province),
        municipality_id: Some(registry.municipality),
        variable_id: Some(registry.variable),
        category_id: Some(registry.category),
        subcategory_id: Some(registry.subcategory),
        second_subcategory_id: None,
        number_of_people: Some(5),
        amount: None,
        items,
    }
}

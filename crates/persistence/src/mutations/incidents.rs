// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Incident and line entry mutations.
//!
//! These functions do not open transactions of their own. Callers run them
//! inside one, so a failed line entry write discards the incident write.

use diesel::SqliteConnection;
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::Text;
use incident_registry::{LineItemChange, LineItemDiff};
use incident_registry_domain::{EntityKind, Incident, IncidentItem};
use tracing::{debug, info};

use crate::backend::sqlite::last_insert_rowid;
use crate::diesel_schema::{incident_items, incidents};
use crate::error::{PersistenceError, expect_rows};
use crate::queries::incidents::format_date;

fn insert_line(
    conn: &mut SqliteConnection,
    incident_id: i64,
    position: i64,
    line: &IncidentItem,
) -> Result<(), PersistenceError> {
    diesel::insert_into(incident_items::table)
        .values((
            incident_items::incident_id.eq(incident_id),
            incident_items::item_id.eq(line.item_id),
            incident_items::quantity_used.eq(line.quantity_used),
            incident_items::unit_measure_id.eq(line.unit_measure_id),
            incident_items::position.eq(position),
        ))
        .execute(conn)?;
    Ok(())
}

/// Inserts an incident and its line entries in submission order.
///
/// # Arguments
///
/// * `conn` - The database connection, inside a transaction
/// * `incident` - The validated incident
///
/// # Errors
///
/// Returns an error if any insert violates a constraint.
pub fn insert_incident(
    conn: &mut SqliteConnection,
    incident: &Incident,
) -> Result<i64, PersistenceError> {
    let geography = incident.geography();
    let taxonomy = incident.taxonomy();
    diesel::insert_into(incidents::table)
        .values((
            incidents::incident_date.eq(format_date(incident.date())?),
            incidents::title.eq(incident.title()),
            incidents::description.eq(incident.description()),
            incidents::province_id.eq(geography.province_id),
            incidents::municipality_id.eq(geography.municipality_id),
            incidents::variable_id.eq(taxonomy.variable_id),
            incidents::category_id.eq(taxonomy.category_id),
            incidents::subcategory_id.eq(taxonomy.subcategory_id),
            incidents::second_subcategory_id.eq(taxonomy.second_subcategory_id),
            incidents::number_of_people.eq(i64::from(incident.number_of_people())),
            incidents::amount.eq(incident.amount()),
        ))
        .execute(conn)?;
    let incident_id: i64 = last_insert_rowid(conn)?;

    for (position, line) in (0_i64..).zip(incident.items()) {
        insert_line(conn, incident_id, position, line)?;
    }

    info!(
        incident_id,
        items = incident.items().len(),
        "Created incident"
    );
    Ok(incident_id)
}

/// Updates an incident row and applies a line entry diff.
///
/// Deletes run first, then updates, then inserts. Every line entry write is
/// scoped to `incident_id`, so an identifier owned by another incident
/// matches nothing.
///
/// # Errors
///
/// Returns `NotFound` if the incident or an updated line entry does not
/// exist, or an error if a write violates a constraint.
pub fn update_incident(
    conn: &mut SqliteConnection,
    incident_id: i64,
    incident: &Incident,
    diff: &LineItemDiff,
) -> Result<(), PersistenceError> {
    let geography = incident.geography();
    let taxonomy = incident.taxonomy();
    let rows: usize = diesel::update(incidents::table.filter(incidents::id.eq(incident_id)))
        .set((
            incidents::incident_date.eq(format_date(incident.date())?),
            incidents::title.eq(incident.title()),
            incidents::description.eq(incident.description()),
            incidents::province_id.eq(geography.province_id),
            incidents::municipality_id.eq(geography.municipality_id),
            incidents::variable_id.eq(taxonomy.variable_id),
            incidents::category_id.eq(taxonomy.category_id),
            incidents::subcategory_id.eq(taxonomy.subcategory_id),
            incidents::second_subcategory_id.eq(taxonomy.second_subcategory_id),
            incidents::number_of_people.eq(i64::from(incident.number_of_people())),
            incidents::amount.eq(incident.amount()),
            incidents::updated_at.eq(sql::<Text>("CURRENT_TIMESTAMP")),
        ))
        .execute(conn)?;
    expect_rows(rows, EntityKind::Incident, incident_id)?;

    if !diff.delete.is_empty() {
        let removed: usize = diesel::delete(
            incident_items::table
                .filter(incident_items::incident_id.eq(incident_id))
                .filter(incident_items::id.eq_any(&diff.delete)),
        )
        .execute(conn)?;
        debug!(incident_id, removed, "Deleted line entries");
    }

    for change in &diff.update {
        update_line(conn, incident_id, change)?;
    }

    for change in &diff.insert {
        insert_line(conn, incident_id, change.position, &change.line)?;
    }

    info!(
        incident_id,
        deleted = diff.delete.len(),
        updated = diff.update.len(),
        inserted = diff.insert.len(),
        "Updated incident"
    );
    Ok(())
}

fn update_line(
    conn: &mut SqliteConnection,
    incident_id: i64,
    change: &LineItemChange,
) -> Result<(), PersistenceError> {
    let Some(line_id) = change.line.incident_item_id else {
        return Err(PersistenceError::Other(
            "An updated line entry has no identifier".to_string(),
        ));
    };
    let rows: usize = diesel::update(
        incident_items::table
            .filter(incident_items::id.eq(line_id))
            .filter(incident_items::incident_id.eq(incident_id)),
    )
    .set((
        incident_items::item_id.eq(change.line.item_id),
        incident_items::quantity_used.eq(change.line.quantity_used),
        incident_items::unit_measure_id.eq(change.line.unit_measure_id),
        incident_items::position.eq(change.position),
    ))
    .execute(conn)?;
    expect_rows(rows, EntityKind::IncidentItem, line_id)
}

/// Deletes an incident. Its line entries go with it.
///
/// # Errors
///
/// Returns `NotFound` if the incident does not exist.
pub fn delete_incident(
    conn: &mut SqliteConnection,
    incident_id: i64,
) -> Result<(), PersistenceError> {
    let rows: usize =
        diesel::delete(incidents::table.filter(incidents::id.eq(incident_id))).execute(conn)?;
    expect_rows(rows, EntityKind::Incident, incident_id)?;
    info!(incident_id, "Deleted incident");
    Ok(())
}

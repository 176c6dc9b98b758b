// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Unit measure and item mutations.

use diesel::SqliteConnection;
use diesel::prelude::*;
use incident_registry_domain::{EntityKind, Item};
use tracing::{debug, info};

use crate::backend::sqlite::last_insert_rowid;
use crate::diesel_schema::{item_unit_measures, items, unit_measures};
use crate::error::{PersistenceError, expect_rows};
use crate::queries::catalog::{
    count_items_using_unit, count_line_items_for_item, count_line_items_using_unit,
};

fn referenced(
    entity: EntityKind,
    id: i64,
    referenced_by: EntityKind,
    count: i64,
) -> Result<(), PersistenceError> {
    if count > 0 {
        return Err(PersistenceError::Referenced {
            entity,
            id,
            referenced_by,
            count: usize::try_from(count).unwrap_or(usize::MAX),
        });
    }
    Ok(())
}

/// Inserts a unit measure and returns its identifier.
///
/// # Errors
///
/// Returns an error if the insert violates a constraint.
pub fn insert_unit_measure(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(unit_measures::table)
        .values(unit_measures::name.eq(name))
        .execute(conn)?;
    let id: i64 = last_insert_rowid(conn)?;
    info!(id, name, "Created unit measure");
    Ok(id)
}

/// Renames a unit measure.
///
/// # Errors
///
/// Returns `NotFound` if the unit measure does not exist.
pub fn rename_unit_measure(
    conn: &mut SqliteConnection,
    id: i64,
    name: &str,
) -> Result<(), PersistenceError> {
    let rows: usize = diesel::update(unit_measures::table.filter(unit_measures::id.eq(id)))
        .set(unit_measures::name.eq(name))
        .execute(conn)?;
    expect_rows(rows, EntityKind::UnitMeasure, id)
}

/// Deletes a unit measure no item permits and no line entry records.
///
/// # Errors
///
/// Returns `Referenced` if the unit measure is in use, `NotFound` if it
/// does not exist.
pub fn delete_unit_measure(conn: &mut SqliteConnection, id: i64) -> Result<(), PersistenceError> {
    conn.transaction::<_, PersistenceError, _>(|conn| {
        referenced(
            EntityKind::UnitMeasure,
            id,
            EntityKind::Item,
            count_items_using_unit(conn, id)?,
        )?;
        referenced(
            EntityKind::UnitMeasure,
            id,
            EntityKind::IncidentItem,
            count_line_items_using_unit(conn, id)?,
        )?;
        let rows: usize =
            diesel::delete(unit_measures::table.filter(unit_measures::id.eq(id))).execute(conn)?;
        expect_rows(rows, EntityKind::UnitMeasure, id)
    })?;
    info!(id, "Deleted unit measure");
    Ok(())
}

fn insert_unit_links(
    conn: &mut SqliteConnection,
    item_id: i64,
    item: &Item,
) -> Result<(), PersistenceError> {
    let links: Vec<_> = item
        .unit_measure_ids
        .iter()
        .map(|unit_measure_id| {
            (
                item_unit_measures::item_id.eq(item_id),
                item_unit_measures::unit_measure_id.eq(*unit_measure_id),
            )
        })
        .collect();
    diesel::insert_into(item_unit_measures::table)
        .values(&links)
        .execute(conn)?;
    debug!(item_id, units = links.len(), "Stored permitted unit measures");
    Ok(())
}

/// Inserts an item with its permitted unit measures.
///
/// # Errors
///
/// Returns an error if an insert violates a constraint.
pub fn insert_item(conn: &mut SqliteConnection, item: &Item) -> Result<i64, PersistenceError> {
    diesel::insert_into(items::table)
        .values((
            items::product_name.eq(&item.product_name),
            items::variable_id.eq(item.path.variable_id),
            items::category_id.eq(item.path.category_id),
            items::subcategory_id.eq(item.path.subcategory_id),
            items::second_subcategory_id.eq(item.path.second_subcategory_id),
        ))
        .execute(conn)?;
    let item_id: i64 = last_insert_rowid(conn)?;
    insert_unit_links(conn, item_id, item)?;
    info!(item_id, product_name = %item.product_name, "Created item");
    Ok(item_id)
}

/// Replaces an item's fields and its permitted unit measures.
///
/// Existing line entries keep the unit measure they were recorded in.
///
/// # Errors
///
/// Returns `NotFound` if the item does not exist, or an error if a write
/// violates a constraint.
pub fn update_item(
    conn: &mut SqliteConnection,
    item_id: i64,
    item: &Item,
) -> Result<(), PersistenceError> {
    let rows: usize = diesel::update(items::table.filter(items::id.eq(item_id)))
        .set((
            items::product_name.eq(&item.product_name),
            items::variable_id.eq(item.path.variable_id),
            items::category_id.eq(item.path.category_id),
            items::subcategory_id.eq(item.path.subcategory_id),
            items::second_subcategory_id.eq(item.path.second_subcategory_id),
        ))
        .execute(conn)?;
    expect_rows(rows, EntityKind::Item, item_id)?;

    diesel::delete(item_unit_measures::table.filter(item_unit_measures::item_id.eq(item_id)))
        .execute(conn)?;
    insert_unit_links(conn, item_id, item)?;
    info!(item_id, product_name = %item.product_name, "Updated item");
    Ok(())
}

/// Deletes an item no line entry records.
///
/// Its unit measure links go with it.
///
/// # Errors
///
/// Returns `Referenced` if a line entry records the item, `NotFound` if it
/// does not exist.
pub fn delete_item(conn: &mut SqliteConnection, item_id: i64) -> Result<(), PersistenceError> {
    conn.transaction::<_, PersistenceError, _>(|conn| {
        referenced(
            EntityKind::Item,
            item_id,
            EntityKind::IncidentItem,
            count_line_items_for_item(conn, item_id)?,
        )?;
        let rows: usize =
            diesel::delete(items::table.filter(items::id.eq(item_id))).execute(conn)?;
        expect_rows(rows, EntityKind::Item, item_id)
    })?;
    info!(item_id, "Deleted item");
    Ok(())
}

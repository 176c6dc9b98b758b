// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Item and unit measure queries.

use diesel::SqliteConnection;
use diesel::dsl::count_star;
use diesel::prelude::*;
use incident_registry_domain::{Item, ItemCatalog, TaxonomyPath, UnitMeasure};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::diesel_schema::{incident_items, item_unit_measures, items, unit_measures};
use crate::error::PersistenceError;

/// Diesel Queryable struct for item rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = items)]
struct ItemRow {
    id: i64,
    product_name: String,
    variable_id: i64,
    category_id: i64,
    subcategory_id: Option<i64>,
    second_subcategory_id: Option<i64>,
}

impl ItemRow {
    fn into_item(self, unit_measure_ids: BTreeSet<i64>) -> Item {
        Item {
            item_id: Some(self.id),
            product_name: self.product_name,
            path: TaxonomyPath {
                variable_id: self.variable_id,
                category_id: self.category_id,
                subcategory_id: self.subcategory_id,
                second_subcategory_id: self.second_subcategory_id,
            },
            unit_measure_ids,
        }
    }
}

/// Lists unit measures ordered by name.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_unit_measures(
    conn: &mut SqliteConnection,
) -> Result<Vec<UnitMeasure>, PersistenceError> {
    let rows: Vec<(i64, String)> = unit_measures::table
        .select((unit_measures::id, unit_measures::name))
        .order((unit_measures::name.asc(), unit_measures::id.asc()))
        .load(conn)?;
    Ok(rows
        .into_iter()
        .map(|(id, name)| UnitMeasure { id, name })
        .collect())
}

/// Loads every item with its permitted unit measures.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_items(conn: &mut SqliteConnection) -> Result<Vec<Item>, PersistenceError> {
    let rows: Vec<ItemRow> = items::table
        .select(ItemRow::as_select())
        .order(items::id.asc())
        .load(conn)?;

    let links: Vec<(i64, i64)> = item_unit_measures::table
        .select((
            item_unit_measures::item_id,
            item_unit_measures::unit_measure_id,
        ))
        .load(conn)?;
    let mut units_by_item: BTreeMap<i64, BTreeSet<i64>> = BTreeMap::new();
    for (item_id, unit_measure_id) in links {
        units_by_item
            .entry(item_id)
            .or_default()
            .insert(unit_measure_id);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let units: BTreeSet<i64> = units_by_item.remove(&row.id).unwrap_or_default();
            row.into_item(units)
        })
        .collect())
}

/// Loads one item with its permitted unit measures.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the item is not found.
pub fn get_item(conn: &mut SqliteConnection, item_id: i64) -> Result<Option<Item>, PersistenceError> {
    let Some(row) = items::table
        .filter(items::id.eq(item_id))
        .select(ItemRow::as_select())
        .first::<ItemRow>(conn)
        .optional()?
    else {
        return Ok(None);
    };

    let units: Vec<i64> = item_unit_measures::table
        .filter(item_unit_measures::item_id.eq(item_id))
        .select(item_unit_measures::unit_measure_id)
        .load(conn)?;

    Ok(Some(row.into_item(units.into_iter().collect())))
}

/// Loads the item catalog.
///
/// # Errors
///
/// Returns an error if a database query fails.
pub fn load_catalog(conn: &mut SqliteConnection) -> Result<ItemCatalog, PersistenceError> {
    let mut catalog: ItemCatalog = ItemCatalog::new();
    for unit in list_unit_measures(conn)? {
        catalog.insert_unit_measure(unit);
    }
    for item in list_items(conn)? {
        if let Some(item_id) = item.item_id {
            catalog.insert_item(item_id, item);
        }
    }
    debug!("Loaded item catalog");
    Ok(catalog)
}

/// Counts incident line entries per `(item_id, unit_measure_id)`.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn load_unit_usage(
    conn: &mut SqliteConnection,
) -> Result<BTreeMap<(i64, i64), usize>, PersistenceError> {
    let rows: Vec<(i64, i64, i64)> = incident_items::table
        .group_by((incident_items::item_id, incident_items::unit_measure_id))
        .select((
            incident_items::item_id,
            incident_items::unit_measure_id,
            count_star(),
        ))
        .load(conn)?;

    rows.into_iter()
        .map(|(item_id, unit_measure_id, count)| {
            usize::try_from(count)
                .map(|count| ((item_id, unit_measure_id), count))
                .map_err(|e| PersistenceError::InvalidStoredData(e.to_string()))
        })
        .collect()
}

/// Counts items that permit a unit measure.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_items_using_unit(
    conn: &mut SqliteConnection,
    unit_measure_id: i64,
) -> Result<i64, PersistenceError> {
    Ok(item_unit_measures::table
        .filter(item_unit_measures::unit_measure_id.eq(unit_measure_id))
        .count()
        .get_result(conn)?)
}

/// Counts incident line entries recorded in a unit measure.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_line_items_using_unit(
    conn: &mut SqliteConnection,
    unit_measure_id: i64,
) -> Result<i64, PersistenceError> {
    Ok(incident_items::table
        .filter(incident_items::unit_measure_id.eq(unit_measure_id))
        .count()
        .get_result(conn)?)
}

/// Counts incident line entries recording an item.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_line_items_for_item(
    conn: &mut SqliteConnection,
    item_id: i64,
) -> Result<i64, PersistenceError> {
    Ok(incident_items::table
        .filter(incident_items::item_id.eq(item_id))
        .count()
        .get_result(conn)?)
}

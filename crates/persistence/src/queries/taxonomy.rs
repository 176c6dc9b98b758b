// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Taxonomy and geography queries.

use diesel::SqliteConnection;
use diesel::prelude::*;
use incident_registry_domain::{Level, Taxonomy, TaxonomyNode};
use tracing::debug;

use crate::diesel_schema::{incidents, items};
use crate::error::PersistenceError;

/// Loads every node stored at one level, ordered by identifier.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn load_nodes(
    conn: &mut SqliteConnection,
    level: Level,
) -> Result<Vec<TaxonomyNode>, PersistenceError> {
    let nodes: Vec<TaxonomyNode> = node_table!(
        level,
        root |t| {
            t::table
                .select((t::id, t::name))
                .order(t::id.asc())
                .load::<(i64, String)>(conn)?
                .into_iter()
                .map(|(id, name)| TaxonomyNode::new(id, name, None))
                .collect()
        },
        child |t| {
            t::table
                .select((t::id, t::name, t::parent_id))
                .order(t::id.asc())
                .load::<(i64, String, i64)>(conn)?
                .into_iter()
                .map(|(id, name, parent_id)| TaxonomyNode::new(id, name, Some(parent_id)))
                .collect()
        }
    );
    Ok(nodes)
}

/// Loads both hierarchies into a [`Taxonomy`].
///
/// # Errors
///
/// Returns an error if a query fails or a stored node has no parent.
pub fn load_taxonomy(conn: &mut SqliteConnection) -> Result<Taxonomy, PersistenceError> {
    let mut taxonomy: Taxonomy = Taxonomy::new();
    for level in Level::ALL {
        for node in load_nodes(conn, level)? {
            let id: i64 = node.id;
            taxonomy.insert(level, node).map_err(|e| {
                PersistenceError::InvalidStoredData(format!("{} {id}: {e}", level.as_str()))
            })?;
        }
    }
    debug!("Loaded taxonomy");
    Ok(taxonomy)
}

/// Counts incidents whose path passes through a node.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_incidents_on_node(
    conn: &mut SqliteConnection,
    level: Level,
    id: i64,
) -> Result<i64, PersistenceError> {
    let query = incidents::table.count().into_boxed();
    let query = match level {
        Level::Variable => query.filter(incidents::variable_id.eq(id)),
        Level::Category => query.filter(incidents::category_id.eq(id)),
        Level::Subcategory => query.filter(incidents::subcategory_id.eq(id)),
        Level::SecondSubcategory => query.filter(incidents::second_subcategory_id.eq(id)),
        Level::Province => query.filter(incidents::province_id.eq(id)),
        Level::Municipality => query.filter(incidents::municipality_id.eq(id)),
    };
    Ok(query.get_result(conn)?)
}

/// Counts items whose path passes through a taxonomy node.
///
/// Always zero for geography levels.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_items_on_node(
    conn: &mut SqliteConnection,
    level: Level,
    id: i64,
) -> Result<i64, PersistenceError> {
    let query = items::table.count().into_boxed();
    let query = match level {
        Level::Variable => query.filter(items::variable_id.eq(id)),
        Level::Category => query.filter(items::category_id.eq(id)),
        Level::Subcategory => query.filter(items::subcategory_id.eq(id)),
        Level::SecondSubcategory => query.filter(items::second_subcategory_id.eq(id)),
        Level::Province | Level::Municipality => return Ok(0),
    };
    Ok(query.get_result(conn)?)
}

/// Counts the direct children of a node.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_children(
    conn: &mut SqliteConnection,
    level: Level,
    id: i64,
) -> Result<i64, PersistenceError> {
    let Some(child_level) = level.child() else {
        return Ok(0);
    };
    let count: i64 = node_table!(
        child_level,
        root |_t| { 0 },
        child |t| {
            t::table
                .filter(t::parent_id.eq(id))
                .count()
                .get_result(conn)?
        }
    );
    Ok(count)
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Taxonomy and geography node mutations.

use diesel::SqliteConnection;
use diesel::prelude::*;
use incident_registry_domain::{EntityKind, Level};
use tracing::info;

use crate::backend::sqlite::last_insert_rowid;
use crate::error::{PersistenceError, expect_rows};
use crate::queries::taxonomy::{count_children, count_incidents_on_node, count_items_on_node};

/// Inserts a node and returns its identifier.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `level` - The level of the node
/// * `name` - The validated name
/// * `parent_id` - The parent node, `None` for root levels
///
/// # Errors
///
/// Returns an error if a non-root node has no parent, or the insert
/// violates a constraint.
pub fn insert_node(
    conn: &mut SqliteConnection,
    level: Level,
    name: &str,
    parent_id: Option<i64>,
) -> Result<i64, PersistenceError> {
    node_table!(
        level,
        root |t| {
            diesel::insert_into(t::table)
                .values(t::name.eq(name))
                .execute(conn)?;
        },
        child |t| {
            let parent: i64 = parent_id.ok_or_else(|| {
                PersistenceError::Other(format!("A {level} requires a parent"))
            })?;
            diesel::insert_into(t::table)
                .values((t::name.eq(name), t::parent_id.eq(parent)))
                .execute(conn)?;
        }
    );
    let id: i64 = last_insert_rowid(conn)?;
    info!(level = level.as_str(), id, name, "Created node");
    Ok(id)
}

/// Renames a node.
///
/// # Errors
///
/// Returns `NotFound` if the node does not exist, or an error if the
/// update violates a constraint.
pub fn rename_node(
    conn: &mut SqliteConnection,
    level: Level,
    id: i64,
    name: &str,
) -> Result<(), PersistenceError> {
    let rows: usize = node_table!(
        level,
        root |t| {
            diesel::update(t::table.filter(t::id.eq(id)))
                .set(t::name.eq(name))
                .execute(conn)?
        },
        child |t| {
            diesel::update(t::table.filter(t::id.eq(id)))
                .set(t::name.eq(name))
                .execute(conn)?
        }
    );
    expect_rows(rows, EntityKind::Node(level), id)?;
    info!(level = level.as_str(), id, name, "Renamed node");
    Ok(())
}

/// Deletes a node that nothing references.
///
/// Child nodes, items and incidents are checked inside one transaction
/// before the delete. The schema's `ON DELETE RESTRICT` remains as a
/// backstop.
///
/// # Errors
///
/// Returns `Referenced` if anything still points at the node, `NotFound`
/// if it does not exist.
pub fn delete_node(
    conn: &mut SqliteConnection,
    level: Level,
    id: i64,
) -> Result<(), PersistenceError> {
    conn.transaction::<_, PersistenceError, _>(|conn| {
        if let Some(child_level) = level.child() {
            let children: i64 = count_children(conn, level, id)?;
            ensure_unreferenced(level, id, EntityKind::Node(child_level), children)?;
        }
        let items: i64 = count_items_on_node(conn, level, id)?;
        ensure_unreferenced(level, id, EntityKind::Item, items)?;
        let incidents: i64 = count_incidents_on_node(conn, level, id)?;
        ensure_unreferenced(level, id, EntityKind::Incident, incidents)?;

        let rows: usize = node_table!(
            level,
            root |t| { diesel::delete(t::table.filter(t::id.eq(id))).execute(conn)? },
            child |t| { diesel::delete(t::table.filter(t::id.eq(id))).execute(conn)? }
        );
        expect_rows(rows, EntityKind::Node(level), id)
    })?;
    info!(level = level.as_str(), id, "Deleted node");
    Ok(())
}

fn ensure_unreferenced(
    level: Level,
    id: i64,
    referenced_by: EntityKind,
    count: i64,
) -> Result<(), PersistenceError> {
    if count > 0 {
        return Err(PersistenceError::Referenced {
            entity: EntityKind::Node(level),
            id,
            referenced_by,
            count: usize::try_from(count).unwrap_or(usize::MAX),
        });
    }
    Ok(())
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Persistence layer for the Incident Registry.
//!
//! `SQLite` through Diesel, with migrations embedded at compile time.
//!
//! ## Referential integrity
//!
//! Every delete counts the rows that reference its target and refuses with
//! [`PersistenceError::Referenced`] when any exist. Schema foreign keys use
//! `ON DELETE RESTRICT` as a backstop; only owned rows (line entries, permitted
//! unit measure links and login sessions) cascade with their owner. Foreign key
//! enforcement is verified when a connection is opened.
//!
//! ## Transactions
//!
//! [`Persistence::apply_mutation`] runs each mutation in one transaction.
//! An incident update writes the incident row and every line entry change
//! together, or nothing at all.
//!
//! ## Testing
//!
//! Tests use [`Persistence::new_in_memory`], which hands out an isolated
//! shared-cache database per call.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use diesel::prelude::*;
use diesel::SqliteConnection;
use incident_registry::{Mutation, RegistryContext};
use incident_registry_domain::{
    IncidentRecord, Item, ItemCatalog, Level, Taxonomy, TaxonomyNode, UnitMeasure, UserRole,
};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Atomic counter for generating unique in-memory database names.
///
/// Each call to `new_in_memory()` receives a unique sequential ID.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Dispatches on a [`Level`] to the table that stores it.
///
/// Diesel tables are distinct types, so per-level code is written once per
/// table shape: `root` for tables without a parent column, `child` for
/// tables with one. Inside each block the given identifier names the table
/// module.
///
/// ```ignore
/// let count: i64 = node_table!(
///     level,
///     root |t| { t::table.count().get_result(conn)? },
///     child |t| { t::table.filter(t::parent_id.eq(parent)).count().get_result(conn)? }
/// );
/// ```
macro_rules! node_table {
    ($level:expr, root |$r:ident| $root:block, child |$c:ident| $child:block) => {
        match $level {
            incident_registry_domain::Level::Variable => {
                #[allow(unused_imports)]
                use $crate::diesel_schema::variables as $r;
                $root
            }
            incident_registry_domain::Level::Province => {
                #[allow(unused_imports)]
                use $crate::diesel_schema::provinces as $r;
                $root
            }
            incident_registry_domain::Level::Category => {
                use $crate::diesel_schema::categories as $c;
                $child
            }
            incident_registry_domain::Level::Subcategory => {
                use $crate::diesel_schema::subcategories as $c;
                $child
            }
            incident_registry_domain::Level::SecondSubcategory => {
                use $crate::diesel_schema::second_subcategories as $c;
                $child
            }
            incident_registry_domain::Level::Municipality => {
                use $crate::diesel_schema::municipalities as $c;
                $child
            }
        }
    };
}

mod backend;
mod data_models;
mod diesel_schema;
mod error;
mod mutations;
mod queries;

#[cfg(test)]
mod tests;

pub use data_models::{IncidentPage, IncidentQuery, IncidentSort, SessionData, UserData};
pub use error::PersistenceError;
pub use queries::incidents::format_date;

/// Persistence adapter for the registry database.
pub struct Persistence {
    pub(crate) conn: SqliteConnection,
}

impl Persistence {
    /// Creates a new persistence adapter with an in-memory `SQLite` database.
    ///
    /// Each call receives a unique database instance via atomic counter.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id: u64 = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let shared_memory_url: String = format!("file:memdb_test_{db_id}?mode=memory&cache=shared");

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(&shared_memory_url)?;
        backend::sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    /// Creates a new persistence adapter with a file-based `SQLite` database.
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the `SQLite` database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new_with_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path_str: &str = path.as_ref().to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        let mut conn: SqliteConnection = backend::sqlite::initialize_database(path_str)?;
        backend::sqlite::enable_wal_mode(&mut conn)?;
        backend::sqlite::verify_foreign_key_enforcement(&mut conn)?;

        Ok(Self { conn })
    }

    /// Verifies that foreign key enforcement is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    pub fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        backend::sqlite::verify_foreign_key_enforcement(&mut self.conn)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Executes a validated mutation in a single transaction.
    ///
    /// # Returns
    ///
    /// The identifier of the row the mutation created, changed or removed.
    ///
    /// # Errors
    ///
    /// Returns an error if any write fails. Nothing is written in that case.
    pub fn apply_mutation(&mut self, mutation: &Mutation) -> Result<i64, PersistenceError> {
        debug!(mutation = mutations::describe(mutation), "Applying mutation");
        self.conn
            .transaction::<_, PersistenceError, _>(|conn| match mutation {
                Mutation::CreateNode {
                    level,
                    name,
                    parent_id,
                } => mutations::taxonomy::insert_node(conn, *level, name, *parent_id),
                Mutation::RenameNode { level, id, name } => {
                    mutations::taxonomy::rename_node(conn, *level, *id, name).map(|()| *id)
                }
                Mutation::DeleteNode { level, id } => {
                    mutations::taxonomy::delete_node(conn, *level, *id).map(|()| *id)
                }
                Mutation::CreateUnitMeasure { name } => {
                    mutations::catalog::insert_unit_measure(conn, name)
                }
                Mutation::RenameUnitMeasure { id, name } => {
                    mutations::catalog::rename_unit_measure(conn, *id, name).map(|()| *id)
                }
                Mutation::DeleteUnitMeasure { id } => {
                    mutations::catalog::delete_unit_measure(conn, *id).map(|()| *id)
                }
                Mutation::CreateItem { item } => mutations::catalog::insert_item(conn, item),
                Mutation::UpdateItem { item_id, item } => {
                    mutations::catalog::update_item(conn, *item_id, item).map(|()| *item_id)
                }
                Mutation::DeleteItem { item_id } => {
                    mutations::catalog::delete_item(conn, *item_id).map(|()| *item_id)
                }
                Mutation::CreateIncident { incident } => {
                    mutations::incidents::insert_incident(conn, incident)
                }
                Mutation::UpdateIncident {
                    incident_id,
                    incident,
                    diff,
                } => mutations::incidents::update_incident(conn, *incident_id, incident, diff)
                    .map(|()| *incident_id),
                Mutation::DeleteIncident { incident_id } => {
                    mutations::incidents::delete_incident(conn, *incident_id)
                        .map(|()| *incident_id)
                }
            })
    }

    // ========================================================================
    // Reference data
    // ========================================================================

    /// Loads the reference data commands are validated against.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails or stored data is malformed.
    pub fn load_context(&mut self) -> Result<RegistryContext, PersistenceError> {
        let taxonomy: Taxonomy = queries::taxonomy::load_taxonomy(&mut self.conn)?;
        let catalog: ItemCatalog = queries::catalog::load_catalog(&mut self.conn)?;
        let unit_usage: BTreeMap<(i64, i64), usize> =
            queries::catalog::load_unit_usage(&mut self.conn)?;
        Ok(RegistryContext::new(taxonomy, catalog, unit_usage))
    }

    /// Lists every node stored at one level, ordered by identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_nodes(&mut self, level: Level) -> Result<Vec<TaxonomyNode>, PersistenceError> {
        queries::taxonomy::load_nodes(&mut self.conn, level)
    }

    /// Lists unit measures ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_unit_measures(&mut self) -> Result<Vec<UnitMeasure>, PersistenceError> {
        queries::catalog::list_unit_measures(&mut self.conn)
    }

    /// Lists every item with its permitted unit measures.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_items(&mut self) -> Result<Vec<Item>, PersistenceError> {
        queries::catalog::list_items(&mut self.conn)
    }

    /// Retrieves an item by identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_item(&mut self, item_id: i64) -> Result<Option<Item>, PersistenceError> {
        queries::catalog::get_item(&mut self.conn, item_id)
    }

    // ========================================================================
    // Incidents
    // ========================================================================

    /// Retrieves an incident with its line entries.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the incident does not exist.
    pub fn get_incident(&mut self, incident_id: i64) -> Result<IncidentRecord, PersistenceError> {
        queries::incidents::get_incident(&mut self.conn, incident_id)
    }

    /// Returns whether an incident exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn incident_exists(&mut self, incident_id: i64) -> Result<bool, PersistenceError> {
        queries::incidents::incident_exists(&mut self.conn, incident_id)
    }

    /// Lists incidents matching a filter, one page at a time.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails or a stored row is malformed.
    pub fn list_incidents(
        &mut self,
        query: &IncidentQuery,
    ) -> Result<IncidentPage, PersistenceError> {
        queries::incidents::list_incidents(&mut self.conn, query)
    }

    // ========================================================================
    // Users
    // ========================================================================

    /// Creates a user with a hashed password.
    ///
    /// # Errors
    ///
    /// Returns `UniqueViolation` if the name is taken.
    pub fn create_user(
        &mut self,
        name: &str,
        password: &str,
        role: UserRole,
    ) -> Result<i64, PersistenceError> {
        mutations::users::create_user(&mut self.conn, name, password, role)
    }

    /// Retrieves a user by name (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_user_by_name(&mut self, name: &str) -> Result<Option<UserData>, PersistenceError> {
        queries::users::get_user_by_name(&mut self.conn, name)
    }

    /// Retrieves a user by identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_user_by_id(&mut self, user_id: i64) -> Result<Option<UserData>, PersistenceError> {
        queries::users::get_user_by_id(&mut self.conn, user_id)
    }

    /// Lists users ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn list_users(&mut self) -> Result<Vec<UserData>, PersistenceError> {
        queries::users::list_users(&mut self.conn)
    }

    /// Counts users holding a role.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn count_users_with_role(&mut self, role: UserRole) -> Result<i64, PersistenceError> {
        queries::users::count_users_with_role(&mut self.conn, role)
    }

    /// Checks a name and password pair.
    ///
    /// # Returns
    ///
    /// The user when the password matches, `None` for an unknown name or a
    /// wrong password.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stored hash is malformed.
    pub fn verify_user_password(
        &mut self,
        name: &str,
        password: &str,
    ) -> Result<Option<UserData>, PersistenceError> {
        let Some(user) = queries::users::get_user_by_name(&mut self.conn, name)? else {
            debug!(name, "Password check for unknown user");
            return Ok(None);
        };
        if queries::users::verify_password(password, &user.password_hash)? {
            Ok(Some(user))
        } else {
            info!(user_id = user.user_id, "Password check failed");
            Ok(None)
        }
    }

    /// Changes a user's role.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user does not exist.
    pub fn update_user_role(&mut self, user_id: i64, role: UserRole) -> Result<(), PersistenceError> {
        mutations::users::update_user_role(&mut self.conn, user_id, role)
    }

    /// Replaces a user's password.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user does not exist.
    pub fn update_user_password(
        &mut self,
        user_id: i64,
        password: &str,
    ) -> Result<(), PersistenceError> {
        mutations::users::update_user_password(&mut self.conn, user_id, password)
    }

    /// Deletes a user.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user does not exist.
    pub fn delete_user(&mut self, user_id: i64) -> Result<(), PersistenceError> {
        mutations::users::delete_user(&mut self.conn, user_id)
    }

    // ========================================================================
    // Sessions
    // ========================================================================

    /// Stores a session token for a user.
    ///
    /// # Errors
    ///
    /// Returns `ForeignKeyViolation` if the user does not exist.
    pub fn create_session(
        &mut self,
        token: &str,
        user_id: i64,
        expires_at: &str,
    ) -> Result<i64, PersistenceError> {
        mutations::sessions::create_session(&mut self.conn, token, user_id, expires_at)
    }

    /// Retrieves a session by token.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub fn get_session_by_token(
        &mut self,
        token: &str,
    ) -> Result<Option<SessionData>, PersistenceError> {
        queries::sessions::get_session_by_token(&mut self.conn, token)
    }

    /// Deletes a session. Unknown tokens are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_session(&mut self, token: &str) -> Result<(), PersistenceError> {
        mutations::sessions::delete_session(&mut self.conn, token)
    }

    /// Deletes every session of a user and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_sessions_for_user(&mut self, user_id: i64) -> Result<usize, PersistenceError> {
        mutations::sessions::delete_sessions_for_user(&mut self.conn, user_id)
    }
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! User account mutations.

use diesel::SqliteConnection;
use diesel::prelude::*;
use incident_registry_domain::{EntityKind, UserRole, normalize_name};
use tracing::info;

use crate::backend::sqlite::last_insert_rowid;
use crate::diesel_schema::users;
use crate::error::{PersistenceError, expect_rows};

/// Creates a user.
///
/// The name is trimmed. Uniqueness is case-insensitive through the
/// column collation.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `name` - The user name
/// * `password` - The plain-text password (will be hashed)
/// * `role` - The role
///
/// # Errors
///
/// Returns `UniqueViolation` if the name is taken, or an error if hashing
/// fails.
pub fn create_user(
    conn: &mut SqliteConnection,
    name: &str,
    password: &str,
    role: UserRole,
) -> Result<i64, PersistenceError> {
    let name: String = normalize_name(name);

    let password_hash: String = bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| PersistenceError::Other(format!("Failed to hash password: {e}")))?;

    diesel::insert_into(users::table)
        .values((
            users::name.eq(&name),
            users::password_hash.eq(&password_hash),
            users::role.eq(role.as_str()),
        ))
        .execute(conn)?;

    let user_id: i64 = last_insert_rowid(conn)?;
    info!(user_id, name, role = role.as_str(), "Created user");
    Ok(user_id)
}

/// Changes a user's role.
///
/// # Errors
///
/// Returns `NotFound` if the user does not exist.
pub fn update_user_role(
    conn: &mut SqliteConnection,
    user_id: i64,
    role: UserRole,
) -> Result<(), PersistenceError> {
    let rows: usize = diesel::update(users::table.filter(users::id.eq(user_id)))
        .set(users::role.eq(role.as_str()))
        .execute(conn)?;
    expect_rows(rows, EntityKind::User, user_id)?;
    info!(user_id, role = role.as_str(), "Changed user role");
    Ok(())
}

/// Replaces a user's password.
///
/// # Errors
///
/// Returns `NotFound` if the user does not exist, or an error if hashing
/// fails.
pub fn update_user_password(
    conn: &mut SqliteConnection,
    user_id: i64,
    password: &str,
) -> Result<(), PersistenceError> {
    let password_hash: String = bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| PersistenceError::Other(format!("Failed to hash password: {e}")))?;
    let rows: usize = diesel::update(users::table.filter(users::id.eq(user_id)))
        .set(users::password_hash.eq(&password_hash))
        .execute(conn)?;
    expect_rows(rows, EntityKind::User, user_id)?;
    info!(user_id, "Changed user password");
    Ok(())
}

/// Deletes a user.
///
/// # Errors
///
/// Returns `NotFound` if the user does not exist.
pub fn delete_user(conn: &mut SqliteConnection, user_id: i64) -> Result<(), PersistenceError> {
    let rows: usize = diesel::delete(users::table.filter(users::id.eq(user_id))).execute(conn)?;
    expect_rows(rows, EntityKind::User, user_id)?;
    info!(user_id, "Deleted user");
    Ok(())
}

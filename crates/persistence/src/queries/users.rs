// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! User account queries.

use diesel::SqliteConnection;
use diesel::prelude::*;
use incident_registry_domain::UserRole;
use std::str::FromStr;
use tracing::debug;

use crate::data_models::UserData;
use crate::diesel_schema::users;
use crate::error::PersistenceError;

/// Diesel Queryable struct for user rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = users)]
struct UserRow {
    id: i64,
    name: String,
    password_hash: String,
    role: String,
    created_at: String,
}

impl TryFrom<UserRow> for UserData {
    type Error = PersistenceError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: UserRole = UserRole::from_str(&row.role)
            .map_err(|e| PersistenceError::InvalidStoredData(e.to_string()))?;
        Ok(Self {
            user_id: row.id,
            name: row.name,
            role,
            password_hash: row.password_hash,
            created_at: row.created_at,
        })
    }
}

/// Retrieves a user by name (case-insensitive).
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the user is not found.
pub fn get_user_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Option<UserData>, PersistenceError> {
    debug!(name, "Looking up user by name");
    users::table
        .filter(users::name.eq(name.trim()))
        .select(UserRow::as_select())
        .first::<UserRow>(conn)
        .optional()?
        .map(UserData::try_from)
        .transpose()
}

/// Retrieves a user by identifier.
///
/// # Errors
///
/// Returns an error if the database query fails.
/// Returns `Ok(None)` if the user is not found.
pub fn get_user_by_id(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<Option<UserData>, PersistenceError> {
    users::table
        .filter(users::id.eq(user_id))
        .select(UserRow::as_select())
        .first::<UserRow>(conn)
        .optional()?
        .map(UserData::try_from)
        .transpose()
}

/// Lists users ordered by name.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_users(conn: &mut SqliteConnection) -> Result<Vec<UserData>, PersistenceError> {
    users::table
        .select(UserRow::as_select())
        .order((users::name.asc(), users::id.asc()))
        .load::<UserRow>(conn)?
        .into_iter()
        .map(UserData::try_from)
        .collect()
}

/// Counts users holding a role.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn count_users_with_role(
    conn: &mut SqliteConnection,
    role: UserRole,
) -> Result<i64, PersistenceError> {
    Ok(users::table
        .filter(users::role.eq(role.as_str()))
        .count()
        .get_result(conn)?)
}

/// Verifies a password against a stored bcrypt hash.
///
/// # Errors
///
/// Returns an error if the hash is malformed.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, PersistenceError> {
    bcrypt::verify(password, password_hash)
        .map_err(|e| PersistenceError::Other(format!("Failed to verify password: {e}")))
}

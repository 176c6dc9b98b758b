// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Login session mutations.

use diesel::SqliteConnection;
use diesel::prelude::*;
use tracing::{debug, info};

use crate::backend::sqlite::last_insert_rowid;
use crate::diesel_schema::sessions;
use crate::error::PersistenceError;

/// Stores a new session token for a user.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `token` - The session token
/// * `user_id` - The user the token belongs to
/// * `expires_at` - RFC 3339 expiry timestamp
///
/// # Errors
///
/// Returns `ForeignKeyViolation` if the user does not exist.
pub fn create_session(
    conn: &mut SqliteConnection,
    token: &str,
    user_id: i64,
    expires_at: &str,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(sessions::table)
        .values((
            sessions::token.eq(token),
            sessions::user_id.eq(user_id),
            sessions::expires_at.eq(expires_at),
        ))
        .execute(conn)?;

    let session_id: i64 = last_insert_rowid(conn)?;
    info!(session_id, user_id, "Created session");
    Ok(session_id)
}

/// Deletes a session by token. Unknown tokens are ignored.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn delete_session(conn: &mut SqliteConnection, token: &str) -> Result<(), PersistenceError> {
    let rows: usize =
        diesel::delete(sessions::table.filter(sessions::token.eq(token))).execute(conn)?;
    debug!(rows, "Deleted session");
    Ok(())
}

/// Deletes every session of a user.
///
/// # Returns
///
/// The number of sessions removed.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn delete_sessions_for_user(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<usize, PersistenceError> {
    let rows: usize =
        diesel::delete(sessions::table.filter(sessions::user_id.eq(user_id))).execute(conn)?;
    info!(user_id, rows, "Revoked user sessions");
    Ok(rows)
}

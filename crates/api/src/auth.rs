// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Sessions, the authentication gate and role authorization.
//!
//! A successful login stores a random token with an expiry. Adapters
//! validate the token once per request and hand handlers an [`AuthGate`];
//! handlers only ask the gate for the current [`Session`] and check its
//! role against the action being performed.

use incident_registry_domain::UserRole;
use incident_registry_persistence::{Persistence, SessionData, UserData};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use tracing::{debug, info, warn};

use crate::error::AuthError;

/// The user an operation is performed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// The user identifier.
    pub user_id: i64,
    /// The user name.
    pub name: String,
    /// The user's role.
    pub role: UserRole,
}

impl From<UserData> for Session {
    fn from(user: UserData) -> Self {
        Self {
            user_id: user.user_id,
            name: user.name,
            role: user.role,
        }
    }
}

/// Supplies the session of the caller.
///
/// Handlers call this before doing any work.
pub trait AuthGate {
    /// Returns the current session.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationFailed` when there is no authenticated caller.
    fn require_session(&self) -> Result<Session, AuthError>;
}

/// Actions guarded by a minimum role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Create, rename or delete taxonomy and geography nodes.
    ManageTaxonomy,
    /// Create, edit or delete items and unit measures.
    ManageCatalog,
    /// Create or edit incidents.
    EditIncident,
    /// Delete incidents.
    DeleteIncident,
    /// Create, change or delete user accounts.
    ManageUsers,
    /// Read anything.
    Read,
}

impl Action {
    /// The lowest role allowed to perform the action.
    #[must_use]
    pub const fn required_role(self) -> UserRole {
        match self {
            Self::ManageTaxonomy | Self::ManageUsers => UserRole::Admin,
            Self::ManageCatalog | Self::DeleteIncident => UserRole::Advanced,
            Self::EditIncident | Self::Read => UserRole::Simple,
        }
    }

    /// Name used in error messages and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ManageTaxonomy => "manage_taxonomy",
            Self::ManageCatalog => "manage_catalog",
            Self::EditIncident => "edit_incident",
            Self::DeleteIncident => "delete_incident",
            Self::ManageUsers => "manage_users",
            Self::Read => "read",
        }
    }
}

/// Role-based access control.
pub struct AuthorizationService;

impl AuthorizationService {
    /// Checks whether a session may perform an action.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the session's role is below the action's
    /// required role.
    pub fn authorize(session: &Session, action: Action) -> Result<(), AuthError> {
        let required: UserRole = action.required_role();
        if session.role.includes(required) {
            return Ok(());
        }
        warn!(
            user_id = session.user_id,
            role = session.role.as_str(),
            action = action.as_str(),
            "Action refused"
        );
        Err(AuthError::Unauthorized {
            action: action.as_str().to_string(),
            required_role: required.as_str().to_string(),
        })
    }

    /// Obtains the session from the gate and authorizes the action.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no session or it lacks the role.
    pub fn require<G: AuthGate + ?Sized>(gate: &G, action: Action) -> Result<Session, AuthError> {
        let session: Session = gate.require_session()?;
        Self::authorize(&session, action)?;
        Ok(session)
    }
}

/// How long a login token stays valid.
pub const SESSION_LIFETIME: Duration = Duration::hours(8);

/// A token issued by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedSession {
    /// Bearer token to present on later requests.
    pub token: String,
    /// RFC 3339 expiry timestamp.
    pub expires_at: String,
    /// The logged-in user.
    pub session: Session,
}

/// Issues and validates login tokens against the users table.
pub struct AuthenticationService;

impl AuthenticationService {
    /// Checks a name and password and issues a session token.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationFailed` for an unknown name, a wrong password
    /// or a database failure. The message does not say which.
    pub fn login(
        persistence: &mut Persistence,
        name: &str,
        password: &str,
    ) -> Result<IssuedSession, AuthError> {
        let user: UserData = persistence
            .verify_user_password(name, password)
            .map_err(|e| {
                warn!(error = %e, "Password verification failed");
                Self::invalid_credentials()
            })?
            .ok_or_else(Self::invalid_credentials)?;

        let token: String = generate_session_token();
        let expires_at: String = (OffsetDateTime::now_utc() + SESSION_LIFETIME)
            .format(&Rfc3339)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to format expiry: {e}"),
            })?;
        persistence
            .create_session(&token, user.user_id, &expires_at)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to create session: {e}"),
            })?;

        info!(user_id = user.user_id, "Issued session");
        Ok(IssuedSession {
            token,
            expires_at,
            session: Session::from(user),
        })
    }

    /// Resolves a bearer token to the session of its user.
    ///
    /// The user row is read on every call, so role changes apply to
    /// existing tokens immediately.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationFailed` if the token is unknown or expired,
    /// or its user no longer exists.
    pub fn validate_session(
        persistence: &mut Persistence,
        token: &str,
    ) -> Result<Session, AuthError> {
        let stored: SessionData = persistence
            .get_session_by_token(token)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Database error: {e}"),
            })?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("Invalid session token"),
            })?;

        let expires_at: OffsetDateTime = OffsetDateTime::parse(&stored.expires_at, &Rfc3339)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Invalid session expiry: {e}"),
            })?;
        if OffsetDateTime::now_utc() >= expires_at {
            debug!(session_id = stored.session_id, "Session expired");
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Session expired"),
            });
        }

        let user: UserData = persistence
            .get_user_by_id(stored.user_id)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Database error: {e}"),
            })?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("Session user no longer exists"),
            })?;
        Ok(Session::from(user))
    }

    /// Ends a session. Unknown tokens are ignored.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationFailed` if the database operation fails.
    pub fn logout(persistence: &mut Persistence, token: &str) -> Result<(), AuthError> {
        persistence
            .delete_session(token)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to delete session: {e}"),
            })
    }

    fn invalid_credentials() -> AuthError {
        AuthError::AuthenticationFailed {
            reason: String::from("Invalid name or password"),
        }
    }
}

/// 256 random bits, hex encoded.
fn generate_session_token() -> String {
    format!(
        "{:016x}{:016x}{:016x}{:016x}",
        rand::random::<u64>(),
        rand::random::<u64>(),
        rand::random::<u64>(),
        rand::random::<u64>()
    )
}

/// A gate holding an already resolved outcome.
///
/// Adapters resolve the caller once per request and hand this to handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedGate {
    outcome: Result<Session, AuthError>,
}

impl ResolvedGate {
    /// A gate for an authenticated caller.
    #[must_use]
    pub const fn authenticated(session: Session) -> Self {
        Self {
            outcome: Ok(session),
        }
    }

    /// A gate that refuses every request.
    #[must_use]
    pub const fn rejected(error: AuthError) -> Self {
        Self { outcome: Err(error) }
    }
}

impl AuthGate for ResolvedGate {
    fn require_session(&self) -> Result<Session, AuthError> {
        self.outcome.clone()
    }
}

// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Session token extraction for the server.
//!
//! Clients obtain a token from `POST /auth/login` and send it as
//! `Authorization: Bearer <token>`. This module validates the token against
//! the sessions table and hands handlers a gate holding the outcome.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use incident_registry_api::{AuthError, AuthenticationService, ResolvedGate};
use std::convert::Infallible;
use tracing::{debug, warn};

use crate::AppState;

/// Extractor for the caller's session.
///
/// Never rejects the request: a missing, malformed or unknown token yields a
/// gate that refuses every handler, so the failure is reported in the usual
/// structured form.
///
/// # Usage
///
/// ```ignore
/// async fn my_handler(
///     BearerSession { gate, .. }: BearerSession,
/// ) -> Result<Json<Response>, HttpError> {
///     let me = whoami(&gate)?;
///     Ok(Json(me))
/// }
/// ```
pub struct BearerSession {
    /// The validated session, or the reason there is none.
    pub gate: ResolvedGate,
    /// The presented token, if the header was well formed.
    pub token: Option<String>,
}

impl BearerSession {
    fn rejected(reason: &str) -> Self {
        Self {
            gate: ResolvedGate::rejected(AuthError::AuthenticationFailed {
                reason: reason.to_string(),
            }),
            token: None,
        }
    }
}

impl FromRequestParts<AppState> for BearerSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            debug!("Missing Authorization header");
            return Ok(Self::rejected("Missing Authorization header"));
        };

        let Some(token) = header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
        else {
            warn!("Authorization header is not a bearer token");
            return Ok(Self::rejected("Invalid Authorization header format"));
        };

        let mut persistence = state.persistence.lock().await;
        let outcome = AuthenticationService::validate_session(&mut persistence, token);
        let gate: ResolvedGate = match outcome {
            Ok(session) => {
                debug!(user_id = session.user_id, role = %session.role, "Validated session");
                ResolvedGate::authenticated(session)
            }
            Err(e) => {
                warn!(error = %e, "Session rejected");
                ResolvedGate::rejected(e)
            }
        };

        Ok(Self {
            gate,
            token: Some(token.to_string()),
        })
    }
}

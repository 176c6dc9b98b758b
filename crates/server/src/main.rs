// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

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

mod session;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State as AxumState,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use clap::Parser;
use incident_registry_api::{
    ActionFailure, ActionSuccess, ApiError, ChangePasswordRequest, CreateNodeRequest,
    CreateUnitMeasureRequest, CreateUserRequest, FailureKind, IncidentInfo, IncidentRequest,
    ItemInfo, ItemRequest, ListIncidentsRequest, ListIncidentsResponse, ListItemsRequest,
    ListItemsResponse, ListNodesResponse, ListUsersResponse, LoginRequest, LoginResponse,
    RenameRequest,
    ResolveCascadeRequest, ResolveCascadeResponse, SaveIncidentResponse, SaveItemResponse,
    UnitMeasureInfo, UpdateUserRoleRequest, UserInfo, bootstrap_admin, change_password,
    create_incident, create_item, create_node, create_unit_measure, create_user,
    delete_incident, delete_item, delete_node, delete_unit_measure, delete_user, get_incident,
    get_item, list_incidents, list_items, list_nodes, list_unit_measures, list_users, login,
    logout, rename_node, rename_unit_measure, resolve_cascade, update_incident, update_item,
    update_user_role, whoami,
};
use incident_registry_persistence::{Persistence, PersistenceError};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::session::BearerSession;

/// Incident Registry Server - HTTP server for the Incident Registry
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long)]
    database: Option<String>,

    /// Address to bind the server to
    #[arg(short, long, default_value = "127.0.0.1")]
    bind: IpAddr,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,
}

/// Application state shared across handlers.
///
/// One connection serves every request; the mutex serializes them.
#[derive(Clone)]
pub struct AppState {
    /// The persistence layer.
    pub persistence: Arc<Mutex<Persistence>>,
}

/// Query parameters for listing nodes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListNodesQuery {
    /// Only children of this node.
    parent_id: Option<i64>,
}

/// HTTP error wrapper that implements `IntoResponse`.
///
/// The body is always the structured failure result.
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The failure body.
    failure: ActionFailure,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, Json(self.failure)).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status: StatusCode = match &err {
            ApiError::AuthenticationFailed { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Unauthorized { .. } => StatusCode::FORBIDDEN,
            ApiError::MissingField { .. } | ApiError::InvalidField { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::InconsistentPath { .. }
            | ApiError::InvalidLineItem { .. }
            | ApiError::PasswordPolicyViolation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::DuplicateName { .. }
            | ApiError::DuplicateItem { .. }
            | ApiError::ReferentialIntegrity { .. } => StatusCode::CONFLICT,
            ApiError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Unexpected { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %err, "Request failed");
        } else {
            warn!(error = %err, status = status.as_u16(), "Request refused");
        }
        Self {
            status,
            failure: err.to_failure(),
        }
    }
}

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(error = %rejection, "Malformed request body");
        Self {
            status: StatusCode::BAD_REQUEST,
            failure: ActionFailure {
                success: false,
                kind: FailureKind::InvalidField,
                error: rejection.body_text(),
                field: Some(String::from("body")),
            },
        }
    }
}

impl From<QueryRejection> for HttpError {
    fn from(rejection: QueryRejection) -> Self {
        warn!(error = %rejection, "Malformed query string");
        Self {
            status: StatusCode::BAD_REQUEST,
            failure: ActionFailure {
                success: false,
                kind: FailureKind::InvalidField,
                error: rejection.body_text(),
                field: Some(String::from("query")),
            },
        }
    }
}

impl From<PathRejection> for HttpError {
    fn from(rejection: PathRejection) -> Self {
        warn!(error = %rejection, "Malformed path parameter");
        Self {
            status: StatusCode::BAD_REQUEST,
            failure: ActionFailure {
                success: false,
                kind: FailureKind::InvalidField,
                error: rejection.body_text(),
                field: Some(String::from("path")),
            },
        }
    }
}

// ============================================================================
// Users and identity
// ============================================================================

/// Handler for POST `/auth/bootstrap`.
///
/// Creates the first ADMIN of an empty installation.
async fn handle_bootstrap(
    AxumState(app_state): AxumState<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Json<UserInfo>, HttpError> {
    let Json(request) = payload?;
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(bootstrap_admin(&mut persistence, &request)?))
}

/// Handler for POST `/auth/login`.
///
/// Returns a bearer token for the `Authorization` header.
async fn handle_login(
    AxumState(app_state): AxumState<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, HttpError> {
    let Json(request) = payload?;
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(login(&mut persistence, &request)?))
}

/// Handler for POST `/auth/logout`.
async fn handle_logout(
    AxumState(app_state): AxumState<AppState>,
    BearerSession { gate, token }: BearerSession,
) -> Result<Json<ActionSuccess>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(logout(
        &mut persistence,
        &gate,
        token.as_deref().unwrap_or_default(),
    )?))
}

/// Handler for GET `/auth/whoami`.
async fn handle_whoami(
    BearerSession { gate, .. }: BearerSession,
) -> Result<Json<UserInfo>, HttpError> {
    Ok(Json(whoami(&gate)?))
}

async fn handle_list_users(
    AxumState(app_state): AxumState<AppState>,
    BearerSession { gate, .. }: BearerSession,
) -> Result<Json<ListUsersResponse>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(list_users(&mut persistence, &gate)?))
}

async fn handle_create_user(
    AxumState(app_state): AxumState<AppState>,
    BearerSession { gate, .. }: BearerSession,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Json<UserInfo>, HttpError> {
    let Json(request) = payload?;
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(create_user(&mut persistence, &gate, &request)?))
}

async fn handle_update_user_role(
    AxumState(app_state): AxumState<AppState>,
    BearerSession { gate, .. }: BearerSession,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateUserRoleRequest>, JsonRejection>,
) -> Result<Json<UserInfo>, HttpError> {
    let Path(user_id) = path?;
    let Json(request) = payload?;
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(update_user_role(
        &mut persistence,
        &gate,
        user_id,
        &request,
    )?))
}

async fn handle_change_password(
    AxumState(app_state): AxumState<AppState>,
    BearerSession { gate, .. }: BearerSession,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Json<ActionSuccess>, HttpError> {
    let Path(user_id) = path?;
    let Json(request) = payload?;
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(change_password(
        &mut persistence,
        &gate,
        user_id,
        &request,
    )?))
}

async fn handle_delete_user(
    AxumState(app_state): AxumState<AppState>,
    BearerSession { gate, .. }: BearerSession,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<ActionSuccess>, HttpError> {
    let Path(user_id) = path?;
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(delete_user(&mut persistence, &gate, user_id)?))
}

// ============================================================================
// Taxonomy and geography
// ============================================================================

/// Handler for GET `/nodes/{level}`.
///
/// Lists roots, or the children of `parentId` when given.
async fn handle_list_nodes(
    AxumState(app_state): AxumState<AppState>,
    BearerSession { gate, .. }: BearerSession,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<ListNodesQuery>, QueryRejection>,
) -> Result<Json<ListNodesResponse>, HttpError> {
    let Path(level) = path?;
    let Query(query) = query?;
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(list_nodes(
        &mut persistence,
        &gate,
        &level,
        query.parent_id,
    )?))
}

async fn handle_create_node(
    AxumState(app_state): AxumState<AppState>,
    BearerSession { gate, .. }: BearerSession,
    payload: Result<Json<CreateNodeRequest>, JsonRejection>,
) -> Result<Json<ActionSuccess>, HttpError> {
    let Json(request) = payload?;
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(create_node(&mut persistence, &gate, &request)?))
}

async fn handle_rename_node(
    AxumState(app_state): AxumState<AppState>,
    BearerSession { gate, .. }: BearerSession,
    path: Result<Path<(String, i64)>, PathRejection>,
    payload: Result<Json<RenameRequest>, JsonRejection>,
) -> Result<Json<ActionSuccess>, HttpError> {
    let Path((level, id)) = path?;
    let Json(request) = payload?;
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(rename_node(
        &mut persistence,
        &gate,
        &level,
        id,
        &request,
    )?))
}

async fn handle_delete_node(
    AxumState(app_state): AxumState<AppState>,
    BearerSession { gate, .. }: BearerSession,
    path: Result<Path<(String, i64)>, PathRejection>,
) -> Result<Json<ActionSuccess>, HttpError> {
    let Path((level, id)) = path?;
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(delete_node(&mut persistence, &gate, &level, id)?))
}

/// Handler for POST `/cascade`.
///
/// Resolves a selector change for any form.
async fn handle_resolve_cascade(
    AxumState(app_state): AxumState<AppState>,
    BearerSession { gate, .. }: BearerSession,
    payload: Result<Json<ResolveCascadeRequest>, JsonRejection>,
) -> Result<Json<ResolveCascadeResponse>, HttpError> {
    let Json(request) = payload?;
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(resolve_cascade(&mut persistence, &gate, &request)?))
}

// ============================================================================
// Catalog
// ============================================================================

async fn handle_list_unit_measures(
    AxumState(app_state): AxumState<AppState>,
    BearerSession { gate, .. }: BearerSession,
) -> Result<Json<Vec<UnitMeasureInfo>>, HttpError> {
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(list_unit_measures(&mut persistence, &gate)?))
}

async fn handle_create_unit_measure(
    AxumState(app_state): AxumState<AppState>,
    BearerSession { gate, .. }: BearerSession,
    payload: Result<Json<CreateUnitMeasureRequest>, JsonRejection>,
) -> Result<Json<ActionSuccess>, HttpError> {
    let Json(request) = payload?;
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(create_unit_measure(&mut persistence, &gate, &request)?))
}

async fn handle_rename_unit_measure(
    AxumState(app_state): AxumState<AppState>,
    BearerSession { gate, .. }: BearerSession,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<RenameRequest>, JsonRejection>,
) -> Result<Json<ActionSuccess>, HttpError> {
    let Path(id) = path?;
    let Json(request) = payload?;
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(rename_unit_measure(
        &mut persistence,
        &gate,
        id,
        &request,
    )?))
}

async fn handle_delete_unit_measure(
    AxumState(app_state): AxumState<AppState>,
    BearerSession { gate, .. }: BearerSession,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<ActionSuccess>, HttpError> {
    let Path(id) = path?;
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(delete_unit_measure(&mut persistence, &gate, id)?))
}

async fn handle_list_items(
    AxumState(app_state): AxumState<AppState>,
    BearerSession { gate, .. }: BearerSession,
    query: Result<Query<ListItemsRequest>, QueryRejection>,
) -> Result<Json<ListItemsResponse>, HttpError> {
    let Query(request) = query?;
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(list_items(&mut persistence, &gate, &request)?))
}

async fn handle_get_item(
    AxumState(app_state): AxumState<AppState>,
    BearerSession { gate, .. }: BearerSession,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<ItemInfo>, HttpError> {
    let Path(item_id) = path?;
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(get_item(&mut persistence, &gate, item_id)?))
}

async fn handle_create_item(
    AxumState(app_state): AxumState<AppState>,
    BearerSession { gate, .. }: BearerSession,
    payload: Result<Json<ItemRequest>, JsonRejection>,
) -> Result<Json<SaveItemResponse>, HttpError> {
    let Json(request) = payload?;
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(create_item(&mut persistence, &gate, request)?))
}

async fn handle_update_item(
    AxumState(app_state): AxumState<AppState>,
    BearerSession { gate, .. }: BearerSession,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ItemRequest>, JsonRejection>,
) -> Result<Json<SaveItemResponse>, HttpError> {
    let Path(item_id) = path?;
    let Json(request) = payload?;
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(update_item(&mut persistence, &gate, item_id, request)?))
}

async fn handle_delete_item(
    AxumState(app_state): AxumState<AppState>,
    BearerSession { gate, .. }: BearerSession,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<ActionSuccess>, HttpError> {
    let Path(item_id) = path?;
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(delete_item(&mut persistence, &gate, item_id)?))
}

// ============================================================================
// Incidents
// ============================================================================

async fn handle_list_incidents(
    AxumState(app_state): AxumState<AppState>,
    BearerSession { gate, .. }: BearerSession,
    query: Result<Query<ListIncidentsRequest>, QueryRejection>,
) -> Result<Json<ListIncidentsResponse>, HttpError> {
    let Query(request) = query?;
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(list_incidents(&mut persistence, &gate, &request)?))
}

async fn handle_get_incident(
    AxumState(app_state): AxumState<AppState>,
    BearerSession { gate, .. }: BearerSession,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<IncidentInfo>, HttpError> {
    let Path(incident_id) = path?;
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(get_incident(&mut persistence, &gate, incident_id)?))
}

async fn handle_create_incident(
    AxumState(app_state): AxumState<AppState>,
    BearerSession { gate, .. }: BearerSession,
    payload: Result<Json<IncidentRequest>, JsonRejection>,
) -> Result<Json<SaveIncidentResponse>, HttpError> {
    let Json(request) = payload?;
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(create_incident(&mut persistence, &gate, &request)?))
}

async fn handle_update_incident(
    AxumState(app_state): AxumState<AppState>,
    BearerSession { gate, .. }: BearerSession,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<IncidentRequest>, JsonRejection>,
) -> Result<Json<SaveIncidentResponse>, HttpError> {
    let Path(incident_id) = path?;
    let Json(request) = payload?;
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(update_incident(
        &mut persistence,
        &gate,
        incident_id,
        &request,
    )?))
}

async fn handle_delete_incident(
    AxumState(app_state): AxumState<AppState>,
    BearerSession { gate, .. }: BearerSession,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<ActionSuccess>, HttpError> {
    let Path(incident_id) = path?;
    let mut persistence = app_state.persistence.lock().await;
    Ok(Json(delete_incident(&mut persistence, &gate, incident_id)?))
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/auth/bootstrap", post(handle_bootstrap))
        .route("/auth/login", post(handle_login))
        .route("/auth/logout", post(handle_logout))
        .route("/auth/whoami", get(handle_whoami))
        .route("/users", get(handle_list_users).post(handle_create_user))
        .route("/users/{user_id}", delete(handle_delete_user))
        .route("/users/{user_id}/role", put(handle_update_user_role))
        .route("/users/{user_id}/password", put(handle_change_password))
        .route("/nodes", post(handle_create_node))
        .route("/nodes/{level}", get(handle_list_nodes))
        .route(
            "/nodes/{level}/{id}",
            put(handle_rename_node).delete(handle_delete_node),
        )
        .route("/cascade", post(handle_resolve_cascade))
        .route(
            "/unit_measures",
            get(handle_list_unit_measures).post(handle_create_unit_measure),
        )
        .route(
            "/unit_measures/{id}",
            put(handle_rename_unit_measure).delete(handle_delete_unit_measure),
        )
        .route("/items", get(handle_list_items).post(handle_create_item))
        .route(
            "/items/{item_id}",
            get(handle_get_item)
                .put(handle_update_item)
                .delete(handle_delete_item),
        )
        .route(
            "/incidents",
            get(handle_list_incidents).post(handle_create_incident),
        )
        .route(
            "/incidents/{incident_id}",
            get(handle_get_incident)
                .put(handle_update_incident)
                .delete(handle_delete_incident),
        )
        .with_state(app_state)
}

fn open_persistence(database: Option<&str>) -> Result<Persistence, PersistenceError> {
    if let Some(db_path) = database {
        info!("Using file-based database at: {}", db_path);
        Persistence::new_with_file(db_path)
    } else {
        info!("Using in-memory database");
        Persistence::new_in_memory()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args: Args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Incident Registry Server");

    let persistence: Persistence = open_persistence(args.database.as_deref())?;
    let app_state: AppState = AppState {
        persistence: Arc::new(Mutex::new(persistence)),
    };

    let app: Router = build_router(app_state);

    let addr: SocketAddr = SocketAddr::new(args.bind, args.port);
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode as HttpStatusCode},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    const PASSWORD: &str = "Harbor-42x";

    /// Helper to create test app state with in-memory persistence.
    fn create_test_app_state() -> AppState {
        let persistence: Persistence =
            Persistence::new_in_memory().expect("Failed to create in-memory persistence");
        AppState {
            persistence: Arc::new(Mutex::new(persistence)),
        }
    }

    /// Sends one request and returns the status with the decoded body.
    ///
    /// `token` goes into a bearer `Authorization` header.
    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (HttpStatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let body: Body = body.map_or_else(Body::empty, |value| Body::from(value.to_string()));
        into_parts(app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()).await
    }

    async fn into_parts(response: Response) -> (HttpStatusCode, Value) {
        let status: HttpStatusCode = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);
        (status, value)
    }

    /// Logs in and returns the session token.
    async fn login_as(app: &Router, name: &str) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "name": name, "password": PASSWORD })),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Creates the root ADMIN and returns their session token.
    async fn bootstrap(app: &Router) -> String {
        let (status, _) = send(
            app,
            "POST",
            "/auth/bootstrap",
            None,
            Some(json!({
                "name": "root",
                "password": PASSWORD,
                "passwordConfirmation": PASSWORD,
                "role": "ADMIN",
            })),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        login_as(app, "root").await
    }

    async fn create_node(
        app: &Router,
        token: &str,
        level: &str,
        name: &str,
        parent_id: Option<i64>,
    ) -> i64 {
        let (status, body) = send(
            app,
            "POST",
            "/nodes",
            Some(token),
            Some(json!({ "level": level, "name": name, "parentId": parent_id })),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK, "{body}");
        body["id"].as_i64().unwrap()
    }

    /// A seeded registry and the root token.
    struct Seeded {
        token: String,
        variable: i64,
        category: i64,
        province: i64,
        municipality: i64,
        unit: i64,
        item: i64,
    }

    async fn seed(app: &Router) -> Seeded {
        let token: String = bootstrap(app).await;
        let variable: i64 = create_node(app, &token, "variable", "Reclamos Sociales", None).await;
        let category: i64 =
            create_node(app, &token, "category", "Transporte", Some(variable)).await;
        let province: i64 = create_node(app, &token, "province", "La Habana", None).await;
        let municipality: i64 =
            create_node(app, &token, "municipality", "Centro Habana", Some(province)).await;

        let (_, body) = send(
            app,
            "POST",
            "/unit_measures",
            Some(&token),
            Some(json!({ "name": "Unidad" })),
        )
        .await;
        let unit: i64 = body["id"].as_i64().unwrap();

        let (status, body) = send(
            app,
            "POST",
            "/items",
            Some(&token),
            Some(json!({
                "productName": "Pasaje",
                "variableId": variable,
                "categoryId": category,
                "unitMeasureIds": [unit],
            })),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK, "{body}");
        let item: i64 = body["itemId"].as_i64().unwrap();

        Seeded {
            token,
            variable,
            category,
            province,
            municipality,
            unit,
            item,
        }
    }

    fn incident_body(seeded: &Seeded, quantity: f64) -> Value {
        json!({
            "date": "2024-05-02",
            "title": "Bus delayed",
            "description": "Route 27 ran two hours late",
            "provinceId": seeded.province,
            "municipalityId": seeded.municipality,
            "variableId": seeded.variable,
            "categoryId": seeded.category,
            "numberOfPeople": 5,
            "amount": 0.0,
            "items": [
                { "itemId": seeded.item, "quantityUsed": quantity, "unitMeasureId": seeded.unit }
            ],
        })
    }

    #[tokio::test]
    async fn test_bootstrap_then_whoami() {
        let app: Router = build_router(create_test_app_state());
        let token: String = bootstrap(&app).await;

        let (status, body) = send(&app, "GET", "/auth/whoami", Some(&token), None).await;

        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(body["name"], json!("root"));
        assert_eq!(body["role"], json!("ADMIN"));
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthenticated() {
        let app: Router = build_router(create_test_app_state());
        bootstrap(&app).await;

        let (status, body) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({ "name": "root", "password": "Not-the-one-1" })),
        )
        .await;

        assert_eq!(status, HttpStatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], json!(false));
        assert!(body.get("token").is_none());
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthenticated() {
        let app: Router = build_router(create_test_app_state());
        bootstrap(&app).await;

        let (status, body) = send(&app, "GET", "/nodes/variable", None, None).await;

        assert_eq!(status, HttpStatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["kind"], json!("Unauthorized"));
    }

    #[tokio::test]
    async fn test_unknown_token_is_unauthenticated() {
        let app: Router = build_router(create_test_app_state());
        bootstrap(&app).await;

        let (status, _) = send(&app, "GET", "/auth/whoami", Some("ghost"), None).await;

        assert_eq!(status, HttpStatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_forwarded_user_header_grants_nothing() {
        let app: Router = build_router(create_test_app_state());
        bootstrap(&app).await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/nodes")
                    .header("content-type", "application/json")
                    .header("x-forwarded-user", "root")
                    .body(Body::from(
                        json!({ "level": "variable", "name": "Salud" }).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        let (status, body) = into_parts(response).await;

        assert_eq!(status, HttpStatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn test_non_bearer_authorization_is_unauthenticated() {
        let app: Router = build_router(create_test_app_state());
        let token: String = bootstrap(&app).await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/auth/whoami")
                    .header("authorization", format!("Basic {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let (status, body) = into_parts(response).await;

        assert_eq!(status, HttpStatusCode::UNAUTHORIZED);
        assert_eq!(body["kind"], json!("Unauthorized"));
    }

    #[tokio::test]
    async fn test_logout_revokes_token() {
        let app: Router = build_router(create_test_app_state());
        let token: String = bootstrap(&app).await;

        let (status, body) = send(&app, "POST", "/auth/logout", Some(&token), None).await;
        assert_eq!(status, HttpStatusCode::OK, "{body}");

        let (status, _) = send(&app, "GET", "/auth/whoami", Some(&token), None).await;
        assert_eq!(status, HttpStatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_duplicate_node_is_conflict() {
        let app: Router = build_router(create_test_app_state());
        let token: String = bootstrap(&app).await;
        create_node(&app, &token, "variable", "Servicios", None).await;

        let (status, body) = send(
            &app,
            "POST",
            "/nodes",
            Some(&token),
            Some(json!({ "level": "variable", "name": " servicios " })),
        )
        .await;

        assert_eq!(status, HttpStatusCode::CONFLICT);
        assert_eq!(body["kind"], json!("DuplicateName"));
        assert_eq!(body["field"], json!("name"));
    }

    #[tokio::test]
    async fn test_list_children_by_parent() {
        let app: Router = build_router(create_test_app_state());
        let seeded: Seeded = seed(&app).await;

        let uri: String = format!("/nodes/category?parentId={}", seeded.variable);
        let (status, body) = send(&app, "GET", &uri, Some(&seeded.token), None).await;

        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(body["nodes"][0]["name"], json!("Transporte"));
    }

    #[tokio::test]
    async fn test_simple_user_cannot_change_taxonomy() {
        let app: Router = build_router(create_test_app_state());
        let root: String = bootstrap(&app).await;
        let (status, _) = send(
            &app,
            "POST",
            "/users",
            Some(&root),
            Some(json!({
                "name": "clerk",
                "password": PASSWORD,
                "passwordConfirmation": PASSWORD,
                "role": "SIMPLE",
            })),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK);
        let clerk: String = login_as(&app, "clerk").await;

        let (status, body) = send(
            &app,
            "POST",
            "/nodes",
            Some(&clerk),
            Some(json!({ "level": "variable", "name": "Salud" })),
        )
        .await;

        assert_eq!(status, HttpStatusCode::FORBIDDEN);
        assert_eq!(body["kind"], json!("Unauthorized"));
    }

    #[tokio::test]
    async fn test_create_and_fetch_incident() {
        let app: Router = build_router(create_test_app_state());
        let seeded: Seeded = seed(&app).await;

        let (status, body) = send(
            &app,
            "POST",
            "/incidents",
            Some(&seeded.token),
            Some(incident_body(&seeded, 2.5)),
        )
        .await;
        assert_eq!(status, HttpStatusCode::OK, "{body}");
        let incident_id: i64 = body["incidentId"].as_i64().unwrap();

        let uri: String = format!("/incidents/{incident_id}");
        let (status, body) = send(&app, "GET", &uri, Some(&seeded.token), None).await;

        assert_eq!(status, HttpStatusCode::OK);
        assert_eq!(body["title"], json!("Bus delayed"));
        assert_eq!(body["items"][0]["quantityUsed"], json!(2.5));
    }

    #[tokio::test]
    async fn test_invalid_line_item_is_unprocessable() {
        let app: Router = build_router(create_test_app_state());
        let seeded: Seeded = seed(&app).await;

        let (status, body) = send(
            &app,
            "POST",
            "/incidents",
            Some(&seeded.token),
            Some(incident_body(&seeded, 0.0)),
        )
        .await;

        assert_eq!(status, HttpStatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], json!("InvalidLineItem"));
        assert_eq!(body["field"], json!("items[0].quantityUsed"));

        let (_, listed) = send(&app, "GET", "/incidents", Some(&seeded.token), None).await;
        assert_eq!(listed["total"], json!(0));
    }

    #[tokio::test]
    async fn test_missing_incident_is_not_found() {
        let app: Router = build_router(create_test_app_state());
        let token: String = bootstrap(&app).await;

        let (status, body) = send(&app, "GET", "/incidents/99", Some(&token), None).await;

        assert_eq!(status, HttpStatusCode::NOT_FOUND);
        assert_eq!(body["kind"], json!("NotFound"));
        assert!(body.get("field").is_none());
    }

    #[tokio::test]
    async fn test_malformed_path_id_is_bad_request() {
        let app: Router = build_router(create_test_app_state());
        let token: String = bootstrap(&app).await;

        let (status, body) = send(&app, "GET", "/incidents/abc", Some(&token), None).await;

        assert_eq!(status, HttpStatusCode::BAD_REQUEST);
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["kind"], json!("InvalidField"));
        assert_eq!(body["field"], json!("path"));

        let (status, body) = send(&app, "DELETE", "/nodes/variable/x1", Some(&token), None).await;
        assert_eq!(status, HttpStatusCode::BAD_REQUEST);
        assert_eq!(body["field"], json!("path"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let app: Router = build_router(create_test_app_state());
        let token: String = bootstrap(&app).await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/nodes")
                    .header("content-type", "application/json")
                    .header("authorization", format!("Bearer {token}"))
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), HttpStatusCode::BAD_REQUEST);
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let failure: ActionFailure = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(failure.kind, FailureKind::InvalidField);
        assert_eq!(failure.field.as_deref(), Some("body"));
    }

    #[tokio::test]
    async fn test_cascade_reports_next_options() {
        let app: Router = build_router(create_test_app_state());
        let seeded: Seeded = seed(&app).await;

        let (status, body) = send(
            &app,
            "POST",
            "/cascade",
            Some(&seeded.token),
            Some(json!({
                "selection": { "variableId": seeded.variable },
                "changed": "variable",
            })),
        )
        .await;

        assert_eq!(status, HttpStatusCode::OK, "{body}");
        assert_eq!(body["nextLevel"], json!("category"));
        assert_eq!(body["options"][0]["id"], json!(seeded.category));
    }
}

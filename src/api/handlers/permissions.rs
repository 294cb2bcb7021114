//! Permission management handlers.

use axum::{
    extract::{Extension, Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::api::middleware::auth::CurrentUser;
use crate::api::SharedState;
use crate::error::Result;
use crate::models::matrix::PermissionMatrix;
use crate::models::permission::{Capability, GrantInput, PermissionGrant};
use crate::services::permission_service::UserGrants;

/// Create permission routes
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/resources", get(list_resources))
        .route(
            "/users/:id",
            get(get_user_permissions).put(replace_user_permissions),
        )
}

fn manage_cap() -> Capability {
    Capability::new("usuarios", "gerenciar_permissoes")
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogResourceResponse {
    pub resource: String,
    pub operations: Vec<String>,
    pub total: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogResponse {
    pub resources: Vec<CatalogResourceResponse>,
    pub total_entries: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserPermissionsResponse {
    pub user_id: i64,
    pub is_super_admin: bool,
    pub grants: Vec<PermissionGrant>,
    /// Dense resource -> operation -> allowed map covering the whole catalog
    #[schema(value_type = Object)]
    pub matrix: PermissionMatrix,
    pub active_count: usize,
    pub total_count: usize,
}

fn to_permissions_response(state: &SharedState, view: UserGrants) -> UserPermissionsResponse {
    UserPermissionsResponse {
        user_id: view.user.id,
        is_super_admin: view.user.is_super_admin,
        grants: view.grants,
        active_count: view.matrix.count_active(),
        total_count: state.catalog.total_entry_count(),
        matrix: view.matrix,
    }
}

/// Full matrix of catalog resources and operations
#[utoipa::path(
    get,
    path = "/resources",
    context_path = "/api/v1/permissions",
    tag = "permissions",
    responses(
        (status = 200, description = "Permission catalog", body = CatalogResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_resources(
    State(state): State<SharedState>,
    Extension(_current): Extension<CurrentUser>,
) -> Result<Json<CatalogResponse>> {
    let resources: Vec<CatalogResourceResponse> = state
        .catalog
        .resources()
        .iter()
        .map(|r| CatalogResourceResponse {
            resource: r.name.clone(),
            operations: r.operations.clone(),
            total: r.operations.len(),
        })
        .collect();

    Ok(Json(CatalogResponse {
        total_entries: state.catalog.total_entry_count(),
        resources,
    }))
}

/// A user's stored grants plus the dense editing matrix
#[utoipa::path(
    get,
    path = "/users/{id}",
    context_path = "/api/v1/permissions",
    tag = "permissions",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User permissions", body = UserPermissionsResponse),
        (status = 404, description = "Unknown user")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user_permissions(
    State(state): State<SharedState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<UserPermissionsResponse>> {
    state.gate.require(&current.0, &[manage_cap()]).await?;

    let view = state.permissions.grants_for_user(id).await?;
    Ok(Json(to_permissions_response(&state, view)))
}

/// Replace all of a user's grants with the submitted set
#[utoipa::path(
    put,
    path = "/users/{id}",
    context_path = "/api/v1/permissions",
    tag = "permissions",
    params(("id" = i64, Path, description = "User id")),
    request_body = Vec<GrantInput>,
    responses(
        (status = 200, description = "Updated permissions", body = UserPermissionsResponse),
        (status = 400, description = "Grant outside the catalog"),
        (status = 404, description = "Unknown user")
    ),
    security(("bearer_auth" = []))
)]
pub async fn replace_user_permissions(
    State(state): State<SharedState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<Vec<GrantInput>>,
) -> Result<Json<UserPermissionsResponse>> {
    state.gate.require(&current.0, &[manage_cap()]).await?;

    let view = state
        .permissions
        .replace_for_user(id, payload, current.0.id)
        .await?;
    Ok(Json(to_permissions_response(&state, view)))
}

#[derive(OpenApi)]
#[openapi(
    paths(list_resources, get_user_permissions, replace_user_permissions),
    components(schemas(
        CatalogResourceResponse,
        CatalogResponse,
        UserPermissionsResponse,
        PermissionGrant,
        GrantInput,
    ))
)]
pub struct PermissionsApiDoc;

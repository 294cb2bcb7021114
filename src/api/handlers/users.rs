//! User management handlers.

use axum::{
    extract::{Extension, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, OpenApi, ToSchema};

use crate::api::dto::Pagination;
use crate::api::middleware::auth::CurrentUser;
use crate::api::SharedState;
use crate::error::Result;
use crate::models::assignment::ReassignmentCounts;
use crate::models::permission::Capability;
use crate::models::user::{User, UserFilter};
use crate::services::user_service::{CreateUser, UpdateUser};

/// Create user routes
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).patch(update_user))
        .route("/:id/deactivate", post(deactivate_user))
        .route("/:id/reactivate", post(reactivate_user))
}

fn cap(operation: &str) -> Capability {
    Capability::new("usuarios", operation)
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListUsersQuery {
    pub search: Option<String>,
    pub active: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub full_name: String,
    pub display_name: String,
    pub email: String,
    /// Optional - will auto-generate if not provided
    pub password: Option<String>,
    pub is_super_admin: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_super_admin: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub full_name: String,
    pub display_name: String,
    pub email: String,
    pub is_super_admin: bool,
    pub active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateUserResponse {
    pub user: UserResponse,
    /// Only returned when the password was auto-generated
    pub generated_password: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserListResponse {
    pub items: Vec<UserResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeactivateResponse {
    pub user_id: i64,
    /// How many records of each kind were unassigned
    pub counts: ReassignmentCounts,
    pub total_unassigned: i64,
}

pub(crate) fn user_to_response(user: User) -> UserResponse {
    UserResponse {
        id: user.id,
        full_name: user.full_name,
        display_name: user.display_name,
        email: user.email,
        is_super_admin: user.is_super_admin,
        active: user.active,
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

/// List users
#[utoipa::path(
    get,
    path = "",
    context_path = "/api/v1/users",
    tag = "users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "List of users", body = UserListResponse),
        (status = 403, description = "Missing capability")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    State(state): State<SharedState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<UserListResponse>> {
    state.gate.require(&current.0, &[cap("listar")]).await?;

    let filter = UserFilter {
        search: query.search,
        active: query.active,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(50),
    };
    let (users, total) = state.users.list(&filter).await?;

    Ok(Json(UserListResponse {
        items: users.into_iter().map(user_to_response).collect(),
        pagination: Pagination::new(filter.page(), filter.per_page(), total),
    }))
}

/// Create user
#[utoipa::path(
    post,
    path = "",
    context_path = "/api/v1/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "User created", body = CreateUserResponse),
        (status = 409, description = "Email already in use")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_user(
    State(state): State<SharedState>,
    Extension(current): Extension<CurrentUser>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<CreateUserResponse>> {
    state.gate.require(&current.0, &[cap("criar")]).await?;

    let (user, generated_password) = state
        .users
        .create(
            CreateUser {
                full_name: payload.full_name,
                display_name: payload.display_name,
                email: payload.email,
                password: payload.password,
                is_super_admin: payload.is_super_admin.unwrap_or(false),
            },
            current.0.id,
        )
        .await?;

    Ok(Json(CreateUserResponse {
        user: user_to_response(user),
        generated_password,
    }))
}

/// Get user by id
#[utoipa::path(
    get,
    path = "/{id}",
    context_path = "/api/v1/users",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User details", body = UserResponse),
        (status = 404, description = "Unknown user")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    State(state): State<SharedState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>> {
    state.gate.require(&current.0, &[cap("visualizar")]).await?;
    let user = state.users.get(id).await?;
    Ok(Json(user_to_response(user)))
}

/// Update user profile
#[utoipa::path(
    patch,
    path = "/{id}",
    context_path = "/api/v1/users",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 404, description = "Unknown user")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    State(state): State<SharedState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>> {
    state.gate.require(&current.0, &[cap("editar")]).await?;

    let user = state
        .users
        .update(
            id,
            UpdateUser {
                full_name: payload.full_name,
                display_name: payload.display_name,
                email: payload.email,
                password: payload.password,
                is_super_admin: payload.is_super_admin,
            },
            current.0.id,
        )
        .await?;

    Ok(Json(user_to_response(user)))
}

/// Deactivate a user, unassigning all business records they are
/// responsible for
#[utoipa::path(
    post,
    path = "/{id}/deactivate",
    context_path = "/api/v1/users",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User deactivated", body = DeactivateResponse),
        (status = 404, description = "Unknown user")
    ),
    security(("bearer_auth" = []))
)]
pub async fn deactivate_user(
    State(state): State<SharedState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<DeactivateResponse>> {
    state
        .gate
        .require(&current.0, &[cap("ativar_desativar")])
        .await?;

    let counts = state.users.deactivate(id, current.0.id).await?;

    Ok(Json(DeactivateResponse {
        user_id: id,
        counts,
        total_unassigned: counts.total(),
    }))
}

/// Reactivate a previously deactivated user
#[utoipa::path(
    post,
    path = "/{id}/reactivate",
    context_path = "/api/v1/users",
    tag = "users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User reactivated", body = UserResponse),
        (status = 404, description = "Unknown user")
    ),
    security(("bearer_auth" = []))
)]
pub async fn reactivate_user(
    State(state): State<SharedState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>> {
    state
        .gate
        .require(&current.0, &[cap("ativar_desativar")])
        .await?;

    let user = state.users.reactivate(id, current.0.id).await?;
    Ok(Json(user_to_response(user)))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list_users,
        create_user,
        get_user,
        update_user,
        deactivate_user,
        reactivate_user,
    ),
    components(schemas(
        CreateUserRequest,
        UpdateUserRequest,
        UserResponse,
        CreateUserResponse,
        UserListResponse,
        DeactivateResponse,
        ReassignmentCounts,
        Pagination,
    ))
)]
pub struct UsersApiDoc;

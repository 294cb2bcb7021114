//! Authentication handlers.

use axum::{
    extract::{Extension, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::api::handlers::users::{user_to_response, UserResponse};
use crate::api::middleware::auth::CurrentUser;
use crate::api::SharedState;
use crate::error::Result;

/// Create public auth routes (no auth required)
pub fn public_router() -> Router<SharedState> {
    Router::new().route("/login", post(login))
}

/// Create protected auth routes (auth required)
pub fn protected_router() -> Router<SharedState> {
    Router::new().route("/me", get(get_current_user))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: UserResponse,
}

/// Login with credentials
#[utoipa::path(
    post,
    path = "/login",
    context_path = "/api/v1/auth",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<SharedState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let (user, issued) = state.sessions.login(&payload.email, &payload.password).await?;

    Ok(Json(LoginResponse {
        access_token: issued.token,
        token_type: "Bearer".to_string(),
        expires_in: issued.expires_in,
        user: user_to_response(user),
    }))
}

/// Get current user info
#[utoipa::path(
    get,
    path = "/me",
    context_path = "/api/v1/auth",
    tag = "auth",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_current_user(
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<UserResponse>> {
    Ok(Json(user_to_response(current.0)))
}

#[derive(OpenApi)]
#[openapi(
    paths(login, get_current_user),
    components(schemas(LoginRequest, LoginResponse))
)]
pub struct AuthApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_deserialize() {
        let json = r#"{"email":"ana@escritorio.adv.br","password":"secret"}"#;
        let req: LoginRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.email, "ana@escritorio.adv.br");
        assert_eq!(req.password, "secret");
    }
}

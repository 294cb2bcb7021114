//! Authentication middleware.
//!
//! Extracts the bearer token and resolves it through the authorization
//! gate (session -> opaque principal -> active user). Capability checks
//! happen per-handler; this layer only establishes *who* is calling.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::SharedState;
use crate::error::AppError;
use crate::models::user::User;

/// Extension holding the authenticated caller's user row.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Extract a bearer token from the Authorization header
fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Authentication middleware function - requires a valid session
pub async fn auth_middleware(
    State(state): State<SharedState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(&request) else {
        return AppError::Unauthenticated("missing bearer token".into()).into_response();
    };

    match state.gate.resolve_user(token).await {
        Ok(user) => {
            request.extensions_mut().insert(CurrentUser(user));
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}

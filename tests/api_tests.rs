//! HTTP layer tests: routing, auth middleware and handler behavior,
//! driven through the router with an in-memory backend.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use common::{seed_grants, seed_user, test_context, token_for, TestContext};
use praxis_backend::api::routes::create_router;
use praxis_backend::models::assignment::AssignableKind;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn send_json(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn app(ctx: &TestContext) -> axum::Router {
    create_router(ctx.state.clone())
}

#[tokio::test]
async fn health_is_public() {
    let ctx = test_context();
    let response = app(&ctx).oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "not_configured");
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let ctx = test_context();
    let router = app(&ctx);

    for uri in ["/api/v1/users", "/api/v1/auth/me", "/api/v1/permissions/resources"] {
        let response = router.clone().oneshot(get(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "uri: {uri}");
    }
}

#[tokio::test]
async fn login_returns_token_usable_on_me() {
    let ctx = test_context();
    seed_user(&ctx, "ana@escritorio.adv.br", "senha123", false).await;
    let router = app(&ctx);

    let response = router
        .clone()
        .oneshot(send_json(
            "POST",
            "/api/v1/auth/login",
            None,
            json!({"email": "ana@escritorio.adv.br", "password": "senha123"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["email"], "ana@escritorio.adv.br");
    let token = body["access_token"].as_str().unwrap().to_string();

    let me = router
        .clone()
        .oneshot(get("/api/v1/auth/me", Some(&token)))
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::OK);
    let me_body = body_json(me).await;
    assert_eq!(me_body["email"], "ana@escritorio.adv.br");
}

#[tokio::test]
async fn login_with_bad_password_is_401_with_generic_body() {
    let ctx = test_context();
    seed_user(&ctx, "ana@escritorio.adv.br", "senha123", false).await;

    let response = app(&ctx)
        .oneshot(send_json(
            "POST",
            "/api/v1/auth/login",
            None,
            json!({"email": "ana@escritorio.adv.br", "password": "errada"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["code"], "AUTH_ERROR");
}

#[tokio::test]
async fn missing_capability_is_403_without_naming_it() {
    let ctx = test_context();
    let user = seed_user(&ctx, "ana@escritorio.adv.br", "senha123", false).await;
    let token = token_for(&ctx, &user);

    let response = app(&ctx)
        .oneshot(get("/api/v1/users", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = body_json(response).await;
    assert_eq!(body["code"], "FORBIDDEN");
    // The body must not leak which capability was missing
    let message = body["message"].as_str().unwrap();
    assert!(!message.contains("usuarios"));
    assert!(!message.contains("listar"));
}

#[tokio::test]
async fn user_with_capability_can_list_users() {
    let ctx = test_context();
    let user = seed_user(&ctx, "ana@escritorio.adv.br", "senha123", false).await;
    seed_grants(&ctx, &user, &[("usuarios", "listar")]).await;
    let token = token_for(&ctx, &user);

    let response = app(&ctx)
        .oneshot(get("/api/v1/users", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["items"][0]["email"], "ana@escritorio.adv.br");
}

#[tokio::test]
async fn super_admin_full_permission_management_flow() {
    let ctx = test_context();
    let admin = seed_user(&ctx, "root@escritorio.adv.br", "senha123", true).await;
    let user = seed_user(&ctx, "ana@escritorio.adv.br", "senha123", false).await;
    let token = token_for(&ctx, &admin);
    let router = app(&ctx);

    // Catalog overview
    let resources = router
        .clone()
        .oneshot(get("/api/v1/permissions/resources", Some(&token)))
        .await
        .unwrap();
    assert_eq!(resources.status(), StatusCode::OK);
    let resources_body = body_json(resources).await;
    assert_eq!(resources_body["total_entries"], 132);

    // Replace the user's grants
    let put = router
        .clone()
        .oneshot(send_json(
            "PUT",
            &format!("/api/v1/permissions/users/{}", user.id),
            Some(&token),
            json!([
                {"resource": "contratos", "operation": "listar"},
                {"resource": "contratos", "operation": "editar"}
            ]),
        ))
        .await
        .unwrap();
    assert_eq!(put.status(), StatusCode::OK);
    let put_body = body_json(put).await;
    assert_eq!(put_body["active_count"], 2);
    assert_eq!(put_body["total_count"], 132);
    assert_eq!(put_body["matrix"]["contratos"]["listar"], true);
    assert_eq!(put_body["matrix"]["contratos"]["deletar"], false);

    // Read them back
    let got = router
        .clone()
        .oneshot(get(
            &format!("/api/v1/permissions/users/{}", user.id),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(got.status(), StatusCode::OK);
    let got_body = body_json(got).await;
    assert_eq!(got_body["grants"].as_array().unwrap().len(), 2);
    assert_eq!(got_body["is_super_admin"], false);
}

#[tokio::test]
async fn replacing_with_catalog_invalid_pair_is_400() {
    let ctx = test_context();
    let admin = seed_user(&ctx, "root@escritorio.adv.br", "senha123", true).await;
    let user = seed_user(&ctx, "ana@escritorio.adv.br", "senha123", false).await;
    let token = token_for(&ctx, &admin);

    let response = app(&ctx)
        .oneshot(send_json(
            "PUT",
            &format!("/api/v1/permissions/users/{}", user.id),
            Some(&token),
            json!([{"resource": "contratos", "operation": "explodir"}]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deactivate_endpoint_reports_counts() {
    let ctx = test_context();
    let admin = seed_user(&ctx, "root@escritorio.adv.br", "senha123", true).await;
    let user = seed_user(&ctx, "ana@escritorio.adv.br", "senha123", false).await;
    ctx.store.seed_assignments(AssignableKind::Processos, user.id, 3);
    ctx.store.seed_assignments(AssignableKind::Audiencias, user.id, 1);
    let token = token_for(&ctx, &admin);
    let router = app(&ctx);

    let response = router
        .clone()
        .oneshot(send_json(
            "POST",
            &format!("/api/v1/users/{}/deactivate", user.id),
            Some(&token),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["counts"]["processos"], 3);
    assert_eq!(body["counts"]["audiencias"], 1);
    assert_eq!(body["counts"]["contratos"], 0);
    assert_eq!(body["total_unassigned"], 4);

    // The deactivated user's old session no longer passes the gate
    let stale = token_for(&ctx, &user);
    let denied = router
        .clone()
        .oneshot(get("/api/v1/auth/me", Some(&stale)))
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

    // Reactivation brings the account back without restoring assignments
    let reactivated = router
        .clone()
        .oneshot(send_json(
            "POST",
            &format!("/api/v1/users/{}/reactivate", user.id),
            Some(&token),
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(reactivated.status(), StatusCode::OK);
    let body = body_json(reactivated).await;
    assert_eq!(body["active"], true);
    assert_eq!(ctx.store.assignments_referencing(user.id), 0);
}

#[tokio::test]
async fn create_user_via_api_returns_generated_password() {
    let ctx = test_context();
    let admin = seed_user(&ctx, "root@escritorio.adv.br", "senha123", true).await;
    let token = token_for(&ctx, &admin);

    let response = app(&ctx)
        .oneshot(send_json(
            "POST",
            "/api/v1/users",
            Some(&token),
            json!({
                "full_name": "Bruno Lima",
                "display_name": "Bruno",
                "email": "bruno@escritorio.adv.br"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["user"]["email"], "bruno@escritorio.adv.br");
    assert_eq!(body["generated_password"].as_str().unwrap().len(), 16);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let ctx = test_context();
    let response = app(&ctx)
        .oneshot(get("/api/v1/openapi.json", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body["paths"]["/api/v1/users"].is_object());
}

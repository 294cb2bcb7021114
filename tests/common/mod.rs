//! Common test utilities: application state over the in-memory store,
//! plus user and session fixtures.

#![allow(dead_code)]

use std::sync::Arc;

use uuid::Uuid;

use praxis_backend::api::{AppState, SharedState};
use praxis_backend::auth::identity::JwtIdentityProvider;
use praxis_backend::catalog::PermissionCatalog;
use praxis_backend::config::Config;
use praxis_backend::models::permission::GrantInput;
use praxis_backend::models::user::{NewUser, User};
use praxis_backend::store::{GrantStore, MemoryAuditSink, MemoryStore, NoopCache, UserStore};

pub const TEST_JWT_SECRET: &str = "test-secret";

/// Low bcrypt cost keeps the suite fast; production uses DEFAULT_COST.
pub const TEST_BCRYPT_COST: u32 = 4;

pub struct TestContext {
    pub state: SharedState,
    pub store: Arc<MemoryStore>,
    pub audit: Arc<MemoryAuditSink>,
    pub identity: Arc<JwtIdentityProvider>,
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgresql://unused".into(),
        bind_address: "127.0.0.1:0".into(),
        jwt_secret: TEST_JWT_SECRET.into(),
        jwt_access_token_expiry_minutes: 30,
        admin_email: "admin@localhost".into(),
        admin_password: None,
    }
}

/// Assemble the full application state over the in-memory store.
pub fn test_context() -> TestContext {
    let catalog = Arc::new(PermissionCatalog::standard());
    let store = Arc::new(MemoryStore::new(catalog.clone()));
    let audit = Arc::new(MemoryAuditSink::new());
    let identity = Arc::new(JwtIdentityProvider::new(TEST_JWT_SECRET, 30));

    let state = Arc::new(AppState::assemble(
        test_config(),
        None,
        catalog,
        identity.clone(),
        store.clone(),
        store.clone(),
        audit.clone(),
        Arc::new(NoopCache),
    ));

    TestContext {
        state,
        store,
        audit,
        identity,
    }
}

/// Insert a user directly into the store.
pub async fn seed_user(
    ctx: &TestContext,
    email: &str,
    password: &str,
    is_super_admin: bool,
) -> User {
    let password_hash = bcrypt::hash(password, TEST_BCRYPT_COST).expect("bcrypt");
    ctx.store
        .insert(&NewUser {
            auth_identity: Uuid::new_v4().to_string(),
            full_name: format!("User {email}"),
            display_name: email.split('@').next().unwrap_or(email).to_string(),
            email: email.to_string(),
            password_hash: Some(password_hash),
            is_super_admin,
        })
        .await
        .expect("seed user")
}

/// Issue a session token for a seeded user.
pub fn token_for(ctx: &TestContext, user: &User) -> String {
    ctx.identity
        .issue(&user.auth_identity)
        .expect("issue token")
        .token
}

/// Store grants for a user, bypassing the HTTP layer.
pub async fn seed_grants(ctx: &TestContext, user: &User, grants: &[(&str, &str)]) {
    let inputs: Vec<GrantInput> = grants
        .iter()
        .map(|(resource, operation)| GrantInput::allowed(*resource, *operation))
        .collect();
    ctx.store
        .replace_for_user(user.id, &inputs)
        .await
        .expect("seed grants");
}

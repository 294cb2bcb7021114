//! API module - HTTP handlers and middleware.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;

use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::gate::AuthorizationGate;
use crate::auth::identity::JwtIdentityProvider;
use crate::catalog::PermissionCatalog;
use crate::config::Config;
use crate::services::{PermissionService, SessionService, UserService};
use crate::store::{AuditSink, CacheInvalidation, GrantStore, UserStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Present when running against PostgreSQL; used by the health check
    pub db: Option<PgPool>,
    pub catalog: Arc<PermissionCatalog>,
    pub gate: Arc<AuthorizationGate>,
    pub sessions: Arc<SessionService>,
    pub users: Arc<UserService>,
    pub permissions: Arc<PermissionService>,
}

impl AppState {
    /// Wire the gate and services from a set of collaborators. Production
    /// passes the PostgreSQL store for both store seams; tests pass the
    /// in-memory one.
    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        config: Config,
        db: Option<PgPool>,
        catalog: Arc<PermissionCatalog>,
        identity: Arc<JwtIdentityProvider>,
        user_store: Arc<dyn UserStore>,
        grant_store: Arc<dyn GrantStore>,
        audit: Arc<dyn AuditSink>,
        cache: Arc<dyn CacheInvalidation>,
    ) -> Self {
        let gate = Arc::new(AuthorizationGate::new(
            identity.clone(),
            user_store.clone(),
            grant_store.clone(),
            catalog.clone(),
        ));
        let sessions = Arc::new(SessionService::new(
            user_store.clone(),
            identity,
            audit.clone(),
        ));
        let users = Arc::new(UserService::new(
            user_store.clone(),
            audit.clone(),
            cache.clone(),
        ));
        let permissions = Arc::new(PermissionService::new(
            user_store,
            grant_store,
            catalog.clone(),
            audit,
            cache,
        ));

        Self {
            config,
            db,
            catalog,
            gate,
            sessions,
            users,
            permissions,
        }
    }
}

pub type SharedState = Arc<AppState>;

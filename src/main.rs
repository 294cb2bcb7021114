//! Praxis - Main Entry Point

use std::sync::Arc;

use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use praxis_backend::{
    api::{routes, AppState},
    auth::identity::JwtIdentityProvider,
    catalog::PermissionCatalog,
    config::Config,
    db,
    error::Result,
    services::user_service::CreateUser,
    store::{NoopCache, PgAuditSink, PgStore},
    telemetry,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    telemetry::init_tracing();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Starting Praxis backend");

    // Connect to database
    let db_pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations").run(&db_pool).await?;
    tracing::info!("Database migrations complete");

    // Wire the authorization core
    let catalog = Arc::new(PermissionCatalog::standard());
    let store = Arc::new(PgStore::new(db_pool.clone(), catalog.clone()));
    let audit = Arc::new(PgAuditSink::new(db_pool.clone()));
    let identity = Arc::new(JwtIdentityProvider::new(
        &config.jwt_secret,
        config.jwt_access_token_expiry_minutes,
    ));

    let state = Arc::new(AppState::assemble(
        config.clone(),
        Some(db_pool),
        catalog,
        identity,
        store.clone(),
        store,
        audit,
        Arc::new(NoopCache),
    ));

    // Provision the super admin on first boot
    provision_admin_user(&state).await?;

    // Build router with CORS and request tracing
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers(Any);

    let app = routes::create_router(state.clone())
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&state.config.bind_address).await?;
    tracing::info!("Listening on {}", state.config.bind_address);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the bootstrap super admin when the user table is empty.
async fn provision_admin_user(state: &AppState) -> Result<()> {
    if state.users.count().await? > 0 {
        return Ok(());
    }

    let (admin, generated_password) = state
        .users
        .provision(CreateUser {
            full_name: "Administrator".to_string(),
            display_name: "Admin".to_string(),
            email: state.config.admin_email.clone(),
            password: state.config.admin_password.clone(),
            is_super_admin: true,
        })
        .await?;

    match generated_password {
        // Printed once on first boot; change it immediately.
        Some(password) => tracing::warn!(
            email = %admin.email,
            password = %password,
            "Provisioned bootstrap super admin with generated password"
        ),
        None => tracing::info!(email = %admin.email, "Provisioned bootstrap super admin"),
    }

    Ok(())
}

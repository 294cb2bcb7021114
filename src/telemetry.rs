//! Telemetry initialization: tracing subscriber with env-filter control.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber.
///
/// The filter is taken from `RUST_LOG` when set; otherwise a sensible
/// default is used that keeps request tracing and query logging visible.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "praxis_backend=debug,tower_http=debug,sqlx::query=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

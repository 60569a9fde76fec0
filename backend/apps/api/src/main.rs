//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use std::sync::Arc;

use api::settings::Settings;
use api::wiring::{self, LiveApi};
use axum::{
    Router, http,
    http::{Method, header},
};
use platform::kv::{FileKvStore, KvStore};
use sqlx::postgres::PgPoolOptions;
use stats::domain::repository::CredentialProvider;
use stats::presentation::handlers::StatsAppState;
use stats::{PgSnapshotStore, stats_router};
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    api::init_tracing(std::io::stdout);

    let settings = Settings::from_env()?;
    let credential = wiring::load_credential()?;
    let credential_configured = credential.api_key().is_some();
    let stats_api = wiring::build_api(&settings.stats, credential)?;

    match settings.database_url.clone() {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&database_url)
                .await?;

            tracing::info!("Connected to database");

            // Run migrations
            sqlx::migrate!("../../../database/migrations")
                .run(&pool)
                .await?;

            tracing::info!("Migrations completed");

            let store = PgSnapshotStore::new(pool);
            serve(settings, stats_api, store, credential_configured).await
        }
        None => {
            let store = FileKvStore::open(&settings.cache_path).await?;
            tracing::info!(path = %settings.cache_path.display(), "Using file snapshot store");
            serve(settings, stats_api, store, credential_configured).await
        }
    }
}

async fn serve<K>(
    settings: Settings,
    stats_api: LiveApi,
    store: K,
    credential_configured: bool,
) -> anyhow::Result<()>
where
    K: KvStore + Sync + 'static,
{
    let computer = wiring::build_computer(stats_api, store, &settings.stats).await;

    let state = StatsAppState {
        computer,
        config: Arc::new(settings.stats.clone()),
        credential_configured,
    };

    let allowed_origins: Vec<http::HeaderValue> = settings
        .frontend_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([header::CONTENT_TYPE, header::ACCEPT]));

    // Build router
    let app = Router::new()
        .nest("/api/stats", stats_router(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    tracing::info!("Listening on {}", settings.bind_addr);

    let listener = TcpListener::bind(settings.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

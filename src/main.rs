use subpanel::{
    config::session::{validate_production_config, SessionConfig},
    config::Settings,
    db, routes,
    services::SecretsManager,
    AppState,
};

use std::net::SocketAddr;
use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "subpanel=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;
    validate_production_config()?;
    tracing::debug!(?settings, "configuration loaded");

    // Database connection
    let pool = db::create_pool(&settings.database_url).await?;
    db::run_migrations(&pool).await?;

    let secrets = SecretsManager::new()?;
    let addr = SocketAddr::from((settings.host.parse::<std::net::IpAddr>()?, settings.port));
    let app_state = AppState::new(pool.clone(), settings, secrets)?;

    // Session store
    let session_store = SqliteStore::new(pool).with_table_name("sessions")?;
    session_store.migrate().await?;
    let session_layer = SessionConfig::from_env().create_layer(session_store);

    let app = routes::app(app_state, session_layer);

    tracing::info!("Server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

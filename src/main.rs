use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use moviweb_api::{
    api::{create_router, AppState},
    config::Config,
    db::{create_pool, SqliteStore},
    services::OmdbLookup,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("moviweb_api=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;

    // Pool creation applies pending migrations
    let pool = create_pool(&config.database_url).await?;
    let store = Arc::new(SqliteStore::new(pool));

    let lookup = Arc::new(OmdbLookup::new(
        config.omdb_api_key.clone(),
        config.omdb_api_url.clone(),
        Duration::from_secs(config.lookup_timeout_secs),
    )?);

    let state = AppState::new(store, lookup);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!("Server running on http://{}:{}", config.host, config.port);
    axum::serve(listener, app).await?;

    Ok(())
}

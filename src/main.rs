use std::time::Duration;

use axum::Router;
use campuslink::{chat, cleanup, config::Config, feed, onboarding, realtime::ChangeFeed, store, AppState};
use sqlx::sqlite::SqlitePoolOptions;
use tower_http::cors::CorsLayer;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();
    let config = Config::load();

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::days(7)));

    let db_pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect(&config.database_url)
        .await?;
    store::init(&db_pool).await?;

    let changes = ChangeFeed::new(64);
    cleanup::spawn(
        db_pool.clone(),
        changes.clone(),
        Duration::from_secs(config.cleanup_interval_secs),
    );

    let app_state = AppState { db_pool, changes };

    let app = Router::new()
        .merge(onboarding::router())
        .merge(chat::router())
        .nest("/feed", feed::router())
        .with_state(app_state)
        .layer(session_layer)
        .layer(CorsLayer::permissive());

    log::info!("listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

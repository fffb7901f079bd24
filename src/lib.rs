pub mod appresult;
pub mod chat;
pub mod cleanup;
pub mod config;
pub mod feed;
pub mod icon;
pub mod onboarding;
pub mod realtime;
pub mod res;
pub mod session;
pub mod store;

use axum::extract::FromRef;
use sqlx::SqlitePool;

pub use appresult::{AppError, AppResult};

use realtime::ChangeFeed;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub changes: ChangeFeed,
}

use std::time::Duration;

use sqlx::SqlitePool;
use time::OffsetDateTime;

use crate::realtime::ChangeFeed;
use crate::store::{posts, StoreResult};

/// Delete every post whose expiration has passed.
pub async fn sweep(pool: &SqlitePool, changes: &ChangeFeed) -> StoreResult<u64> {
    posts::delete_expired(pool, changes, OffsetDateTime::now_utc()).await
}

/// Periodic sweep. Failures are logged and the loop keeps going.
pub fn spawn(pool: SqlitePool, changes: ChangeFeed, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            match sweep(&pool, &changes).await {
                Ok(0) => {}
                Ok(count) => log::info!("cleaned up {count} expired posts"),
                Err(err) => log::warn!("cleanup sweep failed: {err}"),
            }
        }
    });
}

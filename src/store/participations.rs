use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::realtime::{ChangeFeed, Op, Table};

use super::{StoreError, StoreResult};

/// A user has entered a post's chatroom. Append-only; never updated or
/// deleted by this system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Participation {
    pub user_id: String,
    pub post_id: i64,
}

/// Insert the (user, post) edge. `Conflict` means the pair already exists;
/// callers do not pre-check.
pub async fn insert(
    pool: &SqlitePool,
    changes: &ChangeFeed,
    user_id: &str,
    post_id: i64,
) -> StoreResult<()> {
    sqlx::query("INSERT INTO participations (user_id,post_id) VALUES (?,?)")
        .bind(user_id)
        .bind(post_id)
        .execute(pool)
        .await?;
    changes.publish(
        Table::Participations,
        Op::Insert,
        &Participation {
            user_id: user_id.to_owned(),
            post_id,
        },
    );
    Ok(())
}

/// Best-effort tracking. A duplicate join just means already-joined, and no
/// failure here may block the caller's flow.
pub async fn track(pool: &SqlitePool, changes: &ChangeFeed, user_id: &str, post_id: i64) {
    match insert(pool, changes, user_id, post_id).await {
        Ok(()) => {}
        Err(StoreError::Conflict) => {
            log::debug!("participation already tracked for post {post_id}");
        }
        Err(err) => {
            log::warn!("failed to track participation for post {post_id}: {err}");
        }
    }
}

pub async fn post_ids_for(pool: &SqlitePool, user_id: &str) -> StoreResult<Vec<i64>> {
    let rows: Vec<(i64,)> = sqlx::query_as("SELECT post_id FROM participations WHERE user_id=?")
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(rows.into_iter().map(|(post_id,)| post_id).collect())
}

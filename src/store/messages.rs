use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use time::OffsetDateTime;

use crate::icon::Icon;
use crate::realtime::{ChangeFeed, Op, Table};

use super::profiles::Profile;
use super::StoreResult;

/// One chat line. Immutable once written; `nickname`/`icon` are the
/// sender's snapshot at send time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ChatMessage {
    pub id: i64,
    pub post_id: i64,
    pub user_id: String,
    pub nickname: String,
    #[sqlx(try_from = "String")]
    pub icon: Icon,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

const COLUMNS: &str = "id,post_id,user_id,nickname,icon,message,created_at";

/// Full history for a post, oldest first. The id tiebreak keeps
/// equal-timestamp rows in insert order.
pub async fn for_post(pool: &SqlitePool, post_id: i64) -> StoreResult<Vec<ChatMessage>> {
    let sql = format!("SELECT {COLUMNS} FROM messages WHERE post_id=? ORDER BY created_at,id");
    Ok(sqlx::query_as::<_, ChatMessage>(&sql)
        .bind(post_id)
        .fetch_all(pool)
        .await?)
}

/// Store a message and publish the stored row. Subscribers — the sender
/// included — receive their copy through the change feed.
pub async fn send(
    pool: &SqlitePool,
    changes: &ChangeFeed,
    sender: &Profile,
    post_id: i64,
    message: String,
) -> StoreResult<ChatMessage> {
    let sql = format!(
        "INSERT INTO messages (post_id,user_id,nickname,icon,message,created_at) \
         VALUES (?,?,?,?,?,?) RETURNING {COLUMNS}"
    );
    let message = sqlx::query_as::<_, ChatMessage>(&sql)
        .bind(post_id)
        .bind(&sender.id)
        .bind(&sender.nickname)
        .bind(sender.icon.as_str())
        .bind(&message)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(pool)
        .await?;
    changes.publish(Table::Messages, Op::Insert, &message);
    Ok(message)
}

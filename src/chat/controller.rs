use sqlx::SqlitePool;

use crate::realtime::{ChangeEvent, ChangeFeed, EqFilter, Op, Subscription, Table};
use crate::store::messages::{self, ChatMessage};
use crate::store::posts::{self, Post};
use crate::store::profiles::Profile;
use crate::store::{participations, StoreResult};

/// Per-room state: the post, the ordered message list, and the draft being
/// typed.
pub struct ChatController {
    pool: SqlitePool,
    changes: ChangeFeed,
    viewer: Profile,
    post: Post,
    messages: Vec<ChatMessage>,
    draft: String,
}

impl ChatController {
    /// Load a room. `None` is the activity-not-found state. Entering tracks
    /// participation as a background side effect, duplicates tolerated.
    pub async fn load(
        pool: SqlitePool,
        changes: ChangeFeed,
        viewer: Profile,
        post_id: i64,
    ) -> StoreResult<Option<Self>> {
        let Some(post) = posts::by_id(&pool, post_id).await? else {
            return Ok(None);
        };
        let messages = messages::for_post(&pool, post_id).await?;
        participations::track(&pool, &changes, &viewer.id, post_id).await;
        Ok(Some(Self {
            pool,
            changes,
            viewer,
            post,
            messages,
            draft: String::new(),
        }))
    }

    /// Insert-events for this post only.
    pub fn subscribe(&self) -> Subscription {
        self.changes.subscribe(
            Table::Messages,
            &[Op::Insert],
            Some(EqFilter::new("post_id", self.post.id)),
        )
    }

    /// Append a delivered event in arrival order. The channel is already
    /// chronological, so no re-sort.
    pub fn apply(&mut self, event: &ChangeEvent) -> Option<&ChatMessage> {
        let message: ChatMessage = match serde_json::from_value(event.row.clone()) {
            Ok(message) => message,
            Err(err) => {
                log::warn!("discarding malformed message event: {err}");
                return None;
            }
        };
        self.messages.push(message);
        self.messages.last()
    }

    pub fn post(&self) -> &Post {
        &self.post
    }

    pub fn viewer(&self) -> &Profile {
        &self.viewer
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    /// Optimistic send: the draft clears immediately and is restored on
    /// failure so nothing typed is lost. The stored copy is not appended
    /// here — it arrives through the subscription like everyone else's.
    /// Returns false when the trimmed draft was empty.
    pub async fn send(&mut self) -> StoreResult<bool> {
        if self.draft.trim().is_empty() {
            return Ok(false);
        }
        let draft = std::mem::take(&mut self.draft);
        match messages::send(&self.pool, &self.changes, &self.viewer, self.post.id, draft.clone())
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => {
                self.draft = draft;
                Err(err)
            }
        }
    }
}

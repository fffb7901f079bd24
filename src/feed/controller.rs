use sqlx::SqlitePool;
use time::OffsetDateTime;

use crate::realtime::{ChangeFeed, Op, Subscription, Table};
use crate::store::posts::{self, CategoryFilter, Post};
use crate::store::profiles::Profile;
use crate::store::{participations, StoreResult};

use super::gesture::{Direction, Gesture};

/// What a committed swipe did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// Left: cursor advanced (or stayed on the last card). Nothing persisted.
    Skipped,
    /// Right: participation tracked, navigate to this post's chatroom. The
    /// cursor does not advance.
    EnterChat(i64),
}

/// The feed's state container: the filtered post list, the card cursor, the
/// category filter and the transient gesture.
pub struct FeedController {
    pool: SqlitePool,
    changes: ChangeFeed,
    viewer: Profile,
    filter: CategoryFilter,
    posts: Vec<Post>,
    cursor: usize,
    gesture: Gesture,
}

impl FeedController {
    pub async fn load(
        pool: SqlitePool,
        changes: ChangeFeed,
        viewer: Profile,
        filter: CategoryFilter,
    ) -> StoreResult<Self> {
        let posts = posts::active(&pool, filter, OffsetDateTime::now_utc()).await?;
        Ok(Self {
            pool,
            changes,
            viewer,
            filter,
            posts,
            cursor: 0,
            gesture: Gesture::default(),
        })
    }

    /// The post-table subscription driving the eager refetch strategy.
    pub fn subscribe(&self) -> Subscription {
        self.changes
            .subscribe(Table::Posts, &[Op::Insert, Op::Delete], None)
    }

    /// Re-run the whole fetch+filter. The cursor keeps its place, clamped to
    /// the new list length.
    pub async fn refetch(&mut self) -> StoreResult<()> {
        self.posts = posts::active(&self.pool, self.filter, OffsetDateTime::now_utc()).await?;
        if self.cursor > self.posts.len() {
            self.cursor = self.posts.len();
        }
        Ok(())
    }

    /// Switching categories resets the cursor and reloads.
    pub async fn set_filter(&mut self, filter: CategoryFilter) -> StoreResult<()> {
        self.filter = filter;
        self.cursor = 0;
        self.refetch().await
    }

    pub fn current(&self) -> Option<&Post> {
        self.posts.get(self.cursor)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn filter(&self) -> CategoryFilter {
        self.filter
    }

    pub fn viewer(&self) -> &Profile {
        &self.viewer
    }

    pub fn drag_offset(&self) -> f64 {
        self.gesture.offset()
    }

    /// Every card seen, or nothing to show: the terminal caught-up state.
    pub fn is_caught_up(&self) -> bool {
        self.cursor >= self.posts.len()
    }

    /// Restart-from-zero on the caught-up screen.
    pub fn restart(&mut self) {
        self.cursor = 0;
    }

    pub fn pointer_down(&mut self, x: f64) {
        self.gesture.pointer_down(x);
    }

    pub fn pointer_move(&mut self, x: f64) {
        self.gesture.pointer_move(x);
    }

    /// Finish a drag; a past-threshold release commits exactly like the
    /// buttons do.
    pub async fn pointer_up(&mut self) -> Option<Commit> {
        let direction = self.gesture.pointer_up()?;
        self.commit(direction).await
    }

    /// The committed-direction transition shared by gesture and buttons.
    /// `None` when there is no current card.
    pub async fn commit(&mut self, direction: Direction) -> Option<Commit> {
        let post_id = self.posts.get(self.cursor)?.id;
        match direction {
            Direction::Left => {
                if self.cursor + 1 < self.posts.len() {
                    self.cursor += 1;
                }
                Some(Commit::Skipped)
            }
            Direction::Right => {
                participations::track(&self.pool, &self.changes, &self.viewer.id, post_id).await;
                Some(Commit::EnterChat(post_id))
            }
        }
    }
}

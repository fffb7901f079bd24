use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use time::OffsetDateTime;

use crate::icon::Icon;
use crate::realtime::{ChangeFeed, Op, Table};

use super::profiles::Profile;
use super::StoreResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Category {
    Social,
    Study,
    Sports,
    Food,
    Other,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Social,
        Category::Study,
        Category::Sports,
        Category::Food,
        Category::Other,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "social" => Some(Category::Social),
            "study" => Some(Category::Study),
            "sports" => Some(Category::Sports),
            "food" => Some(Category::Food),
            "other" => Some(Category::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Social => "social",
            Category::Study => "study",
            Category::Sports => "sports",
            Category::Food => "food",
            Category::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Social => "💬 Social & Chat",
            Category::Study => "📚 Study & Work",
            Category::Sports => "🏃 Sports & Exercise",
            Category::Food => "🍽️ Food & Dining",
            Category::Other => "✨ Other Activity",
        }
    }
}

/// The feed's category narrowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn parse(raw: &str) -> Option<Self> {
        if raw == "all" {
            Some(CategoryFilter::All)
        } else {
            Category::parse(raw).map(CategoryFilter::Only)
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryFilter::All => "all",
            CategoryFilter::Only(category) => category.as_str(),
        }
    }

    pub fn matches(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(only) => *only == category,
        }
    }
}

/// An activity announcement. `nickname` and `icon` are snapshots of the
/// author's profile at creation time and do not track later edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub user_id: String,
    pub nickname: String,
    #[sqlx(try_from = "String")]
    pub icon: Icon,
    pub activity: String,
    pub category: Category,
    pub time: String,
    pub location: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub expiration_date: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Post {
    /// Active iff there is no expiration or it has not passed yet.
    pub fn is_active(&self, now: OffsetDateTime) -> bool {
        self.expiration_date.map_or(true, |expires| expires > now)
    }
}

pub struct NewPost {
    pub activity: String,
    pub category: Category,
    pub time: String,
    pub location: Option<String>,
    pub expiration_date: Option<OffsetDateTime>,
}

const COLUMNS: &str =
    "id,user_id,nickname,icon,activity,category,time,location,expiration_date,created_at";

pub async fn create(
    pool: &SqlitePool,
    changes: &ChangeFeed,
    author: &Profile,
    new: NewPost,
) -> StoreResult<Post> {
    let sql = format!(
        "INSERT INTO posts (user_id,nickname,icon,activity,category,time,location,expiration_date,created_at) \
         VALUES (?,?,?,?,?,?,?,?,?) RETURNING {COLUMNS}"
    );
    let post = sqlx::query_as::<_, Post>(&sql)
        .bind(&author.id)
        .bind(&author.nickname)
        .bind(author.icon.as_str())
        .bind(&new.activity)
        .bind(new.category)
        .bind(&new.time)
        .bind(new.location.as_deref())
        .bind(new.expiration_date)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(pool)
        .await?;
    changes.publish(Table::Posts, Op::Insert, &post);
    Ok(post)
}

/// Active posts for the feed, newest first. The category narrows in SQL;
/// expiry is applied to the fetched rows.
pub async fn active(
    pool: &SqlitePool,
    filter: CategoryFilter,
    now: OffsetDateTime,
) -> StoreResult<Vec<Post>> {
    let posts = match filter {
        CategoryFilter::All => {
            let sql = format!("SELECT {COLUMNS} FROM posts ORDER BY created_at DESC");
            sqlx::query_as::<_, Post>(&sql).fetch_all(pool).await?
        }
        CategoryFilter::Only(category) => {
            let sql =
                format!("SELECT {COLUMNS} FROM posts WHERE category=? ORDER BY created_at DESC");
            sqlx::query_as::<_, Post>(&sql)
                .bind(category)
                .fetch_all(pool)
                .await?
        }
    };
    Ok(posts
        .into_iter()
        .filter(|post| post.is_active(now))
        .collect())
}

pub async fn by_id(pool: &SqlitePool, id: i64) -> StoreResult<Option<Post>> {
    let sql = format!("SELECT {COLUMNS} FROM posts WHERE id=?");
    let post = sqlx::query_as::<_, Post>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(post)
}

pub async fn by_ids(pool: &SqlitePool, ids: &[i64]) -> StoreResult<Vec<Post>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = vec!["?"; ids.len()].join(",");
    let sql =
        format!("SELECT {COLUMNS} FROM posts WHERE id IN ({placeholders}) ORDER BY created_at DESC");
    let mut query = sqlx::query_as::<_, Post>(&sql);
    for id in ids {
        query = query.bind(*id);
    }
    Ok(query.fetch_all(pool).await?)
}

/// The cleanup sweep: delete every post whose expiration has passed and
/// publish a delete event for each.
pub async fn delete_expired(
    pool: &SqlitePool,
    changes: &ChangeFeed,
    now: OffsetDateTime,
) -> StoreResult<u64> {
    let sql = format!(
        "SELECT {COLUMNS} FROM posts WHERE expiration_date IS NOT NULL AND expiration_date < ?"
    );
    let expired = sqlx::query_as::<_, Post>(&sql)
        .bind(now)
        .fetch_all(pool)
        .await?;
    let mut deleted = 0u64;
    for post in &expired {
        let result = sqlx::query("DELETE FROM posts WHERE id=?")
            .bind(post.id)
            .execute(pool)
            .await?;
        if result.rows_affected() > 0 {
            deleted += 1;
            changes.publish(Table::Posts, Op::Delete, post);
        }
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_parsing() {
        assert_eq!(CategoryFilter::parse("all"), Some(CategoryFilter::All));
        assert_eq!(
            CategoryFilter::parse("study"),
            Some(CategoryFilter::Only(Category::Study))
        );
        assert_eq!(CategoryFilter::parse("parties"), None);
    }

    #[test]
    fn filter_matching() {
        assert!(CategoryFilter::All.matches(Category::Food));
        assert!(CategoryFilter::Only(Category::Food).matches(Category::Food));
        assert!(!CategoryFilter::Only(Category::Food).matches(Category::Study));
    }
}

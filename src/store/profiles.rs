use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::icon::Icon;
use crate::realtime::{ChangeFeed, Op, Table};

use super::StoreResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            "other" => Some(Gender::Other),
            _ => None,
        }
    }
}

/// A registered pseudonymous profile. Created once at first login, never
/// mutated or deleted afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub id: String,
    pub student_id: String,
    pub nickname: String,
    pub gender: Gender,
    #[sqlx(try_from = "String")]
    pub icon: Icon,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub struct NewProfile {
    pub student_id: String,
    pub nickname: String,
    pub gender: Gender,
    pub icon: Icon,
}

/// Lookup by the human-entered id. The unique constraint guarantees at most
/// one row.
pub async fn lookup(pool: &SqlitePool, student_id: &str) -> StoreResult<Option<Profile>> {
    let profile = sqlx::query_as::<_, Profile>(
        "SELECT id,student_id,nickname,gender,icon,created_at FROM profiles WHERE student_id=?",
    )
    .bind(student_id)
    .fetch_optional(pool)
    .await?;
    Ok(profile)
}

/// Fails with `Conflict` when the student id is already registered; never
/// writes a duplicate row.
pub async fn create(
    pool: &SqlitePool,
    changes: &ChangeFeed,
    new: NewProfile,
) -> StoreResult<Profile> {
    let profile = Profile {
        id: Uuid::now_v7().to_string(),
        student_id: new.student_id,
        nickname: new.nickname,
        gender: new.gender,
        icon: new.icon,
        created_at: OffsetDateTime::now_utc(),
    };
    sqlx::query(
        "INSERT INTO profiles (id,student_id,nickname,gender,icon,created_at) VALUES (?,?,?,?,?,?)",
    )
    .bind(&profile.id)
    .bind(&profile.student_id)
    .bind(&profile.nickname)
    .bind(profile.gender)
    .bind(profile.icon.as_str())
    .bind(profile.created_at)
    .execute(pool)
    .await?;
    changes.publish(Table::Profiles, Op::Insert, &profile);
    Ok(profile)
}

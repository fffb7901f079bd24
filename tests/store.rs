use campuslink::icon::Icon;
use campuslink::realtime::{ChangeFeed, Op, Table};
use campuslink::store::posts::{self, Category, CategoryFilter, NewPost};
use campuslink::store::profiles::{self, Gender, NewProfile, Profile};
use campuslink::store::{self, messages, participations, StoreError};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use time::{Duration, OffsetDateTime};

async fn pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    store::init(&pool).await.unwrap();
    pool
}

async fn register(pool: &SqlitePool, changes: &ChangeFeed, student_id: &str) -> Profile {
    profiles::create(
        pool,
        changes,
        NewProfile {
            student_id: student_id.to_owned(),
            nickname: "Fox".to_owned(),
            gender: Gender::Male,
            icon: Icon::parse("🦊"),
        },
    )
    .await
    .unwrap()
}

fn post_with_expiry(expiration_date: Option<OffsetDateTime>) -> NewPost {
    NewPost {
        activity: "Board games at the lounge".to_owned(),
        category: Category::Social,
        time: "Today 8 PM".to_owned(),
        location: None,
        expiration_date,
    }
}

#[tokio::test]
async fn profile_lookup_is_idempotent() {
    let pool = pool().await;
    let changes = ChangeFeed::new(8);
    let created = register(&pool, &changes, "202400001").await;

    let first = profiles::lookup(&pool, "202400001").await.unwrap().unwrap();
    let second = profiles::lookup(&pool, "202400001").await.unwrap().unwrap();
    assert_eq!(first.id, created.id);
    assert_eq!(first.id, second.id);
}

#[tokio::test]
async fn duplicate_student_id_fails_with_conflict() {
    let pool = pool().await;
    let changes = ChangeFeed::new(8);
    register(&pool, &changes, "202400001").await;

    let err = profiles::create(
        &pool,
        &changes,
        NewProfile {
            student_id: "202400001".to_owned(),
            nickname: "Impostor".to_owned(),
            gender: Gender::Other,
            icon: Icon::parse("🤖"),
        },
    )
    .await
    .unwrap_err();
    assert!(err.is_conflict(), "expected Conflict, got {err:?}");

    // No duplicate row slipped in.
    let found = profiles::lookup(&pool, "202400001").await.unwrap().unwrap();
    assert_eq!(found.nickname, "Fox");
}

#[tokio::test]
async fn missing_profile_lookup_is_none_not_an_error() {
    let pool = pool().await;
    assert!(profiles::lookup(&pool, "209900000").await.unwrap().is_none());
}

#[tokio::test]
async fn expired_posts_are_excluded_from_the_feed() {
    let pool = pool().await;
    let changes = ChangeFeed::new(8);
    let author = register(&pool, &changes, "202400001").await;
    let now = OffsetDateTime::now_utc();

    posts::create(
        &pool,
        &changes,
        &author,
        post_with_expiry(Some(now - Duration::hours(1))),
    )
    .await
    .unwrap();
    let live = posts::create(
        &pool,
        &changes,
        &author,
        post_with_expiry(Some(now + Duration::hours(1))),
    )
    .await
    .unwrap();
    let forever = posts::create(&pool, &changes, &author, post_with_expiry(None))
        .await
        .unwrap();

    let active = posts::active(&pool, CategoryFilter::All, OffsetDateTime::now_utc())
        .await
        .unwrap();
    let ids: Vec<i64> = active.iter().map(|post| post.id).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&live.id));
    assert!(ids.contains(&forever.id));
}

#[tokio::test]
async fn feed_is_newest_first_and_snapshots_the_author() {
    let pool = pool().await;
    let changes = ChangeFeed::new(8);
    let author = register(&pool, &changes, "202400001").await;

    let older = posts::create(&pool, &changes, &author, post_with_expiry(None))
        .await
        .unwrap();
    let newer = posts::create(&pool, &changes, &author, post_with_expiry(None))
        .await
        .unwrap();

    let active = posts::active(&pool, CategoryFilter::All, OffsetDateTime::now_utc())
        .await
        .unwrap();
    assert_eq!(active[0].id, newer.id);
    assert_eq!(active[1].id, older.id);
    assert_eq!(active[0].nickname, "Fox");
    assert_eq!(active[0].icon, Icon::parse("🦊"));
}

#[tokio::test]
async fn duplicate_participation_conflicts_and_track_swallows_it() {
    let pool = pool().await;
    let changes = ChangeFeed::new(8);
    let user = register(&pool, &changes, "202400001").await;
    let post = posts::create(&pool, &changes, &user, post_with_expiry(None))
        .await
        .unwrap();

    participations::insert(&pool, &changes, &user.id, post.id)
        .await
        .unwrap();
    let err = participations::insert(&pool, &changes, &user.id, post.id)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict));

    // track() never surfaces the duplicate.
    participations::track(&pool, &changes, &user.id, post.id).await;
    let joined = participations::post_ids_for(&pool, &user.id).await.unwrap();
    assert_eq!(joined, vec![post.id]);
}

#[tokio::test]
async fn cleanup_deletes_expired_posts_and_publishes_deletes() {
    let pool = pool().await;
    let changes = ChangeFeed::new(8);
    let author = register(&pool, &changes, "202400001").await;
    let now = OffsetDateTime::now_utc();

    let expired = posts::create(
        &pool,
        &changes,
        &author,
        post_with_expiry(Some(now - Duration::minutes(5))),
    )
    .await
    .unwrap();
    let live = posts::create(&pool, &changes, &author, post_with_expiry(None))
        .await
        .unwrap();

    let mut sub = changes.subscribe(Table::Posts, &[Op::Delete], None);
    let deleted = campuslink::cleanup::sweep(&pool, &changes).await.unwrap();
    assert_eq!(deleted, 1);

    let event = sub.next().await.unwrap();
    assert_eq!(event.row["id"], expired.id);

    assert!(posts::by_id(&pool, expired.id).await.unwrap().is_none());
    assert!(posts::by_id(&pool, live.id).await.unwrap().is_some());
}

#[tokio::test]
async fn messages_come_back_oldest_first() {
    let pool = pool().await;
    let changes = ChangeFeed::new(8);
    let user = register(&pool, &changes, "202400001").await;
    let post = posts::create(&pool, &changes, &user, post_with_expiry(None))
        .await
        .unwrap();

    for text in ["first", "second", "third"] {
        messages::send(&pool, &changes, &user, post.id, text.to_owned())
            .await
            .unwrap();
    }

    let history = messages::for_post(&pool, post.id).await.unwrap();
    let texts: Vec<&str> = history.iter().map(|m| m.message.as_str()).collect();
    assert_eq!(texts, ["first", "second", "third"]);
    for pair in history.windows(2) {
        assert!(pair[0].created_at <= pair[1].created_at);
    }
}

#[tokio::test]
async fn sent_messages_echo_through_the_change_feed() {
    let pool = pool().await;
    let changes = ChangeFeed::new(8);
    let user = register(&pool, &changes, "202400001").await;
    let post = posts::create(&pool, &changes, &user, post_with_expiry(None))
        .await
        .unwrap();

    let mut sub = changes.subscribe(Table::Messages, &[Op::Insert], None);
    let stored = messages::send(&pool, &changes, &user, post.id, "hello".to_owned())
        .await
        .unwrap();

    let event = sub.next().await.unwrap();
    let echoed: campuslink::store::messages::ChatMessage =
        serde_json::from_value(event.row).unwrap();
    assert_eq!(echoed, stored);
}

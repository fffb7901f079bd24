use axum::{
    debug_handler,
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::{IntoResponse, Redirect, Response},
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::realtime::ChangeFeed;
use crate::store::posts::{CategoryFilter, Post};
use crate::store::profiles::Profile;
use crate::store::StoreResult;
use crate::{session::SessionContext, AppResult};

use super::controller::{Commit, FeedController};
use super::gesture::Direction;
use super::page::FeedQuery;

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum FeedCommand {
    PointerDown { x: f64 },
    PointerMove { x: f64 },
    PointerUp,
    Skip,
    Join,
    Restart,
    SetFilter { category: String },
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum FeedUpdate<'a> {
    State {
        post: Option<&'a Post>,
        index: usize,
        total: usize,
        offset: f64,
        filter: &'a str,
        caught_up: bool,
    },
    EnterChat {
        post_id: i64,
    },
    Error {
        message: String,
    },
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn feed_ws(
    State(db_pool): State<SqlitePool>,
    State(changes): State<ChangeFeed>,
    Query(FeedQuery { category }): Query<FeedQuery>,
    session: Session,
    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let Some(viewer) = SessionContext::new(session).hydrate().await? else {
        return Ok(Redirect::to("/").into_response());
    };
    let filter = category
        .as_deref()
        .and_then(CategoryFilter::parse)
        .unwrap_or_default();
    Ok(ws
        .on_upgrade(move |stream| run(stream, db_pool, changes, viewer, filter))
        .into_response())
}

async fn run(
    stream: WebSocket,
    db_pool: SqlitePool,
    changes: ChangeFeed,
    viewer: Profile,
    filter: CategoryFilter,
) {
    let mut feed = match FeedController::load(db_pool, changes, viewer, filter).await {
        Ok(feed) => feed,
        Err(err) => {
            log::warn!("feed load failed: {err}");
            return;
        }
    };
    let mut sub = feed.subscribe();
    let (mut sender, mut receiver) = stream.split();

    if send_state(&mut sender, &feed).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            incoming = receiver.next() => {
                let Some(Ok(msg)) = incoming else { break };
                let Ok(command) = serde_json::from_slice::<FeedCommand>(&msg.into_data()) else {
                    continue;
                };
                match apply(&mut feed, command).await {
                    Ok(Some(Commit::EnterChat(post_id))) => {
                        let _ = send_json(&mut sender, &FeedUpdate::EnterChat { post_id }).await;
                    }
                    Ok(_) => {}
                    Err(err) => {
                        let update = FeedUpdate::Error { message: err.to_string() };
                        let _ = send_json(&mut sender, &update).await;
                    }
                }
                if send_state(&mut sender, &feed).await.is_err() {
                    break;
                }
            }
            event = sub.next() => {
                if event.is_none() {
                    break;
                }
                if let Err(err) = feed.refetch().await {
                    log::warn!("feed refetch failed: {err}");
                    continue;
                }
                if send_state(&mut sender, &feed).await.is_err() {
                    break;
                }
            }
        }
    }
    // `sub` drops here: the view unsubscribes before the task ends.
}

async fn apply(feed: &mut FeedController, command: FeedCommand) -> StoreResult<Option<Commit>> {
    match command {
        FeedCommand::PointerDown { x } => {
            feed.pointer_down(x);
            Ok(None)
        }
        FeedCommand::PointerMove { x } => {
            feed.pointer_move(x);
            Ok(None)
        }
        FeedCommand::PointerUp => Ok(feed.pointer_up().await),
        FeedCommand::Skip => Ok(feed.commit(Direction::Left).await),
        FeedCommand::Join => Ok(feed.commit(Direction::Right).await),
        FeedCommand::Restart => {
            feed.restart();
            Ok(None)
        }
        FeedCommand::SetFilter { category } => {
            if let Some(filter) = CategoryFilter::parse(&category) {
                feed.set_filter(filter).await?;
            } else {
                log::debug!("ignoring unknown category filter {category:?}");
            }
            Ok(None)
        }
    }
}

async fn send_state(
    sender: &mut SplitSink<WebSocket, Message>,
    feed: &FeedController,
) -> Result<(), axum::Error> {
    let update = FeedUpdate::State {
        post: feed.current(),
        index: feed.cursor(),
        total: feed.len(),
        offset: feed.drag_offset(),
        filter: feed.filter().as_str(),
        caught_up: feed.is_caught_up(),
    };
    send_json(sender, &update).await
}

async fn send_json(
    sender: &mut SplitSink<WebSocket, Message>,
    update: &FeedUpdate<'_>,
) -> Result<(), axum::Error> {
    match serde_json::to_string(update) {
        Ok(text) => sender.send(text.into()).await,
        Err(err) => {
            log::warn!("failed to encode feed update: {err}");
            Ok(())
        }
    }
}

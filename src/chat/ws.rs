use axum::{
    debug_handler,
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::{IntoResponse, Redirect, Response},
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::realtime::ChangeFeed;
use crate::store::messages::ChatMessage;
use crate::store::profiles::Profile;
use crate::{session::SessionContext, AppResult};

use super::controller::ChatController;

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ChatCommand {
    Send { text: String },
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ChatUpdate<'a> {
    Message { message: &'a ChatMessage, own: bool },
    Sent,
    SendFailed { draft: String, message: String },
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn chat_ws(
    State(db_pool): State<SqlitePool>,
    State(changes): State<ChangeFeed>,
    session: Session,
    Path(post_id): Path<i64>,
    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let Some(viewer) = SessionContext::new(session).hydrate().await? else {
        return Ok(Redirect::to("/").into_response());
    };
    Ok(ws
        .on_upgrade(move |stream| run(stream, db_pool, changes, viewer, post_id))
        .into_response())
}

async fn run(
    stream: WebSocket,
    db_pool: SqlitePool,
    changes: ChangeFeed,
    viewer: Profile,
    post_id: i64,
) {
    let mut room = match ChatController::load(db_pool, changes, viewer, post_id).await {
        Ok(Some(room)) => room,
        Ok(None) => {
            log::debug!("chat ws for missing post {post_id}");
            return;
        }
        Err(err) => {
            log::warn!("chat load failed for post {post_id}: {err}");
            return;
        }
    };
    let mut sub = room.subscribe();
    let (mut sender, mut receiver) = stream.split();

    loop {
        tokio::select! {
            incoming = receiver.next() => {
                let Some(Ok(msg)) = incoming else { break };
                let Ok(command) = serde_json::from_slice::<ChatCommand>(&msg.into_data()) else {
                    continue;
                };
                let ChatCommand::Send { text } = command;
                room.set_draft(text);
                let update = match room.send().await {
                    Ok(_) => ChatUpdate::Sent,
                    Err(err) => ChatUpdate::SendFailed {
                        draft: room.draft().to_owned(),
                        message: err.to_string(),
                    },
                };
                if send_json(&mut sender, &update).await.is_err() {
                    break;
                }
            }
            event = sub.next() => {
                let Some(event) = event else { break };
                let viewer_id = room.viewer().id.clone();
                if let Some(message) = room.apply(&event) {
                    let own = message.user_id == viewer_id;
                    let update = ChatUpdate::Message { message, own };
                    if send_json(&mut sender, &update).await.is_err() {
                        break;
                    }
                }
            }
        }
    }
    // `sub` drops here: the room unsubscribes before the task ends.
}

async fn send_json(
    sender: &mut SplitSink<WebSocket, Message>,
    update: &ChatUpdate<'_>,
) -> Result<(), axum::Error> {
    match serde_json::to_string(update) {
        Ok(text) => sender.send(text.into()).await,
        Err(err) => {
            log::warn!("failed to encode chat update: {err}");
            Ok(())
        }
    }
}

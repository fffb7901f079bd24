use axum::{
    debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::realtime::ChangeFeed;
use crate::store::messages::ChatMessage;
use crate::store::{participations, posts};
use crate::{include_res, res, session::SessionContext, AppResult};

use super::controller::ChatController;

#[debug_handler(state = crate::AppState)]
pub(crate) async fn chat(
    State(db_pool): State<SqlitePool>,
    State(changes): State<ChangeFeed>,
    session: Session,
    Path(post_id): Path<i64>,
) -> AppResult<Response> {
    let Some(me) = SessionContext::new(session).hydrate().await? else {
        return Ok(Redirect::to("/").into_response());
    };

    let Some(room) = ChatController::load(db_pool, changes, me, post_id).await? else {
        return res::sorry("activity");
    };

    let mut history = String::new();
    for message in room.messages() {
        history += &render_message(message, message.user_id == room.viewer().id);
    }

    let post = room.post();
    Ok(Html(
        include_res!(str, "/pages/chat.html")
            .replace("{post_id}", &post.id.to_string())
            .replace("{icon}", &post.icon.html())
            .replace("{activity}", &res::escape(&post.activity))
            .replace("{time}", &res::escape(&post.time))
            .replace(
                "{location}",
                &res::escape(post.location.as_deref().unwrap_or("")),
            )
            .replace("{messages}", &history),
    )
    .into_response())
}

/// The joined-activities list.
#[debug_handler(state = crate::AppState)]
pub(crate) async fn chats(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(me) = SessionContext::new(session).hydrate().await? else {
        return Ok(Redirect::to("/").into_response());
    };

    let post_ids = participations::post_ids_for(&db_pool, &me.id).await?;
    let posts = posts::by_ids(&db_pool, &post_ids).await?;

    let mut items = String::new();
    if posts.is_empty() {
        items = "<p class=\"empty\">No chats yet. Join activities from the feed to start chatting!</p>"
            .to_owned();
    }
    for post in &posts {
        items += &include_res!(str, "/pages/chat_item.html")
            .replace("{id}", &post.id.to_string())
            .replace("{icon}", &post.icon.html())
            .replace("{activity}", &res::escape(&post.activity))
            .replace("{nickname}", &res::escape(&post.nickname))
            .replace("{time}", &res::escape(&post.time));
    }

    Ok(Html(include_res!(str, "/pages/chats.html").replace("{chat_items}", &items)).into_response())
}

pub(crate) fn render_message(message: &ChatMessage, own: bool) -> String {
    include_res!(str, "/pages/message.html")
        .replace("{side}", if own { "own" } else { "other" })
        .replace("{icon}", &message.icon.html())
        .replace("{nickname}", &res::escape(&message.nickname))
        .replace("{message}", &res::escape(&message.message))
}

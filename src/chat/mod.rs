mod controller;
mod page;
mod ws;

pub use controller::ChatController;

use axum::{routing::get, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/chats", get(page::chats))
        .route("/chat/{id}", get(page::chat))
        .route("/chat/{id}/ws", get(ws::chat_ws))
}

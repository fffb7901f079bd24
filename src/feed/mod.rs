mod controller;
mod gesture;
mod new;
mod page;
mod ws;

pub use controller::{Commit, FeedController};
pub use gesture::{Direction, Gesture, COMMIT_THRESHOLD};

use axum::{routing::get, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(page::feed))
        .route("/ws", get(ws::feed_ws))
        .route("/new", get(new::new_post_page).post(new::new_post))
}

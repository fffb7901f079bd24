mod logout;
mod pages;
mod wizard;

pub use wizard::{Step, Wizard};

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::landing))
        .route("/lookup", post(pages::lookup))
        .route("/register", post(pages::register))
        .route("/icon", post(pages::select_icon))
        .route("/logout", post(logout::logout))
}

use axum::{
    debug_handler,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::{session::SessionContext, AppResult};

#[debug_handler]
pub(crate) async fn logout(session: Session) -> AppResult<Response> {
    SessionContext::new(session).clear().await?;
    Ok(Redirect::to("/").into_response())
}

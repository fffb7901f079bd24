use axum::{
    debug_handler,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use time::{macros::format_description, OffsetDateTime, PrimitiveDateTime};
use tower_sessions::Session;

use crate::realtime::ChangeFeed;
use crate::store::posts::{self, Category, NewPost};
use crate::store::profiles::Profile;
use crate::{include_res, res, session::SessionContext, AppResult};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NewPostForm {
    activity: String,
    category: String,
    time: String,
    location: Option<String>,
    expiration_date: Option<String>,
}

#[debug_handler]
pub(crate) async fn new_post_page(session: Session) -> AppResult<Response> {
    let Some(me) = SessionContext::new(session).hydrate().await? else {
        return Ok(Redirect::to("/").into_response());
    };
    Ok(render_form(&me, &NewPostForm::default(), None))
}

#[debug_handler(state = crate::AppState)]
pub(crate) async fn new_post(
    State(db_pool): State<SqlitePool>,
    State(changes): State<ChangeFeed>,
    session: Session,
    Form(form): Form<NewPostForm>,
) -> AppResult<Response> {
    let Some(me) = SessionContext::new(session).hydrate().await? else {
        return Ok(Redirect::to("/").into_response());
    };

    if form.activity.trim().is_empty() || form.time.trim().is_empty() {
        return Ok(render_form(&me, &form, Some("Activity and time are required")));
    }
    let Some(category) = Category::parse(&form.category) else {
        return Ok(render_form(&me, &form, Some("Unknown category")));
    };
    let expiration_date = match form.expiration_date.as_deref().filter(|raw| !raw.is_empty()) {
        Some(raw) => match parse_expiration(raw) {
            Some(expires) => Some(expires),
            None => return Ok(render_form(&me, &form, Some("Invalid expiration date"))),
        },
        None => None,
    };

    let new = NewPost {
        activity: form.activity.clone(),
        category,
        time: form.time.clone(),
        location: form.location.clone().filter(|location| !location.is_empty()),
        expiration_date,
    };
    match posts::create(&db_pool, &changes, &me, new).await {
        Ok(_) => Ok(Redirect::to("/feed").into_response()),
        Err(err) => Ok(render_form(&me, &form, Some(&err.to_string()))),
    }
}

/// The browser's datetime-local value, taken as UTC.
fn parse_expiration(raw: &str) -> Option<OffsetDateTime> {
    let format = format_description!("[year]-[month]-[day]T[hour]:[minute]");
    PrimitiveDateTime::parse(raw, &format)
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

/// Failed submissions come back with the inputs preserved.
fn render_form(me: &Profile, form: &NewPostForm, error: Option<&str>) -> Response {
    let mut options = String::new();
    for category in Category::ALL {
        options += &format!(
            "<option value=\"{}\"{}>{}</option>",
            category.as_str(),
            if form.category == category.as_str() {
                " selected"
            } else {
                ""
            },
            category.label()
        );
    }
    Html(
        include_res!(str, "/pages/create.html")
            .replace("{nickname}", &res::escape(&me.nickname))
            .replace("{icon}", &me.icon.html())
            .replace("{error}", &res::error_block(error))
            .replace("{activity}", &res::escape(&form.activity))
            .replace("{time}", &res::escape(&form.time))
            .replace(
                "{location}",
                &res::escape(form.location.as_deref().unwrap_or("")),
            )
            .replace(
                "{expiration_date}",
                &res::escape(form.expiration_date.as_deref().unwrap_or("")),
            )
            .replace("{category_options}", &options),
    )
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_datetime_local_values() {
        let expires = parse_expiration("2026-03-01T15:30").unwrap();
        assert_eq!(expires.year(), 2026);
        assert_eq!(expires.hour(), 15);
        assert!(parse_expiration("next tuesday").is_none());
    }
}

use axum::{
    debug_handler,
    extract::Query,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::store::posts::{Category, CategoryFilter};
use crate::{include_res, res, session::SessionContext, AppResult};

#[derive(Deserialize)]
pub(crate) struct FeedQuery {
    pub(crate) category: Option<String>,
}

#[debug_handler]
pub(crate) async fn feed(
    session: Session,
    Query(FeedQuery { category }): Query<FeedQuery>,
) -> AppResult<Response> {
    let Some(me) = SessionContext::new(session).hydrate().await? else {
        return Ok(Redirect::to("/").into_response());
    };

    let filter = category
        .as_deref()
        .and_then(CategoryFilter::parse)
        .unwrap_or_default();

    Ok(Html(
        include_res!(str, "/pages/feed.html")
            .replace("{nickname}", &res::escape(&me.nickname))
            .replace("{icon}", &me.icon.html())
            .replace("{category}", filter.as_str())
            .replace("{filter_options}", &filter_options(filter)),
    )
    .into_response())
}

pub(crate) fn filter_options(selected: CategoryFilter) -> String {
    let mut options = format!(
        "<option value=\"all\"{}>✨ All Activities</option>",
        if selected == CategoryFilter::All {
            " selected"
        } else {
            ""
        }
    );
    for category in Category::ALL {
        options += &format!(
            "<option value=\"{}\"{}>{}</option>",
            category.as_str(),
            if selected == CategoryFilter::Only(category) {
                " selected"
            } else {
                ""
            },
            category.label()
        );
    }
    options
}

use axum::response::{Html, IntoResponse, Response};

use crate::appresult::AppResult;

#[macro_export]
macro_rules! include_res {
    (bytes, $p:expr) => {
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
    (str, $p:expr) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
}

/// Shared not-found page.
pub fn sorry(what: &str) -> AppResult<Response> {
    Ok(Html(include_res!(str, "/pages/sorry.html").replace("{what}", what)).into_response())
}

/// Minimal escaping for user-entered text dropped into templates.
pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// An inline error block, or nothing.
pub fn error_block(error: Option<&str>) -> String {
    match error {
        Some(message) => format!("<p class=\"error\">{}</p>", escape(message)),
        None => String::new(),
    }
}

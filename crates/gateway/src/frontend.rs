//! Embedded web chat.
//!
//! The HTML, CSS, and JS files from `frontend/` are compiled into the binary
//! using `include_str!`, so `mathwise serve` needs no asset directory.

use axum::{
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};

const INDEX_HTML: &str = include_str!("../../../frontend/index.html");
const STYLE_CSS: &str = include_str!("../../../frontend/style.css");
const APP_JS: &str = include_str!("../../../frontend/app.js");

/// Router serving the page at `/` and its assets under `/static`.
pub fn frontend_router() -> Router {
    Router::new()
        .route("/", get(|| async { Html(INDEX_HTML) }))
        .route(
            "/static/style.css",
            get(|| async { asset("text/css; charset=utf-8", STYLE_CSS) }),
        )
        .route(
            "/static/app.js",
            get(|| async { asset("application/javascript; charset=utf-8", APP_JS) }),
        )
}

fn asset(content_type: &'static str, body: &'static str) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        body,
    )
        .into_response()
}

//! Embedded web pages.

use axum::{
    http::header,
    response::{Html, IntoResponse},
    routing::get,
    Router,
};

use crate::state::AppState;

const INDEX_HTML: &str = include_str!("../assets/index.html");
const GENERATE_HTML: &str = include_str!("../assets/generate.html");
const CHAT_HTML: &str = include_str!("../assets/chat.html");
const APP_JS: &str = include_str!("../assets/tractatus.js");
const STYLE_CSS: &str = include_str!("../assets/style.css");

pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Html(INDEX_HTML) }))
        .route("/generate", get(|| async { Html(GENERATE_HTML) }))
        .route("/chat", get(|| async { Html(CHAT_HTML) }))
        .route("/assets/tractatus.js", get(script))
        .route("/assets/style.css", get(stylesheet))
}

async fn script() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/javascript; charset=utf-8")], APP_JS)
}

async fn stylesheet() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], STYLE_CSS)
}

//! Embedded browser front end
//!
//! The whole page ships inside the binary, so a deployment is one
//! executable with no asset directory to carry around.

use axum::response::Html;

const INDEX_PAGE: &str = include_str!("../../static/index.html");

/// Serve the terminal page
///
/// GET /
pub async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

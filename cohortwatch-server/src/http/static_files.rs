//! Static file serving for the embedded viewer page

use axum::{
    body::Body,
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;

/// Embedded viewer assets (compiled into binary)
#[derive(RustEmbed)]
#[folder = "viewer/"]
struct ViewerAssets;

/// Handler for serving static files from embedded assets
///
/// The root path serves the viewer page. Any other path must name an
/// embedded file.
pub async fn static_handler(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');
    if path.is_empty() {
        return index_page();
    }

    serve_file(path).unwrap_or_else(|| (StatusCode::NOT_FOUND, "Not found").into_response())
}

/// The viewer page
pub fn index_page() -> Response {
    serve_file("index.html")
        .unwrap_or_else(|| (StatusCode::NOT_FOUND, "Viewer page not found").into_response())
}

/// Serve a file from embedded assets
fn serve_file(path: &str) -> Option<Response<Body>> {
    let file = ViewerAssets::get(path)?;

    // Determine content type from file extension
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime.as_ref())
        .body(Body::from(file.data.into_owned()))
        .ok()
}

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::debug;

use blobweb_store::BlobStore;
use blobweb_types::BlobRef;

use crate::error::{ServerError, ServerResult};
use crate::mime::MimeTypes;
use crate::render::{directory_response, file_response, LinkStyle};
use crate::resolve::{resolve, Resolution};

/// Everything a request handler needs. Built once at startup and never
/// mutated; cloning only bumps reference counts.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BlobStore>,
    pub root: Option<BlobRef>,
    pub mime: Arc<MimeTypes>,
}

impl AppState {
    pub fn new(store: Arc<dyn BlobStore>, root: Option<BlobRef>, mime: MimeTypes) -> Self {
        Self {
            store,
            root,
            mime: Arc::new(mime),
        }
    }
}

/// Which addressing scheme a request path selects.
#[derive(Debug, PartialEq, Eq)]
pub enum Route<'a> {
    /// `/blob/<BID>/<KEY>` with hex-only id and key.
    Blob(BlobRef),
    /// Anything outside `/blob/`, resolved from the root.
    Path(&'a str),
    /// Inside `/blob/` but not a valid `<BID>/<KEY>` pair.
    NotFound,
}

impl<'a> Route<'a> {
    /// Classify an already percent-decoded path, so `/%62lob/...` is a blob
    /// request and `/blob/ab%63d/...` names the id `abcd`.
    pub fn parse(path: &'a str) -> Self {
        let Some(rest) = path.strip_prefix("/blob/") else {
            return Self::Path(path);
        };
        let mut parts = rest.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(bid), Some(key), None) => BlobRef::parse_hex(bid, key)
                .map(Self::Blob)
                .unwrap_or(Self::NotFound),
            _ => Self::NotFound,
        }
    }
}

/// Build the axum router for both addressing schemes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .fallback(dispatch)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn dispatch(State(state): State<AppState>, method: Method, uri: Uri) -> ServerResult<Response> {
    if method != Method::GET && method != Method::HEAD {
        return Err(ServerError::NotFound);
    }
    let raw = uri.path();
    let path = urlencoding::decode(raw).map_err(|_| ServerError::NotFound)?;
    match Route::parse(&path) {
        Route::Blob(blob) => blob_route(state, blob).await,
        Route::Path(decoded) => path_route(state, decoded.to_owned(), raw).await,
        Route::NotFound => Err(ServerError::NotFound),
    }
}

/// Direct access: a directory if it opens as one, otherwise a sniffed file.
async fn blob_route(state: AppState, blob: BlobRef) -> ServerResult<Response> {
    if let Some(listing) = directory_response(state.store.clone(), blob.clone(), LinkStyle::Absolute).await? {
        return Ok(listing);
    }
    file_response(state.store, blob, None).await
}

/// Hierarchical access from the configured root.
///
/// `path` is percent-decoded and drives resolution; `raw` is the path as it
/// appeared on the wire and is reused verbatim for the redirect target.
async fn path_route(state: AppState, path: String, raw: &str) -> ServerResult<Response> {
    let store = state.store.clone();
    let root = state.root.clone();
    let resolution =
        tokio::task::spawn_blocking(move || resolve(store.as_ref(), root.as_ref(), &path)).await??;
    debug!(path = raw, ?resolution, "resolved");

    match resolution {
        Resolution::Directory(blob) => directory_response(state.store, blob, LinkStyle::Relative)
            .await?
            .ok_or(ServerError::NotFound),
        Resolution::Redirect(_) => {
            Ok((StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, format!("{raw}/"))]).into_response())
        }
        Resolution::File { blob, name } => {
            let hint = state.mime.for_name(&name).map(str::to_owned);
            file_response(state.store, blob, hint).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_blob_route() {
        let route = Route::parse("/blob/00aF/bC12");
        assert_eq!(route, Route::Blob(BlobRef::parse_hex("00aF", "bC12").unwrap()));
    }

    #[test]
    fn blob_route_rejects_bad_shapes() {
        for path in [
            "/blob/",
            "/blob/abc",
            "/blob/abc/",
            "/blob//abc",
            "/blob/abc/def/",
            "/blob/abc/def/ghi",
            "/blob/xyz/def",
            "/blob/abc/de%66",
        ] {
            assert_eq!(Route::parse(path), Route::NotFound, "{path}");
        }
    }

    #[test]
    fn everything_else_is_path_route() {
        assert_eq!(Route::parse("/"), Route::Path("/"));
        assert_eq!(Route::parse("/a/b.txt"), Route::Path("/a/b.txt"));
        assert_eq!(Route::parse("/blob"), Route::Path("/blob"));
        assert_eq!(Route::parse("/blobs/x"), Route::Path("/blobs/x"));
    }
}

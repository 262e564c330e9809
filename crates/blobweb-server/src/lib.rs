//! Read-only HTTP front end for a content-addressed blob store.
//!
//! Two addressing schemes share one listener:
//!
//! - `/blob/<BID>/<KEY>` -- direct access to any blob. Directories render as
//!   an HTML listing whose links are themselves direct addresses; files are
//!   streamed with a sniffed content type.
//! - `/<seg>/<seg>/...` -- hierarchical access from a configured root
//!   directory blob. Directories need a trailing slash (one is added by
//!   redirect) and list with relative links; files take their content type
//!   from the final segment's extension, falling back to sniffing.
//!
//! Every failure a client can cause is a plain `404 page not found`.

pub mod config;
pub mod error;
pub mod mime;
pub mod render;
pub mod resolve;
pub mod router;
pub mod server;
pub mod sniff;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult, NOT_FOUND_BODY};
pub use mime::MimeTypes;
pub use resolve::{resolve, Resolution};
pub use router::{build_router, AppState, Route};
pub use server::BlobwebServer;
pub use sniff::detect_content_type;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use axum::response::Response;
    use tower::util::ServiceExt;

    use blobweb_store::{
        BlobStore, BlobWriter, DirectoryReader, FileReader, InMemoryBlobStore, StoreError, StoreResult,
    };
    use blobweb_types::{BlobRef, DirEntry};

    /// root/
    ///   docs/
    ///     guide.html
    ///     notes
    ///   image.png
    ///   <odd>&name
    struct Site {
        store: Arc<InMemoryBlobStore>,
        root: BlobRef,
        docs: BlobRef,
        guide: BlobRef,
        png: BlobRef,
    }

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn site() -> Site {
        let store = Arc::new(InMemoryBlobStore::new());
        let guide = store.write_file(b"<p>guide</p>").unwrap();
        let notes = store.write_file(b"plain notes\n").unwrap();
        let docs = store
            .write_directory(&[DirEntry::new("guide.html", guide.clone()), DirEntry::new("notes", notes)])
            .unwrap();
        let png = store.write_file(PNG).unwrap();
        let odd = store.write_file(b"odd").unwrap();
        let root = store
            .write_directory(&[
                DirEntry::new("docs", docs.clone()),
                DirEntry::new("image.png", png.clone()),
                DirEntry::new("<odd>&name", odd),
            ])
            .unwrap();
        Site { store, root, docs, guide, png }
    }

    fn app(store: Arc<dyn BlobStore>, root: Option<BlobRef>) -> axum::Router {
        build_router(AppState::new(store, root, MimeTypes::builtin()))
    }

    fn blob_path(blob: &BlobRef) -> String {
        format!("/blob/{}/{}", blob.bid, blob.key)
    }

    async fn send(app: &axum::Router, method: Method, uri: &str) -> Response {
        app.clone()
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn get(app: &axum::Router, uri: &str) -> Response {
        send(app, Method::GET, uri).await
    }

    async fn body_text(res: Response) -> String {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn assert_not_found(app: &axum::Router, uri: &str) {
        let res = get(app, uri).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body_text(res).await, NOT_FOUND_BODY);
    }

    fn hrefs(page: &str) -> Vec<String> {
        page.split("<a href=\"")
            .skip(1)
            .filter_map(|s| s.split('"').next())
            .map(str::to_owned)
            .collect()
    }

    #[tokio::test]
    async fn direct_listing_in_enumeration_order_with_absolute_links() {
        let s = site();
        let app = app(s.store.clone(), None);
        let res = get(&app, &blob_path(&s.root)).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers()[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
        let page = body_text(res).await;

        let docs = page.find(">docs</a>").unwrap();
        let png = page.find(">image.png</a>").unwrap();
        let odd = page.find(">&lt;odd&gt;&amp;name</a>").unwrap();
        assert!(docs < png && png < odd);
        assert!(page.contains(&format!("<a href=\"{}\">docs</a>\n", blob_path(&s.docs))));
        assert!(!page.contains("<odd>"));
    }

    #[tokio::test]
    async fn absolute_links_all_resolve() {
        let s = site();
        let app = app(s.store.clone(), None);
        let page = body_text(get(&app, &blob_path(&s.root)).await).await;
        let links = hrefs(&page);
        assert_eq!(links.len(), 3);
        for link in links {
            assert_eq!(get(&app, &link).await.status(), StatusCode::OK, "{link}");
        }
    }

    fn link_texts(page: &str) -> Vec<String> {
        page.split("<a href=\"")
            .skip(1)
            .filter_map(|s| s.split_once("\">"))
            .filter_map(|(_, rest)| rest.split("</a>").next())
            .map(str::to_owned)
            .collect()
    }

    #[tokio::test]
    async fn direct_links_reach_the_same_blobs_as_paths() {
        let s = site();
        let app = app(s.store.clone(), Some(s.root.clone()));

        for (dir, prefix) in [(&s.root, "/"), (&s.docs, "/docs/")] {
            let entries: Vec<DirEntry> = s.store.open_directory(dir).unwrap().map(Result::unwrap).collect();
            let page = body_text(get(&app, &blob_path(dir)).await).await;
            let expected: Vec<String> = entries.iter().map(|e| blob_path(&e.blob)).collect();
            assert_eq!(hrefs(&page), expected);

            for entry in entries {
                let path = format!("{prefix}{}", urlencoding::encode(&entry.name));
                let direct = get(&app, &blob_path(&entry.blob)).await;
                let by_path = get(&app, &path).await;
                assert_eq!(direct.status(), StatusCode::OK, "{path}");

                if by_path.status() == StatusCode::MOVED_PERMANENTLY {
                    let listing = get(&app, &format!("{path}/")).await;
                    assert_eq!(listing.status(), StatusCode::OK, "{path}");
                    assert_eq!(
                        link_texts(&body_text(direct).await),
                        link_texts(&body_text(listing).await),
                        "{path}"
                    );
                    continue;
                }

                assert_eq!(by_path.status(), StatusCode::OK, "{path}");
                assert_eq!(
                    direct.headers()[header::CONTENT_TYPE],
                    by_path.headers()[header::CONTENT_TYPE],
                    "{path}"
                );
                let direct = axum::body::to_bytes(direct.into_body(), usize::MAX).await.unwrap();
                let by_path = axum::body::to_bytes(by_path.into_body(), usize::MAX).await.unwrap();
                assert_eq!(direct, by_path, "{path}");
            }
        }
    }

    #[tokio::test]
    async fn routing_sees_decoded_path() {
        let s = site();
        let app = app(s.store.clone(), None);
        let bid = s.png.bid.as_str();
        let key = s.png.key.as_str();

        let encoded_id = format!("/blob/{}%{:02X}/{key}", &bid[..bid.len() - 1], bid.as_bytes()[bid.len() - 1]);
        let res = get(&app, &encoded_id).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "image/png");

        let encoded_prefix = format!("/%62lob/{bid}/{key}");
        assert_eq!(get(&app, &encoded_prefix).await.status(), StatusCode::OK);
    }

    #[test]
    fn stalled_downloads_do_not_starve_listings() {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .max_blocking_threads(2)
            .enable_all()
            .build()
            .unwrap();

        rt.block_on(async {
            let store = Arc::new(InMemoryBlobStore::new());
            let big = store.write_file(&vec![b'x'; 1 << 20]).unwrap();
            let root = store.write_directory(&[DirEntry::new("big.txt", big)]).unwrap();
            let app = app(store, Some(root));

            // More unread downloads than there are blocking threads.
            let mut stalled = Vec::new();
            for _ in 0..4 {
                let res = get(&app, "/big.txt").await;
                assert_eq!(res.status(), StatusCode::OK);
                stalled.push(res);
            }
            tokio::time::sleep(Duration::from_millis(100)).await;

            let listing = tokio::time::timeout(Duration::from_secs(3), get(&app, "/"))
                .await
                .expect("root listing blocked behind unread downloads");
            assert_eq!(listing.status(), StatusCode::OK);
            assert!(body_text(listing).await.contains(">big.txt</a>"));
            drop(stalled);
        });
    }

    #[tokio::test]
    async fn direct_file_is_sniffed() {
        let s = site();
        let app = app(s.store.clone(), None);

        let res = get(&app, &blob_path(&s.png)).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "image/png");
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], PNG);

        // No extension is consulted on the direct route, even for .html names.
        let res = get(&app, &blob_path(&s.guide)).await;
        assert_eq!(res.headers()[header::CONTENT_TYPE], "text/html; charset=utf-8");
    }

    #[tokio::test]
    async fn malformed_direct_paths_are_not_found() {
        let s = site();
        let app = app(s.store.clone(), Some(s.root.clone()));
        let good = blob_path(&s.png);
        for uri in [
            "/blob/".to_owned(),
            format!("/blob/{}", s.png.bid),
            format!("{good}/"),
            format!("{good}/extra"),
            format!("/blob/{}/zz", s.png.bid),
            format!("/blob/{}/{}", s.png.bid, s.guide.key),
            "/blob/0000/0000".to_owned(),
        ] {
            assert_not_found(&app, &uri).await;
        }
    }

    #[tokio::test]
    async fn path_route_serves_files_with_extension_types() {
        let s = site();
        let app = app(s.store.clone(), Some(s.root.clone()));

        let res = get(&app, "/docs/guide.html").await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "text/html; charset=utf-8");
        assert_eq!(body_text(res).await, "<p>guide</p>");

        let res = get(&app, "/docs/notes").await;
        assert_eq!(res.headers()[header::CONTENT_TYPE], "text/plain; charset=utf-8");

        let res = get(&app, "/image.png").await;
        assert_eq!(res.headers()[header::CONTENT_TYPE], "image/png");
    }

    #[tokio::test]
    async fn path_route_decodes_percent_escapes() {
        let s = site();
        let app = app(s.store.clone(), Some(s.root.clone()));
        let res = get(&app, "/%3Codd%3E%26name").await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_text(res).await, "odd");
    }

    #[tokio::test]
    async fn path_route_misses_are_not_found() {
        let s = site();
        let app = app(s.store.clone(), Some(s.root.clone()));
        for uri in ["/nope", "/docs/nope.html", "/image.png/x", "//docs", "/docs//guide.html", "/image.png/"] {
            assert_not_found(&app, uri).await;
        }
    }

    #[tokio::test]
    async fn directory_without_slash_redirects() {
        let s = site();
        let app = app(s.store.clone(), Some(s.root.clone()));
        let res = get(&app, "/docs").await;
        assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(res.headers()[header::LOCATION], "/docs/");
    }

    #[tokio::test]
    async fn directory_with_slash_lists_relative_links() {
        let s = site();
        let app = app(s.store.clone(), Some(s.root.clone()));

        let page = body_text(get(&app, "/docs/").await).await;
        assert_eq!(hrefs(&page), vec!["guide.html", "notes"]);
        assert!(!page.contains("/blob/"));

        for link in hrefs(&page) {
            assert_eq!(get(&app, &format!("/docs/{link}")).await.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn root_listing() {
        let s = site();
        let app = app(s.store.clone(), Some(s.root.clone()));
        let res = get(&app, "/").await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(hrefs(&body_text(res).await), vec!["docs", "image.png", "&lt;odd&gt;&amp;name"]);
    }

    #[tokio::test]
    async fn repeated_requests_are_identical() {
        let s = site();
        let app = app(s.store.clone(), Some(s.root.clone()));
        let first = body_text(get(&app, "/docs/").await).await;
        for _ in 0..3 {
            assert_eq!(body_text(get(&app, "/docs/").await).await, first);
        }
    }

    #[tokio::test]
    async fn without_root_only_direct_route_works() {
        let s = site();
        let app = app(s.store.clone(), None);
        for uri in ["/", "/docs/", "/docs/guide.html", "/blob"] {
            assert_not_found(&app, uri).await;
        }
        assert_eq!(get(&app, &blob_path(&s.docs)).await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn only_get_and_head_are_served() {
        let s = site();
        let app = app(s.store.clone(), Some(s.root.clone()));
        assert_eq!(send(&app, Method::HEAD, "/docs/guide.html").await.status(), StatusCode::OK);
        for method in [Method::POST, Method::PUT, Method::DELETE] {
            let res = send(&app, method, "/docs/guide.html").await;
            assert_eq!(res.status(), StatusCode::NOT_FOUND);
        }
    }

    /// Delegates to an in-memory store, but one directory fails after its
    /// first entry.
    struct FlakyStore {
        inner: InMemoryBlobStore,
        flaky: BlobRef,
        first: DirEntry,
    }

    impl BlobStore for FlakyStore {
        fn open_directory(&self, blob: &BlobRef) -> StoreResult<DirectoryReader> {
            if blob == &self.flaky {
                return Ok(DirectoryReader::new(vec![
                    Ok(self.first.clone()),
                    Err(StoreError::Enumeration("device went away".into())),
                ]));
            }
            self.inner.open_directory(blob)
        }

        fn open_file(&self, blob: &BlobRef) -> StoreResult<FileReader> {
            self.inner.open_file(blob)
        }
    }

    #[tokio::test]
    async fn enumeration_failure_yields_partial_page() {
        let inner = InMemoryBlobStore::new();
        let file = inner.write_file(b"x").unwrap();
        let first = DirEntry::new("kept", file);
        let flaky = inner.write_directory(&[first.clone()]).unwrap();
        let store = Arc::new(FlakyStore { inner, flaky: flaky.clone(), first });
        let app = app(store, Some(flaky.clone()));

        for uri in [blob_path(&flaky), "/".to_owned()] {
            let res = get(&app, &uri).await;
            assert_eq!(res.status(), StatusCode::OK);
            let page = body_text(res).await;
            assert!(page.contains(">kept</a>\n"));
            assert!(page.contains("Error happened: "));
            assert!(page.contains("device went away"));
            assert!(page.ends_with("</pre></body></html>"));
        }

        // Name lookups through a failing listing miss rather than erroring.
        assert_not_found(&app, "/missing").await;
    }
}

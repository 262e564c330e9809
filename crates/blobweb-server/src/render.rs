//! Turning a resolved blob into an HTTP response.
//!
//! Directories become an HTML listing; files are streamed with either an
//! extension-derived content type or one sniffed from their first bytes.

use std::fmt::Write as _;
use std::io::{self, Read};
use std::sync::Arc;

use axum::body::Body;
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use blobweb_store::{BlobStore, DirectoryReader, FileReader};
use blobweb_types::BlobRef;

use crate::error::{ServerError, ServerResult};
use crate::sniff::{detect_content_type, SNIFF_LEN};

const PAGE_HEADER: &str =
    "<html><head><title>Directory listing</title></head><body><h1>Directory listing:</h1><pre>";
const PAGE_FOOTER: &str = "</pre></body></html>";

/// Size of each chunk pushed into a streaming body.
const STREAM_CHUNK: usize = 32 * 1024;
/// Chunks buffered between the reading thread and the connection.
const STREAM_DEPTH: usize = 4;

/// How listing entries link to their targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkStyle {
    /// `/blob/<bid>/<key>`: for listings reached by direct addressing.
    Absolute,
    /// The bare entry name, resolved by the browser against the current
    /// trailing-slash path.
    Relative,
}

/// Escape `& < > " '` for use in HTML text and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Render a full listing page.
///
/// Entries appear in enumeration order. If enumeration fails part-way, the
/// error text is written inline after the entries seen so far and the page is
/// still closed.
pub fn render_directory(reader: DirectoryReader, style: LinkStyle) -> String {
    let mut page = String::from(PAGE_HEADER);
    for entry in reader {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "directory listing truncated");
                let _ = write!(page, "Error happened: {}", escape_html(&e.to_string()));
                break;
            }
        };
        let name = escape_html(&entry.name);
        let href = match style {
            LinkStyle::Absolute => format!(
                "/blob/{}/{}",
                escape_html(entry.blob.bid.as_str()),
                escape_html(entry.blob.key.as_str())
            ),
            LinkStyle::Relative => name.clone(),
        };
        let _ = writeln!(page, "<a href=\"{href}\">{name}</a>");
    }
    page.push_str(PAGE_FOOTER);
    page
}

/// Open `blob` as a directory and render it.
///
/// Returns `Ok(None)` when the blob does not open as a directory, which is
/// how callers learn it may be a file.
pub async fn directory_response(
    store: Arc<dyn BlobStore>,
    blob: BlobRef,
    style: LinkStyle,
) -> ServerResult<Option<Response>> {
    let page = tokio::task::spawn_blocking(move || match store.open_directory(&blob) {
        Ok(reader) => Some(render_directory(reader, style)),
        Err(e) => {
            debug!(bid = blob.bid.short(), error = %e, "not a directory");
            None
        }
    })
    .await?;

    Ok(page.map(|page| Html(page).into_response()))
}

/// Read up to `len` bytes, stopping early only at end of stream.
fn read_prefix(reader: &mut impl Read, len: usize) -> io::Result<Vec<u8>> {
    let mut buf = vec![0u8; len];
    let mut filled = 0;
    while filled < len {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    buf.truncate(filled);
    Ok(buf)
}

/// Read one chunk on the blocking pool, handing the reader back afterwards.
async fn read_chunk(mut reader: FileReader) -> io::Result<(FileReader, Option<Bytes>)> {
    tokio::task::spawn_blocking(move || {
        let mut buf = vec![0u8; STREAM_CHUNK];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => return Ok((reader, None)),
                Ok(n) => {
                    buf.truncate(n);
                    return Ok((reader, Some(Bytes::from(buf))));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    })
    .await
    .map_err(io::Error::other)?
}

/// Stream `prefix` followed by the rest of `reader` as a response body.
///
/// A pump task pulls one chunk at a time through the blocking pool and
/// pushes it into a bounded channel the connection drains. A blocking thread
/// is held only for the duration of a single read, never while waiting on a
/// slow client. A dropped receiver (client gone) stops the pump, and a read
/// error aborts the body.
fn stream_body(reader: FileReader, prefix: Vec<u8>) -> Body {
    let (tx, rx) = mpsc::channel::<io::Result<Bytes>>(STREAM_DEPTH);

    tokio::spawn(async move {
        if !prefix.is_empty() && tx.send(Ok(Bytes::from(prefix))).await.is_err() {
            return;
        }
        let mut reader = reader;
        loop {
            match read_chunk(reader).await {
                Ok((_, None)) => break,
                Ok((next, Some(chunk))) => {
                    if tx.send(Ok(chunk)).await.is_err() {
                        debug!("client went away mid-stream");
                        break;
                    }
                    reader = next;
                }
                Err(e) => {
                    warn!(error = %e, "file read failed mid-stream");
                    let _ = tx.send(Err(e)).await;
                    break;
                }
            }
        }
    });

    Body::from_stream(ReceiverStream::new(rx))
}

/// Open a file blob and, without a hint, read and sniff its first bytes.
fn open_for_streaming(
    store: &dyn BlobStore,
    blob: &BlobRef,
    content_type: Option<String>,
) -> ServerResult<(FileReader, String, Vec<u8>)> {
    let mut reader = store.open_file(blob).map_err(|e| {
        debug!(bid = blob.bid.short(), error = %e, "cannot open file blob");
        ServerError::NotFound
    })?;
    if let Some(ct) = content_type {
        return Ok((reader, ct, Vec::new()));
    }
    let prefix = read_prefix(&mut reader, SNIFF_LEN).map_err(|e| {
        debug!(bid = blob.bid.short(), error = %e, "cannot read file prefix");
        ServerError::NotFound
    })?;
    let ct = detect_content_type(&prefix).to_owned();
    Ok((reader, ct, prefix))
}

/// Open `blob` as a file and stream it.
///
/// With a `content_type` hint the bytes are streamed as-is. Without one, up to
/// [`SNIFF_LEN`] bytes are read first and sniffed; failing that first read is
/// a 404, since nothing has been sent yet.
pub async fn file_response(
    store: Arc<dyn BlobStore>,
    blob: BlobRef,
    content_type: Option<String>,
) -> ServerResult<Response> {
    let (reader, content_type, prefix) =
        tokio::task::spawn_blocking(move || open_for_streaming(store.as_ref(), &blob, content_type))
            .await??;

    let body = stream_body(reader, prefix);
    Ok(([(header::CONTENT_TYPE, content_type)], body).into_response())
}

//! Hierarchical path resolution.
//!
//! Walks a slash-delimited path from a root directory blob, one directory
//! lookup per segment, and classifies where the walk ends.

use tracing::debug;

use blobweb_store::BlobStore;
use blobweb_types::BlobRef;

use crate::error::{ServerError, ServerResult};

/// Where a path resolved to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The path ended in `/` at this directory.
    Directory(BlobRef),
    /// The path names a directory but lacks the trailing `/`.
    Redirect(BlobRef),
    /// The path names a file; `name` is the final segment.
    File { blob: BlobRef, name: String },
}

impl Resolution {
    /// The terminal blob, whatever its classification.
    pub fn blob(&self) -> &BlobRef {
        match self {
            Self::Directory(b) | Self::Redirect(b) => b,
            Self::File { blob, .. } => blob,
        }
    }
}

/// Split the next segment off `remaining`.
///
/// Accepts one optional leading `/` followed by at least one non-`/`
/// character. Returns `(segment, rest)`, or `None` if the segment is empty.
fn next_segment(remaining: &str) -> Option<(&str, &str)> {
    let rest = remaining.strip_prefix('/').unwrap_or(remaining);
    let end = rest.find('/').unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    Some(rest.split_at(end))
}

/// Resolve `path` (already percent-decoded) against `root`.
///
/// Blocking: performs one directory open per segment, plus one more when the
/// path does not end in `/`. Any miss, including a non-directory in the
/// middle of the path or a listing that fails while being scanned, is
/// [`ServerError::NotFound`].
pub fn resolve(store: &dyn BlobStore, root: Option<&BlobRef>, path: &str) -> ServerResult<Resolution> {
    let mut current = root.ok_or(ServerError::NotFound)?.clone();
    let mut remaining = path;
    let mut name = "";

    loop {
        if remaining == "/" {
            return Ok(Resolution::Directory(current));
        }

        if remaining.is_empty() {
            return Ok(match store.open_directory(&current) {
                Ok(_) => Resolution::Redirect(current),
                Err(_) => Resolution::File {
                    blob: current,
                    name: name.to_owned(),
                },
            });
        }

        let (segment, rest) = next_segment(remaining).ok_or_else(|| {
            debug!(path, "malformed path");
            ServerError::NotFound
        })?;
        remaining = rest;
        name = segment;

        let mut dir = store.open_directory(&current).map_err(|e| {
            debug!(segment, error = %e, "parent is not a directory");
            ServerError::NotFound
        })?;

        current = match dir.find(segment) {
            Ok(Some(child)) => child,
            Ok(None) => {
                debug!(segment, "no such entry");
                return Err(ServerError::NotFound);
            }
            Err(e) => {
                debug!(segment, error = %e, "directory enumeration failed during lookup");
                return Err(ServerError::NotFound);
            }
        };
    }
}

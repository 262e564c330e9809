use serde::{Deserialize, Serialize};

use crate::id::{BlobId, BlobKey, BlobRef};

/// A single named child of a directory blob.
///
/// Names are not required to be unique within a directory; consumers that
/// look an entry up by name take the first match in enumeration order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireEntry", into = "WireEntry")]
pub struct DirEntry {
    /// Entry name (one path segment).
    pub name: String,
    /// Reference to the child blob.
    pub blob: BlobRef,
}

impl DirEntry {
    pub fn new(name: impl Into<String>, blob: BlobRef) -> Self {
        Self {
            name: name.into(),
            blob,
        }
    }
}

/// Flat `{name, bid, key}` form used when an entry is serialized.
#[derive(Serialize, Deserialize)]
struct WireEntry {
    name: String,
    bid: BlobId,
    key: BlobKey,
}

impl From<WireEntry> for DirEntry {
    fn from(w: WireEntry) -> Self {
        Self {
            name: w.name,
            blob: BlobRef::new(w.bid, w.key),
        }
    }
}

impl From<DirEntry> for WireEntry {
    fn from(e: DirEntry) -> Self {
        Self {
            name: e.name,
            bid: e.blob.bid,
            key: e.blob.key,
        }
    }
}

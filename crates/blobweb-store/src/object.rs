use blobweb_types::{BlobRef, DirEntry};

use crate::error::{StoreError, StoreResult};
use crate::hasher::BlobHasher;

/// The kind of a stored blob.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlobKind {
    /// Ordered list of named child references.
    Directory,
    /// Opaque byte stream.
    File,
}

impl BlobKind {
    /// One-byte tag used by on-disk backends.
    pub fn tag(&self) -> u8 {
        match self {
            Self::Directory => b'd',
            Self::File => b'f',
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'd' => Some(Self::Directory),
            b'f' => Some(Self::File),
            _ => None,
        }
    }

    fn hasher(&self) -> &'static BlobHasher {
        match self {
            Self::Directory => &BlobHasher::DIRECTORY,
            Self::File => &BlobHasher::FILE,
        }
    }
}

impl std::fmt::Display for BlobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Directory => write!(f, "directory"),
            Self::File => write!(f, "file"),
        }
    }
}

/// A stored blob: kind tag + payload bytes.
///
/// A directory payload is newline-delimited JSON, one `{name, bid, key}`
/// object per entry, in listing order. Entries are never re-sorted, so
/// duplicate names survive a write and keep their relative order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredBlob {
    pub kind: BlobKind,
    pub data: Vec<u8>,
}

impl StoredBlob {
    pub fn new(kind: BlobKind, data: Vec<u8>) -> Self {
        Self { kind, data }
    }

    /// A file blob holding `data`.
    pub fn file(data: impl Into<Vec<u8>>) -> Self {
        Self::new(BlobKind::File, data.into())
    }

    /// Encode a directory blob from its entries.
    pub fn directory(entries: &[DirEntry]) -> StoreResult<Self> {
        let mut data = Vec::new();
        for entry in entries {
            serde_json::to_writer(&mut data, entry)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            data.push(b'\n');
        }
        Ok(Self::new(BlobKind::Directory, data))
    }

    /// Compute the `(BID, KEY)` pair that addresses this blob.
    pub fn compute_ref(&self) -> BlobRef {
        BlobRef::new(
            self.kind.hasher().hash(&self.data),
            BlobHasher::content_key(&self.data),
        )
    }

    /// Size of the payload in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

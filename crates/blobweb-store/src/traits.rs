use blobweb_types::{BlobRef, DirEntry};

use crate::error::StoreResult;
use crate::object::StoredBlob;
use crate::reader::{DirectoryReader, FileReader};

/// Read side of a blob store.
///
/// All implementations must satisfy these invariants:
/// - Blobs are immutable; opening the same `BlobRef` twice yields the same
///   content.
/// - Opening a blob as the wrong kind fails with
///   [`StoreError::KindMismatch`](crate::StoreError::KindMismatch). Callers
///   rely on this to tell directories from files, so it is not an anomaly.
/// - A wrong key fails the open; nothing is returned for it.
/// - Opens are independent and safe to issue concurrently.
pub trait BlobStore: Send + Sync {
    /// Open a directory blob for enumeration.
    fn open_directory(&self, blob: &BlobRef) -> StoreResult<DirectoryReader>;

    /// Open a file blob for sequential reading.
    fn open_file(&self, blob: &BlobRef) -> StoreResult<FileReader>;
}

/// Write side of a blob store.
pub trait BlobWriter: Send + Sync {
    /// Store a blob and return the reference that opens it.
    ///
    /// Writing a blob that already exists is a no-op.
    fn put(&self, blob: &StoredBlob) -> StoreResult<BlobRef>;

    /// Store a file blob.
    fn write_file(&self, data: &[u8]) -> StoreResult<BlobRef> {
        self.put(&StoredBlob::file(data))
    }

    /// Store a directory blob with entries in the given order.
    fn write_directory(&self, entries: &[DirEntry]) -> StoreResult<BlobRef> {
        self.put(&StoredBlob::directory(entries)?)
    }
}

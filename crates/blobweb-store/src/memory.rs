use std::collections::HashMap;
use std::sync::RwLock;

use blobweb_types::BlobRef;

use crate::error::{StoreError, StoreResult};
use crate::hasher::BlobHasher;
use crate::object::{BlobKind, StoredBlob};
use crate::reader::{DirectoryReader, FileReader};
use crate::traits::{BlobStore, BlobWriter};

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. Blobs are held behind a `RwLock` and
/// cloned out on open, so readers never hold the lock.
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, StoredBlob>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }

    /// Fetch a blob, checking its key and kind.
    fn load(&self, blob: &BlobRef, expected: BlobKind) -> StoreResult<StoredBlob> {
        let stored = self
            .blobs
            .read()
            .expect("lock poisoned")
            .get(&blob.bid.as_str().to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(blob.bid.clone()))?;

        if stored.kind != expected {
            return Err(StoreError::KindMismatch {
                bid: blob.bid.clone(),
                expected,
                found: stored.kind,
            });
        }
        if !BlobHasher::key_matches(&blake3::hash(&stored.data), &blob.key) {
            return Err(StoreError::KeyMismatch(blob.bid.clone()));
        }
        Ok(stored)
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn open_directory(&self, blob: &BlobRef) -> StoreResult<DirectoryReader> {
        let stored = self.load(blob, BlobKind::Directory)?;
        Ok(DirectoryReader::from_payload(stored.data))
    }

    fn open_file(&self, blob: &BlobRef) -> StoreResult<FileReader> {
        let stored = self.load(blob, BlobKind::File)?;
        Ok(FileReader::from_bytes(stored.data))
    }
}

impl BlobWriter for InMemoryBlobStore {
    fn put(&self, blob: &StoredBlob) -> StoreResult<BlobRef> {
        let blob_ref = blob.compute_ref();
        let mut map = self.blobs.write().expect("lock poisoned");
        map.entry(blob_ref.bid.as_str().to_owned())
            .or_insert_with(|| blob.clone());
        Ok(blob_ref)
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("blob_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blobweb_types::{BlobKey, DirEntry};
    use std::io::Read;

    fn read_all(mut reader: FileReader) -> Vec<u8> {
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn write_and_open_file() {
        let store = InMemoryBlobStore::new();
        let r = store.write_file(b"hello world").unwrap();
        assert_eq!(read_all(store.open_file(&r).unwrap()), b"hello world");
    }

    #[test]
    fn write_and_open_directory() {
        let store = InMemoryBlobStore::new();
        let file = store.write_file(b"x").unwrap();
        let dir = store
            .write_directory(&[DirEntry::new("x.txt", file.clone())])
            .unwrap();
        let entries: Vec<DirEntry> = store
            .open_directory(&dir)
            .unwrap()
            .collect::<StoreResult<_>>()
            .unwrap();
        assert_eq!(entries, vec![DirEntry::new("x.txt", file)]);
    }

    #[test]
    fn wrong_kind_is_kind_mismatch() {
        let store = InMemoryBlobStore::new();
        let file = store.write_file(b"data").unwrap();
        let dir = store.write_directory(&[]).unwrap();
        assert!(matches!(
            store.open_directory(&file),
            Err(StoreError::KindMismatch { expected: BlobKind::Directory, .. })
        ));
        assert!(matches!(
            store.open_file(&dir),
            Err(StoreError::KindMismatch { expected: BlobKind::File, .. })
        ));
    }

    #[test]
    fn wrong_key_is_rejected() {
        let store = InMemoryBlobStore::new();
        let r = store.write_file(b"data").unwrap();
        let bad = BlobRef::new(r.bid.clone(), BlobKey::new("00").unwrap());
        assert!(matches!(store.open_file(&bad), Err(StoreError::KeyMismatch(_))));
    }

    #[test]
    fn uppercase_ref_opens() {
        let store = InMemoryBlobStore::new();
        let r = store.write_file(b"data").unwrap();
        let upper = BlobRef::parse_hex(
            &r.bid.as_str().to_ascii_uppercase(),
            &r.key.as_str().to_ascii_uppercase(),
        )
        .unwrap();
        assert_eq!(read_all(store.open_file(&upper).unwrap()), b"data");
    }

    #[test]
    fn missing_blob_is_not_found() {
        let store = InMemoryBlobStore::new();
        let r: BlobRef = "abcd:ef01".parse().unwrap();
        assert!(matches!(store.open_file(&r), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn put_is_idempotent() {
        let store = InMemoryBlobStore::new();
        let a = store.write_file(b"same").unwrap();
        let b = store.write_file(b"same").unwrap();
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
    }
}

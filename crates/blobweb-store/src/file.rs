use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use blobweb_types::{BlobId, BlobRef};

use crate::error::{StoreError, StoreResult};
use crate::hasher::BlobHasher;
use crate::object::{BlobKind, StoredBlob};
use crate::reader::{DirectoryReader, FileReader};
use crate::traits::{BlobStore, BlobWriter};

/// Read buffer used while verifying a key.
const HASH_CHUNK: usize = 64 * 1024;

/// One-file-per-blob store rooted at a directory.
///
/// On-disk layout:
/// ```text
/// <root>/<bid[0..2]>/<bid>
///   [1 byte: kind tag, b'd' or b'f']
///   [N bytes: payload]
/// ```
/// The store never creates `root` on its own; a missing root simply means
/// every open reports `NotFound`.
#[derive(Clone, Debug)]
pub struct FileBlobStore {
    root: PathBuf,
}

impl FileBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a blob. `BlobId` is alphanumeric, so it cannot escape `root`.
    fn blob_path(&self, bid: &BlobId) -> PathBuf {
        let name = bid.as_str().to_ascii_lowercase();
        let fan = name[..2.min(name.len())].to_owned();
        self.root.join(fan).join(name)
    }

    /// Open a blob file and check its kind tag.
    ///
    /// The returned file is positioned at the start of the payload.
    fn open_kind(&self, bid: &BlobId, expected: BlobKind) -> StoreResult<File> {
        let mut file = match File::open(self.blob_path(bid)) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(bid.clone()))
            }
            Err(e) => return Err(e.into()),
        };

        let mut tag = [0u8; 1];
        file.read_exact(&mut tag).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => StoreError::Corrupt {
                bid: bid.clone(),
                reason: "missing kind tag".into(),
            },
            _ => e.into(),
        })?;
        let found = BlobKind::from_tag(tag[0]).ok_or_else(|| StoreError::Corrupt {
            bid: bid.clone(),
            reason: format!("unknown kind tag {:#04x}", tag[0]),
        })?;
        if found != expected {
            return Err(StoreError::KindMismatch {
                bid: bid.clone(),
                expected,
                found,
            });
        }
        Ok(file)
    }
}

impl BlobStore for FileBlobStore {
    fn open_directory(&self, blob: &BlobRef) -> StoreResult<DirectoryReader> {
        let mut file = self.open_kind(&blob.bid, BlobKind::Directory)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        if !BlobHasher::key_matches(&blake3::hash(&data), &blob.key) {
            return Err(StoreError::KeyMismatch(blob.bid.clone()));
        }
        Ok(DirectoryReader::from_payload(data))
    }

    /// Open a file blob.
    ///
    /// The key is checked with a full pre-pass over the payload before the
    /// reader is returned, so a wrong key never yields a single byte. The
    /// cost is a second read of the file, and time to first byte grows with
    /// its size.
    fn open_file(&self, blob: &BlobRef) -> StoreResult<FileReader> {
        let mut file = self.open_kind(&blob.bid, BlobKind::File)?;

        let mut hasher = blake3::Hasher::new();
        let mut buf = vec![0u8; HASH_CHUNK];
        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        if !BlobHasher::key_matches(&hasher.finalize(), &blob.key) {
            return Err(StoreError::KeyMismatch(blob.bid.clone()));
        }

        file.seek(SeekFrom::Start(1))?;
        Ok(FileReader::new(BufReader::new(file)))
    }
}

impl BlobWriter for FileBlobStore {
    fn put(&self, blob: &StoredBlob) -> StoreResult<BlobRef> {
        let blob_ref = blob.compute_ref();
        let path = self.blob_path(&blob_ref.bid);
        if path.exists() {
            debug!(bid = blob_ref.bid.short(), "blob already stored");
            return Ok(blob_ref);
        }

        let parent = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent)?;

        // Write to a temp file in the same directory, then rename into place.
        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(&[blob.kind.tag()])?;
        tmp.write_all(&blob.data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;

        debug!(bid = blob_ref.bid.short(), kind = %blob.kind, size = blob.size(), "stored blob");
        Ok(blob_ref)
    }
}

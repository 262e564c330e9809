//! Content-addressed blob storage for blobweb.
//!
//! Every blob is an immutable byte payload tagged as either a directory or a
//! file, addressed by a [`BlobRef`](blobweb_types::BlobRef): a BID derived
//! from the payload (domain-separated by kind) and a KEY that the backend
//! checks before handing out a reader.
//!
//! # Readers
//!
//! - [`DirectoryReader`] -- lazy, ordered iterator of directory entries that
//!   reports enumeration failures distinctly from end-of-listing
//! - [`FileReader`] -- sequential byte stream (`std::io::Read`)
//!
//! # Storage Backends
//!
//! All backends implement [`BlobStore`] (read side) and [`BlobWriter`]:
//!
//! - [`InMemoryBlobStore`] -- `HashMap`-based store for tests and embedding
//! - [`FileBlobStore`] -- one file per blob under a fan-out directory tree
//!
//! # Design Rules
//!
//! 1. Blobs are immutable once written (content-addressing guarantees this).
//! 2. Opening a blob as the wrong kind is an ordinary error, not an anomaly:
//!    callers use it to tell directories from files.
//! 3. Concurrent opens are always safe; each open returns an independent reader.

pub mod error;
pub mod file;
pub mod hasher;
pub mod memory;
pub mod object;
pub mod reader;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::FileBlobStore;
pub use hasher::BlobHasher;
pub use memory::InMemoryBlobStore;
pub use object::{BlobKind, StoredBlob};
pub use reader::{DirectoryReader, FileReader};
pub use traits::{BlobStore, BlobWriter};

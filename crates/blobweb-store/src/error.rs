use blobweb_types::BlobId;

use crate::object::BlobKind;

/// Errors from blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No blob with this identifier exists.
    #[error("blob not found: {0}")]
    NotFound(BlobId),

    /// The blob exists but is of a different kind than requested.
    #[error("blob {bid} is a {found}, not a {expected}")]
    KindMismatch {
        bid: BlobId,
        expected: BlobKind,
        found: BlobKind,
    },

    /// The supplied key does not open this blob.
    #[error("key does not match blob {0}")]
    KeyMismatch(BlobId),

    /// The stored data is malformed.
    #[error("corrupt blob {bid}: {reason}")]
    Corrupt { bid: BlobId, reason: String },

    /// Serialization failure while encoding a blob.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A directory failed part-way through enumeration.
    #[error("directory enumeration failed: {0}")]
    Enumeration(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

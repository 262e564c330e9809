use blobweb_types::{BlobId, BlobKey};

/// Domain-separated BLAKE3 hasher for blob identifiers.
///
/// The domain tag is prepended to every hash so a directory and a file with
/// identical payload bytes never share a BID.
pub struct BlobHasher {
    domain: &'static str,
}

impl BlobHasher {
    /// Hasher for file blobs.
    pub const FILE: Self = Self {
        domain: "blobweb-file-v1",
    };
    /// Hasher for directory blobs.
    pub const DIRECTORY: Self = Self {
        domain: "blobweb-dir-v1",
    };

    /// Compute the BID of a payload.
    pub fn hash(&self, data: &[u8]) -> BlobId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        BlobId::from_digest(hasher.finalize().as_bytes())
    }

    /// The access key of a payload: its plain BLAKE3 digest.
    pub fn content_key(data: &[u8]) -> BlobKey {
        BlobKey::from_digest(blake3::hash(data).as_bytes())
    }

    /// Compare a finished key digest against the key a caller supplied.
    ///
    /// Hex case is not significant.
    pub fn key_matches(digest: &blake3::Hash, key: &BlobKey) -> bool {
        digest.to_hex().as_str().eq_ignore_ascii_case(key.as_str())
    }
}

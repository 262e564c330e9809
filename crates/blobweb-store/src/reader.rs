use std::io::{Cursor, Read};

use blobweb_types::{BlobRef, DirEntry};

use crate::error::{StoreError, StoreResult};

type EntryIter = Box<dyn Iterator<Item = StoreResult<DirEntry>> + Send>;

/// Lazy, ordered enumeration of a directory blob.
///
/// Yields `Some(Ok(entry))` per entry, `Some(Err(_))` if enumeration breaks
/// part-way, and `None` once the listing is complete. After an error the
/// reader is exhausted.
pub struct DirectoryReader {
    entries: EntryIter,
    failed: bool,
}

impl DirectoryReader {
    /// Wrap any entry source.
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = StoreResult<DirEntry>>,
        I::IntoIter: Send + 'static,
    {
        Self {
            entries: Box::new(entries.into_iter()),
            failed: false,
        }
    }

    /// Decode a newline-delimited JSON payload one entry at a time.
    pub fn from_payload(data: Vec<u8>) -> Self {
        let stream = serde_json::Deserializer::from_reader(Cursor::new(data))
            .into_iter::<DirEntry>()
            .map(|r| r.map_err(|e| StoreError::Enumeration(e.to_string())));
        Self::new(stream)
    }

    /// Scan for the first entry called `name`.
    ///
    /// Consumes the reader up to and including the match. An enumeration
    /// error before a match is returned as `Err`.
    pub fn find(&mut self, name: &str) -> StoreResult<Option<BlobRef>> {
        for entry in self.by_ref() {
            let entry = entry?;
            if entry.name == name {
                return Ok(Some(entry.blob));
            }
        }
        Ok(None)
    }
}

impl Iterator for DirectoryReader {
    type Item = StoreResult<DirEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.entries.next();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}

impl std::fmt::Debug for DirectoryReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryReader")
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}

/// Sequential byte stream over a file blob.
pub struct FileReader {
    inner: Box<dyn Read + Send>,
}

impl FileReader {
    pub fn new(inner: impl Read + Send + 'static) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }

    /// A reader over an in-memory payload.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self::new(Cursor::new(data))
    }
}

impl Read for FileReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl std::fmt::Debug for FileReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileReader").finish_non_exhaustive()
    }
}

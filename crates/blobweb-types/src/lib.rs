//! Foundation types for blobweb.
//!
//! Every blob in the store is addressed by an opaque pair: a content
//! identifier (BID) and an access key (KEY). This crate defines those tokens,
//! the pair itself, and the named child references that make up a directory
//! blob. Every other blobweb crate depends on `blobweb-types`.
//!
//! # Key Types
//!
//! - [`BlobId`] -- Content-identifying token (hex in practice)
//! - [`BlobKey`] -- Access token accompanying a [`BlobId`]
//! - [`BlobRef`] -- The `(BID, KEY)` pair used to open any blob
//! - [`DirEntry`] -- One named child of a directory blob

pub mod entry;
pub mod error;
pub mod id;

pub use entry::DirEntry;
pub use error::TypeError;
pub use id::{BlobId, BlobKey, BlobRef};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Check that `s` is non-empty and every character satisfies `allowed`.
fn validate(what: &'static str, s: &str, allowed: fn(&char) -> bool) -> Result<(), TypeError> {
    if s.is_empty() {
        return Err(TypeError::Empty(what));
    }
    match s.chars().find(|c| !allowed(c)) {
        Some(found) => Err(TypeError::InvalidCharacter { what, found }),
        None => Ok(()),
    }
}

/// Content-identifying token of a blob.
///
/// A `BlobId` is opaque to everything but the backend that issued it. In
/// practice it is a hex digest, but the only guarantee the type makes is that
/// it is a non-empty run of ASCII alphanumerics, which keeps it safe to embed
/// in URLs and file names.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlobId(String);

impl BlobId {
    /// Parse an alphanumeric identifier.
    pub fn new(s: impl Into<String>) -> Result<Self, TypeError> {
        let s = s.into();
        validate("blob id", &s, char::is_ascii_alphanumeric)?;
        Ok(Self(s))
    }

    /// Parse an identifier restricted to hexadecimal digits.
    ///
    /// This is the acceptance set of the `/blob/<BID>/<KEY>` route.
    pub fn parse_hex(s: &str) -> Result<Self, TypeError> {
        validate("blob id", s, char::is_ascii_hexdigit)?;
        Ok(Self(s.to_owned()))
    }

    /// Lowercase hex encoding of a raw digest.
    pub fn from_digest(digest: &[u8]) -> Self {
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form (first 8 characters) for log lines.
    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl fmt::Debug for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobId({})", self.short())
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for BlobId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BlobId> for String {
    fn from(id: BlobId) -> Self {
        id.0
    }
}

/// Access token accompanying a [`BlobId`].
///
/// Same lexical rules as `BlobId`. The `Debug` impl never prints the key.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlobKey(String);

impl BlobKey {
    /// Parse an alphanumeric key.
    pub fn new(s: impl Into<String>) -> Result<Self, TypeError> {
        let s = s.into();
        validate("blob key", &s, char::is_ascii_alphanumeric)?;
        Ok(Self(s))
    }

    /// Parse a key restricted to hexadecimal digits.
    pub fn parse_hex(s: &str) -> Result<Self, TypeError> {
        validate("blob key", s, char::is_ascii_hexdigit)?;
        Ok(Self(s.to_owned()))
    }

    /// Lowercase hex encoding of a raw digest.
    pub fn from_digest(digest: &[u8]) -> Self {
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BlobKey(..)")
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for BlobKey {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BlobKey> for String {
    fn from(key: BlobKey) -> Self {
        key.0
    }
}

/// The `(BID, KEY)` pair: the sole handle used to open a blob.
///
/// Displays and parses as `BID:KEY`, which is also its serialized form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BlobRef {
    pub bid: BlobId,
    pub key: BlobKey,
}

impl BlobRef {
    pub fn new(bid: BlobId, key: BlobKey) -> Self {
        Self { bid, key }
    }

    /// Parse a hex-only pair, as accepted by the direct blob route.
    pub fn parse_hex(bid: &str, key: &str) -> Result<Self, TypeError> {
        Ok(Self {
            bid: BlobId::parse_hex(bid)?,
            key: BlobKey::parse_hex(key)?,
        })
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.bid, self.key)
    }
}

impl FromStr for BlobRef {
    type Err = TypeError;

    /// Parse a `BID:KEY` token where both halves are `[a-zA-Z0-9]+`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (bid, key) = s
            .split_once(':')
            .ok_or_else(|| TypeError::MissingSeparator(s.to_owned()))?;
        Ok(Self {
            bid: BlobId::new(bid)?,
            key: BlobKey::new(key)?,
        })
    }
}

impl TryFrom<String> for BlobRef {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<BlobRef> for String {
    fn from(r: BlobRef) -> Self {
        r.to_string()
    }
}

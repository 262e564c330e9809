use thiserror::Error;

/// Errors produced while parsing blob tokens.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("empty {0}")]
    Empty(&'static str),

    #[error("invalid character {found:?} in {what}")]
    InvalidCharacter { what: &'static str, found: char },

    #[error("blob reference must be of form <BID>:<KEY>, got {0:?}")]
    MissingSeparator(String),
}

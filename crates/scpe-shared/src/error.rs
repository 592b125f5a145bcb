use thiserror::Error;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Password must not be empty")]
    Empty,

    #[error("Hashing failed: {0}")]
    HashingFailed(String),

    #[error("Stored hash is not a valid PHC string: {0}")]
    MalformedHash(String),
}

/// A stored or user-supplied string did not name a known enum variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind}: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

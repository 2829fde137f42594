//! Errors raised while decoding or marshaling arguments.
use thiserror::Error;

/// A wide integer whose value can't be represented exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("parameter {value} (low word {low:#010x}, high word {high:#010x}) is out of valid range")]
pub struct RangeError {
    pub low: u32,
    pub high: u32,
    pub value: i64,
}

/// A primitive argument that can't be turned into the value it stands for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeConvError {
    #[error("null pointer passed for a {len} byte region")]
    NullPointer { len: usize },
    #[error("null pointer passed for a string")]
    NullString,
    #[error("string is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("negative {what}: {value}")]
    Negative { what: &'static str, value: i64 },
}

/// Failure while building a name list for the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarshalError {
    #[error("allocation of {size} bytes failed")]
    OutOfMemory { size: usize },
    #[error("name {0:?} contains a NUL byte")]
    InteriorNul(String),
    #[error("{0} names do not fit in the count slot")]
    TooMany(usize),
}

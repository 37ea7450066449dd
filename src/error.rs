use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnpakkError {
    /// Encoded stream is malformed (e.g. shorter than the checksum header).
    #[error("format error: {0}")]
    Format(String),

    /// Propagated I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Attempt or time budget spent, or the whole search space covered,
    /// without a checksum match.
    #[error("search exhausted: {0}")]
    SearchExhausted(String),

    /// A backend reported a reconstruction that fails verification.
    #[error("integrity error: {0}")]
    Integrity(String),

    /// The stream references a hash whose bucket holds no candidates.
    #[error("no candidates for hash {hash:#04x} at block {position}")]
    EmptyBucket { position: usize, hash: u8 },

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Compute backend failure (device setup, dispatch, readback).
    #[error("backend error: {0}")]
    Backend(String),
}

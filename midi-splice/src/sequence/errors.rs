use thiserror::Error;

/// Precondition violations of the stream operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("Malformed stream: {0}")]
    MalformedStream(&'static str),
    #[error("Window length must be greater than zero")]
    ZeroWindowLength,
    #[error("Unknown note identifier {key} (expected 0..=127)")]
    UnknownNoteIdentifier { key: i64 },
}

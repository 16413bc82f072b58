//! Error types for the byte layer.

use thiserror::Error;

/// Failures of the streaming reader.
#[derive(Debug, Error)]
pub enum EncodingError {
    /// The byte source failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Rewinding was disabled, or the reader was told it will never rewind.
    #[error("the byte stream cannot be rewound")]
    RewindUnavailable,

    /// Bytes past the sniffing window were already decoded and dropped.
    #[error("cannot rewind past the first {limit} bytes")]
    RewindPastBoundary {
        /// The size of the rewind buffer.
        limit: usize,
    },
}

/// Result alias for the byte layer.
pub type Result<T> = std::result::Result<T, EncodingError>;

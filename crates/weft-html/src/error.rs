//! Fatal parse failures.
//!
//! Malformed markup never ends up here; it is reported through the
//! [`Reporter`](weft_common::Reporter) and recovered from. These are the
//! conditions that stop a parse.

use thiserror::Error;
use weft_encoding::EncodingError;

/// An output sink could not perform a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("sink error: {message}")]
pub struct SinkError {
    /// What went wrong.
    pub message: String,
}

impl SinkError {
    /// Create a sink error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A parse that cannot continue.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The output sink failed.
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// The byte source failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A restart needed a rewind that was not possible.
    #[error("encoding error: {0}")]
    Encoding(EncodingError),

    /// The driver was used out of order.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A construct that cannot be represented in XML, under
    /// [`XmlViolationPolicy::Fatal`](crate::XmlViolationPolicy::Fatal).
    #[error("not mappable to XML 1.0: {0}")]
    XmlViolation(String),
}

impl From<EncodingError> for ParseError {
    /// Source failures stay I/O errors; everything else the reader reports is
    /// an encoding error.
    fn from(error: EncodingError) -> Self {
        match error {
            EncodingError::Io(io) => Self::Io(io),
            other => Self::Encoding(other),
        }
    }
}

impl ParseError {
    /// Returns true if the failure came from the output sink.
    #[must_use]
    pub const fn is_sink_error(&self) -> bool {
        matches!(self, Self::Sink(_))
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // I/O errors (CLI only; the codec itself never touches files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Container errors
    #[error("Malformed SZS header: {reason}")]
    MalformedHeader { reason: &'static str },

    // Token stream errors
    #[error("Corrupt SZS stream at input offset {position}: {reason}")]
    CorruptStream {
        reason: &'static str,
        position: usize,
    },

    // Caller errors
    #[error("Output buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    // Encoder errors
    #[error("Encoding failed: {0}")]
    EncodeFailure(String),
}

/// Fieldless error category, for callers that only branch on the kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    MalformedHeader,
    CorruptStream,
    BufferTooSmall,
    EncodeFailure,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::MalformedHeader { .. } => ErrorKind::MalformedHeader,
            Error::CorruptStream { .. } => ErrorKind::CorruptStream,
            Error::BufferTooSmall { .. } => ErrorKind::BufferTooSmall,
            Error::EncodeFailure(_) => ErrorKind::EncodeFailure,
        }
    }

    pub(crate) fn corrupt(reason: &'static str, position: usize) -> Self {
        Error::CorruptStream { reason, position }
    }

    pub(crate) fn malformed(reason: &'static str) -> Self {
        Error::MalformedHeader { reason }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

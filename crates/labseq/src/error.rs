//! Error types for labseq

use std::fmt;

/// Result type alias for labseq operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for sequence evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Negative index requested
    InvalidIndex(i64),

    /// Index cannot be addressed on this platform
    IndexOutOfRange(i64),
}

impl Error {
    /// Whether the caller is at fault (as opposed to an internal failure)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidIndex(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidIndex(n) => write!(f, "Index must be non-negative, got: {}", n),
            Error::IndexOutOfRange(n) => {
                write!(f, "Index out of range: {} (max {})", n, usize::MAX)
            }
        }
    }
}

impl std::error::Error for Error {}

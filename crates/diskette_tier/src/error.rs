// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for cache operations.

use std::fmt;

/// The category of a failed cache operation.
///
/// `NotFound` is the ordinary miss signal and is expected to be handled by
/// callers. The other kinds indicate that the cache could not do its job and
/// are always propagated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The key is not present in the cache (or expired on read).
    NotFound,
    /// The stored bytes of an entry could not be decoded.
    Corrupt,
    /// The underlying storage failed for a reason other than absence.
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotFound => "key not found",
            Self::Corrupt => "corrupt entry",
            Self::Io => "storage failure",
        })
    }
}

/// An error from a cache operation.
///
/// The error carries an [`ErrorKind`] for programmatic handling and, where
/// available, the underlying cause. Use [`std::error::Error::source()`] to
/// walk the cause chain.
///
/// # Examples
///
/// ```
/// use diskette_tier::{Error, ErrorKind};
///
/// let error = Error::not_found();
/// assert_eq!(error.kind(), ErrorKind::NotFound);
/// assert!(error.is_not_found());
/// ```
#[ohno::error]
#[display("cache operation failed: {kind}")]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    /// Creates the miss error.
    #[must_use]
    pub fn not_found() -> Self {
        Self::new(ErrorKind::NotFound)
    }

    /// Creates an error for an entry whose content failed to decode.
    pub fn corrupt(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Corrupt, cause)
    }

    /// Creates an error for a storage failure.
    pub fn io(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Io, cause)
    }

    /// Returns the category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns `true` if this error is the ordinary miss signal.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }
}

/// A file that disappears between a lookup and the operation on it is a miss,
/// not a storage failure.
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::caused_by(ErrorKind::NotFound, error),
            _ => Self::caused_by(ErrorKind::Io, error),
        }
    }
}

/// A specialized [`Result`] type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

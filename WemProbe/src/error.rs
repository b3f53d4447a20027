//! Error types for `WemProbe`

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// The error type for `WemProbe` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== Source Errors ====================
    /// The container could not be located.
    #[error("container not found: {path}")]
    NotFound {
        /// The identifier that failed to resolve.
        path: PathBuf,
    },

    /// IO error on an otherwise valid handle.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A read would extend past the end of the container.
    #[error("read of {length} bytes at {offset:#x} exceeds container size {size:#x}")]
    OutOfRange {
        /// Requested start offset.
        offset: u64,
        /// Requested length in bytes.
        length: u64,
        /// Total container length.
        size: u64,
    },

    // ==================== Header Errors ====================
    /// Signature, discriminant or codebook library not recognized.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Offsets, sizes or loop points are internally inconsistent.
    #[error("corrupt header: {0}")]
    CorruptHeader(String),

    // ==================== Codec Errors ====================
    /// The Vorbis backend rejected the reconstructed header packets.
    #[error("codec setup failed: {0}")]
    CodecSetupFailed(String),

    /// API misuse, e.g. initializing a decode state twice on one source.
    #[error("invalid state: {0}")]
    InvalidState(String),

    // ==================== Configuration Errors ====================
    /// The configuration file could not be parsed.
    #[error("config error in {path}: {message}")]
    Config {
        /// The configuration file.
        path: PathBuf,
        /// The parser message.
        message: String,
    },

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse failure category, reported by the CLI next to the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Io,
    OutOfRange,
    UnsupportedFormat,
    CorruptHeader,
    CodecSetupFailed,
    InvalidState,
    Config,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::Io => "io error",
            ErrorKind::OutOfRange => "out of range",
            ErrorKind::UnsupportedFormat => "unsupported format",
            ErrorKind::CorruptHeader => "corrupt header",
            ErrorKind::CodecSetupFailed => "codec setup failed",
            ErrorKind::InvalidState => "invalid state",
            ErrorKind::Config => "config error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// The category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Io(_) => ErrorKind::Io,
            Error::OutOfRange { .. } => ErrorKind::OutOfRange,
            Error::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            Error::CorruptHeader(_) => ErrorKind::CorruptHeader,
            Error::CodecSetupFailed(_) => ErrorKind::CodecSetupFailed,
            Error::InvalidState(_) => ErrorKind::InvalidState,
            Error::Config { .. } | Error::Json(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn corrupt(message: impl Into<String>) -> Self {
        Error::CorruptHeader(message.into())
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Error::UnsupportedFormat(message.into())
    }
}

/// A specialized Result type for `WemProbe` operations.
pub type Result<T> = std::result::Result<T, Error>;

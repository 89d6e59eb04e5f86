use std::io;
use thiserror::Error;

/// Result type for jvfs operations
pub type Result<T> = std::result::Result<T, VfsError>;

/// Unified error type for all jvfs operations
#[derive(Debug, Error)]
pub enum VfsError {
    // Container errors
    #[error("Unrecognized package format")]
    UnrecognizedFormat,

    #[error("Bad package signature")]
    BadSignature,

    #[error("Invalid package: {0}")]
    InvalidPackage(#[source] Box<VfsError>),

    #[error("Entry offset {offset} is past the end of the package ({limit} bytes)")]
    InvalidOffset { offset: u64, limit: u64 },

    #[error("Truncated entry table: {0}")]
    Truncated(&'static str),

    #[error("Entry table contains no entries")]
    EmptyTable,

    #[error("Compressed header of {size} bytes exceeds the {max} byte limit")]
    HeaderTooLarge { size: u64, max: u64 },

    #[error("Invalid entry name: {0}")]
    InvalidName(String),

    // Payload errors
    #[error("Corrupt data: {0}")]
    CorruptData(String),

    #[error("Output buffer holds {actual} bytes, entry needs {expected}")]
    BufferSize { expected: u64, actual: u64 },

    // Reader misuse
    #[error("Reader is not open")]
    NotOpen,

    #[error("Entry does not belong to the current table: {0}")]
    StaleEntry(String),

    #[error("Entry not found: {0}")]
    NotFound(String),

    // Writer errors
    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for VfsError {
    fn from(err: toml::de::Error) -> Self {
        VfsError::Config(err.to_string())
    }
}

impl VfsError {
    /// Wrap a table decode failure the way `open` reports it
    pub(crate) fn invalid_package(cause: VfsError) -> Self {
        match cause {
            VfsError::UnrecognizedFormat | VfsError::InvalidPackage(_) => cause,
            other => VfsError::InvalidPackage(Box::new(other)),
        }
    }
}

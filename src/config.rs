//! Reader configuration
//!
//! Defaults match the containers produced by the original packaging tool.
//! A config can also be loaded from TOML:
//!
//! ```toml
//! chunk_size = 32768
//! integer_decoding = "legacy"
//! path_separator = "\\"
//! ```

use crate::error::{Result, VfsError};
use serde::Deserialize;
use std::path::Path;

/// Scratch chunk size used by the decompression engine (16KB)
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

/// Upper bound for an inflated compressed header (64MB)
pub const DEFAULT_MAX_HEADER_SIZE: u64 = 64 * 1024 * 1024;

/// How 8-byte big-endian integers in the entry table are decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegerDecoding {
    /// Plain big-endian
    #[default]
    Standard,
    /// Byte 5 is taken from byte 0, as the original reader did
    Legacy,
}

/// Configuration shared by the package and directory readers
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VfsConfig {
    pub chunk_size: usize,
    pub max_header_size: u64,
    pub integer_decoding: IntegerDecoding,
    pub path_separator: char,
}

impl Default for VfsConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_header_size: DEFAULT_MAX_HEADER_SIZE,
            integer_decoding: IntegerDecoding::Standard,
            path_separator: '/',
        }
    }
}

impl VfsConfig {
    /// Parse a config from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_max_header_size(mut self, max_header_size: u64) -> Self {
        self.max_header_size = max_header_size;
        self
    }

    pub fn with_integer_decoding(mut self, decoding: IntegerDecoding) -> Self {
        self.integer_decoding = decoding;
        self
    }

    pub fn with_path_separator(mut self, separator: char) -> Self {
        self.path_separator = separator;
        self
    }

    /// Check values that would make the readers unusable
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(VfsError::Config("chunk_size must be non-zero".to_string()));
        }
        if self.path_separator == '\0' {
            return Err(VfsError::Config(
                "path_separator must not be NUL".to_string(),
            ));
        }
        Ok(())
    }
}

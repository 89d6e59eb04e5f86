//! jvfs-rs: read-only virtual file system over JVFS packages
//!
//! Entries resolve either from a single-file package container or from
//! loose files under a directory:
//! - Package containers with a plain or zlib-compressed entry table
//! - Bounded streaming inflate of each entry through a fixed scratch chunk
//! - A directory reader with the same interface for development trees
//! - A `FileSystem` trait so callers can swap the backing medium
//!
//! # Example
//!
//! ```no_run
//! use jvfs_rs::{FileSystem, HeaderFormat, PackageReader, PackageWriter};
//!
//! // Create a package
//! let mut writer = PackageWriter::new(HeaderFormat::Compressed);
//! writer.add_entry("pkg/hello.txt", b"Hello, World!")?;
//! writer.finish("out.pkg")?;
//!
//! // Read from the package
//! let mut reader: PackageReader = PackageReader::open_path("out.pkg")?;
//! let data = reader.read_to_vec("pkg/hello.txt")?;
//! # Ok::<(), jvfs_rs::error::VfsError>(())
//! ```

// Core modules
pub mod config;
pub mod directory;
pub mod error;
pub mod package;
pub mod stream;
pub mod vfs;

// Re-export commonly used types
pub use config::{IntegerDecoding, VfsConfig, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_HEADER_SIZE};
pub use directory::DirectoryReader;
pub use error::{Result, VfsError};
pub use package::{
    Entry, EntryTable, HeaderFormat, Inflater, PackageReader, PackageWriter, ReaderState,
    COMPRESSED_SIGNATURE, PLAIN_SIGNATURE,
};
pub use stream::{ByteStream, FileStream, MemoryStream, OpenStream};
pub use vfs::{mount, FileSystem};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_basics() {
        // Ensure core types are accessible
        let _format = HeaderFormat::Compressed;
        let _reader: PackageReader = PackageReader::new();
        let _dir: DirectoryReader = DirectoryReader::new();
    }
}

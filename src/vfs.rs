//! Filesystem facade shared by the package and directory readers
//!
//! Callers hold a `FileSystem` and never care whether entries come from a
//! packaged container or a loose development tree:
//!
//! ```no_run
//! use jvfs_rs::{mount, FileSystem, VfsConfig};
//!
//! let mut fs = mount("assets.pkg", VfsConfig::default())?;
//! if let Some(entry) = fs.find_entry("pkg/hello.txt") {
//!     let mut data = vec![0u8; entry.size as usize];
//!     fs.read_entry(&entry, &mut data)?;
//! }
//! # Ok::<(), jvfs_rs::VfsError>(())
//! ```

use crate::config::VfsConfig;
use crate::directory::DirectoryReader;
use crate::error::{Result, VfsError};
use crate::package::{zeroed_buffer, Entry, PackageReader};
use crate::stream::FileStream;
use std::path::Path;
use tracing::debug;

/// Capability interface implemented by every reader
pub trait FileSystem {
    /// Open the backing medium at `path`
    fn open(&mut self, path: &Path) -> Result<()>;

    /// Release the medium and forget all entries. Idempotent.
    fn close(&mut self);

    /// Look up an entry; absence is not an error
    fn find_entry(&mut self, name: &str) -> Option<Entry>;

    /// Read the whole entry into `output`, which must be exactly `entry.size` bytes
    fn read_entry(&mut self, entry: &Entry, output: &mut [u8]) -> Result<()>;

    fn contains(&mut self, name: &str) -> bool {
        self.find_entry(name).is_some()
    }

    /// Look up `name` and read it into a new buffer
    ///
    /// Fails with `BufferSize` when a buffer of the declared size cannot be
    /// allocated.
    fn read_to_vec(&mut self, name: &str) -> Result<Vec<u8>> {
        let entry = self
            .find_entry(name)
            .ok_or_else(|| VfsError::NotFound(name.to_string()))?;
        let mut data = zeroed_buffer(entry.size).ok_or(VfsError::BufferSize {
            expected: entry.size,
            actual: 0,
        })?;
        self.read_entry(&entry, &mut data)?;
        Ok(data)
    }
}

/// Open `path` with the reader matching what it points at
///
/// Directories get a `DirectoryReader`, anything else is opened as a package.
pub fn mount<P: AsRef<Path>>(path: P, config: VfsConfig) -> Result<Box<dyn FileSystem>> {
    let path = path.as_ref();
    config.validate()?;

    let mut fs: Box<dyn FileSystem> = if path.is_dir() {
        debug!("Mounting directory {}", path.display());
        Box::new(DirectoryReader::<FileStream>::with_config(config))
    } else {
        debug!("Mounting package {}", path.display());
        Box::new(PackageReader::<FileStream>::with_config(config))
    };
    fs.open(path)?;
    Ok(fs)
}

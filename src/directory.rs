//! Directory-backed reader
//!
//! Serves loose files under a base directory through the same facade as the
//! package reader. Sizes are discovered on first lookup and cached, so a
//! development tree can stand in for a packaged build.

use crate::config::VfsConfig;
use crate::error::{Result, VfsError};
use crate::package::{next_table_id, Entry};
use crate::stream::{ByteStream, FileStream, OpenStream};
use crate::vfs::FileSystem;
use std::collections::HashMap;
use std::io;
use std::marker::PhantomData;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, trace, warn};

/// Reader over loose files under a base directory
pub struct DirectoryReader<S: OpenStream = FileStream> {
    base: Option<PathBuf>,
    cache: HashMap<String, Entry>,
    table_id: u64,
    config: VfsConfig,
    _medium: PhantomData<fn() -> S>,
}

impl<S: OpenStream> DirectoryReader<S> {
    pub fn new() -> Self {
        Self::with_config(VfsConfig::default())
    }

    pub fn with_config(config: VfsConfig) -> Self {
        Self {
            base: None,
            cache: HashMap::new(),
            table_id: next_table_id(),
            config,
            _medium: PhantomData,
        }
    }

    /// Create a reader rooted at `path`
    pub fn open_path<P: AsRef<Path>>(path: P) -> Self {
        let mut reader = Self::new();
        reader.open_dir(path.as_ref());
        reader
    }

    /// Root the reader at `path`, forgetting any cached entries
    pub fn open_dir(&mut self, path: &Path) {
        self.close_dir();
        if !path.is_dir() {
            debug!("Directory {} does not exist yet", path.display());
        }
        self.base = Some(path.to_path_buf());
    }

    pub fn close_dir(&mut self) {
        self.base = None;
        self.cache.clear();
        self.table_id = next_table_id();
    }

    pub fn base_path(&self) -> Option<&Path> {
        self.base.as_deref()
    }

    /// Number of names resolved so far
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    /// Map a logical name onto the base directory
    ///
    /// Returns `None` for names that would leave the base directory.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        let base = self.base.as_ref()?;
        let separator = self.config.path_separator;

        let mut path = base.clone();
        let mut depth = 0;
        for part in name.split(|c: char| c == separator || c == '/' || c == '\\') {
            if part.is_empty() || part == "." {
                continue;
            }
            let mut components = Path::new(part).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(_)), None) => path.push(part),
                _ => {
                    warn!("Rejecting entry name {:?}", name);
                    return None;
                }
            }
            depth += 1;
        }

        (depth > 0).then_some(path)
    }

    fn register_entry(&mut self, name: &str) -> Option<Entry> {
        if let Some(entry) = self.cache.get(name) {
            return Some(entry.clone());
        }

        let path = self.resolve(name)?;
        let size = match S::open_size(&path) {
            Ok(size) => size,
            Err(e) => {
                trace!("{} not available: {}", path.display(), e);
                return None;
            }
        };
        let resolved = path.to_str()?.to_string();

        trace!("Registered {} ({} bytes)", resolved, size);
        let entry = Entry::new(resolved, 0, size, self.table_id);
        self.cache.insert(name.to_string(), entry.clone());
        Some(entry)
    }

    /// Read the whole file behind `entry` into `output`
    pub fn read_into(&mut self, entry: &Entry, output: &mut [u8]) -> Result<()> {
        if self.base.is_none() {
            return Err(VfsError::NotOpen);
        }
        if entry.table_id() != self.table_id {
            return Err(VfsError::StaleEntry(entry.name.clone()));
        }
        if output.len() as u64 != entry.size {
            return Err(VfsError::BufferSize {
                expected: entry.size,
                actual: output.len() as u64,
            });
        }

        let mut stream = S::open_path(Path::new(&entry.name))?;
        let read = stream.read_bulk(output)?;
        if read != output.len() {
            return Err(VfsError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("{} shrank to {} bytes", entry.name, read),
            )));
        }
        Ok(())
    }
}

impl<S: OpenStream> Default for DirectoryReader<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: OpenStream> FileSystem for DirectoryReader<S> {
    fn open(&mut self, path: &Path) -> Result<()> {
        self.open_dir(path);
        Ok(())
    }

    fn close(&mut self) {
        self.close_dir();
    }

    fn find_entry(&mut self, name: &str) -> Option<Entry> {
        self.register_entry(name)
    }

    fn read_entry(&mut self, entry: &Entry, output: &mut [u8]) -> Result<()> {
        self.read_into(entry, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::MemoryStream;

    #[test]
    fn test_resolve_normalizes_separators() {
        let reader = DirectoryReader::<FileStream>::with_config(
            VfsConfig::default().with_path_separator(':'),
        );
        assert!(reader.resolve("a/b").is_none());

        let mut reader = reader;
        reader.open_dir(Path::new("/base"));
        let expected = Path::new("/base").join("a").join("b").join("c.txt");
        assert_eq!(reader.resolve("a:b\\c.txt").unwrap(), expected);
        assert_eq!(reader.resolve("./a//b/c.txt").unwrap(), expected);
    }

    #[test]
    fn test_resolve_rejects_escapes() {
        let reader = DirectoryReader::<FileStream>::open_path("/base");
        assert!(reader.resolve("../etc/passwd").is_none());
        assert!(reader.resolve("a/../../b").is_none());
        assert!(reader.resolve("").is_none());
        assert!(reader.resolve("/").is_none());
    }

    #[test]
    fn test_caches_and_reads() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/file.bin"), [9u8, 8, 7]).unwrap();

        let mut reader = DirectoryReader::<MemoryStream<Vec<u8>>>::open_path(dir.path());
        let first = reader.find_entry("sub/file.bin").unwrap();
        assert_eq!(first.size, 3);
        assert_eq!(first.offset, 0);
        assert!(reader.find_entry("sub").is_none());

        // Removing the file does not affect the cached descriptor
        std::fs::remove_file(dir.path().join("sub/file.bin")).unwrap();
        let second = reader.find_entry("sub/file.bin").unwrap();
        assert_eq!(first, second);
        assert_eq!(reader.cached_count(), 1);

        let mut buf = [0u8; 3];
        assert!(matches!(
            reader.read_entry(&second, &mut buf),
            Err(VfsError::Io(_))
        ));
    }

    #[test]
    fn test_directories_are_not_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let mut reader = DirectoryReader::<FileStream>::open_path(dir.path());
        assert!(reader.find_entry("sub").is_none());
        assert_eq!(reader.cached_count(), 0);
    }
}

use crate::config::VfsConfig;
use crate::error::{Result, VfsError};
use crate::package::format::{decode_table, Entry, EntryTable};
use crate::package::inflate::Inflater;
use crate::stream::{ByteStream, FileStream, OpenStream};
use crate::vfs::FileSystem;
use std::path::Path;
use tracing::{debug, trace, warn};

/// Lifecycle of a package reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    Closed,
    Opening,
    Open,
}

/// Package reader over a JVFS container
///
/// The stream type selects the medium: `FileStream` reads from disk,
/// `MemoryStream<Vec<u8>>` loads the container into memory first.
pub struct PackageReader<S: OpenStream = FileStream> {
    stream: Option<S>,
    table: Option<EntryTable>,
    inflater: Inflater,
    state: ReaderState,
    config: VfsConfig,
}

impl<S: OpenStream> PackageReader<S> {
    /// Create a closed reader with the default configuration
    pub fn new() -> Self {
        Self::with_config(VfsConfig::default())
    }

    /// Create a closed reader with a custom configuration
    pub fn with_config(config: VfsConfig) -> Self {
        Self {
            stream: None,
            table: None,
            inflater: Inflater::new(config.chunk_size),
            state: ReaderState::Closed,
            config,
        }
    }

    /// Create a reader and open `path` in one step
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = Self::new();
        reader.open_package(path.as_ref())?;
        Ok(reader)
    }

    /// Open the container at `path`, replacing any open session
    pub fn open_package(&mut self, path: &Path) -> Result<()> {
        self.close_package();
        debug!("Opening package {}", path.display());

        let stream = S::open_path(path)?;
        self.open_stream(stream)
    }

    /// Open an already constructed stream, replacing any open session
    pub fn open_stream(&mut self, mut stream: S) -> Result<()> {
        self.close_package();
        self.state = ReaderState::Opening;

        match decode_table(&mut stream, &mut self.inflater, &self.config) {
            Ok(table) => {
                debug!("Package open with {} entries", table.len());
                self.stream = Some(stream);
                self.table = Some(table);
                self.state = ReaderState::Open;
                Ok(())
            }
            Err(e) => {
                warn!("Rejecting package: {}", e);
                self.state = ReaderState::Closed;
                Err(VfsError::invalid_package(e))
            }
        }
    }

    /// Drop the stream and the table. Safe to call in any state.
    pub fn close_package(&mut self) {
        if self.stream.take().is_some() {
            debug!("Closing package");
        }
        self.table = None;
        self.state = ReaderState::Closed;
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ReaderState::Open
    }

    pub fn config(&self) -> &VfsConfig {
        &self.config
    }

    /// Look up an entry by exact name
    pub fn get_entry(&self, name: &str) -> Option<&Entry> {
        self.table.as_ref()?.get(name)
    }

    /// Number of distinct entries in the open package
    pub fn entry_count(&self) -> usize {
        self.table.as_ref().map_or(0, EntryTable::len)
    }

    /// Entries in container order
    pub fn list_entries(&self) -> &[Entry] {
        self.table.as_ref().map(EntryTable::entries).unwrap_or(&[])
    }

    /// Entries whose name starts with `prefix`
    pub fn list_prefix(&self, prefix: &str) -> Vec<&Entry> {
        self.list_entries()
            .iter()
            .filter(|entry| entry.name.starts_with(prefix))
            .collect()
    }

    /// Inflate `entry` into `output`, which must hold exactly `entry.size` bytes
    pub fn read_into(&mut self, entry: &Entry, output: &mut [u8]) -> Result<()> {
        let (stream, table) = match (self.stream.as_mut(), self.table.as_ref()) {
            (Some(stream), Some(table)) => (stream, table),
            _ => return Err(VfsError::NotOpen),
        };
        if !table.owns(entry) {
            return Err(VfsError::StaleEntry(entry.name.clone()));
        }
        if output.len() as u64 != entry.size {
            return Err(VfsError::BufferSize {
                expected: entry.size,
                actual: output.len() as u64,
            });
        }

        trace!("Reading {} ({} bytes at {})", entry.name, entry.size, entry.offset);
        stream.seek_to(entry.offset)?;
        let produced = self.inflater.inflate(stream, output, entry.size)?;
        if produced != entry.size {
            return Err(VfsError::CorruptData(format!(
                "{} inflated to {} of {} bytes",
                entry.name, produced, entry.size
            )));
        }
        Ok(())
    }
}

impl<S: OpenStream> Default for PackageReader<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: OpenStream> FileSystem for PackageReader<S> {
    fn open(&mut self, path: &Path) -> Result<()> {
        self.open_package(path)
    }

    fn close(&mut self) {
        self.close_package();
    }

    fn find_entry(&mut self, name: &str) -> Option<Entry> {
        self.get_entry(name).cloned()
    }

    fn read_entry(&mut self, entry: &Entry, output: &mut [u8]) -> Result<()> {
        self.read_into(entry, output)
    }
}

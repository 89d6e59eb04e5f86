//! Byte sources the readers pull from
//!
//! `ByteStream` is the seek/read/tell/eof surface the package format is
//! decoded against. `OpenStream` adds construction from a path, which is how
//! a reader picks its medium (disk file, memory image, ...) at compile time.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Positionable, forward-readable byte source
pub trait ByteStream {
    /// Current read position
    fn position(&self) -> u64;

    /// Total size of the stream in bytes
    fn size(&self) -> u64;

    /// Move the read position to `pos`
    fn seek_to(&mut self, pos: u64) -> io::Result<()>;

    /// Read up to `buf.len()` bytes. Returns fewer only at end of stream.
    fn read_bulk(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Read a single byte, `None` at end of stream
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        match self.read_bulk(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }

    /// True once the position has reached the end
    fn is_eof(&self) -> bool {
        self.position() >= self.size()
    }
}

/// A `ByteStream` that can be opened from a path
pub trait OpenStream: ByteStream + Sized {
    fn open_path(path: &Path) -> io::Result<Self>;

    /// Size of the medium at `path` without keeping it open
    fn open_size(path: &Path) -> io::Result<u64> {
        Ok(Self::open_path(path)?.size())
    }
}

/// Size of a regular file from its metadata
fn file_size(path: &Path) -> io::Result<u64> {
    let metadata = std::fs::metadata(path)?;
    if metadata.is_dir() {
        return Err(io::Error::new(io::ErrorKind::Other, "path is a directory"));
    }
    Ok(metadata.len())
}

/// Buffered stream over a file on disk
#[derive(Debug)]
pub struct FileStream {
    reader: BufReader<File>,
    position: u64,
    size: u64,
}

impl FileStream {
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        let metadata = file.metadata()?;
        if metadata.is_dir() {
            return Err(io::Error::new(io::ErrorKind::Other, "path is a directory"));
        }
        let size = metadata.len();
        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
            size,
        })
    }
}

impl ByteStream for FileStream {
    fn position(&self) -> u64 {
        self.position
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn seek_to(&mut self, pos: u64) -> io::Result<()> {
        self.position = self.reader.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    fn read_bulk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        self.position += filled as u64;
        Ok(filled)
    }
}

impl OpenStream for FileStream {
    fn open_path(path: &Path) -> io::Result<Self> {
        Self::open(path)
    }
}

/// Stream over an in-memory block
#[derive(Debug, Clone)]
pub struct MemoryStream<T> {
    data: T,
    position: u64,
}

impl<T: AsRef<[u8]>> MemoryStream<T> {
    pub fn new(data: T) -> Self {
        Self { data, position: 0 }
    }

    pub fn into_inner(self) -> T {
        self.data
    }
}

impl<T: AsRef<[u8]>> ByteStream for MemoryStream<T> {
    fn position(&self) -> u64 {
        self.position
    }

    fn size(&self) -> u64 {
        self.data.as_ref().len() as u64
    }

    fn seek_to(&mut self, pos: u64) -> io::Result<()> {
        // Seeking past the end is allowed; reads there return nothing
        self.position = pos;
        Ok(())
    }

    fn read_bulk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let data = self.data.as_ref();
        let start = usize::try_from(self.position)
            .unwrap_or(usize::MAX)
            .min(data.len());
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        self.position += n as u64;
        Ok(n)
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let data = self.data.as_ref();
        let byte = usize::try_from(self.position)
            .ok()
            .and_then(|pos| data.get(pos).copied());
        if byte.is_some() {
            self.position += 1;
        }
        Ok(byte)
    }
}

/// Loads the whole file into memory (ram-fs style medium)
impl OpenStream for MemoryStream<Vec<u8>> {
    fn open_path(path: &Path) -> io::Result<Self> {
        Ok(Self::new(std::fs::read(path)?))
    }

    fn open_size(path: &Path) -> io::Result<u64> {
        file_size(path)
    }
}

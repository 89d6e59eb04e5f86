use crate::error::{Result, VfsError};
use crate::package::format::{
    encode_entries, encode_signature, encoded_entries_len, Entry, HeaderFormat,
};
use byteorder::{BigEndian, WriteBytesExt};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Signature plus its NUL terminator
const SIGNATURE_LEN: u64 = 9;

/// Normalize path to forward slashes (cross-platform compatibility)
fn normalize_name(name: &str) -> String {
    name.replace('\\', "/")
}

struct PendingEntry {
    name: String,
    size: u64,
    payload: Vec<u8>,
}

/// Builds a fresh JVFS container
///
/// Every payload is compressed into its own zlib stream when added; the
/// header is laid out when the container is written.
pub struct PackageWriter {
    format: HeaderFormat,
    entries: Vec<PendingEntry>,
    names: HashSet<String>,
}

impl PackageWriter {
    pub fn new(format: HeaderFormat) -> Self {
        Self {
            format,
            entries: Vec::new(),
            names: HashSet::new(),
        }
    }

    /// Add an entry with the default compression level
    pub fn add_entry(&mut self, name: &str, data: &[u8]) -> Result<()> {
        self.add_entry_with_level(name, data, Compression::default())
    }

    /// Add an entry with a specific compression level
    pub fn add_entry_with_level(
        &mut self,
        name: &str,
        data: &[u8],
        level: Compression,
    ) -> Result<()> {
        let name = normalize_name(name);
        if name.is_empty() || name.contains('\0') {
            return Err(VfsError::InvalidName(name));
        }
        if self.names.contains(&name) {
            return Err(VfsError::DuplicateEntry(name));
        }

        let payload = deflate(data, level)?;
        self.names.insert(name.clone());
        self.entries.push(PendingEntry {
            name,
            size: data.len() as u64,
            payload,
        });
        Ok(())
    }

    /// Add a file from disk under `name`
    pub fn add_file_from_disk(&mut self, name: &str, disk_path: &Path) -> Result<()> {
        let data = std::fs::read(disk_path)?;
        self.add_entry(name, &data)
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Write the container, returns the number of bytes written
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<u64> {
        let names = self.entries.iter().map(|e| e.name.as_str());
        let payload_start = match self.format {
            HeaderFormat::Plain => SIGNATURE_LEN + encoded_entries_len(names),
            HeaderFormat::Compressed => SIGNATURE_LEN + 8,
        };

        let mut offset = payload_start;
        let mut records = Vec::with_capacity(self.entries.len());
        for pending in &self.entries {
            records.push(Entry::new(pending.name.clone(), offset, pending.size, 0));
            offset += pending.payload.len() as u64;
        }

        encode_signature(&mut writer, self.format)?;
        let mut written = SIGNATURE_LEN;

        match self.format {
            HeaderFormat::Plain => {
                encode_entries(&mut writer, &records)?;
                written = payload_start;
                written += self.write_payloads(&mut writer)?;
            }
            HeaderFormat::Compressed => {
                // Payloads end where the header block begins
                writer.write_u64::<BigEndian>(offset)?;
                written += 8;
                written += self.write_payloads(&mut writer)?;

                let mut table = Vec::new();
                encode_entries(&mut table, &records)?;
                let block = deflate(&table, Compression::best())?;

                writer.write_u64::<BigEndian>(table.len() as u64)?;
                writer.write_all(&block)?;
                written += 8 + block.len() as u64;
            }
        }

        writer.flush()?;
        debug!(
            "Wrote {:?} package with {} entries ({} bytes)",
            self.format,
            self.entries.len(),
            written
        );
        Ok(written)
    }

    /// Write the container to a file at `path`
    pub fn finish<P: AsRef<Path>>(self, path: P) -> Result<u64> {
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))
    }

    fn write_payloads<W: Write>(&self, writer: &mut W) -> Result<u64> {
        let mut written = 0u64;
        for pending in &self.entries {
            writer.write_all(&pending.payload)?;
            written += pending.payload.len() as u64;
        }
        Ok(written)
    }
}

fn deflate(data: &[u8], level: Compression) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), level);
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

use crate::config::{IntegerDecoding, VfsConfig};
use crate::error::{Result, VfsError};
use crate::package::inflate::Inflater;
use crate::stream::{ByteStream, MemoryStream};
use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

/// Signature of the plain header form
pub const PLAIN_SIGNATURE: &str = "JVFS0100";

/// Signature of the compressed header form
pub const COMPRESSED_SIGNATURE: &str = "JVFS0101";

/// Bytes a record occupies besides its name: offset, size and the NUL
const RECORD_OVERHEAD: u64 = 17;

static NEXT_TABLE_ID: AtomicU64 = AtomicU64::new(1);

/// Header variant, chosen by the leading signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderFormat {
    /// Entry table stored directly after the signature
    Plain,
    /// Entry table stored as a zlib block at `header_offset`
    Compressed,
}

impl HeaderFormat {
    pub fn signature(self) -> &'static str {
        match self {
            Self::Plain => PLAIN_SIGNATURE,
            Self::Compressed => COMPRESSED_SIGNATURE,
        }
    }

    pub fn from_signature(signature: &str) -> Option<Self> {
        match signature {
            PLAIN_SIGNATURE => Some(Self::Plain),
            COMPRESSED_SIGNATURE => Some(Self::Compressed),
            _ => None,
        }
    }
}

/// Descriptor of one resolvable entry
///
/// For package entries `offset` is where the zlib payload starts and `size`
/// is the inflated length. Directory entries carry the resolved local path
/// in `name` and a zero offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub offset: u64,
    pub size: u64,
    table: u64,
}

impl Entry {
    pub(crate) fn new(name: String, offset: u64, size: u64, table: u64) -> Self {
        Self {
            name,
            offset,
            size,
            table,
        }
    }

    pub(crate) fn table_id(&self) -> u64 {
        self.table
    }
}

/// Allocate an identity for a freshly built table
pub(crate) fn next_table_id() -> u64 {
    NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Entry table built once per open
///
/// Keeps entries in container order with a name index. The first record for
/// a name wins; later duplicates are dropped.
#[derive(Debug)]
pub struct EntryTable {
    id: u64,
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl EntryTable {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            id: next_table_id(),
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Add a record, returns false if the name was already present
    pub fn insert(&mut self, name: String, offset: u64, size: u64) -> bool {
        if self.index.contains_key(&name) {
            return false;
        }
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push(Entry::new(name, offset, size, self.id));
        true
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// True if `entry` was handed out by this table
    pub fn owns(&self, entry: &Entry) -> bool {
        entry.table_id() == self.id
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for EntryTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode an 8-byte big-endian integer
pub fn decode_u64<S: ByteStream>(stream: &mut S, decoding: IntegerDecoding) -> Result<u64> {
    let mut buf = [0u8; 8];
    if stream.read_bulk(&mut buf)? != buf.len() {
        return Err(VfsError::Truncated("integer field cut short"));
    }

    Ok(match decoding {
        IntegerDecoding::Standard => BigEndian::read_u64(&buf),
        IntegerDecoding::Legacy => {
            // Containers written against the original reader were decoded
            // with byte 5 replaced by byte 0
            let mut quirk = buf;
            quirk[5] = buf[0];
            BigEndian::read_u64(&quirk)
        }
    })
}

/// Allocate a zero-filled buffer of `len` bytes, `None` if the allocator refuses
pub(crate) fn zeroed_buffer(len: u64) -> Option<Vec<u8>> {
    let len = usize::try_from(len).ok()?;
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).ok()?;
    buf.resize(len, 0);
    Some(buf)
}

/// Decode a NUL-terminated string, stopping at end of stream if unterminated
pub fn decode_string<S: ByteStream>(stream: &mut S) -> Result<String> {
    let mut bytes = Vec::new();
    while let Some(byte) = stream.read_byte()? {
        if byte == 0 {
            break;
        }
        bytes.push(byte);
    }

    String::from_utf8(bytes).map_err(|e| {
        VfsError::InvalidName(format!("entry name is not valid UTF-8: {}", e))
    })
}

/// Decode a plain table: signature followed by the entry records
pub fn decode_plain_table<S: ByteStream>(
    stream: &mut S,
    limit: u64,
    decoding: IntegerDecoding,
) -> Result<EntryTable> {
    let signature = decode_string(stream)?;
    if signature != PLAIN_SIGNATURE {
        return Err(VfsError::BadSignature);
    }
    decode_entries(stream, limit, decoding)
}

/// Decode `entry_count` followed by that many `(offset, size, name)` records
///
/// `limit` bounds every offset; it is the size of the container, which for
/// a nested table is not the stream the records are read from.
pub fn decode_entries<S: ByteStream>(
    stream: &mut S,
    limit: u64,
    decoding: IntegerDecoding,
) -> Result<EntryTable> {
    if stream.is_eof() {
        return Err(VfsError::Truncated("missing entry count"));
    }
    let count = decode_u64(stream, decoding)?;
    if stream.is_eof() {
        return Err(VfsError::Truncated("no records after entry count"));
    }

    let remaining = stream.size().saturating_sub(stream.position());
    let capacity = count.min(remaining / RECORD_OVERHEAD) as usize;
    let mut table = EntryTable::with_capacity(capacity);

    for _ in 0..count {
        let offset = decode_u64(stream, decoding)?;
        if offset > limit {
            return Err(VfsError::InvalidOffset { offset, limit });
        }
        if stream.is_eof() {
            return Err(VfsError::Truncated("record ends after offset"));
        }

        let size = decode_u64(stream, decoding)?;
        if stream.is_eof() {
            return Err(VfsError::Truncated("record ends after size"));
        }

        let name = decode_string(stream)?;
        trace!("Entry {} at {} ({} bytes)", name, offset, size);
        if !table.insert(name, offset, size) {
            debug!("Duplicate entry at offset {} ignored", offset);
        }
    }

    if table.is_empty() {
        return Err(VfsError::EmptyTable);
    }
    Ok(table)
}

/// Decode a compressed header: the position is just past the signature
pub fn decode_compressed_table<S: ByteStream>(
    stream: &mut S,
    inflater: &mut Inflater,
    config: &VfsConfig,
) -> Result<EntryTable> {
    let limit = stream.size();

    let header_offset = decode_u64(stream, config.integer_decoding)?;
    if header_offset > limit {
        return Err(VfsError::InvalidOffset {
            offset: header_offset,
            limit,
        });
    }

    stream.seek_to(header_offset)?;
    let block_size = decode_u64(stream, config.integer_decoding)?;
    if block_size > config.max_header_size {
        return Err(VfsError::HeaderTooLarge {
            size: block_size,
            max: config.max_header_size,
        });
    }
    debug!(
        "Compressed header at {} inflates to {} bytes",
        header_offset, block_size
    );

    let mut block = zeroed_buffer(block_size).ok_or(VfsError::HeaderTooLarge {
        size: block_size,
        max: config.max_header_size,
    })?;
    let produced = inflater.inflate(stream, &mut block, block_size)?;
    if produced != block_size {
        return Err(VfsError::CorruptData(format!(
            "compressed header inflated to {} of {} bytes",
            produced, block_size
        )));
    }

    decode_entries(&mut MemoryStream::new(block), limit, config.integer_decoding)
}

/// Read the leading signature and decode the matching header form
pub fn decode_table<S: ByteStream>(
    stream: &mut S,
    inflater: &mut Inflater,
    config: &VfsConfig,
) -> Result<EntryTable> {
    stream.seek_to(0)?;
    let signature = decode_string(stream)?;

    match HeaderFormat::from_signature(&signature) {
        Some(HeaderFormat::Plain) => {
            let limit = stream.size();
            decode_entries(stream, limit, config.integer_decoding)
        }
        Some(HeaderFormat::Compressed) => decode_compressed_table(stream, inflater, config),
        None => Err(VfsError::UnrecognizedFormat),
    }
}

/// Write a signature with its NUL terminator
pub fn encode_signature<W: Write>(mut writer: W, format: HeaderFormat) -> Result<()> {
    writer.write_all(format.signature().as_bytes())?;
    writer.write_u8(0)?;
    Ok(())
}

/// Write `entry_count` and the records, the inverse of `decode_entries`
pub fn encode_entries<W: Write>(mut writer: W, entries: &[Entry]) -> Result<()> {
    writer.write_u64::<BigEndian>(entries.len() as u64)?;
    for entry in entries {
        if entry.name.is_empty() || entry.name.contains('\0') {
            return Err(VfsError::InvalidName(entry.name.clone()));
        }
        writer.write_u64::<BigEndian>(entry.offset)?;
        writer.write_u64::<BigEndian>(entry.size)?;
        writer.write_all(entry.name.as_bytes())?;
        writer.write_u8(0)?;
    }
    Ok(())
}

/// Encoded length of `encode_entries` output
pub fn encoded_entries_len<'a, I>(names: I) -> u64
where
    I: IntoIterator<Item = &'a str>,
{
    8 + names
        .into_iter()
        .map(|name| RECORD_OVERHEAD + name.len() as u64)
        .sum::<u64>()
}

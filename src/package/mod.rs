mod format;
mod inflate;
mod reader;
mod writer;

pub use format::{
    decode_compressed_table, decode_entries, decode_plain_table, decode_string, decode_table,
    decode_u64, encode_entries, encode_signature, encoded_entries_len, Entry, EntryTable,
    HeaderFormat, COMPRESSED_SIGNATURE, PLAIN_SIGNATURE,
};
pub use inflate::Inflater;
pub use reader::{PackageReader, ReaderState};
pub use writer::PackageWriter;

pub(crate) use format::{next_table_id, zeroed_buffer};

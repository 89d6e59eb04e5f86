#![no_main]

use jvfs_rs::{
    FileSystem, IntegerDecoding, MemoryStream, PackageReader, VfsConfig,
};
use libfuzzer_sys::fuzz_target;

/// Entries above this size are looked up but not inflated
const MAX_READ: u64 = 1 << 20;

fuzz_target!(|data: &[u8]| {
    for decoding in [IntegerDecoding::Standard, IntegerDecoding::Legacy] {
        let config = VfsConfig::default()
            .with_chunk_size(512)
            .with_max_header_size(MAX_READ)
            .with_integer_decoding(decoding);
        let mut reader = PackageReader::<MemoryStream<Vec<u8>>>::with_config(config);

        // Try to open - should never panic
        if reader.open_stream(MemoryStream::new(data.to_vec())).is_err() {
            continue; // Expected for invalid data
        }

        // Try to read each entry - should never panic
        let entries = reader.list_entries().to_vec();
        for entry in &entries {
            let _ = reader.find_entry(&entry.name);
            if entry.size <= MAX_READ {
                let mut buf = vec![0u8; entry.size as usize];
                let _ = reader.read_entry(entry, &mut buf);
            }
        }

        // Lookups with odd names - should never panic
        let _ = reader.find_entry("");
        let _ = reader.find_entry("/");
        let _ = reader.find_entry("../../../etc/passwd");
        reader.close();
    }
});

//! Integration tests for jvfs-rs

use flate2::write::ZlibEncoder;
use flate2::Compression;
use jvfs_rs::{
    mount, FileSystem, FileStream, HeaderFormat, MemoryStream, PackageReader, PackageWriter,
    ReaderState, VfsConfig,
};
use std::io::Write;
use tempfile::NamedTempFile;

fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Helper: pseudo-random bytes that do not compress
fn noise(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12345);
            (state >> 16) as u8
        })
        .collect()
}

#[test]
fn test_basic_package_roundtrip() {
    for format in [HeaderFormat::Plain, HeaderFormat::Compressed] {
        let temp_file = NamedTempFile::new().unwrap();
        let package_path = temp_file.path();

        // Create package
        {
            let mut writer = PackageWriter::new(format);
            writer.add_entry("test.txt", b"Hello, World!").unwrap();
            writer.add_entry("data/nested.txt", b"Nested content").unwrap();
            writer.finish(package_path).unwrap();
        }

        // Read package
        {
            let mut reader: PackageReader = PackageReader::open_path(package_path).unwrap();
            assert_eq!(reader.entry_count(), 2);
            assert!(reader.contains("test.txt"));
            assert!(reader.contains("data/nested.txt"));

            let content1 = reader.read_to_vec("test.txt").unwrap();
            assert_eq!(content1, b"Hello, World!");

            let content2 = reader.read_to_vec("data/nested.txt").unwrap();
            assert_eq!(content2, b"Nested content");
        }
    }
}

#[test]
fn test_hand_built_single_entry() {
    let mut bytes = b"JVFS0100\0".to_vec();
    bytes.extend_from_slice(&1u64.to_be_bytes());
    bytes.extend_from_slice(&41u64.to_be_bytes());
    bytes.extend_from_slice(&5u64.to_be_bytes());
    bytes.extend_from_slice(b"a.txt\0");
    bytes.resize(41, 0);
    bytes.extend(zlib(&[1, 2, 3, 4, 5]));

    let mut reader = PackageReader::<MemoryStream<Vec<u8>>>::new();
    reader.open_stream(MemoryStream::new(bytes)).unwrap();

    let entry = reader.find_entry("a.txt").unwrap();
    assert_eq!(entry.offset, 41);
    assert_eq!(entry.size, 5);

    let mut out = vec![0u8; 5];
    reader.read_entry(&entry, &mut out).unwrap();
    assert_eq!(out, [1, 2, 3, 4, 5]);
}

#[test]
fn test_large_entries_exact_length() {
    let temp_file = NamedTempFile::new().unwrap();
    let compressible = b"This is test data that should compress well. ".repeat(5000);
    let incompressible = noise(300_000, 7);

    {
        let mut writer = PackageWriter::new(HeaderFormat::Plain);
        writer.add_entry("text.txt", &compressible).unwrap();
        writer.add_entry("noise.bin", &incompressible).unwrap();
        writer.add_entry("empty", b"").unwrap();
        writer.finish(temp_file.path()).unwrap();
    }

    // Small chunks force many refills and output windows
    let config = VfsConfig::default().with_chunk_size(1024);
    let mut reader = PackageReader::<FileStream>::with_config(config);
    reader.open(temp_file.path()).unwrap();

    for (name, expected) in [
        ("text.txt", &compressible[..]),
        ("noise.bin", &incompressible[..]),
        ("empty", &[][..]),
    ] {
        let entry = reader.find_entry(name).unwrap();
        assert_eq!(entry.size, expected.len() as u64);

        let mut buf = vec![0u8; entry.size as usize];
        reader.read_entry(&entry, &mut buf).unwrap();
        assert_eq!(buf.len(), expected.len());
        assert!(buf == expected, "content mismatch for {}", name);
    }
}

#[test]
fn test_many_entries_any_order() {
    let temp_file = NamedTempFile::new().unwrap();

    {
        let mut writer = PackageWriter::new(HeaderFormat::Compressed);
        for i in 0..500 {
            let data = format!("entry number {}", i).repeat(i % 7 + 1);
            writer.add_entry(&format!("files/{:03}.txt", i), data.as_bytes()).unwrap();
        }
        writer.finish(temp_file.path()).unwrap();
    }

    let mut reader: PackageReader = PackageReader::open_path(temp_file.path()).unwrap();
    assert_eq!(reader.entry_count(), 500);
    assert_eq!(reader.list_prefix("files/1").len(), 100);

    // Reads are independent of each other and of order
    for i in (0..500).rev().step_by(37) {
        let data = reader.read_to_vec(&format!("files/{:03}.txt", i)).unwrap();
        assert_eq!(data, format!("entry number {}", i).repeat(i % 7 + 1).into_bytes());
    }
}

#[test]
fn test_find_entry_absent_does_not_mutate() {
    let temp_file = NamedTempFile::new().unwrap();
    {
        let mut writer = PackageWriter::new(HeaderFormat::Plain);
        writer.add_entry("present.txt", b"here").unwrap();
        writer.finish(temp_file.path()).unwrap();
    }

    let mut reader: PackageReader = PackageReader::open_path(temp_file.path()).unwrap();
    let before: Vec<_> = reader.list_entries().to_vec();

    assert!(reader.find_entry("absent.txt").is_none());
    assert!(reader.find_entry("").is_none());
    assert!(reader.find_entry("PRESENT.TXT").is_none());
    assert!(reader.find_entry("../../../etc/passwd").is_none());

    assert_eq!(reader.list_entries(), &before[..]);
    assert_eq!(reader.read_to_vec("present.txt").unwrap(), b"here");
}

#[test]
fn test_reopen_cycle() {
    let first = NamedTempFile::new().unwrap();
    let second = NamedTempFile::new().unwrap();
    {
        let mut writer = PackageWriter::new(HeaderFormat::Plain);
        writer.add_entry("one.txt", b"1").unwrap();
        writer.finish(first.path()).unwrap();

        let mut writer = PackageWriter::new(HeaderFormat::Compressed);
        writer.add_entry("two.txt", b"2").unwrap();
        writer.finish(second.path()).unwrap();
    }

    let mut reader: PackageReader = PackageReader::new();
    assert_eq!(reader.state(), ReaderState::Closed);

    reader.open(first.path()).unwrap();
    assert!(reader.contains("one.txt"));

    reader.open(second.path()).unwrap();
    assert!(!reader.contains("one.txt"));
    assert_eq!(reader.read_to_vec("two.txt").unwrap(), b"2");

    reader.close();
    assert!(!reader.contains("two.txt"));
}

#[test]
fn test_memory_medium_matches_file_medium() {
    let temp_file = NamedTempFile::new().unwrap();
    {
        let mut writer = PackageWriter::new(HeaderFormat::Compressed);
        writer.add_entry("shared.bin", &noise(10_000, 3)).unwrap();
        writer.finish(temp_file.path()).unwrap();
    }

    let mut on_disk = PackageReader::<FileStream>::open_path(temp_file.path()).unwrap();
    let mut in_memory = PackageReader::<MemoryStream<Vec<u8>>>::open_path(temp_file.path()).unwrap();

    assert_eq!(
        on_disk.read_to_vec("shared.bin").unwrap(),
        in_memory.read_to_vec("shared.bin").unwrap()
    );
}

#[test]
fn test_mount_picks_reader() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("loose.txt"), b"loose").unwrap();

    let package = dir.path().join("bundle.pkg");
    let mut writer = PackageWriter::new(HeaderFormat::Plain);
    writer.add_entry("packed.txt", b"packed").unwrap();
    writer.finish(&package).unwrap();

    let mut fs = mount(dir.path(), VfsConfig::default()).unwrap();
    assert_eq!(fs.read_to_vec("loose.txt").unwrap(), b"loose");
    assert!(!fs.contains("packed.txt"));

    let mut fs = mount(&package, VfsConfig::default()).unwrap();
    assert_eq!(fs.read_to_vec("packed.txt").unwrap(), b"packed");
    assert!(!fs.contains("loose.txt"));
}

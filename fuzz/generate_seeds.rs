//! Generate seed corpus for fuzzing

use jvfs_rs::{HeaderFormat, PackageWriter};
use std::fs;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let corpus_dir = "fuzz/corpus/fuzz_package_parse";
    fs::create_dir_all(corpus_dir)?;

    println!("Generating seed corpus...");

    for format in [HeaderFormat::Plain, HeaderFormat::Compressed] {
        let tag = match format {
            HeaderFormat::Plain => "plain",
            HeaderFormat::Compressed => "compressed",
        };

        // Single small file
        {
            let path = format!("{}/seed_{}_single.pkg", corpus_dir, tag);
            let mut writer = PackageWriter::new(format);
            writer.add_entry("test.txt", b"Hello, World!")?;
            writer.finish(&path)?;
            println!("Generated: {}", path);
        }

        // Multiple files, one empty
        {
            let path = format!("{}/seed_{}_multi.pkg", corpus_dir, tag);
            let mut writer = PackageWriter::new(format);
            writer.add_entry("file1.txt", b"First file")?;
            writer.add_entry("dir/file2.txt", b"Second file in directory")?;
            writer.add_entry("empty", b"")?;
            writer.finish(&path)?;
            println!("Generated: {}", path);
        }

        // Compressible payload spanning several chunks
        {
            let path = format!("{}/seed_{}_large.pkg", corpus_dir, tag);
            let mut writer = PackageWriter::new(format);
            writer.add_entry("large.txt", &b"Repeated text. ".repeat(4000))?;
            writer.finish(&path)?;
            println!("Generated: {}", path);
        }
    }

    println!("Seed corpus ready in {}", corpus_dir);
    Ok(())
}

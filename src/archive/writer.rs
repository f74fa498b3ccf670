use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{Seek, Write};
use std::path::Path;
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Packs a directory tree into a single archive file.
pub trait ArchiveWriter {
    /// Archives `root/base` so that `base` is the top-level entry, writing to
    /// `dest`. `dest` must not exist. Returns the number of entries written.
    fn write_tree(&self, root: &Path, base: &str, dest: &Path) -> Result<usize>;
}

/// Deflate-compressed zip archives.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipTreeWriter;

impl ArchiveWriter for ZipTreeWriter {
    fn write_tree(&self, root: &Path, base: &str, dest: &Path) -> Result<usize> {
        let out = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(dest)
            .with_context(|| format!("failed to create archive {}", dest.display()))?;

        let written = write_zip(out, &root.join(base), base);
        if written.is_err() {
            // Never leave a half-written archive behind.
            let _ = fs::remove_file(dest);
        }
        written
    }
}

fn write_zip(out: File, dir: &Path, base: &str) -> Result<usize> {
    let mut zip = ZipWriter::new(out);
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries = 0;
    add_dir(&mut zip, opts, dir, base, &mut entries)?;
    zip.finish().context("failed to finalize zip archive")?;

    Ok(entries)
}

fn add_dir<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    opts: FileOptions,
    dir: &Path,
    name: &str,
    entries: &mut usize,
) -> Result<()> {
    zip.add_directory(format!("{name}/"), opts)
        .with_context(|| format!("failed to add directory entry {name}"))?;
    *entries += 1;

    let mut children = fs::read_dir(dir)
        .with_context(|| format!("failed to list {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    children.sort();

    for path in children {
        let Some(child) = path.file_name().and_then(|n| n.to_str()) else {
            anyhow::bail!("non UTF-8 path in staging tree: {}", path.display());
        };
        let entry_name = format!("{name}/{child}");

        if path.is_dir() {
            add_dir(zip, opts, &path, &entry_name, entries)?;
        } else {
            zip.start_file(entry_name.as_str(), opts)
                .with_context(|| format!("failed to start entry {entry_name}"))?;
            let mut file = File::open(&path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            std::io::copy(&mut file, zip)
                .with_context(|| format!("failed to write entry {entry_name}"))?;
            debug!(entry = %entry_name, "Archive entry written");
            *entries += 1;
        }
    }

    Ok(())
}

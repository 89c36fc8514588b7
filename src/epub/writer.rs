//! Writing packaged documents.

use std::io::{Cursor, Seek, Write};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::book::{ArchiveEntry, EntryKind};
use crate::error::Result;

/// Path of the uncompressed media-type marker that must come first.
pub const MIMETYPE_PATH: &str = "mimetype";
pub const EPUB_MIMETYPE: &[u8] = b"application/epub+zip";

/// Entry-level write access to a packaged document.
pub trait ArchiveSink {
    fn write_entry(&mut self, entry: &ArchiveEntry) -> Result<()>;
}

impl ArchiveSink for Vec<ArchiveEntry> {
    fn write_entry(&mut self, entry: &ArchiveEntry) -> Result<()> {
        self.push(entry.clone());
        Ok(())
    }
}

/// ZIP-backed [`ArchiveSink`].
pub struct ZipSink<W: Write + Seek> {
    zip: ZipWriter<W>,
}

impl<W: Write + Seek> ZipSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            zip: ZipWriter::new(writer),
        }
    }

    /// Write the central directory and hand back the underlying writer.
    pub fn finish(self) -> Result<W> {
        Ok(self.zip.finish()?)
    }
}

impl<W: Write + Seek> ArchiveSink for ZipSink<W> {
    fn write_entry(&mut self, entry: &ArchiveEntry) -> Result<()> {
        let options_stored =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        let options_deflate =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        match entry.kind {
            EntryKind::Directory => self.zip.add_directory(entry.path.as_str(), options_deflate)?,
            _ if entry.path == MIMETYPE_PATH => {
                self.zip.start_file(entry.path.as_str(), options_stored)?;
                self.zip.write_all(&entry.data)?;
            }
            _ => {
                self.zip.start_file(entry.path.as_str(), options_deflate)?;
                self.zip.write_all(&entry.data)?;
            }
        }
        Ok(())
    }
}

/// Write `entries` to `sink` with the media-type marker first.
///
/// A missing marker is synthesized; the remaining entries keep their order.
pub fn write_entries<S: ArchiveSink + ?Sized>(sink: &mut S, entries: &[ArchiveEntry]) -> Result<()> {
    match entries.iter().find(|e| e.path == MIMETYPE_PATH) {
        Some(mimetype) => sink.write_entry(mimetype)?,
        None => sink.write_entry(&ArchiveEntry::new(MIMETYPE_PATH, EPUB_MIMETYPE.to_vec()))?,
    }
    for entry in entries.iter().filter(|e| e.path != MIMETYPE_PATH) {
        sink.write_entry(entry)?;
    }
    Ok(())
}

/// Write `entries` as a ZIP to any [`Write`] + [`Seek`] destination.
pub fn write_package_to_writer<W: Write + Seek>(entries: &[ArchiveEntry], writer: W) -> Result<W> {
    let mut sink = ZipSink::new(writer);
    write_entries(&mut sink, entries)?;
    sink.finish()
}

/// Write `entries` as an in-memory ZIP.
pub fn write_package_to_bytes(entries: &[ArchiveEntry]) -> Result<Vec<u8>> {
    Ok(write_package_to_writer(entries, Cursor::new(Vec::new()))?.into_inner())
}

//! Read access to packaged documents.

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use zip::ZipArchive;

use crate::book::ArchiveEntry;
use crate::error::{Error, Result};

/// Entry-level read access to a packaged document.
///
/// Entries are read one at a time so that a damaged entry can be reported
/// without losing the rest of the archive.
pub trait ArchiveSource {
    /// Every entry path, directories included, in archive order.
    fn entry_paths(&self) -> Vec<String>;

    /// Read one entry by its archive path.
    fn read_entry(&mut self, path: &str) -> Result<ArchiveEntry>;

    /// Read every entry in archive order, failing on the first bad one.
    fn read_all(&mut self) -> Result<Vec<ArchiveEntry>> {
        self.entry_paths()
            .iter()
            .map(|path| self.read_entry(path))
            .collect()
    }
}

/// ZIP-backed [`ArchiveSource`].
pub struct ZipSource<R: Read + Seek> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> ZipSource<R> {
    /// Open an archive from any [`Read`] + [`Seek`] source.
    pub fn new(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)
            .map_err(|e| Error::SourceUnreadable(format!("not a readable archive: {e}")))?;
        Ok(Self { archive })
    }

    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }
}

impl ZipSource<Cursor<Vec<u8>>> {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::new(Cursor::new(data))
    }
}

impl ZipSource<std::fs::File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(std::fs::File::open(path)?)
    }
}

impl<R: Read + Seek> ArchiveSource for ZipSource<R> {
    fn entry_paths(&self) -> Vec<String> {
        (0..self.archive.len())
            .filter_map(|i| self.archive.name_for_index(i))
            .map(str::to_string)
            .collect()
    }

    fn read_entry(&mut self, path: &str) -> Result<ArchiveEntry> {
        let name = match self.archive.index_for_name(path) {
            Some(_) => path.to_string(),
            None => {
                // Fallback: percent-decoded path (hrefs copied into archives verbatim)
                let decoded = percent_encoding::percent_decode_str(path)
                    .decode_utf8()
                    .map_err(|_| entry_failed(path, "invalid UTF-8 in path"))?;
                if self.archive.index_for_name(&decoded).is_none() {
                    return Err(entry_failed(path, "no such entry"));
                }
                decoded.into_owned()
            }
        };

        let mut file = self
            .archive
            .by_name(&name)
            .map_err(|e| entry_failed(&name, &e.to_string()))?;
        if file.is_dir() {
            return Ok(ArchiveEntry::directory(name));
        }

        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data)
            .map_err(|e| entry_failed(&name, &e.to_string()))?;
        Ok(ArchiveEntry::new(name, data))
    }
}

/// In-memory [`ArchiveSource`] over already materialized entries.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    entries: Vec<ArchiveEntry>,
}

impl MemorySource {
    pub fn new(entries: Vec<ArchiveEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }
}

impl ArchiveSource for MemorySource {
    fn entry_paths(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.path.clone()).collect()
    }

    fn read_entry(&mut self, path: &str) -> Result<ArchiveEntry> {
        if let Some(entry) = self.entries.iter().find(|e| e.path == path) {
            return Ok(entry.clone());
        }
        let decoded = percent_encoding::percent_decode_str(path).decode_utf8_lossy();
        self.entries
            .iter()
            .find(|e| e.path == decoded)
            .cloned()
            .ok_or_else(|| entry_failed(path, "no such entry"))
    }
}

fn entry_failed(path: &str, reason: &str) -> Error {
    Error::EntryFailed {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

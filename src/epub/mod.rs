//! EPUB archives: entry access, metadata, chapters and package synthesis.

pub mod chapters;
pub mod manifest;
pub mod package;
mod reader;
mod writer;

pub use chapters::{ChapterSegmenter, content_paths, extract_title, segment_chapters};
pub use manifest::{CONTAINER_PATH, resolve_metadata};
pub use package::synthesize_package;
pub use reader::{ArchiveSource, MemorySource, ZipSource};
pub use writer::{
    ArchiveSink, EPUB_MIMETYPE, MIMETYPE_PATH, ZipSink, write_entries, write_package_to_bytes,
    write_package_to_writer,
};

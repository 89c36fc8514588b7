//! Document assembly for both output kinds.
//!
//! - [`archive`]: repackage an archive with restyled markup and stylesheets
//! - [`text`]: flatten metadata and chapters into one Markdown document

pub mod archive;
pub mod text;

pub use archive::ArchiveRewriter;
pub use text::MarkdownAssembler;

//! # hengban
//!
//! Restyle EPUB and PDF documents for horizontal Traditional Chinese reading,
//! or flatten them into a single Markdown document.
//!
//! ## Features
//!
//! - Simplified → Traditional script conversion, through an external filter
//!   such as OpenCC when available and a built-in table otherwise
//! - Vertical writing modes replaced with horizontal left-to-right layout
//! - Font family and line height forced onto every page
//! - Markdown output with a table of contents and per-chapter anchors
//! - Line reconstruction for PDF input
//!
//! ## Quick Start
//!
//! ```no_run
//! use hengban::{ConversionConfig, Converter, LineHeight, OutputKind};
//!
//! // Restyle an EPUB with 1.5 line spacing
//! let config = ConversionConfig::new(OutputKind::Archive)
//!     .with_line_height(LineHeight::new("1.5")?);
//! Converter::new(config)?.convert_file("book.epub", "book_轉換完成.epub")?;
//!
//! // Flatten it to Markdown
//! let converter = Converter::new(ConversionConfig::new(OutputKind::StructuredText))?;
//! converter.convert_file("book.epub", "book_轉換完成.md")?;
//! # Ok::<(), hengban::Error>(())
//! ```
//!
//! ## Working with the pieces
//!
//! Each stage is usable on its own:
//!
//! ```
//! use hengban::markdown::html_to_markdown;
//! use hengban::transform::{LayoutRules, html::rewrite_markup};
//!
//! assert_eq!(html_to_markdown("<h1>A</h1><p>B</p>"), "# A\n\nB");
//!
//! let rules = LayoutRules::new("serif", "1.6");
//! let once = rewrite_markup("<html><head></head><body></body></html>", &rules);
//! assert_eq!(rewrite_markup(&once, &rules), once);
//! ```

pub mod book;
pub mod config;
pub mod convert;
pub mod epub;
pub mod error;
pub mod export;
pub mod glyph;
pub mod markdown;
pub mod markup;
pub mod script;
pub mod transform;
pub(crate) mod util;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use book::{ArchiveEntry, Chapter, DocumentMetadata, EntryKind};
pub use config::{ConversionConfig, LineHeight, OutputKind, ScriptTarget};
pub use convert::{Converter, Progress, SourceFormat, Stage};
pub use error::{Error, Result};
pub use script::{CommandConverter, ScriptConverter, ScriptNormalizer};

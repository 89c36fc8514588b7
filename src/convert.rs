//! The conversion pipeline.
//!
//! ```no_run
//! use hengban::{ConversionConfig, Converter, OutputKind};
//!
//! let converter = Converter::new(ConversionConfig::new(OutputKind::StructuredText))?;
//! let markdown = converter.convert(&std::fs::read("book.epub")?, Some("book.epub"))?;
//! std::fs::write("book.md", markdown)?;
//! # Ok::<(), hengban::Error>(())
//! ```

use std::fmt;
use std::io::Cursor;
use std::path::Path;

use tracing::{info, instrument};

use crate::book::DocumentMetadata;
use crate::config::{ConversionConfig, OutputKind};
use crate::epub::{
    ArchiveSource, ChapterSegmenter, ZipSource, content_paths, resolve_metadata, synthesize_package,
    write_package_to_bytes,
};
use crate::error::{Error, Result};
use crate::export::{ArchiveRewriter, MarkdownAssembler};
use crate::glyph::{GlyphSource, PageText, reconstruct_document};
use crate::markdown::escape_markdown;
use crate::script::{ScriptConverter, ScriptNormalizer};
use crate::transform::LayoutRules;
use crate::util::now;

/// Container format of an input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// ZIP archive of markup and stylesheets.
    Epub,
    /// Paginated glyph-position document.
    Pdf,
}

impl SourceFormat {
    /// Detect the format from magic bytes, falling back to the file extension.
    pub fn detect(data: &[u8], file_name: Option<&str>) -> Result<Self> {
        if data.starts_with(b"PK\x03\x04") || data.starts_with(b"PK\x05\x06") {
            return Ok(SourceFormat::Epub);
        }
        // PDF allows junk before the header within the first KiB
        let head = &data[..data.len().min(1024)];
        if memchr::memmem::find(head, b"%PDF-").is_some() {
            return Ok(SourceFormat::Pdf);
        }
        file_name
            .and_then(Self::from_extension)
            .ok_or_else(|| Error::UnsupportedFormat(file_name.unwrap_or("input").to_string()))
    }

    pub fn from_extension(path: &str) -> Option<Self> {
        let ext = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "epub" => Some(SourceFormat::Epub),
            "pdf" => Some(SourceFormat::Pdf),
            _ => None,
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Epub => f.write_str("EPUB"),
            SourceFormat::Pdf => f.write_str("PDF"),
        }
    }
}

/// Pipeline stage reported through the progress callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Rewriting,
    Segmenting,
    Reconstructing,
    Assembling,
}

/// One progress report: `done` of `total` units of `stage` are complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub stage: Stage,
    pub done: usize,
    pub total: usize,
}

/// Runs a configured conversion over one input at a time.
pub struct Converter {
    config: ConversionConfig,
    rules: LayoutRules,
    normalizer: ScriptNormalizer,
    progress: Option<Box<dyn Fn(Progress)>>,
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("config", &self.config)
            .field("normalizer", &self.normalizer)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl Converter {
    /// Create a converter using only the built-in script table.
    pub fn new(config: ConversionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            rules: LayoutRules::from_config(&config),
            config,
            normalizer: ScriptNormalizer::fallback_only(),
            progress: None,
        })
    }

    /// Prefer `converter` for script conversion, keeping the built-in table as
    /// fallback.
    pub fn with_script_converter(mut self, converter: Box<dyn ScriptConverter>) -> Self {
        self.normalizer = ScriptNormalizer::with_converter(converter);
        self
    }

    pub fn on_progress(mut self, callback: impl Fn(Progress) + 'static) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    fn report(&self, stage: Stage, done: usize, total: usize) {
        if let Some(ref callback) = self.progress {
            callback(Progress { stage, done, total });
        }
    }

    /// Convert `data`, detecting its format.
    #[instrument(skip_all, fields(bytes_len = data.len(), output = ?self.config.output))]
    pub fn convert(&self, data: &[u8], file_name: Option<&str>) -> Result<Vec<u8>> {
        let format = SourceFormat::detect(data, file_name)?;
        info!(%format, "converting");
        self.convert_as(data, format)
    }

    /// Convert `data` as a known format.
    pub fn convert_as(&self, data: &[u8], format: SourceFormat) -> Result<Vec<u8>> {
        match format {
            SourceFormat::Epub => self.convert_archive(&mut ZipSource::new(Cursor::new(data))?),
            #[cfg(feature = "pdf")]
            SourceFormat::Pdf => self.convert_paginated(&crate::glyph::PdfGlyphSource::from_bytes(data)?),
            #[cfg(not(feature = "pdf"))]
            SourceFormat::Pdf => Err(Error::UnsupportedFormat(
                "PDF input requires the `pdf` feature".into(),
            )),
        }
    }

    /// Convert the file at `input` and write the result to `output`.
    #[instrument(skip_all, fields(input = %input.as_ref().display()))]
    pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(&self, input: P, output: Q) -> Result<()> {
        let data = std::fs::read(input.as_ref())?;
        let name = input.as_ref().to_string_lossy();
        let converted = self.convert(&data, Some(&name))?;
        std::fs::write(output, converted)?;
        Ok(())
    }

    /// Title and author of `data`, script-converted as in a full run.
    pub fn inspect(&self, data: &[u8], file_name: Option<&str>) -> Result<DocumentMetadata> {
        let metadata = match SourceFormat::detect(data, file_name)? {
            SourceFormat::Epub => resolve_metadata(&mut ZipSource::new(Cursor::new(data))?),
            #[cfg(feature = "pdf")]
            SourceFormat::Pdf => {
                paginated_metadata(&crate::glyph::PdfGlyphSource::from_bytes(data)?)
            }
            #[cfg(not(feature = "pdf"))]
            SourceFormat::Pdf => {
                return Err(Error::UnsupportedFormat(
                    "PDF input requires the `pdf` feature".into(),
                ));
            }
        };
        Ok(self.normalize_metadata(metadata))
    }

    fn normalize_metadata(&self, metadata: DocumentMetadata) -> DocumentMetadata {
        let title = self.normalizer.to_traditional(&metadata.title);
        match metadata.author {
            Some(author) => DocumentMetadata::new(title)
                .with_author(self.normalizer.to_traditional(&author)),
            None => DocumentMetadata::new(title),
        }
    }

    fn script_transform(&self) -> &'static str {
        if self.normalizer.has_external() {
            "簡體轉繁體（外部轉換器）"
        } else {
            "簡體轉繁體（內建對照表）"
        }
    }

    /// Convert an opened archive.
    pub fn convert_archive<S: ArchiveSource + ?Sized>(&self, source: &mut S) -> Result<Vec<u8>> {
        match self.config.output {
            OutputKind::Archive => {
                let rewriter = ArchiveRewriter::new(self.rules.clone(), &self.normalizer);
                let entries = rewriter
                    .rewrite_all(source, |done, total| self.report(Stage::Rewriting, done, total))?;
                self.report(Stage::Assembling, 0, 1);
                let bytes = write_package_to_bytes(&entries)?;
                self.report(Stage::Assembling, 1, 1);
                Ok(bytes)
            }
            OutputKind::StructuredText => {
                let assembler = MarkdownAssembler::new().with_transform(self.script_transform());
                let metadata = self.normalize_metadata(resolve_metadata(source));

                let paths = content_paths(source.entry_paths());
                let mut segmenter =
                    ChapterSegmenter::new(&self.normalizer, self.config.title_max_chars);
                for (i, path) in paths.iter().enumerate() {
                    let entry = source.read_entry(path);
                    segmenter.push_entry(path, entry);
                    self.report(Stage::Segmenting, i + 1, paths.len());
                }
                let chapters = segmenter.finish();
                info!(title = %metadata.title, chapters = chapters.len(), "segmented archive");

                self.report(Stage::Assembling, 0, 1);
                let document = assembler.assemble(&metadata, &chapters);
                self.report(Stage::Assembling, 1, 1);
                Ok(document.into_bytes())
            }
        }
    }

    /// Convert an opened paginated document.
    pub fn convert_paginated<G: GlyphSource + ?Sized>(&self, source: &G) -> Result<Vec<u8>> {
        let started = now();
        let metadata = self.normalize_metadata(paginated_metadata(source));
        let threshold = self.config.line_break_threshold;
        let pages: Vec<PageText> = reconstruct_document(source, threshold, |done, total| {
            self.report(Stage::Reconstructing, done, total)
        })
        .into_iter()
        .map(|page| PageText::new(page.number, self.normalizer.to_traditional(&page.text)))
        .collect();
        info!(title = %metadata.title, pages = pages.len(), "reconstructed pages");

        self.report(Stage::Assembling, 0, 1);
        let bytes = match self.config.output {
            OutputKind::Archive => {
                write_package_to_bytes(&synthesize_package(&metadata, &pages, &self.rules))?
            }
            OutputKind::StructuredText => {
                let mut segmenter =
                    ChapterSegmenter::new(&self.normalizer, self.config.title_max_chars);
                for page in pages.iter().filter(|p| !p.is_empty()) {
                    let body = page
                        .lines()
                        .map(escape_markdown)
                        .collect::<Vec<_>>()
                        .join("\n");
                    let number = page.number;
                    segmenter.push_chapter(&format!("page {number}"), format!("Page {number}"), body);
                }
                MarkdownAssembler::new()
                    .generated_at(started)
                    .with_transform(self.script_transform())
                    .with_transform(format!("版面重建（行距門檻 {threshold}）"))
                    .assemble(&metadata, &segmenter.finish())
                    .into_bytes()
            }
        };
        self.report(Stage::Assembling, 1, 1);
        Ok(bytes)
    }
}

fn paginated_metadata<G: GlyphSource + ?Sized>(source: &G) -> DocumentMetadata {
    let info = source.document_info();
    let metadata = info
        .title
        .map(DocumentMetadata::new)
        .unwrap_or_default();
    match info.author {
        Some(author) => metadata.with_author(author),
        None => metadata,
    }
}

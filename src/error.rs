//! Error types for hengban operations.

use thiserror::Error;

/// Errors that can occur while converting a document.
///
/// Only [`Error::SourceUnreadable`], [`Error::UnsupportedFormat`] and
/// [`Error::InvalidConfig`] abort a run. The remaining variants describe
/// degraded paths that the pipeline recovers from locally and logs.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[cfg(feature = "pdf")]
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Metadata unavailable: {0}")]
    MetadataUnavailable(String),

    #[error("Failed to process {path}: {reason}")]
    EntryFailed { path: String, reason: String },

    #[error("Source unreadable: {0}")]
    SourceUnreadable(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Script converter failed: {0}")]
    Converter(String),

    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl Error {
    /// Whether this error must abort the whole conversion.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::MetadataUnavailable(_) | Error::EntryFailed { .. } | Error::Converter(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

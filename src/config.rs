//! Conversion settings supplied once per run.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Default glyph line-break threshold, in PDF text-space units.
pub const DEFAULT_LINE_BREAK_THRESHOLD: f32 = 5.0;

/// Default maximum chapter title length, in characters.
pub const DEFAULT_TITLE_MAX_CHARS: usize = 50;

/// Font chain injected into restyled documents, highest priority first.
pub const DEFAULT_FONT_FAMILY: &[&str] = &[
    "Microsoft JhengHei",
    "微軟正黑體",
    "PingFang TC",
    "Helvetica Neue",
    "Arial",
    "sans-serif",
];

/// What a conversion run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(serde::Deserialize))]
#[cfg_attr(feature = "cli", serde(rename_all = "snake_case"))]
pub enum OutputKind {
    /// A restyled copy of the source archive (EPUB).
    #[default]
    Archive,
    /// A single flattened Markdown document.
    #[cfg_attr(feature = "cli", serde(alias = "markdown", alias = "md"))]
    StructuredText,
}

impl FromStr for OutputKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "epub" | "archive" => Ok(OutputKind::Archive),
            "md" | "markdown" | "text" | "structured_text" => Ok(OutputKind::StructuredText),
            other => Err(Error::InvalidConfig(format!("unknown output format: {other}"))),
        }
    }
}

/// Target script variant. Simplified to Traditional is the only direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(serde::Deserialize))]
#[cfg_attr(feature = "cli", serde(rename_all = "snake_case"))]
pub enum ScriptTarget {
    #[default]
    Traditional,
}

/// A positive line-height value, kept exactly as the caller spelled it.
///
/// The textual form is what lands in rewritten stylesheets, so `"1.50"`
/// stays `"1.50"` rather than being normalized to `1.5`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "cli", derive(serde::Deserialize))]
#[cfg_attr(feature = "cli", serde(try_from = "LineHeightRepr"))]
pub struct LineHeight {
    text: String,
    value: f64,
}

impl LineHeight {
    /// Parse and validate a line-height value.
    pub fn new(text: &str) -> Result<Self> {
        let text = text.trim();
        let value: f64 = text
            .parse()
            .map_err(|_| Error::InvalidConfig(format!("line height is not a number: {text:?}")))?;
        if !value.is_finite() || value <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "line height must be positive: {text}"
            )));
        }
        Ok(Self {
            text: text.to_string(),
            value,
        })
    }

    /// The verbatim textual form.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

impl Default for LineHeight {
    fn default() -> Self {
        Self {
            text: "1.2".to_string(),
            value: 1.2,
        }
    }
}

impl fmt::Display for LineHeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for LineHeight {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

#[cfg(feature = "cli")]
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum LineHeightRepr {
    Number(f64),
    Text(String),
}

#[cfg(feature = "cli")]
impl TryFrom<LineHeightRepr> for LineHeight {
    type Error = Error;

    fn try_from(repr: LineHeightRepr) -> Result<Self> {
        match repr {
            LineHeightRepr::Number(n) => Self::new(&n.to_string()),
            LineHeightRepr::Text(s) => Self::new(&s),
        }
    }
}

/// Settings for one conversion run. Read-only once the run starts.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "cli", derive(serde::Deserialize))]
#[cfg_attr(feature = "cli", serde(default))]
pub struct ConversionConfig {
    pub output: OutputKind,
    pub line_height: LineHeight,
    pub script_target: ScriptTarget,
    pub font_family: Vec<String>,
    pub line_break_threshold: f32,
    pub title_max_chars: usize,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            output: OutputKind::default(),
            line_height: LineHeight::default(),
            script_target: ScriptTarget::default(),
            font_family: DEFAULT_FONT_FAMILY.iter().map(|s| s.to_string()).collect(),
            line_break_threshold: DEFAULT_LINE_BREAK_THRESHOLD,
            title_max_chars: DEFAULT_TITLE_MAX_CHARS,
        }
    }
}

impl ConversionConfig {
    pub fn new(output: OutputKind) -> Self {
        Self {
            output,
            ..Default::default()
        }
    }

    /// Load settings from a JSON file; missing fields take their defaults.
    #[cfg(feature = "cli")]
    pub fn from_json_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            Error::InvalidConfig(format!("{}: {e}", path.as_ref().display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_output(mut self, output: OutputKind) -> Self {
        self.output = output;
        self
    }

    pub fn with_line_height(mut self, line_height: LineHeight) -> Self {
        self.line_height = line_height;
        self
    }

    pub fn with_font_family<I, S>(mut self, fonts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.font_family = fonts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_line_break_threshold(mut self, threshold: f32) -> Self {
        self.line_break_threshold = threshold;
        self
    }

    /// Check invariants that deserialization alone cannot enforce.
    pub fn validate(&self) -> Result<()> {
        if self.font_family.is_empty() {
            return Err(Error::InvalidConfig("font family chain is empty".into()));
        }
        if !self.line_break_threshold.is_finite() || self.line_break_threshold < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "line break threshold must be non-negative: {}",
                self.line_break_threshold
            )));
        }
        if self.title_max_chars == 0 {
            return Err(Error::InvalidConfig("title length limit must be positive".into()));
        }
        Ok(())
    }

    /// The injected `font-family` value, with multi-word faces quoted.
    pub fn font_family_css(&self) -> String {
        self.font_family
            .iter()
            .map(|face| {
                let generic = matches!(
                    face.as_str(),
                    "serif" | "sans-serif" | "monospace" | "cursive" | "fantasy" | "system-ui"
                );
                if generic || face.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                    face.clone()
                } else {
                    format!("\"{}\"", face.replace('"', "\\\""))
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

//! Style and layout rewriting for restyled archives.
//!
//! - CSS: strip vertical writing declarations, append the layout rule block
//! - HTML: strip vertical writing declarations, force horizontal root/body,
//!   inject the layout rule block into the document head
//!
//! Both rewrites replace any block injected by an earlier run instead of
//! appending a second one, so re-running on converted output is a no-op.

pub mod css;
pub mod html;
mod patterns;

use crate::config::ConversionConfig;

/// Identifier of the `<style>` element injected into markup.
pub const STYLE_BLOCK_ID: &str = "hengban-layout";

/// Comment markers delimiting the rule block appended to stylesheets.
pub const CSS_BLOCK_BEGIN: &str = "/* hengban:begin */";
pub const CSS_BLOCK_END: &str = "/* hengban:end */";

/// The font and spacing rules forced onto every restyled document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutRules {
    font_family: String,
    line_height: String,
}

impl LayoutRules {
    pub fn new(font_family: impl Into<String>, line_height: impl Into<String>) -> Self {
        Self {
            font_family: font_family.into(),
            line_height: line_height.into(),
        }
    }

    pub fn from_config(config: &ConversionConfig) -> Self {
        Self::new(config.font_family_css(), config.line_height.as_str())
    }

    pub fn line_height(&self) -> &str {
        &self.line_height
    }

    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    /// CSS rules applied broadly enough to override page-native styling.
    pub fn css_rules(&self) -> String {
        let font = &self.font_family;
        let lh = &self.line_height;
        format!(
            "html, body {{\n  \
             writing-mode: horizontal-tb !important;\n  \
             -webkit-writing-mode: horizontal-tb !important;\n  \
             -epub-writing-mode: horizontal-tb !important;\n  \
             direction: ltr !important;\n  \
             font-family: {font} !important;\n  \
             line-height: {lh} !important;\n\
             }}\n\
             p, div, span, h1, h2, h3, h4, h5, h6, li, td, th, .content, .chapter {{\n  \
             line-height: {lh} !important;\n\
             }}\n\
             * {{\n  \
             font-family: {font} !important;\n  \
             line-height: {lh} !important;\n\
             }}"
        )
    }
}

impl Default for LayoutRules {
    fn default() -> Self {
        Self::from_config(&ConversionConfig::default())
    }
}

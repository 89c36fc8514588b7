//! Stylesheet rewriting and writing-mode inspection.
//!
//! Rewriting is pattern-based so the untouched parts of a stylesheet come
//! through byte-for-byte. Inspection tokenizes with cssparser, which is what
//! the invariant checks rely on.

use cssparser::{ParseError, Parser, ParserInput, Token};
use tracing::debug;

use super::patterns::{INJECTED_CSS_RE, TEXT_ORIENTATION_RE, VERTICAL_WRITING_RE};
use super::{CSS_BLOCK_BEGIN, CSS_BLOCK_END, LayoutRules};

type CssParseError<'i> = ParseError<'i, ()>;

/// Classification of a `writing-mode` declaration value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritingMode {
    Horizontal,
    Vertical,
    Other,
}

impl WritingMode {
    fn classify(value: &str) -> Self {
        let value = value.to_ascii_lowercase();
        if value == "horizontal-tb" || value == "lr-tb" || value == "lr" {
            WritingMode::Horizontal
        } else if value.starts_with("vertical")
            || value.starts_with("sideways")
            || value.starts_with("tb")
        {
            WritingMode::Vertical
        } else {
            WritingMode::Other
        }
    }
}

/// Remove every vertical writing-mode and text-orientation declaration.
pub fn strip_vertical_declarations(text: &str) -> String {
    let without_vertical = VERTICAL_WRITING_RE.replace_all(text, "");
    TEXT_ORIENTATION_RE
        .replace_all(&without_vertical, "")
        .into_owned()
}

/// Rewrite a stylesheet for horizontal reading with the configured font and
/// line height.
///
/// Any rule block appended by an earlier run is removed first, so the
/// result contains exactly one block.
pub fn rewrite_stylesheet(css: &str, rules: &LayoutRules) -> String {
    let vertical = writing_modes(css)
        .into_iter()
        .filter(|m| *m == WritingMode::Vertical)
        .count();

    let cleaned = INJECTED_CSS_RE.replace_all(css, "");
    let cleaned = strip_vertical_declarations(&cleaned);
    debug!(removed_vertical = vertical, "rewrote stylesheet");

    format!(
        "{cleaned}\n{CSS_BLOCK_BEGIN}\n{}\n{CSS_BLOCK_END}\n",
        rules.css_rules()
    )
}

/// Collect the value of every `writing-mode` declaration (any vendor prefix).
pub fn writing_modes(css: &str) -> Vec<WritingMode> {
    let mut found = Vec::new();
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    scan_declarations(&mut parser, &mut found);
    found
}

/// Whether the stylesheet still declares a vertical writing mode.
pub fn has_vertical_writing(css: &str) -> bool {
    writing_modes(css).contains(&WritingMode::Vertical)
}

/// Whether the stylesheet declares a horizontal writing mode.
pub fn has_horizontal_writing(css: &str) -> bool {
    writing_modes(css).contains(&WritingMode::Horizontal)
}

fn is_writing_mode_property(name: &str) -> bool {
    let bare = name
        .strip_prefix('-')
        .and_then(|rest| rest.find('-').map(|i| &rest[i + 1..]))
        .unwrap_or(name);
    bare == "writing-mode"
}

fn scan_declarations(parser: &mut Parser, found: &mut Vec<WritingMode>) {
    let mut property: Option<String> = None;
    let mut after_colon = false;

    loop {
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        match token {
            Token::WhiteSpace(_) | Token::Comment(_) => {}
            Token::Ident(ref name) if property.is_none() && !after_colon => {
                property = Some(name.to_ascii_lowercase());
            }
            Token::Colon if property.is_some() && !after_colon => after_colon = true,
            Token::Ident(ref value) if after_colon => {
                if let Some(prop) = property.take()
                    && is_writing_mode_property(&prop)
                {
                    found.push(WritingMode::classify(value));
                }
                after_colon = false;
            }
            Token::CurlyBracketBlock
            | Token::ParenthesisBlock
            | Token::SquareBracketBlock
            | Token::Function(_) => {
                property = None;
                after_colon = false;
                let _ = parser.parse_nested_block(|p| {
                    scan_declarations(p, found);
                    Ok::<_, CssParseError>(())
                });
            }
            _ => {
                property = None;
                after_colon = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_writing_modes() {
        let css = r#"
            html { -epub-writing-mode: vertical-rl; writing-mode: vertical-rl; }
            p:first-child { writing-mode: horizontal-tb }
            @media screen { div { -webkit-writing-mode: tb-rl; } }
        "#;
        assert_eq!(
            writing_modes(css),
            vec![
                WritingMode::Vertical,
                WritingMode::Vertical,
                WritingMode::Horizontal,
                WritingMode::Vertical,
            ]
        );
    }

    #[test]
    fn test_strip_vertical_declarations() {
        let css = "body { writing-mode: vertical-rl; text-orientation: upright; color: red; }";
        let out = strip_vertical_declarations(css);
        assert!(!out.contains("writing-mode"));
        assert!(!out.contains("text-orientation"));
        assert!(out.contains("color: red;"));
    }

    #[test]
    fn test_rewrite_stylesheet() {
        let css = "html { -epub-writing-mode: vertical-rl; }\np { margin: 0; }";
        let rules = LayoutRules::new("serif", "1.6");
        let out = rewrite_stylesheet(css, &rules);

        assert!(!has_vertical_writing(&out));
        assert!(has_horizontal_writing(&out));
        assert!(out.contains("line-height: 1.6"));
        assert!(out.contains("p { margin: 0; }"));
    }

    #[test]
    fn test_rewrite_stylesheet_is_idempotent() {
        let css = "body { writing-mode: vertical-rl; }";
        let rules = LayoutRules::default();
        let once = rewrite_stylesheet(css, &rules);
        let twice = rewrite_stylesheet(&once, &rules);
        assert_eq!(once, twice);
        assert_eq!(twice.matches(CSS_BLOCK_BEGIN).count(), 1);
    }

    #[test]
    fn test_rewrite_replaces_block_with_new_settings() {
        let first = rewrite_stylesheet("p {}", &LayoutRules::new("serif", "1.2"));
        let second = rewrite_stylesheet(&first, &LayoutRules::new("serif", "2.0"));
        assert!(!second.contains("line-height: 1.2"));
        assert!(second.contains("line-height: 2.0"));
    }

    proptest! {
        #[test]
        fn prop_rewrite_removes_vertical(
            prefix in "(-webkit-|-epub-|)",
            value in "(vertical-rl|vertical-lr|tb-rl|sideways-rl)",
            selector in "(body|html|p|\\.vrtl)",
            lh in "(1|1\\.2|1\\.5|2\\.25)",
        ) {
            let css = format!("{selector} {{ {prefix}writing-mode: {value}; margin: 0 }}");
            let out = rewrite_stylesheet(&css, &LayoutRules::new("serif", lh.clone()));
            prop_assert!(!has_vertical_writing(&out));
            prop_assert!(has_horizontal_writing(&out));
            let expected = format!("line-height: {lh} !important");
            prop_assert!(out.contains(&expected));
        }
    }
}

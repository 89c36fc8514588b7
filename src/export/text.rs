//! Structured-text (Markdown) document assembly.
//!
//! Layout of an assembled document:
//!
//! ```text
//! # Title
//!
//! **作者：** Author
//!
//! > 由 hengban 轉換為 Markdown 格式
//! > 生成時間：2026-01-01 12:00:00
//!
//! ---
//!
//! ## 目錄
//!
//! 1. [Chapter](#anchor)
//!
//! ---
//!
//! <a id="anchor"></a>
//!
//! ## Chapter
//!
//! body
//!
//! ---
//!
//! ## 轉換資訊
//! ...
//! ```

use std::fmt::Write as _;
use std::io::Write;

use chrono::{DateTime, Local};
use tracing::debug;

use crate::book::{Chapter, DocumentMetadata};
use crate::error::Result;
use crate::markdown::escape_markdown;
use crate::util::{format_timestamp, now};

/// Tool attribution line placed under the document title.
pub const ATTRIBUTION: &str = "由 hengban 轉換為 Markdown 格式";

/// Assembles metadata and rendered chapters into one Markdown document.
#[derive(Debug, Clone)]
pub struct MarkdownAssembler {
    generated_at: DateTime<Local>,
    finished_at: Option<DateTime<Local>>,
    transforms: Vec<String>,
}

impl Default for MarkdownAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownAssembler {
    pub fn new() -> Self {
        Self {
            generated_at: now(),
            finished_at: None,
            transforms: Vec::new(),
        }
    }

    /// Fix the generation timestamp shown in the header.
    pub fn generated_at(mut self, at: DateTime<Local>) -> Self {
        self.generated_at = at;
        self
    }

    /// Fix the completion timestamp shown in the trailer.
    ///
    /// Defaults to the time of assembly.
    pub fn finished_at(mut self, at: DateTime<Local>) -> Self {
        self.finished_at = Some(at);
        self
    }

    /// Record a transform applied to the content, listed in the trailer.
    pub fn with_transform(mut self, description: impl Into<String>) -> Self {
        self.transforms.push(description.into());
        self
    }

    /// Assemble the document. Chapters with an empty body are left out of
    /// both the table of contents and the body.
    pub fn assemble(&self, metadata: &DocumentMetadata, chapters: &[Chapter]) -> String {
        let chapters: Vec<&Chapter> = chapters
            .iter()
            .filter(|c| !c.body.trim().is_empty())
            .collect();

        let mut out = String::new();
        self.write_header(&mut out, metadata);
        write_toc(&mut out, &chapters);
        for chapter in &chapters {
            write_chapter(&mut out, chapter);
        }
        self.write_trailer(&mut out, chapters.len());

        debug!(chapters = chapters.len(), bytes = out.len(), "assembled markdown");
        out
    }

    /// Assemble the document and write it as UTF-8.
    pub fn export<W: Write>(
        &self,
        metadata: &DocumentMetadata,
        chapters: &[Chapter],
        writer: &mut W,
    ) -> Result<()> {
        writer.write_all(self.assemble(metadata, chapters).as_bytes())?;
        Ok(())
    }

    fn write_header(&self, out: &mut String, metadata: &DocumentMetadata) {
        let _ = writeln!(out, "# {}\n", escape_markdown(&metadata.title));
        if let Some(ref author) = metadata.author {
            let _ = writeln!(out, "**作者：** {}\n", escape_markdown(author));
        }
        let _ = writeln!(out, "> {ATTRIBUTION}");
        let _ = writeln!(out, "> 生成時間：{}\n", format_timestamp(&self.generated_at));
        out.push_str("---\n\n");
    }

    fn write_trailer(&self, out: &mut String, chapter_count: usize) {
        out.push_str("## 轉換資訊\n\n");
        let _ = writeln!(out, "- 章節數：{chapter_count}");
        for transform in &self.transforms {
            let _ = writeln!(out, "- {}", escape_markdown(transform));
        }
        let finished = self.finished_at.unwrap_or_else(now);
        let _ = writeln!(out, "\n*轉換完成時間：{}*", format_timestamp(&finished));
    }
}

fn write_toc(out: &mut String, chapters: &[&Chapter]) {
    if chapters.is_empty() {
        return;
    }
    out.push_str("## 目錄\n\n");
    for (i, chapter) in chapters.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. [{}](#{})",
            i + 1,
            escape_markdown(&chapter.title),
            chapter.anchor
        );
    }
    out.push_str("\n---\n\n");
}

fn write_chapter(out: &mut String, chapter: &Chapter) {
    let _ = writeln!(out, "<a id=\"{}\"></a>\n", chapter.anchor);
    let _ = writeln!(out, "## {}\n", escape_markdown(&chapter.title));
    out.push_str(chapter.body.trim());
    out.push_str("\n\n---\n\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn chapter(order: usize, title: &str, anchor: &str, body: &str) -> Chapter {
        Chapter {
            source_path: format!("c{order}.xhtml"),
            order,
            title: title.into(),
            anchor: anchor.into(),
            body: body.into(),
        }
    }

    fn assembler() -> MarkdownAssembler {
        let at = Local.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
        MarkdownAssembler::new().generated_at(at).finished_at(at)
    }

    #[test]
    fn test_full_document() {
        let metadata = DocumentMetadata::new("書名").with_author("作者");
        let chapters = vec![
            chapter(1, "第一章", "第一章", "# 第一章\n\n正文。"),
            chapter(2, "Chapter 2", "chapter-2", "  "),
            chapter(3, "尾聲", "尾聲", "完"),
        ];
        let doc = assembler()
            .with_transform("簡體轉繁體")
            .assemble(&metadata, &chapters);

        let expected = "\
# 書名

**作者：** 作者

> 由 hengban 轉換為 Markdown 格式
> 生成時間：2026-03-01 09:30:00

---

## 目錄

1. [第一章](#第一章)
2. [尾聲](#尾聲)

---

<a id=\"第一章\"></a>

## 第一章

# 第一章

正文。

---

<a id=\"尾聲\"></a>

## 尾聲

完

---

## 轉換資訊

- 章節數：2
- 簡體轉繁體

*轉換完成時間：2026-03-01 09:30:00*
";
        assert_eq!(doc, expected);
    }

    #[test]
    fn test_no_chapters_no_toc() {
        let doc = assembler().assemble(&DocumentMetadata::default(), &[]);
        assert!(doc.starts_with("# Converted eBook\n\n> "));
        assert!(!doc.contains("目錄"));
        assert!(!doc.contains("作者"));
        assert!(doc.contains("- 章節數：0\n"));
    }

    #[test]
    fn test_titles_escaped() {
        let metadata = DocumentMetadata::new("*Bold* [x]");
        let chapters = vec![chapter(1, "a_b", "a_b", "x")];
        let doc = assembler().assemble(&metadata, &chapters);
        assert!(doc.starts_with("# \\*Bold\\* \\[x\\]\n"));
        assert!(doc.contains("1. [a\\_b](#a_b)"));
    }

    #[test]
    fn test_export_writes_bytes() {
        let mut buf = Vec::new();
        assembler()
            .export(&DocumentMetadata::default(), &[], &mut buf)
            .unwrap();
        assert!(String::from_utf8(buf).unwrap().ends_with("*\n"));
    }
}

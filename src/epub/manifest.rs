//! Package descriptor lookup and title/author extraction.

use std::sync::LazyLock;

use quick_xml::Reader;
use quick_xml::events::Event;
use regex_lite::Regex;
use tracing::{debug, warn};

use super::reader::ArchiveSource;
use crate::book::DocumentMetadata;
use crate::error::{Error, Result};

/// Fixed location of the container descriptor.
pub const CONTAINER_PATH: &str = "META-INF/container.xml";

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:[a-z]+:)?title\b[^>]*>(.*?)</(?:[a-z]+:)?title\s*>").unwrap()
});

static CREATOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:[a-z]+:)?creator\b[^>]*>(.*?)</(?:[a-z]+:)?creator\s*>").unwrap()
});

static FULL_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)full-path\s*=\s*["']([^"']+)["']"#).unwrap());

/// Title and creator as written in the package descriptor.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DescriptorFields {
    pub title: Option<String>,
    pub creator: Option<String>,
}

/// Resolve document metadata, falling back to defaults on any failure.
pub fn resolve_metadata<S: ArchiveSource + ?Sized>(source: &mut S) -> DocumentMetadata {
    match try_resolve_metadata(source) {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!(error = %e, "metadata unavailable, using defaults");
            DocumentMetadata::default()
        }
    }
}

/// Resolve document metadata, reporting why it is unavailable.
pub fn try_resolve_metadata<S: ArchiveSource + ?Sized>(source: &mut S) -> Result<DocumentMetadata> {
    let opf_path = locate_package_descriptor(source)?;
    let entry = source
        .read_entry(&opf_path)
        .map_err(|e| Error::MetadataUnavailable(format!("{opf_path}: {e}")))?;
    let fields = parse_descriptor(&entry.text());
    debug!(path = %opf_path, ?fields, "read package descriptor");

    let mut metadata = DocumentMetadata::default();
    if let Some(title) = fields.title {
        metadata.title = title;
    }
    if let Some(creator) = fields.creator {
        metadata = metadata.with_author(creator);
    }
    Ok(metadata)
}

/// Find the package descriptor: the container's rootfile if it exists,
/// otherwise the first `.opf` entry.
pub fn locate_package_descriptor<S: ArchiveSource + ?Sized>(source: &mut S) -> Result<String> {
    let paths = source.entry_paths();

    if paths.iter().any(|p| p == CONTAINER_PATH) {
        match source.read_entry(CONTAINER_PATH) {
            Ok(entry) => match rootfile_path(&entry.text()) {
                Some(path) if has_entry(&paths, &path) => return Ok(path),
                Some(path) => warn!(%path, "container names a missing package descriptor"),
                None => warn!("container descriptor has no rootfile"),
            },
            Err(e) => warn!(error = %e, "container descriptor unreadable"),
        }
    }

    paths
        .into_iter()
        .find(|p| !p.ends_with('/') && p.to_ascii_lowercase().ends_with(".opf"))
        .ok_or_else(|| Error::MetadataUnavailable("no package descriptor in archive".into()))
}

fn has_entry(paths: &[String], path: &str) -> bool {
    let decoded = percent_encoding::percent_decode_str(path).decode_utf8_lossy();
    paths.iter().any(|p| p == path || *p == decoded)
}

/// The `full-path` of the first `rootfile` in a container descriptor.
pub fn rootfile_path(container: &str) -> Option<String> {
    let mut reader = Reader::from_str(container);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if local_name(e.name().as_ref()) == b"rootfile" => {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"full-path" {
                        let value = String::from_utf8_lossy(&attr.value);
                        let value = unescape(value.trim());
                        if !value.is_empty() {
                            return Some(value);
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                debug!(error = %e, "container is not well-formed, scanning for full-path");
                return FULL_PATH_RE
                    .captures(container)
                    .map(|c| unescape(c[1].trim()));
            }
            _ => {}
        }
    }
    None
}

/// Extract the first title and first creator from a package descriptor.
///
/// Malformed descriptors are scanned with patterns instead.
pub fn parse_descriptor(opf: &str) -> DescriptorFields {
    match parse_descriptor_xml(opf) {
        Ok(fields) => fields,
        Err(e) => {
            debug!(error = %e, "descriptor is not well-formed, scanning for fields");
            DescriptorFields {
                title: first_match(&TITLE_RE, opf),
                creator: first_match(&CREATOR_RE, opf),
            }
        }
    }
}

fn first_match(re: &Regex, text: &str) -> Option<String> {
    re.captures_iter(text)
        .filter_map(|c| clean_field(&crate::markup::parse(&c[1]).plain_text()))
        .next()
}

/// Resolve XML references, keeping the text as written if any is unknown.
fn unescape(text: &str) -> String {
    match quick_xml::escape::unescape(text) {
        Ok(value) => value.into_owned(),
        Err(_) => text.to_string(),
    }
}

fn resolve_reference(entity: &str) -> String {
    let raw = format!("&{entity};");
    match quick_xml::escape::unescape(&raw) {
        Ok(value) => value.into_owned(),
        // HTML named references show up in hand-edited descriptors.
        Err(_) => crate::markup::parse(&raw).text_content(),
    }
}

fn clean_field(raw: &str) -> Option<String> {
    let cleaned = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    (!cleaned.is_empty()).then_some(cleaned)
}

fn parse_descriptor_xml(opf: &str) -> Result<DescriptorFields> {
    let mut reader = Reader::from_str(opf);
    reader.config_mut().trim_text(false);

    let mut fields = DescriptorFields::default();
    let mut in_metadata = false;
    let mut current: Option<&'static str> = None;
    let mut buf_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"metadata" => in_metadata = true,
                b"title" if in_metadata && fields.title.is_none() => {
                    current = Some("title");
                    buf_text.clear();
                }
                b"creator" if in_metadata && fields.creator.is_none() => {
                    current = Some("creator");
                    buf_text.clear();
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if current.is_some() {
                    buf_text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::CData(e)) => {
                if current.is_some() {
                    buf_text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if current.is_some() {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    buf_text.push_str(&resolve_reference(&entity));
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                if local == b"metadata" {
                    break;
                }
                match (current, local) {
                    (Some("title"), b"title") => {
                        fields.title = clean_field(&buf_text);
                        current = None;
                    }
                    (Some("creator"), b"creator") => {
                        fields.creator = clean_field(&buf_text);
                        current = None;
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }

    Ok(fields)
}

/// Extract local name from potentially namespaced XML name
fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::{ArchiveEntry, DEFAULT_TITLE};
    use crate::epub::reader::MemorySource;

    const CONTAINER: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

    const OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>三體 &amp; 其他</dc:title>
    <dc:title>Second Title</dc:title>
    <dc:creator id="c1">劉慈欣</dc:creator>
    <dc:creator>Someone Else</dc:creator>
  </metadata>
</package>"#;

    fn source(entries: Vec<(&str, &str)>) -> MemorySource {
        MemorySource::new(
            entries
                .into_iter()
                .map(|(p, c)| ArchiveEntry::new(p, c.as_bytes().to_vec()))
                .collect(),
        )
    }

    #[test]
    fn test_resolve_via_container() {
        let mut src = source(vec![
            ("META-INF/container.xml", CONTAINER),
            ("OEBPS/content.opf", OPF),
            ("other.opf", "<package/>"),
        ]);
        let metadata = resolve_metadata(&mut src);
        assert_eq!(metadata.title, "三體 & 其他");
        assert_eq!(metadata.author.as_deref(), Some("劉慈欣"));
    }

    #[test]
    fn test_fallback_to_any_descriptor() {
        let mut src = source(vec![("book/package.OPF", OPF)]);
        assert_eq!(locate_package_descriptor(&mut src).unwrap(), "book/package.OPF");
        assert_eq!(resolve_metadata(&mut src).title, "三體 & 其他");
    }

    #[test]
    fn test_container_pointing_nowhere_falls_back() {
        let mut src = source(vec![
            ("META-INF/container.xml", CONTAINER),
            ("alt/content.opf", OPF),
        ]);
        assert_eq!(locate_package_descriptor(&mut src).unwrap(), "alt/content.opf");
    }

    #[test]
    fn test_defaults_without_descriptor() {
        let mut src = source(vec![("a.xhtml", "<p/>")]);
        assert!(matches!(
            try_resolve_metadata(&mut src),
            Err(Error::MetadataUnavailable(_))
        ));
        let metadata = resolve_metadata(&mut src);
        assert_eq!(metadata.title, DEFAULT_TITLE);
        assert_eq!(metadata.author, None);
    }

    #[test]
    fn test_missing_fields_default() {
        let opf = r#"<package><metadata><dc:language>zh</dc:language></metadata></package>"#;
        let mut src = source(vec![("content.opf", opf)]);
        let metadata = resolve_metadata(&mut src);
        assert_eq!(metadata, DocumentMetadata::default());
    }

    #[test]
    fn test_malformed_descriptor_scanned() {
        let opf = "<package><metadata><dc:title>破損 <i>書</i></dc:title><dc:creator>作者</metadata>";
        let fields = parse_descriptor(opf);
        assert_eq!(fields.title.as_deref(), Some("破損 書"));
        assert_eq!(fields.creator, None);
    }

    #[test]
    fn test_rootfile_path_malformed_container() {
        let container = r#"<container><rootfile full-path="x/y.opf"></container>"#;
        assert_eq!(rootfile_path(container).as_deref(), Some("x/y.opf"));
        assert_eq!(rootfile_path("<container/>"), None);
    }

    #[test]
    fn test_references_in_fields() {
        let opf = "<package><metadata><dc:title>&#x4E2D;&#25991; &hellip; &lt;1&gt;</dc:title>\
                   <dc:creator>A&nbsp;B</dc:creator></metadata></package>";
        let fields = parse_descriptor(opf);
        assert_eq!(fields.title.as_deref(), Some("中文 … <1>"));
        assert_eq!(fields.creator.as_deref(), Some("A B"));
    }

    #[test]
    fn test_rootfile_path_references() {
        let container = r#"<container><rootfiles><rootfile full-path="a&amp;b/c.opf"/></rootfiles></container>"#;
        assert_eq!(rootfile_path(container).as_deref(), Some("a&b/c.opf"));
    }

    #[test]
    fn test_cdata_title() {
        let opf = "<package><metadata><dc:title><![CDATA[A < B]]></dc:title></metadata></package>";
        assert_eq!(parse_descriptor(opf).title.as_deref(), Some("A < B"));
    }
}

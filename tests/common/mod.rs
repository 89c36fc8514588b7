//! Shared fixtures: small EPUBs built in memory.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub const CONTAINER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

pub const OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="id">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="id">test</dc:identifier>
    <dc:title>三体问题</dc:title>
    <dc:creator>刘慈欣</dc:creator>
  </metadata>
</package>"#;

pub const VERTICAL_CSS: &str = "html {\n  -epub-writing-mode: vertical-rl;\n  writing-mode: vertical-rl;\n}\np { text-indent: 2em; -webkit-text-orientation: upright; }\n";

pub fn chapter(title: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" style="writing-mode: vertical-rl">
<head><title>{title}</title><link rel="stylesheet" href="main.css"/></head>
<body>
{body}
</body>
</html>"#
    )
}

/// A small vertical-layout Simplified Chinese book.
pub fn sample_entries() -> Vec<(String, Vec<u8>)> {
    vec![
        ("mimetype".into(), b"application/epub+zip".to_vec()),
        ("META-INF/container.xml".into(), CONTAINER.as_bytes().to_vec()),
        ("OEBPS/content.opf".into(), OPF.as_bytes().to_vec()),
        (
            "OEBPS/ch02.xhtml".into(),
            chapter("第二章", "<h1>第二章</h1>\n<p>这个<strong>问题</strong>没有答案。</p>").into_bytes(),
        ),
        (
            "OEBPS/ch01.xhtml".into(),
            chapter("第一章", "<h1>第一章</h1>\n<p>他们说：<em>时间</em>会过去。</p>\n<ul><li>一</li><li>二</li></ul>").into_bytes(),
        ),
        ("OEBPS/main.css".into(), VERTICAL_CSS.as_bytes().to_vec()),
        ("OEBPS/images/cover.png".into(), vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 1, 2, 3]),
    ]
}

/// Zip `entries` in order, storing everything uncompressed.
pub fn build_epub(entries: &[(String, Vec<u8>)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (path, data) in entries {
        zip.start_file(path.as_str(), stored).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

pub fn sample_epub() -> Vec<u8> {
    build_epub(&sample_entries())
}

/// Flip bytes inside the stored data of `marker`, so that entry fails its
/// checksum while the archive directory stays intact.
pub fn corrupt(mut archive: Vec<u8>, marker: &str) -> Vec<u8> {
    let needle = marker.as_bytes();
    let pos = archive
        .windows(needle.len())
        .position(|w| w == needle)
        .expect("marker present in archive");
    for b in &mut archive[pos..pos + needle.len()] {
        *b = b'X';
    }
    archive
}

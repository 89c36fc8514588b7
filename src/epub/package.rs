//! Minimal EPUB 3 package synthesized from reconstructed page text.

use tracing::debug;

use super::manifest::CONTAINER_PATH;
use super::writer::{EPUB_MIMETYPE, MIMETYPE_PATH};
use crate::book::{ArchiveEntry, DocumentMetadata};
use crate::glyph::PageText;
use crate::transform::LayoutRules;
use crate::util::{escape_xml, uuid_v4};

const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

/// Language tag of every synthesized package.
pub const PACKAGE_LANGUAGE: &str = "zh-Hant";

/// Archive file name of the content document for page `number`.
pub fn page_file_name(number: usize) -> String {
    format!("page_{number:04}.xhtml")
}

/// Build the full entry set of a package with one content document per page.
pub fn synthesize_package(
    metadata: &DocumentMetadata,
    pages: &[PageText],
    rules: &LayoutRules,
) -> Vec<ArchiveEntry> {
    let mut entries = vec![
        ArchiveEntry::new(MIMETYPE_PATH, EPUB_MIMETYPE.to_vec()),
        ArchiveEntry::directory("META-INF/"),
        ArchiveEntry::new(CONTAINER_PATH, CONTAINER_XML.as_bytes().to_vec()),
        ArchiveEntry::directory("OEBPS/"),
        ArchiveEntry::new(
            "OEBPS/content.opf",
            generate_opf(metadata, pages, &uuid_v4()).into_bytes(),
        ),
        ArchiveEntry::new("OEBPS/nav.xhtml", generate_nav(metadata, pages).into_bytes()),
        ArchiveEntry::new("OEBPS/style.css", format!("{}\n", rules.css_rules()).into_bytes()),
    ];

    for page in pages {
        let path = format!("OEBPS/{}", page_file_name(page.number));
        entries.push(ArchiveEntry::new(path, page_document(page).into_bytes()));
    }

    debug!(pages = pages.len(), entries = entries.len(), "synthesized package");
    entries
}

fn generate_opf(metadata: &DocumentMetadata, pages: &[PageText], uuid: &str) -> String {
    let mut opf = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="BookId" xml:lang="zh-Hant">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
"#,
    );
    opf.push_str(&format!(
        "    <dc:identifier id=\"BookId\">urn:uuid:{uuid}</dc:identifier>\n"
    ));
    opf.push_str(&format!(
        "    <dc:title>{}</dc:title>\n",
        escape_xml(&metadata.title)
    ));
    if let Some(ref author) = metadata.author {
        opf.push_str(&format!(
            "    <dc:creator>{}</dc:creator>\n",
            escape_xml(author)
        ));
    }
    opf.push_str(&format!("    <dc:language>{PACKAGE_LANGUAGE}</dc:language>\n"));
    opf.push_str(&format!(
        "    <meta property=\"dcterms:modified\">{}</meta>\n",
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
    ));
    opf.push_str("  </metadata>\n");

    opf.push_str("  <manifest>\n");
    opf.push_str(
        "    <item id=\"nav\" href=\"nav.xhtml\" media-type=\"application/xhtml+xml\" properties=\"nav\"/>\n",
    );
    opf.push_str("    <item id=\"css\" href=\"style.css\" media-type=\"text/css\"/>\n");
    for page in pages {
        opf.push_str(&format!(
            "    <item id=\"page{}\" href=\"{}\" media-type=\"application/xhtml+xml\"/>\n",
            page.number,
            page_file_name(page.number)
        ));
    }
    opf.push_str("  </manifest>\n");

    opf.push_str("  <spine>\n");
    for page in pages {
        opf.push_str(&format!("    <itemref idref=\"page{}\"/>\n", page.number));
    }
    opf.push_str("  </spine>\n");
    opf.push_str("</package>\n");
    opf
}

fn generate_nav(metadata: &DocumentMetadata, pages: &[PageText]) -> String {
    let mut nav = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" xml:lang="zh-Hant" lang="zh-Hant">
<head>
"#,
    );
    nav.push_str(&format!("  <title>{}</title>\n", escape_xml(&metadata.title)));
    nav.push_str("</head>\n<body>\n  <nav epub:type=\"toc\" id=\"toc\">\n    <h1>目錄</h1>\n    <ol>\n");
    for page in pages {
        nav.push_str(&format!(
            "      <li><a href=\"{}\">Page {}</a></li>\n",
            page_file_name(page.number),
            page.number
        ));
    }
    nav.push_str("    </ol>\n  </nav>\n</body>\n</html>\n");
    nav
}

fn page_document(page: &PageText) -> String {
    let mut doc = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xml:lang="zh-Hant" lang="zh-Hant">
<head>
"#,
    );
    doc.push_str(&format!("  <title>Page {}</title>\n", page.number));
    doc.push_str("  <link rel=\"stylesheet\" type=\"text/css\" href=\"style.css\"/>\n");
    doc.push_str("</head>\n<body>\n");
    for line in page.lines() {
        doc.push_str(&format!("  <p>{}</p>\n", escape_xml(line)));
    }
    doc.push_str("</body>\n</html>\n");
    doc
}

//! Text decoding, timestamps and identifiers shared across the pipeline.

use std::borrow::Cow;

use chrono::{DateTime, Local};

/// Decode bytes to a string, handling the encodings found in CJK ebooks.
///
/// This function:
/// 1. First tries UTF-8 (handles BOM automatically via encoding_rs)
/// 2. If malformed, tries the hint encoding, then any `<?xml encoding="..."?>`
///    declaration in the bytes themselves
/// 3. Falls back to GB18030 (a superset of GBK/GB2312, the usual legacy
///    encoding of Simplified Chinese content)
///
/// Uses `Cow<str>` to avoid allocation when the input is valid UTF-8.
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    let declared = hint_encoding.or_else(|| extract_xml_encoding(bytes));
    if let Some(name) = declared
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
        && encoding != encoding_rs::UTF_8
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::GB18030.decode(bytes);
    result
}

/// Extract encoding from XML declaration.
///
/// Parses `<?xml ... encoding="..." ?>` within the first 100 bytes.
pub fn extract_xml_encoding(bytes: &[u8]) -> Option<&str> {
    let check_len = bytes.len().min(100);
    let prefix = &bytes[..check_len];

    let xml_start = prefix.windows(5).position(|w| w == b"<?xml")?;
    let after_xml = &prefix[xml_start..];

    let enc_pos = after_xml
        .windows(9)
        .position(|w| w.eq_ignore_ascii_case(b"encoding="))?;
    let after_enc = &after_xml[enc_pos + 9..];

    let (&quote, rest) = after_enc.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }

    let value_end = rest.iter().position(|&b| b == quote)?;
    std::str::from_utf8(&rest[..value_end]).ok()
}

/// Escape XML special characters
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Current local time, used for generation stamps.
pub fn now() -> DateTime<Local> {
    Local::now()
}

/// Human-readable timestamp for document headers and trailers.
pub fn format_timestamp(at: &DateTime<Local>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Generate a simple UUID v4 (random) for synthesized package identifiers.
pub fn uuid_v4() -> String {
    let seed = Local::now()
        .timestamp_nanos_opt()
        .map(|n| n as u64)
        .unwrap_or(0x9E37_79B9_7F4A_7C15);

    // Simple PRNG for UUID generation (not cryptographically secure, but fine for identifiers)
    let mut state = seed;
    let mut bytes = [0u8; 16];
    for byte in &mut bytes {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        *byte = (state >> 33) as u8;
    }

    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8_with_bom() {
        let bytes = b"\xEF\xBB\xBF<p>hi</p>";
        assert_eq!(decode_text(bytes, None), "<p>hi</p>");
    }

    #[test]
    fn test_decode_gbk_fallback() {
        // "中文" in GBK
        let bytes = [0xD6, 0xD0, 0xCE, 0xC4];
        assert_eq!(decode_text(&bytes, None), "中文");
    }

    #[test]
    fn test_decode_with_declared_big5() {
        let (big5, _, _) = encoding_rs::BIG5.encode("<?xml version=\"1.0\" encoding=\"big5\"?><p>繁體</p>");
        assert_eq!(
            decode_text(&big5, None),
            "<?xml version=\"1.0\" encoding=\"big5\"?><p>繁體</p>"
        );
    }

    #[test]
    fn test_extract_xml_encoding() {
        assert_eq!(
            extract_xml_encoding(b"<?xml version=\"1.0\" encoding='GBK'?>"),
            Some("GBK")
        );
        assert_eq!(extract_xml_encoding(b"<html>"), None);
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("<a & 'b'>"), "&lt;a &amp; &apos;b&apos;&gt;");
    }

    #[test]
    fn test_uuid_shape() {
        let id = uuid_v4();
        assert_eq!(id.len(), 36);
        assert_eq!(id.as_bytes()[14], b'4');
    }
}

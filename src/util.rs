//! Byte decoding helpers.

use std::borrow::Cow;

/// Decode document bytes to a string.
///
/// Tries UTF-8 first (BOM handled by encoding_rs), then the encoding named
/// by a `<meta charset>` hint if one was found, and finally falls back to
/// Windows-1252, which covers the older pages that predate UTF-8 output.
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Extract the charset label from a `<meta charset=...>` declaration in the
/// first kilobyte of the document, if present.
pub fn extract_meta_charset(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(1024)];
    let lower = head.to_ascii_lowercase();
    let needle = b"charset=";
    let start = lower.windows(needle.len()).position(|w| w == needle)? + needle.len();

    let label: String = head[start..]
        .iter()
        .skip_while(|&&b| b == b'"' || b == b'\'')
        .take_while(|&&b| !matches!(b, b'"' | b'\'' | b'>' | b';' | b'/') && !b.is_ascii_whitespace())
        .map(|&b| b as char)
        .collect();
    (!label.is_empty()).then_some(label)
}

/// Collapse every run of whitespace to a single space.
///
/// Leading and trailing whitespace is kept as a single space so callers
/// joining adjacent fragments do not glue words together.
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
                in_space = true;
            }
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

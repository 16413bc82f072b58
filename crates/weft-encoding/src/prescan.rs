//! The byte-level `<meta>` prescan.
//!
//! [§ 13.2.3.2 Prescan a byte stream to determine its encoding](https://html.spec.whatwg.org/multipage/parsing.html#prescan-a-byte-stream-to-determine-its-encoding)
//!
//! Runs over at most [`SNIFFING_LIMIT`] bytes before any decoding happens, so
//! it works on raw bytes and only understands the ASCII subset of markup.

use encoding_rs::Encoding;
use weft_common::{Position, Reporter, Stage};

use crate::registry;

/// How many leading bytes the prescan (and the rewind buffer) covers.
pub const SNIFFING_LIMIT: usize = 512;

/// What the prescan found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrescanResult {
    /// The declared encoding, coerced per the HTML rules.
    pub encoding: &'static Encoding,
    /// The declaration named UTF-16, which was replaced with UTF-8.
    pub coerced_from_utf16: bool,
}

/// Run the prescan over `bytes` (only the first [`SNIFFING_LIMIT`] bytes are
/// looked at). Problems with declared labels are reported and sniffing
/// continues past them.
#[must_use]
pub fn prescan(bytes: &[u8], reporter: &Reporter) -> Option<PrescanResult> {
    let limit = bytes.len().min(SNIFFING_LIMIT);
    Prescanner {
        bytes: &bytes[..limit],
        pos: 0,
        reporter,
    }
    .run()
}

const fn is_space(b: u8) -> bool {
    matches!(b, 0x09 | 0x0A | 0x0C | 0x0D | 0x20)
}

struct Prescanner<'a> {
    bytes: &'a [u8],
    pos: usize,
    reporter: &'a Reporter,
}

impl Prescanner<'_> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn starts_with_ignore_case(&self, pattern: &[u8]) -> bool {
        self.bytes
            .get(self.pos..self.pos + pattern.len())
            .is_some_and(|window| window.eq_ignore_ascii_case(pattern))
    }

    /// Move to just past the next `needle` at or after `from`, or to the end.
    fn skip_past(&mut self, from: usize, needle: &[u8]) {
        let from = from.min(self.bytes.len());
        self.pos = self.bytes[from..]
            .windows(needle.len())
            .position(|w| w == needle)
            .map_or(self.bytes.len(), |i| from + i + needle.len());
    }

    fn run(mut self) -> Option<PrescanResult> {
        while self.pos < self.bytes.len() {
            if self.starts_with_ignore_case(b"<!--") {
                // "the first 0x3E byte which is preceded by two 0x2D bytes"
                self.skip_past(self.pos + 2, b"-->");
            } else if self.starts_with_ignore_case(b"<meta")
                && self.bytes.get(self.pos + 5).is_some_and(|&b| is_space(b) || b == b'/')
            {
                self.pos += 6;
                if let Some(result) = self.meta_attributes() {
                    return Some(result);
                }
            } else if self.at_tag_start() {
                // "Advance the position pointer so that it points at the next
                // 0x09, 0x0A, 0x0C, 0x0D, 0x20, or 0x3E byte."
                while let Some(b) = self.peek() {
                    if is_space(b) || b == b'>' {
                        break;
                    }
                    self.pos += 1;
                }
                while self.attribute().is_some() {}
            } else if self.starts_with_ignore_case(b"<!")
                || self.starts_with_ignore_case(b"</")
                || self.starts_with_ignore_case(b"<?")
            {
                self.skip_past(self.pos + 2, b">");
            } else {
                self.pos += 1;
            }
        }
        None
    }

    /// `<` + letter, or `</` + letter.
    fn at_tag_start(&self) -> bool {
        if self.peek() != Some(b'<') {
            return false;
        }
        let next = self.bytes.get(self.pos + 1).copied();
        if next.is_some_and(|b| b.is_ascii_alphabetic()) {
            return true;
        }
        next == Some(b'/')
            && self
                .bytes
                .get(self.pos + 2)
                .is_some_and(u8::is_ascii_alphabetic)
    }

    /// The attribute loop of a `<meta` tag. Returns a result only when the
    /// tag carries a usable declaration.
    fn meta_attributes(&mut self) -> Option<PrescanResult> {
        let mut seen: Vec<String> = Vec::new();
        let mut got_pragma = false;
        let mut need_pragma: Option<bool> = None;
        let mut charset: Option<(String, &'static Encoding)> = None;

        while let Some((name, value)) = self.attribute() {
            if seen.contains(&name) {
                continue;
            }
            match name.as_str() {
                "http-equiv" => {
                    if value == "content-type" {
                        got_pragma = true;
                    }
                }
                "content" => {
                    if charset.is_none()
                        && let Some(label) = extract_charset_from_content(&value)
                        && let Some(encoding) = self.lookup(label)
                    {
                        charset = Some((label.to_string(), encoding));
                        need_pragma = Some(true);
                    }
                }
                "charset" => {
                    if let Some(encoding) = self.lookup(&value) {
                        charset = Some((value, encoding));
                    }
                    need_pragma = Some(false);
                }
                _ => {}
            }
            seen.push(name);
        }

        // "Processing: If need pragma is null, then jump to the step below
        // labeled next byte. If need pragma is true but got pragma is false,
        // then jump to the step below labeled next byte."
        let need_pragma = need_pragma?;
        if need_pragma && !got_pragma {
            return None;
        }
        let (label, declared) = charset?;
        log::debug!("prescan found charset declaration {label:?}");

        if registry::is_utf16(declared) {
            self.reporter.error(
                Stage::Encoding,
                format!("The internal character encoding declaration specified “{label}” which is not a rough superset of ASCII. Using “UTF-8” instead."),
                Position::UNKNOWN,
            );
        }
        let encoding = registry::coerce_declared(declared);
        if !registry::is_ascii_superset(encoding) {
            self.reporter.error(
                Stage::Encoding,
                format!("The encoding “{label}” is not an ASCII superset. Will continue sniffing."),
                Position::UNKNOWN,
            );
            return None;
        }
        if !registry::is_utf16(declared) && !registry::is_preferred_label(&label, declared) {
            self.reporter.error(
                Stage::Encoding,
                format!(
                    "The encoding “{label}” is not the preferred name of the character encoding in use. The preferred name is “{}”.",
                    declared.name()
                ),
                Position::UNKNOWN,
            );
        }
        Some(PrescanResult {
            encoding,
            coerced_from_utf16: registry::is_utf16(declared),
        })
    }

    fn lookup(&self, label: &str) -> Option<&'static Encoding> {
        let encoding = registry::for_label(label);
        if encoding.is_none() {
            self.reporter.error(
                Stage::Encoding,
                format!("Unsupported character encoding name: “{label}”. Will continue sniffing."),
                Position::UNKNOWN,
            );
        }
        encoding
    }

    /// [§ 13.2.3.2 "get an attribute"](https://html.spec.whatwg.org/multipage/parsing.html#concept-get-attributes-when-sniffing)
    ///
    /// Names and values are lowercased; bytes are widened to chars one to one.
    fn attribute(&mut self) -> Option<(String, String)> {
        // STEP 1: skip whitespace and slashes
        while let Some(b) = self.peek() {
            if is_space(b) || b == b'/' {
                self.pos += 1;
            } else {
                break;
            }
        }
        // STEP 2: "If the byte at position is 0x3E (>), then abort"
        let first = self.peek()?;
        if first == b'>' {
            return None;
        }

        let mut name = String::new();

        // STEP 4: attribute name
        loop {
            let b = self.peek()?;
            match b {
                b'=' if !name.is_empty() => {
                    self.pos += 1;
                    return self.attribute_value(name);
                }
                _ if is_space(b) => break,
                b'/' | b'>' => return Some((name, String::new())),
                _ => name.push(char::from(b.to_ascii_lowercase())),
            }
            self.pos += 1;
        }

        // STEP 5: spaces
        while self.peek().is_some_and(is_space) {
            self.pos += 1;
        }
        // STEP 6: "If the byte at position is not 0x3D (=), abort the get an
        // attribute algorithm. The attribute's name is the value of attribute
        // name, its value is the empty string."
        if self.peek()? != b'=' {
            return Some((name, String::new()));
        }
        self.pos += 1;
        self.attribute_value(name)
    }

    fn attribute_value(&mut self, name: String) -> Option<(String, String)> {
        let mut value = String::new();
        while self.peek().is_some_and(is_space) {
            self.pos += 1;
        }
        let b = self.peek()?;
        match b {
            b'"' | b'\'' => {
                let quote = b;
                self.pos += 1;
                loop {
                    let c = self.peek()?;
                    self.pos += 1;
                    if c == quote {
                        return Some((name, value));
                    }
                    value.push(char::from(c.to_ascii_lowercase()));
                }
            }
            b'>' => return Some((name, value)),
            _ => {
                value.push(char::from(b.to_ascii_lowercase()));
                self.pos += 1;
            }
        }
        loop {
            let c = self.peek()?;
            if is_space(c) || c == b'>' {
                return Some((name, value));
            }
            value.push(char::from(c.to_ascii_lowercase()));
            self.pos += 1;
        }
    }
}

/// [§ 2.5.4 Extracting character encodings from meta elements](https://html.spec.whatwg.org/multipage/urls-and-fetching.html#algorithm-for-extracting-a-character-encoding-from-a-meta-element)
///
/// Returns the label inside a `content` value such as
/// `text/html; charset=koi8-r`.
#[must_use]
pub fn extract_charset_from_content(content: &str) -> Option<&str> {
    let bytes = content.as_bytes();
    let mut pos = 0;
    loop {
        // "Loop: Find the first seven characters in s after position that are
        // an ASCII case-insensitive match for the word "charset"."
        let found = bytes[pos..]
            .windows(7)
            .position(|w| w.eq_ignore_ascii_case(b"charset"))?;
        pos += found + 7;
        while bytes.get(pos).is_some_and(|&b| is_space(b)) {
            pos += 1;
        }
        // "If the next character is not a U+003D EQUALS SIGN (=), then move
        // position to point just before that next character, and jump back
        // to the step labeled loop."
        if bytes.get(pos) == Some(&b'=') {
            pos += 1;
            break;
        }
    }
    while bytes.get(pos).is_some_and(|&b| is_space(b)) {
        pos += 1;
    }
    let first = *bytes.get(pos)?;
    if first == b'"' || first == b'\'' {
        let rest = &content[pos + 1..];
        let end = rest.find(char::from(first))?;
        return Some(&rest[..end]);
    }
    let rest = &content[pos..];
    let end = rest
        .find(|c: char| c == ';' || c.is_ascii_whitespace())
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{KOI8_R, UTF_8, WINDOWS_1251, WINDOWS_1252};

    fn run(input: &str) -> Option<&'static Encoding> {
        prescan(input.as_bytes(), &Reporter::silent()).map(|r| r.encoding)
    }

    #[test]
    fn test_meta_charset() {
        assert_eq!(run(r#"<meta charset="koi8-r">"#), Some(KOI8_R));
        assert_eq!(run("<META CHARSET=windows-1251>"), Some(WINDOWS_1251));
        assert_eq!(run("<meta charset='utf-8'/>"), Some(UTF_8));
    }

    #[test]
    fn test_http_equiv_needs_pragma() {
        let with_pragma = r#"<meta http-equiv="Content-Type" content="text/html; charset=koi8-r">"#;
        assert_eq!(run(with_pragma), Some(KOI8_R));
        let without_pragma = r#"<meta content="text/html; charset=koi8-r">"#;
        assert_eq!(run(without_pragma), None);
    }

    #[test]
    fn test_comments_and_other_tags_are_skipped() {
        let input = r#"<!-- <meta charset="koi8-r"> --><title x="<meta charset=utf-8>">t</title><meta charset="windows-1252">"#;
        assert_eq!(run(input), Some(WINDOWS_1252));
    }

    #[test]
    fn test_declaration_after_limit_is_ignored() {
        let mut input = " ".repeat(SNIFFING_LIMIT);
        input.push_str(r#"<meta charset="koi8-r">"#);
        assert_eq!(run(&input), None);
    }

    #[test]
    fn test_unknown_label_keeps_sniffing() {
        let log = weft_common::DiagnosticLog::new();
        let reporter = Reporter::new(log.boxed());
        let input = r#"<meta charset="klingon"><meta charset="koi8-r">"#;
        let found = prescan(input.as_bytes(), &reporter).map(|r| r.encoding);
        assert_eq!(found, Some(KOI8_R));
        assert!(log.contains("Unsupported character encoding name: “klingon”"));
    }

    #[test]
    fn test_utf16_declaration_becomes_utf8() {
        let result = prescan(br#"<meta charset="utf-16le">"#, &Reporter::silent());
        assert_eq!(
            result,
            Some(PrescanResult {
                encoding: UTF_8,
                coerced_from_utf16: true
            })
        );
    }

    #[test]
    fn test_extract_charset_from_content() {
        assert_eq!(extract_charset_from_content("text/html; charset=koi8-r"), Some("koi8-r"));
        assert_eq!(extract_charset_from_content("text/html;charset = \"utf-8\" x"), Some("utf-8"));
        assert_eq!(extract_charset_from_content("CHARSET='iso-8859-2';"), Some("iso-8859-2"));
        assert_eq!(extract_charset_from_content("charset=\"unterminated"), None);
        assert_eq!(extract_charset_from_content("charsetx charset=big5"), Some("big5"));
        assert_eq!(extract_charset_from_content("text/html"), None);
    }
}

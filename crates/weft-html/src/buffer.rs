//! The decode buffer handed from the driver to the tokenizer.
//!
//! [§ 13.2.3.5 Preprocessing the input stream](https://html.spec.whatwg.org/multipage/parsing.html#preprocessing-the-input-stream)
//!
//! "Before the tokenization stage, the input stream must be preprocessed by
//! normalizing newlines."

/// A window of decoded text with a read cursor.
///
/// The tokenizer consumes from the cursor; a suspended tokenizer leaves the
/// cursor where it stopped so the next call resumes there.
#[derive(Debug, Clone, Default)]
pub struct DecodeBuffer {
    text: String,
    position: usize,
    /// The previous chunk ended in U+000D, so a U+000A at the start of the
    /// next chunk belongs to the same line break.
    last_was_cr: bool,
}

impl DecodeBuffer {
    /// An empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with `chunk`, normalized, and rewind the cursor.
    ///
    /// "Normalize newlines in input: replace every U+000D CR U+000A LF code
    /// point pair with a single U+000A LF code point, and then replace every
    /// remaining U+000D CR code point with a U+000A LF code point."
    ///
    /// A CR at the end of `chunk` is remembered so that an LF opening the next
    /// chunk is dropped.
    pub fn refill(&mut self, chunk: &str) {
        self.text.clear();
        self.position = 0;
        if chunk.is_empty() {
            return;
        }
        self.text.reserve(chunk.len());
        let input = if self.last_was_cr {
            chunk.strip_prefix('\n').unwrap_or(chunk)
        } else {
            chunk
        };
        let mut pending_cr = false;
        for c in input.chars() {
            match c {
                '\r' => {
                    self.text.push('\n');
                    pending_cr = true;
                }
                '\n' if pending_cr => pending_cr = false,
                _ => {
                    self.text.push(c);
                    pending_cr = false;
                }
            }
        }
        self.last_was_cr = pending_cr;
    }

    /// Forget the carried CR. Used when the input restarts from the top.
    pub fn reset(&mut self) {
        self.text.clear();
        self.position = 0;
        self.last_was_cr = false;
    }

    /// Consume the next character.
    pub fn next_char(&mut self) -> Option<char> {
        let c = self.text[self.position..].chars().next()?;
        self.position += c.len_utf8();
        Some(c)
    }

    /// Drop a U+FEFF at the cursor, if any. Returns true if one was dropped.
    pub fn skip_bom(&mut self) -> bool {
        if self.text[self.position..].starts_with('\u{FEFF}') {
            self.position += '\u{FEFF}'.len_utf8();
            true
        } else {
            false
        }
    }

    /// Returns true if everything was consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.position >= self.text.len()
    }

    /// The unconsumed text.
    #[must_use]
    pub fn remaining(&self) -> &str {
        &self.text[self.position..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(chunks: &[&str]) -> String {
        let mut buffer = DecodeBuffer::new();
        let mut out = String::new();
        for chunk in chunks {
            buffer.refill(chunk);
            out.push_str(buffer.remaining());
        }
        out
    }

    #[test]
    fn test_line_endings_normalized() {
        assert_eq!(normalize(&["a\r\nb\rc\nd"]), "a\nb\nc\nd");
        assert_eq!(normalize(&["\r\r\n"]), "\n\n");
    }

    #[test]
    fn test_crlf_split_across_chunks() {
        assert_eq!(normalize(&["a\r", "\nb"]), "a\nb");
        assert_eq!(normalize(&["a\r", "b"]), "a\nb");
        assert_eq!(normalize(&["a\r", "", "\nb"]), "a\nb");
    }

    #[test]
    fn test_cursor() {
        let mut buffer = DecodeBuffer::new();
        buffer.refill("\u{FEFF}hé");
        assert!(buffer.skip_bom());
        assert_eq!(buffer.next_char(), Some('h'));
        assert_eq!(buffer.next_char(), Some('é'));
        assert!(buffer.is_empty());
        assert_eq!(buffer.next_char(), None);
    }
}

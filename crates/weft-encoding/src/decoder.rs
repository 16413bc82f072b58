//! Incremental byte decoding for one encoding.

use encoding_rs::{DecoderResult, Encoding};

/// One malformed or unmappable byte sequence found while decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedSequence {
    /// The offending bytes, including any that arrived in earlier chunks.
    pub bytes: Vec<u8>,
    /// Byte offset into the output string where U+FFFD was written for it.
    pub output_offset: usize,
}

impl MalformedSequence {
    /// The bytes formatted like `“c3”, “28”` for diagnostics.
    #[must_use]
    pub fn describe(&self) -> String {
        self.bytes
            .iter()
            .map(|b| format!("“{b:02x}”"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Incremental decoder bound to a single encoding.
///
/// Never fails: each malformed sequence becomes one U+FFFD in the output and
/// one [`MalformedSequence`] record, and decoding resumes right after it.
pub struct ByteDecoder {
    inner: encoding_rs::Decoder,
    /// The last few bytes fed, for describing sequences split across chunks.
    history: Vec<u8>,
}

const HISTORY_LEN: usize = 8;

impl std::fmt::Debug for ByteDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteDecoder")
            .field("encoding", &self.encoding().name())
            .finish_non_exhaustive()
    }
}

impl ByteDecoder {
    /// A fresh decoder. Byte order marks are not stripped here; the driver
    /// decides whether a leading U+FEFF is swallowed.
    #[must_use]
    pub fn new(encoding: &'static Encoding) -> Self {
        Self {
            inner: encoding.new_decoder_without_bom_handling(),
            history: Vec::with_capacity(HISTORY_LEN * 2),
        }
    }

    /// The encoding this decoder was created for.
    #[must_use]
    pub fn encoding(&self) -> &'static Encoding {
        self.inner.encoding()
    }

    /// Decode `src`, appending to `out`.
    ///
    /// With `last` set, any bytes the decoder is still holding from earlier
    /// chunks are flushed (an incomplete trailing sequence becomes U+FFFD).
    #[must_use]
    pub fn decode(&mut self, src: &[u8], last: bool, out: &mut String) -> Vec<MalformedSequence> {
        let mut malformed = Vec::new();
        let mut remaining = src;
        loop {
            let needed = self
                .inner
                .max_utf8_buffer_length_without_replacement(remaining.len())
                .unwrap_or(8192)
                .max(4);
            out.reserve(needed);

            let (result, read) =
                self.inner
                    .decode_to_string_without_replacement(remaining, out, last);
            let consumed = &remaining[..read];
            self.history
                .extend_from_slice(&consumed[consumed.len().saturating_sub(HISTORY_LEN)..]);
            remaining = &remaining[read..];

            match result {
                DecoderResult::InputEmpty => {
                    self.trim_history();
                    return malformed;
                }
                DecoderResult::OutputFull => {}
                DecoderResult::Malformed(bad, extra) => {
                    let end = self.history.len().saturating_sub(usize::from(extra));
                    let start = end.saturating_sub(usize::from(bad));
                    malformed.push(MalformedSequence {
                        bytes: self.history[start..end].to_vec(),
                        output_offset: out.len(),
                    });
                    out.push('\u{FFFD}');
                }
            }
            self.trim_history();
        }
    }

    fn trim_history(&mut self) {
        if self.history.len() > HISTORY_LEN {
            let excess = self.history.len() - HISTORY_LEN;
            self.history.copy_within(excess.., 0);
            self.history.truncate(HISTORY_LEN);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{KOI8_R, UTF_8, UTF_16LE, WINDOWS_1252};

    #[test]
    fn test_valid_utf8_passes_through() {
        let mut decoder = ByteDecoder::new(UTF_8);
        let mut out = String::new();
        let bad = decoder.decode("héllo".as_bytes(), true, &mut out);
        assert!(bad.is_empty());
        assert_eq!(out, "héllo");
    }

    #[test]
    fn test_malformed_byte_becomes_one_replacement() {
        let mut decoder = ByteDecoder::new(UTF_8);
        let mut out = String::new();
        let bad = decoder.decode(b"a\xFFb", true, &mut out);
        assert_eq!(out, "a\u{FFFD}b");
        assert_eq!(bad.len(), 1);
        assert_eq!(bad[0].bytes, vec![0xFF]);
        assert_eq!(bad[0].output_offset, 1);
        assert_eq!(bad[0].describe(), "“ff”");
    }

    #[test]
    fn test_sequence_split_across_chunks() {
        let mut decoder = ByteDecoder::new(UTF_8);
        let mut out = String::new();
        assert!(decoder.decode(b"x\xC3", false, &mut out).is_empty());
        assert!(decoder.decode(b"\xA9y", true, &mut out).is_empty());
        assert_eq!(out, "x©y");
    }

    #[test]
    fn test_truncated_sequence_flushed_at_end() {
        let mut decoder = ByteDecoder::new(UTF_8);
        let mut out = String::new();
        assert!(decoder.decode(b"ok\xE2\x82", false, &mut out).is_empty());
        let bad = decoder.decode(&[], true, &mut out);
        assert_eq!(bad.len(), 1);
        assert_eq!(bad[0].describe(), "“e2”, “82”");
        assert_eq!(out, "ok\u{FFFD}");
    }

    #[test]
    fn test_single_byte_legacy() {
        let mut out = String::new();
        let _ = ByteDecoder::new(WINDOWS_1252).decode(b"caf\xE9", true, &mut out);
        assert_eq!(out, "café");

        let mut out = String::new();
        let _ = ByteDecoder::new(KOI8_R).decode(b"\xC1", true, &mut out);
        assert_eq!(out, "а");
    }

    #[test]
    fn test_utf16_keeps_bom_character() {
        let mut out = String::new();
        let _ = ByteDecoder::new(UTF_16LE).decode(b"\xFF\xFEh\x00i\x00", true, &mut out);
        assert_eq!(out, "\u{FEFF}hi");
    }
}

//! Optional encoding guessers consulted when neither a BOM nor a declaration
//! decided the encoding.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE, WINDOWS_1252};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Which guessers run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Heuristics {
    /// No guessing; go straight to the fallback.
    #[default]
    None,
    /// The byte statistics check only.
    Statistical,
    /// The general language/encoding detector only.
    LanguageDetector,
    /// Statistics first, then the language detector.
    All,
}

impl Heuristics {
    /// Run the configured guessers over the sniffed prefix.
    #[must_use]
    pub fn detect(self, prefix: &[u8], complete: bool) -> Option<&'static Encoding> {
        match self {
            Self::None => None,
            Self::Statistical => detect_statistical(prefix),
            Self::LanguageDetector => detect_language(prefix, complete),
            Self::All => detect_statistical(prefix).or_else(|| detect_language(prefix, complete)),
        }
    }
}

/// Byte-statistics guess.
///
/// Recognizes BOM-less UTF-16 from the distribution of zero bytes, and UTF-8
/// from the presence of well-formed multi-byte sequences. Pure ASCII gives no
/// verdict because every ASCII-compatible encoding reads it the same way.
#[must_use]
pub fn detect_statistical(prefix: &[u8]) -> Option<&'static Encoding> {
    if prefix.len() >= 4 {
        let pairs = prefix.len() / 2;
        let even_zeros = prefix.iter().step_by(2).filter(|&&b| b == 0).count();
        let odd_zeros = prefix.iter().skip(1).step_by(2).filter(|&&b| b == 0).count();
        // Mostly-Latin text in UTF-16 has a zero in nearly every other byte.
        if odd_zeros * 10 >= pairs * 4 && even_zeros * 20 < pairs {
            return Some(UTF_16LE);
        }
        if even_zeros * 10 >= pairs * 4 && odd_zeros * 20 < pairs {
            return Some(UTF_16BE);
        }
    }

    if prefix.is_ascii() {
        return None;
    }
    match std::str::from_utf8(prefix) {
        Ok(_) => Some(UTF_8),
        // A multi-byte sequence cut off by the end of the prefix is fine.
        Err(e) if e.error_len().is_none() && e.valid_up_to() > 0 => {
            if prefix[..e.valid_up_to()].is_ascii() {
                None
            } else {
                Some(UTF_8)
            }
        }
        Err(_) => None,
    }
}

/// Guess with `chardetng`.
///
/// A windows-1252 verdict on pure ASCII carries no information and is
/// dropped, so the regular fallback (and its diagnostics) applies instead.
#[must_use]
pub fn detect_language(prefix: &[u8], complete: bool) -> Option<&'static Encoding> {
    let mut detector = EncodingDetector::new();
    let saw_non_ascii = detector.feed(prefix, complete);
    let guess = detector.guess(None, true);
    if guess == WINDOWS_1252 && !saw_non_ascii {
        None
    } else {
        Some(guess)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_gives_no_verdict() {
        assert_eq!(detect_statistical(b"<p>plain ascii</p>"), None);
        assert_eq!(detect_language(b"<p>plain ascii</p>", true), None);
    }

    #[test]
    fn test_utf8_detected() {
        assert_eq!(detect_statistical("<p>naïve café</p>".as_bytes()), Some(UTF_8));
    }

    #[test]
    fn test_truncated_utf8_tail_still_counts() {
        let mut bytes = "résumé ".as_bytes().to_vec();
        bytes.push(0xE2);
        assert_eq!(detect_statistical(&bytes), Some(UTF_8));
    }

    #[test]
    fn test_invalid_utf8_gives_no_statistical_verdict() {
        assert_eq!(detect_statistical(b"caf\xE9 au lait"), None);
    }

    #[test]
    fn test_bomless_utf16() {
        let le: Vec<u8> = "<html>".encode_utf16().flat_map(u16::to_le_bytes).collect();
        let be: Vec<u8> = "<html>".encode_utf16().flat_map(u16::to_be_bytes).collect();
        assert_eq!(detect_statistical(&le), Some(UTF_16LE));
        assert_eq!(detect_statistical(&be), Some(UTF_16BE));
    }

    #[test]
    fn test_modes() {
        assert_eq!(Heuristics::None.detect("é".as_bytes(), true), None);
        assert_eq!(Heuristics::Statistical.detect("é".as_bytes(), true), Some(UTF_8));
        assert_eq!("language-detector".parse::<Heuristics>().ok(), Some(Heuristics::LanguageDetector));
    }
}

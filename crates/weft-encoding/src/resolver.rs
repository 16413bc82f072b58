//! [§ 13.2.3.2 Determining the character encoding](https://html.spec.whatwg.org/multipage/parsing.html#determining-the-character-encoding)
//!
//! BOM, then the transport-layer declaration, then the `<meta>` prescan, then
//! the optional heuristics, then the fallback. The first step that answers
//! wins.

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};
use strum_macros::Display;
use weft_common::{Position, Reporter, Stage};

use crate::heuristics::Heuristics;
use crate::prescan::prescan;
use crate::registry::{self, Confidence};

/// Which step decided the encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum EncodingSource {
    /// A byte order mark.
    Bom,
    /// A label supplied by the embedder (e.g. a `Content-Type` header).
    External,
    /// A `<meta>` declaration found by the prescan.
    Prescan,
    /// A heuristic detector.
    Heuristic,
    /// Nothing decided; the fallback was used.
    Fallback,
    /// A declaration seen by the tree builder, after a restart.
    InDocument,
}

/// The outcome of encoding resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// The encoding to decode with.
    pub encoding: &'static Encoding,
    /// Whether a later in-document declaration may still change it.
    pub confidence: Confidence,
    /// Which step decided.
    pub source: EncodingSource,
    /// Whether a leading U+FEFF may be swallowed. Cleared when the prescan
    /// replaced a UTF-16 declaration with UTF-8.
    pub swallow_bom: bool,
}

/// Sniff a byte order mark.
///
/// Returns the encoding and the BOM length.
#[must_use]
pub fn sniff_bom(bytes: &[u8]) -> Option<(&'static Encoding, usize)> {
    match bytes {
        [0xEF, 0xBB, 0xBF, ..] => Some((UTF_8, 3)),
        [0xFE, 0xFF, ..] => Some((UTF_16BE, 2)),
        [0xFF, 0xFE, ..] => Some((UTF_16LE, 2)),
        _ => None,
    }
}

/// Inputs to [`resolve`] besides the bytes themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolverOptions {
    /// An encoding already resolved from an external declaration.
    pub external: Option<&'static Encoding>,
    /// Which heuristic detectors may run.
    pub heuristics: Heuristics,
}

/// Decide the encoding from the first bytes of the document.
///
/// `complete` says whether `prefix` is the whole document.
#[must_use]
pub fn resolve(
    prefix: &[u8],
    complete: bool,
    options: ResolverOptions,
    reporter: &Reporter,
) -> Resolution {
    // STEP 1: "If the result of BOM sniffing is an encoding, return that
    // encoding with confidence certain."
    if let Some((encoding, _)) = sniff_bom(prefix) {
        log::debug!("byte order mark selects {}", encoding.name());
        return Resolution {
            encoding,
            confidence: Confidence::Certain,
            source: EncodingSource::Bom,
            swallow_bom: true,
        };
    }

    // STEP 2: "If the user has explicitly instructed the user agent to
    // override the document's character encoding" / transport layer
    // declaration: confidence certain.
    if let Some(encoding) = options.external {
        log::debug!("external declaration selects {}", encoding.name());
        return Resolution {
            encoding,
            confidence: Confidence::Certain,
            source: EncodingSource::External,
            swallow_bom: true,
        };
    }

    // STEP 3: prescan, confidence tentative.
    if let Some(found) = prescan(prefix, reporter) {
        log::debug!("prescan selects {}", found.encoding.name());
        warn_if_legacy(found.encoding, reporter);
        return Resolution {
            encoding: found.encoding,
            confidence: Confidence::Tentative,
            source: EncodingSource::Prescan,
            swallow_bom: !found.coerced_from_utf16,
        };
    }

    // STEP 4: heuristics, confidence tentative.
    if let Some(encoding) = options.heuristics.detect(prefix, complete) {
        log::debug!("{} heuristics select {}", options.heuristics, encoding.name());
        return Resolution {
            encoding,
            confidence: Confidence::Tentative,
            source: EncodingSource::Heuristic,
            swallow_bom: true,
        };
    }

    if options.heuristics != Heuristics::None {
        log::warn!(
            "{} heuristics found no verdict; using the fallback",
            options.heuristics
        );
    }

    // STEP 5: "Otherwise, return an implementation-defined or user-specified
    // default character encoding, with the confidence tentative."
    Resolution {
        encoding: registry::fallback(),
        confidence: Confidence::Tentative,
        source: EncodingSource::Fallback,
        swallow_bom: true,
    }
}

fn warn_if_legacy(encoding: &'static Encoding, reporter: &Reporter) {
    if encoding != UTF_8 {
        reporter.warning(
            Stage::Encoding,
            format!(
                "Legacy encoding “{}” used. Documents should use UTF-8.",
                encoding.name()
            ),
            Position::UNKNOWN,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{KOI8_R, WINDOWS_1252};

    fn resolve_default(bytes: &[u8]) -> Resolution {
        resolve(bytes, true, ResolverOptions::default(), &Reporter::silent())
    }

    #[test]
    fn test_bom_beats_everything() {
        let input = b"\xEF\xBB\xBF<meta charset=koi8-r>";
        let options = ResolverOptions {
            external: Some(KOI8_R),
            heuristics: Heuristics::All,
        };
        let resolution = resolve(input, true, options, &Reporter::silent());
        assert_eq!(resolution.encoding, UTF_8);
        assert_eq!(resolution.confidence, Confidence::Certain);
        assert_eq!(resolution.source, EncodingSource::Bom);
    }

    #[test]
    fn test_utf16_boms() {
        assert_eq!(sniff_bom(b"\xFF\xFEa\x00"), Some((UTF_16LE, 2)));
        assert_eq!(sniff_bom(b"\xFE\xFF\x00a"), Some((UTF_16BE, 2)));
        assert_eq!(sniff_bom(b"\xEF\xBB"), None);
    }

    #[test]
    fn test_external_beats_prescan() {
        let options = ResolverOptions {
            external: Some(WINDOWS_1252),
            heuristics: Heuristics::None,
        };
        let resolution = resolve(b"<meta charset=koi8-r>", true, options, &Reporter::silent());
        assert_eq!(resolution.encoding, WINDOWS_1252);
        assert_eq!(resolution.confidence, Confidence::Certain);
    }

    #[test]
    fn test_prescan_is_tentative() {
        let resolution = resolve_default(b"<meta charset=koi8-r>");
        assert_eq!(resolution.encoding, KOI8_R);
        assert_eq!(resolution.confidence, Confidence::Tentative);
        assert_eq!(resolution.source, EncodingSource::Prescan);
    }

    #[test]
    fn test_heuristics_only_when_enabled() {
        let bytes = "<p>déjà vu</p>".as_bytes();
        assert_eq!(resolve_default(bytes).source, EncodingSource::Fallback);

        let options = ResolverOptions {
            external: None,
            heuristics: Heuristics::Statistical,
        };
        let resolution = resolve(bytes, true, options, &Reporter::silent());
        assert_eq!(resolution.encoding, UTF_8);
        assert_eq!(resolution.source, EncodingSource::Heuristic);
        assert_eq!(resolution.confidence, Confidence::Tentative);
    }

    #[test]
    fn test_heuristics_without_verdict_fall_back() {
        let options = ResolverOptions {
            external: None,
            heuristics: Heuristics::Statistical,
        };
        let log = weft_common::DiagnosticLog::new();
        let resolution = resolve(b"<p>plain ascii</p>", true, options, &Reporter::new(log.boxed()));
        assert_eq!(resolution.source, EncodingSource::Fallback);
        assert_eq!(resolution.encoding, WINDOWS_1252);
        // The missing verdict is a log record, not a document diagnostic.
        assert!(log.is_empty());
    }

    #[test]
    fn test_fallback() {
        let resolution = resolve_default(b"<p>hello</p>");
        assert_eq!(resolution.encoding, WINDOWS_1252);
        assert_eq!(resolution.confidence, Confidence::Tentative);
    }

    #[test]
    fn test_prescanned_utf16_disables_bom_swallowing() {
        let resolution = resolve_default(b"<meta charset=utf-16>");
        assert_eq!(resolution.encoding, UTF_8);
        assert!(!resolution.swallow_bom);
    }
}

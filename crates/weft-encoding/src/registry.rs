//! Label lookup and the handful of encoding predicates the sniffing rules
//! need.
//!
//! [Encoding Standard § 4.2 Names and labels](https://encoding.spec.whatwg.org/#names-and-labels)
//!
//! The label table itself and the codecs are `encoding_rs`'s; this module
//! only adds the HTML-specific coercions on top.

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE, WINDOWS_1252, X_USER_DEFINED};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use weft_common::{Position, Reporter, Stage};

/// [§ 13.2.3.1 Parsing with a known character encoding](https://html.spec.whatwg.org/multipage/parsing.html#concept-encoding-confidence)
///
/// "The confidence is either tentative, certain, or irrelevant."
///
/// Irrelevant only applies to non-byte input, which this parser never sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// The encoding may still be replaced by an in-document declaration.
    Tentative,
    /// The encoding is final.
    Certain,
}

/// "get an encoding": label to encoding, with ASCII whitespace trimmed and
/// case ignored. Returns `None` for unknown labels.
#[must_use]
pub fn for_label(label: &str) -> Option<&'static Encoding> {
    Encoding::for_label(label.as_bytes())
}

/// The fallback used when nothing else decides: windows-1252.
#[must_use]
pub fn fallback() -> &'static Encoding {
    WINDOWS_1252
}

/// Returns true for UTF-16BE and UTF-16LE.
#[must_use]
pub fn is_utf16(encoding: &'static Encoding) -> bool {
    encoding == UTF_16BE || encoding == UTF_16LE
}

/// Returns true if ASCII bytes decode to ASCII characters in `encoding`, so
/// that markup can be scanned before the encoding is known.
#[must_use]
pub fn is_ascii_superset(encoding: &'static Encoding) -> bool {
    encoding.is_ascii_compatible()
}

/// Declarations found inside the document cannot name UTF-16 (the declaration
/// itself was readable as ASCII) and never mean x-user-defined.
///
/// [§ 13.2.3.2 Determining the character encoding](https://html.spec.whatwg.org/multipage/parsing.html#prescan-a-byte-stream-to-determine-its-encoding)
/// "If charset is UTF-16BE/LE, then set charset to UTF-8. If charset is
/// x-user-defined, then set charset to windows-1252."
#[must_use]
pub fn coerce_declared(encoding: &'static Encoding) -> &'static Encoding {
    if is_utf16(encoding) {
        UTF_8
    } else if encoding == X_USER_DEFINED {
        WINDOWS_1252
    } else {
        encoding
    }
}

/// Returns true if `label` is the encoding's own name rather than an alias.
#[must_use]
pub fn is_preferred_label(label: &str, encoding: &'static Encoding) -> bool {
    label
        .trim_matches(|c: char| c.is_ascii_whitespace())
        .eq_ignore_ascii_case(encoding.name())
}

/// Resolve a label found in a declaration and complain about it the way a
/// validator would: unknown labels are an error, aliases name the preferred
/// label, and coercions say what is used instead.
///
/// Returns the encoding to use, already coerced.
#[must_use]
pub fn resolve_declared_label(
    label: &str,
    reporter: &Reporter,
    stage: Stage,
    position: Position,
) -> Option<&'static Encoding> {
    let Some(declared) = for_label(label) else {
        reporter.error(
            stage,
            format!("Unsupported character encoding name: “{label}”."),
            position,
        );
        return None;
    };
    if !is_preferred_label(label, declared) {
        reporter.error(
            stage,
            format!(
                "The encoding “{label}” is not the preferred name of the character encoding in use. The preferred name is “{}”.",
                declared.name()
            ),
            position,
        );
    }
    let actual = coerce_declared(declared);
    if actual != declared {
        reporter.warning(
            stage,
            format!(
                "Using “{}” instead of the declared encoding “{label}”.",
                actual.name()
            ),
            position,
        );
    }
    Some(actual)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_trimmed_and_case_folded() {
        assert_eq!(for_label("  UTF-8\n"), Some(UTF_8));
        assert_eq!(for_label("latin1"), Some(WINDOWS_1252));
        assert_eq!(for_label("koi8-r").map(Encoding::name), Some("KOI8-R"));
        assert_eq!(for_label("no-such-encoding"), None);
    }

    #[test]
    fn test_coercions() {
        assert_eq!(coerce_declared(UTF_16LE), UTF_8);
        assert_eq!(coerce_declared(UTF_16BE), UTF_8);
        assert_eq!(coerce_declared(X_USER_DEFINED), WINDOWS_1252);
        assert_eq!(coerce_declared(WINDOWS_1252), WINDOWS_1252);
    }

    #[test]
    fn test_ascii_superset() {
        assert!(is_ascii_superset(UTF_8));
        assert!(is_ascii_superset(WINDOWS_1252));
        assert!(!is_ascii_superset(UTF_16LE));
    }

    #[test]
    fn test_preferred_label() {
        assert!(is_preferred_label("utf-8", UTF_8));
        assert!(!is_preferred_label("utf8", UTF_8));
        assert!(!is_preferred_label("latin1", WINDOWS_1252));
    }

    #[test]
    fn test_resolve_declared_label_reports_alias_and_coercion() {
        let log = weft_common::DiagnosticLog::new();
        let reporter = Reporter::new(log.boxed());

        let encoding = resolve_declared_label("utf-16", &reporter, Stage::Encoding, Position::START);
        assert_eq!(encoding, Some(UTF_8));
        assert!(log.contains("Using “UTF-8” instead"));

        assert_eq!(
            resolve_declared_label("bogus", &reporter, Stage::Encoding, Position::START),
            None
        );
        assert!(log.contains("Unsupported character encoding name: “bogus”"));
    }
}

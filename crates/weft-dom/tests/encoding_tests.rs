//! Encoding resolution and the restart protocol, seen from a finished tree.

use encoding_rs::{KOI8_R, UTF_8, UTF_16LE, WINDOWS_1252};
use weft_common::{Severity, Stage};
use weft_dom::{Parsed, parse_document, parse_document_with_encoding};
use weft_html::{Confidence, ParseError, ParserOptions};

fn parse(bytes: &[u8]) -> Parsed {
    parse_document(bytes, ParserOptions::default()).unwrap()
}

fn body_text(parsed: &Parsed) -> String {
    let body = parsed.tree.body().unwrap();
    parsed.tree.text_content(body)
}

fn encoding_errors(parsed: &Parsed) -> usize {
    parsed
        .diagnostics
        .entries()
        .iter()
        .filter(|d| d.stage == Stage::Encoding && d.severity == Severity::Error)
        .count()
}

#[test]
fn test_bom_beats_meta() {
    let parsed = parse(b"\xEF\xBB\xBF<meta charset=\"windows-1252\"><p>\xC3\xA9");

    assert_eq!(parsed.encoding, UTF_8);
    assert_eq!(parsed.confidence, Confidence::Certain);
    assert_eq!(parsed.restarts, 0);
    // The byte order mark is not content.
    assert_eq!(body_text(&parsed), "\u{e9}");
    assert!(parsed.diagnostics.contains("disagrees with the actual encoding"));
}

#[test]
fn test_prescan_meta_confirmed_without_restart() {
    let parsed = parse(b"<meta charset=\"koi8-r\"><p>\xC1");

    assert_eq!(parsed.encoding, KOI8_R);
    assert_eq!(parsed.restarts, 0);
    // The tree builder saw the same declaration, so it is now certain.
    assert_eq!(parsed.confidence, Confidence::Certain);
    assert_eq!(body_text(&parsed), "\u{430}");
}

#[test]
fn test_late_declaration_restarts_once() {
    // The prescan does not decode character references, so only the tree
    // builder can read this label.
    let parsed = parse(b"<meta charset=\"koi8&#x2D;r\"><p>\xC1");

    assert_eq!(parsed.restarts, 1);
    assert_eq!(parsed.encoding, KOI8_R);
    assert_eq!(parsed.confidence, Confidence::Certain);
    assert_eq!(body_text(&parsed), "\u{430}");
    assert!(parsed.diagnostics.contains("Changing character encoding “koi8-r” and reparsing."));
    // The tree from the first pass is gone.
    assert_eq!(parsed.tree.children(parsed.tree.document_element().unwrap()).len(), 2);
}

#[test]
fn test_declaration_past_the_window_is_fatal() {
    let mut input = b"<!--".to_vec();
    input.extend(std::iter::repeat_n(b'x', 600));
    input.extend_from_slice(b"--><meta charset=\"koi8&#x2D;r\"><p>\xC1");

    let result = parse_document(&input, ParserOptions::default());
    assert!(matches!(result, Err(ParseError::Encoding(_))));
}

#[test]
fn test_restart_needs_rewinding() {
    let options = ParserOptions {
        allow_rewinding: false,
        ..ParserOptions::default()
    };
    let result = parse_document(b"<meta charset=\"koi8&#x2D;r\"><p>\xC1", options);
    assert!(matches!(result, Err(ParseError::Encoding(_))));
}

#[test]
fn test_external_declaration_takes_precedence() {
    let parsed = parse_document_with_encoding(
        b"<meta charset=\"koi8-r\"><p>\xC1",
        "windows-1252",
        ParserOptions::default(),
    )
    .unwrap();

    assert_eq!(parsed.encoding, WINDOWS_1252);
    assert_eq!(parsed.confidence, Confidence::Certain);
    assert_eq!(body_text(&parsed), "\u{c1}");
    assert!(parsed.diagnostics.contains("The external declaration takes precedence."));
}

#[test]
fn test_unsupported_external_label_is_ignored() {
    let parsed = parse_document_with_encoding(
        b"<meta charset=\"koi8-r\"><p>\xC1",
        "no-such-encoding",
        ParserOptions::default(),
    )
    .unwrap();

    assert_eq!(parsed.encoding, KOI8_R);
    assert!(parsed.diagnostics.contains("Unsupported character encoding name"));
}

#[test]
fn test_malformed_bytes_are_replaced_one_by_one() {
    let parsed = parse_document_with_encoding(
        b"<!DOCTYPE html><p>a\xFFb\xFFc",
        "utf-8",
        ParserOptions::default(),
    )
    .unwrap();

    assert_eq!(body_text(&parsed), "a\u{FFFD}b\u{FFFD}c");
    assert_eq!(encoding_errors(&parsed), 2);
}

#[test]
fn test_undeclared_non_ascii_is_an_error() {
    let parsed = parse(b"<!DOCTYPE html><p>\xE9");

    assert_eq!(parsed.encoding, WINDOWS_1252);
    assert_eq!(parsed.confidence, Confidence::Tentative);
    assert_eq!(body_text(&parsed), "\u{e9}");
    let errors = parsed.diagnostics.messages(Severity::Error);
    assert!(
        errors
            .iter()
            .any(|m| m.contains("was not declared. Proceeding using “windows-1252”"))
    );
}

#[test]
fn test_undeclared_ascii_is_only_a_warning() {
    let parsed = parse(b"<!DOCTYPE html><p>plain");
    let warnings = parsed.diagnostics.messages(Severity::Warning);
    assert!(warnings.iter().any(|m| m.contains("was not declared")));
    assert!(parsed.diagnostics.messages(Severity::Error).is_empty());
}

#[test]
fn test_utf16_bom() {
    let mut input = vec![0xFF, 0xFE];
    for unit in "<p>x".encode_utf16() {
        input.extend_from_slice(&unit.to_le_bytes());
    }
    let parsed = parse(&input);

    assert_eq!(parsed.encoding, UTF_16LE);
    assert_eq!(body_text(&parsed), "x");
}

#[test]
fn test_utf16_meta_does_not_restart() {
    let parsed = parse(b"<meta charset=\"utf-16\"><p>x");

    assert_eq!(parsed.encoding, UTF_8);
    assert_eq!(parsed.restarts, 0);
    assert_eq!(parsed.confidence, Confidence::Certain);
}

#[test]
fn test_late_utf16_declaration_reparses_as_utf8() {
    let parsed = parse(b"<meta charset=\"utf&#x2D;16\"><p>\xC3\xA9");

    assert_eq!(parsed.encoding, UTF_8);
    assert_eq!(parsed.restarts, 1);
    assert_eq!(parsed.confidence, Confidence::Certain);
    assert_eq!(body_text(&parsed), "\u{e9}");
    assert!(parsed.diagnostics.contains(
        "Internal encoding declaration specified “utf-16” which is not an ASCII superset. Continuing as if the encoding had been “utf-8”."
    ));
    assert!(parsed.diagnostics.contains("Changing character encoding “utf-16” and reparsing."));
}

#[test]
fn test_late_declaration_of_the_current_encoding_confirms_it() {
    // x-user-defined is read as windows-1252, the fallback in use.
    let parsed = parse(b"<meta charset=\"x-user&#x2D;defined\"><p>\xE9");

    assert_eq!(parsed.encoding, WINDOWS_1252);
    assert_eq!(parsed.restarts, 0);
    assert_eq!(parsed.confidence, Confidence::Certain);
    assert_eq!(body_text(&parsed), "\u{e9}");
}

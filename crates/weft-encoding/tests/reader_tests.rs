//! Tests for the rewindable streaming reader.

use std::io::{self, Read};

use encoding_rs::{KOI8_R, UTF_8, WINDOWS_1252};
use quickcheck_macros::quickcheck;
use weft_common::{DiagnosticLog, Reporter, Severity};
use weft_encoding::{
    Confidence, EncodingError, EncodingSource, ResolverOptions, SNIFFING_LIMIT, StreamingReader,
};

fn read_all<R: Read>(reader: &mut StreamingReader<R>) -> String {
    let mut out = String::new();
    while reader.read(&mut out).expect("in-memory reads do not fail") {}
    out
}

fn reader_for(bytes: &[u8]) -> StreamingReader<&[u8]> {
    StreamingReader::new(bytes, ResolverOptions::default(), Reporter::silent())
        .expect("in-memory reads do not fail")
}

/// Hands out one byte per call, with an interruption before each.
struct Trickle<'a> {
    bytes: &'a [u8],
    interrupt: bool,
}

impl Read for Trickle<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.interrupt = !self.interrupt;
        if self.interrupt {
            return Err(io::Error::from(io::ErrorKind::Interrupted));
        }
        match self.bytes.split_first() {
            Some((&b, rest)) if !buf.is_empty() => {
                buf[0] = b;
                self.bytes = rest;
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}

struct Broken;

impl Read for Broken {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::other("disk on fire"))
    }
}

#[test]
fn test_small_document() {
    let mut reader = reader_for(b"<p>hello</p>");
    assert_eq!(reader.encoding(), WINDOWS_1252);
    assert_eq!(reader.confidence(), Confidence::Tentative);
    assert_eq!(read_all(&mut reader), "<p>hello</p>");
    assert!(!reader.boundary_passed());
    assert!(!reader.seen_non_ascii());
}

#[test]
fn test_meta_prescan_picks_encoding() {
    let mut reader = reader_for(b"<meta charset=koi8-r><p>\xC1");
    assert_eq!(reader.encoding(), KOI8_R);
    assert_eq!(reader.resolution().source, EncodingSource::Prescan);
    assert_eq!(read_all(&mut reader), "<meta charset=koi8-r><p>а");
    assert!(reader.seen_non_ascii());
}

#[test]
fn test_rewind_within_window() {
    let mut reader = reader_for(b"<p>\xC1</p>");
    assert_eq!(read_all(&mut reader), "<p>Á</p>");
    assert!(reader.can_rewind());

    reader.rewind(KOI8_R).expect("still inside the window");
    assert_eq!(reader.encoding(), KOI8_R);
    assert_eq!(reader.confidence(), Confidence::Certain);
    assert_eq!(reader.resolution().source, EncodingSource::InDocument);
    assert_eq!(read_all(&mut reader), "<p>а</p>");

    // Only one restart.
    assert!(matches!(
        reader.rewind(UTF_8),
        Err(EncodingError::RewindUnavailable)
    ));
}

#[test]
fn test_rewind_after_boundary_fails() {
    let mut bytes = b"<p>".to_vec();
    bytes.resize(SNIFFING_LIMIT * 3, b'x');
    let mut reader = reader_for(&bytes);

    let mut out = String::new();
    assert!(reader.read(&mut out).unwrap());
    assert_eq!(out.len(), SNIFFING_LIMIT);
    assert!(!reader.boundary_passed());
    assert!(reader.read(&mut out).unwrap());
    assert!(reader.boundary_passed());
    assert!(!reader.can_rewind());

    assert!(matches!(
        reader.rewind(UTF_8),
        Err(EncodingError::RewindPastBoundary { limit: SNIFFING_LIMIT })
    ));
}

#[test]
fn test_document_of_exactly_the_window_does_not_pass_boundary() {
    let bytes = vec![b'a'; SNIFFING_LIMIT];
    let mut reader = reader_for(&bytes);
    assert_eq!(read_all(&mut reader).len(), SNIFFING_LIMIT);
    assert!(!reader.boundary_passed());
}

#[test]
fn test_fixed_encoding_never_rewinds() {
    let mut reader =
        StreamingReader::with_encoding(&b"<meta charset=koi8-r>"[..], UTF_8, Reporter::silent())
            .unwrap();
    assert_eq!(reader.encoding(), UTF_8);
    assert_eq!(reader.confidence(), Confidence::Certain);
    assert!(matches!(
        reader.rewind(KOI8_R),
        Err(EncodingError::RewindUnavailable)
    ));
}

#[test]
fn test_will_not_rewind() {
    let mut reader = reader_for(b"<p>x");
    reader.will_not_rewind();
    assert_eq!(reader.confidence(), Confidence::Certain);
    assert!(reader.rewind(KOI8_R).is_err());
}

#[test]
fn test_malformed_bytes_reported_with_position() {
    let log = DiagnosticLog::new();
    let options = ResolverOptions {
        external: Some(UTF_8),
        ..ResolverOptions::default()
    };
    let mut reader =
        StreamingReader::new(&b"ab\r\ncd\xFFe\n\xC3"[..], options, Reporter::new(log.boxed()))
            .unwrap();
    assert_eq!(read_all(&mut reader), "ab\r\ncd\u{FFFD}e\n\u{FFFD}");

    let entries = log.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].severity, Severity::Error);
    assert_eq!(entries[0].message, "Malformed byte sequence: “ff”.");
    assert_eq!(entries[0].position.to_string(), "2:3");
    // The truncated sequence surfaces only at the final flush.
    assert_eq!(entries[1].position.to_string(), "3:1");
}

#[test]
fn test_trickling_source() {
    let text = "<title>naïve</title>".repeat(60);
    let options = ResolverOptions {
        external: Some(UTF_8),
        ..ResolverOptions::default()
    };
    let source = Trickle {
        bytes: text.as_bytes(),
        interrupt: false,
    };
    let mut reader = StreamingReader::new(source, options, Reporter::silent()).unwrap();
    assert_eq!(read_all(&mut reader), text);
}

#[test]
fn test_io_errors_propagate() {
    let result = StreamingReader::new(Broken, ResolverOptions::default(), Reporter::silent());
    assert!(matches!(result, Err(EncodingError::Io(_))));
}

#[quickcheck]
fn prop_reader_matches_one_shot_decode(bytes: Vec<u8>) -> bool {
    let mut reader = reader_for(&bytes);
    let expected = reader
        .encoding()
        .decode_without_bom_handling(&bytes)
        .0
        .into_owned();
    read_all(&mut reader) == expected
}

//! Tests for the diagnostics reporter and the collecting sink.

use std::cell::RefCell;
use std::rc::Rc;

use weft_common::{Diagnostic, DiagnosticLog, Position, Reporter, Severity, Stage};

#[test]
fn test_silent_reporter_counts_without_sink() {
    let reporter = Reporter::silent();
    reporter.error(Stage::Tokenizer, "unexpected-null-character", Position::new(1, 4));
    reporter.warning(Stage::Encoding, "legacy encoding", Position::UNKNOWN);
    reporter.error(Stage::TreeBuilder, "stray end tag", Position::new(2, 1));

    assert!(!reporter.has_sink());
    assert_eq!(reporter.error_count(), 2);
    assert_eq!(reporter.warning_count(), 1);
}

#[test]
fn test_clones_share_sink_and_counters() {
    let log = DiagnosticLog::new();
    let reporter = Reporter::new(log.boxed());
    let clone = reporter.clone();

    reporter.error(Stage::Tokenizer, "first", Position::START);
    clone.warning(Stage::Driver, "second", Position::UNKNOWN);

    assert_eq!(log.len(), 2);
    assert_eq!(reporter.error_count(), 1);
    assert_eq!(clone.warning_count(), 1);

    let entries = log.entries();
    assert_eq!(entries[0].message, "first");
    assert_eq!(entries[0].severity, Severity::Error);
    assert_eq!(entries[1].stage, Stage::Driver);
}

#[test]
fn test_fatal_counts_as_error() {
    let log = DiagnosticLog::new();
    let reporter = Reporter::new(log.boxed());
    reporter.fatal(Stage::Driver, "cannot rewind", Position::UNKNOWN);

    assert_eq!(reporter.error_count(), 1);
    assert_eq!(log.messages(Severity::Fatal), vec!["cannot rewind".to_string()]);
}

#[test]
fn test_closure_sink() {
    let seen: Rc<RefCell<Vec<String>>> = Rc::default();
    let seen_in_sink = Rc::clone(&seen);
    let reporter = Reporter::new(Box::new(move |d: &Diagnostic| {
        seen_in_sink.borrow_mut().push(d.to_string());
    }));

    reporter.error(Stage::Tokenizer, "eof-in-tag", Position::new(3, 7));

    assert_eq!(
        seen.borrow().as_slice(),
        ["[tokenizer] error 3:7: eof-in-tag".to_string()]
    );
}

#[test]
fn test_set_sink_keeps_counters() {
    let reporter = Reporter::silent();
    reporter.error(Stage::Tokenizer, "dropped", Position::START);

    let log = DiagnosticLog::new();
    reporter.set_sink(log.boxed());
    reporter.error(Stage::Tokenizer, "kept", Position::START);

    assert_eq!(reporter.error_count(), 2);
    assert!(log.contains("kept"));
    assert!(!log.contains("dropped"));
}

#[test]
fn test_position_display() {
    assert_eq!(Position::new(12, 3).to_string(), "12:3");
    assert_eq!(Position::UNKNOWN.to_string(), "-");
    assert!(!Position::UNKNOWN.is_known());
}

#[test]
fn test_severity_round_trips_through_strings() {
    assert_eq!(Severity::Fatal.to_string(), "fatal");
    assert_eq!("warning".parse::<Severity>().ok(), Some(Severity::Warning));
    assert_eq!(Stage::TreeBuilder.to_string(), "tree-builder");
}

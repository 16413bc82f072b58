//! Parse diagnostics.
//!
//! Every standard-defined parse error and every encoding anomaly is reported as a
//! [`Diagnostic`]. The reader, tokenizer and tree constructor share one
//! [`Reporter`] per parse; the embedder decides where the records go by
//! installing a [`DiagnosticSink`]. Without a sink, non-fatal diagnostics are
//! counted and dropped.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use owo_colors::OwoColorize;
use strum_macros::{Display, EnumString};

/// How bad a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    /// Something suspicious that is still conforming, or a note about the
    /// encoding that was picked.
    Warning,
    /// A parse error. Parsing recovers and continues.
    Error,
    /// The parse cannot continue. Reported right before the failure is
    /// returned to the embedder.
    Fatal,
}

/// The pipeline stage that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Stage {
    /// Encoding sniffing and byte decoding.
    Encoding,
    /// The tokenizer state machine.
    Tokenizer,
    /// The tree constructor.
    TreeBuilder,
    /// The driver loop (restarts, end of parse).
    Driver,
}

/// A location in the decoded character stream.
///
/// Lines and columns are 1-based. A line of `0` means "no location", which is
/// used for document-level notices such as the final "encoding was not
/// declared" warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
}

impl Position {
    /// No location.
    pub const UNKNOWN: Self = Self { line: 0, column: 0 };

    /// The first character of a document.
    pub const START: Self = Self { line: 1, column: 1 };

    /// Create a position.
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Returns true if this position points somewhere.
    #[must_use]
    pub const fn is_known(self) -> bool {
        self.line != 0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_known() {
            write!(f, "{}:{}", self.line, self.column)
        } else {
            write!(f, "-")
        }
    }
}

/// One reported problem.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    /// How bad it is.
    pub severity: Severity,
    /// Who reported it.
    pub stage: Stage,
    /// Human-readable description.
    pub message: String,
    /// Where in the decoded input it happened.
    pub position: Position,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}: {}",
            self.stage, self.severity, self.position, self.message
        )
    }
}

/// Receives diagnostics as they are produced.
pub trait DiagnosticSink {
    /// Called once per diagnostic, in the order the parser produced them.
    fn report(&mut self, diagnostic: &Diagnostic);
}

impl<F> DiagnosticSink for F
where
    F: FnMut(&Diagnostic),
{
    fn report(&mut self, diagnostic: &Diagnostic) {
        self(diagnostic);
    }
}

#[derive(Default)]
struct ReporterState {
    sink: Option<Box<dyn DiagnosticSink>>,
    warnings: usize,
    errors: usize,
}

/// Shared handle through which every stage of one parse reports.
///
/// Cloning is cheap and every clone feeds the same sink and counters. The
/// handle is single-threaded, like the parse itself.
#[derive(Clone, Default)]
pub struct Reporter {
    state: Rc<RefCell<ReporterState>>,
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Reporter")
            .field("has_sink", &state.sink.is_some())
            .field("warnings", &state.warnings)
            .field("errors", &state.errors)
            .finish()
    }
}

impl Reporter {
    /// A reporter that forwards to `sink`.
    #[must_use]
    pub fn new(sink: Box<dyn DiagnosticSink>) -> Self {
        Self {
            state: Rc::new(RefCell::new(ReporterState {
                sink: Some(sink),
                warnings: 0,
                errors: 0,
            })),
        }
    }

    /// A reporter without a sink. Diagnostics are counted, then dropped.
    #[must_use]
    pub fn silent() -> Self {
        Self::default()
    }

    /// Install or replace the sink. Counters are kept.
    pub fn set_sink(&self, sink: Box<dyn DiagnosticSink>) {
        self.state.borrow_mut().sink = Some(sink);
    }

    /// Returns true if a sink is installed.
    #[must_use]
    pub fn has_sink(&self) -> bool {
        self.state.borrow().sink.is_some()
    }

    /// Report a diagnostic.
    pub fn report(&self, severity: Severity, stage: Stage, message: impl Into<String>, position: Position) {
        let mut state = self.state.borrow_mut();
        match severity {
            Severity::Warning => state.warnings += 1,
            Severity::Error | Severity::Fatal => state.errors += 1,
        }
        if let Some(sink) = state.sink.as_mut() {
            let diagnostic = Diagnostic {
                severity,
                stage,
                message: message.into(),
                position,
            };
            sink.report(&diagnostic);
        }
    }

    /// Report a warning.
    pub fn warning(&self, stage: Stage, message: impl Into<String>, position: Position) {
        self.report(Severity::Warning, stage, message, position);
    }

    /// Report a recoverable error.
    pub fn error(&self, stage: Stage, message: impl Into<String>, position: Position) {
        self.report(Severity::Error, stage, message, position);
    }

    /// Report a fatal error. The caller is still responsible for stopping.
    pub fn fatal(&self, stage: Stage, message: impl Into<String>, position: Position) {
        self.report(Severity::Fatal, stage, message, position);
    }

    /// Number of warnings reported so far.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.state.borrow().warnings
    }

    /// Number of errors (fatal included) reported so far.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.state.borrow().errors
    }
}

/// A sink that stores every diagnostic.
///
/// Clones share storage, so a test can keep one clone and hand the other to
/// the parser.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticLog {
    entries: Rc<RefCell<Vec<Diagnostic>>>,
}

impl DiagnosticLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far.
    #[must_use]
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.borrow().clone()
    }

    /// Number of recorded diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Messages of the recorded diagnostics with the given severity.
    #[must_use]
    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|d| d.severity == severity)
            .map(|d| d.message.clone())
            .collect()
    }

    /// Returns true if any recorded message contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|d| d.message.contains(needle))
    }

    /// Box a clone of this log for [`Reporter::new`].
    #[must_use]
    pub fn boxed(&self) -> Box<dyn DiagnosticSink> {
        Box::new(self.clone())
    }
}

impl DiagnosticSink for DiagnosticLog {
    fn report(&mut self, diagnostic: &Diagnostic) {
        self.entries.borrow_mut().push(diagnostic.clone());
    }
}

/// Writes diagnostics to stderr with colors.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink {
    /// Drop warnings, keep errors.
    pub errors_only: bool,
}

impl DiagnosticSink for ConsoleSink {
    fn report(&mut self, diagnostic: &Diagnostic) {
        let line = format!(
            "[weft {}] {} {}: {}",
            diagnostic.stage, diagnostic.severity, diagnostic.position, diagnostic.message
        );
        match diagnostic.severity {
            Severity::Warning if self.errors_only => {}
            Severity::Warning => eprintln!("{}", line.yellow()),
            Severity::Error => eprintln!("{}", line.red()),
            Severity::Fatal => eprintln!("{}", line.red().bold()),
        }
    }
}

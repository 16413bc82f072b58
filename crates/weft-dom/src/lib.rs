//! An in-memory tree for the weft HTML parser.
//!
//! # Scope
//!
//! - [`DomTree`]: arena-allocated nodes following the
//!   [DOM Living Standard](https://dom.spec.whatwg.org/) node kinds the
//!   parser produces, implementing [`weft_html::TreeSink`]
//! - [`dump`]: the html5lib tree-construction test format
//! - [`parse_document`] and [`parse_fragment`]: bytes to tree in one call,
//!   with every diagnostic recorded
//!
//! ```
//! use weft_html::ParserOptions;
//!
//! let parsed = weft_dom::parse_document(b"<!DOCTYPE html><p>Hi", ParserOptions::default()).unwrap();
//! let body = parsed.tree.body().unwrap();
//! assert_eq!(parsed.tree.text_content(body), "Hi");
//! ```

/// The html5lib test format.
pub mod dump;
/// [`weft_html::TreeSink`] implementation.
mod sink;
/// The arena tree.
pub mod tree;

use encoding_rs::Encoding;
use weft_common::DiagnosticLog;
use weft_html::{
    Confidence, Driver, FragmentContext, ParseError, ParseOutcome, ParserOptions, QualName,
};

pub use dump::{dump, dump_fragment};
pub use tree::{DoctypeData, DomTree, ElementData, Node, NodeId, NodeKind};

/// A finished parse.
#[derive(Debug)]
pub struct Parsed {
    /// The tree.
    pub tree: DomTree,
    /// Every diagnostic, restarts included.
    pub diagnostics: DiagnosticLog,
    /// The encoding the final pass decoded with.
    pub encoding: &'static Encoding,
    /// Whether that encoding was certain at the end.
    pub confidence: Confidence,
    /// How many times a `<meta>` made the parse start over.
    pub restarts: u32,
}

impl Parsed {
    fn from_outcome(outcome: ParseOutcome<DomTree>, diagnostics: DiagnosticLog) -> Self {
        Self {
            tree: outcome.sink,
            diagnostics,
            encoding: outcome.encoding,
            confidence: outcome.confidence,
            restarts: outcome.restarts,
        }
    }

    /// The tree in html5lib test format.
    #[must_use]
    pub fn dump(&self) -> String {
        dump(&self.tree)
    }

    /// The children of the fragment root in html5lib test format.
    #[must_use]
    pub fn dump_fragment(&self) -> String {
        dump_fragment(&self.tree)
    }
}

fn run<'a>(mut driver: Driver<DomTree, &'a [u8]>, bytes: &'a [u8]) -> Result<Parsed, ParseError> {
    let log = DiagnosticLog::new();
    driver = driver.with_diagnostics(log.boxed());
    driver.feed(bytes)?;
    driver.run()?;
    Ok(Parsed::from_outcome(driver.into_outcome()?, log))
}

/// Parse a document.
///
/// # Errors
///
/// Only the fatal conditions of [`ParseError`]. Malformed markup and bytes
/// are recovered from and recorded in [`Parsed::diagnostics`].
pub fn parse_document(bytes: &[u8], options: ParserOptions) -> Result<Parsed, ParseError> {
    run(Driver::new(DomTree::new(), options), bytes)
}

/// Parse a document whose encoding was declared outside it, as by a
/// `Content-Type` header.
///
/// # Errors
///
/// See [`parse_document`].
pub fn parse_document_with_encoding(
    bytes: &[u8],
    label: &str,
    options: ParserOptions,
) -> Result<Parsed, ParseError> {
    run(
        Driver::new(DomTree::new(), options).with_external_encoding(label),
        bytes,
    )
}

/// Parse `bytes` as the contents of an HTML element named `context`.
///
/// # Errors
///
/// See [`parse_document`].
pub fn parse_fragment(
    bytes: &[u8],
    context: &str,
    options: ParserOptions,
) -> Result<Parsed, ParseError> {
    let context = FragmentContext::new(QualName::html(context));
    run(
        Driver::new(DomTree::new(), options).for_fragment(context),
        bytes,
    )
}

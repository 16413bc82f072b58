//! The weft HTML parser.
//!
//! # Scope
//!
//! This crate implements:
//! - **Tokenizer** ([WHATWG § 13.2.5](https://html.spec.whatwg.org/multipage/parsing.html#tokenization))
//!   - Every tokenizer state, resumable at any character
//!   - Named and numeric character references
//!   - Line/column positions on every diagnostic
//!
//! - **Tree Builder** ([WHATWG § 13.2.6](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction))
//!   - All insertion modes, foreign content and templates
//!   - Adoption agency, foster parenting and formatting reconstruction
//!   - Fragment parsing and the form element pointer
//!
//! - **Driver** ([WHATWG § 13.2.3](https://html.spec.whatwg.org/multipage/parsing.html#the-input-byte-stream))
//!   - Encoding resolution through `weft-encoding`
//!   - Restarting when a `<meta>` changes a tentative encoding
//!   - Suspension requested by the output sink
//!
//! The tree itself is built through the [`TreeSink`] trait.

/// Decoded text handed to the tokenizer.
pub mod buffer;
/// Parser options.
pub mod config;
/// Byte source to finished tree.
pub mod driver;
/// Fatal errors.
pub mod error;
/// Namespaces and qualified names.
pub mod names;
/// Tree construction.
pub mod parser;
/// The tokenizer state machine.
pub mod tokenizer;

pub use buffer::DecodeBuffer;
pub use config::{ParserOptions, XmlViolationPolicy};
pub use driver::{Driver, ParseOutcome, Step, parse_document, parse_fragment};
pub use error::{ParseError, SinkError};
pub use names::{Namespace, QualName};
pub use parser::{
    DocumentMode, Flow, FragmentContext, InsertionMode, SinkResult, TreeBuilder, TreeSink,
};
pub use tokenizer::{Attribute, Doctype, Tag, Token, TokenSink, Tokenizer, TokenizerState};
pub use weft_encoding::{Confidence, Heuristics};

//! HTML tokenizer module.
//!
//! Implements [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
//! of the WHATWG HTML Living Standard as a resumable state machine that
//! pushes tokens into a [`TokenSink`].

/// Character reference parsing per § 13.2.5.72.
mod character_reference;
/// Helper methods for state transitions and token emission.
mod helpers;
/// Comment, DOCTYPE and CDATA states.
mod markup;
/// Named character reference lookup table per § 13.5.
pub mod named_character_references;
/// Script data states.
mod script;
/// Token types produced by the tokenizer.
pub mod token;
/// HTML tokenizer state machine implementation.
pub mod core;

pub use self::core::{Tokenizer, TokenizerOptions, TokenizerResult, TokenizerState};
pub use token::{Attribute, Doctype, Tag, Token, TokenSink, TokenSinkResult};

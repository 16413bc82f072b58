//! Tokens and the interface through which the tokenizer hands them on.
//!
//! [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
//!
//! "The output of the tokenization step is a series of zero or more of the
//! following tokens: DOCTYPE, start tag, end tag, comment, character,
//! end-of-file."

use weft_common::Position;

use super::core::TokenizerState;
use crate::error::ParseError;
use crate::names::Namespace;

/// An attribute on a start tag.
///
/// Per [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization):
/// "a list of attributes, each of which has a name and a value"
///
/// The tokenizer always produces attributes in no namespace. The tree builder
/// moves `xlink:href` and friends into their namespaces on foreign elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute {
    /// Namespace, after foreign attribute adjustment.
    pub namespace: Namespace,
    /// Prefix, after foreign attribute adjustment (`xlink`, `xml`, `xmlns`).
    pub prefix: Option<String>,
    /// "each of which has a name"
    pub name: String,
    /// "and a value"
    pub value: String,
}

impl Attribute {
    /// An attribute in no namespace.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            namespace: Namespace::None,
            prefix: None,
            name: name.into(),
            value: value.into(),
        }
    }

    /// The qualified name as written: `prefix:name`, or just `name`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// "Start and end tag tokens have a tag name, a self-closing flag, and a list
/// of attributes."
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tag {
    /// "a tag name", lowercased.
    pub name: String,
    /// "a self-closing flag"
    pub self_closing: bool,
    /// "a list of attributes", first occurrence of each name only.
    pub attributes: Vec<Attribute>,
}

impl Tag {
    /// A tag with no attributes.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// The value of the attribute `name`, if present.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name && a.namespace == Namespace::None)
            .map(|a| a.value.as_str())
    }
}

/// "DOCTYPE tokens have a name, a public identifier, a system identifier, and
/// a force-quirks flag. When a DOCTYPE token is created, its name, public
/// identifier, and system identifier must be marked as missing (which is a
/// distinct state from the empty string)."
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Doctype {
    /// "a name"
    pub name: Option<String>,
    /// "a public identifier"
    pub public_id: Option<String>,
    /// "a system identifier"
    pub system_id: Option<String>,
    /// "a force-quirks flag"
    pub force_quirks: bool,
}

/// A token, as handed to the [`TokenSink`].
///
/// Adjacent character tokens are coalesced into one [`Token::Characters`]
/// run; an empty run is never produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A DOCTYPE.
    Doctype(Doctype),
    /// A start tag.
    StartTag(Tag),
    /// An end tag. Attributes and the self-closing flag are dropped.
    EndTag(Tag),
    /// A run of character tokens.
    Characters(String),
    /// A comment.
    Comment(String),
    /// "Emit an end-of-file token."
    EndOfFile,
}

/// What the consumer of a token wants the tokenizer to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSinkResult {
    /// Keep going.
    Continue,
    /// Switch the tokenizer to another state (RCDATA for `<title>`, and so
    /// on). The tree builder decides these.
    SwitchTo(TokenizerState),
    /// Stop after this token and return control to the embedder.
    Suspend,
    /// Both of the above: the state switch happens before the stop.
    SwitchToAndSuspend(TokenizerState),
    /// The token carried an in-document encoding declaration naming this
    /// label. The driver decides whether to restart.
    EncodingIndicator(String),
}

/// The consumer of tokens. The tree builder implements it.
pub trait TokenSink {
    /// Handle one token. `position` is where the tokenizer was when the token
    /// was completed.
    ///
    /// # Errors
    ///
    /// Any error is fatal and ends the parse.
    fn process_token(
        &mut self,
        token: Token,
        position: Position,
    ) -> Result<TokenSinkResult, ParseError>;

    /// [§ 13.2.5.42 Markup declaration open state](https://html.spec.whatwg.org/multipage/parsing.html#markup-declaration-open-state)
    ///
    /// "If there is an adjusted current node and it is not an element in the
    /// HTML namespace", `<![CDATA[` opens a CDATA section.
    fn adjusted_current_node_is_foreign(&self) -> bool {
        false
    }

    /// Called once after the end-of-file token.
    ///
    /// # Errors
    ///
    /// Any error is fatal.
    fn end(&mut self) -> Result<(), ParseError> {
        Ok(())
    }
}

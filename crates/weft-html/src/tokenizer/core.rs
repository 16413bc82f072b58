use strum_macros::Display;
use weft_common::{Position, Reporter};

use super::token::{Attribute, Doctype, TokenSink};
use crate::buffer::DecodeBuffer;
use crate::config::XmlViolationPolicy;
use crate::error::ParseError;

/// [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
///
/// The tokenizer state machine. Each state corresponds to a section in § 13.2.5.
///
/// States that the HTML standard describes with lookahead ("if the next few
/// characters are...") are split into sub-states that consume one character
/// at a time, so that the machine can stop at any buffer boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum TokenizerState {
    /// [§ 13.2.5.1 Data state](https://html.spec.whatwg.org/multipage/parsing.html#data-state)
    Data,
    /// [§ 13.2.5.2 RCDATA state](https://html.spec.whatwg.org/multipage/parsing.html#rcdata-state)
    RCDATA,
    /// [§ 13.2.5.3 RAWTEXT state](https://html.spec.whatwg.org/multipage/parsing.html#rawtext-state)
    RAWTEXT,
    /// [§ 13.2.5.4 Script data state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-state)
    ScriptData,
    /// [§ 13.2.5.5 PLAINTEXT state](https://html.spec.whatwg.org/multipage/parsing.html#plaintext-state)
    PLAINTEXT,
    /// [§ 13.2.5.6 Tag open state](https://html.spec.whatwg.org/multipage/parsing.html#tag-open-state)
    TagOpen,
    /// [§ 13.2.5.7 End tag open state](https://html.spec.whatwg.org/multipage/parsing.html#end-tag-open-state)
    EndTagOpen,
    /// [§ 13.2.5.8 Tag name state](https://html.spec.whatwg.org/multipage/parsing.html#tag-name-state)
    TagName,
    /// [§ 13.2.5.9 RCDATA less-than sign state](https://html.spec.whatwg.org/multipage/parsing.html#rcdata-less-than-sign-state)
    RCDATALessThanSign,
    /// [§ 13.2.5.10 RCDATA end tag open state](https://html.spec.whatwg.org/multipage/parsing.html#rcdata-end-tag-open-state)
    RCDATAEndTagOpen,
    /// [§ 13.2.5.11 RCDATA end tag name state](https://html.spec.whatwg.org/multipage/parsing.html#rcdata-end-tag-name-state)
    RCDATAEndTagName,
    /// [§ 13.2.5.12 RAWTEXT less-than sign state](https://html.spec.whatwg.org/multipage/parsing.html#rawtext-less-than-sign-state)
    RAWTEXTLessThanSign,
    /// [§ 13.2.5.13 RAWTEXT end tag open state](https://html.spec.whatwg.org/multipage/parsing.html#rawtext-end-tag-open-state)
    RAWTEXTEndTagOpen,
    /// [§ 13.2.5.14 RAWTEXT end tag name state](https://html.spec.whatwg.org/multipage/parsing.html#rawtext-end-tag-name-state)
    RAWTEXTEndTagName,
    /// [§ 13.2.5.15 Script data less-than sign state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-less-than-sign-state)
    ScriptDataLessThanSign,
    /// [§ 13.2.5.16 Script data end tag open state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-end-tag-open-state)
    ScriptDataEndTagOpen,
    /// [§ 13.2.5.17 Script data end tag name state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-end-tag-name-state)
    ScriptDataEndTagName,
    /// [§ 13.2.5.18 Script data escape start state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-escape-start-state)
    ScriptDataEscapeStart,
    /// [§ 13.2.5.19 Script data escape start dash state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-escape-start-dash-state)
    ScriptDataEscapeStartDash,
    /// [§ 13.2.5.20 Script data escaped state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-escaped-state)
    ScriptDataEscaped,
    /// [§ 13.2.5.21 Script data escaped dash state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-escaped-dash-state)
    ScriptDataEscapedDash,
    /// [§ 13.2.5.22 Script data escaped dash dash state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-escaped-dash-dash-state)
    ScriptDataEscapedDashDash,
    /// [§ 13.2.5.23 Script data escaped less-than sign state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-escaped-less-than-sign-state)
    ScriptDataEscapedLessThanSign,
    /// [§ 13.2.5.24 Script data escaped end tag open state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-escaped-end-tag-open-state)
    ScriptDataEscapedEndTagOpen,
    /// [§ 13.2.5.25 Script data escaped end tag name state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-escaped-end-tag-name-state)
    ScriptDataEscapedEndTagName,
    /// [§ 13.2.5.26 Script data double escape start state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-double-escape-start-state)
    ScriptDataDoubleEscapeStart,
    /// [§ 13.2.5.27 Script data double escaped state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-double-escaped-state)
    ScriptDataDoubleEscaped,
    /// [§ 13.2.5.28 Script data double escaped dash state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-double-escaped-dash-state)
    ScriptDataDoubleEscapedDash,
    /// [§ 13.2.5.29 Script data double escaped dash dash state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-double-escaped-dash-dash-state)
    ScriptDataDoubleEscapedDashDash,
    /// [§ 13.2.5.30 Script data double escaped less-than sign state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-double-escaped-less-than-sign-state)
    ScriptDataDoubleEscapedLessThanSign,
    /// [§ 13.2.5.31 Script data double escape end state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-double-escape-end-state)
    ScriptDataDoubleEscapeEnd,
    /// [§ 13.2.5.32 Before attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#before-attribute-name-state)
    BeforeAttributeName,
    /// [§ 13.2.5.33 Attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-name-state)
    AttributeName,
    /// [§ 13.2.5.34 After attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#after-attribute-name-state)
    AfterAttributeName,
    /// [§ 13.2.5.35 Before attribute value state](https://html.spec.whatwg.org/multipage/parsing.html#before-attribute-value-state)
    BeforeAttributeValue,
    /// [§ 13.2.5.36 Attribute value (double-quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(double-quoted)-state)
    AttributeValueDoubleQuoted,
    /// [§ 13.2.5.37 Attribute value (single-quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(single-quoted)-state)
    AttributeValueSingleQuoted,
    /// [§ 13.2.5.38 Attribute value (unquoted) state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(unquoted)-state)
    AttributeValueUnquoted,
    /// [§ 13.2.5.39 After attribute value (quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#after-attribute-value-(quoted)-state)
    AfterAttributeValueQuoted,
    /// [§ 13.2.5.40 Self-closing start tag state](https://html.spec.whatwg.org/multipage/parsing.html#self-closing-start-tag-state)
    SelfClosingStartTag,
    /// [§ 13.2.5.41 Bogus comment state](https://html.spec.whatwg.org/multipage/parsing.html#bogus-comment-state)
    BogusComment,
    /// [§ 13.2.5.42 Markup declaration open state](https://html.spec.whatwg.org/multipage/parsing.html#markup-declaration-open-state)
    MarkupDeclarationOpen,
    /// Markup declaration open, after `<!-`.
    MarkupDeclarationHyphen,
    /// Markup declaration open, partway through the word `DOCTYPE`.
    MarkupDeclarationDoctype,
    /// Markup declaration open, partway through `[CDATA[`.
    MarkupDeclarationCdata,
    /// [§ 13.2.5.43 Comment start state](https://html.spec.whatwg.org/multipage/parsing.html#comment-start-state)
    CommentStart,
    /// [§ 13.2.5.44 Comment start dash state](https://html.spec.whatwg.org/multipage/parsing.html#comment-start-dash-state)
    CommentStartDash,
    /// [§ 13.2.5.45 Comment state](https://html.spec.whatwg.org/multipage/parsing.html#comment-state)
    Comment,
    /// [§ 13.2.5.46 Comment less-than sign state](https://html.spec.whatwg.org/multipage/parsing.html#comment-less-than-sign-state)
    CommentLessThanSign,
    /// [§ 13.2.5.47 Comment less-than sign bang state](https://html.spec.whatwg.org/multipage/parsing.html#comment-less-than-sign-bang-state)
    CommentLessThanSignBang,
    /// [§ 13.2.5.48 Comment less-than sign bang dash state](https://html.spec.whatwg.org/multipage/parsing.html#comment-less-than-sign-bang-dash-state)
    CommentLessThanSignBangDash,
    /// [§ 13.2.5.49 Comment less-than sign bang dash dash state](https://html.spec.whatwg.org/multipage/parsing.html#comment-less-than-sign-bang-dash-dash-state)
    CommentLessThanSignBangDashDash,
    /// [§ 13.2.5.50 Comment end dash state](https://html.spec.whatwg.org/multipage/parsing.html#comment-end-dash-state)
    CommentEndDash,
    /// [§ 13.2.5.51 Comment end state](https://html.spec.whatwg.org/multipage/parsing.html#comment-end-state)
    CommentEnd,
    /// [§ 13.2.5.52 Comment end bang state](https://html.spec.whatwg.org/multipage/parsing.html#comment-end-bang-state)
    CommentEndBang,
    /// [§ 13.2.5.53 DOCTYPE state](https://html.spec.whatwg.org/multipage/parsing.html#doctype-state)
    DOCTYPE,
    /// [§ 13.2.5.54 Before DOCTYPE name state](https://html.spec.whatwg.org/multipage/parsing.html#before-doctype-name-state)
    BeforeDOCTYPEName,
    /// [§ 13.2.5.55 DOCTYPE name state](https://html.spec.whatwg.org/multipage/parsing.html#doctype-name-state)
    DOCTYPEName,
    /// [§ 13.2.5.56 After DOCTYPE name state](https://html.spec.whatwg.org/multipage/parsing.html#after-doctype-name-state)
    AfterDOCTYPEName,
    /// After DOCTYPE name, partway through `PUBLIC` or `SYSTEM`.
    AfterDOCTYPENameKeyword,
    /// [§ 13.2.5.57 After DOCTYPE public keyword state](https://html.spec.whatwg.org/multipage/parsing.html#after-doctype-public-keyword-state)
    AfterDOCTYPEPublicKeyword,
    /// [§ 13.2.5.58 Before DOCTYPE public identifier state](https://html.spec.whatwg.org/multipage/parsing.html#before-doctype-public-identifier-state)
    BeforeDOCTYPEPublicIdentifier,
    /// [§ 13.2.5.59 DOCTYPE public identifier (double-quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#doctype-public-identifier-(double-quoted)-state)
    DOCTYPEPublicIdentifierDoubleQuoted,
    /// [§ 13.2.5.60 DOCTYPE public identifier (single-quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#doctype-public-identifier-(single-quoted)-state)
    DOCTYPEPublicIdentifierSingleQuoted,
    /// [§ 13.2.5.61 After DOCTYPE public identifier state](https://html.spec.whatwg.org/multipage/parsing.html#after-doctype-public-identifier-state)
    AfterDOCTYPEPublicIdentifier,
    /// [§ 13.2.5.62 Between DOCTYPE public and system identifiers state](https://html.spec.whatwg.org/multipage/parsing.html#between-doctype-public-and-system-identifiers-state)
    BetweenDOCTYPEPublicAndSystemIdentifiers,
    /// [§ 13.2.5.63 After DOCTYPE system keyword state](https://html.spec.whatwg.org/multipage/parsing.html#after-doctype-system-keyword-state)
    AfterDOCTYPESystemKeyword,
    /// [§ 13.2.5.64 Before DOCTYPE system identifier state](https://html.spec.whatwg.org/multipage/parsing.html#before-doctype-system-identifier-state)
    BeforeDOCTYPESystemIdentifier,
    /// [§ 13.2.5.65 DOCTYPE system identifier (double-quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#doctype-system-identifier-(double-quoted)-state)
    DOCTYPESystemIdentifierDoubleQuoted,
    /// [§ 13.2.5.66 DOCTYPE system identifier (single-quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#doctype-system-identifier-(single-quoted)-state)
    DOCTYPESystemIdentifierSingleQuoted,
    /// [§ 13.2.5.67 After DOCTYPE system identifier state](https://html.spec.whatwg.org/multipage/parsing.html#after-doctype-system-identifier-state)
    AfterDOCTYPESystemIdentifier,
    /// [§ 13.2.5.68 Bogus DOCTYPE state](https://html.spec.whatwg.org/multipage/parsing.html#bogus-doctype-state)
    BogusDOCTYPE,
    /// [§ 13.2.5.69 CDATA section state](https://html.spec.whatwg.org/multipage/parsing.html#cdata-section-state)
    CDATASection,
    /// [§ 13.2.5.70 CDATA section bracket state](https://html.spec.whatwg.org/multipage/parsing.html#cdata-section-bracket-state)
    CDATASectionBracket,
    /// [§ 13.2.5.71 CDATA section end state](https://html.spec.whatwg.org/multipage/parsing.html#cdata-section-end-state)
    CDATASectionEnd,
    /// [§ 13.2.5.72 Character reference state](https://html.spec.whatwg.org/multipage/parsing.html#character-reference-state)
    CharacterReference,
    /// [§ 13.2.5.73 Named character reference state](https://html.spec.whatwg.org/multipage/parsing.html#named-character-reference-state)
    NamedCharacterReference,
    /// [§ 13.2.5.74 Ambiguous ampersand state](https://html.spec.whatwg.org/multipage/parsing.html#ambiguous-ampersand-state)
    AmbiguousAmpersand,
    /// [§ 13.2.5.75 Numeric character reference state](https://html.spec.whatwg.org/multipage/parsing.html#numeric-character-reference-state)
    NumericCharacterReference,
    /// [§ 13.2.5.76 Hexadecimal character reference start state](https://html.spec.whatwg.org/multipage/parsing.html#hexadecimal-character-reference-start-state)
    HexadecimalCharacterReferenceStart,
    /// [§ 13.2.5.77 Decimal character reference start state](https://html.spec.whatwg.org/multipage/parsing.html#decimal-character-reference-start-state)
    DecimalCharacterReferenceStart,
    /// [§ 13.2.5.78 Hexadecimal character reference state](https://html.spec.whatwg.org/multipage/parsing.html#hexadecimal-character-reference-state)
    HexadecimalCharacterReference,
    /// [§ 13.2.5.79 Decimal character reference state](https://html.spec.whatwg.org/multipage/parsing.html#decimal-character-reference-state)
    DecimalCharacterReference,
    /// [§ 13.2.5.80 Numeric character reference end state](https://html.spec.whatwg.org/multipage/parsing.html#numeric-character-reference-end-state)
    NumericCharacterReferenceEnd,
}

/// How a call into the tokenizer ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizerResult {
    /// The buffer was consumed (or, from [`Tokenizer::eof`], the end-of-file
    /// token was emitted).
    Done,
    /// The sink asked for a pause. Call again with the same buffer to resume.
    Suspended,
    /// A `<meta>` declared this encoding label. Call again to carry on with
    /// the current encoding, or drop the tokenizer and restart.
    EncodingChange(String),
}

/// Tokenizer settings fixed at construction.
#[derive(Debug, Clone)]
pub struct TokenizerOptions {
    /// Handling of XML-incompatible characters, comments and names.
    pub xml_violation_policy: XmlViolationPolicy,
    /// The state to start in. Fragment parsing picks it from the context
    /// element.
    pub initial_state: TokenizerState,
    /// "The last start tag token emitted". Fragment parsing seeds it with
    /// the context element's name.
    pub last_start_tag: Option<String>,
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        Self {
            xml_violation_policy: XmlViolationPolicy::Allow,
            initial_state: TokenizerState::Data,
            last_start_tag: None,
        }
    }
}

/// Which kind of tag token is being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum TagKind {
    Start,
    End,
}

/// Progress through a named character reference.
#[derive(Debug, Clone, Default)]
pub(super) struct NamedReferenceMatch {
    /// Index range into the reference table of names that still match.
    pub(super) lo: usize,
    pub(super) hi: usize,
    /// The characters consumed after the `&`.
    pub(super) name: String,
    /// Length of the longest complete match so far, and its replacement.
    pub(super) best: Option<(usize, &'static str)>,
}

/// [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
///
/// "Implementations must act as if they used the following state machine to
/// tokenize HTML."
///
/// The tokenizer owns its [`TokenSink`] and pushes each token into it as soon
/// as the token is complete. All of its state lives in fields, so feeding can
/// stop at any character and pick up again with the next buffer.
#[allow(clippy::struct_excessive_bools)]
pub struct Tokenizer<S> {
    pub(super) sink: S,
    pub(super) reporter: Reporter,
    pub(super) xml_policy: XmlViolationPolicy,

    pub(super) state: TokenizerState,
    pub(super) return_state: TokenizerState,
    pub(super) current_input_character: Option<char>,
    // "Reconsume in the X state" sets this flag; the next iteration of the
    // main loop reuses current_input_character.
    pub(super) reconsume: bool,

    pub(super) tag_kind: TagKind,
    pub(super) tag_name: String,
    pub(super) self_closing: bool,
    pub(super) attributes: Vec<Attribute>,
    pub(super) attribute_name: String,
    pub(super) attribute_value: String,
    pub(super) in_attribute: bool,
    pub(super) comment: String,
    pub(super) doctype: Doctype,

    /// [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#temporary-buffer)
    pub(super) temporary_buffer: String,
    /// [§ 13.2.5.72](https://html.spec.whatwg.org/multipage/parsing.html#character-reference-code)
    /// "the character reference code"
    pub(super) character_reference_code: u32,
    pub(super) named_reference: NamedReferenceMatch,

    /// "The last start tag token emitted is used as part of the tree
    /// construction stage and in the RCDATA, RAWTEXT, and script data states."
    pub(super) last_start_tag_name: Option<String>,

    /// Character tokens waiting to be handed over as one run.
    pub(super) pending_characters: String,
    /// A suspension or encoding change requested while handling a token.
    pub(super) pending_result: Option<TokenizerResult>,
    pub(super) eof_emitted: bool,
    pub(super) meta_boundary_passed: bool,

    pub(super) line: u32,
    pub(super) column: u32,
}

impl<S> std::fmt::Debug for Tokenizer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tokenizer")
            .field("state", &self.state)
            .field("position", &self.position())
            .field("eof_emitted", &self.eof_emitted)
            .finish_non_exhaustive()
    }
}

impl<S> Tokenizer<S> {
    /// The position of the current input character.
    #[must_use]
    pub const fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// The current state.
    #[must_use]
    pub const fn state(&self) -> TokenizerState {
        self.state
    }

    /// The token sink.
    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// The token sink, mutably.
    pub const fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Give up the tokenizer and keep the sink.
    #[must_use]
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// The reader has read past the first 512 bytes; a `<meta charset>` from
    /// now on can no longer restart the parse.
    pub const fn notify_meta_boundary(&mut self) {
        self.meta_boundary_passed = true;
    }
}

impl<S: TokenSink> Tokenizer<S> {
    /// Create a tokenizer feeding `sink`.
    ///
    /// [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization):
    /// "The initial state is the data state", unless the options say
    /// otherwise.
    #[must_use]
    pub fn new(sink: S, options: TokenizerOptions, reporter: Reporter) -> Self {
        Self {
            sink,
            reporter,
            xml_policy: options.xml_violation_policy,
            state: options.initial_state,
            return_state: TokenizerState::Data,
            current_input_character: None,
            reconsume: false,
            tag_kind: TagKind::Start,
            tag_name: String::new(),
            self_closing: false,
            attributes: Vec::new(),
            attribute_name: String::new(),
            attribute_value: String::new(),
            in_attribute: false,
            comment: String::new(),
            doctype: Doctype::default(),
            temporary_buffer: String::new(),
            character_reference_code: 0,
            named_reference: NamedReferenceMatch::default(),
            last_start_tag_name: options.last_start_tag,
            pending_characters: String::new(),
            pending_result: None,
            eof_emitted: false,
            meta_boundary_passed: false,
            line: 1,
            column: 0,
        }
    }

    /// Tokenize the rest of `input`.
    ///
    /// Returns when the buffer is used up, when the sink asks for a
    /// suspension, or when a `<meta>` declared an encoding. In the latter two
    /// cases the buffer cursor sits right after the character that completed
    /// the token, so calling again resumes exactly there.
    ///
    /// # Errors
    ///
    /// Sink failures and fatal XML violations.
    pub fn feed(&mut self, input: &mut DecodeBuffer) -> Result<TokenizerResult, ParseError> {
        loop {
            if let Some(result) = self.pending_result.take() {
                return Ok(result);
            }
            if self.eof_emitted {
                return Ok(TokenizerResult::Done);
            }
            if self.reconsume {
                self.reconsume = false;
            } else {
                match input.next_char() {
                    Some(c) => self.current_input_character = Some(self.preprocess(c)),
                    // A character run may continue in the next buffer, so
                    // it stays queued until a non-character token or EOF.
                    None => return Ok(TokenizerResult::Done),
                }
            }
            self.step()?;
        }
    }

    /// Run the state machine on end of input until the end-of-file token is
    /// emitted.
    ///
    /// May return [`TokenizerResult::Suspended`] for a token completed on the
    /// way; call again to finish.
    ///
    /// # Errors
    ///
    /// Sink failures and fatal XML violations.
    pub fn eof(&mut self) -> Result<TokenizerResult, ParseError> {
        while !self.eof_emitted {
            if let Some(result) = self.pending_result.take() {
                return Ok(result);
            }
            if self.reconsume {
                self.reconsume = false;
            } else {
                self.current_input_character = None;
            }
            self.step()?;
        }
        // Nothing runs after the end-of-file token, so a suspension requested
        // while handling it has nothing to pause.
        match self.pending_result.take() {
            Some(result @ TokenizerResult::EncodingChange(_)) => Ok(result),
            _ => Ok(TokenizerResult::Done),
        }
    }

    /// Tell the sink the parse is over.
    ///
    /// # Errors
    ///
    /// Whatever the sink's teardown returns.
    pub fn end(&mut self) -> Result<(), ParseError> {
        self.sink.end()
    }

    /// [§ 13.2.3.5 Preprocessing the input stream](https://html.spec.whatwg.org/multipage/parsing.html#preprocessing-the-input-stream)
    ///
    /// Advance the position and report characters that are errors wherever
    /// they appear.
    fn preprocess(&mut self, c: char) -> char {
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        // "Any occurrences of noncharacters in the input stream are
        // noncharacter-in-input-stream parse errors."
        if Self::is_noncharacter(c) {
            self.parse_error("noncharacter-in-input-stream");
        }
        // "Any occurrences of controls other than ASCII whitespace and U+0000
        // NULL characters are control-character-in-input-stream parse errors."
        else if c != '\0' && c.is_control() && !Self::is_whitespace_char(c) {
            self.parse_error("control-character-in-input-stream");
        }
        c
    }

    fn step(&mut self) -> Result<(), ParseError> {
        match self.state {
            TokenizerState::Data => self.handle_data_state(),
            TokenizerState::RCDATA => self.handle_rcdata_state(),
            TokenizerState::RAWTEXT => self.handle_rawtext_state(),
            TokenizerState::ScriptData => self.handle_script_data_state(),
            TokenizerState::PLAINTEXT => self.handle_plaintext_state(),
            TokenizerState::TagOpen => self.handle_tag_open_state(),
            TokenizerState::EndTagOpen => self.handle_end_tag_open_state(),
            TokenizerState::TagName => self.handle_tag_name_state(),
            TokenizerState::RCDATALessThanSign => {
                self.handle_raw_less_than_sign_state(TokenizerState::RCDATA, TokenizerState::RCDATAEndTagOpen)
            }
            TokenizerState::RCDATAEndTagOpen => {
                self.handle_raw_end_tag_open_state(TokenizerState::RCDATA, TokenizerState::RCDATAEndTagName)
            }
            TokenizerState::RCDATAEndTagName => self.handle_raw_end_tag_name_state(TokenizerState::RCDATA),
            TokenizerState::RAWTEXTLessThanSign => {
                self.handle_raw_less_than_sign_state(TokenizerState::RAWTEXT, TokenizerState::RAWTEXTEndTagOpen)
            }
            TokenizerState::RAWTEXTEndTagOpen => {
                self.handle_raw_end_tag_open_state(TokenizerState::RAWTEXT, TokenizerState::RAWTEXTEndTagName)
            }
            TokenizerState::RAWTEXTEndTagName => self.handle_raw_end_tag_name_state(TokenizerState::RAWTEXT),
            TokenizerState::ScriptDataLessThanSign => self.handle_script_data_less_than_sign_state(),
            TokenizerState::ScriptDataEndTagOpen => self.handle_raw_end_tag_open_state(
                TokenizerState::ScriptData,
                TokenizerState::ScriptDataEndTagName,
            ),
            TokenizerState::ScriptDataEndTagName => {
                self.handle_raw_end_tag_name_state(TokenizerState::ScriptData)
            }
            TokenizerState::ScriptDataEscapeStart => self.handle_script_data_escape_start_state(),
            TokenizerState::ScriptDataEscapeStartDash => {
                self.handle_script_data_escape_start_dash_state()
            }
            TokenizerState::ScriptDataEscaped => self.handle_script_data_escaped_state(),
            TokenizerState::ScriptDataEscapedDash => self.handle_script_data_escaped_dash_state(),
            TokenizerState::ScriptDataEscapedDashDash => {
                self.handle_script_data_escaped_dash_dash_state()
            }
            TokenizerState::ScriptDataEscapedLessThanSign => {
                self.handle_script_data_escaped_less_than_sign_state()
            }
            TokenizerState::ScriptDataEscapedEndTagOpen => self.handle_raw_end_tag_open_state(
                TokenizerState::ScriptDataEscaped,
                TokenizerState::ScriptDataEscapedEndTagName,
            ),
            TokenizerState::ScriptDataEscapedEndTagName => {
                self.handle_raw_end_tag_name_state(TokenizerState::ScriptDataEscaped)
            }
            TokenizerState::ScriptDataDoubleEscapeStart => {
                self.handle_script_data_double_escape_start_state()
            }
            TokenizerState::ScriptDataDoubleEscaped => self.handle_script_data_double_escaped_state(),
            TokenizerState::ScriptDataDoubleEscapedDash => {
                self.handle_script_data_double_escaped_dash_state()
            }
            TokenizerState::ScriptDataDoubleEscapedDashDash => {
                self.handle_script_data_double_escaped_dash_dash_state()
            }
            TokenizerState::ScriptDataDoubleEscapedLessThanSign => {
                self.handle_script_data_double_escaped_less_than_sign_state()
            }
            TokenizerState::ScriptDataDoubleEscapeEnd => {
                self.handle_script_data_double_escape_end_state()
            }
            TokenizerState::BeforeAttributeName => self.handle_before_attribute_name_state(),
            TokenizerState::AttributeName => {
                self.handle_attribute_name_state();
                Ok(())
            }
            TokenizerState::AfterAttributeName => self.handle_after_attribute_name_state(),
            TokenizerState::BeforeAttributeValue => self.handle_before_attribute_value_state(),
            TokenizerState::AttributeValueDoubleQuoted => self.handle_attribute_value_quoted_state('"'),
            TokenizerState::AttributeValueSingleQuoted => self.handle_attribute_value_quoted_state('\''),
            TokenizerState::AttributeValueUnquoted => self.handle_attribute_value_unquoted_state(),
            TokenizerState::AfterAttributeValueQuoted => {
                self.handle_after_attribute_value_quoted_state()
            }
            TokenizerState::SelfClosingStartTag => self.handle_self_closing_start_tag_state(),
            TokenizerState::BogusComment => self.handle_bogus_comment_state(),
            TokenizerState::MarkupDeclarationOpen => {
                self.handle_markup_declaration_open_state();
                Ok(())
            }
            TokenizerState::MarkupDeclarationHyphen => {
                self.handle_markup_declaration_hyphen_state();
                Ok(())
            }
            TokenizerState::MarkupDeclarationDoctype => {
                self.handle_markup_declaration_doctype_state();
                Ok(())
            }
            TokenizerState::MarkupDeclarationCdata => self.handle_markup_declaration_cdata_state(),
            TokenizerState::CommentStart => self.handle_comment_start_state(),
            TokenizerState::CommentStartDash => self.handle_comment_start_dash_state(),
            TokenizerState::Comment => self.handle_comment_state(),
            TokenizerState::CommentLessThanSign => {
                self.handle_comment_less_than_sign_state();
                Ok(())
            }
            TokenizerState::CommentLessThanSignBang => {
                self.handle_comment_less_than_sign_bang_state();
                Ok(())
            }
            TokenizerState::CommentLessThanSignBangDash => {
                self.handle_comment_less_than_sign_bang_dash_state();
                Ok(())
            }
            TokenizerState::CommentLessThanSignBangDashDash => {
                self.handle_comment_less_than_sign_bang_dash_dash_state();
                Ok(())
            }
            TokenizerState::CommentEndDash => self.handle_comment_end_dash_state(),
            TokenizerState::CommentEnd => self.handle_comment_end_state(),
            TokenizerState::CommentEndBang => self.handle_comment_end_bang_state(),
            TokenizerState::DOCTYPE => self.handle_doctype_state(),
            TokenizerState::BeforeDOCTYPEName => self.handle_before_doctype_name_state(),
            TokenizerState::DOCTYPEName => self.handle_doctype_name_state(),
            TokenizerState::AfterDOCTYPEName => self.handle_after_doctype_name_state(),
            TokenizerState::AfterDOCTYPENameKeyword => {
                self.handle_after_doctype_name_keyword_state();
                Ok(())
            }
            TokenizerState::AfterDOCTYPEPublicKeyword => {
                self.handle_after_doctype_keyword_state(true)
            }
            TokenizerState::BeforeDOCTYPEPublicIdentifier => {
                self.handle_before_doctype_identifier_state(true)
            }
            TokenizerState::DOCTYPEPublicIdentifierDoubleQuoted => {
                self.handle_doctype_identifier_quoted_state(true, '"')
            }
            TokenizerState::DOCTYPEPublicIdentifierSingleQuoted => {
                self.handle_doctype_identifier_quoted_state(true, '\'')
            }
            TokenizerState::AfterDOCTYPEPublicIdentifier => {
                self.handle_after_doctype_public_identifier_state()
            }
            TokenizerState::BetweenDOCTYPEPublicAndSystemIdentifiers => {
                self.handle_between_doctype_public_and_system_identifiers_state()
            }
            TokenizerState::AfterDOCTYPESystemKeyword => {
                self.handle_after_doctype_keyword_state(false)
            }
            TokenizerState::BeforeDOCTYPESystemIdentifier => {
                self.handle_before_doctype_identifier_state(false)
            }
            TokenizerState::DOCTYPESystemIdentifierDoubleQuoted => {
                self.handle_doctype_identifier_quoted_state(false, '"')
            }
            TokenizerState::DOCTYPESystemIdentifierSingleQuoted => {
                self.handle_doctype_identifier_quoted_state(false, '\'')
            }
            TokenizerState::AfterDOCTYPESystemIdentifier => {
                self.handle_after_doctype_system_identifier_state()
            }
            TokenizerState::BogusDOCTYPE => self.handle_bogus_doctype_state(),
            TokenizerState::CDATASection => self.handle_cdata_section_state(),
            TokenizerState::CDATASectionBracket => self.handle_cdata_section_bracket_state(),
            TokenizerState::CDATASectionEnd => self.handle_cdata_section_end_state(),
            TokenizerState::CharacterReference => self.handle_character_reference_state(),
            TokenizerState::NamedCharacterReference => self.handle_named_character_reference_state(),
            TokenizerState::AmbiguousAmpersand => self.handle_ambiguous_ampersand_state(),
            TokenizerState::NumericCharacterReference => {
                self.handle_numeric_character_reference_state();
                Ok(())
            }
            TokenizerState::HexadecimalCharacterReferenceStart => {
                self.handle_hexadecimal_character_reference_start_state()
            }
            TokenizerState::DecimalCharacterReferenceStart => {
                self.handle_decimal_character_reference_start_state()
            }
            TokenizerState::HexadecimalCharacterReference => {
                self.handle_hexadecimal_character_reference_state()
            }
            TokenizerState::DecimalCharacterReference => {
                self.handle_decimal_character_reference_state()
            }
            TokenizerState::NumericCharacterReferenceEnd => {
                self.handle_numeric_character_reference_end_state()
            }
        }
    }

    /// [§ 13.2.5.1 Data state](https://html.spec.whatwg.org/multipage/parsing.html#data-state)
    fn handle_data_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            // "U+0026 AMPERSAND (&) - Set the return state to the data state.
            // Switch to the character reference state."
            Some('&') => {
                self.return_state = TokenizerState::Data;
                self.switch_to(TokenizerState::CharacterReference);
            }
            // "U+003C LESS-THAN SIGN (<) - Switch to the tag open state."
            Some('<') => self.switch_to(TokenizerState::TagOpen),
            // "U+0000 NULL - This is an unexpected-null-character parse error.
            // Emit the current input character as a character token."
            Some('\0') => {
                self.parse_error("unexpected-null-character");
                self.emit_character('\0')?;
            }
            // "EOF - Emit an end-of-file token."
            None => self.emit_eof()?,
            // "Anything else - Emit the current input character as a character token."
            Some(c) => self.emit_character(c)?,
        }
        Ok(())
    }

    /// [§ 13.2.5.2 RCDATA state](https://html.spec.whatwg.org/multipage/parsing.html#rcdata-state)
    fn handle_rcdata_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            // "Set the return state to the RCDATA state. Switch to the
            // character reference state."
            Some('&') => {
                self.return_state = TokenizerState::RCDATA;
                self.switch_to(TokenizerState::CharacterReference);
            }
            Some('<') => self.switch_to(TokenizerState::RCDATALessThanSign),
            Some('\0') => {
                self.parse_error("unexpected-null-character");
                self.emit_character('\u{FFFD}')?;
            }
            None => self.emit_eof()?,
            Some(c) => self.emit_character(c)?,
        }
        Ok(())
    }

    /// [§ 13.2.5.3 RAWTEXT state](https://html.spec.whatwg.org/multipage/parsing.html#rawtext-state)
    fn handle_rawtext_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            Some('<') => self.switch_to(TokenizerState::RAWTEXTLessThanSign),
            Some('\0') => {
                self.parse_error("unexpected-null-character");
                self.emit_character('\u{FFFD}')?;
            }
            None => self.emit_eof()?,
            Some(c) => self.emit_character(c)?,
        }
        Ok(())
    }

    /// [§ 13.2.5.5 PLAINTEXT state](https://html.spec.whatwg.org/multipage/parsing.html#plaintext-state)
    fn handle_plaintext_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            Some('\0') => {
                self.parse_error("unexpected-null-character");
                self.emit_character('\u{FFFD}')?;
            }
            None => self.emit_eof()?,
            Some(c) => self.emit_character(c)?,
        }
        Ok(())
    }

    /// [§ 13.2.5.6 Tag open state](https://html.spec.whatwg.org/multipage/parsing.html#tag-open-state)
    fn handle_tag_open_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            // "U+0021 EXCLAMATION MARK (!) - Switch to the markup declaration open state."
            Some('!') => self.switch_to(TokenizerState::MarkupDeclarationOpen),
            // "U+002F SOLIDUS (/) - Switch to the end tag open state."
            Some('/') => self.switch_to(TokenizerState::EndTagOpen),
            // "ASCII alpha - Create a new start tag token, set its tag name to
            // the empty string. Reconsume in the tag name state."
            Some(c) if c.is_ascii_alphabetic() => {
                self.create_tag(TagKind::Start);
                self.reconsume_in(TokenizerState::TagName);
            }
            // "U+003F QUESTION MARK (?) - This is an
            // unexpected-question-mark-instead-of-tag-name parse error. Create a
            // comment token whose data is the empty string. Reconsume in the
            // bogus comment state."
            Some('?') => {
                self.parse_error("unexpected-question-mark-instead-of-tag-name");
                self.comment.clear();
                self.reconsume_in(TokenizerState::BogusComment);
            }
            // "EOF - This is an eof-before-tag-name parse error. Emit a U+003C
            // LESS-THAN SIGN character token and an end-of-file token."
            None => {
                self.parse_error("eof-before-tag-name");
                self.emit_character('<')?;
                self.emit_eof()?;
            }
            // "Anything else - This is an invalid-first-character-of-tag-name
            // parse error. Emit a U+003C LESS-THAN SIGN character token.
            // Reconsume in the data state."
            Some(_) => {
                self.parse_error("invalid-first-character-of-tag-name");
                self.emit_character('<')?;
                self.reconsume_in(TokenizerState::Data);
            }
        }
        Ok(())
    }

    /// [§ 13.2.5.7 End tag open state](https://html.spec.whatwg.org/multipage/parsing.html#end-tag-open-state)
    fn handle_end_tag_open_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            Some(c) if c.is_ascii_alphabetic() => {
                self.create_tag(TagKind::End);
                self.reconsume_in(TokenizerState::TagName);
            }
            // "U+003E GREATER-THAN SIGN (>) - This is a missing-end-tag-name
            // parse error. Switch to the data state."
            Some('>') => {
                self.parse_error("missing-end-tag-name");
                self.switch_to(TokenizerState::Data);
            }
            None => {
                self.parse_error("eof-before-tag-name");
                self.emit_character('<')?;
                self.emit_character('/')?;
                self.emit_eof()?;
            }
            // "Anything else - This is an invalid-first-character-of-tag-name
            // parse error. Create a comment token whose data is the empty
            // string. Reconsume in the bogus comment state."
            Some(_) => {
                self.parse_error("invalid-first-character-of-tag-name");
                self.comment.clear();
                self.reconsume_in(TokenizerState::BogusComment);
            }
        }
        Ok(())
    }

    /// [§ 13.2.5.8 Tag name state](https://html.spec.whatwg.org/multipage/parsing.html#tag-name-state)
    fn handle_tag_name_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            Some(c) if Self::is_whitespace_char(c) => {
                self.switch_to(TokenizerState::BeforeAttributeName);
            }
            Some('/') => self.switch_to(TokenizerState::SelfClosingStartTag),
            Some('>') => {
                self.switch_to(TokenizerState::Data);
                self.emit_tag()?;
            }
            // "ASCII upper alpha - Append the lowercase version of the current
            // input character to the current tag token's tag name."
            Some(c) if c.is_ascii_uppercase() => self.tag_name.push(c.to_ascii_lowercase()),
            Some('\0') => {
                self.parse_error("unexpected-null-character");
                self.tag_name.push('\u{FFFD}');
            }
            // "EOF - This is an eof-in-tag parse error. Emit an end-of-file token."
            None => {
                self.parse_error("eof-in-tag");
                self.emit_eof()?;
            }
            Some(c) => self.tag_name.push(c),
        }
        Ok(())
    }

    /// [§ 13.2.5.9 RCDATA less-than sign state](https://html.spec.whatwg.org/multipage/parsing.html#rcdata-less-than-sign-state)
    /// and [§ 13.2.5.12 RAWTEXT less-than sign state](https://html.spec.whatwg.org/multipage/parsing.html#rawtext-less-than-sign-state)
    fn handle_raw_less_than_sign_state(
        &mut self,
        text_state: TokenizerState,
        end_tag_open_state: TokenizerState,
    ) -> Result<(), ParseError> {
        if self.current_input_character == Some('/') {
            // "Set the temporary buffer to the empty string. Switch to the
            // RCDATA end tag open state."
            self.temporary_buffer.clear();
            self.switch_to(end_tag_open_state);
        } else {
            // "Emit a U+003C LESS-THAN SIGN character token. Reconsume in the
            // RCDATA state."
            self.emit_character('<')?;
            self.reconsume_in(text_state);
        }
        Ok(())
    }

    /// [§ 13.2.5.10 RCDATA end tag open state](https://html.spec.whatwg.org/multipage/parsing.html#rcdata-end-tag-open-state),
    /// and its RAWTEXT, script data and script data escaped twins.
    pub(super) fn handle_raw_end_tag_open_state(
        &mut self,
        text_state: TokenizerState,
        end_tag_name_state: TokenizerState,
    ) -> Result<(), ParseError> {
        match self.current_input_character {
            // "ASCII alpha - Create a new end tag token, set its tag name to the
            // empty string. Reconsume in the RCDATA end tag name state."
            Some(c) if c.is_ascii_alphabetic() => {
                self.create_tag(TagKind::End);
                self.reconsume_in(end_tag_name_state);
            }
            // "Anything else - Emit a U+003C LESS-THAN SIGN character token and
            // a U+002F SOLIDUS character token. Reconsume in the RCDATA state."
            _ => {
                self.emit_character('<')?;
                self.emit_character('/')?;
                self.reconsume_in(text_state);
            }
        }
        Ok(())
    }

    /// [§ 13.2.5.11 RCDATA end tag name state](https://html.spec.whatwg.org/multipage/parsing.html#rcdata-end-tag-name-state),
    /// and its RAWTEXT, script data and script data escaped twins.
    pub(super) fn handle_raw_end_tag_name_state(
        &mut self,
        text_state: TokenizerState,
    ) -> Result<(), ParseError> {
        match self.current_input_character {
            // "If the current end tag token is an appropriate end tag token,
            // then switch to the before attribute name state. Otherwise, treat
            // it as per the "anything else" entry below."
            Some(c) if Self::is_whitespace_char(c) && self.is_appropriate_end_tag_token() => {
                self.switch_to(TokenizerState::BeforeAttributeName);
            }
            Some('/') if self.is_appropriate_end_tag_token() => {
                self.switch_to(TokenizerState::SelfClosingStartTag);
            }
            Some('>') if self.is_appropriate_end_tag_token() => {
                self.switch_to(TokenizerState::Data);
                self.emit_tag()?;
            }
            // "ASCII alpha - Append the lowercase version of the current input
            // character to the current tag token's tag name. Append the current
            // input character to the temporary buffer."
            Some(c) if c.is_ascii_alphabetic() => {
                self.tag_name.push(c.to_ascii_lowercase());
                self.temporary_buffer.push(c);
            }
            // "Anything else - Emit a U+003C LESS-THAN SIGN character token, a
            // U+002F SOLIDUS character token, and a character token for each of
            // the characters in the temporary buffer (in the order they were
            // added to the buffer). Reconsume in the RCDATA state."
            _ => {
                self.emit_character('<')?;
                self.emit_character('/')?;
                self.emit_temporary_buffer()?;
                self.reconsume_in(text_state);
            }
        }
        Ok(())
    }

    /// [§ 13.2.5.32 Before attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#before-attribute-name-state)
    fn handle_before_attribute_name_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            // "Ignore the character."
            Some(c) if Self::is_whitespace_char(c) => {}
            // "U+002F SOLIDUS (/), U+003E GREATER-THAN SIGN (>), EOF - Reconsume
            // in the after attribute name state."
            Some('/' | '>') | None => self.reconsume_in(TokenizerState::AfterAttributeName),
            // "U+003D EQUALS SIGN (=) - This is an
            // unexpected-equals-sign-before-attribute-name parse error. Start a
            // new attribute in the current tag token. Set that attribute's name
            // to the current input character, and its value to the empty
            // string. Switch to the attribute name state."
            Some('=') => {
                self.parse_error("unexpected-equals-sign-before-attribute-name");
                self.start_attribute()?;
                self.attribute_name.push('=');
                self.switch_to(TokenizerState::AttributeName);
            }
            // "Anything else - Start a new attribute in the current tag token.
            // Set that attribute name and value to the empty string. Reconsume
            // in the attribute name state."
            Some(_) => {
                self.start_attribute()?;
                self.reconsume_in(TokenizerState::AttributeName);
            }
        }
        Ok(())
    }

    /// [§ 13.2.5.33 Attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-name-state)
    fn handle_attribute_name_state(&mut self) {
        match self.current_input_character {
            // "U+0009, U+000A, U+000C, U+0020, U+002F, U+003E, EOF - Reconsume
            // in the after attribute name state."
            Some(c) if Self::is_whitespace_char(c) => {
                self.reconsume_in(TokenizerState::AfterAttributeName);
            }
            Some('/' | '>') | None => self.reconsume_in(TokenizerState::AfterAttributeName),
            // "U+003D EQUALS SIGN (=) - Switch to the before attribute value state."
            Some('=') => self.switch_to(TokenizerState::BeforeAttributeValue),
            Some(c) if c.is_ascii_uppercase() => self.attribute_name.push(c.to_ascii_lowercase()),
            Some('\0') => {
                self.parse_error("unexpected-null-character");
                self.attribute_name.push('\u{FFFD}');
            }
            // "U+0022 QUOTATION MARK ("), U+0027 APOSTROPHE ('), U+003C
            // LESS-THAN SIGN (<) - This is an
            // unexpected-character-in-attribute-name parse error. Treat it as
            // per the "anything else" entry below."
            Some(c @ ('"' | '\'' | '<')) => {
                self.parse_error("unexpected-character-in-attribute-name");
                self.attribute_name.push(c);
            }
            Some(c) => self.attribute_name.push(c),
        }
    }

    /// [§ 13.2.5.34 After attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#after-attribute-name-state)
    fn handle_after_attribute_name_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            Some(c) if Self::is_whitespace_char(c) => {}
            Some('/') => self.switch_to(TokenizerState::SelfClosingStartTag),
            Some('=') => self.switch_to(TokenizerState::BeforeAttributeValue),
            Some('>') => {
                self.switch_to(TokenizerState::Data);
                self.emit_tag()?;
            }
            None => {
                self.parse_error("eof-in-tag");
                self.emit_eof()?;
            }
            Some(_) => {
                self.start_attribute()?;
                self.reconsume_in(TokenizerState::AttributeName);
            }
        }
        Ok(())
    }

    /// [§ 13.2.5.35 Before attribute value state](https://html.spec.whatwg.org/multipage/parsing.html#before-attribute-value-state)
    fn handle_before_attribute_value_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            Some(c) if Self::is_whitespace_char(c) => {}
            Some('"') => self.switch_to(TokenizerState::AttributeValueDoubleQuoted),
            Some('\'') => self.switch_to(TokenizerState::AttributeValueSingleQuoted),
            // "U+003E GREATER-THAN SIGN (>) - This is a
            // missing-attribute-value parse error. Switch to the data state.
            // Emit the current tag token."
            Some('>') => {
                self.parse_error("missing-attribute-value");
                self.switch_to(TokenizerState::Data);
                self.emit_tag()?;
            }
            _ => self.reconsume_in(TokenizerState::AttributeValueUnquoted),
        }
        Ok(())
    }

    /// [§ 13.2.5.36 Attribute value (double-quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(double-quoted)-state)
    /// and [§ 13.2.5.37 Attribute value (single-quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(single-quoted)-state)
    fn handle_attribute_value_quoted_state(&mut self, quote: char) -> Result<(), ParseError> {
        match self.current_input_character {
            Some(c) if c == quote => self.switch_to(TokenizerState::AfterAttributeValueQuoted),
            // "U+0026 AMPERSAND (&) - Set the return state to the attribute
            // value (double-quoted) state. Switch to the character reference
            // state."
            Some('&') => {
                self.return_state = self.state;
                self.switch_to(TokenizerState::CharacterReference);
            }
            Some('\0') => {
                self.parse_error("unexpected-null-character");
                self.attribute_value.push('\u{FFFD}');
            }
            None => {
                self.parse_error("eof-in-tag");
                self.emit_eof()?;
            }
            Some(c) => self.attribute_value.push(c),
        }
        Ok(())
    }

    /// [§ 13.2.5.38 Attribute value (unquoted) state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(unquoted)-state)
    fn handle_attribute_value_unquoted_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            Some(c) if Self::is_whitespace_char(c) => {
                self.switch_to(TokenizerState::BeforeAttributeName);
            }
            Some('&') => {
                self.return_state = TokenizerState::AttributeValueUnquoted;
                self.switch_to(TokenizerState::CharacterReference);
            }
            Some('>') => {
                self.switch_to(TokenizerState::Data);
                self.emit_tag()?;
            }
            Some('\0') => {
                self.parse_error("unexpected-null-character");
                self.attribute_value.push('\u{FFFD}');
            }
            // "U+0022, U+0027, U+003C, U+003D, U+0060 - This is an
            // unexpected-character-in-unquoted-attribute-value parse error.
            // Treat it as per the "anything else" entry below."
            Some(c @ ('"' | '\'' | '<' | '=' | '`')) => {
                self.parse_error("unexpected-character-in-unquoted-attribute-value");
                self.attribute_value.push(c);
            }
            None => {
                self.parse_error("eof-in-tag");
                self.emit_eof()?;
            }
            Some(c) => self.attribute_value.push(c),
        }
        Ok(())
    }

    /// [§ 13.2.5.39 After attribute value (quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#after-attribute-value-(quoted)-state)
    fn handle_after_attribute_value_quoted_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            Some(c) if Self::is_whitespace_char(c) => {
                self.switch_to(TokenizerState::BeforeAttributeName);
            }
            Some('/') => self.switch_to(TokenizerState::SelfClosingStartTag),
            Some('>') => {
                self.switch_to(TokenizerState::Data);
                self.emit_tag()?;
            }
            None => {
                self.parse_error("eof-in-tag");
                self.emit_eof()?;
            }
            // "Anything else - This is a missing-whitespace-between-attributes
            // parse error. Reconsume in the before attribute name state."
            Some(_) => {
                self.parse_error("missing-whitespace-between-attributes");
                self.reconsume_in(TokenizerState::BeforeAttributeName);
            }
        }
        Ok(())
    }

    /// [§ 13.2.5.40 Self-closing start tag state](https://html.spec.whatwg.org/multipage/parsing.html#self-closing-start-tag-state)
    fn handle_self_closing_start_tag_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            // "U+003E GREATER-THAN SIGN (>) - Set the self-closing flag of the
            // current tag token. Switch to the data state. Emit the current tag
            // token."
            Some('>') => {
                self.self_closing = true;
                self.switch_to(TokenizerState::Data);
                self.emit_tag()?;
            }
            None => {
                self.parse_error("eof-in-tag");
                self.emit_eof()?;
            }
            // "Anything else - This is an unexpected-solidus-in-tag parse
            // error. Reconsume in the before attribute name state."
            Some(_) => {
                self.parse_error("unexpected-solidus-in-tag");
                self.reconsume_in(TokenizerState::BeforeAttributeName);
            }
        }
        Ok(())
    }
}

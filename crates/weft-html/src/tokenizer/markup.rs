//! Comment, DOCTYPE and CDATA section states.

use super::core::{Tokenizer, TokenizerState};
use super::token::TokenSink;
use crate::error::ParseError;

const DOCTYPE_KEYWORD: &str = "DOCTYPE";
const CDATA_KEYWORD: &str = "[CDATA[";

impl<S: TokenSink> Tokenizer<S> {
    /// [§ 13.2.5.41 Bogus comment state](https://html.spec.whatwg.org/multipage/parsing.html#bogus-comment-state)
    pub(super) fn handle_bogus_comment_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            // "Switch to the data state. Emit the current comment token."
            Some('>') => {
                self.switch_to(TokenizerState::Data);
                self.emit_comment()?;
            }
            // "Emit the comment. Emit an end-of-file token."
            None => {
                self.emit_comment()?;
                self.emit_eof()?;
            }
            Some('\0') => {
                self.parse_error("unexpected-null-character");
                self.comment.push('\u{FFFD}');
            }
            Some(c) => self.comment.push(c),
        }
        Ok(())
    }

    /// [§ 13.2.5.42 Markup declaration open state](https://html.spec.whatwg.org/multipage/parsing.html#markup-declaration-open-state)
    ///
    /// The lookahead for `--`, `DOCTYPE` and `[CDATA[` is done one character
    /// at a time in the sub-states that follow.
    pub(super) fn handle_markup_declaration_open_state(&mut self) {
        match self.current_input_character {
            Some('-') => self.switch_to(TokenizerState::MarkupDeclarationHyphen),
            Some(c @ ('D' | 'd')) => {
                self.temporary_buffer.clear();
                self.temporary_buffer.push(c);
                self.switch_to(TokenizerState::MarkupDeclarationDoctype);
            }
            Some('[') => {
                self.temporary_buffer.clear();
                self.temporary_buffer.push('[');
                self.switch_to(TokenizerState::MarkupDeclarationCdata);
            }
            // "Otherwise, this is an incorrectly-opened-comment parse error.
            // Create a comment token whose data is the empty string. Switch to
            // the bogus comment state (don't consume anything in the current
            // state)."
            _ => {
                self.parse_error("incorrectly-opened-comment");
                self.comment.clear();
                self.reconsume_in(TokenizerState::BogusComment);
            }
        }
    }

    pub(super) fn handle_markup_declaration_hyphen_state(&mut self) {
        if self.current_input_character == Some('-') {
            // "If the next two characters are both U+002D HYPHEN-MINUS
            // characters (-), consume those two characters, create a comment
            // token whose data is the empty string, and switch to the comment
            // start state."
            self.comment.clear();
            self.switch_to(TokenizerState::CommentStart);
        } else {
            self.parse_error("incorrectly-opened-comment");
            self.comment.clear();
            self.comment.push('-');
            self.reconsume_in(TokenizerState::BogusComment);
        }
    }

    /// "Otherwise, if the next seven characters are an ASCII case-insensitive
    /// match for the word "DOCTYPE", then consume those characters and switch
    /// to the DOCTYPE state."
    pub(super) fn handle_markup_declaration_doctype_state(&mut self) {
        let expected = DOCTYPE_KEYWORD[self.temporary_buffer.len()..].chars().next();
        match (self.current_input_character, expected) {
            (Some(c), Some(e)) if c.eq_ignore_ascii_case(&e) => {
                self.temporary_buffer.push(c);
                if self.temporary_buffer.len() == DOCTYPE_KEYWORD.len() {
                    self.switch_to(TokenizerState::DOCTYPE);
                }
            }
            _ => self.abandon_markup_declaration(),
        }
    }

    /// "Otherwise, if the next seven characters are a case-sensitive match for
    /// the string "[CDATA[" (...), then consume those characters. If there is
    /// an adjusted current node and it is not an element in the HTML
    /// namespace, then switch to the CDATA section state. Otherwise, this is a
    /// cdata-in-html-content parse error. Create a comment token whose data is
    /// the "[CDATA[" string. Switch to the bogus comment state."
    pub(super) fn handle_markup_declaration_cdata_state(&mut self) -> Result<(), ParseError> {
        let expected = CDATA_KEYWORD[self.temporary_buffer.len()..].chars().next();
        match (self.current_input_character, expected) {
            (Some(c), Some(e)) if c == e => {
                self.temporary_buffer.push(c);
                if self.temporary_buffer.len() == CDATA_KEYWORD.len() {
                    // The tree builder must have seen every token before this
                    // point to answer.
                    self.flush_characters()?;
                    if self.sink.adjusted_current_node_is_foreign() {
                        self.switch_to(TokenizerState::CDATASection);
                    } else {
                        self.parse_error("cdata-in-html-content");
                        self.comment.clear();
                        self.comment.push_str(CDATA_KEYWORD);
                        self.switch_to(TokenizerState::BogusComment);
                    }
                }
            }
            _ => self.abandon_markup_declaration(),
        }
        Ok(())
    }

    /// The keyword did not match: everything consumed after `<!` becomes the
    /// start of a bogus comment.
    fn abandon_markup_declaration(&mut self) {
        self.parse_error("incorrectly-opened-comment");
        self.comment.clear();
        self.comment.push_str(&self.temporary_buffer);
        self.reconsume_in(TokenizerState::BogusComment);
    }

    /// [§ 13.2.5.43 Comment start state](https://html.spec.whatwg.org/multipage/parsing.html#comment-start-state)
    pub(super) fn handle_comment_start_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            Some('-') => self.switch_to(TokenizerState::CommentStartDash),
            // "This is an abrupt-closing-of-empty-comment parse error. Switch to
            // the data state. Emit the current comment token."
            Some('>') => {
                self.parse_error("abrupt-closing-of-empty-comment");
                self.switch_to(TokenizerState::Data);
                self.emit_comment()?;
            }
            _ => self.reconsume_in(TokenizerState::Comment),
        }
        Ok(())
    }

    /// [§ 13.2.5.44 Comment start dash state](https://html.spec.whatwg.org/multipage/parsing.html#comment-start-dash-state)
    pub(super) fn handle_comment_start_dash_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            Some('-') => self.switch_to(TokenizerState::CommentEnd),
            Some('>') => {
                self.parse_error("abrupt-closing-of-empty-comment");
                self.switch_to(TokenizerState::Data);
                self.emit_comment()?;
            }
            None => self.eof_in_comment()?,
            // "Append a U+002D HYPHEN-MINUS character (-) to the comment
            // token's data. Reconsume in the comment state."
            Some(_) => {
                self.comment.push('-');
                self.reconsume_in(TokenizerState::Comment);
            }
        }
        Ok(())
    }

    /// [§ 13.2.5.45 Comment state](https://html.spec.whatwg.org/multipage/parsing.html#comment-state)
    pub(super) fn handle_comment_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            Some('<') => {
                self.comment.push('<');
                self.switch_to(TokenizerState::CommentLessThanSign);
            }
            Some('-') => self.switch_to(TokenizerState::CommentEndDash),
            Some('\0') => {
                self.parse_error("unexpected-null-character");
                self.comment.push('\u{FFFD}');
            }
            None => self.eof_in_comment()?,
            Some(c) => self.comment.push(c),
        }
        Ok(())
    }

    /// [§ 13.2.5.46 Comment less-than sign state](https://html.spec.whatwg.org/multipage/parsing.html#comment-less-than-sign-state)
    pub(super) fn handle_comment_less_than_sign_state(&mut self) {
        match self.current_input_character {
            Some('!') => {
                self.comment.push('!');
                self.switch_to(TokenizerState::CommentLessThanSignBang);
            }
            Some('<') => self.comment.push('<'),
            _ => self.reconsume_in(TokenizerState::Comment),
        }
    }

    /// [§ 13.2.5.47 Comment less-than sign bang state](https://html.spec.whatwg.org/multipage/parsing.html#comment-less-than-sign-bang-state)
    pub(super) fn handle_comment_less_than_sign_bang_state(&mut self) {
        if self.current_input_character == Some('-') {
            self.switch_to(TokenizerState::CommentLessThanSignBangDash);
        } else {
            self.reconsume_in(TokenizerState::Comment);
        }
    }

    /// [§ 13.2.5.48 Comment less-than sign bang dash state](https://html.spec.whatwg.org/multipage/parsing.html#comment-less-than-sign-bang-dash-state)
    pub(super) fn handle_comment_less_than_sign_bang_dash_state(&mut self) {
        if self.current_input_character == Some('-') {
            self.switch_to(TokenizerState::CommentLessThanSignBangDashDash);
        } else {
            self.reconsume_in(TokenizerState::CommentEndDash);
        }
    }

    /// [§ 13.2.5.49 Comment less-than sign bang dash dash state](https://html.spec.whatwg.org/multipage/parsing.html#comment-less-than-sign-bang-dash-dash-state)
    pub(super) fn handle_comment_less_than_sign_bang_dash_dash_state(&mut self) {
        match self.current_input_character {
            Some('>') | None => {}
            // "This is a nested-comment parse error."
            Some(_) => self.parse_error("nested-comment"),
        }
        self.reconsume_in(TokenizerState::CommentEnd);
    }

    /// [§ 13.2.5.50 Comment end dash state](https://html.spec.whatwg.org/multipage/parsing.html#comment-end-dash-state)
    pub(super) fn handle_comment_end_dash_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            Some('-') => self.switch_to(TokenizerState::CommentEnd),
            None => self.eof_in_comment()?,
            Some(_) => {
                self.comment.push('-');
                self.reconsume_in(TokenizerState::Comment);
            }
        }
        Ok(())
    }

    /// [§ 13.2.5.51 Comment end state](https://html.spec.whatwg.org/multipage/parsing.html#comment-end-state)
    pub(super) fn handle_comment_end_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            Some('>') => {
                self.switch_to(TokenizerState::Data);
                self.emit_comment()?;
            }
            Some('!') => self.switch_to(TokenizerState::CommentEndBang),
            Some('-') => self.comment.push('-'),
            None => self.eof_in_comment()?,
            // "Append two U+002D HYPHEN-MINUS characters (-) to the comment
            // token's data. Reconsume in the comment state."
            Some(_) => {
                self.comment.push_str("--");
                self.reconsume_in(TokenizerState::Comment);
            }
        }
        Ok(())
    }

    /// [§ 13.2.5.52 Comment end bang state](https://html.spec.whatwg.org/multipage/parsing.html#comment-end-bang-state)
    pub(super) fn handle_comment_end_bang_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            Some('-') => {
                self.comment.push_str("--!");
                self.switch_to(TokenizerState::CommentEndDash);
            }
            Some('>') => {
                self.parse_error("incorrectly-closed-comment");
                self.switch_to(TokenizerState::Data);
                self.emit_comment()?;
            }
            None => self.eof_in_comment()?,
            Some(_) => {
                self.comment.push_str("--!");
                self.reconsume_in(TokenizerState::Comment);
            }
        }
        Ok(())
    }

    /// "EOF - This is an eof-in-comment parse error. Emit the current comment
    /// token. Emit an end-of-file token."
    fn eof_in_comment(&mut self) -> Result<(), ParseError> {
        self.parse_error("eof-in-comment");
        self.emit_comment()?;
        self.emit_eof()
    }

    /// [§ 13.2.5.53 DOCTYPE state](https://html.spec.whatwg.org/multipage/parsing.html#doctype-state)
    pub(super) fn handle_doctype_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            Some(c) if Self::is_whitespace_char(c) => {
                self.switch_to(TokenizerState::BeforeDOCTYPEName);
            }
            Some('>') => self.reconsume_in(TokenizerState::BeforeDOCTYPEName),
            // "This is an eof-in-doctype parse error. Create a new DOCTYPE
            // token. Set its force-quirks flag to on. Emit the current token.
            // Emit an end-of-file token."
            None => {
                self.create_doctype();
                self.eof_in_doctype()?;
            }
            Some(_) => {
                self.parse_error("missing-whitespace-before-doctype-name");
                self.reconsume_in(TokenizerState::BeforeDOCTYPEName);
            }
        }
        Ok(())
    }

    /// [§ 13.2.5.54 Before DOCTYPE name state](https://html.spec.whatwg.org/multipage/parsing.html#before-doctype-name-state)
    pub(super) fn handle_before_doctype_name_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            Some(c) if Self::is_whitespace_char(c) => {}
            Some('\0') => {
                self.parse_error("unexpected-null-character");
                self.create_doctype();
                self.doctype.name = Some(String::from('\u{FFFD}'));
                self.switch_to(TokenizerState::DOCTYPEName);
            }
            // "This is a missing-doctype-name parse error. Create a new DOCTYPE
            // token. Set its force-quirks flag to on. Switch to the data state.
            // Emit the current token."
            Some('>') => {
                self.parse_error("missing-doctype-name");
                self.create_doctype();
                self.doctype.force_quirks = true;
                self.switch_to(TokenizerState::Data);
                self.emit_doctype()?;
            }
            None => {
                self.create_doctype();
                self.eof_in_doctype()?;
            }
            Some(c) => {
                self.create_doctype();
                self.doctype.name = Some(String::from(c.to_ascii_lowercase()));
                self.switch_to(TokenizerState::DOCTYPEName);
            }
        }
        Ok(())
    }

    /// [§ 13.2.5.55 DOCTYPE name state](https://html.spec.whatwg.org/multipage/parsing.html#doctype-name-state)
    pub(super) fn handle_doctype_name_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            Some(c) if Self::is_whitespace_char(c) => {
                self.switch_to(TokenizerState::AfterDOCTYPEName);
            }
            Some('>') => {
                self.switch_to(TokenizerState::Data);
                self.emit_doctype()?;
            }
            Some('\0') => {
                self.parse_error("unexpected-null-character");
                self.doctype.name.get_or_insert_with(String::new).push('\u{FFFD}');
            }
            None => self.eof_in_doctype()?,
            Some(c) => self
                .doctype
                .name
                .get_or_insert_with(String::new)
                .push(c.to_ascii_lowercase()),
        }
        Ok(())
    }

    /// [§ 13.2.5.56 After DOCTYPE name state](https://html.spec.whatwg.org/multipage/parsing.html#after-doctype-name-state)
    pub(super) fn handle_after_doctype_name_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            Some(c) if Self::is_whitespace_char(c) => {}
            Some('>') => {
                self.switch_to(TokenizerState::Data);
                self.emit_doctype()?;
            }
            None => self.eof_in_doctype()?,
            // "If the six characters starting from the current input character
            // are an ASCII case-insensitive match for the word "PUBLIC" /
            // "SYSTEM", then consume those characters..."
            Some(c @ ('P' | 'p' | 'S' | 's')) => {
                self.temporary_buffer.clear();
                self.temporary_buffer.push(c);
                self.switch_to(TokenizerState::AfterDOCTYPENameKeyword);
            }
            Some(_) => self.invalid_after_doctype_name(),
        }
        Ok(())
    }

    pub(super) fn handle_after_doctype_name_keyword_state(&mut self) {
        let public = self.temporary_buffer.starts_with(['P', 'p']);
        let keyword = if public { "PUBLIC" } else { "SYSTEM" };
        let expected = keyword[self.temporary_buffer.len()..].chars().next();
        match (self.current_input_character, expected) {
            (Some(c), Some(e)) if c.eq_ignore_ascii_case(&e) => {
                self.temporary_buffer.push(c);
                if self.temporary_buffer.len() == keyword.len() {
                    self.switch_to(if public {
                        TokenizerState::AfterDOCTYPEPublicKeyword
                    } else {
                        TokenizerState::AfterDOCTYPESystemKeyword
                    });
                }
            }
            _ => self.invalid_after_doctype_name(),
        }
    }

    /// "Otherwise, this is an invalid-character-sequence-after-doctype-name
    /// parse error. Set the current DOCTYPE token's force-quirks flag to on.
    /// Reconsume in the bogus DOCTYPE state."
    fn invalid_after_doctype_name(&mut self) {
        self.parse_error("invalid-character-sequence-after-doctype-name");
        self.doctype.force_quirks = true;
        self.reconsume_in(TokenizerState::BogusDOCTYPE);
    }

    /// [§ 13.2.5.57 After DOCTYPE public keyword state](https://html.spec.whatwg.org/multipage/parsing.html#after-doctype-public-keyword-state)
    /// and [§ 13.2.5.63 After DOCTYPE system keyword state](https://html.spec.whatwg.org/multipage/parsing.html#after-doctype-system-keyword-state)
    pub(super) fn handle_after_doctype_keyword_state(&mut self, public: bool) -> Result<(), ParseError> {
        let kind = if public { "public" } else { "system" };
        match self.current_input_character {
            Some(c) if Self::is_whitespace_char(c) => {
                self.switch_to(if public {
                    TokenizerState::BeforeDOCTYPEPublicIdentifier
                } else {
                    TokenizerState::BeforeDOCTYPESystemIdentifier
                });
            }
            Some(quote @ ('"' | '\'')) => {
                self.parse_error(&format!("missing-whitespace-after-doctype-{kind}-keyword"));
                self.open_doctype_identifier(public, quote);
            }
            Some('>') => {
                self.parse_error(&format!("missing-doctype-{kind}-identifier"));
                self.doctype.force_quirks = true;
                self.switch_to(TokenizerState::Data);
                self.emit_doctype()?;
            }
            None => self.eof_in_doctype()?,
            Some(_) => {
                self.parse_error(&format!("missing-quote-before-doctype-{kind}-identifier"));
                self.doctype.force_quirks = true;
                self.reconsume_in(TokenizerState::BogusDOCTYPE);
            }
        }
        Ok(())
    }

    /// [§ 13.2.5.58 Before DOCTYPE public identifier state](https://html.spec.whatwg.org/multipage/parsing.html#before-doctype-public-identifier-state)
    /// and [§ 13.2.5.64 Before DOCTYPE system identifier state](https://html.spec.whatwg.org/multipage/parsing.html#before-doctype-system-identifier-state)
    pub(super) fn handle_before_doctype_identifier_state(
        &mut self,
        public: bool,
    ) -> Result<(), ParseError> {
        let kind = if public { "public" } else { "system" };
        match self.current_input_character {
            Some(c) if Self::is_whitespace_char(c) => {}
            Some(quote @ ('"' | '\'')) => self.open_doctype_identifier(public, quote),
            Some('>') => {
                self.parse_error(&format!("missing-doctype-{kind}-identifier"));
                self.doctype.force_quirks = true;
                self.switch_to(TokenizerState::Data);
                self.emit_doctype()?;
            }
            None => self.eof_in_doctype()?,
            Some(_) => {
                self.parse_error(&format!("missing-quote-before-doctype-{kind}-identifier"));
                self.doctype.force_quirks = true;
                self.reconsume_in(TokenizerState::BogusDOCTYPE);
            }
        }
        Ok(())
    }

    /// "Set the current DOCTYPE token's public identifier to the empty string
    /// (not missing), then switch to the DOCTYPE public identifier
    /// (double-quoted) state."
    fn open_doctype_identifier(&mut self, public: bool, quote: char) {
        let double = quote == '"';
        if public {
            self.doctype.public_id = Some(String::new());
            self.switch_to(if double {
                TokenizerState::DOCTYPEPublicIdentifierDoubleQuoted
            } else {
                TokenizerState::DOCTYPEPublicIdentifierSingleQuoted
            });
        } else {
            self.doctype.system_id = Some(String::new());
            self.switch_to(if double {
                TokenizerState::DOCTYPESystemIdentifierDoubleQuoted
            } else {
                TokenizerState::DOCTYPESystemIdentifierSingleQuoted
            });
        }
    }

    /// [§ 13.2.5.59](https://html.spec.whatwg.org/multipage/parsing.html#doctype-public-identifier-(double-quoted)-state)
    /// through [§ 13.2.5.66](https://html.spec.whatwg.org/multipage/parsing.html#doctype-system-identifier-(single-quoted)-state):
    /// the four quoted identifier states.
    pub(super) fn handle_doctype_identifier_quoted_state(
        &mut self,
        public: bool,
        quote: char,
    ) -> Result<(), ParseError> {
        let kind = if public { "public" } else { "system" };
        match self.current_input_character {
            Some(c) if c == quote => self.switch_to(if public {
                TokenizerState::AfterDOCTYPEPublicIdentifier
            } else {
                TokenizerState::AfterDOCTYPESystemIdentifier
            }),
            Some('\0') => {
                self.parse_error("unexpected-null-character");
                self.push_doctype_identifier(public, '\u{FFFD}');
            }
            // "This is an abrupt-doctype-public-identifier parse error. Set the
            // current DOCTYPE token's force-quirks flag to on. Switch to the
            // data state. Emit the current DOCTYPE token."
            Some('>') => {
                self.parse_error(&format!("abrupt-doctype-{kind}-identifier"));
                self.doctype.force_quirks = true;
                self.switch_to(TokenizerState::Data);
                self.emit_doctype()?;
            }
            None => self.eof_in_doctype()?,
            Some(c) => self.push_doctype_identifier(public, c),
        }
        Ok(())
    }

    fn push_doctype_identifier(&mut self, public: bool, c: char) {
        let id = if public {
            &mut self.doctype.public_id
        } else {
            &mut self.doctype.system_id
        };
        id.get_or_insert_with(String::new).push(c);
    }

    /// [§ 13.2.5.61 After DOCTYPE public identifier state](https://html.spec.whatwg.org/multipage/parsing.html#after-doctype-public-identifier-state)
    pub(super) fn handle_after_doctype_public_identifier_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            Some(c) if Self::is_whitespace_char(c) => {
                self.switch_to(TokenizerState::BetweenDOCTYPEPublicAndSystemIdentifiers);
            }
            Some('>') => {
                self.switch_to(TokenizerState::Data);
                self.emit_doctype()?;
            }
            Some(quote @ ('"' | '\'')) => {
                self.parse_error("missing-whitespace-between-doctype-public-and-system-identifiers");
                self.open_doctype_identifier(false, quote);
            }
            None => self.eof_in_doctype()?,
            Some(_) => {
                self.parse_error("missing-quote-before-doctype-system-identifier");
                self.doctype.force_quirks = true;
                self.reconsume_in(TokenizerState::BogusDOCTYPE);
            }
        }
        Ok(())
    }

    /// [§ 13.2.5.62 Between DOCTYPE public and system identifiers state](https://html.spec.whatwg.org/multipage/parsing.html#between-doctype-public-and-system-identifiers-state)
    pub(super) fn handle_between_doctype_public_and_system_identifiers_state(
        &mut self,
    ) -> Result<(), ParseError> {
        match self.current_input_character {
            Some(c) if Self::is_whitespace_char(c) => {}
            Some('>') => {
                self.switch_to(TokenizerState::Data);
                self.emit_doctype()?;
            }
            Some(quote @ ('"' | '\'')) => self.open_doctype_identifier(false, quote),
            None => self.eof_in_doctype()?,
            Some(_) => {
                self.parse_error("missing-quote-before-doctype-system-identifier");
                self.doctype.force_quirks = true;
                self.reconsume_in(TokenizerState::BogusDOCTYPE);
            }
        }
        Ok(())
    }

    /// [§ 13.2.5.67 After DOCTYPE system identifier state](https://html.spec.whatwg.org/multipage/parsing.html#after-doctype-system-identifier-state)
    pub(super) fn handle_after_doctype_system_identifier_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            Some(c) if Self::is_whitespace_char(c) => {}
            Some('>') => {
                self.switch_to(TokenizerState::Data);
                self.emit_doctype()?;
            }
            None => self.eof_in_doctype()?,
            // "This is an unexpected-character-after-doctype-system-identifier
            // parse error. Reconsume in the bogus DOCTYPE state. (This does not
            // set the current DOCTYPE token's force-quirks flag to on.)"
            Some(_) => {
                self.parse_error("unexpected-character-after-doctype-system-identifier");
                self.reconsume_in(TokenizerState::BogusDOCTYPE);
            }
        }
        Ok(())
    }

    /// [§ 13.2.5.68 Bogus DOCTYPE state](https://html.spec.whatwg.org/multipage/parsing.html#bogus-doctype-state)
    pub(super) fn handle_bogus_doctype_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            Some('>') => {
                self.switch_to(TokenizerState::Data);
                self.emit_doctype()?;
            }
            Some('\0') => self.parse_error("unexpected-null-character"),
            None => {
                self.emit_doctype()?;
                self.emit_eof()?;
            }
            Some(_) => {}
        }
        Ok(())
    }

    /// "EOF - This is an eof-in-doctype parse error. Set the current DOCTYPE
    /// token's force-quirks flag to on. Emit the current DOCTYPE token. Emit
    /// an end-of-file token."
    fn eof_in_doctype(&mut self) -> Result<(), ParseError> {
        self.parse_error("eof-in-doctype");
        self.doctype.force_quirks = true;
        self.emit_doctype()?;
        self.emit_eof()
    }

    /// [§ 13.2.5.69 CDATA section state](https://html.spec.whatwg.org/multipage/parsing.html#cdata-section-state)
    pub(super) fn handle_cdata_section_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            Some(']') => self.switch_to(TokenizerState::CDATASectionBracket),
            None => {
                self.parse_error("eof-in-cdata");
                self.emit_eof()?;
            }
            Some(c) => self.emit_character(c)?,
        }
        Ok(())
    }

    /// [§ 13.2.5.70 CDATA section bracket state](https://html.spec.whatwg.org/multipage/parsing.html#cdata-section-bracket-state)
    pub(super) fn handle_cdata_section_bracket_state(&mut self) -> Result<(), ParseError> {
        if self.current_input_character == Some(']') {
            self.switch_to(TokenizerState::CDATASectionEnd);
        } else {
            self.emit_character(']')?;
            self.reconsume_in(TokenizerState::CDATASection);
        }
        Ok(())
    }

    /// [§ 13.2.5.71 CDATA section end state](https://html.spec.whatwg.org/multipage/parsing.html#cdata-section-end-state)
    pub(super) fn handle_cdata_section_end_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            Some(']') => self.emit_character(']')?,
            Some('>') => self.switch_to(TokenizerState::Data),
            _ => {
                self.emit_character(']')?;
                self.emit_character(']')?;
                self.reconsume_in(TokenizerState::CDATASection);
            }
        }
        Ok(())
    }
}

//! Token construction and emission, shared by all the state handlers.

use weft_common::Stage;

use super::core::{TagKind, Tokenizer, TokenizerResult, TokenizerState};
use super::token::{Attribute, Doctype, Tag, Token, TokenSink, TokenSinkResult};
use crate::config::XmlViolationPolicy;
use crate::error::ParseError;

const XML_CHARACTER_VIOLATION: &str = "This document is not mappable to XML 1.0 without data loss due to a character that is not a legal XML 1.0 character.";
const XML_COMMENT_VIOLATION: &str =
    "This document is not mappable to XML 1.0 without data loss due to “--” in a comment.";

impl<S: TokenSink> Tokenizer<S> {
    /// "Switch to the X state"
    pub(super) fn switch_to(&mut self, state: TokenizerState) {
        self.state = state;
    }

    /// "Reconsume in the X state"
    pub(super) fn reconsume_in(&mut self, state: TokenizerState) {
        self.reconsume = true;
        self.state = state;
    }

    /// Report a parse error at the current position.
    pub(super) fn parse_error(&self, code: &str) {
        self.reporter.error(Stage::Tokenizer, code, self.position());
    }

    /// [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
    ///
    /// "ASCII whitespace: U+0009 TAB, U+000A LF, U+000C FF, or U+0020 SPACE."
    pub(super) const fn is_whitespace_char(c: char) -> bool {
        matches!(c, '\t' | '\n' | '\u{000C}' | ' ')
    }

    /// [Infra: noncharacter](https://infra.spec.whatwg.org/#noncharacter)
    pub(super) const fn is_noncharacter(c: char) -> bool {
        let code = c as u32;
        matches!(code, 0xFDD0..=0xFDEF) || code & 0xFFFE == 0xFFFE
    }

    /// [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#appropriate-end-tag-token)
    ///
    /// "An appropriate end tag token is an end tag token whose tag name matches
    /// the tag name of the last start tag to have been emitted from this
    /// tokenizer, if any."
    pub(super) fn is_appropriate_end_tag_token(&self) -> bool {
        self.tag_kind == TagKind::End
            && self.last_start_tag_name.as_deref() == Some(self.tag_name.as_str())
    }

    /// "Create a new start tag token" / "Create a new end tag token", "set its
    /// tag name to the empty string".
    pub(super) fn create_tag(&mut self, kind: TagKind) {
        self.tag_kind = kind;
        self.tag_name.clear();
        self.self_closing = false;
        self.attributes.clear();
        self.attribute_name.clear();
        self.attribute_value.clear();
        self.in_attribute = false;
    }

    /// "Start a new attribute in the current tag token."
    pub(super) fn start_attribute(&mut self) -> Result<(), ParseError> {
        self.finish_attribute()?;
        self.in_attribute = true;
        Ok(())
    }

    /// Attach the attribute under construction to the current tag.
    ///
    /// [§ 13.2.5.33 Attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-name-state):
    /// "if there is already an attribute on the token with the exact same name,
    /// then this is a duplicate-attribute parse error and the new attribute
    /// must be removed from the token."
    pub(super) fn finish_attribute(&mut self) -> Result<(), ParseError> {
        if !self.in_attribute {
            return Ok(());
        }
        self.in_attribute = false;
        let name = std::mem::take(&mut self.attribute_name);
        let mut value = std::mem::take(&mut self.attribute_value);

        if self.attributes.iter().any(|a| a.name == name) {
            self.reporter.error(
                Stage::Tokenizer,
                format!("Duplicate attribute “{name}”."),
                self.position(),
            );
            return Ok(());
        }

        if self.xml_policy != XmlViolationPolicy::Allow && !is_xml_name(&name) {
            let message = format!("Attribute “{name}” is not serializable as XML 1.0.");
            if self.xml_policy == XmlViolationPolicy::Fatal {
                return Err(self.xml_fatal(message));
            }
            self.reporter
                .warning(Stage::Tokenizer, format!("{message} Dropping it."), self.position());
            return Ok(());
        }

        if value.chars().any(|c| xml_replacement(c).is_some()) {
            value = self.xml_clean_text(&value)?;
        }
        self.attributes.push(Attribute::new(name, value));
        Ok(())
    }

    /// Queue a character token. Runs are handed to the sink as one token.
    pub(super) fn emit_character(&mut self, c: char) -> Result<(), ParseError> {
        match xml_replacement(c) {
            None => self.pending_characters.push(c),
            Some(replacement) => {
                let c = self.xml_violation(XML_CHARACTER_VIOLATION, c, replacement)?;
                self.pending_characters.push(c);
            }
        }
        Ok(())
    }

    /// "Emit ... a character token for each of the characters in the temporary
    /// buffer (in the order they were added to the buffer)."
    pub(super) fn emit_temporary_buffer(&mut self) -> Result<(), ParseError> {
        let buffer = std::mem::take(&mut self.temporary_buffer);
        for c in buffer.chars() {
            self.emit_character(c)?;
        }
        self.temporary_buffer = buffer;
        Ok(())
    }

    /// Hand the queued character run to the sink.
    pub(super) fn flush_characters(&mut self) -> Result<(), ParseError> {
        if self.pending_characters.is_empty() {
            return Ok(());
        }
        let text = std::mem::take(&mut self.pending_characters);
        self.process(Token::Characters(text))
    }

    /// "Emit the current tag token."
    pub(super) fn emit_tag(&mut self) -> Result<(), ParseError> {
        self.finish_attribute()?;
        let name = std::mem::take(&mut self.tag_name);
        let attributes = std::mem::take(&mut self.attributes);

        match self.tag_kind {
            TagKind::Start => {
                if name == "meta"
                    && self.meta_boundary_passed
                    && attributes.iter().any(|a| a.name == "charset")
                {
                    self.reporter.error(
                        Stage::Tokenizer,
                        "A charset attribute on a meta element found after the first 512 bytes.",
                        self.position(),
                    );
                }
                self.last_start_tag_name = Some(name.clone());
                self.process(Token::StartTag(Tag {
                    name,
                    self_closing: self.self_closing,
                    attributes,
                }))
            }
            TagKind::End => {
                // "When an end tag token is emitted with attributes, that is an
                // end-tag-with-attributes parse error. When an end tag token is
                // emitted with its self-closing flag set, that is an
                // end-tag-with-trailing-solidus parse error."
                if !attributes.is_empty() {
                    self.parse_error("end-tag-with-attributes");
                }
                if self.self_closing {
                    self.parse_error("end-tag-with-trailing-solidus");
                }
                self.process(Token::EndTag(Tag::new(name)))
            }
        }
    }

    /// "Emit the current comment token."
    pub(super) fn emit_comment(&mut self) -> Result<(), ParseError> {
        let mut data = std::mem::take(&mut self.comment);
        if data.contains("--") || data.ends_with('-') {
            match self.xml_policy {
                XmlViolationPolicy::Allow => {
                    self.reporter
                        .warning(Stage::Tokenizer, XML_COMMENT_VIOLATION, self.position());
                }
                XmlViolationPolicy::Fatal => return Err(self.xml_fatal(XML_COMMENT_VIOLATION)),
                XmlViolationPolicy::AlterInfoset => {
                    self.reporter
                        .warning(Stage::Tokenizer, XML_COMMENT_VIOLATION, self.position());
                    while data.contains("--") {
                        data = data.replace("--", "- -");
                    }
                    if data.ends_with('-') {
                        data.push(' ');
                    }
                }
            }
        }
        self.process(Token::Comment(data))
    }

    /// "Emit the current DOCTYPE token."
    pub(super) fn emit_doctype(&mut self) -> Result<(), ParseError> {
        let doctype = std::mem::take(&mut self.doctype);
        self.process(Token::Doctype(doctype))
    }

    /// "Create a new DOCTYPE token."
    pub(super) fn create_doctype(&mut self) {
        self.doctype = Doctype::default();
    }

    /// "Emit an end-of-file token."
    pub(super) fn emit_eof(&mut self) -> Result<(), ParseError> {
        self.process(Token::EndOfFile)?;
        self.eof_emitted = true;
        Ok(())
    }

    /// Pass a token to the sink and act on its answer.
    ///
    /// A suspension or encoding change is held back until the token handler
    /// that emitted the token returns; the first one requested wins.
    fn process(&mut self, token: Token) -> Result<(), ParseError> {
        if !matches!(token, Token::Characters(_)) {
            self.flush_characters()?;
        }
        let position = self.position();
        match self.sink.process_token(token, position)? {
            TokenSinkResult::Continue => {}
            TokenSinkResult::SwitchTo(state) => self.state = state,
            TokenSinkResult::Suspend => {
                if self.pending_result.is_none() {
                    self.pending_result = Some(TokenizerResult::Suspended);
                }
            }
            TokenSinkResult::SwitchToAndSuspend(state) => {
                self.state = state;
                if self.pending_result.is_none() {
                    self.pending_result = Some(TokenizerResult::Suspended);
                }
            }
            TokenSinkResult::EncodingIndicator(label) => {
                if self.pending_result.is_none() {
                    self.pending_result = Some(TokenizerResult::EncodingChange(label));
                }
            }
        }
        Ok(())
    }

    fn xml_clean_text(&self, text: &str) -> Result<String, ParseError> {
        let mut cleaned = String::with_capacity(text.len());
        for c in text.chars() {
            match xml_replacement(c) {
                None => cleaned.push(c),
                Some(replacement) => {
                    cleaned.push(self.xml_violation(XML_CHARACTER_VIOLATION, c, replacement)?);
                }
            }
        }
        Ok(cleaned)
    }

    /// Apply the XML violation policy to one character. Returns the character
    /// to keep.
    fn xml_violation(&self, message: &str, c: char, replacement: char) -> Result<char, ParseError> {
        match self.xml_policy {
            XmlViolationPolicy::Allow => {
                self.reporter.warning(Stage::Tokenizer, message, self.position());
                Ok(c)
            }
            XmlViolationPolicy::AlterInfoset => {
                self.reporter.warning(Stage::Tokenizer, message, self.position());
                Ok(replacement)
            }
            XmlViolationPolicy::Fatal => Err(self.xml_fatal(message)),
        }
    }

    fn xml_fatal(&self, message: impl Into<String>) -> ParseError {
        let message = message.into();
        self.reporter
            .fatal(Stage::Tokenizer, message.clone(), self.position());
        ParseError::XmlViolation(message)
    }
}

/// The XML-safe stand-in for `c`, or `None` if `c` is a legal XML 1.0
/// character. U+0000 is left to the tokenizer's own handling.
const fn xml_replacement(c: char) -> Option<char> {
    match c {
        '\0' | '\t' | '\n' | '\r' => None,
        '\u{000B}' | '\u{000C}' => Some(' '),
        c if (c as u32) < 0x20 => Some('\u{FFFD}'),
        '\u{FFFE}' | '\u{FFFF}' => Some('\u{FFFD}'),
        _ => None,
    }
}

/// [XML 1.0 § 2.3 Common Syntactic Constructs](https://www.w3.org/TR/xml/#NT-Name),
/// colons allowed.
fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(is_xml_name_start) && chars.all(is_xml_name_char)
}

const fn is_xml_name_start(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z'
        | '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}' | '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' | '\u{10000}'..='\u{EFFFF}')
}

const fn is_xml_name_char(c: char) -> bool {
    is_xml_name_start(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' | '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xml_names() {
        assert!(is_xml_name("href"));
        assert!(is_xml_name("xlink:href"));
        assert!(is_xml_name("data-x.y_z"));
        assert!(!is_xml_name("1st"));
        assert!(!is_xml_name("a<b"));
        assert!(!is_xml_name(""));
    }

    #[test]
    fn test_xml_replacements() {
        assert_eq!(xml_replacement('a'), None);
        assert_eq!(xml_replacement('\u{000C}'), Some(' '));
        assert_eq!(xml_replacement('\u{0001}'), Some('\u{FFFD}'));
        assert_eq!(xml_replacement('\u{FFFF}'), Some('\u{FFFD}'));
        assert_eq!(xml_replacement('\0'), None);
    }
}

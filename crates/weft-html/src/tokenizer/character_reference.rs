//! Character reference states.
//!
//! [§ 13.2.5.72 Character reference state](https://html.spec.whatwg.org/multipage/parsing.html#character-reference-state)
//!
//! Named references are matched one character at a time against a narrowing
//! range of the sorted reference table, remembering the longest complete
//! match. When the range runs dry, the characters consumed past that match
//! are passed through literally.

use super::core::{NamedReferenceMatch, Tokenizer, TokenizerState};
use super::named_character_references::{NAMED_CHARACTER_REFERENCES, prefix_range};
use super::token::TokenSink;
use crate::error::ParseError;

/// The largest value the character reference code is allowed to reach. Any
/// bigger value is already outside Unicode.
const CODE_CAP: u32 = 0x0011_0000;

/// [§ 13.2.5.80 Numeric character reference end state](https://html.spec.whatwg.org/multipage/parsing.html#numeric-character-reference-end-state)
///
/// "If the number is one of the numbers in the first column of the following
/// table, then find the row with that number in the first column, and set the
/// character reference code to the number in the second column of that row."
fn c1_replacement(code: u32) -> Option<u32> {
    Some(match code {
        0x80 => 0x20AC,
        0x82 => 0x201A,
        0x83 => 0x0192,
        0x84 => 0x201E,
        0x85 => 0x2026,
        0x86 => 0x2020,
        0x87 => 0x2021,
        0x88 => 0x02C6,
        0x89 => 0x2030,
        0x8A => 0x0160,
        0x8B => 0x2039,
        0x8C => 0x0152,
        0x8E => 0x017D,
        0x91 => 0x2018,
        0x92 => 0x2019,
        0x93 => 0x201C,
        0x94 => 0x201D,
        0x95 => 0x2022,
        0x96 => 0x2013,
        0x97 => 0x2014,
        0x98 => 0x02DC,
        0x99 => 0x2122,
        0x9A => 0x0161,
        0x9B => 0x203A,
        0x9C => 0x0153,
        0x9E => 0x017E,
        0x9F => 0x0178,
        _ => return None,
    })
}

impl<S: TokenSink> Tokenizer<S> {
    /// "If the character reference was consumed as part of an attribute"
    pub(super) const fn is_consumed_as_part_of_attribute(&self) -> bool {
        matches!(
            self.return_state,
            TokenizerState::AttributeValueDoubleQuoted
                | TokenizerState::AttributeValueSingleQuoted
                | TokenizerState::AttributeValueUnquoted
        )
    }

    /// "Flush code points consumed as a character reference": "If the
    /// character reference was consumed as part of an attribute, then append
    /// each character to the current attribute's value. Otherwise, emit each
    /// character as a character token."
    fn flush_code_points_consumed_as_character_reference(&mut self) -> Result<(), ParseError> {
        let buffer = std::mem::take(&mut self.temporary_buffer);
        self.append_reference_text(&buffer)?;
        self.temporary_buffer = buffer;
        Ok(())
    }

    fn append_reference_text(&mut self, text: &str) -> Result<(), ParseError> {
        if self.is_consumed_as_part_of_attribute() {
            self.attribute_value.push_str(text);
        } else {
            for c in text.chars() {
                self.emit_character(c)?;
            }
        }
        Ok(())
    }

    /// [§ 13.2.5.72 Character reference state](https://html.spec.whatwg.org/multipage/parsing.html#character-reference-state)
    pub(super) fn handle_character_reference_state(&mut self) -> Result<(), ParseError> {
        // "Set the temporary buffer to the empty string. Append a U+0026
        // AMPERSAND (&) character to the temporary buffer."
        self.temporary_buffer.clear();
        self.temporary_buffer.push('&');
        match self.current_input_character {
            // "ASCII alphanumeric - Reconsume in the named character reference state."
            Some(c) if c.is_ascii_alphanumeric() => {
                self.named_reference = NamedReferenceMatch {
                    lo: 0,
                    hi: NAMED_CHARACTER_REFERENCES.len(),
                    ..NamedReferenceMatch::default()
                };
                self.reconsume_in(TokenizerState::NamedCharacterReference);
            }
            // "U+0023 NUMBER SIGN (#) - Append the current input character to
            // the temporary buffer. Switch to the numeric character reference
            // state."
            Some('#') => {
                self.temporary_buffer.push('#');
                self.switch_to(TokenizerState::NumericCharacterReference);
            }
            // "Flush code points consumed as a character reference. Reconsume
            // in the return state."
            _ => {
                self.flush_code_points_consumed_as_character_reference()?;
                self.reconsume_in(self.return_state);
            }
        }
        Ok(())
    }

    /// [§ 13.2.5.73 Named character reference state](https://html.spec.whatwg.org/multipage/parsing.html#named-character-reference-state)
    ///
    /// "Consume the maximum number of characters possible, where the consumed
    /// characters are one of the identifiers in the first column of the named
    /// character references table."
    pub(super) fn handle_named_character_reference_state(&mut self) -> Result<(), ParseError> {
        if let Some(c) = self.current_input_character
            && (c.is_ascii_alphanumeric() || c == ';')
        {
            let mut candidate = self.named_reference.name.clone();
            candidate.push(c);
            let (lo, hi) = prefix_range(self.named_reference.lo, self.named_reference.hi, &candidate);
            if lo < hi {
                let (name, value) = NAMED_CHARACTER_REFERENCES[lo];
                if name == candidate {
                    self.named_reference.best = Some((candidate.len(), value));
                }
                self.named_reference.lo = lo;
                self.named_reference.hi = hi;
                self.named_reference.name = candidate;
                // No reference name continues past a semicolon.
                if c == ';' {
                    self.finish_named_reference(false)?;
                }
                return Ok(());
            }
        }
        self.finish_named_reference(true)
    }

    /// The longest match is known. `reconsume` is true when the current input
    /// character was not part of the name.
    fn finish_named_reference(&mut self, reconsume: bool) -> Result<(), ParseError> {
        let state = std::mem::take(&mut self.named_reference);
        let name = state.name;

        let Some((length, value)) = state.best else {
            // "Otherwise - Flush code points consumed as a character reference.
            // Switch to the ambiguous ampersand state."
            self.temporary_buffer.clear();
            self.temporary_buffer.push('&');
            self.temporary_buffer.push_str(&name);
            self.flush_code_points_consumed_as_character_reference()?;
            self.continue_in(TokenizerState::AmbiguousAmpersand, reconsume);
            return Ok(());
        };

        let matched = &name[..length];
        let rest = &name[length..];
        let ends_with_semicolon = matched.ends_with(';');
        let next_input_character = rest.chars().next().or(if reconsume {
            self.current_input_character
        } else {
            None
        });

        // "If the character reference was consumed as part of an attribute,
        // and the last character matched is not a U+003B SEMICOLON character
        // (;), and the next input character is either a U+003D EQUALS SIGN
        // character (=) or an ASCII alphanumeric, then, for historical reasons,
        // flush code points consumed as a character reference and switch to
        // the return state."
        if self.is_consumed_as_part_of_attribute()
            && !ends_with_semicolon
            && next_input_character.is_some_and(|c| c == '=' || c.is_ascii_alphanumeric())
        {
            self.temporary_buffer.clear();
            self.temporary_buffer.push('&');
            self.temporary_buffer.push_str(&name);
            self.flush_code_points_consumed_as_character_reference()?;
            self.continue_in(self.return_state, reconsume);
            return Ok(());
        }

        // "If the last character matched is not a U+003B SEMICOLON character
        // (;), then this is a missing-semicolon-after-character-reference parse
        // error."
        if !ends_with_semicolon {
            self.parse_error("missing-semicolon-after-character-reference");
        }
        // "Set the temporary buffer to the empty string. Append one or two
        // characters corresponding to the character reference name to the
        // temporary buffer. Flush code points consumed as a character
        // reference. Switch to the return state."
        self.temporary_buffer.clear();
        self.temporary_buffer.push_str(value);
        self.flush_code_points_consumed_as_character_reference()?;
        self.append_reference_text(rest)?;
        self.continue_in(self.return_state, reconsume);
        Ok(())
    }

    fn continue_in(&mut self, state: TokenizerState, reconsume: bool) {
        if reconsume {
            self.reconsume_in(state);
        } else {
            self.switch_to(state);
        }
    }

    /// [§ 13.2.5.74 Ambiguous ampersand state](https://html.spec.whatwg.org/multipage/parsing.html#ambiguous-ampersand-state)
    pub(super) fn handle_ambiguous_ampersand_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            Some(c) if c.is_ascii_alphanumeric() => {
                let mut buffer = [0; 4];
                self.append_reference_text(c.encode_utf8(&mut buffer))?;
            }
            // "This is an unknown-named-character-reference parse error.
            // Reconsume in the return state."
            Some(';') => {
                self.parse_error("unknown-named-character-reference");
                self.reconsume_in(self.return_state);
            }
            _ => self.reconsume_in(self.return_state),
        }
        Ok(())
    }

    /// [§ 13.2.5.75 Numeric character reference state](https://html.spec.whatwg.org/multipage/parsing.html#numeric-character-reference-state)
    pub(super) fn handle_numeric_character_reference_state(&mut self) {
        // "Set the character reference code to zero (0)."
        self.character_reference_code = 0;
        match self.current_input_character {
            Some(c @ ('x' | 'X')) => {
                self.temporary_buffer.push(c);
                self.switch_to(TokenizerState::HexadecimalCharacterReferenceStart);
            }
            _ => self.reconsume_in(TokenizerState::DecimalCharacterReferenceStart),
        }
    }

    /// [§ 13.2.5.76 Hexadecimal character reference start state](https://html.spec.whatwg.org/multipage/parsing.html#hexadecimal-character-reference-start-state)
    pub(super) fn handle_hexadecimal_character_reference_start_state(
        &mut self,
    ) -> Result<(), ParseError> {
        match self.current_input_character {
            Some(c) if c.is_ascii_hexdigit() => {
                self.reconsume_in(TokenizerState::HexadecimalCharacterReference);
                Ok(())
            }
            _ => self.absence_of_digits(),
        }
    }

    /// [§ 13.2.5.77 Decimal character reference start state](https://html.spec.whatwg.org/multipage/parsing.html#decimal-character-reference-start-state)
    pub(super) fn handle_decimal_character_reference_start_state(
        &mut self,
    ) -> Result<(), ParseError> {
        match self.current_input_character {
            Some(c) if c.is_ascii_digit() => {
                self.reconsume_in(TokenizerState::DecimalCharacterReference);
                Ok(())
            }
            _ => self.absence_of_digits(),
        }
    }

    /// "This is an absence-of-digits-in-numeric-character-reference parse
    /// error. Flush code points consumed as a character reference. Reconsume
    /// in the return state."
    fn absence_of_digits(&mut self) -> Result<(), ParseError> {
        self.parse_error("absence-of-digits-in-numeric-character-reference");
        self.flush_code_points_consumed_as_character_reference()?;
        self.reconsume_in(self.return_state);
        Ok(())
    }

    /// [§ 13.2.5.78 Hexadecimal character reference state](https://html.spec.whatwg.org/multipage/parsing.html#hexadecimal-character-reference-state)
    pub(super) fn handle_hexadecimal_character_reference_state(&mut self) -> Result<(), ParseError> {
        self.accumulate_digits(16)
    }

    /// [§ 13.2.5.79 Decimal character reference state](https://html.spec.whatwg.org/multipage/parsing.html#decimal-character-reference-state)
    pub(super) fn handle_decimal_character_reference_state(&mut self) -> Result<(), ParseError> {
        self.accumulate_digits(10)
    }

    fn accumulate_digits(&mut self, radix: u32) -> Result<(), ParseError> {
        match self.current_input_character {
            // "Multiply the character reference code by 16. Add a numeric
            // version of the current input character to the character
            // reference code."
            Some(c) if c.is_digit(radix) => {
                let digit = c.to_digit(radix).unwrap_or(0);
                self.character_reference_code = self
                    .character_reference_code
                    .saturating_mul(radix)
                    .saturating_add(digit)
                    .min(CODE_CAP);
                Ok(())
            }
            // "U+003B SEMICOLON - Switch to the numeric character reference end
            // state." That state consumes nothing, so it runs right away.
            Some(';') => {
                self.finish_numeric_reference()?;
                self.switch_to(self.return_state);
                Ok(())
            }
            // "This is a missing-semicolon-after-character-reference parse
            // error. Reconsume in the numeric character reference end state."
            _ => {
                self.parse_error("missing-semicolon-after-character-reference");
                self.reconsume_in(TokenizerState::NumericCharacterReferenceEnd);
                Ok(())
            }
        }
    }

    /// [§ 13.2.5.80 Numeric character reference end state](https://html.spec.whatwg.org/multipage/parsing.html#numeric-character-reference-end-state)
    ///
    /// Only reached by reconsuming, so the current input character goes back
    /// to the return state afterwards.
    pub(super) fn handle_numeric_character_reference_end_state(&mut self) -> Result<(), ParseError> {
        self.finish_numeric_reference()?;
        self.reconsume_in(self.return_state);
        Ok(())
    }

    /// "Check the character reference code", then "set the temporary buffer to
    /// the empty string. Append a code point equal to the character reference
    /// code to the temporary buffer. Flush code points consumed as a character
    /// reference."
    fn finish_numeric_reference(&mut self) -> Result<(), ParseError> {
        let mut code = self.character_reference_code;
        if code == 0 {
            // "If the number is 0x00, then this is a null-character-reference
            // parse error. Set the character reference code to 0xFFFD."
            self.parse_error("null-character-reference");
            code = 0xFFFD;
        } else if code > 0x0010_FFFF {
            self.parse_error("character-reference-outside-unicode-range");
            code = 0xFFFD;
        } else if (0xD800..=0xDFFF).contains(&code) {
            self.parse_error("surrogate-character-reference");
            code = 0xFFFD;
        } else if char::from_u32(code).is_some_and(Self::is_noncharacter) {
            self.parse_error("noncharacter-character-reference");
        } else if code == 0x0D
            || char::from_u32(code)
                .is_some_and(|c| c.is_control() && !Self::is_whitespace_char(c))
        {
            // "If the number is 0x0D, or a control that's not ASCII
            // whitespace, then this is a control-character-reference parse
            // error."
            self.parse_error("control-character-reference");
            if let Some(replacement) = c1_replacement(code) {
                code = replacement;
            }
        }

        self.temporary_buffer.clear();
        self.temporary_buffer
            .push(char::from_u32(code).unwrap_or('\u{FFFD}'));
        self.flush_code_points_consumed_as_character_reference()
    }
}

#[cfg(test)]
mod tests {
    use super::c1_replacement;

    #[test]
    fn test_c1_table() {
        assert_eq!(c1_replacement(0x80), Some(0x20AC));
        assert_eq!(c1_replacement(0x9F), Some(0x0178));
        assert_eq!(c1_replacement(0x81), None);
        assert_eq!(c1_replacement(0x41), None);
    }
}

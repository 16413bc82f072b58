//! Script data states: the escaped (`<!--`) and double-escaped
//! (`<!--<script>`) forms.

use super::core::{Tokenizer, TokenizerState};
use super::token::TokenSink;
use crate::error::ParseError;

impl<S: TokenSink> Tokenizer<S> {
    /// [§ 13.2.5.4 Script data state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-state)
    pub(super) fn handle_script_data_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            Some('<') => self.switch_to(TokenizerState::ScriptDataLessThanSign),
            Some('\0') => {
                self.parse_error("unexpected-null-character");
                self.emit_character('\u{FFFD}')?;
            }
            None => self.emit_eof()?,
            Some(c) => self.emit_character(c)?,
        }
        Ok(())
    }

    /// [§ 13.2.5.15 Script data less-than sign state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-less-than-sign-state)
    pub(super) fn handle_script_data_less_than_sign_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            Some('/') => {
                self.temporary_buffer.clear();
                self.switch_to(TokenizerState::ScriptDataEndTagOpen);
            }
            // "Switch to the script data escape start state. Emit a U+003C
            // LESS-THAN SIGN character token and a U+0021 EXCLAMATION MARK
            // character token."
            Some('!') => {
                self.switch_to(TokenizerState::ScriptDataEscapeStart);
                self.emit_character('<')?;
                self.emit_character('!')?;
            }
            _ => {
                self.emit_character('<')?;
                self.reconsume_in(TokenizerState::ScriptData);
            }
        }
        Ok(())
    }

    /// [§ 13.2.5.18 Script data escape start state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-escape-start-state)
    pub(super) fn handle_script_data_escape_start_state(&mut self) -> Result<(), ParseError> {
        if self.current_input_character == Some('-') {
            self.switch_to(TokenizerState::ScriptDataEscapeStartDash);
            self.emit_character('-')?;
        } else {
            self.reconsume_in(TokenizerState::ScriptData);
        }
        Ok(())
    }

    /// [§ 13.2.5.19 Script data escape start dash state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-escape-start-dash-state)
    pub(super) fn handle_script_data_escape_start_dash_state(&mut self) -> Result<(), ParseError> {
        if self.current_input_character == Some('-') {
            self.switch_to(TokenizerState::ScriptDataEscapedDashDash);
            self.emit_character('-')?;
        } else {
            self.reconsume_in(TokenizerState::ScriptData);
        }
        Ok(())
    }

    /// [§ 13.2.5.20 Script data escaped state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-escaped-state)
    pub(super) fn handle_script_data_escaped_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            Some('-') => {
                self.switch_to(TokenizerState::ScriptDataEscapedDash);
                self.emit_character('-')?;
            }
            Some('<') => self.switch_to(TokenizerState::ScriptDataEscapedLessThanSign),
            Some('\0') => {
                self.parse_error("unexpected-null-character");
                self.emit_character('\u{FFFD}')?;
            }
            // "This is an eof-in-script-html-comment-like-text parse error.
            // Emit an end-of-file token."
            None => {
                self.parse_error("eof-in-script-html-comment-like-text");
                self.emit_eof()?;
            }
            Some(c) => self.emit_character(c)?,
        }
        Ok(())
    }

    /// [§ 13.2.5.21 Script data escaped dash state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-escaped-dash-state)
    pub(super) fn handle_script_data_escaped_dash_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            Some('-') => {
                self.switch_to(TokenizerState::ScriptDataEscapedDashDash);
                self.emit_character('-')?;
            }
            Some('<') => self.switch_to(TokenizerState::ScriptDataEscapedLessThanSign),
            Some('\0') => {
                self.parse_error("unexpected-null-character");
                self.switch_to(TokenizerState::ScriptDataEscaped);
                self.emit_character('\u{FFFD}')?;
            }
            None => {
                self.parse_error("eof-in-script-html-comment-like-text");
                self.emit_eof()?;
            }
            Some(c) => {
                self.switch_to(TokenizerState::ScriptDataEscaped);
                self.emit_character(c)?;
            }
        }
        Ok(())
    }

    /// [§ 13.2.5.22 Script data escaped dash dash state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-escaped-dash-dash-state)
    pub(super) fn handle_script_data_escaped_dash_dash_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            Some('-') => self.emit_character('-')?,
            Some('<') => self.switch_to(TokenizerState::ScriptDataEscapedLessThanSign),
            Some('>') => {
                self.switch_to(TokenizerState::ScriptData);
                self.emit_character('>')?;
            }
            Some('\0') => {
                self.parse_error("unexpected-null-character");
                self.switch_to(TokenizerState::ScriptDataEscaped);
                self.emit_character('\u{FFFD}')?;
            }
            None => {
                self.parse_error("eof-in-script-html-comment-like-text");
                self.emit_eof()?;
            }
            Some(c) => {
                self.switch_to(TokenizerState::ScriptDataEscaped);
                self.emit_character(c)?;
            }
        }
        Ok(())
    }

    /// [§ 13.2.5.23 Script data escaped less-than sign state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-escaped-less-than-sign-state)
    pub(super) fn handle_script_data_escaped_less_than_sign_state(
        &mut self,
    ) -> Result<(), ParseError> {
        match self.current_input_character {
            Some('/') => {
                self.temporary_buffer.clear();
                self.switch_to(TokenizerState::ScriptDataEscapedEndTagOpen);
            }
            // "Set the temporary buffer to the empty string. Emit a U+003C
            // LESS-THAN SIGN character token. Reconsume in the script data
            // double escape start state."
            Some(c) if c.is_ascii_alphabetic() => {
                self.temporary_buffer.clear();
                self.emit_character('<')?;
                self.reconsume_in(TokenizerState::ScriptDataDoubleEscapeStart);
            }
            _ => {
                self.emit_character('<')?;
                self.reconsume_in(TokenizerState::ScriptDataEscaped);
            }
        }
        Ok(())
    }

    /// [§ 13.2.5.26 Script data double escape start state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-double-escape-start-state)
    /// and [§ 13.2.5.31 Script data double escape end state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-double-escape-end-state)
    /// differ only in which way they switch.
    fn handle_double_escape_boundary(
        &mut self,
        on_script: TokenizerState,
        otherwise: TokenizerState,
    ) -> Result<(), ParseError> {
        match self.current_input_character {
            // "If the temporary buffer is the string "script", then switch to
            // the script data double escaped state. Otherwise, switch to the
            // script data escaped state. Emit the current input character as a
            // character token."
            Some(c) if Self::is_whitespace_char(c) || c == '/' || c == '>' => {
                self.switch_to(if self.temporary_buffer == "script" {
                    on_script
                } else {
                    otherwise
                });
                self.emit_character(c)?;
            }
            Some(c) if c.is_ascii_alphabetic() => {
                self.temporary_buffer.push(c.to_ascii_lowercase());
                self.emit_character(c)?;
            }
            _ => self.reconsume_in(otherwise),
        }
        Ok(())
    }

    pub(super) fn handle_script_data_double_escape_start_state(&mut self) -> Result<(), ParseError> {
        self.handle_double_escape_boundary(
            TokenizerState::ScriptDataDoubleEscaped,
            TokenizerState::ScriptDataEscaped,
        )
    }

    pub(super) fn handle_script_data_double_escape_end_state(&mut self) -> Result<(), ParseError> {
        self.handle_double_escape_boundary(
            TokenizerState::ScriptDataEscaped,
            TokenizerState::ScriptDataDoubleEscaped,
        )
    }

    /// [§ 13.2.5.27 Script data double escaped state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-double-escaped-state)
    pub(super) fn handle_script_data_double_escaped_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            Some('-') => {
                self.switch_to(TokenizerState::ScriptDataDoubleEscapedDash);
                self.emit_character('-')?;
            }
            Some('<') => {
                self.switch_to(TokenizerState::ScriptDataDoubleEscapedLessThanSign);
                self.emit_character('<')?;
            }
            Some('\0') => {
                self.parse_error("unexpected-null-character");
                self.emit_character('\u{FFFD}')?;
            }
            None => {
                self.parse_error("eof-in-script-html-comment-like-text");
                self.emit_eof()?;
            }
            Some(c) => self.emit_character(c)?,
        }
        Ok(())
    }

    /// [§ 13.2.5.28 Script data double escaped dash state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-double-escaped-dash-state)
    pub(super) fn handle_script_data_double_escaped_dash_state(&mut self) -> Result<(), ParseError> {
        match self.current_input_character {
            Some('-') => {
                self.switch_to(TokenizerState::ScriptDataDoubleEscapedDashDash);
                self.emit_character('-')?;
            }
            Some('<') => {
                self.switch_to(TokenizerState::ScriptDataDoubleEscapedLessThanSign);
                self.emit_character('<')?;
            }
            Some('\0') => {
                self.parse_error("unexpected-null-character");
                self.switch_to(TokenizerState::ScriptDataDoubleEscaped);
                self.emit_character('\u{FFFD}')?;
            }
            None => {
                self.parse_error("eof-in-script-html-comment-like-text");
                self.emit_eof()?;
            }
            Some(c) => {
                self.switch_to(TokenizerState::ScriptDataDoubleEscaped);
                self.emit_character(c)?;
            }
        }
        Ok(())
    }

    /// [§ 13.2.5.29 Script data double escaped dash dash state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-double-escaped-dash-dash-state)
    pub(super) fn handle_script_data_double_escaped_dash_dash_state(
        &mut self,
    ) -> Result<(), ParseError> {
        match self.current_input_character {
            Some('-') => self.emit_character('-')?,
            Some('<') => {
                self.switch_to(TokenizerState::ScriptDataDoubleEscapedLessThanSign);
                self.emit_character('<')?;
            }
            Some('>') => {
                self.switch_to(TokenizerState::ScriptData);
                self.emit_character('>')?;
            }
            Some('\0') => {
                self.parse_error("unexpected-null-character");
                self.switch_to(TokenizerState::ScriptDataDoubleEscaped);
                self.emit_character('\u{FFFD}')?;
            }
            None => {
                self.parse_error("eof-in-script-html-comment-like-text");
                self.emit_eof()?;
            }
            Some(c) => {
                self.switch_to(TokenizerState::ScriptDataDoubleEscaped);
                self.emit_character(c)?;
            }
        }
        Ok(())
    }

    /// [§ 13.2.5.30 Script data double escaped less-than sign state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-double-escaped-less-than-sign-state)
    pub(super) fn handle_script_data_double_escaped_less_than_sign_state(
        &mut self,
    ) -> Result<(), ParseError> {
        if self.current_input_character == Some('/') {
            // "Set the temporary buffer to the empty string. Switch to the
            // script data double escape end state. Emit a U+002F SOLIDUS
            // character token."
            self.temporary_buffer.clear();
            self.switch_to(TokenizerState::ScriptDataDoubleEscapeEnd);
            self.emit_character('/')?;
        } else {
            self.reconsume_in(TokenizerState::ScriptDataDoubleEscaped);
        }
        Ok(())
    }
}

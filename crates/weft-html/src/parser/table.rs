//! Table and select insertion modes.

use super::body::is_hidden_input;
use super::core::{InsertionMode, TreeBuilder, TreeToken};
use super::sink::TreeSink;
use super::tags::{Scope, TABLE_CELLS, TABLE_SECTIONS};
use crate::error::ParseError;
use crate::tokenizer::Tag;

/// Current nodes for which "in table" diverts character tokens to "in table
/// text".
const TABLE_TEXT_PARENTS: &[&str] = &["table", "tbody", "template", "tfoot", "thead", "tr"];

/// Start tags that leave a select that sits inside a table.
const SELECT_IN_TABLE_BREAKOUTS: &[&str] =
    &["caption", "table", "tbody", "tfoot", "thead", "tr", "td", "th"];

impl<S: TreeSink> TreeBuilder<S> {
    /// [§ 13.2.6.4.9 The "in table" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intable)
    pub(super) fn handle_in_table_mode(&mut self, token: &TreeToken) -> Result<(), ParseError> {
        match token {
            TreeToken::Whitespace(_) | TreeToken::Characters(_) | TreeToken::Null
                if self.current_node_is_one_of(TABLE_TEXT_PARENTS) =>
            {
                // "Let the pending table character tokens be an empty list of
                // tokens. Let the original insertion mode be the current
                // insertion mode. Switch the insertion mode to "in table
                // text" and reprocess the token."
                self.pending_table_text.clear();
                self.pending_table_text_is_whitespace = true;
                self.original_mode = self.mode;
                self.switch_mode(InsertionMode::InTableText);
                self.reprocess_token(token)
            }
            TreeToken::Comment(data) => self.insert_comment(data),
            TreeToken::Doctype(_) => {
                self.parse_error("Stray doctype.");
                Ok(())
            }
            TreeToken::StartTag(tag) => match tag.name.as_str() {
                "caption" => {
                    self.clear_stack_back_to(&["table", "template", "html"])?;
                    self.push_active_formatting_marker();
                    let _ = self.insert_html_element(tag)?;
                    self.switch_mode(InsertionMode::InCaption);
                    Ok(())
                }
                "colgroup" => {
                    self.clear_stack_back_to(&["table", "template", "html"])?;
                    let _ = self.insert_html_element(tag)?;
                    self.switch_mode(InsertionMode::InColumnGroup);
                    Ok(())
                }
                "col" => {
                    self.clear_stack_back_to(&["table", "template", "html"])?;
                    let _ = self.insert_html_element(&Tag::new("colgroup"))?;
                    self.switch_mode(InsertionMode::InColumnGroup);
                    self.reprocess_token(token)
                }
                "tbody" | "tfoot" | "thead" => {
                    self.clear_stack_back_to(&["table", "template", "html"])?;
                    let _ = self.insert_html_element(tag)?;
                    self.switch_mode(InsertionMode::InTableBody);
                    Ok(())
                }
                "td" | "th" | "tr" => {
                    self.clear_stack_back_to(&["table", "template", "html"])?;
                    let _ = self.insert_html_element(&Tag::new("tbody"))?;
                    self.switch_mode(InsertionMode::InTableBody);
                    self.reprocess_token(token)
                }
                "table" => {
                    self.parse_error("Start tag for “table” seen but the previous “table” is still open.");
                    if !self.has_in_table_scope("table") {
                        return Ok(());
                    }
                    self.pop_until_tag("table")?;
                    self.reset_insertion_mode_appropriately();
                    self.reprocess_token(token)
                }
                "style" | "script" | "template" => self.handle_in_head_mode(token),
                "input" if is_hidden_input(tag) => {
                    self.parse_error("Start tag “input” seen in “table”.");
                    let _ = self.insert_void_html_element(tag)?;
                    Ok(())
                }
                "form" => {
                    self.parse_error("Start tag “form” seen in “table”.");
                    if self.stack_has_html("template") || self.form_element.is_some() {
                        return Ok(());
                    }
                    let form = self.insert_html_element(tag)?;
                    self.form_element = Some(form);
                    let _ = self.pop()?;
                    Ok(())
                }
                _ => self.handle_in_table_anything_else(token),
            },
            TreeToken::EndTag(tag) => match tag.name.as_str() {
                "table" => {
                    if !self.has_in_table_scope("table") {
                        self.parse_error("Stray end tag “table”.");
                        return Ok(());
                    }
                    self.pop_until_tag("table")?;
                    self.reset_insertion_mode_appropriately();
                    Ok(())
                }
                "body" | "caption" | "col" | "colgroup" | "html" | "tbody" | "td" | "tfoot"
                | "th" | "thead" | "tr" => {
                    self.parse_error(format!("Stray end tag “{}”.", tag.name));
                    Ok(())
                }
                "template" => self.handle_in_head_mode(token),
                _ => self.handle_in_table_anything_else(token),
            },
            TreeToken::Eof => self.handle_in_body_mode(token),
            _ => self.handle_in_table_anything_else(token),
        }
    }

    /// "Parse error. Enable foster parenting, process the token using the
    /// rules for the "in body" insertion mode, and then disable foster
    /// parenting."
    fn handle_in_table_anything_else(&mut self, token: &TreeToken) -> Result<(), ParseError> {
        match token {
            TreeToken::StartTag(tag) => {
                self.parse_error(format!("Start tag “{}” seen in “table”.", tag.name));
            }
            TreeToken::EndTag(tag) => {
                self.parse_error(format!("End tag “{}” seen in “table”.", tag.name));
            }
            _ => self.parse_error("Misplaced non-space characters inside a table."),
        }
        self.foster_parenting = true;
        let result = self.handle_in_body_mode(token);
        self.foster_parenting = false;
        result
    }

    /// [§ 13.2.6.4.9](https://html.spec.whatwg.org/multipage/parsing.html#clear-the-stack-back-to-a-table-context)
    ///
    /// Covers the table, table body and table row contexts; `boundary` names
    /// the elements that stop the popping.
    fn clear_stack_back_to(&mut self, boundary: &[&str]) -> Result<(), ParseError> {
        while self
            .current_node()
            .is_some_and(|node| !node.is_html_one_of(boundary))
        {
            let _ = self.pop()?;
        }
        Ok(())
    }

    /// [§ 13.2.6.4.10 The "in table text" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intabletext)
    pub(super) fn handle_in_table_text_mode(&mut self, token: &TreeToken) -> Result<(), ParseError> {
        match token {
            TreeToken::Null => {
                self.parse_error("Saw U+0000 in text.");
                Ok(())
            }
            TreeToken::Whitespace(text) => {
                self.pending_table_text.push_str(text);
                Ok(())
            }
            TreeToken::Characters(text) => {
                self.pending_table_text.push_str(text);
                self.pending_table_text_is_whitespace = false;
                Ok(())
            }
            _ => {
                self.flush_pending_table_text()?;
                self.switch_mode(self.original_mode);
                self.reprocess_token(token)
            }
        }
    }

    /// "If any of the tokens in the pending table character tokens list are
    /// character tokens that are not ASCII whitespace, then this is a parse
    /// error: reprocess the character tokens in the pending table character
    /// tokens list using the rules given in the "anything else" entry in the
    /// "in table" insertion mode. Otherwise, insert the characters given by
    /// the pending table character tokens list."
    fn flush_pending_table_text(&mut self) -> Result<(), ParseError> {
        let text = std::mem::take(&mut self.pending_table_text);
        if text.is_empty() {
            return Ok(());
        }
        if self.pending_table_text_is_whitespace {
            return self.insert_character(&text);
        }
        self.handle_in_table_anything_else(&TreeToken::Characters(text))
    }

    /// [§ 13.2.6.4.11 The "in caption" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incaption)
    pub(super) fn handle_in_caption_mode(&mut self, token: &TreeToken) -> Result<(), ParseError> {
        match token {
            TreeToken::EndTag(tag) if tag.name == "caption" => {
                let _ = self.close_caption()?;
                Ok(())
            }
            TreeToken::StartTag(tag)
                if matches!(
                    tag.name.as_str(),
                    "caption" | "col" | "colgroup" | "tbody" | "td" | "tfoot" | "th" | "thead"
                        | "tr"
                ) =>
            {
                if self.close_caption()? {
                    return self.reprocess_token(token);
                }
                Ok(())
            }
            TreeToken::EndTag(tag) if tag.name == "table" => {
                if self.close_caption()? {
                    return self.reprocess_token(token);
                }
                Ok(())
            }
            TreeToken::EndTag(tag)
                if matches!(
                    tag.name.as_str(),
                    "body" | "col" | "colgroup" | "html" | "tbody" | "td" | "tfoot" | "th"
                        | "thead" | "tr"
                ) =>
            {
                self.parse_error(format!("Stray end tag “{}”.", tag.name));
                Ok(())
            }
            _ => self.handle_in_body_mode(token),
        }
    }

    /// Returns false if there was no caption to close.
    fn close_caption(&mut self) -> Result<bool, ParseError> {
        // "If the stack of open elements does not have a caption element in
        // table scope, this is a parse error; ignore the token. (fragment
        // case)"
        if !self.has_in_table_scope("caption") {
            self.parse_error("Stray end tag “caption”.");
            return Ok(false);
        }
        self.generate_implied_end_tags()?;
        if !self.current_node_is("caption") {
            self.parse_error("End tag “caption” seen, but there were open elements.");
        }
        self.pop_until_tag("caption")?;
        self.clear_active_formatting_elements_to_last_marker();
        self.switch_mode(InsertionMode::InTable);
        Ok(true)
    }

    /// [§ 13.2.6.4.12 The "in column group" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incolgroup)
    pub(super) fn handle_in_column_group_mode(
        &mut self,
        token: &TreeToken,
    ) -> Result<(), ParseError> {
        match token {
            TreeToken::Whitespace(text) => self.insert_character(text),
            TreeToken::Comment(data) => self.insert_comment(data),
            TreeToken::Doctype(_) => {
                self.parse_error("Stray doctype.");
                Ok(())
            }
            TreeToken::StartTag(tag) if tag.name == "html" => self.handle_in_body_mode(token),
            TreeToken::StartTag(tag) if tag.name == "col" => {
                let _ = self.insert_void_html_element(tag)?;
                Ok(())
            }
            TreeToken::EndTag(tag) if tag.name == "colgroup" => {
                if !self.current_node_is("colgroup") {
                    self.parse_error("Stray end tag “colgroup”.");
                    return Ok(());
                }
                let _ = self.pop()?;
                self.switch_mode(InsertionMode::InTable);
                Ok(())
            }
            TreeToken::EndTag(tag) if tag.name == "col" => {
                self.parse_error("Stray end tag “col”.");
                Ok(())
            }
            TreeToken::StartTag(tag) | TreeToken::EndTag(tag) if tag.name == "template" => {
                self.handle_in_head_mode(token)
            }
            TreeToken::Eof => self.handle_in_body_mode(token),
            _ => {
                if !self.current_node_is("colgroup") {
                    self.parse_error("Garbage in “colgroup” fragment.");
                    return Ok(());
                }
                let _ = self.pop()?;
                self.switch_mode(InsertionMode::InTable);
                self.reprocess_token(token)
            }
        }
    }

    /// [§ 13.2.6.4.13 The "in table body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intbody)
    pub(super) fn handle_in_table_body_mode(&mut self, token: &TreeToken) -> Result<(), ParseError> {
        const TABLE_BODY_CONTEXT: &[&str] = &["tbody", "tfoot", "thead", "template", "html"];
        match token {
            TreeToken::StartTag(tag) if tag.name == "tr" => {
                self.clear_stack_back_to(TABLE_BODY_CONTEXT)?;
                let _ = self.insert_html_element(tag)?;
                self.switch_mode(InsertionMode::InRow);
                Ok(())
            }
            TreeToken::StartTag(tag) if TABLE_CELLS.contains(&tag.name.as_str()) => {
                self.parse_error(format!("“{}” start tag in table body.", tag.name));
                self.clear_stack_back_to(TABLE_BODY_CONTEXT)?;
                let _ = self.insert_html_element(&Tag::new("tr"))?;
                self.switch_mode(InsertionMode::InRow);
                self.reprocess_token(token)
            }
            TreeToken::EndTag(tag) if TABLE_SECTIONS.contains(&tag.name.as_str()) => {
                if !self.has_in_table_scope(&tag.name) {
                    self.parse_error(format!("Stray end tag “{}”.", tag.name));
                    return Ok(());
                }
                self.clear_stack_back_to(TABLE_BODY_CONTEXT)?;
                let _ = self.pop()?;
                self.switch_mode(InsertionMode::InTable);
                Ok(())
            }
            TreeToken::StartTag(tag)
                if matches!(
                    tag.name.as_str(),
                    "caption" | "col" | "colgroup" | "tbody" | "tfoot" | "thead"
                ) =>
            {
                self.leave_table_body(token)
            }
            TreeToken::EndTag(tag) if tag.name == "table" => self.leave_table_body(token),
            TreeToken::EndTag(tag)
                if matches!(
                    tag.name.as_str(),
                    "body" | "caption" | "col" | "colgroup" | "html" | "td" | "th" | "tr"
                ) =>
            {
                self.parse_error(format!("Stray end tag “{}”.", tag.name));
                Ok(())
            }
            _ => self.handle_in_table_mode(token),
        }
    }

    fn leave_table_body(&mut self, token: &TreeToken) -> Result<(), ParseError> {
        // "If the stack of open elements does not have a tbody, thead, or
        // tfoot element in table scope, this is a parse error; ignore the
        // token."
        if !self.has_element_in_scope_named(TABLE_SECTIONS, Scope::Table) {
            self.parse_error("Stray table content outside a table body.");
            return Ok(());
        }
        self.clear_stack_back_to(&["tbody", "tfoot", "thead", "template", "html"])?;
        let _ = self.pop()?;
        self.switch_mode(InsertionMode::InTable);
        self.reprocess_token(token)
    }

    /// [§ 13.2.6.4.14 The "in row" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intr)
    pub(super) fn handle_in_row_mode(&mut self, token: &TreeToken) -> Result<(), ParseError> {
        match token {
            TreeToken::StartTag(tag) if TABLE_CELLS.contains(&tag.name.as_str()) => {
                self.clear_stack_back_to(&["tr", "template", "html"])?;
                let _ = self.insert_html_element(tag)?;
                self.switch_mode(InsertionMode::InCell);
                self.push_active_formatting_marker();
                Ok(())
            }
            TreeToken::EndTag(tag) if tag.name == "tr" => {
                let _ = self.close_row()?;
                Ok(())
            }
            TreeToken::StartTag(tag)
                if matches!(
                    tag.name.as_str(),
                    "caption" | "col" | "colgroup" | "tbody" | "tfoot" | "thead" | "tr"
                ) =>
            {
                if self.close_row()? {
                    return self.reprocess_token(token);
                }
                Ok(())
            }
            TreeToken::EndTag(tag) if tag.name == "table" => {
                if self.close_row()? {
                    return self.reprocess_token(token);
                }
                Ok(())
            }
            TreeToken::EndTag(tag) if TABLE_SECTIONS.contains(&tag.name.as_str()) => {
                if !self.has_in_table_scope(&tag.name) {
                    self.parse_error(format!("Stray end tag “{}”.", tag.name));
                    return Ok(());
                }
                if !self.has_in_table_scope("tr") {
                    return Ok(());
                }
                let _ = self.close_row()?;
                self.reprocess_token(token)
            }
            TreeToken::EndTag(tag)
                if matches!(
                    tag.name.as_str(),
                    "body" | "caption" | "col" | "colgroup" | "html" | "td" | "th"
                ) =>
            {
                self.parse_error(format!("Stray end tag “{}”.", tag.name));
                Ok(())
            }
            _ => self.handle_in_table_mode(token),
        }
    }

    /// Close the current row. Returns false if no `tr` was in table scope.
    fn close_row(&mut self) -> Result<bool, ParseError> {
        if !self.has_in_table_scope("tr") {
            self.parse_error("Stray end tag “tr”.");
            return Ok(false);
        }
        self.clear_stack_back_to(&["tr", "template", "html"])?;
        let _ = self.pop()?;
        self.switch_mode(InsertionMode::InTableBody);
        Ok(true)
    }

    /// [§ 13.2.6.4.15 The "in cell" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intd)
    pub(super) fn handle_in_cell_mode(&mut self, token: &TreeToken) -> Result<(), ParseError> {
        match token {
            TreeToken::EndTag(tag) if TABLE_CELLS.contains(&tag.name.as_str()) => {
                let name = tag.name.as_str();
                if !self.has_in_table_scope(name) {
                    self.parse_error(format!("Stray end tag “{name}”."));
                    return Ok(());
                }
                self.generate_implied_end_tags()?;
                if !self.current_node_is(name) {
                    self.parse_error(format!("End tag “{name}” seen, but there were open elements."));
                }
                self.pop_until_tag(name)?;
                self.clear_active_formatting_elements_to_last_marker();
                self.switch_mode(InsertionMode::InRow);
                Ok(())
            }
            TreeToken::StartTag(tag)
                if matches!(
                    tag.name.as_str(),
                    "caption" | "col" | "colgroup" | "tbody" | "td" | "tfoot" | "th" | "thead"
                        | "tr"
                ) =>
            {
                // "Assert: The stack of open elements has a td or th element
                // in table scope." Not so in the fragment case.
                if !self.has_element_in_scope_named(TABLE_CELLS, Scope::Table) {
                    self.parse_error(format!("Stray start tag “{}”.", tag.name));
                    return Ok(());
                }
                self.close_the_cell()?;
                self.reprocess_token(token)
            }
            TreeToken::EndTag(tag)
                if matches!(tag.name.as_str(), "body" | "caption" | "col" | "colgroup" | "html") =>
            {
                self.parse_error(format!("Stray end tag “{}”.", tag.name));
                Ok(())
            }
            TreeToken::EndTag(tag)
                if matches!(tag.name.as_str(), "table" | "tbody" | "tfoot" | "thead" | "tr") =>
            {
                if !self.has_in_table_scope(&tag.name) {
                    self.parse_error(format!("Stray end tag “{}”.", tag.name));
                    return Ok(());
                }
                self.close_the_cell()?;
                self.reprocess_token(token)
            }
            _ => self.handle_in_body_mode(token),
        }
    }

    /// [§ 13.2.6.4.15](https://html.spec.whatwg.org/multipage/parsing.html#close-the-cell)
    fn close_the_cell(&mut self) -> Result<(), ParseError> {
        // STEP 1: "Generate implied end tags."
        self.generate_implied_end_tags()?;
        // STEP 2: "If the current node is not now a td element or a th
        // element, then this is a parse error."
        if !self.current_node_is_one_of(TABLE_CELLS) {
            self.parse_error("Unclosed elements inside a table cell.");
        }
        // STEP 3: "Pop elements from the stack of open elements stack until a
        // td element or a th element has been popped from the stack."
        self.pop_until_one_of(TABLE_CELLS)?;
        // STEP 4: "Clear the list of active formatting elements up to the
        // last marker."
        self.clear_active_formatting_elements_to_last_marker();
        // STEP 5: "Switch the insertion mode to "in row"."
        self.switch_mode(InsertionMode::InRow);
        Ok(())
    }

    /// [§ 13.2.6.4.16 The "in select" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inselect)
    pub(super) fn handle_in_select_mode(&mut self, token: &TreeToken) -> Result<(), ParseError> {
        match token {
            TreeToken::Null => {
                self.parse_error("Saw U+0000 in text.");
                Ok(())
            }
            TreeToken::Whitespace(text) | TreeToken::Characters(text) => {
                self.insert_character(text)
            }
            TreeToken::Comment(data) => self.insert_comment(data),
            TreeToken::Doctype(_) => {
                self.parse_error("Stray doctype.");
                Ok(())
            }
            TreeToken::StartTag(tag) => match tag.name.as_str() {
                "html" => self.handle_in_body_mode(token),
                "option" => {
                    if self.current_node_is("option") {
                        let _ = self.pop()?;
                    }
                    let _ = self.insert_html_element(tag)?;
                    Ok(())
                }
                "optgroup" | "hr" => {
                    if self.current_node_is("option") {
                        let _ = self.pop()?;
                    }
                    if self.current_node_is("optgroup") {
                        let _ = self.pop()?;
                    }
                    if tag.name == "hr" {
                        let _ = self.insert_void_html_element(tag)?;
                    } else {
                        let _ = self.insert_html_element(tag)?;
                    }
                    Ok(())
                }
                "select" => {
                    self.parse_error("“select” start tag where end tag expected.");
                    // "If the stack of open elements does not have a select
                    // element in select scope, ignore the token. (fragment
                    // case)"
                    if self.has_element_in_scope_named(&["select"], Scope::Select) {
                        self.pop_until_tag("select")?;
                        self.reset_insertion_mode_appropriately();
                    }
                    Ok(())
                }
                "input" | "keygen" | "textarea" => {
                    self.parse_error(format!("“{}” start tag seen in “select”.", tag.name));
                    if !self.has_element_in_scope_named(&["select"], Scope::Select) {
                        return Ok(());
                    }
                    self.pop_until_tag("select")?;
                    self.reset_insertion_mode_appropriately();
                    self.reprocess_token(token)
                }
                "script" | "template" => self.handle_in_head_mode(token),
                _ => {
                    self.parse_error(format!("Stray start tag “{}”.", tag.name));
                    Ok(())
                }
            },
            TreeToken::EndTag(tag) => match tag.name.as_str() {
                "optgroup" => {
                    // "First, if the current node is an option element, and
                    // the node immediately before it in the stack of open
                    // elements is an optgroup element, then pop the current
                    // node from the stack of open elements."
                    let len = self.open_elements.len();
                    if self.current_node_is("option")
                        && len >= 2
                        && self.open_elements[len - 2].is_html("optgroup")
                    {
                        let _ = self.pop()?;
                    }
                    if self.current_node_is("optgroup") {
                        let _ = self.pop()?;
                    } else {
                        self.parse_error("Stray end tag “optgroup”.");
                    }
                    Ok(())
                }
                "option" => {
                    if self.current_node_is("option") {
                        let _ = self.pop()?;
                    } else {
                        self.parse_error("Stray end tag “option”.");
                    }
                    Ok(())
                }
                "select" => {
                    if !self.has_element_in_scope_named(&["select"], Scope::Select) {
                        self.parse_error("Stray end tag “select”.");
                        return Ok(());
                    }
                    self.pop_until_tag("select")?;
                    self.reset_insertion_mode_appropriately();
                    Ok(())
                }
                "template" => self.handle_in_head_mode(token),
                _ => {
                    self.parse_error(format!("Stray end tag “{}”.", tag.name));
                    Ok(())
                }
            },
            TreeToken::Eof => self.handle_in_body_mode(token),
        }
    }

    /// [§ 13.2.6.4.17 The "in select in table" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inselectintable)
    pub(super) fn handle_in_select_in_table_mode(
        &mut self,
        token: &TreeToken,
    ) -> Result<(), ParseError> {
        match token {
            TreeToken::StartTag(tag) if SELECT_IN_TABLE_BREAKOUTS.contains(&tag.name.as_str()) => {
                self.parse_error(format!("“{}” start tag with “select” open.", tag.name));
                self.pop_until_tag("select")?;
                self.reset_insertion_mode_appropriately();
                self.reprocess_token(token)
            }
            TreeToken::EndTag(tag) if SELECT_IN_TABLE_BREAKOUTS.contains(&tag.name.as_str()) => {
                self.parse_error(format!("“{}” end tag with “select” open.", tag.name));
                if !self.has_in_table_scope(&tag.name) {
                    return Ok(());
                }
                self.pop_until_tag("select")?;
                self.reset_insertion_mode_appropriately();
                self.reprocess_token(token)
            }
            _ => self.handle_in_select_mode(token),
        }
    }
}

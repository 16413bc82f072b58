//! The "in body" insertion mode and the adoption agency algorithm.

use super::core::{ActiveFormattingElement, InsertionMode, OpenElement, TreeBuilder, TreeToken};
use super::foreign_content::{
    adjust_foreign_attributes, adjust_mathml_attributes, adjust_svg_attributes,
};
use super::sink::{DocumentMode, TreeSink};
use super::tags::{self, HEADINGS, Scope};
use crate::error::ParseError;
use crate::names::{Namespace, QualName};
use crate::tokenizer::{Tag, TokenizerState};

/// Elements that may stay open at the end of the body without an error.
const CLOSABLE_AT_END_OF_BODY: &[&str] = &[
    "dd", "dt", "li", "optgroup", "option", "p", "rb", "rp", "rt", "rtc", "tbody", "td", "tfoot",
    "th", "thead", "tr", "body", "html",
];

/// Start tags that close a `p` in button scope and insert a plain container.
const BLOCK_CONTAINERS: &[&str] = &[
    "address", "article", "aside", "blockquote", "center", "details", "dialog", "dir", "div", "dl",
    "fieldset", "figcaption", "figure", "footer", "header", "hgroup", "main", "menu", "nav", "ol",
    "p", "search", "section", "summary", "ul",
];

/// End tags that close the matching block in scope.
const BLOCK_END_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "button", "center", "details", "dialog", "dir",
    "div", "dl", "fieldset", "figcaption", "figure", "footer", "header", "hgroup", "listing",
    "main", "menu", "nav", "ol", "pre", "search", "section", "summary", "ul",
];

impl<S: TreeSink> TreeBuilder<S> {
    /// [§ 13.2.6.4.7 The "in body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
    pub(super) fn handle_in_body_mode(&mut self, token: &TreeToken) -> Result<(), ParseError> {
        match token {
            TreeToken::Null => {
                self.parse_error("Saw U+0000 in text.");
                Ok(())
            }
            TreeToken::Whitespace(text) => {
                self.reconstruct_active_formatting_elements()?;
                self.insert_character(text)
            }
            TreeToken::Characters(text) => {
                self.reconstruct_active_formatting_elements()?;
                self.insert_character(text)?;
                self.frameset_ok = false;
                Ok(())
            }
            TreeToken::Comment(data) => self.insert_comment(data),
            TreeToken::Doctype(_) => {
                self.parse_error("Stray doctype.");
                Ok(())
            }
            TreeToken::StartTag(tag) => self.handle_in_body_start_tag(token, tag),
            TreeToken::EndTag(tag) => self.handle_in_body_end_tag(token, tag),
            TreeToken::Eof => {
                // "If the stack of template insertion modes is not empty, then
                // process the token using the rules for the "in template"
                // insertion mode."
                if !self.template_modes.is_empty() {
                    return self.handle_in_template_mode(token);
                }
                self.check_unclosed_at_end_of_body("End of file seen and there were open elements.");
                self.stop_parsing()
            }
        }
    }

    fn check_unclosed_at_end_of_body(&self, message: &str) {
        let unclosed = self
            .open_elements
            .iter()
            .any(|e| !e.is_html_one_of(CLOSABLE_AT_END_OF_BODY));
        if unclosed {
            self.parse_error(message);
        }
    }

    fn handle_in_body_start_tag(&mut self, token: &TreeToken, tag: &Tag) -> Result<(), ParseError> {
        match tag.name.as_str() {
            "html" => {
                self.parse_error("Stray start tag “html”.");
                // "If there is a template element on the stack of open
                // elements, then ignore the token. Otherwise, for each
                // attribute on the token, check to see if the attribute is
                // already present on the top element of the stack of open
                // elements. If it is not, add the attribute"
                if self.stack_has_html("template") {
                    return Ok(());
                }
                if let Some(html) = self.open_elements.first().map(|e| e.handle.clone()) {
                    self.sink.add_attrs_if_missing(&html, &tag.attributes)?;
                }
                Ok(())
            }
            "base" | "basefont" | "bgsound" | "link" | "meta" | "noframes" | "script" | "style"
            | "template" | "title" => self.handle_in_head_mode(token),
            "body" => {
                self.parse_error("“body” start tag found but the “body” element is already open.");
                // "If the stack of open elements has only one node on it, or
                // if the second element on the stack of open elements is not
                // a body element, or if there is a template element on the
                // stack of open elements, then ignore the token. (fragment
                // case or there is a template element on the stack)"
                let Some(body) = self.second_element_if_body() else {
                    return Ok(());
                };
                if self.stack_has_html("template") {
                    return Ok(());
                }
                self.frameset_ok = false;
                self.sink.add_attrs_if_missing(&body, &tag.attributes)?;
                Ok(())
            }
            "frameset" => {
                self.parse_error("Stray start tag “frameset”.");
                let Some(body) = self.second_element_if_body() else {
                    return Ok(());
                };
                if !self.frameset_ok {
                    return Ok(());
                }
                // "Remove the second element on the stack of open elements
                // from its parent node, if it has one."
                self.sink.detach(&body)?;
                // "Pop all the nodes from the bottom of the stack of open
                // elements, from the current node up to, but not including,
                // the root html element."
                while self.open_elements.len() > 1 {
                    let _ = self.pop()?;
                }
                let _ = self.insert_html_element(tag)?;
                self.switch_mode(InsertionMode::InFrameset);
                Ok(())
            }
            name if BLOCK_CONTAINERS.contains(&name) => {
                self.close_p_in_button_scope()?;
                let _ = self.insert_html_element(tag)?;
                Ok(())
            }
            name if HEADINGS.contains(&name) => {
                self.close_p_in_button_scope()?;
                // "If the current node is an HTML element whose tag name is
                // one of "h1", "h2", "h3", "h4", "h5", or "h6", then this is a
                // parse error; pop the current node off the stack of open
                // elements."
                if self.current_node_is_one_of(HEADINGS) {
                    self.parse_error(format!(
                        "Heading cannot be a child of another heading: “{name}”."
                    ));
                    let _ = self.pop()?;
                }
                let _ = self.insert_html_element(tag)?;
                Ok(())
            }
            "pre" | "listing" => {
                self.close_p_in_button_scope()?;
                let _ = self.insert_html_element(tag)?;
                // "If the next token is a U+000A LINE FEED (LF) character
                // token, then ignore that token and move on to the next one.
                // (Newlines at the start of pre blocks are ignored as an
                // authoring convenience.)"
                self.ignore_lf = true;
                self.frameset_ok = false;
                Ok(())
            }
            "form" => {
                let has_template = self.stack_has_html("template");
                if self.form_element.is_some() && !has_template {
                    self.parse_error("Saw a “form” start tag, but there was already an active “form” element.");
                    return Ok(());
                }
                self.close_p_in_button_scope()?;
                let form = self.insert_html_element(tag)?;
                if !has_template {
                    self.form_element = Some(form);
                }
                Ok(())
            }
            "li" => self.handle_list_item_start_tag(tag, &["li"]),
            "dd" | "dt" => self.handle_list_item_start_tag(tag, &["dd", "dt"]),
            "plaintext" => {
                self.close_p_in_button_scope()?;
                let _ = self.insert_html_element(tag)?;
                self.switch_tokenizer(TokenizerState::PLAINTEXT);
                Ok(())
            }
            "button" => {
                if self.has_in_scope("button") {
                    self.parse_error("Saw a “button” start tag, but there was already an open “button” element.");
                    self.generate_implied_end_tags()?;
                    self.pop_until_tag("button")?;
                }
                self.reconstruct_active_formatting_elements()?;
                let _ = self.insert_html_element(tag)?;
                self.frameset_ok = false;
                Ok(())
            }
            "a" => {
                if let Some((_, existing)) = self.active_formatting_element_named("a") {
                    self.parse_error("An “a” start tag seen but an element of the same type was already open.");
                    self.run_adoption_agency("a")?;
                    // "then remove that element from the list of active
                    // formatting elements and the stack of open elements if
                    // the adoption agency algorithm didn't already remove it"
                    if let Some(index) = self.active_formatting_index_of(&existing) {
                        let _ = self.active_formatting_elements.remove(index);
                    }
                    if let Some(index) = self.stack_index_of(&existing) {
                        self.remove_from_stack(index)?;
                    }
                }
                self.insert_formatting_element(tag)
            }
            "b" | "big" | "code" | "em" | "font" | "i" | "s" | "small" | "strike" | "strong"
            | "tt" | "u" => self.insert_formatting_element(tag),
            "nobr" => {
                self.reconstruct_active_formatting_elements()?;
                if self.has_in_scope("nobr") {
                    self.parse_error("Start tag “nobr” seen but an element of the same type was already open.");
                    self.run_adoption_agency("nobr")?;
                }
                self.insert_formatting_element(tag)
            }
            "applet" | "marquee" | "object" => {
                self.reconstruct_active_formatting_elements()?;
                let _ = self.insert_html_element(tag)?;
                self.push_active_formatting_marker();
                self.frameset_ok = false;
                Ok(())
            }
            "table" => {
                // "If the Document is not set to quirks mode, and the stack of
                // open elements has a p element in button scope, then close a
                // p element."
                if self.document_mode != DocumentMode::Quirks {
                    self.close_p_in_button_scope()?;
                }
                let _ = self.insert_html_element(tag)?;
                self.frameset_ok = false;
                self.switch_mode(InsertionMode::InTable);
                Ok(())
            }
            "area" | "br" | "embed" | "img" | "keygen" | "wbr" => {
                self.reconstruct_active_formatting_elements()?;
                let _ = self.insert_void_html_element(tag)?;
                self.frameset_ok = false;
                Ok(())
            }
            "input" => {
                self.reconstruct_active_formatting_elements()?;
                let _ = self.insert_void_html_element(tag)?;
                // "If the token does not have an attribute with the name
                // "type", or if it does, but that attribute's value is not an
                // ASCII case-insensitive match for the string "hidden", then:
                // set the frameset-ok flag to "not ok"."
                if !is_hidden_input(tag) {
                    self.frameset_ok = false;
                }
                Ok(())
            }
            "param" | "source" | "track" => {
                let _ = self.insert_void_html_element(tag)?;
                Ok(())
            }
            "hr" => {
                self.close_p_in_button_scope()?;
                let _ = self.insert_void_html_element(tag)?;
                self.frameset_ok = false;
                Ok(())
            }
            "image" => {
                // "Parse error. Change the token's tag name to "img" and
                // reprocess it. (Don't ask.)"
                self.parse_error("Saw a start tag “image”.");
                let mut img = tag.clone();
                img.name = "img".to_string();
                self.reprocess_token(&TreeToken::StartTag(img))
            }
            "textarea" => {
                let _ = self.insert_html_element(tag)?;
                self.ignore_lf = true;
                self.switch_tokenizer(TokenizerState::RCDATA);
                self.original_mode = self.mode;
                self.frameset_ok = false;
                self.switch_mode(InsertionMode::Text);
                Ok(())
            }
            "xmp" => {
                self.close_p_in_button_scope()?;
                self.reconstruct_active_formatting_elements()?;
                self.frameset_ok = false;
                self.parse_text_element(tag, TokenizerState::RAWTEXT)
            }
            "iframe" => {
                self.frameset_ok = false;
                self.parse_text_element(tag, TokenizerState::RAWTEXT)
            }
            "noembed" => self.parse_text_element(tag, TokenizerState::RAWTEXT),
            "noscript" if self.options.scripting_enabled => {
                self.parse_text_element(tag, TokenizerState::RAWTEXT)
            }
            "select" => {
                self.reconstruct_active_formatting_elements()?;
                let _ = self.insert_html_element(tag)?;
                self.frameset_ok = false;
                let mode = match self.mode {
                    InsertionMode::InTable
                    | InsertionMode::InCaption
                    | InsertionMode::InTableBody
                    | InsertionMode::InRow
                    | InsertionMode::InCell => InsertionMode::InSelectInTable,
                    _ => InsertionMode::InSelect,
                };
                self.switch_mode(mode);
                Ok(())
            }
            "optgroup" | "option" => {
                if self.current_node_is("option") {
                    let _ = self.pop()?;
                }
                self.reconstruct_active_formatting_elements()?;
                let _ = self.insert_html_element(tag)?;
                Ok(())
            }
            "rb" | "rtc" => {
                if self.has_in_scope("ruby") {
                    self.generate_implied_end_tags()?;
                    if !self.current_node_is("ruby") {
                        self.parse_error(format!("“{}” start tag seen without an open “ruby” element.", tag.name));
                    }
                }
                let _ = self.insert_html_element(tag)?;
                Ok(())
            }
            "rp" | "rt" => {
                if self.has_in_scope("ruby") {
                    self.generate_implied_end_tags_excluding(Some("rtc"))?;
                    if !self.current_node_is_one_of(&["rtc", "ruby"]) {
                        self.parse_error(format!("“{}” start tag seen without an open “ruby” element.", tag.name));
                    }
                }
                let _ = self.insert_html_element(tag)?;
                Ok(())
            }
            "math" => {
                self.reconstruct_active_formatting_elements()?;
                let mut adjusted = tag.clone();
                adjust_mathml_attributes(&mut adjusted.attributes);
                adjust_foreign_attributes(&mut adjusted.attributes);
                self.insert_foreign_root(&adjusted, Namespace::MathMl)
            }
            "svg" => {
                self.reconstruct_active_formatting_elements()?;
                let mut adjusted = tag.clone();
                adjust_svg_attributes(&mut adjusted.attributes);
                adjust_foreign_attributes(&mut adjusted.attributes);
                self.insert_foreign_root(&adjusted, Namespace::Svg)
            }
            "caption" | "col" | "colgroup" | "frame" | "head" | "tbody" | "td" | "tfoot" | "th"
            | "thead" | "tr" => {
                self.parse_error(format!("Stray start tag “{}”.", tag.name));
                Ok(())
            }
            _ => {
                self.reconstruct_active_formatting_elements()?;
                let _ = self.insert_html_element(tag)?;
                Ok(())
            }
        }
    }

    fn second_element_if_body(&self) -> Option<S::Handle> {
        self.open_elements
            .get(1)
            .filter(|e| e.is_html("body"))
            .map(|e| e.handle.clone())
    }

    /// "Insert a foreign element for the token, with MathML namespace / SVG
    /// namespace and false. If the token has its self-closing flag set, pop
    /// the current node off the stack of open elements and acknowledge the
    /// token's self-closing flag."
    fn insert_foreign_root(&mut self, tag: &Tag, ns: Namespace) -> Result<(), ParseError> {
        let _ = self.insert_foreign_element(tag, ns, false)?;
        if tag.self_closing {
            let _ = self.pop()?;
            self.self_closing_acknowledged = true;
        }
        Ok(())
    }

    fn insert_formatting_element(&mut self, tag: &Tag) -> Result<(), ParseError> {
        // "Reconstruct the active formatting elements, if any. Insert an HTML
        // element for the token. Push onto the list of active formatting
        // elements that element."
        self.reconstruct_active_formatting_elements()?;
        let handle = self.insert_html_element(tag)?;
        self.push_active_formatting_element(handle, tag.clone());
        Ok(())
    }

    /// The `li`, `dd` and `dt` start tags.
    fn handle_list_item_start_tag(&mut self, tag: &Tag, closes: &[&str]) -> Result<(), ParseError> {
        // STEP 1: "Set the frameset-ok flag to "not ok"."
        self.frameset_ok = false;
        // STEP 2-5: Loop from the current node up the stack.
        for index in (0..self.open_elements.len()).rev() {
            let node = &self.open_elements[index];
            if node.is_html_one_of(closes) {
                let local = node.name.local.clone();
                self.generate_implied_end_tags_excluding(Some(&local))?;
                if !self.current_node_is(&local) {
                    self.parse_error(format!("End tag “{local}” implied, but there were open elements."));
                }
                self.pop_until_tag(&local)?;
                break;
            }
            // "If node is in the special category, but is not an address,
            // div, or p element, then jump to the step labeled done below."
            if tags::is_special(&node.name) && !node.is_html_one_of(&["address", "div", "p"]) {
                break;
            }
        }
        // STEP 6: "Done: If the stack of open elements has a p element in
        // button scope, then close a p element."
        self.close_p_in_button_scope()?;
        // STEP 7: "Finally, insert an HTML element for the token."
        let _ = self.insert_html_element(tag)?;
        Ok(())
    }

    fn close_p_in_button_scope(&mut self) -> Result<(), ParseError> {
        if self.has_in_button_scope("p") {
            self.close_p_element()?;
        }
        Ok(())
    }

    /// [§ 13.2.6.4.7](https://html.spec.whatwg.org/multipage/parsing.html#close-a-p-element)
    ///
    /// "Generate implied end tags, except for p elements. If the current node
    /// is not a p element, then this is a parse error. Pop elements from the
    /// stack of open elements until a p element has been popped from the
    /// stack."
    pub(super) fn close_p_element(&mut self) -> Result<(), ParseError> {
        self.generate_implied_end_tags_excluding(Some("p"))?;
        if !self.current_node_is("p") {
            self.parse_error("End tag “p” implied, but there were open elements.");
        }
        self.pop_until_tag("p")
    }

    fn handle_in_body_end_tag(&mut self, token: &TreeToken, tag: &Tag) -> Result<(), ParseError> {
        match tag.name.as_str() {
            "template" => self.handle_in_head_mode(token),
            "body" | "html" => {
                // "If the stack of open elements does not have a body element
                // in scope, this is a parse error; ignore the token."
                if !self.has_in_scope("body") {
                    self.parse_error(format!("Stray end tag “{}”.", tag.name));
                    return Ok(());
                }
                self.check_unclosed_at_end_of_body(&format!(
                    "End tag for “{}” seen, but there were unclosed elements.",
                    tag.name
                ));
                self.switch_mode(InsertionMode::AfterBody);
                if tag.name == "html" {
                    return self.reprocess_token(token);
                }
                Ok(())
            }
            name if BLOCK_END_TAGS.contains(&name) => {
                if !self.has_in_scope(name) {
                    self.parse_error(format!("No “{name}” element in scope but a “{name}” end tag seen."));
                    return Ok(());
                }
                self.generate_implied_end_tags()?;
                if !self.current_node_is(name) {
                    self.parse_error(format!("End tag “{name}” seen, but there were open elements."));
                }
                self.pop_until_tag(name)
            }
            "form" => self.handle_form_end_tag(),
            "p" => {
                // "If the stack of open elements does not have a p element in
                // button scope, then this is a parse error; insert an HTML
                // element for a "p" start tag token with no attributes."
                if !self.has_in_button_scope("p") {
                    self.parse_error("No “p” element in scope but a “p” end tag seen.");
                    let _ = self.insert_html_element(&Tag::new("p"))?;
                }
                self.close_p_element()
            }
            "li" => {
                if !self.has_element_in_scope_named(&["li"], Scope::ListItem) {
                    self.parse_error("No “li” element in list scope but a “li” end tag seen.");
                    return Ok(());
                }
                self.close_implied("li")
            }
            "dd" | "dt" => {
                if !self.has_in_scope(&tag.name) {
                    self.parse_error(format!("No “{0}” element in scope but a “{0}” end tag seen.", tag.name));
                    return Ok(());
                }
                self.close_implied(&tag.name)
            }
            name if HEADINGS.contains(&name) => {
                if !self.has_element_in_scope_named(HEADINGS, Scope::Default) {
                    self.parse_error(format!("End tag “{name}” seen, but there were no heading elements in scope."));
                    return Ok(());
                }
                self.generate_implied_end_tags()?;
                if !self.current_node_is(name) {
                    self.parse_error(format!("End tag “{name}” seen, but there were open elements."));
                }
                self.pop_until_one_of(HEADINGS)
            }
            name if tags::is_formatting(name) => self.run_adoption_agency(name),
            "applet" | "marquee" | "object" => {
                let name = tag.name.as_str();
                if !self.has_in_scope(name) {
                    self.parse_error(format!("Stray end tag “{name}”."));
                    return Ok(());
                }
                self.generate_implied_end_tags()?;
                if !self.current_node_is(name) {
                    self.parse_error(format!("End tag “{name}” seen, but there were open elements."));
                }
                self.pop_until_tag(name)?;
                self.clear_active_formatting_elements_to_last_marker();
                Ok(())
            }
            "br" => {
                // "Parse error. Drop the attributes from the token, and act as
                // described in the next entry; i.e. act as if this was a "br"
                // start tag token with no attributes, rather than the end tag
                // token that it actually is."
                self.parse_error("End tag “br”.");
                self.reconstruct_active_formatting_elements()?;
                let _ = self.insert_void_html_element(&Tag::new("br"))?;
                self.frameset_ok = false;
                Ok(())
            }
            _ => self.any_other_end_tag(&tag.name),
        }
    }

    /// "Generate implied end tags, except for X elements. If the current node
    /// is not an X element, then this is a parse error. Pop elements from the
    /// stack of open elements until an X element has been popped."
    fn close_implied(&mut self, local: &str) -> Result<(), ParseError> {
        self.generate_implied_end_tags_excluding(Some(local))?;
        if !self.current_node_is(local) {
            self.parse_error(format!("End tag “{local}” seen, but there were open elements."));
        }
        self.pop_until_tag(local)
    }

    fn handle_form_end_tag(&mut self) -> Result<(), ParseError> {
        if !self.stack_has_html("template") {
            // STEP 1: "Let node be the element that the form element pointer
            // is set to, or null if it is not set to an element."
            // STEP 2: "Set the form element pointer to null."
            let node = self.form_element.take();
            // STEP 3: "If node is null or if the stack of open elements does
            // not have node in scope, then this is a parse error; return and
            // ignore the token."
            let Some(node) = node.filter(|n| self.has_node_in_scope(n)) else {
                self.parse_error("Stray end tag “form”.");
                return Ok(());
            };
            self.generate_implied_end_tags()?;
            if self.current_node().is_none_or(|current| current.handle != node) {
                self.parse_error("End tag “form” seen, but there were open elements.");
            }
            // STEP 6: "Remove node from the stack of open elements."
            if let Some(index) = self.stack_index_of(&node) {
                self.remove_from_stack(index)?;
            }
            return Ok(());
        }
        if !self.has_in_scope("form") {
            self.parse_error("Stray end tag “form”.");
            return Ok(());
        }
        self.generate_implied_end_tags()?;
        if !self.current_node_is("form") {
            self.parse_error("End tag “form” seen, but there were open elements.");
        }
        self.pop_until_tag("form")
    }

    /// [§ 13.2.6.4.7](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
    /// "Any other end tag"
    pub(super) fn any_other_end_tag(&mut self, local: &str) -> Result<(), ParseError> {
        for index in (0..self.open_elements.len()).rev() {
            let node = &self.open_elements[index];
            // "If node is an HTML element with the same tag name as the token"
            if node.is_html(local) {
                let handle = node.handle.clone();
                self.generate_implied_end_tags_excluding(Some(local))?;
                if self.current_node().is_none_or(|current| current.handle != handle) {
                    self.parse_error(format!("End tag “{local}” seen, but there were open elements."));
                }
                return self.pop_until_handle(&handle);
            }
            // "Otherwise, if node is in the special category, then this is a
            // parse error; ignore the token, and return."
            if tags::is_special(&node.name) {
                self.parse_error(format!("Stray end tag “{local}”."));
                return Ok(());
            }
        }
        Ok(())
    }

    /// [§ 13.2.6.4.7 Adoption agency algorithm](https://html.spec.whatwg.org/multipage/parsing.html#adoption-agency-algorithm)
    pub(super) fn run_adoption_agency(&mut self, subject: &str) -> Result<(), ParseError> {
        // STEP 2: "If the current node is an HTML element whose tag name is
        // subject, and the current node is not in the list of active
        // formatting elements, then pop the current node off the stack of
        // open elements and return."
        if let Some(current) = self.current_node() {
            if current.is_html(subject) && self.active_formatting_index_of(&current.handle).is_none() {
                let _ = self.pop()?;
                return Ok(());
            }
        }

        // STEP 3-4: Outer loop, at most eight times.
        for _ in 0..8 {
            // STEP 4.3: "Let formatting element be the last element in the
            // list of active formatting elements that is between the end of
            // the list and the last marker in the list, if any, or the start
            // of the list otherwise, and has the tag name subject. If there
            // is no such element, then return and instead act as described in
            // the "any other end tag" entry above."
            let Some((_, formatting_element)) = self.active_formatting_element_named(subject)
            else {
                return self.any_other_end_tag(subject);
            };

            // STEP 4.4: "If formatting element is not in the stack of open
            // elements, then this is a parse error; remove the element from
            // the list, and return."
            let Some(formatting_index) = self.stack_index_of(&formatting_element) else {
                self.parse_error(format!("No “{subject}” element in scope but a “{subject}” end tag seen."));
                if let Some(index) = self.active_formatting_index_of(&formatting_element) {
                    let _ = self.active_formatting_elements.remove(index);
                }
                return Ok(());
            };

            // STEP 4.5: "If formatting element is in the stack of open
            // elements, but the element is not in scope, then this is a parse
            // error; return."
            if !self.has_node_in_scope(&formatting_element) {
                self.parse_error(format!("No “{subject}” element in scope but a “{subject}” end tag seen."));
                return Ok(());
            }

            // STEP 4.6: "If formatting element is not the current node, this
            // is a parse error. (But do not return.)"
            if formatting_index + 1 != self.open_elements.len() {
                self.parse_error(format!("End tag “{subject}” violates nesting rules."));
            }

            // STEP 4.7: "Let furthest block be the topmost node in the stack
            // of open elements that is lower in the stack than formatting
            // element, and is an element in the special category."
            let furthest_block_index = (formatting_index + 1..self.open_elements.len())
                .find(|&i| tags::is_special(&self.open_elements[i].name));

            // STEP 4.8: "If there is no furthest block, then the UA must first
            // pop all the nodes from the bottom of the stack of open
            // elements, from the current node up to and including formatting
            // element, then remove formatting element from the list of active
            // formatting elements, and finally return."
            let Some(furthest_block_index) = furthest_block_index else {
                self.pop_until_handle(&formatting_element)?;
                if let Some(index) = self.active_formatting_index_of(&formatting_element) {
                    let _ = self.active_formatting_elements.remove(index);
                }
                return Ok(());
            };
            let furthest_block = self.open_elements[furthest_block_index].handle.clone();

            // STEP 4.9: "Let common ancestor be the element immediately above
            // formatting element in the stack of open elements."
            let common_ancestor_index = formatting_index.saturating_sub(1);

            // STEP 4.10: "Let a bookmark note the position of formatting
            // element in the list of active formatting elements"
            let mut bookmark = self
                .active_formatting_index_of(&formatting_element)
                .unwrap_or(self.active_formatting_elements.len());

            // STEP 4.11: "Let node and last node be furthest block."
            let mut node_index = furthest_block_index;
            let mut last_node = furthest_block.clone();

            // STEP 4.13: Inner loop.
            let mut inner_loop_counter = 0;
            loop {
                inner_loop_counter += 1;
                // STEP 4.13.2: "Let node be the element immediately above node
                // in the stack of open elements, or if node is no longer in
                // the stack of open elements (e.g. because it got removed by
                // this algorithm), the element that was immediately above node
                // in the stack of open elements before node was removed."
                node_index -= 1;
                let node = self.open_elements[node_index].handle.clone();

                // STEP 4.13.3: "If node is formatting element, then break."
                if node == formatting_element {
                    break;
                }

                // STEP 4.13.4: "If inner loop counter is greater than 3 and
                // node is in the list of active formatting elements, then
                // remove node from the list of active formatting elements."
                let mut node_entry = self.active_formatting_index_of(&node);
                if inner_loop_counter > 3 {
                    if let Some(index) = node_entry.take() {
                        let _ = self.active_formatting_elements.remove(index);
                        if index < bookmark {
                            bookmark -= 1;
                        }
                    }
                }

                // STEP 4.13.5: "If node is not in the list of active
                // formatting elements, then remove node from the stack of open
                // elements and continue."
                let Some(entry_index) = node_entry else {
                    self.remove_from_stack(node_index)?;
                    continue;
                };

                // STEP 4.13.6: "Create an element for the token for which the
                // element node was created, in the HTML namespace, with common
                // ancestor as the intended parent; replace the entry for node
                // in the list of active formatting elements with an entry for
                // the new element, replace the entry for node in the stack of
                // open elements with an entry for the new element, and let
                // node be the new element."
                let replacement = self.sink.shallow_clone(&node)?;
                if let ActiveFormattingElement::Element { handle, .. } =
                    &mut self.active_formatting_elements[entry_index]
                {
                    *handle = replacement.clone();
                }
                self.open_elements[node_index].handle = replacement.clone();

                // STEP 4.13.7: "If last node is furthest block, then move the
                // aforementioned bookmark to be immediately after the new node
                // in the list of active formatting elements."
                if last_node == furthest_block {
                    bookmark = entry_index + 1;
                }

                // STEP 4.13.8: "Append last node to node."
                self.sink.append_child(&replacement, &last_node)?;

                // STEP 4.13.9: "Set last node to node."
                last_node = replacement;
            }

            // STEP 4.14: "Insert whatever last node ended up being in the
            // previous step at the appropriate place for inserting a node,
            // but using common ancestor as the override target."
            let point = self.appropriate_place_for_inserting_a_node(Some(common_ancestor_index))?;
            self.insert_at(&point, &last_node)?;

            // STEP 4.15: "Create an element for the token for which
            // formatting element was created, in the HTML namespace, with
            // furthest block as the intended parent."
            let new_element = self.sink.shallow_clone(&formatting_element)?;

            // STEP 4.16: "Take all of the child nodes of furthest block and
            // append them to the element created in the last step."
            self.sink.move_all_children(&furthest_block, &new_element)?;

            // STEP 4.17: "Append that new element to furthest block."
            self.sink.append_child(&furthest_block, &new_element)?;

            // STEP 4.18: "Remove formatting element from the list of active
            // formatting elements, and insert the new element into the list
            // of active formatting elements at the position of the
            // aforementioned bookmark."
            let mut tag = Tag::new(subject);
            if let Some(index) = self.active_formatting_index_of(&formatting_element) {
                if let ActiveFormattingElement::Element { tag: original, .. } =
                    self.active_formatting_elements.remove(index)
                {
                    tag = original;
                }
                if index < bookmark {
                    bookmark -= 1;
                }
            }
            let bookmark = bookmark.min(self.active_formatting_elements.len());
            self.active_formatting_elements.insert(
                bookmark,
                ActiveFormattingElement::Element {
                    handle: new_element.clone(),
                    tag,
                },
            );

            // STEP 4.19: "Remove formatting element from the stack of open
            // elements, and insert the new element into the stack of open
            // elements immediately below the position of furthest block in
            // that stack."
            if let Some(index) = self.stack_index_of(&formatting_element) {
                self.remove_from_stack(index)?;
            }
            let below_furthest = self
                .stack_index_of(&furthest_block)
                .map_or(self.open_elements.len(), |i| i + 1);
            self.open_elements.insert(
                below_furthest,
                OpenElement {
                    handle: new_element,
                    name: QualName::html(subject),
                    annotation_integration_point: false,
                },
            );
        }
        Ok(())
    }
}

/// An `input` start tag whose `type` is `hidden`, ASCII case-insensitively.
pub(super) fn is_hidden_input(tag: &Tag) -> bool {
    tag.attribute("type")
        .is_some_and(|t| t.eq_ignore_ascii_case("hidden"))
}

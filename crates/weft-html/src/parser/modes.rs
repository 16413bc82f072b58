//! The insertion modes around the document body: everything before `<body>`,
//! the "text" mode, the after-body and frameset modes, and "in template".

use log::debug;
use weft_encoding::prescan::extract_charset_from_content;

use super::core::{InsertionMode, InsertionPoint, OpenElement, TreeBuilder, TreeToken};
use super::quirks;
use super::sink::{DocumentMode, TreeSink};
use crate::error::ParseError;
use crate::names::QualName;
use crate::tokenizer::{Tag, TokenizerState};

impl<S: TreeSink> TreeBuilder<S> {
    /// [§ 13.2.6.4.1 The "initial" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-initial-insertion-mode)
    pub(super) fn handle_initial_mode(&mut self, token: &TreeToken) -> Result<(), ParseError> {
        match token {
            // "Ignore the token."
            TreeToken::Whitespace(_) => Ok(()),
            // "Insert a comment as the last child of the Document object."
            TreeToken::Comment(data) => self.insert_comment_in_document(data),
            TreeToken::Doctype(doctype) => {
                if !quirks::is_conforming(doctype) {
                    self.parse_error("Legacy doctype. Expected “<!DOCTYPE html>”.");
                }
                // "Append a DocumentType node to the Document node, with its
                // name set to the name given in the DOCTYPE token, or the
                // empty string if the name was missing"
                self.sink.append_doctype(
                    doctype.name.as_deref().unwrap_or_default(),
                    doctype.public_id.as_deref().unwrap_or_default(),
                    doctype.system_id.as_deref().unwrap_or_default(),
                )?;
                let mode = quirks::document_mode_for(doctype);
                self.set_document_mode(
                    mode,
                    doctype.public_id.as_deref(),
                    doctype.system_id.as_deref(),
                )?;
                self.switch_mode(InsertionMode::BeforeHtml);
                Ok(())
            }
            _ => {
                // "If the document is not an iframe srcdoc document, then this
                // is a parse error; if the parser cannot change the mode flag
                // is false, set the Document to quirks mode."
                self.parse_error(
                    "Non-space characters found without seeing a doctype first. Expected “<!DOCTYPE html>”.",
                );
                self.set_document_mode(DocumentMode::Quirks, None, None)?;
                self.switch_mode(InsertionMode::BeforeHtml);
                self.reprocess_token(token)
            }
        }
    }

    fn set_document_mode(
        &mut self,
        mode: DocumentMode,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> Result<(), ParseError> {
        debug!("document mode: {mode}");
        self.document_mode = mode;
        self.sink.set_document_mode(mode, public_id, system_id)?;
        Ok(())
    }

    /// [§ 13.2.6.4.2 The "before html" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-html-insertion-mode)
    pub(super) fn handle_before_html_mode(&mut self, token: &TreeToken) -> Result<(), ParseError> {
        match token {
            TreeToken::Doctype(_) => {
                self.parse_error("Stray doctype.");
                Ok(())
            }
            TreeToken::Comment(data) => self.insert_comment_in_document(data),
            TreeToken::Whitespace(_) => Ok(()),
            TreeToken::StartTag(tag) if tag.name == "html" => {
                // "Create an element for the token in the HTML namespace, with
                // the Document as the intended parent. Append it to the
                // Document object. Put this element in the stack of open
                // elements."
                self.insert_root_element(tag)?;
                self.switch_mode(InsertionMode::BeforeHead);
                Ok(())
            }
            TreeToken::EndTag(tag) if !matches!(tag.name.as_str(), "head" | "body" | "html" | "br") => {
                self.parse_error(format!("Stray end tag “{}”.", tag.name));
                Ok(())
            }
            _ => {
                // "Create an html element whose node document is the Document
                // object. Append it to the Document object. Put this element
                // in the stack of open elements."
                self.insert_root_element(&Tag::new("html"))?;
                self.switch_mode(InsertionMode::BeforeHead);
                self.reprocess_token(token)
            }
        }
    }

    fn insert_root_element(&mut self, tag: &Tag) -> Result<(), ParseError> {
        let document = self.sink.document();
        let point = InsertionPoint::Append(document);
        let name = QualName::html("html");
        let handle = self.create_element_for_token(&name, &tag.attributes)?;
        self.insert_at(&point, &handle)?;
        self.open_elements.push(OpenElement {
            handle,
            name,
            annotation_integration_point: false,
        });
        Ok(())
    }

    /// [§ 13.2.6.4.3 The "before head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-head-insertion-mode)
    pub(super) fn handle_before_head_mode(&mut self, token: &TreeToken) -> Result<(), ParseError> {
        match token {
            TreeToken::Whitespace(_) => Ok(()),
            TreeToken::Comment(data) => self.insert_comment(data),
            TreeToken::Doctype(_) => {
                self.parse_error("Stray doctype.");
                Ok(())
            }
            TreeToken::StartTag(tag) if tag.name == "html" => self.handle_in_body_mode(token),
            TreeToken::StartTag(tag) if tag.name == "head" => {
                let head = self.insert_html_element(tag)?;
                self.head_element = Some(head);
                self.switch_mode(InsertionMode::InHead);
                Ok(())
            }
            TreeToken::EndTag(tag) if !matches!(tag.name.as_str(), "head" | "body" | "html" | "br") => {
                self.parse_error(format!("Stray end tag “{}”.", tag.name));
                Ok(())
            }
            _ => {
                // "Insert an HTML element for a "head" start tag token with
                // no attributes."
                let head = self.insert_html_element(&Tag::new("head"))?;
                self.head_element = Some(head);
                self.switch_mode(InsertionMode::InHead);
                self.reprocess_token(token)
            }
        }
    }

    /// [§ 13.2.6.4.4 The "in head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inhead)
    pub(super) fn handle_in_head_mode(&mut self, token: &TreeToken) -> Result<(), ParseError> {
        match token {
            TreeToken::Whitespace(text) => self.insert_character(text),
            TreeToken::Comment(data) => self.insert_comment(data),
            TreeToken::Doctype(_) => {
                self.parse_error("Stray doctype.");
                Ok(())
            }
            TreeToken::StartTag(tag) => match tag.name.as_str() {
                "html" => self.handle_in_body_mode(token),
                "base" | "basefont" | "bgsound" | "link" => {
                    let _ = self.insert_void_html_element(tag)?;
                    Ok(())
                }
                "meta" => {
                    let _ = self.insert_void_html_element(tag)?;
                    self.check_meta_encoding_declaration(tag);
                    Ok(())
                }
                "title" => self.parse_text_element(tag, TokenizerState::RCDATA),
                "noscript" if self.options.scripting_enabled => {
                    self.parse_text_element(tag, TokenizerState::RAWTEXT)
                }
                "noframes" | "style" => self.parse_text_element(tag, TokenizerState::RAWTEXT),
                "noscript" => {
                    let _ = self.insert_html_element(tag)?;
                    self.switch_mode(InsertionMode::InHeadNoscript);
                    Ok(())
                }
                "script" => self.parse_text_element(tag, TokenizerState::ScriptData),
                "template" => {
                    let _ = self.insert_html_element(tag)?;
                    self.push_active_formatting_marker();
                    self.frameset_ok = false;
                    self.switch_mode(InsertionMode::InTemplate);
                    self.template_modes.push(InsertionMode::InTemplate);
                    Ok(())
                }
                "head" => {
                    self.parse_error("Start tag for “head” seen when “head” was already open.");
                    Ok(())
                }
                _ => self.handle_in_head_anything_else(token),
            },
            TreeToken::EndTag(tag) => match tag.name.as_str() {
                "head" => {
                    let _ = self.pop()?;
                    self.switch_mode(InsertionMode::AfterHead);
                    Ok(())
                }
                "body" | "html" | "br" => self.handle_in_head_anything_else(token),
                "template" => self.close_template(),
                _ => {
                    self.parse_error(format!("Stray end tag “{}”.", tag.name));
                    Ok(())
                }
            },
            _ => self.handle_in_head_anything_else(token),
        }
    }

    fn handle_in_head_anything_else(&mut self, token: &TreeToken) -> Result<(), ParseError> {
        // "Pop the current node (which will be the head element) off the
        // stack of open elements. Switch the insertion mode to "after head".
        // Reprocess the token."
        let _ = self.pop()?;
        self.switch_mode(InsertionMode::AfterHead);
        self.reprocess_token(token)
    }

    /// The `</template>` end tag in "in head".
    fn close_template(&mut self) -> Result<(), ParseError> {
        // "If there is no template element on the stack of open elements,
        // then this is a parse error; ignore the token."
        if !self.stack_has_html("template") {
            self.parse_error("Stray end tag “template”.");
            return Ok(());
        }
        self.generate_all_implied_end_tags_thoroughly()?;
        if !self.current_node_is("template") {
            self.parse_error("End tag “template” seen, but there were open elements.");
        }
        self.pop_until_tag("template")?;
        self.clear_active_formatting_elements_to_last_marker();
        let _ = self.template_modes.pop();
        self.reset_insertion_mode_appropriately();
        Ok(())
    }

    /// [§ 13.2.6.4.4](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inhead)
    ///
    /// "If the active speculative HTML parser is null, then: If the element
    /// has a charset attribute, and getting an encoding from its value results
    /// in an encoding, and the confidence is currently tentative, then change
    /// the encoding to the resulting encoding. Otherwise, if the element has
    /// an http-equiv attribute whose value is an ASCII case-insensitive match
    /// for the string "Content-Type", and the element has a content
    /// attribute, and applying the algorithm for extracting a character
    /// encoding from a meta element to that attribute's value returns an
    /// encoding, and the confidence is currently tentative, then change the
    /// encoding to the extracted encoding."
    ///
    /// Whether the label resolves and whether confidence is tentative is
    /// decided by the driver.
    fn check_meta_encoding_declaration(&mut self, tag: &Tag) {
        if self.context.is_some() {
            return;
        }
        if let Some(charset) = tag.attribute("charset") {
            self.encoding_indicator = Some(charset.to_string());
            return;
        }
        let Some(content) = tag.attribute("content") else {
            return;
        };
        let Some(charset) = extract_charset_from_content(content) else {
            return;
        };
        let pragma = tag
            .attribute("http-equiv")
            .is_some_and(|v| v.eq_ignore_ascii_case("content-type"));
        if pragma {
            self.encoding_indicator = Some(charset.to_string());
        } else {
            self.warning(
                "Attribute “content” would be sniffed as an internal character encoding declaration but there was no matching “http-equiv='Content-Type'” attribute.",
            );
        }
    }

    /// [§ 13.2.6.4.5 The "in head noscript" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inheadnoscript)
    pub(super) fn handle_in_head_noscript_mode(
        &mut self,
        token: &TreeToken,
    ) -> Result<(), ParseError> {
        match token {
            TreeToken::Doctype(_) => {
                self.parse_error("Stray doctype.");
                Ok(())
            }
            TreeToken::StartTag(tag) if tag.name == "html" => self.handle_in_body_mode(token),
            TreeToken::EndTag(tag) if tag.name == "noscript" => {
                let _ = self.pop()?;
                self.switch_mode(InsertionMode::InHead);
                Ok(())
            }
            TreeToken::Whitespace(_) | TreeToken::Comment(_) => self.handle_in_head_mode(token),
            TreeToken::StartTag(tag)
                if matches!(
                    tag.name.as_str(),
                    "basefont" | "bgsound" | "link" | "meta" | "noframes" | "style"
                ) =>
            {
                self.handle_in_head_mode(token)
            }
            TreeToken::StartTag(tag) if matches!(tag.name.as_str(), "head" | "noscript") => {
                self.parse_error(format!("Start tag “{}” seen in “noscript”.", tag.name));
                Ok(())
            }
            TreeToken::EndTag(tag) if tag.name != "br" => {
                self.parse_error(format!("Stray end tag “{}”.", tag.name));
                Ok(())
            }
            _ => {
                self.parse_error("Bad content inside “noscript” in “head”.");
                let _ = self.pop()?;
                self.switch_mode(InsertionMode::InHead);
                self.reprocess_token(token)
            }
        }
    }

    /// [§ 13.2.6.4.6 The "after head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-head-insertion-mode)
    pub(super) fn handle_after_head_mode(&mut self, token: &TreeToken) -> Result<(), ParseError> {
        match token {
            TreeToken::Whitespace(text) => self.insert_character(text),
            TreeToken::Comment(data) => self.insert_comment(data),
            TreeToken::Doctype(_) => {
                self.parse_error("Stray doctype.");
                Ok(())
            }
            TreeToken::StartTag(tag) => match tag.name.as_str() {
                "html" => self.handle_in_body_mode(token),
                "body" => {
                    let _ = self.insert_html_element(tag)?;
                    self.frameset_ok = false;
                    self.switch_mode(InsertionMode::InBody);
                    Ok(())
                }
                "frameset" => {
                    let _ = self.insert_html_element(tag)?;
                    self.switch_mode(InsertionMode::InFrameset);
                    Ok(())
                }
                "base" | "basefont" | "bgsound" | "link" | "meta" | "noframes" | "script"
                | "style" | "template" | "title" => {
                    self.parse_error(format!(
                        "“{}” element between “head” and “body”.",
                        tag.name
                    ));
                    self.process_in_reopened_head(token)
                }
                "head" => {
                    self.parse_error("Stray start tag “head”.");
                    Ok(())
                }
                _ => self.handle_after_head_anything_else(token),
            },
            TreeToken::EndTag(tag) => match tag.name.as_str() {
                "template" => self.handle_in_head_mode(token),
                "body" | "html" | "br" => self.handle_after_head_anything_else(token),
                _ => {
                    self.parse_error(format!("Stray end tag “{}”.", tag.name));
                    Ok(())
                }
            },
            _ => self.handle_after_head_anything_else(token),
        }
    }

    /// "Push the node pointed to by the head element pointer onto the stack
    /// of open elements. Process the token using the rules for the "in head"
    /// insertion mode. Remove the node pointed to by the head element pointer
    /// from the stack of open elements. (It might not be the current node at
    /// this point.)"
    fn process_in_reopened_head(&mut self, token: &TreeToken) -> Result<(), ParseError> {
        let Some(head) = self.head_element.clone() else {
            return self.handle_in_head_mode(token);
        };
        self.open_elements.push(OpenElement {
            handle: head.clone(),
            name: QualName::html("head"),
            annotation_integration_point: false,
        });
        self.handle_in_head_mode(token)?;
        if let Some(index) = self.stack_index_of(&head) {
            self.remove_from_stack(index)?;
        }
        Ok(())
    }

    fn handle_after_head_anything_else(&mut self, token: &TreeToken) -> Result<(), ParseError> {
        // "Insert an HTML element for a "body" start tag token with no
        // attributes. Switch the insertion mode to "in body". Reprocess the
        // current token."
        let _ = self.insert_html_element(&Tag::new("body"))?;
        self.switch_mode(InsertionMode::InBody);
        self.reprocess_token(token)
    }

    /// [§ 13.2.6.4.8 The "text" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incdata)
    pub(super) fn handle_text_mode(&mut self, token: &TreeToken) -> Result<(), ParseError> {
        match token {
            TreeToken::Whitespace(text) | TreeToken::Characters(text) => {
                self.insert_character(text)
            }
            TreeToken::Null => self.insert_character("\u{FFFD}"),
            TreeToken::Eof => {
                let name = self
                    .current_node()
                    .map(|node| node.name.local.clone())
                    .unwrap_or_default();
                self.parse_error(format!("End of file seen when expecting text or an end tag for “{name}”."));
                let _ = self.pop()?;
                self.switch_mode(self.original_mode);
                self.reprocess_token(token)
            }
            // "An end tag whose tag name is "script"" and "Any other end
            // tag": "Pop the current node off the stack of open elements.
            // Switch the insertion mode to the original insertion mode."
            TreeToken::EndTag(_) => {
                let _ = self.pop()?;
                self.switch_mode(self.original_mode);
                Ok(())
            }
            // The tokenizer only produces text in the raw text states.
            TreeToken::StartTag(_) | TreeToken::Comment(_) | TreeToken::Doctype(_) => Ok(()),
        }
    }

    /// [§ 13.2.6.4.18 The "in template" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intemplate)
    pub(super) fn handle_in_template_mode(&mut self, token: &TreeToken) -> Result<(), ParseError> {
        match token {
            TreeToken::Whitespace(_)
            | TreeToken::Characters(_)
            | TreeToken::Null
            | TreeToken::Comment(_)
            | TreeToken::Doctype(_) => self.handle_in_body_mode(token),
            TreeToken::StartTag(tag) => match tag.name.as_str() {
                "base" | "basefont" | "bgsound" | "link" | "meta" | "noframes" | "script"
                | "style" | "template" | "title" => self.handle_in_head_mode(token),
                "caption" | "colgroup" | "tbody" | "tfoot" | "thead" => {
                    self.switch_template_mode(InsertionMode::InTable, token)
                }
                "col" => self.switch_template_mode(InsertionMode::InColumnGroup, token),
                "tr" => self.switch_template_mode(InsertionMode::InTableBody, token),
                "td" | "th" => self.switch_template_mode(InsertionMode::InRow, token),
                _ => self.switch_template_mode(InsertionMode::InBody, token),
            },
            TreeToken::EndTag(tag) if tag.name == "template" => self.handle_in_head_mode(token),
            TreeToken::EndTag(tag) => {
                self.parse_error(format!("Stray end tag “{}”.", tag.name));
                Ok(())
            }
            TreeToken::Eof => {
                // "If there is no template element on the stack of open
                // elements, then stop parsing. (fragment case)"
                if !self.stack_has_html("template") {
                    return self.stop_parsing();
                }
                self.parse_error("End of file seen and there were open elements.");
                self.pop_until_tag("template")?;
                self.clear_active_formatting_elements_to_last_marker();
                let _ = self.template_modes.pop();
                self.reset_insertion_mode_appropriately();
                self.reprocess_token(token)
            }
        }
    }

    /// "Pop the current template insertion mode off the stack of template
    /// insertion modes. Push m onto the stack of template insertion modes so
    /// that it is the new current template insertion mode. Switch the
    /// insertion mode to m. Reprocess the token."
    fn switch_template_mode(
        &mut self,
        mode: InsertionMode,
        token: &TreeToken,
    ) -> Result<(), ParseError> {
        let _ = self.template_modes.pop();
        self.template_modes.push(mode);
        self.switch_mode(mode);
        self.reprocess_token(token)
    }

    /// [§ 13.2.6.4.19 The "after body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-afterbody)
    pub(super) fn handle_after_body_mode(&mut self, token: &TreeToken) -> Result<(), ParseError> {
        match token {
            TreeToken::Whitespace(_) => self.handle_in_body_mode(token),
            // "Insert a comment as the last child of the first element in the
            // stack of open elements (the html element)."
            TreeToken::Comment(data) => self.insert_comment_in_html_element(data),
            TreeToken::Doctype(_) => {
                self.parse_error("Stray doctype.");
                Ok(())
            }
            TreeToken::StartTag(tag) if tag.name == "html" => self.handle_in_body_mode(token),
            TreeToken::EndTag(tag) if tag.name == "html" => {
                // "If the parser was created as part of the HTML fragment
                // parsing algorithm, this is a parse error; ignore the token.
                // (fragment case)"
                if self.context.is_some() {
                    self.parse_error("Stray end tag “html”.");
                } else {
                    self.switch_mode(InsertionMode::AfterAfterBody);
                }
                Ok(())
            }
            TreeToken::Eof => self.stop_parsing(),
            _ => {
                self.parse_error(match token {
                    TreeToken::StartTag(tag) => format!("Stray start tag “{}”.", tag.name),
                    TreeToken::EndTag(tag) => format!("Stray end tag “{}”.", tag.name),
                    _ => "Non-space character after body.".to_string(),
                });
                self.switch_mode(InsertionMode::InBody);
                self.reprocess_token(token)
            }
        }
    }

    /// [§ 13.2.6.4.20 The "in frameset" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inframeset)
    pub(super) fn handle_in_frameset_mode(&mut self, token: &TreeToken) -> Result<(), ParseError> {
        match token {
            TreeToken::Whitespace(text) => self.insert_character(text),
            TreeToken::Comment(data) => self.insert_comment(data),
            TreeToken::StartTag(tag) => match tag.name.as_str() {
                "html" => self.handle_in_body_mode(token),
                "frameset" => {
                    let _ = self.insert_html_element(tag)?;
                    Ok(())
                }
                "frame" => {
                    let _ = self.insert_void_html_element(tag)?;
                    Ok(())
                }
                "noframes" => self.handle_in_head_mode(token),
                _ => {
                    self.parse_error(format!("Stray start tag “{}”.", tag.name));
                    Ok(())
                }
            },
            TreeToken::EndTag(tag) if tag.name == "frameset" => {
                // "If the current node is the root html element, then this is
                // a parse error; ignore the token. (fragment case)"
                if self.open_elements.len() == 1 && self.current_node_is("html") {
                    self.parse_error("Stray end tag “frameset”.");
                    return Ok(());
                }
                let _ = self.pop()?;
                if self.context.is_none() && !self.current_node_is("frameset") {
                    self.switch_mode(InsertionMode::AfterFrameset);
                }
                Ok(())
            }
            TreeToken::Eof => {
                if !(self.open_elements.len() == 1 && self.current_node_is("html")) {
                    self.parse_error("End of file seen and there were open elements.");
                }
                self.stop_parsing()
            }
            TreeToken::EndTag(tag) => {
                self.parse_error(format!("Stray end tag “{}”.", tag.name));
                Ok(())
            }
            TreeToken::Doctype(_) => {
                self.parse_error("Stray doctype.");
                Ok(())
            }
            TreeToken::Characters(_) | TreeToken::Null => {
                self.parse_error("Non-space in “frameset”.");
                Ok(())
            }
        }
    }

    /// [§ 13.2.6.4.21 The "after frameset" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-afterframeset)
    pub(super) fn handle_after_frameset_mode(
        &mut self,
        token: &TreeToken,
    ) -> Result<(), ParseError> {
        match token {
            TreeToken::Whitespace(text) => self.insert_character(text),
            TreeToken::Comment(data) => self.insert_comment(data),
            TreeToken::StartTag(tag) if tag.name == "html" => self.handle_in_body_mode(token),
            TreeToken::EndTag(tag) if tag.name == "html" => {
                self.switch_mode(InsertionMode::AfterAfterFrameset);
                Ok(())
            }
            TreeToken::StartTag(tag) if tag.name == "noframes" => self.handle_in_head_mode(token),
            TreeToken::Eof => self.stop_parsing(),
            _ => {
                self.parse_error("Stray content after “frameset”.");
                Ok(())
            }
        }
    }

    /// [§ 13.2.6.4.22 The "after after body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-after-body-insertion-mode)
    pub(super) fn handle_after_after_body_mode(
        &mut self,
        token: &TreeToken,
    ) -> Result<(), ParseError> {
        match token {
            TreeToken::Comment(data) => self.insert_comment_in_document(data),
            TreeToken::Doctype(_) | TreeToken::Whitespace(_) => self.handle_in_body_mode(token),
            TreeToken::StartTag(tag) if tag.name == "html" => self.handle_in_body_mode(token),
            TreeToken::Eof => self.stop_parsing(),
            _ => {
                self.parse_error("Stray content after the end of the document.");
                self.switch_mode(InsertionMode::InBody);
                self.reprocess_token(token)
            }
        }
    }

    /// [§ 13.2.6.4.23 The "after after frameset" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-after-frameset-insertion-mode)
    pub(super) fn handle_after_after_frameset_mode(
        &mut self,
        token: &TreeToken,
    ) -> Result<(), ParseError> {
        match token {
            TreeToken::Comment(data) => self.insert_comment_in_document(data),
            TreeToken::Doctype(_) | TreeToken::Whitespace(_) => self.handle_in_body_mode(token),
            TreeToken::StartTag(tag) if tag.name == "html" => self.handle_in_body_mode(token),
            TreeToken::StartTag(tag) if tag.name == "noframes" => self.handle_in_head_mode(token),
            TreeToken::Eof => self.stop_parsing(),
            _ => {
                self.parse_error("Stray content after the end of the document.");
                Ok(())
            }
        }
    }
}

//! [§ 13.2.6.5 The rules for parsing tokens in foreign content](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inforeign)

use super::core::{TreeBuilder, TreeToken, is_html_integration_point};
use super::foreign_content::{
    adjust_foreign_attributes, adjust_mathml_attributes, adjust_svg_attributes,
    adjust_svg_tag_name,
};
use super::sink::TreeSink;
use super::tags;
use crate::error::ParseError;
use crate::names::Namespace;
use crate::tokenizer::Tag;

/// Start tags that break out of foreign content back into HTML.
const BREAKOUT_TAGS: &[&str] = &[
    "b", "big", "blockquote", "body", "br", "center", "code", "dd", "div", "dl", "dt", "em",
    "embed", "h1", "h2", "h3", "h4", "h5", "h6", "head", "hr", "i", "img", "li", "listing", "menu",
    "meta", "nobr", "ol", "p", "pre", "ruby", "s", "small", "span", "strong", "strike", "sub",
    "sup", "table", "tt", "u", "ul", "var",
];

fn is_breakout(token: &TreeToken) -> bool {
    match token {
        TreeToken::StartTag(tag) if BREAKOUT_TAGS.contains(&tag.name.as_str()) => true,
        // "A start tag whose tag name is "font", if the token has any
        // attributes named "color", "face", or "size""
        TreeToken::StartTag(tag) if tag.name == "font" => tag
            .attributes
            .iter()
            .any(|a| matches!(a.name.as_str(), "color" | "face" | "size")),
        // "An end tag whose tag name is "br", "p""
        TreeToken::EndTag(tag) => tag.name == "br" || tag.name == "p",
        _ => false,
    }
}

impl<S: TreeSink> TreeBuilder<S> {
    pub(super) fn process_in_foreign_content(&mut self, token: &TreeToken) -> Result<(), ParseError> {
        if is_breakout(token) {
            return self.break_out_of_foreign_content(token);
        }
        match token {
            TreeToken::Null => {
                // "Parse error. Insert a U+FFFD REPLACEMENT CHARACTER
                // character."
                self.parse_error("Saw U+0000 in foreign content.");
                self.insert_character("\u{FFFD}")
            }
            TreeToken::Whitespace(text) => self.insert_character(text),
            TreeToken::Characters(text) => {
                self.insert_character(text)?;
                self.frameset_ok = false;
                Ok(())
            }
            TreeToken::Comment(data) => self.insert_comment(data),
            TreeToken::Doctype(_) => {
                self.parse_error("Stray doctype.");
                Ok(())
            }
            TreeToken::StartTag(tag) => self.insert_foreign_start_tag(tag),
            TreeToken::EndTag(tag) => self.handle_foreign_end_tag(token, tag),
            // The dispatcher always sends end-of-file to the HTML rules.
            TreeToken::Eof => self.process_using_the_rules_for(self.mode, token),
        }
    }

    fn break_out_of_foreign_content(&mut self, token: &TreeToken) -> Result<(), ParseError> {
        let name = match token {
            TreeToken::StartTag(tag) | TreeToken::EndTag(tag) => tag.name.as_str(),
            _ => "",
        };
        self.parse_error(format!("HTML start tag “{name}” in a foreign namespace context."));
        // "While the current node is not a MathML text integration point, an
        // HTML integration point, or an element in the HTML namespace, pop
        // elements from the stack of open elements."
        while self.current_node().is_some_and(|node| {
            node.name.ns != Namespace::Html
                && !tags::is_mathml_text_integration_point(&node.name)
                && !is_html_integration_point(&node.name, node.annotation_integration_point)
        }) {
            let _ = self.pop()?;
        }
        // "Reprocess the token according to the rules given in the section
        // corresponding to the current insertion mode in HTML content."
        self.process_using_the_rules_for(self.mode, token)
    }

    /// "Any other start tag"
    fn insert_foreign_start_tag(&mut self, tag: &Tag) -> Result<(), ParseError> {
        let Some(ns) = self.adjusted_current_node().map(|(name, _)| name.ns) else {
            return Ok(());
        };
        let mut adjusted = tag.clone();
        match ns {
            Namespace::MathMl => adjust_mathml_attributes(&mut adjusted.attributes),
            Namespace::Svg => {
                adjusted.name = adjust_svg_tag_name(&adjusted.name).to_string();
                adjust_svg_attributes(&mut adjusted.attributes);
            }
            _ => {}
        }
        adjust_foreign_attributes(&mut adjusted.attributes);
        let _ = self.insert_foreign_element(&adjusted, ns, false)?;

        // "If the token has its self-closing flag set, then run the
        // appropriate steps from the following list: If the token's tag name
        // is "script", and the new current node is in the SVG namespace:
        // Acknowledge the token's self-closing flag, and then act as
        // described in the steps for a "script" end tag below. Otherwise: Pop
        // the current node off the stack of open elements and acknowledge the
        // token's self-closing flag."
        if tag.self_closing {
            let _ = self.pop()?;
            self.self_closing_acknowledged = true;
        }
        Ok(())
    }

    fn handle_foreign_end_tag(&mut self, token: &TreeToken, tag: &Tag) -> Result<(), ParseError> {
        // "An end tag whose tag name is "script", if the current node is an
        // SVG script element: Pop the current node off the stack of open
        // elements."
        if tag.name == "script"
            && self
                .current_node()
                .is_some_and(|node| node.name.ns == Namespace::Svg && node.name.local == "script")
        {
            let _ = self.pop()?;
            return Ok(());
        }

        // STEP 1: "Initialize node to be the current node (the bottommost node
        // of the stack)."
        let Some(mut index) = self.open_elements.len().checked_sub(1) else {
            return Ok(());
        };
        // STEP 2: "If node's tag name, converted to ASCII lowercase, is not
        // the same as the tag name of the token, then this is a parse error."
        if !self.open_elements[index]
            .name
            .local
            .eq_ignore_ascii_case(&tag.name)
        {
            self.parse_error(format!("End tag “{}” did not match the name of the current open element.", tag.name));
        }
        loop {
            // STEP 3: "Loop: If node is the topmost element in the stack of
            // open elements, then return. (fragment case)"
            if index == 0 {
                return Ok(());
            }
            // STEP 4: "If node's tag name, converted to ASCII lowercase, is
            // the same as the tag name of the token, pop elements from the
            // stack of open elements until node has been popped from the
            // stack, and then return."
            let node = &self.open_elements[index];
            if node.name.local.eq_ignore_ascii_case(&tag.name) {
                let handle = node.handle.clone();
                return self.pop_until_handle(&handle);
            }
            // STEP 5: "Set node to the previous entry in the stack of open
            // elements."
            index -= 1;
            // STEP 6: "If node is not an element in the HTML namespace, return
            // to the step labeled loop."
            // STEP 7: "Otherwise, process the token according to the rules
            // given in the section corresponding to the current insertion mode
            // in HTML content."
            if self.open_elements[index].name.ns == Namespace::Html {
                return self.process_using_the_rules_for(self.mode, token);
            }
        }
    }
}

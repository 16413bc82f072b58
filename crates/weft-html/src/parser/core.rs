use std::fmt;
use std::mem;

use log::{debug, trace};
use strum_macros::Display;
use weft_common::{Position, Reporter, Stage};

use super::sink::{DocumentMode, Flow, TreeSink};
use super::tags::{self, Scope};
use crate::config::{ParserOptions, XmlViolationPolicy};
use crate::error::ParseError;
use crate::names::{Namespace, QualName};
use crate::tokenizer::{Attribute, Doctype, Tag, Token, TokenSink, TokenSinkResult, TokenizerState};

/// [§ 13.2.4.1 The insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-insertion-mode)
///
/// "The insertion mode is a state variable that controls the primary
/// operation of the tree construction stage."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum InsertionMode {
    /// [§ 13.2.6.4.1 The "initial" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-initial-insertion-mode)
    Initial,
    /// [§ 13.2.6.4.2 The "before html" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-html-insertion-mode)
    BeforeHtml,
    /// [§ 13.2.6.4.3 The "before head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-head-insertion-mode)
    BeforeHead,
    /// [§ 13.2.6.4.4 The "in head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inhead)
    InHead,
    /// [§ 13.2.6.4.5 The "in head noscript" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inheadnoscript)
    InHeadNoscript,
    /// [§ 13.2.6.4.6 The "after head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-head-insertion-mode)
    AfterHead,
    /// [§ 13.2.6.4.7 The "in body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
    InBody,
    /// [§ 13.2.6.4.8 The "text" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incdata)
    Text,
    /// [§ 13.2.6.4.9 The "in table" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intable)
    InTable,
    /// [§ 13.2.6.4.10 The "in table text" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intabletext)
    InTableText,
    /// [§ 13.2.6.4.11 The "in caption" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incaption)
    InCaption,
    /// [§ 13.2.6.4.12 The "in column group" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incolgroup)
    InColumnGroup,
    /// [§ 13.2.6.4.13 The "in table body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intbody)
    InTableBody,
    /// [§ 13.2.6.4.14 The "in row" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intr)
    InRow,
    /// [§ 13.2.6.4.15 The "in cell" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intd)
    InCell,
    /// [§ 13.2.6.4.16 The "in select" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inselect)
    InSelect,
    /// [§ 13.2.6.4.17 The "in select in table" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inselectintable)
    InSelectInTable,
    /// [§ 13.2.6.4.18 The "in template" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intemplate)
    InTemplate,
    /// [§ 13.2.6.4.19 The "after body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-afterbody)
    AfterBody,
    /// [§ 13.2.6.4.20 The "in frameset" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inframeset)
    InFrameset,
    /// [§ 13.2.6.4.21 The "after frameset" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-afterframeset)
    AfterFrameset,
    /// [§ 13.2.6.4.22 The "after after body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-after-body-insertion-mode)
    AfterAfterBody,
    /// [§ 13.2.6.4.23 The "after after frameset" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-after-frameset-insertion-mode)
    AfterAfterFrameset,
}

/// A token as the tree builder sees it.
///
/// Character runs from the tokenizer are split so that each mode can match
/// whitespace, U+0000 and other characters the way the rules are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum TreeToken {
    Doctype(Doctype),
    StartTag(Tag),
    EndTag(Tag),
    /// "U+0009 CHARACTER TABULATION, U+000A LINE FEED (LF), U+000C FORM FEED
    /// (FF), U+000D CARRIAGE RETURN (CR), or U+0020 SPACE"
    Whitespace(String),
    /// Any other characters except U+0000.
    Characters(String),
    /// "A character token that is U+0000 NULL"
    Null,
    Comment(String),
    Eof,
}

impl TreeToken {
    pub(super) fn is_start_tag(&self, name: &str) -> bool {
        matches!(self, Self::StartTag(tag) if tag.name == name)
    }
}

/// Split a character run into whitespace, NUL and other runs.
pub(super) fn split_character_run(text: &str) -> Vec<TreeToken> {
    #[derive(PartialEq)]
    enum Class {
        Whitespace,
        Null,
        Other,
    }
    let classify = |c: char| match c {
        '\t' | '\n' | '\u{000C}' | '\r' | ' ' => Class::Whitespace,
        '\0' => Class::Null,
        _ => Class::Other,
    };

    let mut tokens = Vec::new();
    let mut start = 0;
    let mut current: Option<Class> = None;
    for (index, c) in text.char_indices() {
        let class = classify(c);
        if class == Class::Null {
            if let Some(previous) = current.take() {
                tokens.push(run_token(&previous, &text[start..index]));
            }
            tokens.push(TreeToken::Null);
            start = index + c.len_utf8();
            continue;
        }
        match &current {
            Some(previous) if *previous == class => {}
            Some(previous) => {
                tokens.push(run_token(previous, &text[start..index]));
                start = index;
                current = Some(class);
            }
            None => {
                start = index;
                current = Some(class);
            }
        }
    }
    if let Some(previous) = current {
        tokens.push(run_token(&previous, &text[start..]));
    }

    fn run_token(class: &Class, text: &str) -> TreeToken {
        match class {
            Class::Whitespace => TreeToken::Whitespace(text.to_string()),
            _ => TreeToken::Characters(text.to_string()),
        }
    }
    tokens
}

/// [§ 13.2.4.3 The stack of open elements](https://html.spec.whatwg.org/multipage/parsing.html#the-stack-of-open-elements)
#[derive(Debug, Clone)]
pub(super) struct OpenElement<H> {
    pub(super) handle: H,
    pub(super) name: QualName,
    /// A MathML `annotation-xml` whose `encoding` was `text/html` or
    /// `application/xhtml+xml`.
    pub(super) annotation_integration_point: bool,
}

impl<H> OpenElement<H> {
    pub(super) fn is_html(&self, local: &str) -> bool {
        self.name.is_html(local)
    }

    pub(super) fn is_html_one_of(&self, names: &[&str]) -> bool {
        self.name.ns == Namespace::Html && names.contains(&self.name.local.as_str())
    }
}

/// [§ 13.2.6 Tree construction](https://html.spec.whatwg.org/multipage/parsing.html#html-integration-point)
///
/// "A node is an HTML integration point if it is one of the following
/// elements: A MathML annotation-xml element whose start tag token had an
/// attribute with the name "encoding" whose value was an ASCII
/// case-insensitive match for the string "text/html"; ... "application/xhtml+xml";
/// An SVG `foreignObject` element; An SVG desc element; An SVG title element"
pub(super) fn is_html_integration_point(name: &QualName, annotation: bool) -> bool {
    annotation
        || (name.ns == Namespace::Svg
            && matches!(name.local.as_str(), "foreignObject" | "desc" | "title"))
}

/// [§ 13.2.4.4 The list of active formatting elements](https://html.spec.whatwg.org/multipage/parsing.html#the-list-of-active-formatting-elements)
#[derive(Debug, Clone)]
pub(super) enum ActiveFormattingElement<H> {
    /// A formatting element and the token it was created for.
    Element {
        /// The element in the sink.
        handle: H,
        /// "the token for which the element was created", kept for
        /// reconstruction and the Noah's Ark clause.
        tag: Tag,
    },
    /// "Markers are inserted when entering applet, object, marquee, template,
    /// td, th, and caption elements"
    Marker,
}

/// The element a fragment is parsed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentContext {
    /// The context element's name.
    pub name: QualName,
    /// For a MathML `annotation-xml` context: whether its `encoding` makes it
    /// an HTML integration point.
    pub html_annotation: bool,
}

impl FragmentContext {
    /// A context element with the given name.
    #[must_use]
    pub const fn new(name: QualName) -> Self {
        Self {
            name,
            html_annotation: false,
        }
    }

    /// [§ 13.4 Parsing HTML fragments](https://html.spec.whatwg.org/multipage/parsing.html#parsing-html-fragments)
    ///
    /// "Set the state of the HTML parser's tokenization stage as follows,
    /// switching on the context element"
    #[must_use]
    pub fn tokenizer_state(&self, scripting_enabled: bool) -> TokenizerState {
        if self.name.ns != Namespace::Html {
            return TokenizerState::Data;
        }
        match self.name.local.as_str() {
            "title" | "textarea" => TokenizerState::RCDATA,
            "style" | "xmp" | "iframe" | "noembed" | "noframes" => TokenizerState::RAWTEXT,
            "noscript" if scripting_enabled => TokenizerState::RAWTEXT,
            "script" => TokenizerState::ScriptData,
            "plaintext" => TokenizerState::PLAINTEXT,
            _ => TokenizerState::Data,
        }
    }
}

/// Where a new node goes.
///
/// [§ 13.2.6.1 Creating and inserting nodes](https://html.spec.whatwg.org/multipage/parsing.html#appropriate-place-for-inserting-a-node)
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum InsertionPoint<H> {
    /// "inside parent, after its last child (if any)"
    Append(H),
    /// "inside parent, immediately before sibling"
    Before { parent: H, sibling: H },
}

/// The tree construction stage.
///
/// Consumes tokens as a [`TokenSink`] and builds a tree through a
/// [`TreeSink`].
#[allow(clippy::struct_excessive_bools)]
pub struct TreeBuilder<S: TreeSink> {
    pub(super) sink: S,
    pub(super) reporter: Reporter,
    pub(super) options: ParserOptions,

    /// [§ 13.2.4.1](https://html.spec.whatwg.org/multipage/parsing.html#the-insertion-mode)
    pub(super) mode: InsertionMode,
    /// "the original insertion mode", restored when leaving "text" and "in
    /// table text".
    pub(super) original_mode: InsertionMode,
    /// "the stack of template insertion modes"
    pub(super) template_modes: Vec<InsertionMode>,

    /// [§ 13.2.4.3](https://html.spec.whatwg.org/multipage/parsing.html#the-stack-of-open-elements)
    pub(super) open_elements: Vec<OpenElement<S::Handle>>,
    /// [§ 13.2.4.4](https://html.spec.whatwg.org/multipage/parsing.html#the-list-of-active-formatting-elements)
    pub(super) active_formatting_elements: Vec<ActiveFormattingElement<S::Handle>>,

    /// [§ 13.2.4.5 The element pointers](https://html.spec.whatwg.org/multipage/parsing.html#the-element-pointers)
    /// "the head element pointer"
    pub(super) head_element: Option<S::Handle>,
    /// "the form element pointer"
    pub(super) form_element: Option<S::Handle>,

    /// [§ 13.2.4.6 Other parsing state flags](https://html.spec.whatwg.org/multipage/parsing.html#other-parsing-state-flags)
    /// "The frameset-ok flag is set to "ok" when the parser is created."
    pub(super) frameset_ok: bool,
    /// "foster parenting", set while "in table" anything-else content is
    /// processed using the "in body" rules.
    pub(super) foster_parenting: bool,
    /// "pending table character tokens"
    pub(super) pending_table_text: String,
    pub(super) pending_table_text_is_whitespace: bool,

    pub(super) document_mode: DocumentMode,
    pub(super) context: Option<FragmentContext>,

    /// Drop a leading newline from the next character run (after `<pre>`,
    /// `<listing>` and `<textarea>`).
    pub(super) ignore_lf: bool,
    /// "Acknowledge the token's self-closing flag"
    pub(super) self_closing_acknowledged: bool,

    pub(super) position: Position,
    pub(super) tokenizer_switch: Option<TokenizerState>,
    pub(super) suspend_requested: bool,
    pub(super) encoding_indicator: Option<String>,
}

impl<S: TreeSink> fmt::Debug for TreeBuilder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeBuilder")
            .field("mode", &self.mode)
            .field("open_elements", &self.open_elements.len())
            .field(
                "active_formatting_elements",
                &self.active_formatting_elements.len(),
            )
            .field("document_mode", &self.document_mode)
            .field("fragment", &self.context.is_some())
            .finish_non_exhaustive()
    }
}

impl<S: TreeSink> TreeBuilder<S> {
    /// A tree builder for a whole document.
    #[must_use]
    pub fn new(sink: S, options: ParserOptions, reporter: Reporter) -> Self {
        Self {
            sink,
            reporter,
            options,
            mode: InsertionMode::Initial,
            original_mode: InsertionMode::Initial,
            template_modes: Vec::new(),
            open_elements: Vec::new(),
            active_formatting_elements: Vec::new(),
            head_element: None,
            form_element: None,
            frameset_ok: true,
            foster_parenting: false,
            pending_table_text: String::new(),
            pending_table_text_is_whitespace: true,
            document_mode: DocumentMode::Standards,
            context: None,
            ignore_lf: false,
            self_closing_acknowledged: false,
            position: Position::START,
            tokenizer_switch: None,
            suspend_requested: false,
            encoding_indicator: None,
        }
    }

    /// [§ 13.4 Parsing HTML fragments](https://html.spec.whatwg.org/multipage/parsing.html#parsing-html-fragments)
    ///
    /// The fragment's nodes end up as children of an `html` element appended
    /// to the sink's document.
    ///
    /// # Errors
    ///
    /// Sink failures while creating the root element.
    pub fn new_fragment(
        sink: S,
        options: ParserOptions,
        reporter: Reporter,
        context: FragmentContext,
    ) -> Result<Self, ParseError> {
        let mut builder = Self::new(sink, options, reporter);
        builder.context = Some(context);
        builder.start_fragment()?;
        Ok(builder)
    }

    fn start_fragment(&mut self) -> Result<(), ParseError> {
        // STEP 6: "Let root be a new html element with no attributes."
        // STEP 7: "Append the element root to the Document node created above."
        let name = QualName::html("html");
        let root = self.sink.create_element(&name, &[], None)?;
        let document = self.sink.document();
        self.sink.append_child(&document, &root)?;
        // STEP 8: "Set up the parser's stack of open elements so that it
        // contains just the single element root."
        self.open_elements.push(OpenElement {
            handle: root,
            name,
            annotation_integration_point: false,
        });
        // STEP 9: "If the context element is a template element, push "in
        // template" onto the stack of template insertion modes"
        if self.context.as_ref().is_some_and(|c| c.name.is_html("template")) {
            self.template_modes.push(InsertionMode::InTemplate);
        }
        // STEP 11: "Reset the parser's insertion mode appropriately."
        self.reset_insertion_mode_appropriately();
        Ok(())
    }

    /// The sink.
    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// The sink, mutably.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Give up the builder and return its sink.
    #[must_use]
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// The current insertion mode.
    #[must_use]
    pub const fn insertion_mode(&self) -> InsertionMode {
        self.mode
    }

    /// The document mode chosen by the DOCTYPE, if any was seen.
    #[must_use]
    pub const fn document_mode(&self) -> DocumentMode {
        self.document_mode
    }

    /// Report a tree construction parse error at the current token.
    pub(super) fn parse_error(&self, message: impl Into<String>) {
        self.reporter
            .error(Stage::TreeBuilder, message, self.position);
    }

    pub(super) fn warning(&self, message: impl Into<String>) {
        self.reporter
            .warning(Stage::TreeBuilder, message, self.position);
    }

    pub(super) fn switch_mode(&mut self, mode: InsertionMode) {
        if self.mode != mode {
            trace!("insertion mode {} -> {mode}", self.mode);
        }
        self.mode = mode;
    }

    /// Ask the tokenizer to switch state after the current token.
    pub(super) fn switch_tokenizer(&mut self, state: TokenizerState) {
        self.tokenizer_switch = Some(state);
    }

    fn take_sink_result(&mut self) -> TokenSinkResult {
        let suspend = mem::take(&mut self.suspend_requested);
        if let Some(label) = self.encoding_indicator.take() {
            return TokenSinkResult::EncodingIndicator(label);
        }
        match (self.tokenizer_switch.take(), suspend) {
            (Some(state), true) => TokenSinkResult::SwitchToAndSuspend(state),
            (Some(state), false) => TokenSinkResult::SwitchTo(state),
            (None, true) => TokenSinkResult::Suspend,
            (None, false) => TokenSinkResult::Continue,
        }
    }

    // ===== Stack of open elements =====

    /// "The current node is the bottommost node in this stack of open
    /// elements."
    pub(super) fn current_node(&self) -> Option<&OpenElement<S::Handle>> {
        self.open_elements.last()
    }

    pub(super) fn current_node_is(&self, local: &str) -> bool {
        self.current_node().is_some_and(|node| node.is_html(local))
    }

    pub(super) fn current_node_is_one_of(&self, names: &[&str]) -> bool {
        self.current_node()
            .is_some_and(|node| node.is_html_one_of(names))
    }

    /// "The adjusted current node is the context element if the parser was
    /// created as part of the HTML fragment parsing algorithm and the stack
    /// of open elements has only one element in it (fragment case);
    /// otherwise, the adjusted current node is the current node."
    ///
    /// Returns the name and whether it is an `annotation-xml` HTML
    /// integration point.
    pub(super) fn adjusted_current_node(&self) -> Option<(&QualName, bool)> {
        match &self.context {
            Some(context) if self.open_elements.len() == 1 => {
                Some((&context.name, context.html_annotation))
            }
            _ => self
                .current_node()
                .map(|node| (&node.name, node.annotation_integration_point)),
        }
    }

    pub(super) fn is_on_stack(&self, handle: &S::Handle) -> bool {
        self.open_elements.iter().any(|e| e.handle == *handle)
    }

    pub(super) fn stack_index_of(&self, handle: &S::Handle) -> Option<usize> {
        self.open_elements.iter().rposition(|e| e.handle == *handle)
    }

    pub(super) fn stack_has_html(&self, local: &str) -> bool {
        self.open_elements.iter().any(|e| e.is_html(local))
    }

    /// Pop the current node, telling the sink.
    pub(super) fn pop(&mut self) -> Result<Option<OpenElement<S::Handle>>, ParseError> {
        let Some(entry) = self.open_elements.pop() else {
            return Ok(None);
        };
        self.element_popped(&entry.handle)?;
        Ok(Some(entry))
    }

    /// Remove an entry from anywhere in the stack, telling the sink.
    pub(super) fn remove_from_stack(&mut self, index: usize) -> Result<(), ParseError> {
        let entry = self.open_elements.remove(index);
        self.element_popped(&entry.handle)
    }

    fn element_popped(&mut self, handle: &S::Handle) -> Result<(), ParseError> {
        if self.sink.element_popped(handle)? == Flow::Suspend {
            debug!("sink requested a suspension");
            self.suspend_requested = true;
        }
        Ok(())
    }

    /// "Pop elements from the stack of open elements until an HTML element
    /// with the same tag name as the token has been popped from the stack."
    pub(super) fn pop_until_tag(&mut self, local: &str) -> Result<(), ParseError> {
        while let Some(entry) = self.pop()? {
            if entry.is_html(local) {
                break;
            }
        }
        Ok(())
    }

    /// Pop until one of the named HTML elements has been popped.
    pub(super) fn pop_until_one_of(&mut self, names: &[&str]) -> Result<(), ParseError> {
        while let Some(entry) = self.pop()? {
            if entry.is_html_one_of(names) {
                break;
            }
        }
        Ok(())
    }

    /// Pop until `handle` has been popped.
    pub(super) fn pop_until_handle(&mut self, handle: &S::Handle) -> Result<(), ParseError> {
        while let Some(entry) = self.pop()? {
            if entry.handle == *handle {
                break;
            }
        }
        Ok(())
    }

    /// [§ 13.2.4.2 Has an element in scope](https://html.spec.whatwg.org/multipage/parsing.html#has-an-element-in-the-specific-scope)
    pub(super) fn has_element_in_scope_named(&self, names: &[&str], scope: Scope) -> bool {
        for node in self.open_elements.iter().rev() {
            if node.is_html_one_of(names) {
                return true;
            }
            if scope.is_boundary(&node.name) {
                return false;
            }
        }
        false
    }

    pub(super) fn has_in_scope(&self, local: &str) -> bool {
        self.has_element_in_scope_named(&[local], Scope::Default)
    }

    pub(super) fn has_in_button_scope(&self, local: &str) -> bool {
        self.has_element_in_scope_named(&[local], Scope::Button)
    }

    pub(super) fn has_in_table_scope(&self, local: &str) -> bool {
        self.has_element_in_scope_named(&[local], Scope::Table)
    }

    /// Scope check for a specific node rather than a tag name.
    pub(super) fn has_node_in_scope(&self, handle: &S::Handle) -> bool {
        for node in self.open_elements.iter().rev() {
            if node.handle == *handle {
                return true;
            }
            if Scope::Default.is_boundary(&node.name) {
                return false;
            }
        }
        false
    }

    /// [§ 13.2.6.3 Closing elements that have implied end tags](https://html.spec.whatwg.org/multipage/parsing.html#generate-implied-end-tags)
    ///
    /// "while the current node is a dd element, a dt element, an li element,
    /// an optgroup element, an option element, a p element, an rb element, an
    /// rp element, an rt element, or an rtc element, the UA must pop the
    /// current node off the stack of open elements."
    pub(super) fn generate_implied_end_tags(&mut self) -> Result<(), ParseError> {
        self.generate_implied_end_tags_excluding(None)
    }

    /// "If a step requires the UA to generate implied end tags but lists an
    /// element to exclude from the process, then the UA must perform the
    /// above steps as if that element was not in the above list."
    pub(super) fn generate_implied_end_tags_excluding(
        &mut self,
        excluded: Option<&str>,
    ) -> Result<(), ParseError> {
        while self.current_node().is_some_and(|node| {
            node.name.ns == Namespace::Html
                && tags::has_implied_end_tag(&node.name.local)
                && excluded != Some(node.name.local.as_str())
        }) {
            let _ = self.pop()?;
        }
        Ok(())
    }

    /// "generate all implied end tags thoroughly"
    pub(super) fn generate_all_implied_end_tags_thoroughly(&mut self) -> Result<(), ParseError> {
        while self.current_node().is_some_and(|node| {
            node.name.ns == Namespace::Html && tags::has_implied_end_tag_thoroughly(&node.name.local)
        }) {
            let _ = self.pop()?;
        }
        Ok(())
    }

    /// [§ 13.2.4.1 Reset the insertion mode appropriately](https://html.spec.whatwg.org/multipage/parsing.html#reset-the-insertion-mode-appropriately)
    pub(super) fn reset_insertion_mode_appropriately(&mut self) {
        for index in (0..self.open_elements.len()).rev() {
            // STEP 3: "If node is the first node in the stack of open
            // elements, then set last to true, and, if the parser was created
            // as part of the HTML fragment parsing algorithm (fragment case),
            // set node to the context element passed to that algorithm."
            let last = index == 0;
            let name = match (&self.context, last) {
                (Some(context), true) => context.name.clone(),
                _ => self.open_elements[index].name.clone(),
            };

            if name.ns == Namespace::Html {
                let mode = match name.local.as_str() {
                    // STEP 4: select
                    "select" => Some(self.select_mode_for(index, last)),
                    "td" | "th" if !last => Some(InsertionMode::InCell),
                    "tr" => Some(InsertionMode::InRow),
                    "tbody" | "thead" | "tfoot" => Some(InsertionMode::InTableBody),
                    "caption" => Some(InsertionMode::InCaption),
                    "colgroup" => Some(InsertionMode::InColumnGroup),
                    "table" => Some(InsertionMode::InTable),
                    "template" => self.template_modes.last().copied(),
                    "head" if !last => Some(InsertionMode::InHead),
                    "body" => Some(InsertionMode::InBody),
                    "frameset" => Some(InsertionMode::InFrameset),
                    "html" => Some(if self.head_element.is_none() {
                        InsertionMode::BeforeHead
                    } else {
                        InsertionMode::AfterHead
                    }),
                    _ => None,
                };
                if let Some(mode) = mode {
                    self.switch_mode(mode);
                    return;
                }
            }
            if last {
                self.switch_mode(InsertionMode::InBody);
                return;
            }
        }
        self.switch_mode(InsertionMode::InBody);
    }

    fn select_mode_for(&self, index: usize, last: bool) -> InsertionMode {
        if !last {
            for ancestor in self.open_elements[..index].iter().rev() {
                if ancestor.is_html("template") {
                    break;
                }
                if ancestor.is_html("table") {
                    return InsertionMode::InSelectInTable;
                }
            }
        }
        InsertionMode::InSelect
    }

    // ===== Active formatting elements =====

    /// [§ 13.2.4.4](https://html.spec.whatwg.org/multipage/parsing.html#push-onto-the-list-of-active-formatting-elements)
    ///
    /// "If there are already three elements in the list of active formatting
    /// elements after the last marker, if any, or anywhere in the list if
    /// there are no markers, that have the same tag name, namespace, and
    /// attributes as element, then remove the earliest such element from the
    /// list of active formatting elements."
    pub(super) fn push_active_formatting_element(&mut self, handle: S::Handle, tag: Tag) {
        let mut matching = Vec::new();
        for (index, entry) in self.active_formatting_elements.iter().enumerate().rev() {
            match entry {
                ActiveFormattingElement::Marker => break,
                ActiveFormattingElement::Element { tag: existing, .. } => {
                    if existing.name == tag.name && same_attributes(existing, &tag) {
                        matching.push(index);
                    }
                }
            }
        }
        if matching.len() >= 3 {
            if let Some(&earliest) = matching.last() {
                let _ = self.active_formatting_elements.remove(earliest);
            }
        }
        self.active_formatting_elements
            .push(ActiveFormattingElement::Element { handle, tag });
    }

    pub(super) fn push_active_formatting_marker(&mut self) {
        self.active_formatting_elements
            .push(ActiveFormattingElement::Marker);
    }

    /// [§ 13.2.4.4 Reconstruct the active formatting elements](https://html.spec.whatwg.org/multipage/parsing.html#reconstruct-the-active-formatting-elements)
    pub(super) fn reconstruct_active_formatting_elements(&mut self) -> Result<(), ParseError> {
        // STEP 1: "If there are no entries in the list of active formatting
        // elements, then there is nothing to reconstruct; stop this algorithm."
        // STEP 2: "If the last (most recently added) entry ... is a marker, or
        // if it is an element that is in the stack of open elements, then
        // there is nothing to reconstruct"
        let Some(last) = self.active_formatting_elements.last() else {
            return Ok(());
        };
        if self.is_marker_or_open(last) {
            return Ok(());
        }

        // STEP 4-6: Rewind.
        let mut index = self.active_formatting_elements.len() - 1;
        while index > 0 {
            if self.is_marker_or_open(&self.active_formatting_elements[index - 1]) {
                break;
            }
            index -= 1;
        }

        // STEP 7-10: Advance and create.
        for entry_index in index..self.active_formatting_elements.len() {
            let tag = match &self.active_formatting_elements[entry_index] {
                ActiveFormattingElement::Element { tag, .. } => tag.clone(),
                ActiveFormattingElement::Marker => continue,
            };
            let handle = self.insert_html_element(&tag)?;
            self.active_formatting_elements[entry_index] =
                ActiveFormattingElement::Element { handle, tag };
        }
        Ok(())
    }

    fn is_marker_or_open(&self, entry: &ActiveFormattingElement<S::Handle>) -> bool {
        match entry {
            ActiveFormattingElement::Marker => true,
            ActiveFormattingElement::Element { handle, .. } => self.is_on_stack(handle),
        }
    }

    /// [§ 13.2.4.4](https://html.spec.whatwg.org/multipage/parsing.html#clear-the-list-of-active-formatting-elements-up-to-the-last-marker)
    pub(super) fn clear_active_formatting_elements_to_last_marker(&mut self) {
        while let Some(entry) = self.active_formatting_elements.pop() {
            if matches!(entry, ActiveFormattingElement::Marker) {
                break;
            }
        }
    }

    pub(super) fn active_formatting_index_of(&self, handle: &S::Handle) -> Option<usize> {
        self.active_formatting_elements
            .iter()
            .position(|entry| matches!(entry, ActiveFormattingElement::Element { handle: h, .. } if h == handle))
    }

    /// The last element after the last marker with the given tag name.
    pub(super) fn active_formatting_element_named(&self, local: &str) -> Option<(usize, S::Handle)> {
        for (index, entry) in self.active_formatting_elements.iter().enumerate().rev() {
            match entry {
                ActiveFormattingElement::Marker => return None,
                ActiveFormattingElement::Element { handle, tag } if tag.name == local => {
                    return Some((index, handle.clone()));
                }
                ActiveFormattingElement::Element { .. } => {}
            }
        }
        None
    }

    // ===== Creating and inserting nodes =====

    /// [§ 13.2.6.1 Appropriate place for inserting a node](https://html.spec.whatwg.org/multipage/parsing.html#appropriate-place-for-inserting-a-node)
    ///
    /// `override_target` is an index into the stack of open elements.
    pub(super) fn appropriate_place_for_inserting_a_node(
        &mut self,
        override_target: Option<usize>,
    ) -> Result<InsertionPoint<S::Handle>, ParseError> {
        // STEP 1: "If there was an override target specified, then let target
        // be the override target. Otherwise, let target be the current node."
        let Some(target_index) = override_target.or_else(|| self.open_elements.len().checked_sub(1))
        else {
            return Ok(InsertionPoint::Append(self.sink.document()));
        };
        let target = &self.open_elements[target_index];

        // STEP 2: "If foster parenting is enabled and target is a table,
        // tbody, tfoot, thead, or tr element"
        let adjusted = if self.foster_parenting
            && target.is_html_one_of(&["table", "tbody", "tfoot", "thead", "tr"])
        {
            let last_template = self.open_elements.iter().rposition(|e| e.is_html("template"));
            let last_table = self.open_elements.iter().rposition(|e| e.is_html("table"));
            match (last_template, last_table) {
                // "If there is a last template and either there is no last
                // table, or there is one, but last template is lower (more
                // recently added) than last table in the stack of open
                // elements, then: let adjusted insertion location be inside
                // last template's template contents, after its last child"
                (Some(template), table) if table.is_none_or(|table| template > table) => {
                    let handle = self.open_elements[template].handle.clone();
                    return Ok(InsertionPoint::Append(self.sink.template_contents(&handle)?));
                }
                // "If there is no last table, then let adjusted insertion
                // location be inside the first element in the stack of open
                // elements (the html element), after its last child (if any)"
                (_, None) => InsertionPoint::Append(self.open_elements[0].handle.clone()),
                (_, Some(table)) => {
                    let table_handle = self.open_elements[table].handle.clone();
                    match self.sink.parent_of(&table_handle)? {
                        // "If last table has a parent node, then let adjusted
                        // insertion location be inside last table's parent
                        // node, immediately before last table"
                        Some(parent) => {
                            return Ok(InsertionPoint::Before {
                                parent,
                                sibling: table_handle,
                            });
                        }
                        // "Let previous element be the element immediately
                        // above last table in the stack of open elements"
                        None => InsertionPoint::Append(
                            self.open_elements[table.saturating_sub(1)].handle.clone(),
                        ),
                    }
                }
            }
        } else {
            InsertionPoint::Append(target.handle.clone())
        };

        // STEP 3: "If the adjusted insertion location is inside a template
        // element, let it instead be inside the template element's template
        // contents"
        if let InsertionPoint::Append(parent) = &adjusted {
            let is_template = self
                .stack_index_of(parent)
                .is_some_and(|i| self.open_elements[i].is_html("template"));
            if is_template {
                return Ok(InsertionPoint::Append(self.sink.template_contents(parent)?));
            }
        }
        Ok(adjusted)
    }

    pub(super) fn insert_at(
        &mut self,
        point: &InsertionPoint<S::Handle>,
        node: &S::Handle,
    ) -> Result<(), ParseError> {
        match point {
            InsertionPoint::Append(parent) => self.sink.append_child(parent, node)?,
            InsertionPoint::Before { parent, sibling } => {
                self.sink.insert_before(parent, node, sibling)?;
            }
        }
        Ok(())
    }

    /// [§ 13.2.6.1 Create an element for a token](https://html.spec.whatwg.org/multipage/parsing.html#create-an-element-for-the-token)
    pub(super) fn create_element_for_token(
        &mut self,
        name: &QualName,
        attributes: &[Attribute],
    ) -> Result<S::Handle, ParseError> {
        let checked;
        let attributes = if name.ns == Namespace::Html {
            checked = self.check_xmlns_attributes(name, attributes)?;
            checked.as_slice()
        } else {
            attributes
        };

        // "If element is a form-associated element and not a form-associated
        // custom element, the form element pointer is not null, there is no
        // template element on the stack of open elements, element is either
        // not listed or doesn't have a form attribute ... associate element
        // with the form element pointed to by the form element pointer"
        let form = match &self.form_element {
            Some(form)
                if name.ns == Namespace::Html
                    && tags::is_form_associated(&name.local)
                    && !self.stack_has_html("template")
                    && !(tags::is_listed(&name.local)
                        && attributes.iter().any(|a| a.name == "form")) =>
            {
                Some(form.clone())
            }
            _ => None,
        };
        Ok(self.sink.create_element(name, attributes, form.as_ref())?)
    }

    /// `xmlns` and `xmlns:*` attributes on HTML elements cannot be carried
    /// into an XML infoset.
    fn check_xmlns_attributes(
        &self,
        name: &QualName,
        attributes: &[Attribute],
    ) -> Result<Vec<Attribute>, ParseError> {
        let mut kept = Vec::with_capacity(attributes.len());
        for attr in attributes {
            let conflicting = attr.namespace == Namespace::None
                && (attr.name.starts_with("xmlns:")
                    || (attr.name == "xmlns" && attr.value != Namespace::Html.url()));
            if !conflicting {
                kept.push(attr.clone());
                continue;
            }
            let message = format!(
                "Attribute “{}” on element “{}” is not serializable as XML 1.0.",
                attr.name, name.local
            );
            match self.options.xml_violation_policy {
                XmlViolationPolicy::Allow => {
                    self.warning(message);
                    kept.push(attr.clone());
                }
                XmlViolationPolicy::AlterInfoset => {
                    self.warning(format!("{message} Dropping it."));
                }
                XmlViolationPolicy::Fatal => {
                    self.reporter
                        .fatal(Stage::TreeBuilder, message.clone(), self.position);
                    return Err(ParseError::XmlViolation(message));
                }
            }
        }
        Ok(kept)
    }

    /// [§ 13.2.6.1 Insert a foreign element](https://html.spec.whatwg.org/multipage/parsing.html#insert-a-foreign-element)
    pub(super) fn insert_foreign_element(
        &mut self,
        tag: &Tag,
        ns: Namespace,
        only_add_to_element_stack: bool,
    ) -> Result<S::Handle, ParseError> {
        // STEP 1: "Let the adjusted insertion location be the appropriate
        // place for inserting a node."
        let point = self.appropriate_place_for_inserting_a_node(None)?;
        // STEP 2: "Let element be the result of creating an element for the
        // token in the given namespace"
        let name = QualName::new(ns, tag.name.clone());
        let handle = self.create_element_for_token(&name, &tag.attributes)?;
        // STEP 3: "If onlyAddToElementStack is false, then run insert an
        // element at the adjusted insertion location with element."
        if !only_add_to_element_stack {
            self.insert_at(&point, &handle)?;
        }
        // STEP 4: "Push element onto the stack of open elements so that it is
        // the new current node."
        let annotation_integration_point = ns == Namespace::MathMl
            && tag.name == "annotation-xml"
            && tag.attribute("encoding").is_some_and(|encoding| {
                encoding.eq_ignore_ascii_case("text/html")
                    || encoding.eq_ignore_ascii_case("application/xhtml+xml")
            });
        self.open_elements.push(OpenElement {
            handle: handle.clone(),
            name,
            annotation_integration_point,
        });
        Ok(handle)
    }

    /// "When the steps below require the user agent to insert an HTML element
    /// for a token, the user agent must insert a foreign element for the
    /// token, with the HTML namespace and false."
    pub(super) fn insert_html_element(&mut self, tag: &Tag) -> Result<S::Handle, ParseError> {
        self.insert_foreign_element(tag, Namespace::Html, false)
    }

    /// Insert an HTML element that is immediately popped again (void
    /// elements), acknowledging the self-closing flag.
    pub(super) fn insert_void_html_element(&mut self, tag: &Tag) -> Result<S::Handle, ParseError> {
        let handle = self.insert_html_element(tag)?;
        let _ = self.pop()?;
        self.self_closing_acknowledged = true;
        Ok(handle)
    }

    /// [§ 13.2.6.1 Insert a character](https://html.spec.whatwg.org/multipage/parsing.html#insert-a-character)
    pub(super) fn insert_character(&mut self, text: &str) -> Result<(), ParseError> {
        if text.is_empty() {
            return Ok(());
        }
        // "If the adjusted insertion location is in a Document node, then
        // ignore the token."
        match self.appropriate_place_for_inserting_a_node(None)? {
            InsertionPoint::Append(parent) => {
                if parent == self.sink.document() {
                    return Ok(());
                }
                self.sink.append_text(&parent, text)?;
            }
            InsertionPoint::Before { parent, sibling } => {
                self.sink.insert_text_before(&parent, &sibling, text)?;
            }
        }
        Ok(())
    }

    /// [§ 13.2.6.1 Insert a comment](https://html.spec.whatwg.org/multipage/parsing.html#insert-a-comment)
    pub(super) fn insert_comment(&mut self, data: &str) -> Result<(), ParseError> {
        let point = self.appropriate_place_for_inserting_a_node(None)?;
        self.insert_comment_at(data, &point)
    }

    pub(super) fn insert_comment_at(
        &mut self,
        data: &str,
        point: &InsertionPoint<S::Handle>,
    ) -> Result<(), ParseError> {
        if self.options.ignore_comments {
            return Ok(());
        }
        let comment = self.sink.create_comment(data)?;
        self.insert_at(point, &comment)
    }

    /// Insert a comment as the last child of the document.
    pub(super) fn insert_comment_in_document(&mut self, data: &str) -> Result<(), ParseError> {
        let document = self.sink.document();
        self.insert_comment_at(data, &InsertionPoint::Append(document))
    }

    /// Insert a comment as the last child of the `html` element.
    pub(super) fn insert_comment_in_html_element(&mut self, data: &str) -> Result<(), ParseError> {
        let Some(html) = self.open_elements.first().map(|e| e.handle.clone()) else {
            return self.insert_comment_in_document(data);
        };
        self.insert_comment_at(data, &InsertionPoint::Append(html))
    }

    /// [§ 13.2.6.4.8](https://html.spec.whatwg.org/multipage/parsing.html#generic-rcdata-element-parsing-algorithm)
    ///
    /// The generic raw text and RCDATA element parsing algorithms.
    pub(super) fn parse_text_element(
        &mut self,
        tag: &Tag,
        state: TokenizerState,
    ) -> Result<(), ParseError> {
        // STEP 1: "Insert an HTML element for the token."
        let _ = self.insert_html_element(tag)?;
        // STEP 2: "switch the tokenizer to the RAWTEXT state" / "RCDATA state"
        self.switch_tokenizer(state);
        // STEP 3: "Let the original insertion mode be the current insertion
        // mode."
        self.original_mode = self.mode;
        // STEP 4: "Then, switch the insertion mode to "text"."
        self.switch_mode(InsertionMode::Text);
        Ok(())
    }

    /// "stop parsing": pop everything still open.
    pub(super) fn stop_parsing(&mut self) -> Result<(), ParseError> {
        debug!(
            "stopping with {} open elements in {}",
            self.open_elements.len(),
            self.mode
        );
        while self.pop()?.is_some() {}
        Ok(())
    }

    // ===== Dispatch =====

    /// [§ 13.2.6 Tree construction dispatcher](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction-dispatcher)
    pub(super) fn dispatch(&mut self, token: &TreeToken) -> Result<(), ParseError> {
        if self.use_html_rules_for(token) {
            self.process_using_the_rules_for(self.mode, token)
        } else {
            self.process_in_foreign_content(token)
        }
    }

    fn use_html_rules_for(&self, token: &TreeToken) -> bool {
        // "If the stack of open elements is empty"
        let Some((name, annotation)) = self.adjusted_current_node() else {
            return true;
        };
        let is_character = matches!(
            token,
            TreeToken::Characters(_) | TreeToken::Whitespace(_) | TreeToken::Null
        );
        // "If the adjusted current node is an element in the HTML namespace"
        if name.ns == Namespace::Html {
            return true;
        }
        // "If the adjusted current node is a MathML text integration point and
        // the token is a start tag whose tag name is neither "mglyph" nor
        // "malignmark"" or "a character token"
        if tags::is_mathml_text_integration_point(name) {
            match token {
                TreeToken::StartTag(tag) if tag.name != "mglyph" && tag.name != "malignmark" => {
                    return true;
                }
                _ if is_character => return true,
                _ => {}
            }
        }
        // "If the adjusted current node is a MathML annotation-xml element and
        // the token is a start tag whose tag name is "svg""
        if name.ns == Namespace::MathMl && name.local == "annotation-xml" && token.is_start_tag("svg")
        {
            return true;
        }
        // "If the adjusted current node is an HTML integration point and the
        // token is a start tag" or "a character token"
        if is_html_integration_point(name, annotation)
            && (matches!(token, TreeToken::StartTag(_)) || is_character)
        {
            return true;
        }
        // "If the token is an end-of-file token"
        matches!(token, TreeToken::Eof)
    }

    /// "process the token using the rules for the m insertion mode"
    pub(super) fn process_using_the_rules_for(
        &mut self,
        mode: InsertionMode,
        token: &TreeToken,
    ) -> Result<(), ParseError> {
        match mode {
            InsertionMode::Initial => self.handle_initial_mode(token),
            InsertionMode::BeforeHtml => self.handle_before_html_mode(token),
            InsertionMode::BeforeHead => self.handle_before_head_mode(token),
            InsertionMode::InHead => self.handle_in_head_mode(token),
            InsertionMode::InHeadNoscript => self.handle_in_head_noscript_mode(token),
            InsertionMode::AfterHead => self.handle_after_head_mode(token),
            InsertionMode::InBody => self.handle_in_body_mode(token),
            InsertionMode::Text => self.handle_text_mode(token),
            InsertionMode::InTable => self.handle_in_table_mode(token),
            InsertionMode::InTableText => self.handle_in_table_text_mode(token),
            InsertionMode::InCaption => self.handle_in_caption_mode(token),
            InsertionMode::InColumnGroup => self.handle_in_column_group_mode(token),
            InsertionMode::InTableBody => self.handle_in_table_body_mode(token),
            InsertionMode::InRow => self.handle_in_row_mode(token),
            InsertionMode::InCell => self.handle_in_cell_mode(token),
            InsertionMode::InSelect => self.handle_in_select_mode(token),
            InsertionMode::InSelectInTable => self.handle_in_select_in_table_mode(token),
            InsertionMode::InTemplate => self.handle_in_template_mode(token),
            InsertionMode::AfterBody => self.handle_after_body_mode(token),
            InsertionMode::InFrameset => self.handle_in_frameset_mode(token),
            InsertionMode::AfterFrameset => self.handle_after_frameset_mode(token),
            InsertionMode::AfterAfterBody => self.handle_after_after_body_mode(token),
            InsertionMode::AfterAfterFrameset => self.handle_after_after_frameset_mode(token),
        }
    }

    /// "Reprocess the token" in the current insertion mode.
    pub(super) fn reprocess_token(&mut self, token: &TreeToken) -> Result<(), ParseError> {
        self.process_using_the_rules_for(self.mode, token)
    }
}

fn same_attributes(a: &Tag, b: &Tag) -> bool {
    a.attributes.len() == b.attributes.len()
        && a.attributes.iter().all(|attr| {
            b.attributes
                .iter()
                .any(|other| other.name == attr.name && other.value == attr.value)
        })
}

impl<S: TreeSink> TokenSink for TreeBuilder<S> {
    fn process_token(
        &mut self,
        token: Token,
        position: Position,
    ) -> Result<TokenSinkResult, ParseError> {
        self.position = position;
        let ignore_lf = mem::take(&mut self.ignore_lf);
        match token {
            Token::Characters(text) => {
                // "If the next token is a U+000A LINE FEED (LF) character
                // token, then ignore that token and move on to the next one."
                let text = match text.strip_prefix('\n') {
                    Some(rest) if ignore_lf => rest,
                    _ => text.as_str(),
                };
                for run in split_character_run(text) {
                    self.dispatch(&run)?;
                }
            }
            Token::StartTag(tag) => {
                let self_closing = tag.self_closing;
                let name = tag.name.clone();
                self.self_closing_acknowledged = false;
                self.dispatch(&TreeToken::StartTag(tag))?;
                if self_closing && !self.self_closing_acknowledged {
                    self.parse_error(format!(
                        "Self-closing syntax (“/>”) used on a non-void HTML element “{name}”. Ignoring the slash."
                    ));
                }
            }
            Token::EndTag(tag) => self.dispatch(&TreeToken::EndTag(tag))?,
            Token::Comment(data) => self.dispatch(&TreeToken::Comment(data))?,
            Token::Doctype(doctype) => self.dispatch(&TreeToken::Doctype(doctype))?,
            Token::EndOfFile => self.dispatch(&TreeToken::Eof)?,
        }
        Ok(self.take_sink_result())
    }

    fn adjusted_current_node_is_foreign(&self) -> bool {
        self.adjusted_current_node()
            .is_some_and(|(name, _)| name.ns != Namespace::Html)
    }

    fn end(&mut self) -> Result<(), ParseError> {
        self.sink.end()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_character_run() {
        let tokens = split_character_run("  ab\0c \n");
        assert_eq!(
            tokens,
            vec![
                TreeToken::Whitespace("  ".to_string()),
                TreeToken::Characters("ab".to_string()),
                TreeToken::Null,
                TreeToken::Characters("c".to_string()),
                TreeToken::Whitespace(" \n".to_string()),
            ]
        );
    }

    #[test]
    fn test_split_consecutive_nulls() {
        let tokens = split_character_run("\0\0");
        assert_eq!(tokens, vec![TreeToken::Null, TreeToken::Null]);
    }

    #[test]
    fn test_fragment_tokenizer_states() {
        let state = |local: &str, scripting: bool| {
            FragmentContext::new(QualName::html(local)).tokenizer_state(scripting)
        };
        assert_eq!(state("title", false), TokenizerState::RCDATA);
        assert_eq!(state("xmp", false), TokenizerState::RAWTEXT);
        assert_eq!(state("noscript", false), TokenizerState::Data);
        assert_eq!(state("noscript", true), TokenizerState::RAWTEXT);
        assert_eq!(state("script", false), TokenizerState::ScriptData);
        assert_eq!(state("plaintext", false), TokenizerState::PLAINTEXT);
        assert_eq!(state("tr", false), TokenizerState::Data);
    }
}

//! The step API: suspension, chunked sources, and properties that must hold
//! for any input.

use std::io::Read;

use quickcheck_macros::quickcheck;
use weft_common::{DiagnosticLog, Position, Severity};
use weft_dom::{DomTree, NodeId, dump, parse_document};
use weft_html::{
    Attribute, DocumentMode, Driver, ParseError, ParserOptions, QualName, SinkError, SinkResult,
    Step, TreeSink, XmlViolationPolicy,
};

/// A source that hands out its bytes a few at a time.
struct Trickle<'a> {
    bytes: &'a [u8],
    sizes: Vec<usize>,
    turn: usize,
}

impl<'a> Trickle<'a> {
    fn new(bytes: &'a [u8], sizes: &[u8]) -> Self {
        let sizes = sizes.iter().map(|&s| usize::from(s % 13) + 1).collect();
        Self {
            bytes,
            sizes,
            turn: 0,
        }
    }
}

impl Read for Trickle<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let size = if self.sizes.is_empty() {
            5
        } else {
            self.sizes[self.turn % self.sizes.len()]
        };
        self.turn += 1;
        let n = size.min(buf.len()).min(self.bytes.len());
        buf[..n].copy_from_slice(&self.bytes[..n]);
        self.bytes = &self.bytes[n..];
        Ok(n)
    }
}

const PIECES: &[&str] = &[
    "<!DOCTYPE html>",
    "<p>",
    "</p>",
    "<b>",
    "</b>",
    "<i>",
    "<a href=x>",
    "</a>",
    "<div>",
    "</div>",
    "<table>",
    "<tr>",
    "<td>",
    "</table>",
    "<li>",
    "<select><option>o",
    "<svg><g>",
    "</svg>",
    "<math><mi>",
    "<template>",
    "</template>",
    "<script>if (a < b) {}</script>",
    "<textarea>\nx",
    "<!-- c -->",
    "text",
    " ",
    "\r\n",
    "\r",
    "&amp;",
    "&notin",
    "&#x110000;",
    "\u{e9}",
    "\u{1F600}",
    "\0",
    "<frameset>",
];

/// Build a document from indexes into [`PIECES`].
fn document(picks: &[u8]) -> String {
    picks
        .iter()
        .map(|&i| PIECES[usize::from(i) % PIECES.len()])
        .collect()
}

/// A comment long enough to fill the sniffing window, so that what follows
/// arrives in separate reads.
fn padding() -> String {
    format!("<!--{}-->", "x".repeat(600))
}

fn trickle_parse(bytes: &[u8], sizes: &[u8]) -> (DomTree, DiagnosticLog) {
    let log = DiagnosticLog::new();
    let mut driver =
        Driver::new(DomTree::new(), ParserOptions::default()).with_diagnostics(log.boxed());
    driver.feed(Trickle::new(bytes, sizes)).unwrap();
    driver.run().unwrap();
    (driver.finish().unwrap(), log)
}

/// Diagnostics ordered by where they point. Decoder errors are reported as
/// each read is decoded, so their order relative to tokenizer errors follows
/// the read sizes.
fn by_position(log: &DiagnosticLog) -> Vec<(Position, String)> {
    let mut entries: Vec<_> = log
        .entries()
        .into_iter()
        .map(|d| (d.position, d.message))
        .collect();
    entries.sort();
    entries
}

#[test]
fn test_suspends_after_each_closed_paragraph() {
    let mut driver = Driver::new(DomTree::suspending_after("p"), ParserOptions::default());
    driver
        .feed(&b"<!DOCTYPE html><p>a</p><p>b</p><div>c</div>"[..])
        .unwrap();

    assert_eq!(driver.step().unwrap(), Step::Suspended);
    let tree = driver.sink().unwrap();
    assert_eq!(tree.text_content(tree.body().unwrap()), "a");

    assert_eq!(driver.step().unwrap(), Step::Suspended);
    let tree = driver.sink().unwrap();
    assert_eq!(tree.text_content(tree.body().unwrap()), "ab");

    assert_eq!(driver.step().unwrap(), Step::Done);
    assert_eq!(driver.step().unwrap(), Step::Done);

    let tree = driver.finish().unwrap();
    assert_eq!(tree.text_content(tree.body().unwrap()), "abc");
}

#[test]
fn test_feeding_twice_is_a_protocol_error() {
    let mut driver = Driver::new(DomTree::new(), ParserOptions::default());
    driver.feed(&b"<p>"[..]).unwrap();
    assert!(matches!(driver.feed(&b"<p>"[..]), Err(ParseError::Protocol(_))));
}

#[test]
fn test_step_before_feed_is_a_protocol_error() {
    let mut driver: Driver<DomTree, &[u8]> = Driver::new(DomTree::new(), ParserOptions::default());
    assert!(matches!(driver.step(), Err(ParseError::Protocol(_))));
}

#[test]
fn test_fatal_xml_policy_stops_on_double_hyphen_comment() {
    let options = ParserOptions {
        xml_violation_policy: XmlViolationPolicy::Fatal,
        ..ParserOptions::default()
    };
    let result = parse_document(b"<!DOCTYPE html><!-- a--b --><p>x", options);
    assert!(matches!(result, Err(ParseError::XmlViolation(_))));
}

#[test]
fn test_alter_infoset_rewrites_comments() {
    let options = ParserOptions {
        xml_violation_policy: XmlViolationPolicy::AlterInfoset,
        ..ParserOptions::default()
    };
    let parsed = parse_document(b"<!DOCTYPE html><!--a--b-->", options).unwrap();
    assert!(parsed.dump().contains("| <!-- a- -b -->"));
}

#[test]
fn test_crlf_split_across_reads() {
    let html = format!("<!DOCTYPE html>{}<pre>\r\na\r\nb</pre>", padding());
    let bytes = html.as_bytes();
    let (whole, _) = trickle_parse(bytes, &[12]);
    for split in 0..6 {
        let (chunked, _) = trickle_parse(bytes, &[split]);
        assert_eq!(dump(&chunked), dump(&whole));
    }
    let body = whole.body().unwrap();
    assert_eq!(whole.text_content(body), "a\nb");
}

#[test]
fn test_character_run_split_across_reads_reports_once() {
    let html = format!("<!DOCTYPE html>{}<table><math><mi>text", padding());
    let bytes = html.as_bytes();
    let misplaced = |log: &DiagnosticLog| {
        log.messages(Severity::Error)
            .iter()
            .filter(|m| m.contains("Misplaced non-space characters inside a table."))
            .count()
    };

    let whole = parse_document(bytes, ParserOptions::default()).unwrap();
    let (chunked, log) = trickle_parse(bytes, &[4]);

    assert_eq!(dump(&chunked), whole.dump());
    assert_eq!(misplaced(&whole.diagnostics), 1);
    assert_eq!(misplaced(&log), 1);
    assert_eq!(by_position(&log), by_position(&whole.diagnostics));
}

/// A tree that will not take a `<p>` element.
struct RefusingParagraphs(DomTree);

impl RefusingParagraphs {
    fn refuse(&self, node: NodeId) -> SinkResult<()> {
        match self.0.as_element(node) {
            Some(element) if element.name.is_html("p") => Err(SinkError::new("refused")),
            _ => Ok(()),
        }
    }
}

impl TreeSink for RefusingParagraphs {
    type Handle = NodeId;

    fn document(&self) -> NodeId {
        TreeSink::document(&self.0)
    }

    fn reset(&mut self) -> SinkResult<()> {
        TreeSink::reset(&mut self.0)
    }

    fn create_element(
        &mut self,
        name: &QualName,
        attributes: &[Attribute],
        form: Option<&NodeId>,
    ) -> SinkResult<NodeId> {
        TreeSink::create_element(&mut self.0, name, attributes, form)
    }

    fn create_text(&mut self, text: &str) -> SinkResult<NodeId> {
        TreeSink::create_text(&mut self.0, text)
    }

    fn create_comment(&mut self, text: &str) -> SinkResult<NodeId> {
        TreeSink::create_comment(&mut self.0, text)
    }

    fn append_doctype(&mut self, name: &str, public_id: &str, system_id: &str) -> SinkResult<()> {
        TreeSink::append_doctype(&mut self.0, name, public_id, system_id)
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> SinkResult<()> {
        self.refuse(*child)?;
        TreeSink::append_child(&mut self.0, parent, child)
    }

    fn insert_before(&mut self, parent: &NodeId, child: &NodeId, sibling: &NodeId) -> SinkResult<()> {
        self.refuse(*child)?;
        TreeSink::insert_before(&mut self.0, parent, child, sibling)
    }

    fn detach(&mut self, node: &NodeId) -> SinkResult<()> {
        TreeSink::detach(&mut self.0, node)
    }

    fn move_all_children(&mut self, from: &NodeId, to: &NodeId) -> SinkResult<()> {
        TreeSink::move_all_children(&mut self.0, from, to)
    }

    fn has_children(&self, node: &NodeId) -> SinkResult<bool> {
        TreeSink::has_children(&self.0, node)
    }

    fn parent_of(&self, node: &NodeId) -> SinkResult<Option<NodeId>> {
        TreeSink::parent_of(&self.0, node)
    }

    fn shallow_clone(&mut self, node: &NodeId) -> SinkResult<NodeId> {
        TreeSink::shallow_clone(&mut self.0, node)
    }

    fn set_document_mode(
        &mut self,
        mode: DocumentMode,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> SinkResult<()> {
        TreeSink::set_document_mode(&mut self.0, mode, public_id, system_id)
    }

    fn add_attrs_if_missing(&mut self, element: &NodeId, attributes: &[Attribute]) -> SinkResult<()> {
        TreeSink::add_attrs_if_missing(&mut self.0, element, attributes)
    }

    fn template_contents(&mut self, template: &NodeId) -> SinkResult<NodeId> {
        TreeSink::template_contents(&mut self.0, template)
    }
}

#[test]
fn test_sink_error_aborts_and_keeps_diagnostics() {
    let log = DiagnosticLog::new();
    let mut driver = Driver::new(RefusingParagraphs(DomTree::new()), ParserOptions::default())
        .with_diagnostics(log.boxed());
    driver.feed(&b"<p>x</p><div>y</div>"[..]).unwrap();

    match driver.run() {
        Err(ParseError::Sink(error)) => assert_eq!(error.message, "refused"),
        other => panic!("expected a sink error, got {other:?}"),
    }
    // The missing doctype was reported before the sink gave up.
    assert!(log.contains("Non-space characters found without seeing a doctype first."));
    // Nothing after the refused element made it into the tree.
    let tree = &driver.sink().unwrap().0;
    assert_eq!(tree.text_content(NodeId::ROOT), "");
}

#[quickcheck]
fn prop_any_bytes_parse(bytes: Vec<u8>) -> bool {
    parse_document(&bytes, ParserOptions::default()).is_ok()
}

#[quickcheck]
fn prop_parsing_is_deterministic(picks: Vec<u8>) -> bool {
    let html = document(&picks);
    let first = parse_document(html.as_bytes(), ParserOptions::default()).unwrap();
    let second = parse_document(html.as_bytes(), ParserOptions::default()).unwrap();
    first.dump() == second.dump() && first.diagnostics.entries() == second.diagnostics.entries()
}

#[quickcheck]
fn prop_chunking_does_not_change_the_tree(picks: Vec<u8>, sizes: Vec<u8>) -> bool {
    let html = padding() + &document(&picks);
    let whole = parse_document(html.as_bytes(), ParserOptions::default()).unwrap();
    let (chunked, diagnostics) = trickle_parse(html.as_bytes(), &sizes);
    whole.dump() == dump(&chunked) && by_position(&whole.diagnostics) == by_position(&diagnostics)
}

#[quickcheck]
fn prop_suspension_does_not_change_the_tree(picks: Vec<u8>) -> bool {
    let html = document(&picks);
    let whole = parse_document(html.as_bytes(), ParserOptions::default()).unwrap();

    let mut driver = Driver::new(DomTree::suspending_after("p"), ParserOptions::default());
    driver.feed(html.as_bytes()).unwrap();
    while driver.step().unwrap() == Step::Suspended {}
    whole.dump() == dump(&driver.finish().unwrap())
}

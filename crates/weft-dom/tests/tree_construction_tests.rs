//! End-to-end tree construction, checked against html5lib-format dumps.

use weft_common::{Severity, Stage};
use weft_dom::{NodeId, Parsed, parse_document, parse_fragment};
use weft_html::{DocumentMode, ParserOptions};

fn parse(html: &str) -> Parsed {
    parse_document(html.as_bytes(), ParserOptions::default()).unwrap()
}

/// Build the expected dump from one string per line.
fn lines(expected: &[&str]) -> String {
    expected.join("\n")
}

fn tree_errors(parsed: &Parsed) -> Vec<String> {
    parsed
        .diagnostics
        .entries()
        .into_iter()
        .filter(|d| d.severity == Severity::Error && d.stage != Stage::Encoding)
        .map(|d| d.message)
        .collect()
}

#[test]
fn test_misnested_formatting_is_reconstructed() {
    let parsed = parse("<!DOCTYPE html><p>A<b>B<i>C</p>D");
    assert_eq!(
        parsed.dump(),
        lines(&[
            "| <!DOCTYPE html>",
            "| <html>",
            "|   <head>",
            "|   <body>",
            "|     <p>",
            "|       \"A\"",
            "|       <b>",
            "|         \"B\"",
            "|         <i>",
            "|           \"C\"",
            "|     <b>",
            "|       <i>",
            "|         \"D\"",
        ])
    );
    assert_eq!(parsed.tree.document_mode(), DocumentMode::Standards);
    let errors = tree_errors(&parsed);
    // The misnested </p>, then <b> and <i> still open at end of file.
    assert_eq!(errors.len(), 2, "{errors:?}");
    assert!(errors[0].contains("“p”"));
    assert!(errors[1].contains("End of file"));
}

#[test]
fn test_missing_doctype_is_quirks() {
    let parsed = parse("<p>x");
    assert_eq!(parsed.tree.document_mode(), DocumentMode::Quirks);
    assert!(parsed.diagnostics.contains("without seeing a doctype"));
}

#[test]
fn test_legacy_doctype_is_limited_quirks() {
    let parsed = parse(
        "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Transitional//EN\" \"http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd\"><p>x",
    );
    assert_eq!(parsed.tree.document_mode(), DocumentMode::LimitedQuirks);
}

#[test]
fn test_adoption_agency_moves_block_out_of_formatting() {
    let parsed = parse("<!DOCTYPE html><b>1<p>2</b>3</p>");
    assert_eq!(
        parsed.dump(),
        lines(&[
            "| <!DOCTYPE html>",
            "| <html>",
            "|   <head>",
            "|   <body>",
            "|     <b>",
            "|       \"1\"",
            "|     <p>",
            "|       <b>",
            "|         \"2\"",
            "|       \"3\"",
        ])
    );
}

#[test]
fn test_noahs_ark_keeps_three_identical_entries() {
    let parsed = parse("<!DOCTYPE html><p><b><b><b><b>x</p>y");
    assert_eq!(
        parsed.dump(),
        lines(&[
            "| <!DOCTYPE html>",
            "| <html>",
            "|   <head>",
            "|   <body>",
            "|     <p>",
            "|       <b>",
            "|         <b>",
            "|           <b>",
            "|             <b>",
            "|               \"x\"",
            "|     <b>",
            "|       <b>",
            "|         <b>",
            "|           \"y\"",
        ])
    );
}

#[test]
fn test_adoption_agency_on_deep_nesting_terminates() {
    let mut html = String::from("<!DOCTYPE html><b>");
    for _ in 0..50 {
        html.push_str("<div>");
    }
    html.push_str("x</b>y");
    let first = parse(&html);
    let second = parse(&html);

    assert_eq!(first.dump(), second.dump());
    let body = first.tree.body().unwrap();
    assert_eq!(first.tree.text_content(body), "xy");
}

#[test]
fn test_text_is_foster_parented_out_of_tables() {
    let parsed = parse("<!DOCTYPE html><table>a<tr><td>b</td></tr></table>");
    assert_eq!(
        parsed.dump(),
        lines(&[
            "| <!DOCTYPE html>",
            "| <html>",
            "|   <head>",
            "|   <body>",
            "|     \"a\"",
            "|     <table>",
            "|       <tbody>",
            "|         <tr>",
            "|           <td>",
            "|             \"b\"",
        ])
    );
}

#[test]
fn test_svg_names_are_case_adjusted() {
    let parsed = parse(
        "<!DOCTYPE html><svg viewbox=\"0 0 1 1\"><foreignobject><p>x</p></foreignobject></svg>",
    );
    assert_eq!(
        parsed.dump(),
        lines(&[
            "| <!DOCTYPE html>",
            "| <html>",
            "|   <head>",
            "|   <body>",
            "|     <svg svg>",
            "|       viewBox=\"0 0 1 1\"",
            "|       <svg foreignObject>",
            "|         <p>",
            "|           \"x\"",
        ])
    );
}

#[test]
fn test_html_breaks_out_of_svg() {
    let parsed = parse("<!DOCTYPE html><svg><g><p>x");
    assert_eq!(
        parsed.dump(),
        lines(&[
            "| <!DOCTYPE html>",
            "| <html>",
            "|   <head>",
            "|   <body>",
            "|     <svg svg>",
            "|       <svg g>",
            "|     <p>",
            "|       \"x\"",
        ])
    );
}

#[test]
fn test_xlink_attributes_are_namespaced() {
    let parsed = parse("<!DOCTYPE html><svg><use xlink:href=\"#a\"/></svg>");
    assert!(parsed.dump().contains("|         xlink href=\"#a\""));
}

#[test]
fn test_template_children_go_to_contents() {
    let parsed = parse("<!DOCTYPE html><template><td>x</td></template>");
    assert_eq!(
        parsed.dump(),
        lines(&[
            "| <!DOCTYPE html>",
            "| <html>",
            "|   <head>",
            "|     <template>",
            "|       content",
            "|         <td>",
            "|           \"x\"",
            "|   <body>",
        ])
    );
}

#[test]
fn test_comments_and_character_references() {
    let parsed = parse("<!DOCTYPE html><!-- c --><p title=\"a&amp;b\">&lt;&#x41;&notin;");
    assert_eq!(
        parsed.dump(),
        lines(&[
            "| <!DOCTYPE html>",
            "| <!--  c  -->",
            "| <html>",
            "|   <head>",
            "|   <body>",
            "|     <p>",
            "|       title=\"a&b\"",
            "|       \"<A\u{2209}\"",
        ])
    );
}

#[test]
fn test_ignore_comments_option() {
    let options = ParserOptions {
        ignore_comments: true,
        ..ParserOptions::default()
    };
    let parsed = parse_document(b"<!DOCTYPE html><!-- gone --><p>x", options).unwrap();
    assert!(!parsed.dump().contains("gone"));
}

#[test]
fn test_noscript_follows_scripting_flag() {
    let html = "<!DOCTYPE html><head><noscript><p>x</p></noscript>";
    let off = parse(html);
    let on = parse_document(
        html.as_bytes(),
        ParserOptions {
            scripting_enabled: true,
            ..ParserOptions::default()
        },
    )
    .unwrap();

    // Without scripting the <p> is bad content in head and closes noscript.
    assert!(off.dump().contains("|     <p>"));
    assert!(on.dump().contains("|       \"<p>x</p>\""));
}

#[test]
fn test_fragment_in_table_row_context() {
    let parsed = parse_fragment(b"<td>x</td>", "tr", ParserOptions::default()).unwrap();
    assert_eq!(parsed.dump_fragment(), lines(&["| <td>", "|   \"x\""]));
}

#[test]
fn test_fragment_in_title_context_is_rcdata() {
    let parsed = parse_fragment(b"<b>&amp;</b>", "title", ParserOptions::default()).unwrap();
    assert_eq!(parsed.dump_fragment(), "| \"<b>&</b>\"");
}

#[test]
fn test_stray_end_tags_report_errors() {
    let parsed = parse("<!DOCTYPE html></span><p>x</p>");
    assert!(
        tree_errors(&parsed)
            .iter()
            .any(|m| m.contains("Stray end tag “span”"))
    );
    let body = parsed.tree.body().unwrap();
    assert_eq!(parsed.tree.text_content(body), "x");
}

fn form_owner(parsed: &Parsed, root: NodeId, local: &str) -> Option<NodeId> {
    let id = parsed.tree.find_element(root, local).unwrap();
    parsed.tree.as_element(id).unwrap().form_owner
}

#[test]
fn test_input_is_associated_with_the_open_form() {
    let parsed = parse("<!DOCTYPE html><form><input><img></form><input>");
    let form = parsed.tree.find_element(NodeId::ROOT, "form");
    assert!(form.is_some());
    assert_eq!(form_owner(&parsed, NodeId::ROOT, "input"), form);
    assert_eq!(form_owner(&parsed, NodeId::ROOT, "img"), form);

    // After </form> the pointer is cleared.
    let body = parsed.tree.body().unwrap();
    let last = *parsed.tree.children(body).last().unwrap();
    assert_eq!(parsed.tree.as_element(last).unwrap().form_owner, None);
}

#[test]
fn test_input_in_template_is_not_associated() {
    let parsed = parse("<!DOCTYPE html><form><template><input></template></form>");
    let template = parsed.tree.find_element(NodeId::ROOT, "template").unwrap();
    let contents = parsed
        .tree
        .as_element(template)
        .unwrap()
        .template_contents
        .unwrap();
    assert_eq!(form_owner(&parsed, contents, "input"), None);
}

#[test]
fn test_form_attribute_opts_listed_elements_out() {
    let parsed = parse("<!DOCTYPE html><form><input form=\"other\"><img form=\"other\">");
    let form = parsed.tree.find_element(NodeId::ROOT, "form");
    assert_eq!(form_owner(&parsed, NodeId::ROOT, "input"), None);
    // img is not a listed element, so its form attribute does not matter.
    assert_eq!(form_owner(&parsed, NodeId::ROOT, "img"), form);
}

#[test]
fn test_input_in_table_cell_uses_enclosing_form() {
    let parsed = parse("<!DOCTYPE html><form><table><tr><td><input></td></tr></table></form>");
    let form = parsed.tree.find_element(NodeId::ROOT, "form");
    let cell = parsed.tree.find_element(NodeId::ROOT, "td").unwrap();
    assert!(form.is_some());
    assert_eq!(form_owner(&parsed, cell, "input"), form);
}

//! Integration tests for the HTML tokenizer.

use quickcheck_macros::quickcheck;
use weft_common::{DiagnosticLog, Position, Reporter, Severity};
use weft_html::tokenizer::{TokenSinkResult, TokenizerOptions, TokenizerResult};
use weft_html::{
    DecodeBuffer, ParseError, Token, TokenSink, Tokenizer, TokenizerState, XmlViolationPolicy,
};

/// Records tokens, joining character runs split across feeds.
#[derive(Default)]
struct Recorder {
    tokens: Vec<Token>,
}

impl TokenSink for Recorder {
    fn process_token(
        &mut self,
        token: Token,
        _position: Position,
    ) -> Result<TokenSinkResult, ParseError> {
        match (self.tokens.last_mut(), token) {
            (Some(Token::Characters(run)), Token::Characters(more)) => run.push_str(&more),
            (_, token) => self.tokens.push(token),
        }
        Ok(TokenSinkResult::Continue)
    }
}

/// Tokenize `chunks` fed one after another, recording diagnostics in `log`.
fn tokenize_chunks(chunks: &[&str], options: TokenizerOptions, log: &DiagnosticLog) -> Vec<Token> {
    let mut tokenizer = Tokenizer::new(Recorder::default(), options, Reporter::new(log.boxed()));
    let mut buffer = DecodeBuffer::new();
    for chunk in chunks {
        buffer.refill(chunk);
        assert_eq!(tokenizer.feed(&mut buffer).unwrap(), TokenizerResult::Done);
    }
    assert_eq!(tokenizer.eof().unwrap(), TokenizerResult::Done);
    tokenizer.into_sink().tokens
}

/// Helper to tokenize a string and return the tokens
fn tokenize(input: &str) -> Vec<Token> {
    tokenize_chunks(&[input], TokenizerOptions::default(), &DiagnosticLog::new())
}

fn characters(tokens: &[Token]) -> String {
    tokens
        .iter()
        .filter_map(|t| match t {
            Token::Characters(run) => Some(run.as_str()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_plain_text() {
    let tokens = tokenize("Hello");
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0], Token::Characters("Hello".to_string()));
    assert_eq!(tokens[1], Token::EndOfFile);
}

#[test]
fn test_doctype() {
    let tokens = tokenize("<!DOCTYPE html>");
    assert_eq!(tokens.len(), 2);
    match &tokens[0] {
        Token::Doctype(doctype) => {
            assert_eq!(doctype.name.as_deref(), Some("html"));
            assert_eq!(doctype.public_id, None);
            assert!(!doctype.force_quirks);
        }
        other => panic!("Expected DOCTYPE token, got {other:?}"),
    }
}

#[test]
fn test_doctype_identifiers() {
    let tokens = tokenize(r#"<!DOCTYPE html PUBLIC "-//W3C//DTD HTML 4.01//EN" 'x.dtd'>"#);
    match &tokens[0] {
        Token::Doctype(doctype) => {
            assert_eq!(doctype.public_id.as_deref(), Some("-//W3C//DTD HTML 4.01//EN"));
            assert_eq!(doctype.system_id.as_deref(), Some("x.dtd"));
        }
        other => panic!("Expected DOCTYPE token, got {other:?}"),
    }
}

#[test]
fn test_missing_doctype_name_forces_quirks() {
    let tokens = tokenize("<!DOCTYPE>");
    assert!(matches!(&tokens[0], Token::Doctype(d) if d.force_quirks && d.name.is_none()));
}

#[test]
fn test_start_tag_with_attributes() {
    let tokens = tokenize("<DIV Class=\"a\" id=b hidden>");
    match &tokens[0] {
        Token::StartTag(tag) => {
            assert_eq!(tag.name, "div");
            assert!(!tag.self_closing);
            assert_eq!(tag.attribute("class"), Some("a"));
            assert_eq!(tag.attribute("id"), Some("b"));
            assert_eq!(tag.attribute("hidden"), Some(""));
        }
        other => panic!("Expected StartTag token, got {other:?}"),
    }
}

#[test]
fn test_self_closing_flag() {
    let tokens = tokenize("<br/>");
    assert!(matches!(&tokens[0], Token::StartTag(tag) if tag.name == "br" && tag.self_closing));
}

#[test]
fn test_end_tag() {
    let tokens = tokenize("</div>");
    assert!(matches!(&tokens[0], Token::EndTag(tag) if tag.name == "div"));
}

#[test]
fn test_comment() {
    let tokens = tokenize("<!-- hi -->");
    assert_eq!(tokens[0], Token::Comment(" hi ".to_string()));
}

#[test]
fn test_bogus_comment() {
    let tokens = tokenize("<?xml version=\"1.0\"?>");
    assert_eq!(tokens[0], Token::Comment("?xml version=\"1.0\"?".to_string()));
}

#[test]
fn test_duplicate_attribute_keeps_first() {
    let log = DiagnosticLog::new();
    let tokens = tokenize_chunks(&["<p a=1 a=2>"], TokenizerOptions::default(), &log);
    match &tokens[0] {
        Token::StartTag(tag) => {
            assert_eq!(tag.attributes.len(), 1);
            assert_eq!(tag.attribute("a"), Some("1"));
        }
        other => panic!("Expected StartTag token, got {other:?}"),
    }
    assert!(log.contains("Duplicate attribute “a”."));
}

#[test]
fn test_character_references_in_text() {
    let tokens = tokenize("&amp;&lt;&#65;&#x42;&notin;&#0;&#x80;");
    assert_eq!(characters(&tokens), "&<AB\u{2209}\u{FFFD}\u{20AC}");
}

#[test]
fn test_legacy_reference_without_semicolon() {
    let log = DiagnosticLog::new();
    let tokens = tokenize_chunks(&["&notit;"], TokenizerOptions::default(), &log);
    assert_eq!(characters(&tokens), "\u{AC}it;");
    assert!(!log.is_empty());
}

#[test]
fn test_attribute_value_keeps_ambiguous_ampersand() {
    let tokens = tokenize("<a href=\"?x=1&amp=2&amp;y\">");
    match &tokens[0] {
        Token::StartTag(tag) => assert_eq!(tag.attribute("href"), Some("?x=1&amp=2&y")),
        other => panic!("Expected StartTag token, got {other:?}"),
    }
}

#[test]
fn test_null_in_data_is_passed_through_with_error() {
    let log = DiagnosticLog::new();
    let tokens = tokenize_chunks(&["a\0b"], TokenizerOptions::default(), &log);
    assert_eq!(characters(&tokens), "a\0b");
    assert!(!log.is_empty());
}

#[test]
fn test_alter_infoset_replaces_form_feed() {
    let options = TokenizerOptions {
        xml_violation_policy: XmlViolationPolicy::AlterInfoset,
        ..TokenizerOptions::default()
    };
    let log = DiagnosticLog::new();
    let tokens = tokenize_chunks(&["a\u{C}b"], options, &log);
    assert_eq!(characters(&tokens), "a b");
    assert_eq!(log.messages(Severity::Warning).len(), 1);
}

#[test]
fn test_newlines_are_normalized() {
    let tokens = tokenize_chunks(
        &["a\r", "\nb\rc\r\n"],
        TokenizerOptions::default(),
        &DiagnosticLog::new(),
    );
    assert_eq!(characters(&tokens), "a\nb\nc\n");
}

#[test]
fn test_tag_split_across_feeds() {
    let tokens = tokenize_chunks(
        &["<di", "v cla", "ss=\"x\">t&am", "p;u<!-", "- c -->"],
        TokenizerOptions::default(),
        &DiagnosticLog::new(),
    );
    assert!(matches!(&tokens[0], Token::StartTag(tag) if tag.name == "div" && tag.attribute("class") == Some("x")));
    assert_eq!(tokens[1], Token::Characters("t&u".to_string()));
    assert_eq!(tokens[2], Token::Comment(" c ".to_string()));
}

#[test]
fn test_initial_state_rcdata() {
    let options = TokenizerOptions {
        initial_state: TokenizerState::RCDATA,
        last_start_tag: Some("title".to_string()),
        ..TokenizerOptions::default()
    };
    let tokens = tokenize_chunks(&["<b>&amp;</title><i>"], options, &DiagnosticLog::new());
    assert_eq!(tokens[0], Token::Characters("<b>&".to_string()));
    assert!(matches!(&tokens[1], Token::EndTag(tag) if tag.name == "title"));
    assert!(matches!(&tokens[2], Token::StartTag(tag) if tag.name == "i"));
}

#[test]
fn test_eof_in_tag_drops_it() {
    let tokens = tokenize("text<div class=");
    assert_eq!(tokens, vec![Token::Characters("text".to_string()), Token::EndOfFile]);
}

#[test]
fn test_diagnostics_carry_positions() {
    let log = DiagnosticLog::new();
    let _ = tokenize_chunks(&["ok\n  </>"], TokenizerOptions::default(), &log);
    let entries = log.entries();
    assert!(!entries.is_empty());
    assert_eq!(entries[0].position.line, 2);
}

/// Cut `input` into pieces whose lengths come from `sizes`, never inside a
/// character.
fn split(input: &str, sizes: &[u8]) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut turn = 0;
    for c in input.chars() {
        current.push(c);
        let limit = sizes.get(turn % sizes.len().max(1)).map_or(4, |&s| usize::from(s % 7) + 1);
        if current.len() >= limit {
            pieces.push(std::mem::take(&mut current));
            turn += 1;
        }
    }
    pieces.push(current);
    pieces
}

#[quickcheck]
fn prop_chunk_boundaries_do_not_change_tokens(input: String, sizes: Vec<u8>) -> bool {
    let whole_log = DiagnosticLog::new();
    let whole = tokenize_chunks(&[input.as_str()], TokenizerOptions::default(), &whole_log);

    let pieces = split(&input, &sizes);
    let pieces: Vec<&str> = pieces.iter().map(String::as_str).collect();
    let chunked_log = DiagnosticLog::new();
    let chunked = tokenize_chunks(&pieces, TokenizerOptions::default(), &chunked_log);

    whole == chunked && whole_log.entries() == chunked_log.entries()
}

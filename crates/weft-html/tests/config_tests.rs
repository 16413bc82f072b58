//! Tests for reading parser options from JSON.

use std::str::FromStr;

use weft_encoding::Heuristics;
use weft_html::{ParserOptions, XmlViolationPolicy};

#[test]
fn test_empty_object_gives_defaults() {
    let options = ParserOptions::from_json("{}").unwrap();
    assert_eq!(options, ParserOptions::default());
    assert!(options.allow_rewinding);
    assert!(options.swallow_bom);
    assert!(!options.scripting_enabled);
}

#[test]
fn test_kebab_case_fields() {
    let options = ParserOptions::from_json(
        r#"{
            "scripting-enabled": true,
            "ignore-comments": true,
            "xml-violation-policy": "fatal",
            "heuristics": "language-detector",
            "allow-rewinding": false
        }"#,
    )
    .unwrap();

    assert!(options.scripting_enabled);
    assert!(options.ignore_comments);
    assert_eq!(options.xml_violation_policy, XmlViolationPolicy::Fatal);
    assert_eq!(options.heuristics, Heuristics::LanguageDetector);
    assert!(!options.allow_rewinding);
    assert!(options.swallow_bom);
}

#[test]
fn test_unknown_policy_is_rejected() {
    assert!(ParserOptions::from_json(r#"{ "xml-violation-policy": "ignore" }"#).is_err());
}

#[test]
fn test_malformed_json_is_rejected() {
    assert!(ParserOptions::from_json("{ heuristics: all").is_err());
}

#[test]
fn test_policy_names_round_trip_through_strum() {
    let policy = XmlViolationPolicy::from_str("alter-infoset").unwrap();
    assert_eq!(policy, XmlViolationPolicy::AlterInfoset);
    assert_eq!(policy.to_string(), "alter-infoset");
    assert_eq!(Heuristics::All.to_string(), "all");
}

#[test]
fn test_options_serialize_with_kebab_case_names() {
    let json = serde_json::to_string(&ParserOptions::default()).unwrap();
    assert!(json.contains("\"xml-violation-policy\":\"allow\""));
    assert!(json.contains("\"heuristics\":\"none\""));
}

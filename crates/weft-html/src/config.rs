//! Parser configuration.
//!
//! Every field has a default, so a JSON document only needs to name the
//! options it changes:
//!
//! ```
//! use weft_html::{ParserOptions, XmlViolationPolicy};
//!
//! let options = ParserOptions::from_json(r#"{ "xml-violation-policy": "alter-infoset" }"#).unwrap();
//! assert_eq!(options.xml_violation_policy, XmlViolationPolicy::AlterInfoset);
//! assert!(options.allow_rewinding);
//! ```

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use weft_encoding::Heuristics;

/// What to do with constructs that have no faithful XML 1.0 representation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum XmlViolationPolicy {
    /// Keep the construct as parsed. A warning is still reported.
    #[default]
    Allow,
    /// Stop the parse with [`ParseError::XmlViolation`](crate::ParseError::XmlViolation).
    Fatal,
    /// Rewrite or drop the construct so the output is XML-safe.
    AlterInfoset,
}

/// Options recognized by the tokenizer, tree builder and driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
#[allow(clippy::struct_excessive_bools)]
pub struct ParserOptions {
    /// [§ 13.2.6.4.4](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inhead)
    /// "If the scripting flag is enabled", `<noscript>` content is raw text.
    pub scripting_enabled: bool,
    /// Drop comments instead of inserting them.
    pub ignore_comments: bool,
    /// Handling of XML-incompatible constructs.
    pub xml_violation_policy: XmlViolationPolicy,
    /// Encoding guessers to run when nothing was declared.
    pub heuristics: Heuristics,
    /// Keep the sniffing window so a late `<meta charset>` can restart the parse.
    pub allow_rewinding: bool,
    /// Drop a leading U+FEFF from the decoded text.
    pub swallow_bom: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            scripting_enabled: false,
            ignore_comments: false,
            xml_violation_policy: XmlViolationPolicy::Allow,
            heuristics: Heuristics::None,
            allow_rewinding: true,
            swallow_bom: true,
        }
    }
}

impl ParserOptions {
    /// Parse options from JSON. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error for malformed JSON or unknown enum names.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

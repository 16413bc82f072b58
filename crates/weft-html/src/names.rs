//! Namespaces and qualified names.
//!
//! [§ 2.1.3 XML compatibility](https://html.spec.whatwg.org/multipage/infrastructure.html#namespaces)

use std::fmt;

use strum_macros::Display;

/// The namespaces the parser can put elements and attributes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Namespace {
    /// No namespace. Only used for attributes.
    #[default]
    None,
    /// "The HTML namespace is: `http://www.w3.org/1999/xhtml`"
    Html,
    /// "The MathML namespace is: `http://www.w3.org/1998/Math/MathML`"
    MathMl,
    /// "The SVG namespace is: `http://www.w3.org/2000/svg`"
    Svg,
    /// "The `XLink` namespace is: `http://www.w3.org/1999/xlink`"
    XLink,
    /// "The XML namespace is: `http://www.w3.org/XML/1998/namespace`"
    Xml,
    /// "The XMLNS namespace is: `http://www.w3.org/2000/xmlns/`"
    Xmlns,
}

impl Namespace {
    /// The namespace URL, or the empty string for [`Namespace::None`].
    #[must_use]
    pub const fn url(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Html => "http://www.w3.org/1999/xhtml",
            Self::MathMl => "http://www.w3.org/1998/Math/MathML",
            Self::Svg => "http://www.w3.org/2000/svg",
            Self::XLink => "http://www.w3.org/1999/xlink",
            Self::Xml => "http://www.w3.org/XML/1998/namespace",
            Self::Xmlns => "http://www.w3.org/2000/xmlns/",
        }
    }

    /// The prefix used for this namespace in test-format tree dumps
    /// (`svg path`, `xlink href`). Empty for HTML and no namespace.
    #[must_use]
    pub const fn dump_prefix(self) -> &'static str {
        match self {
            Self::None | Self::Html => "",
            Self::MathMl => "math",
            Self::Svg => "svg",
            Self::XLink => "xlink",
            Self::Xml => "xml",
            Self::Xmlns => "xmlns",
        }
    }
}

/// A namespace plus local name, identifying an element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualName {
    /// The namespace.
    pub ns: Namespace,
    /// The local name. Lowercase for HTML elements; case-adjusted for SVG.
    pub local: String,
}

impl QualName {
    /// Create a qualified name.
    #[must_use]
    pub fn new(ns: Namespace, local: impl Into<String>) -> Self {
        Self {
            ns,
            local: local.into(),
        }
    }

    /// An HTML element name.
    #[must_use]
    pub fn html(local: impl Into<String>) -> Self {
        Self::new(Namespace::Html, local)
    }

    /// Returns true if this is the HTML element `local`.
    #[must_use]
    pub fn is_html(&self, local: &str) -> bool {
        self.ns == Namespace::Html && self.local == local
    }
}

impl fmt::Display for QualName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ns.dump_prefix() {
            "" => f.write_str(&self.local),
            prefix => write!(f, "{prefix} {}", self.local),
        }
    }
}

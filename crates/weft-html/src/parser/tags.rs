//! Element categories used by tree construction.

use crate::names::{Namespace, QualName};

/// [§ 13.2.4.3 The stack of open elements](https://html.spec.whatwg.org/multipage/parsing.html#special)
///
/// "The following elements have varying levels of special parsing rules"
#[must_use]
pub fn is_special(name: &QualName) -> bool {
    match name.ns {
        Namespace::Html => matches!(
            name.local.as_str(),
            "address" | "applet" | "area" | "article" | "aside" | "base" | "basefont"
                | "bgsound" | "blockquote" | "body" | "br" | "button" | "caption" | "center"
                | "col" | "colgroup" | "dd" | "details" | "dir" | "div" | "dl" | "dt"
                | "embed" | "fieldset" | "figcaption" | "figure" | "footer" | "form"
                | "frame" | "frameset" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "head"
                | "header" | "hgroup" | "hr" | "html" | "iframe" | "img" | "input"
                | "keygen" | "li" | "link" | "listing" | "main" | "marquee" | "menu"
                | "meta" | "nav" | "noembed" | "noframes" | "noscript" | "object" | "ol"
                | "p" | "param" | "plaintext" | "pre" | "script" | "search" | "section"
                | "select" | "source" | "style" | "summary" | "table" | "tbody" | "td"
                | "template" | "textarea" | "tfoot" | "th" | "thead" | "title" | "tr"
                | "track" | "ul" | "wbr" | "xmp"
        ),
        Namespace::MathMl => matches!(
            name.local.as_str(),
            "mi" | "mo" | "mn" | "ms" | "mtext" | "annotation-xml"
        ),
        Namespace::Svg => matches!(name.local.as_str(), "foreignObject" | "desc" | "title"),
        _ => false,
    }
}

/// [§ 13.2.4.3](https://html.spec.whatwg.org/multipage/parsing.html#formatting)
///
/// "Formatting: a, b, big, code, em, font, i, nobr, s, small, strike, strong,
/// tt, and u elements."
#[must_use]
pub fn is_formatting(local: &str) -> bool {
    matches!(
        local,
        "a" | "b" | "big" | "code" | "em" | "font" | "i" | "nobr" | "s" | "small" | "strike"
            | "strong" | "tt" | "u"
    )
}

/// [§ 13.2.6.3 Closing elements that have implied end tags](https://html.spec.whatwg.org/multipage/parsing.html#generate-implied-end-tags)
#[must_use]
pub fn has_implied_end_tag(local: &str) -> bool {
    matches!(
        local,
        "dd" | "dt" | "li" | "optgroup" | "option" | "p" | "rb" | "rp" | "rt" | "rtc"
    )
}

/// "generate all implied end tags thoroughly"
#[must_use]
pub fn has_implied_end_tag_thoroughly(local: &str) -> bool {
    has_implied_end_tag(local)
        || matches!(
            local,
            "caption" | "colgroup" | "tbody" | "td" | "tfoot" | "th" | "thead" | "tr"
        )
}

/// [§ 13.2.4.2](https://html.spec.whatwg.org/multipage/parsing.html#has-an-element-in-scope)
/// "The stack of open elements is said to have an element target node in a
/// specific scope consisting of a list of element types list when..."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// "has an element in scope"
    Default,
    /// "has an element in list item scope"
    ListItem,
    /// "has an element in button scope"
    Button,
    /// "has an element in table scope"
    Table,
    /// "has an element in select scope"
    Select,
}

impl Scope {
    /// Returns true if `name` ends the search.
    #[must_use]
    pub fn is_boundary(self, name: &QualName) -> bool {
        match self {
            Self::Default => is_default_scope_boundary(name),
            Self::ListItem => {
                is_default_scope_boundary(name) || name.is_html("ol") || name.is_html("ul")
            }
            Self::Button => is_default_scope_boundary(name) || name.is_html("button"),
            Self::Table => {
                name.ns == Namespace::Html
                    && matches!(name.local.as_str(), "html" | "table" | "template")
            }
            // "all element types except the following: optgroup in the HTML
            // namespace, option in the HTML namespace"
            Self::Select => !(name.is_html("optgroup") || name.is_html("option")),
        }
    }
}

fn is_default_scope_boundary(name: &QualName) -> bool {
    match name.ns {
        Namespace::Html => matches!(
            name.local.as_str(),
            "applet" | "caption" | "html" | "table" | "td" | "th" | "marquee" | "object"
                | "template"
        ),
        Namespace::MathMl => matches!(
            name.local.as_str(),
            "mi" | "mo" | "mn" | "ms" | "mtext" | "annotation-xml"
        ),
        Namespace::Svg => matches!(name.local.as_str(), "foreignObject" | "desc" | "title"),
        _ => false,
    }
}

/// [§ 13.2.6 Tree construction](https://html.spec.whatwg.org/multipage/parsing.html#mathml-text-integration-point)
///
/// "A node is a MathML text integration point if it is one of the following
/// elements: A MathML mi element, mo, mn, ms, mtext"
#[must_use]
pub fn is_mathml_text_integration_point(name: &QualName) -> bool {
    name.ns == Namespace::MathMl
        && matches!(name.local.as_str(), "mi" | "mo" | "mn" | "ms" | "mtext")
}

/// [§ 4.10.2 Categories](https://html.spec.whatwg.org/multipage/forms.html#category-listed)
///
/// "Listed elements: button, fieldset, input, object, output, select, and
/// textarea"
#[must_use]
pub fn is_listed(local: &str) -> bool {
    matches!(
        local,
        "button" | "fieldset" | "input" | "object" | "output" | "select" | "textarea"
    )
}

/// Form-associated elements: the listed elements and `img`.
#[must_use]
pub fn is_form_associated(local: &str) -> bool {
    is_listed(local) || local == "img"
}

/// h1 through h6.
pub const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// The table section elements.
pub const TABLE_SECTIONS: &[&str] = &["tbody", "tfoot", "thead"];

/// The table cell elements.
pub const TABLE_CELLS: &[&str] = &["td", "th"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_special_by_namespace() {
        assert!(is_special(&QualName::html("p")));
        assert!(!is_special(&QualName::html("span")));
        assert!(is_special(&QualName::new(Namespace::Svg, "foreignObject")));
        assert!(!is_special(&QualName::new(Namespace::Svg, "p")));
    }

    #[test]
    fn test_scopes() {
        let ul = QualName::html("ul");
        assert!(!Scope::Default.is_boundary(&ul));
        assert!(Scope::ListItem.is_boundary(&ul));
        assert!(Scope::Select.is_boundary(&QualName::html("div")));
        assert!(!Scope::Select.is_boundary(&QualName::html("option")));
        assert!(Scope::Table.is_boundary(&QualName::html("template")));
        assert!(!Scope::Table.is_boundary(&QualName::html("td")));
    }
}

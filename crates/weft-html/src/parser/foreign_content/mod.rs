//! Name and attribute fix-ups for SVG and MathML content.
//!
//! [§ 13.2.6.3 Creating and inserting nodes](https://html.spec.whatwg.org/multipage/parsing.html#creating-and-inserting-nodes)
//! [§ 13.2.6.5 The rules for parsing tokens in foreign content](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inforeign)

pub mod mathml;
pub mod svg;

pub use mathml::adjust_mathml_attributes;
pub use svg::{adjust_svg_attributes, adjust_svg_tag_name};

use crate::names::Namespace;
use crate::tokenizer::Attribute;

/// [§ 13.2.6.3 Adjust foreign attributes](https://html.spec.whatwg.org/multipage/parsing.html#adjust-foreign-attributes)
///
/// "if any of the attributes on the token match the strings in the first
/// column of the following table, let the attribute be a namespaced
/// attribute, with the prefix being the string in the second column, the
/// local name being the string in the third column, and the namespace being
/// the namespace in the fourth column."
///
/// Format: (`attribute_name`, prefix, `local_name`, namespace)
const FOREIGN_ATTRIBUTE_ADJUSTMENTS: &[(&str, Option<&str>, &str, Namespace)] = &[
    ("xlink:actuate", Some("xlink"), "actuate", Namespace::XLink),
    ("xlink:arcrole", Some("xlink"), "arcrole", Namespace::XLink),
    ("xlink:href", Some("xlink"), "href", Namespace::XLink),
    ("xlink:role", Some("xlink"), "role", Namespace::XLink),
    ("xlink:show", Some("xlink"), "show", Namespace::XLink),
    ("xlink:title", Some("xlink"), "title", Namespace::XLink),
    ("xlink:type", Some("xlink"), "type", Namespace::XLink),
    ("xml:lang", Some("xml"), "lang", Namespace::Xml),
    ("xml:space", Some("xml"), "space", Namespace::Xml),
    ("xmlns", None, "xmlns", Namespace::Xmlns),
    ("xmlns:xlink", Some("xmlns"), "xlink", Namespace::Xmlns),
];

/// [§ 13.2.6.3 Adjust foreign attributes](https://html.spec.whatwg.org/multipage/parsing.html#adjust-foreign-attributes)
///
/// Moves `xlink:href`, `xml:lang`, `xmlns` and friends into their namespaces.
pub fn adjust_foreign_attributes(attributes: &mut [Attribute]) {
    for attr in &mut *attributes {
        if attr.namespace != Namespace::None {
            continue;
        }
        if let Some(&(_, prefix, local_name, namespace)) = FOREIGN_ATTRIBUTE_ADJUSTMENTS
            .iter()
            .find(|(from, ..)| attr.name == *from)
        {
            attr.prefix = prefix.map(str::to_string);
            attr.name = local_name.to_string();
            attr.namespace = namespace;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xlink_href_is_namespaced() {
        let mut attrs = vec![
            Attribute::new("xlink:href", "#a"),
            Attribute::new("xmlns", "http://www.w3.org/2000/svg"),
            Attribute::new("width", "3"),
        ];
        adjust_foreign_attributes(&mut attrs);

        assert_eq!(attrs[0].namespace, Namespace::XLink);
        assert_eq!(attrs[0].prefix.as_deref(), Some("xlink"));
        assert_eq!(attrs[0].name, "href");
        assert_eq!(attrs[0].qualified_name(), "xlink:href");

        assert_eq!(attrs[1].namespace, Namespace::Xmlns);
        assert_eq!(attrs[1].prefix, None);

        assert_eq!(attrs[2].namespace, Namespace::None);
    }

    #[test]
    fn test_unknown_prefix_is_left_alone() {
        let mut attrs = vec![Attribute::new("xlink:bogus", "x")];
        adjust_foreign_attributes(&mut attrs);
        assert_eq!(attrs[0].namespace, Namespace::None);
        assert_eq!(attrs[0].name, "xlink:bogus");
    }
}

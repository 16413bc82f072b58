//! [§ 13.2.6.4.1 The "initial" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-initial-insertion-mode)
//!
//! Which doctypes put the document into quirks or limited-quirks mode.

use super::sink::DocumentMode;
use crate::tokenizer::Doctype;

/// "The public identifier starts with: ..."
const QUIRKY_PUBLIC_PREFIXES: &[&str] = &[
    "+//silmaril//dtd html pro v0r11 19970101//",
    "-//as//dtd html 3.0 aswedit + extensions//",
    "-//advasoft ltd//dtd html 3.0 aswedit + extensions//",
    "-//ietf//dtd html 2.0 level 1//",
    "-//ietf//dtd html 2.0 level 2//",
    "-//ietf//dtd html 2.0 strict level 1//",
    "-//ietf//dtd html 2.0 strict level 2//",
    "-//ietf//dtd html 2.0 strict//",
    "-//ietf//dtd html 2.0//",
    "-//ietf//dtd html 2.1e//",
    "-//ietf//dtd html 3.0//",
    "-//ietf//dtd html 3.2 final//",
    "-//ietf//dtd html 3.2//",
    "-//ietf//dtd html 3//",
    "-//ietf//dtd html level 0//",
    "-//ietf//dtd html level 1//",
    "-//ietf//dtd html level 2//",
    "-//ietf//dtd html level 3//",
    "-//ietf//dtd html strict level 0//",
    "-//ietf//dtd html strict level 1//",
    "-//ietf//dtd html strict level 2//",
    "-//ietf//dtd html strict level 3//",
    "-//ietf//dtd html strict//",
    "-//ietf//dtd html//",
    "-//metrius//dtd metrius presentational//",
    "-//microsoft//dtd internet explorer 2.0 html strict//",
    "-//microsoft//dtd internet explorer 2.0 html//",
    "-//microsoft//dtd internet explorer 2.0 tables//",
    "-//microsoft//dtd internet explorer 3.0 html strict//",
    "-//microsoft//dtd internet explorer 3.0 html//",
    "-//microsoft//dtd internet explorer 3.0 tables//",
    "-//netscape comm. corp.//dtd html//",
    "-//netscape comm. corp.//dtd strict html//",
    "-//o'reilly and associates//dtd html 2.0//",
    "-//o'reilly and associates//dtd html extended 1.0//",
    "-//o'reilly and associates//dtd html extended relaxed 1.0//",
    "-//sq//dtd html 2.0 hotmetal + extensions//",
    "-//softquad software//dtd hotmetal pro 6.0::19990601::extensions to html 4.0//",
    "-//softquad//dtd hotmetal pro 4.0::19971010::extensions to html 4.0//",
    "-//spyglass//dtd html 2.0 extended//",
    "-//sun microsystems corp.//dtd hotjava html//",
    "-//sun microsystems corp.//dtd hotjava strict html//",
    "-//w3c//dtd html 3 1995-03-24//",
    "-//w3c//dtd html 3.2 draft//",
    "-//w3c//dtd html 3.2 final//",
    "-//w3c//dtd html 3.2//",
    "-//w3c//dtd html 3.2s draft//",
    "-//w3c//dtd html 4.0 frameset//",
    "-//w3c//dtd html 4.0 transitional//",
    "-//w3c//dtd html experimental 19960712//",
    "-//w3c//dtd html experimental 970421//",
    "-//w3c//dtd w3 html//",
    "-//w3o//dtd w3 html 3.0//",
    "-//webtechs//dtd mozilla html 2.0//",
    "-//webtechs//dtd mozilla html//",
];

/// "The public identifier is set to: ..."
const QUIRKY_PUBLIC_IDS: &[&str] = &[
    "-//w3o//dtd w3 html strict 3.0//en//",
    "-/w3c/dtd html 4.0 transitional/en",
    "html",
];

const HTML401_PREFIXES: &[&str] = &[
    "-//w3c//dtd html 4.01 frameset//",
    "-//w3c//dtd html 4.01 transitional//",
];

const XHTML10_PREFIXES: &[&str] = &[
    "-//w3c//dtd xhtml 1.0 frameset//",
    "-//w3c//dtd xhtml 1.0 transitional//",
];

const QUIRKY_SYSTEM_ID: &str = "http://www.ibm.com/data/dtd/v11/ibmxhtml1-transitional.dtd";

/// The document mode a DOCTYPE token selects. Comparisons are ASCII
/// case-insensitive.
#[must_use]
pub fn document_mode_for(doctype: &Doctype) -> DocumentMode {
    let public = doctype.public_id.as_deref().map(str::to_ascii_lowercase);
    let system = doctype.system_id.as_deref().map(str::to_ascii_lowercase);
    let public_starts = |prefixes: &[&str]| {
        public
            .as_deref()
            .is_some_and(|p| prefixes.iter().any(|prefix| p.starts_with(prefix)))
    };

    let quirks = doctype.force_quirks
        || doctype.name.as_deref() != Some("html")
        || public
            .as_deref()
            .is_some_and(|p| QUIRKY_PUBLIC_IDS.contains(&p))
        || system.as_deref() == Some(QUIRKY_SYSTEM_ID)
        || public_starts(QUIRKY_PUBLIC_PREFIXES)
        || (system.is_none() && public_starts(HTML401_PREFIXES));
    if quirks {
        return DocumentMode::Quirks;
    }

    if public_starts(XHTML10_PREFIXES) || (system.is_some() && public_starts(HTML401_PREFIXES)) {
        return DocumentMode::LimitedQuirks;
    }
    DocumentMode::Standards
}

/// "If the DOCTYPE token's name is not "html", or the token's public
/// identifier is not missing, or the token's system identifier is neither
/// missing nor "about:legacy-compat", then there is a parse error."
#[must_use]
pub fn is_conforming(doctype: &Doctype) -> bool {
    doctype.name.as_deref() == Some("html")
        && doctype.public_id.is_none()
        && doctype
            .system_id
            .as_deref()
            .is_none_or(|s| s == "about:legacy-compat")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doctype(name: &str, public: Option<&str>, system: Option<&str>) -> Doctype {
        Doctype {
            name: Some(name.to_string()),
            public_id: public.map(str::to_string),
            system_id: system.map(str::to_string),
            force_quirks: false,
        }
    }

    #[test]
    fn test_html5_doctype_is_standards() {
        let d = doctype("html", None, None);
        assert_eq!(document_mode_for(&d), DocumentMode::Standards);
        assert!(is_conforming(&d));
    }

    #[test]
    fn test_html401_transitional_depends_on_system_id() {
        let public = Some("-//W3C//DTD HTML 4.01 Transitional//EN");
        assert_eq!(
            document_mode_for(&doctype("html", public, None)),
            DocumentMode::Quirks
        );
        assert_eq!(
            document_mode_for(&doctype(
                "html",
                public,
                Some("http://www.w3.org/TR/html4/loose.dtd")
            )),
            DocumentMode::LimitedQuirks
        );
    }

    #[test]
    fn test_xhtml_transitional_is_limited_quirks() {
        let d = doctype("html", Some("-//W3C//DTD XHTML 1.0 Transitional//EN"), None);
        assert_eq!(document_mode_for(&d), DocumentMode::LimitedQuirks);
        assert!(!is_conforming(&d));
    }

    #[test]
    fn test_force_quirks_and_wrong_name() {
        let mut d = doctype("html", None, None);
        d.force_quirks = true;
        assert_eq!(document_mode_for(&d), DocumentMode::Quirks);
        assert_eq!(document_mode_for(&doctype("svg", None, None)), DocumentMode::Quirks);
    }
}

//! Namespace prefixes used by WordprocessingML parts.
//!
//! Element and attribute names throughout the element layer are written in
//! prefixed form (`w:tc`, `r:id`). The prefixes are fixed: each one maps to a
//! single namespace URI through [`NSMAP`], independent of whatever prefixes a
//! particular document happens to declare.

use std::borrow::Cow;

use phf::{Map, phf_map};

pub const A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub const CP: &str = "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";
pub const DC: &str = "http://purl.org/dc/elements/1.1/";
pub const DCMITYPE: &str = "http://purl.org/dc/dcmitype/";
pub const DCTERMS: &str = "http://purl.org/dc/terms/";
pub const M: &str = "http://schemas.openxmlformats.org/officeDocument/2006/math";
pub const MC: &str = "http://schemas.openxmlformats.org/markup-compatibility/2006";
pub const PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
pub const R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub const SL: &str = "http://schemas.openxmlformats.org/schemaLibrary/2006/main";
pub const W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const W14: &str = "http://schemas.microsoft.com/office/word/2010/wordml";
pub const WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
pub const XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Prefix to namespace URI.
pub static NSMAP: Map<&'static str, &'static str> = phf_map! {
    "a" => A,
    "cp" => CP,
    "dc" => DC,
    "dcmitype" => DCMITYPE,
    "dcterms" => DCTERMS,
    "m" => M,
    "mc" => MC,
    "pic" => PIC,
    "r" => R,
    "sl" => SL,
    "w" => W,
    "w14" => W14,
    "wp" => WP,
    "xml" => XML,
    "xsi" => XSI,
};

/// Namespace URI to canonical prefix.
static PFXMAP: Map<&'static str, &'static str> = phf_map! {
    "http://schemas.openxmlformats.org/drawingml/2006/main" => "a",
    "http://schemas.openxmlformats.org/package/2006/metadata/core-properties" => "cp",
    "http://purl.org/dc/elements/1.1/" => "dc",
    "http://purl.org/dc/dcmitype/" => "dcmitype",
    "http://purl.org/dc/terms/" => "dcterms",
    "http://schemas.openxmlformats.org/officeDocument/2006/math" => "m",
    "http://schemas.openxmlformats.org/markup-compatibility/2006" => "mc",
    "http://schemas.openxmlformats.org/drawingml/2006/picture" => "pic",
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships" => "r",
    "http://schemas.openxmlformats.org/schemaLibrary/2006/main" => "sl",
    "http://schemas.openxmlformats.org/wordprocessingml/2006/main" => "w",
    "http://schemas.microsoft.com/office/word/2010/wordml" => "w14",
    "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" => "wp",
    "http://www.w3.org/XML/1998/namespace" => "xml",
    "http://www.w3.org/2001/XMLSchema-instance" => "xsi",
};

#[inline]
pub fn uri_for(prefix: &str) -> Option<&'static str> {
    NSMAP.get(prefix).copied()
}

#[inline]
pub fn prefix_for(uri: &str) -> Option<&'static str> {
    PFXMAP.get(uri).copied()
}

/// Split `w:tc` into its namespace URI and local name.
///
/// Unprefixed names have no namespace. A prefix outside [`NSMAP`] also yields
/// `None` for the namespace, so such a name never matches a namespaced element.
pub fn split_prefixed(tag: &str) -> (Option<&'static str>, &str) {
    match tag.split_once(':') {
        Some((prefix, local)) => (uri_for(prefix), local),
        None => (None, tag),
    }
}

/// Clark notation, `{uri}local`, for a prefixed name.
pub fn qn(tag: &str) -> String {
    match split_prefixed(tag) {
        (Some(uri), local) => format!("{{{}}}{}", uri, local),
        (None, local) => local.to_string(),
    }
}

/// Share the static string for well-known namespace URIs.
pub fn intern(uri: &str) -> Cow<'static, str> {
    match PFXMAP.get_entry(uri) {
        Some((key, _)) => Cow::Borrowed(*key),
        None => Cow::Owned(uri.to_string()),
    }
}

/// `xmlns:` declarations for the given prefixes, for building XML templates.
pub fn nsdecls(prefixes: &[&str]) -> String {
    let mut decls = String::new();
    for prefix in prefixes {
        if let Some(uri) = uri_for(prefix) {
            if !decls.is_empty() {
                decls.push(' ');
            }
            decls.push_str("xmlns:");
            decls.push_str(prefix);
            decls.push_str("=\"");
            decls.push_str(uri);
            decls.push('"');
        }
    }
    decls
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_round_trip() {
        for (prefix, uri) in NSMAP.entries() {
            assert_eq!(prefix_for(uri), Some(*prefix));
        }
    }

    #[test]
    fn test_qn() {
        assert_eq!(
            qn("w:p"),
            "{http://schemas.openxmlformats.org/wordprocessingml/2006/main}p"
        );
        assert_eq!(qn("Id"), "Id");
    }

    #[test]
    fn test_nsdecls() {
        assert_eq!(
            nsdecls(&["w", "bogus", "r"]),
            format!("xmlns:w=\"{}\" xmlns:r=\"{}\"", W, R)
        );
    }

    #[test]
    fn test_intern_borrows_known_uris() {
        assert!(matches!(intern(W), Cow::Borrowed(_)));
        assert!(matches!(intern("urn:example"), Cow::Owned(_)));
    }
}
